use quotemark_engine::{Document, NodeSpec, Options};

// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
#[allow(dead_code)]
pub fn generate_document(blocks: usize) -> Document {
    let children: Vec<NodeSpec> = (0..blocks)
        .map(|i| NodeSpec::Element {
            role: quotemark_engine::DisplayRole::Block,
            white_space: quotemark_engine::WhiteSpace::Normal,
            children: vec![NodeSpec::Text(format!(
                "Paragraph {i} with a reasonable amount of prose to address into."
            ))],
        })
        .collect();
    let spec = NodeSpec::Element {
        role: quotemark_engine::DisplayRole::Block,
        white_space: quotemark_engine::WhiteSpace::Normal,
        children,
    };
    Document::from_spec(&spec, Options::default()).unwrap()
}

#[allow(dead_code)]
pub fn generate_pairs(blocks: usize) -> Vec<String> {
    (0..blocks).map(|i| format!("{i}.0.10-{i}.0.30")).collect()
}
