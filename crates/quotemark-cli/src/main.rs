use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use quotemark_config::Config;
use quotemark_engine::{
    Document, GeometryProvider, IndicatorState, NodeId, Rect, Span as DocSpan, Viewport,
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

struct App {
    document: Document,
    /// First visible block row.
    scroll: usize,
    /// Content rows of the last drawn frame, for the geometry provider.
    viewport_rows: usize,
}

impl App {
    fn new(document_path: PathBuf, query: Option<&str>) -> Result<Self> {
        let options = match Config::load() {
            Ok(Some(config)) => config.engine,
            _ => Default::default(),
        };
        let mut document = Document::from_path(&document_path, options)?;
        if let Some(query) = query {
            document.highlight_from_query(query);
        }
        Ok(Self {
            document,
            scroll: 0,
            viewport_rows: 1,
        })
    }

    fn row_count(&self) -> usize {
        self.document
            .tree()
            .children(self.document.root())
            .len()
    }

    fn scroll_down(&mut self) {
        if self.scroll + 1 < self.row_count() {
            self.scroll += 1;
        }
    }

    fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    fn geometry(&self) -> RowGeometry {
        RowGeometry {
            viewport: Viewport {
                top: self.scroll as f64,
                bottom: (self.scroll + self.viewport_rows) as f64,
            },
        }
    }

    fn indicators(&self) -> IndicatorState {
        IndicatorState::compute(&self.document, &self.geometry())
    }

    /// Jump so the nearest off-screen span in the given direction is visible.
    fn jump(&mut self, below: bool) {
        let state = self.indicators();
        let target = if below { state.nearest_below } else { state.nearest_above };
        if let Some(i) = target
            && let Some(span) = self.document.spans().get(i).copied()
            && let Some(rect) = self.geometry().span_rect(&self.document, &span)
        {
            self.scroll = rect.top as usize;
        }
    }
}

/// One terminal row per root child block; pixels are rows.
struct RowGeometry {
    viewport: Viewport,
}

impl GeometryProvider for RowGeometry {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn span_rect(&self, doc: &Document, span: &DocSpan) -> Option<Rect> {
        let row = block_row(doc, span.start)? as f64;
        Some(Rect {
            top: row,
            bottom: row + 1.0,
            left: 0.0,
            right: 0.0,
        })
    }
}

/// Index of the root child block containing a span endpoint.
fn block_row(doc: &Document, position: quotemark_engine::Position) -> Option<usize> {
    let root = doc.root();
    if position.node == root {
        let count = doc.tree().children(root).len();
        return Some(position.offset.min(count.saturating_sub(1)));
    }
    let mut cur = position.node;
    loop {
        let parent = doc.tree().parent(cur)?;
        if parent == root {
            return doc.tree().index_in_parent(cur);
        }
        cur = parent;
    }
}

/// Styled line for one root child block, highlights inverted.
fn block_line(doc: &Document, block: NodeId) -> Line<'static> {
    let mut spans = Vec::new();
    collect_styled(doc, block, false, &mut spans);
    if spans.is_empty() {
        spans.push(Span::raw(String::new()));
    }
    Line::from(spans)
}

fn collect_styled(doc: &Document, node: NodeId, highlighted: bool, out: &mut Vec<Span<'static>>) {
    if let Some(text) = doc.tree().leaf_text(node) {
        if !text.is_empty() {
            let style = if highlighted {
                Style::default().bg(Color::Yellow).fg(Color::Black)
            } else {
                Style::default()
            };
            out.push(Span::styled(text.to_string(), style));
        }
        return;
    }
    let inside = highlighted || doc.tree().is_highlight(node);
    for &child in doc.tree().children(node) {
        collect_styled(doc, child, inside, out);
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let config_path = Config::config_path();

    let document_path;
    let query;
    match args.len() {
        2 => {
            document_path = PathBuf::from(&args[1]);
            query = None;
        }
        3 => {
            document_path = PathBuf::from(&args[1]);
            query = Some(args[2].clone());
        }
        1 => match Config::load() {
            Ok(Some(config)) => {
                document_path = config.document_path;
                query = None;
            }
            Ok(None) => {
                eprintln!("Error: No document provided and no config file found");
                eprintln!("Usage: {} <document.json> [query]", args[0]);
                eprintln!("Or create a config file at {}", config_path.display());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} <document.json> [query]", args[0]);
                process::exit(1);
            }
        },
        _ => {
            eprintln!("Usage: {} [document.json] [query]", args[0]);
            process::exit(1);
        }
    }

    if !document_path.is_file() {
        eprintln!("Error: Document '{}' not found", document_path.display());
        process::exit(1);
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let app = App::new(document_path, query.as_deref());

    let res = match app {
        Ok(mut app) => run_app(&mut terminal, &mut app),
        Err(e) => Err(e),
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => app.scroll_down(),
                KeyCode::Up | KeyCode::Char('k') => app.scroll_up(),
                KeyCode::Char('n') => app.jump(true),
                KeyCode::Char('p') => app.jump(false),
                KeyCode::Char('g') => app.scroll = 0,
                KeyCode::Char('G') => {
                    app.scroll = app.row_count().saturating_sub(app.viewport_rows);
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(1),
                Constraint::Min(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ]
            .as_ref(),
        )
        .split(f.area());

    app.viewport_rows = chunks[1].height.saturating_sub(2).max(1) as usize;
    let state = app.indicators();

    // Above-the-viewport counter
    let above = if state.above > 0 {
        format!("▲ {} more above (p to jump)", state.above)
    } else {
        String::new()
    };
    f.render_widget(Paragraph::new(above), chunks[0]);

    // Document body, one row per block, windowed by scroll
    let blocks = app.document.tree().children(app.document.root()).to_vec();
    let lines: Vec<Line> = blocks
        .iter()
        .skip(app.scroll)
        .take(app.viewport_rows)
        .map(|&b| block_line(&app.document, b))
        .collect();
    let body = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Document"));
    f.render_widget(body, chunks[1]);

    // Below-the-viewport counter
    let below = if state.below > 0 {
        format!("▼ {} more below (n to jump)", state.below)
    } else {
        String::new()
    };
    f.render_widget(Paragraph::new(below), chunks[2]);

    // Permalink plus key help
    let permalink = app
        .document
        .selection_to_query()
        .map(|entry| format!("?{entry}"))
        .unwrap_or_else(|| "no highlights".to_string());
    let help = Line::from(vec![
        Span::raw(format!("{permalink}  |  ")),
        Span::raw("q: Quit | ↑/k ↓/j: Scroll | p/n: Jump | g/G: Top/Bottom"),
    ]);
    f.render_widget(Paragraph::new(vec![help]), chunks[3]);
}
