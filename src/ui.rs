use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dex_board::{
    ApplyError, Board, Commit, EditScript, FetchOutcome, Item, RenderedList, Renderer, Section,
    Snapshot,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;
use tracing::{error, info};

// ============================================================================
// RENDERED VIEW (the rendering collaborator)
// ============================================================================

/// Rendered copy of both sections plus the row cursor.
///
/// Edit scripts are applied here; the cursor is kept in range afterwards.
#[derive(Default)]
pub struct BoardView {
    pub rendered: RenderedList,
    pub list_state: TableState,
}

impl Renderer for BoardView {
    fn commit(
        &mut self,
        section: Section,
        script: &EditScript,
        snapshot: &Snapshot,
    ) -> Result<(), ApplyError> {
        self.rendered.commit(section, script, snapshot)?;

        if section == Section::EntryList {
            let len = self.rendered.ids(Section::EntryList).len();
            let selected = match self.list_state.selected() {
                _ if len == 0 => None,
                Some(i) if i >= len => Some(len - 1),
                Some(i) => Some(i),
                None => Some(0),
            };
            self.list_state.select(selected);
        }
        Ok(())
    }
}

// ============================================================================
// APP
// ============================================================================

pub struct App {
    pub board: Board,
    pub view: BoardView,
    pub chip_cursor: usize,
    pub show_detail: bool,
    pub fetching: bool,
    pub status: Option<String>,
}

impl App {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            view: BoardView::default(),
            chip_cursor: 0,
            show_detail: false,
            fetching: true,
            status: None,
        }
    }

    /// Serialize a fetch completion into the UI loop
    pub fn apply_fetch(&mut self, outcome: FetchOutcome) {
        self.fetching = false;
        match self.board.on_fetch_complete(outcome) {
            Ok(Some(commit)) => {
                self.status = None;
                self.render_commit(&commit);
                self.chip_cursor = self.highlighted_chip_index().unwrap_or(0);
            }
            Ok(None) => {
                if let Some(failure) = self.board.last_error() {
                    self.status = Some(format!("Fetch failed: {}", failure.reason));
                }
            }
            Err(err) => {
                error!(error = %err, "rebuilding snapshot after fetch failed");
                self.status = Some(err.to_string());
            }
        }
    }

    /// Tap the chip under the cursor
    pub fn tap_chip(&mut self) {
        let Some(id) = self
            .view
            .rendered
            .ids(Section::TypeSelector)
            .get(self.chip_cursor)
            .copied()
        else {
            return;
        };

        match self.board.on_chip_tapped(id) {
            Ok(Some(commit)) => self.render_commit(&commit),
            Ok(None) => {}
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn render_commit(&mut self, commit: &Commit) {
        if let Err(err) = self.board.commit_to(&mut self.view, commit) {
            // The rendered copy drifted; fall back to a full reload of it
            error!(error = %err, "edit script did not apply, reloading view");
            self.view = BoardView::default();
            let full = Commit {
                version: commit.version,
                scripts: Section::ALL
                    .iter()
                    .filter_map(|section| {
                        dex_board::diff(&Snapshot::empty(), self.board.current_snapshot(), *section).ok()
                    })
                    .collect(),
            };
            if let Err(err) = self.board.commit_to(&mut self.view, &full) {
                self.status = Some(err.to_string());
            }
        }
    }

    fn highlighted_chip_index(&self) -> Option<usize> {
        let highlighted = self.board.highlighted_chip()?;
        self.view
            .rendered
            .ids(Section::TypeSelector)
            .iter()
            .position(|id| *id == highlighted)
    }

    fn rendered_items(&self, section: Section) -> Vec<&Item> {
        let snapshot = self.board.current_snapshot();
        self.view
            .rendered
            .ids(section)
            .iter()
            .filter_map(|id| snapshot.item(*id))
            .collect()
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_chip(&mut self) {
        let len = self.view.rendered.ids(Section::TypeSelector).len();
        if len > 0 {
            self.chip_cursor = (self.chip_cursor + 1) % len;
        }
    }

    pub fn previous_chip(&mut self) {
        let len = self.view.rendered.ids(Section::TypeSelector).len();
        if len > 0 {
            self.chip_cursor = (self.chip_cursor + len - 1) % len;
        }
    }

    fn row_count(&self) -> usize {
        self.view.rendered.ids(Section::EntryList).len()
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.view.list_state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.view.list_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.view.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.view.list_state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = self
            .view
            .list_state
            .selected()
            .map_or(0, |i| (i + 20).min(len - 1));
        self.view.list_state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self
            .view
            .list_state
            .selected()
            .map_or(0, |i| i.saturating_sub(20));
        self.view.list_state.select(Some(i));
    }

    pub fn home(&mut self) {
        if self.row_count() > 0 {
            self.view.list_state.select(Some(0));
        }
    }

    pub fn end(&mut self) {
        let len = self.row_count();
        if len > 0 {
            self.view.list_state.select(Some(len - 1));
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// EVENT LOOP
// ============================================================================

/// What the loop wants from its owner
pub enum Action {
    Quit,
    Refetch,
}

pub fn run_ui<F>(app: &mut App, fetches: &Receiver<FetchOutcome>, mut refetch: F) -> Result<()>
where
    F: FnMut(),
{
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, fetches, &mut refetch);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: ratatui::backend::Backend, F: FnMut()>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    fetches: &Receiver<FetchOutcome>,
    refetch: &mut F,
) -> Result<()> {
    loop {
        // Fetch completions are applied here, between key events
        match fetches.try_recv() {
            Ok(outcome) => app.apply_fetch(outcome),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => app.fetching = false,
        }

        terminal.draw(|f| ui(f, app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if let Some(action) = handle_key(app, key.code) {
                match action {
                    Action::Quit => return Ok(()),
                    Action::Refetch => {
                        info!("refetch requested");
                        app.fetching = true;
                        refetch();
                    }
                }
            }
        }
    }
}

fn handle_key(app: &mut App, code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => return Some(Action::Quit),
        KeyCode::Char('r') if !app.fetching => return Some(Action::Refetch),
        KeyCode::Char('d') => app.toggle_detail(),
        KeyCode::Left | KeyCode::Char('h') => app.previous_chip(),
        KeyCode::Right | KeyCode::Char('l') => app.next_chip(),
        KeyCode::Enter | KeyCode::Char(' ') => app.tap_chip(),
        KeyCode::Down | KeyCode::Char('j') => app.next(),
        KeyCode::Up | KeyCode::Char('k') => app.previous(),
        KeyCode::PageDown => app.page_down(),
        KeyCode::PageUp => app.page_up(),
        KeyCode::Home => app.home(),
        KeyCode::End => app.end(),
        _ => {}
    }
    None
}

// ============================================================================
// DRAWING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Chip strip
            Constraint::Min(0),    // Entry list
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_chips(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_chips(f: &mut Frame, area: Rect, app: &App) {
    let highlighted = app.board.highlighted_chip();

    let mut spans = vec![];
    for (i, item) in app.rendered_items(Section::TypeSelector).iter().enumerate() {
        let Some(filter) = item.as_chip() else {
            continue;
        };
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }

        let mut style = if Some(item.id()) == highlighted {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        if i == app.chip_cursor {
            style = style.add_modifier(Modifier::UNDERLINED);
        }

        spans.push(Span::styled(filter.display_name().to_string(), style));
    }

    let chips = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Types "),
    );

    f.render_widget(chips, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["No.", "Name", "Types"].iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = app
        .rendered_items(Section::EntryList)
        .iter()
        .filter_map(|item| item.as_entry())
        .map(|entry| {
            let types = entry
                .categories
                .iter()
                .map(|c| c.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Row::new(vec![
                Cell::from(format!("{:>4}", entry.rank)),
                Cell::from(truncate(&entry.name, 24)),
                Cell::from(types).style(Style::default().fg(Color::Cyan)),
            ])
            .height(1)
        })
        .collect();

    let title = format!(" Entries ({}) ", app.board.selected_category());
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(26),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.view.list_state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let selected = app
        .view
        .list_state
        .selected()
        .and_then(|i| app.view.rendered.ids(Section::EntryList).get(i))
        .and_then(|id| app.board.current_snapshot().item(*id))
        .and_then(Item::as_entry);

    let content = match selected {
        Some(entry) => vec![
            Line::from(vec![
                Span::styled("No.   ", Style::default().fg(Color::Yellow)),
                Span::raw(entry.rank.to_string()),
            ]),
            Line::from(vec![
                Span::styled("Name  ", Style::default().fg(Color::Yellow)),
                Span::raw(entry.name.clone()),
            ]),
            Line::from(vec![
                Span::styled("Types ", Style::default().fg(Color::Yellow)),
                Span::raw(
                    entry
                        .categories
                        .iter()
                        .map(|c| c.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
            ]),
            Line::from(""),
            Line::from(Span::styled("Image", Style::default().fg(Color::Yellow))),
            Line::from(entry.thumbnail.clone()),
        ],
        None => vec![Line::from("No entry selected")],
    };

    let panel = Paragraph::new(content)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Detail "),
        );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.view.list_state.selected().map(|i| i + 1).unwrap_or(0);
    let total = app.row_count();

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, total),
        Style::default().fg(Color::Cyan),
    )];

    if app.fetching {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("Loading...", Style::default().fg(Color::Yellow)));
    }
    if let Some(status) = &app.status {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(status.clone(), Style::default().fg(Color::Red)));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("←/→", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Type | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Filter | "));
    status_spans.push(Span::styled("d", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Detail | "));
    status_spans.push(Span::styled("r", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Reload | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(Line::from(status_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_board::{CategoryLabel, Entry, NetworkFailure};

    fn loaded_app() -> App {
        let mut app = App::new();
        app.apply_fetch(Ok(vec![
            Entry::new(1, "bulbasaur", "", [CategoryLabel::from("grass")]),
            Entry::new(4, "charmander", "", [CategoryLabel::from("fire")]),
            Entry::new(7, "squirtle", "", [CategoryLabel::from("water")]),
        ]));
        app
    }

    #[test]
    fn test_fetch_renders_both_sections() {
        let app = loaded_app();
        assert_eq!(app.view.rendered.ids(Section::TypeSelector).len(), 4);
        assert_eq!(app.row_count(), 3);
        assert_eq!(app.view.list_state.selected(), Some(0));
        assert_eq!(app.chip_cursor, 0);
    }

    #[test]
    fn test_tap_chip_filters_rendered_rows() {
        let mut app = loaded_app();
        app.end();
        app.next_chip();
        app.next_chip(); // fire
        app.tap_chip();

        assert_eq!(app.row_count(), 1);
        assert_eq!(app.view.list_state.selected(), Some(0));
        assert_eq!(
            app.view.rendered.ids(Section::EntryList),
            app.board.current_snapshot().item_ids(Section::EntryList)
        );
    }

    #[test]
    fn test_fetch_failure_sets_status() {
        let mut app = loaded_app();
        app.apply_fetch(Err(NetworkFailure::new("offline")));

        assert_eq!(app.status.as_deref(), Some("Fetch failed: offline"));
        assert_eq!(app.row_count(), 3);
    }

    #[test]
    fn test_chip_cursor_wraps() {
        let mut app = loaded_app();
        app.previous_chip();
        assert_eq!(app.chip_cursor, 3);
        app.next_chip();
        assert_eq!(app.chip_cursor, 0);
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("flabébé", 10), "flabébé");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
