use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_tracker::{
    DisplayConfig, Expense, ExpenseForm, ExpenseId, Filter, FormField, LedgerStore,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Adding,
    ConfirmDelete(ExpenseId),
    ConfirmClear(Filter),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

pub struct App {
    pub store: LedgerStore,
    pub form: ExpenseForm,
    pub mode: Mode,
    pub state: TableState,
    pub show_stats: bool,
    pub status: Option<StatusMessage>,
    pub display: DisplayConfig,
}

impl App {
    pub fn new(store: LedgerStore, display: DisplayConfig) -> Self {
        let mut app = Self {
            store,
            form: ExpenseForm::new(),
            mode: Mode::Browse,
            state: TableState::default(),
            show_stats: false,
            status: None,
            display,
        };
        app.sync_selection();
        app
    }

    pub fn selected_expense(&self) -> Option<&Expense> {
        let visible = self.store.filtered_records();
        self.state.selected().and_then(|i| visible.get(i).copied())
    }

    /// Handle one key press. Returns true when the screen should close.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match self.mode {
            Mode::Browse => return self.handle_browse_key(key),
            Mode::Adding => self.handle_form_key(key),
            Mode::ConfirmDelete(id) => self.handle_confirm_delete(key, id),
            Mode::ConfirmClear(scope) => self.handle_confirm_clear(key, scope),
        }
        false
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('a') => {
                self.status = None;
                self.mode = Mode::Adding;
            }
            KeyCode::Char('f') => self.apply_filter(self.store.active_filter().next()),
            KeyCode::Char('F') => self.apply_filter(self.store.active_filter().previous()),
            KeyCode::Char(c @ '0'..='7') => {
                let choices = Filter::choices();
                if let Some(filter) = c.to_digit(10).and_then(|d| choices.get(d as usize)) {
                    self.apply_filter(*filter);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(id) = self.selected_expense().map(|e| e.id) {
                    self.mode = Mode::ConfirmDelete(id);
                }
            }
            KeyCode::Char('X') => {
                if !self.store.filtered_records().is_empty() {
                    self.mode = Mode::ConfirmClear(self.store.active_filter());
                }
            }
            KeyCode::Char('s') => self.show_stats = !self.show_stats,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.select_first(),
            KeyCode::End => {
                let len = self.store.filtered_records().len();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            _ => {}
        }
        false
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.form.cancel();
                self.mode = Mode::Browse;
                self.status = Some(StatusMessage::info("Add cancelled"));
            }
            KeyCode::Enter => match self.form.submit(&mut self.store) {
                Ok(id) => {
                    self.mode = Mode::Browse;
                    let added = self
                        .store
                        .get(id)
                        .map(|e| format!("Added {} {}", e.description, self.display.format_amount(e.amount)))
                        .unwrap_or_else(|| "Added".to_string());
                    self.status = Some(StatusMessage::info(added));
                    self.select_first();
                }
                Err(e) => self.status = Some(StatusMessage::error(e.to_string())),
            },
            KeyCode::BackTab => self.form.previous_field(),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.form.previous_field();
                } else {
                    self.form.next_field();
                }
            }
            KeyCode::Left if self.form.focus == FormField::Category => self.form.previous_category(),
            KeyCode::Right if self.form.focus == FormField::Category => self.form.next_category(),
            KeyCode::Backspace => self.form.pop_char(),
            KeyCode::Char(c) => self.form.push_char(c),
            _ => {}
        }
    }

    fn handle_confirm_delete(&mut self, key: KeyEvent, id: ExpenseId) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let description = self.store.get(id).map(|e| e.description.clone());
                if self.store.delete_expense(id) {
                    self.status = Some(StatusMessage::info(format!(
                        "Deleted {}",
                        description.unwrap_or_default()
                    )));
                }
                self.mode = Mode::Browse;
                self.sync_selection();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = Mode::Browse;
            }
            _ => {}
        }
    }

    fn handle_confirm_clear(&mut self, key: KeyEvent, scope: Filter) {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                let removed = self.store.clear(scope);
                self.status = Some(StatusMessage::info(format!(
                    "Deleted {} {} expense(s)",
                    removed,
                    scope.label()
                )));
                self.mode = Mode::Browse;
                self.sync_selection();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.mode = Mode::Browse;
            }
            _ => {}
        }
    }

    pub fn apply_filter(&mut self, filter: Filter) {
        self.store.set_filter(filter);
        self.select_first();
    }

    fn select_first(&mut self) {
        if self.store.filtered_records().is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    /// Keep the selection inside the filtered view after rows disappear
    fn sync_selection(&mut self) {
        let len = self.store.filtered_records().len();
        match self.state.selected() {
            _ if len == 0 => self.state.select(None),
            Some(i) if i >= len => self.state.select(Some(len - 1)),
            None => self.state.select(Some(0)),
            _ => {}
        }
    }

    pub fn next(&mut self) {
        let len = self.store.filtered_records().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i >= len - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.store.filtered_records().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => {
                if i == 0 {
                    len - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    info!(records = app.store.len(), "screen closed");
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            // Windows reports releases too
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with filter tabs and total
            Constraint::Min(0),    // Expense list
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_stats {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_stats_panel(f, content_chunks[1], app);
    } else {
        render_table(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);

    match app.mode {
        Mode::Browse => {}
        Mode::Adding => render_form(f, app),
        Mode::ConfirmDelete(id) => {
            let prompt = match app.store.get(id) {
                Some(e) => format!(
                    "Delete \"{}\" ({})?",
                    e.description,
                    app.display.format_amount(e.amount)
                ),
                None => "Delete this expense?".to_string(),
            };
            render_confirm(f, " Delete Expense ", &prompt);
        }
        Mode::ConfirmClear(scope) => {
            let prompt = match scope {
                Filter::All => "Delete ALL expenses?".to_string(),
                Filter::Category(c) => format!("Delete all {} expenses?", c),
            };
            render_confirm(f, " Clear Expenses ", &prompt);
        }
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let active = app.store.active_filter();
    let summary = app.store.summary();

    let mut spans = vec![Span::styled(
        " Expenses ",
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];

    for (i, filter) in Filter::choices().iter().enumerate() {
        spans.push(Span::raw(" │ "));
        let style = if *filter == active {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!("{} {}", i, filter.label()), style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Total: {}", app.display.format_amount(summary.total)),
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ));
    spans.push(Span::styled(
        format!(" ({} items)", summary.count),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let visible = app.store.filtered_records();

    if visible.is_empty() {
        let hint = match app.store.active_filter() {
            Filter::All => "No expenses yet. Press 'a' to add one.".to_string(),
            Filter::Category(c) => format!("No {} expenses.", c),
        };
        let empty = Paragraph::new(vec![Line::from(""), Line::from(format!("  {}", hint))]).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Expenses "),
        );
        f.render_widget(empty, area);
        return;
    }

    let header_cells = ["Category", "Description", "Amount", "Date"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows: Vec<Row> = visible
        .iter()
        .map(|e| {
            Row::new(vec![
                Cell::from(format!("{} {}", e.icon(), e.category)),
                Cell::from(truncate(&e.description, 40)),
                Cell::from(app.display.format_amount(e.amount))
                    .style(Style::default().fg(Color::Red)),
                Cell::from(e.display_date(&app.display.date_format))
                    .style(Style::default().fg(Color::DarkGray)),
            ])
            .height(1)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(18),
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Expenses "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_stats_panel(f: &mut Frame, area: Rect, app: &App) {
    let stats = app.store.category_stats();

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Total: ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            Span::raw(app.display.format_amount(stats.total_amount)),
            Span::raw(format!("  ({} expenses)", stats.total_expenses)),
        ]),
        Line::from(""),
    ];

    for s in &stats.categories {
        content.push(Line::from(vec![
            Span::raw(format!("  {} ", s.category.icon())),
            Span::styled(
                format!("{:<15}", s.category.as_str()),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw(format!("{:>12}", app.display.format_amount(s.total))),
            Span::styled(
                format!("{:>8.2}%", s.percentage),
                Style::default().fg(Color::Green),
            ),
            Span::styled(format!("  x{}", s.count), Style::default().fg(Color::DarkGray)),
        ]));
    }

    let panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" By Category "),
    );

    f.render_widget(panel, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();

    if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        spans.push(Span::styled(format!(" {} ", status.text), Style::default().fg(color)));
        spans.push(Span::raw(" | "));
    }

    let keys: &[(&str, &str)] = match app.mode {
        Mode::Browse => &[
            ("a", " Add | "),
            ("d", " Delete | "),
            ("f/0-7", " Filter | "),
            ("s", " Stats | "),
            ("X", " Clear | "),
        ],
        Mode::Adding => &[
            ("Tab", " Field | "),
            ("←/→", " Category | "),
            ("Enter", " Save | "),
            ("Esc", " Cancel"),
        ],
        Mode::ConfirmDelete(_) | Mode::ConfirmClear(_) => &[("y", " Yes | "), ("n", " No")],
    };

    for (key, label) in keys {
        spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(*label));
    }
    if app.mode == Mode::Browse {
        spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn render_form(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 11, f.size());
    let form = &app.form;

    let field = |label: &str, value: String, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::styled(format!("  {:<13}", label), Style::default().fg(Color::Cyan)),
            Span::styled(format!("{}{}", value, cursor), style),
        ])
    };

    let category = if form.focus == FormField::Category {
        format!("◀ {} {} ▶", form.category.icon(), form.category)
    } else {
        format!("{} {}", form.category.icon(), form.category)
    };

    let content = vec![
        Line::from(""),
        field("Amount:", form.amount.clone(), form.focus == FormField::Amount),
        Line::from(""),
        field(
            "Description:",
            form.description.clone(),
            form.focus == FormField::Description,
        ),
        Line::from(""),
        field("Category:", category, form.focus == FormField::Category),
        Line::from(""),
        Line::from(Span::styled(
            "  Enter to save, Esc to cancel",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )),
    ];

    let popup = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Add Expense "),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

fn render_confirm(f: &mut Frame, title: &str, prompt: &str) {
    let area = centered_rect(50, 7, f.size());

    let content = vec![
        Line::from(""),
        Line::from(format!("  {}", prompt)),
        Line::from(""),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("y", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            Span::raw(" delete   "),
            Span::styled("n", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
            Span::raw(" keep"),
        ]),
    ];

    let popup = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(title.to_string()),
    );

    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

/// Rect of `width_percent` x `height` rows centered in `area`
fn centered_rect(width_percent: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let width = (u32::from(area.width) * u32::from(width_percent.min(100)) / 100) as u16;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
