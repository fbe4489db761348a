// 🖥️ Interactive owner statement report (ratatui + crossterm)

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use owner_statements::{
    format_currency, format_percentage, write_reports, BalanceSource, BreakdownLine, ConfigManager,
    ConfigStore, LineType, ManualExpense, ReservationSource, SampleReservationSource,
    SettingsEditor, SettingsSource, StatementGenerator, StatementPeriod, StatementProcessor,
    StatementResult,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use rust_decimal::prelude::ToPrimitive;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    GenerateStatement,
    Configuration,
    History,
    Help,
}

const PAGES: [Page; 5] = [
    Page::Dashboard,
    Page::GenerateStatement,
    Page::Configuration,
    Page::History,
    Page::Help,
];

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::GenerateStatement,
            Page::GenerateStatement => Page::Configuration,
            Page::Configuration => Page::History,
            Page::History => Page::Help,
            Page::Help => Page::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dashboard => Page::Help,
            Page::GenerateStatement => Page::Dashboard,
            Page::Configuration => Page::GenerateStatement,
            Page::History => Page::Configuration,
            Page::Help => Page::History,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::GenerateStatement => "Generate Statement",
            Page::Configuration => "Configuration",
            Page::History => "History",
            Page::Help => "Help",
        }
    }
}

/// One line shown in the status bar
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

impl StatusMessage {
    fn info(text: impl Into<String>) -> Self {
        StatusMessage { text: text.into(), is_error: false }
    }

    fn error(text: impl Into<String>) -> Self {
        StatusMessage { text: text.into(), is_error: true }
    }
}

pub struct App {
    pub current_page: Page,
    pub store: ConfigStore,
    manager: ConfigManager,
    reservations: Box<dyn ReservationSource + Send + Sync>,
    balances: Box<dyn BalanceSource + Send + Sync>,
    pub period: StatementPeriod,
    pub manual_expenses: Vec<ManualExpense>,
    pub output_dir: PathBuf,
    pub tag_state: TableState,
    pub override_state: TableState,
    pub history_state: TableState,
    pub current: Option<StatementResult>,
    pub history: Vec<StatementResult>,
    pub status: Option<StatusMessage>,
}

impl App {
    pub fn new(
        store: ConfigStore,
        manager: ConfigManager,
        reservations: Box<dyn ReservationSource + Send + Sync>,
        balances: Box<dyn BalanceSource + Send + Sync>,
        period: StatementPeriod,
    ) -> Self {
        let mut tag_state = TableState::default();
        tag_state.select(Some(0));
        let mut override_state = TableState::default();
        if !store.client_overrides.is_empty() {
            override_state.select(Some(0));
        }

        App {
            current_page: Page::Dashboard,
            store,
            manager,
            reservations,
            balances,
            period,
            manual_expenses: Vec::new(),
            output_dir: PathBuf::from("."),
            tag_state,
            override_state,
            history_state: TableState::default(),
            current: None,
            history: Vec::new(),
            status: None,
        }
    }

    pub fn with_manual_expenses(mut self, manual_expenses: Vec<ManualExpense>) -> Self {
        self.manual_expenses = manual_expenses;
        self
    }

    pub fn with_output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    pub fn next_period(&mut self) {
        self.period = self.period.next();
    }

    pub fn previous_period(&mut self) {
        self.period = self.period.previous();
    }

    pub fn selected_tag(&self) -> Option<String> {
        let tags = self.store.tags();
        self.tag_state.selected().and_then(|i| tags.get(i).cloned())
    }

    pub fn selected_override(&self) -> Option<String> {
        self.override_state
            .selected()
            .and_then(|i| self.store.client_overrides.keys().nth(i).cloned())
    }

    /// Move the selection on whichever list the current page shows
    pub fn select_next(&mut self) {
        match self.current_page {
            Page::GenerateStatement => {
                let len = self.store.tags().len();
                step(&mut self.tag_state, len, true);
            }
            Page::Configuration => {
                let len = self.store.client_overrides.len();
                step(&mut self.override_state, len, true);
            }
            Page::History => step(&mut self.history_state, self.history.len(), true),
            _ => {}
        }
    }

    pub fn select_previous(&mut self) {
        match self.current_page {
            Page::GenerateStatement => {
                let len = self.store.tags().len();
                step(&mut self.tag_state, len, false);
            }
            Page::Configuration => {
                let len = self.store.client_overrides.len();
                step(&mut self.override_state, len, false);
            }
            Page::History => step(&mut self.history_state, self.history.len(), false),
            _ => {}
        }
    }

    /// Run a statement for the selected property. A failure lands in the
    /// status bar; the session keeps going.
    pub fn generate(&mut self) {
        let Some(tag) = self.selected_tag() else {
            self.status = Some(StatusMessage::error("No property selected"));
            return;
        };

        let outcome = StatementGenerator::new(
            &self.store,
            self.reservations.as_ref(),
            self.balances.as_ref(),
        )
        .generate(&tag, self.period, &self.manual_expenses);

        match outcome {
            Ok(result) => {
                self.status = Some(if result.discrepancy_found {
                    StatusMessage::error(format!(
                        "Statement for {} generated. Bank discrepancy of {}: do not process payouts",
                        tag,
                        format_currency(result.verification.discrepancy)
                    ))
                } else {
                    StatusMessage::info(format!("Statement for {} generated, bank balance verified", tag))
                });
                self.history.push(result.clone());
                self.history_state.select(Some(self.history.len() - 1));
                self.current = Some(result);
            }
            Err(err) => {
                self.status = Some(StatusMessage::error(format!("Error generating statement: {}", err)));
            }
        }
    }

    /// Write the markdown report and CSV export of the current statement
    pub fn export(&mut self) {
        let Some(result) = &self.current else {
            self.status = Some(StatusMessage::error("Generate a statement before exporting"));
            return;
        };

        self.status = Some(match write_reports(result, &self.output_dir) {
            Ok(files) => StatusMessage::info(format!(
                "Saved {} and {}",
                files.markdown.display(),
                files.csv.display()
            )),
            Err(err) => StatusMessage::error(format!("Export failed: {}", err)),
        });
    }

    /// Remove the selected property override and persist the store
    pub fn remove_selected_override(&mut self) {
        let Some(tag) = self.selected_override() else {
            self.status = Some(StatusMessage::error("No property override selected"));
            return;
        };

        if let Err(err) = self.store.remove_override(&tag) {
            self.status = Some(StatusMessage::error(err.to_string()));
            return;
        }

        let remaining = self.store.client_overrides.len();
        let selected = self.override_state.selected().unwrap_or(0);
        self.override_state.select(match remaining {
            0 => None,
            n => Some(selected.min(n - 1)),
        });
        let tags = self.store.tags().len();
        if self.tag_state.selected().map_or(true, |i| i >= tags) {
            self.tag_state.select(Some(0));
        }

        self.status = Some(match self.manager.save(&self.store) {
            Ok(()) => StatusMessage::info(format!("Removed settings for {}", tag)),
            Err(err) => StatusMessage::error(format!("Removed {} but saving failed: {}", tag, err)),
        });
    }

    /// Breakdown of the sample bookings under the default tag's settings.
    /// Empty when the configured percentages overflow.
    pub fn sample_breakdown(&self) -> Vec<BreakdownLine> {
        let tag = &self.store.default_settings.default_tag;
        StatementProcessor::new(&self.store)
            .process(tag, &SampleReservationSource::sample(tag), &[])
            .map(|statement| statement.breakdown())
            .unwrap_or_default()
    }
}

fn step(state: &mut TableState, len: usize, forward: bool) {
    if len == 0 {
        state.select(None);
        return;
    }
    let i = match state.selected() {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    state.select(Some(i));
}

pub fn run_ui(app: &mut App) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char(c @ '1'..='5') => {
                    let index = c as usize - '1' as usize;
                    app.current_page = PAGES[index];
                }
                KeyCode::Down | KeyCode::Char('j') => app.select_next(),
                KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
                KeyCode::Char(']') => app.next_period(),
                KeyCode::Char('[') => app.previous_period(),
                KeyCode::Enter | KeyCode::Char('g') if app.current_page == Page::GenerateStatement => {
                    app.generate()
                }
                KeyCode::Char('e') => app.export(),
                KeyCode::Char('d') if app.current_page == Page::Configuration => {
                    app.remove_selected_override()
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Dashboard => render_dashboard(f, chunks[1], app),
        Page::GenerateStatement => render_generate(f, chunks[1], app),
        Page::Configuration => render_configuration(f, chunks[1], app),
        Page::History => render_history(f, chunks[1], app),
        Page::Help => render_help(f, chunks[1]),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in PAGES.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Period: {}", app.period),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(Line::from(tab_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" 🏠 Owner Statements "),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{:<24}", text), Style::default().fg(Color::Cyan))
}

fn amount_color(line_type: LineType) -> Color {
    match line_type {
        LineType::Income => Color::Green,
        LineType::Expense => Color::Red,
        LineType::Payout => Color::Yellow,
    }
}

// ============================================================================
// DASHBOARD
// ============================================================================

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let defaults = &app.store.default_settings;
    let metrics = vec![
        Line::from(vec![
            label("Active properties"),
            Span::raw(app.store.active_properties().to_string()),
        ]),
        Line::from(vec![
            label("Default management fee"),
            Span::raw(format_percentage(defaults.management_fee_percentage)),
        ]),
        Line::from(vec![
            label("Supplies estimate"),
            Span::raw(format_percentage(defaults.supplies_estimate_percentage)),
        ]),
        Line::from(vec![
            label("Utilities estimate"),
            Span::raw(format_percentage(defaults.utilities_estimate_percentage)),
        ]),
        Line::from(vec![label("Default property"), Span::raw(defaults.default_tag.clone())]),
        Line::from(""),
        Line::from(vec![
            label("Statements this session"),
            Span::raw(app.history.len().to_string()),
        ]),
    ];

    let panel = Paragraph::new(metrics).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" 📊 Overview "),
    );
    f.render_widget(panel, chunks[0]);

    let breakdown = app.sample_breakdown();
    let bars: Vec<(String, u64)> = breakdown
        .iter()
        .map(|line| {
            let name = line.line_item.split_whitespace().next().unwrap_or("").to_string();
            (name, line.amount.abs().round().to_u64().unwrap_or(0))
        })
        .collect();
    let data: Vec<(&str, u64)> = bars.iter().map(|(name, value)| (name.as_str(), *value)).collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Sample breakdown ($) "),
        )
        .data(data.as_slice())
        .bar_width(11)
        .bar_gap(2)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));

    f.render_widget(chart, chunks[1]);
}

// ============================================================================
// GENERATE STATEMENT
// ============================================================================

fn render_generate(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(area);

    let tags = app.store.tags();
    let rows = tags.iter().map(|tag| {
        let settings = app.store.resolve(tag);
        Row::new(vec![
            Cell::from(truncate(tag, 24)),
            Cell::from(format_percentage(settings.management_fee_percentage)),
        ])
    });

    let properties = Table::new(rows, [Constraint::Min(10), Constraint::Length(6)])
        .header(header_row(&["Property", "Fee"]))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Properties "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ");

    f.render_stateful_widget(properties, chunks[0], &mut app.tag_state);

    match &app.current {
        Some(result) => render_statement(f, chunks[1], result),
        None => {
            let hint = Paragraph::new(vec![
                Line::from(format!(
                    "Select a property and press Enter to generate the {} statement.",
                    app.period
                )),
                Line::from(""),
                Line::from(format!("Manual expenses queued: {}", app.manual_expenses.len())),
            ])
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title(" Statement "));
            f.render_widget(hint, chunks[1]);
        }
    }
}

fn render_statement(f: &mut Frame, area: Rect, result: &StatementResult) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6),
            Constraint::Min(8),
            Constraint::Length(7),
        ])
        .split(area);

    let statement = &result.statement;
    let summary = vec![
        Line::from(vec![
            label("Total reservations"),
            Span::raw(statement.total_reservations.to_string()),
        ]),
        Line::from(vec![
            label("Reservation income"),
            Span::styled(format_currency(statement.reservation_income), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            label("Owner payout"),
            Span::styled(format_currency(statement.owner_payout), Style::default().fg(Color::Yellow)),
        ]),
        Line::from(vec![
            label("Management fee"),
            Span::raw(format_currency(statement.management_fee)),
        ]),
    ];
    let summary = Paragraph::new(summary).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} · {} ", result.tag, result.period)),
    );
    f.render_widget(summary, chunks[0]);

    let rows = result.breakdown.iter().map(|line| {
        Row::new(vec![
            Cell::from(line.line_item.clone()),
            Cell::from(format_currency(line.amount))
                .style(Style::default().fg(amount_color(line.line_type))),
            Cell::from(line.line_type.label()),
            Cell::from(line.payout_to.clone()),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(35),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
            Constraint::Percentage(30),
        ],
    )
    .header(header_row(&["Line Item", "Amount", "Type", "Payout To"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Financial Breakdown "),
    );
    f.render_widget(table, chunks[1]);

    let verification = &result.verification;
    let (color, verdict) = if verification.is_match {
        (Color::Green, "✅ Bank balance verified, payouts may be processed")
    } else {
        (Color::Red, "🚨 DISCREPANCY FOUND: do not process payouts until resolved")
    };
    let mut lines = vec![
        Line::from(vec![label("Expected payouts"), Span::raw(format_currency(verification.expected_amount))]),
        Line::from(vec![label("Actual balance"), Span::raw(format_currency(verification.actual_balance))]),
        Line::from(vec![label("Discrepancy"), Span::raw(format_currency(verification.discrepancy))]),
        Line::from(Span::styled(verdict, Style::default().fg(color).add_modifier(Modifier::BOLD))),
    ];
    if verification.simulation {
        lines.push(Line::from(Span::styled(
            "(simulated bank feed)",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(format!(" Bank Verification: {} ", verification.status)),
    );
    f.render_widget(panel, chunks[2]);
}

// ============================================================================
// CONFIGURATION
// ============================================================================

fn render_configuration(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(area);

    let defaults = &app.store.default_settings;
    let lines = vec![
        Line::from(vec![label("Management fee"), Span::raw(format_percentage(defaults.management_fee_percentage))]),
        Line::from(vec![label("Supplies estimate"), Span::raw(format_percentage(defaults.supplies_estimate_percentage))]),
        Line::from(vec![label("Utilities estimate"), Span::raw(format_percentage(defaults.utilities_estimate_percentage))]),
        Line::from(vec![label("Default tag"), Span::raw(defaults.default_tag.clone())]),
        Line::from(vec![
            label("Saved to"),
            Span::styled(app.manager.config_path().display().to_string(), Style::default().fg(Color::DarkGray)),
        ]),
    ];
    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" ⚙️  Default Settings "),
    );
    f.render_widget(panel, chunks[0]);

    let rows = app.store.client_overrides.keys().map(|tag| {
        let settings = app.store.resolve(tag);
        Row::new(vec![
            Cell::from(truncate(tag, 28)),
            Cell::from(settings.owner_name.unwrap_or_default()),
            Cell::from(settings.management_company.unwrap_or_default()),
            Cell::from(format_percentage(settings.management_fee_percentage)),
            Cell::from(format_percentage(settings.supplies_estimate_percentage)),
            Cell::from(format_percentage(settings.utilities_estimate_percentage)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(25),
            Constraint::Percentage(20),
            Constraint::Percentage(25),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
            Constraint::Percentage(10),
        ],
    )
    .header(header_row(&["Property", "Owner", "Company", "Fee", "Supplies", "Utilities"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Property Overrides ({}) ", app.store.active_properties())),
    )
    .highlight_style(
        Style::default()
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[1], &mut app.override_state);
}

// ============================================================================
// HISTORY
// ============================================================================

fn render_history(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.history.iter().map(|result| {
        let status_color = if result.discrepancy_found { Color::Red } else { Color::Green };
        Row::new(vec![
            Cell::from(result.run_id.to_string()[..8].to_string()),
            Cell::from(truncate(&result.tag, 24)),
            Cell::from(result.period.to_string()),
            Cell::from(format_currency(result.statement.reservation_income)),
            Cell::from(format_currency(result.statement.owner_payout)),
            Cell::from(format_currency(result.statement.management_fee)),
            Cell::from(result.verification.status.to_string()).style(Style::default().fg(status_color)),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Percentage(25),
            Constraint::Length(8),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Run", "Property", "Period", "Income", "Owner", "Fee", "Bank"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Statements this session ({}) ", app.history.len())),
    )
    .highlight_style(Style::default().bg(Color::Blue))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.history_state);
}

// ============================================================================
// HELP
// ============================================================================

fn render_help(f: &mut Frame, area: Rect) {
    let heading = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled("Calculation methodology", heading)),
        Line::from("  Supplies estimate   = cleaning fees × supplies %"),
        Line::from("  Utilities estimate  = reservation income × utilities %"),
        Line::from("  Net income          = income − supplies − utilities − other expenses"),
        Line::from("  Management fee      = net income × management fee %"),
        Line::from("  Owner payout        = net income − management fee"),
        Line::from(""),
        Line::from(Span::styled("Bank verification", heading)),
        Line::from("  Expected payouts (owner payout + management fee) are compared with the"),
        Line::from("  bank balance. A difference above $0.01 blocks payout processing."),
        Line::from(""),
        Line::from(Span::styled("Keys", heading)),
        Line::from("  Tab / Shift-Tab or 1-5   switch page"),
        Line::from("  ↑ ↓ / j k                move selection"),
        Line::from("  [ ]                      previous / next statement month"),
        Line::from("  Enter / g                generate statement (Generate page)"),
        Line::from("  e                        export markdown report and CSV"),
        Line::from("  d                        remove selected override (Configuration page)"),
        Line::from("  q / Esc                  quit"),
    ];

    let help = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title(" ❓ Help "));
    f.render_widget(help, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.current_page.title()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(status) = &app.status {
        let color = if status.is_error { Color::Red } else { Color::Green };
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(status.text.clone(), Style::default().fg(color)));
    } else {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" pages  "));
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" generate  "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" quit"));
    }

    let status = Paragraph::new(Line::from(status_spans))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
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
    use owner_statements::{FixedBalanceSource, InMemoryReservationSource, SimulatedBalanceSource};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn app_in(dir: &std::path::Path) -> App {
        App::new(
            ConfigStore::default(),
            ConfigManager::new(dir.join("config.json")),
            Box::new(SampleReservationSource),
            Box::new(SimulatedBalanceSource::new()),
            "2025-09".parse().unwrap(),
        )
        .with_output_dir(dir.to_path_buf())
    }

    #[test]
    fn test_page_cycle() {
        let mut page = Page::Dashboard;
        for _ in 0..PAGES.len() {
            page = page.next();
        }
        assert_eq!(page, Page::Dashboard);
        assert_eq!(Page::Dashboard.previous(), Page::Help);
    }

    #[test]
    fn test_generate_records_history_and_flags_discrepancy() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.current_page = Page::GenerateStatement;

        app.generate();

        let result = app.current.as_ref().unwrap();
        assert_eq!(result.statement.owner_payout, dec!(4736));
        assert!(result.discrepancy_found);
        assert_eq!(app.history.len(), 1);
        assert!(app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn test_generate_failure_keeps_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(
            ConfigStore::default(),
            ConfigManager::new(dir.path().join("config.json")),
            Box::new(owner_statements::CsvReservationSource::new(dir.path().join("missing.csv"))),
            Box::new(FixedBalanceSource::new(dec!(0))),
            "2025-09".parse().unwrap(),
        );

        app.generate();

        assert!(app.current.is_none());
        assert!(app.history.is_empty());
        let status = app.status.unwrap();
        assert!(status.is_error);
        assert!(status.text.starts_with("Error generating statement"));
    }

    #[test]
    fn test_export_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());

        app.export();
        assert!(app.status.as_ref().unwrap().is_error);

        app.generate();
        app.export();
        assert!(!app.status.as_ref().unwrap().is_error);
        assert!(dir.path().join("owner_statement_480_Laswell_Ave_2025-09.md").exists());
        assert!(dir.path().join("owner_statement_data_480_Laswell_Ave_2025-09.csv").exists());
    }

    #[test]
    fn test_remove_override_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.current_page = Page::Configuration;

        app.remove_selected_override();

        assert_eq!(app.store.active_properties(), 0);
        assert_eq!(app.override_state.selected(), None);
        assert_eq!(app.selected_tag().as_deref(), Some("480 Laswell Ave"));

        let reloaded = ConfigManager::new(dir.path().join("config.json")).load().unwrap();
        assert!(reloaded.client_overrides.is_empty());
    }

    #[test]
    fn test_selection_wraps() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::default();
        store
            .add_override("12 Oak St", owner_statements::SettingsOverride::new())
            .unwrap();
        let mut app = App::new(
            store,
            ConfigManager::new(dir.path().join("config.json")),
            Box::new(InMemoryReservationSource::new(Vec::new())),
            Box::new(SimulatedBalanceSource::new()),
            "2025-09".parse().unwrap(),
        );
        app.current_page = Page::GenerateStatement;

        assert_eq!(app.selected_tag().as_deref(), Some("12 Oak St"));
        app.select_next();
        assert_eq!(app.selected_tag().as_deref(), Some("480 Laswell Ave"));
        app.select_next();
        assert_eq!(app.selected_tag().as_deref(), Some("12 Oak St"));
        app.select_previous();
        assert_eq!(app.selected_tag().as_deref(), Some("480 Laswell Ave"));
    }

    #[test]
    fn test_period_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_in(dir.path());
        app.previous_period();
        assert_eq!(app.period.to_string(), "2025-08");
        app.next_period();
        app.next_period();
        assert_eq!(app.period.to_string(), "2025-10");
    }

    #[test]
    fn test_sample_breakdown_matches_sample_bookings() {
        let dir = tempfile::tempdir().unwrap();
        let app = app_in(dir.path());
        let breakdown = app.sample_breakdown();
        assert_eq!(breakdown.first().unwrap().amount, dec!(6500));
        assert_eq!(breakdown.last().unwrap().amount, dec!(4736));
    }

    #[test]
    fn test_overflowing_settings_keep_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::default();
        store.default_settings.management_fee_percentage = Decimal::MAX;
        store.client_overrides.clear();
        let mut app = App::new(
            store,
            ConfigManager::new(dir.path().join("config.json")),
            Box::new(SampleReservationSource),
            Box::new(SimulatedBalanceSource::new()),
            "2025-09".parse().unwrap(),
        );

        assert!(app.sample_breakdown().is_empty());

        app.generate();
        assert!(app.current.is_none());
        assert!(app.status.as_ref().unwrap().is_error);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("480 Laswell Ave", 24), "480 Laswell Ave");
        assert_eq!(truncate("1234567890", 8), "12345...");
    }
}
