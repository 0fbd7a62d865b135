use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::api::ApiClient;
use crate::dropdown::{Dropdown, SelectMode};
use crate::filter::{narrow_options, visible_jobs, SelectionState};
use crate::loader::{spawn_fetch, LoadState};
use crate::models::{Job, RefOption};
use crate::refdata;

/// Which control owns the keyboard. Moving focus away from an open dropdown
/// dismisses it, the terminal stand-in for an outside click.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    List,
    Search,
    Categories,
    JobTypes,
    Location,
}

/// Both enumerations arrive in one fetch; categories keep their own error
/// (no fallback exists for them), job types always yield a usable list.
struct RefDataBundle {
    categories: Result<Vec<RefOption>, String>,
    job_types: Vec<RefOption>,
    job_type_warning: Option<String>,
}

struct AppState {
    jobs: LoadState<Vec<Job>>,
    categories: LoadState<Vec<RefOption>>,
    job_types: Vec<RefOption>,
    locations: Vec<RefOption>,
    warning: Option<String>,

    selection: SelectionState,
    category_dd: Dropdown,
    job_type_dd: Dropdown,
    location_dd: Dropdown,
    focus: Focus,
    dd_cursor: usize,

    selected: usize,
    scroll_offset: u16,
    authenticated: bool,

    jobs_rx: Option<Receiver<Result<Vec<Job>>>>,
    refdata_rx: Option<Receiver<Result<RefDataBundle>>>,
}

impl AppState {
    fn new(authenticated: bool) -> Self {
        Self {
            jobs: LoadState::Idle,
            categories: LoadState::Idle,
            job_types: Vec::new(),
            locations: refdata::locations(),
            warning: None,
            selection: SelectionState::new(),
            category_dd: Dropdown::new(SelectMode::Multi),
            job_type_dd: Dropdown::new(SelectMode::Multi),
            location_dd: Dropdown::new(SelectMode::Single),
            focus: Focus::List,
            dd_cursor: 0,
            selected: 0,
            scroll_offset: 0,
            authenticated,
            jobs_rx: None,
            refdata_rx: None,
        }
    }

    /// Kick off (or re-kick, on the reload key) both fetches. Any result
    /// from a previous round still in flight is abandoned with its channel.
    fn start_loading(&mut self, api: &ApiClient) {
        self.jobs = LoadState::Loading;
        self.categories = LoadState::Loading;
        self.warning = None;

        let jobs_api = api.clone();
        self.jobs_rx = Some(spawn_fetch(move || jobs_api.fetch_jobs()));

        let ref_api = api.clone();
        self.refdata_rx = Some(spawn_fetch(move || {
            let categories = ref_api
                .fetch_categories()
                .map_err(|err| format!("{:#}", err));
            let (job_types, job_type_warning) = ref_api.job_types_or_fallback();
            Ok(RefDataBundle {
                categories,
                job_types,
                job_type_warning,
            })
        }));
    }

    /// Apply any finished fetches. Results are only ever committed here,
    /// from the live event loop.
    fn poll_fetches(&mut self) {
        use std::sync::mpsc::TryRecvError;

        if let Some(rx) = self.jobs_rx.take() {
            match rx.try_recv() {
                Ok(result) => {
                    self.jobs.settle(result);
                    self.selected = 0;
                    self.scroll_offset = 0;
                }
                Err(TryRecvError::Empty) => self.jobs_rx = Some(rx),
                Err(TryRecvError::Disconnected) => {
                    self.jobs = LoadState::Failed("job fetch stopped unexpectedly".to_string());
                }
            }
        }
        if let Some(rx) = self.refdata_rx.take() {
            match rx.try_recv() {
                Ok(Ok(bundle)) => {
                    self.categories = match bundle.categories {
                        Ok(options) => LoadState::Ready(options),
                        Err(msg) => LoadState::Failed(msg),
                    };
                    self.job_types = bundle.job_types;
                    if let Some(warning) = bundle.job_type_warning {
                        self.warning =
                            Some(format!("job types unavailable, using builtins ({})", warning));
                    }
                }
                Ok(Err(err)) => {
                    self.categories = LoadState::Failed(format!("{:#}", err));
                }
                Err(TryRecvError::Empty) => self.refdata_rx = Some(rx),
                Err(TryRecvError::Disconnected) => {
                    self.categories =
                        LoadState::Failed("reference data fetch stopped unexpectedly".to_string());
                }
            }
        }
    }

    fn all_jobs(&self) -> &[Job] {
        self.jobs.ready().map(Vec::as_slice).unwrap_or(&[])
    }

    fn open_dropdown(&mut self) -> Option<&mut Dropdown> {
        match self.focus {
            Focus::Categories => Some(&mut self.category_dd),
            Focus::JobTypes => Some(&mut self.job_type_dd),
            Focus::Location => Some(&mut self.location_dd),
            _ => None,
        }
    }

    /// Candidate options for the focused dropdown, narrowed by its local
    /// search text. Category options come from the server; a failed fetch
    /// leaves them empty (the error banner explains why).
    fn dropdown_options(&self) -> Vec<RefOption> {
        let (options, term): (&[RefOption], &str) = match self.focus {
            Focus::Categories => (
                self.categories.ready().map(Vec::as_slice).unwrap_or(&[]),
                &self.category_dd.search_term,
            ),
            Focus::JobTypes => (&self.job_types, &self.job_type_dd.search_term),
            Focus::Location => (&self.locations, &self.location_dd.search_term),
            _ => return Vec::new(),
        };
        narrow_options(options, term).into_iter().cloned().collect()
    }

    /// Leaving a control closes its popup, like clicking elsewhere on the
    /// page.
    fn focus_list(&mut self) {
        self.category_dd.dismiss();
        self.job_type_dd.dismiss();
        self.location_dd.dismiss();
        self.focus = Focus::List;
    }

    fn toggle_dropdown(&mut self, focus: Focus) {
        if self.focus == focus {
            self.focus_list();
            return;
        }
        self.focus_list();
        self.focus = focus;
        self.dd_cursor = 0;
        if let Some(dd) = self.open_dropdown() {
            dd.toggle();
        }
    }

    /// Enter on a highlighted option: multi-select toggles and stays open,
    /// the location single-select sets (or clears) and closes.
    fn choose_highlighted(&mut self) {
        let options = self.dropdown_options();
        let Some(option) = options.get(self.dd_cursor) else {
            return;
        };
        let option = option.clone();
        match self.focus {
            Focus::Categories => {
                self.selection.toggle_category(&option.label);
                self.category_dd.selected();
            }
            Focus::JobTypes => {
                self.selection.toggle_job_type(&option.label);
                self.job_type_dd.selected();
            }
            Focus::Location => {
                self.selection.set_location(&option.value);
                self.location_dd.selected();
                self.focus = Focus::List;
            }
            _ => {}
        }
    }

    fn next(&mut self, visible_len: usize) {
        if visible_len > 0 && self.selected < visible_len - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }
}

pub fn run_board(api: ApiClient, authenticated: bool) -> Result<()> {
    let mut state = AppState::new(authenticated);
    state.start_loading(&api);

    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, &api);

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    api: &ApiClient,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        state.poll_fetches();

        let visible_len = visible_jobs(state.all_jobs(), &state.selection).len();
        if state.selected >= visible_len {
            state.selected = visible_len.saturating_sub(1);
        }
        list_state.select(if visible_len == 0 {
            None
        } else {
            Some(state.selected)
        });

        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match state.focus {
            Focus::Search => match key.code {
                KeyCode::Esc | KeyCode::Enter => state.focus = Focus::List,
                KeyCode::Backspace => {
                    let mut term = state.selection.search_term.clone();
                    term.pop();
                    state.selection.set_search_term(&term);
                    state.selected = 0;
                }
                KeyCode::Char(c) => {
                    let term = format!("{}{}", state.selection.search_term, c);
                    state.selection.set_search_term(&term);
                    state.selected = 0;
                }
                _ => {}
            },
            Focus::Categories | Focus::JobTypes | Focus::Location => match key.code {
                KeyCode::Esc => state.focus_list(),
                KeyCode::Down => {
                    let max = state.dropdown_options().len().saturating_sub(1);
                    if state.dd_cursor < max {
                        state.dd_cursor += 1;
                    }
                }
                KeyCode::Up => state.dd_cursor = state.dd_cursor.saturating_sub(1),
                KeyCode::Enter => {
                    state.choose_highlighted();
                    state.selected = 0;
                }
                KeyCode::Backspace => {
                    if let Some(dd) = state.open_dropdown() {
                        dd.pop_search();
                    }
                    state.dd_cursor = 0;
                }
                KeyCode::Delete => {
                    match state.focus {
                        Focus::Categories => state.selection.clear_categories(),
                        Focus::JobTypes => state.selection.clear_job_types(),
                        Focus::Location => state.selection.selected_location.clear(),
                        _ => {}
                    }
                    state.selected = 0;
                }
                KeyCode::Char(c) => {
                    if let Some(dd) = state.open_dropdown() {
                        dd.push_search(c);
                    }
                    state.dd_cursor = 0;
                }
                _ => {}
            },
            Focus::List => match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Char('/') => state.focus = Focus::Search,
                KeyCode::Char('c') => state.toggle_dropdown(Focus::Categories),
                KeyCode::Char('t') => state.toggle_dropdown(Focus::JobTypes),
                KeyCode::Char('l') => state.toggle_dropdown(Focus::Location),
                KeyCode::Char('C') => {
                    state.selection.clear_all();
                    state.selected = 0;
                }
                KeyCode::Char('r') => state.start_loading(api),
                KeyCode::Down | KeyCode::Char('j') => state.next(visible_len),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                _ => {}
            },
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_search_bar(frame, state, rows[0]);
    draw_filter_line(frame, state, rows[1]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[2]);

    draw_job_list(frame, state, panes[0], list_state);
    draw_detail(frame, state, panes[1]);
    draw_footer(frame, state, rows[3]);

    if state.category_dd.is_open() || state.job_type_dd.is_open() || state.location_dd.is_open() {
        draw_dropdown_overlay(frame, state, rows[2]);
    }
}

fn draw_search_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let style = if state.focus == Focus::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let search = Paragraph::new(state.selection.search_term.as_str())
        .style(style)
        .block(Block::default().borders(Borders::ALL).title(" Search "));
    frame.render_widget(search, area);
}

fn draw_filter_line(frame: &mut Frame, state: &AppState, area: Rect) {
    let mut spans: Vec<Span> = Vec::new();
    for label in &state.selection.selected_categories {
        spans.push(Span::styled(
            format!("[{}] ", label),
            Style::default().fg(Color::Cyan),
        ));
    }
    for label in &state.selection.selected_job_types {
        spans.push(Span::styled(
            format!("[{}] ", label),
            Style::default().fg(Color::Magenta),
        ));
    }
    if !state.selection.selected_location.is_empty() {
        let label = refdata::label_for(&state.locations, &state.selection.selected_location);
        spans.push(Span::styled(
            format!("[{}] ", label),
            Style::default().fg(Color::Green),
        ));
    }
    if spans.is_empty() {
        spans.push(Span::styled(
            "no filters (c:categories t:job types l:location)",
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_job_list(frame: &mut Frame, state: &AppState, area: Rect, list_state: &mut ListState) {
    match &state.jobs {
        LoadState::Idle | LoadState::Loading => {
            let loading = Paragraph::new("Loading jobs...")
                .block(Block::default().borders(Borders::ALL).title(" Jobs "));
            frame.render_widget(loading, area);
            return;
        }
        LoadState::Failed(msg) => {
            let error = Paragraph::new(format!("Failed to load jobs:\n{}\n\nPress r to retry.", msg))
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(" Jobs "));
            frame.render_widget(error, area);
            return;
        }
        LoadState::Ready(_) => {}
    }

    let visible = visible_jobs(state.all_jobs(), &state.selection);
    let items: Vec<ListItem> = visible
        .iter()
        .map(|job| {
            let marker = if job.featured.unwrap_or(false) { "*" } else { " " };
            let company = job.company_name.as_deref().unwrap_or("?");
            let title = job.title_or_untitled();
            let title = if title.chars().count() > 32 {
                let cut: String = title.chars().take(29).collect();
                format!("{}...", cut)
            } else {
                title.to_string()
            };
            ListItem::new(format!("{} {} | {}", marker, title, company))
        })
        .collect();

    let found = if state.selection.is_empty() { "" } else { " found" };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " {} Remote Jobs{} ",
            visible.len(),
            found
        )))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, list_state);
}

fn draw_detail(frame: &mut Frame, state: &AppState, area: Rect) {
    let detail = build_detail(state, area.width.saturating_sub(4) as usize);
    let widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(widget, area);
}

fn build_detail(state: &AppState, width: usize) -> Text<'_> {
    let visible = visible_jobs(state.all_jobs(), &state.selection);
    let Some(job) = visible.get(state.selected) else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        job.title_or_untitled().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if let Some(company) = &job.company_name {
        lines.push(Line::from(format!("at {}", company)));
    }
    if job.featured.unwrap_or(false) {
        lines.push(Line::from(Span::styled(
            "Featured",
            Style::default().fg(Color::Yellow),
        )));
    }
    lines.push(Line::from(""));
    if let Some(category) = &job.category {
        lines.push(Line::from(format!("Category: {}", category)));
    }
    if let Some(job_type) = &job.job_type {
        lines.push(Line::from(format!("Type: {}", job_type)));
    }
    if let Some(location) = &job.location {
        lines.push(Line::from(format!("Location: {}", location)));
    }
    if let Some(salary) = &job.salary {
        lines.push(Line::from(format!("Salary: {}", salary)));
    }
    if let Some(posted) = job.posted_date() {
        lines.push(Line::from(format!("Posted: {}", posted)));
    }
    lines.push(Line::from(""));

    let body = job
        .description
        .as_deref()
        .or(job.short_description.as_deref());
    match body {
        Some(text) => {
            for line in textwrap::fill(text, width.max(20)).lines() {
                lines.push(Line::from(line.to_string()));
            }
        }
        None => lines.push(Line::from(Span::styled(
            "(no description)",
            Style::default().fg(Color::DarkGray),
        ))),
    }

    if !state.authenticated {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Sign in to view and apply for exclusive opportunities (rtjobs login)",
            Style::default().fg(Color::DarkGray),
        )));
    }

    Text::from(lines)
}

fn draw_dropdown_overlay(frame: &mut Frame, state: &AppState, area: Rect) {
    let (title, dd, selected_labels): (&str, &Dropdown, Vec<String>) = match state.focus {
        Focus::Categories => (
            " Categories ",
            &state.category_dd,
            state.selection.selected_categories.clone(),
        ),
        Focus::JobTypes => (
            " Job Types ",
            &state.job_type_dd,
            state.selection.selected_job_types.clone(),
        ),
        Focus::Location => {
            let current = &state.selection.selected_location;
            let labels = if current.is_empty() {
                Vec::new()
            } else {
                vec![refdata::label_for(&state.locations, current).to_string()]
            };
            (" Location ", &state.location_dd, labels)
        }
        _ => return,
    };

    let options = state.dropdown_options();
    let height = (options.len() as u16 + 4).min(area.height);
    let width = (area.width / 2).max(30).min(area.width);
    let popup = Rect {
        x: area.x + 1,
        y: area.y,
        width,
        height,
    };
    frame.render_widget(Clear, popup);

    let mut lines = vec![Line::from(format!("search: {}", dd.search_term))];
    if options.is_empty() {
        lines.push(Line::from(Span::styled(
            "No match.",
            Style::default().fg(Color::DarkGray),
        )));
    }
    for (i, option) in options.iter().enumerate() {
        let picked = match state.focus {
            Focus::Location => state.selection.selected_location == option.value,
            _ => selected_labels.iter().any(|l| l == &option.label),
        };
        let mark = if picked { "x" } else { " " };
        let style = if i == state.dd_cursor {
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(
            format!("[{}] {}", mark, option.label),
            style,
        )));
    }

    let popup_widget = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(popup_widget, popup);
}

fn draw_footer(frame: &mut Frame, state: &AppState, area: Rect) {
    let mut help = String::from(
        " /:search c:categories t:types l:location C:clear r:reload j/k:navigate J/K:scroll q:quit",
    );
    if let Some(warning) = &state.warning {
        help = format!(" {} | {}", warning, help.trim_start());
    } else if let Some(msg) = state.categories.error() {
        help = format!(" categories unavailable: {} | {}", msg, help.trim_start());
    }
    let footer = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, area);
}
