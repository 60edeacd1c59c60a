// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use dealdesk_app::csv::{self, ImportMode};
use dealdesk_app::filter::{FilterParams, SortSpec};
use dealdesk_app::validation::{
    format_compact_cents, parse_optional_date, parse_required_cents,
};
use dealdesk_app::{
    AppCommand, AppEvent, AppMode, AppState, Deal, DealId, FormKind, LeadFormInput, LeadKind,
    PendingAction, PipelineSummary, Priority, Rating, SortDirection, SortKey, Stage, ViewMode,
    board, filter, paging,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;

const STATUS_CLEAR_SECS: u64 = 4;
const SORT_MARK_DESC: &str = "▼";
const SORT_MARK_ASC: &str = "▲";

/// Seam between the presentation layer and the deal store. The CLI
/// provides the real store-backed implementation; tests use an
/// in-memory one.
pub trait AppRuntime {
    fn load_deals(&mut self) -> Result<Vec<Deal>>;
    fn create_deal(&mut self, deal: Deal) -> Result<Vec<Deal>>;
    fn move_deal(&mut self, id: &DealId, target: Stage) -> Result<Vec<Deal>>;
    fn append_deals(&mut self, incoming: Vec<Deal>) -> Result<Vec<Deal>>;
    fn replace_deals(&mut self, deals: Vec<Deal>) -> Result<Vec<Deal>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct BoardCursor {
    column: usize,
    row: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Search,
    Assignee,
    DateRange,
    ImportPath,
}

impl PromptKind {
    const fn title(self) -> &'static str {
        match self {
            Self::Search => "search company/contact",
            Self::Assignee => "filter by assignee (empty = all)",
            Self::DateRange => "due range YYYY-MM-DD..YYYY-MM-DD (empty = all)",
            Self::ImportPath => "import CSV from path",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PromptUiState {
    kind: PromptKind,
    input: String,
}

#[derive(Debug, Clone, PartialEq)]
struct ImportChoiceUiState {
    rows: Vec<Deal>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct MovePickerUiState {
    deal: DealId,
    cursor: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormField {
    Kind,
    Name,
    Contact,
    Phone,
    Email,
    Budget,
    TargetStage,
    Rating,
    Tags,
    Notes,
}

impl FormField {
    const ALL: [Self; 10] = [
        Self::Kind,
        Self::Name,
        Self::Contact,
        Self::Phone,
        Self::Email,
        Self::Budget,
        Self::TargetStage,
        Self::Rating,
        Self::Tags,
        Self::Notes,
    ];

    const fn is_choice(self) -> bool {
        matches!(self, Self::Kind | Self::TargetStage | Self::Rating)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LeadFormUiState {
    field: usize,
    kind: LeadKind,
    name: String,
    contact: String,
    phone: String,
    email: String,
    budget: String,
    target_stage: Stage,
    rating: Rating,
    tags: String,
    notes: String,
}

impl Default for LeadFormUiState {
    fn default() -> Self {
        Self {
            field: 0,
            kind: LeadKind::Company,
            name: String::new(),
            contact: String::new(),
            phone: String::new(),
            email: String::new(),
            budget: String::new(),
            target_stage: Stage::LeadGen,
            rating: Rating::Warm,
            tags: String::new(),
            notes: String::new(),
        }
    }
}

impl LeadFormUiState {
    fn field_label(&self, field: FormField) -> &'static str {
        match field {
            FormField::Kind => "lead type",
            FormField::Name => match self.kind {
                LeadKind::Company => "company name",
                LeadKind::Individual => "individual name",
            },
            FormField::Contact => "contact person",
            FormField::Phone => "phone",
            FormField::Email => "email",
            FormField::Budget => "budget",
            FormField::TargetStage => "stage",
            FormField::Rating => "rating",
            FormField::Tags => "tags (comma separated)",
            FormField::Notes => "notes",
        }
    }

    fn field_value(&self, field: FormField) -> String {
        match field {
            FormField::Kind => self.kind.label().to_owned(),
            FormField::Name => self.name.clone(),
            FormField::Contact => self.contact.clone(),
            FormField::Phone => self.phone.clone(),
            FormField::Email => self.email.clone(),
            FormField::Budget => self.budget.clone(),
            FormField::TargetStage => self.target_stage.label().to_owned(),
            FormField::Rating => self.rating.label().to_owned(),
            FormField::Tags => self.tags.clone(),
            FormField::Notes => self.notes.clone(),
        }
    }

    fn text_buffer(&mut self, field: FormField) -> Option<&mut String> {
        match field {
            FormField::Name => Some(&mut self.name),
            FormField::Contact => Some(&mut self.contact),
            FormField::Phone => Some(&mut self.phone),
            FormField::Email => Some(&mut self.email),
            FormField::Budget => Some(&mut self.budget),
            FormField::Tags => Some(&mut self.tags),
            FormField::Notes => Some(&mut self.notes),
            FormField::Kind | FormField::TargetStage | FormField::Rating => None,
        }
    }

    fn cycle_choice(&mut self, field: FormField, delta: isize) {
        match field {
            FormField::Kind => {
                self.kind = cycle_slice(&LeadKind::ALL, self.kind, delta);
            }
            FormField::TargetStage => {
                let open: Vec<Stage> = Stage::open_stages().collect();
                self.target_stage = cycle_slice(&open, self.target_stage, delta);
            }
            FormField::Rating => {
                self.rating = cycle_slice(&Rating::ALL, self.rating, delta);
            }
            _ => {}
        }
    }

    /// Builds the domain-level form input; budget text parses here so
    /// a typo surfaces as the submit error, not a panic.
    fn to_input(&self) -> Result<LeadFormInput> {
        let budget_cents = parse_required_cents(&self.budget)
            .map_err(|error| anyhow::anyhow!("budget {:?}: {error}", self.budget))?;
        let tags: Vec<String> = self
            .tags
            .split(',')
            .map(|tag| tag.trim().to_owned())
            .filter(|tag| !tag.is_empty())
            .collect();
        let (company_name, individual_name) = match self.kind {
            LeadKind::Company => (self.name.clone(), String::new()),
            LeadKind::Individual => (String::new(), self.name.clone()),
        };
        Ok(LeadFormInput {
            kind: self.kind,
            company_name,
            individual_name,
            contact_person: self.contact.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            budget_cents,
            target_stage: self.target_stage,
            rating: self.rating,
            tags,
            notes: self.notes.clone(),
        })
    }
}

fn cycle_slice<T: Copy + PartialEq>(values: &[T], current: T, delta: isize) -> T {
    let len = values.len() as isize;
    let index = values
        .iter()
        .position(|value| *value == current)
        .unwrap_or(0) as isize;
    values[(index + delta).rem_euclid(len) as usize]
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    deals: Vec<Deal>,
    visible: Vec<Deal>,
    filters: FilterParams,
    sort: Option<SortSpec>,
    page: usize,
    page_size: usize,
    table_column: usize,
    table_row: usize,
    board_cursor: BoardCursor,
    form: Option<LeadFormUiState>,
    prompt: Option<PromptUiState>,
    import_choice: Option<ImportChoiceUiState>,
    move_picker: Option<MovePickerUiState>,
    help_visible: bool,
    status_token: u64,
}

impl ViewData {
    fn new(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size,
            ..Self::default()
        }
    }

    /// Recomputes the derived view from the canonical snapshot.
    fn recompute(&mut self) {
        self.visible = match self.sort {
            Some(sort) => filter::apply(&self.deals, &self.filters, sort),
            None => filter::filter_deals(&self.deals, &self.filters),
        };
        self.page = paging::clamp_page(self.page, self.visible.len(), self.page_size);
        let page_len = paging::page_slice(&self.visible, self.page, self.page_size).len();
        self.table_row = self.table_row.min(page_len.saturating_sub(1));

        let columns = board::group_by_stage(&self.visible);
        self.board_cursor.column = self.board_cursor.column.min(columns.len() - 1);
        let column_len = columns[self.board_cursor.column].1.len();
        self.board_cursor.row = self.board_cursor.row.min(column_len.saturating_sub(1));
    }

    fn selected_table_deal(&self) -> Option<&Deal> {
        paging::page_slice(&self.visible, self.page, self.page_size).get(self.table_row)
    }

    fn selected_board_deal(&self) -> Option<&Deal> {
        let columns = board::group_by_stage(&self.visible);
        let (_, column) = columns.get(self.board_cursor.column)?;
        column.get(self.board_cursor.row).copied()
    }

    fn selected_deal(&self, view: ViewMode) -> Option<&Deal> {
        match view {
            ViewMode::Kanban => self.selected_board_deal(),
            ViewMode::Table => self.selected_table_deal(),
        }
    }

    fn reset_to_first_page(&mut self) {
        self.page = 1;
        self.table_row = 0;
        self.board_cursor = BoardCursor::default();
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    page_size: usize,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(page_size);
    let (internal_tx, internal_rx) = mpsc::channel();

    if let Err(error) = refresh_view_data(runtime, &mut view_data) {
        state.dispatch(AppCommand::SetStatus(format!("load failed: {error}")));
    }

    let mut result = Ok(());
    loop {
        process_internal_events(state, &view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = event::poll(Duration::from_millis(120)).context("poll event")?;
        if has_event {
            match event::read().context("read event")? {
                Event::Key(key) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Event::Resize(_, _) => {}
                _ => {}
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(STATUS_CLEAR_SECS));
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn refresh_view_data<R: AppRuntime>(runtime: &mut R, view_data: &mut ViewData) -> Result<()> {
    view_data.deals = runtime.load_deals()?;
    view_data.recompute();
    Ok(())
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.pending.is_some() {
        handle_confirm_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.prompt.is_some() {
        handle_prompt_key(state, view_data, internal_tx, key);
        return false;
    }

    if view_data.import_choice.is_some() {
        handle_import_choice_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if view_data.move_picker.is_some() {
        handle_move_picker_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    if let AppMode::Form(FormKind::Lead) = state.mode {
        handle_form_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    handle_nav_key(state, view_data, internal_tx, key)
}

fn handle_nav_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char('v') => {
            state.dispatch(AppCommand::ToggleView);
            view_data.reset_to_first_page();
        }
        KeyCode::Char('N') => {
            state.dispatch(AppCommand::OpenForm(FormKind::Lead));
            view_data.form = Some(LeadFormUiState::default());
        }
        KeyCode::Char('/') => {
            let current = view_data.filters.search.clone();
            open_prompt(view_data, PromptKind::Search, &current);
        }
        KeyCode::Char('a') => {
            let current = view_data.filters.assignee.clone().unwrap_or_default();
            open_prompt(view_data, PromptKind::Assignee, &current);
        }
        KeyCode::Char('d') => open_prompt(view_data, PromptKind::DateRange, ""),
        KeyCode::Char('i') => open_prompt(view_data, PromptKind::ImportPath, ""),
        KeyCode::Char('f') => {
            cycle_stage_filter(view_data);
            let label = view_data
                .filters
                .stage
                .map_or("all stages", Stage::label);
            emit_status(state, view_data, internal_tx, format!("stage: {label}"));
        }
        KeyCode::Char('F') => {
            cycle_priority_filter(view_data);
            let label = view_data
                .filters
                .priority
                .map_or("all priorities", Priority::label);
            emit_status(state, view_data, internal_tx, format!("priority: {label}"));
        }
        KeyCode::Char('c') => {
            view_data.filters = FilterParams::default();
            view_data.reset_to_first_page();
            view_data.recompute();
            emit_status(state, view_data, internal_tx, "filters cleared");
        }
        KeyCode::Char('e') => export_visible(state, view_data, internal_tx),
        KeyCode::Char('x') => mark_selected_lost(state, view_data, internal_tx),
        KeyCode::Char('m') => {
            if state.view == ViewMode::Kanban {
                let selected = view_data.selected_board_deal().map(|deal| deal.id.clone());
                if let Some(deal) = selected {
                    view_data.move_picker = Some(MovePickerUiState { deal, cursor: 0 });
                }
            }
        }
        _ => match state.view {
            ViewMode::Kanban => handle_board_nav_key(view_data, key),
            ViewMode::Table => {
                handle_table_nav_key(state, view_data, internal_tx, key);
            }
        },
    }
    false
}

fn handle_board_nav_key(view_data: &mut ViewData, key: KeyEvent) {
    let columns = board::group_by_stage(&view_data.visible);
    match key.code {
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.board_cursor.column = view_data.board_cursor.column.saturating_sub(1);
            view_data.board_cursor.row = 0;
        }
        KeyCode::Char('l') | KeyCode::Right => {
            view_data.board_cursor.column =
                (view_data.board_cursor.column + 1).min(columns.len() - 1);
            view_data.board_cursor.row = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            let len = columns[view_data.board_cursor.column].1.len();
            if len > 0 {
                view_data.board_cursor.row = (view_data.board_cursor.row + 1).min(len - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.board_cursor.row = view_data.board_cursor.row.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_table_nav_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            let page_len =
                paging::page_slice(&view_data.visible, view_data.page, view_data.page_size).len();
            if page_len > 0 {
                view_data.table_row = (view_data.table_row + 1).min(page_len - 1);
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            view_data.table_row = view_data.table_row.saturating_sub(1);
        }
        KeyCode::Char('h') | KeyCode::Left => {
            view_data.table_column = view_data.table_column.saturating_sub(1);
        }
        KeyCode::Char('l') | KeyCode::Right => {
            view_data.table_column = (view_data.table_column + 1).min(SortKey::ALL.len() - 1);
        }
        KeyCode::Char('n') => {
            let total = paging::total_pages(view_data.visible.len(), view_data.page_size);
            if view_data.page < total {
                view_data.page += 1;
                view_data.table_row = 0;
            }
        }
        KeyCode::Char('p') => {
            if view_data.page > 1 {
                view_data.page -= 1;
                view_data.table_row = 0;
            }
        }
        KeyCode::Char('s') => {
            let key = SortKey::ALL[view_data.table_column];
            let spec = SortSpec::cycle(view_data.sort, key);
            view_data.sort = Some(spec);
            view_data.recompute();
            let direction = match spec.direction {
                SortDirection::Asc => "asc",
                SortDirection::Desc => "desc",
            };
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("sort {} {direction}", spec.key.label()),
            );
        }
        _ => {}
    }
}

fn cycle_stage_filter(view_data: &mut ViewData) {
    view_data.filters.stage = match view_data.filters.stage {
        None => Some(Stage::ALL[0]),
        Some(stage) => {
            let index = Stage::ALL.iter().position(|s| *s == stage).unwrap_or(0);
            Stage::ALL.get(index + 1).copied()
        }
    };
    view_data.reset_to_first_page();
    view_data.recompute();
}

fn cycle_priority_filter(view_data: &mut ViewData) {
    view_data.filters.priority = match view_data.filters.priority {
        None => Some(Priority::ALL[0]),
        Some(priority) => {
            let index = Priority::ALL.iter().position(|p| *p == priority).unwrap_or(0);
            Priority::ALL.get(index + 1).copied()
        }
    };
    view_data.reset_to_first_page();
    view_data.recompute();
}

fn open_prompt(view_data: &mut ViewData, kind: PromptKind, initial: &str) {
    view_data.prompt = Some(PromptUiState {
        kind,
        input: initial.to_owned(),
    });
}

fn handle_prompt_key(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(prompt) = view_data.prompt.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => {
            view_data.prompt = None;
        }
        KeyCode::Backspace => {
            prompt.input.pop();
        }
        KeyCode::Char(c) => prompt.input.push(c),
        KeyCode::Enter => {
            let prompt = view_data.prompt.take().expect("prompt is open");
            apply_prompt(state, view_data, internal_tx, prompt);
        }
        _ => {}
    }
}

fn apply_prompt(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    prompt: PromptUiState,
) {
    match prompt.kind {
        PromptKind::Search => {
            view_data.filters.search = prompt.input.trim().to_owned();
            view_data.reset_to_first_page();
            view_data.recompute();
        }
        PromptKind::Assignee => {
            let trimmed = prompt.input.trim();
            view_data.filters.assignee = if trimmed.is_empty() || trimmed == "All" {
                None
            } else {
                Some(trimmed.to_owned())
            };
            view_data.reset_to_first_page();
            view_data.recompute();
        }
        PromptKind::DateRange => match parse_date_range(&prompt.input) {
            Ok((from, to)) => {
                view_data.filters.due_from = from;
                view_data.filters.due_to = to;
                view_data.reset_to_first_page();
                view_data.recompute();
            }
            Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
        },
        PromptKind::ImportPath => {
            begin_import(state, view_data, internal_tx, prompt.input.trim());
        }
    }
}

fn parse_date_range(input: &str) -> Result<(Option<time::Date>, Option<time::Date>)> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok((None, None));
    }
    let (from_raw, to_raw) = trimmed.split_once("..").unwrap_or((trimmed, ""));
    let from = parse_optional_date(from_raw)
        .map_err(|error| anyhow::anyhow!("due-from {from_raw:?}: {error}"))?;
    let to = parse_optional_date(to_raw)
        .map_err(|error| anyhow::anyhow!("due-to {to_raw:?}: {error}"))?;
    Ok((from, to))
}

fn handle_confirm_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => {
            let events = state.dispatch(AppCommand::ConfirmPending);
            for event in events {
                if let AppEvent::ActionConfirmed(action) = event {
                    apply_confirmed_action(state, runtime, view_data, internal_tx, action);
                }
            }
        }
        KeyCode::Char('n') | KeyCode::Esc => {
            state.dispatch(AppCommand::CancelPending);
        }
        _ => {}
    }
}

fn apply_confirmed_action<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    action: PendingAction,
) {
    let (id, target, message) = match action {
        PendingAction::CloseWon { deal } => (deal, Stage::ClosedWon, "deal closed as won"),
        PendingAction::MarkLost { deal } => (deal, Stage::ClosedLost, "deal marked lost"),
    };
    match runtime.move_deal(&id, target) {
        Ok(deals) => {
            view_data.deals = deals;
            view_data.recompute();
            emit_status(state, view_data, internal_tx, message);
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("move failed: {error}"));
        }
    }
}

fn handle_move_picker_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(picker) = view_data.move_picker.as_mut() else {
        return;
    };
    match key.code {
        KeyCode::Esc => {
            view_data.move_picker = None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            picker.cursor = (picker.cursor + 1).min(Stage::ALL.len() - 1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            picker.cursor = picker.cursor.saturating_sub(1);
        }
        KeyCode::Enter => {
            let picker = view_data.move_picker.take().expect("picker is open");
            let target = Stage::ALL[picker.cursor];
            attempt_move(state, runtime, view_data, internal_tx, &picker.deal, target);
        }
        _ => {}
    }
}

/// Runs the stage-transition policy for a requested move and either
/// rejects, ignores, asks, or applies it.
fn attempt_move<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    id: &DealId,
    target: Stage,
) {
    let Some(deal) = view_data.deals.iter().find(|deal| deal.id == *id) else {
        emit_status(state, view_data, internal_tx, "deal is gone; list refreshed");
        return;
    };
    match board::plan_move(deal, target) {
        board::MovePlan::RejectedTerminal => {
            emit_status(
                state,
                view_data,
                internal_tx,
                "closed deals cannot be moved",
            );
        }
        board::MovePlan::NoOp => {}
        board::MovePlan::NeedsConfirmation => {
            state.dispatch(AppCommand::RequestConfirm(PendingAction::CloseWon {
                deal: id.clone(),
            }));
        }
        board::MovePlan::Apply => match runtime.move_deal(id, target) {
            Ok(deals) => {
                view_data.deals = deals;
                view_data.recompute();
                emit_status(
                    state,
                    view_data,
                    internal_tx,
                    format!("moved to {}", target.label()),
                );
            }
            Err(error) => {
                emit_status(state, view_data, internal_tx, format!("move failed: {error}"));
            }
        },
    }
}

fn mark_selected_lost(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(deal) = view_data.selected_deal(state.view) else {
        return;
    };
    let id = deal.id.clone();
    match board::plan_mark_lost(deal) {
        board::MovePlan::RejectedTerminal => {
            emit_status(state, view_data, internal_tx, "deal is already closed");
        }
        _ => {
            state.dispatch(AppCommand::RequestConfirm(PendingAction::MarkLost {
                deal: id,
            }));
        }
    }
}

fn export_visible(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let now = OffsetDateTime::now_utc();
    match csv::export_csv(&view_data.visible) {
        Ok(body) => {
            let file_name = csv::export_file_name(now);
            match std::fs::write(&file_name, body) {
                Ok(()) => {
                    let count = view_data.visible.len();
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("exported {count} deals to {file_name}"),
                    );
                }
                Err(error) => {
                    emit_status(
                        state,
                        view_data,
                        internal_tx,
                        format!("export failed: {error}"),
                    );
                }
            }
        }
        Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
    }
}

fn begin_import(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    path: &str,
) {
    if path.is_empty() {
        emit_status(state, view_data, internal_tx, "import canceled: no path");
        return;
    }
    let text = match std::fs::read_to_string(Path::new(path)) {
        Ok(text) => text,
        Err(error) => {
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("cannot read {path}: {error}"),
            );
            return;
        }
    };
    match csv::parse_csv(&text, OffsetDateTime::now_utc()) {
        Ok(rows) => {
            view_data.import_choice = Some(ImportChoiceUiState { rows });
        }
        Err(error) => emit_status(state, view_data, internal_tx, error.to_string()),
    }
}

fn handle_import_choice_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let mode = match key.code {
        KeyCode::Char('a') => Some(ImportMode::Append),
        KeyCode::Char('r') => Some(ImportMode::Replace),
        KeyCode::Esc => {
            view_data.import_choice = None;
            emit_status(state, view_data, internal_tx, "import canceled");
            return;
        }
        _ => None,
    };
    let Some(mode) = mode else {
        return;
    };
    let Some(choice) = view_data.import_choice.take() else {
        return;
    };
    apply_import(state, runtime, view_data, internal_tx, choice.rows, mode);
}

fn apply_import<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    rows: Vec<Deal>,
    mode: ImportMode,
) {
    let count = rows.len();
    let result = match mode {
        ImportMode::Append => runtime.append_deals(rows),
        ImportMode::Replace => runtime.replace_deals(rows),
    };
    match result {
        Ok(deals) => {
            view_data.deals = deals;
            view_data.reset_to_first_page();
            view_data.recompute();
            let verb = match mode {
                ImportMode::Append => "appended",
                ImportMode::Replace => "replaced with",
            };
            emit_status(
                state,
                view_data,
                internal_tx,
                format!("{verb} {count} imported deals"),
            );
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("import failed: {error}"));
        }
    }
}

fn handle_form_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let Some(form) = view_data.form.as_mut() else {
        state.dispatch(AppCommand::ExitToNav);
        return;
    };
    let field = FormField::ALL[form.field];
    match key.code {
        KeyCode::Esc => {
            view_data.form = None;
            state.dispatch(AppCommand::ExitToNav);
        }
        KeyCode::Tab | KeyCode::Down => {
            form.field = (form.field + 1) % FormField::ALL.len();
        }
        KeyCode::BackTab | KeyCode::Up => {
            form.field = form.field.checked_sub(1).unwrap_or(FormField::ALL.len() - 1);
        }
        KeyCode::Left if field.is_choice() => form.cycle_choice(field, -1),
        KeyCode::Right if field.is_choice() => form.cycle_choice(field, 1),
        KeyCode::Backspace => {
            if let Some(buffer) = form.text_buffer(field) {
                buffer.pop();
            }
        }
        KeyCode::Enter => {
            if form.field + 1 < FormField::ALL.len() {
                form.field += 1;
            } else {
                submit_form(state, runtime, view_data, internal_tx);
            }
        }
        KeyCode::Char(c) => {
            if let Some(buffer) = form.text_buffer(field) {
                buffer.push(c);
            }
        }
        _ => {}
    }
}

fn submit_form<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let Some(form) = view_data.form.clone() else {
        return;
    };
    let input = match form.to_input() {
        Ok(input) => input,
        Err(error) => {
            emit_status(state, view_data, internal_tx, error.to_string());
            return;
        }
    };
    if let Err(error) = input.validate() {
        emit_status(state, view_data, internal_tx, error.to_string());
        return;
    }

    let now = OffsetDateTime::now_utc();
    let unix_ms = (now.unix_timestamp_nanos() / 1_000_000) as i64;
    let deal = input.into_deal(DealId::for_lead(unix_ms), now);
    match runtime.create_deal(deal) {
        Ok(deals) => {
            view_data.deals = deals;
            view_data.form = None;
            view_data.reset_to_first_page();
            view_data.recompute();
            state.dispatch(AppCommand::ExitToNav);
            emit_status(state, view_data, internal_tx, "lead created");
        }
        Err(error) => {
            emit_status(state, view_data, internal_tx, format!("create failed: {error}"));
        }
    }
}

fn render(frame: &mut ratatui::Frame, state: &AppState, view_data: &ViewData) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_summary(frame, chunks[0], view_data);
    render_filter_line(frame, chunks[1], view_data);
    match state.view {
        ViewMode::Kanban => render_board(frame, chunks[2], view_data),
        ViewMode::Table => render_table(frame, chunks[2], view_data),
    }
    render_footer(frame, chunks[3], state);

    if let Some(form) = &view_data.form {
        render_form(frame, form);
    }
    if let Some(prompt) = &view_data.prompt {
        render_prompt(frame, prompt);
    }
    if let Some(choice) = &view_data.import_choice {
        render_import_choice(frame, choice);
    }
    if let Some(picker) = &view_data.move_picker {
        render_move_picker(frame, picker);
    }
    if let Some(pending) = &state.pending {
        render_confirm(frame, pending);
    }
    if view_data.help_visible {
        render_help(frame);
    }
}

fn render_summary(frame: &mut ratatui::Frame, area: Rect, view_data: &ViewData) {
    let summary = PipelineSummary::from_deals(&view_data.visible);
    let line = Line::from(vec![
        Span::styled("dealdesk", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "  open {} ({})  weighted {}  won {} ({})  lost {}",
            summary.open_count,
            format_compact_cents(summary.open_value_cents),
            format_compact_cents(summary.weighted_value_cents),
            summary.won_count,
            format_compact_cents(summary.won_value_cents),
            summary.lost_count,
        )),
    ]);
    let widget = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(widget, area);
}

fn render_filter_line(frame: &mut ratatui::Frame, area: Rect, view_data: &ViewData) {
    let filters = &view_data.filters;
    let mut parts: Vec<String> = Vec::new();
    if !filters.search.trim().is_empty() {
        parts.push(format!("search:{:?}", filters.search.trim()));
    }
    if let Some(assignee) = &filters.assignee {
        parts.push(format!("assignee:{assignee}"));
    }
    if let Some(stage) = filters.stage {
        parts.push(format!("stage:{}", stage.label()));
    }
    if let Some(priority) = filters.priority {
        parts.push(format!("priority:{}", priority.label()));
    }
    if filters.due_from.is_some() || filters.due_to.is_some() {
        parts.push(format!(
            "due:{}..{}",
            filters.due_from.map(|d| d.to_string()).unwrap_or_default(),
            filters.due_to.map(|d| d.to_string()).unwrap_or_default(),
        ));
    }
    let text = if parts.is_empty() {
        format!("{} deals", view_data.visible.len())
    } else {
        format!("{} deals  {}", view_data.visible.len(), parts.join("  "))
    };
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn stage_color(stage: Stage) -> Color {
    match stage {
        Stage::ClosedWon => Color::Green,
        Stage::ClosedLost => Color::Red,
        _ => Color::Cyan,
    }
}

fn render_board(frame: &mut ratatui::Frame, area: Rect, view_data: &ViewData) {
    let columns = board::group_by_stage(&view_data.visible);
    let constraints: Vec<Constraint> = columns
        .iter()
        .map(|_| Constraint::Ratio(1, columns.len() as u32))
        .collect();
    let slots = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    for (index, (stage, deals)) in columns.iter().enumerate() {
        let selected_column = index == view_data.board_cursor.column;
        let border_style = if selected_column {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        let title = format!("{} ({})", stage.label(), deals.len());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(title, Style::default().fg(stage_color(*stage))));

        let mut lines: Vec<Line> = Vec::new();
        for (row, deal) in deals.iter().enumerate() {
            let marker = match deal.priority {
                Priority::High => "!",
                Priority::Medium => "·",
                Priority::Low => " ",
            };
            let style = if selected_column && row == view_data.board_cursor.row {
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .bg(Color::DarkGray)
            } else {
                Style::default()
            };
            lines.push(Line::styled(
                format!(
                    "{marker} {}  {} {}%",
                    deal.company,
                    format_compact_cents(deal.value_cents),
                    deal.probability,
                ),
                style,
            ));
        }
        frame.render_widget(Paragraph::new(lines).block(block), slots[index]);
    }
}

fn render_table(frame: &mut ratatui::Frame, area: Rect, view_data: &ViewData) {
    let page = paging::page_slice(&view_data.visible, view_data.page, view_data.page_size);
    let total = paging::total_pages(view_data.visible.len(), view_data.page_size);

    let header_cells: Vec<Cell> = SortKey::ALL
        .iter()
        .enumerate()
        .map(|(index, key)| {
            let mut label = key.label().to_owned();
            if let Some(sort) = view_data.sort
                && sort.key == *key
            {
                let mark = match sort.direction {
                    SortDirection::Asc => SORT_MARK_ASC,
                    SortDirection::Desc => SORT_MARK_DESC,
                };
                label = format!("{label} {mark}");
            }
            let mut style = Style::default().add_modifier(Modifier::BOLD);
            if index == view_data.table_column {
                style = style.fg(Color::Yellow);
            }
            Cell::from(label).style(style)
        })
        .collect();

    let rows: Vec<Row> = page
        .iter()
        .enumerate()
        .map(|(index, deal)| {
            let style = if index == view_data.table_row {
                Style::default()
                    .add_modifier(Modifier::BOLD)
                    .bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(deal.company.clone()),
                Cell::from(format_compact_cents(deal.value_cents)),
                Cell::from(format!("{}%", deal.probability)),
                Cell::from(Span::styled(
                    deal.stage.label(),
                    Style::default().fg(stage_color(deal.stage)),
                )),
                Cell::from(deal.priority.label()),
                Cell::from(deal.due_date.to_string()),
                Cell::from(deal.days_in_stage.to_string()),
            ])
            .style(style)
        })
        .collect();

    let title = format!("page {} of {total}", view_data.page);
    let widths = [
        Constraint::Min(18),
        Constraint::Length(9),
        Constraint::Length(6),
        Constraint::Length(13),
        Constraint::Length(8),
        Constraint::Length(11),
        Constraint::Length(5),
    ];
    let table = Table::new(rows, widths)
        .header(Row::new(header_cells))
        .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(table, area);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect, state: &AppState) {
    let text = state.status_line.clone().unwrap_or_else(|| {
        "q quit  v view  N new lead  / search  f/F filters  e export  i import  ? help".to_owned()
    });
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_form(frame: &mut ratatui::Frame, form: &LeadFormUiState) {
    let area = centered_rect(frame.area(), 54, (FormField::ALL.len() + 4) as u16);
    frame.render_widget(Clear, area);

    let mut lines: Vec<Line> = Vec::new();
    for (index, field) in FormField::ALL.into_iter().enumerate() {
        let selected = index == form.field;
        let cursor = if selected { ">" } else { " " };
        let mut value = form.field_value(field);
        if field.is_choice() {
            value = format!("< {value} >");
        }
        let style = if selected {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::styled(
            format!("{cursor} {:<24} {value}", form.field_label(field)),
            style,
        ));
    }
    lines.push(Line::raw(""));
    lines.push(Line::styled(
        "Enter next/submit  Tab move  ←/→ choices  Esc cancel",
        Style::default().fg(Color::DarkGray),
    ));

    let block = Block::default().borders(Borders::ALL).title("new lead");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_prompt(frame: &mut ratatui::Frame, prompt: &PromptUiState) {
    let area = centered_rect(frame.area(), 60, 3);
    frame.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(prompt.kind.title());
    frame.render_widget(
        Paragraph::new(format!("{}_", prompt.input)).block(block),
        area,
    );
}

fn render_import_choice(frame: &mut ratatui::Frame, choice: &ImportChoiceUiState) {
    let area = centered_rect(frame.area(), 56, 5);
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::raw(format!("{} rows parsed", choice.rows.len())),
        Line::raw("a append to existing deals"),
        Line::raw("r replace existing deals    Esc cancel"),
    ];
    let block = Block::default().borders(Borders::ALL).title("import");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_move_picker(frame: &mut ratatui::Frame, picker: &MovePickerUiState) {
    let area = centered_rect(frame.area(), 32, (Stage::ALL.len() + 2) as u16);
    frame.render_widget(Clear, area);
    let lines: Vec<Line> = Stage::ALL
        .into_iter()
        .enumerate()
        .map(|(index, stage)| {
            let cursor = if index == picker.cursor { ">" } else { " " };
            let style = if index == picker.cursor {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(stage_color(stage))
            };
            Line::styled(format!("{cursor} {}", stage.label()), style)
        })
        .collect();
    let block = Block::default().borders(Borders::ALL).title("move to");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_confirm(frame: &mut ratatui::Frame, pending: &PendingAction) {
    let area = centered_rect(frame.area(), 50, 4);
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::raw(pending.prompt()),
        Line::styled("y confirm    n cancel", Style::default().fg(Color::DarkGray)),
    ];
    let block = Block::default().borders(Borders::ALL).title("confirm");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_help(frame: &mut ratatui::Frame) {
    let area = centered_rect(frame.area(), 58, 18);
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::raw("v        toggle kanban/table"),
        Line::raw("h j k l  move cursor (columns/cards, rows)"),
        Line::raw("m        move selected card to another stage"),
        Line::raw("x        mark selected deal lost"),
        Line::raw("N        new lead form"),
        Line::raw("/        search company/contact"),
        Line::raw("a        assignee filter"),
        Line::raw("f / F    cycle stage / priority filter"),
        Line::raw("d        due-date range filter"),
        Line::raw("c        clear filters"),
        Line::raw("s        sort by highlighted column (table)"),
        Line::raw("n / p    next / previous page (table)"),
        Line::raw("e        export filtered deals to CSV"),
        Line::raw("i        import deals from CSV"),
        Line::raw("q        quit"),
    ];
    let block = Block::default().borders(Borders::ALL).title("help");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
