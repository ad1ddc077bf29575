use crate::config::{self, Config};
use crate::core::ConditionId;
use crate::error::FilterDeckError;
use crate::services::export_service::{export_to_dir, row_to_json};
use crate::services::{DataService, ExportFormat, FetchEvent, FetchService, PreferenceStore};
use crate::tui::components::{AboutDialog, BuilderEdit, ConditionBuilder, ConditionPart, ResultGrid, UrlInput};
use crate::tui::{Action, Component, Focusable, KeyBindings, Theme};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

/// Pane that receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusPane {
    #[default]
    Url,
    Builder,
    Grid,
}

impl FocusPane {
    fn next(self) -> Self {
        match self {
            FocusPane::Url => FocusPane::Builder,
            FocusPane::Builder => FocusPane::Grid,
            FocusPane::Grid => FocusPane::Url,
        }
    }

    fn prev(self) -> Self {
        match self {
            FocusPane::Url => FocusPane::Grid,
            FocusPane::Builder => FocusPane::Url,
            FocusPane::Grid => FocusPane::Builder,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusKind {
    Info,
    Success,
    Error,
}

/// Application state
///
/// Owns the session (`DataService`), the fetcher and the three panes, and
/// routes keys and fetch results between them.
pub struct App {
    data_service: DataService,
    fetch_service: FetchService,
    preferences: PreferenceStore,

    url_input: UrlInput,
    condition_builder: ConditionBuilder,
    result_grid: ResultGrid,
    about_dialog: Option<AboutDialog>,
    focus: FocusPane,

    keybindings: KeyBindings,
    theme: Theme,
    export_dir: PathBuf,

    status: Option<(String, StatusKind)>,
    /// URL of the loaded dataset
    current_url: Option<String>,
    /// Generation of the request in flight, if any
    pending_generation: Option<u64>,
    should_quit: bool,
}

impl App {
    /// Create the app and the receiver its fetch results arrive on
    pub fn new(
        config: &Config,
        export_dir: PathBuf,
        initial_url: Option<&str>,
    ) -> Result<(Self, UnboundedReceiver<FetchEvent>)> {
        let (fetch_service, rx) = FetchService::new(&config.fetch)?;
        let preferences = PreferenceStore::load(&config.config.data_dir);
        let keybindings = KeyBindings::load_or_default(&config.config.config_dir);
        let theme = Theme::for_mode(preferences.dark_mode());

        let mut url_input = UrlInput::new(initial_url.unwrap_or_default());
        url_input.set_focused(true);

        let app = Self {
            data_service: DataService::new(),
            fetch_service,
            preferences,
            url_input,
            condition_builder: ConditionBuilder::new(),
            result_grid: ResultGrid::new(config.grid.page_size, config.grid.column_width),
            about_dialog: None,
            focus: FocusPane::Url,
            keybindings,
            theme,
            export_dir,
            status: None,
            current_url: None,
            pending_generation: None,
            should_quit: false,
        };
        Ok((app, rx))
    }

    /// Handle a key event
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Result<()> {
        // Only handle key press events, ignore release/repeat
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let action = self.keybindings.get_action(&key);
        if action == Some(Action::Quit) && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        if self.about_dialog.is_some() {
            match action {
                Some(Action::Cancel | Action::Confirm | Action::ToggleAbout) => self.about_dialog = None,
                Some(Action::Quit) => self.should_quit = true,
                _ => {}
            }
            return Ok(());
        }

        if self.condition_builder.is_editing() {
            match key.code {
                KeyCode::Enter => self.apply_value_edit(),
                KeyCode::Esc => {
                    self.condition_builder.cancel_edit();
                    self.condition_builder.clear_value_error();
                }
                _ => self.condition_builder.editor_input(key),
            }
            return Ok(());
        }

        if self.focus == FocusPane::Url && UrlInput::accepts(&key) {
            if self.url_input.input(key) {
                self.on_url_changed();
            }
            return Ok(());
        }

        if let Some(action) = action {
            self.handle_action(action)?;
        }
        self.sync_components();
        Ok(())
    }

    /// Handle an action
    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        debug!(?action, focus = ?self.focus, "action");
        match action {
            Action::Quit => self.should_quit = true,
            Action::NextFocus => self.set_focus(self.focus.next()),
            Action::PrevFocus => self.set_focus(self.focus.prev()),
            Action::ToggleTheme => self.toggle_theme(),
            Action::ToggleAbout => {
                self.about_dialog = Some(AboutDialog::new(&config::version(), &self.keybindings));
            }
            Action::Refresh => self.submit_url(),
            Action::Export => self.export(ExportFormat::Csv),
            Action::ExportJson => self.export(ExportFormat::Json),
            Action::Copy => self.copy_selected_row(),
            Action::Confirm => match self.focus {
                FocusPane::Url => self.submit_url(),
                FocusPane::Builder => self.confirm_builder(),
                FocusPane::Grid => {}
            },
            Action::Cancel => {
                if !self.url_input.handle_action(action)? {
                    self.status = None;
                }
            }
            Action::AddOrCondition | Action::AddAndGroup | Action::DeleteCondition
            | Action::PrevOption | Action::NextOption
                if self.focus == FocusPane::Builder =>
            {
                self.edit_conditions(action);
            }
            _ => {
                match self.focus {
                    FocusPane::Url => self.url_input.handle_action(action)?,
                    FocusPane::Builder => self.condition_builder.handle_action(action)?,
                    FocusPane::Grid => self.result_grid.handle_action(action)?,
                };
            }
        }
        Ok(())
    }

    /// Apply a completed fetch, ignoring results of superseded requests
    pub fn handle_fetch_event(&mut self, event: FetchEvent) {
        if !self.fetch_service.is_current(event.generation) {
            debug!(generation = event.generation, url = %event.url, "dropping stale fetch result");
            return;
        }
        self.pending_generation = None;

        match self
            .data_service
            .apply_fetch_result_from(Some(&event.url), event.outcome)
        {
            Ok(()) => {
                self.set_status(
                    format!("Loaded {} rows from {}", self.data_service.total_count(), event.url),
                    StatusKind::Success,
                );
                self.current_url = Some(event.url);
            }
            Err(e) => {
                self.current_url = None;
                self.set_status(e.to_string(), StatusKind::Error);
            }
        }
        self.sync_components();
    }

    /// Request the URL given on the command line, if any
    pub fn start(&mut self) {
        if !self.url_input.value().is_empty() {
            self.submit_url();
        }
    }

    fn set_focus(&mut self, focus: FocusPane) {
        self.focus = focus;
        self.url_input.set_focused(focus == FocusPane::Url);
        self.condition_builder.set_focused(focus == FocusPane::Builder);
        self.result_grid.set_focused(focus == FocusPane::Grid);
    }

    fn set_status(&mut self, message: impl Into<String>, kind: StatusKind) {
        self.status = Some((message.into(), kind));
    }

    /// Every edit of the URL text re-requests after the debounce
    fn on_url_changed(&mut self) {
        let text = self.url_input.value();
        if text.is_empty() {
            self.fetch_service.cancel_pending();
            self.pending_generation = None;
            self.current_url = None;
            self.url_input.set_error(None);
            self.data_service.clear();
            self.status = None;
            self.sync_components();
            return;
        }
        self.request_url(&text, false);
    }

    /// Explicit submits skip the debounce
    fn submit_url(&mut self) {
        let text = self.url_input.value();
        if text.is_empty() {
            self.set_status("Enter a URL to load data", StatusKind::Info);
            return;
        }
        self.request_url(&text, true);
    }

    fn request_url(&mut self, text: &str, immediate: bool) {
        let requested = if immediate {
            self.fetch_service.request_immediate(text)
        } else {
            self.fetch_service.request(text)
        };
        match requested {
            Ok(generation) => {
                self.pending_generation = Some(generation);
                self.url_input.set_error(None);
                self.data_service.begin_loading();
            }
            Err(e) => {
                // Leave the loaded data alone; only a fetch result replaces it
                self.fetch_service.cancel_pending();
                self.pending_generation = None;
                self.data_service.cancel_loading();
                self.url_input.set_error(Some(e.to_string()));
            }
        }
    }

    fn confirm_builder(&mut self) {
        if self.condition_builder.part() == ConditionPart::Value {
            self.condition_builder.begin_edit();
        } else {
            self.edit_conditions(Action::NextOption);
        }
    }

    fn apply_value_edit(&mut self) {
        let Some((id, value)) = self.condition_builder.finish_edit() else {
            return;
        };
        match self.data_service.set_value(&id, &value) {
            Ok(()) => self.condition_builder.clear_value_error(),
            Err(FilterDeckError::InvalidInputValue { message, .. }) => {
                self.condition_builder.reject_edit(id, &value, message);
            }
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
        self.sync_components();
    }

    fn edit_conditions(&mut self, action: Action) {
        let Some(selected) = self.condition_builder.selected_id() else {
            return;
        };
        let outcome = match action {
            Action::AddAndGroup => {
                let added = self.data_service.add_and_group();
                self.select_after_sync(added);
                Ok(())
            }
            Action::AddOrCondition => {
                let added = self.data_service.add_or_sibling(&selected);
                self.select_after_sync(added);
                Ok(())
            }
            Action::DeleteCondition => {
                if self.data_service.can_delete() {
                    self.data_service.delete_condition(&selected);
                } else {
                    self.set_status("The last condition cannot be deleted", StatusKind::Info);
                }
                Ok(())
            }
            Action::PrevOption | Action::NextOption => {
                match self.condition_builder.cycle(action == Action::NextOption) {
                    Some(BuilderEdit::Field { id, field }) => self.data_service.set_field(&id, &field),
                    Some(BuilderEdit::Operator { id, operator }) => {
                        let outcome = self.data_service.set_operator(&id, operator);
                        if outcome.is_ok() {
                            let problem = self.data_service.value_problem(&id);
                            self.condition_builder.set_value_error(id, problem);
                        }
                        outcome
                    }
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        };
        if let Err(e) = outcome {
            self.set_status(e.to_string(), StatusKind::Error);
        }
        self.sync_components();
    }

    fn select_after_sync(&mut self, added: Option<ConditionId>) {
        if let Some(id) = added {
            self.sync_components();
            self.condition_builder.select(&id);
        }
    }

    fn toggle_theme(&mut self) {
        match self.preferences.toggle_dark_mode() {
            Ok(dark) => self.theme = Theme::for_mode(dark),
            Err(e) => {
                warn!(path = %self.preferences.path().display(), "failed to save preferences: {e}");
                self.theme = Theme::for_mode(self.preferences.dark_mode());
                self.set_status(format!("Theme not saved: {e}"), StatusKind::Error);
            }
        }
    }

    fn export(&mut self, format: ExportFormat) {
        let Some(columns) = self.data_service.dataset().map(|d| d.columns.display_order()) else {
            self.set_status("Nothing to export", StatusKind::Info);
            return;
        };
        let rows = self.data_service.filtered_rows();
        match export_to_dir(&self.export_dir, format, &columns, &rows) {
            Ok(path) => self.set_status(
                format!("Exported {} rows to {}", rows.len(), path.display()),
                StatusKind::Success,
            ),
            Err(e) => self.set_status(e.to_string(), StatusKind::Error),
        }
    }

    fn copy_selected_row(&mut self) {
        let Some(row) = self.result_grid.selected_row() else {
            self.set_status("No row selected", StatusKind::Info);
            return;
        };
        let id = row.id.clone();
        let text = match row_to_json(row) {
            Ok(text) => text,
            Err(e) => {
                self.set_status(e.to_string(), StatusKind::Error);
                return;
            }
        };
        match arboard::Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text)) {
            Ok(()) => {
                info!(row = %id, "copied row to clipboard");
                self.set_status(format!("Copied row {id}"), StatusKind::Success);
            }
            Err(e) => {
                warn!("clipboard unavailable: {e}");
                self.set_status(format!("Clipboard unavailable: {e}"), StatusKind::Error);
            }
        }
    }

    /// Push the current session state into the panes
    fn sync_components(&mut self) {
        let columns = self.data_service.columns().to_vec();
        self.condition_builder.sync(
            self.data_service.grouped_view(),
            &columns,
            self.data_service.can_delete(),
        );
        let rows = self.data_service.filtered_rows();
        let display_columns = self
            .data_service
            .dataset()
            .map(|d| d.columns.display_order())
            .unwrap_or_default();
        self.result_grid
            .set_rows(rows, display_columns, self.data_service.total_count());
    }

    /// Check if the app should quit
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn focus(&self) -> FocusPane {
        self.focus
    }

    pub fn data_service(&self) -> &DataService {
        &self.data_service
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn keybindings(&self) -> &KeyBindings {
        &self.keybindings
    }

    /// Render the app
    pub fn render(&mut self, frame: &mut Frame) {
        self.sync_components();
        let area = frame.area();
        frame.render_widget(Paragraph::new("").style(self.theme.normal_style()), area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Percentage(35),
                Constraint::Min(5),
                Constraint::Length(1),
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.url_input.render(frame, chunks[1], &self.theme);
        self.condition_builder.render(frame, chunks[2], &self.theme);
        self.result_grid.render(frame, chunks[3], &self.theme);
        self.render_footer(frame, chunks[4]);

        if let Some(dialog) = &self.about_dialog {
            dialog.render(frame, area, &self.theme);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(" FilterDeck ", self.theme.header_style().add_modifier(Modifier::BOLD)),
            Span::styled(format!(" {} ", self.theme.name), self.theme.muted_style()),
        ];
        if self.data_service.is_loading() {
            spans.push(Span::styled(" Loading… ", self.theme.warning_style()));
        } else if let Some(url) = &self.current_url {
            spans.push(Span::styled(format!(" {url} "), self.theme.info_style()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.status {
            Some((message, kind)) => {
                let style = match kind {
                    StatusKind::Info => self.theme.info_style(),
                    StatusKind::Success => self.theme.success_style(),
                    StatusKind::Error => self.theme.error_style(),
                };
                Line::styled(format!(" {message}"), style)
            }
            None => Line::styled(self.footer_hints(), self.theme.muted_style()),
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Key hints for the focused pane plus the global ones
    fn footer_hints(&self) -> String {
        let pane: &dyn Component = match self.focus {
            FocusPane::Url => &self.url_input,
            FocusPane::Builder => &self.condition_builder,
            FocusPane::Grid => &self.result_grid,
        };
        let globals = [Action::NextFocus, Action::ToggleTheme, Action::ToggleAbout, Action::Quit];
        let hints: Vec<String> = pane
            .supported_actions()
            .iter()
            .chain(globals.iter())
            .filter_map(|action| {
                self.keybindings
                    .get_keys_for_action(*action)
                    .first()
                    .map(|key| format!("{key} {}", action.description()))
            })
            .collect();
        format!(" {}", hints.join(" · "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, FetchConfig, GridConfig};
    use crate::core::Operator;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> Config {
        Config {
            config: AppConfig {
                data_dir: dir.path().join("data"),
                config_dir: dir.path().join("config"),
            },
            // Long debounce so no test request ever reaches the network
            fetch: FetchConfig {
                debounce_ms: 60_000,
                timeout_secs: 1,
            },
            grid: GridConfig::default(),
        }
    }

    fn create_test_app() -> (App, TempDir) {
        let dir = TempDir::new().unwrap();
        let (app, _rx) = App::new(&test_config(&dir), dir.path().join("exports"), None).unwrap();
        (app, dir)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_key_event(key(KeyCode::Char(c))).unwrap();
        }
    }

    /// Issue a request and deliver its result as if it had completed
    fn load(app: &mut App, body: serde_json::Value) {
        let generation = app.fetch_service.request("http://example.com/data").unwrap();
        app.handle_fetch_event(FetchEvent {
            generation,
            url: "http://example.com/data".to_string(),
            outcome: Ok(body),
        });
    }

    fn sample() -> serde_json::Value {
        json!([
            {"id": 1, "Name": "Ann", "Age": 30},
            {"id": 2, "Name": "Bob", "Age": 17},
            {"id": 3, "Name": "Cy", "Age": 45}
        ])
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, _dir) = create_test_app();

        // 'q' is text while the URL field has focus
        app.handle_key_event(key(KeyCode::Char('q'))).unwrap();
        assert!(!app.should_quit());

        app.handle_key_event(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.focus(), FocusPane::Builder);
        app.handle_key_event(key(KeyCode::Char('q'))).unwrap();
        assert!(app.should_quit());

        let (mut app, _dir) = create_test_app();
        app.handle_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL))
            .unwrap();
        assert!(app.should_quit());
    }

    #[test]
    fn test_focus_cycles() {
        let (mut app, _dir) = create_test_app();
        app.handle_action(Action::NextFocus).unwrap();
        app.handle_action(Action::NextFocus).unwrap();
        assert_eq!(app.focus(), FocusPane::Grid);
        app.handle_action(Action::NextFocus).unwrap();
        assert_eq!(app.focus(), FocusPane::Url);
        app.handle_action(Action::PrevFocus).unwrap();
        assert_eq!(app.focus(), FocusPane::Grid);
    }

    #[tokio::test]
    async fn test_invalid_url_sets_error_without_request() {
        let (mut app, _dir) = create_test_app();
        type_text(&mut app, "not a url");
        assert!(app.url_input.error().is_some());
        assert!(app.pending_generation.is_none());
        assert!(!app.data_service().is_loading());
    }

    #[tokio::test]
    async fn test_valid_url_schedules_request() {
        let (mut app, _dir) = create_test_app();
        type_text(&mut app, "example.com");
        assert!(app.url_input.error().is_none());
        assert!(app.pending_generation.is_some());
        assert!(app.data_service().is_loading());
    }

    #[tokio::test]
    async fn test_start_requests_initial_url() {
        let dir = TempDir::new().unwrap();
        let (mut app, _rx) = App::new(
            &test_config(&dir),
            dir.path().join("exports"),
            Some("http://localhost:9/records"),
        )
        .unwrap();
        assert!(app.pending_generation.is_none());

        app.start();
        assert!(app.pending_generation.is_some());
        assert!(app.data_service().is_loading());
        assert!(app.url_input.error().is_none());
    }

    #[tokio::test]
    async fn test_clearing_url_clears_session() {
        let (mut app, _dir) = create_test_app();
        load(&mut app, sample());
        assert_eq!(app.data_service().total_count(), 3);

        type_text(&mut app, "a");
        app.handle_key_event(key(KeyCode::Backspace)).unwrap();
        assert!(app.data_service().dataset().is_none());
        assert!(app.condition_builder.is_empty());
    }

    #[tokio::test]
    async fn test_stale_fetch_result_is_ignored() {
        let (mut app, _dir) = create_test_app();
        let first = app.fetch_service.request("http://one.example.com").unwrap();
        let second = app.fetch_service.request("http://two.example.com").unwrap();

        app.handle_fetch_event(FetchEvent {
            generation: first,
            url: "http://one.example.com".to_string(),
            outcome: Ok(sample()),
        });
        assert!(app.data_service().dataset().is_none());

        app.handle_fetch_event(FetchEvent {
            generation: second,
            url: "http://two.example.com".to_string(),
            outcome: Ok(json!([{"Name": "Only"}])),
        });
        assert_eq!(app.data_service().total_count(), 1);
        assert_eq!(app.current_url.as_deref(), Some("http://two.example.com"));
    }

    #[tokio::test]
    async fn test_failed_fetch_clears_data() {
        let (mut app, _dir) = create_test_app();
        load(&mut app, sample());

        let generation = app.fetch_service.request("http://example.com/missing").unwrap();
        app.handle_fetch_event(FetchEvent {
            generation,
            url: "http://example.com/missing".to_string(),
            outcome: Err(FilterDeckError::FetchFailed(
                "Request failed with status 404".to_string(),
            )),
        });
        assert!(app.data_service().dataset().is_none());
        assert!(matches!(app.status, Some((_, StatusKind::Error))));
        assert_eq!(app.result_grid.filtered(), 0);
    }

    #[tokio::test]
    async fn test_builder_adds_and_deletes_conditions() {
        let (mut app, _dir) = create_test_app();
        load(&mut app, sample());
        app.handle_action(Action::NextFocus).unwrap();
        assert_eq!(app.condition_builder.len(), 1);

        // The only condition cannot go
        app.handle_key_event(key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.condition_builder.len(), 1);

        app.handle_key_event(key(KeyCode::Char('o'))).unwrap();
        app.handle_key_event(key(KeyCode::Char('a'))).unwrap();
        assert_eq!(app.condition_builder.len(), 3);
        assert_eq!(app.data_service().tree().group_count(), 2);

        // The new group is selected; deleting it leaves the first group
        app.handle_key_event(key(KeyCode::Char('d'))).unwrap();
        assert_eq!(app.data_service().tree().group_count(), 1);
        assert_eq!(app.condition_builder.len(), 2);
    }

    #[tokio::test]
    async fn test_value_edit_filters_grid() {
        let (mut app, _dir) = create_test_app();
        load(&mut app, sample());
        app.handle_action(Action::NextFocus).unwrap();

        // Point the condition at Name, then edit its value
        let id = app.condition_builder.selected_id().unwrap();
        app.data_service.set_field(&id, "Name").unwrap();
        app.sync_components();
        app.handle_key_event(key(KeyCode::Right)).unwrap();
        app.handle_key_event(key(KeyCode::Right)).unwrap();
        app.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(app.condition_builder.is_editing());

        type_text(&mut app, "Bob");
        app.handle_key_event(key(KeyCode::Enter)).unwrap();
        assert!(!app.condition_builder.is_editing());
        assert_eq!(app.result_grid.filtered(), 1);
        assert_eq!(app.result_grid.total(), 3);
    }

    #[tokio::test]
    async fn test_rejected_value_reopens_editor() {
        let (mut app, _dir) = create_test_app();
        load(&mut app, sample());
        app.handle_action(Action::NextFocus).unwrap();

        let id = app.condition_builder.selected_id().unwrap();
        app.data_service.set_operator(&id, Operator::GreaterThan).unwrap();
        app.sync_components();
        app.condition_builder.set_part(ConditionPart::Value);
        app.handle_key_event(key(KeyCode::Enter)).unwrap();
        type_text(&mut app, "abc");
        app.handle_key_event(key(KeyCode::Enter)).unwrap();

        assert!(app.condition_builder.is_editing());
        assert!(app.condition_builder.value_error().is_some());
        assert_eq!(app.data_service().condition(&id).unwrap().value, "");

        app.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(!app.condition_builder.is_editing());
        assert!(app.condition_builder.value_error().is_none());
    }

    #[tokio::test]
    async fn test_cycle_operator() {
        let (mut app, _dir) = create_test_app();
        load(&mut app, sample());
        app.handle_action(Action::NextFocus).unwrap();
        app.handle_key_event(key(KeyCode::Right)).unwrap();
        app.handle_key_event(key(KeyCode::Char(']'))).unwrap();

        let id = app.condition_builder.selected_id().unwrap();
        assert_eq!(
            app.data_service().condition(&id).unwrap().operator,
            Operator::GreaterThan
        );
    }

    #[tokio::test]
    async fn test_operator_change_flags_stored_value() {
        let (mut app, _dir) = create_test_app();
        load(&mut app, sample());
        app.handle_action(Action::NextFocus).unwrap();

        let id = app.condition_builder.selected_id().unwrap();
        app.data_service.set_field(&id, "Name").unwrap();
        app.data_service.set_value(&id, "abc").unwrap();
        app.sync_components();
        assert!(app.condition_builder.value_error().is_none());

        // Equals -> GreaterThan keeps "abc" but reports it
        app.handle_key_event(key(KeyCode::Right)).unwrap();
        app.handle_key_event(key(KeyCode::Char(']'))).unwrap();
        let condition = app.data_service().condition(&id).unwrap();
        assert_eq!(condition.operator, Operator::GreaterThan);
        assert_eq!(condition.value, "abc");
        assert_eq!(
            app.condition_builder.value_error(),
            Some(crate::core::validation::NUMBER_REQUIRED_MESSAGE)
        );
        assert!(!app.condition_builder.is_editing());

        // GreaterThan -> Equals clears it
        app.handle_key_event(key(KeyCode::Char('['))).unwrap();
        assert_eq!(app.data_service().condition(&id).unwrap().operator, Operator::Equals);
        assert!(app.condition_builder.value_error().is_none());
    }

    #[test]
    fn test_theme_toggle_persists() {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir);
        let (mut app, _rx) = App::new(&config, dir.path().join("exports"), None).unwrap();
        assert!(!app.theme().dark);

        app.handle_action(Action::ToggleTheme).unwrap();
        assert!(app.theme().dark);

        let (app, _rx) = App::new(&config, dir.path().join("exports"), None).unwrap();
        assert!(app.theme().dark);
    }

    #[test]
    fn test_about_dialog_toggles() {
        let (mut app, _dir) = create_test_app();
        app.handle_key_event(key(KeyCode::F(1))).unwrap();
        assert!(app.about_dialog.is_some());

        // Keys other than close are swallowed by the dialog
        app.handle_key_event(key(KeyCode::Tab)).unwrap();
        assert_eq!(app.focus(), FocusPane::Url);

        app.handle_key_event(key(KeyCode::Esc)).unwrap();
        assert!(app.about_dialog.is_none());
    }

    #[tokio::test]
    async fn test_export_writes_filtered_rows() {
        let (mut app, dir) = create_test_app();
        app.handle_action(Action::Export).unwrap();
        assert_eq!(
            app.status.as_ref().map(|(m, _)| m.as_str()),
            Some("Nothing to export")
        );

        load(&mut app, sample());
        app.handle_action(Action::Export).unwrap();
        assert!(matches!(app.status, Some((_, StatusKind::Success))));

        let exported: Vec<_> = std::fs::read_dir(dir.path().join("exports"))
            .unwrap()
            .filter_map(|entry| entry.ok())
            .collect();
        assert_eq!(exported.len(), 1);
        let content = std::fs::read_to_string(exported[0].path()).unwrap();
        assert!(content.starts_with("id,Name,Age\n"));
    }

    #[tokio::test]
    async fn test_grid_navigation_after_load() {
        let (mut app, _dir) = create_test_app();
        load(&mut app, sample());
        app.set_focus(FocusPane::Grid);
        app.handle_key_event(key(KeyCode::Char('j'))).unwrap();
        app.handle_key_event(key(KeyCode::Char('j'))).unwrap();
        assert_eq!(app.result_grid.cursor().row, 2);
    }
}
