//! Application state management for the Neurotype terminal client.
//!
//! This module contains the core `App` struct: the router, one state struct per
//! screen, and the channel background requests report back on. Backend calls
//! are only issued for routes the guard actually let through.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use neurotype_core::api::{
    is_unauthorized, login_error_message, register_error_message, user_message, ApiClient,
    MSG_SESSION_EXPIRED, MSG_UNEXPECTED,
};
use neurotype_core::auth::{
    image_mime_type, validate_email, validate_registration, Session, SessionStore,
    ValidationError,
};
use neurotype_core::calendar::{Heatmap, Month};
use neurotype_core::chat::{self, Transcript};
use neurotype_core::config::Config;
use neurotype_core::export::{default_export_dir, export_notes};
use neurotype_core::models::{Dashboard, EmotionSummary, Note, NoteRef, Plan};
use neurotype_core::routes::{Route, Router};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

const MAX_EMAIL_LENGTH: usize = 254;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 64;
const MAX_PATH_LENGTH: usize = 512;
const MAX_CHAT_INPUT_LENGTH: usize = 2000;

/// Number of items to scroll on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

pub const LOGIN_EMAIL: usize = 0;
pub const LOGIN_PASSWORD: usize = 1;
pub const REGISTER_EMAIL: usize = 0;
pub const REGISTER_PASSWORD: usize = 1;
pub const REGISTER_CONFIRM: usize = 2;
pub const PROFILE_NAME: usize = 0;
pub const PROFILE_PHOTO: usize = 1;

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    ShowingHelp,
    ConfirmingDelete,
    ConfirmingQuit,
    Quitting,
}

/// One text input of a form
#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
    pub masked: bool,
    max_len: usize,
}

impl Field {
    fn text(label: &'static str, max_len: usize) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
            max_len,
        }
    }

    fn secret(label: &'static str) -> Self {
        Self {
            masked: true,
            ..Self::text(label, MAX_PASSWORD_LENGTH)
        }
    }
}

/// A stack of text fields followed by a submit button.
/// `focus == fields.len()` means the button has focus.
#[derive(Debug, Clone)]
pub struct Form {
    pub fields: Vec<Field>,
    pub focus: usize,
    pub button: &'static str,
    pub errors: Vec<String>,
    pub submitting: bool,
}

impl Form {
    fn new(button: &'static str, fields: Vec<Field>) -> Self {
        Self {
            fields,
            focus: 0,
            button,
            errors: Vec::new(),
            submitting: false,
        }
    }

    pub fn login() -> Self {
        Self::new(
            "Login",
            vec![Field::text("Email", MAX_EMAIL_LENGTH), Field::secret("Password")],
        )
    }

    pub fn register() -> Self {
        Self::new(
            "Register",
            vec![
                Field::text("Email", MAX_EMAIL_LENGTH),
                Field::secret("Password"),
                Field::secret("Confirm"),
            ],
        )
    }

    pub fn profile() -> Self {
        Self::new(
            "Update Profile",
            vec![
                Field::text("Name", MAX_NAME_LENGTH),
                Field::text("Photo", MAX_PATH_LENGTH),
            ],
        )
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(|f| f.value.as_str()).unwrap_or("")
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(index) {
            field.value = value.into();
        }
    }

    pub fn on_button(&self) -> bool {
        self.focus >= self.fields.len()
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % (self.fields.len() + 1);
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.fields.len()) % (self.fields.len() + 1);
    }

    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            if can_add_char(field.value.chars().count(), field.max_len, c) {
                field.value.push(c);
            }
        }
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.fields.get_mut(self.focus) {
            field.value.pop();
        }
    }

    /// Wipe every masked field
    pub fn clear_secrets(&mut self) {
        for field in self.fields.iter_mut().filter(|f| f.masked) {
            field.value.clear();
        }
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.value.clear();
        }
        self.focus = 0;
        self.errors.clear();
        self.submitting = false;
    }
}

/// Note detail screen state
#[derive(Debug, Clone, Default)]
pub struct NoteEditor {
    pub target: Option<NoteRef>,
    pub note: Option<Note>,
    pub text: String,
    pub editing: bool,
    pub loading: bool,
    pub saving: bool,
    pub error: Option<String>,
    /// First visible body row while viewing; clamped when drawn
    pub scroll: usize,
}

impl NoteEditor {
    fn open(target: NoteRef) -> Self {
        Self {
            target: Some(target),
            editing: target.is_new(),
            loading: !target.is_new(),
            ..Self::default()
        }
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll = self.scroll.saturating_add(rows);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStatus {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// Chat screen state. The socket lives in a spawned task; `outgoing` feeds it.
#[derive(Debug)]
pub struct ChatView {
    pub transcript: Transcript,
    pub input: String,
    pub status: ChatStatus,
    pub error: Option<String>,
    /// Rows scrolled back from the newest message; 0 follows the conversation
    pub scroll_back: usize,
    outgoing: Option<mpsc::UnboundedSender<String>>,
    generation: u64,
}

impl ChatView {
    pub fn scroll_older(&mut self, rows: usize) {
        self.scroll_back = self.scroll_back.saturating_add(rows);
    }

    pub fn scroll_newer(&mut self, rows: usize) {
        self.scroll_back = self.scroll_back.saturating_sub(rows);
    }
}

impl Default for ChatView {
    fn default() -> Self {
        Self {
            transcript: Transcript::default(),
            input: String::new(),
            status: ChatStatus::Disconnected,
            error: None,
            scroll_back: 0,
            outgoing: None,
            generation: 0,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// A failed request, already mapped to what the user should see
#[derive(Debug, Clone)]
pub struct RequestError {
    pub message: String,
    pub unauthorized: bool,
}

impl RequestError {
    fn new(err: &anyhow::Error, fallback: &str) -> Self {
        warn!(error = %err, "{}", fallback);
        Self {
            message: user_message(err, fallback),
            unauthorized: is_unauthorized(err),
        }
    }
}

/// Which form a login attempt came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthForm {
    Login,
    Register,
}

/// Results sent back from spawned tasks over the MPSC channel
#[derive(Debug)]
enum ApiResult {
    LoggedIn {
        form: AuthForm,
        email: Option<String>,
        next: Route,
        result: Result<(), String>,
    },
    Dashboard(Result<Dashboard, RequestError>),
    Notes(Result<Vec<Note>, RequestError>),
    Note(i64, Result<Note, RequestError>),
    NoteSaved(Result<(), RequestError>),
    NoteDeleted(Result<(), RequestError>),
    EmotionSummary(Month, Result<Vec<EmotionSummary>, RequestError>),
    Recommendations(Result<Vec<String>, RequestError>),
    Exported(Result<PathBuf, RequestError>),
    ProfileSaved(Result<(), RequestError>),
    PlanSelected(Result<(), RequestError>),
    ChatConnected(u64),
    ChatReply(u64, String),
    ChatClosed(u64, Option<String>),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub api: ApiClient,
    pub session: Arc<SessionStore>,
    session_rx: watch::Receiver<Session>,
    /// Last session snapshot seen by the event loop
    pub session_view: Session,
    persist_config: bool,

    // UI state
    pub router: Router,
    pub state: AppState,
    pub status_message: Option<String>,
    pub pending_requests: usize,

    // Screens
    pub login: Form,
    pub register: Form,
    pub profile: Form,
    pub plan: Plan,
    pub plan_error: Option<String>,
    pub dashboard: Option<Dashboard>,
    pub notes: Vec<Note>,
    pub notes_selection: usize,
    pub notes_loaded: bool,
    pub editor: NoteEditor,
    pub month: Month,
    pub heatmap: Heatmap,
    pub recommendations: Vec<String>,
    pub export_path: Option<PathBuf>,
    pub chat: ChatView,

    // Background task channel
    results_rx: mpsc::Receiver<ApiResult>,
    results_tx: mpsc::Sender<ApiResult>,
}

impl App {
    /// Load config, pick the token store and wire the session to the API
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                let mut config = Config::default();
                config.apply_env();
                config
            }
        };
        debug!(base_url = %config.api_base_url, storage = ?config.token_storage, "Config loaded");

        let api = ApiClient::new(&config.api_base_url)?;
        let tokens = config.token_store()?;
        let session = Arc::new(SessionStore::new(tokens, Arc::new(api.clone())));
        Ok(Self::with_parts(config, api, session, true))
    }

    pub fn with_parts(
        config: Config,
        api: ApiClient,
        session: Arc<SessionStore>,
        persist_config: bool,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
        let session_rx = session.subscribe();
        let session_view = session.snapshot();

        let mut login = Form::login();
        if let Some(ref email) = config.last_email {
            login.set_value(LOGIN_EMAIL, email.clone());
        }

        Self {
            config,
            api,
            session,
            session_rx,
            session_view,
            persist_config,

            router: Router::default(),
            state: AppState::Normal,
            status_message: None,
            pending_requests: 0,

            login,
            register: Form::register(),
            profile: Form::profile(),
            plan: Plan::Lite,
            plan_error: None,
            dashboard: None,
            notes: Vec::new(),
            notes_selection: 0,
            notes_loaded: false,
            editor: NoteEditor::default(),
            month: Month::current(),
            heatmap: Heatmap::default(),
            recommendations: Vec::new(),
            export_path: None,
            chat: ChatView::default(),

            results_rx: rx,
            results_tx: tx,
        }
    }

    /// Pick up a persisted session, if any, and show the first screen.
    /// The profile resolves in the background; a rejected token sends the
    /// user back to login through the session watch.
    pub fn start(&mut self) {
        if self.session.is_authenticated() {
            self.sync_session();
            self.navigate(Route::Dashboard);
            return;
        }
        match self.session.restore_persisted() {
            Some(token) => {
                info!("Restoring persisted session");
                let session = Arc::clone(&self.session);
                tokio::spawn(async move { session.resolve_profile(token).await });
                self.sync_session();
                self.navigate(Route::Dashboard);
            }
            None => self.enter_route(self.router.current()),
        }
    }

    pub fn current_route(&self) -> Route {
        self.router.current()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Guard and enter `route`. Data for the entered screen is requested here.
    pub fn navigate(&mut self, route: Route) {
        let from = self.router.current();
        let session = self.session.snapshot();
        let entered = self.router.navigate(route, &session);
        if entered != from {
            self.leave_route(from);
            self.enter_route(entered);
        }
    }

    /// Go back one screen. Returns false if there is nothing to go back to.
    pub fn go_back(&mut self) -> bool {
        let from = self.router.current();
        let session = self.session.snapshot();
        match self.router.back(&session) {
            Some(to) => {
                if to != from {
                    self.leave_route(from);
                    self.enter_route(to);
                }
                true
            }
            None => false,
        }
    }

    /// Re-request the current screen's data
    pub fn refresh(&mut self) {
        self.enter_route(self.router.current());
    }

    fn leave_route(&mut self, route: Route) {
        match route {
            Route::Chat => self.disconnect_chat(),
            Route::NoteDetail(_) => self.editor.editing = false,
            _ => {}
        }
    }

    fn enter_route(&mut self, route: Route) {
        debug!(%route, "Entering route");
        match route {
            Route::Landing | Route::Register => {}
            Route::Login => {
                self.login.errors.clear();
                self.login.focus = if self.login.value(LOGIN_EMAIL).is_empty() {
                    LOGIN_EMAIL
                } else {
                    LOGIN_PASSWORD
                };
            }
            Route::SelectPlan => {
                self.plan_error = None;
                self.plan = self
                    .session
                    .user()
                    .and_then(|u| u.plan)
                    .filter(|p| *p != Plan::Unknown)
                    .unwrap_or_default();
            }
            Route::Profile => {
                self.profile.reset();
                if let Some(name) = self.session.user().and_then(|u| u.name) {
                    self.profile.set_value(PROFILE_NAME, name);
                }
            }
            Route::Dashboard => self.fetch_dashboard(),
            Route::Notes => self.fetch_notes(),
            Route::NoteDetail(target) => {
                self.editor = NoteEditor::open(target);
                if let NoteRef::Id(id) = target {
                    self.fetch_note(id);
                }
            }
            Route::Calendar => self.fetch_emotion_summary(),
            Route::Recommendations => self.fetch_recommendations(),
            Route::Export => self.export_path = None,
            Route::Chat => self.connect_chat(),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// React to session changes made outside the event loop (profile
    /// resolution finishing or failing).
    fn sync_session(&mut self) {
        if !self.session_rx.has_changed().unwrap_or(false) {
            return;
        }
        let session = self.session_rx.borrow_and_update().clone();
        let lost = self.session_view.is_authenticated() && !session.is_authenticated();
        self.session_view = session;

        if lost && self.router.current().is_protected() {
            warn!("Session ended while on a protected screen");
            self.end_session(Route::Login);
            self.status_message = Some(MSG_SESSION_EXPIRED.to_string());
        }
    }

    /// Log out and return to the landing screen
    pub fn logout(&mut self) {
        self.session.logout();
        self.end_session(Route::Landing);
        self.status_message = Some("Logged out".to_string());
        info!("User logged out");
    }

    fn expire_session(&mut self) {
        self.session.logout();
        self.end_session(Route::Login);
        self.status_message = Some(MSG_SESSION_EXPIRED.to_string());
    }

    fn end_session(&mut self, to: Route) {
        self.disconnect_chat();
        self.dashboard = None;
        self.notes.clear();
        self.notes_selection = 0;
        self.notes_loaded = false;
        self.editor = NoteEditor::default();
        self.heatmap = Heatmap::default();
        self.recommendations.clear();
        self.export_path = None;
        self.state = AppState::Normal;
        self.router.reset(to);
        self.enter_route(to);
    }

    fn remember_email(&mut self, email: String) {
        if self.config.last_email.as_deref() == Some(email.as_str()) {
            return;
        }
        self.config.last_email = Some(email);
        if self.persist_config {
            if let Err(e) = self.config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }
    }

    // =========================================================================
    // Spawning
    // =========================================================================

    async fn send_result(tx: &mpsc::Sender<ApiResult>, result: ApiResult) {
        if let Err(e) = tx.send(result).await {
            error!(error = %e, "Failed to send result - channel closed");
        }
    }

    fn spawn_task<F>(&mut self, task: F)
    where
        F: Future<Output = ApiResult> + Send + 'static,
    {
        self.pending_requests += 1;
        let tx = self.results_tx.clone();
        tokio::spawn(async move {
            let result = task.await;
            Self::send_result(&tx, result).await;
        });
    }

    /// Spawn a request that needs the bearer token. Does nothing without one.
    fn spawn_request<F, Fut>(&mut self, request: F)
    where
        F: FnOnce(ApiClient) -> Fut + Send + 'static,
        Fut: Future<Output = ApiResult> + Send + 'static,
    {
        let Some(token) = self.session.token() else {
            debug!("No token, request skipped");
            return;
        };
        let api = self.api.with_token(token);
        self.spawn_task(async move { request(api).await });
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub fn submit_login(&mut self) {
        if self.login.submitting {
            return;
        }
        let email = self.login.value(LOGIN_EMAIL).trim().to_string();
        let password = self.login.value(LOGIN_PASSWORD).to_string();

        self.login.errors.clear();
        if let Err(e) = validate_email(&email) {
            self.login.errors.push(e.to_string());
            return;
        }
        if password.is_empty() {
            self.login.errors.push(ValidationError::EmptyPassword.to_string());
            return;
        }

        self.login.submitting = true;
        let api = self.api.clone();
        let session = Arc::clone(&self.session);
        self.spawn_task(async move {
            let result = match api.login(&email, &password).await {
                Ok(token) => {
                    session.login(token).await;
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Login failed");
                    Err(login_error_message(&e))
                }
            };
            ApiResult::LoggedIn {
                form: AuthForm::Login,
                email: Some(email),
                next: Route::Dashboard,
                result,
            }
        });
    }

    /// Register, then log in with the same credentials and go pick a plan
    pub fn submit_register(&mut self) {
        if self.register.submitting {
            return;
        }
        let email = self.register.value(REGISTER_EMAIL).trim().to_string();
        let password = self.register.value(REGISTER_PASSWORD).to_string();
        let confirm = self.register.value(REGISTER_CONFIRM).to_string();

        let errors = validate_registration(&email, &password, &confirm);
        self.register.errors = errors.iter().map(ToString::to_string).collect();
        if !errors.is_empty() {
            return;
        }

        self.register.submitting = true;
        let api = self.api.clone();
        let session = Arc::clone(&self.session);
        self.spawn_task(async move {
            let result = async {
                api.register(&email, &password).await.map_err(|e| {
                    warn!(error = %e, "Registration failed");
                    register_error_message(&e)
                })?;
                let token = api.login(&email, &password).await.map_err(|e| {
                    warn!(error = %e, "Login after registration failed");
                    login_error_message(&e)
                })?;
                session.login(token).await;
                Ok::<(), String>(())
            }
            .await;
            ApiResult::LoggedIn {
                form: AuthForm::Register,
                email: Some(email),
                next: Route::SelectPlan,
                result,
            }
        });
    }

    /// Exchange a Google ID token for a session
    pub fn login_with_google(&mut self, id_token: String) {
        if !self.is_authenticated() {
            self.navigate(Route::Login);
        }
        self.login.submitting = true;
        let api = self.api.clone();
        let session = Arc::clone(&self.session);
        self.spawn_task(async move {
            let result = match api.google_auth(&id_token).await {
                Ok(token) => {
                    session.login(token).await;
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Google sign-in failed");
                    Err(user_message(&e, "Google sign-in failed."))
                }
            };
            ApiResult::LoggedIn {
                form: AuthForm::Login,
                email: None,
                next: Route::Dashboard,
                result,
            }
        });
    }

    fn auth_form(&mut self, form: AuthForm) -> &mut Form {
        match form {
            AuthForm::Login => &mut self.login,
            AuthForm::Register => &mut self.register,
        }
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    fn fetch_dashboard(&mut self) {
        self.spawn_request(|api| async move {
            ApiResult::Dashboard(
                api.fetch_dashboard()
                    .await
                    .map_err(|e| RequestError::new(&e, "Error fetching dashboard data")),
            )
        });
    }

    fn fetch_notes(&mut self) {
        self.spawn_request(|api| async move {
            ApiResult::Notes(
                api.fetch_notes()
                    .await
                    .map_err(|e| RequestError::new(&e, "Error fetching notes")),
            )
        });
    }

    fn fetch_note(&mut self, id: i64) {
        self.spawn_request(move |api| async move {
            ApiResult::Note(
                id,
                api.fetch_note(id)
                    .await
                    .map_err(|e| RequestError::new(&e, "Error fetching note")),
            )
        });
    }

    fn fetch_emotion_summary(&mut self) {
        let month = self.month;
        self.spawn_request(move |api| async move {
            let (start, end) = month.range();
            ApiResult::EmotionSummary(
                month,
                api.fetch_emotion_summary(start, end)
                    .await
                    .map_err(|e| RequestError::new(&e, "Error fetching emotion summaries")),
            )
        });
    }

    fn fetch_recommendations(&mut self) {
        self.spawn_request(|api| async move {
            ApiResult::Recommendations(
                api.fetch_recommendations()
                    .await
                    .map_err(|e| RequestError::new(&e, "Error fetching recommendations")),
            )
        });
    }

    // =========================================================================
    // Screen actions
    // =========================================================================

    pub fn open_selected_note(&mut self) {
        if let Some(id) = self.notes.get(self.notes_selection).map(|n| n.id) {
            self.navigate(Route::NoteDetail(NoteRef::Id(id)));
        }
    }

    pub fn new_note(&mut self) {
        self.navigate(Route::NoteDetail(NoteRef::New));
    }

    pub fn save_note(&mut self) {
        let Some(target) = self.editor.target else {
            return;
        };
        if self.editor.saving {
            return;
        }
        self.editor.saving = true;
        self.editor.error = None;
        let text = self.editor.text.clone();
        self.spawn_request(move |api| async move {
            let result = match target {
                NoteRef::New => api.create_note(&text).await,
                NoteRef::Id(id) => api.update_note(id, &text).await,
            };
            ApiResult::NoteSaved(result.map_err(|e| RequestError::new(&e, "Error saving note")))
        });
    }

    /// Ask before deleting; new notes have nothing to delete
    pub fn request_delete_note(&mut self) {
        if matches!(self.editor.target, Some(NoteRef::Id(_))) {
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn delete_note(&mut self) {
        self.state = AppState::Normal;
        let Some(NoteRef::Id(id)) = self.editor.target else {
            return;
        };
        self.spawn_request(move |api| async move {
            ApiResult::NoteDeleted(
                api.delete_note(id)
                    .await
                    .map_err(|e| RequestError::new(&e, "Error deleting note")),
            )
        });
    }

    pub fn change_month(&mut self, forward: bool) {
        self.month = if forward {
            self.month.next()
        } else {
            self.month.prev()
        };
        self.heatmap = Heatmap::default();
        self.fetch_emotion_summary();
    }

    pub fn current_month(&mut self) {
        let now = Month::current();
        if now != self.month {
            self.month = now;
            self.heatmap = Heatmap::default();
            self.fetch_emotion_summary();
        }
    }

    pub fn run_export(&mut self) {
        let dir = default_export_dir(self.config.export_dir.as_deref());
        self.status_message = Some("Exporting...".to_string());
        self.spawn_request(move |api| async move {
            ApiResult::Exported(
                export_notes(&api, &dir)
                    .await
                    .map_err(|e| RequestError::new(&e, "Failed to export data. Please try again.")),
            )
        });
    }

    pub fn submit_profile(&mut self) {
        if self.profile.submitting {
            return;
        }
        let name = self.profile.value(PROFILE_NAME).trim().to_string();
        let photo = self.profile.value(PROFILE_PHOTO).trim().to_string();

        self.profile.errors.clear();
        let photo = if photo.is_empty() {
            None
        } else {
            let path = PathBuf::from(photo);
            if let Err(e) = image_mime_type(&path) {
                self.profile.errors.push(e.to_string());
                return;
            }
            Some(path)
        };

        self.profile.submitting = true;
        self.spawn_request(move |api| async move {
            let name = Some(name.as_str()).filter(|n| !n.is_empty());
            ApiResult::ProfileSaved(
                api.update_profile(name, photo.as_deref())
                    .await
                    .map_err(|e| RequestError::new(&e, "Error updating profile")),
            )
        });
    }

    pub fn submit_plan(&mut self) {
        let plan = self.plan;
        self.plan_error = None;
        self.spawn_request(move |api| async move {
            ApiResult::PlanSelected(
                api.select_plan(plan)
                    .await
                    .map_err(|e| RequestError::new(&e, "Error selecting plan")),
            )
        });
    }

    // =========================================================================
    // Chat
    // =========================================================================

    fn connect_chat(&mut self) {
        self.disconnect_chat();
        self.chat.transcript.clear();
        self.chat.input.clear();
        self.chat.scroll_back = 0;

        let Some(token) = self.session.token() else {
            return;
        };
        let url = match self.config.chat_url() {
            Ok(url) => url,
            Err(e) => {
                self.chat.status = ChatStatus::Closed;
                self.chat.error = Some(e.to_string());
                return;
            }
        };

        self.chat.generation += 1;
        let generation = self.chat.generation;
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        self.chat.outgoing = Some(out_tx);
        self.chat.status = ChatStatus::Connecting;
        self.chat.error = None;

        let tx = self.results_tx.clone();
        tokio::spawn(run_chat(url, token, generation, out_rx, tx));
    }

    /// Drop the outgoing queue; the chat task closes the socket when it sees that
    fn disconnect_chat(&mut self) {
        if self.chat.outgoing.take().is_some() {
            debug!("Leaving chat");
        }
        self.chat.generation += 1;
        self.chat.status = ChatStatus::Disconnected;
    }

    /// Send the typed message. Blank input sends nothing.
    pub fn send_chat(&mut self) {
        let text = self.chat.input.clone();
        if text.trim().is_empty() {
            return;
        }
        let Some(ref outgoing) = self.chat.outgoing else {
            return;
        };
        if outgoing.send(text.clone()).is_ok() {
            self.chat.transcript.push_user(text);
            self.chat.input.clear();
            self.chat.scroll_back = 0;
        }
    }

    pub fn push_chat_char(&mut self, c: char) {
        if can_add_char(self.chat.input.chars().count(), MAX_CHAT_INPUT_LENGTH, c) {
            self.chat.input.push(c);
        }
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Drain finished background work and apply it
    pub fn check_background_tasks(&mut self) {
        self.sync_session();

        let mut results = Vec::new();
        while let Ok(result) = self.results_rx.try_recv() {
            results.push(result);
        }
        for result in results {
            self.process_result(result);
        }

        self.sync_session();
    }

    fn process_result(&mut self, result: ApiResult) {
        if !matches!(
            result,
            ApiResult::ChatConnected(_) | ApiResult::ChatReply(..) | ApiResult::ChatClosed(..)
        ) {
            self.pending_requests = self.pending_requests.saturating_sub(1);
        }

        match result {
            ApiResult::LoggedIn {
                form,
                email,
                next,
                result,
            } => {
                self.auth_form(form).submitting = false;
                match result {
                    Ok(()) if self.session.is_authenticated() => {
                        let f = self.auth_form(form);
                        f.clear_secrets();
                        f.errors.clear();
                        if let Some(email) = email {
                            self.remember_email(email);
                        }
                        info!("Login successful");
                        self.sync_session();
                        self.navigate(next);
                    }
                    Ok(()) => self.auth_form(form).errors = vec![MSG_UNEXPECTED.to_string()],
                    Err(message) => self.auth_form(form).errors = vec![message],
                }
            }
            ApiResult::Dashboard(result) => match result {
                Ok(dashboard) => self.dashboard = Some(dashboard),
                Err(e) => self.handle_error(e),
            },
            ApiResult::Notes(result) => match result {
                Ok(notes) => {
                    self.notes_selection = self.notes_selection.min(notes.len().saturating_sub(1));
                    self.notes = notes;
                    self.notes_loaded = true;
                }
                Err(e) => self.handle_error(e),
            },
            ApiResult::Note(id, result) => {
                if self.editor.target != Some(NoteRef::Id(id)) {
                    debug!(id, "Discarding note for a screen no longer shown");
                    return;
                }
                self.editor.loading = false;
                match result {
                    Ok(note) => {
                        self.editor.text = note.text.clone();
                        self.editor.note = Some(note);
                    }
                    Err(e) if e.unauthorized => self.expire_session(),
                    Err(e) => self.editor.error = Some(e.message),
                }
            }
            ApiResult::NoteSaved(result) => {
                self.editor.saving = false;
                match result {
                    Ok(()) => {
                        self.status_message = Some("Note saved".to_string());
                        self.editor.editing = false;
                        self.navigate(Route::Notes);
                    }
                    Err(e) if e.unauthorized => self.expire_session(),
                    Err(e) => self.editor.error = Some(e.message),
                }
            }
            ApiResult::NoteDeleted(result) => match result {
                Ok(()) => {
                    self.status_message = Some("Note deleted".to_string());
                    self.navigate(Route::Notes);
                }
                Err(e) => self.handle_error(e),
            },
            ApiResult::EmotionSummary(month, result) => {
                if month != self.month {
                    return;
                }
                match result {
                    Ok(summaries) => self.heatmap = Heatmap::from_summaries(&summaries),
                    Err(e) => self.handle_error(e),
                }
            }
            ApiResult::Recommendations(result) => match result {
                Ok(list) => self.recommendations = list,
                Err(e) => self.handle_error(e),
            },
            ApiResult::Exported(result) => match result {
                Ok(path) => {
                    self.status_message = Some(format!("Saved to {}", path.display()));
                    self.export_path = Some(path);
                }
                Err(e) => self.handle_error(e),
            },
            ApiResult::ProfileSaved(result) => {
                self.profile.submitting = false;
                match result {
                    Ok(()) => {
                        self.status_message = Some("Profile updated successfully!".to_string());
                        self.navigate(Route::Dashboard);
                    }
                    Err(e) if e.unauthorized => self.expire_session(),
                    Err(e) => self.profile.errors = vec![e.message],
                }
            }
            ApiResult::PlanSelected(result) => match result {
                Ok(()) => {
                    self.status_message = Some("Plan selected successfully".to_string());
                    self.navigate(Route::Profile);
                }
                Err(e) if e.unauthorized => self.expire_session(),
                Err(e) => self.plan_error = Some(e.message),
            },
            ApiResult::ChatConnected(generation) => {
                if generation == self.chat.generation {
                    self.chat.status = ChatStatus::Connected;
                }
            }
            ApiResult::ChatReply(generation, message) => {
                if generation == self.chat.generation {
                    self.chat.transcript.push_bot(message);
                }
            }
            ApiResult::ChatClosed(generation, error) => {
                if generation == self.chat.generation {
                    self.chat.status = ChatStatus::Closed;
                    self.chat.outgoing = None;
                    self.chat.error = error;
                }
            }
        }
    }

    fn handle_error(&mut self, err: RequestError) {
        if err.unauthorized {
            self.expire_session();
        } else {
            self.status_message = Some(err.message);
        }
    }
}

/// Own one chat socket until the screen is left or the server hangs up.
async fn run_chat(
    url: String,
    token: String,
    generation: u64,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    tx: mpsc::Sender<ApiResult>,
) {
    let (mut sender, mut receiver) = match chat::connect(&url, &token).await {
        Ok(halves) => halves,
        Err(e) => {
            warn!(error = %e, "Chat connection failed");
            App::send_result(&tx, ApiResult::ChatClosed(generation, Some(e.to_string()))).await;
            return;
        }
    };
    App::send_result(&tx, ApiResult::ChatConnected(generation)).await;

    loop {
        tokio::select! {
            message = outgoing.recv() => match message {
                Some(text) => {
                    if let Err(e) = sender.send_message(&text).await {
                        warn!(error = %e, "Chat send failed");
                        App::send_result(&tx, ApiResult::ChatClosed(generation, Some(e.to_string()))).await;
                        break;
                    }
                }
                None => {
                    if let Err(e) = sender.close().await {
                        debug!(error = %e, "Chat close failed");
                    }
                    break;
                }
            },
            reply = receiver.next_reply() => match reply {
                Some(Ok(message)) => {
                    App::send_result(&tx, ApiResult::ChatReply(generation, message)).await;
                }
                Some(Err(e)) => {
                    warn!(error = %e, "Chat socket error");
                    App::send_result(&tx, ApiResult::ChatClosed(generation, Some(e.to_string()))).await;
                    break;
                }
                None => {
                    info!("Chat closed by server");
                    App::send_result(&tx, ApiResult::ChatClosed(generation, None)).await;
                    break;
                }
            },
        }
    }
}

/// File name shown for a photo path on the profile screen
pub fn photo_label(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

/// Check if a character should be accepted into a field already holding
/// `current_len` characters
pub fn can_add_char(current_len: usize, max_len: usize, c: char) -> bool {
    current_len < max_len && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
