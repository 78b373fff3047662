//! web-server: Local host for the quick links web part.
//!
//! Serves the read-only panel as HTML and exposes the editing form as a JSON
//! API. Every committed change is written through to the configured store.
//! - Storage: In-memory (default) or SQLite (file) when the `sqlite` feature is enabled.
//! - CORS: Configurable via CORS_ALLOW_ORIGIN (origin string) for a separate editor frontend.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p web-server
//!
//! # persist to a SQLite file
//! STORAGE_PROVIDER=sqlite DB_PATH=./data/quicklinks.db cargo run -p web-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;
mod html;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::http::HeaderValue;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use domain::adapters::memory_store::InMemoryStore;
use domain::form::{Draft, EditMode, EntrySummary, LinkEditor};
use domain::id::Base62IdGenerator;
use domain::render::{render_panel, PanelView};
use domain::{CoreError, IconType, LinkId, LinkList, LinksObserver, MissingField, PropertyStore};
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type Editor = LinkEditor<Base62IdGenerator, StoreObserver>;

/// Writes every list snapshot through to the store. A failed save is kept
/// until the handler that caused it collects it.
struct StoreObserver {
    store: Arc<dyn PropertyStore>,
    last_error: Option<CoreError>,
}

impl StoreObserver {
    fn take_error(&mut self) -> Option<CoreError> {
        self.last_error.take()
    }
}

impl LinksObserver for StoreObserver {
    fn links_changed(&mut self, links: &LinkList) {
        match self.store.save_links(links) {
            Ok(()) => debug!(count = links.len(), "links saved"),
            Err(e) => {
                error!(error = %e, count = links.len(), "failed to save links");
                self.last_error = Some(e);
            }
        }
    }
}

struct Session {
    title: String,
    editor: Editor,
}

impl Session {
    /// Fail the request if the change it committed was not saved.
    fn persisted(&mut self) -> Result<(), ApiError> {
        match self.editor.observer_mut().take_error() {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Pick up changes written to the store by someone else.
    fn refresh(&mut self, store: &dyn PropertyStore) -> Result<(), ApiError> {
        let props = store.load()?;
        if !props.title.is_empty() {
            self.title = props.title;
        }
        if self.editor.links().to_stored() != props.links {
            let stored = props.links;
            self.editor.reload(stored.clone())?;
            if self.editor.links().to_stored() != stored {
                store.save_links(self.editor.links())?;
            }
        }
        Ok(())
    }
}

#[derive(Clone)]
struct AppState {
    store: Arc<dyn PropertyStore>,
    session: Arc<Mutex<Session>>,
    theme: config::Theme,
}

impl AppState {
    /// Load the store and mount an editor on it. An empty title is seeded
    /// with `default_title`; stored entries that needed new ids are saved back.
    fn load(
        store: Arc<dyn PropertyStore>,
        default_title: &str,
        theme: config::Theme,
    ) -> Result<Self, CoreError> {
        let props = store.load()?;
        let title = if props.title.is_empty() {
            store.save_title(default_title)?;
            default_title.to_string()
        } else {
            props.title
        };

        let stored = props.links;
        let observer = StoreObserver { store: Arc::clone(&store), last_error: None };
        let editor = LinkEditor::new(stored.clone(), Base62IdGenerator::new(4), observer)?;
        if editor.links().to_stored() != stored {
            info!(count = editor.links().len(), "normalised stored links");
            store.save_links(editor.links())?;
        }

        Ok(Self {
            store,
            session: Arc::new(Mutex::new(Session { title, editor })),
            theme,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Session>, ApiError> {
        self.session.lock().map_err(|_| ApiError::Poisoned)
    }
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("session lock poisoned")]
    Poisoned,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Core(CoreError::InvalidUrl(reason)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                http_common::json_error_with_message(
                    "invalid_url",
                    reason.message().unwrap_or("URL is required"),
                ),
            ),
            ApiError::Core(CoreError::IncompleteDraft(field)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                http_common::json_error_with_message(
                    "incomplete_draft",
                    match field {
                        MissingField::Title => "Title is required",
                        MissingField::Url => "URL is required",
                    },
                ),
            ),
            ApiError::Core(CoreError::InvalidLinkId(msg)) => (
                StatusCode::BAD_REQUEST,
                http_common::json_error_with_message("invalid_link_id", msg),
            ),
            ApiError::Core(CoreError::NotFound) => {
                (StatusCode::NOT_FOUND, http_common::json_err("not_found"))
            }
            ApiError::Core(CoreError::Repository(_)) | ApiError::Poisoned => {
                error!(error = %self, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, http_common::json_err("internal"))
            }
        };
        (status, Json(body)).into_response()
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);

    let store = build_store(&cfg);
    let state = match AppState::load(store, &cfg.web_part_title, cfg.theme) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to load web part properties");
            std::process::exit(1);
        }
    };

    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    let mut app = router(state)
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::PATCH,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    app = app.layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(%addr, "web-server listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server error");
        std::process::exit(1);
    }
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

// Construct a store based on config and feature flags.
fn build_store(cfg: &config::Config) -> Arc<dyn PropertyStore> {
    match cfg.storage_provider {
        #[cfg(feature = "sqlite")]
        config::StorageProvider::Sqlite => {
            if let Some(dir) = cfg.db_path.parent() {
                let _ = std::fs::create_dir_all(dir);
            }
            match sqlite_store::SqliteStore::new(&cfg.db_path) {
                Ok(s) => {
                    info!(path = %cfg.db_path.display(), "using sqlite store");
                    Arc::new(s)
                }
                Err(e) => {
                    warn!(error = %e, "failed to open sqlite store; falling back to memory");
                    Arc::new(InMemoryStore::new())
                }
            }
        }
        _ => {
            info!("using in-memory store; data is lost on restart");
            Arc::new(InMemoryStore::new())
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(get_page))
        .route("/api/panel", get(get_panel))
        .route("/api/title", put(put_title))
        .route("/api/editor", get(get_editor))
        .route("/api/editor/draft", patch(patch_draft))
        .route("/api/editor/submit", post(submit))
        .route("/api/editor/edit/:id", post(start_edit))
        .route("/api/editor/cancel", post(cancel_edit))
        .route("/api/editor/links/:id", delete(delete_link))
        .with_state(state)
}

/// Editor state as the form needs it to render.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EditorView {
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    editing_id: Option<LinkId>,
    draft: Draft,
    /// Message for the URL field; absent when the URL is fine or empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    url_error: Option<&'static str>,
    url_invalid: bool,
    missing: Vec<MissingField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    icon_warning: Option<&'static str>,
    can_submit: bool,
    entries: Vec<EntrySummary>,
}

impl EditorView {
    fn of(editor: &Editor) -> Self {
        let (mode, editing_id) = match editor.mode() {
            EditMode::Compose => ("compose", None),
            EditMode::Edit(id) => ("edit", Some(id.clone())),
        };
        let url_error = editor.url_error();
        Self {
            mode,
            editing_id,
            draft: editor.draft().clone(),
            url_error: url_error.and_then(|r| r.message()),
            url_invalid: url_error.is_some(),
            missing: editor.missing_fields(),
            icon_warning: editor.icon_warning().and_then(|r| r.message()),
            can_submit: editor.can_submit(),
            entries: editor.entries(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DraftPatch {
    title: Option<String>,
    url: Option<String>,
    icon_type: Option<IconType>,
    icon: Option<String>,
    open_in_new_tab: Option<bool>,
}

#[derive(Deserialize)]
struct TitleReq {
    title: String,
}

#[derive(Serialize)]
struct TitleOut {
    title: String,
}

async fn get_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let view = panel_view(&state)?;
    Ok(Html(html::render_page(&view, state.theme)))
}

async fn get_panel(State(state): State<AppState>) -> Result<Json<PanelView>, ApiError> {
    Ok(Json(panel_view(&state)?))
}

fn panel_view(state: &AppState) -> Result<PanelView, ApiError> {
    let session = state.lock()?;
    Ok(render_panel(&session.title, session.editor.links()))
}

async fn put_title(
    State(state): State<AppState>,
    Json(body): Json<TitleReq>,
) -> Result<Json<TitleOut>, ApiError> {
    let mut session = state.lock()?;
    state.store.save_title(&body.title)?;
    info!(title = %body.title, "title updated");
    session.title = body.title;
    Ok(Json(TitleOut { title: session.title.clone() }))
}

async fn get_editor(State(state): State<AppState>) -> Result<Json<EditorView>, ApiError> {
    let mut session = state.lock()?;
    session.refresh(state.store.as_ref())?;
    Ok(Json(EditorView::of(&session.editor)))
}

async fn patch_draft(
    State(state): State<AppState>,
    Json(patch): Json<DraftPatch>,
) -> Result<Json<EditorView>, ApiError> {
    let mut session = state.lock()?;
    let editor = &mut session.editor;
    if let Some(title) = &patch.title {
        editor.set_title(title);
    }
    if let Some(url) = &patch.url {
        editor.set_url(url);
    }
    // Type before icon: switching type resets the icon.
    if let Some(icon_type) = patch.icon_type {
        editor.set_icon_type(icon_type);
    }
    if let Some(icon) = &patch.icon {
        editor.set_icon(icon);
    }
    if let Some(open_in_new_tab) = patch.open_in_new_tab {
        editor.set_open_in_new_tab(open_in_new_tab);
    }
    Ok(Json(EditorView::of(editor)))
}

async fn submit(State(state): State<AppState>) -> Result<Json<EditorView>, ApiError> {
    let mut session = state.lock()?;
    let editing = session.editor.mode().clone();
    match session.editor.submit() {
        Ok(id) => {
            session.persisted()?;
            match editing {
                EditMode::Compose => info!(id = %id, "link added"),
                EditMode::Edit(_) => info!(id = %id, "link updated"),
            }
            Ok(Json(EditorView::of(&session.editor)))
        }
        Err(e) => {
            debug!(reason = %e, "submit rejected");
            Err(e.into())
        }
    }
}

async fn start_edit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EditorView>, ApiError> {
    let id = LinkId::new(id)?;
    let mut session = state.lock()?;
    session.editor.start_edit(&id)?;
    Ok(Json(EditorView::of(&session.editor)))
}

async fn cancel_edit(State(state): State<AppState>) -> Result<Json<EditorView>, ApiError> {
    let mut session = state.lock()?;
    session.editor.cancel_edit();
    Ok(Json(EditorView::of(&session.editor)))
}

async fn delete_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EditorView>, ApiError> {
    let id = LinkId::new(id)?;
    let mut session = state.lock()?;
    let removed = session.editor.delete(&id)?;
    session.persisted()?;
    info!(id = %id, title = %removed.title, "link deleted");
    Ok(Json(EditorView::of(&session.editor)))
}
