use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};

use crate::middleware::log_request;
use crate::server::handlers::{auth, chat, files, pages, terminal};
use crate::server::state::AppState;

/// Builds the full application router
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.server.max_upload_bytes();

    Router::new()
        .route("/", get(pages::index))
        .route("/files", get(pages::files_page))
        .route("/terminal", get(pages::terminal_page))
        .route("/static/{*path}", get(pages::static_asset))
        .route("/auth/google", get(auth::google_login))
        .route("/auth/google/callback", get(auth::google_callback))
        .route("/auth/logout", post(auth::logout))
        .route("/api/files", get(files::list_files))
        .route(
            "/api/files/upload",
            post(files::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/files/download", get(files::download_file))
        .route("/api/files/delete", delete(files::delete_file))
        .route("/api/files/mkdir", post(files::make_dir))
        .route("/api/chat", post(chat::chat))
        .route("/api/terminal/exec", post(terminal::exec))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
