use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use log::info;

use crate::auth::CurrentUser;
use crate::error::ApiError;
use crate::server::handlers::json_rejection;
use crate::server::state::AppState;
use crate::terminal::{self, ExecRequest, ExecResult};

pub async fn exec(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    payload: Result<Json<ExecRequest>, JsonRejection>,
) -> Result<Json<ExecResult>, ApiError> {
    if !state.config.terminal.enabled {
        return Err(ApiError::Forbidden("Terminal is disabled".to_string()));
    }
    let Json(request) = payload.map_err(json_rejection)?;

    info!("Terminal command from {}", claims.email);
    let result = terminal::run_command(&state.storage_root(), &request.cmd).await;
    Ok(Json(result))
}
