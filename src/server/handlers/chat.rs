use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;

use crate::auth::CurrentUser;
use crate::chat::{ChatReply, ChatRequest};
use crate::error::ApiError;
use crate::server::handlers::json_rejection;
use crate::server::state::AppState;

pub async fn chat(
    State(state): State<AppState>,
    CurrentUser(_): CurrentUser,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatReply>, ApiError> {
    let Json(request) = payload.map_err(json_rejection)?;
    Ok(Json(state.chat.chat(&request).await?))
}
