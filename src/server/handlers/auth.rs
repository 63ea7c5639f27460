//! Sign-in and sign-out

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Redirect, Response};
use log::{info, warn};
use serde::Deserialize;

use crate::auth::clear_session_cookie;
use crate::error::{ApiError, AuthError};
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
}

pub async fn google_login(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    Ok(Redirect::temporary(&state.oauth.authorization_url()?))
}

/// Completes sign-in: exchanges the code, checks the allow-list and sets the session
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError> {
    if let Some(error) = query.error {
        return Err(AuthError::OAuth(error).into());
    }
    let code = query
        .code
        .ok_or_else(|| ApiError::BadRequest("Missing authorization code".to_string()))?;

    let user = state.oauth.exchange_code(&code).await?;
    if !state.config.auth.is_email_allowed(&user.email) {
        warn!("Sign-in refused for {}", user.email);
        return Err(AuthError::NotAllowed(user.email).into());
    }

    let token = state.sessions.issue(&user)?;
    info!("Session started for {}", user.email);
    Ok((
        [(SET_COOKIE, state.sessions.session_cookie(&token))],
        Redirect::temporary("/files"),
    )
        .into_response())
}

pub async fn logout() -> Response {
    ([(SET_COOKIE, clear_session_cookie())], Redirect::to("/")).into_response()
}
