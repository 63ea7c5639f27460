//! Request extractor for the signed-in user

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::sync::Arc;

use crate::auth::session::{SessionClaims, SessionKeys};
use crate::error::ApiError;

/// The authenticated caller of a handler. Rejects with 401 when the session cookie is
/// missing, malformed or expired.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionClaims);

impl<S> FromRequestParts<S> for CurrentUser
where
    Arc<SessionKeys>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = Arc::<SessionKeys>::from_ref(state);
        let claims = keys.authenticate(&parts.headers)?;
        Ok(CurrentUser(claims))
    }
}
