//! Authentication
//!
//! Google sign-in, signed session cookies, and the extractor that turns a request's
//! cookie into the caller's identity.

pub mod extract;
pub mod oauth;
pub mod session;

pub use extract::CurrentUser;
pub use oauth::GoogleOAuth;
pub use session::{SESSION_COOKIE, SessionClaims, SessionKeys, clear_session_cookie};
