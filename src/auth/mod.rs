//! Authentication module
//!
//! Supports: API Key (`x-api-key`) and Session Token (`x-session-token`)
//!
//! The mode is a tagged variant chosen once per client. A session token is
//! obtained through the login handshake, which the `Authenticator` runs and
//! caches.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub(crate) use types::MeResponse;
pub use types::{
    is_well_formed_api_key, AuthMode, LoginOutcome, Session, API_KEY_HEADER,
    SESSION_TOKEN_HEADER, SESSION_TTL_HOURS,
};

#[cfg(test)]
mod tests;
