//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionStore`: Owner of the bearer token and resolved profile
//! - `TokenStore`: Durable token storage (file, OS keychain, or memory)
//! - Form validation run before any credentials leave the client
//!
//! A token that cannot be resolved to a user is not a valid session; the
//! store logs itself out when that happens.

pub mod session;
pub mod token_store;
pub mod validation;

pub use session::{ProfileSource, Session, SessionStore};
pub use token_store::{FileTokenStore, KeyringTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
pub use validation::{image_mime_type, validate_email, validate_registration, ValidationError};
