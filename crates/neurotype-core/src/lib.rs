//! Core library for the Neurotype mood journal client.
//!
//! - `auth`: session store, token persistence, form validation
//! - `routes`: client routes and the authentication guard
//! - `api`: REST client and error taxonomy
//! - `chat`: realtime chat socket
//! - `calendar`, `export`: helpers behind the calendar and export screens
//! - `config`: on-disk configuration with environment overrides

pub mod api;
pub mod auth;
pub mod calendar;
pub mod chat;
pub mod config;
pub mod export;
pub mod models;
pub mod routes;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{Session, SessionStore};
pub use config::Config;
pub use routes::{guard, Guard, Route, Router};
