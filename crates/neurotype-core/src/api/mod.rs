//! REST API client module for the Neurotype backend.
//!
//! This module provides the `ApiClient` for the notes, dashboard, calendar,
//! export and account endpoints, plus the error taxonomy every call site
//! maps its failures through.
//!
//! The API uses bearer tokens obtained from `POST /login` (form-encoded) or
//! `POST /auth/google`.

mod client;
pub mod error;

pub use client::ApiClient;
pub use error::{
    classify, is_unauthorized, login_error_message, register_error_message, user_message,
    ApiError, ErrorKind, MSG_NO_RESPONSE, MSG_SESSION_EXPIRED, MSG_UNEXPECTED,
};
