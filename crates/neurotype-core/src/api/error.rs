use thiserror::Error;

use crate::auth::ValidationError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

pub const MSG_NO_RESPONSE: &str = "No response from server. Please check your connection.";
pub const MSG_UNEXPECTED: &str = "An unexpected error occurred. Please try again.";
pub const MSG_SESSION_EXPIRED: &str = "Your session has expired. Please log in again.";

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    /// Pull the `detail` field out of a JSON error body, falling back to the raw body.
    fn detail(body: &str) -> String {
        serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or_else(|| Self::truncate_body(body))
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let detail = Self::detail(body);
        match status.as_u16() {
            400 => ApiError::BadRequest(detail),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(detail),
            404 => ApiError::NotFound(detail),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(detail),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, detail)),
        }
    }

    /// The backend's `detail` text for a 400 response
    pub fn bad_request_detail(&self) -> Option<&str> {
        match self {
            ApiError::BadRequest(detail) => Some(detail),
            _ => None,
        }
    }
}

/// Where an error falls in the client's error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any request was sent
    Validation,
    /// The backend refused the request (400/401/403)
    Auth,
    /// No response arrived
    Network,
    Unexpected,
}

fn is_transport(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout() || e.is_request()
}

fn find_api_error(err: &anyhow::Error) -> Option<&ApiError> {
    err.chain().find_map(|cause| cause.downcast_ref::<ApiError>())
}

pub fn classify(err: &anyhow::Error) -> ErrorKind {
    for cause in err.chain() {
        if cause.downcast_ref::<ValidationError>().is_some() {
            return ErrorKind::Validation;
        }
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return match api {
                ApiError::BadRequest(_) | ApiError::Unauthorized | ApiError::AccessDenied(_) => {
                    ErrorKind::Auth
                }
                ApiError::NetworkError(e) if is_transport(e) => ErrorKind::Network,
                _ => ErrorKind::Unexpected,
            };
        }
        if let Some(e) = cause.downcast_ref::<reqwest::Error>() {
            if is_transport(e) {
                return ErrorKind::Network;
            }
        }
    }
    ErrorKind::Unexpected
}

/// Message for a failed password login
pub fn login_error_message(err: &anyhow::Error) -> String {
    match classify(err) {
        ErrorKind::Validation | ErrorKind::Auth => {
            if let Some(detail) = find_api_error(err).and_then(ApiError::bad_request_detail) {
                if detail == "Invalid credentials." {
                    "Invalid email or password.".to_string()
                } else {
                    "Login failed.".to_string()
                }
            } else if find_api_error(err).is_some() {
                MSG_UNEXPECTED.to_string()
            } else {
                // Validation
                err.to_string()
            }
        }
        ErrorKind::Network => MSG_NO_RESPONSE.to_string(),
        ErrorKind::Unexpected => MSG_UNEXPECTED.to_string(),
    }
}

/// Backend messages shown verbatim when registration is refused
const REGISTER_DETAILS: [&str; 3] = [
    "Email already registered.",
    "Password must be at least 8 characters long.",
    "Password cannot be empty.",
];

/// Message for a failed registration
pub fn register_error_message(err: &anyhow::Error) -> String {
    match classify(err) {
        ErrorKind::Validation | ErrorKind::Auth => {
            if let Some(detail) = find_api_error(err).and_then(ApiError::bad_request_detail) {
                if REGISTER_DETAILS.contains(&detail) {
                    detail.to_string()
                } else {
                    "Registration failed.".to_string()
                }
            } else if find_api_error(err).is_some() {
                MSG_UNEXPECTED.to_string()
            } else {
                err.to_string()
            }
        }
        ErrorKind::Network => MSG_NO_RESPONSE.to_string(),
        ErrorKind::Unexpected => MSG_UNEXPECTED.to_string(),
    }
}

/// Message for any other failed call. `fallback` names what was being done,
/// e.g. "Error fetching notes".
pub fn user_message(err: &anyhow::Error, fallback: &str) -> String {
    match classify(err) {
        ErrorKind::Validation => err.to_string(),
        ErrorKind::Network => MSG_NO_RESPONSE.to_string(),
        ErrorKind::Auth if matches!(find_api_error(err), Some(ApiError::Unauthorized)) => {
            MSG_SESSION_EXPIRED.to_string()
        }
        _ => fallback.to_string(),
    }
}

/// True if the backend rejected the bearer token
pub fn is_unauthorized(err: &anyhow::Error) -> bool {
    matches!(find_api_error(err), Some(ApiError::Unauthorized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use reqwest::StatusCode;

    fn api_err(status: u16, body: &str) -> anyhow::Error {
        ApiError::from_status(StatusCode::from_u16(status).unwrap(), body).into()
    }

    #[test]
    fn test_from_status_extracts_detail() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"detail": "Invalid credentials."}"#);
        assert_eq!(err.bad_request_detail(), Some("Invalid credentials."));

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "plain text");
        assert_eq!(err.bad_request_detail(), Some("plain text"));

        assert!(matches!(ApiError::from_status(StatusCode::UNAUTHORIZED, ""), ApiError::Unauthorized));
        assert!(matches!(ApiError::from_status(StatusCode::BAD_GATEWAY, ""), ApiError::ServerError(_)));
        assert!(matches!(ApiError::from_status(StatusCode::IM_A_TEAPOT, ""), ApiError::InvalidResponse(_)));
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "é".repeat(400);
        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body);
        match err {
            ApiError::ServerError(msg) => assert!(msg.contains("truncated, 800 total bytes")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_login_error_messages() {
        let invalid = api_err(400, r#"{"detail": "Invalid credentials."}"#);
        assert_eq!(login_error_message(&invalid), "Invalid email or password.");

        let other = api_err(400, r#"{"detail": "Inactive user."}"#);
        assert_eq!(login_error_message(&other), "Login failed.");

        let server = api_err(500, "boom");
        assert_eq!(login_error_message(&server), MSG_UNEXPECTED);

        let validation: anyhow::Error = ValidationError::InvalidEmail.into();
        assert_eq!(login_error_message(&validation), "Please enter a valid email address.");
    }

    #[test]
    fn test_register_error_messages() {
        let taken = api_err(400, r#"{"detail": "Email already registered."}"#);
        assert_eq!(register_error_message(&taken), "Email already registered.");

        let other = api_err(400, r#"{"detail": "nope"}"#);
        assert_eq!(register_error_message(&other), "Registration failed.");
    }

    #[test]
    fn test_classify_through_context() {
        let err = Err::<(), _>(ApiError::Unauthorized)
            .context("Failed to fetch notes")
            .unwrap_err();
        assert_eq!(classify(&err), ErrorKind::Auth);
        assert!(is_unauthorized(&err));
        assert_eq!(user_message(&err, "Error fetching notes"), MSG_SESSION_EXPIRED);
    }

    #[test]
    fn test_user_message_fallback() {
        let err = api_err(404, "missing");
        assert_eq!(classify(&err), ErrorKind::Unexpected);
        assert_eq!(user_message(&err, "Error fetching notes"), "Error fetching notes");
    }
}
