//! API client for communicating with the Neurotype REST API.
//!
//! This module provides the `ApiClient` struct for making authenticated
//! requests for notes, dashboard statistics, emotion summaries and exports.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, multipart, Client};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::auth::{image_mime_type, ProfileSource};
use crate::models::{
    Dashboard, EmotionSummary, Note, NoteInput, Plan, Recommendations, TokenResponse, User,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
/// The hosted backend cold-starts slowly, so this is generous.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Date format used by the emotions-summary query parameters
const QUERY_DATE_FORMAT: &str = "%Y-%m-%d";

/// API client for the Neurotype backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))
                    .context("Token contains characters not allowed in a header")?,
            );
        }
        Ok(headers)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder, what: &str) -> Result<reqwest::Response> {
        let response = request
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send {} request", what))?;
        Self::check_response(response).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(path, "GET");
        let response = self.send(self.client.get(&url), "GET").await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", path))
    }

    /// Send a JSON body and discard whatever comes back
    async fn send_json<B: Serialize>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &B,
    ) -> Result<()> {
        let url = self.url(path);
        debug!(%method, path, "Sending JSON");
        self.send(self.client.request(method, &url).json(body), "JSON")
            .await?;
        Ok(())
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Exchange email and password for a bearer token (form-encoded, OAuth2 style)
    pub async fn login(&self, email: &str, password: &str) -> Result<String> {
        let url = self.url("/login");
        let response = self
            .send(
                self.client
                    .post(&url)
                    .form(&[("username", email), ("password", password)]),
                "login",
            )
            .await?;
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .context("Failed to parse login response")?;
        Ok(body.access_token)
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<()> {
        #[derive(Serialize)]
        struct RegisterRequest<'a> {
            email: &'a str,
            password: &'a str,
        }
        self.send_json(
            reqwest::Method::POST,
            "/register",
            &RegisterRequest { email, password },
        )
        .await
    }

    /// Exchange a Google ID token for a bearer token
    pub async fn google_auth(&self, id_token: &str) -> Result<String> {
        #[derive(Serialize)]
        struct GoogleRequest<'a> {
            id_token: &'a str,
        }
        let url = self.url("/auth/google");
        let response = self
            .send(
                self.client.post(&url).json(&GoogleRequest { id_token }),
                "Google sign-in",
            )
            .await?;
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .context("Failed to parse Google sign-in response")?;
        Ok(body.access_token)
    }

    pub async fn fetch_me(&self) -> Result<User> {
        self.get("/users/me").await
    }

    // =========================================================================
    // Dashboard & recommendations
    // =========================================================================

    pub async fn fetch_dashboard(&self) -> Result<Dashboard> {
        self.get("/dashboard/").await
    }

    pub async fn fetch_recommendations(&self) -> Result<Vec<String>> {
        let body: Recommendations = self.get("/recommendations/").await?;
        Ok(body.recommendations)
    }

    // =========================================================================
    // Notes
    // =========================================================================

    pub async fn fetch_notes(&self) -> Result<Vec<Note>> {
        self.get("/notes/").await
    }

    /// Fetch one note. The backend has no single-note endpoint, so this
    /// searches the list.
    pub async fn fetch_note(&self, id: i64) -> Result<Note> {
        self.fetch_notes()
            .await?
            .into_iter()
            .find(|n| n.id == id)
            .ok_or_else(|| ApiError::NotFound(format!("note {}", id)).into())
    }

    pub async fn create_note(&self, text: &str) -> Result<()> {
        self.send_json(
            reqwest::Method::POST,
            "/notes/",
            &NoteInput {
                text: text.to_string(),
            },
        )
        .await
    }

    pub async fn update_note(&self, id: i64, text: &str) -> Result<()> {
        self.send_json(
            reqwest::Method::PUT,
            &format!("/notes/{}", id),
            &NoteInput {
                text: text.to_string(),
            },
        )
        .await
    }

    pub async fn delete_note(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("/notes/{}", id));
        self.send(self.client.delete(&url), "DELETE").await?;
        Ok(())
    }

    /// Prevalent emotion per day for the inclusive date range
    pub async fn fetch_emotion_summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<EmotionSummary>> {
        let url = self.url("/notes/emotions-summary");
        let start = start.format(QUERY_DATE_FORMAT).to_string();
        let end = end.format(QUERY_DATE_FORMAT).to_string();
        let response = self
            .send(
                self.client
                    .get(&url)
                    .query(&[("start_date", start.as_str()), ("end_date", end.as_str())]),
                "emotions summary",
            )
            .await?;
        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .context("Failed to parse emotions summary")
    }

    // =========================================================================
    // Account
    // =========================================================================

    /// Raw CSV bytes of every note
    pub async fn export_data(&self) -> Result<Vec<u8>> {
        let url = self.url("/data/export");
        let response = self.send(self.client.get(&url), "export").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(ApiError::from)
            .context("Failed to read export body")?;
        Ok(bytes.to_vec())
    }

    /// Update display name and/or profile photo. The photo must be an image file.
    pub async fn update_profile(&self, name: Option<&str>, photo: Option<&Path>) -> Result<()> {
        let mut form = multipart::Form::new();
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            form = form.text("name", name.to_string());
        }
        if let Some(path) = photo {
            let mime = image_mime_type(path)?;
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("photo")
                .to_string();
            let part = multipart::Part::bytes(bytes)
                .file_name(file_name)
                .mime_str(mime)
                .context("Invalid MIME type")?;
            form = form.part("file", part);
        }

        let url = self.url("/profile");
        self.send(self.client.put(&url).multipart(form), "profile")
            .await?;
        Ok(())
    }

    pub async fn select_plan(&self, plan: Plan) -> Result<()> {
        let url = self.url("/select-plan");
        self.send(
            self.client
                .put(&url)
                .query(&[("plan_in", plan.as_param())])
                .json(&serde_json::json!({})),
            "select plan",
        )
        .await?;
        Ok(())
    }
}

#[async_trait]
impl ProfileSource for ApiClient {
    async fn fetch_profile(&self, token: &str) -> Result<User> {
        self.with_token(token).fetch_me().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::is_unauthorized;
    use crate::auth::{MemoryTokenStore, Session, SessionStore, TokenStore};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve a single canned HTTP response on a loopback port.
    /// Returns the base URL and a receiver for the raw request text.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length")
                                .then(|| v.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&buf).to_string());

            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        (format!("http://{}", addr), rx)
    }

    #[test]
    fn test_base_url_is_normalized() {
        let api = ApiClient::new("http://localhost:8000/").unwrap();
        assert_eq!(api.base_url(), "http://localhost:8000");
        assert_eq!(api.url("/notes/"), "http://localhost:8000/notes/");
    }

    #[test]
    fn test_auth_headers() {
        let api = ApiClient::new("http://localhost").unwrap();
        assert!(api.auth_headers().unwrap().is_empty());

        let authed = api.with_token("abc");
        let headers = authed.auth_headers().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");

        let bad = api.with_token("line\nbreak");
        assert!(bad.auth_headers().is_err());
    }

    #[tokio::test]
    async fn test_login_sends_form_and_reads_token() {
        let (base, request) = serve_once("200 OK", r#"{"access_token": "tok", "token_type": "bearer"}"#).await;
        let api = ApiClient::new(&base).unwrap();

        let token = api.login("ada@example.com", "hunter22").await.unwrap();
        assert_eq!(token, "tok");

        let raw = request.await.unwrap();
        assert!(raw.starts_with("POST /login "));
        assert!(raw.contains("username=ada%40example.com&password=hunter22"));
    }

    #[tokio::test]
    async fn test_login_bad_request_keeps_detail() {
        let (base, _request) = serve_once("400 Bad Request", r#"{"detail": "Invalid credentials."}"#).await;
        let api = ApiClient::new(&base).unwrap();

        let err = api.login("ada@example.com", "wrong").await.unwrap_err();
        assert_eq!(
            crate::api::error::login_error_message(&err),
            "Invalid email or password."
        );
    }

    #[tokio::test]
    async fn test_emotion_summary_query() {
        let (base, request) = serve_once("200 OK", r#"[{"date": "2024-10-01", "prevalent_emotion": "sad"}]"#).await;
        let api = ApiClient::new(&base).unwrap().with_token("t");

        let start = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 10, 31).unwrap();
        let rows = api.fetch_emotion_summary(start, end).await.unwrap();
        assert_eq!(rows.len(), 1);

        let raw = request.await.unwrap();
        assert!(raw.starts_with(
            "GET /notes/emotions-summary?start_date=2024-10-01&end_date=2024-10-31 "
        ));
        assert!(raw.to_lowercase().contains("authorization: bearer t"));
    }

    #[tokio::test]
    async fn test_select_plan_uses_query() {
        let (base, request) = serve_once("200 OK", "{}").await;
        let api = ApiClient::new(&base).unwrap().with_token("t");
        api.select_plan(Plan::Plus).await.unwrap();
        let raw = request.await.unwrap();
        assert!(raw.starts_with("PUT /select-plan?plan_in=plus "));
    }

    #[tokio::test]
    async fn test_update_profile_rejects_non_image_before_sending() {
        let api = ApiClient::new("http://127.0.0.1:9").unwrap().with_token("t");
        let err = api
            .update_profile(Some("Ada"), Some(Path::new("notes.csv")))
            .await
            .unwrap_err();
        assert_eq!(
            crate::api::error::classify(&err),
            crate::api::ErrorKind::Validation
        );
    }

    #[tokio::test]
    async fn test_unauthorized_profile_logs_session_out() {
        let (base, request) = serve_once("401 Unauthorized", r#"{"detail": "Could not validate credentials"}"#).await;
        let api = ApiClient::new(&base).unwrap();

        let err = api.with_token("abc").fetch_me().await;
        assert!(err.is_err());
        // Consume the first server so the second request gets a fresh one
        let _ = request.await;
        assert!(is_unauthorized(&err.unwrap_err()));

        let (base, request) = serve_once("401 Unauthorized", r#"{"detail": "Could not validate credentials"}"#).await;
        let tokens = Arc::new(MemoryTokenStore::new());
        let store = SessionStore::new(tokens.clone(), Arc::new(ApiClient::new(&base).unwrap()));

        store.login("abc").await;

        let raw = request.await.unwrap();
        assert!(raw.starts_with("GET /users/me "));
        assert_eq!(store.snapshot(), Session::default());
        assert_eq!(tokens.load().unwrap(), None);
    }
}
