//! Request helper for the arshelf REST API
//!
//! Wraps a `reqwest::Client` with a cookie jar so the session cookie set by
//! `login` rides along on later calls. Non-success statuses become
//! [`ClientError`]s; 401 and 429 get their own variants because the admin
//! panel reacts to them (back to login, wait and retry).

use std::sync::Arc;

use arshelf_core::{ErrorDisplay, SessionFlag};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::form::FormData;

/// Client error type
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not logged in")]
    Unauthorized,

    #[error("too many requests")]
    RateLimited { retry_after: Option<u64> },

    #[error("{status}: {message}")]
    Status { status: u16, message: String },
}

impl ClientError {
    /// The single line shown to the user in an error display.
    pub fn display_message(&self) -> String {
        match self {
            Self::InvalidUrl { .. } => "Server address is invalid.".to_owned(),
            Self::Http(_) => "Could not reach the server.".to_owned(),
            Self::Unauthorized => "Please log in again.".to_owned(),
            Self::RateLimited {
                retry_after: Some(secs),
            } => format!("Too many attempts. Try again in {} seconds.", secs),
            Self::RateLimited { retry_after: None } => {
                "Too many attempts. Try again later.".to_owned()
            }
            Self::Status { message, .. } => message.clone(),
        }
    }

    /// Put this error into an error display widget.
    pub fn show_in(&self, display: &mut ErrorDisplay) {
        display.set_error(self.display_message());
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Error body written by the server
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Page of results from a list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserInfo {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppInfo {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub id: Uuid,
    pub app_id: Uuid,
    pub name: String,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub file_url: String,
    #[serde(default)]
    pub data: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductInfo {
    pub id: Uuid,
    pub app_id: Uuid,
    pub model_id: Option<Uuid>,
    pub name: String,
    pub barcode: String,
    pub description: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanInfo {
    pub product: ProductInfo,
    pub model: Option<ModelInfo>,
}

/// Counts reported by cascading deletes
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Removed {
    pub apps: u64,
    pub models: u64,
    pub products: u64,
}

/// JSON client bound to one server
#[derive(Clone)]
pub struct Request {
    base: Url,
    jar: Arc<Jar>,
    http: reqwest::Client,
}

impl Request {
    pub fn new(base_url: &str) -> Result<Self> {
        let mut base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        // A base without a trailing slash would lose its last segment on join.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let jar = Arc::new(Jar::default());
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .build()?;
        Ok(Self { base, jar, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Login state as the browser client sees it, from stored cookies.
    pub fn session(&self) -> SessionFlag {
        let header = self
            .jar
            .cookies(&self.base)
            .and_then(|v| v.to_str().map(str::to_owned).ok())
            .unwrap_or_default();
        SessionFlag::from_cookie_header(&header)
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl {
                url: path.to_owned(),
                reason: e.to_string(),
            })
    }

    /// `prefix` followed by each segment, percent-encoded.
    fn segments_url(&self, prefix: &str, segments: &[&str]) -> Result<Url> {
        let mut url = self.url(prefix)?;
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl {
                url: prefix.to_owned(),
                reason: "base URL cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn scan_url(&self, app_id: Uuid, barcode: &str) -> Result<Url> {
        self.segments_url("/api/scan", &[&app_id.to_string(), barcode.trim()])
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        let url = self.url(path)?;
        self.send_url(method, url, body).await
    }

    async fn send_url(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<reqwest::Response> {
        tracing::debug!(%method, %url, "api request");
        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await?;
        check(response).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T> {
        Ok(self.send(method, path, body).await?.json::<T>().await?)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        self.call(Method::POST, path, Some(body)).await
    }

    pub async fn put<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        self.call(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.call(Method::DELETE, path, None).await
    }

    // ------------------------------------------------------------------
    // Endpoints
    // ------------------------------------------------------------------

    pub async fn register(
        &self,
        username: &str,
        email: Option<&str>,
        password: &str,
    ) -> Result<UserInfo> {
        let body = json!({ "username": username, "email": email, "password": password });
        self.post("/api/user", &body).await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<UserInfo> {
        let body = json!({ "username": username, "password": password });
        self.post("/api/login", &body).await
    }

    pub async fn logout(&self) -> Result<()> {
        self.send(Method::POST, "/api/logout", None).await?;
        Ok(())
    }

    pub async fn current_user(&self) -> Result<UserInfo> {
        self.get("/api/user").await
    }

    pub async fn list_apps(&self, page: u32) -> Result<Page<AppInfo>> {
        self.get(&format!("/api/apps?page={}", page)).await
    }

    pub async fn create_app(&self, form: &FormData) -> Result<AppInfo> {
        self.post("/api/app", &form.to_json()).await
    }

    pub async fn delete_app(&self, app_id: Uuid) -> Result<Removed> {
        self.delete(&format!("/api/app/{}", app_id)).await
    }

    pub async fn list_models(&self, app_id: Uuid, page: u32) -> Result<Page<ModelInfo>> {
        self.get(&format!("/api/app/{}/models?page={}", app_id, page))
            .await
    }

    /// Upload a model. `form` carries `name` and a `file` field.
    pub async fn upload_model(&self, app_id: Uuid, form: FormData) -> Result<ModelInfo> {
        let form = form.text("app_id", app_id.to_string());
        self.post("/api/model", &form.to_json()).await
    }

    pub async fn list_products(&self, app_id: Uuid, page: u32) -> Result<Page<ProductInfo>> {
        self.get(&format!("/api/app/{}/products?page={}", app_id, page))
            .await
    }

    pub async fn create_product(&self, app_id: Uuid, form: FormData) -> Result<ProductInfo> {
        let form = form.text("app_id", app_id.to_string());
        self.post("/api/product", &form.to_json()).await
    }

    /// Public barcode lookup; works without a session.
    pub async fn lookup_barcode(&self, app_id: Uuid, barcode: &str) -> Result<ScanInfo> {
        let url = self.scan_url(app_id, barcode)?;
        Ok(self.send_url(Method::GET, url, None).await?.json().await?)
    }

    /// Download the decoded model file.
    pub async fn download_model(&self, model: &ModelInfo) -> Result<Vec<u8>> {
        let response = self.send(Method::GET, &model.file_url, None).await?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Turn a non-success response into a [`ClientError`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match status {
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
        StatusCode::TOO_MANY_REQUESTS => {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            Err(ClientError::RateLimited { retry_after })
        }
        _ => {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_owned()
                });
            tracing::debug!(status = status.as_u16(), %message, "api error");
            Err(ClientError::Status {
                status: status.as_u16(),
                message,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_are_user_facing() {
        assert_eq!(
            ClientError::Unauthorized.display_message(),
            "Please log in again."
        );
        assert_eq!(
            ClientError::RateLimited {
                retry_after: Some(30)
            }
            .display_message(),
            "Too many attempts. Try again in 30 seconds."
        );
        let err = ClientError::Status {
            status: 409,
            message: "conflict: user with this username already exists".into(),
        };
        assert_eq!(
            err.display_message(),
            "conflict: user with this username already exists"
        );
    }

    #[test]
    fn errors_render_into_display_widget() {
        let mut display = ErrorDisplay::new();
        ClientError::Unauthorized.show_in(&mut display);
        assert_eq!(display.message(), Some("Please log in again."));
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(matches!(
            Request::new("not a url"),
            Err(ClientError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn paths_join_onto_base() {
        let request = Request::new("http://localhost:3030/").unwrap();
        assert_eq!(
            request.url("/api/apps").unwrap().as_str(),
            "http://localhost:3030/api/apps"
        );
        assert!(!request.session().is_logged_in());
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let request = Request::new("http://localhost:3030/shelf").unwrap();
        assert_eq!(request.base_url().as_str(), "http://localhost:3030/shelf/");
        assert_eq!(
            request.url("/api/apps?page=2").unwrap().as_str(),
            "http://localhost:3030/shelf/api/apps?page=2"
        );
    }

    #[test]
    fn barcode_is_one_encoded_segment() {
        let request = Request::new("http://localhost:3030").unwrap();
        let app_id = Uuid::nil();
        let url = request.scan_url(app_id, " a/b c?#% ").unwrap();
        assert_eq!(
            url.path(),
            format!("/api/scan/{}/a%2Fb%20c%3F%23%25", app_id)
        );
        assert!(url.query().is_none());
        assert!(url.fragment().is_none());
    }
}
