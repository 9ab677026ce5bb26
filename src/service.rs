use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};

/// The HTTP primitives the synchronizer is built on.
#[async_trait]
pub trait Transport: Send + Sync {
    /// `GET {resource}/{id}`; any non-success status is `NotFound`.
    async fn get(&self, resource: &str, id: &str) -> Result<Value>;

    /// Authenticated JSON request. Returns the decoded response body, if any.
    async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>>;

    /// Multipart upload of a local file; only `201 Created` counts as success.
    async fn upload(&self, path: &str, file: &Path) -> Result<Vec<u8>>;

    /// True iff a plain GET of `url` answers 200.
    async fn resolve_link(&self, url: &str) -> bool;
}

pub struct HttpService {
    http: Client,
    base_url: Url,
    auth_key: String,
    username: String,
    password: String,
    token: Mutex<Option<String>>,
}

impl fmt::Debug for HttpService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpService")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct AuthUser {
    token: String,
}

impl HttpService {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::build(
            &settings.service_url,
            &settings.auth_key,
            &settings.username,
            &settings.password,
        )
    }

    /// A client for the unauthenticated `get` and `resolve_link` calls only.
    /// Authenticated requests fail at the token exchange.
    pub fn for_reading(service_url: &str) -> Result<Self> {
        Self::build(service_url, "", "", "")
    }

    fn build(service_url: &str, auth_key: &str, username: &str, password: &str) -> Result<Self> {
        if service_url.trim().is_empty() {
            return Err(Error::Transport("service url is empty".into()));
        }
        // A trailing slash makes `Url::join` append rather than replace.
        let base = format!("{}/", service_url.trim_end_matches('/'));
        let base_url = Url::parse(&base)
            .map_err(|e| Error::Transport(format!("invalid service url {base}: {e}")))?;
        let http = Client::builder()
            .user_agent(concat!("article-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            auth_key: auth_key.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            token: Mutex::new(None),
        })
    }

    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Transport(format!("invalid resource path {path}: {e}")))
    }

    pub fn build_auth_request(&self) -> Result<reqwest::Request> {
        let mut url = self.endpoint("auth")?;
        url.query_pairs_mut().append_pair("access_token", &self.auth_key);
        self.http
            .post(url)
            .basic_auth(&self.username, Some(&self.password))
            .header("Content-Type", "application/json")
            .build()
            .map_err(Error::from)
    }

    pub fn build_request(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Request> {
        let mut req = self
            .http
            .request(method, self.endpoint(path)?)
            .bearer_auth(token);
        if let Some(body) = body {
            req = req.json(body);
        }
        req.build().map_err(Error::from)
    }

    async fn user_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            return Ok(token.clone());
        }

        let request = self.build_auth_request()?;
        debug!(url = %self.base_url, "requesting user token");
        let res = self.http.execute(request).await?;
        if res.status() != StatusCode::CREATED {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(Error::Transport(format!(
                "unable to get user token: {status} {body}"
            )));
        }
        let user: AuthUser = res.json().await?;
        *cached = Some(user.token.clone());
        Ok(user.token)
    }
}

#[async_trait]
impl Transport for HttpService {
    async fn get(&self, resource: &str, id: &str) -> Result<Value> {
        let path = format!("{resource}/{id}");
        let url = self.endpoint(&path)?;
        debug!(%url, "GET");
        let res = self.http.get(url).send().await?;
        if !res.status().is_success() {
            warn!(status = %res.status(), %path, "remote lookup failed");
            return Err(Error::NotFound(path));
        }
        Ok(res.json::<Value>().await?)
    }

    async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let token = self.user_token().await?;
        let request = self.build_request(method.clone(), path, &token, body)?;
        debug!(%method, url = %request.url(), "sending request");

        let res = self.http.execute(request).await?;
        let status = res.status();
        let text = res.text().await?;
        if !status.is_success() {
            warn!(%status, %method, path, "request rejected");
            return Err(Error::Transport(format!("{method} {path}: {status} {text}")));
        }
        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn upload(&self, path: &str, file: &Path) -> Result<Vec<u8>> {
        let file_name = file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Error::UploadFailed(format!("invalid file name: {}", file.display())))?
            .to_string();
        let content = fs::read(file).await.map_err(|e| {
            Error::UploadFailed(format!("failed to read {}: {e}", file.display()))
        })?;

        let token = self.user_token().await?;
        let part = reqwest::multipart::Part::bytes(content)
            .file_name(file_name.clone())
            .mime_str(content_type(file))?;
        let form = reqwest::multipart::Form::new().part("image", part);

        let res = self
            .http
            .post(self.endpoint(path)?)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;
        if res.status() != StatusCode::CREATED {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(Error::UploadFailed(format!(
                "unable to save {file_name}: {status} {body}"
            )));
        }
        info!(file = %file_name, path, "uploaded file");
        Ok(res.bytes().await?.to_vec())
    }

    async fn resolve_link(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        match self.http.get(url).send().await {
            Ok(res) => res.status() == StatusCode::OK,
            Err(err) => {
                debug!(?err, "link check failed");
                false
            }
        }
    }
}

fn content_type(file_path: &Path) -> &'static str {
    match file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|s| s.to_ascii_lowercase())
    {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "svg" => "image/svg+xml",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
