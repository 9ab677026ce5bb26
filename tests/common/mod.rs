#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use article_sync::config::Settings;
use article_sync::error::{Error, Result};
use article_sync::frontmatter;
use article_sync::model::Article;
use article_sync::prompt::{split_csv, FieldProvider};
use article_sync::service::Transport;

pub const SERVICE_URL: &str = "http://svc.test";

pub fn settings(location: &Path) -> Settings {
    Settings {
        service_url: SERVICE_URL.into(),
        auth_key: "key".into(),
        username: "author".into(),
        password: "pw".into(),
        article_location: location.to_path_buf(),
        recursive: false,
        excluded: vec![".git".into(), ".DS_Store".into()],
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RequestCall {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadCall {
    pub path: String,
    pub file: PathBuf,
}

/// In-memory stand-in for the content service.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    remote: Arc<Mutex<HashMap<String, Value>>>,
    links: Arc<Mutex<HashSet<String>>>,
    failing_uploads: Arc<Mutex<HashSet<String>>>,
    fail_writes: Arc<Mutex<bool>>,
    next_id: Arc<Mutex<u32>>,
    requests: Arc<Mutex<Vec<RequestCall>>>,
    uploads: Arc<Mutex<Vec<UploadCall>>>,
    link_checks: Arc<Mutex<Vec<String>>>,
}

impl RecordingTransport {
    pub async fn with_article(self, id: &str, article: &Article) -> Self {
        self.remote.lock().await.insert(
            format!("articles/{id}"),
            serde_json::to_value(article).unwrap(),
        );
        self
    }

    pub async fn failing_upload(self, file_name: &str) -> Self {
        self.failing_uploads
            .lock()
            .await
            .insert(file_name.to_string());
        self
    }

    pub async fn failing_writes(self) -> Self {
        *self.fail_writes.lock().await = true;
        self
    }

    pub async fn with_link(self, url: &str) -> Self {
        self.links.lock().await.insert(url.to_string());
        self
    }

    pub async fn requests(&self) -> Vec<RequestCall> {
        self.requests.lock().await.clone()
    }

    pub async fn uploads(&self) -> Vec<UploadCall> {
        self.uploads.lock().await.clone()
    }

    pub async fn link_checks(&self) -> Vec<String> {
        self.link_checks.lock().await.clone()
    }

    async fn fresh_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().await;
        *next += 1;
        format!("{prefix}-{next}")
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get(&self, resource: &str, id: &str) -> Result<Value> {
        let key = format!("{resource}/{id}");
        self.remote
            .lock()
            .await
            .get(&key)
            .cloned()
            .ok_or(Error::NotFound(key))
    }

    async fn send_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        self.requests.lock().await.push(RequestCall {
            method: method.clone(),
            path: path.to_string(),
            body: body.cloned(),
        });
        if *self.fail_writes.lock().await {
            return Err(Error::Transport(format!("{method} {path}: 500 boom")));
        }

        if method == Method::POST {
            let prefix = path.trim_end_matches('s');
            let id = self.fresh_id(prefix).await;
            let mut stored = body.cloned().unwrap_or_else(|| json!({}));
            stored["id"] = json!(id);
            self.remote
                .lock()
                .await
                .insert(format!("{path}/{id}"), stored.clone());
            Ok(Some(stored))
        } else if method == Method::PUT {
            let stored = body.cloned().unwrap_or_else(|| json!({}));
            self.remote
                .lock()
                .await
                .insert(path.to_string(), stored.clone());
            Ok(Some(stored))
        } else if method == Method::DELETE {
            self.remote.lock().await.remove(path);
            Ok(None)
        } else {
            Err(Error::Transport(format!("unexpected method {method}")))
        }
    }

    async fn upload(&self, path: &str, file: &Path) -> Result<Vec<u8>> {
        self.uploads.lock().await.push(UploadCall {
            path: path.to_string(),
            file: file.to_path_buf(),
        });
        let name = file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        if self.failing_uploads.lock().await.contains(&name) || !file.is_file() {
            return Err(Error::UploadFailed(format!("unable to save {name}: 500")));
        }
        let id = self.fresh_id("img").await;
        self.links
            .lock()
            .await
            .insert(format!("{SERVICE_URL}/{path}/{name}"));
        Ok(serde_json::to_vec(&json!({
            "_id": id,
            "filename": name,
            "contentType": "image/png",
        }))
        .unwrap())
    }

    async fn resolve_link(&self, url: &str) -> bool {
        self.link_checks.lock().await.push(url.to_string());
        self.links.lock().await.contains(url)
    }
}

/// Answers prompts from a script, in order, and remembers what was asked.
#[derive(Default)]
pub struct ScriptedFields {
    answers: std::sync::Mutex<VecDeque<String>>,
    asked: std::sync::Mutex<Vec<String>>,
}

impl ScriptedFields {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: std::sync::Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            asked: Default::default(),
        }
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    fn next(&self, label: &str) -> Option<String> {
        self.asked.lock().unwrap().push(label.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .filter(|a| !a.is_empty())
    }
}

impl FieldProvider for ScriptedFields {
    fn ask_string(&self, label: &str, default: &str, required: bool) -> Result<String> {
        let value = self.next(label).unwrap_or_else(|| default.to_string());
        if required && value.trim().is_empty() {
            return Err(Error::MissingField(label.to_string()));
        }
        Ok(value)
    }

    fn ask_secret(&self, label: &str, required: bool) -> Result<String> {
        self.ask_string(label, "", required)
    }

    fn ask_date(&self, label: &str, default: NaiveDate) -> Result<NaiveDate> {
        Ok(self
            .next(label)
            .and_then(|a| article_sync::prompt::parse_date(&a))
            .unwrap_or(default))
    }

    fn ask_csv(&self, label: &str, default: &[String]) -> Result<Vec<String>> {
        Ok(self
            .next(label)
            .map(|a| split_csv(&a))
            .unwrap_or_else(|| default.to_vec()))
    }

    fn interactive(&self) -> bool {
        true
    }
}

pub fn sample_article(data_source: &str) -> Article {
    Article {
        id: String::new(),
        title: "Hello".into(),
        url: "hello".into(),
        banner: String::new(),
        images: Vec::new(),
        publish_date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
        data_source: data_source.into(),
        author: "Sam".into(),
        categories: vec!["notes".into()],
        tags: vec!["rust".into()],
        content: "Body text.\n".into(),
    }
}

/// Write `article` to `dir/article.data_source` in the on-disk format.
pub fn write_article(dir: &Path, article: &Article) -> PathBuf {
    let path = dir.join(&article.data_source);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, frontmatter::encode(article).unwrap()).unwrap();
    path
}

pub fn read_article(path: &Path) -> Article {
    let bytes = std::fs::read(path).unwrap();
    frontmatter::decode(&bytes).unwrap().into_article()
}
