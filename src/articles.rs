//! CRUD against the remote `articles` resource.
use reqwest::Method;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::Article;
use crate::service::Transport;

pub const RESOURCE: &str = "articles";

pub struct ArticleRepository<'a> {
    transport: &'a dyn Transport,
}

impl<'a> ArticleRepository<'a> {
    pub fn new(transport: &'a dyn Transport) -> Self {
        Self { transport }
    }

    pub async fn get(&self, id: &str) -> Result<Article> {
        let body = self.transport.get(RESOURCE, id).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Existence check ahead of an update. Only a missing resource answers
    /// `false`; transport failures still propagate.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        match self.transport.get(RESOURCE, id).await {
            Ok(_) => Ok(true),
            Err(Error::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Create the article and return the id the remote assigned to it.
    pub async fn create(&self, article: &Article) -> Result<String> {
        let body = serde_json::to_value(article)?;
        let response = self
            .transport
            .send_request(Method::POST, RESOURCE, Some(&body))
            .await?;
        let id = response
            .as_ref()
            .and_then(|v| v.get("id"))
            .and_then(|v| v.as_str())
            .filter(|id| !id.is_empty())
            .ok_or(Error::MissingId)?
            .to_string();
        info!(%id, title = %article.title, "created article");
        Ok(id)
    }

    pub async fn update(&self, id: &str, article: &Article) -> Result<()> {
        let body = serde_json::to_value(article)?;
        self.transport
            .send_request(Method::PUT, &format!("{RESOURCE}/{id}"), Some(&body))
            .await?;
        info!(%id, title = %article.title, "updated article");
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.transport
            .send_request(Method::DELETE, &format!("{RESOURCE}/{id}"), None)
            .await?;
        info!(%id, "deleted article");
        Ok(())
    }
}
