//! Link posts: always created fresh, never updated in place.
use reqwest::Method;
use tracing::info;

use crate::error::Result;
use crate::model::Link;
use crate::prompt::{given_or_ask, FieldProvider};
use crate::service::Transport;

pub const RESOURCE: &str = "links";

pub struct LinkPublisher<'a> {
    transport: &'a dyn Transport,
    fields: &'a dyn FieldProvider,
}

impl<'a> LinkPublisher<'a> {
    pub fn new(transport: &'a dyn Transport, fields: &'a dyn FieldProvider) -> Self {
        Self { transport, fields }
    }

    /// Ask for every field of a blank link and POST it.
    pub async fn create_new_link(&self) -> Result<Link> {
        let fields = self.fields;
        let mut link = Link {
            title: fields.ask_string("Title", "", true)?,
            link_title: fields.ask_string("Link Title", "", true)?,
            url: fields.ask_string("Permalink", "", true)?,
            banner: fields.ask_string("Banner Url", "", false)?,
            categories: fields.ask_csv("Categories (csv)", &[])?,
            tags: fields.ask_csv("Tags (csv)", &[])?,
            ..Default::default()
        };

        let body = serde_json::to_value(&link)?;
        let response = self
            .transport
            .send_request(Method::POST, RESOURCE, Some(&body))
            .await?;
        if let Some(id) = response
            .as_ref()
            .and_then(|v| v.get("id"))
            .and_then(|v| v.as_str())
        {
            link.id = id.to_string();
        }
        info!(id = %link.id, title = %link.title, "created link");
        Ok(link)
    }

    pub async fn delete_link(&self, id: Option<&str>) -> Result<String> {
        let id = given_or_ask(self.fields, id, "Link Id")?;
        self.transport
            .send_request(Method::DELETE, &format!("{RESOURCE}/{id}"), None)
            .await?;
        info!(%id, "deleted link");
        Ok(id)
    }
}
