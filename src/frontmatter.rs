//! YAML frontmatter codec for the local article mirror.
//!
//! A document is a `---` line, a YAML block, a closing `---` line and the
//! Markdown body, kept byte for byte.
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};
use crate::model::Article;
use crate::prompt::{parse_date, DATE_FORMAT};

static DOCUMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?ms)\A---[ \t]*\r?\n(.*?)^---[ \t]*(?:\r?\n|\z)(.*)\z")
        .expect("valid frontmatter regex")
});

/// The metadata block as it appears on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportArticle {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(deserialize_with = "crate::model::null_as_empty::deserialize")]
    pub images: Vec<String>,
    pub banner: String,
    pub publish_date: String,
    pub data_source: String,
    pub author: String,
    #[serde(deserialize_with = "labels::deserialize")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "labels::deserialize")]
    pub tags: Vec<String>,
    #[serde(skip)]
    pub content: String,
}

impl ImportArticle {
    /// Fold the on-disk projection into an article. An unparseable date
    /// becomes today rather than an error.
    pub fn into_article(self) -> Article {
        let publish_date = match parse_date(&self.publish_date) {
            Some(date) => date,
            None => {
                if !self.publish_date.trim().is_empty() {
                    warn!(value = %self.publish_date, "unparseable publishDate; using today");
                }
                Local::now().date_naive()
            }
        };
        Article {
            id: self.id,
            title: self.title,
            url: self.url,
            banner: self.banner,
            images: self.images,
            publish_date,
            data_source: self.data_source,
            author: self.author,
            categories: self.categories,
            tags: self.tags,
            content: self.content,
        }
    }
}

impl From<&Article> for ImportArticle {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            url: article.url.clone(),
            images: article.images.clone(),
            banner: article.banner.clone(),
            publish_date: article.publish_date.format(DATE_FORMAT).to_string(),
            data_source: article.data_source.clone(),
            author: article.author.clone(),
            categories: article.categories.clone(),
            tags: article.tags.clone(),
            content: article.content.clone(),
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<ImportArticle> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| Error::Parse(format!("document is not UTF-8: {e}")))?;
    let caps = DOCUMENT
        .captures(text)
        .ok_or_else(|| Error::Parse("missing `---` delimited metadata block".into()))?;
    let meta = caps.get(1).map_or("", |m| m.as_str());
    let body = caps.get(2).map_or("", |m| m.as_str());

    let mut import: ImportArticle = if meta.trim().is_empty() {
        ImportArticle::default()
    } else {
        serde_yaml::from_str(meta).map_err(|e| Error::Parse(e.to_string()))?
    };
    import.content = body.to_string();
    Ok(import)
}

pub fn encode(article: &Article) -> Result<Vec<u8>> {
    let meta = serde_yaml::to_string(&ImportArticle::from(article))
        .map_err(|e| Error::Serialize(e.to_string()))?;
    let mut out = String::with_capacity(meta.len() + article.content.len() + 8);
    out.push_str("---\n");
    out.push_str(&meta);
    if !meta.ends_with('\n') {
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str(&article.content);
    Ok(out.into_bytes())
}

/// Label lists are YAML sequences; older files wrote them as one
/// comma separated string. Bare numbers and booleans are kept as text.
mod labels {
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    impl Scalar {
        fn into_label(self) -> String {
            match self {
                Scalar::Text(text) => text,
                Scalar::Int(n) => n.to_string(),
                Scalar::Float(n) => n.to_string(),
                Scalar::Bool(b) => b.to_string(),
            }
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Labels {
        List(Vec<Scalar>),
        One(Scalar),
        Missing(()),
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Labels::deserialize(deserializer)? {
            Labels::List(list) => list.into_iter().map(Scalar::into_label).collect(),
            Labels::One(Scalar::Text(joined)) => crate::prompt::split_csv(&joined),
            Labels::One(other) => vec![other.into_label()],
            Labels::Missing(()) => Vec::new(),
        })
    }
}
