use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// An article as the remote service stores it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Article {
    /// Empty until the remote has created the article.
    pub id: String,
    pub title: String,
    pub url: String,
    pub banner: String,
    #[serde(deserialize_with = "null_as_empty::deserialize")]
    pub images: Vec<String>,
    #[serde(with = "wire_date")]
    pub publish_date: NaiveDate,
    /// Local file backing this article; also its local identity.
    pub data_source: String,
    pub author: String,
    #[serde(deserialize_with = "null_as_empty::deserialize")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "null_as_empty::deserialize")]
    pub tags: Vec<String>,
    pub content: String,
}

impl Default for Article {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            url: String::new(),
            banner: String::new(),
            images: Vec::new(),
            publish_date: Local::now().date_naive(),
            data_source: String::new(),
            author: String::new(),
            categories: Vec::new(),
            tags: Vec::new(),
            content: String::new(),
        }
    }
}

/// A link post. Remote only, never mirrored to disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Link {
    pub id: String,
    pub title: String,
    pub link_title: String,
    pub url: String,
    pub banner: String,
    #[serde(deserialize_with = "null_as_empty::deserialize")]
    pub categories: Vec<String>,
    #[serde(deserialize_with = "null_as_empty::deserialize")]
    pub tags: Vec<String>,
}

/// Response body of an image upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Image {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "filename")]
    pub file_name: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// Lists written by older clients arrive as `null` rather than `[]`.
pub(crate) mod null_as_empty {
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// `publishDate` travels as a midnight UTC timestamp; reading accepts any
/// RFC 3339 timestamp or a bare date.
mod wire_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}T00:00:00Z", date.format("%Y-%m-%d")))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(ts.date_naive());
        }
        NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn article_uses_camel_case_on_the_wire() {
        let article = Article {
            id: "a1".into(),
            title: "Hello".into(),
            publish_date: NaiveDate::from_ymd_opt(2020, 5, 17).unwrap(),
            data_source: "hello.md".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&article).unwrap();
        assert_eq!(value["publishDate"], "2020-05-17T00:00:00Z");
        assert_eq!(value["dataSource"], "hello.md");
        assert!(value.get("publish_date").is_none());
    }

    #[test]
    fn article_accepts_timestamps_with_time_of_day() {
        let article: Article = serde_json::from_value(json!({
            "id": "x",
            "title": "T",
            "publishDate": "2019-12-31T22:15:00-05:00",
        }))
        .unwrap();
        assert_eq!(
            article.publish_date,
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap()
        );
        assert!(article.tags.is_empty());
    }

    #[test]
    fn null_lists_decode_as_empty() {
        let article: Article = serde_json::from_value(json!({
            "id": "legacy",
            "title": "No labels",
            "publishDate": "2017-03-01T00:00:00Z",
            "categories": null,
            "tags": null,
            "images": null,
        }))
        .unwrap();
        assert!(article.categories.is_empty());
        assert!(article.tags.is_empty());
        assert!(article.images.is_empty());

        let link: Link = serde_json::from_value(json!({
            "id": "l1",
            "categories": null,
            "tags": ["rust"],
        }))
        .unwrap();
        assert!(link.categories.is_empty());
        assert_eq!(link.tags, vec!["rust"]);
    }

    #[test]
    fn image_response_maps_underscore_id() {
        let image: Image = serde_json::from_value(json!({
            "_id": "5b2",
            "filename": "cover.png",
            "contentType": "image/png",
        }))
        .unwrap();
        assert_eq!(image.id, "5b2");
        assert_eq!(image.file_name, "cover.png");
    }
}
