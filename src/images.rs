//! Makes sure every image an article references exists remotely.
use std::path::Path;
use tracing::{debug, info, warn};

use crate::model::Article;
use crate::service::Transport;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub present: usize,
    pub uploaded: usize,
    pub failed: Vec<String>,
}

pub struct ImageReconciler<'a> {
    transport: &'a dyn Transport,
    service_url: &'a str,
}

impl<'a> ImageReconciler<'a> {
    pub fn new(transport: &'a dyn Transport, service_url: &'a str) -> Self {
        Self {
            transport,
            service_url: service_url.trim_end_matches('/'),
        }
    }

    /// Where the remote serves `image` once uploaded for `article_id`.
    pub fn remote_url(&self, article_id: &str, image: &str) -> String {
        format!(
            "{}/images/{}/{}",
            self.service_url,
            article_id,
            file_name(image)
        )
    }

    /// Upload every image that does not resolve yet. Failures are logged and
    /// collected; they never abort the pass.
    pub async fn reconcile(&self, article: &Article, article_dir: &Path) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        if article.images.is_empty() {
            return report;
        }
        if article.id.is_empty() {
            warn!(title = %article.title, "article has no id; skipping image reconciliation");
            report.failed = article.images.clone();
            return report;
        }

        let endpoint = format!("images/{}", article.id);
        for image in &article.images {
            let url = self.remote_url(&article.id, image);
            if self.transport.resolve_link(&url).await {
                debug!(%url, "image already present");
                report.present += 1;
                continue;
            }

            let local = article_dir.join(image);
            match self.transport.upload(&endpoint, &local).await {
                Ok(_) => {
                    info!(image = %image, article = %article.id, "uploaded image");
                    report.uploaded += 1;
                }
                Err(err) => {
                    warn!(%err, image = %image, article = %article.id, "image upload failed; continuing");
                    report.failed.push(image.clone());
                }
            }
        }
        report
    }
}

fn file_name(image: &str) -> &str {
    Path::new(image)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(image)
}
