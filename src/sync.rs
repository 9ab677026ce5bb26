//! Article synchronization: local Markdown file ⇄ remote article.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument, warn};

use crate::articles::ArticleRepository;
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::frontmatter;
use crate::images::ImageReconciler;
use crate::model::{Article, Image};
use crate::prompt::{given_or_ask, FieldProvider};
use crate::service::Transport;

pub const MARKDOWN_EXTENSION: &str = "md";

pub struct Synchronizer<'a> {
    settings: &'a Settings,
    transport: &'a dyn Transport,
    fields: &'a dyn FieldProvider,
}

impl<'a> Synchronizer<'a> {
    pub fn new(
        settings: &'a Settings,
        transport: &'a dyn Transport,
        fields: &'a dyn FieldProvider,
    ) -> Self {
        Self {
            settings,
            transport,
            fields,
        }
    }

    fn repository(&self) -> ArticleRepository<'a> {
        ArticleRepository::new(self.transport)
    }

    /// Directory holding the article's local file; images are relative to it.
    fn article_dir(&self, article: &Article) -> PathBuf {
        if article.data_source.is_empty() {
            return self.settings.article_location.clone();
        }
        self.settings
            .resolve_path(&article.data_source)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.article_location.clone())
    }

    /// Push `article` to the remote and mirror the result to its local file.
    ///
    /// When the remote write fails the error is returned straight away: no
    /// images are uploaded and the local file is left untouched. `article`
    /// keeps whatever state it reached.
    #[instrument(skip_all, fields(title = %article.title, id = %article.id))]
    pub async fn save(&self, article: &mut Article, bypass_prompts: bool) -> Result<()> {
        self.collect_fields(article, bypass_prompts).await?;

        let repo = self.repository();
        if !article.id.is_empty() && !repo.exists(&article.id).await? {
            warn!(id = %article.id, "article no longer exists remotely; creating it again");
            article.id.clear();
        }

        if article.id.is_empty() {
            article.id = repo.create(article).await?;
        } else {
            repo.update(&article.id, article).await?;
        }

        let report = ImageReconciler::new(self.transport, &self.settings.service_url)
            .reconcile(article, &self.article_dir(article))
            .await;
        if !report.failed.is_empty() {
            warn!(failed = ?report.failed, "some images could not be uploaded");
        }

        self.write_local(article).await
    }

    async fn collect_fields(&self, article: &mut Article, bypass_prompts: bool) -> Result<()> {
        let fields = self.fields;
        let ask = |current: &str| !bypass_prompts || current.trim().is_empty();

        if ask(&article.title) {
            article.title = fields.ask_string("Article Title", &article.title, true)?;
        }
        if !bypass_prompts {
            article.publish_date = fields.ask_date("Publish Date", article.publish_date)?;
        }
        if ask(&article.url) {
            article.url = fields.ask_string("Permalink", &article.url, true)?;
        }
        if ask(&article.banner) {
            self.collect_banner(article).await?;
        }
        if ask(&article.data_source) {
            article.data_source = fields.ask_string("Data source", &article.data_source, false)?;
        }
        if ask(&article.author) {
            article.author = fields.ask_string("Author Name", &article.author, true)?;
        }
        if !bypass_prompts {
            article.categories = fields.ask_csv("Categories (csv)", &article.categories)?;
            article.tags = fields.ask_csv("Tags (csv)", &article.tags)?;
        }
        Ok(())
    }

    /// A banner naming a local file is uploaded and replaced by its remote URL.
    async fn collect_banner(&self, article: &mut Article) -> Result<()> {
        loop {
            let value = self.fields.ask_string("Banner Url", &article.banner, false)?;
            let Some(local) = self.local_banner(article, &value) else {
                article.banner = value;
                return Ok(());
            };

            match self.upload_banner(&local).await {
                Ok(url) => {
                    info!(file = %local.display(), %url, "uploaded banner");
                    article.banner = url;
                    return Ok(());
                }
                Err(err) if self.fields.interactive() => {
                    warn!(%err, "banner upload failed");
                    eprintln!("Could not save image, please try again.");
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn local_banner(&self, article: &Article, value: &str) -> Option<PathBuf> {
        let value = value.trim();
        if value.is_empty() || value.contains("://") {
            return None;
        }
        let path = Path::new(value);
        let candidate = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.article_dir(article).join(path)
        };
        candidate.is_file().then_some(candidate)
    }

    async fn upload_banner(&self, file: &Path) -> Result<String> {
        let bytes = self.transport.upload("images", file).await?;
        let image: Image = serde_json::from_slice(&bytes)?;
        if image.id.is_empty() {
            return Err(Error::UploadFailed("upload response carried no image id".into()));
        }
        Ok(format!("{}/images/{}", self.settings.service_url, image.id))
    }

    async fn write_local(&self, article: &Article) -> Result<()> {
        if article.data_source.is_empty() {
            warn!(id = %article.id, "article has no data source; skipping local file");
            return Ok(());
        }
        let path = self.settings.resolve_path(&article.data_source);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, frontmatter::encode(article)?).await?;
        info!(path = %path.display(), "saved markdown file");
        Ok(())
    }

    /// Import one local Markdown file and synchronize it.
    pub async fn load_article(&self, file: &Path, bypass_prompts: bool) -> Result<Article> {
        let data_source = file.to_string_lossy().into_owned();
        let resolved = self.settings.resolve_path(&data_source);
        let bytes = match fs::read(&resolved).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::FileNotFound(resolved))
            }
            Err(err) => return Err(err.into()),
        };
        if bytes.is_empty() {
            return Err(Error::EmptyFile(resolved));
        }

        let mut article = frontmatter::decode(&bytes)?.into_article();
        article.data_source = data_source;
        self.save(&mut article, bypass_prompts).await?;
        Ok(article)
    }

    /// Import a single file, or every Markdown file in a directory, one at a
    /// time. The first failure stops the walk. Returns how many were imported.
    pub async fn import_articles(&self, path: &Path) -> Result<usize> {
        let resolved = self.settings.resolve_path(&path.to_string_lossy());
        let meta = match fs::metadata(&resolved).await {
            Ok(meta) => meta,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(Error::FileNotFound(resolved))
            }
            Err(err) => return Err(err.into()),
        };
        if !meta.is_dir() {
            self.load_article(path, true).await?;
            return Ok(1);
        }

        let files = self.markdown_files(path, &resolved).await?;
        info!(count = files.len(), dir = %resolved.display(), "importing articles");
        for (done, file) in files.iter().enumerate() {
            if let Err(err) = self.load_article(file, true).await {
                warn!(%err, file = %file.display(), imported = done, "import stopped");
                return Err(err);
            }
        }
        Ok(files.len())
    }

    /// Markdown files under `dir` in sorted order; sub-directories only when
    /// the settings ask for a recursive walk.
    async fn markdown_files(&self, shown: &Path, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut pending = vec![(shown.to_path_buf(), dir.to_path_buf())];
        let mut files = Vec::new();

        while let Some((shown, dir)) = pending.pop() {
            let mut entries = Vec::new();
            let mut read_dir = fs::read_dir(&dir).await?;
            while let Some(entry) = read_dir.next_entry().await? {
                entries.push((entry.file_name(), entry.file_type().await?));
            }
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut subdirs = Vec::new();
            for (name, file_type) in entries {
                if self
                    .settings
                    .excluded
                    .iter()
                    .any(|ex| name.to_str() == Some(ex.as_str()))
                {
                    continue;
                }
                if file_type.is_dir() {
                    if self.settings.recursive {
                        subdirs.push((shown.join(&name), dir.join(&name)));
                    }
                    continue;
                }
                let is_markdown = Path::new(&name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case(MARKDOWN_EXTENSION));
                if is_markdown {
                    files.push(shown.join(&name));
                }
            }
            pending.extend(subdirs.into_iter().rev());
        }
        Ok(files)
    }

    /// Fetch a remote article and save it, mirroring it locally.
    pub async fn update_article(&self, id: Option<&str>, bypass_prompts: bool) -> Result<Article> {
        let id = given_or_ask(self.fields, id, "Article Id")?;
        let mut article = self.repository().get(&id).await?;
        if article.id.is_empty() {
            article.id = id;
        }
        self.save(&mut article, bypass_prompts).await?;
        Ok(article)
    }

    /// Delete a remote article. Its images stay where they are.
    pub async fn delete_article(&self, id: Option<&str>) -> Result<String> {
        let id = given_or_ask(self.fields, id, "Article Id")?;
        self.repository().delete(&id).await?;
        Ok(id)
    }
}
