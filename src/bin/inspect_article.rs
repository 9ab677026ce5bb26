use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use article_sync::articles::ArticleRepository;
use article_sync::config;
use article_sync::frontmatter;
use article_sync::service::HttpService;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Print a remote article as the markdown file it would be saved as"
)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Article id
    id: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut cfg = config::load(Some(&args.config))?;
    cfg.apply_env();
    // Article reads are unauthenticated, so no credentials are resolved.
    let service = HttpService::for_reading(&cfg.service.url)?;

    let article = ArticleRepository::new(&service).get(&args.id).await?;
    let rendered = frontmatter::encode(&article)?;
    std::io::stdout().write_all(&rendered)?;
    Ok(())
}
