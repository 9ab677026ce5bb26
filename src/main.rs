use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use article_sync::config::{self, Overrides};
use article_sync::links::LinkPublisher;
use article_sync::prompt::{FieldProvider, NonInteractive, TerminalPrompter};
use article_sync::service::HttpService;
use article_sync::sync::Synchronizer;

#[derive(Debug, Parser)]
#[command(author, version, about = "Publish local Markdown articles to a content service")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Path to YAML config file
    #[arg(long, global = true, default_value = "config.yaml")]
    config: PathBuf,

    #[arg(long, global = true)]
    username: Option<String>,

    #[arg(long, global = true)]
    password: Option<String>,

    #[arg(long = "service-url", global = true)]
    service_url: Option<String>,

    /// Never prompt; fail when a required value is missing
    #[arg(long, global = true)]
    no_input: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load an article from a local markdown file and publish it
    LoadArticle {
        /// File path, relative to the article location unless absolute
        file: PathBuf,
        /// Only ask for fields the file leaves empty
        #[arg(short, long)]
        yes: bool,
    },
    /// Publish every markdown file in a directory (or a single file)
    ImportArticles {
        path: PathBuf,
        /// Descend into sub-directories
        #[arg(short, long)]
        recursive: bool,
    },
    /// Edit an existing remote article
    UpdateArticle {
        #[arg(long)]
        id: Option<String>,
        #[arg(short, long)]
        yes: bool,
    },
    /// Delete an existing remote article
    DeleteArticle {
        #[arg(long)]
        id: Option<String>,
    },
    /// Create a new link
    NewLink,
    /// Delete an existing link
    DeleteLink {
        #[arg(long)]
        id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let fields: &dyn FieldProvider = if cli.global.no_input {
        &NonInteractive
    } else {
        &TerminalPrompter
    };

    let mut cfg = config::load(Some(&cli.global.config))
        .with_context(|| format!("failed to load {}", cli.global.config.display()))?;
    cfg.apply_env();
    cfg.apply_overrides(&Overrides {
        username: cli.global.username.clone(),
        password: cli.global.password.clone(),
        service_url: cli.global.service_url.clone(),
        recursive: matches!(cli.command, Command::ImportArticles { recursive: true, .. }),
    });
    let settings = cfg.resolve(fields)?;
    let service = HttpService::from_settings(&settings)?;
    info!(service = %settings.service_url, "configured");

    let sync = Synchronizer::new(&settings, &service, fields);
    match cli.command {
        Command::LoadArticle { file, yes } => {
            let article = sync.load_article(&file, yes).await?;
            println!(
                "Successfully loaded article {} (Id: {}) on {}",
                article.title, article.id, article.publish_date
            );
        }
        Command::ImportArticles { path, .. } => {
            let count = sync.import_articles(&path).await?;
            println!("Successfully imported {count} article(s) from {}", path.display());
        }
        Command::UpdateArticle { id, yes } => {
            let article = sync.update_article(id.as_deref(), yes).await?;
            println!(
                "Successfully updated article {} on {}",
                article.title, article.publish_date
            );
        }
        Command::DeleteArticle { id } => {
            let id = sync.delete_article(id.as_deref()).await?;
            println!("Successfully deleted article {id}");
        }
        Command::NewLink => {
            let link = LinkPublisher::new(&service, fields).create_new_link().await?;
            println!("Successfully created link {}", link.title);
        }
        Command::DeleteLink { id } => {
            let id = LinkPublisher::new(&service, fields)
                .delete_link(id.as_deref())
                .await?;
            println!("Successfully deleted link {id}");
        }
    }

    Ok(())
}
