//! Synchronizes locally authored Markdown articles with a remote content API.
pub mod articles;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod images;
pub mod links;
pub mod model;
pub mod prompt;
pub mod service;
pub mod sync;

pub use error::{Error, Result};
