use std::path::PathBuf;

use thiserror::Error;

/// A posts directory or one of its index files could not be read.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to list posts directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read post file {path}: {source}")]
    ReadPost {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("post directory name is not valid UTF-8: {path}")]
    NonUtf8Name { path: PathBuf },
}

/// The frontmatter compiler rejected a post.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("malformed frontmatter: {0}")]
    Malformed(String),

    #[error("no frontmatter block")]
    MissingFrontmatter,

    #[error("frontmatter must be a mapping of keys to values")]
    NotAMapping,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum DateError {
    #[error("missing `date` field")]
    Missing,

    #[error("unparseable date {0:?}")]
    Unparseable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Any failure that aborts a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("post `{slug}`: {source}")]
    Compile {
        slug: String,
        #[source]
        source: CompileError,
    },

    #[error("post `{slug}`: {source}")]
    Date {
        slug: String,
        #[source]
        source: DateError,
    },

    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
