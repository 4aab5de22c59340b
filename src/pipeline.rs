use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tracing::{error, info, warn};

use crate::assembler::assemble_posts;
use crate::config::Config;
use crate::content_loader::load_post_sources;
use crate::error::PipelineError;
use crate::feed::{render_rss, RSS_FILE};
use crate::markdown::FrontmatterCompiler;
use crate::models::PostRecord;
use crate::sitemap::{render_sitemap, SITEMAP_FILE};

/// Output of one run, held in memory until it is written.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub posts: Vec<PostRecord>,
    pub sitemap: String,
    pub rss: String,
}

/// Scan, compile and sort every post under the configured posts directory.
pub async fn collect_posts(
    config: &Config,
    compiler: Arc<dyn FrontmatterCompiler>,
) -> Result<Vec<PostRecord>, PipelineError> {
    let content = &config.content;
    let sources =
        load_post_sources(&content.posts_dir, &content.index_file, content.concurrency).await?;
    assemble_posts(
        sources,
        compiler,
        Arc::new(config.reading.clone()),
        content.concurrency,
    )
    .await
}

pub async fn build_artifacts(
    config: &Config,
    compiler: Arc<dyn FrontmatterCompiler>,
) -> Result<Artifacts, PipelineError> {
    let posts = collect_posts(config, compiler).await?;
    let sitemap = render_sitemap(&config.site, &posts);
    let rss = render_rss(&config.site, &posts)?;
    Ok(Artifacts {
        posts,
        sitemap,
        rss,
    })
}

/// Writes every artifact to a temp file first and only renames them into
/// place once all temp writes succeeded. Existing artifacts are copied to
/// `*.bak` before the renames; if any rename fails, the ones already moved
/// are rolled back so the directory keeps the previous build.
pub async fn write_artifacts(static_dir: &Path, artifacts: &Artifacts) -> Result<(), PipelineError> {
    fs::create_dir_all(static_dir)
        .await
        .map_err(|source| PipelineError::Write {
            path: static_dir.to_path_buf(),
            source,
        })?;

    let outputs = [
        (static_dir.join(SITEMAP_FILE), artifacts.sitemap.as_str()),
        (static_dir.join(RSS_FILE), artifacts.rss.as_str()),
    ];

    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(outputs.len());
    for (path, contents) in &outputs {
        let temp = sibling(path, ".tmp");
        if let Err(source) = fs::write(&temp, contents).await {
            discard(&temp).await;
            for (written, _) in &staged {
                discard(written).await;
            }
            return Err(PipelineError::Write { path: temp, source });
        }
        staged.push((temp, path.as_path()));
    }

    let mut backups: Vec<Option<PathBuf>> = Vec::with_capacity(staged.len());
    for (_, path) in &staged {
        match back_up(path).await {
            Ok(backup) => backups.push(backup),
            Err(source) => {
                for (temp, _) in &staged {
                    discard(temp).await;
                }
                for backup in backups.iter().flatten() {
                    discard(backup).await;
                }
                return Err(PipelineError::Write {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    for (done, (temp, path)) in staged.iter().enumerate() {
        if let Err(source) = fs::rename(temp, path).await {
            for (pending, _) in &staged[done..] {
                discard(pending).await;
            }
            for ((_, moved), backup) in staged[..done].iter().zip(&backups) {
                restore(moved, backup.as_deref()).await;
            }
            for backup in backups.iter().flatten() {
                discard(backup).await;
            }
            return Err(PipelineError::Write {
                path: path.to_path_buf(),
                source,
            });
        }
        info!(path = %path.display(), "wrote artifact");
    }

    for backup in backups.iter().flatten() {
        discard(backup).await;
    }
    Ok(())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Copies an existing regular file to `<name>.bak`. Returns `None` when
/// there is nothing to keep.
async fn back_up(path: &Path) -> io::Result<Option<PathBuf>> {
    match fs::metadata(path).await {
        Ok(meta) if meta.is_file() => {
            let backup = sibling(path, ".bak");
            fs::copy(path, &backup).await?;
            Ok(Some(backup))
        }
        Ok(_) => Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

async fn restore(path: &Path, backup: Option<&Path>) {
    let result = match backup {
        Some(backup) => fs::rename(backup, path).await,
        None => fs::remove_file(path).await,
    };
    match result {
        Ok(()) => warn!(path = %path.display(), "rolled back artifact"),
        Err(e) => error!(path = %path.display(), "failed to roll back artifact: {}", e),
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), "failed to remove staging file: {}", e);
        }
    }
}

/// One full run: build everything in memory, then write the artifacts.
pub async fn run(
    config: &Config,
    compiler: Arc<dyn FrontmatterCompiler>,
) -> Result<Artifacts, PipelineError> {
    let artifacts = build_artifacts(config, compiler).await?;
    write_artifacts(&config.content.static_dir, &artifacts).await?;
    info!(posts = artifacts.posts.len(), "pipeline finished");
    Ok(artifacts)
}
