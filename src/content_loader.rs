use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::fs;
use tracing::{debug, info};

use crate::error::ScanError;
use crate::models::PostSource;

/// Lists the immediate subdirectories of `posts_dir` and reads each one's
/// `index_file`. Directories without one are skipped. Sources come back in
/// directory-listing order.
pub async fn load_post_sources(
    posts_dir: &Path,
    index_file: &str,
    concurrency: usize,
) -> Result<Vec<PostSource>, ScanError> {
    let listing_error = |source: std::io::Error| ScanError::ReadDir {
        path: posts_dir.to_path_buf(),
        source,
    };

    let mut candidates = Vec::new();
    let mut entries = fs::read_dir(posts_dir).await.map_err(listing_error)?;
    while let Some(entry) = entries.next_entry().await.map_err(listing_error)? {
        if !entry.file_type().await.map_err(listing_error)?.is_dir() {
            continue;
        }
        let slug = entry
            .file_name()
            .into_string()
            .map_err(|_| ScanError::NonUtf8Name { path: entry.path() })?;
        candidates.push((slug, entry.path().join(index_file)));
    }

    let found: Vec<Option<PostSource>> = stream::iter(candidates)
        .map(|(slug, path)| read_index(slug, path))
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let sources: Vec<PostSource> = found.into_iter().flatten().collect();
    info!(count = sources.len(), dir = %posts_dir.display(), "discovered posts");
    Ok(sources)
}

async fn read_index(slug: String, path: PathBuf) -> Result<Option<PostSource>, ScanError> {
    match fs::read_to_string(&path).await {
        Ok(raw_body) => Ok(Some(PostSource { slug, raw_body })),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(%slug, "no index file, skipping directory");
            Ok(None)
        }
        Err(source) => Err(ScanError::ReadPost { path, source }),
    }
}
