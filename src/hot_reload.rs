use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use notify_debouncer_full::{
    new_debouncer, DebouncedEvent,
    notify::{RecursiveMode, Watcher, Error as NotifyError},
};
use tracing::{debug, error, info};

use crate::pipeline;
use crate::state::{AppState, RefreshBroadcaster};

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(tx): State<RefreshBroadcaster>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, tx))
}

async fn handle_socket(mut socket: WebSocket, tx: RefreshBroadcaster) {
    let mut rx = tx.subscribe();

    // Wait for a reload signal
    if rx.recv().await.is_ok() {
        if socket.send(Message::Text("reload".to_string().into())).await.is_err() {
            debug!("Client disconnected before reload message could be sent");
        }
    }
}

/// Re-runs the pipeline and swaps in the new collection. On failure the
/// previous collection and artifacts stay in place.
pub async fn reload_posts(app_state: &AppState) -> bool {
    info!("Rebuilding posts and artifacts...");
    match pipeline::run(&app_state.config, Arc::clone(&app_state.compiler)).await {
        Ok(artifacts) => {
            *app_state.posts.write().await = artifacts.posts;
            info!("Posts successfully reloaded.");
            true
        }
        Err(e) => {
            error!("Failed to reload posts, keeping previous build: {}", e);
            false
        }
    }
}

pub fn start_content_watcher(tx: RefreshBroadcaster, app_state: Arc<AppState>) {
    info!("Starting content watcher for hot-reload...");
    tokio::spawn(async move {
        let (watcher_tx, mut watcher_rx) = tokio::sync::mpsc::channel(1);

        let debouncer = new_debouncer(Duration::from_millis(200), None, move |res: Result<Vec<DebouncedEvent>, Vec<NotifyError>>| {
            match res {
                Ok(events) => {
                    let relevant_events: Vec<&DebouncedEvent> = events.iter().filter(|event| {
                        let is_relevant_kind = event.kind.is_modify()
                            || event.kind.is_create()
                            || event.kind.is_remove();

                        if !is_relevant_kind {
                            return false;
                        }

                        // Editor temp files (Emacs: .#*, ~ backups)
                        let is_temp_file = event.event.paths.iter().any(|path| {
                            path.file_name()
                                .and_then(|name| name.to_str())
                                .map_or(false, |s| s.starts_with(".#") || s.ends_with('~'))
                        });

                        !is_temp_file
                    }).collect();

                    if !relevant_events.is_empty() {
                        debug!("Relevant file change detected: {:?}", relevant_events.iter().flat_map(|e| &e.event.paths).map(|p| p.display()).collect::<Vec<_>>());
                        if let Err(e) = watcher_tx.blocking_send(()) {
                            error!("Failed to send watcher event: {}", e);
                        }
                    }
                }
                Err(errors) => {
                    for e in errors {
                        error!("Watcher error: {}", e);
                    }
                }
            }
        });
        let mut debouncer = match debouncer {
            Ok(debouncer) => debouncer,
            Err(e) => {
                error!("Failed to create debouncer: {}", e);
                return;
            }
        };

        let posts_dir = app_state.config.content.posts_dir.clone();
        if let Err(e) = debouncer.watcher().watch(&posts_dir, RecursiveMode::Recursive) {
            error!(dir = %posts_dir.display(), "Failed to start watching posts directory: {}", e);
            return;
        }

        // Keep the debouncer alive and wait for events
        while watcher_rx.recv().await.is_some() {
            info!("Content change detected, rebuilding and sending signal...");

            if reload_posts(&app_state).await {
                if let Err(e) = tx.send(()) {
                    debug!("No browsers to notify of reload: {}", e);
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::config::Config;
    use crate::markdown::GrayMatterCompiler;
    use crate::sitemap::SITEMAP_FILE;

    use super::*;

    fn write_post(root: &std::path::Path, slug: &str, date: &str) {
        let dir = root.join("posts").join(slug);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("index.md"),
            format!("---\ntitle: {slug}\ndate: {date}\nmetaDesc: d\n---\nbody\n"),
        )
        .unwrap();
    }

    fn state(root: &std::path::Path) -> AppState {
        let mut config = Config::default();
        config.content.posts_dir = root.join("posts");
        config.content.static_dir = root.join("static");
        AppState::new(config, Arc::new(GrayMatterCompiler), Vec::new())
    }

    #[tokio::test]
    async fn reload_picks_up_new_posts() {
        let root = tempfile::TempDir::new().unwrap();
        write_post(root.path(), "first", "2024-01-01");
        let state = state(root.path());

        assert!(reload_posts(&state).await);
        assert_eq!(state.posts.read().await.len(), 1);

        write_post(root.path(), "second", "2024-02-01");
        assert!(reload_posts(&state).await);

        let posts = state.posts.read().await;
        assert_eq!(posts[0].slug, "second");
        assert!(root.path().join("static").join(SITEMAP_FILE).exists());
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_posts() {
        let root = tempfile::TempDir::new().unwrap();
        write_post(root.path(), "good", "2024-01-01");
        let state = state(root.path());
        assert!(reload_posts(&state).await);
        let sitemap = fs::read_to_string(root.path().join("static").join(SITEMAP_FILE)).unwrap();

        write_post(root.path(), "broken", "the day after tomorrow");
        assert!(!reload_posts(&state).await);

        let posts = state.posts.read().await;
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].slug, "good");
        assert_eq!(
            fs::read_to_string(root.path().join("static").join(SITEMAP_FILE)).unwrap(),
            sitemap
        );
    }
}
