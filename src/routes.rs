use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, get_service},
    Json, Router,
};
use tokio::fs;
use tower_http::services::{ServeDir, ServeFile};
use tracing::error;

use crate::dates::{format_long_date, parse_post_date};
use crate::feed::{render_rss, RSS_CONTENT_TYPE, RSS_FILE};
use crate::hot_reload::ws_handler;
use crate::models::{PostRecord, PostsBody};
use crate::sitemap::SITEMAP_FILE;
use crate::state::{AppState, RouterState};
use crate::xml::escape;

const HOT_RELOAD_SCRIPT: &str = r#"
<script>
    const socket = new WebSocket("ws://" + window.location.host + "/ws");
    socket.onmessage = (event) => {
        if (event.data === "reload") {
            window.location.reload();
        }
    };
</script>
"#;

pub fn router(state: RouterState) -> Router {
    let static_dir = state.app_state.config.content.static_dir.clone();

    Router::new()
        .route("/posts.json", get(posts_index))
        .route("/rss", get(rss_feed))
        .route("/posts/{slug}", get(render_post))
        .route("/ws", get(ws_handler))
        .nest_service("/static", get_service(ServeDir::new(&static_dir)))
        .route_service("/sitemap.xml", ServeFile::new(static_dir.join(SITEMAP_FILE)))
        .route_service("/rss.xml", ServeFile::new(static_dir.join(RSS_FILE)))
        .with_state(state)
}

async fn posts_index(State(state): State<Arc<AppState>>) -> Json<PostsBody> {
    let posts = state.posts.read().await;
    Json(PostsBody {
        posts: posts.clone(),
    })
}

async fn rss_feed(State(state): State<Arc<AppState>>) -> Response {
    let posts = state.posts.read().await;
    match render_rss(&state.config.site, &posts) {
        Ok(xml) => ([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], xml).into_response(),
        Err(e) => {
            error!("Failed to render RSS feed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn render_post(Path(slug): Path<String>, State(state): State<Arc<AppState>>) -> Response {
    // Only slugs from the current collection map to files on disk.
    let record = state
        .posts
        .read()
        .await
        .iter()
        .find(|post| post.slug == slug)
        .cloned();
    let Some(record) = record else {
        let body = format!("<h1>Not found</h1><p>No post named {}.</p>", escape(&slug));
        return (StatusCode::NOT_FOUND, Html(body)).into_response();
    };

    match render_post_body(&state, &record).await {
        Ok(mut page) => {
            if state.is_development {
                page.push_str(HOT_RELOAD_SCRIPT);
            }
            Html(page).into_response()
        }
        Err(e) => {
            error!(slug = %record.slug, "Failed to render post: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn render_post_body(
    state: &AppState,
    record: &PostRecord,
) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
    let content = &state.config.content;
    let path = content.posts_dir.join(&record.slug).join(&content.index_file);
    let raw = fs::read_to_string(&path).await?;
    let compiled = state.compiler.compile(&raw)?;
    let published = parse_post_date(&record.date)?;

    Ok(format!(
        "<article><h1>{}</h1><p class=\"post-meta\">{} · {} min read</p>{}</article>",
        escape(&record.title),
        format_long_date(&published),
        record.reading_time,
        compiled.html
    ))
}
