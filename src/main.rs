use std::{net::SocketAddr, path::Path, process::ExitCode, sync::Arc};

use blog_pipeline::{
    config::{Config, CONFIG_FILE},
    hot_reload::start_content_watcher,
    markdown::{FrontmatterCompiler, GrayMatterCompiler},
    pipeline,
    routes::router,
    state::{AppState, RouterState},
};
use tokio::{net::TcpListener, sync::broadcast};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    // logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let command = std::env::args().nth(1);

    let config = match Config::load(Path::new(CONFIG_FILE)).await {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match command.as_deref() {
        None | Some("run") => run(config).await,
        Some("serve") => serve(config).await,
        Some(other) => {
            error!(command = other, "unknown command, expected `run` or `serve`");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), BoxError> {
    pipeline::run(&config, Arc::new(GrayMatterCompiler)).await?;
    Ok(())
}

async fn serve(config: Config) -> Result<(), BoxError> {
    let compiler: Arc<dyn FrontmatterCompiler> = Arc::new(GrayMatterCompiler);

    // Serve nothing until one full build has succeeded.
    let artifacts = pipeline::run(&config, Arc::clone(&compiler)).await?;

    let port = config.server.port;
    let state = Arc::new(AppState::new(config, compiler, artifacts.posts));

    let (tx, _rx) = broadcast::channel(1);
    if state.is_development {
        info!("Hot reload enabled. Check logs for file change events.");
        start_content_watcher(tx.clone(), state.clone());
    }

    let app = router(RouterState {
        app_state: state,
        broadcaster: tx,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "listening");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
