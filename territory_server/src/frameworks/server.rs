// Framework bootstrap for the territory artifact server.

use crate::domain::{ArtifactNotifier, ArtifactUploader, MarkerSource};
use crate::frameworks::config::{self, Settings};
use crate::interface_adapters::clients::{HttpUploader, LogNotifier, NoopUploader, WebhookNotifier};
use crate::interface_adapters::routes::router;
use crate::interface_adapters::source::FileMarkerSource;
use crate::use_cases::{Announcer, TilePipeline, Worker, WorldMapPipeline};

use std::{io::Result, sync::Arc};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Starts the enabled generation workers and serves `www_dir` on `listener`.
pub async fn run(listener: tokio::net::TcpListener, settings: Arc<Settings>) -> Result<()> {
    let address = listener.local_addr()?;
    spawn_workers(&settings)?;

    let app = router(&settings.server.www_dir);
    tracing::info!(%address, www_dir = %settings.server.www_dir.display(), "listening");

    // Serve app and report errors rather than panicking
    axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    })
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let settings = Arc::new(Settings::load());
    let address = settings.bind_address();

    // Bind failure is the only fatal startup error.
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, settings).await
}

fn spawn_workers(settings: &Settings) -> Result<()> {
    let source: Arc<dyn MarkerSource> = Arc::new(FileMarkerSource::new(&settings.source.data_dir));
    let uploader = build_uploader(settings)?;
    let schedule = settings.schedule();
    tracing::debug!(
        data_dir = %settings.source.data_dir.display(),
        servers_x = schedule.servers_x,
        servers_y = schedule.servers_y,
        interval_s = schedule.interval.as_secs(),
        "marker source configured"
    );

    if settings.generation.enable_tiles {
        let pipeline = TilePipeline::new(settings.tiles_dir(), settings.tile_settings());
        let worker = Worker::new(pipeline, Arc::clone(&source), Arc::clone(&uploader), schedule);
        tokio::spawn(worker.run());
        tracing::info!(max_zoom = settings.render.max_zoom, "tile worker started");
    }

    if settings.generation.enable_world_map {
        let pipeline = WorldMapPipeline::new(
            settings.game_tiles_dir(),
            settings.world_map_settings(),
            settings.generation.top_tribes,
        );
        let announcer = Announcer::new(build_notifier(settings)?, settings.announce_endpoint());
        let worker = Worker::new(pipeline, source, uploader, schedule).with_announcer(announcer);
        tokio::spawn(worker.run());
        tracing::info!(game_size = settings.render.game_size, "world map worker started");
    }

    Ok(())
}

fn build_uploader(settings: &Settings) -> Result<Arc<dyn ArtifactUploader>> {
    let Some(target) = settings.upload_target() else {
        tracing::info!("no upload credentials, artifacts stay local");
        return Ok(Arc::new(NoopUploader));
    };

    tracing::debug!(
        endpoint = %target.endpoint,
        bucket = %target.bucket,
        key_prefix = %target.key_prefix,
        "upload client configured"
    );
    let uploader = HttpUploader::new(&settings.server.www_dir, target, config::UPLOAD_TIMEOUT)
        .map_err(|e| std::io::Error::other(format!("failed to initialize upload client: {e}")))?;
    Ok(Arc::new(uploader))
}

fn build_notifier(settings: &Settings) -> Result<Arc<dyn ArtifactNotifier>> {
    if settings.notify.webhook_url.is_empty() {
        return Ok(Arc::new(LogNotifier));
    }

    let notifier = WebhookNotifier::new(settings.notify.webhook_url.clone(), config::NOTIFY_TIMEOUT)
        .map_err(|e| std::io::Error::other(format!("failed to initialize notify client: {e}")))?;
    Ok(Arc::new(notifier))
}
