//! HTTP entry point for the GTFS-RT vehicle viewer.
//!
//! Serves the normalized vehicle snapshot as JSON, refreshing the
//! upstream feed through the TTL/single-flight cache on demand.

use std::ffi::OsStr;
use std::path::Path;
use std::time::Duration;

use actix_web::{App, HttpResponse, HttpServer, middleware, web};
use anyhow::Result;
use clap::Parser;
use gtfs_rt_viewer::cache::FeedCache;
use gtfs_rt_viewer::config::Config;
use gtfs_rt_viewer::fetch::HttpFeedSource;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "gtfs_rt_viewer")]
#[command(about = "Serves normalized GTFS-RT vehicle positions over HTTP", long_about = None)]
struct Cli {
    /// GTFS-RT feed URL (overrides GTFS_RT_URL)
    #[arg(long)]
    url: Option<String>,

    /// Snapshot TTL in milliseconds (overrides CACHE_TTL_MS)
    #[arg(long)]
    ttl_ms: Option<u64>,

    /// Listen port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

async fn vehicles(cache: web::Data<FeedCache<HttpFeedSource>>) -> HttpResponse {
    match cache.get().await {
        Ok(snapshot) => HttpResponse::Ok().json(snapshot.as_ref()),
        Err(err) => {
            error!(error = %err, "vehicle snapshot unavailable");
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": err.to_string() }))
        }
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/gtfs_rt_viewer.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("gtfs_rt_viewer.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if cli.url.is_some() {
        config.feed_url = cli.url;
    }
    if let Some(ttl_ms) = cli.ttl_ms.filter(|&t| t > 0) {
        config.ttl = Duration::from_millis(ttl_ms);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    if config.feed_url.is_none() {
        warn!("no feed URL configured; /vehicles will fail until GTFS_RT_URL is set");
    }

    let cache = web::Data::new(FeedCache::new(
        HttpFeedSource::new(config.feed_url.clone()),
        config.ttl,
    ));

    info!(
        port = config.port,
        ttl_ms = config.ttl.as_millis() as u64,
        "starting GTFS-RT viewer server"
    );

    HttpServer::new(move || {
        App::new()
            .app_data(cache.clone())
            .wrap(middleware::Logger::default())
            .route("/vehicles", web::get().to(vehicles))
            .route("/api/vehicles", web::get().to(vehicles))
            .route("/health", web::get().to(health))
    })
    .bind(("0.0.0.0", config.port))?
    .run()
    .await?;

    Ok(())
}
