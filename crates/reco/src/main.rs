//! Reco Service - Vehicle Listing Recommendations
//!
//! Serves the Auto Gateway recommendation engine. The marketplace gateway
//! owns routing, auth, and request validation; this binary only carries the
//! engine and its health surface.

use actix_web::{web, App, HttpResponse, HttpServer};
use auto_gateway_core::{load_dotenv, ConfigLoader, ServiceConfig};
use tracing::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .json()
        .init();

    let config = ServiceConfig::from_env()
        .and_then(|config| config.validate().map(|_| config))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

    info!(host = %config.host, port = config.port, "Starting Reco Service");

    let workers = config.workers;
    HttpServer::new(|| App::new().route("/health", web::get().to(health_check)))
        .workers(workers)
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "reco-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
