#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident map application.
//!
//! Serves the REST API for uploading geotagged incident reports and
//! querying them, either raw within a bounding box or grouped into
//! named clusters via the `/api/clusters` endpoint. Uploaded photos are
//! stored on disk and served as static files from `/images`.

mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use incident_map_cluster::AffinityPropagation;
use incident_map_geocoder::cache::GeocodeCache;
use incident_map_geocoder::nominatim::{DEFAULT_BASE_URL, NominatimClient};
use switchy_database::Database;

/// Shared application state.
pub struct AppState {
    /// Reports database connection.
    pub db: Arc<dyn Database>,
    /// Reverse geocoding client for cluster centroids.
    pub geocoder: Arc<NominatimClient>,
    /// Process-wide reverse geocoding cache, shared across requests.
    pub geocode_cache: Arc<GeocodeCache>,
    /// Clustering configuration used by the clusters endpoint.
    pub clusterer: AffinityPropagation,
    /// Directory where uploaded photos are stored.
    pub image_dir: PathBuf,
}

/// Starts the incident map API server.
///
/// Opens the reports `SQLite` database, builds the geocoding client and
/// cache, and starts the Actix-Web HTTP server. This is a regular async
/// function; the caller provides the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if the database cannot be opened, the image directory cannot
/// be created, or the geocoding client fails to build.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let db_path = std::env::var("DATABASE_PATH")
        .unwrap_or_else(|_| incident_map_database::DEFAULT_DB_PATH.to_string());

    log::info!("Opening reports database...");
    let db = incident_map_database::open_db(std::path::Path::new(&db_path))
        .await
        .expect("Failed to open reports database");

    let image_dir =
        PathBuf::from(std::env::var("IMAGE_DIR").unwrap_or_else(|_| "data/images".to_string()));
    std::fs::create_dir_all(&image_dir).expect("Failed to create image directory");

    let nominatim_url =
        std::env::var("NOMINATIM_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let geocoder = NominatimClient::new(nominatim_url).expect("Failed to build geocoding client");

    let state = web::Data::new(AppState {
        db: Arc::from(db),
        geocoder: Arc::new(geocoder),
        geocode_cache: Arc::new(GeocodeCache::new()),
        clusterer: AffinityPropagation::default(),
        image_dir: image_dir.clone(),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/clusters", web::get().to(handlers::clusters))
                    .route("/reports", web::get().to(handlers::reports))
                    .route("/upload", web::post().to(handlers::upload)),
            )
            // Serve uploaded report photos
            .service(Files::new("/images", image_dir.clone()))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
