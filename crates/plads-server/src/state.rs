use crate::config::ServerConfig;
use crate::geocode::Geocoder;
use crate::images::ImageStore;
use sqlx::PgPool;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<ServerConfig>,
    pub geocoder: Arc<Geocoder>,
    pub images: Arc<ImageStore>,
}

impl AppState {
    /// Create a new app state, wiring the adapters from config
    pub fn new(pool: PgPool, config: ServerConfig) -> Self {
        let geocoder = Geocoder::new(&config.geocoder.endpoint, &config.geocoder.api_key);
        let images = ImageStore::new(&config.uploads.local_dir);
        Self {
            pool,
            config: Arc::new(config),
            geocoder: Arc::new(geocoder),
            images: Arc::new(images),
        }
    }
}
