//! Process wiring: one database, one topic hub, the service and the realtime endpoints.

use anyhow::{Context, Result};
use axum::Router;
use log::info;
use std::sync::Arc;

use crate::config::Config;
use crate::notify::Hub;
use crate::production::ProductionService;
use crate::realtime::{self, RealtimeState, TokenResolver};
use crate::storage::{LocalStorage, UploadPaths};

/// Everything a running prodflow process holds.
///
/// The service publishes into the same [`Hub`] the websocket endpoints subscribe to.
pub struct App {
    pub service: Arc<ProductionService>,
    pub realtime: RealtimeState,
}

impl App {
    /// Open storage and build the service and realtime state from `config`.
    pub async fn open(config: &Config) -> Result<Self> {
        let storage = Arc::new(LocalStorage::connect(&config.database).await?);

        let media_root = &config.storage.media_root;
        tokio::fs::create_dir_all(media_root)
            .await
            .with_context(|| format!("Failed to create media root: {}", media_root.display()))?;
        info!("Uploads stored under {}", media_root.display());

        let hub = Arc::new(Hub::new(config.realtime.channel_capacity));
        let service = ProductionService::new(storage.clone(), UploadPaths::new(media_root.clone()), hub.clone());
        let realtime = RealtimeState {
            hub,
            resolver: Arc::new(TokenResolver::new(storage.conn.clone())),
        };

        Ok(Self {
            service: Arc::new(service),
            realtime,
        })
    }

    /// Websocket routes bound to this process's hub.
    pub fn router(&self) -> Router {
        realtime::router(self.realtime.clone())
    }
}
