// src/server/mod.rs

//! Development server: static files from the output tree plus live reload.

pub mod reload;
pub mod routes;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ServerSection;

pub use reload::{ReloadEvent, ReloadSignal};
pub use routes::build_router;

/// A bound, not yet running dev server.
#[derive(Debug)]
pub struct DevServer {
    listener: TcpListener,
    output_root: PathBuf,
    reload: ReloadSignal,
    open_browser: bool,
}

impl DevServer {
    pub async fn bind(cfg: &ServerSection, output_root: PathBuf, reload: ReloadSignal) -> Result<Self> {
        let addr = format!("{}:{}", cfg.host, cfg.port);
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("binding dev server to {addr}"))?;
        Ok(Self {
            listener,
            output_root,
            reload,
            open_browser: cfg.open,
        })
    }

    pub fn url(&self) -> Result<String> {
        let addr = self.listener.local_addr()?;
        Ok(format!("http://{addr}/"))
    }

    /// Serve until the surrounding task is dropped.
    pub async fn run(self) -> Result<()> {
        let url = self.url()?;
        info!(%url, root = %self.output_root.display(), "dev server listening");

        if self.open_browser {
            if let Err(err) = open::that(&url) {
                warn!(error = %err, "could not open browser");
            }
        }

        let app = build_router(&self.output_root, self.reload);
        axum::serve(self.listener, app)
            .await
            .context("dev server stopped")?;
        Ok(())
    }
}
