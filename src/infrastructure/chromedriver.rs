//! chromedriver process lifecycle
//!
//! When the config names a chromedriver binary, the run owns the driver
//! process: it is spawned before the session connects and killed when the
//! run ends. `kill_on_drop` covers early returns and panics.

use std::process::Stdio;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use super::config::BrowserConfig;
use super::error::CrawlError;

pub struct ChromeDriverProcess {
    child: Child,
    port: u16,
}

impl ChromeDriverProcess {
    /// Spawn the configured chromedriver, or `None` when an external
    /// WebDriver endpoint is used
    pub async fn spawn_if_configured(config: &BrowserConfig) -> Result<Option<Self>, CrawlError> {
        match &config.chromedriver_path {
            Some(path) => Self::spawn(path, config).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn spawn(path: &str, config: &BrowserConfig) -> Result<Self, CrawlError> {
        let port = config.chromedriver_port;
        let child = Command::new(path)
            .arg(format!("--port={port}"))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CrawlError::BrowserLaunch(format!("failed to spawn {path}: {e}")))?;

        info!("🚀 Started chromedriver on port {} (pid {:?})", port, child.id());

        // Give the driver time to bind its port before the session connects
        tokio::time::sleep(config.driver_startup_delay()).await;

        Ok(Self { child, port })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Kill the driver process and reap it
    pub async fn shutdown(mut self) {
        if let Err(e) = self.child.kill().await {
            warn!("Failed to stop chromedriver on port {}: {}", self.port, e);
        } else {
            info!("Stopped chromedriver on port {}", self.port);
        }
    }
}
