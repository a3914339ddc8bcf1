//! `screener serve`: run the REST API.

use crate::config::ScreenerConfig;
use crate::rest;
use crate::service::Screener;
use anyhow::Result;
use std::sync::Arc;

pub async fn run(port: u16, config: &ScreenerConfig) -> Result<()> {
    let screener = Arc::new(Screener::launch(config).await);
    if !super::output::is_quiet() {
        eprintln!("Screener REST API on http://127.0.0.1:{port} (Ctrl-C to stop)");
    }
    rest::start(port, screener).await
}
