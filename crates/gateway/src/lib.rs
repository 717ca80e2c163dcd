//! HTTP gateway over a single supervised chat-web session.
//!
//! [`supervisor::Supervisor`] owns the session handle and its connection
//! lifecycle, [`gateway::Gateway`] implements the operations, and [`http`]
//! exposes them with axum.

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod logging;
pub mod phone;
pub mod presenter;
pub mod supervisor;
pub mod testing;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;
use wa_runtime::BridgeFactory;

use crate::cli::Cli;
use crate::config::{GatewayConfig, has_stored_session};
use crate::gateway::Gateway;
use crate::supervisor::Supervisor;

/// Resolves configuration, starts the session in the background and serves HTTP until shutdown.
pub async fn run(cli: Cli) -> Result<()> {
	let config = GatewayConfig::from_cli(&cli)?;
	config.prepare_session_dir()?;
	info!(
		target = "wa.gateway",
		session_dir = %config.session_dir.display(),
		stored_session = has_stored_session(&config.session_dir),
		headless = config.headless,
		"starting"
	);

	let factory = BridgeFactory::new(config.bridge_options());
	let supervisor = Supervisor::new(Arc::new(factory), config.retry.clone());
	let gateway = Gateway::new(supervisor.clone(), config.country_code.as_str(), config.service_name.as_str());

	let listener = TcpListener::bind(config.listen)
		.await
		.with_context(|| format!("Failed to bind HTTP server to {}", config.listen))?;

	supervisor.start();

	http::serve(listener, gateway).await
}
