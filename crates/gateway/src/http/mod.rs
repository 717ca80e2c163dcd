//! axum surface over [`Gateway`].

mod routes;
pub mod types;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::gateway::Gateway;

/// Largest accepted request body; base64 documents dominate.
pub const BODY_LIMIT: usize = 10 * 1024 * 1024;

pub fn router(gateway: Gateway) -> Router {
	Router::new()
		.route("/", get(routes::root))
		.route("/status", get(routes::status))
		.route("/qr", get(routes::qr))
		.route("/send", post(routes::send))
		.route("/send-pdf", post(routes::send_pdf))
		.route("/logout", post(routes::logout))
		.route("/restart", post(routes::restart))
		.layer(DefaultBodyLimit::max(BODY_LIMIT))
		.layer(TraceLayer::new_for_http())
		.layer(CorsLayer::permissive())
		.with_state(gateway)
}

/// Serves until SIGINT/SIGTERM, then stops the supervisor.
pub async fn serve(listener: TcpListener, gateway: Gateway) -> Result<()> {
	let supervisor = gateway.supervisor().clone();
	let addr = listener.local_addr().context("Failed to read listener address")?;
	info!(target = "wa.http", %addr, "listening");

	axum::serve(listener, router(gateway))
		.with_graceful_shutdown(shutdown_signal())
		.await
		.context("HTTP server error")?;

	supervisor.shutdown().await;
	Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() {
	use tokio::signal::unix::{SignalKind, signal};

	let (mut sigterm, mut sigint) = match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
		(Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
		(Err(e), _) | (_, Err(e)) => {
			warn!(target = "wa.http", error = %e, "failed to install signal handlers, falling back to Ctrl+C");
			ctrl_c().await;
			return;
		}
	};

	tokio::select! {
		_ = sigterm.recv() => info!(target = "wa.http", "received SIGTERM, shutting down"),
		_ = sigint.recv() => info!(target = "wa.http", "received SIGINT, shutting down"),
	}
}

#[cfg(not(unix))]
async fn shutdown_signal() {
	ctrl_c().await;
}

async fn ctrl_c() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => info!(target = "wa.http", "received Ctrl+C, shutting down"),
		Err(e) => {
			warn!(target = "wa.http", error = %e, "failed to listen for Ctrl+C");
			std::future::pending::<()>().await;
		}
	}
}
