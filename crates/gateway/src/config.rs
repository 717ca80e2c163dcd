//! Startup configuration resolved from [`Cli`].

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};
use wa_runtime::BridgeOptions;

use crate::cli::Cli;
use crate::supervisor::RetryPolicy;

/// Directory name used under the system temp dir when no session dir is given.
pub const DEFAULT_SESSION_DIR_NAME: &str = "whatsapp-session";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("Country code must be one or more digits, got {0:?}")]
	InvalidCountryCode(String),

	#[error("--max-init-attempts must be at least 1")]
	InvalidAttemptCap,

	#[error("Invalid listen host {host:?}: {source}")]
	InvalidHost {
		host: String,
		source: std::net::AddrParseError,
	},

	#[error("Session directory {path} is unusable: {source}")]
	SessionDir {
		path: PathBuf,
		source: std::io::Error,
	},
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
	pub listen: SocketAddr,
	pub service_name: String,
	pub country_code: String,
	pub session_dir: PathBuf,
	pub wipe_session: bool,
	pub headless: bool,
	pub browser: Option<PathBuf>,
	pub retry: RetryPolicy,
}

impl GatewayConfig {
	pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
		let country_code = cli.country_code.trim().to_string();
		if country_code.is_empty() || !country_code.chars().all(|c| c.is_ascii_digit()) {
			return Err(ConfigError::InvalidCountryCode(cli.country_code.clone()));
		}
		if cli.max_init_attempts == 0 {
			return Err(ConfigError::InvalidAttemptCap);
		}

		let ip = cli.host.trim_matches(['[', ']']).parse::<IpAddr>().map_err(|source| ConfigError::InvalidHost {
			host: cli.host.clone(),
			source,
		})?;
		let listen = SocketAddr::from((ip, cli.port));

		Ok(Self {
			listen,
			service_name: cli.service_name.clone(),
			country_code,
			session_dir: cli.session_dir.clone().unwrap_or_else(default_session_dir),
			wipe_session: cli.wipe_session,
			headless: !cli.headful,
			browser: cli.browser.clone(),
			retry: RetryPolicy {
				max_attempts: cli.max_init_attempts,
				init_retry_delay: Duration::from_secs(cli.init_retry_secs),
				reconnect_delay: Duration::from_secs(cli.reconnect_secs),
				restart_delay: Duration::from_secs(cli.restart_delay_secs),
				dispose_timeout: Duration::from_secs(cli.dispose_timeout_secs),
				start_timeout: Duration::from_secs(cli.start_timeout_secs),
			},
		})
	}

	/// Creates the session directory, wiping stored credentials first if requested.
	pub fn prepare_session_dir(&self) -> Result<(), ConfigError> {
		if self.wipe_session && self.session_dir.exists() {
			info!(target = "wa.gateway", path = %self.session_dir.display(), "wiping stored session");
			std::fs::remove_dir_all(&self.session_dir).map_err(|source| self.session_dir_error(source))?;
		}
		std::fs::create_dir_all(&self.session_dir).map_err(|source| self.session_dir_error(source))?;
		debug!(target = "wa.gateway", path = %self.session_dir.display(), "session directory ready");
		Ok(())
	}

	pub fn bridge_options(&self) -> BridgeOptions {
		let mut options = BridgeOptions::new(&self.session_dir);
		options.headless = self.headless;
		options.browser_executable = self.browser.clone();
		options
	}

	fn session_dir_error(&self, source: std::io::Error) -> ConfigError {
		ConfigError::SessionDir {
			path: self.session_dir.clone(),
			source,
		}
	}
}

pub fn default_session_dir() -> PathBuf {
	std::env::temp_dir().join(DEFAULT_SESSION_DIR_NAME)
}

/// True when `dir` exists and holds at least one entry.
pub fn has_stored_session(dir: &Path) -> bool {
	std::fs::read_dir(dir).is_ok_and(|mut entries| entries.next().is_some())
}
