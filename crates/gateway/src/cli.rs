use std::path::PathBuf;

use clap::Parser;

use crate::phone::DEFAULT_COUNTRY_CODE;

#[derive(Parser, Debug)]
#[command(name = "wa-gateway")]
#[command(about = "HTTP gateway for a single chat-web messaging session")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v debug, -vv trace)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Address to bind the HTTP server to
	#[arg(long, env = "HOST", default_value = "0.0.0.0")]
	pub host: String,

	/// Port to bind the HTTP server to
	#[arg(short, long, env = "PORT", default_value_t = 8080)]
	pub port: u16,

	/// Service name reported by `GET /`
	#[arg(long, env = "WA_SERVICE_NAME", default_value = "WhatsApp Service")]
	pub service_name: String,

	/// Directory where session credentials persist [default: <tmp>/whatsapp-session]
	#[arg(long, env = "WA_SESSION_DIR", value_name = "DIR")]
	pub session_dir: Option<PathBuf>,

	/// Delete stored credentials on startup, forcing a fresh pairing
	#[arg(long, env = "WA_WIPE_SESSION")]
	pub wipe_session: bool,

	/// Country code prepended to local numbers
	#[arg(long, env = "WA_COUNTRY_CODE", default_value = DEFAULT_COUNTRY_CODE)]
	pub country_code: String,

	/// Browser executable for the driver [default: discovered]
	#[arg(long = "browser", env = "WA_BROWSER_EXECUTABLE", value_name = "PATH")]
	pub browser: Option<PathBuf>,

	/// Show the browser window
	#[arg(long)]
	pub headful: bool,

	/// Consecutive failed initializations before automatic retries stop
	#[arg(long, env = "WA_MAX_INIT_ATTEMPTS", default_value_t = 3)]
	pub max_init_attempts: u32,

	/// Delay before retrying a failed initialization
	#[arg(long, env = "WA_INIT_RETRY_SECS", default_value_t = 10, value_name = "SECS")]
	pub init_retry_secs: u64,

	/// Delay before reconnecting after a disconnect
	#[arg(long, env = "WA_RECONNECT_SECS", default_value_t = 5, value_name = "SECS")]
	pub reconnect_secs: u64,

	/// Delay between disposal and re-initialization on restart
	#[arg(long, env = "WA_RESTART_DELAY_SECS", default_value_t = 2, value_name = "SECS")]
	pub restart_delay_secs: u64,

	/// Upper bound on waiting for a session handle to shut down
	#[arg(long, default_value_t = 10, value_name = "SECS")]
	pub dispose_timeout_secs: u64,

	/// Upper bound on waiting for a session handle to start
	#[arg(long, default_value_t = 120, value_name = "SECS")]
	pub start_timeout_secs: u64,
}
