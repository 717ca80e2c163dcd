//! Session driver discovery
//!
//! The driver is a Node.js script that hosts the chat-web client in a headless
//! browser and speaks the framed bridge protocol on its stdio.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// npm package name of the driver script.
pub const DRIVER_PACKAGE: &str = "wa-bridge-driver";

/// Entry point inside the driver package.
pub const DRIVER_ENTRY: &str = "index.js";

/// Locates the Node.js executable and driver script.
///
/// Search order:
/// 1. `WA_NODE_EXE` and `WA_DRIVER_JS` environment variables
/// 2. `WA_DRIVER_PATH` environment variable (package directory)
/// 3. Global npm installation (`npm root -g`)
/// 4. Local npm installation (`npm root`)
/// 5. The driver bundled with this crate ([`bundled_driver_dir`])
///
/// Returns a tuple of (node_executable_path, driver_js_path).
///
/// # Errors
///
/// Returns `Error::DriverNotFound` if no candidate exists, or
/// `Error::LaunchFailed` if the script exists but no usable node does.
pub fn get_driver_executable() -> Result<(PathBuf, PathBuf)> {
	if let (Ok(node), Ok(script)) = (std::env::var("WA_NODE_EXE"), std::env::var("WA_DRIVER_JS")) {
		let (node, script) = (PathBuf::from(node), PathBuf::from(script));
		if script.exists() {
			if let Some(paths) = resolve_candidate("WA_NODE_EXE/WA_DRIVER_JS", Some(node), script)? {
				return Ok(paths);
			}
		}
	}

	if let Ok(dir) = std::env::var("WA_DRIVER_PATH") {
		if let Some(script) = find_driver_in_package(Path::new(&dir)) {
			if let Some(paths) = resolve_candidate("WA_DRIVER_PATH", None, script)? {
				return Ok(paths);
			}
		}
	}

	for (label, args) in [("npm global", &["root", "-g"][..]), ("npm local", &["root"][..])] {
		if let Some(node_modules) = npm_root(args) {
			if let Some(script) = find_driver_in_package(&node_modules.join(DRIVER_PACKAGE)) {
				if let Some(paths) = resolve_candidate(label, None, script)? {
					return Ok(paths);
				}
			}
		}
	}

	if let Some(script) = find_driver_in_package(&bundled_driver_dir()) {
		if let Some(paths) = resolve_candidate("bundled", None, script)? {
			return Ok(paths);
		}
	}

	Err(Error::DriverNotFound)
}

/// Directory of the driver package shipped next to this crate's sources.
///
/// Its `node_modules` must be installed (`npm install`) before it can run.
pub fn bundled_driver_dir() -> PathBuf {
	Path::new(env!("CARGO_MANIFEST_DIR")).join("driver")
}

fn resolve_candidate(label: &str, node: Option<PathBuf>, script: PathBuf) -> Result<Option<(PathBuf, PathBuf)>> {
	if let Some(node) = node {
		if node_is_usable(&node) {
			debug!(target = "wa.bridge", source = label, node = %node.display(), script = %script.display(), "driver found");
			return Ok(Some((node, script)));
		}
		warn!(
			target = "wa.bridge",
			source = label,
			node = %node.display(),
			"configured node is not runnable; trying node from PATH"
		);
	}

	let node = find_node_executable()?;
	if !node_is_usable(&node) {
		return Ok(None);
	}
	debug!(target = "wa.bridge", source = label, node = %node.display(), script = %script.display(), "driver found");
	Ok(Some((node, script)))
}

fn find_driver_in_package(dir: &Path) -> Option<PathBuf> {
	let script = dir.join(DRIVER_ENTRY);
	script.is_file().then_some(script)
}

fn npm_root(args: &[&str]) -> Option<PathBuf> {
	let output = Command::new("npm").args(args).stderr(Stdio::null()).output().ok()?;
	if !output.status.success() {
		return None;
	}
	let root = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
	root.exists().then_some(root)
}

fn node_is_usable(node: &Path) -> bool {
	Command::new(node)
		.arg("--version")
		.stdout(Stdio::null())
		.stderr(Stdio::null())
		.status()
		.map(|status| status.success())
		.unwrap_or(false)
}

/// Finds the node executable in PATH or common locations.
fn find_node_executable() -> Result<PathBuf> {
	if let Ok(path) = which::which("node") {
		return Ok(path);
	}

	#[cfg(not(windows))]
	let common_locations = ["/usr/local/bin/node", "/usr/bin/node", "/opt/homebrew/bin/node"];
	#[cfg(windows)]
	let common_locations = ["C:\\Program Files\\nodejs\\node.exe", "C:\\Program Files (x86)\\nodejs\\node.exe"];

	common_locations
		.iter()
		.map(PathBuf::from)
		.find(|path| path.exists())
		.ok_or_else(|| Error::LaunchFailed("Node.js executable not found. Install Node.js or set WA_NODE_EXE.".to_string()))
}
