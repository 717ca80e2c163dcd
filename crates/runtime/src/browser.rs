//! Browser executable discovery and launch flags for the driver.

use std::path::{Path, PathBuf};

/// Flags passed to the browser so it runs inside containers and small VMs.
pub const DEFAULT_BROWSER_ARGS: &[&str] = &[
	"--no-sandbox",
	"--disable-setuid-sandbox",
	"--disable-dev-shm-usage",
	"--disable-accelerated-2d-canvas",
	"--no-first-run",
	"--no-zygote",
	"--single-process",
	"--disable-gpu",
];

/// Environment variables checked, in order, before searching well-known locations.
pub const BROWSER_ENV_VARS: &[&str] = &["WA_BROWSER_EXECUTABLE", "PUPPETEER_EXECUTABLE_PATH", "CHROME_PATH"];

pub fn default_browser_args() -> Vec<String> {
	DEFAULT_BROWSER_ARGS.iter().map(|arg| arg.to_string()).collect()
}

/// Finds a Chromium-family browser. Returns `None` to let the driver use its bundled one.
pub fn find_browser_executable() -> Option<PathBuf> {
	for key in BROWSER_ENV_VARS {
		if let Ok(value) = std::env::var(key) {
			let path = PathBuf::from(value);
			if path.exists() {
				return Some(path);
			}
			tracing::warn!(target = "wa.bridge", var = *key, path = %path.display(), "browser path from environment does not exist");
		}
	}
	find_in_candidates(&browser_candidates())
}

fn find_in_candidates(candidates: &[String]) -> Option<PathBuf> {
	for candidate in candidates {
		if candidate.starts_with('/') || candidate.contains('\\') || candidate.contains(':') {
			if Path::new(candidate).exists() {
				return Some(PathBuf::from(candidate));
			}
		} else if let Ok(path) = which::which(candidate) {
			return Some(path);
		}
	}
	None
}

fn browser_candidates() -> Vec<String> {
	let candidates: &[&str] = if cfg!(target_os = "macos") {
		&[
			"/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
			"/Applications/Chromium.app/Contents/MacOS/Chromium",
			"/Applications/Brave Browser.app/Contents/MacOS/Brave Browser",
		]
	} else if cfg!(target_os = "windows") {
		&[
			r"C:\Program Files\Google\Chrome\Application\chrome.exe",
			r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
			r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
		]
	} else {
		&[
			"google-chrome-stable",
			"google-chrome",
			"chromium-browser",
			"chromium",
			"/usr/bin/google-chrome-stable",
			"/usr/bin/google-chrome",
			"/usr/bin/chromium-browser",
			"/usr/bin/chromium",
			"/snap/bin/chromium",
		]
	};
	candidates.iter().map(|c| c.to_string()).collect()
}
