//! Operator-facing HTML view of the pairing state.
//!
//! Pure projection of a [`SupervisorSnapshot`]; nothing here touches the supervisor.

pub mod qr;

use crate::supervisor::{ConnectionStatus, SupervisorSnapshot};

/// Seconds between reloads while a pairing code is shown.
pub const QR_REFRESH_SECS: u32 = 5;
/// Seconds between reloads while the session is still starting.
pub const LOADING_REFRESH_SECS: u32 = 3;

/// Which page to show, by priority.
#[derive(Debug, PartialEq, Eq)]
pub enum PairingView<'a> {
	/// A pairing code is available to scan.
	Scan { image: &'a str },
	/// The session is connected.
	Connected { name: &'a str, phone: &'a str },
	/// Anything else: show the status and the last error.
	Loading {
		status: ConnectionStatus,
		last_error: Option<&'a str>,
	},
}

impl<'a> PairingView<'a> {
	pub fn select(snapshot: &'a SupervisorSnapshot) -> Self {
		if let Some(image) = snapshot.qr_code.as_deref() {
			return PairingView::Scan { image };
		}
		if snapshot.status == ConnectionStatus::Connected {
			let identity = snapshot.identity.as_ref();
			return PairingView::Connected {
				name: identity.and_then(|i| i.name.as_deref()).unwrap_or("Unknown"),
				phone: identity.and_then(|i| i.phone.as_deref()).unwrap_or(""),
			};
		}
		PairingView::Loading {
			status: snapshot.status,
			last_error: snapshot.last_error.as_deref(),
		}
	}

	pub fn render(&self) -> String {
		match self {
			PairingView::Scan { image } => page(
				"WhatsApp QR Code",
				Some(QR_REFRESH_SECS),
				"",
				&format!(
					"<h2>📱 Scan with WhatsApp</h2>\n<img src=\"{}\" alt=\"QR Code\" />\n<p>Waiting for scan... (auto-refreshes)</p>",
					escape_html(image)
				),
			),
			PairingView::Connected { name, phone } => page(
				"WhatsApp Connected",
				None,
				".success { color: #25D366; font-size: 60px; }",
				&format!(
					"<div class=\"success\">✅</div>\n<h2>WhatsApp Connected!</h2>\n<p>Connected as: {} ({})</p>",
					escape_html(name),
					escape_html(phone)
				),
			),
			PairingView::Loading { status, last_error } => {
				let mut body = format!("<h2>⏳ Loading WhatsApp...</h2>\n<p>Status: {}</p>\n", escape_html(status.as_str()));
				if let Some(error) = last_error {
					body.push_str(&format!("<p class=\"error\">Last error: {}</p>\n", escape_html(error)));
				}
				body.push_str("<p>Please wait... (auto-refreshes)</p>");
				page("WhatsApp Loading", Some(LOADING_REFRESH_SECS), ".error { color: #f15c6d; }", &body)
			}
		}
	}
}

/// Renders the pairing page for `snapshot`.
pub fn render_pairing_page(snapshot: &SupervisorSnapshot) -> String {
	PairingView::select(snapshot).render()
}

fn page(title: &str, refresh_secs: Option<u32>, extra_style: &str, body: &str) -> String {
	let refresh = refresh_secs
		.map(|secs| format!("<meta http-equiv=\"refresh\" content=\"{secs}\">\n"))
		.unwrap_or_default();
	format!(
		"<!DOCTYPE html>
<html>
<head>
<meta charset=\"utf-8\">
<title>{title}</title>
{refresh}<style>
body {{ background: #111b21; color: white; font-family: Arial, sans-serif; display: flex; flex-direction: column; align-items: center; justify-content: center; min-height: 100vh; margin: 0; }}
img {{ border-radius: 10px; }}
p {{ color: #8696a0; margin-top: 20px; }}
{extra_style}
</style>
</head>
<body>
{body}
</body>
</html>
"
	)
}

pub fn escape_html(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	for c in input.chars() {
		match c {
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			c => out.push(c),
		}
	}
	out
}
