use std::sync::Arc;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use wa_protocol::{ChatId, Document, SessionEvent, SessionIdentity};

use super::router;
use crate::gateway::Gateway;
use crate::supervisor::{ConnectionStatus, RetryPolicy, Supervisor};
use crate::testing::{StubCall, StubFactory};

const PDF_BYTES: &[u8] = b"%PDF-1.4 stub";
const PDF_BASE64: &str = "JVBERi0xLjQgc3R1Yg==";

fn gateway(factory: &StubFactory) -> Gateway {
	let supervisor = Supervisor::new(Arc::new(factory.clone()), RetryPolicy::default());
	Gateway::new(supervisor, "88", "WhatsApp Service")
}

async fn connected(factory: &StubFactory) -> Gateway {
	let gateway = gateway(factory);
	gateway.supervisor().initialize().await;
	factory.client(0).emit(SessionEvent::Ready(SessionIdentity {
		name: Some("Front Desk".to_string()),
		phone: Some("8801700000000".to_string()),
	}));
	gateway
}

async fn get(gateway: &Gateway, uri: &str) -> (StatusCode, String) {
	let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
	let res = router(gateway.clone()).oneshot(req).await.unwrap();
	let status = res.status();
	let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
	(status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn get_json(gateway: &Gateway, uri: &str) -> (StatusCode, Value) {
	let (status, body) = get(gateway, uri).await;
	(status, serde_json::from_str(&body).unwrap())
}

async fn post_raw(gateway: &Gateway, uri: &str, body: Body, json_content: bool) -> (StatusCode, Value) {
	let mut req = Request::builder().method("POST").uri(uri);
	if json_content {
		req = req.header(header::CONTENT_TYPE, "application/json");
	}
	let res = router(gateway.clone()).oneshot(req.body(body).unwrap()).await.unwrap();
	let status = res.status();
	let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
	(status, serde_json::from_slice(&bytes).unwrap())
}

async fn post(gateway: &Gateway, uri: &str, body: Value) -> (StatusCode, Value) {
	post_raw(gateway, uri, Body::from(body.to_string()), true).await
}

fn chat() -> ChatId {
	ChatId::for_user("8801712345678")
}

#[tokio::test]
async fn root_reports_service_and_status() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);

	let (status, body) = get_json(&gateway, "/").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["service"], "WhatsApp Service");
	assert_eq!(body["status"], "initializing");
	let timestamp = body["timestamp"].as_str().unwrap();
	assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
	assert!(timestamp.ends_with('Z'));
}

#[tokio::test]
async fn status_right_after_start() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);
	gateway.supervisor().initialize().await;

	let (status, body) = get_json(&gateway, "/status").await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "initializing");
	assert_eq!(body["qrCode"], Value::Null);
	assert_eq!(body["connectedAs"], Value::Null);
	assert_eq!(body["lastError"], Value::Null);
	assert!(body["initAttempts"].as_u64().unwrap() >= 1);
}

#[tokio::test]
async fn status_counts_attempt_as_soon_as_startup_begins() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);
	gateway.supervisor().start();

	let (_, body) = get_json(&gateway, "/status").await;

	assert_eq!(body["status"], "initializing");
	assert_eq!(body["initAttempts"], 1);
}

#[tokio::test]
async fn status_while_pairing_exposes_qr() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);
	gateway.supervisor().initialize().await;
	factory.client(0).emit(SessionEvent::PairingChallenge("2@abc".to_string()));

	let (_, body) = get_json(&gateway, "/status").await;

	assert_eq!(body["status"], "qr_ready");
	assert!(body["qrCode"].as_str().unwrap().starts_with("data:image/png;base64,"));
	assert_eq!(body["initAttempts"], 0);
}

#[tokio::test]
async fn status_when_connected_reports_identity() {
	let factory = StubFactory::new();
	let gateway = connected(&factory).await;

	let (_, body) = get_json(&gateway, "/status").await;

	assert_eq!(body["status"], "connected");
	assert_eq!(body["connectedAs"], json!({"name": "Front Desk", "phone": "8801700000000"}));
}

#[tokio::test]
async fn qr_page_follows_state() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);
	gateway.supervisor().initialize().await;

	let (status, html) = get(&gateway, "/qr").await;
	assert_eq!(status, StatusCode::OK);
	assert!(html.contains("Status: initializing"));

	factory.client(0).emit(SessionEvent::PairingChallenge("2@abc".to_string()));
	let (_, html) = get(&gateway, "/qr").await;
	assert!(html.contains("<img src=\"data:image/png;base64,"));

	factory.client(0).emit(SessionEvent::Ready(SessionIdentity::default()));
	let (_, html) = get(&gateway, "/qr").await;
	assert!(html.contains("WhatsApp Connected!"));
	assert!(html.contains("Connected as: Unknown ()"));
}

#[tokio::test]
async fn send_while_disconnected_is_unavailable() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);
	gateway.supervisor().initialize().await;

	let (status, body) = post(&gateway, "/send", json!({"phone": "01712345678", "message": "Hi"})).await;

	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(
		body,
		json!({"success": false, "error": "WhatsApp not connected. Please scan QR code first."})
	);
	let client = factory.client(0);
	assert_eq!(client.count(|c| matches!(c, StubCall::SendText(..) | StubCall::IsRegistered(..))), 0);
}

#[tokio::test]
async fn send_when_connected_normalizes_and_delivers() {
	let factory = StubFactory::new();
	let gateway = connected(&factory).await;

	let (status, body) = post(&gateway, "/send", json!({"phone": "01712345678", "message": "Hi"})).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["success"], true);
	assert_eq!(body["to"], "8801712345678");
	assert_eq!(body["messageId"], "true_8801712345678@c.us_STUB1");
	assert_eq!(
		factory.client(0).calls(),
		vec![
			StubCall::Start,
			StubCall::IsRegistered(chat()),
			StubCall::SendText(chat(), "Hi".to_string()),
		]
	);
}

#[tokio::test]
async fn send_requires_phone_and_message() {
	let factory = StubFactory::new();
	let gateway = connected(&factory).await;

	for body in [json!({"phone": "01712345678"}), json!({"message": "Hi"}), json!({"phone": "", "message": "Hi"})] {
		let (status, body) = post(&gateway, "/send", body).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body, json!({"success": false, "error": "Phone and message are required"}));
	}
}

#[tokio::test]
async fn validation_precedes_connection_check() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);

	let (status, _) = post(&gateway, "/send", json!({"phone": "01712345678"})).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_or_missing_body_is_bad_request() {
	let factory = StubFactory::new();
	let gateway = connected(&factory).await;

	let (status, body) = post_raw(&gateway, "/send", Body::from("{not json"), true).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["success"], false);
	assert!(body["error"].is_string());

	let (status, body) = post_raw(&gateway, "/send-pdf", Body::empty(), false).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unregistered_recipient_is_rejected() {
	let factory = StubFactory::new();
	factory.update(|s| s.registered = false);
	let gateway = connected(&factory).await;

	let (status, body) = post(&gateway, "/send", json!({"phone": "01712345678", "message": "Hi"})).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "This phone number is not registered on WhatsApp");
	assert_eq!(factory.client(0).count(|c| matches!(c, StubCall::SendText(..))), 0);
}

#[tokio::test]
async fn send_failure_is_a_server_error() {
	let factory = StubFactory::new();
	factory.update(|s| s.send_error = Some("Evaluation failed".to_string()));
	let gateway = connected(&factory).await;

	let (status, body) = post(&gateway, "/send", json!({"phone": "01712345678", "message": "Hi"})).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body, json!({"success": false, "error": "Evaluation failed"}));
}

#[tokio::test]
async fn send_pdf_sends_text_then_document() {
	let factory = StubFactory::new();
	let gateway = connected(&factory).await;

	let (status, body) = post(
		&gateway,
		"/send-pdf",
		json!({"phone": "01712345678", "message": "Your invoice", "pdfBase64": PDF_BASE64, "filename": "Bill-42.pdf"}),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!({"success": true, "to": "8801712345678"}));
	assert_eq!(
		factory.client(0).calls(),
		vec![
			StubCall::Start,
			StubCall::IsRegistered(chat()),
			StubCall::SendText(chat(), "Your invoice".to_string()),
			StubCall::SendDocument(chat(), Document::pdf("Bill-42.pdf", PDF_BYTES.to_vec())),
		]
	);
}

#[tokio::test]
async fn send_pdf_defaults_filename_and_skips_empty_text() {
	let factory = StubFactory::new();
	let gateway = connected(&factory).await;

	let (status, _) = post(&gateway, "/send-pdf", json!({"phone": "01712345678", "message": "", "pdfBase64": PDF_BASE64})).await;

	assert_eq!(status, StatusCode::OK);
	let calls = factory.client(0).calls();
	assert_eq!(calls.last(), Some(&StubCall::SendDocument(chat(), Document::pdf("Invoice.pdf", PDF_BYTES.to_vec()))));
	assert_eq!(factory.client(0).count(|c| matches!(c, StubCall::SendText(..))), 0);
}

#[tokio::test]
async fn send_pdf_error_contract() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);

	let (status, body) = post(&gateway, "/send-pdf", json!({"message": "Hi"})).await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "Phone is required");

	let (status, body) = post(&gateway, "/send-pdf", json!({"phone": "01712345678"})).await;
	assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
	assert_eq!(body["error"], "WhatsApp not connected");
}

#[tokio::test]
async fn send_pdf_rejects_bad_base64_before_sending() {
	let factory = StubFactory::new();
	let gateway = connected(&factory).await;

	let (status, body) = post(&gateway, "/send-pdf", json!({"phone": "01712345678", "pdfBase64": "%%% not base64"})).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["error"].as_str().unwrap().starts_with("pdfBase64 is not valid base64"));
	assert_eq!(factory.client(0).calls(), vec![StubCall::Start]);
}

#[tokio::test]
async fn send_pdf_to_unregistered_recipient() {
	let factory = StubFactory::new();
	factory.update(|s| s.registered = false);
	let gateway = connected(&factory).await;

	let (status, body) = post(&gateway, "/send-pdf", json!({"phone": "01712345678", "pdfBase64": PDF_BASE64})).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "Phone not on WhatsApp");
}

#[tokio::test]
async fn logout_disconnects() {
	let factory = StubFactory::new();
	let gateway = connected(&factory).await;

	let (status, body) = post_raw(&gateway, "/logout", Body::empty(), false).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!({"success": true, "message": "Logged out"}));
	assert_eq!(gateway.supervisor().status(), ConnectionStatus::Disconnected);
	assert!(gateway.supervisor().snapshot().identity.is_none());
}

#[tokio::test]
async fn logout_failure_is_a_server_error() {
	let factory = StubFactory::new();
	factory.update(|s| s.logout_error = Some("Target closed".to_string()));
	let gateway = connected(&factory).await;

	let (status, body) = post_raw(&gateway, "/logout", Body::empty(), false).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body, json!({"success": false, "error": "Target closed"}));
	assert_eq!(gateway.supervisor().status(), ConnectionStatus::Connected);
}

#[tokio::test]
async fn logout_without_session_is_a_server_error() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);

	let (status, body) = post_raw(&gateway, "/logout", Body::empty(), false).await;

	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["success"], false);
}

#[tokio::test(start_paused = true)]
async fn restart_succeeds_even_when_disposal_fails() {
	let factory = StubFactory::new();
	factory.update(|s| s.destroy_error = Some("Protocol error: Target closed".to_string()));
	let gateway = connected(&factory).await;

	let (status, body) = post_raw(&gateway, "/restart", Body::empty(), false).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body, json!({"success": true, "message": "Restarting..."}));
	assert_eq!(gateway.supervisor().status(), ConnectionStatus::Initializing);

	tokio::time::sleep(std::time::Duration::from_secs(3)).await;
	assert!(factory.client(0).was_destroyed());
	assert_eq!(factory.created(), 2);
}

#[tokio::test]
async fn unknown_route_is_not_found() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);

	let (status, _) = get(&gateway, "/nope").await;
	assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cors_is_permissive() {
	let factory = StubFactory::new();
	let gateway = gateway(&factory);
	let req = Request::builder()
		.uri("/status")
		.header(header::ORIGIN, "https://billing.example")
		.body(Body::empty())
		.unwrap();

	let res = router(gateway).oneshot(req).await.unwrap();

	assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}
