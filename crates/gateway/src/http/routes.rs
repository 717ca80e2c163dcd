use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::Html;
use chrono::{SecondsFormat, Utc};

use super::types::{Ack, RootResponse, SendPdfRequest, SendPdfResponse, SendRequest, SendResponse, StatusResponse};
use crate::error::{GatewayError, Result};
use crate::gateway::{DocumentRequest, Gateway};
use crate::presenter::render_pairing_page;

pub async fn root(State(gateway): State<Gateway>) -> Json<RootResponse> {
	Json(RootResponse {
		service: gateway.service_name().to_string(),
		status: gateway.supervisor().status(),
		timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
	})
}

pub async fn status(State(gateway): State<Gateway>) -> Json<StatusResponse> {
	Json(gateway.status().into())
}

pub async fn qr(State(gateway): State<Gateway>) -> Html<String> {
	Html(render_pairing_page(&gateway.status()))
}

pub async fn send(State(gateway): State<Gateway>, body: std::result::Result<Json<SendRequest>, JsonRejection>) -> Result<Json<SendResponse>> {
	let Json(req) = body.map_err(rejected)?;
	let sent = gateway.send_message(req.phone.as_deref(), req.message.as_deref()).await?;
	Ok(Json(SendResponse {
		success: true,
		message_id: sent.message_id.0,
		to: sent.to,
	}))
}

pub async fn send_pdf(
	State(gateway): State<Gateway>,
	body: std::result::Result<Json<SendPdfRequest>, JsonRejection>,
) -> Result<Json<SendPdfResponse>> {
	let Json(req) = body.map_err(rejected)?;
	let to = gateway
		.send_document(DocumentRequest {
			phone: req.phone,
			message: req.message,
			pdf_base64: req.pdf_base64,
			filename: req.filename,
		})
		.await?;
	Ok(Json(SendPdfResponse { success: true, to }))
}

pub async fn logout(State(gateway): State<Gateway>) -> Result<Json<Ack>> {
	gateway.logout().await?;
	Ok(Json(Ack::new("Logged out")))
}

pub async fn restart(State(gateway): State<Gateway>) -> Json<Ack> {
	gateway.restart();
	Json(Ack::new("Restarting..."))
}

fn rejected(rejection: JsonRejection) -> GatewayError {
	GatewayError::Validation(rejection.body_text())
}
