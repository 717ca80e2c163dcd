use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{ImageBuffer, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use thiserror::Error;

/// Target edge length of the rendered image, in pixels.
const TARGET_SIZE: u32 = 300;
/// Light modules around the code.
const QUIET_ZONE: u32 = 4;

#[derive(Debug, Error)]
pub enum QrRenderError {
	#[error("QR generation failed: {0}")]
	Encode(#[from] qrcode::types::QrError),

	#[error("PNG encoding failed: {0}")]
	Png(#[from] image::ImageError),
}

/// Renders `payload` as a PNG QR code.
pub fn qr_png(payload: &str) -> Result<Vec<u8>, QrRenderError> {
	let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::M)?;

	let modules = code.width() as u32;
	let span = modules + QUIET_ZONE * 2;
	let module_size = (TARGET_SIZE / span).max(1);
	let img_size = span * module_size;

	let img = ImageBuffer::from_fn(img_size, img_size, |x, y| {
		let (cx, cy) = (x / module_size, y / module_size);
		if cx < QUIET_ZONE || cy < QUIET_ZONE || cx >= QUIET_ZONE + modules || cy >= QUIET_ZONE + modules {
			return Luma([255u8]);
		}
		match code[((cx - QUIET_ZONE) as usize, (cy - QUIET_ZONE) as usize)] {
			Color::Dark => Luma([0u8]),
			Color::Light => Luma([255u8]),
		}
	});

	let mut buf = Cursor::new(Vec::new());
	img.write_to(&mut buf, ImageFormat::Png)?;
	Ok(buf.into_inner())
}

/// Renders `payload` as a `data:image/png;base64,...` URI suitable for an `<img src>`.
pub fn qr_data_uri(payload: &str) -> Result<String, QrRenderError> {
	let png = qr_png(payload)?;
	Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
