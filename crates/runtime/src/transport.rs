//! Length-prefixed JSON framing over a pair of byte streams.
//!
//! Each frame is a 4-byte little-endian length followed by that many bytes of
//! UTF-8 JSON. The driver's stdin carries requests, its stdout carries
//! responses and events.

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Largest frame accepted from the driver.
pub const MAX_FRAME_LEN: usize = 64 * 1024 * 1024;

/// Writes one frame and flushes.
pub async fn write_frame<W>(writer: &mut W, message: &Value) -> Result<()>
where
	W: AsyncWrite + Unpin,
{
	let bytes = serde_json::to_vec(message)?;
	if bytes.len() > MAX_FRAME_LEN {
		return Err(Error::TransportError(format!("Outbound frame too large: {} bytes", bytes.len())));
	}
	let length = bytes.len() as u32;
	writer
		.write_all(&length.to_le_bytes())
		.await
		.map_err(|e| Error::TransportError(format!("Failed to write length prefix: {e}")))?;
	writer
		.write_all(&bytes)
		.await
		.map_err(|e| Error::TransportError(format!("Failed to write frame body: {e}")))?;
	writer
		.flush()
		.await
		.map_err(|e| Error::TransportError(format!("Failed to flush: {e}")))?;
	Ok(())
}

/// Reads one frame. Returns `Ok(None)` when the stream ends on a frame boundary.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Value>>
where
	R: AsyncRead + Unpin,
{
	let mut len_buf = [0u8; 4];
	let mut filled = 0;
	while filled < len_buf.len() {
		let n = reader
			.read(&mut len_buf[filled..])
			.await
			.map_err(|e| Error::TransportError(format!("Failed to read length prefix: {e}")))?;
		if n == 0 {
			if filled == 0 {
				return Ok(None);
			}
			return Err(Error::TransportError(format!(
				"Failed to read length prefix: stream ended after {filled} bytes"
			)));
		}
		filled += n;
	}

	let length = u32::from_le_bytes(len_buf) as usize;
	if length > MAX_FRAME_LEN {
		return Err(Error::TransportError(format!("Inbound frame too large: {length} bytes")));
	}

	let mut body = vec![0u8; length];
	reader
		.read_exact(&mut body)
		.await
		.map_err(|e| Error::TransportError(format!("Failed to read frame body: {e}")))?;

	let value = serde_json::from_slice(&body)?;
	Ok(Some(value))
}

/// Bidirectional pipe transport over the driver's stdio.
pub struct PipeTransport<W, R> {
	sender: PipeTransportSender<W>,
	receiver: PipeTransportReceiver<R>,
}

impl<W, R> PipeTransport<W, R>
where
	W: AsyncWrite + Unpin + Send,
	R: AsyncRead + Unpin + Send,
{
	/// Creates a transport and the channel that receives decoded inbound frames.
	pub fn new(stdin: W, stdout: R) -> (Self, mpsc::UnboundedReceiver<Value>) {
		let (message_tx, message_rx) = mpsc::unbounded_channel();
		let transport = Self {
			sender: PipeTransportSender { stdin },
			receiver: PipeTransportReceiver { stdout, message_tx },
		};
		(transport, message_rx)
	}

	/// Splits into independently owned halves so reads and writes can run on separate tasks.
	pub fn into_parts(self) -> (PipeTransportSender<W>, PipeTransportReceiver<R>) {
		(self.sender, self.receiver)
	}

	/// Runs the read loop in place. See [`PipeTransportReceiver::run`].
	pub async fn run(&mut self) -> Result<()> {
		self.receiver.run_borrowed().await
	}
}

/// Write half of a [`PipeTransport`].
pub struct PipeTransportSender<W> {
	stdin: W,
}

impl<W> PipeTransportSender<W>
where
	W: AsyncWrite + Unpin + Send,
{
	pub async fn send(&mut self, message: Value) -> Result<()> {
		write_frame(&mut self.stdin, &message).await
	}
}

/// Read half of a [`PipeTransport`].
pub struct PipeTransportReceiver<R> {
	stdout: R,
	message_tx: mpsc::UnboundedSender<Value>,
}

impl<R> PipeTransportReceiver<R>
where
	R: AsyncRead + Unpin + Send,
{
	/// Forwards frames until the stream ends or the consumer goes away.
	///
	/// A clean end of stream and a dropped consumer both return `Ok(())`.
	pub async fn run(mut self) -> Result<()> {
		self.run_borrowed().await
	}

	async fn run_borrowed(&mut self) -> Result<()> {
		while let Some(message) = read_frame(&mut self.stdout).await? {
			if self.message_tx.send(message).is_err() {
				tracing::debug!(target = "wa.bridge", "frame consumer dropped, stopping reader");
				return Ok(());
			}
		}
		tracing::debug!(target = "wa.bridge", "driver stdout closed");
		Ok(())
	}
}

#[cfg(test)]
mod tests;
