use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::*;

#[tokio::test]
async fn test_send_message() {
	let (mut stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, _stdout_write) = tokio::io::duplex(1024);

	let (transport, _rx) = PipeTransport::new(stdin_write, stdout_read);
	let (mut sender, _receiver) = transport.into_parts();

	let test_message = serde_json::json!({
		"id": 1,
		"method": "sendMessage",
		"params": {"chatId": "8801712345678@c.us", "body": "hi"}
	});
	sender.send(test_message.clone()).await.unwrap();

	let mut len_buf = [0u8; 4];
	stdin_read.read_exact(&mut len_buf).await.unwrap();
	let length = u32::from_le_bytes(len_buf) as usize;

	let mut msg_buf = vec![0u8; length];
	stdin_read.read_exact(&mut msg_buf).await.unwrap();

	let received: serde_json::Value = serde_json::from_slice(&msg_buf).unwrap();
	assert_eq!(received, test_message);
}

#[tokio::test]
async fn test_multiple_messages_in_sequence() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(4096);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(4096);

	let (mut transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);
	let read_task = tokio::spawn(async move { transport.run().await });

	let messages = vec![
		serde_json::json!({"event": "loading_screen", "params": {"percent": 10}}),
		serde_json::json!({"event": "qr", "params": {"code": "2@abc"}}),
		serde_json::json!({"id": 0, "result": null}),
	];

	for msg in &messages {
		write_frame(&mut stdout_write, msg).await.unwrap();
	}

	for expected in &messages {
		let received = rx.recv().await.unwrap();
		assert_eq!(&received, expected);
	}

	drop(stdout_write);
	let result = read_task.await.unwrap();
	assert!(result.is_ok());
}

#[tokio::test]
async fn test_large_message() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024 * 1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024 * 1024);

	let (mut transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);
	let read_task = tokio::spawn(async move { transport.run().await });

	let large_message = serde_json::json!({
		"event": "qr",
		"params": {"code": "x".repeat(100_000)}
	});
	write_frame(&mut stdout_write, &large_message).await.unwrap();

	let received = rx.recv().await.unwrap();
	assert_eq!(received, large_message);

	drop(stdout_write);
	drop(rx);
	let _ = read_task.await;
}

#[tokio::test]
async fn test_malformed_length_prefix() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);

	stdout_write.write_all(&[0x01, 0x02]).await.unwrap();
	stdout_write.flush().await.unwrap();
	drop(stdout_write);

	let result = transport.run().await;
	assert!(result.unwrap_err().to_string().contains("Failed to read length prefix"));
}

#[tokio::test]
async fn test_oversized_frame_is_rejected() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);

	let length = (MAX_FRAME_LEN as u32) + 1;
	stdout_write.write_all(&length.to_le_bytes()).await.unwrap();
	stdout_write.flush().await.unwrap();

	let result = transport.run().await;
	assert!(result.unwrap_err().to_string().contains("too large"));
}

#[tokio::test]
async fn test_clean_eof_ends_reader() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, stdout_write) = tokio::io::duplex(1024);

	let (transport, mut rx) = PipeTransport::new(stdin_write, stdout_read);
	let (_sender, receiver) = transport.into_parts();
	drop(stdout_write);

	receiver.run().await.unwrap();
	assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn test_invalid_json_body() {
	let (_stdin_read, stdin_write) = tokio::io::duplex(1024);
	let (stdout_read, mut stdout_write) = tokio::io::duplex(1024);

	let (mut transport, _rx) = PipeTransport::new(stdin_write, stdout_read);

	let body = b"{not json";
	stdout_write.write_all(&(body.len() as u32).to_le_bytes()).await.unwrap();
	stdout_write.write_all(body).await.unwrap();
	stdout_write.flush().await.unwrap();

	let result = transport.run().await;
	assert!(matches!(result, Err(Error::Json(_))));
}
