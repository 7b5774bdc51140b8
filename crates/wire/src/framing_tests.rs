// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format tests: length-prefix framing and JSON encoding.

use super::*;

#[test]
fn encode_returns_json_without_length_prefix() {
    let value = serde_json::json!({"ok": true});
    let encoded = encode(&value).expect("encode failed");
    let json_str = std::str::from_utf8(&encoded).expect("should be valid UTF-8");
    assert!(json_str.starts_with('{'), "should be JSON object: {json_str}");
}

#[tokio::test]
async fn read_write_message_roundtrip() {
    let original = b"hello world";

    let mut buffer = Vec::new();
    write_message(&mut buffer, original).await.expect("write failed");
    assert_eq!(buffer.len(), 4 + original.len());

    let mut cursor = std::io::Cursor::new(buffer);
    let read_back = read_message(&mut cursor).await.expect("read failed");
    assert_eq!(read_back, original);
}

#[tokio::test]
async fn write_message_adds_length_prefix() {
    let data = b"test data";

    let mut buffer = Vec::new();
    write_message(&mut buffer, data).await.expect("write failed");

    let len = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    assert_eq!(len, data.len());
    assert_eq!(&buffer[4..], data);
}

#[tokio::test]
async fn read_message_on_empty_stream_is_connection_closed() {
    let mut cursor = std::io::Cursor::new(Vec::<u8>::new());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn oversized_frame_is_rejected_before_allocating() {
    let mut cursor = std::io::Cursor::new((MAX_FRAME_LEN + 1).to_be_bytes().to_vec());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::FrameTooLarge(_)));
}

#[tokio::test]
async fn read_framed_decodes_typed_value() {
    let mut buffer = Vec::new();
    write_framed(&mut buffer, &vec![1, 2, 3], std::time::Duration::from_secs(1))
        .await
        .unwrap();

    let mut cursor = std::io::Cursor::new(buffer);
    let value: Vec<i32> = read_framed(&mut cursor, std::time::Duration::from_secs(1)).await.unwrap();
    assert_eq!(value, vec![1, 2, 3]);
}

#[tokio::test]
async fn read_framed_times_out_on_silent_peer() {
    let (mut _client, mut server) = tokio::io::duplex(64);
    let result: Result<i32, _> =
        read_framed(&mut server, std::time::Duration::from_millis(10)).await;
    assert!(matches!(result, Err(ProtocolError::Timeout)));
}
