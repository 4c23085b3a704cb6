//! Discord IPC session against a fake local server
#![cfg(unix)]

use serde_json::json;
use shelfsync_core::{Book, BookKey, Platform};
use shelfsync_presence::{
    read_frame, write_frame, DiscordIpcConnector, Opcode, PresenceConnector, PresenceError,
    PresencePayload,
};
use tempfile::TempDir;
use tokio::net::UnixListener;

fn payload() -> PresencePayload {
    let _ = env_logger::builder().is_test(true).try_init();
    let book = Book::new(
        BookKey::new("111").expect("valid key"),
        "The Hobbit",
        "J.R.R. Tolkien",
        Platform::Goodreads,
    );
    PresencePayload::for_book(&book, "book", None)
}

#[tokio::test]
async fn test_handshake_update_and_rejection() {
    let dir = TempDir::new().expect("temp dir");
    let listener = UnixListener::bind(dir.path().join("discord-ipc-0")).expect("bind");

    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");

        let (op, handshake) = read_frame(&mut stream).await.expect("handshake");
        assert_eq!(op, Opcode::Handshake);
        assert_eq!(handshake["client_id"], "1234567890");
        write_frame(
            &mut stream,
            Opcode::Frame,
            &json!({"cmd": "DISPATCH", "evt": "READY", "data": {}}),
        )
        .await
        .expect("ready");

        // First update is accepted
        let (_, command) = read_frame(&mut stream).await.expect("command");
        assert_eq!(command["cmd"], "SET_ACTIVITY");
        assert_eq!(command["args"]["activity"]["details"], "The Hobbit");
        write_frame(
            &mut stream,
            Opcode::Frame,
            &json!({"cmd": "SET_ACTIVITY", "nonce": command["nonce"], "data": {}}),
        )
        .await
        .expect("ack");

        // Second update is rejected
        let (_, command) = read_frame(&mut stream).await.expect("command");
        write_frame(
            &mut stream,
            Opcode::Frame,
            &json!({
                "cmd": "SET_ACTIVITY",
                "evt": "ERROR",
                "nonce": command["nonce"],
                "data": {"code": 4000, "message": "bad activity"}
            }),
        )
        .await
        .expect("error");

        let (op, _) = read_frame(&mut stream).await.expect("close");
        assert_eq!(op, Opcode::Close);
    });

    let connector = DiscordIpcConnector::with_socket_dirs(vec![dir.path().to_path_buf()]);
    let mut session = connector.connect("1234567890").await.expect("connect");

    session.update(&payload()).await.expect("first update");

    let err = session.update(&payload()).await.expect_err("second update fails");
    assert!(matches!(err, PresenceError::Update(ref msg) if msg == "bad activity"));

    session.close().await.expect("close");
    server.await.expect("server task");
}

#[tokio::test]
async fn test_handshake_close_is_connect_error() {
    let dir = TempDir::new().expect("temp dir");
    let listener = UnixListener::bind(dir.path().join("discord-ipc-0")).expect("bind");

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let _ = read_frame(&mut stream).await;
        let _ = write_frame(
            &mut stream,
            Opcode::Close,
            &json!({"code": 4000, "message": "Invalid Client ID"}),
        )
        .await;
    });

    let connector = DiscordIpcConnector::with_socket_dirs(vec![dir.path().to_path_buf()]);
    let result = connector.connect("0").await;
    match result {
        Err(PresenceError::Connect(msg)) => assert!(msg.contains("Invalid Client ID")),
        other => panic!("expected connect error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_dropped_connection_is_update_error() {
    let dir = TempDir::new().expect("temp dir");
    let listener = UnixListener::bind(dir.path().join("discord-ipc-0")).expect("bind");

    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let _ = read_frame(&mut stream).await;
        let _ = write_frame(&mut stream, Opcode::Frame, &json!({"evt": "READY"})).await;
        // Dropping the stream simulates Discord quitting
    });

    let connector = DiscordIpcConnector::with_socket_dirs(vec![dir.path().to_path_buf()]);
    let mut session = connector.connect("1").await.expect("connect");

    let result = session.update(&payload()).await;
    assert!(matches!(result, Err(PresenceError::Update(_))));
}
