//! End-to-end tests: the client event loop against a local WebSocket server.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use padlink_client::application::forward_input::ForwardInputUseCase;
use padlink_client::infrastructure::input_capture::jsonl::{EventFeed, JsonLinesSource};
use padlink_client::infrastructure::input_capture::{mock::MockInputSource, InputMode, InputSource, RawInputEvent};
use padlink_client::infrastructure::network::{
    ConnectionConfig, ConnectionDriver, ConnectionError, ConnectionState,
};
use padlink_core::{decode_message, OutboundMessage, PointerSample, Viewport};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};

const STEP: Duration = Duration::from_secs(10);

fn viewport() -> Viewport {
    Viewport {
        width: 800,
        height: 600,
        device_pixel_ratio: 1.0,
    }
}

fn forward() -> Arc<ForwardInputUseCase> {
    Arc::new(ForwardInputUseCase::new(InputMode::Pointer, viewport()))
}

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Option<String> {
    while let Some(msg) = ws.next().await {
        match msg.ok()? {
            Message::Text(text) => return Some(text),
            Message::Close(_) => return None,
            _ => {}
        }
    }
    None
}

async fn accept(listener: &TcpListener) -> WebSocketStream<TcpStream> {
    let (stream, _) = listener.accept().await.expect("accept");
    accept_async(stream).await.expect("websocket handshake")
}

/// Returns an endpoint nothing is listening on.
async fn dead_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}/api/socket")
}

#[tokio::test]
async fn test_dimensions_sent_on_connect_then_contacts_forwarded() {
    // Arrange: a server that reports every text frame it receives
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (frames_tx, mut frames) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        while let Some(text) = next_text(&mut ws).await {
            let _ = frames_tx.send(text);
        }
    });

    let mut source = MockInputSource::new();
    let input = source.start().unwrap();
    let driver = ConnectionDriver::start(
        ConnectionConfig {
            endpoint: format!("ws://{addr}/api/socket"),
            max_retries: 5,
        },
        forward(),
    )
    .unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(driver.run(input, async {
        let _ = stop_rx.await;
    }));

    // Act / Assert: the first frame is the dimensions message
    let first = timeout(STEP, frames.recv()).await.unwrap().unwrap();
    assert_eq!(first, r#"{"t":"d","d":{"width":800,"height":600,"resolution":4}}"#);

    // A pressed pointer is forwarded as a one-contact update
    source
        .inject_event(RawInputEvent::PointerDown(PointerSample {
            pointer_id: 7,
            offset_x: 100.0,
            offset_y: 50.0,
            width: 1.0,
            height: 1.0,
            pressure: 0.5,
        }))
        .unwrap();
    let update = timeout(STEP, frames.recv()).await.unwrap().unwrap();
    match decode_message(&update).unwrap() {
        OutboundMessage::PointerUpdate(contacts) => {
            assert_eq!(contacts.len(), 1);
            assert_eq!(contacts[0].id, 7);
            assert_eq!(contacts[0].x, 100.0);
        }
        other => panic!("expected a pointer update, got {other:?}"),
    }

    // Shutdown is a clean exit
    stop_tx.send(()).unwrap();
    let result = timeout(STEP, run).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_server_close_triggers_reconnect_and_dimensions_resend() {
    // Arrange: the server closes the first connection after the handshake
    // frame and keeps the second one
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (frames_tx, mut frames) = mpsc::unbounded_channel::<(usize, String)>();
    tokio::spawn(async move {
        let mut first = accept(&listener).await;
        if let Some(text) = next_text(&mut first).await {
            let _ = frames_tx.send((1, text));
        }
        let _ = first.close(None).await;
        while first.next().await.is_some() {}

        let mut second = accept(&listener).await;
        while let Some(text) = next_text(&mut second).await {
            let _ = frames_tx.send((2, text));
        }
    });

    let mut source = MockInputSource::new();
    let input = source.start().unwrap();
    let driver = ConnectionDriver::start(
        ConnectionConfig {
            endpoint: format!("ws://{addr}/api/socket"),
            max_retries: 5,
        },
        forward(),
    )
    .unwrap();
    let mut status = driver.subscribe_status();
    let (_stop_tx, stop_rx) = oneshot::channel::<()>();
    tokio::spawn(driver.run(input, async {
        let _ = stop_rx.await;
    }));

    // Act
    let (conn_a, dims_a) = timeout(STEP, frames.recv()).await.unwrap().unwrap();
    let (conn_b, dims_b) = timeout(STEP, frames.recv()).await.unwrap().unwrap();

    // Assert: both connections got the same dimensions frame
    assert_eq!((conn_a, conn_b), (1, 2));
    assert_eq!(dims_a, dims_b);

    // The reconnect consumed exactly one retry and the link is open again
    let snapshot = timeout(
        STEP,
        status.wait_for(|s| s.state == ConnectionState::Connected && s.retries == 1),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(snapshot.max_retries, 5);
    assert_eq!(snapshot.title, "Connected");
    drop(source);
}

#[tokio::test]
async fn test_unreachable_server_exhausts_budget_and_fails() {
    // Arrange
    let source = MockInputSource::new();
    let mut starter = source.clone();
    let input = starter.start().unwrap();
    let driver = ConnectionDriver::start(
        ConnectionConfig {
            endpoint: dead_endpoint().await,
            max_retries: 1,
        },
        forward(),
    )
    .unwrap();
    let mut status = driver.subscribe_status();

    // Act: one retry after ~1s, then the fatal condition
    let result = timeout(STEP, driver.run(input, std::future::pending())).await.unwrap();

    // Assert
    match result {
        Err(ConnectionError::RetriesExhausted { retries, .. }) => assert_eq!(retries, 1),
        Ok(()) => panic!("an unreachable server must end in the fatal error"),
    }
    let last = status.borrow_and_update().clone();
    assert_eq!(last.state, ConnectionState::Disconnected);
    assert_eq!(last.title, "Failed to connect, restart to retry");
    drop(source);
}

#[tokio::test]
async fn test_file_feed_is_forwarded_once_connected() {
    // Arrange: a feed fully written before the client starts
    let mut feed = tempfile::NamedTempFile::new().unwrap();
    for x in [10.0, 20.0, 30.0] {
        writeln!(
            feed,
            r#"{{"kind":"pointer_down","pointer_id":1,"offset_x":{x},"offset_y":5.0,"width":1.0,"height":1.0,"pressure":0.5}}"#
        )
        .unwrap();
    }
    feed.flush().unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (frames_tx, mut frames) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        while let Some(text) = next_text(&mut ws).await {
            let _ = frames_tx.send(text);
        }
    });

    let mut source = JsonLinesSource::new(EventFeed::File(feed.path().to_path_buf()));
    let input = source.start().unwrap();
    let driver = ConnectionDriver::start(
        ConnectionConfig {
            endpoint: format!("ws://{addr}/api/socket"),
            max_retries: 5,
        },
        forward(),
    )
    .unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let run = tokio::spawn(driver.run(input, async {
        let _ = stop_rx.await;
    }));

    // Act
    let first = timeout(STEP, frames.recv()).await.unwrap().unwrap();
    let mut xs = Vec::new();
    for _ in 0..3 {
        let frame = timeout(STEP, frames.recv()).await.unwrap().unwrap();
        assert!(frame.starts_with(r#"{"t":"tu""#), "unexpected frame {frame}");
        match decode_message(&frame).unwrap() {
            OutboundMessage::PointerUpdate(contacts) => xs.push(contacts[0].x),
            other => panic!("expected a pointer update, got {other:?}"),
        }
    }

    // Assert: dimensions first, then every line of the feed in order
    assert!(first.starts_with(r#"{"t":"d""#));
    assert_eq!(xs, vec![10.0, 20.0, 30.0]);

    // The feed has ended but the client is still running
    assert!(!run.is_finished());
    stop_tx.send(()).unwrap();
    let result = timeout(STEP, run).await.unwrap().unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_end_of_input_keeps_the_client_running_until_shutdown() {
    // Arrange
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        while next_text(&mut ws).await.is_some() {}
    });

    let mut source = MockInputSource::new();
    let input = source.start().unwrap();
    let driver = ConnectionDriver::start(
        ConnectionConfig {
            endpoint: format!("ws://{addr}/api/socket"),
            max_retries: 5,
        },
        forward(),
    )
    .unwrap();
    let mut status = driver.subscribe_status();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut run = tokio::spawn(driver.run(input, async {
        let _ = stop_rx.await;
    }));
    timeout(STEP, status.wait_for(|s| s.state == ConnectionState::Connected))
        .await
        .unwrap()
        .unwrap();

    // Act
    source.stop();
    let still_running = timeout(Duration::from_millis(300), &mut run).await;

    // Assert
    assert!(still_running.is_err());
    assert_eq!(status.borrow().state, ConnectionState::Connected);
    stop_tx.send(()).unwrap();
    let result = timeout(STEP, run).await.unwrap().unwrap();
    assert!(result.is_ok());
}
