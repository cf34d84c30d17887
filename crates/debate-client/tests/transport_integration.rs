//! Integration tests for the WebSocket transport.
//!
//! These tests run [`WsDriver`] against a real `tokio-tungstenite` server on
//! a loopback port and check what each side observes on the wire.

use std::time::Duration;

use debate_client::{
    ClientConfig, ClientEvent, Driver, Runtime, SessionClient, SocketId, StaticToken, SystemEnv,
    transport::WsDriver,
};
use debate_proto::{CloseCode, SessionId};
use futures::{SinkExt, StreamExt};
use tokio::{net::TcpListener, sync::oneshot, time::timeout};
use tokio_tungstenite::{
    accept_async,
    tungstenite::{
        Message,
        protocol::{CloseFrame, frame::coding::CloseCode as WsCloseCode},
    },
};

const WAIT: Duration = Duration::from_secs(5);

/// Bind a loopback listener and return it with its `ws://` base.
async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("ws://{}", listener.local_addr().unwrap());
    (listener, base)
}

async fn next_event(driver: &mut WsDriver) -> ClientEvent {
    timeout(WAIT, driver.next_event()).await.expect("driver event")
}

/// Wait for the close of `socket`, skipping the error that may precede it.
async fn next_close(driver: &mut WsDriver, socket: SocketId) -> (CloseCode, String) {
    loop {
        match next_event(driver).await {
            ClientEvent::SocketClosed { socket: s, code, reason } if s == socket => {
                return (code, reason);
            },
            ClientEvent::SocketError { socket: s, .. } if s == socket => {},
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[tokio::test]
async fn open_relays_text_both_ways() {
    let (listener, base) = bind().await;
    let (received_tx, received_rx) = oneshot::channel();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        ws.send(Message::Text(r#"{"type":"debate_started","round":1}"#.into())).await.unwrap();
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let _ = received_tx.send(text);
        }
    });

    let mut driver = WsDriver::new();
    let socket = SocketId::from_raw(1);
    driver.open(socket, &format!("{base}/ws/debate/42/?token=tok")).await.unwrap();

    assert_eq!(next_event(&mut driver).await, ClientEvent::SocketOpened { socket });
    assert_eq!(
        next_event(&mut driver).await,
        ClientEvent::FrameReceived {
            socket,
            text: r#"{"type":"debate_started","round":1}"#.to_owned()
        }
    );

    driver.transmit(socket, r#"{"type":"join_debate","session_id":42}"#.to_owned()).await.unwrap();
    let received = timeout(WAIT, received_rx).await.unwrap().unwrap();
    assert_eq!(received, r#"{"type":"join_debate","session_id":42}"#);
}

#[tokio::test]
async fn server_close_code_is_reported_verbatim() {
    let (listener, base) = bind().await;
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        let frame = CloseFrame { code: WsCloseCode::from(4001), reason: "session ended".into() };
        ws.send(Message::Close(Some(frame))).await.unwrap();
        while let Some(Ok(_)) = ws.next().await {}
    });

    let mut driver = WsDriver::new();
    let socket = SocketId::from_raw(1);
    driver.open(socket, &base).await.unwrap();
    assert_eq!(next_event(&mut driver).await, ClientEvent::SocketOpened { socket });

    let (code, reason) = next_close(&mut driver, socket).await;
    assert_eq!(code, CloseCode::new(4001));
    assert_eq!(reason, "session ended");
}

#[tokio::test]
async fn dropped_connection_closes_abnormally() {
    let (listener, base) = bind().await;
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = accept_async(tcp).await.unwrap();
        drop(ws);
    });

    let mut driver = WsDriver::new();
    let socket = SocketId::from_raw(1);
    driver.open(socket, &base).await.unwrap();
    assert_eq!(next_event(&mut driver).await, ClientEvent::SocketOpened { socket });

    let (code, _) = next_close(&mut driver, socket).await;
    assert_eq!(code, CloseCode::ABNORMAL);
}

#[tokio::test]
async fn refused_connection_reports_error_then_abnormal_close() {
    let (listener, base) = bind().await;
    drop(listener);

    let mut driver = WsDriver::new();
    let socket = SocketId::from_raw(1);
    driver.open(socket, &base).await.unwrap();

    assert!(matches!(
        next_event(&mut driver).await,
        ClientEvent::SocketError { socket: s, .. } if s == socket
    ));
    let (code, _) = next_close(&mut driver, socket).await;
    assert_eq!(code, CloseCode::ABNORMAL);
}

#[tokio::test]
async fn runtime_shutdown_sends_normal_close() {
    let (listener, base) = bind().await;
    let (close_tx, close_rx) = oneshot::channel();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();
        while let Some(message) = ws.next().await {
            match message {
                Ok(Message::Close(frame)) => {
                    let _ = close_tx.send(frame.map(|f| (u16::from(f.code), f.reason.into_owned())));
                    return;
                },
                Ok(_) => {},
                Err(e) => panic!("connection dropped without close: {e}"),
            }
        }
    });

    let config = ClientConfig { endpoint: base.parse().unwrap(), ..ClientConfig::default() };
    let client = SessionClient::new(SessionId::new(42).unwrap(), &config, StaticToken::new("tok"));
    let (runtime, handle) = Runtime::new(client, WsDriver::new(), SystemEnv::new(), ());
    let task = tokio::spawn(runtime.run());

    handle.connect().await.unwrap();
    timeout(WAIT, handle.subscribe().wait_for(|s| s.connected)).await.unwrap().unwrap();

    handle.shutdown().await.unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();

    let observed = timeout(WAIT, close_rx).await.unwrap().unwrap();
    assert_eq!(observed, Some((1000, "Intentional disconnect".to_owned())));
}

#[tokio::test]
async fn close_while_opening_abandons_the_handshake() {
    let (listener, base) = bind().await;
    tokio::spawn(async move {
        // First handshake is held long enough for the client to give up on it
        let mut held = true;
        loop {
            let Ok((tcp, _)) = listener.accept().await else { return };
            let delay =
                if std::mem::take(&mut held) { Duration::from_millis(300) } else { Duration::ZERO };
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Ok(mut ws) = accept_async(tcp).await {
                    while let Some(Ok(_)) = ws.next().await {}
                }
            });
        }
    });

    let mut driver = WsDriver::new();
    let first = SocketId::from_raw(1);
    driver.open(first, &base).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    driver.close(first, CloseCode::NORMAL, "Intentional disconnect").await.unwrap();

    assert_eq!(
        next_event(&mut driver).await,
        ClientEvent::SocketClosed {
            socket: first,
            code: CloseCode::NORMAL,
            reason: "Intentional disconnect".to_owned(),
        }
    );

    // Outlast the held handshake before opening the replacement
    tokio::time::sleep(Duration::from_millis(400)).await;
    let second = SocketId::from_raw(2);
    driver.open(second, &base).await.unwrap();

    assert_eq!(next_event(&mut driver).await, ClientEvent::SocketOpened { socket: second });
}
