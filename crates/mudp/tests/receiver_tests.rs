//! Tests for the datagram receiver.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mudp::{CancelToken, Datagram, Receiver, ReceiverConfig, Sender, UdpError};

#[test]
fn test_config_builder() {
    let config = ReceiverConfig::new("127.0.0.1", 9000);
    assert_eq!(config.bind_address, "127.0.0.1");
    assert_eq!(config.port, 9000);
    assert_eq!(config.bind_addr(), "127.0.0.1:9000");
}

#[test]
fn test_any_address_config() {
    let config = ReceiverConfig::any_address(5000);
    assert_eq!(config.bind_address, "0.0.0.0");
    assert_eq!(config.port, 5000);
}

#[test]
fn test_datagram_creation() {
    let data = vec![1, 2, 3, 4];
    let source: SocketAddr = "192.168.1.100:5000".parse().unwrap();
    let datagram = Datagram::new(data.clone(), source);

    assert_eq!(datagram.data, data);
    assert_eq!(datagram.source, source);
}

#[tokio::test]
async fn test_bind_requires_port() {
    let err = Receiver::bind(ReceiverConfig::new("127.0.0.1", 0))
        .await
        .unwrap_err();
    assert!(matches!(err, UdpError::Config(_)));
}

#[tokio::test]
async fn test_bind_address_in_use() {
    let first = Receiver::bind(ReceiverConfig::new("127.0.0.1", 19105))
        .await
        .unwrap();

    let err = Receiver::bind(ReceiverConfig::new("127.0.0.1", 19105))
        .await
        .unwrap_err();
    assert!(matches!(err, UdpError::Bind { .. }));

    first.close();
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let receiver = Receiver::bind(ReceiverConfig::new("127.0.0.1", 19106))
        .await
        .unwrap();
    assert!(receiver.local_addr().is_some());

    receiver.close();
    assert!(receiver.local_addr().is_none());

    receiver.close();
    assert!(receiver.local_addr().is_none());
}

#[tokio::test]
async fn test_listen_after_close_is_closed_error() {
    let receiver = Receiver::bind(ReceiverConfig::new("127.0.0.1", 19107))
        .await
        .unwrap();
    receiver.close();

    let cancel = CancelToken::new();
    let err = receiver.listen(&cancel, |_| {}, 0).await.unwrap_err();
    assert!(err.is_closed());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_send_listen_round_trip() {
    let receiver = Arc::new(
        Receiver::bind(ReceiverConfig::new("127.0.0.1", 19100))
            .await
            .unwrap(),
    );
    let cancel = CancelToken::new();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let listen_receiver = receiver.clone();
    let listen_cancel = cancel.clone();
    let listener = tokio::spawn(async move {
        listen_receiver
            .listen(
                &listen_cancel,
                move |datagram: Datagram| {
                    let _ = tx.send(datagram.data);
                },
                0,
            )
            .await
    });

    let sender = Sender::new().await.unwrap();
    let n = sender
        .send(&cancel, "127.0.0.1:19100", b"hello-mudp", Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(n, b"hello-mudp".len());

    let data = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("datagram should arrive within 2s")
        .unwrap();
    assert_eq!(data, b"hello-mudp");

    cancel.cancel();
    assert!(listener.await.unwrap().is_ok());

    sender.close();
    receiver.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_listen_returns_promptly_on_cancel() {
    let receiver = Arc::new(
        Receiver::bind(ReceiverConfig::new("127.0.0.1", 19101))
            .await
            .unwrap(),
    );
    let cancel = CancelToken::new();

    let listen_receiver = receiver.clone();
    let listen_cancel = cancel.clone();
    let listener = tokio::spawn(async move {
        listen_receiver.listen(&listen_cancel, |_| {}, 0).await
    });

    // No traffic at all; cancellation alone must stop the loop.
    tokio::time::sleep(Duration::from_millis(50)).await;
    cancel.cancel();

    let result = tokio::time::timeout(Duration::from_secs(1), listener)
        .await
        .expect("listen should return promptly after cancel")
        .unwrap();
    assert!(result.is_ok());

    receiver.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_listen_observes_concurrent_close() {
    let receiver = Arc::new(
        Receiver::bind(ReceiverConfig::new("127.0.0.1", 19102))
            .await
            .unwrap(),
    );
    let cancel = CancelToken::new();

    let listen_receiver = receiver.clone();
    let listen_cancel = cancel.clone();
    let listener = tokio::spawn(async move {
        listen_receiver.listen(&listen_cancel, |_| {}, 0).await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    receiver.close();

    // Bounded by the poll interval plus one in-flight read.
    let result = tokio::time::timeout(Duration::from_secs(2), listener)
        .await
        .expect("listen should observe close within the poll bound")
        .unwrap();
    assert!(result.unwrap_err().is_closed());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_oversize_datagram_is_truncated() {
    let receiver = Arc::new(
        Receiver::bind(ReceiverConfig::new("127.0.0.1", 19103))
            .await
            .unwrap(),
    );
    let cancel = CancelToken::new();

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let listen_receiver = receiver.clone();
    let listen_cancel = cancel.clone();
    let listener = tokio::spawn(async move {
        listen_receiver
            .listen(
                &listen_cancel,
                move |datagram: Datagram| {
                    let _ = tx.send(datagram.data);
                },
                8,
            )
            .await
    });

    let sender = Sender::new().await.unwrap();
    let payload = [0xABu8; 32];
    sender
        .send(&cancel, "127.0.0.1:19103", &payload, Duration::from_secs(1))
        .await
        .unwrap();

    let data = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("datagram should arrive")
        .unwrap();
    // Truncated to exactly the buffer size, with no error raised.
    assert_eq!(data, payload[..8]);

    cancel.cancel();
    assert!(listener.await.unwrap().is_ok());

    sender.close();
    receiver.close();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multiple_datagrams_all_dispatched() {
    let receiver = Arc::new(
        Receiver::bind(ReceiverConfig::new("127.0.0.1", 19104))
            .await
            .unwrap(),
    );
    let cancel = CancelToken::new();

    let count = Arc::new(AtomicUsize::new(0));
    let handler_count = count.clone();
    let listen_receiver = receiver.clone();
    let listen_cancel = cancel.clone();
    let listener = tokio::spawn(async move {
        listen_receiver
            .listen(
                &listen_cancel,
                move |_| {
                    handler_count.fetch_add(1, Ordering::SeqCst);
                },
                0,
            )
            .await
    });

    let sender = Sender::new().await.unwrap();
    for i in 0..5 {
        sender
            .send(
                &cancel,
                "127.0.0.1:19104",
                format!("message-{i}").as_bytes(),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
    }

    for _ in 0..200 {
        if count.load(Ordering::SeqCst) >= 5 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(count.load(Ordering::SeqCst), 5);

    cancel.cancel();
    assert!(listener.await.unwrap().is_ok());

    sender.close();
    receiver.close();
}
