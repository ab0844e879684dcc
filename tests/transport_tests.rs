//! Transport Tests
//!
//! Tests verify:
//! - Blocking and callback call styles against a live server
//! - Exactly-once outcome delivery, including timeout and cancel
//! - Timeout bounds
//! - Reply thread-affinity pinning

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::{Duration, Instant};

use bytes::Bytes;
use courierkv::client::{OP_KV_READ, OP_PING};
use courierkv::wire::MAX_PAYLOAD_SIZE;
use courierkv::{Endpoint, KvServer, RpcError, Transport, TransportConfig};
use crossbeam::channel::bounded;

fn start_server() -> Endpoint {
    KvServer::bind("127.0.0.1:0").unwrap().start().unwrap()
}

fn transport() -> Transport {
    Transport::new(TransportConfig::default()).unwrap()
}

fn start_slow_server(delay: Duration) -> Endpoint {
    KvServer::bind("127.0.0.1:0")
        .unwrap()
        .reply_delay(delay)
        .start()
        .unwrap()
}

// =============================================================================
// Basic Call Tests
// =============================================================================

#[test]
fn test_call_sync_ping() {
    let endpoint = start_server();
    let transport = transport();

    let reply = transport
        .call_sync(endpoint, OP_PING, Bytes::new(), &Default::default())
        .unwrap();
    assert!(reply.is_empty());
}

#[test]
fn test_call_async_callback_fires_once() {
    let endpoint = start_server();
    let transport = transport();

    let count = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = bounded(1);

    let counted = Arc::clone(&count);
    transport
        .call(endpoint, OP_PING, Bytes::new(), &Default::default(), move |outcome| {
            counted.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(outcome);
        })
        .unwrap();

    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(outcome.is_ok());

    // Give a duplicate delivery every chance to show up
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_call_returns_before_completion() {
    let endpoint = start_slow_server(Duration::from_millis(300));
    let transport = transport();

    let (tx, rx) = bounded(1);
    let started = Instant::now();
    let handle = transport
        .call(endpoint, OP_PING, Bytes::new(), &Default::default(), move |outcome| {
            let _ = tx.send(outcome);
        })
        .unwrap();

    // The async form must hand the request off without blocking
    assert!(started.elapsed() < Duration::from_millis(200));
    assert!(!handle.is_finished());

    rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
}

#[test]
fn test_remote_error_surfaced() {
    let endpoint = start_server();
    let transport = transport();

    let key = Bytes::from(bincode::serialize("missing-key").unwrap());
    let err = transport
        .call_sync(endpoint, OP_KV_READ, key, &Default::default())
        .unwrap_err();

    match err {
        RpcError::Remote(message) => assert!(message.contains("key not found")),
        other => panic!("Expected remote error, got {:?}", other),
    }
}

#[test]
fn test_oversized_payload_rejected_client_side() {
    let endpoint = start_server();
    let transport = transport();

    let payload = Bytes::from(vec![0u8; MAX_PAYLOAD_SIZE as usize + 1]);
    let err = transport
        .call_sync(endpoint, OP_PING, payload, &Default::default())
        .unwrap_err();

    match err {
        RpcError::Protocol(message) => assert!(message.contains("Payload too large")),
        other => panic!("Expected protocol error, got {:?}", other),
    }

    // The rejection happened before the wire; the connection is not
    // poisoned and the next call succeeds
    transport
        .call_sync(endpoint, OP_PING, Bytes::new(), &Default::default())
        .unwrap();
}

#[test]
fn test_connect_failure_is_the_single_outcome() {
    // Bind then drop to get a port with nothing listening
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = Endpoint::from(listener.local_addr().unwrap());
    drop(listener);

    let transport = Transport::new(
        TransportConfig::builder()
            .connect_timeout(Some(Duration::from_millis(500)))
            .build(),
    )
    .unwrap();

    let result = transport.call(
        endpoint,
        OP_PING,
        Bytes::new(),
        &Default::default(),
        move |_| panic!("callback must not fire when the call was never issued"),
    );
    assert!(result.is_err());

    std::thread::sleep(Duration::from_millis(100));
}

#[test]
fn test_reconnect_after_disconnect() {
    let endpoint = start_server();
    let transport = transport();

    transport
        .call_sync(endpoint, OP_PING, Bytes::new(), &Default::default())
        .unwrap();

    transport.disconnect(endpoint);

    // The next call dials a fresh connection transparently
    transport
        .call_sync(endpoint, OP_PING, Bytes::new(), &Default::default())
        .unwrap();
}

// =============================================================================
// Timeout Tests
// =============================================================================

#[test]
fn test_timeout_resolves_within_bounds() {
    let endpoint = start_slow_server(Duration::from_secs(2));
    let transport = transport();

    let opts = courierkv::CallOptions::default().timeout(Duration::from_millis(100));

    let started = Instant::now();
    let err = transport
        .call_sync(endpoint, OP_PING, Bytes::new(), &opts)
        .unwrap_err();
    let elapsed = started.elapsed();

    assert!(matches!(err, RpcError::Timeout), "got {:?}", err);
    assert!(elapsed >= Duration::from_millis(95), "resolved too early: {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(1), "resolved too late: {:?}", elapsed);
}

#[test]
fn test_timeout_callback_fires_once_despite_late_reply() {
    let endpoint = start_slow_server(Duration::from_millis(300));
    let transport = transport();

    let count = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = bounded(1);

    let counted = Arc::clone(&count);
    let opts = courierkv::CallOptions::default().timeout(Duration::from_millis(50));
    transport
        .call(endpoint, OP_PING, Bytes::new(), &opts, move |outcome| {
            counted.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(outcome);
        })
        .unwrap();

    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(outcome, Err(RpcError::Timeout)));

    // Wait past the server's delayed reply; it must not re-deliver
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

// =============================================================================
// Cancellation Tests
// =============================================================================

#[test]
fn test_cancel_delivers_single_outcome() {
    let endpoint = start_slow_server(Duration::from_millis(300));
    let transport = transport();

    let count = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = bounded(1);

    let counted = Arc::clone(&count);
    let handle = transport
        .call(endpoint, OP_PING, Bytes::new(), &Default::default(), move |outcome| {
            counted.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(outcome);
        })
        .unwrap();

    assert!(handle.cancel());

    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(outcome, Err(RpcError::Cancelled)));

    // Late reply from the server must find the call already finished
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cancel_after_completion_is_noop() {
    let endpoint = start_server();
    let transport = transport();

    let (tx, rx) = bounded(1);
    let handle = transport
        .call(endpoint, OP_PING, Bytes::new(), &Default::default(), move |outcome| {
            let _ = tx.send(outcome);
        })
        .unwrap();

    rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert!(handle.is_finished());
    assert!(!handle.cancel());
}

// =============================================================================
// Thread-Affinity Tests
// =============================================================================

#[test]
fn test_reply_thread_hint_pins_delivery() {
    let endpoint = start_server();
    let transport = transport();

    let (tx, rx) = bounded::<ThreadId>(4);
    let opts = courierkv::CallOptions::default().reply_thread_hash(3);

    for _ in 0..4 {
        let tx = tx.clone();
        transport
            .call(endpoint, OP_PING, Bytes::new(), &opts, move |_| {
                let _ = tx.send(std::thread::current().id());
            })
            .unwrap();
    }

    let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    for _ in 0..3 {
        let next = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(next, first, "hinted completions landed on different workers");
    }
}

#[test]
fn test_thread_hash_serializes_issuance() {
    // An issuance hint routes the socket writes through one pinned worker;
    // every hinted call must still complete normally
    let endpoint = start_server();
    let transport = transport();

    let (tx, rx) = bounded(8);
    let opts = courierkv::CallOptions::default().thread_hash(2);

    for _ in 0..8 {
        let tx = tx.clone();
        transport
            .call(endpoint, OP_PING, Bytes::new(), &opts, move |outcome| {
                let _ = tx.send(outcome);
            })
            .unwrap();
    }

    for _ in 0..8 {
        rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    }
}

#[test]
fn test_hinted_issuance_failure_delivers_single_outcome() {
    // Peer accepts the connection and closes it immediately; whichever
    // completer wins (the hinted write's failure path, the reader teardown
    // drain, or the deadline) must deliver exactly one outcome
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let endpoint = Endpoint::from(listener.local_addr().unwrap());
    std::thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            drop(stream);
        }
    });

    let transport = transport();
    let count = Arc::new(AtomicUsize::new(0));
    let (tx, rx) = bounded(1);

    let counted = Arc::clone(&count);
    let opts = courierkv::CallOptions::default()
        .thread_hash(1)
        .timeout(Duration::from_secs(2));
    transport
        .call(endpoint, OP_PING, Bytes::new(), &opts, move |outcome| {
            counted.fetch_add(1, Ordering::SeqCst);
            let _ = tx.send(outcome);
        })
        .unwrap();

    let outcome = rx.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(outcome.is_err());

    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(count.load(Ordering::SeqCst), 1);
}
