//! End-to-end server tests
//!
//! These run the real listener, connection handler, dispatcher, and store
//! against live TCP connections on ephemeral ports, with the gatekeeper
//! either faked in-process behind the [`Approver`] seam or served by a real
//! one-shot TCP peer.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::client::Approver;
use crate::config::Config;
use crate::protocol::ApprovalVerdict;
use crate::server::Server;
use crate::storage::DirectoryStore;

struct ApproveAll;

#[async_trait]
impl Approver for ApproveAll {
    async fn request_approval(&self, _raw_request: &str) -> ApprovalVerdict {
        ApprovalVerdict::Approved
    }
}

/// Denies everything and counts how often it was consulted.
struct DenyAll {
    hits: AtomicUsize,
}

impl DenyAll {
    fn new() -> Arc<Self> {
        Arc::new(Self { hits: AtomicUsize::new(0) })
    }
}

#[async_trait]
impl Approver for DenyAll {
    async fn request_approval(&self, _raw_request: &str) -> ApprovalVerdict {
        self.hits.fetch_add(1, Ordering::SeqCst);
        ApprovalVerdict::Denied("НИЛЬЗЯ РКСОК/1.0\r\nПотому что.\r\n\r\n".into())
    }
}

struct TestServer {
    addr: SocketAddr,
    store: Arc<DirectoryStore>,
    _tmp: tempfile::TempDir,
}

async fn spawn_server(approver: Arc<dyn Approver>) -> TestServer {
    let tmp = tempfile::tempdir().unwrap();
    let config = Config {
        store_path: tmp.path().join("name_phone.json"),
        ..Config::default()
    };
    let server = Server::builder()
        .with_config(config)
        .with_approver(approver)
        .build();
    let store = server.store();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });
    TestServer { addr, store, _tmp: tmp }
}

/// One full exchange: connect, send, read the response to EOF.
async fn roundtrip(addr: SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

#[tokio::test]
async fn get_on_empty_store_is_not_found() {
    let server = spawn_server(Arc::new(ApproveAll)).await;
    let response = roundtrip(server.addr, "ОТДОВАЙ ИВАН РКСОК/1.0\r\n\r\n").await;
    assert_eq!(response, "НИНАШОЛ РКСОК/1.0\r\n\r\n");
}

#[tokio::test]
async fn write_then_get_transcript() {
    let server = spawn_server(Arc::new(ApproveAll)).await;
    let ack = roundtrip(server.addr, "ЗОПИШИ ИВАН РКСОК/1.0\r\n88005553535\r\n\r\n").await;
    assert_eq!(ack, "НОРМАЛДЫКС РКСОК/1.0\r\n\r\n");
    let response = roundtrip(server.addr, "ОТДОВАЙ ИВАН РКСОК/1.0\r\n\r\n").await;
    assert_eq!(response, "НОРМАЛДЫКС РКСОК/1.0\r\n88005553535\r\n\r\n");
}

#[tokio::test]
async fn second_write_appends_to_the_list() {
    let server = spawn_server(Arc::new(ApproveAll)).await;
    roundtrip(server.addr, "ЗОПИШИ ИВАН РКСОК/1.0\r\n1\r\n2\r\n\r\n").await;
    roundtrip(server.addr, "ЗОПИШИ ИВАН РКСОК/1.0\r\n3\r\n\r\n").await;
    let response = roundtrip(server.addr, "ОТДОВАЙ ИВАН РКСОК/1.0\r\n\r\n").await;
    assert_eq!(response, "НОРМАЛДЫКС РКСОК/1.0\r\n1\r\n2\r\n3\r\n\r\n");
}

#[tokio::test]
async fn delete_then_delete_again() {
    let server = spawn_server(Arc::new(ApproveAll)).await;
    roundtrip(server.addr, "ЗОПИШИ ИВАН РКСОК/1.0\r\n1\r\n\r\n").await;
    let first = roundtrip(server.addr, "УДОЛИ ИВАН РКСОК/1.0\r\n\r\n").await;
    let second = roundtrip(server.addr, "УДОЛИ ИВАН РКСОК/1.0\r\n\r\n").await;
    assert_eq!(first, "НОРМАЛДЫКС РКСОК/1.0\r\n\r\n");
    assert_eq!(second, "НИНАШОЛ РКСОК/1.0\r\n\r\n");
}

#[tokio::test]
async fn malformed_request_gets_unrecognized() {
    let server = spawn_server(Arc::new(ApproveAll)).await;
    // Known method, but no protocol marker
    let response = roundtrip(server.addr, "ОТДОВАЙ ИВАН\r\n\r\n").await;
    assert_eq!(response, "НИПОНЯЛ РКСОК/1.0\r\n\r\n");
}

#[tokio::test]
async fn foreign_protocol_gets_unrecognized() {
    let server = spawn_server(Arc::new(ApproveAll)).await;
    let response = roundtrip(server.addr, "GET / HTTP/1.1\r\nHost: x\r\n\r\n").await;
    assert_eq!(response, "НИПОНЯЛ РКСОК/1.0\r\n\r\n");
}

#[tokio::test]
async fn fragmented_send_parses_like_a_single_write() {
    let server = spawn_server(Arc::new(ApproveAll)).await;
    let request = "ЗОПИШИ ИВАН РКСОК/1.0\r\n88005553535\r\n\r\n";
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    for byte in request.as_bytes() {
        stream.write_all(&[*byte]).await.unwrap();
        stream.flush().await.unwrap();
    }
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert_eq!(String::from_utf8(response).unwrap(), "НОРМАЛДЫКС РКСОК/1.0\r\n\r\n");
}

#[tokio::test]
async fn denied_request_never_reaches_the_store() {
    let deny = DenyAll::new();
    let server = spawn_server(deny.clone()).await;
    let response = roundtrip(server.addr, "ЗОПИШИ ИВАН РКСОК/1.0\r\n1\r\n\r\n").await;
    assert_eq!(response, "НИЛЬЗЯ РКСОК/1.0\r\nПотому что.\r\n\r\n");
    assert_eq!(deny.hits.load(Ordering::SeqCst), 1);
    // No mutation happened: the store file was never created
    assert!(!server.store.path().exists());
}

#[tokio::test]
async fn malformed_request_never_consults_the_gatekeeper() {
    let deny = DenyAll::new();
    let server = spawn_server(deny.clone()).await;
    roundtrip(server.addr, "ОТДОВАЙ ИВАН\r\n\r\n").await;
    assert_eq!(deny.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn silent_disconnect_gets_no_response() {
    let server = spawn_server(Arc::new(ApproveAll)).await;
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.shutdown().await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    assert!(response.is_empty());
}

#[tokio::test]
async fn concurrent_writes_for_distinct_names_all_land() {
    let server = spawn_server(Arc::new(ApproveAll)).await;
    let mut tasks = Vec::new();
    for i in 0..10 {
        let addr = server.addr;
        tasks.push(tokio::spawn(async move {
            roundtrip(addr, &format!("ЗОПИШИ ИМЯ{i} РКСОК/1.0\r\n{i}\r\n\r\n")).await
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), "НОРМАЛДЫКС РКСОК/1.0\r\n\r\n");
    }
    for i in 0..10 {
        let response = roundtrip(server.addr, &format!("ОТДОВАЙ ИМЯ{i} РКСОК/1.0\r\n\r\n")).await;
        assert_eq!(response, format!("НОРМАЛДЫКС РКСОК/1.0\r\n{i}\r\n\r\n"));
    }
}

#[tokio::test]
async fn unreachable_gatekeeper_denies_with_a_synthesized_message() {
    // Default approver pointed at a dead endpoint
    let tmp = tempfile::tempdir().unwrap();
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);
    let config = Config {
        store_path: tmp.path().join("name_phone.json"),
        gatekeeper_addr: dead_addr.to_string(),
        approval_timeout_secs: 1,
        ..Config::default()
    };
    let server = Server::builder().with_config(config).build();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    let response = roundtrip(addr, "ОТДОВАЙ ИВАН РКСОК/1.0\r\n\r\n").await;
    assert!(response.starts_with("НИЛЬЗЯ РКСОК/1.0\r\n"));
    assert!(response.ends_with("\r\n\r\n"));
}

#[tokio::test]
async fn two_hop_flow_with_a_real_gatekeeper() {
    // A one-shot-per-connection gatekeeper that approves everything
    let gatekeeper = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let gatekeeper_addr = gatekeeper.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut stream, _) = match gatekeeper.accept().await {
                Ok(accepted) => accepted,
                Err(_) => break,
            };
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all("МОЖНА РКСОК/1.0\r\n\r\n".as_bytes()).await;
            });
        }
    });

    let tmp = tempfile::tempdir().unwrap();
    let config = Config {
        store_path: tmp.path().join("name_phone.json"),
        gatekeeper_addr: gatekeeper_addr.to_string(),
        ..Config::default()
    };
    let server = Server::builder().with_config(config).build();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve(listener).await;
    });

    let ack = roundtrip(addr, "ЗОПИШИ ИВАН РКСОК/1.0\r\n88005553535\r\n\r\n").await;
    assert_eq!(ack, "НОРМАЛДЫКС РКСОК/1.0\r\n\r\n");
    let response = roundtrip(addr, "ОТДОВАЙ ИВАН РКСОК/1.0\r\n\r\n").await;
    assert_eq!(response, "НОРМАЛДЫКС РКСОК/1.0\r\n88005553535\r\n\r\n");
}
