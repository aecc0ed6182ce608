//! Connection handler
//!
//! One handler per accepted connection, holding no state across
//! connections. The flow is a strict sequence: frame one message, validate
//! it, clear it with the gatekeeper, dispatch it, write the response, close.
//! Every failure class is recovered here; nothing escapes to the listener.

use std::net::SocketAddr;
use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::codec::FramedRead;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::client::Approver;
use crate::config::Config;
use crate::protocol::{ApprovalVerdict, MessageCodec, Response, parse};
use crate::server::dispatch::dispatch;
use crate::storage::DirectoryStore;

/// Serve one connection to completion. Never returns an error: a client
/// only ever sees a well-formed protocol response or silence on disconnect.
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    store: Arc<DirectoryStore>,
    approver: Arc<dyn Approver>,
    config: Arc<Config>,
) {
    let conn_id = Uuid::new_v4();
    debug!(%conn_id, %peer, "connection accepted");

    let (read_half, mut write_half) = stream.into_split();
    let codec = MessageCodec::new(config.encoding, config.max_message_bytes);
    let mut framed = FramedRead::new(read_half, codec);

    let raw = match tokio::time::timeout(config.read_timeout(), framed.next()).await {
        Err(_) => {
            debug!(%conn_id, "idle timeout before a complete message, closing");
            return;
        }
        Ok(None) => {
            // Peer closed without sending anything; no response attempted
            debug!(%conn_id, "peer disconnected silently");
            return;
        }
        Ok(Some(Err(e))) => {
            if e.is_client_fault() {
                debug!(%conn_id, error = %e, "unreadable message");
            } else {
                warn!(%conn_id, error = %e, "read failed");
            }
            write_response(&mut write_half, &Response::Unrecognized, &config, conn_id).await;
            return;
        }
        Ok(Some(Ok(raw))) => raw,
    };

    let response = process_message(&raw, &store, approver.as_ref(), &config, conn_id).await;
    write_response(&mut write_half, &response, &config, conn_id).await;
}

/// Validate → approve → dispatch. Returns the response to serialize; every
/// failure class maps to a protocol response here.
async fn process_message(
    raw: &str,
    store: &DirectoryStore,
    approver: &dyn Approver,
    config: &Config,
    conn_id: Uuid,
) -> Response {
    let request = match parse(raw, config.max_name_len) {
        Ok(request) => request,
        Err(e) => {
            debug!(%conn_id, error = %e, "rejected request");
            return Response::Unrecognized;
        }
    };
    info!(%conn_id, method = %request.method(), name = %request.name(), "validated request");

    // The gatekeeper sees the client's exact bytes, not the parsed form
    match approver.request_approval(raw).await {
        ApprovalVerdict::Denied(text) => {
            info!(%conn_id, "request denied by gatekeeper");
            Response::Forwarded(text)
        }
        ApprovalVerdict::Approved => match dispatch(&request, store).await {
            Ok(response) => response,
            Err(e) => {
                error!(%conn_id, error = %e, "dispatch failed");
                Response::Unrecognized
            }
        },
    }
}

async fn write_response(
    write_half: &mut tokio::net::tcp::OwnedWriteHalf,
    response: &Response,
    config: &Config,
    conn_id: Uuid,
) {
    let bytes = config.encoding.encode(&response.to_wire());
    if let Err(e) = write_half.write_all(&bytes).await {
        debug!(%conn_id, error = %e, "could not write response");
        return;
    }
    let _ = write_half.shutdown().await;
    debug!(%conn_id, "response sent, closing");
}
