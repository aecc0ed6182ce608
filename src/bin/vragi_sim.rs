//! Gatekeeper simulator
//!
//! Stands in for the external "vragi-vezde" approval service during
//! development: accepts one approval request per connection and answers
//! МОЖНА or НИЛЬЗЯ at a configurable rate.

use anyhow::Context;
use clap::Parser;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "vragi-sim", about = "Random-verdict gatekeeper simulator")]
struct Args {
    /// Listen address
    #[arg(long, default_value = "127.0.0.1:5000")]
    listen: String,

    /// Probability of a denial, between 0 and 1
    #[arg(long, default_value_t = 0.5)]
    deny_rate: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let deny_rate = args.deny_rate.clamp(0.0, 1.0);
    let listener = TcpListener::bind(&args.listen)
        .await
        .with_context(|| format!("cannot bind {}", args.listen))?;
    info!(listen = %args.listen, deny_rate, "gatekeeper simulator up");

    loop {
        let (mut stream, peer) = listener.accept().await.context("accept failed")?;
        tokio::spawn(async move {
            let mut buf = vec![0u8; 1024];
            let read = match stream.read(&mut buf).await {
                Ok(read) => read,
                Err(_) => return,
            };
            debug!(%peer, bytes = read, "approval request received");
            let deny = rand::thread_rng().gen_bool(deny_rate);
            let reply = if deny {
                "НИЛЬЗЯ РКСОК/1.0\r\nКто ещё такой? Он тебе зачем?\r\n\r\n"
            } else {
                "МОЖНА РКСОК/1.0\r\n\r\n"
            };
            let _ = stream.write_all(reply.as_bytes()).await;
            debug!(%peer, deny, "verdict sent");
        });
    }
}
