//! Pool Lifecycle Example
//!
//! A TCP "pool" whose backend comes up a few seconds after the service
//! starts. The pool is constructed eagerly, activated by the App's OnStart
//! hook with retries, and released by OnStop.
//!
//! Run with: cargo run --example pool_lifecycle

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use mooring::{App, BoxError, Context, Hook, Lifecycle, ManagedResource, Resource, RetryPolicy};
use tokio::net::{TcpListener, TcpStream};

#[derive(Debug)]
struct TcpPool {
    addr: SocketAddr,
}

#[derive(Debug)]
enum PoolError {
    Config(String),
    Io(io::Error),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PoolError::Config(msg) => write!(f, "{}", msg),
            PoolError::Io(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for PoolError {}

impl Resource for TcpPool {
    const NAME: &'static str = "tcp-pool";

    type Config = SocketAddr;
    type Error = PoolError;

    fn parse_config(raw: &str) -> Result<SocketAddr, PoolError> {
        let addr = raw
            .strip_prefix("tcp://")
            .ok_or_else(|| PoolError::Config(format!("expected tcp:// in {:?}", raw)))?;
        addr.parse()
            .map_err(|e| PoolError::Config(format!("bad address {:?}: {}", addr, e)))
    }

    fn construct(addr: SocketAddr) -> Result<Self, PoolError> {
        Ok(TcpPool { addr })
    }

    async fn probe(&self, ctx: &Context) -> Result<(), PoolError> {
        match ctx.run(TcpStream::connect(self.addr)).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(PoolError::Io(e)),
            Err(done) => Err(PoolError::Io(io::Error::other(done))),
        }
    }

    async fn release(&self, _ctx: &Context) -> Result<(), PoolError> {
        tracing::info!(addr = %self.addr, "closing connections");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Reserve a port, then free it so the first probes are refused.
    let addr = TcpListener::bind("127.0.0.1:0").await?.local_addr()?;

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        match TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!(%addr, "backend is up");
                while let Ok((_socket, _)) = listener.accept().await {}
            }
            Err(e) => tracing::error!(%addr, error = %e, "backend failed to bind"),
        }
    });

    let mut app = App::new();

    // Typos are caught before anything starts.
    if let Err(e) = ManagedResource::<TcpPool>::provide(&mut app, "tpc://127.0.0.1:1") {
        tracing::warn!(error = %e, "rejected configuration");
    }

    let pool = ManagedResource::<TcpPool>::open(&format!("tcp://{}", addr))?
        .with_policy(RetryPolicy::new(5, Duration::from_secs(1)))
        .register(&mut app)
        .handle();

    app.append(Hook::new("server").on_start(move |_ctx| async move {
        tracing::info!(backend = %pool.addr, "serving requests");
        Ok::<_, BoxError>(())
    }));

    app.run_until(tokio::time::sleep(Duration::from_secs(1))).await?;
    Ok(())
}
