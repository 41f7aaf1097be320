use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Answers whether outbound requests have a chance of succeeding.
#[async_trait]
pub trait Connectivity: Send + Sync {
    async fn is_connected(&self) -> bool;
}

/// Probes connectivity by opening a TCP connection to a fixed address.
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Connectivity for TcpProbe {
    async fn is_connected(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "Connectivity probe failed");
                false
            }
            Err(_) => {
                debug!(addr = %self.addr, "Connectivity probe timed out");
                false
            }
        }
    }
}

/// Fixed connectivity answer that can be flipped at runtime.
#[derive(Debug)]
pub struct StaticConnectivity(AtomicBool);

impl StaticConnectivity {
    pub fn new(connected: bool) -> Self {
        Self(AtomicBool::new(connected))
    }

    pub fn set(&self, connected: bool) {
        self.0.store(connected, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connectivity for StaticConnectivity {
    async fn is_connected(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
