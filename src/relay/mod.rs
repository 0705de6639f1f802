//! The relay core: two TCP endpoints (VM-side server, PX4-side
//! client), each an independent tokio task, cross-wired through
//! `PeerLink` so neither owns the other (per spec.md §9's
//! "relation-by-lookup rather than ownership").

pub mod px4;
pub mod vm;

use crate::config::Config;
use crate::metrics::Metrics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex, Notify};
use tracing::{trace, warn};

/// One endpoint's write-half and `connected` flag, shared so the
/// sibling endpoint can write into it without owning it. The mutex
/// plays the role of spec.md §5's shared-resource mutex for the
/// cross-endpoint write path: whichever side is writing into this
/// link holds the lock spanning the connected-check, the write, and
/// any teardown that write triggers.
#[derive(Default)]
pub struct PeerLink {
    connected: AtomicBool,
    writer: Mutex<Option<OwnedWriteHalf>>,
}

impl PeerLink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub async fn attach(&self, writer: OwnedWriteHalf) {
        let mut guard = self.writer.lock().await;
        *guard = Some(writer);
        self.connected.store(true, Ordering::Release);
    }

    pub async fn detach(&self) {
        let mut guard = self.writer.lock().await;
        *guard = None;
        self.connected.store(false, Ordering::Release);
    }

    /// Write `bytes` into this peer's active handle iff it is
    /// connected; otherwise drop silently. No queueing; this is the
    /// gateway's deliberate backpressure policy (spec.md §5).
    pub async fn write_if_ready(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if !self.is_connected() {
            trace!(len = bytes.len(), "relay: peer not connected, dropping chunk");
            return;
        }
        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return;
        };
        if let Err(e) = writer.write_all(bytes).await {
            warn!("relay: write failed, tearing down link: {}", e);
            *guard = None;
            self.connected.store(false, Ordering::Release);
        }
    }
}

/// Composition root: owns both endpoints' links and wires them
/// together. Bootstraps the VM server, then the PX4 client (deferred
/// until the VM side's first accept), and runs the VM endpoint's
/// accept loop for the lifetime of the process.
pub struct Relay;

impl Relay {
    pub async fn bootstrap(config: &Config, metrics: Metrics) -> anyhow::Result<()> {
        let vm_link = PeerLink::new();
        let px4_link = PeerLink::new();
        let first_accept = Arc::new(Notify::new());

        let vm_endpoint = vm::VmEndpoint::bind(
            &config.vm.bind_addr,
            vm_link.clone(),
            px4_link.clone(),
            first_accept.clone(),
            metrics,
        )
        .await?;

        let px4_endpoint = px4::Px4Endpoint::new(
            config.px4.connect_addr.clone(),
            px4_link,
            vm_link,
            first_accept,
        );

        tokio::spawn(px4_endpoint.run());
        vm_endpoint.run().await;

        Ok(())
    }
}
