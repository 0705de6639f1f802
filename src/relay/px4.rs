//! PX4-side client endpoint: `Connecting`/`Connected` per spec.md
//! §4.5. Connects once the VM side has accepted its first GCS peer;
//! traffic in this direction (PX4 → VM) is relayed unfiltered.

use super::PeerLink;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tracing::{info, warn};

const INITIAL_CONNECT_RETRY: Duration = Duration::from_secs(5);

pub struct Px4Endpoint {
    connect_addr: String,
    /// This endpoint's own write-half, fed filtered commands by the VM
    /// endpoint.
    link: Arc<PeerLink>,
    /// The VM endpoint's write-half, fed unfiltered telemetry by this
    /// endpoint.
    vm_link: Arc<PeerLink>,
    first_accept: Arc<Notify>,
}

impl Px4Endpoint {
    pub fn new(
        connect_addr: String,
        link: Arc<PeerLink>,
        vm_link: Arc<PeerLink>,
        first_accept: Arc<Notify>,
    ) -> Self {
        Self {
            connect_addr,
            link,
            vm_link,
            first_accept,
        }
    }

    /// `Connecting`: wait for the VM side's first accept, then connect,
    /// retrying on failure. Once `Connected` is lost there is no
    /// automatic reconnect; restart is operator-driven, per
    /// spec.md §4.5.
    pub async fn run(self) {
        self.first_accept.notified().await;

        let stream = loop {
            match TcpStream::connect(&self.connect_addr).await {
                Ok(stream) => break stream,
                Err(e) => {
                    warn!(
                        "PX4 endpoint: connect to {} failed: {}, retrying in {}s",
                        self.connect_addr,
                        e,
                        INITIAL_CONNECT_RETRY.as_secs()
                    );
                    tokio::time::sleep(INITIAL_CONNECT_RETRY).await;
                }
            }
        };
        info!("PX4 endpoint: connected to {}", self.connect_addr);

        let (mut read_half, write_half) = stream.into_split();
        self.link.attach(write_half).await;

        let mut buf = [0u8; 4096];
        loop {
            match read_half.read(&mut buf).await {
                Ok(0) => {
                    info!("PX4 endpoint: connection closed (FIN)");
                    break;
                }
                Ok(n) => self.vm_link.write_if_ready(&buf[..n]).await,
                Err(e) => {
                    warn!("PX4 endpoint: read error: {}", e);
                    break;
                }
            }
        }

        self.link.detach().await;
        warn!("PX4 endpoint: link lost; no automatic reconnect, restart is operator-driven");
    }
}
