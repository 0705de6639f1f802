//! VM-side server endpoint: `Listening`/`Connected` per spec.md §4.5.
//! Accepts one GCS at a time; the VM-bound path through this endpoint
//! is filtered before being handed to the PX4 link.

use super::PeerLink;
use crate::filter::FilterPipeline;
use crate::metrics::Metrics;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tracing::{error, info, warn};

pub struct VmEndpoint {
    listener: TcpListener,
    /// This endpoint's own write-half, fed unfiltered telemetry by the
    /// PX4 endpoint.
    link: Arc<PeerLink>,
    /// The PX4 endpoint's write-half, fed filtered commands by this
    /// endpoint.
    px4_link: Arc<PeerLink>,
    /// Fired once, on the first successful accept, to start the PX4
    /// client's initial connect (see relay module docs and
    /// DESIGN.md for why this doesn't re-fire on GCS reconnects).
    first_accept: Arc<Notify>,
    /// The filter pipeline's parser state is a long-lived singleton,
    /// owned here, across GCS reconnects, not reset per connection.
    pipeline: FilterPipeline,
}

impl VmEndpoint {
    pub async fn bind(
        addr: &str,
        link: Arc<PeerLink>,
        px4_link: Arc<PeerLink>,
        first_accept: Arc<Notify>,
        metrics: Metrics,
    ) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!("VM endpoint listening on {}", addr);
        Ok(Self {
            listener,
            link,
            px4_link,
            first_accept,
            pipeline: FilterPipeline::new(metrics),
        })
    }

    #[cfg(test)]
    pub fn local_addr(&self) -> std::net::SocketAddr {
        self.listener.local_addr().unwrap()
    }

    /// Runs forever: accept a GCS (`Listening` → `Connected`), serve it
    /// to completion, then return to `Listening`.
    pub async fn run(mut self) {
        let mut triggered = false;

        loop {
            let (stream, peer_addr) = match self.listener.accept().await {
                Ok(pair) => pair,
                Err(e) => {
                    // Transient accept failure: re-arm by looping, same
                    // as spec.md §4.5's ACCEPT == TRY_AGAIN case.
                    error!("VM endpoint: accept failed: {}", e);
                    continue;
                }
            };
            info!("VM endpoint: accepted GCS connection from {}", peer_addr);

            if !triggered {
                triggered = true;
                self.first_accept.notify_one();
            }

            self.serve(stream).await;
            info!("VM endpoint: GCS disconnected, returning to Listening");
        }
    }

    async fn serve(&mut self, stream: TcpStream) {
        let (mut read_half, write_half) = stream.into_split();
        self.link.attach(write_half).await;

        let mut read_buf = [0u8; 4096];
        let mut out = Vec::with_capacity(4096);

        loop {
            match read_half.read(&mut read_buf).await {
                Ok(0) => break,
                Ok(n) => {
                    out.clear();
                    self.pipeline.filter(&read_buf[..n], &mut out);
                    self.px4_link.write_if_ready(&out).await;
                }
                Err(e) => {
                    warn!("VM endpoint: read error: {}", e);
                    break;
                }
            }
        }

        self.link.detach().await;
    }
}
