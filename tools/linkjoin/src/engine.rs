use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use mlt_rs_buffers::reorder::ring::ReorderRing;
use mlt_rs_core::traits::queue::reorder::{ReorderQueueInput, ReorderQueueOutput};
use mlt_rs_log::Logger;

use crate::config::Config;
use crate::packet::Datagram;

const METRICS_AFTER: Duration = Duration::from_millis(500);

/// Read datagrams from one link socket and push them to the join loop.
async fn run_link(link: usize, socket: UdpSocket, tx: mpsc::Sender<Datagram>) {
    let mut buf = vec![0u8; 2048];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, _)) => match Datagram::parse(link, &buf[..len]) {
                Some(datagram) => {
                    if tx.send(datagram).await.is_err() {
                        break;
                    }
                }
                None => tracing::warn!("link {}: runt datagram ({} bytes)", link, len),
            },
            Err(e) => {
                tracing::error!("link {}: recv error: {}", link, e);
                break;
            }
        }
    }
}

struct JoinLoop {
    ring: ReorderRing<u64, Datagram>,
    forward: UdpSocket,
    drain_budget: usize,
    stall: Duration,
    last_progress: Instant,
    bytes_in: u64,
    bytes_out: u64,
}

impl JoinLoop {
    async fn forward_all(&mut self, packets: Vec<Datagram>) {
        for packet in packets {
            match self.forward.send(&packet.payload).await {
                Ok(sent) => self.bytes_out += sent as u64,
                Err(e) => tracing::warn!("forward error for packet {}: {}", packet.sequence, e),
            }
        }
    }

    async fn on_datagram(&mut self, datagram: Datagram) {
        self.bytes_in += datagram.payload.len() as u64;
        if let Err(e) = self.ring.insert(datagram) {
            tracing::debug!("insert rejected: {}", e);
        }
        let ready = self.ring.drain(self.drain_budget);
        if !ready.is_empty() {
            self.last_progress = Instant::now();
        }
        self.forward_all(ready).await;
    }

    /// The head gap outlived the stall bound; give up on it.
    async fn on_stall_tick(&mut self) {
        if self.ring.is_empty() || self.last_progress.elapsed() < self.stall {
            return;
        }
        let report = self.ring.force_drain(self.drain_budget);
        tracing::debug!(
            "stall recovery: {} packets, {} holes abandoned",
            report.packets.len(),
            report.holes
        );
        if !report.packets.is_empty() {
            self.last_progress = Instant::now();
        }
        self.forward_all(report.packets).await;
    }

    fn report_metrics(&mut self, since: Duration) {
        let metrics = self.ring.metrics();
        tracing::info!(
            "reorder metrics: [ok: {}] [stale: {}] [future: {}] [dup: {}] [lost: {}] [in: {:.1}kbit/s] [out: {:.1}kbit/s]",
            metrics.delivered,
            metrics.stale,
            metrics.future,
            metrics.duplicate,
            metrics.holes,
            (self.bytes_in * 8) as f64 / since.as_secs_f64() / 1000f64,
            (self.bytes_out * 8) as f64 / since.as_secs_f64() / 1000f64,
        );
        self.bytes_in = 0;
        self.bytes_out = 0;
    }
}

pub async fn run(config: Config, log: Logger) -> Result<()> {
    let forward = UdpSocket::bind("0.0.0.0:0")
        .await
        .context("failed to bind forward socket")?;
    forward
        .connect(config.forward)
        .await
        .with_context(|| format!("failed to connect forward socket to {}", config.forward))?;

    let (tx, mut rx) = mpsc::channel(256);
    for (link, link_config) in config.links.iter().enumerate() {
        let socket = UdpSocket::bind(link_config.listen)
            .await
            .with_context(|| format!("failed to bind link {} on {}", link, link_config.listen))?;
        tracing::info!("link {} listening on {}", link, link_config.listen);
        tokio::spawn(run_link(link, socket, tx.clone()));
    }
    drop(tx);

    let mut join = JoinLoop {
        ring: ReorderRing::new(config.capacity, log),
        forward,
        drain_budget: config.drain_budget,
        stall: Duration::from_millis(config.stall_ms),
        last_progress: Instant::now(),
        bytes_in: 0,
        bytes_out: 0,
    };

    let mut stall_timer = tokio::time::interval(join.stall);
    // skip the immediate first tick, the rates need a full period
    let mut metrics_timer =
        tokio::time::interval_at(tokio::time::Instant::now() + METRICS_AFTER, METRICS_AFTER);
    let mut metrics_last = Instant::now();

    loop {
        tokio::select! {
            datagram = rx.recv() => {
                // all link tasks gone
                let Some(datagram) = datagram else { break };
                join.on_datagram(datagram).await;
            }
            _ = stall_timer.tick() => {
                join.on_stall_tick().await;
            }
            _ = metrics_timer.tick() => {
                join.report_metrics(metrics_last.elapsed());
                metrics_last = Instant::now();
            }
        }
    }
    Ok(())
}
