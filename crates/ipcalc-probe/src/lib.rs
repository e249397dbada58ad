//! Reachability probes and bounded liveness sweeps
//!
//! The arithmetic core never touches the network; this crate holds the I/O
//! boundary. A [`Probe`] is an injected "is this address reachable"
//! capability, and a [`Sweeper`] fans a probe out over a network's address
//! list with a bounded worker pool and a short per-probe timeout.
//!
//! Result order from a sweep is unspecified; the core's enumeration order
//! stays ascending regardless of how probing is parallelized, so callers
//! that need ordered output sort the collected subset.
//!
//! # Examples
//!
//! ```no_run
//! use ipcalc_core::Address;
//! use ipcalc_net::Network;
//! use ipcalc_probe::{PingProbe, Sweeper};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let network = Network::new(
//!     Address::parse("192.168.0.0")?,
//!     Address::parse("255.255.255.0")?,
//! )?;
//!
//! let sweeper = Sweeper::new(PingProbe::default()).with_workers(15);
//! let alive = sweeper.find_all(&network).await;
//! println!("{} hosts responded", alive.len());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::net::SocketAddr;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use ipcalc_core::{Address, Port};
use ipcalc_net::Network;
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::sync::{Mutex, Semaphore};
use tokio::time::timeout;
use tracing::{debug, info};

/// Default per-probe timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(200);

/// Default worker pool size for a sweep.
pub const DEFAULT_WORKERS: usize = 15;

/// An injected reachability capability.
///
/// Implementations answer "does this address respond" and nothing more; any
/// retry or escalation policy belongs to the caller.
pub trait Probe: Send + Sync + 'static {
    /// Probe a single address, bounded by the implementation's own timeout.
    fn probe(&self, addr: Address) -> impl Future<Output = bool> + Send;
}

/// ICMP reachability via the system `ping` binary.
///
/// One echo request per probe; the address is considered alive iff the
/// command exits successfully.
#[derive(Debug, Clone)]
pub struct PingProbe {
    wait: Duration,
}

impl PingProbe {
    pub fn new(wait: Duration) -> Self {
        Self { wait }
    }
}

impl Default for PingProbe {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Probe for PingProbe {
    fn probe(&self, addr: Address) -> impl Future<Output = bool> + Send {
        let wait = self.wait;
        async move {
            let status = Command::new("ping")
                .arg("-c")
                .arg("1")
                .arg("-W")
                .arg(format!("{:.1}", wait.as_secs_f64()))
                .arg(addr.to_string())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            matches!(status, Ok(s) if s.success())
        }
    }
}

/// TCP reachability: a connect attempt against a fixed port.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    port: u16,
    wait: Duration,
}

impl TcpProbe {
    pub fn new(port: u16, wait: Duration) -> Self {
        Self { port, wait }
    }
}

impl Probe for TcpProbe {
    fn probe(&self, addr: Address) -> impl Future<Output = bool> + Send {
        let target = Port::new(addr, self.port);
        let wait = self.wait;
        async move { port_is_open(&target, wait).await }
    }
}

/// Check whether a TCP port accepts connections within `wait`.
pub async fn port_is_open(port: &Port, wait: Duration) -> bool {
    let target = SocketAddr::V4(port.socket_addr());
    let open = matches!(timeout(wait, TcpStream::connect(target)).await, Ok(Ok(_)));
    debug!(%port, open, "tcp probe");
    open
}

/// Fans a [`Probe`] out over a network's addresses with a bounded worker
/// pool.
///
/// Each candidate gets its own task gated by a semaphore permit, so at most
/// `workers` probes are in flight at once. Individual probes carry their own
/// timeout; the sweep as a whole has none.
pub struct Sweeper<P: Probe> {
    probe: Arc<P>,
    workers: usize,
}

impl<P: Probe> Sweeper<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe: Arc::new(probe),
            workers: DEFAULT_WORKERS,
        }
    }

    /// Override the worker pool size (minimum 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Probe every address of the network and collect the responders.
    ///
    /// Result order is unspecified.
    pub async fn find_all(&self, network: &Network) -> Vec<Address> {
        self.find_among(network.addresses()).await
    }

    /// Probe an arbitrary candidate list and collect the responders.
    pub async fn find_among(&self, candidates: impl IntoIterator<Item = Address>) -> Vec<Address> {
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let found = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for addr in candidates {
            let semaphore = Arc::clone(&semaphore);
            let probe = Arc::clone(&self.probe);
            let found = Arc::clone(&found);
            tasks.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire().await {
                    Ok(permit) => permit,
                    Err(_) => return,
                };
                if probe.probe(addr).await {
                    debug!(%addr, "host responded");
                    found.lock().await.push(addr);
                }
            }));
        }
        for task in tasks {
            let _ = task.await;
        }

        let alive = found.lock().await.clone();
        info!(responders = alive.len(), "sweep complete");
        alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    /// Answers true for a fixed set of addresses and counts in-flight probes.
    struct FakeProbe {
        alive: BTreeSet<Address>,
        in_flight: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }

    impl FakeProbe {
        fn new(alive: impl IntoIterator<Item = Address>) -> Self {
            Self {
                alive: alive.into_iter().collect(),
                in_flight: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl Probe for FakeProbe {
        fn probe(&self, addr: Address) -> impl Future<Output = bool> + Send {
            let hit = self.alive.contains(&addr);
            let in_flight = Arc::clone(&self.in_flight);
            let peak = Arc::clone(&self.peak);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                hit
            }
        }
    }

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_sweep_collects_responders() {
        let network = Network::new(addr("10.0.0.0"), addr("255.255.255.240")).unwrap();
        let probe = FakeProbe::new([addr("10.0.0.3"), addr("10.0.0.9")]);
        let sweeper = Sweeper::new(probe).with_workers(4);

        let mut alive = sweeper.find_all(&network).await;
        alive.sort();
        assert_eq!(alive, vec![addr("10.0.0.3"), addr("10.0.0.9")]);
    }

    #[tokio::test]
    async fn test_sweep_respects_worker_bound() {
        let network = Network::new(addr("10.0.0.0"), addr("255.255.255.224")).unwrap();
        let probe = FakeProbe::new([]);
        let peak = Arc::clone(&probe.peak);
        let sweeper = Sweeper::new(probe).with_workers(3);

        sweeper.find_all(&network).await;
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_tcp_probe_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let target = Port::new(addr("127.0.0.1"), port);
        assert!(port_is_open(&target, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn test_tcp_probe_closed_port() {
        // bind then drop to find a port that is very likely closed
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = Port::new(addr("127.0.0.1"), port);
        assert!(!port_is_open(&target, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn test_find_among_arbitrary_candidates() {
        let probe = FakeProbe::new([addr("192.168.5.1")]);
        let sweeper = Sweeper::new(probe);

        let alive = sweeper
            .find_among([addr("192.168.5.1"), addr("192.168.5.2")])
            .await;
        assert_eq!(alive, vec![addr("192.168.5.1")]);
    }
}
