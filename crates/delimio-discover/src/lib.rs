//! UDP broadcast service discovery.
//!
//! A server advertises the address and port of a delimio service on the
//! local network: clients broadcast a datagram carrying the service name,
//! and the server answers `"{name}:{port}"` from its own address. This is
//! networking glue around the framing core, with no delimiter scanning of
//! its own.

use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

/// How often the server thread wakes to check for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(250);

const MAX_DATAGRAM: usize = 1024;

/// Errors that can occur in discovery operations.
#[derive(Debug, thiserror::Error)]
pub enum DiscoverError {
    /// Failed to bind the UDP socket.
    #[error("failed to bind discovery socket on port {port}: {source}")]
    Bind { port: u16, source: std::io::Error },

    /// An I/O error on the UDP socket.
    #[error("discovery I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DiscoverError>;

/// Where an advertised service can be reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLocation {
    pub host: IpAddr,
    pub port: u16,
}

impl ServiceLocation {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// A UDP server advertising a named service.
///
/// Runs a background thread answering name queries until
/// [`shutdown`](Self::shutdown) is called or the value is dropped.
pub struct DiscoverServer {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    local_addr: SocketAddr,
}

impl DiscoverServer {
    /// Start a discovery server on `port`, advertising a service on the
    /// same port.
    pub fn start(port: u16, service_name: &str) -> Result<Self> {
        Self::start_advertising(port, service_name, port)
    }

    /// Start a discovery server on `port`, advertising a service on a
    /// different port.
    pub fn start_advertising(port: u16, service_name: &str, service_port: u16) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))
            .map_err(|source| DiscoverError::Bind { port, source })?;
        socket.set_broadcast(true)?;
        // Read timeout doubles as the shutdown poll interval.
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        let local_addr = socket.local_addr()?;

        let stop = Arc::new(AtomicBool::new(false));
        let name = service_name.to_string();
        let advertisement = format!("{service_name}:{service_port}").into_bytes();

        let handle = {
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || run_server(socket, &name, &advertisement, &stop))
        };

        info!(%local_addr, service = service_name, service_port, "discovery server started");
        Ok(Self {
            stop,
            handle: Some(handle),
            local_addr,
        })
    }

    /// The address the server socket is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop the server and wait for its thread to exit.
    pub fn shutdown(mut self) {
        self.stop_and_join();
    }

    fn stop_and_join(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for DiscoverServer {
    fn drop(&mut self) {
        self.stop_and_join();
    }
}

fn run_server(socket: UdpSocket, name: &str, advertisement: &[u8], stop: &AtomicBool) {
    let mut buf = [0u8; MAX_DATAGRAM];
    while !stop.load(Ordering::SeqCst) {
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut =>
            {
                continue
            }
            Err(err) => {
                warn!(%err, "discovery server socket failed");
                break;
            }
        };
        if &buf[..len] == name.as_bytes() {
            debug!(%peer, "answering discovery request");
            if let Err(err) = socket.send_to(advertisement, peer) {
                warn!(%err, %peer, "failed to answer discovery request");
            }
        }
    }
    debug!("discovery server stopped");
}

/// Broadcast a service-name query on the local network and wait for the
/// first well-formed answer. Returns `Ok(None)` when nothing answers
/// within the timeout.
pub fn find_service(
    service_name: &str,
    port: u16,
    timeout: Duration,
) -> Result<Option<ServiceLocation>> {
    probe(
        service_name,
        SocketAddr::new(IpAddr::V4(Ipv4Addr::BROADCAST), port),
        timeout,
    )
}

/// Send a service-name query to a specific address and wait for an
/// answer. [`find_service`] is this with the broadcast address.
pub fn probe(
    service_name: &str,
    target: SocketAddr,
    timeout: Duration,
) -> Result<Option<ServiceLocation>> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
    socket.set_broadcast(true)?;
    socket.send_to(service_name.as_bytes(), target)?;

    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Ok(None);
        }
        socket.set_read_timeout(Some(remaining))?;
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(err)
                if err.kind() == std::io::ErrorKind::WouldBlock
                    || err.kind() == std::io::ErrorKind::TimedOut =>
            {
                return Ok(None)
            }
            Err(err) => return Err(err.into()),
        };
        if let Some(location) = parse_advertisement(&buf[..len], service_name, peer) {
            return Ok(Some(location));
        }
        // Not our service; keep listening until the deadline.
        debug!(%peer, "ignoring unrelated datagram");
    }
}

fn parse_advertisement(data: &[u8], service_name: &str, peer: SocketAddr) -> Option<ServiceLocation> {
    let text = std::str::from_utf8(data).ok()?;
    let (name, port) = text.rsplit_once(':')?;
    if name != service_name {
        return None;
    }
    Some(ServiceLocation {
        host: peer.ip(),
        port: port.parse().ok()?,
    })
}
