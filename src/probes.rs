//! Probe strategies for protocol-level reachability checks

use std::net::IpAddr;
use std::time::Duration;

use rand::random;
use reqwest::redirect::Policy;
use surge_ping::{
    Client as IcmpClient, Config as IcmpConfig, ICMP, PingIdentifier, PingSequence,
};
use tokio::net::{TcpStream, lookup_host};
use tokio::time::{sleep, timeout};
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::Result;
use crate::service::{CheckAction, ServiceRecord};

const PING_PAYLOAD: [u8; 32] = [0; 32];

/// Executes reachability checks with bounded retries and linear backoff.
///
/// Every check translates its internal failures into a boolean verdict; a
/// probe never raises an error to the orchestrator.
#[derive(Debug, Clone)]
pub struct Prober {
    http: reqwest::Client,
    retry_count: u32,
    retry_backoff: Duration,
    probe_timeout: Duration,
    ping_probe_count: u32,
    ping_min_replies: u32,
}

impl Prober {
    /// Build a prober from the process configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .user_agent(format!("uptime_monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            retry_count: config.retry_count,
            retry_backoff: config.retry_backoff,
            probe_timeout: config.probe_timeout,
            ping_probe_count: config.ping_probe_count,
            ping_min_replies: config.ping_min_replies,
        })
    }

    /// Probe a single service, returning true when it is failing.
    pub async fn check(&self, service: &ServiceRecord) -> bool {
        match service.action {
            CheckAction::Get => self.check_http(service).await,
            CheckAction::Ping => self.check_ping(service).await,
            CheckAction::Socket => self.check_socket(service).await,
            CheckAction::Unknown => {
                // The runner disables these before the fan-out.
                warn!(
                    "service {} reached the prober with an unrecognized action",
                    service.name
                );
                false
            }
        }
    }

    /// HTTP reachability: any response below 500 means the host answered.
    async fn check_http(&self, service: &ServiceRecord) -> bool {
        let Some(port) = service.port else {
            warn!("service {} has no port configured for its GET check", service.name);
            return true;
        };
        let url = http_url(&service.endpoint, port);

        for attempt in 1..=self.retry_count {
            // Dropping the timed-out future cancels the in-flight request.
            match timeout(self.probe_timeout, self.http.get(&url).send()).await {
                Ok(Ok(response)) if response.status().as_u16() < 500 => {
                    debug!(
                        "service {} reachable over HTTP with status {} (attempt {})",
                        service.name,
                        response.status(),
                        attempt
                    );
                    return false;
                }
                Ok(Ok(response)) => {
                    warn!(
                        "service {} answered with server error {} (attempt {})",
                        service.name,
                        response.status(),
                        attempt
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        "HTTP check for service {} failed (attempt {}): {}",
                        service.name, attempt, e
                    );
                }
                Err(_) => {
                    warn!(
                        "HTTP check for service {} timed out after {:?} (attempt {})",
                        service.name, self.probe_timeout, attempt
                    );
                }
            }

            self.backoff(attempt).await;
        }

        true
    }

    /// ICMP reachability: enough echo replies inside the deadline.
    async fn check_ping(&self, service: &ServiceRecord) -> bool {
        for attempt in 1..=self.retry_count {
            match timeout(self.probe_timeout, self.ping_alive(&service.endpoint)).await {
                Ok(true) => {
                    debug!("service {} answered ping (attempt {})", service.name, attempt);
                    return false;
                }
                Ok(false) => {
                    warn!("service {} is not alive (attempt {})", service.name, attempt);
                }
                Err(_) => {
                    warn!(
                        "ping deadline of {:?} expired for service {} (attempt {})",
                        self.probe_timeout, service.name, attempt
                    );
                }
            }

            self.backoff(attempt).await;
        }

        true
    }

    /// TCP reachability: a completed connect is enough, the stream is
    /// closed right away.
    async fn check_socket(&self, service: &ServiceRecord) -> bool {
        let Some(port) = service.port else {
            warn!(
                "service {} has no port configured for its SOCKET check",
                service.name
            );
            return true;
        };
        let target = format!("{}:{}", service.endpoint, port);

        for attempt in 1..=self.retry_count {
            match timeout(self.probe_timeout, TcpStream::connect(&target)).await {
                Ok(Ok(stream)) => {
                    drop(stream);
                    debug!(
                        "service {} accepted a TCP connection on {} (attempt {})",
                        service.name, target, attempt
                    );
                    return false;
                }
                Ok(Err(e)) => {
                    warn!(
                        "TCP connect to {} for service {} failed (attempt {}): {}",
                        target, service.name, attempt, e
                    );
                }
                Err(_) => {
                    warn!(
                        "TCP connect to {} for service {} timed out after {:?} (attempt {})",
                        target, service.name, self.probe_timeout, attempt
                    );
                }
            }

            self.backoff(attempt).await;
        }

        true
    }

    /// One ping attempt: send the configured number of echo requests and
    /// report alive once enough replies arrived.
    async fn ping_alive(&self, endpoint: &str) -> bool {
        let addr = match resolve_host(endpoint).await {
            Some(addr) => addr,
            None => {
                warn!("could not resolve {}", endpoint);
                return false;
            }
        };

        let icmp_config = match addr {
            IpAddr::V4(_) => IcmpConfig::default(),
            IpAddr::V6(_) => IcmpConfig::builder().kind(ICMP::V6).build(),
        };
        let client = match IcmpClient::new(&icmp_config) {
            Ok(client) => client,
            Err(e) => {
                warn!("could not open an ICMP socket: {}", e);
                return false;
            }
        };

        let mut pinger = client.pinger(addr, PingIdentifier(random())).await;
        pinger.timeout(self.probe_timeout / self.ping_probe_count.max(1));

        let mut replies = 0;
        for seq in 0..self.ping_probe_count {
            if pinger.ping(PingSequence(seq as u16), &PING_PAYLOAD).await.is_ok() {
                replies += 1;
            }
            if replies >= self.ping_min_replies {
                return true;
            }
        }

        false
    }

    /// Linear backoff: failing attempt i waits i times the base delay.
    async fn backoff(&self, attempt: u32) {
        if attempt < self.retry_count {
            sleep(self.retry_backoff * attempt).await;
        }
    }
}

/// Form the URL for a GET check. Endpoints may be bare hosts or carry their
/// own scheme.
fn http_url(endpoint: &str, port: u16) -> String {
    if endpoint.contains("://") {
        format!("{}:{}", endpoint.trim_end_matches('/'), port)
    } else {
        format!("http://{}:{}", endpoint, port)
    }
}

/// Resolve a hostname or address literal to a single IP address.
async fn resolve_host(endpoint: &str) -> Option<IpAddr> {
    if let Ok(addr) = endpoint.parse::<IpAddr>() {
        return Some(addr);
    }

    match lookup_host((endpoint, 0u16)).await {
        Ok(mut addrs) => addrs.next().map(|sock| sock.ip()),
        Err(e) => {
            debug!("address lookup for {} failed: {}", endpoint, e);
            None
        }
    }
}
