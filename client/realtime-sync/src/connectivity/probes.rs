//! Signal sources standing in for host online/offline and update events
use crate::models::ConnectivitySignal;
use futures::stream::{self, Stream};
use serde::Deserialize;
use std::time::Duration;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use url::Url;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const UPDATE_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Periodic TCP reachability check
#[derive(Debug, Clone)]
pub struct NetworkProbe {
    addr: String,
    interval: Duration,
    timeout: Duration,
}

impl NetworkProbe {
    pub fn new(addr: impl Into<String>, interval: Duration) -> Self {
        Self {
            addr: addr.into(),
            interval,
            timeout: DEFAULT_PROBE_TIMEOUT.min(interval),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Whether a TCP connection to the probe address opens within the timeout
    pub async fn check(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "Network probe failed");
                false
            }
            Err(_) => {
                debug!(addr = %self.addr, "Network probe timed out");
                false
            }
        }
    }

    /// One `Online`/`Offline` signal per check, starting immediately
    pub fn into_stream(self) -> impl Stream<Item = ConnectivitySignal> + Send {
        stream::unfold((self, true), |(probe, first)| async move {
            if !first {
                tokio::time::sleep(probe.interval).await;
            }

            let signal = if probe.check().await {
                ConnectivitySignal::Online
            } else {
                ConnectivitySignal::Offline
            };
            Some((signal, (probe, false)))
        })
    }
}

/// Version document served next to the application
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VersionDocument {
    pub version: String,
}

/// Periodic check for a newer published version
///
/// Only reports availability; activating the update is left to the user.
#[derive(Debug, Clone)]
pub struct UpdateProbe {
    client: reqwest::Client,
    url: Url,
    current_version: String,
    interval: Duration,
}

impl UpdateProbe {
    pub fn new(
        url: Url,
        current_version: impl Into<String>,
        interval: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(UPDATE_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            url,
            current_version: current_version.into(),
            interval,
        })
    }

    /// The published version, if it differs from the running one
    pub async fn check(&self) -> Result<Option<String>, reqwest::Error> {
        let document: VersionDocument = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if document.version == self.current_version {
            Ok(None)
        } else {
            Ok(Some(document.version))
        }
    }

    /// Emits `UpdateAvailable` once per newly published version
    pub fn into_stream(self) -> impl Stream<Item = ConnectivitySignal> + Send {
        let state = (self, true, None::<String>);

        stream::unfold(state, |(probe, mut first, mut announced)| async move {
            loop {
                if !first {
                    tokio::time::sleep(probe.interval).await;
                }
                first = false;

                match probe.check().await {
                    Ok(Some(version)) if announced.as_deref() != Some(version.as_str()) => {
                        info!(
                            current = %probe.current_version,
                            available = %version,
                            "Application update available"
                        );
                        announced = Some(version);
                        return Some((ConnectivitySignal::UpdateAvailable, (probe, false, announced)));
                    }
                    Ok(_) => {}
                    Err(e) => warn!(url = %probe.url, error = %e, "Update check failed"),
                }
            }
        })
    }
}
