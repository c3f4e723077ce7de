//! Transport resolution for synthesized upload contexts.

use picmirror::{HostTransports, Transport};
use std::sync::Arc;

/// Where a backup context's transport comes from, in resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportProvider {
    PrimaryHostTransport,
    LegacyHostTransport,
    ExternalHttpClient,
}

impl TransportProvider {
    pub const RESOLUTION_ORDER: [TransportProvider; 3] = [
        TransportProvider::PrimaryHostTransport,
        TransportProvider::LegacyHostTransport,
        TransportProvider::ExternalHttpClient,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TransportProvider::PrimaryHostTransport => "host",
            TransportProvider::LegacyHostTransport => "legacy host",
            TransportProvider::ExternalHttpClient => "external http client",
        }
    }
}

/// Pick the first available transport. `None` means the context cannot be
/// given a working transport.
pub fn resolve_transport(
    host: &HostTransports,
    external: Option<&Arc<dyn Transport>>,
) -> Option<(TransportProvider, Arc<dyn Transport>)> {
    TransportProvider::RESOLUTION_ORDER
        .iter()
        .find_map(|provider| {
            let candidate = match provider {
                TransportProvider::PrimaryHostTransport => host.current.as_ref(),
                TransportProvider::LegacyHostTransport => host.legacy.as_ref(),
                TransportProvider::ExternalHttpClient => external,
            };
            candidate.map(|t| (*provider, Arc::clone(t)))
        })
}

#[cfg(feature = "http-transport")]
pub use http_client::HttpTransport;

#[cfg(feature = "http-transport")]
mod http_client {
    use async_trait::async_trait;
    use picmirror::{MirrorError, Result, Transport, TransportRequest, TransportResponse};
    use std::time::Duration;

    const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// reqwest-backed [`Transport`] used when the host exposes none.
    #[derive(Debug, Clone)]
    pub struct HttpTransport {
        http_client: reqwest::Client,
    }

    impl HttpTransport {
        pub fn new() -> Self {
            Self::with_timeout(DEFAULT_TIMEOUT)
        }

        pub fn with_timeout(timeout: Duration) -> Self {
            let http_client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new());

            Self { http_client }
        }
    }

    impl Default for HttpTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for HttpTransport {
        async fn request(&self, req: TransportRequest) -> Result<TransportResponse> {
            let mut builder = self.http_client.request(req.method.clone(), &req.url);
            for (name, value) in &req.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = req.body {
                builder = builder.body(body);
            }

            let response = builder.send().await.map_err(|e| {
                MirrorError::Transport(format!("Failed to send request to {}: {}", req.url, e))
            })?;

            let status = response.status();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.bytes().await.map_err(|e| {
                MirrorError::Transport(format!("Failed to read response from {}: {}", req.url, e))
            })?;

            Ok(TransportResponse {
                status,
                headers,
                body: body.to_vec(),
            })
        }
    }
}
