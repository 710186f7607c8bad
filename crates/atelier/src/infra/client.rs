//! Client for a remote relay and the provider built on it.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::app::locations::Provider;
use crate::app::providers::LocationFilter;
use crate::domain::errors::ProviderError;
use crate::domain::model::Location;
use crate::infra::server::{ActionsResponse, LocationsResponse};

pub const DEFAULT_PORT: u16 = 7391;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Talks to `atelier server` on another machine.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
    token: String,
}

impl RemoteClient {
    /// `address` is `HOST`, `HOST:PORT`, or a full `http(s)://` URL.
    pub fn new(address: &str, token: impl Into<String>) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ProviderError::Remote(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            base_url: base_url(address),
            token: token.into(),
        })
    }

    fn auth_request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("Authorization", format!("Bearer {}", self.token))
    }

    pub async fn health(&self) -> Result<(), ProviderError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http.get(&url).send().await.map_err(transport_error)?;
        if !response.status().is_success() {
            return Err(ProviderError::Remote(format!(
                "{url} returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    pub async fn locations(&self, filter: LocationFilter) -> Result<Vec<Location>, ProviderError> {
        let request = self
            .http
            .get(format!("{}/api/locations", self.base_url))
            .query(&[("filter", filter.as_str())]);
        let body: LocationsResponse = self.send(request).await?;
        Ok(body.locations)
    }

    pub async fn actions(&self, path: &Path) -> Result<ActionsResponse, ProviderError> {
        let request = self
            .http
            .get(format!("{}/api/actions", self.base_url))
            .query(&[("path", path.to_string_lossy().as_ref())]);
        self.send(request).await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ProviderError> {
        let response = self
            .auth_request(request)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        debug!(%status, url = %response.url(), "relay response");

        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|body| body.get("error").and_then(|v| v.as_str()).map(str::to_owned))
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_owned());
            return Err(ProviderError::Remote(match status {
                StatusCode::UNAUTHORIZED => {
                    format!("unauthorized ({message}); run `atelier login <token>`")
                }
                _ => format!("{status}: {message}"),
            }));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ProviderError::Remote(format!("invalid relay response: {err}")))
    }
}

fn transport_error(err: reqwest::Error) -> ProviderError {
    ProviderError::Remote(err.to_string())
}

/// Normalise a relay address into a base URL without a trailing slash.
pub fn base_url(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    if address.contains("://") {
        return address.to_string();
    }
    if address.rsplit_once(':').is_some_and(|(_, port)| port.parse::<u16>().is_ok()) {
        format!("http://{address}")
    } else {
        format!("http://{address}:{DEFAULT_PORT}")
    }
}

/// Host part of a relay address, used as the ssh destination.
pub fn ssh_host(address: &str) -> String {
    let address = address.trim().trim_end_matches('/');
    let without_scheme = address
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(address);
    match without_scheme.rsplit_once(':') {
        Some((host, port)) if port.parse::<u16>().is_ok() => host.to_string(),
        _ => without_scheme.to_string(),
    }
}

/// Locations served by a relay. Any failure is fatal to aggregation.
#[derive(Debug, Clone)]
pub struct RemoteProvider {
    client: RemoteClient,
    filter: LocationFilter,
}

impl RemoteProvider {
    pub fn new(client: RemoteClient, filter: LocationFilter) -> Self {
        Self { client, filter }
    }
}

#[async_trait]
impl Provider for RemoteProvider {
    fn name(&self) -> &str {
        "remote"
    }

    async fn fetch(&self) -> Result<Vec<Location>, ProviderError> {
        self.client.locations(self.filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_adds_scheme_and_default_port() {
        assert_eq!(base_url("devbox"), "http://devbox:7391");
        assert_eq!(base_url("devbox:8080"), "http://devbox:8080");
        assert_eq!(base_url("https://relay.example.com/"), "https://relay.example.com");
    }

    #[test]
    fn ssh_host_strips_scheme_and_port() {
        assert_eq!(ssh_host("devbox"), "devbox");
        assert_eq!(ssh_host("user@devbox:8080"), "user@devbox");
        assert_eq!(ssh_host("http://devbox:7391"), "devbox");
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_provider_error() {
        let client = RemoteClient::new("127.0.0.1:1", "token").unwrap();
        let provider = RemoteProvider::new(client, LocationFilter::All);
        assert!(matches!(
            provider.fetch().await,
            Err(ProviderError::Remote(_))
        ));
    }
}
