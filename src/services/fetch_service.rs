//! Debounced HTTP fetch of the JSON data source
//!
//! Each `request` bumps a generation counter and cancels the request before
//! it. Responses carry the generation they were issued under, so the
//! receiver can drop anything that is not the latest even when an older,
//! slower request completes last.

use crate::config::FetchConfig;
use crate::core::validation::normalize_url;
use crate::error::{FilterDeckError, Result};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Completed fetch delivered to the receiver
#[derive(Debug)]
pub struct FetchEvent {
    pub generation: u64,
    pub url: String,
    pub outcome: Result<Value>,
}

/// Service for loading the data source
pub struct FetchService {
    client: reqwest::Client,
    debounce: Duration,
    generation: Arc<AtomicU64>,
    pending: Option<CancellationToken>,
    tx: mpsc::UnboundedSender<FetchEvent>,
}

impl FetchService {
    /// Create the service and the receiving end of its event channel
    pub fn new(config: &FetchConfig) -> Result<(Self, mpsc::UnboundedReceiver<FetchEvent>)> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FilterDeckError::FetchFailed(e.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        Ok((
            Self {
                client,
                debounce: config.debounce(),
                generation: Arc::new(AtomicU64::new(0)),
                pending: None,
                tx,
            },
            rx,
        ))
    }

    /// Schedule a fetch of `url` after the debounce interval
    ///
    /// Invalid URLs are rejected without touching the pending request.
    /// Must be called from within a tokio runtime.
    pub fn request(&mut self, url: &str) -> Result<u64> {
        self.schedule(url, self.debounce)
    }

    /// Like `request`, without waiting out the debounce
    pub fn request_immediate(&mut self, url: &str) -> Result<u64> {
        self.schedule(url, Duration::ZERO)
    }

    fn schedule(&mut self, url: &str, debounce: Duration) -> Result<u64> {
        let url = normalize_url(url)?;
        let generation = self.supersede();
        let token = self.pending.get_or_insert_with(CancellationToken::new).clone();

        let client = self.client.clone();
        let latest = Arc::clone(&self.generation);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "fetch superseded during debounce");
                    return;
                }
                _ = tokio::time::sleep(debounce) => {}
            }
            if latest.load(Ordering::SeqCst) != generation {
                return;
            }

            info!(%url, generation, "fetching data");
            let outcome = tokio::select! {
                _ = token.cancelled() => {
                    debug!(generation, "fetch superseded in flight");
                    return;
                }
                outcome = fetch_json(&client, &url) => outcome,
            };
            if let Err(e) = &outcome {
                warn!(%url, generation, "fetch failed: {e}");
            }
            if tx.send(FetchEvent { generation, url, outcome }).is_err() {
                debug!(generation, "fetch receiver dropped");
            }
        });

        Ok(generation)
    }

    /// Invalidate any scheduled or in-flight request
    pub fn cancel_pending(&mut self) {
        self.supersede();
    }

    /// Whether `generation` is the most recently issued request
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Cancel the previous token and return the new generation
    fn supersede(&mut self) -> u64 {
        if let Some(previous) = self.pending.take() {
            previous.cancel();
        }
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}

async fn fetch_json(client: &reqwest::Client, url: &str) -> Result<Value> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FilterDeckError::FetchFailed(format!(
            "Request failed with status {}",
            status.as_u16()
        )));
    }
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FetchConfig {
        FetchConfig {
            debounce_ms: 10,
            timeout_secs: 1,
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected() {
        let (mut service, _rx) = FetchService::new(&config()).unwrap();
        let err = service.request("not a url").unwrap_err();
        assert!(matches!(err, FilterDeckError::InvalidUrl(_)));
        assert!(service.is_current(0));
    }

    #[tokio::test]
    async fn test_generations_increase() {
        let (mut service, _rx) = FetchService::new(&config()).unwrap();
        let first = service.request("http://example.invalid.test/a").unwrap();
        let second = service.request("http://example.invalid.test/b").unwrap();

        assert!(second > first);
        assert!(!service.is_current(first));
        assert!(service.is_current(second));

        service.cancel_pending();
        assert!(!service.is_current(second));
    }
}
