//! Metadata resolution: DOI → [`MetadataRecord`], never failing.
//!
//! ```text
//! cache ──hit──▶ record
//!   │miss
//!   ▼
//! Crossref ──2xx + valid JSON──▶ record ─┐
//!   │ 4xx / 5xx after retries /          │
//!   │ unreachable / bad JSON             │
//!   ▼                                    │
//! OpenAlex ──2xx + valid JSON──▶ record ─┤
//!   │ any failure                        │
//!   ▼                                    ▼
//! all-sentinel record ───────────▶ cache.insert ──▶ record
//! ```
//!
//! The all-sentinel record is cached like any other, so a DOI resolved
//! during a registry outage keeps its placeholder name until it is evicted
//! or the process restarts.

use crate::config::RenameConfig;
use crate::error::TransportError;
use crate::metadata::{MetadataRecord, NormalizedDoi};
use crate::pipeline::cache::MetadataCache;
use crate::pipeline::fetch::{
    fetch_with_retry, FetchOutcome, RegistryTransport, ReqwestTransport, RetryPolicy,
};
use crate::pipeline::registry::Registry;
use tracing::{debug, info, warn};

/// Resolves DOIs against the registries, with an LRU cache in front.
#[derive(Debug)]
pub struct MetadataResolver<T = ReqwestTransport> {
    transport: T,
    cache: MetadataCache,
    retry: RetryPolicy,
    crossref_base_url: String,
    openalex_base_url: String,
}

impl MetadataResolver<ReqwestTransport> {
    /// A resolver talking to the configured registries over HTTPS.
    pub fn new(config: &RenameConfig) -> Result<Self, TransportError> {
        Ok(Self::with_transport(config, ReqwestTransport::new(config)?))
    }
}

impl<T: RegistryTransport> MetadataResolver<T> {
    /// A resolver using a caller-supplied transport.
    pub fn with_transport(config: &RenameConfig, transport: T) -> Self {
        Self {
            transport,
            cache: MetadataCache::new(config.cache_capacity),
            retry: RetryPolicy::from_config(config),
            crossref_base_url: config.crossref_base_url.clone(),
            openalex_base_url: config.openalex_base_url.clone(),
        }
    }

    /// Resolve `doi`, consulting the cache first.
    ///
    /// Always returns a complete record; unresolved fields hold their
    /// sentinels and `doi` is always the input.
    pub async fn resolve(&self, doi: &NormalizedDoi) -> MetadataRecord {
        if let Some(hit) = self.cache.get(doi) {
            debug!("Metadata cache hit for {}", doi);
            return hit;
        }

        let record = match self.query_registries(doi).await {
            Some(record) => record,
            None => {
                warn!("No registry resolved {}; using placeholder metadata", doi);
                MetadataRecord::unresolved(doi)
            }
        };

        self.cache.insert(doi.clone(), record.clone());
        record
    }

    /// The cache, for inspection.
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn query_registries(&self, doi: &NormalizedDoi) -> Option<MetadataRecord> {
        for (idx, registry) in Registry::PRIORITY.into_iter().enumerate() {
            if idx > 0 {
                info!("Falling back to {} for {}", registry.name(), doi);
            }
            if let Some(record) = self.query(registry, doi).await {
                return Some(record);
            }
        }
        None
    }

    async fn query(&self, registry: Registry, doi: &NormalizedDoi) -> Option<MetadataRecord> {
        let url = registry.work_url(self.base_url(registry), doi);
        match fetch_with_retry(&self.transport, &url, self.retry).await {
            FetchOutcome::Success(body) => match registry.parse(&body, doi) {
                Ok(record) => {
                    info!("Resolved {} via {}", doi, registry.name());
                    Some(record)
                }
                Err(e) => {
                    warn!("{} returned an unusable payload for {}: {}", registry.name(), doi, e);
                    None
                }
            },
            FetchOutcome::Status(status) => {
                debug!("{} answered HTTP {} for {}", registry.name(), status, doi);
                None
            }
            FetchOutcome::Unreachable(e) => {
                warn!("{} unreachable for {}: {}", registry.name(), doi, e);
                None
            }
        }
    }

    fn base_url(&self, registry: Registry) -> &str {
        match registry {
            Registry::Crossref => &self.crossref_base_url,
            Registry::OpenAlex => &self.openalex_base_url,
        }
    }
}
