//! Optional upstream ISO-metadata fetch, memoized per run.
//!
//! The net-install ISO URL and checksum have a fourth resolution layer: the
//! current image list published next to the images as a `SHA512SUMS` file.
//! Fetching it is the only I/O the resolver performs, it happens at most once
//! per run regardless of how many machines ask, and any failure is recovered
//! locally — logged, then resolved to absent.

use std::sync::OnceLock;

use anyhow::{Context, Result, bail};

use super::defaults;

/// The first net-install entry of the upstream image list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoMetadata {
    /// Full URL of the image.
    pub url: String,
    /// SHA512 checksum of the image.
    pub sha512: String,
}

/// Where ISO metadata comes from.  Implemented over HTTP in production and by
/// in-memory fakes in tests.
pub trait IsoSource: Send + Sync + std::fmt::Debug {
    /// Fetch and parse the image list under `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error when the listing cannot be fetched or parsed; the
    /// caller recovers by resolving the property to absent.
    fn fetch(&self, base_url: &str) -> Result<IsoMetadata>;
}

/// HTTP implementation with a bounded global timeout.
#[derive(Debug)]
pub struct HttpIsoSource {
    agent: ureq::Agent,
}

impl HttpIsoSource {
    /// Agent with the compiled-in upstream timeout.
    #[must_use]
    pub fn new() -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(defaults::UPSTREAM_TIMEOUT))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

impl Default for HttpIsoSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IsoSource for HttpIsoSource {
    fn fetch(&self, base_url: &str) -> Result<IsoMetadata> {
        let url = format!("{base_url}SHA512SUMS");
        let text = self
            .agent
            .get(&url)
            .call()
            .with_context(|| format!("fetching {url}"))?
            .body_mut()
            .read_to_string()
            .context("reading SHA512SUMS body")?;
        parse_sha512sums(base_url, &text)
    }
}

/// Parse the first entry of a `SHA512SUMS` listing: checksum, then file name.
pub(crate) fn parse_sha512sums(base_url: &str, text: &str) -> Result<IsoMetadata> {
    let Some(first) = text.lines().next() else {
        bail!("empty SHA512SUMS listing");
    };
    let mut tokens = first.split_whitespace();
    let Some(sha512) = tokens.next() else {
        bail!("blank first line in SHA512SUMS listing");
    };
    let Some(name) = tokens.next_back() else {
        bail!("no file name in SHA512SUMS entry '{first}'");
    };
    Ok(IsoMetadata {
        url: format!("{base_url}{name}"),
        sha512: sha512.to_string(),
    })
}

/// Per-run memo around an [`IsoSource`].
///
/// The first caller performs the fetch; every later caller (from any thread)
/// sees the memoized outcome.  A failed fetch memoizes as absent so the run
/// never retries or aborts.
#[derive(Debug)]
pub struct IsoCache {
    source: Box<dyn IsoSource>,
    cell: OnceLock<Option<IsoMetadata>>,
}

impl IsoCache {
    /// Cache over the given source.
    #[must_use]
    pub fn new(source: Box<dyn IsoSource>) -> Self {
        Self {
            source,
            cell: OnceLock::new(),
        }
    }

    /// Cache over the production HTTP source.
    #[must_use]
    pub fn http() -> Self {
        Self::new(Box::new(HttpIsoSource::new()))
    }

    /// The memoized metadata, fetching on first use.
    pub fn get(&self, base_url: &str) -> Option<&IsoMetadata> {
        self.cell
            .get_or_init(|| match self.source.fetch(base_url) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    tracing::warn!("upstream ISO metadata unavailable: {e:#}");
                    None
                }
            })
            .as_ref()
    }
}
