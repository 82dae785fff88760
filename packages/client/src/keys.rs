//! Resource URLs for hierarchical keys.
//!
//! Every key segment is percent-encoded on its own, so a `/` can only ever
//! appear between segments. A trailing `/` on a key survives as an empty
//! last segment, which etcd reads as a request for a directory listing.

use url::Url;

use crate::error::Error;

/// Path prefix of the versioned key-space API.
pub const KEYS_PREFIX: &str = "v2/keys";

/// Normalise a configured endpoint into a base URL ending in `/`.
pub fn base_url(endpoint: &str) -> Result<Url, Error> {
    let mut url = Url::parse(endpoint)?;
    if url.cannot_be_a_base() {
        return Err(Error::InvalidUrl {
            message: format!("{} cannot be used as a base URL", endpoint),
        });
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

/// Build `base + prefix + "/" + encoded key segments + suffix`.
///
/// One leading `/` on `key` is ignored. `suffix` is appended verbatim, so it
/// may carry a trailing `/` or a query string. Keys with a `.` or `..`
/// segment are rejected.
pub fn build_key_url(base: &Url, prefix: &str, key: &str, suffix: &str) -> Result<Url, Error> {
    let key = key.strip_prefix('/').unwrap_or(key);

    // URL path normalisation would resolve these against their parent and
    // address a different key.
    if key.split('/').any(|segment| segment == "." || segment == "..") {
        return Err(Error::InvalidUrl {
            message: format!("key {:?} contains a '.' or '..' segment", key),
        });
    }

    let mut url = base.clone();
    url.set_query(None);
    {
        let mut segments = url.path_segments_mut().map_err(|_| Error::InvalidUrl {
            message: format!("{} cannot be used as a base URL", base),
        })?;
        segments.pop_if_empty();
        segments.extend(prefix.split('/').filter(|s| !s.is_empty()));
        segments.extend(key.split('/'));
    }

    if suffix.is_empty() {
        return Ok(url);
    }

    let mut full: String = url.into();
    full.push_str(suffix);
    Ok(Url::parse(&full)?)
}

/// URL of a key under the `v2/keys` API.
pub fn key_url(base: &Url, key: &str, suffix: &str) -> Result<Url, Error> {
    build_key_url(base, KEYS_PREFIX, key, suffix)
}

/// The non-API version endpoint.
pub fn version_url(base: &Url) -> Result<Url, Error> {
    Ok(base.join("version")?)
}

/// Long-poll parameters for a watch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchOptions {
    /// Report the first change at or after this index.
    pub index: Option<u64>,
    /// Include changes to every descendant of the key.
    pub recursive: bool,
}

impl WatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn recursive(mut self) -> Self {
        self.recursive = true;
        self
    }

    /// Query string for the watch request.
    pub fn suffix(&self) -> String {
        let mut suffix = String::from("?wait=true");
        if let Some(index) = self.index {
            suffix.push_str(&format!("&waitIndex={}", index));
        }
        if self.recursive {
            suffix.push_str("&recursive=true");
        }
        suffix
    }
}
