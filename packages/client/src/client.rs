//! The etcd v2 key-space client.
//!
//! Every operation except [`EtcdClient::watch`] blocks the calling thread
//! until its response has been classified. The I/O underneath is
//! non-blocking and runs on the client's [`Transport`], so any number of
//! watches can be outstanding without tying up threads.
//!
//! ```ignore
//! use etcdv2_client::EtcdClient;
//!
//! let client = EtcdClient::new("http://127.0.0.1:4001")?;
//!
//! client.set("/config/mode", "active")?;
//! let mode = client.get("/config/mode")?.and_then(|r| r.node).and_then(|n| n.value);
//!
//! let next = client.watch_with("/config", WatchOptions::new().recursive());
//! let change = next.wait()?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use etcdv2_http::{HttpRequest, Transport};
use tracing::debug;
use url::Url;

use crate::classify::{self, Expectation, Outcome};
use crate::config::ClientConfig;
use crate::error::Error;
use crate::keys::{self, WatchOptions};
use crate::model::{EtcdResult, Node};
use crate::status::ErrorCode;
use crate::watch::{PendingResult, Watch};

/// Client for one etcd endpoint.
///
/// Cheap to share behind an `Arc`; every call is independent and no
/// ordering is promised between concurrent calls.
#[derive(Debug)]
pub struct EtcdClient {
    base_url: Url,
    transport: Arc<Transport>,
    request_timeout: Option<Duration>,
}

impl EtcdClient {
    /// Connect to `endpoint` with default settings and a private transport.
    pub fn new(endpoint: &str) -> Result<Self, Error> {
        Self::from_config(&ClientConfig::new(endpoint))
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        let base_url = keys::base_url(&config.endpoint)?;
        let transport = Transport::new(&config.transport)?;

        Ok(Self {
            base_url,
            transport: Arc::new(transport),
            request_timeout: config.request_timeout,
        })
    }

    /// Use a transport shared with other clients.
    pub fn with_transport(endpoint: &str, transport: Arc<Transport>) -> Result<Self, Error> {
        Ok(Self {
            base_url: keys::base_url(endpoint)?,
            transport,
            request_timeout: ClientConfig::default().request_timeout,
        })
    }

    /// Bound every call except `watch`. `None` removes the bound.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Fetch a key. `Ok(None)` when it does not exist.
    ///
    /// Any service error other than "key not found" is returned as
    /// [`Error::Service`].
    pub fn get(&self, key: &str) -> Result<Option<EtcdResult>, Error> {
        let url = keys::key_url(&self.base_url, key, "")?;

        match self.call(HttpRequest::get(url), Expectation::GET)? {
            Outcome::ExpectedError(ErrorCode::KeyNotFound, _) => {
                debug!(key, "key not found");
                Ok(None)
            }
            outcome => Ok(outcome.into_result()),
        }
    }

    /// Delete a key. Deleting a missing key is a service error with code
    /// [`ErrorCode::KeyNotFound`]. `Ok(None)` if the server sent no body.
    pub fn delete(&self, key: &str) -> Result<Option<EtcdResult>, Error> {
        let url = keys::key_url(&self.base_url, key, "")?;
        Ok(self
            .call(HttpRequest::delete(url), Expectation::DELETE)?
            .into_result())
    }

    /// Set a key to a value.
    pub fn set(&self, key: &str, value: &str) -> Result<EtcdResult, Error> {
        self.set_with_ttl(key, value, None)
    }

    /// Set a key to a value that expires after `ttl` seconds.
    pub fn set_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl: Option<u64>,
    ) -> Result<EtcdResult, Error> {
        let mut request = HttpRequest::put(keys::key_url(&self.base_url, key, "")?)
            .with_form("value", value);
        if let Some(ttl) = ttl {
            request = request.with_form("ttl", ttl.to_string());
        }

        require(self.call(request, Expectation::SET)?)
    }

    pub fn create_directory(&self, key: &str) -> Result<EtcdResult, Error> {
        let request =
            HttpRequest::put(keys::key_url(&self.base_url, key, "")?).with_form("dir", "true");

        require(self.call(request, Expectation::CREATE_DIRECTORY)?)
    }

    /// Children of a directory, in server order.
    ///
    /// `Ok(None)` both when the directory is missing and when the server
    /// omits the child list, as it does for an empty directory.
    pub fn list_directory(&self, key: &str) -> Result<Option<Vec<Node>>, Error> {
        let listing = format!("{}/", key.trim_end_matches('/'));
        let result = self.get(&listing)?;
        Ok(result.and_then(|r| r.node).and_then(|n| n.nodes))
    }

    /// The directory listing result itself. A missing directory is an error.
    pub fn list_children(&self, key: &str) -> Result<EtcdResult, Error> {
        let url = keys::key_url(&self.base_url, key, "/")?;
        require(self.call(HttpRequest::get(url), Expectation::LIST_CHILDREN)?)
    }

    /// Remove an empty directory.
    pub fn delete_directory(&self, key: &str) -> Result<Option<EtcdResult>, Error> {
        let url = keys::key_url(&self.base_url, key, "?dir=true")?;
        Ok(self
            .call(HttpRequest::delete(url), Expectation::DELETE_DIRECTORY)?
            .into_result())
    }

    /// Compare-and-swap: set `key` to `value` only if it currently holds
    /// `prev_value`.
    ///
    /// A mismatch is not an `Err`: it comes back as a result whose
    /// `is_error()` is true with [`ErrorCode::TestFailed`].
    pub fn cas(&self, key: &str, prev_value: &str, value: &str) -> Result<EtcdResult, Error> {
        let request = HttpRequest::put(keys::key_url(&self.base_url, key, "")?)
            .with_form("value", value)
            .with_form("prevValue", prev_value);

        require(self.call(request, Expectation::CAS)?)
    }

    /// Wait for the next change to `key`.
    pub fn watch(&self, key: &str) -> Watch {
        self.watch_with(key, WatchOptions::default())
    }

    /// Wait for the first change to `key` (or, if recursive, anything below
    /// it) at or after `options.index`.
    ///
    /// Returns immediately. Failures, including a request that cannot be
    /// built, surface when the watch resolves.
    pub fn watch_with(&self, key: &str, options: WatchOptions) -> Watch {
        match keys::key_url(&self.base_url, key, &options.suffix()) {
            Ok(url) => {
                // No timeout: the server holds this open until something changes.
                let response = self.transport.execute(HttpRequest::get(url));
                Watch::pending(key, PendingResult::new(response, Expectation::WATCH))
            }
            Err(e) => Watch::failed(key, e),
        }
    }

    /// The server's version string, returned as raw text.
    pub fn get_version(&self) -> Result<String, Error> {
        let url = keys::version_url(&self.base_url)?;
        let request = HttpRequest::get(url).with_timeout(self.request_timeout);
        let response = self.transport.execute(request).wait()?;
        classify::text(response, Expectation::VERSION.statuses)
    }

    /// Shut the transport down if this client is its last user.
    ///
    /// Blocks, so it must not be called from inside an async context.
    pub fn shutdown(self, timeout: Duration) {
        if let Ok(transport) = Arc::try_unwrap(self.transport) {
            transport.shutdown(timeout);
        }
    }

    fn call(&self, request: HttpRequest, expectation: Expectation) -> Result<Outcome, Error> {
        let request = request.with_timeout(self.request_timeout);
        PendingResult::new(self.transport.execute(request), expectation).wait()
    }
}

fn require(outcome: Outcome) -> Result<EtcdResult, Error> {
    outcome.into_result().ok_or(Error::EmptyBody)
}
