//! # etcdv2-client
//!
//! Typed client for the etcd v2 HTTP/JSON key-value API.
//!
//! Keys are slash-separated paths. Values are strings. Every call is a
//! single HTTP request whose response is classified into a typed outcome:
//! "key not found" on `get` is `Ok(None)`, a failed compare-and-swap is a
//! result with an error code, and anything the operation does not expect
//! is an [`Error`].
//!
//! ```ignore
//! use etcdv2_client::{EtcdClient, WatchOptions};
//!
//! let client = EtcdClient::new("http://127.0.0.1:4001")?;
//! client.set_with_ttl("/locks/job", "worker-1", Some(30))?;
//!
//! let swapped = client.cas("/locks/job", "worker-1", "worker-2")?;
//! if swapped.is_error() {
//!     // someone else holds it
//! }
//!
//! // From async code
//! let event = client.watch_with("/locks", WatchOptions::new().recursive()).await?;
//! ```

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod keys;
pub mod model;
pub mod status;
pub mod watch;

pub use classify::{Expectation, Outcome};
pub use client::EtcdClient;
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use error::Error;
pub use keys::WatchOptions;
pub use model::{EtcdResult, EtcdResultList, Node};
pub use status::ErrorCode;
pub use watch::{PendingResult, Watch};

pub use etcdv2_http::{Transport, TransportConfig};
