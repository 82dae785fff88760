//! # etcdv2-http
//!
//! Non-blocking HTTP transport for the etcd v2 client.
//!
//! This crate knows nothing about etcd. It issues one HTTP request per call
//! on a shared connection pool and hands back a future for the drained
//! response:
//!
//! ```ignore
//! use etcdv2_http::{HttpRequest, Transport, TransportConfig};
//!
//! let transport = Transport::new(&TransportConfig::default())?;
//!
//! // Non-blocking: the request is already in flight
//! let pending = transport.execute(
//!     HttpRequest::put("http://127.0.0.1:4001/v2/keys/message").with_form("value", "hello"),
//! );
//!
//! // Block until it completes, or `.await` it from async code
//! let response = pending.wait()?;
//! ```

pub mod error;
pub mod executor;
pub mod transport;
pub mod types;

pub use error::Error;
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use transport::{ResponseFuture, Transport, TransportConfig};
pub use types::{HttpRequest, HttpResponse, Method};

#[cfg(any(test, feature = "test-util"))]
pub use executor::mock::MockExecutor;
