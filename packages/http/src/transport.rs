//! The owned I/O resource behind every etcd call.
//!
//! A [`Transport`] bundles an [`HttpExecutor`] (the connection pool) with the
//! tokio runtime that drives it. Calls are spawned onto that runtime and come
//! back as a [`ResponseFuture`], which callers either `.await` or block on
//! with [`ResponseFuture::wait`]. Many long-poll requests can be outstanding
//! at once without holding a thread each.
//!
//! ```ignore
//! use etcdv2_http::{HttpRequest, Transport, TransportConfig};
//!
//! let transport = Transport::new(&TransportConfig::default())?;
//! let response = transport
//!     .execute(HttpRequest::get("http://127.0.0.1:4001/version"))
//!     .wait()?;
//! transport.shutdown(Duration::from_secs(1));
//! ```

use std::future::Future;
use std::pin::{pin, Pin};
use std::sync::Arc;
use std::task::{Context, Poll, Wake, Waker};
use std::thread::{self, Thread};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::runtime::{Handle, Runtime};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::debug;

use crate::error::Error;
use crate::executor::{HttpExecutor, ReqwestExecutor};
use crate::types::{HttpRequest, HttpResponse};

/// Settings for the connection pool and its I/O runtime.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransportConfig {
    /// Runtime worker threads. `None` uses one per core.
    pub worker_threads: Option<usize>,

    /// Bound on establishing a TCP connection.
    pub connect_timeout: Duration,

    /// How long an idle pooled connection is kept.
    pub pool_idle_timeout: Option<Duration>,

    pub pool_max_idle_per_host: usize,

    pub user_agent: Option<String>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            user_agent: Some(concat!("etcdv2/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

/// An explicitly owned connection pool plus the runtime its I/O runs on.
///
/// Share one transport between clients by wrapping it in an `Arc`. Dropping
/// the last reference shuts an owned runtime down in the background; call
/// [`Transport::shutdown`] to wait for that instead.
pub struct Transport {
    executor: Arc<dyn HttpExecutor>,
    runtime: Option<Runtime>,
    handle: Handle,
}

impl Transport {
    /// Create a transport with its own runtime and a reqwest connection pool.
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        let executor = ReqwestExecutor::new(config)?;
        Self::with_executor(Arc::new(executor), config)
    }

    /// Create a transport with its own runtime around a custom executor.
    pub fn with_executor(
        executor: Arc<dyn HttpExecutor>,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_name("etcdv2-io");
        if let Some(threads) = config.worker_threads {
            builder.worker_threads(threads);
        }
        let runtime = builder.build()?;
        let handle = runtime.handle().clone();

        Ok(Self {
            executor,
            runtime: Some(runtime),
            handle,
        })
    }

    /// Run requests on a runtime the caller owns. Shutting this transport
    /// down leaves that runtime untouched.
    pub fn with_handle(executor: Arc<dyn HttpExecutor>, handle: Handle) -> Self {
        Self {
            executor,
            runtime: None,
            handle,
        }
    }

    /// Issue one request. The returned future resolves when the executor
    /// finishes; nothing is retried.
    pub fn execute(&self, request: HttpRequest) -> ResponseFuture {
        debug!(method = %request.method, url = %request.url, "issuing request");

        let (tx, rx) = oneshot::channel();
        let executor = Arc::clone(&self.executor);
        let task = self.handle.spawn(async move {
            let result = executor.execute(request).await;
            // A closed receiver means the caller gave up on this call.
            let _ = tx.send(result);
        });

        ResponseFuture {
            rx,
            abort: AbortOnDrop(task.abort_handle()),
            owns_runtime: self.runtime.is_some(),
        }
    }

    /// Stop the owned runtime, waiting up to `timeout` for its workers.
    /// Outstanding calls resolve to [`Error::Interrupted`].
    ///
    /// Blocks, so it must not be called from inside an async context.
    pub fn shutdown(mut self, timeout: Duration) {
        if let Some(runtime) = self.runtime.take() {
            debug!("shutting down transport runtime");
            runtime.shutdown_timeout(timeout);
        }
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("owns_runtime", &self.runtime.is_some())
            .finish_non_exhaustive()
    }
}

struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// The pending result of one [`Transport::execute`] call.
///
/// Dropping it before it resolves aborts the request and closes its
/// connection.
pub struct ResponseFuture {
    rx: oneshot::Receiver<Result<HttpResponse, Error>>,
    abort: AbortOnDrop,
    owns_runtime: bool,
}

impl ResponseFuture {
    /// Block the current thread until the response arrives.
    ///
    /// When the transport owns its runtime the I/O runs on that runtime's
    /// workers, so this may be called from any thread, async tasks
    /// included. A transport built with [`Transport::with_handle`] shares the
    /// caller's runtime: there this panics if called from inside an async
    /// context, and the future should be `.await`ed instead.
    pub fn wait(self) -> Result<HttpResponse, Error> {
        let ResponseFuture {
            rx,
            abort,
            owns_runtime,
        } = self;

        let received = if owns_runtime {
            park_until_ready(rx)
        } else {
            rx.blocking_recv()
        };

        drop(abort);
        received.unwrap_or(Err(Error::Interrupted))
    }

    /// Abort the request. Waiters see [`Error::Interrupted`].
    pub fn cancel(&self) {
        self.abort.0.abort();
    }

    /// True once the underlying task has stopped, with or without a result.
    pub fn is_finished(&self) -> bool {
        self.abort.0.is_finished()
    }
}

impl Future for ResponseFuture {
    type Output = Result<HttpResponse, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(Error::Interrupted)))
    }
}

impl std::fmt::Debug for ResponseFuture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseFuture")
            .field("finished", &self.is_finished())
            .finish()
    }
}

struct ThreadWaker(Thread);

impl Wake for ThreadWaker {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }
}

/// Poll `future` on this thread, parking between wakeups.
///
/// Only used when another runtime drives the work behind `future`. The poll
/// runs unconstrained so a surrounding task's coop budget cannot starve it.
fn park_until_ready<F: Future>(future: F) -> F::Output {
    let waker = Waker::from(Arc::new(ThreadWaker(thread::current())));
    let mut cx = Context::from_waker(&waker);
    let mut future = pin!(tokio::task::unconstrained(future));

    loop {
        match future.as_mut().poll(&mut cx) {
            Poll::Ready(output) => return output,
            Poll::Pending => thread::park(),
        }
    }
}
