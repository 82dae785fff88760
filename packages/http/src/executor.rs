//! HTTP execution abstraction.
//!
//! [`HttpExecutor`] is the seam between the etcd client and the network.
//! The production implementation drives a pooled reqwest client; tests swap
//! in [`mock::MockExecutor`] to avoid real network calls.

use async_trait::async_trait;
use reqwest::Client;
use tracing::trace;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{HttpRequest, HttpResponse};

/// Trait for executing HTTP requests.
///
/// Each call issues exactly one request and never retries. The returned
/// response owns its fully-read body, so the connection is back in the pool
/// by the time the future resolves.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

/// Production HTTP executor using reqwest.
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Build a pooled client from the transport settings.
    ///
    /// Only the connect phase is bounded here. Overall request timeouts are
    /// set per request so long-poll watches can outlive them.
    pub fn new(config: &TransportConfig) -> Result<Self, Error> {
        let mut builder = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host);

        if let Some(user_agent) = &config.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(&TransportConfig::default())
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
        let method: http::Method = request.method.into();

        let mut req_builder = self.client.request(method, &request.url);

        if !request.form.is_empty() {
            req_builder = req_builder.form(&request.form);
        }

        if let Some(timeout) = request.timeout {
            req_builder = req_builder.timeout(timeout);
        }

        let response = req_builder.send().await?;

        let status = response.status().as_u16();
        let status_text = response
            .status()
            .canonical_reason()
            .unwrap_or("Unknown")
            .to_string();

        // Always read to the end, whatever the status, so the connection
        // can be reused.
        let body_text = response.text().await?;
        trace!(status, bytes = body_text.len(), "response drained");

        Ok(HttpResponse {
            status,
            status_text,
            body: Some(body_text).filter(|b| !b.is_empty()),
        })
    }
}

/// Mock HTTP executor for testing.
///
/// Returns predefined responses based on request matching.
#[cfg(any(test, feature = "test-util"))]
pub mod mock {
    use super::*;
    use crate::types::Method;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// A mock HTTP executor that returns predefined responses.
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Responses keyed by `"METHOD /path"` or by bare `/path`.
        responses: Arc<Mutex<HashMap<String, HttpResponse>>>,
        /// Default response when no match found.
        default_response: Arc<Mutex<Option<HttpResponse>>>,
        /// Recorded requests for verification.
        recorded_requests: Arc<Mutex<Vec<HttpRequest>>>,
        /// Error message to fail every request with.
        failure: Arc<Mutex<Option<String>>>,
        /// Hold every request open forever.
        never_respond: Arc<Mutex<bool>>,
        delay: Arc<Mutex<Option<Duration>>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Add a response for a URL path, any method.
        pub fn with_response(self, path: impl Into<String>, response: HttpResponse) -> Self {
            self.responses.lock().unwrap().insert(path.into(), response);
            self
        }

        /// Add a response for a method and URL path.
        pub fn with_method_response(
            self,
            method: Method,
            path: impl Into<String>,
            response: HttpResponse,
        ) -> Self {
            let key = format!("{} {}", method, path.into());
            self.responses.lock().unwrap().insert(key, response);
            self
        }

        /// Set a default response when no path matches.
        pub fn with_default_response(self, response: HttpResponse) -> Self {
            *self.default_response.lock().unwrap() = Some(response);
            self
        }

        /// Configure to fail all requests with an error.
        pub fn fail_with(self, message: impl Into<String>) -> Self {
            *self.failure.lock().unwrap() = Some(message.into());
            self
        }

        /// Never resolve any request, like a watch with no qualifying event.
        pub fn never_respond(self) -> Self {
            *self.never_respond.lock().unwrap() = true;
            self
        }

        /// Delay every response.
        pub fn with_delay(self, delay: Duration) -> Self {
            *self.delay.lock().unwrap() = Some(delay);
            self
        }

        pub fn recorded_requests(&self) -> Vec<HttpRequest> {
            self.recorded_requests.lock().unwrap().clone()
        }

        pub fn clear_recorded(&self) {
            self.recorded_requests.lock().unwrap().clear();
        }

        /// A response carrying `body` as JSON text.
        pub fn json_response(status: u16, body: impl Into<String>) -> HttpResponse {
            HttpResponse::new(status, Some(body.into()))
        }

        /// A bodiless response.
        pub fn empty_response(status: u16) -> HttpResponse {
            HttpResponse::new(status, None)
        }

        fn lookup(&self, request: &HttpRequest) -> HttpResponse {
            let path = url::Url::parse(&request.url)
                .map(|u| u.path().to_string())
                .unwrap_or_else(|_| request.url.clone());

            let responses = self.responses.lock().unwrap();
            let keyed = format!("{} {}", request.method, path);
            if let Some(response) = responses.get(&keyed).or_else(|| responses.get(&path)) {
                return response.clone();
            }

            if let Some(ref response) = *self.default_response.lock().unwrap() {
                return response.clone();
            }

            Self::empty_response(404)
        }
    }

    #[async_trait]
    impl HttpExecutor for MockExecutor {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
            self.recorded_requests.lock().unwrap().push(request.clone());

            let failure = self.failure.lock().unwrap().clone();
            if let Some(message) = failure {
                return Err(Error::Executor { message });
            }

            let never = *self.never_respond.lock().unwrap();
            if never {
                std::future::pending::<()>().await;
            }

            let delay = *self.delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            Ok(self.lookup(&request))
        }
    }
}
