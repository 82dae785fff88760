//! Pending calls and long-poll watches.
//!
//! [`PendingResult`] is the only place a transport future is turned into a
//! typed outcome: it polls the [`ResponseFuture`] and classifies the
//! response once it lands. Blocking calls wait on it; [`Watch`] hands it to
//! the caller.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use etcdv2_http::ResponseFuture;

use crate::classify::{classify, Expectation, Outcome};
use crate::error::Error;
use crate::model::EtcdResult;

/// A request in flight, classified against its operation's expectation
/// when it resolves.
#[derive(Debug)]
pub struct PendingResult {
    response: ResponseFuture,
    expectation: Expectation,
}

impl PendingResult {
    pub(crate) fn new(response: ResponseFuture, expectation: Expectation) -> Self {
        Self {
            response,
            expectation,
        }
    }

    /// Block until the response arrives, then classify it.
    pub fn wait(self) -> Result<Outcome, Error> {
        let response = self.response.wait()?;
        classify(response, &self.expectation)
    }

    pub fn cancel(&self) {
        self.response.cancel();
    }
}

impl Future for PendingResult {
    type Output = Result<Outcome, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let expectation = self.expectation;
        Pin::new(&mut self.response).poll(cx).map(|received| {
            let response = received?;
            classify(response, &expectation)
        })
    }
}

/// A single long-poll for the next change to a key.
///
/// Resolves once, when the server reports a qualifying change, with the
/// change's result. `Ok(None)` means the server ended the long-poll with an
/// empty 200 and no event was delivered. There is no timeout: wrap the
/// future in one if needed.
/// Dropping or cancelling an unresolved watch aborts the request and closes
/// its connection, so no event is delivered afterwards.
#[must_use = "a watch does nothing useful unless awaited or waited on"]
#[derive(Debug)]
pub struct Watch {
    key: String,
    state: WatchState,
}

#[derive(Debug)]
enum WatchState {
    Pending(PendingResult),
    /// The request could not be built; the error is handed out on first poll.
    Failed(Option<Error>),
}

impl Watch {
    pub(crate) fn pending(key: impl Into<String>, pending: PendingResult) -> Self {
        Self {
            key: key.into(),
            state: WatchState::Pending(pending),
        }
    }

    pub(crate) fn failed(key: impl Into<String>, error: Error) -> Self {
        Self {
            key: key.into(),
            state: WatchState::Failed(Some(error)),
        }
    }

    /// The watched key, as given by the caller.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Block the current thread until the watch fires.
    ///
    /// Prefer `.await` from async code. Blocking there is only safe when the
    /// client owns its transport runtime, see
    /// [`ResponseFuture::wait`](etcdv2_http::ResponseFuture::wait).
    pub fn wait(self) -> Result<Option<EtcdResult>, Error> {
        match self.state {
            WatchState::Pending(pending) => into_event(pending.wait()),
            WatchState::Failed(error) => Err(error.unwrap_or(Error::EmptyBody)),
        }
    }

    /// Abandon the long-poll.
    pub fn cancel(&self) {
        if let WatchState::Pending(pending) = &self.state {
            pending.cancel();
        }
    }
}

impl Future for Watch {
    type Output = Result<Option<EtcdResult>, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.state {
            WatchState::Pending(pending) => Pin::new(pending).poll(cx).map(into_event),
            WatchState::Failed(error) => {
                Poll::Ready(Err(error.take().unwrap_or(Error::EmptyBody)))
            }
        }
    }
}

fn into_event(outcome: Result<Outcome, Error>) -> Result<Option<EtcdResult>, Error> {
    Ok(outcome?.into_result())
}
