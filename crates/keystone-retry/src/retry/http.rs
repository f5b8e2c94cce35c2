//! HTTP fetch adapter
//!
//! Sends requests to the backend API through a retry executor. Non-2xx
//! responses become `HttpError::Status`, so the default classifier can tell
//! a 503 worth retrying from a 404 that is not.

use reqwest::{Client, RequestBuilder, Response};
use thiserror::Error;

use super::classify::{Classify, DefaultClassifier, FailureKind};
use super::executor::{RetryExecutor, RetryExecutorBuilder};
use super::observer::{NoOpObserver, RetryObserver};
use super::outcome::RetryOutcome;
use super::predicates::RetryPredicate;
use crate::types::RetryPolicy;

/// Errors produced by a single HTTP attempt
#[derive(Error, Debug)]
pub enum HttpError {
    /// The request never produced a response
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },
}

impl HttpError {
    /// The response status, if the server answered
    pub fn status(&self) -> Option<u16> {
        self.failure_kind().status()
    }
}

impl Classify for HttpError {
    fn failure_kind(&self) -> FailureKind {
        match self {
            HttpError::Transport(source) => source.failure_kind(),
            HttpError::Status { status, .. } => FailureKind::HttpStatus(*status),
        }
    }
}

/// An HTTP client whose requests are retried according to a policy
#[derive(Debug, Clone)]
pub struct HttpRetry<P = DefaultClassifier, O = NoOpObserver> {
    client: Client,
    executor: RetryExecutor<P, O>,
}

impl HttpRetry<DefaultClassifier, NoOpObserver> {
    /// Create an adapter with the default classifier
    pub fn new(client: Client, policy: RetryPolicy) -> Self {
        Self::with_executor(client, RetryExecutor::new(policy))
    }

    /// Create an adapter with the default classifier and an observer
    pub fn with_observer<O2>(
        client: Client,
        policy: RetryPolicy,
        observer: O2,
    ) -> HttpRetry<DefaultClassifier, O2> {
        HttpRetry::with_executor(
            client,
            RetryExecutorBuilder::new()
                .with_policy(policy)
                .with_observer(observer)
                .build(),
        )
    }
}

impl<P, O> HttpRetry<P, O> {
    /// Create an adapter around an already configured executor
    pub fn with_executor(client: Client, executor: RetryExecutor<P, O>) -> Self {
        Self { client, executor }
    }

    /// The underlying HTTP client
    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl<P, O> HttpRetry<P, O>
where
    P: RetryPredicate<HttpError>,
    O: RetryObserver<HttpError>,
{
    /// Send a request, rebuilding it with `build` for every attempt
    pub async fn fetch<F>(&self, build: F) -> RetryOutcome<Response, HttpError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.executor
            .execute(|| dispatch(build(&self.client)))
            .await
    }

    /// Send a request and unwrap the outcome into a plain result
    pub async fn send<F>(&self, build: F) -> Result<Response, HttpError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        self.fetch(build).await.into_result()
    }

    /// GET `url` with retries
    pub async fn get(&self, url: &str) -> Result<Response, HttpError> {
        self.send(|client| client.get(url)).await
    }
}

async fn dispatch(request: RequestBuilder) -> Result<Response, HttpError> {
    let response = request.send().await?;
    let status = response.status();

    if status.is_success() {
        Ok(response)
    } else {
        tracing::debug!(
            url = %response.url(),
            status = status.as_u16(),
            "request returned non-success status"
        );
        Err(HttpError::Status {
            url: response.url().to_string(),
            status: status.as_u16(),
        })
    }
}
