//! Transport contract and the interceptor pipeline.
//!
//! A [`Pipeline`] owns one [`Transport`] and an ordered list of
//! [`Interceptor`]s. Each interceptor receives the request together with a
//! [`Next`] handle for the rest of the chain, so it can rewrite the request,
//! inspect the response and replay the request in one place.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::error::{ApiError, TransportError};
use crate::request::ApiRequest;
use crate::response::ApiResponse;

/// Performs one network exchange.
///
/// Any HTTP status is a successful exchange; only failures to get a
/// response at all are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw response.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[async_trait]
impl<T> Transport for Arc<T>
where
    T: Transport + ?Sized,
{
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        (**self).execute(request).await
    }
}

/// A step in the pipeline.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    /// Handles `request`, passing it on with `next.run(request)` zero or
    /// more times.
    async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<ApiResponse, ApiError>;
}

/// The remainder of the pipeline after the current interceptor.
///
/// Cloning is cheap; clone before `run` to send more than once.
#[derive(Clone)]
pub struct Next<'a> {
    transport: &'a dyn Transport,
    interceptors: &'a [Arc<dyn Interceptor>],
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        transport: &'a dyn Transport,
        interceptors: &'a [Arc<dyn Interceptor>],
    ) -> Self {
        Self {
            transport,
            interceptors,
        }
    }

    /// Runs the rest of the chain.
    pub fn run(mut self, request: ApiRequest) -> BoxFuture<'a, Result<ApiResponse, ApiError>> {
        if let Some((current, rest)) = self.interceptors.split_first() {
            self.interceptors = rest;
            current.handle(request, self)
        } else {
            let transport = self.transport;
            Box::pin(async move { transport.execute(request).await.map_err(ApiError::from) })
        }
    }
}

/// Transport plus interceptors, in the order they see the request.
///
/// ```
/// use cachet::{ApiRequest, ApiResponse, Pipeline, Transport, TransportError};
/// use http::{Method, StatusCode};
///
/// struct Echo;
///
/// #[async_trait::async_trait]
/// impl Transport for Echo {
///     async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
///         Ok(ApiResponse::new(StatusCode::OK, request.path))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pipeline = Pipeline::new(Echo);
/// let response = pipeline.send(ApiRequest::new(Method::GET, "/ping")).await.unwrap();
/// assert_eq!(response.body, "/ping");
/// # }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<dyn Transport>,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl Pipeline {
    /// Pipeline with no interceptors.
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::builder(transport).build()
    }

    /// Starts a pipeline over `transport`.
    pub fn builder(transport: impl Transport + 'static) -> PipelineBuilder {
        PipelineBuilder {
            transport: Arc::new(transport),
            interceptors: Vec::new(),
        }
    }

    /// Sends `request` through every interceptor and the transport.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        Next::new(self.transport.as_ref(), &self.interceptors)
            .run(request)
            .await
    }

    /// Number of interceptors.
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if requests go straight to the transport.
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    transport: Arc<dyn Transport>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl PipelineBuilder {
    /// Appends an interceptor.
    pub fn with(self, interceptor: impl Interceptor) -> Self {
        self.with_arc(Arc::new(interceptor))
    }

    /// Appends a shared interceptor.
    pub fn with_arc(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Finishes the pipeline.
    pub fn build(self) -> Pipeline {
        Pipeline {
            transport: self.transport,
            interceptors: self.interceptors.into(),
        }
    }
}
