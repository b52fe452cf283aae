#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! Caching API client with session management.
//!
//! [`CachingClient`] memoizes idempotent reads with per-endpoint TTLs and
//! purges related reads when a mutation succeeds. [`SessionGuard`] sits in
//! the request [`Pipeline`], attaches the access token and refreshes it
//! exactly once when concurrent requests find it expired.
//!
//! ```no_run
//! use cachet::{CachingClient, ClientConfig, Pipeline, RequestConfig, SessionGuard};
//! use cachet::session::{Credentials, EndpointRefresher};
//! # use cachet::{ApiRequest, ApiResponse, Transport, TransportError};
//! # struct Http;
//! # #[async_trait::async_trait]
//! # impl Transport for Http {
//! #     async fn execute(&self, _: ApiRequest) -> Result<ApiResponse, TransportError> {
//! #         unimplemented!()
//! #     }
//! # }
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::default();
//! let transport = std::sync::Arc::new(Http);
//!
//! let refresher = EndpointRefresher::new(
//!     Pipeline::new(transport.clone()),
//!     config.session.refresh_path.as_str(),
//! );
//! let session = SessionGuard::builder(config.session.clone())
//!     .refresher(refresher)
//!     .build()?;
//! session.login(Credentials::new("token")).await;
//!
//! let client = CachingClient::builder(Pipeline::builder(transport).with(session).build())
//!     .config(&config)
//!     .build();
//! let user: serde_json::Value = client
//!     .get("/api/v1/coulduser/userinfo", RequestConfig::new())
//!     .await?;
//! # let _ = user;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
#[cfg(feature = "debug")]
pub mod debug;
pub mod error;
pub mod invalidation;
pub mod metrics;
pub mod policy;
pub mod request;
pub mod response;
pub mod session;
pub mod transport;

pub use cachet_backend::{Backend, CacheStats, ClearScope, MemoryBackend};
pub use cachet_core::{CacheContext, CacheKey, CacheOverride, CachePolicy, CacheStatus};

pub use client::{CachingClient, CachingClientBuilder};
pub use config::{ClientConfig, ConfigError};
#[cfg(feature = "debug")]
pub use debug::{DebugReport, DebugRow};
pub use error::{ApiError, BoxError, TransportError};
pub use invalidation::{Category, InvalidationRouter, InvalidationRule};
pub use policy::{PolicyRule, PolicyTable};
pub use request::{ApiRequest, RequestConfig};
pub use response::{ApiResponse, Envelope};
pub use session::SessionGuard;
pub use transport::{Interceptor, Next, Pipeline, PipelineBuilder, Transport};
