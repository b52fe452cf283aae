//! reqwest transport for the cachet caching API client.
//!
//! ```no_run
//! use cachet::{CachingClient, Pipeline, RequestConfig};
//! use cachet_reqwest::ReqwestTransport;
//!
//! # async fn run() -> Result<(), cachet::ApiError> {
//! let transport = ReqwestTransport::new("http://localhost:5320");
//! let client = CachingClient::builder(Pipeline::new(transport)).build();
//! let files: serde_json::Value = client
//!     .get("/api/v1/couldfile/list", RequestConfig::new())
//!     .await?;
//! # let _ = files;
//! # Ok(())
//! # }
//! ```

mod transport;

pub use transport::ReqwestTransport;

/// Re-export of the middleware client type accepted by
/// [`ReqwestTransport::with_client`].
pub use reqwest_middleware::ClientWithMiddleware;
