//! Cached, authenticated reads against a running admin API.
//!
//! ```sh
//! CACHET_BASE_URL=http://localhost:5320 CACHET_TOKEN=... \
//!     RUST_LOG=cachet=debug cargo run -p cachet-reqwest --example session
//! ```

use async_trait::async_trait;
use cachet::session::{Credentials, EndpointRefresher, SessionHandler};
use cachet::{CachingClient, ClientConfig, Pipeline, RequestConfig, SessionGuard};
use cachet_reqwest::ReqwestTransport;
use tracing_subscriber::EnvFilter;

struct PrintHandler;

#[async_trait]
impl SessionHandler for PrintHandler {
    async fn session_expired(&self) {
        println!("session expired, please log in again");
    }

    async fn logout(&self, _previous_token: Option<String>) {
        println!("logged out");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cachet=debug")),
        )
        .init();

    let base_url =
        std::env::var("CACHET_BASE_URL").unwrap_or_else(|_| "http://localhost:5320".to_owned());
    let config = match std::env::var("CACHET_CONFIG") {
        Ok(path) => ClientConfig::from_yaml(&std::fs::read_to_string(path)?)?,
        Err(_) => ClientConfig::default(),
    };

    let transport = ReqwestTransport::new(base_url);
    let refresher = EndpointRefresher::new(
        Pipeline::new(transport.clone()),
        config.session.refresh_path.as_str(),
    )
    .success_code(config.success_code);
    let session = SessionGuard::builder(config.session.clone())
        .refresher(refresher)
        .handler(PrintHandler)
        .build()?;

    if let Ok(token) = std::env::var("CACHET_TOKEN") {
        let mut credentials = Credentials::new(token);
        credentials.session_id = std::env::var("CACHET_SESSION").ok();
        session.login(credentials).await;
        session.mark_access_checked().await;
    }

    let client = CachingClient::builder(Pipeline::builder(transport).with(session).build())
        .config(&config)
        .build();

    println!("=== First request (cache miss) ===");
    let (user, ctx) = client
        .get_with_status::<serde_json::Value>("/api/v1/coulduser/userinfo", RequestConfig::new())
        .await?;
    println!("{}: {user}", ctx.status.as_str());

    println!("=== Second request (cache hit) ===");
    let (_, ctx) = client
        .get_with_status::<serde_json::Value>("/api/v1/coulduser/userinfo", RequestConfig::new())
        .await?;
    println!("{}", ctx.status.as_str());

    client.debug_report().await.log();
    println!("{}", client.debug_report().await);
    Ok(())
}
