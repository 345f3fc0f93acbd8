use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::api::{self, AppState};
use super::clock::SystemClock;
use super::identity::IdentityProvider;
use super::notify::RecordingNotifier;
use super::remote::RecordStore;
use super::service::KanbanService;

/// Configuration for the board server.
pub struct ServerConfig {
    pub port: u16,
    pub dev_mode: bool,
    /// Sign the configured identity in as soon as the server is up.
    pub auto_login: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3142,
            dev_mode: false,
            auto_login: true,
        }
    }
}

/// Build the full application router with request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    api::api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Wire a service to the record store and identity provider, and keep it
/// following the provider's auth state in the background.
pub fn build_state(
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityProvider>,
) -> Arc<AppState> {
    let notices = Arc::new(RecordingNotifier::new());
    let service = Arc::new(Mutex::new(KanbanService::new(
        store,
        notices.clone(),
        Arc::new(SystemClock),
    )));
    tokio::spawn(KanbanService::follow_auth(
        service.clone(),
        identity.subscribe(),
    ));
    Arc::new(AppState {
        service,
        identity,
        notices,
    })
}

/// Start the board server.
pub async fn start_server(
    config: ServerConfig,
    store: Arc<dyn RecordStore>,
    identity: Arc<dyn IdentityProvider>,
) -> Result<()> {
    let state = build_state(store, identity.clone());

    if config.auto_login {
        let user = identity.login().await.context("Failed to sign in")?;
        tracing::info!(user = %user.id, "Signed in configured identity");
    }

    let mut app = build_router(state);

    if config.dev_mode {
        app = app.layer(CorsLayer::permissive());
    }

    let host = if config.dev_mode { "0.0.0.0" } else { "127.0.0.1" };
    let addr = format!("{}:{}", host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    println!("Taskboard running at http://{}", local_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    println!("Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    println!("\nShutting down...");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::identity::{Identity, StaticIdentityProvider};
    use crate::board::remote::MemoryRecordStore;
    use crate::board::service::DataSource;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn provider() -> Arc<StaticIdentityProvider> {
        Arc::new(StaticIdentityProvider::new(Identity {
            id: "user-1".into(),
            email: "grace@example.com".into(),
            display_name: Some("Grace".into()),
        }))
    }

    async fn wait_for_session(state: &AppState) -> Option<DataSource> {
        for _ in 0..100 {
            if let Some(source) = state.service.lock().await.source() {
                return Some(source);
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        None
    }

    #[tokio::test]
    async fn test_health_via_full_router() {
        let state = build_state(Arc::new(MemoryRecordStore::new()), provider());
        let app = build_router(state);
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_through_provider_starts_session() {
        let identity = provider();
        let state = build_state(Arc::new(MemoryRecordStore::new()), identity.clone());
        assert!(state.service.lock().await.source().is_none());

        identity.login().await.unwrap();
        assert_eq!(wait_for_session(&state).await, Some(DataSource::Demo));

        let app = build_router(state);
        let req = Request::builder()
            .uri("/api/dashboard")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let summary: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(summary["boardCount"], 3);
    }

    #[tokio::test]
    async fn test_logout_through_provider_ends_session() {
        let identity = provider();
        let state = build_state(Arc::new(MemoryRecordStore::new()), identity.clone());
        identity.login().await.unwrap();
        assert!(wait_for_session(&state).await.is_some());

        identity.logout().await.unwrap();
        for _ in 0..100 {
            if state.service.lock().await.source().is_none() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("session was not torn down after logout");
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3142);
        assert!(!config.dev_mode);
        assert!(config.auto_login);
    }
}
