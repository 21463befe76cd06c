//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the static mount and the dispatch fallback
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Dispatch requests to the routing engine and run the bound handler
//! - Observability (metrics, correlation IDs)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers::HandlerRequest;
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::observability::metrics;
use crate::routing::{DispatchError, Dispatcher};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_size: usize,
}

/// HTTP server for the API.
pub struct HttpServer {
    router: Router,
    dispatcher: Arc<Dispatcher>,
}

impl HttpServer {
    /// Create a new HTTP server around a dispatcher.
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let router = Self::build_router(dispatcher.clone());
        Self { router, dispatcher }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(dispatcher: Arc<Dispatcher>) -> Router {
        let settings = dispatcher.context().server().clone();
        let static_mount = match (dispatcher.static_prefix(), settings.static_dir.as_deref()) {
            (Some(prefix), Some(dir)) => Some((prefix.to_string(), dir.to_string())),
            _ => None,
        };

        let state = AppState {
            dispatcher,
            max_body_size: settings.max_body_size,
        };

        let mut router = Router::new();
        if let Some((prefix, dir)) = static_mount {
            tracing::info!(prefix = %prefix, dir = %dir, "Serving static assets");
            router = router.nest_service(&prefix, ServeDir::new(dir));
        }

        router
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(settings.request_timeout_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// The router, for in-process use (tests, embedding).
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The dispatcher behind the fallback route.
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Run the server until the shutdown signal fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.dispatcher.table().len(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Fallback handler: dispatch, then run the bound handler.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();
    let path = parts.uri.path();
    let request_id = request_id(&parts.headers).to_string();

    let dispatch = match state.dispatcher.dispatch(&parts.method, path) {
        Ok(dispatch) => dispatch,
        Err(err) => {
            let route = match &err {
                DispatchError::RouteNotFound { .. } => "none",
                DispatchError::ResourceNotFound { route, .. } => route.as_str(),
            };
            tracing::warn!(
                request_id = %request_id,
                reason = err.reason(),
                route = %route,
                error = %err,
                "Request not dispatched"
            );
            metrics::record_dispatch(route, err.reason());
            metrics::record_request(route, err.status().as_u16(), start_time);
            return err.into_response();
        }
    };

    let route_id = dispatch.route.id().to_string();
    metrics::record_dispatch(&route_id, "dispatched");

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, route = %route_id, error = %e, "Request body rejected");
            metrics::record_request(&route_id, StatusCode::PAYLOAD_TOO_LARGE.as_u16(), start_time);
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    let handler = dispatch.handler;
    let request = HandlerRequest {
        method: parts.method,
        route_id: route_id.clone(),
        params: dispatch.params,
        chain: dispatch.chain,
        context: dispatch.context,
        body,
    };

    let response = handler.handle(request).await;
    metrics::record_request(&route_id, response.status().as_u16(), start_time);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use tower::ServiceExt;

    use crate::config::{ConfigurationContext, Keypairs, Settings};
    use crate::handlers::Handler;
    use crate::routing::RouteTable;

    fn context(server: &[(&str, toml::Value)]) -> Arc<ConfigurationContext> {
        let mut settings: Settings = toml::from_str(
            r#"
            [server]
            max_body_size = 16

            [[backends]]
            id = "aws1"
            provider = "ec2"
            "#,
        )
        .unwrap();
        let section = settings.get_mut("server").and_then(toml::Value::as_table_mut).unwrap();
        for (key, value) in server {
            section.insert(key.to_string(), value.clone());
        }
        Arc::new(ConfigurationContext::new(settings, Settings::new(), Keypairs::new()).unwrap())
    }

    fn server() -> HttpServer {
        let dispatcher = Dispatcher::builder(RouteTable::standard().unwrap(), context(&[])).build();
        HttpServer::new(Arc::new(dispatcher))
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    struct Slow;

    #[async_trait]
    impl Handler for Slow {
        async fn handle(&self, _request: HandlerRequest) -> Response {
            tokio::time::sleep(Duration::from_secs(10)).await;
            StatusCode::OK.into_response()
        }
    }

    #[tokio::test]
    async fn test_dispatched_request_gets_request_id() {
        let response = server()
            .router()
            .oneshot(Request::get("/backends/aws1/sizes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_incoming_request_id_is_kept() {
        let response = server()
            .router()
            .oneshot(
                Request::get("/unknown")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()["x-request-id"], "req-42");
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let response = server()
            .router()
            .oneshot(
                Request::post("/backends/aws1/machines")
                    .body(Body::from("x".repeat(64)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_static_assets_served_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("app.css"), "body { margin: 0 }").unwrap();

        let context = context(&[(
            "static_dir",
            toml::Value::String(dir.path().display().to_string()),
        )]);
        let dispatcher = Dispatcher::builder(RouteTable::standard().unwrap(), context).build();
        let router = HttpServer::new(Arc::new(dispatcher)).router();

        let response = router
            .clone()
            .oneshot(Request::get("/static/app.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "body { margin: 0 }");

        // ServeDir answers misses itself; the dispatcher's JSON body never appears.
        let response = router
            .oneshot(Request::get("/static/missing.css").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!body_text(response).await.contains("reason"));
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let context = context(&[("request_timeout_secs", toml::Value::Integer(1))]);
        let dispatcher = Dispatcher::builder(RouteTable::standard().unwrap(), context)
            .bind("sizes", Arc::new(Slow))
            .unwrap()
            .build();

        let response = HttpServer::new(Arc::new(dispatcher))
            .router()
            .oneshot(Request::get("/backends/aws1/sizes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
