//! Default handler: describes the resolved resource.

use async_trait::async_trait;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::config::{BackendSpec, ConfigurationContext};
use crate::handlers::{Handler, HandlerRequest};
use crate::resources::{ResourceKind, ResourceRef};

#[derive(Debug, Serialize)]
pub struct BackendSummary {
    pub id: String,
    pub provider: String,
    pub title: Option<String>,
    pub region: Option<String>,
    pub enabled: bool,
    /// Whether a keypair is configured for the provider. Key material is never returned.
    pub has_keypair: bool,
}

impl BackendSummary {
    fn new(spec: &BackendSpec, context: &ConfigurationContext) -> Self {
        Self {
            id: spec.id.clone(),
            provider: spec.provider.clone(),
            title: spec.title.clone(),
            region: spec.region.clone(),
            enabled: spec.enabled,
            has_keypair: context.keypair(&spec.provider).is_some(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResourceDescription {
    pub route: String,
    pub kind: ResourceKind,
    pub chain: Vec<ResourceRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backends: Option<Vec<BackendSummary>>,
}

/// Read-only handler bound to every route that has no dedicated handler.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescribeHandler;

impl DescribeHandler {
    pub fn describe(request: &HandlerRequest) -> ResourceDescription {
        let context = &request.context;
        let backends = match request.chain.kind() {
            ResourceKind::Home | ResourceKind::BackendCollection => Some(
                context
                    .backends()
                    .iter()
                    .map(|spec| BackendSummary::new(spec, context))
                    .collect(),
            ),
            _ => None,
        };
        let backend = request
            .chain
            .backend()
            .and_then(|b| context.backend(b.as_str()))
            .map(|spec| BackendSummary::new(spec, context));

        ResourceDescription {
            route: request.route_id.clone(),
            kind: request.chain.kind(),
            chain: request.chain.refs().to_vec(),
            backend,
            backends,
        }
    }
}

#[async_trait]
impl Handler for DescribeHandler {
    async fn handle(&self, request: HandlerRequest) -> Response {
        if request.method != Method::GET && request.method != Method::HEAD {
            return (
                StatusCode::METHOD_NOT_ALLOWED,
                [(header::ALLOW, "GET, HEAD")],
                "Method not allowed",
            )
                .into_response();
        }
        Json(Self::describe(&request)).into_response()
    }
}
