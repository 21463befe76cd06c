//! Route table and lookup.
//!
//! # Responsibilities
//! - Store compiled routes in registration order
//! - Reject duplicate ids and patterns that cannot address their kind
//! - Look up the matching route for a path
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) pattern scan (acceptable for the route count)
//! - Most literal segments wins; registration order breaks ties
//! - Explicit no-match rather than silent default

use thiserror::Error;

use crate::resources::ResourceKind;
use crate::routing::matcher::{PathParams, PathPattern, PatternError};

/// Errors raised while building the route table. All are fatal at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route `{0}` is already registered")]
    Duplicate(String),

    #[error("route `{id}`: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: PatternError,
    },

    #[error("route `{id}`: pattern placeholders {found:?} do not address {kind} (expected {expected:?})")]
    KindMismatch {
        id: String,
        kind: ResourceKind,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("no route `{0}` to bind a handler to")]
    UnknownRoute(String),
}

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteSpec {
    id: String,
    pattern: PathPattern,
    kind: ResourceKind,
}

impl RouteSpec {
    /// Unique route id, used for handler binding.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The compiled path template.
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// The resource kind the route addresses.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }
}

/// A route that matched a path, with its extracted placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a RouteSpec,
    pub params: PathParams,
}

/// Ordered set of routes.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<RouteSpec>,
}

impl RouteTable {
    /// Create an empty route table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The service's route set, in registration order.
    pub fn standard() -> Result<Self, RouteError> {
        let mut table = Self::new();
        table.register("home", "/", ResourceKind::Home)?;
        table.register("backends", "/backends", ResourceKind::BackendCollection)?;

        table.register("machines", "/backends/{backend}/machines", ResourceKind::MachineCollection)?;
        table.register("machine", "/backends/{backend}/machines/{machine}", ResourceKind::Machine)?;
        table.register(
            "machine_metadata",
            "/backends/{backend}/machines/{machine}/metadata",
            ResourceKind::MachineMetadata,
        )?;
        table.register(
            "machine_shell",
            "/backends/{backend}/machines/{machine}/shell",
            ResourceKind::MachineShell,
        )?;

        table.register("images", "/backends/{backend}/images", ResourceKind::ImageCollection)?;
        table.register(
            "image_metadata",
            "/backends/{backend}/images/{image}/metadata",
            ResourceKind::ImageMetadata,
        )?;

        table.register("sizes", "/backends/{backend}/sizes", ResourceKind::SizeCollection)?;

        table.register("locations", "/backends/{backend}/locations", ResourceKind::LocationCollection)?;
        Ok(table)
    }

    /// Add a route. On error the table is left unchanged.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        pattern: &str,
        kind: ResourceKind,
    ) -> Result<&RouteSpec, RouteError> {
        let id = id.into();
        if self.get(&id).is_some() {
            return Err(RouteError::Duplicate(id));
        }

        let pattern = PathPattern::parse(pattern).map_err(|source| RouteError::InvalidPattern {
            id: id.clone(),
            source,
        })?;

        let expected = kind.required_placeholders();
        let found = pattern.placeholders();
        if found != expected {
            return Err(RouteError::KindMismatch {
                id,
                kind,
                expected: expected.iter().map(ToString::to_string).collect(),
                found: found.iter().map(ToString::to_string).collect(),
            });
        }

        tracing::debug!(route = %id, pattern = %pattern, kind = %kind, "Route registered");
        let index = self.routes.len();
        self.routes.push(RouteSpec { id, pattern, kind });
        Ok(&self.routes[index])
    }

    /// Look up a route by id.
    pub fn get(&self, id: &str) -> Option<&RouteSpec> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// Routes in registration order.
    pub fn routes(&self) -> &[RouteSpec] {
        &self.routes
    }

    /// Number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Find the route for a path.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let mut best: Option<RouteMatch<'_>> = None;
        for route in &self.routes {
            let Some(params) = route.pattern.matches(path) else {
                continue;
            };
            // Strictly greater: earlier registrations win ties.
            let better = best
                .as_ref()
                .map(|b| route.pattern.specificity() > b.route.pattern.specificity())
                .unwrap_or(true);
            if better {
                best = Some(RouteMatch { route, params });
            }
        }
        best
    }
}
