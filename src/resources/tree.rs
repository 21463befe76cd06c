//! Traversal from the resource tree root.
//!
//! # Responsibilities
//! - Walk path segments left to right from `Root`
//! - Map each segment to a child accessor of the current node
//! - Collect typed identifiers into a `ResourceChain`
//!
//! # Tree
//! ```text
//! Root (home)
//! └── backends                         BackendCollection
//!     └── {backend}                    Backend
//!         ├── machines                 MachineCollection
//!         │   └── {machine}            Machine
//!         │       ├── metadata         MachineMetadata
//!         │       └── shell            MachineShell
//!         ├── images                   ImageCollection
//!         │   └── {image}              Image (not addressable)
//!         │       └── metadata         ImageMetadata
//!         ├── sizes                    SizeCollection
//!         └── locations                LocationCollection
//! ```
//!
//! A chain can be resolved from a raw path (`resolve`) or from a resource kind
//! and the placeholder values a route extracted (`resolve_kind`). Both walk the
//! same tree, so a route's URL layout is independent of the tree's shape.
//!
//! # Design Decisions
//! - Pure function of (path, topology); resolving twice yields equal chains
//! - Unresolvable segments report the partial chain for diagnostics

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::resources::chain::{
    BackendRef, ImageRef, MachineRef, ResourceChain, ResourceKind, ResourceRef,
};
use crate::resources::topology::Topology;
use crate::routing::PathParams;

/// A path segment (or a whole path) did not resolve to a resource.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe(.path, .segment.as_deref()))]
pub struct ResourceNotFoundError {
    /// The full request path.
    pub path: String,
    /// The segment that failed to resolve; `None` when every segment resolved
    /// but the final node is not an addressable resource.
    pub segment: Option<String>,
    /// Identifiers resolved before the failure.
    pub resolved: Vec<ResourceRef>,
}

fn describe(path: &str, segment: Option<&str>) -> String {
    match segment {
        Some(segment) => format!("resource `{}` not found in {}", segment, path),
        None => format!("{} does not address a resource", path),
    }
}

#[derive(Debug, Clone)]
enum Node {
    Root,
    BackendCollection,
    Backend(BackendRef),
    MachineCollection(BackendRef),
    Machine,
    MachineMetadata,
    MachineShell,
    ImageCollection(BackendRef),
    Image,
    ImageMetadata,
    SizeCollection,
    LocationCollection,
}

impl Node {
    fn kind(&self) -> Option<ResourceKind> {
        match self {
            Node::Root => Some(ResourceKind::Home),
            Node::BackendCollection => Some(ResourceKind::BackendCollection),
            Node::MachineCollection(_) => Some(ResourceKind::MachineCollection),
            Node::Machine => Some(ResourceKind::Machine),
            Node::MachineMetadata => Some(ResourceKind::MachineMetadata),
            Node::MachineShell => Some(ResourceKind::MachineShell),
            Node::ImageCollection(_) => Some(ResourceKind::ImageCollection),
            Node::ImageMetadata => Some(ResourceKind::ImageMetadata),
            Node::SizeCollection => Some(ResourceKind::SizeCollection),
            Node::LocationCollection => Some(ResourceKind::LocationCollection),
            Node::Backend(_) | Node::Image => None,
        }
    }
}

/// The traversal entry point.
#[derive(Clone)]
pub struct Root {
    topology: Arc<dyn Topology>,
}

impl Root {
    /// Create a root over a topology.
    pub fn new(topology: Arc<dyn Topology>) -> Self {
        Self { topology }
    }

    /// Resolve a path into a chain of typed identifiers.
    pub fn resolve(&self, path: &str) -> Result<ResourceChain, ResourceNotFoundError> {
        self.walk(path, path.split('/').filter(|s| !s.is_empty()))
    }

    /// Resolve a resource of `kind` from placeholder values keyed by name.
    ///
    /// `path` is only used for error reporting. A missing placeholder is
    /// reported as an unresolved path with no failing segment.
    pub fn resolve_kind(
        &self,
        kind: ResourceKind,
        params: &PathParams,
        path: &str,
    ) -> Result<ResourceChain, ResourceNotFoundError> {
        let missing = || ResourceNotFoundError {
            path: path.to_string(),
            segment: None,
            resolved: Vec::new(),
        };
        let param = |name: &str| params.get(name).map(String::as_str).ok_or_else(missing);

        let segments = match kind {
            ResourceKind::Home => vec![],
            ResourceKind::BackendCollection => vec!["backends"],
            ResourceKind::MachineCollection => vec!["backends", param("backend")?, "machines"],
            ResourceKind::Machine => {
                vec!["backends", param("backend")?, "machines", param("machine")?]
            }
            ResourceKind::MachineMetadata => {
                vec!["backends", param("backend")?, "machines", param("machine")?, "metadata"]
            }
            ResourceKind::MachineShell => {
                vec!["backends", param("backend")?, "machines", param("machine")?, "shell"]
            }
            ResourceKind::ImageCollection => vec!["backends", param("backend")?, "images"],
            ResourceKind::ImageMetadata => {
                vec!["backends", param("backend")?, "images", param("image")?, "metadata"]
            }
            ResourceKind::SizeCollection => vec!["backends", param("backend")?, "sizes"],
            ResourceKind::LocationCollection => vec!["backends", param("backend")?, "locations"],
        };

        self.walk(path, segments)
    }

    fn walk<'s>(
        &self,
        path: &str,
        segments: impl IntoIterator<Item = &'s str>,
    ) -> Result<ResourceChain, ResourceNotFoundError> {
        let mut node = Node::Root;
        let mut refs = Vec::new();

        for segment in segments {
            match self.child(&node, segment) {
                Some((next, resolved)) => {
                    refs.extend(resolved);
                    node = next;
                }
                None => {
                    return Err(ResourceNotFoundError {
                        path: path.to_string(),
                        segment: Some(segment.to_string()),
                        resolved: refs,
                    });
                }
            }
        }

        match node.kind() {
            Some(kind) => Ok(ResourceChain::new(kind, refs)),
            None => Err(ResourceNotFoundError {
                path: path.to_string(),
                segment: None,
                resolved: refs,
            }),
        }
    }

    fn child(&self, node: &Node, segment: &str) -> Option<(Node, Option<ResourceRef>)> {
        let next = match (node, segment) {
            (Node::Root, "backends") => Node::BackendCollection,
            (Node::BackendCollection, id) => {
                let backend = BackendRef::new(id);
                if !self.topology.has_backend(&backend) {
                    return None;
                }
                return Some((Node::Backend(backend.clone()), Some(ResourceRef::Backend(backend))));
            }
            (Node::Backend(b), "machines") => Node::MachineCollection(b.clone()),
            (Node::Backend(b), "images") => Node::ImageCollection(b.clone()),
            (Node::Backend(_), "sizes") => Node::SizeCollection,
            (Node::Backend(_), "locations") => Node::LocationCollection,
            (Node::MachineCollection(b), id) => {
                let machine = MachineRef::new(id);
                if !self.topology.has_machine(b, &machine) {
                    return None;
                }
                return Some((Node::Machine, Some(ResourceRef::Machine(machine))));
            }
            (Node::Machine, "metadata") => Node::MachineMetadata,
            (Node::Machine, "shell") => Node::MachineShell,
            (Node::ImageCollection(b), id) => {
                let image = ImageRef::new(id);
                if !self.topology.has_image(b, &image) {
                    return None;
                }
                return Some((Node::Image, Some(ResourceRef::Image(image))));
            }
            (Node::Image, "metadata") => Node::ImageMetadata,
            _ => return None,
        };
        Some((next, None))
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("topology", &self.topology)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendSpec;
    use crate::resources::topology::Inventory;

    fn root() -> Root {
        Root::new(Arc::new(Inventory::from_backends(&[
            BackendSpec::new("aws1", "ec2"),
            BackendSpec::new("acme", "openstack")
                .with_machines(["web-1"])
                .with_images(["ubuntu"]),
        ])))
    }

    #[test]
    fn test_resolve_home() {
        let chain = root().resolve("/").unwrap();
        assert_eq!(chain.kind(), ResourceKind::Home);
        assert!(chain.is_empty());
    }

    #[test]
    fn test_resolve_machine_shell() {
        let chain = root().resolve("/backends/aws1/machines/i-123/shell").unwrap();
        assert_eq!(chain.kind(), ResourceKind::MachineShell);
        assert_eq!(
            chain.refs(),
            &[
                ResourceRef::Backend(BackendRef::new("aws1")),
                ResourceRef::Machine(MachineRef::new("i-123")),
            ]
        );
    }

    #[test]
    fn test_resolve_image_metadata() {
        let chain = root().resolve("/backends/acme/images/ubuntu/metadata").unwrap();
        assert_eq!(chain.kind(), ResourceKind::ImageMetadata);
        assert_eq!(chain.image().map(ImageRef::as_str), Some("ubuntu"));
    }

    #[test]
    fn test_unknown_backend_reports_segment() {
        let err = root().resolve("/backends/nope/sizes").unwrap_err();
        assert_eq!(err.segment.as_deref(), Some("nope"));
        assert!(err.resolved.is_empty());
    }

    #[test]
    fn test_unknown_machine_keeps_partial_chain() {
        let err = root()
            .resolve("/backends/acme/machines/does-not-exist/metadata")
            .unwrap_err();
        assert_eq!(err.segment.as_deref(), Some("does-not-exist"));
        assert_eq!(err.resolved, vec![ResourceRef::Backend(BackendRef::new("acme"))]);
    }

    #[test]
    fn test_no_accessor_for_segment() {
        let err = root().resolve("/backends/aws1/machines/i-1/shell/extra").unwrap_err();
        assert_eq!(err.segment.as_deref(), Some("extra"));
        assert_eq!(err.resolved.len(), 2);
    }

    #[test]
    fn test_bare_backend_is_not_addressable() {
        let err = root().resolve("/backends/aws1").unwrap_err();
        assert_eq!(err.segment, None);
        assert_eq!(err.to_string(), "/backends/aws1 does not address a resource");
    }

    fn params(pairs: &[(&str, &str)]) -> PathParams {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_resolve_kind_from_placeholders() {
        let chain = root()
            .resolve_kind(
                ResourceKind::MachineMetadata,
                &params(&[("backend", "acme"), ("machine", "web-1")]),
                "/vm/acme/web-1/meta",
            )
            .unwrap();
        assert_eq!(chain.kind(), ResourceKind::MachineMetadata);
        assert_eq!(chain, root().resolve("/backends/acme/machines/web-1/metadata").unwrap());
    }

    #[test]
    fn test_resolve_kind_checks_topology() {
        let err = root()
            .resolve_kind(
                ResourceKind::ImageMetadata,
                &params(&[("backend", "acme"), ("image", "centos")]),
                "/img/acme/centos",
            )
            .unwrap_err();
        assert_eq!(err.path, "/img/acme/centos");
        assert_eq!(err.segment.as_deref(), Some("centos"));
        assert_eq!(err.resolved, vec![ResourceRef::Backend(BackendRef::new("acme"))]);
    }

    #[test]
    fn test_resolve_kind_missing_placeholder() {
        let err = root()
            .resolve_kind(ResourceKind::SizeCollection, &PathParams::new(), "/sizes")
            .unwrap_err();
        assert_eq!(err.segment, None);
    }

    #[test]
    fn test_resolve_kind_decoded_backend() {
        let root = Root::new(Arc::new(Inventory::from_backends(&[BackendSpec::new("café", "ec2")])));
        let chain = root
            .resolve_kind(ResourceKind::SizeCollection, &params(&[("backend", "café")]), "/")
            .unwrap();
        assert_eq!(chain.backend().map(BackendRef::as_str), Some("café"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let root = root();
        let first = root.resolve("/backends/aws1/machines/i-123").unwrap();
        let second = root.resolve("/backends/aws1/machines/i-123").unwrap();
        assert_eq!(first, second);
    }
}
