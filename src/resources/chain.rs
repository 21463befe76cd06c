//! Typed resource identifiers and the chains built from them.

use std::fmt;

use serde::Serialize;

/// The kind of resource a route ultimately addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Home,
    BackendCollection,
    MachineCollection,
    Machine,
    MachineMetadata,
    MachineShell,
    ImageCollection,
    ImageMetadata,
    SizeCollection,
    LocationCollection,
}

impl ResourceKind {
    /// Every kind, in route-table order.
    pub const ALL: [ResourceKind; 10] = [
        ResourceKind::Home,
        ResourceKind::BackendCollection,
        ResourceKind::MachineCollection,
        ResourceKind::Machine,
        ResourceKind::MachineMetadata,
        ResourceKind::MachineShell,
        ResourceKind::ImageCollection,
        ResourceKind::ImageMetadata,
        ResourceKind::SizeCollection,
        ResourceKind::LocationCollection,
    ];

    /// Placeholders a route pattern must carry, in path order, to address this kind.
    pub fn required_placeholders(self) -> &'static [&'static str] {
        match self {
            ResourceKind::Home | ResourceKind::BackendCollection => &[],
            ResourceKind::MachineCollection
            | ResourceKind::ImageCollection
            | ResourceKind::SizeCollection
            | ResourceKind::LocationCollection => &["backend"],
            ResourceKind::Machine | ResourceKind::MachineMetadata | ResourceKind::MachineShell => {
                &["backend", "machine"]
            }
            ResourceKind::ImageMetadata => &["backend", "image"],
        }
    }

    /// Stable snake_case name, as serialized.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Home => "home",
            ResourceKind::BackendCollection => "backend_collection",
            ResourceKind::MachineCollection => "machine_collection",
            ResourceKind::Machine => "machine",
            ResourceKind::MachineMetadata => "machine_metadata",
            ResourceKind::MachineShell => "machine_shell",
            ResourceKind::ImageCollection => "image_collection",
            ResourceKind::ImageMetadata => "image_metadata",
            ResourceKind::SizeCollection => "size_collection",
            ResourceKind::LocationCollection => "location_collection",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! resource_ref {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

resource_ref!(
    /// Identifies a configured backend.
    BackendRef
);
resource_ref!(
    /// Identifies a machine. Only meaningful under the backend it was resolved in.
    MachineRef
);
resource_ref!(
    /// Identifies an image. Only meaningful under the backend it was resolved in.
    ImageRef
);

/// One resolved identifier in a chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceRef {
    Backend(BackendRef),
    Machine(MachineRef),
    Image(ImageRef),
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceRef::Backend(b) => write!(f, "backend:{}", b),
            ResourceRef::Machine(m) => write!(f, "machine:{}", m),
            ResourceRef::Image(i) => write!(f, "image:{}", i),
        }
    }
}

/// The identifiers resolved while walking a path, plus the kind of resource
/// the walk ended on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceChain {
    kind: ResourceKind,
    refs: Vec<ResourceRef>,
}

impl ResourceChain {
    pub(crate) fn new(kind: ResourceKind, refs: Vec<ResourceRef>) -> Self {
        Self { kind, refs }
    }

    /// The kind of resource the chain ends in.
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Identifiers in path order, outermost first.
    pub fn refs(&self) -> &[ResourceRef] {
        &self.refs
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// The backend the chain lives under. `None` for home and the backend collection.
    pub fn backend(&self) -> Option<&BackendRef> {
        self.refs.iter().find_map(|r| match r {
            ResourceRef::Backend(b) => Some(b),
            _ => None,
        })
    }

    pub fn machine(&self) -> Option<&MachineRef> {
        self.refs.iter().find_map(|r| match r {
            ResourceRef::Machine(m) => Some(m),
            _ => None,
        })
    }

    pub fn image(&self) -> Option<&ImageRef> {
        self.refs.iter().find_map(|r| match r {
            ResourceRef::Image(i) => Some(i),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_accessors() {
        let chain = ResourceChain::new(
            ResourceKind::MachineShell,
            vec![
                ResourceRef::Backend(BackendRef::new("aws1")),
                ResourceRef::Machine(MachineRef::new("i-123")),
            ],
        );
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.backend().map(BackendRef::as_str), Some("aws1"));
        assert_eq!(chain.machine().map(MachineRef::as_str), Some("i-123"));
        assert!(chain.image().is_none());
    }

    #[test]
    fn test_chain_serializes_as_tagged_refs() {
        let chain = ResourceChain::new(
            ResourceKind::ImageMetadata,
            vec![
                ResourceRef::Backend(BackendRef::new("rs1")),
                ResourceRef::Image(ImageRef::new("ubuntu")),
            ],
        );
        assert_eq!(
            serde_json::to_value(&chain).unwrap(),
            serde_json::json!({
                "kind": "image_metadata",
                "refs": [{"backend": "rs1"}, {"image": "ubuntu"}],
            })
        );
    }
}
