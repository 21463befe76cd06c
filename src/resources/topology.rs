//! Live topology consulted during traversal.
//!
//! # Responsibilities
//! - Answer "does this backend/machine/image exist" from in-memory state
//!
//! # Design Decisions
//! - Never contacts a provider; answers come from an immutable snapshot
//! - Disabled backends are invisible
//! - A backend without a declared machine (image) inventory accepts any id

use std::collections::{HashMap, HashSet};

use crate::config::BackendSpec;
use crate::resources::chain::{BackendRef, ImageRef, MachineRef};

/// Read-only view of which resources exist.
pub trait Topology: Send + Sync + std::fmt::Debug {
    fn has_backend(&self, backend: &BackendRef) -> bool;
    fn has_machine(&self, backend: &BackendRef, machine: &MachineRef) -> bool;
    fn has_image(&self, backend: &BackendRef, image: &ImageRef) -> bool;
}

#[derive(Debug, Default)]
struct BackendInventory {
    machines: Option<HashSet<String>>,
    images: Option<HashSet<String>>,
}

/// Topology built from the configured backend definitions.
#[derive(Debug, Default)]
pub struct Inventory {
    backends: HashMap<String, BackendInventory>,
}

impl Inventory {
    /// Snapshot the enabled backends and their declared inventories.
    pub fn from_backends(specs: &[BackendSpec]) -> Self {
        let mut backends = HashMap::new();
        for spec in specs {
            if !spec.enabled {
                tracing::debug!(backend = %spec.id, "Skipping disabled backend");
                continue;
            }
            backends.insert(
                spec.id.clone(),
                BackendInventory {
                    machines: spec.machines.as_ref().map(|m| m.iter().cloned().collect()),
                    images: spec.images.as_ref().map(|i| i.iter().cloned().collect()),
                },
            );
        }
        Self { backends }
    }

    /// Number of addressable backends.
    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl Topology for Inventory {
    fn has_backend(&self, backend: &BackendRef) -> bool {
        self.backends.contains_key(backend.as_str())
    }

    fn has_machine(&self, backend: &BackendRef, machine: &MachineRef) -> bool {
        self.backends
            .get(backend.as_str())
            .map(|inv| match &inv.machines {
                Some(known) => known.contains(machine.as_str()),
                None => true,
            })
            .unwrap_or(false)
    }

    fn has_image(&self, backend: &BackendRef, image: &ImageRef) -> bool {
        self.backends
            .get(backend.as_str())
            .map(|inv| match &inv.images {
                Some(known) => known.contains(image.as_str()),
                None => true,
            })
            .unwrap_or(false)
    }
}
