//! Configuration schema definitions.
//!
//! Typed views over the sections of a settings table. All types derive Serde
//! traits for deserialization from TOML settings files.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Raw settings as read from a settings file.
pub type Settings = toml::Table;

/// Credential keypairs keyed by provider id.
pub type Keypairs = BTreeMap<String, Keypair>;

/// HTTP server settings (the `[server]` section).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address (e.g., "0.0.0.0:6543").
    pub bind_address: String,

    /// Overall request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// URL prefix reserved for static assets. Never routed by the dispatcher.
    pub static_prefix: String,

    /// Directory served under `static_prefix`. Static serving is disabled when unset.
    pub static_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:6543".to_string(),
            request_timeout_secs: 30,
            max_body_size: 2 * 1024 * 1024, // 2MB
            static_prefix: "/static".to_string(),
            static_dir: None,
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// A configured cloud provider account (one `[[backends]]` entry).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendSpec {
    /// Unique backend identifier, used as the `{backend}` path segment.
    pub id: String,

    /// Provider driver name (e.g., "ec2", "rackspace", "openstack").
    pub provider: String,

    /// Human readable name.
    #[serde(default)]
    pub title: Option<String>,

    /// Provider region, where the provider has one.
    #[serde(default)]
    pub region: Option<String>,

    /// Disabled backends are not addressable.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Known machine ids. `None` means the backend does not enumerate its
    /// machines and any id is addressable.
    #[serde(default)]
    pub machines: Option<Vec<String>>,

    /// Known image ids, with the same semantics as `machines`.
    #[serde(default)]
    pub images: Option<Vec<String>>,
}

fn default_enabled() -> bool {
    true
}

impl BackendSpec {
    /// Create an enabled backend with no declared inventory.
    pub fn new(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            provider: provider.into(),
            title: None,
            region: None,
            enabled: true,
            machines: None,
            images: None,
        }
    }

    /// Declare the backend's machine inventory.
    pub fn with_machines<I, S>(mut self, machines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.machines = Some(machines.into_iter().map(Into::into).collect());
        self
    }

    /// Declare the backend's image inventory.
    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = Some(images.into_iter().map(Into::into).collect());
        self
    }
}

/// Credential material for one provider.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Keypair {
    /// Public key (e.g., an OpenSSH `ssh-rsa ...` line).
    pub public: String,

    /// Private key material.
    pub private: String,
}

impl Keypair {
    pub fn new(public: impl Into<String>, private: impl Into<String>) -> Self {
        Self {
            public: public.into(),
            private: private.into(),
        }
    }
}

// Private key material must never reach the logs.
impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keypair")
            .field("public", &self.public)
            .field("private", &"<redacted>")
            .finish()
    }
}

/// Layout of a keypair file.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct KeypairFile {
    pub keypairs: Keypairs,
}
