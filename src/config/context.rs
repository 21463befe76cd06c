//! Request-scoped configuration context.
//!
//! # Responsibilities
//! - Pick the winning settings source (process-specific over deployment-global)
//! - Inject the credential keypairs under a dedicated key
//! - Expose typed views of the `[server]` and `[[backends]]` sections
//!
//! # Design Decisions
//! - Precedence is whole-table, never key-by-key
//! - Built once at startup, then shared read-only via `Arc`
//! - No interior mutability; every accessor hands out shared references

use std::fmt;

use thiserror::Error;

use crate::config::schema::{BackendSpec, Keypair, Keypairs, ServerSettings, Settings};
use crate::config::validation::{validate_settings, ValidationError};

/// Settings key under which the keypair set is always injected.
pub const KEYPAIRS_KEY: &str = "keypairs";

/// Settings key holding backend definitions.
pub const BACKENDS_KEY: &str = "backends";

/// Settings key holding HTTP server settings.
pub const SERVER_KEY: &str = "server";

/// Errors raised while building the configuration context. All are fatal.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("no settings supplied: both deployment-global and process-specific settings are empty")]
    NoSettings,

    #[error("invalid `{section}` section: {source}")]
    InvalidSection {
        section: &'static str,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to inject keypairs: {0}")]
    InjectKeypairs(#[source] toml::ser::Error),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Which settings source won the precedence rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsSource {
    DeploymentGlobal,
    ProcessSpecific,
}

/// Immutable snapshot of process-wide settings handed to every request.
pub struct ConfigurationContext {
    settings: Settings,
    source: SettingsSource,
    keypairs: Keypairs,
    backends: Vec<BackendSpec>,
    server: ServerSettings,
}

impl ConfigurationContext {
    /// Build the context from the two settings sources and the keypair set.
    ///
    /// Non-empty process-specific settings replace the deployment-global
    /// settings entirely. The keypairs are injected into whichever table wins.
    pub fn new(
        global: Settings,
        process: Settings,
        keypairs: Keypairs,
    ) -> Result<Self, ConfigurationError> {
        let (mut settings, source) = if !process.is_empty() {
            (process, SettingsSource::ProcessSpecific)
        } else if !global.is_empty() {
            (global, SettingsSource::DeploymentGlobal)
        } else {
            return Err(ConfigurationError::NoSettings);
        };

        let backends: Vec<BackendSpec> = match settings.get(BACKENDS_KEY) {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|source| ConfigurationError::InvalidSection {
                    section: BACKENDS_KEY,
                    source,
                })?,
            None => Vec::new(),
        };

        let server: ServerSettings = match settings.get(SERVER_KEY) {
            Some(value) => value
                .clone()
                .try_into()
                .map_err(|source| ConfigurationError::InvalidSection {
                    section: SERVER_KEY,
                    source,
                })?,
            None => ServerSettings::default(),
        };

        validate_settings(&backends, &keypairs).map_err(ConfigurationError::Validation)?;

        let injected = toml::Value::try_from(&keypairs).map_err(ConfigurationError::InjectKeypairs)?;
        settings.insert(KEYPAIRS_KEY.to_string(), injected);

        tracing::debug!(
            source = ?source,
            backends = backends.len(),
            keypairs = keypairs.len(),
            "Configuration context built"
        );

        Ok(Self {
            settings,
            source,
            keypairs,
            backends,
            server,
        })
    }

    /// Read a raw setting from the winning source.
    pub fn get(&self, key: &str) -> Option<&toml::Value> {
        self.settings.get(key)
    }

    /// Which source supplied the settings.
    pub fn source(&self) -> SettingsSource {
        self.source
    }

    /// All keypairs, keyed by provider id.
    pub fn keypairs(&self) -> &Keypairs {
        &self.keypairs
    }

    /// Credential material for a provider.
    pub fn keypair(&self, provider: &str) -> Option<&Keypair> {
        self.keypairs.get(provider)
    }

    /// Backend definitions in declaration order.
    pub fn backends(&self) -> &[BackendSpec] {
        &self.backends
    }

    /// Look up a backend definition by id. Disabled backends are included.
    pub fn backend(&self, id: &str) -> Option<&BackendSpec> {
        self.backends.iter().find(|b| b.id == id)
    }

    /// The `[server]` section, with defaults for missing fields.
    pub fn server(&self) -> &ServerSettings {
        &self.server
    }
}

impl fmt::Debug for ConfigurationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationContext")
            .field("source", &self.source)
            .field("keys", &self.settings.keys().collect::<Vec<_>>())
            .field("keypairs", &self.keypairs.keys().collect::<Vec<_>>())
            .field("backends", &self.backends)
            .field("server", &self.server)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(source: &str) -> Settings {
        toml::from_str(source).unwrap()
    }

    fn keypairs() -> Keypairs {
        let mut keypairs = Keypairs::new();
        keypairs.insert("ec2".into(), Keypair::new("ssh-rsa AAAA", "secret"));
        keypairs
    }

    #[test]
    fn test_process_settings_replace_global_entirely() {
        let global = table("region = \"eu\"\ncolor = \"blue\"");
        let process = table("color = \"red\"");

        let ctx = ConfigurationContext::new(global, process, keypairs()).unwrap();

        assert_eq!(ctx.source(), SettingsSource::ProcessSpecific);
        assert_eq!(ctx.get("color").and_then(|v| v.as_str()), Some("red"));
        assert!(ctx.get("region").is_none());
        assert!(ctx.get(KEYPAIRS_KEY).is_some());
    }

    #[test]
    fn test_global_settings_used_when_process_empty() {
        let ctx = ConfigurationContext::new(table("color = \"blue\""), Settings::new(), keypairs())
            .unwrap();

        assert_eq!(ctx.source(), SettingsSource::DeploymentGlobal);
        assert_eq!(ctx.get("color").and_then(|v| v.as_str()), Some("blue"));
    }

    #[test]
    fn test_keypairs_always_injected() {
        let process = table("keypairs = \"overridden\"");
        let ctx = ConfigurationContext::new(Settings::new(), process, keypairs()).unwrap();

        let injected = ctx.get(KEYPAIRS_KEY).and_then(|v| v.as_table()).unwrap();
        let ec2 = injected.get("ec2").and_then(|v| v.as_table()).unwrap();
        assert_eq!(ec2.get("public").and_then(|v| v.as_str()), Some("ssh-rsa AAAA"));
        assert_eq!(ctx.keypair("ec2").map(|k| k.private.as_str()), Some("secret"));
    }

    #[test]
    fn test_empty_settings_fail() {
        let err = ConfigurationContext::new(Settings::new(), Settings::new(), keypairs()).unwrap_err();
        assert!(matches!(err, ConfigurationError::NoSettings));
    }

    #[test]
    fn test_typed_sections() {
        let process = table(
            r#"
            [server]
            bind_address = "127.0.0.1:7000"

            [[backends]]
            id = "aws1"
            provider = "ec2"
            machines = ["i-123"]
            "#,
        );
        let ctx = ConfigurationContext::new(Settings::new(), process, Keypairs::new()).unwrap();

        assert_eq!(ctx.server().bind_address, "127.0.0.1:7000");
        assert_eq!(ctx.backends().len(), 1);
        assert_eq!(ctx.backend("aws1").map(|b| b.provider.as_str()), Some("ec2"));
        assert!(ctx.backend("aws2").is_none());
    }

    #[test]
    fn test_malformed_backends_section() {
        let process = table("backends = \"nope\"");
        let err = ConfigurationContext::new(Settings::new(), process, Keypairs::new()).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::InvalidSection { section: BACKENDS_KEY, .. }
        ));
    }

    #[test]
    fn test_duplicate_backends_rejected() {
        let process = table(
            r#"
            [[backends]]
            id = "aws1"
            provider = "ec2"

            [[backends]]
            id = "aws1"
            provider = "ec2"
            "#,
        );
        let err = ConfigurationContext::new(Settings::new(), process, Keypairs::new()).unwrap_err();
        assert!(matches!(err, ConfigurationError::Validation(ref errors) if errors.len() == 1));
    }

    #[test]
    fn test_debug_hides_private_keys() {
        let ctx = ConfigurationContext::new(table("a = 1"), Settings::new(), keypairs()).unwrap();
        assert!(!format!("{:?}", ctx).contains("secret"));
    }
}
