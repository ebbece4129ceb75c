//! Configuration types for Phylax
//!
//! One process-wide [`CaptureConfig`] is wired into the reporter at
//! construction; individual capture calls can layer [`CaptureOverrides`]
//! on top. Resolution is field-wise: per-call value, else process-wide
//! value, else built-in default. There is no partial merging beyond that
//! rule.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::exception::Tags;

/// Built-in stack truncation limit, in characters
pub const DEFAULT_STACK_MAX_LENGTH: usize = 4096;

/// Environment variable consulted by [`EnvDeployment`]
pub const DEFAULT_DEPLOYMENT_VAR: &str = "DEPLOYMENT";

/// Stack-trace truncation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSanitizeConfig {
    /// Enable truncation of overlong stacks
    pub enabled: bool,

    /// Maximum stack length in characters before truncation applies
    pub max_length: usize,
}

impl Default for StackSanitizeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            max_length: DEFAULT_STACK_MAX_LENGTH,
        }
    }
}

/// Process-wide capture behavior
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CaptureConfig {
    /// Route captures to the alternate backend instead of the primary
    #[serde(default)]
    pub use_alternate_backend: bool,

    /// Rebuild exceptions down to message + stack + aux before forwarding
    #[serde(default)]
    pub sanitize_exception: bool,

    /// Stack truncation settings
    #[serde(default)]
    pub sanitize_stack: StackSanitizeConfig,

    /// Tags applied to every capture from this process
    #[serde(default)]
    pub extra_tags: HashMap<String, String>,
}

/// Per-call overrides for a single capture operation.
///
/// Every field is optional; an omitted field falls back to the
/// process-wide configuration.
#[derive(Debug, Clone, Default)]
pub struct CaptureOverrides {
    /// Override backend selection
    pub use_alternate_backend: Option<bool>,

    /// Override exception sanitization
    pub sanitize_exception: Option<bool>,

    /// Override stack truncation settings
    pub sanitize_stack: Option<StackSanitizeConfig>,

    /// Replace the process-wide extra tags for this call
    pub extra_tags: Option<HashMap<String, String>>,

    /// Explicit per-call tags, layered over the extra tags
    pub tags: Tags,
}

impl CaptureOverrides {
    /// No overrides: the process-wide configuration applies as-is.
    pub fn none() -> Self {
        Self::default()
    }

    /// Per-call tags only.
    pub fn with_tags(tags: Tags) -> Self {
        Self {
            tags,
            ..Self::default()
        }
    }

    /// Resolve against the process-wide configuration, field by field.
    pub fn resolve(&self, base: &CaptureConfig) -> CaptureConfig {
        CaptureConfig {
            use_alternate_backend: self
                .use_alternate_backend
                .unwrap_or(base.use_alternate_backend),
            sanitize_exception: self.sanitize_exception.unwrap_or(base.sanitize_exception),
            sanitize_stack: self
                .sanitize_stack
                .clone()
                .unwrap_or_else(|| base.sanitize_stack.clone()),
            extra_tags: self
                .extra_tags
                .clone()
                .unwrap_or_else(|| base.extra_tags.clone()),
        }
    }
}

/// Trace bracketing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Global switch for span creation in the interceptor
    pub enabled: bool,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Exception channel settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Broadcast buffer capacity
    pub capacity: usize,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self { capacity: 64 }
    }
}

/// Top-level library configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhylaxConfig {
    /// Capture behavior
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Trace bracketing
    #[serde(default)]
    pub trace: TraceConfig,

    /// Exception channel
    #[serde(default)]
    pub channel: ChannelConfig,

    /// Environment variable that signals deployed mode
    #[serde(default = "default_deployment_var")]
    pub deployment_var: String,
}

fn default_deployment_var() -> String {
    DEFAULT_DEPLOYMENT_VAR.to_string()
}

impl Default for PhylaxConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig::default(),
            trace: TraceConfig::default(),
            channel: ChannelConfig::default(),
            deployment_var: default_deployment_var(),
        }
    }
}

impl PhylaxConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. Configuration file (phylax.toml or path from PHYLAX_CONFIG_PATH)
    /// 3. Environment variable overrides (PHYLAX_ prefix)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is invalid.
    pub fn load() -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Toml},
        };

        let mut figment = Figment::new()
            .merge(Toml::file("phylax.toml"))
            .merge(Env::prefixed("PHYLAX_").split("_"));

        if let Ok(path) = std::env::var("PHYLAX_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: PhylaxConfig = figment.extract().map_err(|e| {
            crate::error::PhylaxError::Configuration(format!("Failed to load configuration: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::error::Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Toml},
        };

        let config: PhylaxConfig =
            Figment::new()
                .merge(Toml::file(path))
                .extract()
                .map_err(|e| {
                    crate::error::PhylaxError::Configuration(format!(
                        "Failed to load configuration file: {}",
                        e
                    ))
                })?;

        config.validate()?;
        Ok(config)
    }

    /// The deployment signal this configuration names.
    pub fn deployment(&self) -> EnvDeployment {
        EnvDeployment::var(&self.deployment_var)
    }

    /// Validate invariants that serde cannot express.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.capture.sanitize_stack.enabled && self.capture.sanitize_stack.max_length == 0 {
            return Err(crate::error::PhylaxError::Configuration(
                "sanitize_stack.max_length must be positive when enabled".to_string(),
            ));
        }
        if self.channel.capacity == 0 {
            return Err(crate::error::PhylaxError::Configuration(
                "channel.capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Ambient signal deciding whether captures are forwarded to the backend
/// or stay local. Read at the top of every capture operation.
pub trait DeploymentSignal: Send + Sync + std::fmt::Debug {
    /// Whether the process runs where backend forwarding is appropriate.
    fn is_deployed(&self) -> bool;
}

/// Deployment signal backed by an environment variable; any non-empty
/// value means deployed. The variable is re-read on every call.
#[derive(Debug, Clone)]
pub struct EnvDeployment {
    var: String,
}

impl EnvDeployment {
    /// Read the default `DEPLOYMENT` variable.
    pub fn new() -> Self {
        Self::var(DEFAULT_DEPLOYMENT_VAR)
    }

    /// Read a specific variable.
    pub fn var(name: impl Into<String>) -> Self {
        Self { var: name.into() }
    }
}

impl Default for EnvDeployment {
    fn default() -> Self {
        Self::new()
    }
}

impl DeploymentSignal for EnvDeployment {
    fn is_deployed(&self) -> bool {
        std::env::var(&self.var)
            .map(|v| !v.is_empty())
            .unwrap_or(false)
    }
}

/// Fixed deployment signal for tests and embedders that decide upfront.
#[derive(Debug, Clone, Copy)]
pub struct StaticDeployment(pub bool);

impl DeploymentSignal for StaticDeployment {
    fn is_deployed(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn overrides_resolve_field_wise() {
        let base = CaptureConfig {
            use_alternate_backend: false,
            sanitize_exception: true,
            sanitize_stack: StackSanitizeConfig {
                enabled: true,
                max_length: 100,
            },
            extra_tags: HashMap::from([("env".to_string(), "prod".to_string())]),
        };

        let overrides = CaptureOverrides {
            use_alternate_backend: Some(true),
            ..CaptureOverrides::default()
        };
        let resolved = overrides.resolve(&base);

        assert!(resolved.use_alternate_backend);
        assert!(resolved.sanitize_exception);
        assert_eq!(resolved.sanitize_stack.max_length, 100);
        assert_eq!(resolved.extra_tags.get("env").map(String::as_str), Some("prod"));
    }

    #[test]
    fn empty_overrides_reproduce_the_base() {
        let base = CaptureConfig {
            sanitize_exception: true,
            ..CaptureConfig::default()
        };
        let resolved = CaptureOverrides::none().resolve(&base);
        assert!(resolved.sanitize_exception);
        assert!(!resolved.use_alternate_backend);
    }

    #[test]
    fn validate_rejects_zero_stack_limit() {
        let mut config = PhylaxConfig::default();
        config.capture.sanitize_stack.enabled = true;
        config.capture.sanitize_stack.max_length = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_parses_toml() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[capture]
sanitize_exception = true

[capture.sanitize_stack]
enabled = true
max_length = 500

[trace]
enabled = false
"#
        )
        .unwrap();

        let config = PhylaxConfig::from_file(file.path()).unwrap();
        assert!(config.capture.sanitize_exception);
        assert_eq!(config.capture.sanitize_stack.max_length, 500);
        assert!(!config.trace.enabled);
        assert_eq!(config.deployment_var, "DEPLOYMENT");
    }

    #[test]
    fn env_deployment_reads_per_call() {
        let var = "PHYLAX_TEST_DEPLOYMENT_SIGNAL";
        let signal = EnvDeployment::var(var);

        assert!(!signal.is_deployed());
        unsafe { std::env::set_var(var, "aws") };
        assert!(signal.is_deployed());
        unsafe { std::env::remove_var(var) };
        assert!(!signal.is_deployed());
    }
}
