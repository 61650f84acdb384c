//! Configuration for the linter
//!
//! Read from YAML or JSON, chosen by file extension:
//!
//! ```yaml
//! extends: [recommended]
//! engine:
//!   parallel: true
//!   jobs: 0
//! rules:
//!   no-ignored-notifier: error
//!   no-sharereplay: [warn, { allowConfig: false }]
//!   ban-operators:
//!     severity: error
//!     options: { "^tap$": "use a named side-effect operator" }
//! ```

use crate::diagnostic::Severity;
use crate::registry;
use crate::selector::SelectorError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unknown rule '{0}'")]
    UnknownRule(String),

    #[error("Invalid severity '{value}' for rule '{rule}' (expected off, info, warn or error)")]
    InvalidSeverity { rule: String, value: String },

    #[error("Invalid options for rule '{rule}': {message}")]
    InvalidOptions { rule: String, message: String },

    #[error("Invalid regex '{pattern}' in options for rule '{rule}': {source}")]
    InvalidRegex {
        rule: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid selector: {0}")]
    Selector(#[from] SelectorError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Lint files in parallel
    pub parallel: bool,

    /// Number of parallel jobs (0 = auto-detect)
    pub jobs: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            jobs: 0,
        }
    }
}

/// How one rule is configured
///
/// Accepts `error`, `[warn, { ... }]` or `{ severity: warn, options: { ... } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    Level(String),
    LevelWithOptions(String, serde_json::Value),
    Detailed {
        severity: String,
        #[serde(default)]
        options: serde_json::Value,
    },
}

impl RuleSetting {
    pub fn level(&self) -> &str {
        match self {
            RuleSetting::Level(level)
            | RuleSetting::LevelWithOptions(level, _)
            | RuleSetting::Detailed {
                severity: level, ..
            } => level,
        }
    }

    /// Rule options, `Null` when none were given
    pub fn options(&self) -> &serde_json::Value {
        match self {
            RuleSetting::Level(_) => &NO_OPTIONS,
            RuleSetting::LevelWithOptions(_, options) | RuleSetting::Detailed { options, .. } => {
                options
            }
        }
    }

    /// Severity, or `None` when the rule is turned off
    pub fn severity(&self, rule: &str) -> Result<Option<Severity>, ConfigError> {
        parse_level(rule, self.level())
    }
}

static NO_OPTIONS: serde_json::Value = serde_json::Value::Null;

/// Parse `off`/`info`/`warn`/`error` (and the usual aliases)
pub fn parse_level(rule: &str, level: &str) -> Result<Option<Severity>, ConfigError> {
    match level.to_lowercase().as_str() {
        "off" | "none" | "disable" | "disabled" => Ok(None),
        other => other
            .parse::<Severity>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidSeverity {
                rule: rule.to_string(),
                value: level.to_string(),
            }),
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Presets or other configuration files to layer under this one
    pub extends: Vec<String>,

    /// Engine settings
    pub engine: EngineConfig,

    /// Rule settings by rule name
    pub rules: BTreeMap<String, RuleSetting>,
}

impl Config {
    /// Create default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a preset configuration by name
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "recommended" => Some(Self::preset_recommended()),
            "all" => Some(Self::preset_all()),
            _ => None,
        }
    }

    fn preset_recommended() -> Self {
        let mut config = Self::default();
        for name in RECOMMENDED {
            config
                .rules
                .insert(name.to_string(), RuleSetting::Level("error".to_string()));
        }
        config
    }

    /// Every rule that is not deprecated
    fn preset_all() -> Self {
        let mut config = Self::default();
        for meta in registry::all_metas().filter(|meta| !meta.is_deprecated()) {
            config
                .rules
                .insert(meta.name.to_string(), RuleSetting::Level("error".to_string()));
        }
        config
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_depth(path, 0)
    }

    /// Load with recursion depth limit (to prevent infinite loops)
    fn load_with_depth(path: &Path, depth: usize) -> Result<Self, ConfigError> {
        const MAX_DEPTH: usize = 10;
        if depth >= MAX_DEPTH {
            return Err(ConfigError::Invalid(
                "Maximum config inheritance depth exceeded".to_string(),
            ));
        }

        log::debug!("Loading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let mut config = match ext {
            "yaml" | "yml" => Self::from_yaml(&content)?,
            "json" => Self::from_json(&content)?,
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "Unknown config file format: {}",
                    ext
                )))
            }
        };

        if !config.extends.is_empty() {
            let base_dir = path.parent().unwrap_or(Path::new("."));
            let mut base_config = Self::default();

            for extend in &config.extends {
                let extended = if let Some(preset) = Self::preset(extend) {
                    preset
                } else {
                    let extend_path = if Path::new(extend).is_absolute() {
                        PathBuf::from(extend)
                    } else {
                        base_dir.join(extend)
                    };
                    Self::load_with_depth(&extend_path, depth + 1)?
                };
                base_config.merge(extended);
            }

            base_config.engine = config.engine.clone();
            base_config.merge_rules(std::mem::take(&mut config.rules));
            config = base_config;
        }

        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: Self) {
        if other.engine.jobs != 0 {
            self.engine.jobs = other.engine.jobs;
        }
        self.engine.parallel = other.engine.parallel;
        self.merge_rules(other.rules);
    }

    fn merge_rules(&mut self, rules: BTreeMap<String, RuleSetting>) {
        for (name, setting) in rules {
            // `rule: warn` over `rule: [error, {...}]` keeps the options
            let setting = match (setting, self.rules.get(&name)) {
                (RuleSetting::Level(level), Some(base)) if !base.options().is_null() => {
                    RuleSetting::LevelWithOptions(level, base.options().clone())
                }
                (setting, _) => setting,
            };
            self.rules.insert(name, setting);
        }
    }

    /// Check names and severities without building rules
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, setting) in &self.rules {
            if registry::meta(name).is_none() {
                return Err(ConfigError::UnknownRule(name.clone()));
            }
            setting.severity(name)?;
        }
        Ok(())
    }

    /// Severity of a rule, `None` when it is absent or turned off
    pub fn rule_severity(&self, rule: &str) -> Option<Severity> {
        self.rules
            .get(rule)
            .and_then(|setting| setting.severity(rule).ok().flatten())
    }

    /// Set a rule's severity without options
    pub fn set_rule(&mut self, rule: &str, level: &str) {
        self.rules
            .insert(rule.to_string(), RuleSetting::Level(level.to_string()));
    }
}

/// Rules enabled by the `recommended` preset
const RECOMMENDED: &[&str] = &[
    "no-async-subscribe",
    "no-create",
    "no-ignored-notifier",
    "no-ignored-replay-buffer",
    "no-ignored-takewhile-value",
    "no-implicit-any-catch",
    "no-index",
    "no-internal",
    "no-nested-subscribe",
    "no-redundant-notify",
    "no-sharereplay",
    "no-subject-unsubscribe",
    "no-unbound-methods",
    "no-unsafe-subject-next",
    "no-unsafe-takeuntil",
];
