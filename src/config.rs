//! Server configuration
//!
//! Values come from built-in defaults, then `TRIGGERFISH_*` environment variables,
//! then command line flags (applied by `main`). [`TriggerfishConfig::validate`] must
//! pass before the server starts; the completion core assumes validated limits.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tower_lsp::lsp_types::CompletionItemKind;
use tracing::debug;

use crate::lsp::symbol_index::SymbolKind;

pub const DEFAULT_MAX_COMPLETION_ITEMS: usize = 50;
pub const DEFAULT_MIN_FUZZY_SCORE: f64 = 20.0;
pub const DEFAULT_COMPLETION_SUFFIX: &str = ".txt";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max_completion_items must be greater than zero")]
    ZeroCompletionItems,
    #[error("min_fuzzy_score must be a finite, non-negative number (got {0})")]
    InvalidMinScore(f64),
    #[error("at least one trigger must be configured")]
    NoTriggers,
    #[error("trigger '{0}' is configured more than once")]
    DuplicateTrigger(char),
    #[error("invalid trigger spec '{spec}': {reason}")]
    InvalidTrigger { spec: String, reason: String },
    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

/// One trigger character and the symbol kinds it completes.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerConfig {
    pub trigger: char,
    /// Eligible kinds, searched and listed in this order
    pub kinds: Vec<SymbolKind>,
}

impl TriggerConfig {
    pub fn new(trigger: char, kinds: Vec<SymbolKind>) -> Self {
        Self { trigger, kinds }
    }

    /// Display category for items produced by this trigger (that of its first kind).
    pub fn category(&self) -> CompletionItemKind {
        self.kinds
            .first()
            .map(|kind| kind.presentation().completion_kind)
            .unwrap_or(CompletionItemKind::TEXT)
    }
}

/// Parses `"<char>=<kind>[,<kind>...]"`, e.g. `"#=method,function"`.
impl FromStr for TriggerConfig {
    type Err = ConfigError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ConfigError::InvalidTrigger {
            spec: spec.to_string(),
            reason: reason.to_string(),
        };

        let (trigger, kinds) = spec
            .trim()
            .split_once('=')
            .ok_or_else(|| invalid("expected '<char>=<kinds>'"))?;
        let mut chars = trigger.chars();
        let trigger = match (chars.next(), chars.next()) {
            (Some(c), None) if !c.is_whitespace() => c,
            _ => return Err(invalid("trigger must be a single non-whitespace character")),
        };

        let kinds = kinds
            .split(',')
            .filter(|kind| !kind.trim().is_empty())
            .map(|kind| kind.parse::<SymbolKind>().map_err(|reason| invalid(&reason)))
            .collect::<Result<Vec<_>, _>>()?;
        if kinds.is_empty() {
            return Err(invalid("no symbol kinds given"));
        }

        Ok(Self { trigger, kinds })
    }
}

/// Runtime configuration consumed by the backend and completion engines.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerfishConfig {
    pub max_completion_items: usize,
    pub min_fuzzy_score: f64,
    /// Triggers in routing priority order
    pub triggers: Vec<TriggerConfig>,
    /// Completion is only served for documents whose URI ends with this suffix
    pub completion_suffix: String,
    pub ctags_path: PathBuf,
    pub ctags_enabled: bool,
}

impl Default for TriggerfishConfig {
    fn default() -> Self {
        Self {
            max_completion_items: DEFAULT_MAX_COMPLETION_ITEMS,
            min_fuzzy_score: DEFAULT_MIN_FUZZY_SCORE,
            triggers: default_triggers(),
            completion_suffix: DEFAULT_COMPLETION_SUFFIX.to_string(),
            ctags_path: PathBuf::from("ctags"),
            ctags_enabled: true,
        }
    }
}

/// `@` for files, `.` for classes, `#` for methods and functions.
pub fn default_triggers() -> Vec<TriggerConfig> {
    vec![
        TriggerConfig::new('@', vec![SymbolKind::File]),
        TriggerConfig::new('.', vec![SymbolKind::Class]),
        TriggerConfig::new('#', vec![SymbolKind::Method, SymbolKind::Function]),
    ]
}

impl TriggerfishConfig {
    /// Builds a configuration from defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from defaults overridden by `lookup(variable)`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup("TRIGGERFISH_MAX_COMPLETION_ITEMS") {
            config.max_completion_items = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "TRIGGERFISH_MAX_COMPLETION_ITEMS",
                value,
            })?;
        }
        if let Some(value) = lookup("TRIGGERFISH_MIN_FUZZY_SCORE") {
            config.min_fuzzy_score = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                name: "TRIGGERFISH_MIN_FUZZY_SCORE",
                value,
            })?;
        }
        if let Some(value) = lookup("TRIGGERFISH_TRIGGERS") {
            config.triggers = value
                .split(';')
                .filter(|spec| !spec.trim().is_empty())
                .map(str::parse)
                .collect::<Result<_, _>>()?;
        }
        if let Some(value) = lookup("TRIGGERFISH_COMPLETION_SUFFIX") {
            config.completion_suffix = value;
        }
        if let Some(value) = lookup("TRIGGERFISH_CTAGS_PATH") {
            config.ctags_path = PathBuf::from(value);
        }
        if let Some(value) = lookup("TRIGGERFISH_CTAGS") {
            config.ctags_enabled = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::InvalidValue { name: "TRIGGERFISH_CTAGS", value }),
            };
        }

        debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Checks limits and trigger uniqueness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_completion_items == 0 {
            return Err(ConfigError::ZeroCompletionItems);
        }
        if !self.min_fuzzy_score.is_finite() || self.min_fuzzy_score < 0.0 {
            return Err(ConfigError::InvalidMinScore(self.min_fuzzy_score));
        }
        if self.triggers.is_empty() {
            return Err(ConfigError::NoTriggers);
        }
        for (i, trigger) in self.triggers.iter().enumerate() {
            if self.triggers[..i].iter().any(|earlier| earlier.trigger == trigger.trigger) {
                return Err(ConfigError::DuplicateTrigger(trigger.trigger));
            }
        }
        Ok(())
    }

    /// Trigger characters to advertise in the completion capability.
    pub fn trigger_characters(&self) -> Vec<String> {
        self.triggers.iter().map(|t| t.trigger.to_string()).collect()
    }
}
