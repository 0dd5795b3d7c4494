// src/config.rs
//! Engine configuration: global run switches plus one table per rule badge.
//!
//! The engine also accepts a programmatically built `Config`; `.precinct.toml`
//! is just the file form:
//!
//! ```toml
//! only = []
//! safe_only = false
//!
//! ["Lint/Breakpoint"]
//! enabled = true
//! autocorrect = "always"
//! severity = "warning"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PrecinctError, Result};
use crate::rules::{Badge, Severity};

/// `enabled = true | false | "pending"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnabledSetting {
    Flag(bool),
    Word(String),
}

impl EnabledSetting {
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, EnabledSetting::Word(w) if w == "pending")
    }
}

impl Default for EnabledSetting {
    fn default() -> Self {
        EnabledSetting::Flag(true)
    }
}

/// `autocorrect = "always" | "contextual" | false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AutocorrectSetting {
    Flag(bool),
    Word(AutocorrectWord),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutocorrectWord {
    Always,
    Contextual,
}

impl Default for AutocorrectSetting {
    fn default() -> Self {
        AutocorrectSetting::Word(AutocorrectWord::Contextual)
    }
}

impl AutocorrectSetting {
    /// Whether corrections apply, given whether the caller asked for them
    /// this run. `always` corrects unconditionally; `contextual` only when
    /// requested; `false` never.
    #[must_use]
    pub fn active(self, requested: bool) -> bool {
        match self {
            AutocorrectSetting::Flag(flag) => flag && requested,
            AutocorrectSetting::Word(AutocorrectWord::Always) => true,
            AutocorrectSetting::Word(AutocorrectWord::Contextual) => requested,
        }
    }
}

/// Per-rule settings, all optional in the file form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuleConfig {
    pub enabled: EnabledSetting,
    pub safe: Option<bool>,
    pub safe_autocorrect: Option<bool>,
    pub autocorrect: AutocorrectSetting,
    pub severity: Option<String>,
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl RuleConfig {
    /// Resolved severity override.
    ///
    /// # Errors
    ///
    /// Configuration error (`UnknownSeverity`) for a string outside the
    /// ladder; fatal to this resolution call only.
    pub fn severity_override(&self) -> Result<Option<Severity>> {
        self.severity.as_deref().map(Severity::parse).transpose()
    }

    #[must_use]
    pub fn is_safe(&self) -> bool {
        self.safe.unwrap_or(true)
    }

    /// True when the unit's name clears this rule's include/exclude
    /// patterns. Patterns are unanchored regexes matched against the unit
    /// name; an empty include list admits everything.
    ///
    /// # Errors
    ///
    /// Configuration error for an invalid pattern.
    pub fn applies_to(&self, unit_name: &str) -> Result<bool> {
        for pattern in &self.exclude {
            if regex::Regex::new(pattern)?.is_match(unit_name) {
                return Ok(false);
            }
        }
        if self.include.is_empty() {
            return Ok(true);
        }
        for pattern in &self.include {
            if regex::Regex::new(pattern)?.is_match(unit_name) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// Whole-run configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Explicit allow-list; inclusion short-circuits enablement.
    pub only: Vec<String>,
    /// Opt into rules whose `enabled` is `"pending"`.
    pub enable_pending: bool,
    /// Drop rules whose `safe` flag is false.
    pub safe_only: bool,
    /// Insert a suppressing marker for offenses a rule cannot fix.
    pub disable_uncorrectable: bool,
    /// Remaining top-level tables are per-badge rule settings.
    #[serde(flatten)]
    pub rules: HashMap<String, RuleConfig>,
}

impl Config {
    /// Parses the TOML file form.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for malformed TOML or unknown fields.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads from disk.
    ///
    /// # Errors
    ///
    /// I/O errors carry the offending path; parse errors as in
    /// [`Config::from_toml`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| PrecinctError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        Self::from_toml(&text)
    }

    /// Settings for a badge: the exact qualified key wins, then the bare
    /// rule name, then defaults.
    #[must_use]
    pub fn for_badge(&self, badge: &Badge) -> RuleConfig {
        if let Some(rc) = self.rules.get(&badge.to_string()) {
            return rc.clone();
        }
        if let Some(rc) = self.rules.get(badge.name()) {
            return rc.clone();
        }
        RuleConfig::default()
    }

    /// `only`-list membership, honoring partial names.
    #[must_use]
    pub fn only_includes(&self, badge: &Badge) -> bool {
        self.only
            .iter()
            .any(|entry| Badge::parse(entry).matches(badge))
    }
}
