// src/rules/registry.rs
//! Catalog of known rule classes, indexed by badge, bare name and
//! namespace. Enlistment is queued and materialized lazily on first read,
//! amortizing repeated registration during process start.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, OnceLock};

use crate::config::{Config, EnabledSetting};
use crate::error::{PrecinctError, Result};
use crate::rules::{Badge, RuleClass};

/// Outcome of resolving a user-supplied rule name.
#[derive(Debug, Clone)]
pub enum Qualified {
    /// Resolved to a registered badge; `corrected_from` carries a warning
    /// when the origin string had the wrong namespace.
    Resolved {
        badge: Badge,
        corrected_from: Option<String>,
    },
    /// Nothing registered under that name; the input goes back to the
    /// caller unchanged.
    Unchanged(String),
}

impl Qualified {
    /// The resolved or passed-through name.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Qualified::Resolved { badge, .. } => badge.to_string(),
            Qualified::Unchanged(name) => name.clone(),
        }
    }
}

enum PendingOp {
    Enlist(RuleClass),
    Dismiss(Badge),
}

#[derive(Default)]
struct Catalog {
    by_badge: BTreeMap<Badge, RuleClass>,
    by_name: HashMap<String, Vec<Badge>>,
    by_namespace: HashMap<String, Vec<Badge>>,
}

impl Catalog {
    fn build(ops: &[PendingOp]) -> Self {
        let mut by_badge = BTreeMap::new();
        for op in ops {
            match op {
                // Re-enlisting a badge replaces the earlier class; at most
                // one class per exact badge.
                PendingOp::Enlist(class) => {
                    by_badge.insert(class.badge().clone(), class.clone());
                }
                PendingOp::Dismiss(badge) => {
                    by_badge.remove(badge);
                }
            }
        }

        let mut by_name: HashMap<String, Vec<Badge>> = HashMap::new();
        let mut by_namespace: HashMap<String, Vec<Badge>> = HashMap::new();
        for badge in by_badge.keys() {
            by_name
                .entry(badge.name().to_string())
                .or_default()
                .push(badge.clone());
            if let Some(ns) = badge.namespace() {
                by_namespace
                    .entry(ns.to_string())
                    .or_default()
                    .push(badge.clone());
            }
        }

        Self {
            by_badge,
            by_name,
            by_namespace,
        }
    }
}

/// The rule catalog. Mutation happens only through [`Registry::enlist`] and
/// [`Registry::dismiss`] (typically at process start); reads are pure and
/// the materialized catalog is safe to share across threads.
#[derive(Default)]
pub struct Registry {
    pending: Vec<PendingOp>,
    catalog: OnceLock<Catalog>,
    /// Enabled-set cache, keyed by config object identity. The enablement
    /// computation repeats per source unit otherwise.
    enabled_cache: Mutex<HashMap<usize, Vec<RuleClass>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry preloaded with this crate's built-in rules.
    #[must_use]
    pub fn with_builtin_rules() -> Self {
        let mut registry = Self::new();
        for class in super::builtin::classes() {
            registry.enlist(class);
        }
        registry
    }

    /// Queues a rule class for registration.
    pub fn enlist(&mut self, class: RuleClass) {
        self.pending.push(PendingOp::Enlist(class));
        self.invalidate();
    }

    /// Queues removal of a rule class.
    pub fn dismiss(&mut self, badge: &Badge) {
        self.pending.push(PendingOp::Dismiss(badge.clone()));
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.catalog = OnceLock::new();
        self.enabled_cache.lock().expect("cache poisoned").clear();
    }

    fn catalog(&self) -> &Catalog {
        self.catalog.get_or_init(|| Catalog::build(&self.pending))
    }

    /// All registered classes in badge order.
    #[must_use]
    pub fn classes(&self) -> Vec<RuleClass> {
        self.catalog().by_badge.values().cloned().collect()
    }

    #[must_use]
    pub fn find(&self, badge: &Badge) -> Option<RuleClass> {
        self.catalog().by_badge.get(badge).cloned()
    }

    /// Badges registered under a namespace, in badge order.
    #[must_use]
    pub fn department(&self, namespace: &str) -> Vec<Badge> {
        self.catalog()
            .by_namespace
            .get(namespace)
            .cloned()
            .unwrap_or_default()
    }

    /// Resolves a possibly-unqualified rule name.
    ///
    /// Already-registered qualified names come back as-is. An unqualified
    /// name resolving to exactly one registered badge qualifies to it; zero
    /// matches hand the input back unchanged (the caller's problem). A name
    /// that matches under a *different* namespace than the origin string
    /// claimed resolves with a correction warning.
    ///
    /// # Errors
    ///
    /// [`PrecinctError::AmbiguousRule`] when two or more registered badges
    /// share the name, listing every candidate.
    pub fn qualify(&self, name: &str, origin: &str) -> Result<Qualified> {
        let catalog = self.catalog();
        let badge = Badge::parse(name);

        if badge.is_qualified() && catalog.by_badge.contains_key(&badge) {
            return Ok(Qualified::Resolved {
                badge,
                corrected_from: None,
            });
        }

        let candidates = catalog
            .by_name
            .get(badge.name())
            .cloned()
            .unwrap_or_default();

        match candidates.len() {
            0 => Ok(Qualified::Unchanged(name.to_string())),
            1 => {
                let resolved = candidates.into_iter().next().expect("one candidate");
                let corrected_from = badge.is_qualified().then(|| {
                    format!("{origin}: `{name}` resolved to `{resolved}` (wrong namespace)")
                });
                Ok(Qualified::Resolved {
                    badge: resolved,
                    corrected_from,
                })
            }
            _ => Err(PrecinctError::AmbiguousRule {
                name: name.to_string(),
                candidates: candidates.iter().map(Badge::to_string).collect(),
            }),
        }
    }

    /// The subset of registered classes enabled for a configuration:
    /// `only`-list inclusion short-circuits; otherwise `enabled = true`, or
    /// `"pending"` with the opt-in flag; safe-only mode additionally drops
    /// rules whose `safe` flag is false. Cached per distinct config object.
    #[must_use]
    pub fn enabled(&self, config: &Arc<Config>) -> Vec<RuleClass> {
        let key = Arc::as_ptr(config) as usize;
        if let Some(hit) = self.enabled_cache.lock().expect("cache poisoned").get(&key) {
            return hit.clone();
        }

        let classes: Vec<RuleClass> = self
            .catalog()
            .by_badge
            .values()
            .filter(|class| Self::class_enabled(class, config))
            .cloned()
            .collect();

        self.enabled_cache
            .lock()
            .expect("cache poisoned")
            .insert(key, classes.clone());
        classes
    }

    fn class_enabled(class: &RuleClass, config: &Config) -> bool {
        let badge = class.badge();
        let rule_config = config.for_badge(badge);
        if config.safe_only && !rule_config.is_safe() {
            return false;
        }
        if config.only_includes(badge) {
            return true;
        }
        match &rule_config.enabled {
            EnabledSetting::Flag(flag) => *flag,
            EnabledSetting::Word(_) => rule_config.enabled.is_pending() && config.enable_pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;

    struct Nop;
    impl Rule for Nop {}

    fn class(badge: &str) -> RuleClass {
        RuleClass::new(badge, || Nop)
    }

    fn registry(badges: &[&str]) -> Registry {
        let mut registry = Registry::new();
        for badge in badges {
            registry.enlist(class(badge));
        }
        registry
    }

    #[test]
    fn test_qualify_registered_name_passes_through() {
        let registry = registry(&["Lint/UnusedVariable"]);
        let resolved = registry.qualify("Lint/UnusedVariable", "cli").unwrap();
        assert_eq!(resolved.name(), "Lint/UnusedVariable");
        assert!(matches!(
            resolved,
            Qualified::Resolved {
                corrected_from: None,
                ..
            }
        ));
    }

    #[test]
    fn test_qualify_bare_name() {
        let registry = registry(&["Lint/UnusedVariable", "Style/Noise"]);
        let resolved = registry.qualify("UnusedVariable", "config").unwrap();
        assert_eq!(resolved.name(), "Lint/UnusedVariable");
    }

    #[test]
    fn test_qualify_unknown_returns_input() {
        let registry = registry(&["Lint/UnusedVariable"]);
        let resolved = registry.qualify("Nonexistent", "config").unwrap();
        assert_eq!(resolved.name(), "Nonexistent");
        assert!(matches!(resolved, Qualified::Unchanged(_)));
    }

    #[test]
    fn test_qualify_wrong_namespace_warns() {
        let registry = registry(&["Lint/UnusedVariable"]);
        let resolved = registry.qualify("Style/UnusedVariable", "config").unwrap();
        match resolved {
            Qualified::Resolved {
                badge,
                corrected_from,
            } => {
                assert_eq!(badge.to_string(), "Lint/UnusedVariable");
                assert!(corrected_from.unwrap().contains("wrong namespace"));
            }
            Qualified::Unchanged(_) => panic!("expected resolution"),
        }
    }

    #[test]
    fn test_qualify_ambiguous_lists_candidates() {
        let registry = registry(&["Lint/Shadow", "Style/Shadow", "Naming/Other"]);
        let err = registry.qualify("Shadow", "config").unwrap_err();
        match err {
            PrecinctError::AmbiguousRule { name, candidates } => {
                assert_eq!(name, "Shadow");
                assert_eq!(candidates.len(), 2);
                assert!(candidates.contains(&"Lint/Shadow".to_string()));
                assert!(candidates.contains(&"Style/Shadow".to_string()));
                assert!(!candidates.contains(&"Naming/Other".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_qualify_never_cross_resolves() {
        let registry = registry(&["Lint/A", "Style/B"]);
        let resolved = registry.qualify("A", "x").unwrap();
        assert_eq!(resolved.name(), "Lint/A");
        let resolved = registry.qualify("B", "x").unwrap();
        assert_eq!(resolved.name(), "Style/B");
    }

    #[test]
    fn test_dismiss() {
        let mut registry = registry(&["Lint/A", "Lint/B"]);
        assert_eq!(registry.classes().len(), 2);
        registry.dismiss(&Badge::parse("Lint/A"));
        assert_eq!(registry.classes().len(), 1);
        assert!(registry.find(&Badge::parse("Lint/A")).is_none());
    }

    #[test]
    fn test_department_index() {
        let registry = registry(&["Lint/A", "Lint/B", "Style/C"]);
        let lint = registry.department("Lint");
        assert_eq!(lint.len(), 2);
        assert!(registry.department("Missing").is_empty());
    }

    #[test]
    fn test_enabled_defaults_and_disabled() {
        let registry = registry(&["Lint/A", "Lint/B"]);
        let config = Arc::new(
            Config::from_toml("[\"Lint/B\"]\nenabled = false\n").unwrap(),
        );
        let enabled = registry.enabled(&config);
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].badge().to_string(), "Lint/A");
    }

    #[test]
    fn test_enabled_pending_needs_opt_in() {
        let registry = registry(&["Lint/New"]);
        let config = Arc::new(
            Config::from_toml("[\"Lint/New\"]\nenabled = \"pending\"\n").unwrap(),
        );
        assert!(registry.enabled(&config).is_empty());

        let mut opted = Config::from_toml("[\"Lint/New\"]\nenabled = \"pending\"\n").unwrap();
        opted.enable_pending = true;
        assert_eq!(registry.enabled(&Arc::new(opted)).len(), 1);
    }

    #[test]
    fn test_enabled_safe_only() {
        let registry = registry(&["Lint/Safe", "Lint/Risky"]);
        let mut config = Config::from_toml("[\"Lint/Risky\"]\nsafe = false\n").unwrap();
        config.safe_only = true;
        let enabled = registry.enabled(&Arc::new(config));
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].badge().to_string(), "Lint/Safe");
    }

    #[test]
    fn test_enabled_only_list_short_circuits() {
        let registry = registry(&["Lint/A", "Lint/B"]);
        let config = Arc::new(
            Config::from_toml("only = [\"Lint/A\"]\n[\"Lint/A\"]\nenabled = false\n").unwrap(),
        );
        let enabled = registry.enabled(&config);
        assert!(enabled.iter().any(|c| c.badge().name() == "A"));
    }

    #[test]
    fn test_enabled_cache_is_identity_keyed() {
        let registry = registry(&["Lint/A"]);
        let config = Arc::new(Config::default());
        let first = registry.enabled(&config);
        let second = registry.enabled(&config);
        assert_eq!(first.len(), second.len());

        // A different config object with different content recomputes.
        let disabled = Arc::new(Config::from_toml("[\"Lint/A\"]\nenabled = false\n").unwrap());
        assert!(registry.enabled(&disabled).is_empty());
    }
}
