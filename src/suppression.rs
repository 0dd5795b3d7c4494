// src/suppression.rs
//! Inline suppression comments.
//!
//! Supported forms, anywhere a `#` comment is legal:
//! - `# precinct:disable Lint/Breakpoint` on its own line - disable until
//!   re-enabled (block form)
//! - `code  # precinct:disable Lint/Breakpoint` - disable on that line only
//! - `# precinct:enable` - end the block form
//! - a bare `# precinct:disable` suppresses every rule
//!
//! `# precinct:todo` is accepted as a synonym of `disable`; it is what the
//! engine itself inserts when asked to mark uncorrectable offenses.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::rules::Badge;

#[derive(Debug, Default, Clone)]
pub struct SuppressionIndex {
    /// Rule names suppressed per 1-based line; an empty set means all rules.
    lines: HashMap<usize, HashSet<String>>,
    /// Block suppressions as (start_line, end_line, rules).
    blocks: Vec<(usize, usize, HashSet<String>)>,
}

impl SuppressionIndex {
    /// Scans the source for suppression comments.
    ///
    /// # Panics
    ///
    /// Panics if the internal pattern is invalid; it is hardcoded and
    /// covered by tests, so a panic implies a developer error.
    #[must_use]
    pub fn parse(source: &str) -> Self {
        let directive =
            Regex::new(r"#\s*precinct:(disable|todo|enable)\b([^\n#]*)").unwrap();

        let mut index = Self::default();
        let mut open_block: Option<(usize, HashSet<String>)> = None;
        let mut total = 0;

        for (i, line) in source.lines().enumerate() {
            let line_num = i + 1;
            total = line_num;
            let Some(caps) = directive.captures(line) else {
                continue;
            };
            let verb = caps.get(1).map_or("", |m| m.as_str());
            let rules = parse_rule_list(caps.get(2).map_or("", |m| m.as_str()));

            if verb == "enable" {
                if let Some((start, rules)) = open_block.take() {
                    index.blocks.push((start, line_num, rules));
                }
                continue;
            }

            let standalone = line.trim_start().starts_with('#');
            if standalone && rules.is_empty() {
                open_block = Some((line_num + 1, HashSet::new()));
            } else {
                // Inline comment suppresses its own line; a standalone
                // directive naming rules suppresses the next line.
                let target = if standalone { line_num + 1 } else { line_num };
                index.lines.entry(target).or_default().extend(rules);
            }
        }

        // An unclosed block runs to the end of the unit.
        if let Some((start, rules)) = open_block {
            index.blocks.push((start, total, rules));
        }

        index
    }

    /// True when `badge` may still report on `line`. Line 0 (the global
    /// sentinel) is never suppressed.
    #[must_use]
    pub fn enabled_line(&self, badge: &Badge, line: usize) -> bool {
        if line == 0 {
            return true;
        }
        let name = badge.to_string();
        if let Some(rules) = self.lines.get(&line) {
            if rules.is_empty() || Self::names_match(rules, &name, badge) {
                return false;
            }
        }
        for (start, end, rules) in &self.blocks {
            if line >= *start
                && line <= *end
                && (rules.is_empty() || Self::names_match(rules, &name, badge))
            {
                return false;
            }
        }
        true
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.blocks.is_empty()
    }

    /// A directive may name a rule by its qualified or bare name.
    fn names_match(rules: &HashSet<String>, qualified: &str, badge: &Badge) -> bool {
        rules.contains(qualified) || rules.contains(badge.name())
    }
}

fn parse_rule_list(s: &str) -> HashSet<String> {
    s.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}
