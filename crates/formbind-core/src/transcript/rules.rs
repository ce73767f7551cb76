use regex::Regex;
use serde::Serialize;

/// A value captured by one rule of a [`RuleChain`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    pub rule: &'static str,
    pub value: String,
}

struct PatternRule {
    name: &'static str,
    regex: Regex,
    group: usize,
}

/// Ordered capture patterns evaluated first-match-wins.
///
/// Rules are tried in declaration order and the first rule that matches
/// anywhere in the text decides the value, even when a later rule would
/// match earlier in the text.
pub struct RuleChain {
    rules: Vec<PatternRule>,
}

impl RuleChain {
    /// Build a chain from `(name, pattern, capture group)` triples.
    ///
    /// Patterns are compile-time literals; an invalid one is a programming
    /// error and panics on first use of the chain.
    pub fn new(rules: &[(&'static str, &str, usize)]) -> Self {
        let rules = rules
            .iter()
            .map(|&(name, pattern, group)| PatternRule {
                name,
                regex: Regex::new(pattern)
                    .unwrap_or_else(|e| panic!("invalid pattern for rule '{name}': {e}")),
                group,
            })
            .collect();
        Self { rules }
    }

    /// Rule names in priority order.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn first_match(&self, text: &str) -> Option<RuleHit> {
        self.rules.iter().find_map(|rule| {
            let caps = rule.regex.captures(text)?;
            let value = caps.get(rule.group)?.as_str().trim();
            if value.is_empty() {
                return None;
            }
            Some(RuleHit {
                rule: rule.name,
                value: value.to_string(),
            })
        })
    }

    /// Every capture of every rule, in text order, without duplicates.
    pub fn all_matches(&self, text: &str) -> Vec<String> {
        let mut found: Vec<(usize, String)> = Vec::new();
        for rule in &self.rules {
            for caps in rule.regex.captures_iter(text) {
                if let Some(m) = caps.get(rule.group) {
                    let value = m.as_str().trim();
                    if !value.is_empty() {
                        found.push((m.start(), value.to_string()));
                    }
                }
            }
        }
        found.sort_by_key(|(start, _)| *start);
        dedup_stable(found.into_iter().map(|(_, v)| v).collect())
    }
}

/// Remove repeated values, keeping the first occurrence of each.
pub fn dedup_stable(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// "main street" -> "Main Street"; digits and inner letters are lowercased.
pub fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
