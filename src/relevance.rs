// src/relevance.rs
//! Relevance gate: only stable-channel desktop update posts go through extraction.

use std::collections::BTreeSet;

pub const DESKTOP_UPDATE_TAG: &str = "Desktop Update";
pub const STABLE_CHANNEL_TAG: &str = "Stable updates";

/// Set of labels that must all be present on an entry. Matching is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelevanceRule {
    required: BTreeSet<String>,
}

impl Default for RelevanceRule {
    fn default() -> Self {
        Self::new([DESKTOP_UPDATE_TAG, STABLE_CHANNEL_TAG])
    }
}

impl RelevanceRule {
    pub fn new<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    /// True iff every required label is in `tags`. An empty tag set never qualifies.
    pub fn is_relevant<I, S>(&self, tags: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let present: BTreeSet<String> = tags
            .into_iter()
            .map(|t| t.as_ref().to_string())
            .filter(|t| self.required.contains(t))
            .collect();
        !present.is_empty() && present.len() == self.required.len()
    }
}

/// Convenience predicate with the default label pair.
pub fn is_relevant<I, S>(tags: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    RelevanceRule::default().is_relevant(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_labels_required() {
        assert!(is_relevant(["Desktop Update", "Stable updates"]));
        assert!(!is_relevant(["Desktop Update"]));
        assert!(!is_relevant(["Stable updates"]));
        assert!(!is_relevant(Vec::<String>::new()));
    }

    #[test]
    fn duplicates_do_not_count_twice() {
        assert!(!is_relevant(["Desktop Update", "Desktop Update"]));
    }

    #[test]
    fn match_is_exact() {
        assert!(!is_relevant(["desktop update", "stable updates"]));
        assert!(!is_relevant(["Desktop Update ", "Stable updates"]));
    }

    #[test]
    fn custom_rule_uses_its_own_labels() {
        let rule = RelevanceRule::new(["Beta updates"]);
        assert!(rule.is_relevant(["Beta updates", "Desktop Update"]));
        assert!(!rule.is_relevant(["Stable updates"]));
    }
}
