//! Platform and interface extraction from issue labels
//!
//! Issues carry no structured platform/interface fields; both are encoded as
//! labels. Classification runs in two passes over the labels in the order the
//! tracker returned them:
//!
//! 1. each label is classified as a platform token, a status token, or a
//!    candidate interface id;
//! 2. the first platform and the first candidate are picked.
//!
//! When an issue carries more than one candidate the extras are reported in
//! [`LabelClassification::extra_candidates`] so callers can surface the ambiguity.

use std::collections::BTreeSet;

/// Default platform allow-list
pub const DEFAULT_PLATFORMS: &[&str] = &["JTAMP", "JTAES", "JTAEN", "SVB"];

/// Default status tokens (never taken as an interface id)
pub const DEFAULT_STATUS_LABELS: &[&str] = &["TARGET", "PASS", "FAIL", "UNRESOLVED"];

/// What a single label means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelKind {
    /// Platform token, upper-cased
    Platform(String),
    Status,
    /// Possible interface id, original casing
    Candidate(String),
}

/// Result of classifying an issue's labels
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelClassification {
    /// Empty when no platform label is present
    pub platform: String,
    /// Empty when no candidate label is present
    pub interface_id: String,
    pub extra_candidates: Vec<String>,
}

/// Token sets used to classify labels
#[derive(Debug, Clone)]
pub struct LabelClassifier {
    platforms: BTreeSet<String>,
    statuses: BTreeSet<String>,
}

impl Default for LabelClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORMS, DEFAULT_STATUS_LABELS)
    }
}

impl LabelClassifier {
    pub fn new<P, S>(platforms: &[P], statuses: &[S]) -> Self
    where
        P: AsRef<str>,
        S: AsRef<str>,
    {
        Self {
            platforms: platforms
                .iter()
                .map(|p| p.as_ref().trim().to_uppercase())
                .collect(),
            statuses: statuses
                .iter()
                .map(|s| s.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn kind(&self, label: &str) -> Option<LabelKind> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return None;
        }
        let upper = trimmed.to_uppercase();
        if self.platforms.contains(&upper) {
            Some(LabelKind::Platform(upper))
        } else if self.statuses.contains(&upper) {
            Some(LabelKind::Status)
        } else {
            Some(LabelKind::Candidate(trimmed.to_string()))
        }
    }

    pub fn classify<L: AsRef<str>>(&self, labels: &[L]) -> LabelClassification {
        let kinds: Vec<LabelKind> = labels
            .iter()
            .filter_map(|l| self.kind(l.as_ref()))
            .collect();

        let platform = kinds
            .iter()
            .find_map(|k| match k {
                LabelKind::Platform(p) => Some(p.clone()),
                _ => None,
            })
            .unwrap_or_default();

        let mut candidates = kinds.into_iter().filter_map(|k| match k {
            LabelKind::Candidate(c) => Some(c),
            _ => None,
        });
        let interface_id = candidates.next().unwrap_or_default();

        LabelClassification {
            platform,
            interface_id,
            extra_candidates: candidates.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_and_interface() {
        let c = LabelClassifier::default();
        let result = c.classify(&["svb", "UART"]);
        assert_eq!(result.platform, "SVB");
        assert_eq!(result.interface_id, "UART");
        assert!(result.extra_candidates.is_empty());
    }

    #[test]
    fn test_status_labels_are_never_interfaces() {
        let c = LabelClassifier::default();
        let result = c.classify(&["Pass", "JTAMP", "Target", "i2c"]);
        assert_eq!(result.platform, "JTAMP");
        assert_eq!(result.interface_id, "i2c");
    }

    #[test]
    fn test_first_candidate_wins_and_extras_reported() {
        let c = LabelClassifier::default();
        let result = c.classify(&["SPI", "SVB", "GPIO"]);
        assert_eq!(result.interface_id, "SPI");
        assert_eq!(result.extra_candidates, vec!["GPIO"]);
    }

    #[test]
    fn test_first_platform_wins() {
        let c = LabelClassifier::default();
        let result = c.classify(&["JTAES", "JTAEN", "PCIe"]);
        assert_eq!(result.platform, "JTAES");
    }

    #[test]
    fn test_no_labels_yield_empty_fields() {
        let c = LabelClassifier::default();
        let result = c.classify::<&str>(&[]);
        assert_eq!(result, LabelClassification::default());

        let only_status = c.classify(&["FAIL", "  "]);
        assert_eq!(only_status.platform, "");
        assert_eq!(only_status.interface_id, "");
    }

    #[test]
    fn test_custom_token_sets() {
        let c = LabelClassifier::new(&["fpga"], &["blocked"]);
        let result = c.classify(&["Blocked", "FPGA", " DDR "]);
        assert_eq!(result.platform, "FPGA");
        assert_eq!(result.interface_id, "DDR");
    }
}
