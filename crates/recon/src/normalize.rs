//! Canonical forms for subject names and person names.
//!
//! Pipeline (subjects): lowercase, strip diacritics, collapse every
//! non-alphanumeric run to one space, trim, then fold known synonyms.
//! Person names go through the same pipeline without the synonym step.

use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static RE_NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}]+").expect("Invalid regex"));

/// Subject synonyms, applied as substring replacements on the folded text.
///
/// Longer patterns come first so that "histoire geographie" is folded before
/// the shorter "histoire geo" can split it.
const SUBJECT_SYNONYMS: &[(&str, &str)] = &[
    ("sciences de la vie et de la terre", "svt"),
    ("education physique et sportive", "eps"),
    ("histoire geographie", "hist geo"),
    ("sciences physiques", "physique"),
    ("education physique", "eps"),
    ("sciences vie terre", "svt"),
    ("hist geographie", "hist geo"),
    ("langue vivante 1", "lv1"),
    ("langue vivante 2", "lv2"),
    ("physique chimie", "physique"),
    ("mathematiques", "maths"),
    ("histoire geo", "hist geo"),
];

/// A subject name in canonical form. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedSubject(String);

impl NormalizedSubject {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whitespace tokens of the canonical form.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NormalizedSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lowercase, accent-free, punctuation-collapsed form of `text`.
pub fn fold_text(text: &str) -> String {
    let lower = text.to_lowercase();
    let stripped: String = lower.nfd().filter(|c| !is_combining_mark(*c)).collect();
    RE_NON_ALNUM.replace_all(&stripped, " ").trim().to_string()
}

/// Canonical subject name used for matching. Empty input gives an empty subject.
pub fn normalize_subject(subject: &str) -> NormalizedSubject {
    let mut folded = fold_text(subject);

    // Every replacement is shorter than its pattern, so this terminates; running
    // to a fixpoint keeps the result stable under re-normalization.
    loop {
        let before = folded.len();
        for (pattern, replacement) in SUBJECT_SYNONYMS {
            if folded.contains(pattern) {
                folded = folded.replace(pattern, replacement);
            }
        }
        if folded.len() == before {
            break;
        }
    }

    NormalizedSubject(folded)
}

/// Canonical form of a name field (family or given name).
pub fn normalize_name(name: &str) -> String {
    fold_text(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_accents() {
        assert_eq!(normalize_subject("Français").as_str(), "francais");
        assert_eq!(normalize_subject("ÉCONOMIE").as_str(), "economie");
    }

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(normalize_subject("  S.E.S. -- option  ").as_str(), "s e s option");
        assert_eq!(normalize_subject("Anglais (LV1)").as_str(), "anglais lv1");
    }

    #[test]
    fn folds_synonyms() {
        assert_eq!(normalize_subject("Mathématiques").as_str(), "maths");
        assert_eq!(normalize_subject("Histoire-Géographie").as_str(), "hist geo");
        assert_eq!(normalize_subject("Histoire Géo").as_str(), "hist geo");
        assert_eq!(normalize_subject("Physique-Chimie").as_str(), "physique");
        assert_eq!(normalize_subject("Sciences physiques").as_str(), "physique");
        assert_eq!(
            normalize_subject("Sciences de la Vie et de la Terre").as_str(),
            "svt"
        );
        assert_eq!(
            normalize_subject("Éducation physique et sportive").as_str(),
            "eps"
        );
        assert_eq!(normalize_subject("Langue vivante 2").as_str(), "lv2");
    }

    #[test]
    fn chained_synonyms_reach_fixpoint() {
        // "sciences physiques" folds to "physique", exposing "physique chimie".
        let once = normalize_subject("Sciences physiques chimie");
        assert_eq!(once.as_str(), "physique");
        assert_eq!(normalize_subject(once.as_str()), once);
    }

    #[test]
    fn empty_and_blank_inputs() {
        assert!(normalize_subject("").is_empty());
        assert!(normalize_subject("  -- ").is_empty());
    }

    #[test]
    fn name_folding_has_no_synonyms() {
        assert_eq!(normalize_name("  DUPONT "), "dupont");
        assert_eq!(normalize_name("Marie-Hélène"), "marie helene");
        assert_eq!(normalize_name("Mathematiques"), "mathematiques");
    }
}
