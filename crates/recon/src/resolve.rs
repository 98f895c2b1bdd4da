//! Pairs every manual grade with its best extracted counterpart.
//!
//! Policy: best similarity wins, accepted only strictly above the threshold.
//! Equal similarities go to the first candidate in extracted order (or, under
//! `PreferSameTerm`, to a candidate from the same term and year first).

use std::collections::HashMap;

use crate::config::DuplicatePolicy;
use crate::matcher::{is_same_subject, similarity_normalized};
use crate::model::{ComparisonEntry, GradedRecord, Resolution};
use crate::normalize::{fold_text, normalize_subject, NormalizedSubject};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct IndexKey {
    subject: NormalizedSubject,
    term: String,
    academic_year: String,
}

#[derive(Debug)]
struct IndexSlot<'a> {
    subject: NormalizedSubject,
    record: &'a GradedRecord,
}

/// Extracted records indexed by normalized subject, in first-insertion order.
#[derive(Debug)]
pub struct ExtractedIndex<'a> {
    slots: Vec<IndexSlot<'a>>,
    positions: HashMap<IndexKey, usize>,
    collisions: usize,
}

impl<'a> ExtractedIndex<'a> {
    pub fn build(extracted: &'a [GradedRecord], policy: DuplicatePolicy) -> Self {
        let mut index = ExtractedIndex {
            slots: Vec::with_capacity(extracted.len()),
            positions: HashMap::new(),
            collisions: 0,
        };

        for record in extracted {
            let subject = normalize_subject(&record.subject);
            let key = match policy {
                DuplicatePolicy::LastWriteWins => IndexKey {
                    subject: subject.clone(),
                    term: String::new(),
                    academic_year: String::new(),
                },
                DuplicatePolicy::PreferSameTerm => IndexKey {
                    subject: subject.clone(),
                    term: fold_text(&record.term),
                    academic_year: fold_text(&record.academic_year),
                },
            };

            if let Some(&pos) = index.positions.get(&key) {
                let dropped = index.slots[pos].record;
                log::warn!(
                    "extracted subject '{}' collides with '{}' ({} {}); keeping the later record",
                    record.subject,
                    dropped.subject,
                    dropped.term,
                    dropped.academic_year,
                );
                index.slots[pos].record = record;
                index.collisions += 1;
            } else {
                index.positions.insert(key, index.slots.len());
                index.slots.push(IndexSlot { subject, record });
            }
        }

        index
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of extracted records overwritten by a later record with the same key.
    pub fn collisions(&self) -> usize {
        self.collisions
    }

    /// Best candidate for `manual`, with its similarity, before any threshold check.
    fn best_candidate(
        &self,
        manual: &GradedRecord,
        manual_subject: &NormalizedSubject,
        policy: DuplicatePolicy,
    ) -> Option<(&'a GradedRecord, f64)> {
        let mut best: Option<(&'a GradedRecord, f64, bool)> = None;

        for slot in &self.slots {
            let sim = similarity_normalized(manual_subject, &slot.subject);
            let same_term =
                policy == DuplicatePolicy::PreferSameTerm && same_term(manual, slot.record);

            let better = match best {
                None => true,
                Some((_, best_sim, best_same_term)) => {
                    sim > best_sim || (sim == best_sim && same_term && !best_same_term)
                }
            };
            if better {
                best = Some((slot.record, sim, same_term));
            }
        }

        best.map(|(record, sim, _)| (record, sim))
    }
}

fn same_term(a: &GradedRecord, b: &GradedRecord) -> bool {
    fold_text(&a.term) == fold_text(&b.term)
        && fold_text(&a.academic_year) == fold_text(&b.academic_year)
}

/// Resolve with the default last-write-wins index.
pub fn resolve(manual: &[GradedRecord], extracted: &[GradedRecord], threshold: f64) -> Resolution {
    resolve_with_policy(manual, extracted, threshold, DuplicatePolicy::LastWriteWins)
}

pub fn resolve_with_policy(
    manual: &[GradedRecord],
    extracted: &[GradedRecord],
    threshold: f64,
    policy: DuplicatePolicy,
) -> Resolution {
    let index = ExtractedIndex::build(extracted, policy);

    let manual_subjects: Vec<NormalizedSubject> =
        manual.iter().map(|m| normalize_subject(&m.subject)).collect();

    let entries: Vec<ComparisonEntry> = manual
        .iter()
        .zip(&manual_subjects)
        .map(|(record, subject)| {
            match index.best_candidate(record, subject, policy) {
                Some((candidate, sim)) if is_same_subject(sim, threshold) => {
                    log::debug!(
                        "'{}' matched '{}' (similarity {sim:.3})",
                        record.subject,
                        candidate.subject
                    );
                    ComparisonEntry::matched(record, candidate, sim)
                }
                _ => {
                    log::debug!("'{}' has no extracted counterpart", record.subject);
                    ComparisonEntry::unmatched(record)
                }
            }
        })
        .collect();

    let extra_extracted: Vec<GradedRecord> = extracted
        .iter()
        .filter(|record| {
            let subject = normalize_subject(&record.subject);
            !manual_subjects
                .iter()
                .any(|m| is_same_subject(similarity_normalized(&subject, m), threshold))
        })
        .cloned()
        .collect();

    Resolution {
        entries,
        extra_extracted,
    }
}
