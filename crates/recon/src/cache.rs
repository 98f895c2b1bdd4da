//! Session-scoped report cache.
//!
//! Reports are keyed by candidate and config fingerprint. Nothing is evicted
//! implicitly: when a candidate's source data changes, call
//! `invalidate_candidate`. The cache is plain data; share it behind a lock.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ReconConfig;
use crate::engine::build_report;
use crate::model::{CandidateId, CandidateSubmission, ConfigHash, ReconciliationReport};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub candidate_id: CandidateId,
    pub config_hash: ConfigHash,
}

impl CacheKey {
    pub fn new(candidate_id: CandidateId, config_hash: ConfigHash) -> Self {
        Self {
            candidate_id,
            config_hash,
        }
    }

    pub fn for_submission(submission: &CandidateSubmission, config: &ReconConfig) -> Self {
        Self::new(submission.candidate_id.clone(), config.fingerprint())
    }
}

#[derive(Debug, Default)]
pub struct ReportCache {
    reports: HashMap<CacheKey, Arc<ReconciliationReport>>,
}

impl ReportCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<ReconciliationReport>> {
        self.reports.get(key).cloned()
    }

    /// Store a report, returning the one it replaces.
    pub fn insert(
        &mut self,
        key: CacheKey,
        report: Arc<ReconciliationReport>,
    ) -> Option<Arc<ReconciliationReport>> {
        self.reports.insert(key, report)
    }

    /// Cached report for this submission and config, building it on a miss.
    pub fn get_or_build(
        &mut self,
        submission: &CandidateSubmission,
        config: &ReconConfig,
    ) -> Arc<ReconciliationReport> {
        let key = CacheKey::for_submission(submission, config);
        if let Some(report) = self.reports.get(&key) {
            log::debug!("cache hit for {} @ {}", key.candidate_id, key.config_hash.short());
            return Arc::clone(report);
        }
        log::debug!("cache miss for {} @ {}", key.candidate_id, key.config_hash.short());
        let report = Arc::new(build_report(submission, config));
        self.reports.insert(key, Arc::clone(&report));
        report
    }

    pub fn invalidate(&mut self, key: &CacheKey) -> bool {
        self.reports.remove(key).is_some()
    }

    /// Drop every report for one candidate, whatever config produced it.
    pub fn invalidate_candidate(&mut self, candidate_id: &CandidateId) -> usize {
        let before = self.reports.len();
        self.reports.retain(|key, _| &key.candidate_id != candidate_id);
        let removed = before - self.reports.len();
        if removed > 0 {
            log::debug!("invalidated {removed} cached report(s) for {candidate_id}");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.reports.clear();
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
