//! Result aggregation and deduplication
//!
//! A [`ResultSet`] keeps detections in first-seen order. Inserting a detection
//! whose identity is already recorded is a no-op for the result list (stored
//! geometry is never overwritten) but still counts as a raw hit for the tally.

use crate::config::DedupPolicy;
use crate::models::{DedupKey, GlobalDetection};
use std::collections::HashSet;

/// Deduplicated results of one or more scans
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    entries: Vec<GlobalDetection>,
    policy: DedupPolicy,
    keys: HashSet<DedupKey>,
    tally: Vec<(Vec<u8>, usize)>,
    raw_hits: usize,
}

impl ResultSet {
    /// Empty set using `policy` to decide duplicates
    pub fn new(policy: DedupPolicy) -> Self {
        Self {
            entries: Vec::new(),
            policy,
            keys: HashSet::new(),
            tally: Vec::new(),
            raw_hits: 0,
        }
    }

    /// Dedup policy of the set
    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Record a detection; returns `true` when it is a new code
    pub fn insert(&mut self, detection: GlobalDetection) -> bool {
        self.count_hits(&detection.payload, 1);
        self.record(detection)
    }

    fn record(&mut self, detection: GlobalDetection) -> bool {
        let duplicate = match self.policy {
            DedupPolicy::Exact => self.keys.contains(&detection.key()),
            DedupPolicy::Tolerance { pixels } => self.entries.iter().any(|e| {
                e.payload == detection.payload
                    && (e.bbox.left as i64 - detection.bbox.left as i64).unsigned_abs()
                        <= pixels as u64
                    && (e.bbox.top as i64 - detection.bbox.top as i64).unsigned_abs()
                        <= pixels as u64
            }),
        };
        if duplicate {
            return false;
        }

        self.keys.insert(detection.key());
        self.entries.push(detection);
        true
    }

    /// Fold `other` into this set, in its order, with this set's policy.
    ///
    /// Raw hits of `other` (its duplicates included) are added to the tally.
    pub fn merge(&mut self, other: &ResultSet) {
        for entry in &other.entries {
            self.record(entry.clone());
        }
        for (payload, count) in &other.tally {
            self.count_hits(payload, *count);
        }
    }

    fn count_hits(&mut self, payload: &[u8], hits: usize) {
        self.raw_hits += hits;
        match self.tally.iter_mut().find(|(p, _)| p.as_slice() == payload) {
            Some((_, count)) => *count += hits,
            None => self.tally.push((payload.to_vec(), hits)),
        }
    }

    /// Number of distinct codes
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Results in first-seen order
    pub fn entries(&self) -> &[GlobalDetection] {
        &self.entries
    }

    /// Iterate results in first-seen order
    pub fn iter(&self) -> std::slice::Iter<'_, GlobalDetection> {
        self.entries.iter()
    }

    /// Consume the set into its results
    pub fn into_vec(self) -> Vec<GlobalDetection> {
        self.entries
    }

    /// Raw hits per payload, duplicates included, most frequent first.
    ///
    /// Payloads are counted by their bytes and rendered as text (invalid
    /// UTF-8 is replaced). Ties keep the order in which payloads were first
    /// seen.
    pub fn hit_counts(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .tally
            .iter()
            .map(|(payload, n)| (String::from_utf8_lossy(payload).into_owned(), *n))
            .collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// Total detections offered to the set, duplicates included
    pub fn raw_hits(&self) -> usize {
        self.raw_hits
    }
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::new(DedupPolicy::default())
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a GlobalDetection;
    type IntoIter = std::slice::Iter<'a, GlobalDetection>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
