/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Per-run search state: the best-solution set and the scored-partition cache.
//!
//! A [`SearchSession`] is created by every `initialize` and owned by the
//! engine; nothing is kept in process-wide state. Workers share it through a
//! `parking_lot::Mutex` and only ever take the lock for a cache lookup or an
//! update-if-better, never while scoring.

use hashbrown::HashMap;
use parking_lot::Mutex;

use super::budget::Budget;
use super::config::SearchConfig;
use crate::error::GofError;
use crate::gof::{self, GofMethod};
use crate::image::BlockImage;
use crate::network::Matrix;
use crate::partition::{signature, Partition};

/// Which expansions of the image a candidate partition is scored against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpansionSelect {
    /// Every expansion; the partition's score is the best of them.
    All,
    /// One expansion, by index.
    One(usize),
}

/// Cache key: a partition's assignment plus the expansions it was scored
/// against. Distinct assignments never share an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScoreKey {
    /// `assignment[actor] = position`.
    pub assignment: Box<[usize]>,
    /// Expansion selection used.
    pub expansions: ExpansionSelect,
}

impl ScoreKey {
    /// Key for `assignment` scored under `expansions`.
    pub fn new(assignment: &[usize], expansions: ExpansionSelect) -> Self {
        Self { assignment: assignment.into(), expansions }
    }
}

/// One retained best solution.
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    /// `assignment[actor] = position`.
    pub assignment: Vec<usize>,
    /// Index of the winning image expansion.
    pub expansion: usize,
    /// Unrounded score.
    pub score: f64,
    /// Partition signature of `assignment`.
    pub signature: u64,
}

/// Best-solution set and scored-partition cache for one run.
#[derive(Debug)]
pub struct SearchSession {
    method: GofMethod,
    best_score: f64,
    best: Vec<Solution>,
    scored: HashMap<ScoreKey, f64>,
    evaluations: u64,
}

impl SearchSession {
    /// Empty session for `method`.
    pub fn new(method: GofMethod) -> Self {
        Self {
            method,
            best_score: method.worst(),
            best: Vec::new(),
            scored: HashMap::new(),
            evaluations: 0,
        }
    }

    /// Best score so far, if any partition was scored.
    pub fn best_score(&self) -> Option<f64> {
        if self.best.is_empty() {
            None
        } else {
            Some(self.best_score)
        }
    }

    /// Retained best solutions.
    pub fn best(&self) -> &[Solution] {
        &self.best
    }

    /// Number of distinct (partition, expansion selection) pairs scored.
    pub fn scored_count(&self) -> usize {
        self.scored.len()
    }

    /// Number of partition evaluations performed (cache misses).
    pub fn evaluations(&self) -> u64 {
        self.evaluations
    }

    /// Cached score of a key.
    pub fn cached(&self, key: &ScoreKey) -> Option<f64> {
        self.scored.get(key).copied()
    }

    /// Record a freshly scored key.
    pub fn record(&mut self, key: ScoreKey, score: f64) {
        self.scored.insert(key, score);
        self.evaluations += 1;
    }

    /// Update-if-better. Ties are kept when structurally distinct.
    ///
    /// Returns true when the solution was retained.
    pub fn offer(&mut self, solution: Solution) -> bool {
        if self.best.is_empty() || self.method.is_better(solution.score, self.best_score) {
            self.best_score = solution.score;
            self.best.clear();
            self.best.push(solution);
            return true;
        }
        if self.method.is_tie(solution.score, self.best_score) {
            let duplicate = self
                .best
                .iter()
                .any(|s| s.expansion == solution.expansion && s.assignment == solution.assignment);
            if !duplicate {
                self.best.push(solution);
                return true;
            }
        }
        false
    }

    /// Best solutions in a deterministic order (by assignment, then expansion).
    pub fn sorted_best(&self) -> Vec<Solution> {
        let mut best = self.best.clone();
        best.sort_by(|a, b| a.assignment.cmp(&b.assignment).then(a.expansion.cmp(&b.expansion)));
        best
    }

    /// Forget every solution and cached score.
    pub fn clear(&mut self) {
        self.best_score = self.method.worst();
        self.best.clear();
        self.scored.clear();
        self.evaluations = 0;
    }
}

// ─── SearchContext ──────────────────────────────────────────────────────────

/// Everything a heuristic needs to score candidates, borrowed for one run.
pub(crate) struct SearchContext<'a> {
    pub matrix: &'a Matrix,
    pub image: &'a BlockImage,
    /// Expansion count of `image`, checked at initialize.
    pub expansions: usize,
    pub method: GofMethod,
    pub config: &'a SearchConfig,
    pub budget: &'a Budget,
    pub session: &'a Mutex<SearchSession>,
}

impl SearchContext<'_> {
    /// Number of actors.
    pub fn actors(&self) -> usize {
        self.matrix.size()
    }

    /// Number of positions.
    pub fn positions(&self) -> usize {
        self.image.size()
    }

    /// Score `assignment`, consulting and filling the session cache, and offer
    /// every best-scoring expansion to the best-solution set.
    pub fn evaluate(&self, assignment: &[usize], expansions: ExpansionSelect) -> Result<f64, GofError> {
        let key = ScoreKey::new(assignment, expansions);
        if let Some(score) = self.session.lock().cached(&key) {
            return Ok(score);
        }

        let partition = Partition::from_assignment(assignment, self.image.positions())?;
        let mut best = self.method.worst();
        let mut winners: Vec<usize> = Vec::new();
        let mut consider = |idx: usize, score: f64| {
            if winners.is_empty() || self.method.is_better(score, best) {
                best = score;
                winners.clear();
                winners.push(idx);
            } else if self.method.is_tie(score, best) {
                winners.push(idx);
            }
        };

        match expansions {
            ExpansionSelect::All if !self.image.is_multi_blocked() => {
                consider(0, gof::score(self.matrix, &partition, self.image, self.method)?);
            }
            ExpansionSelect::All => {
                for (idx, expanded) in self.image.expand().enumerate() {
                    consider(idx, gof::score(self.matrix, &partition, &expanded, self.method)?);
                }
            }
            ExpansionSelect::One(idx) => {
                let score = match self.image.expansion(idx) {
                    Some(expanded) => gof::score(self.matrix, &partition, &expanded, self.method)?,
                    None => return Err(GofError::MultiBlocked),
                };
                consider(idx, score);
            }
        }

        let mut session = self.session.lock();
        session.record(key, best);
        for expansion in winners {
            session.offer(Solution {
                assignment: assignment.to_vec(),
                expansion,
                score: best,
                signature: signature(assignment),
            });
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solution(assignment: &[usize], expansion: usize, score: f64) -> Solution {
        Solution {
            assignment: assignment.to_vec(),
            expansion,
            score,
            signature: signature(assignment),
        }
    }

    #[test]
    fn better_score_replaces_set() {
        let mut s = SearchSession::new(GofMethod::Hamming);
        assert!(s.offer(solution(&[0, 1], 0, 3.0)));
        assert!(s.offer(solution(&[1, 0], 0, 1.0)));
        assert_eq!(s.best().len(), 1);
        assert_eq!(s.best_score(), Some(1.0));
        assert!(!s.offer(solution(&[0, 0], 0, 2.0)));
    }

    #[test]
    fn ties_kept_when_distinct() {
        let mut s = SearchSession::new(GofMethod::Nordlund);
        assert!(s.offer(solution(&[0, 1], 0, 0.5)));
        assert!(s.offer(solution(&[0, 1], 1, 0.5)));
        assert!(s.offer(solution(&[1, 0], 0, 0.5)));
        assert!(!s.offer(solution(&[0, 1], 0, 0.5)), "exact duplicate");
        assert_eq!(s.best().len(), 3);
        let sorted = s.sorted_best();
        assert_eq!(sorted[0].assignment, vec![0, 1]);
        assert_eq!(sorted[2].assignment, vec![1, 0]);
    }

    #[test]
    fn cache_records_evaluations() {
        let mut s = SearchSession::new(GofMethod::Hamming);
        let key = ScoreKey::new(&[0, 1, 1], ExpansionSelect::All);
        assert_eq!(s.cached(&key), None);
        s.record(key.clone(), 2.0);
        assert_eq!(s.cached(&key), Some(2.0));
        assert_eq!(s.scored_count(), 1);
        assert_eq!(s.evaluations(), 1);
        s.clear();
        assert_eq!(s.scored_count(), 0);
        assert_eq!(s.best_score(), None);
    }

    #[test]
    fn cache_keyed_by_assignment_not_hash() {
        let mut s = SearchSession::new(GofMethod::Hamming);
        s.record(ScoreKey::new(&[0, 1, 1], ExpansionSelect::All), 2.0);
        assert_eq!(s.cached(&ScoreKey::new(&[1, 0, 0], ExpansionSelect::All)), None);
        assert_eq!(s.cached(&ScoreKey::new(&[0, 1, 1], ExpansionSelect::One(0))), None);

        // Two solutions forced onto one signature stay distinct.
        let mut a = solution(&[0, 1], 0, 1.0);
        let mut b = solution(&[1, 0], 0, 1.0);
        a.signature = 42;
        b.signature = 42;
        assert!(s.offer(a));
        assert!(s.offer(b), "same signature, different assignment");
        assert_eq!(s.best().len(), 2);
    }
}
