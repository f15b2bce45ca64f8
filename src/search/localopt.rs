/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Local optimisation by single-actor moves, with restarts.
//!
//! # Algorithm
//!
//! ```text
//! for each restart r:
//!     rng   = ChaCha8(seed + r)
//!     start = supplied partition (first restart only), or a random one
//!             respecting min size
//!     repeat up to max_iterations sweeps:
//!         for each actor, for each other position:
//!             if the move keeps every cluster ≥ min size and strictly
//!             improves the score: apply it, go to the next actor
//!         stop when a sweep applies no move (local optimum)
//! ```
//!
//! Each restart owns its RNG and assignment, so restarts are independent and
//! can run on worker threads (`parallel` feature) without changing results.
//! The shared best-solution set is updated by every scored candidate, not just
//! by restart end points.

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use super::budget::StopReason;
use super::config::ExpansionMode;
use super::session::{ExpansionSelect, SearchContext};
use crate::error::GofError;
use crate::partition::cluster_sizes;
use crate::result::LogLine;

/// What one restart ended with.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RestartReport {
    pub restart: usize,
    pub score: f64,
    pub sweeps: usize,
    pub local_optimum: bool,
    pub stop: Option<StopReason>,
}

impl RestartReport {
    fn log_line(&self) -> LogLine {
        let end = match (self.stop, self.local_optimum) {
            (Some(StopReason::TimedOut), _) => "timed out",
            (Some(StopReason::Cancelled), _) => "cancelled",
            (None, true) => "local optimum",
            (None, false) => "iteration cap",
        };
        LogLine::info(format!(
            "restart {}: score {:.4} after {} sweeps ({})",
            self.restart + 1,
            self.score,
            self.sweeps,
            end
        ))
    }
}

/// Random assignment of `n` actors to `k` positions, each position getting at
/// least `min` actors.
pub(crate) fn random_assignment<R: Rng>(n: usize, k: usize, min: usize, rng: &mut R) -> Vec<usize> {
    let mut actors: Vec<usize> = (0..n).collect();
    actors.shuffle(rng);
    let mut assignment = vec![0usize; n];
    for (i, &actor) in actors.iter().enumerate() {
        assignment[actor] = if i < k * min { i / min } else { rng.gen_range(0..k) };
    }
    assignment
}

/// Run one restart. `start` seeds restart 0; later restarts start at random.
pub(crate) fn run_restart(
    ctx: &SearchContext<'_>,
    restart: usize,
    base_seed: u64,
    start: Option<&[usize]>,
) -> Result<RestartReport, GofError> {
    let n = ctx.actors();
    let k = ctx.positions();
    let min = ctx.config.min_cluster_size;
    let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(restart as u64));

    let mut assignment = match start.filter(|_| restart == 0) {
        Some(s) => s.to_vec(),
        None => random_assignment(n, k, min, &mut rng),
    };
    let select = match ctx.config.expansion_mode {
        ExpansionMode::All => ExpansionSelect::All,
        ExpansionMode::PerRestart => ExpansionSelect::One(restart % ctx.expansions.max(1)),
    };

    let mut sizes = cluster_sizes(&assignment, k);
    let mut current = ctx.evaluate(&assignment, select)?;
    let mut report = RestartReport {
        restart,
        score: current,
        sweeps: 0,
        local_optimum: false,
        stop: None,
    };

    while report.sweeps < ctx.config.max_iterations {
        if let Some(stop) = ctx.budget.check() {
            report.stop = Some(stop);
            return Ok(report);
        }
        report.sweeps += 1;
        let mut improved = false;

        for actor in 0..n {
            let from = assignment[actor];
            if sizes[from] <= min {
                continue;
            }
            for to in (0..k).filter(|&p| p != from) {
                assignment[actor] = to;
                let score = ctx.evaluate(&assignment, select)?;
                if ctx.method.is_better(score, current) {
                    current = score;
                    sizes[from] -= 1;
                    sizes[to] += 1;
                    improved = true;
                    break;
                }
                assignment[actor] = from;
                if let Some(stop) = ctx.budget.check() {
                    report.score = current;
                    report.stop = Some(stop);
                    return Ok(report);
                }
            }
        }

        report.score = current;
        if !improved {
            report.local_optimum = true;
            break;
        }
    }

    debug!(restart, score = current, sweeps = report.sweeps, "localopt restart finished");
    Ok(report)
}

/// Run every restart. `Ok(Some(_))` when the budget ran out first.
pub(crate) fn run(
    ctx: &SearchContext<'_>,
    base_seed: u64,
    start: Option<&[usize]>,
    log: &mut Vec<LogLine>,
) -> Result<Option<StopReason>, GofError> {
    #[cfg(feature = "parallel")]
    if ctx.config.parallel {
        return run_parallel(ctx, base_seed, start, log);
    }

    for restart in 0..ctx.config.restarts {
        let report = run_restart(ctx, restart, base_seed, start)?;
        log.push(report.log_line());
        if report.stop.is_some() {
            return Ok(report.stop);
        }
    }
    Ok(None)
}

#[cfg(feature = "parallel")]
fn run_parallel(
    ctx: &SearchContext<'_>,
    base_seed: u64,
    start: Option<&[usize]>,
    log: &mut Vec<LogLine>,
) -> Result<Option<StopReason>, GofError> {
    use rayon::prelude::*;

    let reports: Vec<Result<RestartReport, GofError>> = (0..ctx.config.restarts)
        .into_par_iter()
        .map(|restart| {
            // restarts scheduled after a stop end immediately
            if let Some(stop) = ctx.budget.check() {
                return Ok(RestartReport {
                    restart,
                    score: ctx.method.worst(),
                    sweeps: 0,
                    local_optimum: false,
                    stop: Some(stop),
                });
            }
            run_restart(ctx, restart, base_seed, start)
        })
        .collect();

    let mut stop = None;
    for report in reports {
        let report = report?;
        if report.sweeps > 0 || report.stop.is_none() {
            log.push(report.log_line());
        }
        stop = stop.or(report.stop);
    }
    Ok(stop)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_assignment_respects_min_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..50 {
            let a = random_assignment(9, 3, 2, &mut rng);
            assert!(cluster_sizes(&a, 3).iter().all(|&s| s >= 2), "{:?}", a);
        }
    }

    #[test]
    fn random_assignment_is_seeded() {
        let a = random_assignment(12, 4, 1, &mut ChaCha8Rng::seed_from_u64(9));
        let b = random_assignment(12, 4, 1, &mut ChaCha8Rng::seed_from_u64(9));
        assert_eq!(a, b);
    }
}
