/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Exhaustive enumeration of every valid assignment.
//!
//! Assignments are visited in mixed-radix order (actor 0 varies slowest), each
//! exactly once. Assignments that leave a cluster below the minimum size are
//! skipped without scoring.

use tracing::debug;

use super::budget::StopReason;
use super::session::{ExpansionSelect, SearchContext};
use crate::error::GofError;
use crate::partition::cluster_sizes;
use crate::result::LogLine;

/// Skipped assignments between budget checks when nothing is scored.
const SKIP_CHECK_INTERVAL: u64 = 4096;

/// Advance `assignment` to the next one in mixed-radix order.
///
/// Returns false after the last assignment.
pub(crate) fn next_assignment(assignment: &mut [usize], positions: usize) -> bool {
    for slot in assignment.iter_mut().rev() {
        *slot += 1;
        if *slot < positions {
            return true;
        }
        *slot = 0;
    }
    false
}

/// Run the exhaustive search. `Ok(None)` means every assignment was visited.
pub(crate) fn run(ctx: &SearchContext<'_>, log: &mut Vec<LogLine>) -> Result<Option<StopReason>, GofError> {
    let n = ctx.actors();
    let k = ctx.positions();
    let min = ctx.config.min_cluster_size;
    let mut assignment = vec![0usize; n];
    let mut visited: u64 = 0;
    let mut skipped: u64 = 0;

    loop {
        if cluster_sizes(&assignment, k).iter().all(|&s| s >= min) {
            ctx.evaluate(&assignment, ExpansionSelect::All)?;
            visited += 1;
            if let Some(stop) = ctx.budget.check() {
                log.push(LogLine::info(format!("exhaustive: stopped after {} partitions", visited)));
                return Ok(Some(stop));
            }
        } else {
            skipped += 1;
            if skipped % SKIP_CHECK_INTERVAL == 0 {
                if let Some(stop) = ctx.budget.check() {
                    log.push(LogLine::info(format!("exhaustive: stopped after {} partitions", visited)));
                    return Ok(Some(stop));
                }
            }
        }
        if !next_assignment(&mut assignment, k) {
            break;
        }
    }

    debug!(visited, skipped, "exhaustive search finished");
    log.push(LogLine::info(format!("exhaustive: scored {} partitions", visited)));
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_radix_counts_all_assignments() {
        let mut a = vec![0; 3];
        let mut count = 1;
        while next_assignment(&mut a, 2) {
            count += 1;
        }
        assert_eq!(count, 8);
        assert_eq!(a, vec![0, 0, 0], "wraps back to the start");
    }

    #[test]
    fn single_position_has_one_assignment() {
        let mut a = vec![0; 4];
        assert!(!next_assignment(&mut a, 1));
    }
}
