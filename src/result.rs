/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Result assembly: frozen blockmodels, run status and log lines.
//!
//! | Type | What it is |
//! |------|------------|
//! | [`BlockModel`] | One globally optimal (partition, concrete image) pair with its score |
//! | [`SearchStatus`] | How the run ended: `ok`, `timeout`, `cancelled` |
//! | [`SearchOutcome`] | Status + every tied model + the run log |
//! | [`LogLine`] | Info / status / error line for the caller to display |

use core::fmt;
use std::sync::Arc;

use crate::blocks::Block;
use crate::error::{GofError, ERROR_MARKER};
use crate::gof::{self, round4, GofMethod};
use crate::image::BlockImage;
use crate::network::{IdealMatrix, Matrix};
use crate::partition::Partition;
use crate::search::session::Solution;

/// Prefix of status log lines.
pub const STATUS_MARKER: &str = "!Status:";

// ─── LogLine ────────────────────────────────────────────────────────────────

/// One line of the human-readable run log.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogLine {
    /// Progress information, rendered as-is.
    Info(String),
    /// Run status, rendered with [`STATUS_MARKER`].
    Status(String),
    /// Error, rendered with [`ERROR_MARKER`].
    Error(String),
}

impl LogLine {
    /// Info line.
    pub fn info(text: impl Into<String>) -> Self {
        Self::Info(text.into())
    }

    /// Status line.
    pub fn status(text: impl Into<String>) -> Self {
        Self::Status(text.into())
    }

    /// Error line.
    pub fn error(text: impl Into<String>) -> Self {
        Self::Error(text.into())
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info(t) => f.write_str(t),
            Self::Status(t) => write!(f, "{} {}", STATUS_MARKER, t),
            Self::Error(t) => write!(f, "{} {}", ERROR_MARKER, t),
        }
    }
}

// ─── SearchStatus ───────────────────────────────────────────────────────────

/// How a run ended. None of these is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SearchStatus {
    /// The heuristic finished.
    Ok,
    /// `max_time` ran out; models are the best found so far.
    Timeout,
    /// The cancel token fired; models are the best found so far.
    Cancelled,
}

impl SearchStatus {
    /// Token the caller reports: `ok`, `timeout` or `cancelled`.
    pub fn token(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

// ─── BlockModel ─────────────────────────────────────────────────────────────

/// An optimal blockmodel, frozen.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockModel {
    matrix: Arc<Matrix>,
    partition: Partition,
    image: BlockImage,
    score: f64,
    method: GofMethod,
}

impl BlockModel {
    /// Freeze a model. `image` must be single-blocked.
    pub fn new(
        matrix: Arc<Matrix>,
        partition: Partition,
        image: BlockImage,
        score: f64,
        method: GofMethod,
    ) -> Result<Self, GofError> {
        if image.is_multi_blocked() {
            return Err(GofError::MultiBlocked);
        }
        if partition.len() != image.size() {
            return Err(GofError::PositionMismatch { clusters: partition.len(), positions: image.size() });
        }
        Ok(Self { matrix, partition, image, score: round4(score), method })
    }

    /// The network the model was fitted to.
    pub fn matrix(&self) -> &Arc<Matrix> {
        &self.matrix
    }

    /// Final partition.
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    /// Concrete (single-blocked) image.
    pub fn image(&self) -> &BlockImage {
        &self.image
    }

    /// Chosen block of cell `(row, col)`.
    pub fn block(&self, row: usize, col: usize) -> Option<&Block> {
        self.image.block(row, col)
    }

    /// Score rounded to four decimals.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Method the score was computed with.
    pub fn method(&self) -> GofMethod {
        self.method
    }

    /// The tie matrix with actors reordered by position, labels following.
    pub fn permuted_matrix(&self) -> Result<Matrix, GofError> {
        Ok(self.matrix.permuted(&self.partition.actor_order())?)
    }

    /// Display form of every cell, e.g. `den(0.4)`.
    pub fn symbolic_image(&self) -> Vec<Vec<String>> {
        self.image.symbolic()
    }

    /// Re-evaluate the model, collecting the ideal matrix (original actor order).
    pub fn ideal_matrix(&self) -> Result<IdealMatrix, GofError> {
        let mut ideal = IdealMatrix::new(self.matrix.size());
        gof::score_with_ideal(&self.matrix, &self.partition, &self.image, self.method, &mut ideal)?;
        Ok(ideal)
    }
}

impl fmt::Display for BlockModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "method: {}", self.method)?;
        writeln!(f, "score: {:.4}", self.score)?;
        writeln!(f, "positions:")?;
        for line in self.partition.describe(self.matrix.actors()).lines() {
            writeln!(f, "  {}", line)?;
        }
        writeln!(f, "image:")?;
        write!(f, "{}", self.image)
    }
}

// ─── SearchOutcome ──────────────────────────────────────────────────────────

/// Everything a finished (or stopped) run hands back.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SearchOutcome {
    /// How the run ended.
    pub status: SearchStatus,
    /// Every tied optimal model, sorted by assignment.
    pub models: Vec<BlockModel>,
    /// Run log.
    pub log: Vec<LogLine>,
    /// Partitions actually scored (cache misses).
    pub evaluations: u64,
}

impl SearchOutcome {
    /// Shared score of the models, if any.
    pub fn best_score(&self) -> Option<f64> {
        self.models.first().map(BlockModel::score)
    }

    /// `ok`, `timeout` or `cancelled`.
    pub fn status_token(&self) -> &'static str {
        self.status.token()
    }
}

/// Turn retained solutions into models, one per solution.
pub(crate) fn assemble(
    matrix: &Arc<Matrix>,
    image: &BlockImage,
    method: GofMethod,
    solutions: Vec<Solution>,
) -> Result<Vec<BlockModel>, GofError> {
    solutions
        .into_iter()
        .map(|s| {
            let partition = Partition::from_assignment(&s.assignment, image.positions())?;
            let concrete = image.expansion(s.expansion).ok_or(GofError::MultiBlocked)?;
            BlockModel::new(Arc::clone(matrix), partition, concrete, s.score, method)
        })
        .collect()
}
