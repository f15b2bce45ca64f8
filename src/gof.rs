/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Goodness-of-fit evaluation of a (matrix, partition, image) triple.
//!
//! # Methods
//!
//! | Method | Mode | Direction |
//! |--------|------|-----------|
//! | `hamming` | sum of block penalties | lower is better, 0 = perfect |
//! | `nordlund` | weighted correlation, cell-weighted | higher is better, 1 = perfect |
//! | `ziberna` | weighted correlation, block-weighted | higher is better, 1 = perfect |
//!
//! For the correlation methods every block's triplets are pooled into one
//! sequence before a single weighted Pearson correlation is computed.
//! `nordlund` keeps the weights blocks produce, so large blocks dominate;
//! `ziberna` rescales each block to a total weight of 1, so every non-empty
//! block counts the same.
//!
//! Degenerate inputs (no weight, or no variance in either sequence) score 0.0
//! rather than failing.

use core::fmt;
use core::str::FromStr;

use crate::blocks::{BlockView, Triplet};
use crate::error::{GofError, SearchError};
use crate::image::BlockImage;
use crate::network::{IdealMatrix, Matrix};
use crate::partition::Partition;

/// Variance below which a sequence counts as constant.
const VARIANCE_EPSILON: f64 = 1e-12;

/// Relative tolerance for the triplet weight check.
const WEIGHT_TOLERANCE: f64 = 1e-9;

// ─── GofMethod ──────────────────────────────────────────────────────────────

/// Goodness-of-fit method.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum GofMethod {
    /// Deviation counting.
    Hamming,
    /// Cell-weighted correlation.
    Nordlund,
    /// Block-weighted correlation.
    Ziberna,
}

impl GofMethod {
    /// Lower-case method name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hamming => "hamming",
            Self::Nordlund => "nordlund",
            Self::Ziberna => "ziberna",
        }
    }

    /// True for the triplet-based methods.
    pub fn is_correlation(self) -> bool {
        !matches!(self, Self::Hamming)
    }

    /// True when `candidate` is strictly better than `incumbent`.
    pub fn is_better(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Hamming => candidate < incumbent - TIE_EPSILON,
            Self::Nordlund | Self::Ziberna => candidate > incumbent + TIE_EPSILON,
        }
    }

    /// True when two scores count as a tie.
    pub fn is_tie(self, a: f64, b: f64) -> bool {
        (a - b).abs() <= TIE_EPSILON
    }

    /// A score every real score beats.
    pub fn worst(self) -> f64 {
        match self {
            Self::Hamming => f64::INFINITY,
            Self::Nordlund | Self::Ziberna => f64::NEG_INFINITY,
        }
    }
}

/// Scores closer than this are ties.
pub const TIE_EPSILON: f64 = 1e-9;

impl FromStr for GofMethod {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hamming" => Ok(Self::Hamming),
            "nordlund" => Ok(Self::Nordlund),
            "ziberna" => Ok(Self::Ziberna),
            _ => Err(SearchError::UnknownMethod(s.to_string())),
        }
    }
}

impl fmt::Display for GofMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Evaluation ─────────────────────────────────────────────────────────────

/// Score `partition` against `image` on `matrix` under `method`.
///
/// The image must be single-blocked and have one position per cluster.
pub fn score(
    matrix: &Matrix,
    partition: &Partition,
    image: &BlockImage,
    method: GofMethod,
) -> Result<f64, GofError> {
    evaluate(matrix, partition, image, method, None)
}

/// As [`score`], also writing the ideal matrix implied by the image.
pub fn score_with_ideal(
    matrix: &Matrix,
    partition: &Partition,
    image: &BlockImage,
    method: GofMethod,
    ideal: &mut IdealMatrix,
) -> Result<f64, GofError> {
    if ideal.size() != matrix.size() {
        return Err(GofError::ActorOutOfRange { index: ideal.size(), size: matrix.size() });
    }
    evaluate(matrix, partition, image, method, Some(ideal))
}

fn evaluate(
    matrix: &Matrix,
    partition: &Partition,
    image: &BlockImage,
    method: GofMethod,
    mut ideal: Option<&mut IdealMatrix>,
) -> Result<f64, GofError> {
    if image.is_multi_blocked() {
        return Err(GofError::MultiBlocked);
    }
    let k = image.size();
    if partition.len() != k {
        return Err(GofError::PositionMismatch { clusters: partition.len(), positions: k });
    }
    let n = matrix.size();
    for cluster in partition.clusters() {
        if let Some(&bad) = cluster.members().iter().find(|&&a| a >= n) {
            return Err(GofError::ActorOutOfRange { index: bad, size: n });
        }
    }

    let clusters = partition.clusters();
    let mut penalty_sum = 0.0;
    let mut triplets: Vec<Triplet> = Vec::new();

    for r in 0..k {
        for c in 0..k {
            let block = image.block(r, c).ok_or(GofError::EmptyCell { row: r, col: c })?;
            let view = BlockView::new(matrix, clusters[r].members(), clusters[c].members());

            if method.is_correlation() {
                let start = triplets.len();
                block.append_triplets(&view, &mut triplets, ideal.as_deref_mut());
                let cells = view.cell_count() as f64;
                let weight: f64 = triplets[start..].iter().map(|t| t.weight).sum();
                if (weight - cells).abs() > WEIGHT_TOLERANCE * cells.max(1.0) {
                    return Err(GofError::TripletWeight {
                        block: block.to_string(),
                        weight,
                        expected: cells,
                    });
                }
                if method == GofMethod::Ziberna && cells > 0.0 {
                    triplets[start..].iter_mut().for_each(|t| t.weight /= cells);
                }
            } else {
                let p = block.penalty(&view, ideal.as_deref_mut());
                if !p.is_finite() || p < 0.0 {
                    return Err(GofError::InvalidPenalty { block: block.to_string(), value: p });
                }
                penalty_sum += p;
            }
        }
    }

    if method.is_correlation() {
        Ok(weighted_correlation(&triplets))
    } else {
        Ok(penalty_sum)
    }
}

/// Weighted Pearson correlation between observed and ideal values.
///
/// Returns 0.0 when the total weight is zero or either side has no variance.
pub fn weighted_correlation(triplets: &[Triplet]) -> f64 {
    let total: f64 = triplets.iter().map(|t| t.weight).sum();
    if total <= 0.0 {
        return 0.0;
    }
    let mean_o = triplets.iter().map(|t| t.weight * t.observed).sum::<f64>() / total;
    let mean_i = triplets.iter().map(|t| t.weight * t.ideal).sum::<f64>() / total;

    let (mut cov, mut var_o, mut var_i) = (0.0, 0.0, 0.0);
    for t in triplets {
        let do_ = t.observed - mean_o;
        let di = t.ideal - mean_i;
        cov += t.weight * do_ * di;
        var_o += t.weight * do_ * do_;
        var_i += t.weight * di * di;
    }
    var_o /= total;
    var_i /= total;
    cov /= total;
    if var_o <= VARIANCE_EPSILON || var_i <= VARIANCE_EPSILON {
        return 0.0;
    }
    let r = cov / (var_o * var_i).sqrt();
    if r.is_finite() {
        r.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Round to four decimals, the precision results are reported at.
pub fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockRegistry;

    // Two perfect cliques {0,1,2} and {3,4} with no ties between them.
    fn two_cliques() -> Matrix {
        let mut rows = vec![vec![0.0; 5]; 5];
        for (a, b) in [(0, 1), (0, 2), (1, 2), (3, 4)] {
            rows[a][b] = 1.0;
            rows[b][a] = 1.0;
        }
        Matrix::from_rows(&rows).unwrap()
    }

    fn diagonal_image() -> BlockImage {
        BlockImage::from_rows(
            &BlockRegistry::builtin(),
            &["P1", "P2"],
            &[vec!["com", "nul"], vec!["nul", "com"]],
        )
        .unwrap()
    }

    fn true_partition() -> Partition {
        Partition::from_assignment(&[0, 0, 0, 1, 1], &["P1", "P2"]).unwrap()
    }

    #[test]
    fn method_parsing() {
        assert_eq!("Hamming".parse::<GofMethod>().unwrap(), GofMethod::Hamming);
        assert_eq!("ziberna".parse::<GofMethod>().unwrap(), GofMethod::Ziberna);
        assert!(matches!("pearson".parse::<GofMethod>(), Err(SearchError::UnknownMethod(_))));
    }

    #[test]
    fn hamming_perfect_fit_is_zero() {
        let s = score(&two_cliques(), &true_partition(), &diagonal_image(), GofMethod::Hamming).unwrap();
        assert_eq!(s, 0.0);
    }

    #[test]
    fn correlation_perfect_fit_is_one() {
        for method in [GofMethod::Nordlund, GofMethod::Ziberna] {
            let s = score(&two_cliques(), &true_partition(), &diagonal_image(), method).unwrap();
            assert!((s - 1.0).abs() < 1e-9, "{} gave {}", method, s);
        }
    }

    #[test]
    fn wrong_partition_scores_worse() {
        let wrong = Partition::from_assignment(&[0, 1, 0, 1, 0], &["P1", "P2"]).unwrap();
        let m = two_cliques();
        let img = diagonal_image();
        let good = score(&m, &true_partition(), &img, GofMethod::Hamming).unwrap();
        let bad = score(&m, &wrong, &img, GofMethod::Hamming).unwrap();
        assert!(GofMethod::Hamming.is_better(good, bad));
        let good = score(&m, &true_partition(), &img, GofMethod::Nordlund).unwrap();
        let bad = score(&m, &wrong, &img, GofMethod::Nordlund).unwrap();
        assert!(GofMethod::Nordlund.is_better(good, bad));
    }

    #[test]
    fn zero_variance_scores_zero() {
        // every ideal value is 1: no variance on the ideal side
        let reg = BlockRegistry::builtin();
        let img = BlockImage::from_rows(&reg, &["P1", "P2"], &[vec!["com", "com"], vec!["com", "com"]]).unwrap();
        let s = score(&two_cliques(), &true_partition(), &img, GofMethod::Nordlund).unwrap();
        assert_eq!(s, 0.0);
        assert_eq!(weighted_correlation(&[]), 0.0);
    }

    #[test]
    fn multi_blocked_image_rejected() {
        let reg = BlockRegistry::builtin();
        let img = BlockImage::from_rows(&reg, &["P1", "P2"], &[vec!["com;reg", "nul"], vec!["nul", "com"]]).unwrap();
        let err = score(&two_cliques(), &true_partition(), &img, GofMethod::Hamming).unwrap_err();
        assert_eq!(err, GofError::MultiBlocked);
    }

    #[test]
    fn position_mismatch_rejected() {
        let p = Partition::from_assignment(&[0, 0, 1, 1, 2], &["A", "B", "C"]).unwrap();
        let err = score(&two_cliques(), &p, &diagonal_image(), GofMethod::Hamming).unwrap_err();
        assert_eq!(err, GofError::PositionMismatch { clusters: 3, positions: 2 });
    }

    #[test]
    fn ideal_matrix_written() {
        let mut ideal = IdealMatrix::new(5);
        score_with_ideal(&two_cliques(), &true_partition(), &diagonal_image(), GofMethod::Hamming, &mut ideal)
            .unwrap();
        assert_eq!(ideal.get(0, 1), Some(1.0));
        assert_eq!(ideal.get(0, 3), Some(0.0));
        assert_eq!(ideal.get(0, 0), None, "self-ties are never written");
    }

    #[test]
    fn ziberna_weights_blocks_equally() {
        // one missing tie inside the large clique hurts nordlund more than ziberna
        // relative to an error in the small clique
        let mut rows = vec![vec![0.0; 5]; 5];
        for (a, b) in [(0, 1), (0, 2), (1, 2)] {
            rows[a][b] = 1.0;
            rows[b][a] = 1.0;
        }
        rows[3][4] = 1.0;
        let m = Matrix::from_rows(&rows).unwrap();
        let n = score(&m, &true_partition(), &diagonal_image(), GofMethod::Nordlund).unwrap();
        let z = score(&m, &true_partition(), &diagonal_image(), GofMethod::Ziberna).unwrap();
        assert!(n > z, "nordlund {} should exceed ziberna {}", n, z);
    }

    #[test]
    fn round4_rounds() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round4(2.0), 2.0);
    }
}
