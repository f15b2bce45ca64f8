//! Actors and the weighted relational matrix the core works on.
//!
//! The matrix is supplied by the caller and treated as read-only: the search
//! engine only ever holds it through an `Arc`. Values are real-valued tie
//! strengths; a cell counts as a tie when its value is `> 0`.

use hashbrown::HashSet;

use crate::error::BlockError;

// ─── Actor / Actorset ───────────────────────────────────────────────────────

/// A network member.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actor {
    /// Position in the owning [`Actorset`]; the canonical storage key.
    pub index: usize,
    /// Unique display label.
    pub label: String,
}

/// Ordered, uniquely-labeled collection of actors.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Actorset {
    actors: Vec<Actor>,
}

impl Actorset {
    /// Build an actorset from labels; indices follow label order.
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Result<Self, BlockError> {
        let mut seen = HashSet::with_capacity(labels.len());
        let mut actors = Vec::with_capacity(labels.len());
        for (index, label) in labels.iter().enumerate() {
            let label = label.as_ref();
            if !seen.insert(label) {
                return Err(BlockError::DuplicateLabel { label: label.to_string() });
            }
            actors.push(Actor { index, label: label.to_string() });
        }
        Ok(Self { actors })
    }

    /// Actorset labelled `1..=n`.
    pub fn numbered(n: usize) -> Self {
        Self {
            actors: (0..n)
                .map(|index| Actor { index, label: (index + 1).to_string() })
                .collect(),
        }
    }

    /// Number of actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// True when there are no actors.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    /// Actor at `index`.
    pub fn get(&self, index: usize) -> Option<&Actor> {
        self.actors.get(index)
    }

    /// Label of actor `index`, or `"?"` if out of range.
    pub fn label(&self, index: usize) -> &str {
        self.actors.get(index).map(|a| a.label.as_str()).unwrap_or("?")
    }

    /// Index of the actor with this label.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.actors.iter().position(|a| a.label == label)
    }

    /// Iterate actors in index order.
    pub fn iter(&self) -> impl Iterator<Item = &Actor> {
        self.actors.iter()
    }
}

// ─── Matrix ─────────────────────────────────────────────────────────────────

/// Square weighted adjacency table over an [`Actorset`].
///
/// Row-major storage; `get(row, col)` is the tie from `row` to `col`.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix {
    actors: Actorset,
    values: Vec<f64>,
}

impl Matrix {
    /// Build a matrix from row-major values.
    ///
    /// Fails if `values.len() != n²` or any value is non-finite.
    pub fn new(actors: Actorset, values: Vec<f64>) -> Result<Self, BlockError> {
        let size = actors.len();
        if values.len() != size * size {
            return Err(BlockError::DimensionMismatch {
                size,
                expected: size * size,
                actual: values.len(),
            });
        }
        if let Some(pos) = values.iter().position(|v| !v.is_finite()) {
            return Err(BlockError::NonFinite { row: pos / size, col: pos % size });
        }
        Ok(Self { actors, values })
    }

    /// Build a matrix from nested rows with numbered actors.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, BlockError> {
        let size = rows.len();
        let values: Vec<f64> = rows.iter().flat_map(|r| r.iter().copied()).collect();
        for (r, row) in rows.iter().enumerate() {
            if row.len() != size {
                return Err(BlockError::RowLength { row: r, expected: size, actual: row.len() });
            }
        }
        Self::new(Actorset::numbered(size), values)
    }

    /// Number of actors (rows = columns).
    pub fn size(&self) -> usize {
        self.actors.len()
    }

    /// The actorset this matrix is indexed by.
    pub fn actors(&self) -> &Actorset {
        &self.actors
    }

    /// Tie value from `row` to `col`.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.actors.len() + col]
    }

    /// Row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Copy of this matrix with rows and columns reordered by `order`
    /// (`order[k]` is the original index placed at position `k`).
    pub fn permuted(&self, order: &[usize]) -> Result<Self, BlockError> {
        let n = self.size();
        let mut check = vec![false; n];
        if order.len() != n || order.iter().any(|&i| i >= n || std::mem::replace(&mut check[i], true)) {
            return Err(BlockError::InvalidPartition {
                message: "permutation must list every actor exactly once".into(),
            });
        }
        let labels: Vec<&str> = order.iter().map(|&i| self.actors.label(i)).collect();
        let mut values = Vec::with_capacity(n * n);
        for &r in order {
            for &c in order {
                values.push(self.get(r, c));
            }
        }
        Self::new(Actorset::new(&labels)?, values)
    }
}

// ─── IdealMatrix ────────────────────────────────────────────────────────────

/// Diagnostic grid of idealized tie values written by the block library.
///
/// `None` marks a "don't care" cell or a cell no block wrote (e.g. self-ties).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IdealMatrix {
    size: usize,
    cells: Vec<Option<f64>>,
}

impl IdealMatrix {
    /// All-`None` ideal matrix for `size` actors.
    pub fn new(size: usize) -> Self {
        Self { size, cells: vec![None; size * size] }
    }

    /// Number of actors.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Ideal value at (`row`, `col`).
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row * self.size + col]
    }

    /// Write an ideal value.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: Option<f64>) {
        self.cells[row * self.size + col] = value;
    }

    /// Reset every cell to `None`.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_labels_rejected() {
        let err = Actorset::new(&["a", "b", "a"]).unwrap_err();
        assert_eq!(err, BlockError::DuplicateLabel { label: "a".into() });
    }

    #[test]
    fn matrix_dimension_checked() {
        let actors = Actorset::numbered(2);
        assert!(Matrix::new(actors.clone(), vec![0.0; 3]).is_err());
        assert!(Matrix::new(actors, vec![0.0; 4]).is_ok());
    }

    #[test]
    fn non_finite_rejected() {
        let err = Matrix::new(Actorset::numbered(2), vec![0.0, f64::NAN, 0.0, 0.0]).unwrap_err();
        assert_eq!(err, BlockError::NonFinite { row: 0, col: 1 });
    }

    #[test]
    fn permuted_reorders_rows_and_labels() {
        let m = Matrix::from_rows(&[
            vec![0.0, 1.0, 2.0],
            vec![3.0, 0.0, 4.0],
            vec![5.0, 6.0, 0.0],
        ])
        .unwrap();
        let p = m.permuted(&[2, 0, 1]).unwrap();
        assert_eq!(p.get(0, 1), 5.0);
        assert_eq!(p.get(1, 2), 1.0);
        assert_eq!(p.actors().label(0), "3");
        assert!(m.permuted(&[0, 0, 1]).is_err());
    }

    #[test]
    fn ideal_matrix_set_get() {
        let mut im = IdealMatrix::new(2);
        im.set(0, 1, Some(1.0));
        assert_eq!(im.get(0, 1), Some(1.0));
        assert_eq!(im.get(1, 0), None);
        im.clear();
        assert_eq!(im.get(0, 1), None);
    }
}
