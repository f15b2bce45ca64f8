/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Block images and multi-block expansion.
//!
//! A [`BlockImage`] is a square grid over named positions. Each cell holds a
//! set of candidate ideal blocks; an image with more than one candidate in any
//! cell is *multi-blocked* and must be expanded into concrete single-blocked
//! images before it can be scored.
//!
//! Expansion is a Cartesian product over the multi-candidate cells, produced
//! lazily in mixed-radix order (the last branching cell varies fastest).
//! [`Expansions`] can be rewound with [`Expansions::restart`], and
//! [`BlockImage::expansion`] gives random access by index, so the search engine
//! can store a winning expansion as a plain number.

use core::fmt;

use crate::blocks::{Block, BlockRegistry};
use crate::error::BlockError;

/// Separator between candidates in the text form of a cell (`"com;reg"`).
pub const CANDIDATE_SEPARATOR: char = ';';

/// Square grid of positions with candidate ideal blocks per cell.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BlockImage {
    positions: Vec<String>,
    /// Row-major, `positions.len()²` cells.
    cells: Vec<Vec<Block>>,
}

impl BlockImage {
    /// Image with the given position names and every cell empty.
    pub fn new<S: AsRef<str>>(positions: &[S]) -> Result<Self, BlockError> {
        if positions.is_empty() {
            return Err(BlockError::InvalidPositions { message: "image needs at least one position".into() });
        }
        let names: Vec<String> = positions.iter().map(|p| p.as_ref().to_string()).collect();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(BlockError::InvalidPositions {
                    message: format!("duplicate position '{}'", name),
                });
            }
        }
        let k = names.len();
        Ok(Self { positions: names, cells: vec![Vec::new(); k * k] })
    }

    /// Build an image from text cells, one row per position.
    ///
    /// Each cell lists candidates separated by `;`, e.g. `"com;den(0.4)"`.
    pub fn from_rows<S: AsRef<str>>(
        registry: &BlockRegistry,
        positions: &[S],
        rows: &[Vec<&str>],
    ) -> Result<Self, BlockError> {
        let mut image = Self::new(positions)?;
        let k = image.size();
        if rows.len() != k {
            return Err(BlockError::RowLength { row: rows.len(), expected: k, actual: rows.len() });
        }
        for (r, row) in rows.iter().enumerate() {
            if row.len() != k {
                return Err(BlockError::RowLength { row: r, expected: k, actual: row.len() });
            }
            for (c, cell) in row.iter().enumerate() {
                for candidate in cell.split(CANDIDATE_SEPARATOR).filter(|s| !s.trim().is_empty()) {
                    image.add_candidate(r, c, registry.parse(candidate)?)?;
                }
            }
        }
        Ok(image)
    }

    /// Number of positions.
    pub fn size(&self) -> usize {
        self.positions.len()
    }

    /// Position names in order.
    pub fn positions(&self) -> &[String] {
        &self.positions
    }

    fn offset(&self, row: usize, col: usize) -> Result<usize, BlockError> {
        let k = self.size();
        if row >= k || col >= k {
            return Err(BlockError::CellOutOfRange { row, col, size: k });
        }
        Ok(row * k + col)
    }

    /// Candidate blocks of a cell.
    pub fn candidates(&self, row: usize, col: usize) -> &[Block] {
        match self.offset(row, col) {
            Ok(i) => &self.cells[i],
            Err(_) => &[],
        }
    }

    /// First candidate of a cell; the chosen block of a single-blocked image.
    pub fn block(&self, row: usize, col: usize) -> Option<&Block> {
        self.candidates(row, col).first()
    }

    /// Replace the candidates of a cell.
    pub fn set_cell(&mut self, row: usize, col: usize, candidates: Vec<Block>) -> Result<(), BlockError> {
        let i = self.offset(row, col)?;
        self.cells[i] = candidates;
        Ok(())
    }

    /// Append one candidate to a cell.
    pub fn add_candidate(&mut self, row: usize, col: usize, block: Block) -> Result<(), BlockError> {
        let i = self.offset(row, col)?;
        self.cells[i].push(block);
        Ok(())
    }

    /// Fill every cell with copies of `block`.
    pub fn fill(&mut self, block: &Block) {
        for cell in &mut self.cells {
            *cell = vec![block.clone()];
        }
    }

    /// Cells without any candidate.
    pub fn unresolved_cells(&self) -> Vec<(usize, usize)> {
        let k = self.size();
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_empty())
            .map(|(i, _)| (i / k, i % k))
            .collect()
    }

    /// True when any cell has more than one candidate.
    pub fn is_multi_blocked(&self) -> bool {
        self.cells.iter().any(|c| c.len() > 1)
    }

    /// Every candidate block in the image.
    pub fn all_blocks(&self) -> impl Iterator<Item = &Block> {
        self.cells.iter().flatten()
    }

    /// Number of single-blocked images [`Self::expand`] yields.
    ///
    /// Zero when some cell is empty, `None` when the count overflows `usize`.
    pub fn expansion_count(&self) -> Option<usize> {
        self.cells.iter().try_fold(1usize, |acc, c| acc.checked_mul(c.len()))
    }

    /// The `index`-th expansion in mixed-radix order.
    pub fn expansion(&self, index: usize) -> Option<BlockImage> {
        if self.cells.iter().any(Vec::is_empty) {
            return None;
        }
        if let Some(count) = self.expansion_count() {
            if index >= count {
                return None;
            }
        }
        let mut rest = index;
        let mut picks = vec![0usize; self.cells.len()];
        for (i, cell) in self.cells.iter().enumerate().rev() {
            picks[i] = rest % cell.len();
            rest /= cell.len();
        }
        Some(self.with_picks(&picks))
    }

    fn with_picks(&self, picks: &[usize]) -> BlockImage {
        let cells = self
            .cells
            .iter()
            .zip(picks)
            .map(|(cell, &p)| vec![cell[p].clone()])
            .collect();
        BlockImage { positions: self.positions.clone(), cells }
    }

    /// Lazily enumerate the single-blocked images of this image.
    ///
    /// Cells with one candidate never branch; a non-multi-blocked image yields
    /// exactly one copy of itself.
    pub fn expand(&self) -> Expansions<'_> {
        Expansions::new(self)
    }

    /// Display-form grid (`"com"`, `"den(0.4)"`, candidates joined by `;`).
    pub fn symbolic(&self) -> Vec<Vec<String>> {
        let k = self.size();
        (0..k)
            .map(|r| {
                (0..k)
                    .map(|c| {
                        self.candidates(r, c)
                            .iter()
                            .map(|b| b.to_string())
                            .collect::<Vec<_>>()
                            .join(";")
                    })
                    .collect()
            })
            .collect()
    }
}

impl fmt::Display for BlockImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let grid = self.symbolic();
        let width = grid
            .iter()
            .flatten()
            .map(|s| s.len())
            .chain(self.positions.iter().map(|p| p.len()))
            .max()
            .unwrap_or(1);
        write!(f, "{:w$}", "", w = width)?;
        for p in &self.positions {
            write!(f, " {:>w$}", p, w = width)?;
        }
        writeln!(f)?;
        for (p, row) in self.positions.iter().zip(&grid) {
            write!(f, "{:w$}", p, w = width)?;
            for cell in row {
                write!(f, " {:>w$}", cell, w = width)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ─── Expansions ─────────────────────────────────────────────────────────────

/// Restartable lazy iterator over the expansions of a [`BlockImage`].
#[derive(Clone, Debug)]
pub struct Expansions<'a> {
    image: &'a BlockImage,
    /// Current candidate index per cell.
    picks: Vec<usize>,
    /// Index of the next expansion to yield.
    next: usize,
    /// Set once the picks wrap past the last expansion.
    done: bool,
}

impl<'a> Expansions<'a> {
    fn new(image: &'a BlockImage) -> Self {
        Self {
            image,
            picks: vec![0; image.cells.len()],
            next: 0,
            done: image.cells.iter().any(Vec::is_empty),
        }
    }

    /// Rewind to the first expansion.
    pub fn restart(&mut self) {
        self.picks.iter_mut().for_each(|p| *p = 0);
        self.next = 0;
        self.done = self.image.cells.iter().any(Vec::is_empty);
    }

    /// Index the next call to `next()` will yield.
    pub fn position(&self) -> usize {
        self.next
    }

    fn advance(&mut self) {
        for (i, cell) in self.image.cells.iter().enumerate().rev() {
            self.picks[i] += 1;
            if self.picks[i] < cell.len() {
                return;
            }
            self.picks[i] = 0;
        }
        self.done = true;
    }
}

impl Iterator for Expansions<'_> {
    type Item = BlockImage;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let image = self.image.with_picks(&self.picks);
        self.next = self.next.saturating_add(1);
        self.advance();
        Some(image)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.image.expansion_count() {
            Some(total) => {
                let left = total.saturating_sub(self.next);
                (left, Some(left))
            }
            None => (usize::MAX, None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> BlockRegistry {
        BlockRegistry::builtin()
    }

    #[test]
    fn single_multi_cell_expands_to_two() {
        let image = BlockImage::from_rows(
            &registry(),
            &["A", "B"],
            &[vec!["com", "nul;reg"], vec!["nul", "com"]],
        )
        .unwrap();
        assert!(image.is_multi_blocked());
        let expanded: Vec<_> = image.expand().collect();
        assert_eq!(expanded.len(), 2);
        assert_eq!(expanded[0].block(0, 1).unwrap().name(), "nul");
        assert_eq!(expanded[1].block(0, 1).unwrap().name(), "reg");
        for e in &expanded {
            assert!(!e.is_multi_blocked());
            assert_eq!(e.block(0, 0).unwrap().name(), "com");
            assert_eq!(e.block(1, 0).unwrap().name(), "nul");
            assert_eq!(e.block(1, 1).unwrap().name(), "com");
        }
    }

    #[test]
    fn expansion_order_matches_random_access() {
        let image = BlockImage::from_rows(
            &registry(),
            &["A", "B"],
            &[vec!["com;nul", "reg"], vec!["rre;cre;dnc", "com"]],
        )
        .unwrap();
        assert_eq!(image.expansion_count(), Some(6));
        for (i, e) in image.expand().enumerate() {
            assert_eq!(Some(e), image.expansion(i));
        }
        assert!(image.expansion(6).is_none());
    }

    #[test]
    fn expansions_restart() {
        let image = BlockImage::from_rows(&registry(), &["A"], &[vec!["com;nul"]]).unwrap();
        let mut it = image.expand();
        assert_eq!(it.next().unwrap().block(0, 0).unwrap().name(), "com");
        assert_eq!(it.position(), 1);
        it.restart();
        assert_eq!(it.size_hint(), (2, Some(2)));
        assert_eq!(it.next().unwrap().block(0, 0).unwrap().name(), "com");
        assert_eq!(it.next().unwrap().block(0, 0).unwrap().name(), "nul");
        assert!(it.next().is_none());
    }

    #[test]
    fn single_blocked_expands_to_itself() {
        let image = BlockImage::from_rows(&registry(), &["A", "B"], &[vec!["com", "nul"], vec!["nul", "com"]])
            .unwrap();
        let expanded: Vec<_> = image.expand().collect();
        assert_eq!(expanded, vec![image]);
    }

    #[test]
    fn unresolved_cells_reported() {
        let mut image = BlockImage::new(&["A", "B"]).unwrap();
        image.add_candidate(0, 0, registry().parse("com").unwrap()).unwrap();
        assert_eq!(image.unresolved_cells(), vec![(0, 1), (1, 0), (1, 1)]);
        assert_eq!(image.expansion_count(), Some(0));
        assert_eq!(image.expand().count(), 0);
        assert!(image.expansion(0).is_none());
    }

    #[test]
    fn huge_expansion_count_is_none() {
        let names: Vec<String> = (0..6).map(|i| format!("P{}", i)).collect();
        let row = vec!["com;nul;reg;dnc"; 6];
        let rows = vec![row; 6];
        let image = BlockImage::from_rows(&registry(), &names, &rows).unwrap();
        assert_eq!(image.expansion_count(), None, "4^36 does not fit in usize");
        let mut it = image.expand();
        assert_eq!(it.size_hint(), (usize::MAX, None));
        let first = it.next().unwrap();
        assert_eq!(Some(first), image.expansion(0));
        assert_eq!(it.next().unwrap().block(5, 5).unwrap().name(), "nul");
    }

    #[test]
    fn duplicate_positions_rejected() {
        assert!(BlockImage::new(&["A", "A"]).is_err());
        assert!(BlockImage::new::<&str>(&[]).is_err());
    }
}
