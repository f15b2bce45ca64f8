/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Regular blocks: every row and/or column holds at least one tie.
//!
//! Penalty: an empty row costs its full length (the number of cells that would
//! have to be inspected to confirm it is empty), likewise for columns.
//!
//! Triplets: one point per row (column), the line maximum against ideal 1,
//! weighted by the line length. [`Regular`] checks both axes, each at half
//! weight, so its weights still add up to the cell count.

use super::{line_max, BlockView, IdealBlock, Triplet};
use crate::network::IdealMatrix;

/// Which axis a regular check walks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Axis {
    Rows,
    Cols,
}

/// Line maxima along `axis` as `(row actor, column actor, max, line length)`.
pub(crate) fn maxima(view: &BlockView<'_>, axis: Axis) -> Vec<(usize, usize, f64, usize)> {
    match axis {
        Axis::Rows => view
            .rows()
            .iter()
            .filter_map(|&r| line_max(view.row_cells(r)).map(|(c, v, len)| (r, c, v, len)))
            .collect(),
        Axis::Cols => view
            .cols()
            .iter()
            .filter_map(|&c| line_max(view.col_cells(c)).map(|(r, v, len)| (r, c, v, len)))
            .collect(),
    }
}

/// Regular-check penalty along `axis`, scaled by `scale`.
pub(crate) fn regular_penalty(view: &BlockView<'_>, axis: Axis, scale: f64) -> f64 {
    maxima(view, axis)
        .into_iter()
        .filter(|&(_, _, max, _)| max <= 0.0)
        .map(|(_, _, _, len)| len as f64 * scale)
        .sum()
}

/// Regular-check triplets along `axis`, each weighted `len × scale`.
pub(crate) fn regular_triplets(view: &BlockView<'_>, axis: Axis, scale: f64, out: &mut Vec<Triplet>) {
    out.extend(
        maxima(view, axis)
            .into_iter()
            .map(|(_, _, max, len)| Triplet::new(max, 1.0, len as f64 * scale)),
    );
}

/// Mark the line maxima as ideal ties; everything else is "don't care".
pub(crate) fn write_regular_ideal(view: &BlockView<'_>, axes: &[Axis], ideal: &mut IdealMatrix) {
    view.fill_ideal(ideal, None);
    for &axis in axes {
        for (r, c, _, _) in maxima(view, axis) {
            ideal.set(r, c, Some(1.0));
        }
    }
}

/// Each row holds at least one tie.
#[derive(Clone, Copy, Debug, Default)]
pub struct RowRegular;

impl IdealBlock for RowRegular {
    fn name(&self) -> &'static str {
        "rre"
    }

    fn kind_id(&self) -> u16 {
        5
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            write_regular_ideal(view, &[Axis::Rows], im);
        }
        regular_penalty(view, Axis::Rows, 1.0)
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            write_regular_ideal(view, &[Axis::Rows], im);
        }
        regular_triplets(view, Axis::Rows, 1.0, out);
    }
}

/// Each column holds at least one tie.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColRegular;

impl IdealBlock for ColRegular {
    fn name(&self) -> &'static str {
        "cre"
    }

    fn kind_id(&self) -> u16 {
        6
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            write_regular_ideal(view, &[Axis::Cols], im);
        }
        regular_penalty(view, Axis::Cols, 1.0)
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            write_regular_ideal(view, &[Axis::Cols], im);
        }
        regular_triplets(view, Axis::Cols, 1.0, out);
    }
}

/// Each row and each column holds at least one tie.
#[derive(Clone, Copy, Debug, Default)]
pub struct Regular;

impl IdealBlock for Regular {
    fn name(&self) -> &'static str {
        "reg"
    }

    fn kind_id(&self) -> u16 {
        4
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            write_regular_ideal(view, &[Axis::Rows, Axis::Cols], im);
        }
        regular_penalty(view, Axis::Rows, 0.5) + regular_penalty(view, Axis::Cols, 0.5)
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            write_regular_ideal(view, &[Axis::Rows, Axis::Cols], im);
        }
        regular_triplets(view, Axis::Rows, 0.5, out);
        regular_triplets(view, Axis::Cols, 0.5, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Matrix;

    // rows {0,1} -> cols {2,3}: row 0 has a tie, row 1 empty;
    // col 2 empty, col 3 has a tie.
    fn matrix() -> Matrix {
        Matrix::from_rows(&[
            vec![0.0, 0.0, 0.0, 4.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn row_regular_charges_empty_rows() {
        let m = matrix();
        let view = BlockView::new(&m, &[0, 1], &[2, 3]);
        assert_eq!(RowRegular.penalty(&view, None), 2.0);
        assert_eq!(ColRegular.penalty(&view, None), 2.0);
        assert_eq!(Regular.penalty(&view, None), 2.0);
    }

    #[test]
    fn regular_fits_when_every_line_has_a_tie() {
        let m = Matrix::from_rows(&[
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![1.0, 0.0, 0.0],
        ])
        .unwrap();
        let all = [0, 1, 2];
        let view = BlockView::new(&m, &all, &all);
        assert_eq!(Regular.penalty(&view, None), 0.0);
    }

    #[test]
    fn row_regular_triplets_use_row_maxima() {
        let m = matrix();
        let view = BlockView::new(&m, &[0, 1], &[2, 3]);
        let mut out = Vec::new();
        RowRegular.append_triplets(&view, &mut out, None);
        assert_eq!(out, vec![Triplet::new(4.0, 1.0, 2.0), Triplet::new(0.0, 1.0, 2.0)]);
    }

    #[test]
    fn regular_ideal_marks_maxima_only() {
        let m = matrix();
        let mut im = IdealMatrix::new(4);
        let view = BlockView::new(&m, &[0, 1], &[2, 3]);
        RowRegular.penalty(&view, Some(&mut im));
        assert_eq!(im.get(0, 3), Some(1.0));
        assert_eq!(im.get(0, 2), None);
        // empty row: first cell carries the required tie
        assert_eq!(im.get(1, 2), Some(1.0));
    }
}
