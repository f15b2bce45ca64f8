/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Functional blocks: every row (column) holds exactly one tie.
//!
//! Penalty per line is `|ties − 1|`. Triplets put the line maximum against
//! ideal 1 and every other cell of the line against ideal 0, one point per cell.

use super::regular::{maxima, Axis};
use super::{BlockView, IdealBlock, Triplet};
use crate::network::IdealMatrix;

pub(crate) fn functional_penalty(view: &BlockView<'_>, axis: Axis, scale: f64) -> f64 {
    let lines: Vec<usize> = match axis {
        Axis::Rows => view
            .rows()
            .iter()
            .filter(|&&r| view.row_cells(r).next().is_some())
            .map(|&r| view.row_cells(r).filter(|&(_, v)| v > 0.0).count())
            .collect(),
        Axis::Cols => view
            .cols()
            .iter()
            .filter(|&&c| view.col_cells(c).next().is_some())
            .map(|&c| view.col_cells(c).filter(|&(_, v)| v > 0.0).count())
            .collect(),
    };
    lines
        .into_iter()
        .map(|ties| (ties as f64 - 1.0).abs() * scale)
        .sum()
}

/// Cells of the block as `(row, col, value, ideal)`, where the line maximum
/// along `axis` carries ideal 1 and the rest ideal 0.
fn functional_cells(view: &BlockView<'_>, axis: Axis) -> Vec<(usize, usize, f64, f64)> {
    let peaks = maxima(view, axis);
    view.cells()
        .map(|(r, c, v)| {
            let is_peak = peaks.iter().any(|&(pr, pc, _, _)| pr == r && pc == c);
            (r, c, v, if is_peak { 1.0 } else { 0.0 })
        })
        .collect()
}

pub(crate) fn functional_triplets(
    view: &BlockView<'_>,
    axis: Axis,
    scale: f64,
    out: &mut Vec<Triplet>,
) {
    out.extend(
        functional_cells(view, axis)
            .into_iter()
            .map(|(_, _, v, ideal)| Triplet::new(v, ideal, scale)),
    );
}

pub(crate) fn write_functional_ideal(view: &BlockView<'_>, axis: Axis, ideal: &mut IdealMatrix) {
    for (r, c, _, value) in functional_cells(view, axis) {
        ideal.set(r, c, Some(value));
    }
}

/// Each row holds exactly one tie.
#[derive(Clone, Copy, Debug, Default)]
pub struct RowFunctional;

impl IdealBlock for RowFunctional {
    fn name(&self) -> &'static str {
        "rfn"
    }

    fn kind_id(&self) -> u16 {
        7
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            write_functional_ideal(view, Axis::Rows, im);
        }
        functional_penalty(view, Axis::Rows, 1.0)
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            write_functional_ideal(view, Axis::Rows, im);
        }
        functional_triplets(view, Axis::Rows, 1.0, out);
    }
}

/// Each column holds exactly one tie.
#[derive(Clone, Copy, Debug, Default)]
pub struct ColFunctional;

impl IdealBlock for ColFunctional {
    fn name(&self) -> &'static str {
        "cfn"
    }

    fn kind_id(&self) -> u16 {
        8
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            write_functional_ideal(view, Axis::Cols, im);
        }
        functional_penalty(view, Axis::Cols, 1.0)
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            write_functional_ideal(view, Axis::Cols, im);
        }
        functional_triplets(view, Axis::Cols, 1.0, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Matrix;

    fn matrix() -> Matrix {
        // rows {0,1,2} -> cols {3,4}
        Matrix::from_rows(&[
            vec![0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn row_functional_penalty() {
        let m = matrix();
        let view = BlockView::new(&m, &[0, 1, 2], &[3, 4]);
        // row 0 exact, row 1 one extra, row 2 one missing
        assert_eq!(RowFunctional.penalty(&view, None), 2.0);
    }

    #[test]
    fn col_functional_penalty() {
        let m = matrix();
        let view = BlockView::new(&m, &[0, 1, 2], &[3, 4]);
        // col 3 has two ties, col 4 has one
        assert_eq!(ColFunctional.penalty(&view, None), 1.0);
    }

    #[test]
    fn row_functional_ideal_is_binary() {
        let m = matrix();
        let view = BlockView::new(&m, &[0, 1, 2], &[3, 4]);
        let mut im = IdealMatrix::new(5);
        let mut out = Vec::new();
        RowFunctional.append_triplets(&view, &mut out, Some(&mut im));
        assert_eq!(out.len(), 6);
        assert_eq!(im.get(0, 3), Some(1.0));
        assert_eq!(im.get(0, 4), Some(0.0));
        assert_eq!(im.get(1, 3), Some(1.0));
        assert_eq!(im.get(1, 4), Some(0.0));
        let ones = out.iter().filter(|t| t.ideal == 1.0).count();
        assert_eq!(ones, 3, "one peak per row");
    }
}
