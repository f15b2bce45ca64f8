/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Half-weight composites of a regular and a functional hypothesis.
//!
//! Each composite scores its two components at half weight: the penalty is
//! `½·a + ½·b`, and the triplets are the union of both components' triplets
//! with every weight halved. When both components write the ideal matrix the
//! functional one is written last.

use super::functional::{functional_penalty, functional_triplets, write_functional_ideal};
use super::regular::{regular_penalty, regular_triplets, write_regular_ideal, Axis};
use super::{BlockView, IdealBlock, Triplet};
use crate::network::IdealMatrix;

/// The four built-in regular + functional pairings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompositeKind {
    /// Row-regular with row-functional.
    RowRegularRowFunctional,
    /// Column-regular with column-functional.
    ColRegularColFunctional,
    /// Regular (both axes) with row-functional.
    RegularRowFunctional,
    /// Regular (both axes) with column-functional.
    RegularColFunctional,
}

impl CompositeKind {
    fn regular_axes(self) -> &'static [Axis] {
        match self {
            Self::RowRegularRowFunctional => &[Axis::Rows],
            Self::ColRegularColFunctional => &[Axis::Cols],
            Self::RegularRowFunctional | Self::RegularColFunctional => &[Axis::Rows, Axis::Cols],
        }
    }

    fn functional_axis(self) -> Axis {
        match self {
            Self::RowRegularRowFunctional | Self::RegularRowFunctional => Axis::Rows,
            Self::ColRegularColFunctional | Self::RegularColFunctional => Axis::Cols,
        }
    }
}

/// Half-weight regular + functional composite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HalfWeight {
    kind: CompositeKind,
}

impl HalfWeight {
    /// Composite of the given pairing.
    pub fn new(kind: CompositeKind) -> Self {
        Self { kind }
    }

    /// Which pairing this is.
    pub fn kind(&self) -> CompositeKind {
        self.kind
    }
}

impl IdealBlock for HalfWeight {
    fn name(&self) -> &'static str {
        match self.kind {
            CompositeKind::RowRegularRowFunctional => "rrefn",
            CompositeKind::ColRegularColFunctional => "crefn",
            CompositeKind::RegularRowFunctional => "regrfn",
            CompositeKind::RegularColFunctional => "regcfn",
        }
    }

    fn kind_id(&self) -> u16 {
        match self.kind {
            CompositeKind::RowRegularRowFunctional => 11,
            CompositeKind::ColRegularColFunctional => 12,
            CompositeKind::RegularRowFunctional => 13,
            CompositeKind::RegularColFunctional => 14,
        }
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            write_regular_ideal(view, self.kind.regular_axes(), im);
            write_functional_ideal(view, self.kind.functional_axis(), im);
        }
        let axes = self.kind.regular_axes();
        // a two-axis regular component is itself split evenly between axes
        let per_axis = 0.5 / axes.len() as f64;
        let regular: f64 = axes.iter().map(|&a| regular_penalty(view, a, per_axis)).sum();
        regular + functional_penalty(view, self.kind.functional_axis(), 0.5)
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            write_regular_ideal(view, self.kind.regular_axes(), im);
            write_functional_ideal(view, self.kind.functional_axis(), im);
        }
        let axes = self.kind.regular_axes();
        let per_axis = 0.5 / axes.len() as f64;
        for &axis in axes {
            regular_triplets(view, axis, per_axis, out);
        }
        functional_triplets(view, self.kind.functional_axis(), 0.5, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Regular, RowFunctional, RowRegular};
    use crate::network::Matrix;

    fn matrix() -> Matrix {
        Matrix::from_rows(&[
            vec![0.0, 0.0, 1.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn penalty_is_half_sum_of_components() {
        let m = matrix();
        let view = BlockView::new(&m, &[0, 1], &[2, 3]);
        let rre = RowRegular.penalty(&view, None);
        let reg = Regular.penalty(&view, None);
        let rfn = RowFunctional.penalty(&view, None);
        let a = HalfWeight::new(CompositeKind::RowRegularRowFunctional).penalty(&view, None);
        let b = HalfWeight::new(CompositeKind::RegularRowFunctional).penalty(&view, None);
        assert!((a - 0.5 * (rre + rfn)).abs() < 1e-12);
        assert!((b - 0.5 * (reg + rfn)).abs() < 1e-12);
    }

    #[test]
    fn triplet_weights_halved() {
        let m = matrix();
        let view = BlockView::new(&m, &[0, 1], &[2, 3]);
        let mut out = Vec::new();
        HalfWeight::new(CompositeKind::ColRegularColFunctional).append_triplets(&view, &mut out, None);
        let total: f64 = out.iter().map(|t| t.weight).sum();
        assert!((total - 4.0).abs() < 1e-12);
    }
}
