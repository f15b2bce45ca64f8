/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Complete, null and don't-care blocks.

use super::{BlockView, IdealBlock, Triplet};
use crate::network::IdealMatrix;

/// Every off-diagonal cell holds a tie.
#[derive(Clone, Copy, Debug, Default)]
pub struct Complete;

impl IdealBlock for Complete {
    fn name(&self) -> &'static str {
        "com"
    }

    fn kind_id(&self) -> u16 {
        1
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            view.fill_ideal(im, Some(1.0));
        }
        view.cells().filter(|&(_, _, v)| v <= 0.0).count() as f64
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            view.fill_ideal(im, Some(1.0));
        }
        out.extend(view.cells().map(|(_, _, v)| Triplet::new(v, 1.0, 1.0)));
    }
}

/// No off-diagonal cell holds a tie.
#[derive(Clone, Copy, Debug, Default)]
pub struct Null;

impl IdealBlock for Null {
    fn name(&self) -> &'static str {
        "nul"
    }

    fn kind_id(&self) -> u16 {
        2
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            view.fill_ideal(im, Some(0.0));
        }
        view.tie_count() as f64
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            view.fill_ideal(im, Some(0.0));
        }
        out.extend(view.cells().map(|(_, _, v)| Triplet::new(v, 0.0, 1.0)));
    }
}

/// Any content fits.
///
/// Under the correlation methods the block contributes a single point whose
/// ideal equals the observed mean, so it never pulls the fit either way.
#[derive(Clone, Copy, Debug, Default)]
pub struct DontCare;

impl IdealBlock for DontCare {
    fn name(&self) -> &'static str {
        "dnc"
    }

    fn kind_id(&self) -> u16 {
        3
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            view.fill_ideal(im, None);
        }
        0.0
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            view.fill_ideal(im, None);
        }
        let n = view.cell_count();
        if n > 0 {
            let mean = view.mean();
            out.push(Triplet::new(mean, mean, n as f64));
        }
    }
}
