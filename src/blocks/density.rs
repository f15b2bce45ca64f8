/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Density blocks: the share of ties in the block meets a target.
//!
//! Both variants carry one parameter, clamped to [0, 1] at construction.
//! Under the correlation methods the whole block collapses into one point at
//! its mean value, weighted by the cell count.

use super::{BlockView, IdealBlock, Triplet};
use crate::gof::GofMethod;
use crate::network::IdealMatrix;

/// Density used when a cell names a density block without a parameter.
pub const DEFAULT_DENSITY: f64 = 0.5;

fn clamp_density(d: f64) -> f64 {
    if d.is_nan() {
        DEFAULT_DENSITY
    } else {
        d.clamp(0.0, 1.0)
    }
}

/// Density of at least `min_density`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Density {
    min_density: f64,
}

impl Density {
    /// New block; `min_density` is clamped to [0, 1].
    pub fn new(min_density: f64) -> Self {
        Self { min_density: clamp_density(min_density) }
    }
}

impl IdealBlock for Density {
    fn name(&self) -> &'static str {
        "den"
    }

    fn kind_id(&self) -> u16 {
        9
    }

    fn parameter(&self) -> Option<f64> {
        Some(self.min_density)
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn with_parameter(&self, parameter: f64) -> Box<dyn IdealBlock> {
        Box::new(Self::new(parameter))
    }

    fn supports(&self, method: GofMethod) -> bool {
        method != GofMethod::Ziberna
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            view.fill_ideal(im, Some(self.min_density));
        }
        let wanted = self.min_density * view.cell_count() as f64;
        (wanted - view.tie_count() as f64).max(0.0)
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            view.fill_ideal(im, Some(self.min_density));
        }
        let n = view.cell_count();
        if n > 0 {
            let mean = view.mean();
            out.push(Triplet::new(mean, mean.max(self.min_density), n as f64));
        }
    }
}

/// Density of exactly `density`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExactDensity {
    density: f64,
}

impl ExactDensity {
    /// New block; `density` is clamped to [0, 1].
    pub fn new(density: f64) -> Self {
        Self { density: clamp_density(density) }
    }
}

impl IdealBlock for ExactDensity {
    fn name(&self) -> &'static str {
        "dex"
    }

    fn kind_id(&self) -> u16 {
        10
    }

    fn parameter(&self) -> Option<f64> {
        Some(self.density)
    }

    fn boxed_clone(&self) -> Box<dyn IdealBlock> {
        Box::new(*self)
    }

    fn with_parameter(&self, parameter: f64) -> Box<dyn IdealBlock> {
        Box::new(Self::new(parameter))
    }

    fn supports(&self, method: GofMethod) -> bool {
        method != GofMethod::Ziberna
    }

    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64 {
        if let Some(im) = ideal {
            view.fill_ideal(im, Some(self.density));
        }
        let wanted = self.density * view.cell_count() as f64;
        (wanted - view.tie_count() as f64).abs()
    }

    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    ) {
        if let Some(im) = ideal {
            view.fill_ideal(im, Some(self.density));
        }
        let n = view.cell_count();
        if n > 0 {
            out.push(Triplet::new(view.mean(), self.density, n as f64));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Matrix;

    fn matrix() -> Matrix {
        // block {0,1} -> {2,3}: one tie in four cells
        Matrix::from_rows(&[
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ])
        .unwrap()
    }

    #[test]
    fn parameter_is_clamped() {
        assert_eq!(Density::new(1.7).parameter(), Some(1.0));
        assert_eq!(Density::new(-0.3).parameter(), Some(0.0));
        assert_eq!(ExactDensity::new(f64::NAN).parameter(), Some(DEFAULT_DENSITY));
    }

    #[test]
    fn density_at_least_penalty() {
        let m = matrix();
        let view = BlockView::new(&m, &[0, 1], &[2, 3]);
        assert!((Density::new(0.5).penalty(&view, None) - 1.0).abs() < 1e-12);
        assert_eq!(Density::new(0.2).penalty(&view, None), 0.0);
    }

    #[test]
    fn exact_density_penalty_is_two_sided() {
        let m = matrix();
        let view = BlockView::new(&m, &[0, 1], &[2, 3]);
        assert!((ExactDensity::new(0.0).penalty(&view, None) - 1.0).abs() < 1e-12);
        assert!((ExactDensity::new(0.75).penalty(&view, None) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn density_not_supported_by_ziberna() {
        assert!(Density::new(0.5).supports(GofMethod::Hamming));
        assert!(Density::new(0.5).supports(GofMethod::Nordlund));
        assert!(!ExactDensity::new(0.5).supports(GofMethod::Ziberna));
    }
}
