//! Integration tests for the ideal block library contract.
//!
//! Every built-in block is checked over the same set of cluster pairs: square
//! diagonal blocks, rectangular off-diagonal blocks and single-actor clusters.

use blockmodel_core::blocks::BlockView;
use blockmodel_core::{BlockRegistry, GofMethod, IdealMatrix, Matrix};

// ─── helpers ─────────────────────────────────────────────────────────────────

/// Valued 7-actor network with empty rows and columns on purpose.
fn network() -> Matrix {
    Matrix::from_rows(&[
        vec![0.0, 1.0, 2.0, 0.0, 0.0, 0.5, 0.0],
        vec![1.0, 0.0, 0.0, 0.0, 3.0, 0.0, 0.0],
        vec![0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        vec![1.0, 1.0, 1.0, 1.0, 0.0, 1.0, 0.0],
        vec![0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 1.0],
        vec![0.5, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0],
    ])
    .unwrap()
}

fn cluster_pairs() -> Vec<(Vec<usize>, Vec<usize>)> {
    vec![
        (vec![0, 1, 2], vec![0, 1, 2]),
        (vec![0, 1, 2], vec![3, 4]),
        (vec![3, 4], vec![0, 1, 2]),
        (vec![5], vec![5]),
        (vec![6], vec![0, 1, 2, 3, 4, 5]),
        (vec![3, 4, 5, 6], vec![3, 4, 5, 6]),
        (vec![0, 1, 2, 3, 4, 5, 6], vec![0, 1, 2, 3, 4, 5, 6]),
    ]
}

// ─── triplet weights ─────────────────────────────────────────────────────────

/// Summed triplet weight equals the off-diagonal cell count for every block
/// and every cluster pair, including the empty single-actor diagonal block.
#[test]
fn triplet_weights_sum_to_cell_count() {
    let m = network();
    let reg = BlockRegistry::builtin();
    assert_eq!(reg.names().len(), 14, "all built-ins registered");

    for name in reg.names() {
        let block = reg.create(name, None).unwrap();
        for (rows, cols) in cluster_pairs() {
            let view = BlockView::new(&m, &rows, &cols);
            let weight: f64 = block.triplets(&view, None).iter().map(|t| t.weight).sum();
            let cells = view.cell_count() as f64;
            assert!(
                (weight - cells).abs() < 1e-9,
                "{}: weight {} != cells {} for rows {:?} cols {:?}",
                name,
                weight,
                cells,
                rows,
                cols
            );
        }
    }
}

#[test]
fn single_actor_diagonal_has_no_cells() {
    let m = network();
    let view = BlockView::new(&m, &[5], &[5]);
    assert!(view.is_diagonal());
    assert_eq!(view.cell_count(), 0);
}

// ─── penalties ───────────────────────────────────────────────────────────────

#[test]
fn penalties_are_non_negative_and_finite() {
    let m = network();
    let reg = BlockRegistry::builtin();
    for name in reg.names() {
        let block = reg.create(name, None).unwrap();
        for (rows, cols) in cluster_pairs() {
            let view = BlockView::new(&m, &rows, &cols);
            let p = block.penalty(&view, None);
            assert!(p.is_finite() && p >= 0.0, "{} penalty {} for {:?}/{:?}", name, p, rows, cols);
        }
    }
}

#[test]
fn null_penalty_counts_positive_ties() {
    let m = network();
    let nul = BlockRegistry::builtin().create("nul", None).unwrap();
    for (rows, cols) in cluster_pairs() {
        let view = BlockView::new(&m, &rows, &cols);
        let ties = view.cells().filter(|&(_, _, v)| v > 0.0).count();
        assert_eq!(nul.penalty(&view, None), ties as f64, "rows {:?} cols {:?}", rows, cols);
    }
}

#[test]
fn self_ties_are_ignored() {
    let mut rows = vec![vec![0.0; 3]; 3];
    rows[0][0] = 5.0;
    rows[1][1] = 5.0;
    let m = Matrix::from_rows(&rows).unwrap();
    let view = BlockView::new(&m, &[0, 1, 2], &[0, 1, 2]);
    let nul = BlockRegistry::builtin().create("nul", None).unwrap();
    assert_eq!(nul.penalty(&view, None), 0.0);
    let com = BlockRegistry::builtin().create("com", None).unwrap();
    assert_eq!(com.penalty(&view, None), 6.0);
}

// ─── ideal matrix and parameters ─────────────────────────────────────────────

#[test]
fn ideal_values_written_inside_block_only() {
    let m = network();
    let com = BlockRegistry::builtin().create("com", None).unwrap();
    let mut ideal = IdealMatrix::new(m.size());
    let view = BlockView::new(&m, &[0, 1], &[3, 4]);
    com.penalty(&view, Some(&mut ideal));
    assert_eq!(ideal.get(0, 3), Some(1.0));
    assert_eq!(ideal.get(1, 4), Some(1.0));
    assert_eq!(ideal.get(0, 1), None, "outside the block");
}

#[test]
fn density_parameter_clamped_and_copied() {
    let reg = BlockRegistry::builtin();
    let den = reg.parse("den(1.7)").unwrap();
    assert_eq!(den.parameter(), Some(1.0));
    let lower = den.with_parameter(-0.3);
    assert_eq!(lower.parameter(), Some(0.0));
    assert_eq!(den.parameter(), Some(1.0), "original untouched");
    assert_eq!(reg.parse("dex").unwrap().parameter(), Some(0.5));
    assert_eq!(reg.parse("den(0.25)").unwrap().to_string(), "den(0.25)");
}

#[test]
fn density_blocks_reject_ziberna() {
    let reg = BlockRegistry::builtin();
    for name in reg.names() {
        let block = reg.create(name, None).unwrap();
        let expected = !matches!(name, "den" | "dex");
        assert_eq!(block.supports(GofMethod::Ziberna), expected, "{}", name);
        assert!(block.supports(GofMethod::Nordlund));
        assert!(block.supports(GofMethod::Hamming));
    }
}

#[test]
fn unknown_and_malformed_cells_rejected() {
    let reg = BlockRegistry::builtin();
    assert!(reg.parse("xyz").is_err());
    assert!(reg.parse("den(abc)").is_err());
    assert!(reg.parse("den(0.3").is_err());
    assert!(reg.parse("com(0.3)").is_err(), "com takes no parameter");
}
