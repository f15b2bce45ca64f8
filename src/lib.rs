//! # blockmodel-core
//!
//! Generalized blockmodeling of weighted relational networks.
//!
//! Given an `n × n` tie matrix and a block image (a `k × k` grid of ideal-block
//! hypotheses over named positions), search for the partition of actors into
//! positions whose blocks best match their hypotheses.
//!
//! ---
//!
//! ## The pipeline
//!
//! ```text
//! Matrix + BlockImage + SearchConfig
//!        │
//!        ▼
//!   SearchEngine ── proposes ──▶ Partition
//!        ▲                          │
//!        │                          ▼
//!   SearchSession ◀── score ── gof::score ── per cell ──▶ IdealBlock
//!        │
//!        ▼
//!   SearchOutcome { status, models: Vec<BlockModel>, log }
//! ```
//!
//! Fit is judged in one of two modes. **Penalty** mode (`hamming`) sums the
//! deviations each block counts against its hypothesis; lower is better.
//! **Correlation** mode (`nordlund`, `ziberna`) pools weighted
//! `(observed, ideal)` points from every block into one Pearson correlation;
//! higher is better.
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`network`] | [`Matrix`], [`Actorset`], [`IdealMatrix`] | Validated square tie matrix over labelled actors |
//! | [`blocks`] | [`IdealBlock`], [`Block`], [`BlockRegistry`] | The 14 ideal blocks, penalty and triplet modes |
//! | [`image`] | [`BlockImage`] | Position grid of candidate blocks, multi-block expansion |
//! | [`partition`] | [`Partition`], [`Cluster`] | Actor clusters, assignment vectors, signatures |
//! | [`gof`] | [`GofMethod`] | Goodness-of-fit scoring |
//! | [`search`] | [`SearchEngine`], [`SearchRequest`], [`SearchConfig`] | exhaustive / localopt / testpartition |
//! | [`result`] | [`BlockModel`], [`SearchOutcome`] | Frozen optimal models and run log |
//! | [`error`] | [`SearchError`] | Error taxonomy; every engine error renders with `!Error:` |
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use blockmodel_core::{BlockImage, BlockRegistry, Matrix, SearchEngine, SearchRequest};
//!
//! let matrix = Matrix::from_rows(&[
//!     vec![0.0, 1.0, 0.0, 0.0],
//!     vec![1.0, 0.0, 0.0, 0.0],
//!     vec![0.0, 0.0, 0.0, 1.0],
//!     vec![0.0, 0.0, 1.0, 0.0],
//! ]).unwrap();
//! let registry = BlockRegistry::builtin();
//! let image = BlockImage::from_rows(
//!     &registry,
//!     &["A", "B"],
//!     &[vec!["com", "nul"], vec!["nul", "com"]],
//! ).unwrap();
//!
//! let mut engine = SearchEngine::new();
//! engine.initialize(SearchRequest::new(Arc::new(matrix), image, "exhaustive", "hamming")).unwrap();
//! let outcome = engine.run().unwrap();
//! assert_eq!(outcome.status_token(), "ok");
//! assert_eq!(outcome.best_score(), Some(0.0));
//! ```
//!
//! ## Features
//!
//! - `serde`: `Serialize`/`Deserialize` on data and result types.
//! - `parallel`: localopt restarts on rayon workers when
//!   [`SearchConfig::parallel`] is set.
//!
//! ## License
//!
//! Business Source License 1.1.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod blocks;
pub mod error;
pub mod gof;
pub mod image;
pub mod network;
pub mod partition;
pub mod result;
pub mod search;

pub use blocks::{Block, BlockRegistry, BlockView, IdealBlock, Triplet};
pub use error::{BlockError, ConfigError, GofError, SearchError};
pub use gof::GofMethod;
pub use image::BlockImage;
pub use network::{Actor, Actorset, IdealMatrix, Matrix};
pub use partition::{Cluster, Partition};
pub use result::{BlockModel, LogLine, SearchOutcome, SearchStatus};
pub use search::{CancelToken, EngineState, ExpansionMode, SearchConfig, SearchEngine, SearchRequest, SearchType};
