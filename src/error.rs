//! Error types for the blockmodeling core.
//!
//! Three families, matching the three ways a search can go wrong:
//!
//! - [`BlockError`] / [`ConfigError`]: bad input detected before any iteration.
//! - [`GofError`]: an internal fault while scoring a partition.
//! - [`SearchError`]: what [`crate::search::SearchEngine`] reports to its caller.
//!
//! Every [`SearchError`] renders with the [`ERROR_MARKER`] prefix so that callers
//! can tell error lines apart from ordinary log and result lines.

use thiserror::Error;

/// Prefix carried by every rendered [`SearchError`].
pub const ERROR_MARKER: &str = "!Error:";

/// Errors raised while building networks, blocks or images.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BlockError {
    /// No ideal block is registered under this name.
    #[error("unknown ideal block '{name}'")]
    UnknownBlock {
        /// Requested block name.
        name: String,
    },

    /// A block cell could not be parsed (e.g. `den(abc)`).
    #[error("malformed block cell '{cell}': {message}")]
    MalformedCell {
        /// Cell text as given.
        cell: String,
        /// What is wrong with it.
        message: String,
    },

    /// Two actors share a label.
    #[error("duplicate actor label '{label}'")]
    DuplicateLabel {
        /// The repeated label.
        label: String,
    },

    /// Matrix data does not describe an `n × n` table.
    #[error("matrix has {actual} values, expected {expected} for {size} actors")]
    DimensionMismatch {
        /// Number of actors.
        size: usize,
        /// `size²`.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },

    /// A matrix value is NaN or infinite.
    #[error("non-finite value at ({row}, {col})")]
    NonFinite {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
    },

    /// A position index is outside the image.
    #[error("position ({row}, {col}) is outside a {size}x{size} image")]
    CellOutOfRange {
        /// Row index.
        row: usize,
        /// Column index.
        col: usize,
        /// Number of positions in the image.
        size: usize,
    },

    /// An image row has the wrong number of cells.
    #[error("image row {row} has {actual} cells, expected {expected}")]
    RowLength {
        /// Row index.
        row: usize,
        /// Number of positions.
        expected: usize,
        /// Cells in the row.
        actual: usize,
    },

    /// Position names must be unique and the image non-empty.
    #[error("invalid positions: {message}")]
    InvalidPositions {
        /// What is wrong with the positions.
        message: String,
    },

    /// Partition does not cover the actor set exactly once.
    #[error("invalid partition: {message}")]
    InvalidPartition {
        /// What is wrong with the partition.
        message: String,
    },
}

/// Errors in the search configuration knobs.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// A knob name the engine does not understand.
    #[error("unknown configuration key '{key}'")]
    UnknownKey {
        /// Knob name as given.
        key: String,
    },

    /// A knob value failed to parse or is out of range.
    #[error("invalid value '{value}' for '{key}'")]
    InvalidValue {
        /// Knob name.
        key: String,
        /// Rejected value text.
        value: String,
    },
}

/// Faults raised while scoring a (matrix, partition, image) triple.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum GofError {
    /// The image still holds multiple candidates in some cell.
    #[error("image is multi-blocked; expand it before scoring")]
    MultiBlocked,

    /// Partition cluster count differs from image position count.
    #[error("partition has {clusters} clusters but image has {positions} positions")]
    PositionMismatch {
        /// Clusters in the partition.
        clusters: usize,
        /// Positions in the image.
        positions: usize,
    },

    /// Partition or ideal matrix refers to actors outside the matrix.
    #[error("actor index {index} outside a matrix of {size} actors")]
    ActorOutOfRange {
        /// Offending actor index.
        index: usize,
        /// Number of actors in the matrix.
        size: usize,
    },

    /// A block produced a negative or non-finite penalty.
    #[error("block '{block}' produced invalid penalty {value}")]
    InvalidPenalty {
        /// Block in `name(param)` form.
        block: String,
        /// Penalty it returned.
        value: f64,
    },

    /// A block's triplet weights do not add up to its cell count.
    #[error("block '{block}' produced triplet weight {weight}, expected {expected}")]
    TripletWeight {
        /// Block in `name(param)` form.
        block: String,
        /// Summed triplet weight.
        weight: f64,
        /// Cell count of the block.
        expected: f64,
    },

    /// An image cell has no candidate block.
    #[error("image cell ({row}, {col}) is empty")]
    EmptyCell {
        /// Row position.
        row: usize,
        /// Column position.
        col: usize,
    },

    /// The partition being scored is malformed.
    #[error("{0}")]
    Partition(#[from] BlockError),
}

/// Errors reported by the search engine.
///
/// Configuration variants are raised by [`crate::search::SearchEngine::initialize`]
/// before the engine leaves `Idle`; [`SearchError::Fault`] aborts a running search.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// No network matrix was supplied.
    #[error("!Error: no network specified")]
    MissingNetwork,

    /// No block image was supplied.
    #[error("!Error: no block image specified")]
    MissingImage,

    /// Search type string not recognised.
    #[error("!Error: unknown search type '{0}'")]
    UnknownSearchType(String),

    /// GoF method string not recognised.
    #[error("!Error: unknown goodness-of-fit method '{0}'")]
    UnknownMethod(String),

    /// A block in the image cannot be evaluated under the chosen method.
    #[error("!Error: ideal block '{block}' is not compatible with method '{method}'")]
    IncompatibleBlock {
        /// Block in `name(param)` form.
        block: String,
        /// Method name.
        method: String,
    },

    /// Some image cells have no candidate block.
    #[error("!Error: unresolved image cells {0:?}")]
    UnresolvedImage(Vec<(usize, usize)>),

    /// Any other invalid request.
    #[error("!Error: {0}")]
    Config(String),

    /// Invalid configuration knob.
    #[error("!Error: {0}")]
    Knob(#[from] ConfigError),

    /// Invalid block, image or partition data.
    #[error("!Error: {0}")]
    Block(#[from] BlockError),

    /// `run` called without a successful `initialize`.
    #[error("!Error: search engine is not initialized")]
    NotInitialized,

    /// Scoring fault during a run; the engine is back to `Idle`.
    #[error("!Error: scoring fault: {0}")]
    Fault(#[from] GofError),
}

/// Result alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
