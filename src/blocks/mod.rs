/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Ideal block library: structural hypotheses for a single block.
//!
//! A *block* is the submatrix of ties from the actors of one position (rows)
//! to the actors of another (columns). An *ideal block* states what that
//! submatrix should look like if the hypothesis were exactly true, and judges
//! the observed content in one of two interchangeable modes:
//!
//! - **penalty**: a non-negative deviation count used by the `hamming` method.
//! - **triplets**: weighted `(observed, ideal, weight)` points pooled across
//!   the whole image by the correlation methods (`nordlund`, `ziberna`).
//!
//! # Contract
//!
//! Every implementation of [`IdealBlock`] must:
//!
//! - ignore self-ties (row actor == column actor);
//! - return a penalty `>= 0`;
//! - emit triplets whose weights sum to [`BlockView::cell_count`].
//!
//! The evaluator and the search engine only ever see `dyn IdealBlock`; adding a
//! hypothesis means one new type plus one line in [`BlockRegistry::builtin`].
//!
//! # Built-ins
//!
//! | id | name | module |
//! |----|------|--------|
//! | 1–3 | `com`, `nul`, `dnc` | [`structural`] |
//! | 4–6 | `reg`, `rre`, `cre` | [`regular`] |
//! | 7–8 | `rfn`, `cfn` | [`functional`] |
//! | 9–10 | `den(d)`, `dex(d)` | [`density`] |
//! | 11–14 | `rrefn`, `crefn`, `regrfn`, `regcfn` | [`composite`] |

use core::fmt;
use core::ops::Deref;

use hashbrown::HashMap;

use crate::error::BlockError;
use crate::gof::GofMethod;
use crate::network::{IdealMatrix, Matrix};

pub mod composite;
pub mod density;
pub mod functional;
pub mod regular;
pub mod structural;

pub use composite::{CompositeKind, HalfWeight};
pub use density::{Density, ExactDensity};
pub use functional::{ColFunctional, RowFunctional};
pub use regular::{ColRegular, Regular, RowRegular};
pub use structural::{Complete, DontCare, Null};

// ─── Triplet ────────────────────────────────────────────────────────────────

/// One weighted correlation point: an observed value, the value the
/// hypothesis expects there, and how much the point counts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triplet {
    /// Observed tie value (or aggregate, e.g. a row maximum).
    pub observed: f64,
    /// Ideal value under the hypothesis.
    pub ideal: f64,
    /// Number of block cells this point stands for.
    pub weight: f64,
}

impl Triplet {
    /// Convenience constructor.
    #[inline]
    pub fn new(observed: f64, ideal: f64, weight: f64) -> Self {
        Self { observed, ideal, weight }
    }
}

// ─── BlockView ──────────────────────────────────────────────────────────────

/// Read-only view of one block: a matrix plus row and column actor subsets.
///
/// The same cluster may appear on both axes (a diagonal block); self-ties are
/// skipped by every iterator here.
#[derive(Clone, Copy, Debug)]
pub struct BlockView<'a> {
    matrix: &'a Matrix,
    rows: &'a [usize],
    cols: &'a [usize],
    diagonal: bool,
}

impl<'a> BlockView<'a> {
    /// View over `rows × cols` of `matrix`.
    ///
    /// Clusters of a partition are disjoint, so the block is diagonal exactly
    /// when both subsets are the same set.
    pub fn new(matrix: &'a Matrix, rows: &'a [usize], cols: &'a [usize]) -> Self {
        let diagonal = !rows.is_empty() && rows == cols;
        Self { matrix, rows, cols, diagonal }
    }

    /// The underlying matrix.
    pub fn matrix(&self) -> &'a Matrix {
        self.matrix
    }

    /// Row actors.
    pub fn rows(&self) -> &'a [usize] {
        self.rows
    }

    /// Column actors.
    pub fn cols(&self) -> &'a [usize] {
        self.cols
    }

    /// True when rows and columns are the same cluster.
    pub fn is_diagonal(&self) -> bool {
        self.diagonal
    }

    /// Number of off-diagonal cells in this block.
    pub fn cell_count(&self) -> usize {
        let all = self.rows.len() * self.cols.len();
        if self.diagonal {
            all - self.rows.len()
        } else {
            all
        }
    }

    /// Every off-diagonal cell as `(row actor, column actor, value)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + 'a {
        let matrix = self.matrix;
        let cols = self.cols;
        self.rows.iter().flat_map(move |&r| {
            cols.iter()
                .filter(move |&&c| c != r)
                .map(move |&c| (r, c, matrix.get(r, c)))
        })
    }

    /// Off-diagonal cells of row actor `r` as `(column actor, value)`.
    pub fn row_cells(&self, r: usize) -> impl Iterator<Item = (usize, f64)> + 'a {
        let matrix = self.matrix;
        self.cols
            .iter()
            .filter(move |&&c| c != r)
            .map(move |&c| (c, matrix.get(r, c)))
    }

    /// Off-diagonal cells of column actor `c` as `(row actor, value)`.
    pub fn col_cells(&self, c: usize) -> impl Iterator<Item = (usize, f64)> + 'a {
        let matrix = self.matrix;
        self.rows
            .iter()
            .filter(move |&&r| r != c)
            .map(move |&r| (r, matrix.get(r, c)))
    }

    /// Number of cells holding a tie (`value > 0`).
    pub fn tie_count(&self) -> usize {
        self.cells().filter(|&(_, _, v)| v > 0.0).count()
    }

    /// Mean cell value, or 0.0 for an empty block.
    pub fn mean(&self) -> f64 {
        let n = self.cell_count();
        if n == 0 {
            return 0.0;
        }
        self.cells().map(|(_, _, v)| v).sum::<f64>() / n as f64
    }

    /// Write `value` into every off-diagonal cell of `ideal`.
    pub fn fill_ideal(&self, ideal: &mut IdealMatrix, value: Option<f64>) {
        for (r, c, _) in self.cells() {
            ideal.set(r, c, value);
        }
    }
}

/// Largest value along one row or column: `(other actor, value, cell count)`.
///
/// Ties for the maximum keep the first cell. `None` for a row without cells.
pub(crate) fn line_max<I>(cells: I) -> Option<(usize, f64, usize)>
where
    I: Iterator<Item = (usize, f64)>,
{
    let mut best: Option<(usize, f64)> = None;
    let mut len = 0;
    for (idx, v) in cells {
        len += 1;
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((idx, v)),
        }
    }
    best.map(|(idx, v)| (idx, v, len))
}

// ─── IdealBlock ─────────────────────────────────────────────────────────────

/// A structural hypothesis for one block.
pub trait IdealBlock: fmt::Debug + Send + Sync {
    /// Short registry name (`com`, `den`, …).
    fn name(&self) -> &'static str;

    /// Stable integer identity of the variant.
    fn kind_id(&self) -> u16;

    /// Density parameter, for variants that carry one.
    fn parameter(&self) -> Option<f64> {
        None
    }

    /// Independent copy of this block.
    fn boxed_clone(&self) -> Box<dyn IdealBlock>;

    /// Independent copy with a new parameter (clamped to [0, 1]).
    ///
    /// Variants without a parameter ignore it.
    fn with_parameter(&self, _parameter: f64) -> Box<dyn IdealBlock> {
        self.boxed_clone()
    }

    /// Whether this block can be evaluated under `method`.
    fn supports(&self, _method: GofMethod) -> bool {
        true
    }

    /// Deviation count for `view`, optionally writing ideal values.
    fn penalty(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> f64;

    /// Append correlation triplets for `view` to `out`, optionally writing
    /// ideal values.
    fn append_triplets(
        &self,
        view: &BlockView<'_>,
        out: &mut Vec<Triplet>,
        ideal: Option<&mut IdealMatrix>,
    );
}

// ─── Block ──────────────────────────────────────────────────────────────────

/// Owned, clonable handle to an ideal block.
pub struct Block(Box<dyn IdealBlock>);

impl Block {
    /// Wrap a boxed ideal block.
    pub fn new(inner: Box<dyn IdealBlock>) -> Self {
        Self(inner)
    }

    /// Triplets for `view` as a fresh vector.
    pub fn triplets(&self, view: &BlockView<'_>, ideal: Option<&mut IdealMatrix>) -> Vec<Triplet> {
        let mut out = Vec::new();
        self.0.append_triplets(view, &mut out, ideal);
        out
    }

    /// Independent copy carrying `parameter`.
    pub fn with_parameter(&self, parameter: f64) -> Self {
        Self(self.0.with_parameter(parameter))
    }

    /// Display form: name, plus the parameter in parentheses if any.
    pub fn display_form(&self) -> String {
        self.to_string()
    }
}

impl Deref for Block {
    type Target = dyn IdealBlock;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Clone for Block {
    fn clone(&self) -> Self {
        Self(self.0.boxed_clone())
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.parameter() {
            Some(p) => write!(f, "{}({})", self.0.name(), p),
            None => f.write_str(self.0.name()),
        }
    }
}

impl PartialEq for Block {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind_id() == other.0.kind_id() && self.0.parameter() == other.0.parameter()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Block {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Block {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let cell = <String as serde::Deserialize>::deserialize(deserializer)?;
        BlockRegistry::builtin().parse(&cell).map_err(serde::de::Error::custom)
    }
}

// ─── BlockRegistry ──────────────────────────────────────────────────────────

/// Factory for one ideal block variant; receives the optional parameter.
pub type BlockFactory = fn(Option<f64>) -> Box<dyn IdealBlock>;

/// Name → factory table for ideal blocks.
#[derive(Clone)]
pub struct BlockRegistry {
    factories: HashMap<&'static str, BlockFactory>,
}

impl BlockRegistry {
    /// Empty registry.
    pub fn empty() -> Self {
        Self { factories: HashMap::new() }
    }

    /// Registry holding the fourteen built-in variants.
    pub fn builtin() -> Self {
        let mut reg = Self::empty();
        reg.register("com", |_| Box::new(Complete));
        reg.register("nul", |_| Box::new(Null));
        reg.register("dnc", |_| Box::new(DontCare));
        reg.register("reg", |_| Box::new(Regular));
        reg.register("rre", |_| Box::new(RowRegular));
        reg.register("cre", |_| Box::new(ColRegular));
        reg.register("rfn", |_| Box::new(RowFunctional));
        reg.register("cfn", |_| Box::new(ColFunctional));
        reg.register("den", |p| Box::new(Density::new(p.unwrap_or(density::DEFAULT_DENSITY))));
        reg.register("dex", |p| {
            Box::new(ExactDensity::new(p.unwrap_or(density::DEFAULT_DENSITY)))
        });
        reg.register("rrefn", |_| Box::new(HalfWeight::new(CompositeKind::RowRegularRowFunctional)));
        reg.register("crefn", |_| Box::new(HalfWeight::new(CompositeKind::ColRegularColFunctional)));
        reg.register("regrfn", |_| Box::new(HalfWeight::new(CompositeKind::RegularRowFunctional)));
        reg.register("regcfn", |_| Box::new(HalfWeight::new(CompositeKind::RegularColFunctional)));
        reg
    }

    /// Add or replace a variant.
    pub fn register(&mut self, name: &'static str, factory: BlockFactory) {
        self.factories.insert(name, factory);
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Instantiate `name`, passing `parameter` to parameterized variants.
    pub fn create(&self, name: &str, parameter: Option<f64>) -> Result<Block, BlockError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| BlockError::UnknownBlock { name: name.to_string() })?;
        let block = Block::new(factory(parameter));
        if parameter.is_some() && block.parameter().is_none() {
            return Err(BlockError::MalformedCell {
                cell: name.to_string(),
                message: "block takes no parameter".into(),
            });
        }
        Ok(block)
    }

    /// Parse cell notation: `name` or `name(parameter)`.
    pub fn parse(&self, cell: &str) -> Result<Block, BlockError> {
        let cell = cell.trim();
        let malformed = |message: &str| BlockError::MalformedCell {
            cell: cell.to_string(),
            message: message.to_string(),
        };
        match cell.find('(') {
            None => self.create(cell, None),
            Some(open) => {
                let inner = cell[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| malformed("missing ')'"))?;
                let parameter: f64 = inner
                    .trim()
                    .parse()
                    .map_err(|_| malformed("parameter is not a number"))?;
                self.create(cell[..open].trim(), Some(parameter))
            }
        }
    }
}

impl Default for BlockRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for BlockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockRegistry").field("names", &self.names()).finish()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
