/*
 * This source code is licensed under the Business Source License 1.1.
 */

//! Partition search engine.
//!
//! # Lifecycle
//!
//! ```text
//!          initialize(ok)            run
//!   Idle ────────────────▶ Initialized ───▶ Running ──┬──▶ Completed
//!    ▲  ◀── initialize(err)                           ├──▶ TimedOut
//!    │                                                ├──▶ Cancelled
//!    └──────────────────── scoring fault ◀────────────┘
//! ```
//!
//! | Search type | What it does |
//! |-------------|--------------|
//! | `exhaustive` | Every assignment meeting the minimum cluster size, once |
//! | `localopt` | Restarted first-improvement single-actor moves |
//! | `testpartition` | Scores one supplied partition |
//!
//! The engine owns its [`SearchSession`]; every [`SearchEngine::initialize`]
//! starts a fresh one, so no best-solution or cached score survives into the
//! next search.

pub mod budget;
pub mod config;
mod exhaustive;
mod localopt;
pub mod session;

use core::fmt;
use core::str::FromStr;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

pub use budget::{Budget, CancelToken, StopReason};
pub use config::{ExpansionMode, SearchConfig};
pub use session::{ExpansionSelect, ScoreKey, SearchSession, Solution};

use crate::error::{GofError, Result, SearchError};
use crate::gof::GofMethod;
use crate::image::BlockImage;
use crate::network::Matrix;
use crate::partition::{cluster_sizes, Partition};
use crate::result::{assemble, LogLine, SearchOutcome, SearchStatus};
use session::SearchContext;

// ─── SearchType ─────────────────────────────────────────────────────────────

/// Which heuristic explores the partition space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SearchType {
    /// Full enumeration.
    Exhaustive,
    /// Local optimisation with restarts.
    Localopt,
    /// Score a supplied partition.
    TestPartition,
}

impl SearchType {
    /// Name used in requests and logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Exhaustive => "exhaustive",
            Self::Localopt => "localopt",
            Self::TestPartition => "testpartition",
        }
    }
}

impl FromStr for SearchType {
    type Err = SearchError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exhaustive" => Ok(Self::Exhaustive),
            "localopt" => Ok(Self::Localopt),
            "testpartition" => Ok(Self::TestPartition),
            _ => Err(SearchError::UnknownSearchType(s.to_string())),
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Engine state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Nothing prepared.
    #[default]
    Idle,
    /// A validated request is ready to run.
    Initialized,
    /// A heuristic is executing.
    Running,
    /// The last run finished.
    Completed,
    /// The last run hit `max_time`.
    TimedOut,
    /// The last run was cancelled.
    Cancelled,
}

// ─── SearchRequest ──────────────────────────────────────────────────────────

/// Inbound search request. Strings are validated by
/// [`SearchEngine::initialize`].
#[derive(Clone, Debug, Default)]
pub struct SearchRequest {
    /// Network to fit.
    pub network: Option<Arc<Matrix>>,
    /// Block image, possibly multi-blocked.
    pub image: Option<BlockImage>,
    /// `exhaustive`, `localopt` or `testpartition`.
    pub search_type: String,
    /// `hamming`, `nordlund` or `ziberna`.
    pub method: String,
    /// Knobs.
    pub config: SearchConfig,
    /// Partition to score (`testpartition`) or start from (`localopt`).
    pub partition: Option<Partition>,
}

impl SearchRequest {
    /// Request with default knobs and no partition.
    pub fn new(network: Arc<Matrix>, image: BlockImage, search_type: &str, method: &str) -> Self {
        Self {
            network: Some(network),
            image: Some(image),
            search_type: search_type.to_string(),
            method: method.to_string(),
            config: SearchConfig::default(),
            partition: None,
        }
    }

    /// Replace the knobs.
    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    /// Attach a partition.
    pub fn with_partition(mut self, partition: Partition) -> Self {
        self.partition = Some(partition);
        self
    }
}

// ─── SearchEngine ───────────────────────────────────────────────────────────

/// A validated request, ready to run.
#[derive(Debug)]
struct Prepared {
    matrix: Arc<Matrix>,
    image: BlockImage,
    expansions: usize,
    search_type: SearchType,
    method: GofMethod,
    config: SearchConfig,
    start: Option<Vec<usize>>,
    seed: u64,
}

/// Blockmodel search engine. One search at a time, enforced by `&mut self`.
#[derive(Debug)]
pub struct SearchEngine {
    state: EngineState,
    prepared: Option<Prepared>,
    session: Mutex<SearchSession>,
    cancel: CancelToken,
    log: Vec<LogLine>,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine {
    /// Idle engine.
    pub fn new() -> Self {
        Self {
            state: EngineState::Idle,
            prepared: None,
            session: Mutex::new(SearchSession::new(GofMethod::Hamming)),
            cancel: CancelToken::new(),
            log: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Token that cancels the current or next run.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Best score of the current session.
    pub fn best_score(&self) -> Option<f64> {
        self.session.lock().best_score()
    }

    /// Retained best solutions of the current session, sorted.
    pub fn best_solutions(&self) -> Vec<Solution> {
        self.session.lock().sorted_best()
    }

    /// Log of the last run. After a scoring fault it ends with the
    /// `!Error:` line; the next `initialize` clears it.
    pub fn last_log(&self) -> &[LogLine] {
        &self.log
    }

    /// Distinct partitions scored in the current session.
    pub fn scored_count(&self) -> usize {
        self.session.lock().scored_count()
    }

    /// Validate `request` and prepare a run.
    ///
    /// Clears the previous session first. On error the engine is `Idle`.
    pub fn initialize(&mut self, request: SearchRequest) -> Result<()> {
        self.state = EngineState::Idle;
        self.prepared = None;
        self.session.get_mut().clear();
        self.cancel.reset();
        self.log.clear();

        let prepared = prepare(request)?;
        *self.session.get_mut() = SearchSession::new(prepared.method);
        debug!(
            search = %prepared.search_type,
            method = %prepared.method,
            actors = prepared.matrix.size(),
            positions = prepared.image.size(),
            "search initialized"
        );
        self.prepared = Some(prepared);
        self.state = EngineState::Initialized;
        Ok(())
    }

    /// Run the prepared search.
    ///
    /// Timeout and cancellation are reported through
    /// [`SearchOutcome::status`], with the best models found so far. A scoring
    /// fault returns [`SearchError::Fault`] and leaves the engine `Idle`.
    pub fn run(&mut self) -> Result<SearchOutcome> {
        if self.state != EngineState::Initialized {
            return Err(SearchError::NotInitialized);
        }
        let prepared = self.prepared.take().ok_or(SearchError::NotInitialized)?;
        self.state = EngineState::Running;

        let mut log = Vec::new();
        match execute(&prepared, &self.session, &self.cancel, &mut log) {
            Ok((status, models)) => {
                self.state = match status {
                    SearchStatus::Ok => EngineState::Completed,
                    SearchStatus::Timeout => EngineState::TimedOut,
                    SearchStatus::Cancelled => EngineState::Cancelled,
                };
                let evaluations = self.session.lock().evaluations();
                self.log = log.clone();
                Ok(SearchOutcome { status, models, log, evaluations })
            }
            Err(fault) => {
                warn!(error = %fault, "search aborted");
                log.push(LogLine::error(format!("scoring fault: {}", fault)));
                self.log = log;
                self.state = EngineState::Idle;
                Err(SearchError::Fault(fault))
            }
        }
    }
}

/// Validate a request, in the order the checks are documented.
fn prepare(request: SearchRequest) -> Result<Prepared> {
    let matrix = request.network.ok_or(SearchError::MissingNetwork)?;
    let search_type: SearchType = request.search_type.parse()?;
    let method: GofMethod = request.method.parse()?;
    let image = request.image.ok_or(SearchError::MissingImage)?;

    let unresolved = image.unresolved_cells();
    if !unresolved.is_empty() {
        return Err(SearchError::UnresolvedImage(unresolved));
    }
    let expansions = image
        .expansion_count()
        .ok_or_else(|| SearchError::Config("block image has too many expansions to enumerate".into()))?;
    if let Some(block) = image.all_blocks().find(|b| !b.supports(method)) {
        return Err(SearchError::IncompatibleBlock {
            block: block.to_string(),
            method: method.name().to_string(),
        });
    }

    let config = request.config;
    config.validate()?;
    let n = matrix.size();
    let k = image.size();
    if n == 0 {
        return Err(SearchError::Config("network has no actors".into()));
    }
    if config.min_cluster_size * k > n {
        return Err(SearchError::Config(format!(
            "minimum cluster size {} leaves no partition of {} actors into {} positions",
            config.min_cluster_size, n, k
        )));
    }

    let start = match request.partition {
        Some(partition) => {
            partition.validate(n, k)?;
            let assignment = partition.assignment(n)?;
            if cluster_sizes(&assignment, k).iter().any(|&s| s < config.min_cluster_size) {
                return Err(SearchError::Config(format!(
                    "supplied partition has a cluster smaller than {}",
                    config.min_cluster_size
                )));
            }
            Some(assignment)
        }
        None if search_type == SearchType::TestPartition => {
            return Err(SearchError::Config("testpartition requires a partition".into()));
        }
        None => None,
    };

    let seed = config.seed.unwrap_or_else(rand::random);
    Ok(Prepared { matrix, image, expansions, search_type, method, config, start, seed })
}

/// Run the heuristic and assemble its models.
fn execute(
    prepared: &Prepared,
    session: &Mutex<SearchSession>,
    cancel: &CancelToken,
    log: &mut Vec<LogLine>,
) -> core::result::Result<(SearchStatus, Vec<crate::result::BlockModel>), GofError> {
    let budget = Budget::new(prepared.config.max_time, cancel.clone());
    let ctx = SearchContext {
        matrix: &prepared.matrix,
        image: &prepared.image,
        expansions: prepared.expansions,
        method: prepared.method,
        config: &prepared.config,
        budget: &budget,
        session,
    };

    info!(search = %prepared.search_type, method = %prepared.method, "search started");
    log.push(LogLine::info(format!(
        "{} search, method {}: {} actors, {} positions, {} image expansion(s)",
        prepared.search_type,
        prepared.method,
        ctx.actors(),
        ctx.positions(),
        prepared.expansions
    )));

    let stop = match prepared.search_type {
        SearchType::Exhaustive => exhaustive::run(&ctx, log)?,
        SearchType::Localopt => {
            log.push(LogLine::info(format!("localopt seed {}", prepared.seed)));
            localopt::run(&ctx, prepared.seed, prepared.start.as_deref(), log)?
        }
        SearchType::TestPartition => {
            if let Some(start) = prepared.start.as_deref() {
                ctx.evaluate(start, ExpansionSelect::All)?;
            }
            None
        }
    };

    let status = match stop {
        None => SearchStatus::Ok,
        Some(StopReason::TimedOut) => SearchStatus::Timeout,
        Some(StopReason::Cancelled) => SearchStatus::Cancelled,
    };
    if status != SearchStatus::Ok {
        warn!(status = status.token(), elapsed = ?budget.elapsed(), "search stopped early");
    }

    let (best_score, solutions) = {
        let session = session.lock();
        (session.best_score(), session.sorted_best())
    };
    let models = assemble(&prepared.matrix, &prepared.image, prepared.method, solutions)?;
    if let Some(score) = best_score {
        log.push(LogLine::info(format!("best score {:.4}, {} optimal model(s)", score, models.len())));
    }
    log.push(LogLine::status(status.token()));
    info!(status = status.token(), models = models.len(), elapsed = ?budget.elapsed(), "search finished");
    Ok((status, models))
}
