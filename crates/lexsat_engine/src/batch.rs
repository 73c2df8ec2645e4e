//! Parallel solving of independent problems.
//!
//! Z3 contexts are not shareable across threads, so each problem is compiled
//! and solved inside its own context on whichever worker picks it up.

use lexsat_foundation::{Error, ErrorKind, Result};
use lexsat_language::ConstraintProblem;
use rayon::prelude::*;
use tracing::info;

use crate::solve::{Orchestrator, SolveResult};

impl Orchestrator {
    /// Solves every problem, returning results in input order.
    ///
    /// Runs on a dedicated pool when `threads` is configured, otherwise on
    /// rayon's global pool.
    ///
    /// # Errors
    /// Returns `Internal` if the worker pool cannot be built. Per-problem
    /// failures are reported in the corresponding slot.
    pub fn solve_batch(&self, problems: &[ConstraintProblem]) -> Result<Vec<Result<SolveResult>>> {
        info!(problems = problems.len(), threads = ?self.config().threads, "batch solve");
        let run = || -> Vec<Result<SolveResult>> {
            problems.par_iter().map(|problem| self.solve(problem)).collect()
        };

        match self.config().threads {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| Error::new(ErrorKind::Internal(e.to_string())))?;
                Ok(pool.install(run))
            }
            None => Ok(run()),
        }
    }
}
