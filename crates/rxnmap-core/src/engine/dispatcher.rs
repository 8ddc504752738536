use super::context::ReactionContainer;
use super::error::EngineError;
use super::jobs::JobGroups;
use super::progress::{Progress, ProgressReporter};
use super::state::MatchResult;
use super::strategy::MappingStrategy;
use super::tasks::match_task::MatchTask;
use super::utils::pool;
use crate::core::chem::matcher::{MatchOptions, SubstructureMatcher};
use crate::core::chem::rings::RingFinder;
use tracing::{debug, error, instrument};

/// Runs the matcher for every representative job on a bounded worker pool.
pub struct MatchDispatcher<'a> {
    matcher: &'a dyn SubstructureMatcher,
    ring_finder: &'a dyn RingFinder,
    reporter: &'a ProgressReporter<'a>,
    threads: Option<usize>,
    step_budget: u64,
}

impl<'a> MatchDispatcher<'a> {
    pub fn new(
        matcher: &'a dyn SubstructureMatcher,
        ring_finder: &'a dyn RingFinder,
        reporter: &'a ProgressReporter<'a>,
    ) -> Self {
        Self {
            matcher,
            ring_finder,
            reporter,
            threads: None,
            step_budget: MatchOptions::DEFAULT_STEP_BUDGET,
        }
    }

    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_step_budget(mut self, step_budget: u64) -> Self {
        self.step_budget = step_budget;
        self
    }

    /// Matches every representative job of `groups` and returns the successful
    /// results in completion order.
    ///
    /// A failing or panicking job is logged and left out; its siblings are
    /// unaffected. The pool is joined before this returns.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InterruptedWait`] if the completion queue closes
    /// before every job has reported, and [`EngineError::ThreadPool`] if the
    /// pool cannot be created.
    #[instrument(skip_all, name = "match_dispatcher", fields(strategy = %strategy, jobs = groups.len()))]
    pub fn dispatch(
        &self,
        container: &ReactionContainer,
        groups: &JobGroups,
        strategy: MappingStrategy,
    ) -> Result<Vec<MatchResult>, EngineError> {
        if groups.is_empty() {
            debug!("No jobs to dispatch.");
            return Ok(Vec::new());
        }

        let tasks = groups
            .keys()
            .map(|&job| MatchTask::prepare(job, container, strategy, self.ring_finder, self.step_budget))
            .collect::<Result<Vec<_>, _>>()?;

        let threads = pool::pool_size(self.threads, tasks.len());
        let worker_pool = pool::build_pool(threads, "match")?;
        debug!(threads, "Dispatching matching jobs.");
        self.reporter.report(Progress::TaskStart {
            total_steps: tasks.len() as u64,
        });

        let matcher = self.matcher;
        let mut results = Vec::with_capacity(tasks.len());
        let mut failures = 0usize;
        pool::run_to_completion(
            &worker_pool,
            &tasks,
            "matching",
            |task| task.run(matcher),
            |index, outcome| {
                let outcome = outcome.unwrap_or_else(|payload| {
                    Err(tasks[index].failure(format!("panicked: {}", pool::panic_message(payload.as_ref()))))
                });
                match outcome {
                    Ok(result) => results.push(result),
                    Err(e) => {
                        failures += 1;
                        error!(job = %tasks[index].job(), error = %e, "Matching job failed; its result is dropped.");
                    }
                }
                self.reporter.report(Progress::TaskIncrement);
            },
        )?;
        drop(worker_pool);

        self.reporter.report(Progress::TaskFinish);
        debug!(
            succeeded = results.len(),
            failed = failures,
            "All matching jobs completed."
        );
        Ok(results)
    }
}
