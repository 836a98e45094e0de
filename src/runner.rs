use crate::aggregate::{aggregate, RepetitionSeries, RunResult};
use crate::config::ScenarioConfig;
use crate::error::EngineError;
use crate::sim::Simulation;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

/// Terminal state of a run. Cancellation is not a failure: partial progress
/// is reported, but no result is produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Done(RunResult),
    Cancelled {
        days_done: usize,
        days_total: usize,
    },
}

pub type ProgressFn<'a> = dyn Fn(f32) + Sync + 'a;

/// Drives `steps` days x `reps` repetitions of a validated scenario.
///
/// Each repetition is an independent unit of work: it derives a sub-seed
/// from `(seed, rep)`, regenerates network and population from it, and runs
/// its days strictly sequentially. Repetitions execute on a bounded worker
/// pool and share nothing mutable except the progress counter and the
/// cancellation flag; their outputs are merged in repetition order after
/// all complete, so results do not depend on scheduling.
#[derive(Debug)]
pub struct SimulationRunner {
    conf: ScenarioConfig,
    workers: usize,
}

impl SimulationRunner {
    /// Fails fast with a config error before any simulation starts.
    pub fn new(conf: ScenarioConfig) -> Result<SimulationRunner, EngineError> {
        conf.validate()?;
        Ok(SimulationRunner { conf, workers: 0 })
    }

    /// Bound the repetition worker pool. 0 means one worker per core.
    pub fn with_workers(mut self, workers: usize) -> SimulationRunner {
        self.workers = workers;
        self
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.conf
    }

    pub fn run(
        &self,
        run_id: Uuid,
        progress: Option<&ProgressFn>,
        cancel: &AtomicBool,
    ) -> Result<RunOutcome, EngineError> {
        let days_total = self.conf.steps * self.conf.reps;
        let days_done = AtomicUsize::new(0);

        info!(
            %run_id,
            n = self.conf.network.n,
            steps = self.conf.steps,
            reps = self.conf.reps,
            "starting run"
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| {
                EngineError::InvalidScenarioConfig(format!("worker pool: {}", e))
            })?;

        let outcomes: Vec<Result<Option<RepetitionSeries>, EngineError>> = pool.install(|| {
            (0..self.conf.reps)
                .into_par_iter()
                .map(|rep| self.run_repetition(rep, &days_done, days_total, progress, cancel))
                .collect()
        });

        let mut series = Vec::with_capacity(self.conf.reps);
        let mut cancelled = false;
        for outcome in outcomes {
            match outcome? {
                Some(s) => series.push(s),
                None => cancelled = true,
            }
        }

        if cancelled {
            let days_done = days_done.load(Ordering::Relaxed);
            info!(%run_id, days_done, days_total, "run cancelled");
            return Ok(RunOutcome::Cancelled {
                days_done,
                days_total,
            });
        }

        info!(%run_id, "run complete, aggregating");
        Ok(RunOutcome::Done(aggregate(run_id, &self.conf, &series)))
    }

    fn run_repetition(
        &self,
        rep: usize,
        days_done: &AtomicUsize,
        days_total: usize,
        progress: Option<&ProgressFn>,
        cancel: &AtomicBool,
    ) -> Result<Option<RepetitionSeries>, EngineError> {
        let sub_seed = self.conf.seed.wrapping_add(rep as u64);
        let mut rng: StdRng = SeedableRng::seed_from_u64(sub_seed);
        let mut sim = Simulation::new(&self.conf, &mut rng)?;

        debug!(rep, sub_seed, "repetition start");

        let mut counts = Vec::with_capacity(self.conf.steps + 1);
        counts.push(sim.metric_counts());

        for day in 1..=self.conf.steps {
            // Cooperative cancellation, checked between days
            if cancel.load(Ordering::Relaxed) {
                debug!(rep, day, "repetition cancelled");
                return Ok(None);
            }

            sim.step(&self.conf, &mut rng);
            sim.check_invariants(rep, day)?;
            counts.push(sim.metric_counts());

            let done = days_done.fetch_add(1, Ordering::Relaxed) + 1;
            if let Some(report) = progress {
                report(done as f32 / days_total as f32);
            }
        }

        Ok(Some(RepetitionSeries { rep, counts }))
    }
}
