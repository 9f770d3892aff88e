/*!
 * Workload Generator
 * Random process requests per class and the auto-generate task
 */

use crate::core::clock::Clock;
use crate::core::limits::AUTO_GENERATE_INTERVAL;
use crate::core::task::BackgroundTask;
use crate::process::{ProcessClass, ProcessSpec};
use crate::scheduler::Scheduler;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

/// Produces randomized admission requests
#[derive(Debug)]
pub struct WorkloadGenerator {
    rng: StdRng,
    clock: Arc<dyn Clock>,
}

impl WorkloadGenerator {
    pub fn new(clock: Arc<dyn Clock>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng, clock }
    }

    /// Random request for `class`
    ///
    /// cpu 5..=9 units, 100..=599 MB, demand 10..=89 %; priority bands are
    /// System 70..=99, User 30..=69, Background 1..=30.
    pub fn spec_for(&mut self, class: ProcessClass) -> ProcessSpec {
        let cpu_time = self.rng.gen_range(5..=9);
        let mem_need = self.rng.gen_range(100..=599);
        let cpu_demand = self.rng.gen_range(10..=89);
        let priority = match class {
            ProcessClass::System => self.rng.gen_range(70..=99),
            ProcessClass::User => self.rng.gen_range(30..=69),
            ProcessClass::Background => self.rng.gen_range(1..=30),
        };
        let name = format!("{}_{:04}", class.tag(), self.clock.now() % 10_000);

        ProcessSpec::new(name, cpu_time, mem_need)
            .with_cpu_demand(cpu_demand)
            .with_class(class)
            .with_priority(priority)
    }

    /// Random request of a random class
    pub fn next_spec(&mut self) -> ProcessSpec {
        let class = ProcessClass::ALL[self.rng.gen_range(0..ProcessClass::ALL.len())];
        self.spec_for(class)
    }

    /// Batch size for one auto-generate round (1 or 2)
    pub fn batch_size(&mut self) -> usize {
        self.rng.gen_range(1..=2)
    }
}

/// Spawn the auto-generator: every period, unless paused, admit 1-2 processes
pub fn spawn_auto_generator(
    scheduler: Arc<Scheduler>,
    mut generator: WorkloadGenerator,
    period: Option<Duration>,
) -> BackgroundTask {
    let period = period.unwrap_or(AUTO_GENERATE_INTERVAL);

    BackgroundTask::spawn("auto-generator", move |mut shutdown| async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(period_ms = period.as_millis() as u64, "Auto-generator started");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {
                    if scheduler.is_paused() {
                        continue;
                    }
                    for _ in 0..generator.batch_size() {
                        let spec = generator.next_spec();
                        let name = spec.name.clone();
                        let class = spec.class;
                        if let Err(e) = scheduler.submit(spec) {
                            warn!(name = %name, class = ?class, error = %e, "Failed to add process - insufficient resources");
                        }
                    }
                }
            }
        }
    })
}
