use std::fmt;

use lagex_core::{
    to_experiment_origin, Experiment, Phase, Result, TrialResult, TrialState,
};
use rand::Rng;
use tracing::{debug, info};

use crate::config::{ExperimentConfig, TrialSource};
use crate::host::{SceneHandles, SceneHost};
use crate::placement::PlacementGenerator;
use crate::trace::{TraceHeader, TraceWriter};
use crate::trigger::EdgeTrigger;

#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    SourceSpawned { trial_index: usize },
    TargetSpawned { trial_index: usize },
    SourceAcquired { trial_index: usize },
    TrialCompleted { trial_index: usize },
    TrainingComplete,
    /// Delayed poses recorded under the old latency must be discarded.
    LatencyAdvanced { latency_index: usize, latency_ms: u32 },
    SessionComplete,
}

/// Controller readings for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    pub now: f64,
    /// Raw level of the acquisition button.
    pub select: bool,
    /// Raw level of the training exit control.
    pub exit_training: bool,
}

/// Walks the session: training trials, then every measured trial once per
/// latency in the sweep.
pub struct TrialScheduler<H, R> {
    config: ExperimentConfig,
    rng: R,
    placement: PlacementGenerator,
    experiments: Vec<Experiment>,
    phase: Phase,
    trial_index: usize,
    latency_index: usize,
    active_source: Option<H>,
    active_target: Option<H>,
    current: Option<Experiment>,
    select: EdgeTrigger,
    trace: TraceWriter,
    source_acquired_at: Option<f64>,
    results: Vec<TrialResult>,
    complete: bool,
}

impl<H, R> TrialScheduler<H, R>
where
    H: Copy + Eq + fmt::Debug,
    R: Rng,
{
    pub fn new(config: ExperimentConfig, rng: R) -> Result<Self> {
        config.validate()?;
        let placement = PlacementGenerator::new(&config.placement);
        let trace = TraceWriter::new(config.trace.directory.clone(), config.trace.button_column);
        let mut scheduler = Self {
            config,
            rng,
            placement,
            experiments: Vec::new(),
            phase: Phase::Training,
            trial_index: 0,
            latency_index: 0,
            active_source: None,
            active_target: None,
            current: None,
            select: EdgeTrigger::new(),
            trace,
            source_acquired_at: None,
            results: Vec::new(),
            complete: false,
        };
        scheduler.experiments = scheduler.build_experiments()?;
        Ok(scheduler)
    }

    /// Runs one frame of trial logic against the host scene.
    pub fn tick<S>(
        &mut self,
        host: &mut S,
        handles: &SceneHandles<H>,
        input: &TickInput,
    ) -> Result<Vec<SchedulerEvent>>
    where
        S: SceneHost<Handle = H>,
    {
        let mut events = Vec::new();
        let pressed = self.select.update(input.select);

        if self.phase.is_measured()
            && self.trial_index >= self.trial_count()
            && self.latency_index < self.latency_count()
        {
            self.advance_latency(host, &mut events)?;
        }

        if self.active_source.is_none() && self.active_target.is_none() {
            let layout = if self.phase.is_training() {
                Some(self.training_layout()?)
            } else if self.trial_available() {
                Some(self.experiments[self.trial_index])
            } else {
                None
            };
            if let Some(layout) = layout {
                let source = host.instantiate(handles.source_template, handles.bounds);
                host.set_local_placement(source, layout.source_position, layout.source_diameter);
                self.active_source = Some(source);
                self.current = Some(layout);
                host.set_text(&self.overlay_text());
                debug!(trial = self.trial_index, phase = self.phase.label(), "source spawned");
                events.push(SchedulerEvent::SourceSpawned {
                    trial_index: self.trial_index,
                });
            }
        }

        if self.active_source.is_some() && self.active_target.is_none() {
            if let Some(layout) = self.current {
                let target = host.instantiate(handles.target_template, handles.bounds);
                host.set_local_placement(target, layout.target_position, layout.target_diameter);
                self.active_target = Some(target);
                events.push(SchedulerEvent::TargetSpawned {
                    trial_index: self.trial_index,
                });
            }
        }

        if self.trace.is_active() {
            let world = host.world_position(handles.pointer);
            let local = host.inverse_transform_point(handles.bounds, world);
            self.trace
                .write_sample(input.now, to_experiment_origin(local), input.select)?;
        }

        if pressed {
            let pointer = host.world_position(handles.pointer);
            match (self.active_source, self.active_target) {
                (None, Some(target))
                    if !self.config.require_target_proximity || host.contains(target, pointer) =>
                {
                    self.complete_trial(host, target, input.now, &mut events)?;
                }
                (Some(source), _) if host.contains(source, pointer) => {
                    self.acquire_source(host, source, input.now, &mut events)?;
                }
                _ => {}
            }
        }

        if self.phase.is_training() && input.exit_training {
            self.leave_training(host, &mut events);
        }

        Ok(events)
    }

    fn advance_latency<S>(&mut self, host: &mut S, events: &mut Vec<SchedulerEvent>) -> Result<()>
    where
        S: SceneHost<Handle = H>,
    {
        let next = self.latency_index + 1;
        // Regenerate before touching any index; a failed draw leaves the round intact for a retry.
        if next < self.latency_count() && self.config.trials.is_generated() {
            self.experiments = self.build_experiments()?;
        }

        self.trial_index = 0;
        self.latency_index = next;
        events.push(SchedulerEvent::LatencyAdvanced {
            latency_index: self.latency_index,
            latency_ms: self.active_latency_ms(),
        });

        if self.latency_index < self.latency_count() {
            info!(
                latency_ms = self.active_latency_ms(),
                round = self.latency_index + 1,
                of = self.latency_count(),
                "latency advanced"
            );
        } else if !self.complete {
            self.complete = true;
            host.set_text("Session complete");
            info!(trials = self.results.len(), "latency sweep finished");
            events.push(SchedulerEvent::SessionComplete);
        }
        Ok(())
    }

    fn acquire_source<S>(
        &mut self,
        host: &mut S,
        source: H,
        now: f64,
        events: &mut Vec<SchedulerEvent>,
    ) -> Result<()>
    where
        S: SceneHost<Handle = H>,
    {
        if self.phase.is_measured() {
            if let Some(layout) = self.current {
                self.trace.start(&TraceHeader {
                    trial_index: self.trial_index,
                    latency_ms: self.active_latency_ms(),
                    source: layout.source_experiment_position(),
                    source_size: layout.source_experiment_size(),
                    target: layout.target_experiment_position(),
                    target_size: layout.target_experiment_size(),
                })?;
            }
            self.source_acquired_at = Some(now);
        }
        host.destroy(source);
        self.active_source = None;
        events.push(SchedulerEvent::SourceAcquired {
            trial_index: self.trial_index,
        });
        Ok(())
    }

    fn complete_trial<S>(
        &mut self,
        host: &mut S,
        target: H,
        now: f64,
        events: &mut Vec<SchedulerEvent>,
    ) -> Result<()>
    where
        S: SceneHost<Handle = H>,
    {
        let trial_index = self.trial_index;
        if self.phase.is_measured() {
            let trace_file = self.trace.stop()?;
            if let Some(layout) = self.current {
                let acquired = self.source_acquired_at.take().unwrap_or(now);
                self.results.push(TrialResult {
                    trial_index,
                    latency_ms: self.active_latency_ms(),
                    source: layout.source_experiment_position(),
                    source_size: layout.source_experiment_size(),
                    target: layout.target_experiment_position(),
                    target_size: layout.target_experiment_size(),
                    source_acquired_at: acquired,
                    completed_at: now,
                    movement_time: now - acquired,
                    trace_file: trace_file
                        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned())),
                });
            }
        }
        host.destroy(target);
        self.active_target = None;
        self.current = None;
        if self.phase.is_measured() {
            self.trial_index += 1;
            info!(
                trial = trial_index,
                latency_ms = self.active_latency_ms(),
                "trial completed"
            );
        }
        events.push(SchedulerEvent::TrialCompleted { trial_index });
        Ok(())
    }

    fn leave_training<S>(&mut self, host: &mut S, events: &mut Vec<SchedulerEvent>)
    where
        S: SceneHost<Handle = H>,
    {
        if let Some(source) = self.active_source.take() {
            host.destroy(source);
        }
        if let Some(target) = self.active_target.take() {
            host.destroy(target);
        }
        self.current = None;
        if let Some(next) = self.phase.next() {
            self.phase = next;
        }
        info!(
            trials = self.trial_count(),
            latencies = ?self.config.latencies_ms,
            "training finished, starting measured trials"
        );
        events.push(SchedulerEvent::TrainingComplete);
    }

    fn build_experiments(&mut self) -> Result<Vec<Experiment>> {
        match &self.config.trials {
            TrialSource::Static(list) => Ok(list.clone()),
            TrialSource::Generated(templates) => templates
                .iter()
                .map(|t| -> Result<Experiment> {
                    let p = self.placement.generate(&mut self.rng, t.diameter, t.distance)?;
                    Ok(Experiment::new(p.source, p.diameter, p.target, p.diameter))
                })
                .collect(),
        }
    }

    fn training_layout(&mut self) -> Result<Experiment> {
        let (d_lo, d_hi) = self.config.training.diameter_range;
        let (s_lo, s_hi) = self.config.training.distance_range;
        let diameter = self.rng.random_range(d_lo..=d_hi);
        let distance = self.rng.random_range(s_lo..=s_hi);
        let p = self.placement.generate(&mut self.rng, diameter, distance)?;
        Ok(Experiment::new(p.source, p.diameter, p.target, p.diameter))
    }

    fn overlay_text(&self) -> String {
        if self.phase.is_training() {
            format!("Training\nLatency {} ms", self.active_latency_ms())
        } else {
            format!(
                "Trial {}/{}\nLatency {} ms ({}/{})",
                self.trial_index + 1,
                self.trial_count(),
                self.active_latency_ms(),
                self.latency_index + 1,
                self.latency_count()
            )
        }
    }

    fn trial_available(&self) -> bool {
        self.trial_index < self.trial_count() && self.latency_index < self.latency_count()
    }

    /// Latency the pose queue runs at; held at the last value once the sweep is done.
    pub fn active_latency_ms(&self) -> u32 {
        let last = self.latency_count().saturating_sub(1);
        self.config.latencies_ms[self.latency_index.min(last)]
    }

    pub fn state(&self) -> TrialState {
        TrialState {
            phase: self.phase,
            trial_index: self.trial_index,
            latency_index: self.latency_index,
            source_alive: self.active_source.is_some(),
            target_alive: self.active_target.is_some(),
            previous_button_value: self.select.is_held(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn trial_count(&self) -> usize {
        self.experiments.len()
    }

    pub fn latency_count(&self) -> usize {
        self.config.latency_count()
    }

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_tracing(&self) -> bool {
        self.trace.is_active()
    }

    pub fn active_source(&self) -> Option<H> {
        self.active_source
    }

    pub fn active_target(&self) -> Option<H> {
        self.active_target
    }

    pub fn results(&self) -> &[TrialResult] {
        &self.results
    }

    /// Closes any open trace and hands back the recorded results.
    pub fn finish(&mut self) -> Result<Vec<TrialResult>> {
        if let Some(path) = self.trace.stop()? {
            info!(path = %path.display(), "closed unfinished trace");
        }
        Ok(std::mem::take(&mut self.results))
    }

    pub fn latency_index(&self) -> usize {
        self.latency_index
    }

    /// Jumps to a sweep position, for hosts resuming a session.
    ///
    /// The trial in progress is abandoned: its objects are destroyed and its
    /// trace is closed without recording a result.
    pub fn resume_at<S>(&mut self, host: &mut S, trial_index: usize, latency_index: usize) -> Result<()>
    where
        S: SceneHost<Handle = H>,
    {
        let latency_index = latency_index.min(self.latency_count());
        if self.config.trials.is_generated() && latency_index < self.latency_count() {
            self.experiments = self.build_experiments()?;
        }

        if let Some(path) = self.trace.stop()? {
            info!(path = %path.display(), "abandoned trace on resume");
        }
        if let Some(source) = self.active_source.take() {
            host.destroy(source);
        }
        if let Some(target) = self.active_target.take() {
            host.destroy(target);
        }
        self.current = None;
        self.source_acquired_at = None;

        self.phase = Phase::Measured;
        self.trial_index = trial_index;
        self.latency_index = latency_index;
        info!(trial = trial_index, latency_index, "session resumed");
        Ok(())
    }
}
