use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use lagex_core::{ExperimentError, PoseFlags, Quat, TrialResult, TrialTemplate};
use lagex_experiment::{
    DelayedPoseDriver, ExperimentConfig, InputFeature, SchedulerEvent, TrackedPose, TrialSource,
};
use lagex_timing::{FrameClock, HighPrecisionTimer, Timer};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, warn};

use crate::sim::{Participant, SimDevice, SimHand, SimInput, SimScene};

pub struct AppOptions {
    pub trace_dir: PathBuf,
    pub results_path: PathBuf,
    pub seed: Option<u64>,
    pub realtime: bool,
    pub training_trials: usize,
    pub frame_rate: f64,
    pub max_seconds: f64,
}

pub struct App {
    driver: DelayedPoseDriver<SimScene, SimDevice, StdRng>,
    scene: SimScene,
    input: SimInput,
    hand: SimHand,
    participant: Participant,
    clock: FrameClock,
    timer: HighPrecisionTimer,
    frame: Duration,
    options: AppOptions,
    training_done: usize,
    finished: bool,
}

/// Fitts-style sweep: two sizes at two separations.
pub fn default_config(options: &AppOptions) -> ExperimentConfig {
    let mut config = ExperimentConfig {
        latencies_ms: vec![0, 100, 200, 300],
        trials: TrialSource::Generated(
            [(0.08, 0.3), (0.08, 0.6), (0.15, 0.3), (0.15, 0.6)]
                .into_iter()
                .map(|(diameter, distance)| TrialTemplate { diameter, distance })
                .collect(),
        ),
        seed: options.seed,
        ..ExperimentConfig::default()
    };
    config.trace.directory = options.trace_dir.clone();
    config
}

impl App {
    pub fn new(options: AppOptions) -> Result<Self> {
        let config = default_config(&options);
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let input = SimInput::default();
        let scene = SimScene::new(&config.handles);
        let start = scene.pointer;
        let driver = DelayedPoseDriver::new(config, &input, rng)
            .context("failed to start session")?;
        let frame = Duration::from_secs_f64(1.0 / options.frame_rate);

        Ok(Self {
            driver,
            scene,
            input,
            hand: SimHand {
                position: start,
                rotation: Quat::IDENTITY,
            },
            participant: Participant::new(start),
            clock: FrameClock::new(),
            timer: HighPrecisionTimer::new(),
            frame,
            options,
            training_done: 0,
            finished: false,
        })
    }

    pub fn run(mut self) -> Result<Vec<TrialResult>> {
        info!(
            trace_dir = %self.options.trace_dir.display(),
            realtime = self.options.realtime,
            "=== DELAYED POSE TARGETING SESSION ==="
        );

        while !self.finished {
            if self.clock.now() > self.options.max_seconds {
                warn!(seconds = self.options.max_seconds, "session time limit reached");
                break;
            }
            let started = Instant::now();
            match self.update() {
                Ok(()) => {}
                Err(err) if err.is_fatal() => return Err(err.into()),
                Err(err) => warn!("frame error, session continues: {err}"),
            }
            let spent = started.elapsed();
            self.timer.record_frame(spent);
            if self.options.realtime && spent < self.frame {
                self.timer.high_precision_sleep(self.frame - spent);
            }
        }

        let stats = self.timer.calibration_stats();
        info!(
            wall_seconds = self.timer.now(),
            session_seconds = self.clock.now(),
            "frame cost: {:.3} ms avg, jitter {:.3} ms, max {:.3} ms",
            stats.average_frame_time_ns / 1_000_000.0,
            stats.jitter_ns / 1_000_000.0,
            stats.max_frame_time_ns / 1_000_000.0,
        );

        let results = self.driver.shutdown()?;
        self.save_results(&results)?;
        Ok(results)
    }

    fn update(&mut self) -> Result<(), ExperimentError> {
        let dt = self.frame.as_secs_f32();
        let select = self.participant.step(&self.scene, dt);
        let exit = self.driver.scheduler().phase().is_training()
            && self.training_done >= self.options.training_trials;
        self.input.set(InputFeature::MenuButton, select);
        self.input.set(InputFeature::PrimaryButton, exit);

        self.clock.advance(self.frame);
        let pose = TrackedPose {
            position: self.participant.controller,
            rotation: Quat::IDENTITY,
            flags: PoseFlags::ALL,
        };
        let events = self.driver.update(
            &mut self.scene,
            &self.input,
            &mut self.hand,
            &self.clock,
            pose,
        )?;
        self.scene.pointer = self.hand.position;

        for event in events {
            match event {
                SchedulerEvent::TrialCompleted { trial_index }
                    if self.driver.scheduler().phase().is_training() =>
                {
                    self.training_done += 1;
                    info!(trial = trial_index, done = self.training_done, "training trial done");
                }
                SchedulerEvent::TrainingComplete => info!("measured trials begin"),
                SchedulerEvent::LatencyAdvanced { latency_ms, .. } => {
                    info!(latency_ms, overlay = %self.scene.overlay, "next latency")
                }
                SchedulerEvent::SessionComplete => self.finished = true,
                _ => {}
            }
        }
        Ok(())
    }

    fn save_results(&self, results: &[TrialResult]) -> Result<()> {
        let path = &self.options.results_path;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = File::create(path)
            .with_context(|| format!("cannot create {}", path.display()))?;
        serde_json::to_writer_pretty(file, results)?;
        info!(trials = results.len(), path = %path.display(), "results saved");
        Ok(())
    }
}
