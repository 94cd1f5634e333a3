use lagex_core::{PoseFlags, PoseSample, PoseTarget, Quat, Result, TrialResult, Vec3};
use lagex_timing::Timer;
use rand::Rng;
use tracing::{debug, info};

use crate::config::ExperimentConfig;
use crate::host::{Controller, InputSource, SceneHandles, SceneHost, Unresolved};
use crate::queue::DelayedPoseQueue;
use crate::state::{SchedulerEvent, TickInput, TrialScheduler};

/// Raw tracked pose as delivered by the host this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedPose {
    pub position: Vec3,
    pub rotation: Quat,
    pub flags: PoseFlags,
}

/// Per-frame entry point: runs the trial logic and delays the controller pose.
pub struct DelayedPoseDriver<S: SceneHost, D, R> {
    config: ExperimentConfig,
    controller: Controller<D>,
    handles: Option<SceneHandles<S::Handle>>,
    unresolved: Option<Unresolved>,
    scheduler: TrialScheduler<S::Handle, R>,
    queue: DelayedPoseQueue,
}

impl<S, D, R> DelayedPoseDriver<S, D, R>
where
    S: SceneHost,
    D: Clone + std::fmt::Debug,
    R: Rng,
{
    /// Session start. Fails only when no controller matches the configured characteristics.
    pub fn new<I>(config: ExperimentConfig, input: &I, rng: R) -> Result<Self>
    where
        I: InputSource<Device = D>,
    {
        let controller = Controller::resolve(input, config.controls.controller)?;
        info!(device = ?controller.device, "controller resolved");
        let scheduler = TrialScheduler::new(config.clone(), rng)?;
        Ok(Self {
            config,
            controller,
            handles: None,
            unresolved: None,
            scheduler,
            queue: DelayedPoseQueue::new(),
        })
    }

    /// Skips the per-frame lookup when the host resolved its objects up front.
    pub fn with_handles(mut self, handles: SceneHandles<S::Handle>) -> Self {
        self.handles = Some(handles);
        self
    }

    /// One frame: resolve scene objects, run the scheduler, then push the
    /// fresh pose and apply at most one delayed pose to `target`.
    ///
    /// A scheduler error is returned only after the pose has been processed.
    pub fn update<I, T, C>(
        &mut self,
        host: &mut S,
        input: &I,
        target: &mut T,
        clock: &C,
        pose: TrackedPose,
    ) -> Result<Vec<SchedulerEvent>>
    where
        I: InputSource<Device = D>,
        T: PoseTarget + ?Sized,
        C: Timer + ?Sized,
    {
        let now = clock.now();
        let latency_before = self.scheduler.latency_index();

        if self.handles.is_none() {
            self.try_resolve(host);
        }

        let ticked = match self.handles {
            Some(handles) => {
                let tick = TickInput {
                    now,
                    select: self.controller.held(input, self.config.controls.select),
                    exit_training: self
                        .controller
                        .held(input, self.config.controls.exit_training),
                };
                self.scheduler.tick(host, &handles, &tick)
            }
            None => Ok(Vec::new()),
        };
        if self.scheduler.latency_index() != latency_before {
            self.flush();
        }

        // The pointer keeps moving even on a frame whose trial logic failed.
        self.queue
            .push(PoseSample::new(now, pose.position, pose.rotation, pose.flags));
        if let Some(sample) = self.queue.try_release(now, self.scheduler.active_latency_ms()) {
            sample.apply_to(target);
        }

        ticked
    }

    /// Moves the scheduler to another sweep position, dropping poses delayed
    /// under the previous latency.
    pub fn resume_at(&mut self, host: &mut S, trial_index: usize, latency_index: usize) -> Result<()> {
        let latency_before = self.scheduler.latency_index();
        self.scheduler.resume_at(host, trial_index, latency_index)?;
        if self.scheduler.latency_index() != latency_before {
            self.flush();
        }
        Ok(())
    }

    fn flush(&mut self) {
        debug!(dropped = self.queue.len(), "flushing delayed poses");
        self.queue.clear();
    }

    fn try_resolve(&mut self, host: &S) {
        match SceneHandles::resolve(host, &self.config.handles) {
            Ok(handles) => {
                info!("scene objects resolved");
                self.handles = Some(handles);
                self.unresolved = None;
            }
            Err(unresolved) => {
                if self.unresolved.as_ref() != Some(&unresolved) {
                    debug!(missing = ?unresolved.missing, "scene objects not available yet");
                }
                self.unresolved = Some(unresolved);
            }
        }
    }

    pub fn scheduler(&self) -> &TrialScheduler<S::Handle, R> {
        &self.scheduler
    }

    pub fn queue(&self) -> &DelayedPoseQueue {
        &self.queue
    }

    pub fn handles(&self) -> Option<&SceneHandles<S::Handle>> {
        self.handles.as_ref()
    }

    pub fn controller(&self) -> &Controller<D> {
        &self.controller
    }

    /// Session teardown: closes the trace and returns the measured results.
    pub fn shutdown(&mut self) -> Result<Vec<TrialResult>> {
        self.queue.clear();
        self.scheduler.finish()
    }
}
