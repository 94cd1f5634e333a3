mod common;

use std::fs;

use common::*;
use lagex_core::{Phase, TrialTemplate};
use lagex_experiment::{ExperimentConfig, SchedulerEvent, TickInput, TrialScheduler, TrialSource};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::tempdir;

type Scheduler = TrialScheduler<u32, StdRng>;

fn scheduler(config: ExperimentConfig) -> Scheduler {
    TrialScheduler::new(config, StdRng::seed_from_u64(1)).unwrap()
}

fn tick(s: &mut Scheduler, scene: &mut MockScene, input: TickInput) -> Vec<SchedulerEvent> {
    let handles = scene.handles();
    s.tick(scene, &handles, &input).unwrap()
}

/// Ends training and spawns the first measured trial.
fn enter_measured(s: &mut Scheduler, scene: &mut MockScene) {
    let events = tick(s, scene, exit(0.0));
    assert!(events.contains(&SchedulerEvent::TrainingComplete));
    tick(s, scene, at(0.01));
    assert_eq!(s.phase(), Phase::Measured);
}

/// Acquires source then target with separate presses.
fn run_trial(s: &mut Scheduler, scene: &mut MockScene, t: f64) {
    tick(s, scene, at(t));
    scene.point_at(SOURCE_TEMPLATE);
    tick(s, scene, press(t + 0.01));
    tick(s, scene, at(t + 0.02));
    scene.point_at(TARGET_TEMPLATE);
    tick(s, scene, press(t + 0.03));
    tick(s, scene, at(t + 0.04));
    scene.point_away();
}

#[test]
fn source_spawns_before_target() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();

    let events = tick(&mut s, &mut scene, at(0.0));
    assert_eq!(
        events,
        vec![
            SchedulerEvent::SourceSpawned { trial_index: 0 },
            SchedulerEvent::TargetSpawned { trial_index: 0 },
        ]
    );
    let templates: Vec<u32> = scene.spawned.iter().map(|(t, _)| *t).collect();
    assert_eq!(templates, vec![SOURCE_TEMPLATE, TARGET_TEMPLATE]);
    assert!(scene.text.starts_with("Training"));
}

#[test]
fn training_presses_do_not_trace_or_advance() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();

    run_trial(&mut s, &mut scene, 0.0);
    let state = s.state();
    assert_eq!(state.phase, Phase::Training);
    assert_eq!(state.trial_index, 0);
    // A fresh training layout is already up.
    assert!(state.source_alive && state.target_alive);
    assert_eq!(scene.destroyed.len(), 2);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn training_exit_is_level_triggered_and_clears_objects() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();

    tick(&mut s, &mut scene, at(0.0));
    assert_eq!(scene.objects.len(), 2);

    let events = tick(&mut s, &mut scene, exit(0.01));
    assert_eq!(events, vec![SchedulerEvent::TrainingComplete]);
    assert!(scene.objects.is_empty());
    let state = s.state();
    assert_eq!(state.phase, Phase::Measured);
    assert!(!state.source_alive && !state.target_alive);

    // Still held on the next tick: already measured, the first trial spawns.
    let events = tick(&mut s, &mut scene, exit(0.02));
    assert_eq!(events[0], SchedulerEvent::SourceSpawned { trial_index: 0 });
    assert!(scene.text.starts_with("Trial 1/2"));
}

#[test]
fn press_outside_source_is_ignored() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();
    enter_measured(&mut s, &mut scene);

    scene.point_away();
    let events = tick(&mut s, &mut scene, press(0.1));
    assert!(events.is_empty());
    assert!(s.state().source_alive);
    assert!(!s.is_tracing());
}

#[test]
fn acquiring_source_starts_trace() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();
    enter_measured(&mut s, &mut scene);

    scene.point_at(SOURCE_TEMPLATE);
    let events = tick(&mut s, &mut scene, press(0.1));
    assert_eq!(events, vec![SchedulerEvent::SourceAcquired { trial_index: 0 }]);
    assert!(s.is_tracing());
    let state = s.state();
    assert!(!state.source_alive && state.target_alive);

    tick(&mut s, &mut scene, at(0.2));
    tick(&mut s, &mut scene, at(0.3));
    s.finish().unwrap();

    let entry = fs::read_dir(dir.path()).unwrap().next().unwrap().unwrap();
    let name = entry.file_name().to_string_lossy().into_owned();
    assert!(name.ends_with("_trace_0.txt"), "{name}");
    let text = fs::read_to_string(entry.path()).unwrap();
    assert!(text.starts_with("Experiment: 0\nLatency: 0\n"));
    // Pointer sits where the source was: (0.75, -0.75, -0.5) in engine space.
    assert!(text.contains("0.2000; (0.8750, 0.1250, 0.2500);\n"));
    assert_eq!(text.lines().filter(|l| l.ends_with(");")).count(), 2);
}

#[test]
fn measured_target_press_retires_trial() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();
    enter_measured(&mut s, &mut scene);

    scene.point_at(SOURCE_TEMPLATE);
    tick(&mut s, &mut scene, press(0.1));
    tick(&mut s, &mut scene, at(0.2));
    let target = s.active_target().unwrap();
    scene.point_at(TARGET_TEMPLATE);

    let before = s.state();
    let events = tick(&mut s, &mut scene, press(0.9));
    let after = s.state();

    assert_eq!(events, vec![SchedulerEvent::TrialCompleted { trial_index: 0 }]);
    assert_eq!(scene.destroyed.last(), Some(&target));
    assert!(!s.is_tracing());
    assert_eq!(after.trial_index, before.trial_index + 1);
    assert!(!after.target_alive);
    assert_eq!(after.source_alive, before.source_alive);
    assert_eq!(after.phase, before.phase);
    assert_eq!(after.latency_index, before.latency_index);

    let result = &s.results()[0];
    assert_eq!(result.trial_index, 0);
    assert!((result.movement_time - 0.8).abs() < 1e-9);
    assert!(result.trace_file.is_some());
}

#[test]
fn target_press_needs_no_proximity_by_default() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();
    enter_measured(&mut s, &mut scene);

    scene.point_at(SOURCE_TEMPLATE);
    tick(&mut s, &mut scene, press(0.1));
    tick(&mut s, &mut scene, at(0.2));
    scene.point_away();
    let events = tick(&mut s, &mut scene, press(0.3));
    assert_eq!(events, vec![SchedulerEvent::TrialCompleted { trial_index: 0 }]);
}

#[test]
fn target_proximity_can_be_required() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(ExperimentConfig {
        require_target_proximity: true,
        ..config_in(dir.path())
    });
    let mut scene = MockScene::new();
    enter_measured(&mut s, &mut scene);

    scene.point_at(SOURCE_TEMPLATE);
    tick(&mut s, &mut scene, press(0.1));
    tick(&mut s, &mut scene, at(0.2));
    scene.point_away();
    assert!(tick(&mut s, &mut scene, press(0.3)).is_empty());
    assert!(s.is_tracing());

    tick(&mut s, &mut scene, at(0.4));
    scene.point_at(TARGET_TEMPLATE);
    let events = tick(&mut s, &mut scene, press(0.5));
    assert_eq!(events, vec![SchedulerEvent::TrialCompleted { trial_index: 0 }]);
}

#[test]
fn held_button_does_not_chain_source_into_target() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();
    enter_measured(&mut s, &mut scene);

    scene.point_at(SOURCE_TEMPLATE);
    tick(&mut s, &mut scene, press(0.1));
    scene.point_at(TARGET_TEMPLATE);
    for i in 0..5 {
        assert!(tick(&mut s, &mut scene, press(0.2 + i as f64 * 0.01)).is_empty());
    }
    assert!(s.state().target_alive);
    assert!(s.state().previous_button_value);
}

#[test]
fn exhausted_trials_advance_latency() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();
    tick(&mut s, &mut scene, exit(0.0));
    let trials = s.trial_count();
    s.resume_at(&mut scene, trials, 0).unwrap();

    let events = tick(&mut s, &mut scene, at(0.1));
    assert_eq!(
        events[0],
        SchedulerEvent::LatencyAdvanced {
            latency_index: 1,
            latency_ms: 100
        }
    );
    let state = s.state();
    assert_eq!(state.trial_index, 0);
    assert_eq!(state.latency_index, 1);
    assert_eq!(s.active_latency_ms(), 100);
}

#[test]
fn full_generated_sweep() {
    let dir = tempdir().unwrap();
    let config = ExperimentConfig {
        latencies_ms: vec![0, 50],
        trials: TrialSource::Generated(vec![
            TrialTemplate {
                diameter: 0.1,
                distance: 0.5,
            },
            TrialTemplate {
                diameter: 0.2,
                distance: 0.4,
            },
        ]),
        ..config_in(dir.path())
    };
    let mut s = scheduler(config);
    let mut scene = MockScene::new();
    enter_measured(&mut s, &mut scene);
    let first_round = s.experiments().to_vec();

    for round in 0..4 {
        run_trial(&mut s, &mut scene, 1.0 + round as f64);
        if round == 1 {
            assert_eq!(s.state().latency_index, 1);
            assert_ne!(s.experiments(), first_round.as_slice());
        }
    }
    // The last trial's release tick already ran the final latency transition.
    assert!(s.is_complete());
    assert!(tick(&mut s, &mut scene, at(10.0)).is_empty());
    assert_eq!(scene.text, "Session complete");
    assert!(scene.objects.is_empty());
    assert_eq!(s.active_latency_ms(), 50);

    let results = s.finish().unwrap();
    assert_eq!(results.len(), 4);
    let latencies: Vec<u32> = results.iter().map(|r| r.latency_ms).collect();
    assert_eq!(latencies, vec![0, 0, 50, 50]);
    assert!(results.iter().all(|r| r.trace_file.is_some()));

    // Nothing further spawns once the sweep is done.
    let spawned = scene.spawned.len();
    tick(&mut s, &mut scene, at(11.0));
    assert_eq!(scene.spawned.len(), spawned);
}

#[test]
fn resuming_abandons_the_trial_in_progress() {
    let dir = tempdir().unwrap();
    let mut s = scheduler(config_in(dir.path()));
    let mut scene = MockScene::new();
    enter_measured(&mut s, &mut scene);

    scene.point_at(SOURCE_TEMPLATE);
    tick(&mut s, &mut scene, press(0.1));
    assert!(s.is_tracing());

    s.resume_at(&mut scene, 1, 0).unwrap();
    assert!(scene.objects.is_empty());
    assert!(!s.is_tracing());
    let state = s.state();
    assert!(!state.source_alive && !state.target_alive);
    assert_eq!(state.trial_index, 1);

    let events = tick(&mut s, &mut scene, at(0.2));
    assert_eq!(events[0], SchedulerEvent::SourceSpawned { trial_index: 1 });
    scene.point_at(SOURCE_TEMPLATE);
    tick(&mut s, &mut scene, press(0.3));
    tick(&mut s, &mut scene, at(0.4));
    scene.point_at(TARGET_TEMPLATE);
    tick(&mut s, &mut scene, press(1.0));

    let results = s.finish().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].trial_index, 1);
    assert_eq!(results[0].source, s.experiments()[1].source_experiment_position());
    assert!((results[0].movement_time - 0.7).abs() < 1e-9);
}
