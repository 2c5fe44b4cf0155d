//! Integration test: full runs over the reference linear ODE.
//!
//! Exercises the scheduler, controller, predictor and both channel
//! backends together, and checks the restart contract from the outside.

use strata_core::{IterationId, SlotIndex};
use strata_engine::{BlockScheduler, ChannelKind, Controller, SolverConfig, SweepSchedule};
use strata_problems::{exact_solution, linear_ode_stack};

fn decay_config(slots: usize, node_counts: &[usize], dt: f64) -> SolverConfig {
    let stacks = (0..slots)
        .map(|_| linear_ode_stack(&[-1.0], node_counts).unwrap())
        .collect();
    SolverConfig::new(stacks, dt)
}

#[test]
fn four_slots_two_levels_one_block() {
    let mut cfg = decay_config(4, &[5, 3], 1.0);
    cfg.tolerance = 1e-8;
    cfg.max_iterations = 20;
    let mut scheduler = BlockScheduler::new(cfg).unwrap();

    let report = scheduler.run(&[1.0], 0.0, 4.0).unwrap();

    assert_eq!(report.final_time, 4.0);
    assert_eq!(report.blocks.len(), 1);
    let block = &report.blocks[0];
    assert_eq!(block.active_slots, 4);
    assert!(block.iterations <= 20);
    assert!(block.residuals.iter().all(|&r| r <= 1e-8));
    for p in 0..4 {
        let slice = scheduler.controller().slice(SlotIndex(p)).unwrap();
        assert!(slice.is_done(), "slot {p} not done");
    }
    assert!((report.final_value[0] - (-4.0f64).exp()).abs() < 1e-12);
    assert_eq!(scheduler.slot_time(SlotIndex(0)), Some(4.0));
}

#[test]
fn three_levels_several_blocks_track_exact_solution() {
    let rates = [-1.0, -0.25, 0.5];
    let stacks = (0..3)
        .map(|_| linear_ode_stack(&rates, &[9, 5, 3]).unwrap())
        .collect();
    let mut cfg = SolverConfig::new(stacks, 0.25);
    cfg.sweeps = SweepSchedule::with_finer(&[2, 2]).into();
    cfg.tolerance = 1e-12;
    let mut scheduler = BlockScheduler::new(cfg).unwrap();

    let u0 = [1.0, 2.0, -1.0];
    let report = scheduler.run(&u0, 0.0, 2.25).unwrap();

    assert_eq!(report.blocks.len(), 3);
    assert_eq!(report.final_time, 2.25);
    let exact = exact_solution(&rates, &u0, 2.25);
    for (got, want) in report.final_value.iter().zip(&exact) {
        assert!((got - want).abs() < 1e-12, "got {got}, want {want}");
    }
}

#[test]
fn mailbox_backend_matches_tag_table() {
    let run = |kind: ChannelKind| {
        let mut cfg = decay_config(4, &[5, 3, 2], 0.5);
        cfg.channel = kind;
        let mut scheduler = BlockScheduler::new(cfg).unwrap();
        scheduler.run(&[1.0], 0.0, 5.0).unwrap()
    };
    let table = run(ChannelKind::TagTable);
    let mailbox = run(ChannelKind::Mailbox);

    assert_eq!(table.final_value[0].to_bits(), mailbox.final_value[0].to_bits());
    assert_eq!(table.total_iterations(), mailbox.total_iterations());
    assert_eq!(table.total_messages(), mailbox.total_messages());
    assert_eq!(table.total_sweeps(), mailbox.total_sweeps());
}

#[test]
fn restart_resets_and_copies_carried_value() {
    let mut controller = Controller::new(decay_config(2, &[5, 3], 1.0)).unwrap();
    let active = [SlotIndex(0), SlotIndex(1)];

    controller.restart(&active, &[0.0, 1.0], &[1.0]).unwrap();
    controller.run_block(Default::default()).unwrap();
    assert!(controller.slice(SlotIndex(1)).unwrap().is_done());

    let carried = vec![0.75];
    controller.restart(&active, &[5.0, 6.0], &carried).unwrap();
    for (slot, t0) in active.iter().zip([5.0, 6.0]) {
        let slice = controller.slice(*slot).unwrap();
        assert_eq!(slice.iteration(), IterationId::PREDICTOR);
        assert!(!slice.is_done());
        assert_eq!(slice.t0(), t0);
        assert_eq!(slice.finest().initial_value(), carried.as_slice());
    }

    for slot in active {
        let finest = controller.slice_mut(slot).unwrap().finest_mut();
        finest.set_initial_value(&[-3.0]);
        finest.values_mut().fill(42.0);
    }
    assert_eq!(carried, vec![0.75]);
}

#[test]
fn restarted_block_starts_from_carried_value() {
    let mut controller = Controller::new(decay_config(2, &[5, 3], 1.0)).unwrap();
    let active = [SlotIndex(0), SlotIndex(1)];
    controller.restart(&active, &[5.0, 6.0], &[2.0]).unwrap();
    controller.run_block(Default::default()).unwrap();
    let end = controller.result().unwrap();
    assert!((end[0] - 2.0 * (-2.0f64).exp()).abs() < 1e-12);
}
