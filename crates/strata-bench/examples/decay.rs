//! End-to-end run of the decay profile.
//!
//! Demonstrates: build profile → BlockScheduler → run → inspect per-block
//! statistics → compare with the exact solution. Set `RUST_LOG=debug` to
//! see per-iteration residuals.

use strata_bench::decay_profile;
use strata_engine::{BlockScheduler, RunError};
use strata_problems::exact_solution;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    println!("=== Strata Decay Example ===\n");

    for levels in 1..=3 {
        let mut scheduler = BlockScheduler::new(decay_profile(4, levels)).unwrap();
        let report = match scheduler.run(&[1.0], 0.0, 3.0) {
            Ok(report) => report,
            Err(RunError::NonTermination(nt)) => {
                println!(
                    "  levels={levels}: block {} stopped after {} iterations, {} slots pending",
                    nt.block,
                    nt.iterations,
                    nt.pending.len(),
                );
                continue;
            }
            Err(e) => panic!("run failed: {e}"),
        };

        println!("levels={levels}: {} blocks", report.blocks.len());
        for block in &report.blocks {
            println!(
                "  block {} t0={:>5.2}: iterations={}, sweeps={:>4}, predictor={:>3}, messages={:>4}, time={:>6}μs",
                block.block,
                block.t0,
                block.iterations,
                block.total_sweeps(),
                block.predictor_sweeps,
                block.messages,
                block.total_us,
            );
        }
        let exact = exact_solution(&[-1.0], &[1.0], report.final_time);
        println!(
            "  u({:.2}) = {:.15}, exact {:.15}, error {:.2e}\n",
            report.final_time,
            report.final_value[0],
            exact[0],
            (report.final_value[0] - exact[0]).abs(),
        );
    }

    println!("Done.");
}
