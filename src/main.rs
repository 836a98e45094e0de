use pbr::ProgressBar;
use reachsim::config;
use reachsim::output;
use reachsim::runner::{RunOutcome, SimulationRunner};
use std::sync::atomic::AtomicBool;
use std::sync::Mutex;
use uuid::Uuid;

fn main() {
    tracing_subscriber::fmt::init();

    let conf = config::load_config();
    let debug = conf.debug;
    let days = (conf.scenario.steps * conf.scenario.reps) as u64;

    let runner = match SimulationRunner::new(conf.scenario) {
        Ok(runner) => runner.with_workers(conf.workers),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let run_id = Uuid::new_v4();
    let cancel = AtomicBool::new(false);

    let outcome = if debug {
        let pb = Mutex::new(ProgressBar::new(days));
        let report = |fraction: f32| {
            pb.lock().unwrap().set((fraction * days as f32) as u64);
        };
        let outcome = runner.run(run_id, Some(&report), &cancel);
        pb.lock().unwrap().finish();
        outcome
    } else {
        runner.run(run_id, None, &cancel)
    };

    match outcome {
        Ok(RunOutcome::Done(result)) => {
            let path = output::save(&result, runner.config()).expect("unable to write results");
            println!("Wrote output to {:?}", path);
        }
        Ok(RunOutcome::Cancelled {
            days_done,
            days_total,
        }) => {
            println!("Cancelled after {}/{} simulated days", days_done, days_total);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    }
}
