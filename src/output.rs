use crate::aggregate::RunResult;
use crate::config::ScenarioConfig;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

// Write a completed run under runs/<timestamp>/ and point runs/latest at it.
pub fn save(result: &RunResult, conf: &ScenarioConfig) -> std::io::Result<PathBuf> {
    let now: DateTime<Utc> = Utc::now();
    let now_str = now.format("%Y.%m.%d.%H.%M.%S").to_string();
    let results = json!({
        "run_id": result.run_id,
        "series": result.series,
        "summary": result.summary,
        "meta": {
            "name": conf.name,
            "seed": conf.seed,
            "steps": conf.steps,
            "reps": conf.reps,
            "population": conf.network.n,
            "granularity": conf.kpi.granularity,
        }
    })
    .to_string();

    let dir = format!("runs/{}", now_str);
    let path = Path::new(&dir);
    fs::create_dir_all(path)?;
    fs::write(path.join("output.json"), results)?;

    let run_path = Path::new(&now_str);
    let latest_path = Path::new("runs/latest");
    if fs::symlink_metadata(latest_path).is_ok() {
        fs::remove_file(latest_path)?;
    }
    symlink(run_path, latest_path)?;

    // Keep the scenario next to its results
    if Path::new("config.yaml").exists() {
        fs::copy("config.yaml", path.join("config.yaml"))?;
    }

    Ok(path.to_path_buf())
}
