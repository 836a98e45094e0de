use crate::config::ScenarioConfig;
use crate::funnel::{Metric, N_METRICS};
use itertools::Itertools;
use serde::Serialize;
use uuid::Uuid;

/// Per-day stage counts for one completed repetition. `counts[day][metric]`
/// is the number of agents at or beyond the metric's threshold stage; day 0
/// is the initial state before any step.
#[derive(Debug, Clone, PartialEq)]
pub struct RepetitionSeries {
    pub rep: usize,
    pub counts: Vec<[usize; N_METRICS]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayMetricPoint {
    pub day: usize,
    pub metric: Metric,
    // Mean count over repetitions
    pub value: f64,
    // Sample variance over repetitions, 0 for a single repetition
    pub variance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricSummary {
    pub metric: Metric,
    pub start: f64,
    pub end: f64,
    pub delta: f64,
}

/// Aggregated output of a run: the reportable time series, averaged over
/// repetitions. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub series: Vec<DayMetricPoint>,
    pub summary: Vec<MetricSummary>,
}

fn mean_and_variance(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = if values.len() > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.)
    } else {
        0.
    };
    (mean, variance)
}

// Merge repetition series into the reportable result. Repetitions are
// folded in rep order so the result is identical however they were
// scheduled. Only the scenario's configured KPI categories are reported.
pub fn aggregate(run_id: Uuid, conf: &ScenarioConfig, reps: &[RepetitionSeries]) -> RunResult {
    let days = conf.steps + 1;
    let metrics: Vec<Metric> = conf.kpi.categories.iter().cloned().unique().collect();

    let mut series = Vec::with_capacity(days * metrics.len());
    for day in 0..days {
        for metric in metrics.iter() {
            let values: Vec<f64> = reps
                .iter()
                .map(|r| r.counts[day][metric.index()] as f64)
                .collect();
            let (value, variance) = mean_and_variance(&values);
            series.push(DayMetricPoint {
                day,
                metric: *metric,
                value,
                variance,
            });
        }
    }

    let summary = metrics
        .iter()
        .map(|metric| {
            let per_day: Vec<&DayMetricPoint> = series
                .iter()
                .filter(|p| p.metric == *metric)
                .collect();
            let start = per_day.first().map(|p| p.value).unwrap_or(0.);
            let end = per_day.last().map(|p| p.value).unwrap_or(0.);
            MetricSummary {
                metric: *metric,
                start,
                end,
                delta: end - start,
            }
        })
        .collect();

    RunResult {
        run_id,
        series,
        summary,
    }
}
