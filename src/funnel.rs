use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// Customer funnel stages, ordered. Within a repetition an agent's stage only
/// moves forward, except the forgetting step which may move Liking/Intent
/// down one stage.
#[derive(
    Display, EnumIter, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FunnelStage {
    #[strum(serialize = "unaware")]
    Unaware,
    #[strum(serialize = "aware")]
    Aware,
    #[strum(serialize = "interested")]
    Interested,
    #[strum(serialize = "knowledgeable")]
    Knowledgeable,
    #[strum(serialize = "liking")]
    Liking,
    #[strum(serialize = "intent")]
    Intent,
    #[strum(serialize = "adopted")]
    Adopted,
}

impl FunnelStage {
    pub fn advance(self) -> FunnelStage {
        use FunnelStage::*;
        match self {
            Unaware => Aware,
            Aware => Interested,
            Interested => Knowledgeable,
            Knowledgeable => Liking,
            Liking => Intent,
            Intent => Adopted,
            Adopted => Adopted,
        }
    }

    pub fn regress(self) -> FunnelStage {
        use FunnelStage::*;
        match self {
            Unaware => Unaware,
            Aware => Unaware,
            Interested => Aware,
            Knowledgeable => Interested,
            Liking => Knowledgeable,
            Intent => Liking,
            Adopted => Intent,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

pub const N_METRICS: usize = 5;

/// Reportable KPI categories. A day's value for a metric is the count of
/// agents at or beyond the threshold stage.
#[derive(
    Display, EnumIter, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[strum(serialize = "awareness")]
    Awareness,
    #[strum(serialize = "interest")]
    Interest,
    #[strum(serialize = "knowledge")]
    Knowledge,
    #[strum(serialize = "liking")]
    Liking,
    #[strum(serialize = "intent")]
    Intent,
}

pub const METRICS: [Metric; N_METRICS] = [
    Metric::Awareness,
    Metric::Interest,
    Metric::Knowledge,
    Metric::Liking,
    Metric::Intent,
];

impl Metric {
    pub fn threshold(self) -> FunnelStage {
        match self {
            Metric::Awareness => FunnelStage::Aware,
            Metric::Interest => FunnelStage::Interested,
            Metric::Knowledge => FunnelStage::Knowledgeable,
            Metric::Liking => FunnelStage::Liking,
            Metric::Intent => FunnelStage::Intent,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Metric::Awareness => 0,
            Metric::Interest => 1,
            Metric::Knowledge => 2,
            Metric::Liking => 3,
            Metric::Intent => 4,
        }
    }
}
