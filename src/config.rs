use crate::error::EngineError;
use crate::funnel::{Metric, METRICS};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::BufReader;
use strum_macros::Display;

pub const N_CHANNELS: usize = 3;

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[strum(serialize = "sns")]
    Sns,
    #[strum(serialize = "video")]
    Video,
    #[strum(serialize = "search")]
    Search,
}

pub const CHANNELS: [Channel; N_CHANNELS] = [Channel::Sns, Channel::Video, Channel::Search];

impl Channel {
    pub fn index(self) -> usize {
        match self {
            Channel::Sns => 0,
            Channel::Video => 1,
            Channel::Search => 2,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct MediaChannelConfig {
    // Budget share of total reach. Shares are renormalized internally so
    // non-normalized input is tolerated.
    pub share: f32,

    // Effect coefficient, also the adstock gain
    pub alpha: f32,

    // Adstock carry-over per day
    #[serde(default = "default_memory")]
    pub memory: f32,
}

fn default_memory() -> f32 {
    0.8
}

impl MediaChannelConfig {
    pub fn new(share: f32, alpha: f32) -> MediaChannelConfig {
        MediaChannelConfig {
            share,
            alpha,
            memory: default_memory(),
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct MediaMix {
    pub sns: MediaChannelConfig,
    pub video: MediaChannelConfig,
    pub search: MediaChannelConfig,
}

impl Default for MediaMix {
    fn default() -> MediaMix {
        MediaMix {
            sns: MediaChannelConfig::new(0.5, 0.03),
            video: MediaChannelConfig::new(0.3, 0.02),
            search: MediaChannelConfig::new(0.2, 0.01),
        }
    }
}

impl MediaMix {
    pub fn channel(&self, ch: Channel) -> &MediaChannelConfig {
        match ch {
            Channel::Sns => &self.sns,
            Channel::Video => &self.video,
            Channel::Search => &self.search,
        }
    }

    // Shares renormalized to sum to 1. An all-zero mix is allowed and
    // disables media entirely.
    pub fn normalized_shares(&self) -> [f32; N_CHANNELS] {
        let total: f32 = CHANNELS.iter().map(|ch| self.channel(*ch).share).sum();
        if total <= 0. {
            return [0.; N_CHANNELS];
        }
        let mut shares = [0.; N_CHANNELS];
        for ch in CHANNELS.iter() {
            shares[ch.index()] = self.channel(*ch).share / total;
        }
        shares
    }
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct WomConfig {
    // Probability that a high-funnel agent generates word of mouth
    pub p_generate: f32,

    // Decay factor, scales the daily forgetting probability
    pub decay: f32,

    // Optional weight of trait similarity in the WoM bonus (off when absent)
    #[serde(default)]
    pub personality_weight: Option<f32>,

    // Optional override for the demographic similarity scale (0.3 default)
    #[serde(default)]
    pub demographic_weight: Option<f32>,
}

impl Default for WomConfig {
    fn default() -> WomConfig {
        WomConfig {
            p_generate: 0.08,
            decay: 0.9,
            personality_weight: None,
            demographic_weight: None,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(rename_all = "snake_case")]
pub enum NetworkType {
    Random,
    SmallWorld,
    ScaleFree,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct NetworkConfig {
    #[serde(rename = "type")]
    pub kind: NetworkType,

    // Number of nodes
    pub n: usize,

    // Target average degree
    pub k: usize,

    // Rewiring probability, small_world only
    #[serde(default = "default_beta")]
    pub beta: f32,
}

fn default_beta() -> f32 {
    0.1
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct PersonalityConfig {
    pub openness: f32,
    pub social_influence: f32,
    pub media_affinity: f32,
    pub risk_tolerance: f32,
}

impl Default for PersonalityConfig {
    fn default() -> PersonalityConfig {
        PersonalityConfig {
            openness: 0.5,
            social_influence: 0.5,
            media_affinity: 0.5,
            risk_tolerance: 0.5,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct DemographicConfig {
    // Age group, 1 (18-24) to 5 (55+)
    pub age_group: u8,

    // Income level, 1 to 5
    pub income_level: u8,

    // Urban (1) to rural (0) spectrum
    pub urban_rural: f32,

    // Education level, 1 to 5
    pub education_level: u8,
}

impl Default for DemographicConfig {
    fn default() -> DemographicConfig {
        DemographicConfig {
            age_group: 3,
            income_level: 3,
            urban_rural: 0.5,
            education_level: 3,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct InfluencerConfig {
    pub enabled: bool,

    // Fraction of the population marked as influencers
    pub ratio: f32,

    // Applied to an influencer's outgoing WoM strength
    pub multiplier: f32,
}

impl Default for InfluencerConfig {
    fn default() -> InfluencerConfig {
        InfluencerConfig {
            enabled: true,
            ratio: 0.02,
            multiplier: 3.0,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Debug)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Brand,
    Service,
    Campaign,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct KpiConfig {
    #[serde(default = "all_metrics")]
    pub categories: Vec<Metric>,

    #[serde(default = "default_granularity")]
    pub granularity: Granularity,
}

fn all_metrics() -> Vec<Metric> {
    METRICS.to_vec()
}

fn default_granularity() -> Granularity {
    Granularity::Brand
}

impl Default for KpiConfig {
    fn default() -> KpiConfig {
        KpiConfig {
            categories: all_metrics(),
            granularity: default_granularity(),
        }
    }
}

/// Fully-resolved scenario configuration. Immutable for the duration of a
/// run; validated before any simulation work starts.
#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub kpi: KpiConfig,

    #[serde(default)]
    pub media: MediaMix,

    #[serde(default)]
    pub wom: WomConfig,

    pub network: NetworkConfig,

    #[serde(default)]
    pub personality: PersonalityConfig,

    #[serde(default)]
    pub demographics: DemographicConfig,

    #[serde(default)]
    pub influencers: InfluencerConfig,

    // Simulated days per repetition
    pub steps: usize,

    // Independent stochastic repetitions to average over
    #[serde(default = "default_reps")]
    pub reps: usize,

    pub seed: u64,
}

fn default_reps() -> usize {
    1
}

fn check_unit(name: &str, v: f32) -> Result<(), EngineError> {
    if !v.is_finite() || v < 0. || v > 1. {
        return Err(EngineError::InvalidScenarioConfig(format!(
            "{} must be in [0, 1], got {}",
            name, v
        )));
    }
    Ok(())
}

fn check_level(name: &str, v: u8) -> Result<(), EngineError> {
    if v < 1 || v > 5 {
        return Err(EngineError::InvalidScenarioConfig(format!(
            "{} must be in 1..=5, got {}",
            name, v
        )));
    }
    Ok(())
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        self.validate_network()?;

        for ch in CHANNELS.iter() {
            let c = self.media.channel(*ch);
            if !c.share.is_finite() || c.share < 0. {
                return Err(EngineError::InvalidScenarioConfig(format!(
                    "{} share must be finite and non-negative, got {}",
                    ch, c.share
                )));
            }
            check_unit(&format!("{} alpha", ch), c.alpha)?;
            check_unit(&format!("{} memory", ch), c.memory)?;
        }

        check_unit("wom.p_generate", self.wom.p_generate)?;
        check_unit("wom.decay", self.wom.decay)?;
        if let Some(w) = self.wom.personality_weight {
            check_unit("wom.personality_weight", w)?;
        }
        if let Some(w) = self.wom.demographic_weight {
            check_unit("wom.demographic_weight", w)?;
        }

        check_unit("personality.openness", self.personality.openness)?;
        check_unit(
            "personality.social_influence",
            self.personality.social_influence,
        )?;
        check_unit("personality.media_affinity", self.personality.media_affinity)?;
        check_unit("personality.risk_tolerance", self.personality.risk_tolerance)?;

        check_level("demographics.age_group", self.demographics.age_group)?;
        check_level("demographics.income_level", self.demographics.income_level)?;
        check_level(
            "demographics.education_level",
            self.demographics.education_level,
        )?;
        check_unit("demographics.urban_rural", self.demographics.urban_rural)?;

        check_unit("influencers.ratio", self.influencers.ratio)?;
        if !self.influencers.multiplier.is_finite()
            || self.influencers.multiplier < 1.
            || self.influencers.multiplier > 10.
        {
            return Err(EngineError::InvalidScenarioConfig(format!(
                "influencers.multiplier must be in [1, 10], got {}",
                self.influencers.multiplier
            )));
        }

        if self.steps == 0 {
            return Err(EngineError::InvalidScenarioConfig(
                "steps must be at least 1".into(),
            ));
        }
        if self.reps == 0 {
            return Err(EngineError::InvalidScenarioConfig(
                "reps must be at least 1".into(),
            ));
        }
        if self.kpi.categories.is_empty() {
            return Err(EngineError::InvalidScenarioConfig(
                "kpi.categories must not be empty".into(),
            ));
        }

        Ok(())
    }

    fn validate_network(&self) -> Result<(), EngineError> {
        let net = &self.network;
        if net.n < 2 {
            return Err(EngineError::InvalidNetworkConfig(format!(
                "n must be at least 2, got {}",
                net.n
            )));
        }
        if net.k < 2 || net.k >= net.n {
            return Err(EngineError::InvalidNetworkConfig(format!(
                "k must satisfy 2 <= k < n, got k={} n={}",
                net.k, net.n
            )));
        }
        if !net.beta.is_finite() || net.beta < 0. || net.beta > 1. {
            return Err(EngineError::InvalidNetworkConfig(format!(
                "beta must be in [0, 1], got {}",
                net.beta
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CLI-side configuration: config.yaml plus environment overrides.

#[derive(Deserialize, Clone, Debug)]
pub struct AppConfig {
    pub scenario: ScenarioConfig,

    // Worker pool size for repetitions, 0 = one per core
    #[serde(default)]
    pub workers: usize,

    #[serde(default)]
    pub debug: bool,
}

pub fn load_config() -> AppConfig {
    let file = File::open("config.yaml").expect("could not open config.yaml");
    let reader = BufReader::new(file);
    let mut conf: AppConfig = serde_yaml::from_reader(reader).expect("error while reading yaml");

    if let Ok(steps) = env::var("STEPS") {
        conf.scenario.steps = steps.parse().expect("STEPS must be an integer");
    }
    if let Ok(reps) = env::var("REPS") {
        conf.scenario.reps = reps.parse().expect("REPS must be an integer");
    }
    if let Ok(seed) = env::var("SEED") {
        conf.scenario.seed = seed.parse().expect("SEED must be an integer");
    }
    if let Ok(workers) = env::var("WORKERS") {
        conf.workers = workers.parse().expect("WORKERS must be an integer");
    }
    if let Ok(debug) = env::var("DEBUG") {
        conf.debug = debug == "1";
    }

    conf
}
