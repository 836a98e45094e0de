use crate::config::{Channel, ScenarioConfig, N_CHANNELS};
use crate::funnel::FunnelStage;
use crate::util;
use rand::rngs::StdRng;
use rand::Rng;
use strum_macros::Display;

pub type AgentId = usize;

// Rogers diffusion-of-innovations adoption curve
#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdopterSegment {
    #[strum(serialize = "innovator")]
    Innovator,
    #[strum(serialize = "early_adopter")]
    EarlyAdopter,
    #[strum(serialize = "early_majority")]
    EarlyMajority,
    #[strum(serialize = "late_majority")]
    LateMajority,
    #[strum(serialize = "laggard")]
    Laggard,
}

impl AdopterSegment {
    // Beta parameters for (openness, social_influence, risk_tolerance)
    fn trait_params(self) -> [(f32, f32); 3] {
        match self {
            AdopterSegment::Innovator => [(8., 2.), (2., 8.), (7., 3.)],
            AdopterSegment::EarlyAdopter => [(6., 4.), (3., 7.), (6., 4.)],
            AdopterSegment::EarlyMajority => [(4., 6.), (6., 4.), (4., 6.)],
            AdopterSegment::LateMajority => [(3., 7.), (7., 3.), (3., 7.)],
            AdopterSegment::Laggard => [(2., 8.), (8., 2.), (2., 8.)],
        }
    }
}

fn sample_segment(rng: &mut StdRng) -> AdopterSegment {
    let roll: f32 = rng.gen();
    if roll < 0.025 {
        AdopterSegment::Innovator
    } else if roll < 0.16 {
        AdopterSegment::EarlyAdopter
    } else if roll < 0.5 {
        AdopterSegment::EarlyMajority
    } else if roll < 0.84 {
        AdopterSegment::LateMajority
    } else {
        AdopterSegment::Laggard
    }
}

static AGE_WEIGHTS: [(u8, f32); 5] = [(1, 0.15), (2, 0.20), (3, 0.25), (4, 0.25), (5, 0.15)];
static INCOME_WEIGHTS: [(u8, f32); 5] = [(1, 0.15), (2, 0.20), (3, 0.30), (4, 0.25), (5, 0.10)];
static EDUCATION_WEIGHTS: [(u8, f32); 5] = [(1, 0.05), (2, 0.15), (3, 0.35), (4, 0.30), (5, 0.15)];

#[derive(Debug, Clone, PartialEq)]
pub struct Agent {
    pub id: AgentId,
    pub stage: FunnelStage,
    pub days_in_stage: usize,

    pub segment: AdopterSegment,

    // Latent traits, all in [0, 1]
    pub openness: f32,
    pub social_influence: f32,
    pub media_affinity: f32,
    pub risk_tolerance: f32,

    // Demographics
    pub age_group: u8,
    pub income_level: u8,
    pub education_level: u8,
    pub urban_rural: f32,

    pub is_influencer: bool,

    // Derived traits, fixed at creation
    pub receptivity: f32,
    pub influence: f32,
    pub interest_propensity: f32,

    // Exposure memory
    pub adstock: [f32; N_CHANNELS],
    pub media_exposures: usize,
    pub days_since_exposure: usize,
    pub wom_received: usize,
}

impl Agent {
    pub fn new(id: AgentId, conf: &ScenarioConfig, rng: &mut StdRng) -> Agent {
        let segment = sample_segment(rng);
        let params = segment.trait_params();
        let openness = util::beta_around(params[0].0, params[0].1, conf.personality.openness, rng);
        let social_influence =
            util::beta_around(params[1].0, params[1].1, conf.personality.social_influence, rng);
        let risk_tolerance =
            util::beta_around(params[2].0, params[2].1, conf.personality.risk_tolerance, rng);
        let media_affinity = util::beta_around(3., 3., conf.personality.media_affinity, rng);

        let age_group = util::shifted_level(&AGE_WEIGHTS, conf.demographics.age_group, rng);
        let income_level = util::shifted_level(&INCOME_WEIGHTS, conf.demographics.income_level, rng);
        // Skewed toward urban
        let urban_rural = util::beta_around(6., 4., conf.demographics.urban_rural, rng);
        let education_level =
            util::shifted_level(&EDUCATION_WEIGHTS, conf.demographics.education_level, rng);

        let is_influencer = if conf.influencers.enabled {
            // Innovators and early adopters are far more likely to be marked
            let p = match segment {
                AdopterSegment::Innovator | AdopterSegment::EarlyAdopter => {
                    conf.influencers.ratio * 3.
                }
                _ => conf.influencers.ratio * 0.5,
            };
            rng.gen::<f32>() < p
        } else {
            false
        };

        let receptivity =
            util::clamp01(media_affinity * 0.7 + openness * 0.3 + urban_rural * 0.1);
        let influence = util::clamp01(
            social_influence * 0.4
                + education_level as f32 / 5. * 0.3
                + income_level as f32 / 5. * 0.3,
        );
        let interest_propensity = util::clamp01(
            openness * 0.6
                + risk_tolerance * 0.4
                + (6 - age_group) as f32 / 5. * 0.2
                + education_level as f32 / 5. * 0.1,
        );

        Agent {
            id,
            stage: FunnelStage::Unaware,
            days_in_stage: 0,
            segment,
            openness,
            social_influence,
            media_affinity,
            risk_tolerance,
            age_group,
            income_level,
            education_level,
            urban_rural,
            is_influencer,
            receptivity,
            influence,
            interest_propensity,
            adstock: [0.; N_CHANNELS],
            media_exposures: 0,
            days_since_exposure: 1000,
            wom_received: 0,
        }
    }

    pub fn advance_stage(&mut self) {
        let next = self.stage.advance();
        if next != self.stage {
            self.stage = next;
            self.days_in_stage = 0;
        }
    }

    pub fn regress_stage(&mut self) {
        let prev = self.stage.regress();
        if prev != self.stage {
            self.stage = prev;
            self.days_in_stage = 0;
        }
    }

    // Openness erodes slightly with repeated exposure (habituation)
    pub fn current_openness(&self) -> f32 {
        let habituation = 1. - self.media_exposures as f32 * 0.001;
        self.openness * f32::max(0.5, habituation)
    }

    // Recent exposure temporarily lifts receptivity
    pub fn current_receptivity(&self) -> f32 {
        let boost = if self.days_since_exposure < 5 {
            0.1 * (5 - self.days_since_exposure) as f32 / 5.
        } else {
            0.
        };
        f32::min(1., self.receptivity + boost)
    }

    // Channel-specific reach modifier from demographics
    pub fn channel_modifier(&self, channel: Channel) -> f32 {
        let age_factor = (6 - self.age_group) as f32 / 5.;
        let income_factor = self.income_level as f32 / 5.;
        let edu_factor = self.education_level as f32 / 5.;
        match channel {
            // Younger, urban, higher-education skew
            Channel::Sns => 0.5 + (age_factor + self.urban_rural + edu_factor) * 0.3,
            // Broad-based with a mild youth/income boost
            Channel::Video => 0.7 + age_factor * 0.3 + income_factor * 0.2,
            // Education and income driven
            Channel::Search => 0.6 + edu_factor * 0.4 + income_factor * 0.3,
        }
    }

    pub fn demographic_similarity(&self, other: &Agent) -> f32 {
        let age_sim = f32::max(
            0.,
            1. - (self.age_group as f32 - other.age_group as f32).abs() / 4.,
        );
        let income_sim = f32::max(
            0.,
            1. - (self.income_level as f32 - other.income_level as f32).abs() / 4.,
        );
        let urban_sim = f32::max(0., 1. - (self.urban_rural - other.urban_rural).abs());
        age_sim * 0.4 + income_sim * 0.3 + urban_sim * 0.3
    }

    pub fn trait_similarity(&self, other: &Agent) -> f32 {
        let diff = (self.openness - other.openness).abs()
            + (self.social_influence - other.social_influence).abs()
            + (self.media_affinity - other.media_affinity).abs()
            + (self.risk_tolerance - other.risk_tolerance).abs();
        1. - diff / 4.
    }
}

pub fn generate_population(conf: &ScenarioConfig, rng: &mut StdRng) -> Vec<Agent> {
    (0..conf.network.n).map(|i| Agent::new(i, conf, rng)).collect()
}
