use crate::agent::{generate_population, Agent};
use crate::config::{ScenarioConfig, N_CHANNELS};
use crate::error::EngineError;
use crate::funnel::{FunnelStage, METRICS, N_METRICS};
use crate::media;
use crate::network::NetworkGraph;
use crate::wom;
use rand::rngs::StdRng;
use rand::Rng;
use tracing::debug;

// Base daily probability of slipping back one stage
const FORGET_RATE: f32 = 0.01;

// Daily chance for an engaged but unprompted agent to move on its own
const NATURAL_PROGRESSION_RATE: f32 = 0.02;

pub(crate) fn forgetting_probability(days_in_stage: usize, decay: f32) -> f32 {
    FORGET_RATE * (1. + days_in_stage as f32 * 0.1) * decay
}

/// One repetition of a scenario: a population attached to a contact graph,
/// stepped one simulated day at a time. All stochastic state comes from the
/// repetition generator passed into `new` and `step`, consumed in a fixed
/// order (network, population, then per day: forgetting, media, WoM,
/// natural progression) so a repetition is fully reproducible from its
/// sub-seed.
pub struct Simulation {
    pub network: NetworkGraph,
    pub agents: Vec<Agent>,
    shares: [f32; N_CHANNELS],
    pub day: usize,
}

impl Simulation {
    pub fn new(conf: &ScenarioConfig, rng: &mut StdRng) -> Result<Simulation, EngineError> {
        let network = NetworkGraph::generate(&conf.network, rng)?;
        let agents = generate_population(conf, rng);
        Ok(Simulation {
            network,
            agents,
            shares: conf.media.normalized_shares(),
            day: 0,
        })
    }

    // Advance one simulated day. Per agent the net forward movement is at
    // most one stage from media plus one from WoM; natural progression only
    // fires for agents whose stage did not change today.
    pub fn step(&mut self, conf: &ScenarioConfig, rng: &mut StdRng) {
        self.day += 1;
        let n = self.agents.len();
        let mut changed = vec![false; n];

        for a in &mut self.agents {
            a.days_in_stage += 1;
            a.days_since_exposure = a.days_since_exposure.saturating_add(1);
        }

        // Forgetting: only Liking/Intent slip, so nobody drops below Aware
        for (i, a) in self.agents.iter_mut().enumerate() {
            if a.stage == FunnelStage::Liking || a.stage == FunnelStage::Intent {
                let p = forgetting_probability(a.days_in_stage, conf.wom.decay);
                let roll: f32 = rng.gen();
                if roll < p {
                    a.regress_stage();
                    changed[i] = true;
                }
            }
        }

        // Media exposure
        for (i, a) in self.agents.iter_mut().enumerate() {
            if media::expose(a, &conf.media, &self.shares, rng) {
                changed[i] = true;
            }
        }

        // Word of mouth, sourced from the post-media snapshot
        let snapshot: Vec<FunnelStage> = self.agents.iter().map(|a| a.stage).collect();
        let advanced = wom::diffuse(
            &mut self.agents,
            &snapshot,
            &self.network,
            &conf.wom,
            &conf.influencers,
            rng,
        );
        for (i, adv) in advanced.iter().enumerate() {
            if *adv {
                changed[i] = true;
            }
        }

        // Natural progression for untouched early-funnel agents
        for (i, a) in self.agents.iter_mut().enumerate() {
            if changed[i] {
                continue;
            }
            if a.stage == FunnelStage::Aware || a.stage == FunnelStage::Interested {
                let p = a.interest_propensity * NATURAL_PROGRESSION_RATE;
                let roll: f32 = rng.gen();
                if roll < p {
                    a.advance_stage();
                }
            }
        }

        debug!(day = self.day, "day complete");
    }

    // Count of agents at or beyond each metric's threshold stage
    pub fn metric_counts(&self) -> [usize; N_METRICS] {
        let mut counts = [0; N_METRICS];
        for a in &self.agents {
            for m in METRICS.iter() {
                if a.stage >= m.threshold() {
                    counts[m.index()] += 1;
                }
            }
        }
        counts
    }

    pub fn check_invariants(&self, rep: usize, day: usize) -> Result<(), EngineError> {
        if self.agents.len() != self.network.n_nodes() {
            return Err(EngineError::invariant(
                rep,
                day,
                format!(
                    "population {} does not match network {}",
                    self.agents.len(),
                    self.network.n_nodes()
                ),
            ));
        }
        for a in &self.agents {
            for v in a.adstock.iter() {
                if !v.is_finite() {
                    return Err(EngineError::invariant(
                        rep,
                        day,
                        format!("agent {} adstock not finite", a.id),
                    ));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::base_scenario;
    use crate::config::{NetworkConfig, NetworkType};
    use rand::SeedableRng;

    fn quiet_scenario() -> ScenarioConfig {
        // No media, no WoM
        let mut conf = base_scenario();
        conf.media.sns.share = 0.;
        conf.media.video.share = 0.;
        conf.media.search.share = 0.;
        conf.wom.p_generate = 0.;
        conf.network = NetworkConfig {
            kind: NetworkType::SmallWorld,
            n: 1000,
            k: 6,
            beta: 0.1,
        };
        conf.steps = 10;
        conf.reps = 1;
        conf.seed = 42;
        conf
    }

    #[test]
    fn test_quiet_scenario_stays_unaware() {
        let conf = quiet_scenario();
        let mut rng: StdRng = SeedableRng::seed_from_u64(conf.seed);
        let mut sim = Simulation::new(&conf, &mut rng).unwrap();
        for _ in 0..conf.steps {
            sim.step(&conf, &mut rng);
        }
        assert!(sim
            .agents
            .iter()
            .all(|a| a.stage == FunnelStage::Unaware));
        assert_eq!(sim.metric_counts(), [0; N_METRICS]);
    }

    #[test]
    fn test_sns_only_single_step() {
        let mut conf = quiet_scenario();
        conf.media.sns = crate::config::MediaChannelConfig::new(1., 0.5);
        conf.steps = 1;

        let mut rng: StdRng = SeedableRng::seed_from_u64(conf.seed);
        let mut sim = Simulation::new(&conf, &mut rng).unwrap();
        sim.step(&conf, &mut rng);

        let advanced: Vec<&Agent> = sim
            .agents
            .iter()
            .filter(|a| a.stage != FunnelStage::Unaware)
            .collect();
        assert!(!advanced.is_empty());
        // Exactly one stage in one day
        assert!(advanced.iter().all(|a| a.stage == FunnelStage::Aware));

        // Reproducible count for the same seed
        let mut rng: StdRng = SeedableRng::seed_from_u64(conf.seed);
        let mut again = Simulation::new(&conf, &mut rng).unwrap();
        again.step(&conf, &mut rng);
        assert_eq!(sim.metric_counts(), again.metric_counts());
    }

    #[test]
    fn test_stage_movement_bounded_per_day() {
        let mut conf = base_scenario();
        // Everything on, aggressively
        conf.media.sns = crate::config::MediaChannelConfig::new(0.4, 0.8);
        conf.media.video = crate::config::MediaChannelConfig::new(0.3, 0.8);
        conf.media.search = crate::config::MediaChannelConfig::new(0.3, 0.8);
        conf.wom.p_generate = 1.;
        conf.steps = 30;

        let mut rng: StdRng = SeedableRng::seed_from_u64(7);
        let mut sim = Simulation::new(&conf, &mut rng).unwrap();
        for _ in 0..conf.steps {
            let before: Vec<FunnelStage> = sim.agents.iter().map(|a| a.stage).collect();
            sim.step(&conf, &mut rng);
            for (a, prev) in sim.agents.iter().zip(before.iter()) {
                let now = a.stage.index() as isize;
                let was = prev.index() as isize;
                // One media advance plus one WoM advance at most; natural
                // progression only fires when nothing else moved
                assert!(now - was <= 2, "agent {} jumped {} stages", a.id, now - was);
                // Backward movement is the forgetting step only: one stage,
                // and only from Liking or Intent
                if now < was {
                    assert_eq!(was - now, 1);
                    assert!(
                        *prev == FunnelStage::Liking || *prev == FunnelStage::Intent,
                        "agent {} regressed from {:?}",
                        a.id,
                        prev
                    );
                }
            }
        }
        sim.check_invariants(0, conf.steps).unwrap();
    }

    #[test]
    fn test_forgetting_probability_formula() {
        assert!((forgetting_probability(0, 1.) - 0.01).abs() < 1e-6);
        assert!((forgetting_probability(10, 1.) - 0.02).abs() < 1e-6);
        assert!((forgetting_probability(10, 0.5) - 0.01).abs() < 1e-6);
        assert_eq!(forgetting_probability(5, 0.), 0.);
    }

    #[test]
    fn test_forgetting_floor_is_aware() {
        // Regression only ever starts from Liking or Intent, so the floor
        // after one step is Knowledgeable, and Unaware is unreachable
        assert_eq!(FunnelStage::Liking.regress(), FunnelStage::Knowledgeable);
        assert_eq!(FunnelStage::Intent.regress(), FunnelStage::Liking);
        assert!(FunnelStage::Liking.regress() > FunnelStage::Aware);
    }

    #[test]
    fn test_metric_counts_cumulative() {
        let conf = quiet_scenario();
        let mut rng: StdRng = SeedableRng::seed_from_u64(1);
        let mut sim = Simulation::new(&conf, &mut rng).unwrap();
        sim.agents[0].stage = FunnelStage::Intent;
        sim.agents[1].stage = FunnelStage::Aware;
        let counts = sim.metric_counts();
        // The Intent agent counts toward every category at or below it
        assert_eq!(counts[0], 2); // awareness
        assert_eq!(counts[1], 1); // interest
        assert_eq!(counts[2], 1); // knowledge
        assert_eq!(counts[3], 1); // liking
        assert_eq!(counts[4], 1); // intent
    }
}
