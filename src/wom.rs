use crate::agent::Agent;
use crate::config::{InfluencerConfig, WomConfig};
use crate::funnel::FunnelStage;
use crate::network::NetworkGraph;
use rand::rngs::StdRng;
use rand::Rng;

// Base effect coefficient for a received recommendation
const BASE_EFFECT: f32 = 0.05;

// Default scale of the demographic similarity bonus (max 30%)
const SIMILARITY_SCALE: f32 = 0.3;

fn influencer_factor(agent: &Agent, inf: &InfluencerConfig) -> f32 {
    if agent.is_influencer {
        inf.multiplier
    } else {
        1.
    }
}

// Bonus to emission probability when source and target look alike.
// Demographic similarity (age/income/urban-ness, weights 0.4/0.3/0.3) scaled
// by demographic_weight; trait similarity only participates when
// personality_weight is configured.
pub fn similarity_bonus(source: &Agent, target: &Agent, conf: &WomConfig) -> f32 {
    let demo_scale = conf.demographic_weight.unwrap_or(SIMILARITY_SCALE);
    let mut bonus = demo_scale * source.demographic_similarity(target);
    if let Some(weight) = conf.personality_weight {
        bonus += weight * source.trait_similarity(target);
    }
    bonus
}

// One day of word of mouth. Sources are the agents at or beyond Liking in
// `snapshot` (the stage vector frozen before this phase), so influence
// travels at most one hop per day. Nodes are processed in ascending id
// order, neighbors in ascending id order, all draws from the single
// repetition generator. Stage changes are buffered and applied at the end of
// the phase; a target advances at most one stage per day from WoM.
//
// WoM carries no day-to-day state of its own; the decay parameter acts on
// the forgetting step instead.
pub fn diffuse(
    agents: &mut Vec<Agent>,
    snapshot: &[FunnelStage],
    network: &NetworkGraph,
    wom: &WomConfig,
    inf: &InfluencerConfig,
    rng: &mut StdRng,
) -> Vec<bool> {
    let mut advanced = vec![false; agents.len()];
    if wom.p_generate <= 0. {
        return advanced;
    }

    for i in 0..agents.len() {
        if snapshot[i] < FunnelStage::Liking {
            continue;
        }
        let source_strength = agents[i].influence * influencer_factor(&agents[i], inf);

        for &(j, weight) in network.neighbors(i) {
            let j = j as usize;
            let bonus = similarity_bonus(&agents[i], &agents[j], wom);
            let p_emit = wom.p_generate * source_strength * 0.1 * (1. + bonus) * weight;

            let roll: f32 = rng.gen();
            if roll >= p_emit {
                continue;
            }
            agents[j].wom_received += 1;

            let p_effect = BASE_EFFECT
                * agents[j].current_receptivity()
                * agents[j].social_influence
                * influencer_factor(&agents[i], inf);
            let roll: f32 = rng.gen();
            if roll < p_effect && agents[j].stage < FunnelStage::Adopted {
                advanced[j] = true;
            }
        }
    }

    for (j, adv) in advanced.iter().enumerate() {
        if *adv {
            agents[j].advance_stage();
        }
    }
    advanced
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::base_scenario;
    use fnv::FnvHashSet;
    use rand::SeedableRng;

    // Path graph 0 - 1 - 2 - 3
    fn path_graph() -> NetworkGraph {
        let mut edges = FnvHashSet::default();
        edges.insert((0, 1));
        edges.insert((1, 2));
        edges.insert((2, 3));
        NetworkGraph::from_edges(4, &edges)
    }

    fn population(n: usize) -> Vec<Agent> {
        let conf = base_scenario();
        let mut rng: StdRng = SeedableRng::seed_from_u64(42);
        (0..n).map(|i| Agent::new(i, &conf, &mut rng)).collect()
    }

    #[test]
    fn test_no_sources_no_diffusion() {
        let conf = base_scenario();
        let network = path_graph();
        let mut agents = population(4);
        let snapshot: Vec<FunnelStage> = agents.iter().map(|a| a.stage).collect();
        let mut rng: StdRng = SeedableRng::seed_from_u64(1);
        let advanced = diffuse(
            &mut agents,
            &snapshot,
            &network,
            &conf.wom,
            &conf.influencers,
            &mut rng,
        );
        assert!(advanced.iter().all(|a| !a));
        assert!(agents.iter().all(|a| a.stage == FunnelStage::Unaware));
        assert!(agents.iter().all(|a| a.wom_received == 0));
    }

    #[test]
    fn test_diffusion_reaches_only_direct_neighbors() {
        let mut conf = base_scenario();
        conf.wom.p_generate = 1.;
        conf.influencers.multiplier = 10.;

        let network = path_graph();
        let mut hits = 0;
        for seed in 0..200 {
            let mut agents = population(4);
            // Agent 0 is a maximally influential sharer at Liking
            agents[0].stage = FunnelStage::Liking;
            agents[0].influence = 1.;
            agents[0].is_influencer = true;
            // A maximally receptive direct neighbor
            agents[1].receptivity = 1.;
            agents[1].social_influence = 1.;

            let snapshot: Vec<FunnelStage> = agents.iter().map(|a| a.stage).collect();
            let mut rng: StdRng = SeedableRng::seed_from_u64(seed);
            diffuse(
                &mut agents,
                &snapshot,
                &network,
                &conf.wom,
                &conf.influencers,
                &mut rng,
            );

            // Influence never travels beyond agent 0's direct neighbor in a
            // single day
            assert_eq!(agents[2].stage, FunnelStage::Unaware);
            assert_eq!(agents[3].stage, FunnelStage::Unaware);
            assert!(agents[1].stage.index() <= FunnelStage::Aware.index());
            if agents[1].stage == FunnelStage::Aware {
                hits += 1;
            }
        }
        // p_emit is 1 and p_effect is 0.5 for agent 1, so some of the 200
        // trials must land
        assert!(hits > 0);
    }

    #[test]
    fn test_at_most_one_wom_advance_per_day() {
        let mut conf = base_scenario();
        conf.wom.p_generate = 1.;
        conf.influencers.multiplier = 10.;

        // Star: node 0 in the middle of two sharers
        let mut edges = FnvHashSet::default();
        edges.insert((0, 1));
        edges.insert((0, 2));
        let network = NetworkGraph::from_edges(3, &edges);

        for seed in 0..100 {
            let mut agents = population(3);
            agents[0].receptivity = 1.;
            agents[0].social_influence = 1.;
            for i in [1usize, 2].iter() {
                agents[*i].stage = FunnelStage::Intent;
                agents[*i].influence = 1.;
                agents[*i].is_influencer = true;
            }
            let snapshot: Vec<FunnelStage> = agents.iter().map(|a| a.stage).collect();
            let mut rng: StdRng = SeedableRng::seed_from_u64(seed);
            diffuse(
                &mut agents,
                &snapshot,
                &network,
                &conf.wom,
                &conf.influencers,
                &mut rng,
            );
            assert!(agents[0].stage.index() <= FunnelStage::Aware.index());
        }
    }

    #[test]
    fn test_similarity_bonus_defaults() {
        let conf = base_scenario();
        let agents = population(2);
        let bonus = similarity_bonus(&agents[0], &agents[1], &conf.wom);
        // Default scale caps the bonus at 30%
        assert!(bonus >= 0. && bonus <= 0.3 + 1e-6);

        let mut wom = conf.wom.clone();
        wom.personality_weight = Some(0.5);
        let with_traits = similarity_bonus(&agents[0], &agents[1], &wom);
        assert!(with_traits >= bonus);
    }
}
