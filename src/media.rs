use crate::agent::Agent;
use crate::config::{MediaMix, CHANNELS, N_CHANNELS};
use crate::funnel::FunnelStage;
use rand::rngs::StdRng;
use rand::Rng;

// Saturation of the adstock-to-exposure transform
pub const SATURATION_GAMMA: f32 = 3.0;

// Diminishing-returns transform from accumulated adstock to a per-day
// exposure probability.
pub fn exposure_probability(adstock: f32) -> f32 {
    1. - (-SATURATION_GAMMA * adstock).exp()
}

// One day of media for one agent. Mutates the agent's per-channel adstock
// carry-over and exposure memory. Returns whether the agent advanced; media
// advances an agent at most one stage per day across all channels combined.
pub fn expose(
    agent: &mut Agent,
    mix: &MediaMix,
    shares: &[f32; N_CHANNELS],
    rng: &mut StdRng,
) -> bool {
    let mut advance = false;
    for ch in CHANNELS.iter() {
        let conf = mix.channel(*ch);
        let reach = shares[ch.index()] * agent.channel_modifier(*ch);
        let adstock = conf.alpha * reach + conf.memory * agent.adstock[ch.index()];
        agent.adstock[ch.index()] = adstock;

        let exposure: f32 = rng.gen();
        if exposure < exposure_probability(adstock) {
            agent.media_exposures += 1;
            agent.days_since_exposure = 0;

            let effect = conf.alpha * agent.current_receptivity() * agent.current_openness();
            let roll: f32 = rng.gen();
            if roll < effect && agent.stage < FunnelStage::Adopted {
                advance = true;
            }
        }
    }
    if advance {
        agent.advance_stage();
    }
    advance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::base_scenario;
    use rand::SeedableRng;

    #[test]
    fn test_exposure_probability_shape() {
        assert_eq!(exposure_probability(0.), 0.);
        let mut last = 0.;
        for i in 1..10 {
            let e = exposure_probability(i as f32 * 0.1);
            assert!(e > last && e < 1.);
            last = e;
        }
    }

    #[test]
    fn test_zero_shares_no_exposure() {
        let conf = base_scenario();
        let mut rng: StdRng = SeedableRng::seed_from_u64(42);
        let mut agent = crate::agent::Agent::new(0, &conf, &mut rng);
        let shares = [0.; N_CHANNELS];
        for _ in 0..50 {
            let advanced = expose(&mut agent, &conf.media, &shares, &mut rng);
            assert!(!advanced);
        }
        assert_eq!(agent.stage, FunnelStage::Unaware);
        assert_eq!(agent.media_exposures, 0);
        assert_eq!(agent.adstock, [0., 0., 0.]);
    }

    #[test]
    fn test_adstock_accumulates_and_saturates() {
        let conf = base_scenario();
        let mut rng: StdRng = SeedableRng::seed_from_u64(42);
        let mut agent = crate::agent::Agent::new(0, &conf, &mut rng);
        let shares = conf.media.normalized_shares();

        let mut last = 0.;
        for _ in 0..100 {
            expose(&mut agent, &conf.media, &shares, &mut rng);
            let a = agent.adstock[0];
            assert!(a.is_finite());
            assert!(a >= last || (a - last).abs() < 1e-4);
            last = a;
        }
        // Geometric carry-over converges to alpha * reach / (1 - memory)
        let reach = shares[0] * agent.channel_modifier(crate::config::Channel::Sns);
        let limit = conf.media.sns.alpha * reach / (1. - conf.media.sns.memory);
        assert!((agent.adstock[0] - limit).abs() < 1e-3);
    }

    #[test]
    fn test_at_most_one_stage_per_day() {
        let mut conf = base_scenario();
        conf.media.sns = crate::config::MediaChannelConfig::new(1., 1.);
        conf.media.video = crate::config::MediaChannelConfig::new(1., 1.);
        conf.media.search = crate::config::MediaChannelConfig::new(1., 1.);
        let shares = conf.media.normalized_shares();
        let mut rng: StdRng = SeedableRng::seed_from_u64(42);
        let mut agent = crate::agent::Agent::new(0, &conf, &mut rng);
        // Make every draw a success
        agent.receptivity = 1.;
        agent.openness = 1.;

        for _ in 0..20 {
            let before = agent.stage;
            expose(&mut agent, &conf.media, &shares, &mut rng);
            assert!(agent.stage.index() <= before.index() + 1);
        }
    }
}
