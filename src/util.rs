use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand_distr::{Beta, Distribution};

pub fn clamp01(v: f32) -> f32 {
    f32::min(1., f32::max(0., v))
}

// Beta draw recentred on a configured baseline. A baseline of 0.5 leaves the
// distribution untouched.
pub fn beta_around(alpha: f32, beta: f32, base: f32, rng: &mut StdRng) -> f32 {
    let draw: f32 = Beta::new(alpha, beta).unwrap().sample(rng);
    clamp01(draw + base - 0.5)
}

// Weighted categorical draw over 1..=5 levels, shifted toward the configured
// baseline level (3 is neutral).
pub fn shifted_level(weights: &[(u8, f32)], base: u8, rng: &mut StdRng) -> u8 {
    let lvl = weights.choose_weighted(rng, |item| item.1).unwrap().0 as i32;
    (lvl + base as i32 - 3).max(1).min(5) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_clamp01() {
        assert_eq!(clamp01(-0.5), 0.);
        assert_eq!(clamp01(0.5), 0.5);
        assert_eq!(clamp01(1.5), 1.);
    }

    #[test]
    fn test_beta_around_bounds() {
        let mut rng: StdRng = SeedableRng::seed_from_u64(1);
        for _ in 0..200 {
            let v = beta_around(8., 2., 0.9, &mut rng);
            assert!(v >= 0. && v <= 1.);
        }
    }

    #[test]
    fn test_shifted_level() {
        let weights = [(1u8, 0.2), (2, 0.2), (3, 0.2), (4, 0.2), (5, 0.2)];
        let mut rng: StdRng = SeedableRng::seed_from_u64(1);
        for _ in 0..100 {
            let lvl = shifted_level(&weights, 5, &mut rng);
            assert!(lvl >= 3 && lvl <= 5);
        }
        for _ in 0..100 {
            let lvl = shifted_level(&weights, 3, &mut rng);
            assert!(lvl >= 1 && lvl <= 5);
        }
    }
}
