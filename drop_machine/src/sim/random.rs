//! Range-bounded random helpers used for spawn jitter.

use rand::Rng;

/// Uniform sample in `[min, max)`. Returns `min` when the range is empty.
pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    if max > min {
        rng.gen_range(min..max)
    } else {
        min
    }
}

/// Uniform sample in `[-radius, radius)`, centred on zero.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> f32 {
    let radius = radius.abs();
    rand_range(rng, -radius, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn jitter_stays_within_radius() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let v = jitter(&mut rng, 23.0);
            assert!((-23.0..23.0).contains(&v), "{v} escaped the jitter radius");
        }
    }

    #[test]
    fn zero_radius_is_exactly_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(jitter(&mut rng, 0.0), 0.0);
    }

    #[test]
    fn empty_range_returns_min() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(rand_range(&mut rng, 3.0, 3.0), 3.0);
        assert_eq!(rand_range(&mut rng, 5.0, 1.0), 5.0);
    }
}
