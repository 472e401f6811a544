//! Magnitude → physical size and mass.

use crate::sim::pool::ObjectClass;

/// Volume of a unit sphere, 4/3·π.
pub const UNIT_SPHERE_VOLUME: f64 = 4.18879;
pub const SCALE_MULTI: f64 = 3.0;
pub const MASS_MULTI: f64 = 2.0;

const SMALL_TX_FLOOR: f64 = 0.4;
const SMALL_TX_CEIL: f64 = 0.6;
const LARGE_TX_FLOOR: f64 = 0.7;
const BLOCK_EDGE: f64 = 4.2;
const BLOCK_MASS: f64 = 75.0;

/// Size (`w`: sphere radius or cube edge) and mass of a spawned object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyDims {
    pub size: f32,
    pub mass: f32,
}

pub fn dims_for(class: ObjectClass, magnitude: f64) -> BodyDims {
    match class {
        ObjectClass::Transaction => {
            let w = transaction_size(magnitude);
            BodyDims {
                size: w as f32,
                mass: (w.powi(3) * UNIT_SPHERE_VOLUME * MASS_MULTI) as f32,
            }
        }
        ObjectClass::Block => BodyDims {
            size: (BLOCK_EDGE * SCALE_MULTI) as f32,
            mass: (BLOCK_MASS * MASS_MULTI) as f32,
        },
    }
}

/// Sub-unit amounts are clamped into a narrow band; larger amounts are treated
/// as a sphere volume and grow with the log of the radius.
pub fn transaction_size(magnitude: f64) -> f64 {
    if magnitude < 1.0 {
        (magnitude * SCALE_MULTI).clamp(SMALL_TX_FLOOR * SCALE_MULTI, SMALL_TX_CEIL * SCALE_MULTI)
    } else {
        let radius = (magnitude / UNIT_SPHERE_VOLUME).cbrt();
        ((radius.ln() + 1.0) * SCALE_MULTI).max(LARGE_TX_FLOOR * SCALE_MULTI)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn half_unit_is_scaled_linearly() {
        assert!(close(transaction_size(0.5), 1.5));
    }

    #[test]
    fn sub_unit_amounts_are_clamped() {
        assert!(close(transaction_size(0.01), 1.2));
        assert!(close(transaction_size(0.55), 1.65));
        assert!(close(transaction_size(0.99), 1.8));
    }

    #[test]
    fn unit_amount_uses_the_large_floor() {
        assert!(close(transaction_size(1.0), 2.1));
    }

    #[test]
    fn large_amount_grows_logarithmically() {
        let expected = ((2000.0_f64 / UNIT_SPHERE_VOLUME).cbrt().ln() + 1.0) * 3.0;
        let w = transaction_size(2000.0);
        assert!(close(w, expected));
        assert!(w > 0.7 * 3.0);
        assert!(transaction_size(20_000.0) > w);
    }

    #[test]
    fn transaction_mass_follows_volume() {
        let dims = dims_for(ObjectClass::Transaction, 0.5);
        let expected = 1.5_f64.powi(3) * UNIT_SPHERE_VOLUME * MASS_MULTI;
        assert!((dims.mass as f64 - expected).abs() < 1e-3);
    }

    #[test]
    fn blocks_ignore_magnitude() {
        let a = dims_for(ObjectClass::Block, 1.0);
        let b = dims_for(ObjectClass::Block, 19_000_000.0);
        assert_eq!(a, b);
        assert!((a.size - 12.6).abs() < 1e-5);
        assert_eq!(a.mass, 150.0);
    }
}
