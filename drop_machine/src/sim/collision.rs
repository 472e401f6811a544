//! Contact → impact feedback for the audio/visual layer.

use bevy::math::Vec3;

use crate::sim::pool::{ObjectClass, ObjectPool, PoolSettings, SlotRef};
use crate::sim::world::ContactSample;

/// How impact speed is derived from a body's velocity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpeedMetric {
    /// `|v|`.
    #[default]
    Euclidean,
    /// `sqrt(vx² + vy² + vy·vz)`, as the first visualizer computed it.
    /// Negative radicands produce NaN, which never passes the speed gate.
    Legacy,
}

impl SpeedMetric {
    pub fn speed(self, v: Vec3) -> f32 {
        match self {
            SpeedMetric::Euclidean => v.length(),
            SpeedMetric::Legacy => (v.x * v.x + v.y * v.y + v.y * v.z).sqrt(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeedbackSettings {
    pub metric: SpeedMetric,
    pub min_speed: f32,
    pub max_speed: f32,
    pub min_intensity: f32,
    /// Contacts above `drop_height * ceiling_ratio` are ignored (objects
    /// bumping mid-air at spawn).
    pub ceiling_ratio: f32,
}

impl Default for FeedbackSettings {
    fn default() -> Self {
        Self {
            metric: SpeedMetric::default(),
            min_speed: 5.0,
            max_speed: 200.0,
            min_intensity: 0.2,
            ceiling_ratio: 0.5,
        }
    }
}

/// Feedback raised by a pooled body hitting something.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImpactFeedback {
    pub slot: SlotRef,
    /// Normalised loudness in `[min_intensity, 1]`.
    pub intensity: f32,
    pub magnitude: f64,
    pub is_block: bool,
}

#[derive(Clone, Debug)]
pub struct CollisionDispatcher {
    settings: FeedbackSettings,
    ceiling_y: f32,
}

impl Default for CollisionDispatcher {
    fn default() -> Self {
        Self::new(FeedbackSettings::default(), PoolSettings::default().drop_height)
    }
}

impl CollisionDispatcher {
    /// `drop_height` is the spawn height the pool drops objects from.
    pub fn new(settings: FeedbackSettings, drop_height: f32) -> Self {
        let ceiling_y = drop_height * settings.ceiling_ratio;
        Self {
            settings,
            ceiling_y,
        }
    }

    pub fn settings(&self) -> &FeedbackSettings {
        &self.settings
    }

    pub fn ceiling_y(&self) -> f32 {
        self.ceiling_y
    }

    pub fn intensity(&self, speed: f32) -> f32 {
        (speed / self.settings.max_speed).clamp(self.settings.min_intensity, 1.0)
    }

    /// Feedback for one sample, if it belongs to a live pooled body and is
    /// fast and low enough.
    pub fn evaluate(&self, pool: &ObjectPool, sample: &ContactSample) -> Option<ImpactFeedback> {
        let slot_ref = pool.slot_for_collider(sample.collider)?;
        let slot = pool.slot(slot_ref).filter(|s| s.active)?;
        let speed = self.settings.metric.speed(sample.velocity);
        if !(speed > self.settings.min_speed && sample.position.y < self.ceiling_y) {
            return None;
        }
        Some(ImpactFeedback {
            slot: slot_ref,
            intensity: self.intensity(speed),
            magnitude: slot.magnitude,
            is_block: slot_ref.class == ObjectClass::Block,
        })
    }

    pub fn dispatch(
        &self,
        pool: &ObjectPool,
        samples: impl IntoIterator<Item = ContactSample>,
    ) -> Vec<ImpactFeedback> {
        samples
            .into_iter()
            .filter_map(|sample| self.evaluate(pool, &sample))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::quality::QualityTier;
    use crate::sim::world::PhysicsWorld;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn intensity_is_always_within_bounds() {
        let dispatcher = CollisionDispatcher::default();
        for speed in [0.0, 5.1, 40.0, 199.0, 200.0, 5_000.0, f32::MAX] {
            let i = dispatcher.intensity(speed);
            assert!((0.2..=1.0).contains(&i), "speed {speed} → {i}");
        }
        assert_eq!(dispatcher.intensity(100.0), 0.5);
    }

    #[test]
    fn legacy_metric_reuses_vy() {
        let v = Vec3::new(3.0, 4.0, 2.0);
        assert_eq!(SpeedMetric::Legacy.speed(v), (9.0f32 + 16.0 + 8.0).sqrt());
        assert_eq!(SpeedMetric::Euclidean.speed(v), (29.0f32).sqrt());
        assert!(SpeedMetric::Legacy.speed(Vec3::new(0.0, 1.0, -10.0)).is_nan());
    }

    fn pool_with_one(class: ObjectClass) -> (ObjectPool, ContactSample, SlotRef) {
        let mut world = PhysicsWorld::new(QualityTier::Medium.settings());
        let mut pool = ObjectPool::new(PoolSettings::default(), QualityTier::Medium);
        let mut rng = StdRng::seed_from_u64(3);
        let receipt = pool.spawn(&mut world, &mut rng, class, 42.0).unwrap();
        let collider = pool.slot(receipt.slot).unwrap().handles.collider;
        let sample = ContactSample {
            collider,
            velocity: Vec3::new(0.0, -80.0, 0.0),
            position: Vec3::new(0.0, 3.0, 0.0),
        };
        (pool, sample, receipt.slot)
    }

    #[test]
    fn fast_low_contact_emits_feedback() {
        let (pool, sample, slot) = pool_with_one(ObjectClass::Block);
        let dispatcher = CollisionDispatcher::default();
        let feedback = dispatcher.dispatch(&pool, [sample]);
        assert_eq!(
            feedback,
            vec![ImpactFeedback {
                slot,
                intensity: 0.4,
                magnitude: 42.0,
                is_block: true,
            }]
        );
    }

    #[test]
    fn slow_or_high_contacts_are_ignored() {
        let (pool, sample, _) = pool_with_one(ObjectClass::Transaction);
        let dispatcher = CollisionDispatcher::default();

        let slow = ContactSample {
            velocity: Vec3::new(0.0, -5.0, 0.0),
            ..sample
        };
        let high = ContactSample {
            position: Vec3::new(0.0, 44.0, 0.0),
            ..sample
        };
        assert!(dispatcher.dispatch(&pool, [slow, high]).is_empty());
    }

    #[test]
    fn height_gate_follows_the_drop_height() {
        assert_eq!(CollisionDispatcher::default().ceiling_y(), 44.0);

        let (pool, sample, slot) = pool_with_one(ObjectClass::Transaction);
        let tall = CollisionDispatcher::new(FeedbackSettings::default(), 200.0);
        assert_eq!(tall.ceiling_y(), 100.0);

        let mid_air = ContactSample {
            position: Vec3::new(0.0, 60.0, 0.0),
            ..sample
        };
        let feedback = tall.evaluate(&pool, &mid_air).unwrap();
        assert_eq!(feedback.slot, slot);
        assert_eq!(feedback.intensity, 0.4);
        assert!(CollisionDispatcher::default()
            .evaluate(&pool, &mid_air)
            .is_none());
    }

    #[test]
    fn unknown_colliders_are_ignored() {
        let (pool, sample, _) = pool_with_one(ObjectClass::Transaction);
        let stranger = ContactSample {
            collider: rapier3d::prelude::ColliderHandle::from_raw_parts(99, 0),
            ..sample
        };
        assert!(CollisionDispatcher::default()
            .evaluate(&pool, &stranger)
            .is_none());
    }
}
