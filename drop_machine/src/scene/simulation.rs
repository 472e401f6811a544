//! Bevy wrapper around the simulation core: one `SimContext` stepped per frame.

use bevy::prelude::*;

use crate::sim::collision::ImpactFeedback;
use crate::sim::label::LabelRequest;
use crate::sim::quality::QualityTier;
use crate::sim::{SimContext, SimSettings};

#[derive(Resource)]
pub struct Simulation(pub SimContext);

impl Simulation {
    pub fn new(settings: SimSettings, tier: QualityTier, seed: u64) -> Self {
        Self(SimContext::new(settings, tier, seed))
    }
}

/// Raised for every qualifying contact of a pooled body.
#[derive(Event, Clone, Copy, Debug, PartialEq)]
pub struct ImpactEvent(pub ImpactFeedback);

/// Label redraws waiting for the proxy sync system.
#[derive(Resource, Default)]
pub struct PendingLabels(pub Vec<LabelRequest>);

/// Marker for the key light whose shadows follow the quality tier.
#[derive(Component)]
pub struct KeyLight;

pub fn step_simulation(
    mut sim: ResMut<Simulation>,
    mut labels: ResMut<PendingLabels>,
    mut impacts: EventWriter<ImpactEvent>,
) {
    let report = sim.0.frame();
    for err in &report.spawn_errors {
        warn!("replayed spawn failed: {err}");
    }
    if !report.condemned.is_empty() {
        debug!("condemned {} fallen objects", report.condemned.len());
    }
    impacts.send_batch(report.feedback.into_iter().map(ImpactEvent));
    labels.0.extend(report.labels);
}

/// Switch tiers and keep shadows in line with the new settings.
pub fn apply_quality_tier(sim: &mut Simulation, tier: QualityTier) -> usize {
    let swapped = sim.0.set_quality_tier(tier);
    info!("quality tier {tier} ({swapped} transaction meshes swapped)");
    swapped
}

pub fn cycle_quality_system(keys: Res<ButtonInput<KeyCode>>, mut sim: ResMut<Simulation>) {
    if keys.just_pressed(KeyCode::KeyQ) {
        let next = sim.0.tier().cycle();
        apply_quality_tier(&mut sim, next);
    }
}

pub fn sync_shadows_system(
    sim: Res<Simulation>,
    mut lights: Query<&mut DirectionalLight, With<KeyLight>>,
) {
    if !sim.is_changed() {
        return;
    }
    let shadows = sim.0.tier().settings().shadows;
    for mut light in &mut lights {
        if light.shadows_enabled != shadows {
            light.shadows_enabled = shadows;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::pool::ObjectClass;

    #[test]
    fn step_forwards_labels_and_shadow_tier() {
        let mut app = App::new();
        app.add_event::<ImpactEvent>()
            .init_resource::<PendingLabels>()
            .insert_resource(Simulation::new(SimSettings::default(), QualityTier::Low, 5))
            .add_systems(Update, (step_simulation, sync_shadows_system).chain());

        let light = app
            .world_mut()
            .spawn((
                KeyLight,
                DirectionalLight {
                    shadows_enabled: true,
                    ..default()
                },
            ))
            .id();

        app.world_mut()
            .resource_mut::<Simulation>()
            .0
            .on_new_block(7.0)
            .unwrap();
        app.update();

        let labels = &app.world().resource::<PendingLabels>().0;
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text, "7");
        assert_eq!(app.world().resource::<Simulation>().0.world.steps(), 1);
        assert!(!app.world().get::<DirectionalLight>(light).unwrap().shadows_enabled);
        assert_eq!(
            app.world()
                .resource::<Simulation>()
                .0
                .pool
                .class(ObjectClass::Block)
                .active_count(),
            1
        );
    }
}
