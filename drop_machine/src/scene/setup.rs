//! Camera, lights and the visible plinth.

use bevy::prelude::*;

use crate::camera::{OrbitCamera, CAMERA_START};
use crate::scene::simulation::{KeyLight, Simulation};
use crate::sim::world::ArenaSettings;

/// Arena dimensions shared by the physics colliders and the plinth mesh.
#[derive(Resource, Clone, Debug, Default)]
pub struct Arena(pub ArenaSettings);

/// Marker for the plinth mesh.
#[derive(Component)]
pub struct Plinth;

pub fn setup_scene(
    mut commands: Commands,
    arena: Res<Arena>,
    sim: Res<Simulation>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let arena = &arena.0;
    commands.spawn((
        Camera3d::default(),
        OrbitCamera::default(),
        Transform::from_translation(CAMERA_START).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.spawn((
        KeyLight,
        DirectionalLight {
            shadows_enabled: sim.0.tier().settings().shadows,
            illuminance: 8_000.0,
            ..default()
        },
        Transform::from_xyz(60., 180., 40.).looking_at(Vec3::ZERO, Vec3::Y),
    ));
    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 300.0,
    });
    commands.spawn((
        Plinth,
        Mesh3d(meshes.add(Cylinder::new(arena.radius, arena.height))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.82, 0.82, 0.86),
            perceptual_roughness: 0.8,
            ..default()
        })),
        Transform::from_xyz(0.0, arena.cylinder_center_y(), 0.0),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::quality::QualityTier;
    use crate::sim::SimSettings;

    #[test]
    fn setup_scene_spawns_camera_lights_and_plinth() {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<Arena>()
            .insert_resource(Simulation::new(SimSettings::default(), QualityTier::Low, 0))
            .add_systems(Startup, setup_scene);

        app.update();

        assert!(app.world().get_resource::<AmbientLight>().is_some());

        let world = app.world_mut();
        let camera_count = world.query::<(&Camera3d, &OrbitCamera)>().iter(world).count();
        let lights: Vec<bool> = world
            .query::<&DirectionalLight>()
            .iter(world)
            .map(|l| l.shadows_enabled)
            .collect();
        let plinth_top = world
            .query_filtered::<&Transform, With<Plinth>>()
            .single(world)
            .translation
            .y
            + ArenaSettings::default().height / 2.0;

        assert_eq!(camera_count, 1);
        assert_eq!(lights, vec![false]);
        assert!((plinth_top - ArenaSettings::default().floor_y).abs() < 1e-4);
    }
}
