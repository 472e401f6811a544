//! Orbit camera: slow auto-rotation about the plinth.

use bevy::prelude::*;

pub const CAMERA_START: Vec3 = Vec3::new(-122.0, 142.0, 122.0);

#[derive(Component, Clone, Debug)]
pub struct OrbitCamera {
    pub focus: Vec3,
    /// Radians per second about +Y.
    pub speed: f32,
    pub auto_rotate: bool,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            speed: 0.05,
            auto_rotate: true,
        }
    }
}

pub fn orbit_camera_plugin(app: &mut App) {
    app.add_systems(Update, (toggle_rotation_system, orbit_camera_system));
}

/// Rotate `position` about the vertical axis through `focus`.
pub fn orbit_position(position: Vec3, focus: Vec3, angle: f32) -> Vec3 {
    focus + Quat::from_rotation_y(angle) * (position - focus)
}

fn orbit_camera_system(time: Res<Time>, mut cameras: Query<(&OrbitCamera, &mut Transform)>) {
    let dt = time.delta_secs();
    for (orbit, mut tf) in &mut cameras {
        if !orbit.auto_rotate {
            continue;
        }
        tf.translation = orbit_position(tf.translation, orbit.focus, orbit.speed * dt);
        tf.look_at(orbit.focus, Vec3::Y);
    }
}

fn toggle_rotation_system(keys: Res<ButtonInput<KeyCode>>, mut cameras: Query<&mut OrbitCamera>) {
    if !keys.just_pressed(KeyCode::KeyR) {
        return;
    }
    for mut orbit in &mut cameras {
        orbit.auto_rotate = !orbit.auto_rotate;
    }
}
