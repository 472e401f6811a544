//! Impact feedback sink. Stands in for the audio layer: counts and logs hits.

use bevy::prelude::*;

use crate::scene::simulation::ImpactEvent;

#[derive(Resource, Default, Debug)]
pub struct FeedbackLog {
    pub muted: bool,
    pub played: u64,
    pub dropped: u64,
    pub last_intensity: f32,
}

pub fn feedback_plugin(app: &mut App) {
    app.init_resource::<FeedbackLog>()
        .add_systems(Update, (toggle_mute_system, play_feedback_system));
}

fn toggle_mute_system(keys: Res<ButtonInput<KeyCode>>, mut log: ResMut<FeedbackLog>) {
    if keys.just_pressed(KeyCode::KeyM) {
        log.muted = !log.muted;
        info!("feedback {}", if log.muted { "muted" } else { "unmuted" });
    }
}

pub fn play_feedback_system(mut impacts: EventReader<ImpactEvent>, mut log: ResMut<FeedbackLog>) {
    for ImpactEvent(hit) in impacts.read() {
        if log.muted {
            log.dropped += 1;
            continue;
        }
        log.played += 1;
        log.last_intensity = hit.intensity;
        debug!(
            "impact {} #{} intensity {:.2} magnitude {}",
            hit.slot.class, hit.slot.index, hit.intensity, hit.magnitude
        );
    }
}
