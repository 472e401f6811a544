//! HUD overlay: best block, time since it landed, pool occupancy, tier, FPS.

use std::time::Duration;

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPlugin};

use crate::scene::{BestBlock, FeedbackLog, PlayMode, Simulation};
use crate::sim::label::format_thousands;
use crate::sim::pool::ObjectClass;

pub fn hud_plugin(app: &mut App) {
    app.add_plugins(EguiPlugin)
        .add_plugins(FrameTimeDiagnosticsPlugin)
        .add_systems(Update, hud_overlay_system);
}

/// `MM:SS`, minutes uncapped.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn hud_overlay_system(
    mut contexts: EguiContexts,
    time: Res<Time>,
    best: Res<BestBlock>,
    sim: Res<Simulation>,
    mode: Res<PlayMode>,
    feedback: Option<Res<FeedbackLog>>,
    diagnostics: Res<DiagnosticsStore>,
) {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|d| d.smoothed())
        .unwrap_or(0.0);

    let pool = &sim.0.pool;
    let occupancy = |class| {
        let class = pool.class(class);
        format!("{}/{}", class.active_count(), class.capacity())
    };

    egui::Window::new("Plinth")
        .anchor(egui::Align2::LEFT_TOP, [10.0, 10.0])
        .resizable(false)
        .collapsible(false)
        .title_bar(false)
        .frame(
            egui::Frame::default()
                .fill(egui::Color32::from_rgba_premultiplied(15, 15, 25, 210))
                .inner_margin(egui::Margin::same(12))
                .corner_radius(egui::CornerRadius::same(6)),
        )
        .show(contexts.ctx_mut(), |ui| {
            ui.style_mut().override_text_style = Some(egui::TextStyle::Monospace);
            ui.visuals_mut().override_text_color = Some(egui::Color32::from_rgb(200, 220, 240));

            let headline = match best.number {
                Some(n) => format!("Block #{}", format_thousands(n)),
                None if *mode == PlayMode::Preload => "Benchmarking".to_string(),
                None => "Waiting for first block".to_string(),
            };
            ui.label(
                egui::RichText::new(headline)
                    .size(16.0)
                    .color(egui::Color32::from_rgb(100, 220, 180)),
            );
            if let Some(since) = best.since_last(time.elapsed()) {
                ui.label(format!("Since last  {}", format_elapsed(since)));
            }
            ui.add_space(4.0);

            ui.label(format!("Outputs  {}", occupancy(ObjectClass::Transaction)));
            ui.label(format!("Blocks   {}", occupancy(ObjectClass::Block)));
            ui.label(format!("Queued   {}", sim.0.replay.pending()));
            ui.add_space(4.0);

            ui.separator();
            ui.label(format!("Quality  {}  [Q]", sim.0.tier()));
            if let Some(feedback) = feedback {
                let state = if feedback.muted { "muted" } else { "on" };
                ui.label(format!("Impacts  {} ({state})  [M]", feedback.played));
            }
            ui.label(format!("FPS  {fps:.0}"));
        });
}
