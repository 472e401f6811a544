//! SDK entry points and builder for composing the visualizer app.

use bevy::prelude::*;

use crate::camera::orbit_camera_plugin;
use crate::config;
use crate::data::{init_feed_channel, FeedError, FeedSource};
use crate::render::{GeometryCache, ProxyRenderer, RendererResource, SpheresAndCubesRenderer};
use crate::scene::{
    cycle_quality_system, feedback_plugin, ingest_feed, preload_system, setup_scene,
    step_simulation, sync_proxies, sync_shadows_system, Arena, BestBlock, ImpactEvent,
    PendingLabels, PlayMode, Preload, ProxyIndex, Simulation,
};
use crate::sim::quality::QualityTier;
use crate::sim::SimSettings;
use crate::ui::hud_plugin;

/// Builder for constructing a Plinth app with customizable plugins.
pub struct VisualizerBuilder {
    source: Option<FeedSource>,
    renderer: Option<Box<dyn ProxyRenderer>>,
    settings: SimSettings,
    quality: Option<QualityTier>,
    seed: u64,
    window_title: String,
    window_resolution: (f32, f32),
    clear_color: Color,
    enable_orbit_camera: bool,
    enable_hud: bool,
    enable_feedback: bool,
}

impl Default for VisualizerBuilder {
    fn default() -> Self {
        Self {
            source: None,
            renderer: None,
            settings: SimSettings::default(),
            quality: None,
            seed: 0,
            window_title: "Plinth".to_string(),
            window_resolution: (1280.0, 720.0),
            clear_color: Color::srgb(0.05, 0.05, 0.08),
            enable_orbit_camera: true,
            enable_hud: true,
            enable_feedback: true,
        }
    }
}

impl VisualizerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the feed source and pinned tier from environment variables.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut builder = Self::new().source(config::feed_source()?);
        if let Some(tier) = config::initial_quality()? {
            builder = builder.quality(tier);
        }
        Ok(builder)
    }

    pub fn source(mut self, source: FeedSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Pin the quality tier and skip the startup benchmark.
    pub fn quality(mut self, tier: QualityTier) -> Self {
        self.quality = Some(tier);
        self
    }

    pub fn settings(mut self, settings: SimSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Seed for spawn jitter and the benchmark sample load.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Provide a custom proxy renderer implementation.
    pub fn renderer(mut self, renderer: impl ProxyRenderer) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn window_title(mut self, title: impl Into<String>) -> Self {
        self.window_title = title.into();
        self
    }

    pub fn window_resolution(mut self, width: f32, height: f32) -> Self {
        self.window_resolution = (width, height);
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn disable_orbit_camera(mut self) -> Self {
        self.enable_orbit_camera = false;
        self
    }

    pub fn disable_hud(mut self) -> Self {
        self.enable_hud = false;
        self
    }

    pub fn disable_feedback(mut self) -> Self {
        self.enable_feedback = false;
        self
    }

    /// Build the Bevy app with the selected configuration and plugins.
    pub fn build(self) -> Result<App, FeedError> {
        let source = match self.source {
            Some(source) => source,
            None => FeedSource::Synthetic(Default::default()),
        };
        let channel = init_feed_channel(source)?;
        let renderer = self
            .renderer
            .unwrap_or_else(|| Box::new(SpheresAndCubesRenderer::default()));

        let (tier, mode) = match self.quality {
            Some(tier) => (tier, PlayMode::Loaded),
            None => (QualityTier::default(), PlayMode::Preload),
        };
        let arena = Arena(self.settings.arena.clone());

        let mut app = App::new();
        app.add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: self.window_title,
                resolution: self.window_resolution.into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(self.clear_color))
        .insert_resource(channel)
        .insert_resource(arena)
        .insert_resource(Simulation::new(self.settings, tier, self.seed))
        .insert_resource(mode)
        .insert_resource(Preload::new(self.seed))
        .init_resource::<BestBlock>()
        .init_resource::<PendingLabels>()
        .init_resource::<ProxyIndex>()
        .init_resource::<GeometryCache>()
        .add_event::<ImpactEvent>()
        .add_systems(Startup, setup_scene)
        .add_systems(
            Update,
            (
                cycle_quality_system,
                preload_system,
                ingest_feed,
                step_simulation,
                sync_proxies,
                sync_shadows_system,
            )
                .chain(),
        );

        renderer.setup(&mut app);
        app.insert_resource(RendererResource(renderer));

        if self.enable_orbit_camera {
            app.add_plugins(orbit_camera_plugin);
        }
        if self.enable_hud {
            app.add_plugins(hud_plugin);
        }
        if self.enable_feedback {
            app.add_plugins(feedback_plugin);
        }

        Ok(app)
    }
}
