//! Block height labels: a `Text2d` per block slot, drawn by its own 2D camera
//! into the texture wrapped around the block's shell.

use bevy::asset::RenderAssetUsages;
use bevy::prelude::*;
use bevy::render::camera::RenderTarget;
use bevy::render::render_resource::{Extent3d, TextureDimension, TextureFormat, TextureUsages};
use bevy::render::view::RenderLayers;

pub const LABEL_TEXTURE_SIZE: u32 = 256;

const LABEL_FONT_SIZE: f32 = 52.0;
/// Layer 0 is the 3D scene; block slot `n` writes its label on layer `n + 1`.
const FIRST_LABEL_LAYER: usize = 1;

const BACKGROUND: Color = Color::srgb(0.11, 0.12, 0.17);
const INK: Color = Color::srgb(0.92, 0.94, 0.98);

/// Camera rendering the label of block slot `.0` into its texture.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelCamera(pub usize);

/// Text of the label owned by block slot `.0`.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelText(pub usize);

pub fn label_layer(texture_slot: usize) -> RenderLayers {
    RenderLayers::layer(FIRST_LABEL_LAYER + texture_slot)
}

/// Blank square texture a label camera renders into.
pub fn label_target_image() -> Image {
    let size = Extent3d {
        width: LABEL_TEXTURE_SIZE,
        height: LABEL_TEXTURE_SIZE,
        depth_or_array_layers: 1,
    };
    let mut image = Image::new_fill(
        size,
        TextureDimension::D2,
        &[0, 0, 0, 0],
        TextureFormat::Bgra8UnormSrgb,
        RenderAssetUsages::default(),
    );
    image.texture_descriptor.usage =
        TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST | TextureUsages::RENDER_ATTACHMENT;
    image
}

fn label_text(text: &str) -> impl Bundle {
    (
        Text2d::new(text),
        TextFont {
            font_size: LABEL_FONT_SIZE,
            ..default()
        },
        TextColor(INK),
        TextLayout::new_with_justify(JustifyText::Center),
    )
}

/// Spawns the camera and text that keep `target` showing `text`.
/// Returns the text entity, which is what a redraw touches.
pub fn spawn_label_writer(
    commands: &mut Commands,
    texture_slot: usize,
    target: Handle<Image>,
    text: &str,
) -> Entity {
    let layer = label_layer(texture_slot);
    commands.spawn((
        LabelCamera(texture_slot),
        Camera2d,
        Camera {
            target: RenderTarget::Image(target),
            order: -1,
            clear_color: ClearColorConfig::Custom(BACKGROUND),
            ..default()
        },
        layer.clone(),
    ));
    commands
        .spawn((LabelText(texture_slot), label_text(text), layer))
        .id()
}

/// Point an existing label at new text; the camera picks it up next frame.
pub fn redraw_label(commands: &mut Commands, text_entity: Entity, text: &str) {
    commands.entity(text_entity).insert(Text2d::new(text));
}
