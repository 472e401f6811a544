//! Renderer traits and default implementations.

mod spheres_and_cubes;

use std::collections::HashMap;

use bevy::prelude::*;

use crate::sim::pool::{Geometry, MaterialKind};

pub use spheres_and_cubes::{MaterialPalette, SpheresAndCubesRenderer};

/// Turns proxy descriptions into bevy assets. The sync system owns the
/// entities; a renderer only decides what they look like.
pub trait ProxyRenderer: Send + Sync + 'static {
    fn setup(&self, _app: &mut App) {}
    /// Mesh for one level of the shared geometry ladder, at unit size.
    fn mesh(&self, geometry: Geometry) -> Mesh;
    /// Fresh material for a slot; dropped when the slot is recycled.
    fn material(&self, kind: MaterialKind) -> StandardMaterial;
    /// Material for a block's outer shell, textured with its height label.
    fn label_material(&self, label: Handle<Image>) -> StandardMaterial;
    /// Texture a block slot's label is rendered into.
    fn label_target(&self) -> Image {
        crate::scene::labels::label_target_image()
    }
}

#[derive(Resource)]
pub struct RendererResource(pub Box<dyn ProxyRenderer>);

impl RendererResource {
    pub fn new(renderer: impl ProxyRenderer) -> Self {
        Self(Box::new(renderer))
    }
}

/// Meshes are shared by every proxy of the same geometry and built on first use.
#[derive(Resource, Default)]
pub struct GeometryCache {
    meshes: HashMap<Geometry, Handle<Mesh>>,
}

impl GeometryCache {
    pub fn mesh(
        &mut self,
        renderer: &dyn ProxyRenderer,
        meshes: &mut Assets<Mesh>,
        geometry: Geometry,
    ) -> Handle<Mesh> {
        self.meshes
            .entry(geometry)
            .or_insert_with(|| meshes.add(renderer.mesh(geometry)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}
