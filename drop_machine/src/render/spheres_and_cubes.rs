use bevy::prelude::*;

use crate::render::ProxyRenderer;
use crate::sim::pool::{Geometry, MaterialKind};

/// Base colours of each proxy material.
#[derive(Clone, Debug)]
pub struct MaterialPalette {
    pub swatch: Color,
    pub small_transaction: Color,
    pub transaction: Color,
    pub block: Color,
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self {
            swatch: Color::srgb(0.55, 0.75, 0.95),
            small_transaction: Color::srgb(0.95, 0.72, 0.25),
            transaction: Color::srgb(0.95, 0.35, 0.2),
            block: Color::srgb(0.15, 0.16, 0.24),
            metallic: 0.3,
            roughness: 0.45,
        }
    }
}

impl MaterialPalette {
    pub fn color(&self, kind: MaterialKind) -> Color {
        match kind {
            MaterialKind::Swatch => self.swatch,
            MaterialKind::SmallTransaction => self.small_transaction,
            MaterialKind::Transaction => self.transaction,
            MaterialKind::Block => self.block,
        }
    }
}

/// Default look: UV spheres for transactions, unit cubes for blocks.
#[derive(Default)]
pub struct SpheresAndCubesRenderer {
    pub palette: MaterialPalette,
}

impl ProxyRenderer for SpheresAndCubesRenderer {
    fn mesh(&self, geometry: Geometry) -> Mesh {
        match geometry {
            Geometry::Sphere(detail) => {
                let (sectors, stacks) = detail.segments();
                Sphere::new(1.0).mesh().uv(sectors, stacks)
            }
            Geometry::Cube => Cuboid::new(1.0, 1.0, 1.0).into(),
        }
    }

    fn material(&self, kind: MaterialKind) -> StandardMaterial {
        let base_color = self.palette.color(kind);
        let emissive = match kind {
            // Large outputs glow faintly.
            MaterialKind::Transaction => {
                let lin = base_color.to_linear();
                LinearRgba::rgb(lin.red * 0.4, lin.green * 0.4, lin.blue * 0.4)
            }
            _ => LinearRgba::BLACK,
        };
        StandardMaterial {
            base_color,
            emissive,
            metallic: self.palette.metallic,
            perceptual_roughness: self.palette.roughness,
            ..default()
        }
    }

    fn label_material(&self, label: Handle<Image>) -> StandardMaterial {
        StandardMaterial {
            base_color_texture: Some(label),
            alpha_mode: AlphaMode::Mask(0.5),
            perceptual_roughness: self.palette.roughness,
            ..default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::quality::SphereDetail;
    use bevy::render::mesh::VertexAttributeValues;

    fn vertex_count(mesh: &Mesh) -> usize {
        match mesh.attribute(Mesh::ATTRIBUTE_POSITION) {
            Some(VertexAttributeValues::Float32x3(v)) => v.len(),
            _ => 0,
        }
    }

    #[test]
    fn finer_spheres_have_more_vertices() {
        let renderer = SpheresAndCubesRenderer::default();
        let counts: Vec<_> = SphereDetail::ALL
            .iter()
            .map(|d| vertex_count(&renderer.mesh(Geometry::Sphere(*d))))
            .collect();
        assert!(counts.windows(2).all(|w| w[0] < w[1]), "{counts:?}");
    }

    #[test]
    fn palette_distinguishes_material_kinds() {
        let renderer = SpheresAndCubesRenderer::default();
        let swatch = renderer.material(MaterialKind::Swatch).base_color;
        let block = renderer.material(MaterialKind::Block).base_color;
        assert_ne!(swatch, block);
    }
}
