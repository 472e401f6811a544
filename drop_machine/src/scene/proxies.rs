//! Mirrors pool render proxies onto ECS entities once per frame.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::render::{GeometryCache, RendererResource};
use crate::scene::labels::{redraw_label, spawn_label_writer};
use crate::scene::simulation::{PendingLabels, Simulation};
use crate::sim::pool::{Geometry, LabelShell, MaterialKind, ObjectClass, RenderProxy, SlotRef};

/// Entity drawing one pool slot.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct PooledProxy(pub SlotRef);

/// Outer label shell of the block in slot `.0`.
#[derive(Component, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabelShellOf(pub usize);

struct TrackedProxy {
    entity: Entity,
    shell: Option<Entity>,
    geometry: Geometry,
    /// Lifetime the current material was made for. A respawn gets a new one.
    material: Option<(u64, MaterialKind)>,
}

/// Texture, material and text entity owned by a block slot. The text is
/// swapped on every label request; the texture is never replaced.
pub struct LabelTexture {
    pub image: Handle<Image>,
    pub material: Handle<StandardMaterial>,
    pub text: Entity,
}

#[derive(Resource, Default)]
pub struct ProxyIndex {
    slots: HashMap<SlotRef, TrackedProxy>,
    labels: HashMap<usize, LabelTexture>,
}

impl ProxyIndex {
    pub fn entity(&self, slot: SlotRef) -> Option<Entity> {
        self.slots.get(&slot).map(|t| t.entity)
    }

    pub fn shell(&self, slot: SlotRef) -> Option<Entity> {
        self.slots.get(&slot).and_then(|t| t.shell)
    }

    pub fn label(&self, texture_slot: usize) -> Option<&LabelTexture> {
        self.labels.get(&texture_slot)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

fn visibility(visible: bool) -> Visibility {
    if visible {
        Visibility::Visible
    } else {
        Visibility::Hidden
    }
}

fn proxy_transform(proxy: &RenderProxy) -> Transform {
    Transform {
        translation: proxy.translation,
        rotation: proxy.rotation,
        scale: Vec3::splat(proxy.scale),
    }
}

fn shell_transform(proxy: &RenderProxy, shell: LabelShell) -> Transform {
    Transform {
        scale: Vec3::splat(shell.scale),
        ..proxy_transform(proxy)
    }
}

#[allow(clippy::too_many_arguments, clippy::type_complexity)]
pub fn sync_proxies(
    mut commands: Commands,
    sim: Res<Simulation>,
    renderer: Res<RendererResource>,
    mut cache: ResMut<GeometryCache>,
    mut index: ResMut<ProxyIndex>,
    mut labels: ResMut<PendingLabels>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut images: ResMut<Assets<Image>>,
    mut proxies: Query<
        (&mut Transform, &mut Visibility),
        (With<PooledProxy>, Without<LabelShellOf>),
    >,
    mut shells: Query<
        (&mut Transform, &mut Visibility),
        (With<LabelShellOf>, Without<PooledProxy>),
    >,
) {
    let renderer = renderer.0.as_ref();
    let index = &mut *index;

    for class in ObjectClass::ALL {
        for (i, slot) in sim.0.pool.class(class).slots().iter().enumerate() {
            let slot_ref = SlotRef { class, index: i };
            let proxy = &slot.proxy;
            let material = proxy.material.map(|kind| (slot.lifetime_id, kind));

            let Some(tracked) = index.slots.get_mut(&slot_ref) else {
                let mesh = cache.mesh(renderer, &mut meshes, proxy.geometry);
                let mut spawned = commands.spawn((
                    PooledProxy(slot_ref),
                    Mesh3d(mesh),
                    proxy_transform(proxy),
                    visibility(proxy.visible),
                ));
                if let Some((_, kind)) = material {
                    spawned.insert(MeshMaterial3d(materials.add(renderer.material(kind))));
                }
                let entity = spawned.id();
                let shell = proxy.shell.map(|shell| {
                    let mesh = cache.mesh(renderer, &mut meshes, Geometry::Cube);
                    commands
                        .spawn((
                            LabelShellOf(i),
                            Mesh3d(mesh),
                            shell_transform(proxy, shell),
                            visibility(shell.visible),
                        ))
                        .id()
                });
                index.slots.insert(
                    slot_ref,
                    TrackedProxy {
                        entity,
                        shell,
                        geometry: proxy.geometry,
                        material,
                    },
                );
                continue;
            };

            if let Ok((mut tf, mut vis)) = proxies.get_mut(tracked.entity) {
                *tf = proxy_transform(proxy);
                vis.set_if_neq(visibility(proxy.visible));
            }
            if tracked.geometry != proxy.geometry {
                let mesh = cache.mesh(renderer, &mut meshes, proxy.geometry);
                commands.entity(tracked.entity).insert(Mesh3d(mesh));
                tracked.geometry = proxy.geometry;
            }
            if tracked.material != material {
                match material {
                    Some((_, kind)) => {
                        let handle = materials.add(renderer.material(kind));
                        commands.entity(tracked.entity).insert(MeshMaterial3d(handle));
                    }
                    None => {
                        commands
                            .entity(tracked.entity)
                            .remove::<MeshMaterial3d<StandardMaterial>>();
                    }
                }
                tracked.material = material;
            }
            if let (Some(entity), Some(shell)) = (tracked.shell, proxy.shell) {
                if let Ok((mut tf, mut vis)) = shells.get_mut(entity) {
                    *tf = shell_transform(proxy, shell);
                    vis.set_if_neq(visibility(shell.visible));
                }
            }
        }
    }

    for request in labels.0.drain(..) {
        if let Some(label) = index.labels.get(&request.texture_slot) {
            redraw_label(&mut commands, label.text, &request.text);
            continue;
        }
        let image = images.add(renderer.label_target());
        let material = materials.add(renderer.label_material(image.clone()));
        let text = spawn_label_writer(
            &mut commands,
            request.texture_slot,
            image.clone(),
            &request.text,
        );
        let shell = index
            .slots
            .get(&SlotRef {
                class: ObjectClass::Block,
                index: request.texture_slot,
            })
            .and_then(|t| t.shell);
        if let Some(shell) = shell {
            commands
                .entity(shell)
                .insert(MeshMaterial3d(material.clone()));
        }
        index.labels.insert(
            request.texture_slot,
            LabelTexture {
                image,
                material,
                text,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::SpheresAndCubesRenderer;
    use crate::scene::labels::{LabelCamera, LabelText};
    use crate::sim::quality::QualityTier;
    use crate::sim::SimSettings;

    fn sync_app() -> App {
        let mut app = App::new();
        app.init_resource::<Assets<Mesh>>()
            .init_resource::<Assets<StandardMaterial>>()
            .init_resource::<Assets<Image>>()
            .init_resource::<GeometryCache>()
            .init_resource::<ProxyIndex>()
            .init_resource::<PendingLabels>()
            .insert_resource(RendererResource::new(SpheresAndCubesRenderer::default()))
            .insert_resource(Simulation::new(SimSettings::default(), QualityTier::Medium, 2))
            .add_systems(Update, sync_proxies);
        app
    }

    fn spawn_both(app: &mut App) {
        let labels = {
            let mut sim = app.world_mut().resource_mut::<Simulation>();
            sim.0.on_new_transaction_output(12.0).unwrap();
            sim.0.on_new_block(1_234.0).unwrap();
            sim.0.pool.take_label_requests()
        };
        app.world_mut().resource_mut::<PendingLabels>().0.extend(labels);
    }

    #[test]
    fn spawns_one_entity_per_slot_plus_block_shell() {
        let mut app = sync_app();
        spawn_both(&mut app);
        app.update();

        let world = app.world_mut();
        assert_eq!(world.query::<&PooledProxy>().iter(world).count(), 2);
        assert_eq!(world.query::<&LabelShellOf>().iter(world).count(), 1);
        assert_eq!(
            world
                .query::<&MeshMaterial3d<StandardMaterial>>()
                .iter(world)
                .count(),
            3
        );

        assert_eq!(world.query::<&LabelCamera>().iter(world).count(), 1);
        assert_eq!(world.query::<&LabelText>().iter(world).count(), 1);

        let index = app.world().resource::<ProxyIndex>();
        assert_eq!(index.len(), 2);
        let label = index.label(0).unwrap();
        assert_eq!(
            app.world().get::<Text2d>(label.text).map(|t| t.0.as_str()),
            Some("1,234")
        );
        assert!(app.world().resource::<PendingLabels>().0.is_empty());
    }

    #[test]
    fn transforms_follow_the_pool() {
        let mut app = sync_app();
        spawn_both(&mut app);
        app.update();

        app.world_mut().resource_mut::<Simulation>().0.frame();
        app.update();

        let slot = SlotRef {
            class: ObjectClass::Transaction,
            index: 0,
        };
        let entity = app.world().resource::<ProxyIndex>().entity(slot).unwrap();
        let sim = &app.world().resource::<Simulation>().0;
        let proxy = &sim.pool.slot(slot).unwrap().proxy;
        let tf = app.world().get::<Transform>(entity).unwrap();
        assert_eq!(tf.translation, proxy.translation);
        assert_eq!(tf.scale, Vec3::splat(proxy.scale));
    }

    #[test]
    fn recycled_slots_hide_and_drop_their_material() {
        let mut app = sync_app();
        spawn_both(&mut app);
        app.update();

        app.world_mut().resource_mut::<Simulation>().0.release_all();
        app.update();

        let slot = SlotRef {
            class: ObjectClass::Transaction,
            index: 0,
        };
        let index = app.world().resource::<ProxyIndex>();
        let entity = index.entity(slot).unwrap();
        let shell = index
            .shell(SlotRef {
                class: ObjectClass::Block,
                index: 0,
            })
            .unwrap();
        let world = app.world();
        assert_eq!(world.get::<Visibility>(entity), Some(&Visibility::Hidden));
        assert!(world.get::<MeshMaterial3d<StandardMaterial>>(entity).is_none());
        assert_eq!(world.get::<Visibility>(shell), Some(&Visibility::Hidden));
    }

    #[test]
    fn label_redraw_reuses_the_slot_texture() {
        let mut app = sync_app();
        spawn_both(&mut app);
        app.update();
        let first = app.world().resource::<ProxyIndex>().label(0).unwrap().image.clone();

        app.world_mut()
            .resource_mut::<PendingLabels>()
            .0
            .push(crate::sim::label::LabelRequest {
                texture_slot: 0,
                text: "99".into(),
            });
        app.update();

        let index = app.world().resource::<ProxyIndex>();
        let label = index.label(0).unwrap();
        assert_eq!(label.image, first);
        assert_eq!(
            app.world().get::<Text2d>(label.text).map(|t| t.0.as_str()),
            Some("99")
        );
        assert_eq!(app.world().resource::<Assets<Image>>().len(), 1);

        let world = app.world_mut();
        assert_eq!(world.query::<&LabelCamera>().iter(world).count(), 1);
    }
}
