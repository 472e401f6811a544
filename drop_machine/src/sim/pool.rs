//! Object pool: fixed-capacity slots of paired rigid bodies and render proxies.
//!
//! Each [`ObjectClass`] has its own slot array. Slots are created lazily on
//! first use and then recycled forever; bodies are never removed from the
//! world until [`ObjectPool::teardown`]. When a class is full, spawning evicts
//! the lowest-index inactive slot, or failing that the oldest live object.

use std::collections::HashMap;
use std::fmt;

use bevy::math::{Quat, Vec3};
use rand::Rng;
use rapier3d::prelude::*;
use thiserror::Error;

use crate::sim::label::{height_label, LabelRequest};
use crate::sim::quality::{QualityTier, SphereDetail};
use crate::sim::random::jitter;
use crate::sim::sizing::{dims_for, BodyDims};
use crate::sim::world::{
    to_vector, BodyHandles, PhysicsWorld, CONTACT_FRICTION, CONTACT_RESTITUTION,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Transaction,
    Block,
}

impl ObjectClass {
    pub const ALL: [ObjectClass; 2] = [ObjectClass::Transaction, ObjectClass::Block];
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectClass::Transaction => f.write_str("transaction"),
            ObjectClass::Block => f.write_str("block"),
        }
    }
}

/// Address of a slot: class plus index into that class's slot array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub class: ObjectClass,
    pub index: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("{class} slot {index} lost its rigid body or collider")]
    MissingBody { class: ObjectClass, index: usize },
}

/// Tuning for spawn placement, capacities and condemnation.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolSettings {
    pub transaction_capacity: usize,
    pub block_capacity: usize,
    pub drop_height: f32,
    pub spawn_jitter: f32,
    pub drop_spread: f32,
    pub drop_force: f32,
    pub spin: f32,
    pub damping: f32,
    pub condemn_y: f32,
    pub holding_position: Vec3,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            transaction_capacity: 250,
            block_capacity: 24,
            drop_height: 88.0,
            spawn_jitter: 23.0,
            drop_spread: 15.0,
            drop_force: 20.0,
            spin: 0.5,
            damping: 0.15,
            condemn_y: -300.0,
            holding_position: Vec3::new(0.0, 200.0, 0.0),
        }
    }
}

impl PoolSettings {
    pub fn capacity(&self, class: ObjectClass) -> usize {
        match class {
            ObjectClass::Transaction => self.transaction_capacity,
            ObjectClass::Block => self.block_capacity,
        }
    }
}

/// Shared mesh a proxy draws with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Geometry {
    Sphere(SphereDetail),
    Cube,
}

/// Surface a proxy draws with. Owned by the slot while it is live.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialKind {
    Swatch,
    SmallTransaction,
    Transaction,
    Block,
}

impl MaterialKind {
    pub fn for_transaction(magnitude: f64) -> Self {
        if magnitude < 1.0 {
            MaterialKind::Swatch
        } else if magnitude < 10.0 {
            MaterialKind::SmallTransaction
        } else {
            MaterialKind::Transaction
        }
    }
}

/// Outer decorative shell of a block, textured with the block height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelShell {
    pub scale: f32,
    pub visible: bool,
}

/// Render-ready state of a slot, mirrored from its body each tick.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderProxy {
    pub geometry: Geometry,
    pub material: Option<MaterialKind>,
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: f32,
    pub visible: bool,
    pub shell: Option<LabelShell>,
}

impl RenderProxy {
    fn hide(&mut self) {
        self.visible = false;
        self.material = None;
        if let Some(shell) = self.shell.as_mut() {
            shell.visible = false;
        }
    }
}

#[derive(Clone, Debug)]
pub struct PoolSlot {
    pub active: bool,
    pub lifetime_id: u64,
    pub magnitude: f64,
    pub dims: BodyDims,
    pub handles: BodyHandles,
    pub proxy: RenderProxy,
}

/// Where the next spawn of a class lands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotChoice {
    Fresh(usize),
    Reuse(usize),
}

impl SlotChoice {
    pub fn index(self) -> usize {
        match self {
            SlotChoice::Fresh(i) | SlotChoice::Reuse(i) => i,
        }
    }
}

/// Slot array, live count and lifetime counter of one class.
#[derive(Debug)]
pub struct ClassPool {
    class: ObjectClass,
    capacity: usize,
    slots: Vec<PoolSlot>,
    active_count: usize,
    next_lifetime: u64,
}

impl ClassPool {
    fn new(class: ObjectClass, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            class,
            capacity,
            slots: Vec::with_capacity(capacity),
            active_count: 0,
            next_lifetime: 0,
        }
    }

    pub fn class(&self) -> ObjectClass {
        self.class
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.active_count
    }

    pub fn slots(&self) -> &[PoolSlot] {
        &self.slots
    }

    pub fn spawned_total(&self) -> u64 {
        self.next_lifetime
    }

    /// Next unused index while slots remain; then the first inactive slot;
    /// then the live slot with the smallest lifetime id (lowest index on ties).
    pub fn choose_slot(&self) -> SlotChoice {
        if self.slots.len() < self.capacity {
            return SlotChoice::Fresh(self.slots.len());
        }
        if let Some(free) = self.slots.iter().position(|s| !s.active) {
            return SlotChoice::Reuse(free);
        }
        let oldest = self
            .slots
            .iter()
            .enumerate()
            .min_by_key(|(i, s)| (s.lifetime_id, *i))
            .map_or(0, |(i, _)| i);
        SlotChoice::Reuse(oldest)
    }

    /// Deactivate a slot, park its body out of view, and release its material.
    /// Returns whether the slot was live.
    fn recycle(&mut self, index: usize, world: &mut PhysicsWorld, holding: Vec3) -> bool {
        let Some(slot) = self.slots.get_mut(index) else {
            return false;
        };
        let was_active = slot.active;
        slot.active = false;
        slot.proxy.hide();
        if let Some((body, collider)) = world.body_and_collider_mut(slot.handles) {
            body.set_linvel(vector![0.0, 0.0, 0.0], false);
            body.set_angvel(vector![0.0, 0.0, 0.0], false);
            body.set_translation(to_vector(holding), false);
            body.sleep();
            collider.set_enabled(false);
        }
        slot.proxy.translation = holding;
        if was_active {
            self.active_count -= 1;
        }
        was_active
    }
}

/// Outcome of a successful spawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnReceipt {
    pub slot: SlotRef,
    pub lifetime_id: u64,
    pub dims: BodyDims,
    /// Lifetime id of the live object that was evicted to make room.
    pub evicted: Option<u64>,
}

pub struct ObjectPool {
    settings: PoolSettings,
    transactions: ClassPool,
    blocks: ClassPool,
    colliders: HashMap<ColliderHandle, SlotRef>,
    tier: QualityTier,
    labels: Vec<LabelRequest>,
}

impl ObjectPool {
    pub fn new(settings: PoolSettings, tier: QualityTier) -> Self {
        Self {
            transactions: ClassPool::new(
                ObjectClass::Transaction,
                settings.capacity(ObjectClass::Transaction),
            ),
            blocks: ClassPool::new(ObjectClass::Block, settings.capacity(ObjectClass::Block)),
            settings,
            colliders: HashMap::new(),
            tier,
            labels: Vec::new(),
        }
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn class(&self, class: ObjectClass) -> &ClassPool {
        match class {
            ObjectClass::Transaction => &self.transactions,
            ObjectClass::Block => &self.blocks,
        }
    }

    fn class_mut(&mut self, class: ObjectClass) -> &mut ClassPool {
        match class {
            ObjectClass::Transaction => &mut self.transactions,
            ObjectClass::Block => &mut self.blocks,
        }
    }

    pub fn slot(&self, slot: SlotRef) -> Option<&PoolSlot> {
        self.class(slot.class).slots.get(slot.index)
    }

    /// Slot whose collider is `handle`. Registered once, on the slot's first use.
    pub fn slot_for_collider(&self, handle: ColliderHandle) -> Option<SlotRef> {
        self.colliders.get(&handle).copied()
    }

    /// Label requests raised by block spawns since the last call.
    pub fn take_label_requests(&mut self) -> Vec<LabelRequest> {
        std::mem::take(&mut self.labels)
    }

    /// Turn `magnitude` into a falling object of `class`, evicting if full.
    /// Callers filter out non-positive magnitudes.
    pub fn spawn<R: Rng + ?Sized>(
        &mut self,
        world: &mut PhysicsWorld,
        rng: &mut R,
        class: ObjectClass,
        magnitude: f64,
    ) -> Result<SpawnReceipt, PoolError> {
        debug_assert!(magnitude > 0.0, "spawn magnitude must be positive");

        let dims = dims_for(class, magnitude);
        let holding = self.settings.holding_position;
        let tier = self.tier;
        let choice = self.class(class).choose_slot();
        let index = choice.index();
        let slot_ref = SlotRef { class, index };

        let evicted = match choice {
            SlotChoice::Fresh(_) => {
                let handles = world.add_body(
                    self.build_body(),
                    build_collider(class, dims).build(),
                );
                self.colliders.insert(handles.collider, slot_ref);
                self.class_mut(class).slots.push(PoolSlot {
                    active: false,
                    lifetime_id: 0,
                    magnitude,
                    dims,
                    handles,
                    proxy: RenderProxy {
                        geometry: geometry_for(class, magnitude, tier),
                        material: None,
                        translation: holding,
                        rotation: Quat::IDENTITY,
                        scale: dims.size,
                        visible: false,
                        shell: (class == ObjectClass::Block).then_some(LabelShell {
                            scale: dims.size * 1.01,
                            visible: false,
                        }),
                    },
                });
                None
            }
            SlotChoice::Reuse(i) => {
                let pool = self.class_mut(class);
                let victim = pool.slots[i].lifetime_id;
                let was_active = pool.recycle(i, world, holding);
                resize_in_place(world, pool.slots[i].handles, class, dims)
                    .ok_or(PoolError::MissingBody { class, index: i })?;
                was_active.then_some(victim)
            }
        };

        let placement = self.placement(rng, class);
        let pool = self.class_mut(class);
        let slot = &mut pool.slots[index];
        let (body, collider) = world
            .body_and_collider_mut(slot.handles)
            .ok_or(PoolError::MissingBody { class, index })?;
        collider.set_enabled(true);
        body.set_translation(to_vector(placement.position), false);
        body.set_linvel(to_vector(placement.velocity), false);
        body.set_angvel(to_vector(placement.spin), false);
        body.wake_up(true);

        slot.magnitude = magnitude;
        slot.dims = dims;
        slot.proxy.geometry = geometry_for(class, magnitude, tier);
        slot.proxy.material = Some(material_for(class, magnitude));
        slot.proxy.translation = placement.position;
        slot.proxy.scale = dims.size;
        slot.proxy.visible = true;
        if let Some(shell) = slot.proxy.shell.as_mut() {
            shell.scale = dims.size * 1.01;
            shell.visible = true;
        }
        slot.active = true;
        slot.lifetime_id = pool.next_lifetime;
        pool.next_lifetime += 1;
        pool.active_count += 1;
        let lifetime_id = slot.lifetime_id;

        if class == ObjectClass::Block {
            self.labels.push(LabelRequest {
                texture_slot: index,
                text: height_label(magnitude),
            });
        }

        Ok(SpawnReceipt {
            slot: slot_ref,
            lifetime_id,
            dims,
            evicted,
        })
    }

    /// Deactivate every slot of `class`. Bodies stay registered for reuse.
    pub fn release_all(&mut self, world: &mut PhysicsWorld, class: ObjectClass) -> usize {
        let holding = self.settings.holding_position;
        let pool = self.class_mut(class);
        (0..pool.slots.len())
            .filter(|&i| pool.recycle(i, world, holding))
            .count()
    }

    /// Mirror body transforms into proxies and recycle anything that fell
    /// below the condemnation line. Returns the condemned slots.
    pub fn tick(&mut self, world: &mut PhysicsWorld) -> Vec<SlotRef> {
        let condemn_y = self.settings.condemn_y;
        let holding = self.settings.holding_position;
        let mut condemned = Vec::new();
        for class in ObjectClass::ALL {
            let pool = self.class_mut(class);
            for index in 0..pool.slots.len() {
                let slot = &mut pool.slots[index];
                if !slot.active {
                    continue;
                }
                if let Some((translation, rotation)) = world.body_transform(slot.handles.body) {
                    slot.proxy.translation = translation;
                    slot.proxy.rotation = rotation;
                }
                if slot.proxy.translation.y < condemn_y {
                    pool.recycle(index, world, holding);
                    condemned.push(SlotRef { class, index });
                }
            }
        }
        condemned
    }

    /// Reselect transaction geometry for a new tier. Physics is untouched.
    pub fn set_tier(&mut self, tier: QualityTier) -> usize {
        self.tier = tier;
        let mut swapped = 0;
        for slot in self.transactions.slots.iter_mut().filter(|s| s.active) {
            slot.proxy.geometry = geometry_for(ObjectClass::Transaction, slot.magnitude, tier);
            swapped += 1;
        }
        swapped
    }

    /// Remove every pooled body from the world. The pool is empty afterwards.
    pub fn teardown(&mut self, world: &mut PhysicsWorld) {
        for class in ObjectClass::ALL {
            let pool = self.class_mut(class);
            for slot in pool.slots.drain(..) {
                world.remove_body(slot.handles.body);
            }
            pool.active_count = 0;
        }
        self.colliders.clear();
        self.labels.clear();
    }

    fn build_body(&self) -> RigidBody {
        RigidBodyBuilder::dynamic()
            .translation(to_vector(self.settings.holding_position))
            .linear_damping(self.settings.damping)
            .angular_damping(self.settings.damping)
            .build()
    }

    fn placement<R: Rng + ?Sized>(&self, rng: &mut R, class: ObjectClass) -> Placement {
        let s = &self.settings;
        let velocity = Vec3::new(0.0, -s.drop_force, 0.0);
        match class {
            ObjectClass::Transaction => Placement {
                position: Vec3::new(
                    jitter(rng, s.spawn_jitter),
                    s.drop_height + jitter(rng, s.drop_spread),
                    jitter(rng, s.spawn_jitter),
                ),
                velocity,
                spin: Vec3::new(jitter(rng, s.spin), jitter(rng, s.spin), jitter(rng, s.spin)),
            },
            ObjectClass::Block => Placement {
                position: Vec3::new(
                    jitter(rng, s.spawn_jitter / 3.0),
                    s.drop_height - s.drop_spread,
                    jitter(rng, s.spawn_jitter / 3.0),
                ),
                velocity,
                spin: Vec3::ZERO,
            },
        }
    }
}

struct Placement {
    position: Vec3,
    velocity: Vec3,
    spin: Vec3,
}

fn build_collider(class: ObjectClass, dims: BodyDims) -> ColliderBuilder {
    let builder = match class {
        ObjectClass::Transaction => ColliderBuilder::ball(dims.size),
        ObjectClass::Block => {
            let half = dims.size / 2.0;
            ColliderBuilder::cuboid(half, half, half)
        }
    };
    builder
        .mass(dims.mass)
        .friction(CONTACT_FRICTION)
        .restitution(CONTACT_RESTITUTION)
        .active_events(ActiveEvents::COLLISION_EVENTS)
}

fn resize_in_place(
    world: &mut PhysicsWorld,
    handles: BodyHandles,
    class: ObjectClass,
    dims: BodyDims,
) -> Option<()> {
    let (_, collider) = world.body_and_collider_mut(handles)?;
    let shape = match class {
        ObjectClass::Transaction => SharedShape::ball(dims.size),
        ObjectClass::Block => {
            let half = dims.size / 2.0;
            SharedShape::cuboid(half, half, half)
        }
    };
    collider.set_shape(shape);
    collider.set_mass(dims.mass);
    world.recompute_mass(handles.body);
    Some(())
}

fn geometry_for(class: ObjectClass, magnitude: f64, tier: QualityTier) -> Geometry {
    match class {
        ObjectClass::Transaction => {
            Geometry::Sphere(SphereDetail::for_transaction(magnitude, tier))
        }
        ObjectClass::Block => Geometry::Cube,
    }
}

fn material_for(class: ObjectClass, magnitude: f64) -> MaterialKind {
    match class {
        ObjectClass::Transaction => MaterialKind::for_transaction(magnitude),
        ObjectClass::Block => MaterialKind::Block,
    }
}
