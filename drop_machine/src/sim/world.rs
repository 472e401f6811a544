//! Rigid-body world: rapier pipeline, arena colliders, and contact sampling.

use std::num::NonZeroUsize;

use bevy::math::{Quat, Vec3};
use crossbeam_channel::{Receiver, Sender};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;

use crate::sim::quality::TierSettings;

/// Friction/restitution shared by every collider (billiard-like contact).
pub const CONTACT_FRICTION: f32 = 0.01;
pub const CONTACT_RESTITUTION: f32 = 0.005;

/// Dimensions of the static arena the objects land on.
#[derive(Clone, Debug, PartialEq)]
pub struct ArenaSettings {
    pub radius: f32,
    pub height: f32,
    pub floor_y: f32,
    /// The auxiliary box is `radius * guard_ratio` wide on each side of the centre.
    pub guard_ratio: f32,
    pub guard_half_height: f32,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            radius: 50.0,
            height: 100.0,
            floor_y: 0.5,
            guard_ratio: 0.69,
            guard_half_height: 1.0,
        }
    }
}

impl ArenaSettings {
    /// Centre of the plinth cylinder; its top face sits at `floor_y`.
    pub fn cylinder_center_y(&self) -> f32 {
        self.floor_y - self.height / 2.0
    }
}

/// Velocity and position of a pooled body at the moment a contact began.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactSample {
    pub collider: ColliderHandle,
    pub velocity: Vec3,
    pub position: Vec3,
}

/// Forwards contact starts from inside the pipeline step. Bodies are sampled
/// before the solver resolves the contact, so the impact speed is preserved.
struct ContactCollector {
    tx: Sender<ContactSample>,
}

impl ContactCollector {
    fn sample(&self, bodies: &RigidBodySet, colliders: &ColliderSet, handle: ColliderHandle) {
        let Some(body) = colliders
            .get(handle)
            .and_then(|c| c.parent())
            .and_then(|b| bodies.get(b))
        else {
            return;
        };
        if !body.is_dynamic() {
            return;
        }
        let _ = self.tx.send(ContactSample {
            collider: handle,
            velocity: to_vec3(body.linvel()),
            position: to_vec3(body.translation()),
        });
    }
}

impl EventHandler for ContactCollector {
    fn handle_collision_event(
        &self,
        bodies: &RigidBodySet,
        colliders: &ColliderSet,
        event: CollisionEvent,
        _contact_pair: Option<&ContactPair>,
    ) {
        if let CollisionEvent::Started(h1, h2, _) = event {
            self.sample(bodies, colliders, h1);
            self.sample(bodies, colliders, h2);
        }
    }

    fn handle_contact_force_event(
        &self,
        _dt: Real,
        _bodies: &RigidBodySet,
        _colliders: &ColliderSet,
        _contact_pair: &ContactPair,
        _total_force_magnitude: Real,
    ) {
    }
}

/// Handles of a body registered with the world and its single collider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BodyHandles {
    pub body: RigidBodyHandle,
    pub collider: ColliderHandle,
}

/// Owns the rapier sets and pipeline; stepped once per frame at a fixed dt.
pub struct PhysicsWorld {
    gravity: Vector<Real>,
    params: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    collector: ContactCollector,
    contacts: Receiver<ContactSample>,
    steps: u64,
}

impl PhysicsWorld {
    pub fn new(settings: TierSettings) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut world = Self {
            gravity: vector![0.0, 0.0, 0.0],
            params: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            collector: ContactCollector { tx },
            contacts: rx,
            steps: 0,
        };
        world.configure(settings);
        world
    }

    /// Apply timestep, gravity and solver iterations for a quality tier.
    pub fn configure(&mut self, settings: TierSettings) {
        self.gravity = vector![0.0, settings.gravity, 0.0];
        self.params.dt = settings.timestep();
        self.params.num_solver_iterations =
            NonZeroUsize::new(settings.solver_iterations).unwrap_or(NonZeroUsize::MIN);
    }

    pub fn timestep(&self) -> f32 {
        self.params.dt
    }

    pub fn gravity(&self) -> Vec3 {
        to_vec3(&self.gravity)
    }

    pub fn solver_iterations(&self) -> usize {
        self.params.num_solver_iterations.get()
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Advance the simulation by one fixed timestep.
    pub fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &self.collector,
        );
        self.steps += 1;
    }

    /// Contacts observed since the last drain.
    pub fn drain_contacts(&self) -> impl Iterator<Item = ContactSample> + '_ {
        self.contacts.try_iter()
    }

    /// Register a dynamic body with one collider attached.
    pub fn add_body(&mut self, body: RigidBody, collider: Collider) -> BodyHandles {
        let body = self.bodies.insert(body);
        let collider = self
            .colliders
            .insert_with_parent(collider, body, &mut self.bodies);
        BodyHandles { body, collider }
    }

    /// Plinth cylinder plus the invisible guard box under the visible floor.
    /// Discrete collision lets fast bodies tunnel through thin static geometry,
    /// the guard box catches them.
    pub fn add_static_geometry(&mut self, arena: &ArenaSettings) -> [ColliderHandle; 2] {
        let plinth = ColliderBuilder::cylinder(arena.height / 2.0, arena.radius * 1.01)
            .translation(vector![0.0, arena.cylinder_center_y(), 0.0])
            .friction(CONTACT_FRICTION)
            .restitution(CONTACT_RESTITUTION)
            .build();
        let guard_half = arena.radius * arena.guard_ratio;
        let guard = ColliderBuilder::cuboid(guard_half, arena.guard_half_height, guard_half)
            .translation(vector![0.0, arena.floor_y - arena.guard_half_height, 0.0])
            .friction(CONTACT_FRICTION)
            .restitution(CONTACT_RESTITUTION)
            .build();
        [self.colliders.insert(plinth), self.colliders.insert(guard)]
    }

    pub fn body(&self, handle: RigidBodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: RigidBodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    pub fn collider(&self, handle: ColliderHandle) -> Option<&Collider> {
        self.colliders.get(handle)
    }

    /// Mutable body and collider together, as needed to resize in place.
    pub fn body_and_collider_mut(
        &mut self,
        handles: BodyHandles,
    ) -> Option<(&mut RigidBody, &mut Collider)> {
        let collider = self.colliders.get_mut(handles.collider)?;
        let body = self.bodies.get_mut(handles.body)?;
        Some((body, collider))
    }

    pub fn recompute_mass(&mut self, handle: RigidBodyHandle) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.recompute_mass_properties_from_colliders(&self.colliders);
        }
    }

    pub fn body_transform(&self, handle: RigidBodyHandle) -> Option<(Vec3, Quat)> {
        self.bodies
            .get(handle)
            .map(|b| (to_vec3(b.translation()), to_quat(b.rotation())))
    }

    /// Drop a body from the simulation entirely. Only used at teardown and in tests.
    pub fn remove_body(&mut self, handle: RigidBodyHandle) {
        self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        );
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

pub fn to_vec3(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

pub fn to_quat(q: &Rotation<Real>) -> Quat {
    let c = q.coords;
    Quat::from_xyzw(c.x, c.y, c.z, c.w)
}

pub fn to_rotation(q: Quat) -> Rotation<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}
