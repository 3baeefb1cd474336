//! Integration tests for entity routing and frame dispatch through the world.

use std::sync::{Arc, Mutex};

use ember_ecs::{EcsError, EntityHandle, FrameData, System, SystemContext, World, MAX_ENTITIES};

#[derive(Debug, Clone, Copy, PartialEq)]
struct A(u32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct B(u32);
#[derive(Debug, Clone, Copy, PartialEq)]
struct C(u32);

/// Records which entities it matched, per frame.
#[derive(Default)]
struct NeedsAB {
    last_seen: Vec<EntityHandle>,
}

impl System for NeedsAB {
    fn update(&mut self, ctx: &mut SystemContext<'_>, _frame: &FrameData) {
        self.last_seen = ctx.entities().iter().copied().collect();
    }
}

type Log = Arc<Mutex<Vec<String>>>;

struct Phased {
    label: &'static str,
    log: Log,
}

impl Phased {
    fn push(&self, phase: &str) {
        self.log
            .lock()
            .expect("log poisoned")
            .push(format!("{}:{phase}", self.label));
    }
}

struct First(Phased);
struct Second(Phased);

impl System for First {
    fn pre_update(&mut self, _ctx: &mut SystemContext<'_>, _frame: &FrameData) {
        self.0.push("pre");
    }
    fn update(&mut self, _ctx: &mut SystemContext<'_>, _frame: &FrameData) {
        self.0.push("update");
    }
    fn post_update(&mut self, _ctx: &mut SystemContext<'_>, _frame: &FrameData) {
        self.0.push("post");
    }
}

impl System for Second {
    fn pre_update(&mut self, _ctx: &mut SystemContext<'_>, _frame: &FrameData) {
        self.0.push("pre");
    }
    // No update override
    fn post_update(&mut self, _ctx: &mut SystemContext<'_>, _frame: &FrameData) {
        self.0.push("post");
    }
}

#[test]
fn test_signature_gating_superset_only() {
    let mut world = World::new();
    let ab = world.signature_of::<(A, B)>();
    world.register_system(ab, NeedsAB::default());

    let only_a = world.create_entity("only_a");
    let both = world.create_entity("both");
    let all = world.create_entity("all");

    world.add_component(only_a, A(0));
    world.add_component(both, A(1));
    world.add_component(both, B(1));
    world.add_component(all, C(2));
    world.add_component(all, B(2));
    world.add_component(all, A(2));

    world.update_all_systems(&FrameData::new(0.016));
    assert_eq!(world.system::<NeedsAB>().unwrap().last_seen, vec![both, all]);

    world.remove_component::<B>(both);
    world.update_all_systems(&FrameData::new(0.016));
    assert_eq!(world.system::<NeedsAB>().unwrap().last_seen, vec![all]);

    // Removing an unrelated component keeps the match.
    world.remove_component::<C>(all);
    assert!(world.system_entities::<NeedsAB>().unwrap().contains(&all));
}

#[test]
fn test_recycling_through_world() {
    let mut world = World::new();
    let ab = world.signature_of::<(A, B)>();
    world.register_system(ab, NeedsAB::default());

    let handles: Vec<_> = (0..4).map(|i| world.create_entity(format!("e{i}"))).collect();
    for &entity in &handles {
        world.add_component(entity, A(0));
        world.add_component(entity, B(0));
    }

    world.destroy_entity(handles[2]);
    world.destroy_entity(handles[0]);
    assert_eq!(world.entity_count(), 2);

    let first = world.create_entity("first");
    let second = world.create_entity("second");
    assert_eq!((first, second), (handles[2], handles[0]));

    // Recycled handles start clean and do not inherit subscriptions.
    assert!(!world.has_component::<A>(first));
    assert!(!world.system_entities::<NeedsAB>().unwrap().contains(&first));
    assert_eq!(world.entity(first).unwrap().name(), "first");
}

#[test]
fn test_destroy_purges_components_of_every_type() {
    let mut world = World::new();
    let keep = world.create_entity("keep");
    let doomed = world.create_entity("doomed");

    for entity in [keep, doomed] {
        world.add_component(entity, A(entity.into()));
        world.add_component(entity, B(entity.into()));
        world.add_component(entity, C(entity.into()));
    }

    world.destroy_entity(doomed);
    assert!(!world.has_component::<A>(doomed));
    assert!(!world.has_component::<B>(doomed));
    assert!(!world.has_component::<C>(doomed));
    assert_eq!(world.component::<C>(keep), Some(&C(keep.into())));

    let storage = world.components().array::<A>().unwrap();
    assert_eq!(storage.len(), 1);
}

#[test]
fn test_phases_run_in_order_across_systems() {
    let log = Log::default();
    let mut world = World::new();
    world.register_system(
        ember_ecs::Signature::EMPTY,
        First(Phased {
            label: "first",
            log: Arc::clone(&log),
        }),
    );
    world.register_system(
        ember_ecs::Signature::EMPTY,
        Second(Phased {
            label: "second",
            log: Arc::clone(&log),
        }),
    );

    world.run_frame(&FrameData::new(0.016));

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec!["first:pre", "second:pre", "first:update", "first:post", "second:post"]
    );
}

#[test]
fn test_entity_capacity_is_hard() {
    let mut world = World::new();
    for i in 0..MAX_ENTITIES {
        world.create_entity(format!("e{i}"));
    }
    assert_eq!(
        world.try_create_entity("overflow"),
        Err(EcsError::TooManyEntities {
            capacity: MAX_ENTITIES
        })
    );

    world.destroy_entity(17);
    assert_eq!(world.create_entity("recycled"), 17);
}

#[test]
#[should_panic(expected = "has no component")]
fn test_remove_absent_component_panics() {
    let mut world = World::new();
    let entity = world.create_entity("bare");
    world.add_component(entity, A(0));
    world.remove_component::<B>(entity);
}
