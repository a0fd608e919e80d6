use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec3;

use arbor::collision::{Ray, Sphere};
use arbor::render::{LightInstance, RenderBinding, RenderableInstance};
use arbor::scene::{FrameTime, NodeHandle, NodeListener};
use arbor::{Scene, SceneError};

type Log = Rc<RefCell<Vec<String>>>;

/// Records every renderer call for assertions.
struct RecordingBinding {
    log: Log,
}

impl RenderBinding for RecordingBinding {
    fn attach_instance(&mut self, instance: RenderableInstance) {
        self.log.borrow_mut().push(format!("attach:{}", instance.0));
    }
    fn detach_instance(&mut self, instance: RenderableInstance) {
        self.log.borrow_mut().push(format!("detach:{}", instance.0));
    }
    fn attach_light(&mut self, light: LightInstance) {
        self.log.borrow_mut().push(format!("attach_light:{}", light.0));
    }
    fn detach_light(&mut self, light: LightInstance) {
        self.log.borrow_mut().push(format!("detach_light:{}", light.0));
    }
}

fn scene_with_log() -> (Scene, Log) {
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let scene = Scene::with_binding(Box::new(RecordingBinding { log: log.clone() }));
    (scene, log)
}

/// Appends a tagged entry to the log on every lifecycle transition.
struct Recorder {
    log: Log,
    tag: &'static str,
}

impl NodeListener for Recorder {
    fn on_activated(&mut self, _scene: &mut Scene, _node: NodeHandle) {
        self.log.borrow_mut().push(format!("{}:activated", self.tag));
    }
    fn on_updated(&mut self, _scene: &mut Scene, _node: NodeHandle, _frame: &FrameTime) {
        self.log.borrow_mut().push(format!("{}:updated", self.tag));
    }
    fn on_deactivated(&mut self, _scene: &mut Scene, _node: NodeHandle) {
        self.log.borrow_mut().push(format!("{}:deactivated", self.tag));
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

#[test]
fn attach_and_children_order() {
    let mut scene = Scene::new();
    let root = scene.create_node();
    let a = scene.create_node();
    let b = scene.create_node();
    scene.attach_to_root(root).unwrap();
    scene.attach(a, root).unwrap();
    scene.attach(b, root).unwrap();

    assert_eq!(scene.get_node(root).unwrap().children(), &[a, b]);
    assert_eq!(scene.get_node(a).unwrap().parent(), Some(root));
    assert_eq!(scene.root_nodes, vec![root]);
}

#[test]
fn attach_to_self_is_rejected() {
    let mut scene = Scene::new();
    let node = scene.create_node();
    assert!(matches!(
        scene.attach(node, node),
        Err(SceneError::CycleDetected { .. })
    ));
}

#[test]
fn attach_to_descendant_is_rejected_without_mutation() {
    let mut scene = Scene::new();
    let root = scene.create_node();
    let child = scene.create_node();
    let grandchild = scene.create_node();
    scene.attach_to_root(root).unwrap();
    scene.attach(child, root).unwrap();
    scene.attach(grandchild, child).unwrap();

    assert!(matches!(
        scene.attach(root, grandchild),
        Err(SceneError::CycleDetected { .. })
    ));
    // The rejected call left the tree untouched.
    assert_eq!(scene.get_node(root).unwrap().children(), &[child]);
    assert_eq!(scene.get_node(root).unwrap().parent(), None);
    assert_eq!(scene.root_nodes, vec![root]);
}

#[test]
fn dead_handle_is_rejected() {
    let mut scene = Scene::new();
    let root = scene.create_node();
    let doomed = scene.create_node();
    scene.attach_to_root(root).unwrap();
    scene.remove_node(doomed);

    assert!(matches!(
        scene.attach(doomed, root),
        Err(SceneError::NodeNotFound(_))
    ));
    assert!(matches!(
        scene.attach(root, doomed),
        Err(SceneError::NodeNotFound(_))
    ));
}

#[test]
fn reattach_moves_between_parents() {
    let mut scene = Scene::new();
    let a = scene.create_node();
    let b = scene.create_node();
    let child = scene.create_node();
    scene.attach_to_root(a).unwrap();
    scene.attach_to_root(b).unwrap();
    scene.attach(child, a).unwrap();
    scene.attach(child, b).unwrap();

    assert!(scene.get_node(a).unwrap().children().is_empty());
    assert_eq!(scene.get_node(b).unwrap().children(), &[child]);
    assert_eq!(scene.get_node(child).unwrap().parent(), Some(b));
}

#[test]
fn remove_node_drops_subtree() {
    let mut scene = Scene::new();
    let root = scene.create_node();
    let child = scene.create_node();
    let grandchild = scene.create_node();
    scene.attach_to_root(root).unwrap();
    scene.attach(child, root).unwrap();
    scene.attach(grandchild, child).unwrap();
    assert_eq!(scene.node_count(), 3);

    scene.remove_node(child);
    assert_eq!(scene.node_count(), 1);
    assert!(scene.get_node(child).is_none());
    assert!(scene.get_node(grandchild).is_none());
    assert!(scene.get_node(root).unwrap().children().is_empty());
}

// ============================================================================
// Names
// ============================================================================

#[test]
fn find_by_name_breadth_first() {
    let mut scene = Scene::new();
    let root = scene.create_node_with_name("root");
    let shallow = scene.create_node_with_name("target");
    let deep_parent = scene.create_node();
    let deep = scene.create_node_with_name("target");
    scene.attach_to_root(root).unwrap();
    scene.attach(deep_parent, root).unwrap();
    scene.attach(deep, deep_parent).unwrap();
    scene.attach(shallow, root).unwrap();

    // Both match; the shallower node wins.
    assert_eq!(scene.find_by_name("target"), Some(shallow));
    assert_eq!(scene.find_by_name("missing"), None);
}

#[test]
fn set_name() {
    let mut scene = Scene::new();
    let node = scene.create_node();
    scene.attach_to_root(node).unwrap();
    scene.set_name(node, "anchor");
    assert_eq!(scene.get_name(node), Some("anchor"));
    assert_eq!(scene.find_by_name("anchor"), Some(node));
}

// ============================================================================
// Activation lifecycle
// ============================================================================

#[test]
fn active_requires_scene_membership() {
    let mut scene = Scene::new();
    let node = scene.create_node();
    assert!(!scene.get_node(node).unwrap().is_active());
    assert!(scene.get_node(node).unwrap().is_enabled());

    scene.attach_to_root(node).unwrap();
    assert!(scene.get_node(node).unwrap().is_active());
    assert!(scene.get_node(node).unwrap().is_in_scene());

    scene.detach(node).unwrap();
    assert!(!scene.get_node(node).unwrap().is_active());
    assert!(!scene.get_node(node).unwrap().is_in_scene());
}

#[test]
fn disabling_ancestor_deactivates_subtree() {
    let mut scene = Scene::new();
    let root = scene.create_node();
    let child = scene.create_node();
    scene.attach_to_root(root).unwrap();
    scene.attach(child, root).unwrap();
    assert!(scene.get_node(child).unwrap().is_active());

    scene.set_enabled(root, false);
    assert!(!scene.get_node(root).unwrap().is_active());
    assert!(!scene.get_node(child).unwrap().is_active());
    // The child still wants to be active; only the ancestor gate closed.
    assert!(scene.get_node(child).unwrap().is_enabled());

    scene.set_enabled(root, true);
    assert!(scene.get_node(child).unwrap().is_active());
}

#[test]
fn disabled_child_stays_inactive_under_active_parent() {
    let mut scene = Scene::new();
    let root = scene.create_node();
    let child = scene.create_node();
    scene.attach_to_root(root).unwrap();
    scene.attach(child, root).unwrap();

    scene.set_enabled(child, false);
    assert!(scene.get_node(root).unwrap().is_active());
    assert!(!scene.get_node(child).unwrap().is_active());
}

#[test]
fn lifecycle_listeners_fire_once_per_transition() {
    let mut scene = Scene::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let parent = scene.create_node();
    let child = scene.create_node();
    scene.add_node_listener(
        parent,
        Box::new(Recorder {
            log: log.clone(),
            tag: "parent",
        }),
    );
    scene.add_node_listener(
        child,
        Box::new(Recorder {
            log: log.clone(),
            tag: "child",
        }),
    );
    scene.attach(child, parent).unwrap();
    assert!(log.borrow().is_empty());

    // Attaching the subtree activates parent before child.
    scene.attach_to_root(parent).unwrap();
    assert_eq!(*log.borrow(), vec!["parent:activated", "child:activated"]);

    log.borrow_mut().clear();
    scene.set_enabled(parent, false);
    assert_eq!(*log.borrow(), vec!["parent:deactivated", "child:deactivated"]);

    // Disabling again is a no-op transition.
    log.borrow_mut().clear();
    scene.set_enabled(parent, false);
    assert!(log.borrow().is_empty());
}

#[test]
fn remove_node_deactivates_before_dropping() {
    let mut scene = Scene::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let node = scene.create_node();
    scene.add_node_listener(
        node,
        Box::new(Recorder {
            log: log.clone(),
            tag: "n",
        }),
    );
    scene.attach_to_root(node).unwrap();
    scene.remove_node(node);
    assert_eq!(*log.borrow(), vec!["n:activated", "n:deactivated"]);
}

// ============================================================================
// Renderer binding
// ============================================================================

#[test]
fn renderable_follows_activation() {
    let (mut scene, log) = scene_with_log();
    let node = scene.create_node();
    scene.set_renderable(node, Some(RenderableInstance(7)));
    // Detached: nothing reaches the renderer.
    assert!(log.borrow().is_empty());

    scene.attach_to_root(node).unwrap();
    assert_eq!(*log.borrow(), vec!["attach:7"]);

    scene.set_enabled(node, false);
    assert_eq!(*log.borrow(), vec!["attach:7", "detach:7"]);
}

#[test]
fn swapping_renderable_while_active() {
    let (mut scene, log) = scene_with_log();
    let node = scene.create_node();
    scene.attach_to_root(node).unwrap();

    scene.set_renderable(node, Some(RenderableInstance(1)));
    scene.set_renderable(node, Some(RenderableInstance(2)));
    scene.set_renderable(node, None);
    assert_eq!(*log.borrow(), vec!["attach:1", "detach:1", "attach:2", "detach:2"]);
}

#[test]
fn remove_active_node_detaches_renderable_and_collider() {
    let (mut scene, log) = scene_with_log();
    let node = scene.create_node();
    scene.set_renderable(node, Some(RenderableInstance(9)));
    scene.attach_to_root(node).unwrap();
    scene.set_local_position(node, Vec3::new(0.0, 0.0, -5.0));
    scene.set_collision_shape(node, Some(Sphere::new(Vec3::ZERO, 1.0).into()));

    let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
    assert!(scene.hit_test(&ray).is_some());

    // Removal mid-flight deactivates first, so the renderer sees the
    // detach and the collider leaves the query set before the node drops.
    scene.remove_node(node);
    assert_eq!(*log.borrow(), vec!["attach:9", "detach:9"]);
    assert!(scene.hit_test(&ray).is_none());
    assert_eq!(scene.collision_system().attached_count(), 0);
    assert!(scene.get_node(node).is_none());
}

#[test]
fn light_follows_activation() {
    let (mut scene, log) = scene_with_log();
    let node = scene.create_node();
    scene.set_light(node, Some(LightInstance(3)));
    scene.attach_to_root(node).unwrap();
    scene.detach(node).unwrap();
    assert_eq!(*log.borrow(), vec!["attach_light:3", "detach_light:3"]);
}

// ============================================================================
// Update dispatch
// ============================================================================

#[test]
fn update_listeners_run_before_node_hooks() {
    let mut scene = Scene::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let node = scene.create_node();
    scene.add_node_listener(
        node,
        Box::new(Recorder {
            log: log.clone(),
            tag: "node",
        }),
    );
    scene.attach_to_root(node).unwrap();
    log.borrow_mut().clear();

    let scene_log = log.clone();
    scene.add_update_listener(Box::new(move |frame| {
        scene_log
            .borrow_mut()
            .push(format!("scene:{}", frame.delta_seconds));
    }));

    scene.dispatch_update(&FrameTime {
        delta_seconds: 0.016,
        total_seconds: 1.0,
    });
    assert_eq!(*log.borrow(), vec!["scene:0.016", "node:updated"]);
}

#[test]
fn update_skips_inactive_subtrees() {
    let mut scene = Scene::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let active = scene.create_node();
    let disabled = scene.create_node();
    let hidden_child = scene.create_node();
    for (handle, tag) in [(active, "active"), (disabled, "disabled"), (hidden_child, "child")] {
        scene.add_node_listener(
            handle,
            Box::new(Recorder {
                log: log.clone(),
                tag,
            }),
        );
    }
    scene.attach_to_root(active).unwrap();
    scene.attach_to_root(disabled).unwrap();
    scene.attach(hidden_child, disabled).unwrap();
    scene.set_enabled(disabled, false);
    log.borrow_mut().clear();

    scene.dispatch_update(&FrameTime::default());
    assert_eq!(*log.borrow(), vec!["active:updated"]);
}

#[test]
fn update_order_is_depth_first() {
    let mut scene = Scene::new();
    let log: Log = Rc::new(RefCell::new(Vec::new()));
    let first = scene.create_node();
    let first_child = scene.create_node();
    let second = scene.create_node();
    for (handle, tag) in [(first, "a"), (first_child, "a1"), (second, "b")] {
        scene.add_node_listener(
            handle,
            Box::new(Recorder {
                log: log.clone(),
                tag,
            }),
        );
    }
    scene.attach_to_root(first).unwrap();
    scene.attach(first_child, first).unwrap();
    scene.attach_to_root(second).unwrap();
    log.borrow_mut().clear();

    scene.dispatch_update(&FrameTime::default());
    assert_eq!(*log.borrow(), vec!["a:updated", "a1:updated", "b:updated"]);
}

// ============================================================================
// Hit testing & overlap through the scene
// ============================================================================

#[test]
fn hit_test_returns_closest_node() {
    let mut scene = Scene::new();
    let near = scene.create_node();
    let far = scene.create_node();
    scene.attach_to_root(near).unwrap();
    scene.attach_to_root(far).unwrap();
    scene.set_local_position(near, Vec3::new(0.0, 0.0, -5.0));
    scene.set_local_position(far, Vec3::new(0.0, 0.0, -10.0));
    scene.set_collision_shape(near, Some(Sphere::new(Vec3::ZERO, 1.0).into()));
    scene.set_collision_shape(far, Some(Sphere::new(Vec3::ZERO, 1.0).into()));

    let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
    let hit = scene.hit_test(&ray).unwrap();
    assert_eq!(hit.node, near);
    assert!((hit.distance - 4.0).abs() < 1e-4);
    assert!((hit.point - Vec3::new(0.0, 0.0, -4.0)).length() < 1e-4);
}

#[test]
fn hit_test_all_sorted_by_distance() {
    let mut scene = Scene::new();
    let near = scene.create_node();
    let far = scene.create_node();
    scene.attach_to_root(far).unwrap();
    scene.attach_to_root(near).unwrap();
    scene.set_local_position(near, Vec3::new(0.0, 0.0, -5.0));
    scene.set_local_position(far, Vec3::new(0.0, 0.0, -10.0));
    scene.set_collision_shape(near, Some(Sphere::new(Vec3::ZERO, 1.0).into()));
    scene.set_collision_shape(far, Some(Sphere::new(Vec3::ZERO, 1.0).into()));

    let hits = scene.hit_test_all(&Ray::new(Vec3::ZERO, Vec3::NEG_Z));
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].node, near);
    assert_eq!(hits[1].node, far);
    assert!(hits[0].distance < hits[1].distance);
}

#[test]
fn inactive_collider_is_not_hit() {
    let mut scene = Scene::new();
    let node = scene.create_node();
    scene.attach_to_root(node).unwrap();
    scene.set_local_position(node, Vec3::new(0.0, 0.0, -5.0));
    scene.set_collision_shape(node, Some(Sphere::new(Vec3::ZERO, 1.0).into()));

    let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
    assert!(scene.hit_test(&ray).is_some());

    scene.set_enabled(node, false);
    assert!(scene.hit_test(&ray).is_none());

    scene.set_enabled(node, true);
    assert!(scene.hit_test(&ray).is_some());
}

#[test]
fn hit_test_follows_ancestor_transform() {
    let mut scene = Scene::new();
    let root = scene.create_node();
    let child = scene.create_node();
    scene.attach_to_root(root).unwrap();
    scene.attach(child, root).unwrap();
    scene.set_collision_shape(child, Some(Sphere::new(Vec3::ZERO, 1.0).into()));

    let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
    scene.set_local_position(root, Vec3::new(0.0, 0.0, -5.0));
    assert!(scene.hit_test(&ray).is_some());

    scene.set_local_position(root, Vec3::new(50.0, 0.0, -5.0));
    assert!(scene.hit_test(&ray).is_none());
}

#[test]
fn scaled_sphere_collider_grows() {
    let mut scene = Scene::new();
    let node = scene.create_node();
    scene.attach_to_root(node).unwrap();
    scene.set_local_position(node, Vec3::new(0.0, 3.0, -5.0));
    scene.set_collision_shape(node, Some(Sphere::new(Vec3::ZERO, 1.0).into()));

    // Radius 1 at y=3: the -Z ray misses.
    let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
    assert!(scene.hit_test(&ray).is_none());

    // Non-uniform scale uses the largest component as a conservative radius.
    scene.set_local_scale(node, Vec3::new(1.0, 1.0, 4.0));
    assert!(scene.hit_test(&ray).is_some());
}

#[test]
fn overlap_maps_back_to_nodes() {
    let mut scene = Scene::new();
    let a = scene.create_node();
    let b = scene.create_node();
    let c = scene.create_node();
    for handle in [a, b, c] {
        scene.attach_to_root(handle).unwrap();
        scene.set_collision_shape(handle, Some(Sphere::new(Vec3::ZERO, 1.0).into()));
    }
    scene.set_local_position(b, Vec3::new(1.5, 0.0, 0.0));
    scene.set_local_position(c, Vec3::new(10.0, 0.0, 0.0));

    assert_eq!(scene.overlap(a), Some(b));
    assert_eq!(scene.overlap(c), None);
    assert_eq!(scene.overlap_all(a), vec![b]);
}

#[test]
fn clearing_collision_shape_removes_collider() {
    let mut scene = Scene::new();
    let node = scene.create_node();
    scene.attach_to_root(node).unwrap();
    scene.set_local_position(node, Vec3::new(0.0, 0.0, -5.0));
    scene.set_collision_shape(node, Some(Sphere::new(Vec3::ZERO, 1.0).into()));
    assert!(scene.get_node(node).unwrap().collider().is_some());

    scene.set_collision_shape(node, None);
    assert!(scene.get_node(node).unwrap().collider().is_none());
    assert!(scene.hit_test(&Ray::new(Vec3::ZERO, Vec3::NEG_Z)).is_none());
    assert_eq!(scene.collision_system().attached_count(), 0);
}

// ============================================================================
// Scene identity
// ============================================================================

#[test]
fn scene_ids_are_unique() {
    let a = Scene::new();
    let b = Scene::new();
    assert_ne!(a.id, b.id);
}
