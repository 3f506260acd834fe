//! Tree editing, reference counting, lookups and cloning
//!
//! Parents own their children through an explicit reference count: attaching
//! grabs the child, detaching drops it, and a node whose count reaches zero
//! is destroyed together with every child that loses its last reference.
//! Precondition violations (missing nodes, self attachment, cycles) are
//! absorbed as no-ops.

use crate::foundation::math::Vec3;
use crate::scene::animators::AnimatorRef;
use crate::scene::{SceneManager, SceneNode, SceneNodeId, SceneNodeKind, SceneNodeType, TransformNode, AABB};
use std::rc::Rc;

/// Detached copy of a subtree, ready to be instantiated in any manager
struct NodeSnapshot {
    name: String,
    id: i32,
    transform: TransformNode,
    is_visible: bool,
    is_debug_object: bool,
    automatic_culling: crate::scene::AutomaticCulling,
    debug_data_visible: crate::scene::DebugData,
    kind: Box<dyn SceneNodeKind>,
    animators: Vec<AnimatorRef>,
    children: Vec<NodeSnapshot>,
}

impl SceneManager {
    // ========================================================================
    // Reference counting
    // ========================================================================

    /// Take a reference on a node; returns false for a dead handle
    pub fn grab(&mut self, id: SceneNodeId) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.reference_count += 1;
                true
            }
            None => false,
        }
    }

    /// Release a reference; returns whether the node was destroyed
    pub fn drop_node(&mut self, id: SceneNodeId) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        debug_assert!(node.reference_count > 0, "node {id:?} dropped without a reference");
        node.reference_count = node.reference_count.saturating_sub(1);
        if node.reference_count > 0 {
            return false;
        }
        self.destroy(id);
        true
    }

    /// Current reference count, 0 for a dead handle
    pub fn reference_count(&self, id: SceneNodeId) -> u32 {
        self.nodes.get(id).map_or(0, SceneNode::reference_count)
    }

    fn destroy(&mut self, id: SceneNodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            let Some(node) = self.nodes.remove(current) else {
                continue;
            };
            if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(p)) {
                parent.children.retain(|child| *child != current);
            }
            for child in node.children {
                let Some(child_node) = self.nodes.get_mut(child) else {
                    continue;
                };
                child_node.parent = None;
                child_node.reference_count = child_node.reference_count.saturating_sub(1);
                if child_node.reference_count == 0 {
                    pending.push(child);
                }
            }
            log::debug!(
                "Destroyed {} node {:?} ({} animators released)",
                node.kind.node_type(),
                current,
                node.animators.len()
            );
        }
    }

    // ========================================================================
    // Structure
    // ========================================================================

    /// Whether `ancestor` is `id` or lies on the path from `id` to the root
    pub fn is_ancestor_or_self(&self, ancestor: SceneNodeId, id: SceneNodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.nodes.get(node).and_then(|n| n.parent);
        }
        false
    }

    /// Attach `child` below `parent`, detaching it from its old parent first
    ///
    /// Ignored when either node is dead, when `child == parent`, or when
    /// `child` is an ancestor of `parent`.
    pub fn add_child(&mut self, parent: SceneNodeId, child: SceneNodeId) {
        if parent == child || !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return;
        }
        if self.is_ancestor_or_self(child, parent) {
            log::warn!("Refusing to attach {:?} below its own descendant {:?}", child, parent);
            return;
        }

        self.grab(child);
        self.remove(child);
        if let Some(parent_node) = self.nodes.get_mut(parent) {
            parent_node.children.push(child);
        }
        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = Some(parent);
        }
    }

    /// Detach a direct child; returns false if `child` is not one
    pub fn remove_child(&mut self, parent: SceneNodeId, child: SceneNodeId) -> bool {
        if self.nodes.get(child).and_then(|n| n.parent) != Some(parent) {
            return false;
        }
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return false;
        };
        let Some(index) = parent_node.children.iter().position(|c| *c == child) else {
            return false;
        };
        parent_node.children.remove(index);
        debug_assert!(!parent_node.children.contains(&child), "child listed twice");

        if let Some(child_node) = self.nodes.get_mut(child) {
            child_node.parent = None;
        }
        self.drop_node(child);
        true
    }

    /// Detach every child of `parent`; animators are untouched
    pub fn remove_all(&mut self, parent: SceneNodeId) {
        let Some(parent_node) = self.nodes.get_mut(parent) else {
            return;
        };
        let children = std::mem::take(&mut parent_node.children);
        for child in children {
            if let Some(child_node) = self.nodes.get_mut(child) {
                child_node.parent = None;
            }
            self.drop_node(child);
        }
    }

    /// Detach a node from its parent; no-op when already detached
    pub fn remove(&mut self, id: SceneNodeId) {
        if let Some(parent) = self.nodes.get(id).and_then(|n| n.parent) {
            self.remove_child(parent, id);
        }
    }

    /// Move a node below `new_parent`, or detach it with `None`
    ///
    /// The node survives even if its old parent held the last reference,
    /// unless it ends up detached with no other owner.
    pub fn set_parent(&mut self, id: SceneNodeId, new_parent: Option<SceneNodeId>) {
        if let Some(parent) = new_parent {
            if self.is_ancestor_or_self(id, parent) {
                log::warn!("Refusing to move {:?} below its own descendant {:?}", id, parent);
                return;
            }
        }
        if !self.grab(id) {
            return;
        }
        self.remove(id);
        if let Some(parent) = new_parent {
            self.add_child(parent, id);
        }
        self.drop_node(id);
    }

    /// Parent of a node
    pub fn parent_of(&self, id: SceneNodeId) -> Option<SceneNodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    /// Children of a node, empty for a dead handle
    pub fn children_of(&self, id: SceneNodeId) -> &[SceneNodeId] {
        self.nodes.get(id).map_or(&[][..], |n| n.children.as_slice())
    }

    // ========================================================================
    // Animators
    // ========================================================================

    /// Attach an animator to a node
    pub fn add_animator(&mut self, id: SceneNodeId, animator: AnimatorRef) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.animators.push(animator);
        }
    }

    /// Detach one animator; returns false if it was not attached
    pub fn remove_animator(&mut self, id: SceneNodeId, animator: &AnimatorRef) -> bool {
        let Some(node) = self.nodes.get_mut(id) else {
            return false;
        };
        match node.animators.iter().position(|a| Rc::ptr_eq(a, animator)) {
            Some(index) => {
                node.animators.remove(index);
                true
            }
            None => false,
        }
    }

    /// Detach every animator of a node
    pub fn remove_animators(&mut self, id: SceneNodeId) {
        if let Some(node) = self.nodes.get_mut(id) {
            node.animators.clear();
        }
    }

    // ========================================================================
    // Transforms and visibility
    // ========================================================================

    /// Recompute a node's absolute transform from its parent's cached one
    ///
    /// Children are not updated.
    pub fn update_absolute_position(&mut self, id: SceneNodeId) {
        let parent_absolute = self
            .nodes
            .get(id)
            .and_then(|n| n.parent)
            .and_then(|p| self.nodes.get(p))
            .map(|p| *p.absolute_transformation());
        if let Some(node) = self.nodes.get_mut(id) {
            node.transform.update_absolute(parent_absolute.as_ref());
        }
    }

    /// Visible flag of the node and all of its ancestors
    pub fn is_truly_visible(&self, id: SceneNodeId) -> bool {
        let mut current = Some(id);
        let mut seen = false;
        while let Some(node_id) = current {
            let Some(node) = self.nodes.get(node_id) else {
                return seen;
            };
            if !node.is_visible() {
                return false;
            }
            seen = true;
            current = node.parent;
        }
        seen
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    fn find_first(&self, start: Option<SceneNodeId>, predicate: &dyn Fn(&SceneNode) -> bool) -> Option<SceneNodeId> {
        let mut stack = vec![start.unwrap_or(self.root)];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if predicate(node) {
                return Some(id);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }

    /// First node in depth-first order with the given user id
    pub fn scene_node_from_id(&self, id: i32, start: Option<SceneNodeId>) -> Option<SceneNodeId> {
        self.find_first(start, &|node| node.id() == id)
    }

    /// First node in depth-first order with the given name
    pub fn scene_node_from_name(&self, name: &str, start: Option<SceneNodeId>) -> Option<SceneNodeId> {
        self.find_first(start, &|node| node.name() == name)
    }

    /// First node in depth-first order of the given type
    pub fn scene_node_from_type(&self, node_type: SceneNodeType, start: Option<SceneNodeId>) -> Option<SceneNodeId> {
        self.find_first(start, &|node| node_type == SceneNodeType::ANY || node.node_type() == node_type)
    }

    /// Every node of the given type in depth-first order
    pub fn scene_nodes_from_type(&self, node_type: SceneNodeType, start: Option<SceneNodeId>) -> Vec<SceneNodeId> {
        let mut found = Vec::new();
        let mut stack = vec![start.unwrap_or(self.root)];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if node_type == SceneNodeType::ANY || node.node_type() == node_type {
                found.push(id);
            }
            stack.extend(node.children.iter().rev());
        }
        found
    }

    /// Nearest visible node whose world box is hit by the segment `start..end`
    ///
    /// Debug objects are skipped, as are nodes whose user id shares no bit
    /// with `id_bitmask` (0 matches everything).
    pub fn scene_node_from_ray_bb(&self, start: Vec3, end: Vec3, id_bitmask: i32) -> Option<SceneNodeId> {
        let direction = end - start;
        let mut best: Option<(f32, SceneNodeId)> = None;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if !node.is_visible() {
                continue;
            }
            stack.extend(node.children.iter().copied());
            if id == self.root || node.is_debug_object() || (id_bitmask != 0 && node.id() & id_bitmask == 0) {
                continue;
            }
            if let Some(t) = segment_hits_box(start, direction, &node.transformed_bounding_box()) {
                if best.map_or(true, |(best_t, _)| t < best_t) {
                    best = Some((t, id));
                }
            }
        }
        best.map(|(_, id)| id)
    }

    // ========================================================================
    // Cloning and migration
    // ========================================================================

    fn snapshot(&self, id: SceneNodeId) -> Option<NodeSnapshot> {
        let node = self.nodes.get(id)?;
        let kind = node.kind.clone_kind()?;
        Some(NodeSnapshot {
            name: node.name.clone(),
            id: node.id,
            transform: node.transform.clone(),
            is_visible: node.is_visible,
            is_debug_object: node.is_debug_object,
            automatic_culling: node.automatic_culling,
            debug_data_visible: node.debug_data_visible,
            kind,
            animators: node.animators.iter().filter_map(|a| Self::clone_animator(id, a)).collect(),
            children: node.children.iter().filter_map(|child| self.snapshot(*child)).collect(),
        })
    }

    /// Copy of an animator, `None` when it cannot be cloned
    ///
    /// An animator that is running right now is mutably borrowed and is left
    /// out of the copy.
    fn clone_animator(id: SceneNodeId, animator: &AnimatorRef) -> Option<AnimatorRef> {
        match animator.try_borrow() {
            Ok(animator) => animator.create_clone(),
            Err(_) => {
                log::warn!("Animator of {:?} is running, left out of the clone", id);
                None
            }
        }
    }

    /// Build a snapshot below `parent`; the new node holds one reference
    fn instantiate(&mut self, snapshot: NodeSnapshot, parent: Option<SceneNodeId>) -> SceneNodeId {
        let mut node = SceneNode::new(snapshot.kind, snapshot.id, snapshot.transform, snapshot.automatic_culling);
        node.name = snapshot.name;
        node.is_visible = snapshot.is_visible;
        node.is_debug_object = snapshot.is_debug_object;
        node.debug_data_visible = snapshot.debug_data_visible;
        node.animators = snapshot.animators;
        let handle = self.nodes.insert(node);

        if let Some(parent) = parent {
            self.add_child(parent, handle);
            self.drop_node(handle);
        }
        for child in snapshot.children {
            self.instantiate(child, Some(handle));
        }
        handle
    }

    /// Deep copy of a subtree within this manager
    ///
    /// The copy goes below `new_parent`, or below the original's parent when
    /// `None`. A copy of a detached node stays detached and is owned by the
    /// caller. Children that cannot be cloned are left out; returns `None` for
    /// the root and for nodes that cannot be cloned.
    pub fn clone_node(&mut self, id: SceneNodeId, new_parent: Option<SceneNodeId>) -> Option<SceneNodeId> {
        if id == self.root {
            return None;
        }
        let parent = new_parent.or_else(|| self.parent_of(id));
        let snapshot = self.snapshot(id)?;
        let handle = self.instantiate(snapshot, parent);
        log::debug!("Cloned {:?} into {:?}", id, handle);
        Some(handle)
    }

    /// Deep copy of a subtree into another manager
    ///
    /// The copy goes below `new_parent`, or below the destination's root.
    pub fn clone_node_into(
        &self,
        id: SceneNodeId,
        destination: &mut SceneManager,
        new_parent: Option<SceneNodeId>,
    ) -> Option<SceneNodeId> {
        if id == self.root {
            return None;
        }
        let snapshot = self.snapshot(id)?;
        let parent = new_parent.filter(|p| destination.nodes.contains_key(*p)).unwrap_or(destination.root);
        Some(destination.instantiate(snapshot, Some(parent)))
    }

    /// Move a subtree out of `source` into this manager
    ///
    /// The subtree keeps its reference counts; the reference its old parent
    /// held moves to the new parent (this manager's root when `None`).
    /// `source` releases its own references into the subtree (active camera,
    /// deletion queue). Handles into `source` become invalid; the new handle
    /// of the subtree root is returned.
    pub fn adopt_node(
        &mut self,
        source: &mut SceneManager,
        id: SceneNodeId,
        new_parent: Option<SceneNodeId>,
    ) -> Option<SceneNodeId> {
        if id == source.root || !source.nodes.contains_key(id) {
            return None;
        }
        if source.active_camera.is_some_and(|camera| source.is_ancestor_or_self(id, camera)) {
            source.set_active_camera(None);
        }
        let queued: Vec<SceneNodeId> = source
            .deletion_queue
            .iter()
            .copied()
            .filter(|queued| source.is_ancestor_or_self(id, *queued))
            .collect();
        for queued_id in queued {
            source.deletion_queue.retain(|q| *q != queued_id);
            source.drop_node(queued_id);
        }

        // Hold the subtree across the detach so it cannot be destroyed
        source.grab(id);
        source.remove(id);
        let handle = self.transplant(source, id);

        let parent = new_parent.filter(|p| self.nodes.contains_key(*p)).unwrap_or(self.root);
        self.add_child(parent, handle);
        self.drop_node(handle);
        log::debug!("Adopted {:?} from another scene manager as {:?}", id, handle);
        Some(handle)
    }

    fn transplant(&mut self, source: &mut SceneManager, id: SceneNodeId) -> SceneNodeId {
        let Some(mut node) = source.nodes.remove(id) else {
            return id;
        };
        let children = std::mem::take(&mut node.children);
        node.parent = None;
        let handle = self.nodes.insert(node);
        for child in children {
            let child_handle = self.transplant(source, child);
            if let Some(child_node) = self.nodes.get_mut(child_handle) {
                child_node.parent = Some(handle);
            }
            if let Some(new_node) = self.nodes.get_mut(handle) {
                new_node.children.push(child_handle);
            }
        }
        handle
    }
}

/// Parameter along `start + t * direction` where the segment enters the box
fn segment_hits_box(start: Vec3, direction: Vec3, aabb: &AABB) -> Option<f32> {
    let mut t_min = 0.0_f32;
    let mut t_max = 1.0_f32;
    for axis in 0..3 {
        if direction[axis].abs() <= f32::EPSILON {
            if start[axis] < aabb.min[axis] || start[axis] > aabb.max[axis] {
                return None;
            }
            continue;
        }
        let inv = 1.0 / direction[axis];
        let mut t0 = (aabb.min[axis] - start[axis]) * inv;
        let mut t1 = (aabb.max[axis] - start[axis]) * inv;
        if t0 > t1 {
            std::mem::swap(&mut t0, &mut t1);
        }
        t_min = t_min.max(t0);
        t_max = t_max.min(t1);
        if t_min > t_max {
            return None;
        }
    }
    Some(t_min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::animators::{into_ref, RotationAnimator};
    use crate::scene::test_support::scene;
    use approx::assert_relative_eq;

    #[test]
    fn test_reparent_keeps_reference_count() {
        let mut scene = scene();
        let a = scene.add_empty_scene_node(None, -1);
        let b = scene.add_empty_scene_node(None, -1);
        let child = scene.add_empty_scene_node(Some(a), -1);

        scene.set_parent(child, Some(b));
        assert_eq!(scene.reference_count(child), 1);
        assert_eq!(scene.parent_of(child), Some(b));
        assert!(scene.children_of(a).is_empty());

        scene.add_child(a, child);
        assert_eq!(scene.reference_count(child), 1);
        assert_eq!(scene.children_of(a), &[child]);
        assert!(scene.children_of(b).is_empty());
    }

    #[test]
    fn test_cycles_are_rejected() {
        let mut scene = scene();
        let root = scene.root_scene_node();
        let a = scene.add_empty_scene_node(None, -1);
        let b = scene.add_empty_scene_node(Some(a), -1);

        scene.add_child(b, a);
        scene.add_child(a, a);
        scene.set_parent(a, Some(b));
        assert_eq!(scene.parent_of(a), Some(root));
        assert_eq!(scene.parent_of(b), Some(a));
        assert_eq!(scene.reference_count(a), 1);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut scene = scene();
        let parent = scene.add_empty_scene_node(None, -1);
        let child = scene.add_empty_scene_node(Some(parent), -1);
        scene.grab(child);

        scene.remove(child);
        scene.remove(child);
        assert!(scene.contains(child));
        assert_eq!(scene.parent_of(child), None);
        assert_eq!(scene.reference_count(child), 1);
        assert!(!scene.remove_child(parent, child));

        assert!(scene.drop_node(child));
        assert!(!scene.contains(child));
    }

    #[test]
    fn test_destroying_parent_releases_subtree() {
        let mut scene = scene();
        let parent = scene.add_empty_scene_node(None, -1);
        let child = scene.add_empty_scene_node(Some(parent), -1);
        let kept = scene.add_empty_scene_node(Some(child), -1);
        scene.grab(kept);

        scene.remove(parent);
        assert!(!scene.contains(parent));
        assert!(!scene.contains(child));
        assert!(scene.contains(kept));
        assert_eq!(scene.parent_of(kept), None);
        assert_eq!(scene.node_count(), 2);
    }

    #[test]
    fn test_detached_nodes_are_owned_by_caller() {
        let mut scene = scene();
        let node = scene.create_scene_node(Box::new(crate::scene::nodes::EmptySceneNode::new()), 7);
        assert_eq!(scene.parent_of(node), None);
        assert_eq!(scene.scene_node_from_id(7, None), None);

        let root = scene.root_scene_node();
        scene.add_child(root, node);
        scene.drop_node(node);
        assert_eq!(scene.reference_count(node), 1);
        assert_eq!(scene.scene_node_from_id(7, None), Some(node));
    }

    #[test]
    fn test_animators_attach_and_detach() {
        let mut scene = scene();
        let node = scene.add_empty_scene_node(None, -1);
        let first = into_ref(RotationAnimator::new(0, Vec3::new(0.0, 10.0, 0.0)));
        let second = into_ref(RotationAnimator::new(0, Vec3::new(0.0, 10.0, 0.0)));
        scene.add_animator(node, Rc::clone(&first));
        scene.add_animator(node, Rc::clone(&second));

        assert!(scene.remove_animator(node, &first));
        assert!(!scene.remove_animator(node, &first));
        assert_eq!(scene.scene_node(node).unwrap().animators().len(), 1);
        assert!(Rc::ptr_eq(&scene.scene_node(node).unwrap().animators()[0], &second));

        scene.remove_animators(node);
        assert!(scene.scene_node(node).unwrap().animators().is_empty());
    }

    #[test]
    fn test_lookups_walk_depth_first() {
        let mut scene = scene();
        let a = scene.add_empty_scene_node(None, 1);
        let a_child = scene.add_cube_scene_node(1.0, Some(a), 2, Vec3::zeros());
        let b = scene.add_cube_scene_node(1.0, None, 2, Vec3::zeros());
        scene.scene_node_mut(b).unwrap().set_name("crate");

        assert_eq!(scene.scene_node_from_id(2, None), Some(a_child));
        assert_eq!(scene.scene_node_from_id(2, Some(b)), Some(b));
        assert_eq!(scene.scene_node_from_name("crate", None), Some(b));
        assert_eq!(scene.scene_node_from_name("missing", None), None);
        assert_eq!(scene.scene_node_from_type(SceneNodeType::MESH, None), Some(a_child));
        assert_eq!(scene.scene_nodes_from_type(SceneNodeType::MESH, None), vec![a_child, b]);
        assert_eq!(scene.scene_nodes_from_type(SceneNodeType::ANY, Some(a)), vec![a, a_child]);
    }

    #[test]
    fn test_ray_picks_nearest_box() {
        let mut scene = scene();
        let near = scene.add_cube_scene_node(2.0, None, 1, Vec3::new(0.0, 0.0, -10.0));
        let far = scene.add_cube_scene_node(2.0, None, 1, Vec3::new(0.0, 0.0, -20.0));
        scene.add_cube_scene_node(2.0, None, 1, Vec3::new(10.0, 0.0, -5.0));

        let start = Vec3::zeros();
        let end = Vec3::new(0.0, 0.0, -100.0);
        assert_eq!(scene.scene_node_from_ray_bb(start, end, 0), Some(near));

        scene.scene_node_mut(near).unwrap().set_is_debug_object(true);
        assert_eq!(scene.scene_node_from_ray_bb(start, end, 0), Some(far));
        assert_eq!(scene.scene_node_from_ray_bb(start, end, 2), None);
    }

    #[test]
    fn test_clone_copies_subtree_independently() {
        let mut scene = scene();
        let parent = scene.add_empty_scene_node(None, 3);
        scene.scene_node_mut(parent).unwrap().set_name("group");
        scene.scene_node_mut(parent).unwrap().set_position(Vec3::new(1.0, 2.0, 3.0));
        let child = scene.add_cube_scene_node(1.0, Some(parent), 4, Vec3::zeros());
        let animator = into_ref(RotationAnimator::new(0, Vec3::new(0.0, 10.0, 0.0)));
        scene.add_animator(parent, Rc::clone(&animator));

        let copy = scene.clone_node(parent, None).unwrap();
        assert_ne!(copy, parent);
        assert_eq!(scene.parent_of(copy), Some(scene.root_scene_node()));
        assert_eq!(scene.reference_count(copy), 1);

        let copy_node = scene.scene_node(copy).unwrap();
        assert_eq!(copy_node.name(), "group");
        assert_eq!(copy_node.id(), 3);
        assert_relative_eq!(copy_node.position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(copy_node.animators().len(), 1);
        assert!(!Rc::ptr_eq(&copy_node.animators()[0], &animator));

        let copy_children = scene.children_of(copy).to_vec();
        assert_eq!(copy_children.len(), 1);
        assert_ne!(copy_children[0], child);
        assert_eq!(scene.scene_node(copy_children[0]).unwrap().node_type(), SceneNodeType::MESH);

        scene.scene_node_mut(copy).unwrap().set_position(Vec3::zeros());
        assert_relative_eq!(scene.scene_node(parent).unwrap().position(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(scene.node_count(), 5);
    }

    #[test]
    fn test_clone_of_root_is_refused() {
        let mut scene = scene();
        let root = scene.root_scene_node();
        assert!(scene.clone_node(root, None).is_none());
    }

    #[test]
    fn test_clone_into_other_manager() {
        let mut source = scene();
        let node = source.add_cube_scene_node(1.0, None, 9, Vec3::zeros());
        let mut destination = source.create_new_scene_manager();

        let copy = source.clone_node_into(node, &mut destination, None).unwrap();
        assert_eq!(destination.parent_of(copy), Some(destination.root_scene_node()));
        assert_eq!(destination.scene_node(copy).unwrap().id(), 9);
        assert!(source.contains(node));
    }

    #[test]
    fn test_adopt_moves_subtree_between_managers() {
        let mut source = scene();
        let parent = source.add_empty_scene_node(None, 1);
        source.add_empty_scene_node(Some(parent), 2);
        let camera = source.add_camera_scene_node(Some(parent), Vec3::zeros(), Vec3::new(0.0, 0.0, 1.0), 3, true);
        source.add_to_deletion_queue(camera);
        let mut destination = source.create_new_scene_manager();

        let moved = destination.adopt_node(&mut source, parent, None).unwrap();
        assert_eq!(source.node_count(), 1);
        assert!(source.active_camera().is_none());
        assert_eq!(destination.node_count(), 4);
        assert_eq!(destination.reference_count(moved), 1);
        assert_eq!(destination.parent_of(moved), Some(destination.root_scene_node()));

        let children = destination.children_of(moved).to_vec();
        assert_eq!(children.len(), 2);
        for child in children {
            assert_eq!(destination.parent_of(child), Some(moved));
            assert_eq!(destination.reference_count(child), 1);
        }
        assert!(destination.scene_node_from_id(3, None).is_some());
    }
}
