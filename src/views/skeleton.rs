//! Skeleton-side views: skeleton, bone, IK handle and constraint, plus the
//! forward-kinematics transform helpers.

use glam::{Quat, Vec3};

use crate::document::{NodeId, NodeMut, NodeRef};
use crate::format::{NodeKind, NO_PARENT};
use crate::util::fnv1a;
use crate::util::math::{quat_from_vec4, quat_to_vec4, QUAT_IDENTITY_WIRE};

use super::{View, ViewMut};

// ============================================================================
// Skeleton
// ============================================================================

/// Typed view of a `skel` node.
#[derive(Clone, Copy)]
pub struct Skeleton<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Skeleton<'a> {
    const KIND: NodeKind = NodeKind::Skeleton;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Skeleton<'a> {
    /// The bones in declaration order. Parent bones precede their children;
    /// a bone's `p` property indexes into this order.
    pub fn bones(&self) -> Vec<Bone<'a>> {
        self.node.children_of_kind()
    }

    /// Number of bones.
    pub fn bone_count(&self) -> usize {
        self.node.child_count_of_kind::<Bone<'a>>()
    }

    /// Find a bone by hash.
    pub fn bone_by_hash(&self, hash: u64) -> Option<Bone<'a>> {
        self.node.child_by_hash_of_kind(hash)
    }

    /// The IK handles, in order.
    pub fn ik_handles(&self) -> Vec<IkHandle<'a>> {
        self.node.children_of_kind()
    }

    /// The constraints, in order.
    pub fn constraints(&self) -> Vec<Constraint<'a>> {
        self.node.children_of_kind()
    }
}

/// Mutable view of a `skel` node.
pub struct SkeletonMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for SkeletonMut<'d> {
    const KIND: NodeKind = NodeKind::Skeleton;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

/// Per-bone transform snapshot used by the recompute passes.
#[derive(Clone, Copy)]
struct BoneTransform {
    parent: i32,
    local_pos: Vec3,
    local_rot: Quat,
    world_pos: Vec3,
    world_rot: Quat,
}

impl<'d> SkeletonMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Skeleton<'_> {
        Skeleton::wrap(self.node.as_ref())
    }

    /// Append a bone with the given name; the bone's hash is derived from
    /// the name so IK handles and constraints can reference it.
    pub fn create_bone(&mut self, name: &str) -> BoneMut<'_> {
        let mut child = self.node.create_child(NodeKind::Bone);
        child.node().set_hash(fnv1a(name));
        child.node().set_string("n", name);
        BoneMut::wrap(child)
    }

    /// Append a new IK handle.
    pub fn create_ik_handle(&mut self) -> IkHandleMut<'_> {
        IkHandleMut::wrap(self.node.create_child(NodeKind::IkHandle))
    }

    /// Append a new constraint.
    pub fn create_constraint(&mut self) -> ConstraintMut<'_> {
        ConstraintMut::wrap(self.node.create_child(NodeKind::Constraint))
    }

    /// Recompute every bone's local transform from its world transform.
    ///
    /// Bones are processed in declaration order, which must place parents
    /// before children; parent indices outside the bone list are treated as
    /// roots.
    pub fn recompute_local_transforms(&mut self) {
        let (ids, mut bones) = self.snapshot();
        for i in 0..bones.len() {
            match bone_parent(&bones, i) {
                Some(parent) => {
                    let inv = parent.world_rot.conjugate();
                    bones[i].local_rot = inv * bones[i].world_rot;
                    bones[i].local_pos = inv * (bones[i].world_pos - parent.world_pos);
                }
                None => {
                    bones[i].local_pos = bones[i].world_pos;
                    bones[i].local_rot = bones[i].world_rot;
                }
            }
        }

        let doc = self.node.document_mut();
        for (id, bone) in ids.iter().zip(&bones) {
            let node = doc.node_mut(*id);
            node.set_value("lp", bone.local_pos);
            node.set_value("lr", quat_to_vec4(bone.local_rot));
        }
    }

    /// Recompute every bone's world transform from its local transform
    /// (a forward-kinematics pass).
    ///
    /// Same ordering precondition as
    /// [`SkeletonMut::recompute_local_transforms`].
    pub fn recompute_world_transforms(&mut self) {
        let (ids, mut bones) = self.snapshot();
        for i in 0..bones.len() {
            match bone_parent(&bones, i) {
                Some(parent) => {
                    bones[i].world_rot = parent.world_rot * bones[i].local_rot;
                    bones[i].world_pos = parent.world_rot * bones[i].local_pos + parent.world_pos;
                }
                None => {
                    bones[i].world_pos = bones[i].local_pos;
                    bones[i].world_rot = bones[i].local_rot;
                }
            }
        }

        let doc = self.node.document_mut();
        for (id, bone) in ids.iter().zip(&bones) {
            let node = doc.node_mut(*id);
            node.set_value("wp", bone.world_pos);
            node.set_value("wr", quat_to_vec4(bone.world_rot));
        }
    }

    fn snapshot(&self) -> (Vec<NodeId>, Vec<BoneTransform>) {
        let skel = self.node.as_ref();
        let mut ids = Vec::new();
        let mut bones = Vec::new();
        for child in skel.children() {
            if child.kind() != NodeKind::Bone {
                continue;
            }
            ids.push(child.id());
            bones.push(BoneTransform {
                parent: child.first_or::<u32>("p", NO_PARENT) as i32,
                local_pos: child.first_or("lp", Vec3::ZERO),
                local_rot: quat_from_vec4(child.first_or("lr", QUAT_IDENTITY_WIRE)),
                world_pos: child.first_or("wp", Vec3::ZERO),
                world_rot: quat_from_vec4(child.first_or("wr", QUAT_IDENTITY_WIRE)),
            });
        }
        (ids, bones)
    }
}

/// The parent transform for bone `index`, or None when it is a root.
fn bone_parent(bones: &[BoneTransform], index: usize) -> Option<BoneTransform> {
    let parent = bones[index].parent;
    if parent < 0 || parent as usize >= bones.len() || parent as usize == index {
        return None;
    }
    Some(bones[parent as usize])
}

// ============================================================================
// Bone
// ============================================================================

/// Typed view of a `bone` node.
///
/// Rotations are XYZW quaternions; the parent index is `u32::MAX` on the
/// wire for root bones and surfaces here as -1.
#[derive(Clone, Copy)]
pub struct Bone<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Bone<'a> {
    const KIND: NodeKind = NodeKind::Bone;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Bone<'a> {
    /// The bone name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// Index of the parent bone within the skeleton, or -1 for a root.
    pub fn parent_index(&self) -> i32 {
        self.node.first_or::<u32>("p", NO_PARENT) as i32
    }

    /// Whether this bone compensates for its parent's scale.
    pub fn segment_scale_compensate(&self) -> bool {
        self.node.first_or::<u8>("ssc", 0) != 0
    }

    /// Position relative to the parent bone.
    pub fn local_position(&self) -> Vec3 {
        self.node.first_or("lp", Vec3::ZERO)
    }

    /// Rotation relative to the parent bone.
    pub fn local_rotation(&self) -> Quat {
        quat_from_vec4(self.node.first_or("lr", QUAT_IDENTITY_WIRE))
    }

    /// Position in world space.
    pub fn world_position(&self) -> Vec3 {
        self.node.first_or("wp", Vec3::ZERO)
    }

    /// Rotation in world space.
    pub fn world_rotation(&self) -> Quat {
        quat_from_vec4(self.node.first_or("wr", QUAT_IDENTITY_WIRE))
    }

    /// Per-axis scale.
    pub fn scale(&self) -> Vec3 {
        self.node.first_or("s", Vec3::ONE)
    }
}

/// Mutable view of a `bone` node.
pub struct BoneMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for BoneMut<'d> {
    const KIND: NodeKind = NodeKind::Bone;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> BoneMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Bone<'_> {
        Bone::wrap(self.node.as_ref())
    }

    /// Set the bone name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Set the parent bone index (-1 for a root).
    pub fn set_parent_index(&mut self, index: i32) {
        self.node.node().set_value("p", index as u32);
    }

    /// Set the segment-scale-compensate flag.
    pub fn set_segment_scale_compensate(&mut self, enabled: bool) {
        self.node.node().set_value("ssc", enabled as u8);
    }

    /// Set the position relative to the parent bone.
    pub fn set_local_position(&mut self, position: Vec3) {
        self.node.node().set_value("lp", position);
    }

    /// Set the rotation relative to the parent bone.
    pub fn set_local_rotation(&mut self, rotation: Quat) {
        self.node.node().set_value("lr", quat_to_vec4(rotation));
    }

    /// Set the position in world space.
    pub fn set_world_position(&mut self, position: Vec3) {
        self.node.node().set_value("wp", position);
    }

    /// Set the rotation in world space.
    pub fn set_world_rotation(&mut self, rotation: Quat) {
        self.node.node().set_value("wr", quat_to_vec4(rotation));
    }

    /// Set the per-axis scale.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.node.node().set_value("s", scale);
    }
}

// ============================================================================
// IkHandle
// ============================================================================

/// Typed view of an `ikhd` node. Bones are referenced by hash among the
/// parent skeleton's children.
#[derive(Clone, Copy)]
pub struct IkHandle<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for IkHandle<'a> {
    const KIND: NodeKind = NodeKind::IkHandle;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> IkHandle<'a> {
    /// The handle name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// The first bone of the chain.
    pub fn start_bone(&self) -> Option<Bone<'a>> {
        self.sibling_bone("sb")
    }

    /// The last bone of the chain.
    pub fn end_bone(&self) -> Option<Bone<'a>> {
        self.sibling_bone("eb")
    }

    /// The bone the chain reaches for.
    pub fn target_bone(&self) -> Option<Bone<'a>> {
        self.sibling_bone("tb")
    }

    /// The pole-vector bone.
    pub fn pole_vector_bone(&self) -> Option<Bone<'a>> {
        self.sibling_bone("pv")
    }

    /// The pole bone.
    pub fn pole_bone(&self) -> Option<Bone<'a>> {
        self.sibling_bone("pb")
    }

    /// Whether the end bone takes the target's rotation.
    pub fn use_target_rotation(&self) -> bool {
        self.node.first_or::<u8>("tr", 0) != 0
    }

    fn sibling_bone(&self, key: &str) -> Option<Bone<'a>> {
        let hash = self.node.try_first::<u64>(key)?;
        self.node.parent()?.child_by_hash_of_kind(hash)
    }
}

/// Mutable view of an `ikhd` node.
pub struct IkHandleMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for IkHandleMut<'d> {
    const KIND: NodeKind = NodeKind::IkHandle;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> IkHandleMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> IkHandle<'_> {
        IkHandle::wrap(self.node.as_ref())
    }

    /// Set the handle name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Reference the chain's first bone by hash.
    pub fn set_start_bone(&mut self, hash: u64) {
        self.node.node().set_value("sb", hash);
    }

    /// Reference the chain's last bone by hash.
    pub fn set_end_bone(&mut self, hash: u64) {
        self.node.node().set_value("eb", hash);
    }

    /// Reference the target bone by hash.
    pub fn set_target_bone(&mut self, hash: u64) {
        self.node.node().set_value("tb", hash);
    }

    /// Reference the pole-vector bone by hash.
    pub fn set_pole_vector_bone(&mut self, hash: u64) {
        self.node.node().set_value("pv", hash);
    }

    /// Reference the pole bone by hash.
    pub fn set_pole_bone(&mut self, hash: u64) {
        self.node.node().set_value("pb", hash);
    }

    /// Set whether the end bone takes the target's rotation.
    pub fn set_use_target_rotation(&mut self, enabled: bool) {
        self.node.node().set_value("tr", enabled as u8);
    }
}

// ============================================================================
// Constraint
// ============================================================================

/// Typed view of a `cnst` node.
#[derive(Clone, Copy)]
pub struct Constraint<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Constraint<'a> {
    const KIND: NodeKind = NodeKind::Constraint;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Constraint<'a> {
    /// The constraint name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// The constraint type.
    pub fn constraint_type(&self) -> &'a str {
        self.node.string_or("ct", "unknown")
    }

    /// The constrained bone.
    pub fn constraint_bone(&self) -> Option<Bone<'a>> {
        self.sibling_bone("cb")
    }

    /// The bone driving the constraint.
    pub fn target_bone(&self) -> Option<Bone<'a>> {
        self.sibling_bone("tb")
    }

    /// Whether the constrained bone takes the target's rotation.
    pub fn use_target_rotation(&self) -> bool {
        self.node.first_or::<u8>("tr", 0) != 0
    }

    /// Whether the X axis is excluded from the constraint.
    pub fn skip_x(&self) -> bool {
        self.node.first_or::<u8>("sx", 0) != 0
    }

    /// Whether the Y axis is excluded from the constraint.
    pub fn skip_y(&self) -> bool {
        self.node.first_or::<u8>("sy", 0) != 0
    }

    /// Whether the Z axis is excluded from the constraint.
    pub fn skip_z(&self) -> bool {
        self.node.first_or::<u8>("sz", 0) != 0
    }

    fn sibling_bone(&self, key: &str) -> Option<Bone<'a>> {
        let hash = self.node.try_first::<u64>(key)?;
        self.node.parent()?.child_by_hash_of_kind(hash)
    }
}

/// Mutable view of a `cnst` node.
pub struct ConstraintMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for ConstraintMut<'d> {
    const KIND: NodeKind = NodeKind::Constraint;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> ConstraintMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Constraint<'_> {
        Constraint::wrap(self.node.as_ref())
    }

    /// Set the constraint name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Set the constraint type.
    pub fn set_constraint_type(&mut self, kind: &str) {
        self.node.node().set_string("ct", kind);
    }

    /// Reference the constrained bone by hash.
    pub fn set_constraint_bone(&mut self, hash: u64) {
        self.node.node().set_value("cb", hash);
    }

    /// Reference the driving bone by hash.
    pub fn set_target_bone(&mut self, hash: u64) {
        self.node.node().set_value("tb", hash);
    }

    /// Set whether the constrained bone takes the target's rotation.
    pub fn set_use_target_rotation(&mut self, enabled: bool) {
        self.node.node().set_value("tr", enabled as u8);
    }

    /// Exclude the X axis from the constraint.
    pub fn set_skip_x(&mut self, skip: bool) {
        self.node.node().set_value("sx", skip as u8);
    }

    /// Exclude the Y axis from the constraint.
    pub fn set_skip_y(&mut self, skip: bool) {
        self.node.node().set_value("sy", skip as u8);
    }

    /// Exclude the Z axis from the constraint.
    pub fn set_skip_z(&mut self, skip: bool) {
        self.node.node().set_value("sz", skip as u8);
    }
}
