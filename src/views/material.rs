//! Scene-side views: material, file reference, color and instance.

use glam::{Quat, Vec3, Vec4};

use crate::document::{NodeMut, NodeRef};
use crate::format::NodeKind;
use crate::util::fnv1a;
use crate::util::math::{quat_from_vec4, quat_to_vec4, QUAT_IDENTITY_WIRE};

use super::{View, ViewMut};

// ============================================================================
// Material
// ============================================================================

/// Typed view of a `matl` node.
///
/// Each texture slot stores the hash of a `file` child of the material; slot
/// keys are the literal slot names (`albedo`, `normal`, `extra0`, ...).
#[derive(Clone, Copy)]
pub struct Material<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Material<'a> {
    const KIND: NodeKind = NodeKind::Material;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Material<'a> {
    /// The material name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// The shading model name (for example `pbr`).
    pub fn material_type(&self) -> &'a str {
        self.node.string_or("t", "")
    }

    /// The raw hash stored in a slot.
    pub fn slot_hash(&self, slot: &str) -> Option<u64> {
        self.node.try_first(slot)
    }

    /// Resolve a slot to its file reference among this material's children.
    pub fn slot(&self, slot: &str) -> Option<FileRef<'a>> {
        self.node.child_by_hash_of_kind(self.slot_hash(slot)?)
    }

    /// The albedo map.
    pub fn albedo(&self) -> Option<FileRef<'a>> {
        self.slot("albedo")
    }

    /// The diffuse map.
    pub fn diffuse(&self) -> Option<FileRef<'a>> {
        self.slot("diffuse")
    }

    /// The normal map.
    pub fn normal(&self) -> Option<FileRef<'a>> {
        self.slot("normal")
    }

    /// The specular map.
    pub fn specular(&self) -> Option<FileRef<'a>> {
        self.slot("specular")
    }

    /// The emissive map.
    pub fn emissive(&self) -> Option<FileRef<'a>> {
        self.slot("emissive")
    }

    /// The gloss map.
    pub fn gloss(&self) -> Option<FileRef<'a>> {
        self.slot("gloss")
    }

    /// The roughness map.
    pub fn roughness(&self) -> Option<FileRef<'a>> {
        self.slot("roughness")
    }

    /// The ambient occlusion map.
    pub fn ambient_occlusion(&self) -> Option<FileRef<'a>> {
        self.slot("ao")
    }

    /// The cavity map.
    pub fn cavity(&self) -> Option<FileRef<'a>> {
        self.slot("cavity")
    }

    /// The anisotropy map.
    pub fn anisotropy(&self) -> Option<FileRef<'a>> {
        self.slot("aniso")
    }

    /// An engine-specific extra map (`extra0`, `extra1`, ...).
    pub fn extra(&self, index: u32) -> Option<FileRef<'a>> {
        self.slot(&format!("extra{index}"))
    }
}

/// Mutable view of a `matl` node.
pub struct MaterialMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for MaterialMut<'d> {
    const KIND: NodeKind = NodeKind::Material;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> MaterialMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Material<'_> {
        Material::wrap(self.node.as_ref())
    }

    /// Set the material name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Set the shading model name.
    pub fn set_material_type(&mut self, kind: &str) {
        self.node.node().set_string("t", kind);
    }

    /// Attach a file to a slot: creates the `file` child (hashed from its
    /// path) and records its hash under the slot key. Returns the hash.
    pub fn add_slot_file(&mut self, slot: &str, path: &str) -> u64 {
        let hash = fnv1a(path);
        let mut file = self.node.create_child(NodeKind::File);
        file.node().set_hash(hash);
        file.node().set_string("p", path);
        self.node.node().set_value(slot, hash);
        hash
    }
}

// ============================================================================
// FileRef
// ============================================================================

/// Typed view of a `file` node: a reference to an external asset by path.
#[derive(Clone, Copy)]
pub struct FileRef<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for FileRef<'a> {
    const KIND: NodeKind = NodeKind::File;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> FileRef<'a> {
    /// The referenced path.
    pub fn path(&self) -> &'a str {
        self.node.string_or("p", "")
    }
}

/// Mutable view of a `file` node.
pub struct FileRefMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for FileRefMut<'d> {
    const KIND: NodeKind = NodeKind::File;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> FileRefMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> FileRef<'_> {
        FileRef::wrap(self.node.as_ref())
    }

    /// Set the referenced path.
    pub fn set_path(&mut self, path: &str) {
        self.node.node().set_string("p", path);
    }
}

// ============================================================================
// Color
// ============================================================================

/// Typed view of a `colr` node: a named color with a color space.
#[derive(Clone, Copy)]
pub struct Color<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Color<'a> {
    const KIND: NodeKind = NodeKind::Color;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Color<'a> {
    /// The color name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// The color space the value is expressed in.
    pub fn color_space(&self) -> &'a str {
        self.node.string_or("cs", "srgb")
    }

    /// The RGBA value.
    pub fn rgba(&self) -> Vec4 {
        self.node.first_or("rgba", Vec4::ONE)
    }
}

/// Mutable view of a `colr` node.
pub struct ColorMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for ColorMut<'d> {
    const KIND: NodeKind = NodeKind::Color;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> ColorMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Color<'_> {
        Color::wrap(self.node.as_ref())
    }

    /// Set the color name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Set the color space.
    pub fn set_color_space(&mut self, space: &str) {
        self.node.node().set_string("cs", space);
    }

    /// Set the RGBA value.
    pub fn set_rgba(&mut self, rgba: Vec4) {
        self.node.node().set_value("rgba", rgba);
    }
}

// ============================================================================
// Instance
// ============================================================================

/// Typed view of an `inst` node: a placed instance of a referenced file.
#[derive(Clone, Copy)]
pub struct Instance<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Instance<'a> {
    const KIND: NodeKind = NodeKind::Instance;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Instance<'a> {
    /// The instance name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// The referenced file, resolved among this instance's children.
    pub fn reference_file(&self) -> Option<FileRef<'a>> {
        let hash = self.node.try_first::<u64>("rf")?;
        self.node.child_by_hash_of_kind(hash)
    }

    /// The instance position.
    pub fn position(&self) -> Vec3 {
        self.node.first_or("p", Vec3::ZERO)
    }

    /// The instance rotation.
    pub fn rotation(&self) -> Quat {
        quat_from_vec4(self.node.first_or("r", QUAT_IDENTITY_WIRE))
    }

    /// The instance scale.
    pub fn scale(&self) -> Vec3 {
        self.node.first_or("s", Vec3::ONE)
    }
}

/// Mutable view of an `inst` node.
pub struct InstanceMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for InstanceMut<'d> {
    const KIND: NodeKind = NodeKind::Instance;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> InstanceMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Instance<'_> {
        Instance::wrap(self.node.as_ref())
    }

    /// Set the instance name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Reference a file by path: creates the `file` child (hashed from the
    /// path) and records its hash. Returns the hash.
    pub fn create_reference(&mut self, path: &str) -> u64 {
        let hash = fnv1a(path);
        let mut file = self.node.create_child(NodeKind::File);
        file.node().set_hash(hash);
        file.node().set_string("p", path);
        self.node.node().set_value("rf", hash);
        hash
    }

    /// Set the instance position.
    pub fn set_position(&mut self, position: Vec3) {
        self.node.node().set_value("p", position);
    }

    /// Set the instance rotation.
    pub fn set_rotation(&mut self, rotation: Quat) {
        self.node.node().set_value("r", quat_to_vec4(rotation));
    }

    /// Set the instance scale.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.node.node().set_value("s", scale);
    }
}
