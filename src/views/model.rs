//! Model-side views: scene root, model, mesh, blend shape and hair.

use glam::{Vec2, Vec3};

use crate::document::{NodeMut, NodeRef};
use crate::format::NodeKind;
use crate::property::Property;
use crate::util::{fnv1a, Result};

use super::animation::{Animation, AnimationMut};
use super::material::{Instance, InstanceMut, Material, MaterialMut};
use super::skeleton::{Skeleton, SkeletonMut};
use super::{View, ViewMut};

// ============================================================================
// Root
// ============================================================================

/// Typed view of a `root` container node.
#[derive(Clone, Copy)]
pub struct Root<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Root<'a> {
    const KIND: NodeKind = NodeKind::Root;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Root<'a> {
    /// The models under this root, in order.
    pub fn models(&self) -> Vec<Model<'a>> {
        self.node.children_of_kind()
    }

    /// The animations under this root, in order.
    pub fn animations(&self) -> Vec<Animation<'a>> {
        self.node.children_of_kind()
    }

    /// The instances under this root, in order.
    pub fn instances(&self) -> Vec<Instance<'a>> {
        self.node.children_of_kind()
    }
}

/// Mutable view of a `root` container node.
pub struct RootMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for RootMut<'d> {
    const KIND: NodeKind = NodeKind::Root;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> RootMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Root<'_> {
        Root::wrap(self.node.as_ref())
    }

    /// Append a new model.
    pub fn create_model(&mut self) -> ModelMut<'_> {
        ModelMut::wrap(self.node.create_child(NodeKind::Model))
    }

    /// Append a new animation.
    pub fn create_animation(&mut self) -> AnimationMut<'_> {
        AnimationMut::wrap(self.node.create_child(NodeKind::Animation))
    }

    /// Append a new instance.
    pub fn create_instance(&mut self) -> InstanceMut<'_> {
        InstanceMut::wrap(self.node.create_child(NodeKind::Instance))
    }
}

// ============================================================================
// Model
// ============================================================================

/// Typed view of a `modl` node.
#[derive(Clone, Copy)]
pub struct Model<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Model<'a> {
    const KIND: NodeKind = NodeKind::Model;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Model<'a> {
    /// The model name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// The model's skeleton, if any.
    pub fn skeleton(&self) -> Option<Skeleton<'a>> {
        self.node.try_first_child_of_kind()
    }

    /// The model's meshes, in order.
    pub fn meshes(&self) -> Vec<Mesh<'a>> {
        self.node.children_of_kind()
    }

    /// The model's materials, in order.
    pub fn materials(&self) -> Vec<Material<'a>> {
        self.node.children_of_kind()
    }

    /// The model's blend shapes, in order.
    pub fn blend_shapes(&self) -> Vec<BlendShape<'a>> {
        self.node.children_of_kind()
    }

    /// The model's hair descriptions, in order.
    pub fn hairs(&self) -> Vec<Hair<'a>> {
        self.node.children_of_kind()
    }
}

/// Mutable view of a `modl` node.
pub struct ModelMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for ModelMut<'d> {
    const KIND: NodeKind = NodeKind::Model;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> ModelMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Model<'_> {
        Model::wrap(self.node.as_ref())
    }

    /// Set the model name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Append a new skeleton.
    pub fn create_skeleton(&mut self) -> SkeletonMut<'_> {
        SkeletonMut::wrap(self.node.create_child(NodeKind::Skeleton))
    }

    /// Append a new mesh with the given name; the mesh's hash is derived
    /// from the name so blend shapes can reference it.
    pub fn create_mesh(&mut self, name: &str) -> MeshMut<'_> {
        let mut child = self.node.create_child(NodeKind::Mesh);
        child.node().set_hash(fnv1a(name));
        child.node().set_string("n", name);
        MeshMut::wrap(child)
    }

    /// Append a new material with the given name; the material's hash is
    /// derived from the name so meshes can reference it.
    pub fn create_material(&mut self, name: &str) -> MaterialMut<'_> {
        let mut child = self.node.create_child(NodeKind::Material);
        child.node().set_hash(fnv1a(name));
        child.node().set_string("n", name);
        MaterialMut::wrap(child)
    }

    /// Append a new blend shape.
    pub fn create_blend_shape(&mut self) -> BlendShapeMut<'_> {
        BlendShapeMut::wrap(self.node.create_child(NodeKind::BlendShape))
    }

    /// Append a new hair description.
    pub fn create_hair(&mut self) -> HairMut<'_> {
        HairMut::wrap(self.node.create_child(NodeKind::Hair))
    }
}

// ============================================================================
// Mesh
// ============================================================================

/// Typed view of a `mesh` node.
///
/// Vertex buffers are parallel arrays: positions, normals, tangents, weights
/// and per-layer UV/color buffers all index by vertex. Index-style buffers
/// (`f`, `wb`) may be stored as u8, u16 or u32 and widen on read.
#[derive(Clone, Copy)]
pub struct Mesh<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Mesh<'a> {
    const KIND: NodeKind = NodeKind::Mesh;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Mesh<'a> {
    /// The mesh name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// The hash of the material assigned to this mesh.
    pub fn material_hash(&self) -> Option<u64> {
        self.node.try_first("m")
    }

    /// The assigned material, resolved among the parent model's children.
    pub fn material(&self) -> Option<Material<'a>> {
        let hash = self.material_hash()?;
        self.node.parent()?.child_by_hash_of_kind(hash)
    }

    /// Number of vertices (length of the position buffer).
    pub fn vertex_count(&self) -> usize {
        self.positions().len()
    }

    /// Number of triangle faces (face indices come in threes).
    pub fn face_count(&self) -> usize {
        self.node
            .try_property("f")
            .map(|p| p.value_count() / 3)
            .unwrap_or(0)
    }

    /// Vertex positions.
    pub fn positions(&self) -> &'a [Vec3] {
        self.node.try_array("vp").unwrap_or(&[])
    }

    /// Vertex normals.
    pub fn normals(&self) -> &'a [Vec3] {
        self.node.try_array("vn").unwrap_or(&[])
    }

    /// Vertex tangents.
    pub fn tangents(&self) -> &'a [Vec3] {
        self.node.try_array("vt").unwrap_or(&[])
    }

    /// Legacy packed-RGBA vertex colors.
    pub fn colors(&self) -> &'a [u32] {
        self.node.try_array("vc").unwrap_or(&[])
    }

    /// A UV layer (`u0`, `u1`, ...).
    pub fn uv_layer(&self, index: u32) -> Option<&'a [Vec2]> {
        self.node.try_array(&format!("u{index}"))
    }

    /// A color layer (`c0`, `c1`, ...) as its raw property; layers may hold
    /// packed u32 colors or float RGBA vectors.
    pub fn color_layer(&self, index: u32) -> Option<&'a Property> {
        self.node.try_property(&format!("c{index}"))
    }

    /// Declared number of UV layers (the format allows at most 32).
    pub fn uv_layer_count(&self) -> u32 {
        self.node.first_or::<u8>("ul", 0) as u32
    }

    /// Declared number of color layers (the format allows at most 32).
    pub fn color_layer_count(&self) -> u32 {
        self.node.first_or::<u8>("cl", 0) as u32
    }

    /// Maximum skin influences per vertex (the format allows at most 32).
    pub fn max_weight_influence(&self) -> u32 {
        self.node.first_or::<u8>("mi", 0) as u32
    }

    /// The skinning method.
    pub fn skinning_method(&self) -> &'a str {
        self.node.string_or("sm", "linear")
    }

    /// The face index buffer, widened from its stored u8/u16/u32 form.
    pub fn face_buffer(&self) -> Result<Vec<u32>> {
        widen_to_u32(self.node, "f")
    }

    /// The per-vertex bone index buffer, widened from u8/u16/u32.
    pub fn weight_bone_buffer(&self) -> Result<Vec<u32>> {
        widen_to_u32(self.node, "wb")
    }

    /// The per-vertex skin weight buffer.
    pub fn weight_value_buffer(&self) -> &'a [f32] {
        self.node.try_array("wv").unwrap_or(&[])
    }
}

fn widen_to_u32(node: NodeRef<'_>, key: &str) -> Result<Vec<u32>> {
    Ok(node
        .integer_array(key, 32)?
        .into_iter()
        .map(|v| v as u32)
        .collect())
}

/// Mutable view of a `mesh` node.
pub struct MeshMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for MeshMut<'d> {
    const KIND: NodeKind = NodeKind::Mesh;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> MeshMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Mesh<'_> {
        Mesh::wrap(self.node.as_ref())
    }

    /// Set the mesh name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Assign a material by hash.
    pub fn set_material_hash(&mut self, hash: u64) {
        self.node.node().set_value("m", hash);
    }

    /// Install the vertex position buffer.
    pub fn set_positions(&mut self, positions: Vec<Vec3>) {
        self.node.node().set_array("vp", positions);
    }

    /// Install the vertex normal buffer.
    pub fn set_normals(&mut self, normals: Vec<Vec3>) {
        self.node.node().set_array("vn", normals);
    }

    /// Install the vertex tangent buffer.
    pub fn set_tangents(&mut self, tangents: Vec<Vec3>) {
        self.node.node().set_array("vt", tangents);
    }

    /// Install the legacy packed-RGBA color buffer.
    pub fn set_colors(&mut self, colors: Vec<u32>) {
        self.node.node().set_array("vc", colors);
    }

    /// Install the face index buffer.
    pub fn set_face_buffer(&mut self, indices: Vec<u32>) {
        self.node.node().set_array("f", indices);
    }

    /// Install a UV layer.
    pub fn set_uv_layer(&mut self, index: u32, uvs: Vec<Vec2>) {
        self.node.node().set_array(format!("u{index}"), uvs);
    }

    /// Declare the number of UV layers.
    pub fn set_uv_layer_count(&mut self, count: u8) {
        self.node.node().set_value("ul", count);
    }

    /// Declare the number of color layers.
    pub fn set_color_layer_count(&mut self, count: u8) {
        self.node.node().set_value("cl", count);
    }

    /// Declare the maximum skin influences per vertex.
    pub fn set_max_weight_influence(&mut self, count: u8) {
        self.node.node().set_value("mi", count);
    }

    /// Set the skinning method.
    pub fn set_skinning_method(&mut self, method: &str) {
        self.node.node().set_string("sm", method);
    }

    /// Install the per-vertex bone index buffer.
    pub fn set_weight_bone_buffer(&mut self, indices: Vec<u32>) {
        self.node.node().set_array("wb", indices);
    }

    /// Install the per-vertex skin weight buffer.
    pub fn set_weight_value_buffer(&mut self, weights: Vec<f32>) {
        self.node.node().set_array("wv", weights);
    }
}

// ============================================================================
// BlendShape
// ============================================================================

/// Typed view of a `blsh` node.
///
/// A blend shape names a base mesh and an ordered set of target meshes, all
/// referenced by node hash among the blend shape's siblings. Target weights
/// are optional and default to 1.0 per target.
#[derive(Clone, Copy)]
pub struct BlendShape<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for BlendShape<'a> {
    const KIND: NodeKind = NodeKind::BlendShape;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> BlendShape<'a> {
    /// The base mesh, resolved among this node's siblings.
    pub fn base_mesh(&self) -> Option<Mesh<'a>> {
        let hash = self.node.try_first::<u64>("b")?;
        self.node.parent()?.child_by_hash_of_kind(hash)
    }

    /// The raw target mesh hashes.
    pub fn target_hashes(&self) -> &'a [u64] {
        self.node.try_array("t").unwrap_or(&[])
    }

    /// The raw target weights (may be shorter than the target list).
    pub fn target_weights(&self) -> &'a [f32] {
        self.node.try_array("ts").unwrap_or(&[])
    }

    /// Resolve the target meshes with their weights, in declaration order.
    /// Targets whose hash matches no sibling mesh are skipped.
    pub fn target_shapes(&self) -> Vec<(Mesh<'a>, f32)> {
        let Some(parent) = self.node.parent() else {
            return Vec::new();
        };
        let weights = self.target_weights();
        self.target_hashes()
            .iter()
            .enumerate()
            .filter_map(|(i, &hash)| {
                parent
                    .child_by_hash_of_kind::<Mesh>(hash)
                    .map(|mesh| (mesh, weights.get(i).copied().unwrap_or(1.0)))
            })
            .collect()
    }
}

/// Mutable view of a `blsh` node.
pub struct BlendShapeMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for BlendShapeMut<'d> {
    const KIND: NodeKind = NodeKind::BlendShape;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> BlendShapeMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> BlendShape<'_> {
        BlendShape::wrap(self.node.as_ref())
    }

    /// Reference the base mesh by hash.
    pub fn set_base_mesh(&mut self, hash: u64) {
        self.node.node().set_value("b", hash);
    }

    /// Append a target mesh reference with its weight.
    pub fn add_target(&mut self, hash: u64, weight: f32) {
        let node = self.node.node();
        // push_value only fails on a kind mismatch, which these keys never have
        let _ = node.push_value("t", hash);
        let _ = node.push_value("ts", weight);
    }
}

// ============================================================================
// Hair
// ============================================================================

/// Typed view of a `hair` node.
///
/// Strand geometry is described by the `se` buffer: one integer segment
/// count per strand, stored as u8/u16/u32 and widened on read.
#[derive(Clone, Copy)]
pub struct Hair<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Hair<'a> {
    const KIND: NodeKind = NodeKind::Hair;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Hair<'a> {
    /// The hair name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// The hash of the material assigned to this hair.
    pub fn material_hash(&self) -> Option<u64> {
        self.node.try_first("m")
    }

    /// The assigned material, resolved among the parent model's children.
    pub fn material(&self) -> Option<Material<'a>> {
        let hash = self.material_hash()?;
        self.node.parent()?.child_by_hash_of_kind(hash)
    }

    /// Per-strand segment counts, widened from u8/u16/u32.
    pub fn segments(&self) -> Result<Vec<u32>> {
        widen_to_u32(self.node, "se")
    }

    /// Number of strands.
    pub fn strand_count(&self) -> usize {
        self.node
            .try_property("se")
            .map(|p| p.value_count())
            .unwrap_or(0)
    }
}

/// Mutable view of a `hair` node.
pub struct HairMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for HairMut<'d> {
    const KIND: NodeKind = NodeKind::Hair;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> HairMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Hair<'_> {
        Hair::wrap(self.node.as_ref())
    }

    /// Set the hair name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Assign a material by hash.
    pub fn set_material_hash(&mut self, hash: u64) {
        self.node.node().set_value("m", hash);
    }

    /// Install the per-strand segment count buffer.
    pub fn set_segments(&mut self, segments: Vec<u32>) {
        self.node.node().set_array("se", segments);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CastDocument;
    use crate::util::fnv1a;

    fn model_doc() -> (CastDocument, crate::document::NodeId) {
        let mut doc = CastDocument::new();
        let root = doc.create_root(NodeKind::Root);
        let model = doc.create_child(root, NodeKind::Model);
        (doc, model)
    }

    #[test]
    fn test_mesh_buffers() {
        let (mut doc, model) = model_doc();
        {
            let mut m = doc.get_mut(model).into_view::<ModelMut>().unwrap();
            let mut mesh = m.create_mesh("head");
            mesh.set_positions(vec![Vec3::ZERO, Vec3::X, Vec3::Y]);
            mesh.set_face_buffer(vec![0, 1, 2]);
            mesh.set_uv_layer(0, vec![Vec2::ZERO, Vec2::X, Vec2::ONE]);
            mesh.set_uv_layer_count(1);
        }

        let model = doc.get(model).view::<Model>().unwrap();
        let mesh = model.meshes()[0];
        assert_eq!(mesh.name(), "head");
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.face_buffer().unwrap(), vec![0, 1, 2]);
        assert_eq!(mesh.uv_layer(0).unwrap().len(), 3);
        assert_eq!(mesh.uv_layer_count(), 1);
        assert!(mesh.uv_layer(1).is_none());
        assert_eq!(mesh.skinning_method(), "linear");
    }

    #[test]
    fn test_mesh_face_buffer_widens() {
        let (mut doc, model) = model_doc();
        let mesh = doc.create_child(model, NodeKind::Mesh);
        doc.node_mut(mesh).set_array("f", vec![0u16, 1, 2]);

        let mesh = doc.get(mesh).view::<Mesh>().unwrap();
        assert_eq!(mesh.face_buffer().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_mesh_material_resolution() {
        let (mut doc, model) = model_doc();
        {
            let mut m = doc.get_mut(model).into_view::<ModelMut>().unwrap();
            m.create_material("skin");
            let mut mesh = m.create_mesh("head");
            mesh.set_material_hash(fnv1a("skin"));
        }

        let model = doc.get(model).view::<Model>().unwrap();
        let mesh = model.meshes()[0];
        assert_eq!(mesh.material().unwrap().name(), "skin");
    }

    #[test]
    fn test_blend_shape_targets() {
        let (mut doc, model) = model_doc();
        {
            let mut m = doc.get_mut(model).into_view::<ModelMut>().unwrap();
            m.create_mesh("base");
            m.create_mesh("smile");
            m.create_mesh("frown");
            let mut blsh = m.create_blend_shape();
            blsh.set_base_mesh(fnv1a("base"));
            blsh.add_target(fnv1a("smile"), 0.25);
            blsh.add_target(fnv1a("frown"), 0.75);
        }

        let model = doc.get(model).view::<Model>().unwrap();
        let blsh = model.blend_shapes()[0];
        assert_eq!(blsh.base_mesh().unwrap().name(), "base");

        let targets = blsh.target_shapes();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].0.name(), "smile");
        assert_eq!(targets[0].1, 0.25);
        assert_eq!(targets[1].0.name(), "frown");
        assert_eq!(targets[1].1, 0.75);
    }

    #[test]
    fn test_blend_shape_default_weights() {
        let (mut doc, model) = model_doc();
        {
            let mut m = doc.get_mut(model).into_view::<ModelMut>().unwrap();
            m.create_mesh("base");
            m.create_mesh("open");
        }
        let blsh = doc.create_child(model, NodeKind::BlendShape);
        doc.node_mut(blsh).set_value("b", fnv1a("base"));
        doc.node_mut(blsh).set_array("t", vec![fnv1a("open")]);
        // no "ts" property at all

        let blsh = doc.get(blsh).view::<BlendShape>().unwrap();
        let targets = blsh.target_shapes();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].1, 1.0);
    }

    #[test]
    fn test_hair_segments() {
        let (mut doc, model) = model_doc();
        {
            let mut m = doc.get_mut(model).into_view::<ModelMut>().unwrap();
            let mut hair = m.create_hair();
            hair.set_name("mane");
            hair.set_segments(vec![4, 4, 6]);
        }

        let model = doc.get(model).view::<Model>().unwrap();
        let hair = model.hairs()[0];
        assert_eq!(hair.name(), "mane");
        assert_eq!(hair.strand_count(), 3);
        assert_eq!(hair.segments().unwrap(), vec![4, 4, 6]);
    }
}
