//! The Cast document: an arena of nodes with parent links, plus the
//! load/save entry points.
//!
//! Nodes live in a grow-only arena addressed by [`NodeId`]; each slot holds
//! the node payload, its parent id and its ordered child list. The arena
//! keeps back-navigation cheap without shared ownership: reparenting is a
//! detach from the old child list and an append to the new one.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use memmap2::Mmap;

use crate::format::{NodeKind, FILE_HEADER_SIZE};
use crate::node::CastNode;
use crate::property::{Property, PropertyValue};
use crate::util::{Error, Result};
use crate::views::{View, ViewMut};
use crate::{reader, writer};

/// Stable index of a node within its document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn new(index: usize) -> Self {
        Self(index as u32)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Slot {
    node: CastNode,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// A Cast document: an ordered sequence of root nodes.
#[derive(Clone, Debug, Default)]
pub struct CastDocument {
    slots: Vec<Slot>,
    roots: Vec<NodeId>,
}

impl CastDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    // === Loading ===

    /// Load a document from a file, memory-mapping it for the parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;

        let size = file.metadata()?.len();
        if size < FILE_HEADER_SIZE as u64 {
            return Err(Error::UnexpectedEof(size));
        }

        // Safety: the file is opened read-only and unmapped before return.
        let mmap = unsafe { Mmap::map(&file)? };
        reader::decode(&mmap)
    }

    /// Read a document from an arbitrary byte stream.
    pub fn read_from<R: Read>(mut stream: R) -> Result<Self> {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        reader::decode(&bytes)
    }

    /// Decode a document from an in-memory byte slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        reader::decode(bytes)
    }

    // === Saving ===

    /// Save the document to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Serialize the document into an arbitrary byte sink.
    pub fn write_to<W: Write>(&self, mut sink: W) -> Result<()> {
        sink.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    /// Serialize the document to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        writer::encode(self)
    }

    /// Save a single node (and its subtree) as a one-root document.
    pub fn save_node(&self, path: impl AsRef<Path>, id: NodeId) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        out.write_all(&self.node_to_bytes(id)?)?;
        out.flush()?;
        Ok(())
    }

    /// Serialize a single node (and its subtree) as a one-root document.
    pub fn node_to_bytes(&self, id: NodeId) -> Result<Vec<u8>> {
        writer::encode_node(self, id)
    }

    // === Structure ===

    /// The ordered root node ids.
    #[inline]
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Read handles for the root nodes, in order.
    pub fn root_refs(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.roots.iter().map(move |&id| NodeRef { doc: self, id })
    }

    /// Total number of nodes ever added to this document.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.slots.len()
    }

    /// The node payload for an id.
    #[inline]
    pub fn node(&self, id: NodeId) -> &CastNode {
        &self.slots[id.index()].node
    }

    /// Mutable node payload for an id.
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> &mut CastNode {
        &mut self.slots[id.index()].node
    }

    /// A node's parent id, if it is not a root.
    #[inline]
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.index()].parent
    }

    /// A node's ordered child ids.
    #[inline]
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        &self.slots[id.index()].children
    }

    /// A read handle for a node.
    #[inline]
    pub fn get(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    /// A write handle for a node.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> NodeMut<'_> {
        NodeMut { doc: self, id }
    }

    // === Mutation ===

    /// Append a node as a new root.
    pub fn add_root(&mut self, node: CastNode) -> NodeId {
        let id = self.push_slot(node, None);
        self.roots.push(id);
        id
    }

    /// Create a fresh node of the given kind as a new root.
    pub fn create_root(&mut self, kind: NodeKind) -> NodeId {
        self.add_root(CastNode::new(kind))
    }

    /// Append a node as the last child of `parent`.
    pub fn add_child(&mut self, parent: NodeId, node: CastNode) -> NodeId {
        let id = self.push_slot(node, Some(parent));
        self.slots[parent.index()].children.push(id);
        id
    }

    /// Create a fresh node of the given kind as the last child of `parent`.
    pub fn create_child(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        self.add_child(parent, CastNode::new(kind))
    }

    /// Move a node under a new parent: detaches it from its old parent's
    /// child list (or the root list) and appends it at the end of the new
    /// parent's children. Fails when the target is the node itself or lies
    /// inside the moved subtree, which would cut the subtree loose as an
    /// unreachable cycle.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) -> Result<()> {
        if child == new_parent || self.is_ancestor(child, new_parent) {
            return Err(Error::invalid(
                "reparent target is inside the moved subtree",
            ));
        }

        match self.slots[child.index()].parent {
            Some(old) => self.slots[old.index()].children.retain(|&c| c != child),
            None => self.roots.retain(|&c| c != child),
        }
        self.slots[new_parent.index()].children.push(child);
        self.slots[child.index()].parent = Some(new_parent);
        Ok(())
    }

    /// Deep-clone a subtree, attaching the copy under `parent` (or as a new
    /// root). Returns the id of the copy; the source is untouched.
    pub fn clone_subtree(&mut self, source: NodeId, parent: Option<NodeId>) -> NodeId {
        let node = self.slots[source.index()].node.clone();
        let copy = match parent {
            Some(p) => self.add_child(p, node),
            None => self.add_root(node),
        };
        let children = self.slots[source.index()].children.clone();
        for child in children {
            self.clone_subtree(child, Some(copy));
        }
        copy
    }

    fn push_slot(&mut self, node: CastNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.slots.len());
        self.slots.push(Slot {
            node,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Whether `ancestor` appears on `node`'s path to its root.
    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent_of(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent_of(id);
        }
        false
    }
}

/// A copyable read handle: a document reference plus a node id.
///
/// All accessors take `self` by value so borrowed results live as long as
/// the document borrow, not the handle.
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a CastDocument,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    #[inline]
    fn data(self) -> &'a CastNode {
        self.doc.node(self.id)
    }

    /// This node's id.
    #[inline]
    pub fn id(self) -> NodeId {
        self.id
    }

    /// The owning document.
    #[inline]
    pub fn document(self) -> &'a CastDocument {
        self.doc
    }

    /// The node kind.
    #[inline]
    pub fn kind(self) -> NodeKind {
        self.data().kind()
    }

    /// The raw 32-bit identifier.
    #[inline]
    pub fn identifier(self) -> u32 {
        self.data().identifier()
    }

    /// The 64-bit name hash (0 means unset).
    #[inline]
    pub fn hash(self) -> u64 {
        self.data().hash()
    }

    /// The underlying node payload.
    #[inline]
    pub fn node(self) -> &'a CastNode {
        self.data()
    }

    // === Navigation ===

    /// The parent node, if this is not a root.
    pub fn parent(self) -> Option<NodeRef<'a>> {
        self.doc.parent_of(self.id).map(|id| self.doc.get(id))
    }

    /// Iterate the children in order.
    pub fn children(self) -> impl Iterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        doc.children_of(self.id).iter().map(move |&id| doc.get(id))
    }

    /// Number of children.
    pub fn child_count(self) -> usize {
        self.doc.children_of(self.id).len()
    }

    /// Number of children with the given kind.
    pub fn child_count_of(self, kind: NodeKind) -> usize {
        self.children().filter(|c| c.kind() == kind).count()
    }

    /// Number of children viewable as `V`.
    pub fn child_count_of_kind<V: View<'a>>(self) -> usize {
        self.child_count_of(V::KIND)
    }

    /// The child at `index`.
    pub fn child_at(self, index: usize) -> Result<NodeRef<'a>> {
        let children = self.doc.children_of(self.id);
        children
            .get(index)
            .map(|&id| self.doc.get(id))
            .ok_or(Error::IndexOutOfRange {
                index,
                count: children.len(),
            })
    }

    /// The child at `index`, which must have the given kind.
    pub fn child_at_of(self, kind: NodeKind, index: usize) -> Result<NodeRef<'a>> {
        let child = self.child_at(index)?;
        if child.kind() == kind {
            Ok(child)
        } else {
            Err(Error::TypeMismatch {
                expected: kind,
                actual: child.kind(),
            })
        }
    }

    /// The child at `index`, viewed as `V`.
    pub fn child_of_kind_at<V: View<'a>>(self, index: usize) -> Result<V> {
        Ok(V::wrap(self.child_at_of(V::KIND, index)?))
    }

    /// The first child.
    pub fn first_child(self) -> Result<NodeRef<'a>> {
        self.child_at(0)
    }

    /// The first child, or None.
    pub fn try_first_child(self) -> Option<NodeRef<'a>> {
        self.children().next()
    }

    /// The first child with the given kind.
    pub fn first_child_of(self, kind: NodeKind) -> Result<NodeRef<'a>> {
        self.try_first_child_of(kind)
            .ok_or(Error::IndexOutOfRange { index: 0, count: 0 })
    }

    /// The first child with the given kind, or None.
    pub fn try_first_child_of(self, kind: NodeKind) -> Option<NodeRef<'a>> {
        self.children().find(|c| c.kind() == kind)
    }

    /// The first child viewable as `V`.
    pub fn first_child_of_kind<V: View<'a>>(self) -> Result<V> {
        Ok(V::wrap(self.first_child_of(V::KIND)?))
    }

    /// The first child viewable as `V`, or None.
    pub fn try_first_child_of_kind<V: View<'a>>(self) -> Option<V> {
        self.try_first_child_of(V::KIND).map(V::wrap)
    }

    /// Linear scan for a child with the given hash. A zero hash never
    /// matches.
    pub fn child_by_hash(self, hash: u64) -> Option<NodeRef<'a>> {
        if hash == 0 {
            return None;
        }
        self.children().find(|c| c.hash() == hash)
    }

    /// Linear scan for a child of kind `V` with the given hash.
    pub fn child_by_hash_of_kind<V: View<'a>>(self, hash: u64) -> Option<V> {
        if hash == 0 {
            return None;
        }
        self.children()
            .find(|c| c.kind() == V::KIND && c.hash() == hash)
            .map(V::wrap)
    }

    /// Collect every child viewable as `V`, in order.
    pub fn children_of_kind<V: View<'a> + 'a>(self) -> Vec<V> {
        self.iter_children_of_kind().collect()
    }

    /// Lazily iterate every child viewable as `V`, in order.
    pub fn iter_children_of_kind<V: View<'a> + 'a>(self) -> impl Iterator<Item = V> + 'a {
        self.children()
            .filter(|c| c.kind() == V::KIND)
            .map(V::wrap)
    }

    /// View this node as `V`.
    pub fn view<V: View<'a>>(self) -> Result<V> {
        self.try_view()
            .ok_or(Error::TypeMismatch {
                expected: V::KIND,
                actual: self.kind(),
            })
    }

    /// View this node as `V`, or None.
    pub fn try_view<V: View<'a>>(self) -> Option<V> {
        (self.kind() == V::KIND).then(|| V::wrap(self))
    }

    // === Property access (delegated to the node payload) ===

    /// Get a property by key.
    pub fn property(self, key: &str) -> Result<&'a Property> {
        self.data().property(key)
    }

    /// Get a property by key, or None.
    pub fn try_property(self, key: &str) -> Option<&'a Property> {
        self.data().try_property(key)
    }

    /// Get a string property's value.
    pub fn string(self, key: &str) -> Result<&'a str> {
        self.data().string(key)
    }

    /// Get a string property's value, or a default.
    pub fn string_or(self, key: &str, default: &'a str) -> &'a str {
        self.data().string_or(key, default)
    }

    /// Get the first value of an array property.
    pub fn first<T: PropertyValue>(self, key: &str) -> Result<T> {
        self.data().first(key)
    }

    /// Get the first value of an array property, or None.
    pub fn try_first<T: PropertyValue>(self, key: &str) -> Option<T> {
        self.data().try_property(key).and_then(Property::first::<T>)
    }

    /// Get the first value of an array property, or a default.
    pub fn first_or<T: PropertyValue>(self, key: &str, default: T) -> T {
        self.data().first_or(key, default)
    }

    /// Widened first-integer access; see [`CastNode::first_integer_or`].
    pub fn first_integer_or(self, key: &str, default: u64, max_bits: u32) -> u64 {
        self.data().first_integer_or(key, default, max_bits)
    }

    /// Widened integer-array access; see [`CastNode::integer_array`].
    pub fn integer_array(self, key: &str, max_bits: u32) -> Result<Vec<u64>> {
        self.data().integer_array(key, max_bits)
    }

    /// Get an array property's values as a typed slice.
    pub fn array<T: PropertyValue>(self, key: &str) -> Result<&'a [T]> {
        self.data().array(key)
    }

    /// Get an array property's values, or None.
    pub fn try_array<T: PropertyValue>(self, key: &str) -> Option<&'a [T]> {
        self.data().try_array(key)
    }
}

/// A write handle: exclusive access to one node of a document.
pub struct NodeMut<'d> {
    doc: &'d mut CastDocument,
    id: NodeId,
}

impl<'d> NodeMut<'d> {
    /// This node's id.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// A read handle for this node.
    #[inline]
    pub fn as_ref(&self) -> NodeRef<'_> {
        self.doc.get(self.id)
    }

    /// The underlying node payload (identifier, hash, properties).
    #[inline]
    pub fn node(&mut self) -> &mut CastNode {
        self.doc.node_mut(self.id)
    }

    /// The owning document.
    #[inline]
    pub fn document(&self) -> &CastDocument {
        self.doc
    }

    /// Mutable access to the owning document.
    #[inline]
    pub fn document_mut(&mut self) -> &mut CastDocument {
        self.doc
    }

    /// Create a fresh child node and descend into it.
    pub fn create_child(&mut self, kind: NodeKind) -> NodeMut<'_> {
        let id = self.doc.create_child(self.id, kind);
        NodeMut {
            doc: &mut *self.doc,
            id,
        }
    }

    /// Append an existing node payload as the last child.
    pub fn add_child(&mut self, node: CastNode) -> NodeMut<'_> {
        let id = self.doc.add_child(self.id, node);
        NodeMut {
            doc: &mut *self.doc,
            id,
        }
    }

    /// Convert into a typed write view.
    pub fn into_view<V: ViewMut<'d>>(self) -> Result<V> {
        let actual = self.as_ref().kind();
        if actual == V::KIND {
            Ok(V::wrap(self))
        } else {
            Err(Error::TypeMismatch {
                expected: V::KIND,
                actual,
            })
        }
    }
}
