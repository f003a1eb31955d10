//! # Cast
//!
//! Rust implementation of the Cast binary container format - a hierarchical,
//! typed, property-bearing node tree used to describe 3D models, skeletons,
//! animations, materials and related assets.
//!
//! The Cast format was created by DTZxPorter for game asset interchange. This
//! is an independent Rust implementation aiming for byte-exact round-trips:
//! loading a conforming file and saving it again reproduces the input
//! byte-for-byte.
//!
//! ## Modules
//!
//! - [`util`] - Errors, FNV-1a hashing, math types
//! - [`format`] - Wire constants, node and property identifiers
//! - [`property`] - Typed property payloads and the ordered property map
//! - [`node`] - The generic node (identifier, hash, properties)
//! - [`document`] - The node arena, navigation handles and load/save entry points
//! - [`reader`] / [`writer`] - The low-level codec
//! - [`views`] - Typed facades (Model, Mesh, Skeleton, Bone, Animation, ...)
//!
//! ## Example
//!
//! ```
//! use cast::prelude::*;
//!
//! let mut doc = CastDocument::new();
//! let root = doc.create_root(NodeKind::Root);
//! let model = doc.create_child(root, NodeKind::Model);
//! let skel = doc.create_child(model, NodeKind::Skeleton);
//!
//! let mut skeleton = doc.get_mut(skel).into_view::<SkeletonMut>().unwrap();
//! let mut bone = skeleton.create_bone("pelvis");
//! bone.set_parent_index(-1);
//!
//! let bytes = doc.to_bytes().unwrap();
//! let reloaded = CastDocument::from_bytes(&bytes).unwrap();
//! assert_eq!(reloaded.to_bytes().unwrap(), bytes);
//! ```

pub mod util;
pub mod format;
pub mod property;
pub mod node;
pub mod document;
pub mod reader;
pub mod writer;
pub mod views;

// Re-export commonly used types
pub use document::{CastDocument, NodeId, NodeMut, NodeRef};
pub use format::{NodeKind, PropertyKind};
pub use node::CastNode;
pub use property::{Property, PropertyMap, PropertyValue};
pub use util::{fnv1a, Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::document::{CastDocument, NodeId, NodeMut, NodeRef};
    pub use crate::format::{NodeKind, PropertyKind};
    pub use crate::node::CastNode;
    pub use crate::property::{Property, PropertyMap, PropertyValue};
    pub use crate::util::{fnv1a, Error, Result};
    pub use crate::views::*;
}
