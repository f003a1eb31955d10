//! Typed facades over generic nodes.
//!
//! A view interprets the well-known property keys of one node kind; it
//! introduces no storage of its own, and keys it does not recognize stay
//! reachable through the generic property API (and round-trip unchanged).
//! Read views wrap a copyable [`NodeRef`]; write views wrap a [`NodeMut`].

use crate::document::{NodeMut, NodeRef};
use crate::format::NodeKind;

pub mod model;
pub mod skeleton;
pub mod animation;
pub mod material;

pub use animation::{
    Animation, AnimationMut, Curve, CurveModeOverride, CurveModeOverrideMut, CurveMut,
    NotificationTrack, NotificationTrackMut,
};
pub use material::{
    Color, ColorMut, FileRef, FileRefMut, Instance, InstanceMut, Material, MaterialMut,
};
pub use model::{
    BlendShape, BlendShapeMut, Hair, HairMut, Mesh, MeshMut, Model, ModelMut, Root, RootMut,
};
pub use skeleton::{
    Bone, BoneMut, Constraint, ConstraintMut, IkHandle, IkHandleMut, Skeleton, SkeletonMut,
};

/// A read-only typed view over a node of a fixed kind.
pub trait View<'a>: Sized {
    /// The node kind this view interprets.
    const KIND: NodeKind;

    /// Wrap a node without checking its kind. Callers normally go through
    /// [`NodeRef::view`] / [`NodeRef::try_view`], which do check.
    fn wrap(node: NodeRef<'a>) -> Self;

    /// The underlying generic node.
    fn node(&self) -> NodeRef<'a>;
}

/// A mutable typed view over a node of a fixed kind.
pub trait ViewMut<'d>: Sized {
    /// The node kind this view interprets.
    const KIND: NodeKind;

    /// Wrap a node without checking its kind. Callers normally go through
    /// [`NodeMut::into_view`], which does check.
    fn wrap(node: NodeMut<'d>) -> Self;

    /// The underlying generic node handle.
    fn node_mut(&mut self) -> &mut NodeMut<'d>;
}
