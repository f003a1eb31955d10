//! Animation-side views: animation container, curves, curve mode overrides
//! and notification tracks.

use crate::document::{NodeMut, NodeRef};
use crate::format::NodeKind;
use crate::property::{Property, PropertyValue};
use crate::util::Result;

use super::{View, ViewMut};

// ============================================================================
// Animation
// ============================================================================

/// Typed view of an `anim` node.
#[derive(Clone, Copy)]
pub struct Animation<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Animation<'a> {
    const KIND: NodeKind = NodeKind::Animation;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Animation<'a> {
    /// Playback framerate.
    pub fn framerate(&self) -> f32 {
        self.node.first_or("f", 30.0)
    }

    /// Whether the animation loops.
    pub fn looping(&self) -> bool {
        self.node.first_or::<u8>("b", 0) != 0
    }

    /// The animation's curves, in order.
    pub fn curves(&self) -> Vec<Curve<'a>> {
        self.node.children_of_kind()
    }

    /// The animation's per-node curve mode overrides, in order.
    pub fn curve_mode_overrides(&self) -> Vec<CurveModeOverride<'a>> {
        self.node.children_of_kind()
    }

    /// The animation's notification tracks, in order.
    pub fn notification_tracks(&self) -> Vec<NotificationTrack<'a>> {
        self.node.children_of_kind()
    }
}

/// Mutable view of an `anim` node.
pub struct AnimationMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for AnimationMut<'d> {
    const KIND: NodeKind = NodeKind::Animation;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> AnimationMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Animation<'_> {
        Animation::wrap(self.node.as_ref())
    }

    /// Set the playback framerate.
    pub fn set_framerate(&mut self, framerate: f32) {
        self.node.node().set_value("f", framerate);
    }

    /// Set whether the animation loops.
    pub fn set_looping(&mut self, looping: bool) {
        self.node.node().set_value("b", looping as u8);
    }

    /// Append a new curve.
    pub fn create_curve(&mut self) -> CurveMut<'_> {
        CurveMut::wrap(self.node.create_child(NodeKind::Curve))
    }

    /// Append a new curve mode override.
    pub fn create_curve_mode_override(&mut self) -> CurveModeOverrideMut<'_> {
        CurveModeOverrideMut::wrap(self.node.create_child(NodeKind::CurveModeOverride))
    }

    /// Append a new notification track.
    pub fn create_notification_track(&mut self) -> NotificationTrackMut<'_> {
        NotificationTrackMut::wrap(self.node.create_child(NodeKind::NotificationTrack))
    }
}

// ============================================================================
// Curve
// ============================================================================

/// Typed view of a `curv` node.
///
/// A curve animates one property (`kp`) of one target node (`nn`). Keyframe
/// indices (`kb`) are stored as u8/u16/u32 and widen on read; key values
/// (`kv`) may hold any supported payload kind.
#[derive(Clone, Copy)]
pub struct Curve<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for Curve<'a> {
    const KIND: NodeKind = NodeKind::Curve;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> Curve<'a> {
    /// Name of the node this curve animates.
    pub fn node_name(&self) -> &'a str {
        self.node.string_or("nn", "")
    }

    /// The animated property key (for example `rq` or `tx`).
    pub fn key_property(&self) -> &'a str {
        self.node.string_or("kp", "")
    }

    /// Keyframe frame indices, widened from u8/u16/u32.
    pub fn keyframe_buffer(&self) -> Result<Vec<u32>> {
        Ok(self
            .node
            .integer_array("kb", 32)?
            .into_iter()
            .map(|v| v as u32)
            .collect())
    }

    /// The raw key value property, whatever its payload kind.
    pub fn key_value_buffer(&self) -> Option<&'a Property> {
        self.node.try_property("kv")
    }

    /// Key values as a typed slice, when the stored kind matches.
    pub fn values<T: PropertyValue>(&self) -> Option<&'a [T]> {
        self.node.try_array("kv")
    }

    /// The curve blend mode.
    pub fn mode(&self) -> &'a str {
        self.node.string_or("m", "relative")
    }

    /// Blend weight applied in additive mode.
    pub fn additive_blend_weight(&self) -> f32 {
        self.node.first_or("ab", 1.0)
    }
}

/// Mutable view of a `curv` node.
pub struct CurveMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for CurveMut<'d> {
    const KIND: NodeKind = NodeKind::Curve;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> CurveMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> Curve<'_> {
        Curve::wrap(self.node.as_ref())
    }

    /// Name the node this curve animates.
    pub fn set_node_name(&mut self, name: &str) {
        self.node.node().set_string("nn", name);
    }

    /// Set the animated property key.
    pub fn set_key_property(&mut self, key: &str) {
        self.node.node().set_string("kp", key);
    }

    /// Install the keyframe frame index buffer.
    pub fn set_keyframe_buffer(&mut self, frames: Vec<u32>) {
        self.node.node().set_array("kb", frames);
    }

    /// Install the key value buffer with any supported payload type.
    pub fn set_values<T: PropertyValue>(&mut self, values: Vec<T>) {
        self.node.node().set_array("kv", values);
    }

    /// Set the curve blend mode.
    pub fn set_mode(&mut self, mode: &str) {
        self.node.node().set_string("m", mode);
    }

    /// Set the blend weight applied in additive mode.
    pub fn set_additive_blend_weight(&mut self, weight: f32) {
        self.node.node().set_value("ab", weight);
    }
}

// ============================================================================
// CurveModeOverride
// ============================================================================

/// Typed view of a `cMOV` node: overrides the curve mode for one target
/// node's translation/rotation/scale channels.
#[derive(Clone, Copy)]
pub struct CurveModeOverride<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for CurveModeOverride<'a> {
    const KIND: NodeKind = NodeKind::CurveModeOverride;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> CurveModeOverride<'a> {
    /// Name of the node the override applies to.
    pub fn node_name(&self) -> &'a str {
        self.node.string_or("nn", "")
    }

    /// The overriding mode.
    pub fn mode(&self) -> &'a str {
        self.node.string_or("m", "")
    }

    /// Whether translation channels are overridden.
    pub fn override_translation(&self) -> bool {
        self.node.first_or::<u8>("ot", 0) != 0
    }

    /// Whether rotation channels are overridden.
    pub fn override_rotation(&self) -> bool {
        self.node.first_or::<u8>("or", 0) != 0
    }

    /// Whether scale channels are overridden.
    pub fn override_scale(&self) -> bool {
        self.node.first_or::<u8>("os", 0) != 0
    }
}

/// Mutable view of a `cMOV` node.
pub struct CurveModeOverrideMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for CurveModeOverrideMut<'d> {
    const KIND: NodeKind = NodeKind::CurveModeOverride;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> CurveModeOverrideMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> CurveModeOverride<'_> {
        CurveModeOverride::wrap(self.node.as_ref())
    }

    /// Name the node the override applies to.
    pub fn set_node_name(&mut self, name: &str) {
        self.node.node().set_string("nn", name);
    }

    /// Set the overriding mode.
    pub fn set_mode(&mut self, mode: &str) {
        self.node.node().set_string("m", mode);
    }

    /// Override the translation channels.
    pub fn set_override_translation(&mut self, enabled: bool) {
        self.node.node().set_value("ot", enabled as u8);
    }

    /// Override the rotation channels.
    pub fn set_override_rotation(&mut self, enabled: bool) {
        self.node.node().set_value("or", enabled as u8);
    }

    /// Override the scale channels.
    pub fn set_override_scale(&mut self, enabled: bool) {
        self.node.node().set_value("os", enabled as u8);
    }
}

// ============================================================================
// NotificationTrack
// ============================================================================

/// Typed view of an `ntif` node: named events fired on given frames.
#[derive(Clone, Copy)]
pub struct NotificationTrack<'a> {
    node: NodeRef<'a>,
}

impl<'a> View<'a> for NotificationTrack<'a> {
    const KIND: NodeKind = NodeKind::NotificationTrack;

    fn wrap(node: NodeRef<'a>) -> Self {
        Self { node }
    }
    fn node(&self) -> NodeRef<'a> {
        self.node
    }
}

impl<'a> NotificationTrack<'a> {
    /// The notification name.
    pub fn name(&self) -> &'a str {
        self.node.string_or("n", "")
    }

    /// The frames the notification fires on, widened from u8/u16/u32.
    pub fn keyframe_buffer(&self) -> Result<Vec<u32>> {
        Ok(self
            .node
            .integer_array("kb", 32)?
            .into_iter()
            .map(|v| v as u32)
            .collect())
    }
}

/// Mutable view of an `ntif` node.
pub struct NotificationTrackMut<'d> {
    node: NodeMut<'d>,
}

impl<'d> ViewMut<'d> for NotificationTrackMut<'d> {
    const KIND: NodeKind = NodeKind::NotificationTrack;

    fn wrap(node: NodeMut<'d>) -> Self {
        Self { node }
    }
    fn node_mut(&mut self) -> &mut NodeMut<'d> {
        &mut self.node
    }
}

impl<'d> NotificationTrackMut<'d> {
    /// A read view of the same node.
    pub fn as_view(&self) -> NotificationTrack<'_> {
        NotificationTrack::wrap(self.node.as_ref())
    }

    /// Set the notification name.
    pub fn set_name(&mut self, name: &str) {
        self.node.node().set_string("n", name);
    }

    /// Install the frame buffer.
    pub fn set_keyframe_buffer(&mut self, frames: Vec<u32>) {
        self.node.node().set_array("kb", frames);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::CastDocument;

    fn animation_doc() -> (CastDocument, crate::document::NodeId) {
        let mut doc = CastDocument::new();
        let root = doc.create_root(NodeKind::Root);
        let anim = doc.create_child(root, NodeKind::Animation);
        (doc, anim)
    }

    #[test]
    fn test_animation_defaults() {
        let (doc, anim) = animation_doc();
        let anim = doc.get(anim).view::<Animation>().unwrap();
        assert_eq!(anim.framerate(), 30.0);
        assert!(!anim.looping());
        assert!(anim.curves().is_empty());
    }

    #[test]
    fn test_curve_round_trip() {
        let (mut doc, anim) = animation_doc();
        {
            let mut a = doc.get_mut(anim).into_view::<AnimationMut>().unwrap();
            a.set_framerate(60.0);
            a.set_looping(true);
            let mut curve = a.create_curve();
            curve.set_node_name("pelvis");
            curve.set_key_property("tx");
            curve.set_keyframe_buffer(vec![0, 10, 20]);
            curve.set_values(vec![0.0f32, 1.0, 4.0]);
        }

        let anim = doc.get(anim).view::<Animation>().unwrap();
        assert_eq!(anim.framerate(), 60.0);
        assert!(anim.looping());

        let curve = anim.curves()[0];
        assert_eq!(curve.node_name(), "pelvis");
        assert_eq!(curve.key_property(), "tx");
        assert_eq!(curve.keyframe_buffer().unwrap(), vec![0, 10, 20]);
        assert_eq!(curve.values::<f32>().unwrap(), &[0.0, 1.0, 4.0]);
        assert_eq!(curve.mode(), "relative");
        assert_eq!(curve.additive_blend_weight(), 1.0);
    }

    #[test]
    fn test_curve_keyframes_widen() {
        let (mut doc, anim) = animation_doc();
        let curve = doc.create_child(anim, NodeKind::Curve);
        doc.node_mut(curve).set_array("kb", vec![0u8, 5, 9]);

        let curve = doc.get(curve).view::<Curve>().unwrap();
        assert_eq!(curve.keyframe_buffer().unwrap(), vec![0, 5, 9]);
    }

    #[test]
    fn test_curve_mode_override() {
        let (mut doc, anim) = animation_doc();
        {
            let mut a = doc.get_mut(anim).into_view::<AnimationMut>().unwrap();
            let mut over = a.create_curve_mode_override();
            over.set_node_name("pelvis");
            over.set_mode("absolute");
            over.set_override_rotation(true);
        }

        let anim = doc.get(anim).view::<Animation>().unwrap();
        let over = anim.curve_mode_overrides()[0];
        assert_eq!(over.node_name(), "pelvis");
        assert_eq!(over.mode(), "absolute");
        assert!(over.override_rotation());
        assert!(!over.override_translation());
    }

    #[test]
    fn test_notification_track() {
        let (mut doc, anim) = animation_doc();
        {
            let mut a = doc.get_mut(anim).into_view::<AnimationMut>().unwrap();
            let mut track = a.create_notification_track();
            track.set_name("footstep");
            track.set_keyframe_buffer(vec![3, 17]);
        }

        let anim = doc.get(anim).view::<Animation>().unwrap();
        let track = anim.notification_tracks()[0];
        assert_eq!(track.name(), "footstep");
        assert_eq!(track.keyframe_buffer().unwrap(), vec![3, 17]);
    }
}
