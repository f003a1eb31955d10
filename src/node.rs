//! The generic Cast node: identifier, hash and typed properties.
//!
//! Tree shape (parent and children) lives in the document arena; a
//! `CastNode` is the per-node payload every typed facade reads through.

use crate::format::{NodeKind, PropertyKind};
use crate::property::{Property, PropertyMap, PropertyValue};
use crate::util::{Error, Result};

/// A tagged, hashable, property-bearing tree element.
#[derive(Clone, Debug, PartialEq)]
pub struct CastNode {
    kind: NodeKind,
    hash: u64,
    properties: PropertyMap,
}

impl CastNode {
    /// Create a node with an identifier and no hash.
    pub fn new(kind: NodeKind) -> Self {
        Self::with_hash(kind, 0)
    }

    /// Create a node with an identifier and hash.
    pub fn with_hash(kind: NodeKind, hash: u64) -> Self {
        Self {
            kind,
            hash,
            properties: PropertyMap::new(),
        }
    }

    /// The node kind.
    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// The raw 32-bit identifier.
    #[inline]
    pub fn identifier(&self) -> u32 {
        self.kind.id()
    }

    /// The 64-bit name hash (0 means unset).
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Set the name hash.
    pub fn set_hash(&mut self, hash: u64) {
        self.hash = hash;
    }

    /// The ordered property map.
    #[inline]
    pub fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    /// Mutable access to the property map.
    #[inline]
    pub fn properties_mut(&mut self) -> &mut PropertyMap {
        &mut self.properties
    }

    // === Property getters ===

    /// Get a property by key.
    pub fn property(&self, key: &str) -> Result<&Property> {
        self.properties
            .get(key)
            .ok_or_else(|| Error::PropertyMissing(key.to_string()))
    }

    /// Get a property by key, or None.
    pub fn try_property(&self, key: &str) -> Option<&Property> {
        self.properties.get(key)
    }

    /// Get a string property's value.
    pub fn string(&self, key: &str) -> Result<&str> {
        let prop = self.property(key)?;
        prop.as_str().ok_or_else(|| Error::PropertyKindMismatch {
            key: key.to_string(),
            expected: PropertyKind::String,
            actual: prop.kind(),
        })
    }

    /// Get a string property's value, or a default. Never fails.
    pub fn string_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.try_property(key)
            .and_then(Property::as_str)
            .unwrap_or(default)
    }

    /// Get the first value of an array property.
    pub fn first<T: PropertyValue>(&self, key: &str) -> Result<T> {
        let prop = self.property(key)?;
        let values = prop
            .values::<T>()
            .ok_or_else(|| Error::PropertyKindMismatch {
                key: key.to_string(),
                expected: T::KIND,
                actual: prop.kind(),
            })?;
        values
            .first()
            .copied()
            .ok_or_else(|| Error::EmptyArray(key.to_string()))
    }

    /// Get the first value of an array property, or a default. Never fails.
    pub fn first_or<T: PropertyValue>(&self, key: &str, default: T) -> T {
        self.try_property(key)
            .and_then(Property::first::<T>)
            .unwrap_or(default)
    }

    /// Get the first value of an integer property widened to u64, accepting
    /// any unsigned kind whose element width is at most `max_bits`. Never
    /// fails; missing, mismatched and empty all yield the default.
    pub fn first_integer_or(&self, key: &str, default: u64, max_bits: u32) -> u64 {
        self.try_property(key)
            .and_then(|p| p.first_integer(max_bits))
            .unwrap_or(default)
    }

    /// Get every value of an integer property widened to u64, under the same
    /// width ceiling as [`CastNode::first_integer_or`].
    pub fn integer_array(&self, key: &str, max_bits: u32) -> Result<Vec<u64>> {
        let prop = self.property(key)?;
        prop.widened_integers(max_bits)
            .ok_or_else(|| Error::PropertyKindMismatch {
                key: key.to_string(),
                expected: PropertyKind::widest_integer(max_bits),
                actual: prop.kind(),
            })
    }

    /// Get an array property's values as a typed slice.
    pub fn array<T: PropertyValue>(&self, key: &str) -> Result<&[T]> {
        let prop = self.property(key)?;
        prop.values::<T>().ok_or_else(|| Error::PropertyKindMismatch {
            key: key.to_string(),
            expected: T::KIND,
            actual: prop.kind(),
        })
    }

    /// Get an array property's values, or None on missing/mismatch.
    pub fn try_array<T: PropertyValue>(&self, key: &str) -> Option<&[T]> {
        self.try_property(key).and_then(Property::values::<T>)
    }

    // === Property setters (always overwrite) ===

    /// Install a string property.
    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Property {
        self.properties.insert(key, Property::string(value))
    }

    /// Install a single-element array property.
    pub fn set_value<T: PropertyValue>(&mut self, key: impl Into<String>, value: T) -> &mut Property {
        self.properties.insert(key, Property::single(value))
    }

    /// Install an array property.
    pub fn set_array<T: PropertyValue>(
        &mut self,
        key: impl Into<String>,
        values: Vec<T>,
    ) -> &mut Property {
        self.properties.insert(key, Property::array(values))
    }

    /// Append a value to an array property, creating it when missing.
    /// Fails when the key holds a different payload kind.
    pub fn push_value<T: PropertyValue>(&mut self, key: &str, value: T) -> Result<()> {
        match self.properties.get_mut(key) {
            Some(prop) => {
                if prop.push(value) {
                    Ok(())
                } else {
                    Err(Error::PropertyKindMismatch {
                        key: key.to_string(),
                        expected: T::KIND,
                        actual: prop.kind(),
                    })
                }
            }
            None => {
                self.properties.insert(key, Property::single(value));
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_string_access() {
        let mut node = CastNode::new(NodeKind::Bone);
        node.set_string("n", "pelvis");

        assert_eq!(node.string("n").unwrap(), "pelvis");
        assert_eq!(node.string_or("n", "?"), "pelvis");
        assert_eq!(node.string_or("missing", "?"), "?");
        assert!(matches!(node.string("missing"), Err(Error::PropertyMissing(_))));

        node.set_value("p", 3u32);
        assert!(matches!(
            node.string("p"),
            Err(Error::PropertyKindMismatch { .. })
        ));
    }

    #[test]
    fn test_first_failure_modes() {
        let mut node = CastNode::new(NodeKind::Mesh);
        node.set_array::<f32>("wv", vec![]);
        node.set_string("n", "head");

        assert!(matches!(node.first::<f32>("wv"), Err(Error::EmptyArray(_))));
        assert!(matches!(
            node.first::<f32>("n"),
            Err(Error::PropertyKindMismatch { .. })
        ));
        assert!(matches!(
            node.first::<f32>("absent"),
            Err(Error::PropertyMissing(_))
        ));
        assert_eq!(node.first_or("wv", 0.5f32), 0.5);
    }

    #[test]
    fn test_integer_widening_ceiling() {
        let mut node = CastNode::new(NodeKind::Mesh);
        node.set_array("f", vec![9u16, 8, 7]);

        assert_eq!(node.first_integer_or("f", 0, 32), 9);
        assert_eq!(node.first_integer_or("f", 0, 16), 9);
        assert_eq!(node.first_integer_or("f", 0, 8), 0);
        assert_eq!(node.integer_array("f", 32).unwrap(), vec![9, 8, 7]);
        assert!(node.integer_array("f", 8).is_err());

        node.set_array("f", vec![1u64]);
        assert_eq!(node.first_integer_or("f", 42, 32), 42);
    }

    #[test]
    fn test_setters_overwrite() {
        let mut node = CastNode::new(NodeKind::Bone);
        node.set_value("p", 1u32);
        node.set_value("p", 2u32);
        assert_eq!(node.properties().len(), 1);
        assert_eq!(node.first::<u32>("p").unwrap(), 2);
    }

    #[test]
    fn test_push_value() {
        let mut node = CastNode::new(NodeKind::Mesh);
        node.push_value("vp", Vec3::ZERO).unwrap();
        node.push_value("vp", Vec3::ONE).unwrap();
        assert_eq!(node.array::<Vec3>("vp").unwrap().len(), 2);
        assert!(node.push_value("vp", 1.0f32).is_err());
    }
}
