//! Typed property payloads and the insertion-ordered property map.
//!
//! A property is either a single null-terminated string or an array of one
//! of the fixed-width primitive kinds in [`PropertyKind`]. The payload owns
//! the exact on-wire values; endianness is handled at the codec boundary.

use glam::{Vec2, Vec3, Vec4};

use crate::format::PropertyKind;

/// A typed property payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Property {
    /// A single UTF-8 string (null-terminated on disk).
    String(String),
    /// Unsigned 8-bit integers.
    Byte(Vec<u8>),
    /// Unsigned 16-bit integers.
    Short(Vec<u16>),
    /// Unsigned 32-bit integers.
    Integer32(Vec<u32>),
    /// Unsigned 64-bit integers.
    Integer64(Vec<u64>),
    /// 32-bit floats.
    Float(Vec<f32>),
    /// 64-bit floats.
    Double(Vec<f64>),
    /// 2-component float vectors.
    Vector2(Vec<Vec2>),
    /// 3-component float vectors.
    Vector3(Vec<Vec3>),
    /// 4-component float vectors.
    Vector4(Vec<Vec4>),
}

impl Property {
    /// Create a string property.
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Create an array property from a sequence of values.
    pub fn array<T: PropertyValue>(values: Vec<T>) -> Self {
        T::make(values)
    }

    /// Create a single-element array property.
    pub fn single<T: PropertyValue>(value: T) -> Self {
        T::make(vec![value])
    }

    /// Create an empty array property with reserved capacity.
    pub fn empty<T: PropertyValue>(capacity: usize) -> Self {
        T::make(Vec::with_capacity(capacity))
    }

    /// The kind tag of this payload.
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::String(_) => PropertyKind::String,
            Self::Byte(_) => PropertyKind::Byte,
            Self::Short(_) => PropertyKind::Short,
            Self::Integer32(_) => PropertyKind::Integer32,
            Self::Integer64(_) => PropertyKind::Integer64,
            Self::Float(_) => PropertyKind::Float,
            Self::Double(_) => PropertyKind::Double,
            Self::Vector2(_) => PropertyKind::Vector2,
            Self::Vector3(_) => PropertyKind::Vector3,
            Self::Vector4(_) => PropertyKind::Vector4,
        }
    }

    /// Number of values held (strings always count as one).
    pub fn value_count(&self) -> usize {
        match self {
            Self::String(_) => 1,
            Self::Byte(v) => v.len(),
            Self::Short(v) => v.len(),
            Self::Integer32(v) => v.len(),
            Self::Integer64(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::Vector2(v) => v.len(),
            Self::Vector3(v) => v.len(),
            Self::Vector4(v) => v.len(),
        }
    }

    /// Serialized size of the payload alone, excluding the property header
    /// and key bytes. Strings count their null terminator.
    pub fn data_size(&self) -> usize {
        match self {
            Self::String(s) => s.len() + 1,
            other => other.value_count() * other.kind().element_size(),
        }
    }

    /// The string value, if this is a string property.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The values as a typed slice, if the kind matches.
    pub fn values<T: PropertyValue>(&self) -> Option<&[T]> {
        T::values(self).map(Vec::as_slice)
    }

    /// The first value, if the kind matches and the array is non-empty.
    pub fn first<T: PropertyValue>(&self) -> Option<T> {
        T::values(self).and_then(|v| v.first().copied())
    }

    /// Overwrite the first value, appending if the array is empty.
    /// Returns false when the kind does not match.
    pub fn set_first<T: PropertyValue>(&mut self, value: T) -> bool {
        match T::values_mut(self) {
            Some(v) => {
                if v.is_empty() {
                    v.push(value);
                } else {
                    v[0] = value;
                }
                true
            }
            None => false,
        }
    }

    /// Append a value. Returns false when the kind does not match.
    pub fn push<T: PropertyValue>(&mut self, value: T) -> bool {
        match T::values_mut(self) {
            Some(v) => {
                v.push(value);
                true
            }
            None => false,
        }
    }

    /// First value of an integer property widened to u64, provided the
    /// element width does not exceed `max_bits`.
    pub fn first_integer(&self, max_bits: u32) -> Option<u64> {
        if self.kind().integer_bits()? > max_bits {
            return None;
        }
        match self {
            Self::Byte(v) => v.first().map(|&x| x as u64),
            Self::Short(v) => v.first().map(|&x| x as u64),
            Self::Integer32(v) => v.first().map(|&x| x as u64),
            Self::Integer64(v) => v.first().copied(),
            _ => None,
        }
    }

    /// All values of an integer property widened to u64, under the same
    /// `max_bits` ceiling as [`Property::first_integer`].
    pub fn widened_integers(&self, max_bits: u32) -> Option<Vec<u64>> {
        if self.kind().integer_bits()? > max_bits {
            return None;
        }
        match self {
            Self::Byte(v) => Some(v.iter().map(|&x| x as u64).collect()),
            Self::Short(v) => Some(v.iter().map(|&x| x as u64).collect()),
            Self::Integer32(v) => Some(v.iter().map(|&x| x as u64).collect()),
            Self::Integer64(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// A primitive type that can live in an array property.
///
/// The trait carries the variant plumbing plus the little-endian wire form
/// of one element; the `Pod` bound is what lets the codec bulk-copy whole
/// buffers on little-endian hosts.
pub trait PropertyValue: bytemuck::Pod {
    /// The property kind an array of this type serializes as.
    const KIND: PropertyKind;

    /// Wrap a value vector in the matching [`Property`] variant.
    fn make(values: Vec<Self>) -> Property;

    /// Project the matching variant's vector out of a property.
    fn values(prop: &Property) -> Option<&Vec<Self>>;

    /// Mutable projection of the matching variant's vector.
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>>;

    /// Decode one element from exactly `KIND.element_size()` wire bytes.
    fn from_wire(chunk: &[u8]) -> Self;

    /// Append one element's wire bytes.
    fn write_wire(self, out: &mut Vec<u8>);
}

macro_rules! le_bytes {
    ($chunk:expr, $ty:ty) => {
        <$ty>::from_le_bytes($chunk.try_into().expect("chunk sized by element_size"))
    };
}

impl PropertyValue for u8 {
    const KIND: PropertyKind = PropertyKind::Byte;

    fn make(values: Vec<Self>) -> Property {
        Property::Byte(values)
    }
    fn values(prop: &Property) -> Option<&Vec<Self>> {
        match prop {
            Property::Byte(v) => Some(v),
            _ => None,
        }
    }
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>> {
        match prop {
            Property::Byte(v) => Some(v),
            _ => None,
        }
    }
    fn from_wire(chunk: &[u8]) -> Self {
        chunk[0]
    }
    fn write_wire(self, out: &mut Vec<u8>) {
        out.push(self);
    }
}

impl PropertyValue for u16 {
    const KIND: PropertyKind = PropertyKind::Short;

    fn make(values: Vec<Self>) -> Property {
        Property::Short(values)
    }
    fn values(prop: &Property) -> Option<&Vec<Self>> {
        match prop {
            Property::Short(v) => Some(v),
            _ => None,
        }
    }
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>> {
        match prop {
            Property::Short(v) => Some(v),
            _ => None,
        }
    }
    fn from_wire(chunk: &[u8]) -> Self {
        le_bytes!(chunk, u16)
    }
    fn write_wire(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl PropertyValue for u32 {
    const KIND: PropertyKind = PropertyKind::Integer32;

    fn make(values: Vec<Self>) -> Property {
        Property::Integer32(values)
    }
    fn values(prop: &Property) -> Option<&Vec<Self>> {
        match prop {
            Property::Integer32(v) => Some(v),
            _ => None,
        }
    }
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>> {
        match prop {
            Property::Integer32(v) => Some(v),
            _ => None,
        }
    }
    fn from_wire(chunk: &[u8]) -> Self {
        le_bytes!(chunk, u32)
    }
    fn write_wire(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl PropertyValue for u64 {
    const KIND: PropertyKind = PropertyKind::Integer64;

    fn make(values: Vec<Self>) -> Property {
        Property::Integer64(values)
    }
    fn values(prop: &Property) -> Option<&Vec<Self>> {
        match prop {
            Property::Integer64(v) => Some(v),
            _ => None,
        }
    }
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>> {
        match prop {
            Property::Integer64(v) => Some(v),
            _ => None,
        }
    }
    fn from_wire(chunk: &[u8]) -> Self {
        le_bytes!(chunk, u64)
    }
    fn write_wire(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl PropertyValue for f32 {
    const KIND: PropertyKind = PropertyKind::Float;

    fn make(values: Vec<Self>) -> Property {
        Property::Float(values)
    }
    fn values(prop: &Property) -> Option<&Vec<Self>> {
        match prop {
            Property::Float(v) => Some(v),
            _ => None,
        }
    }
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>> {
        match prop {
            Property::Float(v) => Some(v),
            _ => None,
        }
    }
    fn from_wire(chunk: &[u8]) -> Self {
        le_bytes!(chunk, f32)
    }
    fn write_wire(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl PropertyValue for f64 {
    const KIND: PropertyKind = PropertyKind::Double;

    fn make(values: Vec<Self>) -> Property {
        Property::Double(values)
    }
    fn values(prop: &Property) -> Option<&Vec<Self>> {
        match prop {
            Property::Double(v) => Some(v),
            _ => None,
        }
    }
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>> {
        match prop {
            Property::Double(v) => Some(v),
            _ => None,
        }
    }
    fn from_wire(chunk: &[u8]) -> Self {
        le_bytes!(chunk, f64)
    }
    fn write_wire(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl PropertyValue for Vec2 {
    const KIND: PropertyKind = PropertyKind::Vector2;

    fn make(values: Vec<Self>) -> Property {
        Property::Vector2(values)
    }
    fn values(prop: &Property) -> Option<&Vec<Self>> {
        match prop {
            Property::Vector2(v) => Some(v),
            _ => None,
        }
    }
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>> {
        match prop {
            Property::Vector2(v) => Some(v),
            _ => None,
        }
    }
    fn from_wire(chunk: &[u8]) -> Self {
        Vec2::new(f32::from_wire(&chunk[0..4]), f32::from_wire(&chunk[4..8]))
    }
    fn write_wire(self, out: &mut Vec<u8>) {
        for c in self.to_array() {
            c.write_wire(out);
        }
    }
}

impl PropertyValue for Vec3 {
    const KIND: PropertyKind = PropertyKind::Vector3;

    fn make(values: Vec<Self>) -> Property {
        Property::Vector3(values)
    }
    fn values(prop: &Property) -> Option<&Vec<Self>> {
        match prop {
            Property::Vector3(v) => Some(v),
            _ => None,
        }
    }
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>> {
        match prop {
            Property::Vector3(v) => Some(v),
            _ => None,
        }
    }
    fn from_wire(chunk: &[u8]) -> Self {
        Vec3::new(
            f32::from_wire(&chunk[0..4]),
            f32::from_wire(&chunk[4..8]),
            f32::from_wire(&chunk[8..12]),
        )
    }
    fn write_wire(self, out: &mut Vec<u8>) {
        for c in self.to_array() {
            c.write_wire(out);
        }
    }
}

impl PropertyValue for Vec4 {
    const KIND: PropertyKind = PropertyKind::Vector4;

    fn make(values: Vec<Self>) -> Property {
        Property::Vector4(values)
    }
    fn values(prop: &Property) -> Option<&Vec<Self>> {
        match prop {
            Property::Vector4(v) => Some(v),
            _ => None,
        }
    }
    fn values_mut(prop: &mut Property) -> Option<&mut Vec<Self>> {
        match prop {
            Property::Vector4(v) => Some(v),
            _ => None,
        }
    }
    fn from_wire(chunk: &[u8]) -> Self {
        Vec4::new(
            f32::from_wire(&chunk[0..4]),
            f32::from_wire(&chunk[4..8]),
            f32::from_wire(&chunk[8..12]),
            f32::from_wire(&chunk[12..16]),
        )
    }
    fn write_wire(self, out: &mut Vec<u8>) {
        for c in self.to_array() {
            c.write_wire(out);
        }
    }
}

/// Insertion-ordered property map with unique keys.
///
/// Iteration order is insertion order and is what the encoder writes;
/// overwriting a key keeps its original position. Lookups are a linear scan,
/// which is fine for the handful of short keys a node carries.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PropertyMap {
    entries: Vec<(String, Property)>,
}

impl PropertyMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Get a property by key.
    pub fn get(&self, key: &str) -> Option<&Property> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Get a mutable property by key.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Property> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert a property, overwriting in place if the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: Property) -> &mut Property {
        let key = key.into();
        match self.entries.iter().position(|(k, _)| *k == key) {
            Some(i) => {
                self.entries[i].1 = value;
                &mut self.entries[i].1
            }
            None => {
                self.entries.push((key, value));
                let i = self.entries.len() - 1;
                &mut self.entries[i].1
            }
        }
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Property)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_sizes() {
        assert_eq!(Property::string("linear").data_size(), 7);
        assert_eq!(Property::string("").data_size(), 1);
        assert_eq!(Property::array(vec![1u8, 2, 3]).data_size(), 3);
        assert_eq!(Property::array(vec![1u16, 2]).data_size(), 4);
        assert_eq!(Property::array(vec![1u64]).data_size(), 8);
        assert_eq!(Property::array(vec![Vec3::ZERO; 4]).data_size(), 48);
        assert_eq!(Property::array(vec![Vec4::ZERO]).data_size(), 16);
        assert_eq!(Property::empty::<f32>(16).data_size(), 0);
    }

    #[test]
    fn test_value_counts() {
        assert_eq!(Property::string("anything").value_count(), 1);
        assert_eq!(Property::array(vec![1u32, 2, 3]).value_count(), 3);
        assert_eq!(Property::empty::<Vec2>(8).value_count(), 0);
    }

    #[test]
    fn test_first_and_push() {
        let mut prop = Property::single(5u32);
        assert_eq!(prop.first::<u32>(), Some(5));
        assert_eq!(prop.first::<u16>(), None);

        assert!(prop.push(6u32));
        assert!(!prop.push(6u16));
        assert_eq!(prop.values::<u32>(), Some(&[5, 6][..]));

        assert!(prop.set_first(9u32));
        assert_eq!(prop.first::<u32>(), Some(9));
    }

    #[test]
    fn test_integer_widening() {
        let byte = Property::array(vec![7u8]);
        assert_eq!(byte.first_integer(8), Some(7));
        assert_eq!(byte.first_integer(64), Some(7));

        let wide = Property::array(vec![7u64]);
        assert_eq!(wide.first_integer(32), None);
        assert_eq!(wide.first_integer(64), Some(7));

        let float = Property::array(vec![7.0f32]);
        assert_eq!(float.first_integer(64), None);

        let shorts = Property::array(vec![1u16, 2, 3]);
        assert_eq!(shorts.widened_integers(32), Some(vec![1, 2, 3]));
        assert_eq!(shorts.widened_integers(8), None);
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let mut map = PropertyMap::new();
        map.insert("vp", Property::empty::<Vec3>(0));
        map.insert("vn", Property::empty::<Vec3>(0));
        map.insert("f", Property::empty::<u32>(0));

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, ["vp", "vn", "f"]);

        // Overwrite keeps the original position.
        map.insert("vn", Property::array(vec![Vec3::ONE]));
        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, ["vp", "vn", "f"]);
        assert_eq!(map.get("vn").unwrap().value_count(), 1);
    }

    #[test]
    fn test_map_unique_keys() {
        let mut map = PropertyMap::new();
        map.insert("n", Property::string("first"));
        map.insert("n", Property::string("second"));
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("n").unwrap().as_str(), Some("second"));
    }

    #[test]
    fn test_wire_round_trip() {
        let mut out = Vec::new();
        0x1234u16.write_wire(&mut out);
        assert_eq!(out, [0x34, 0x12]);
        assert_eq!(u16::from_wire(&out), 0x1234);

        let mut out = Vec::new();
        Vec3::new(1.0, 2.0, 3.0).write_wire(&mut out);
        assert_eq!(out.len(), 12);
        assert_eq!(Vec3::from_wire(&out), Vec3::new(1.0, 2.0, 3.0));
    }
}
