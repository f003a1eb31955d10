//! Cast format decoder.
//!
//! Parses a complete byte stream into a [`CastDocument`]. Every node header
//! carries the total serialized span of that node; after parsing a node's
//! properties and children the cursor must sit exactly `node_size` bytes
//! past the node's start, otherwise the stream is corrupt. Any failure
//! aborts the parse; no partial document escapes.

use byteorder::{ByteOrder, LittleEndian};
use glam::{Vec2, Vec3, Vec4};

use crate::document::{CastDocument, NodeId};
use crate::format::{NodeKind, PropertyKind, CAST_MAGIC, CAST_VERSION};
use crate::node::CastNode;
use crate::property::{Property, PropertyValue};
use crate::util::{Error, Result};

/// Decode a document from a byte slice.
pub fn decode(bytes: &[u8]) -> Result<CastDocument> {
    let mut cur = Cursor::new(bytes);

    let magic = cur.read_u32()?;
    if magic != CAST_MAGIC {
        return Err(Error::BadMagic);
    }
    let version = cur.read_u32()?;
    if version > CAST_VERSION {
        return Err(Error::UnsupportedVersion(version));
    }
    let root_count = cur.read_i32()?;
    if root_count < 0 {
        return Err(Error::invalid(format!("negative root count: {root_count}")));
    }
    let _reserved = cur.read_u32()?;

    let mut doc = CastDocument::new();
    for _ in 0..root_count {
        parse_node(&mut cur, &mut doc, None)?;
    }
    Ok(doc)
}

/// Bounds-checked cursor over the input slice.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    fn pos(&self) -> usize {
        self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self.pos.saturating_add(len);
        if end > self.buf.len() {
            return Err(Error::UnexpectedEof(end as u64));
        }
        let slice = &self.buf[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Consume bytes up to and including the next NUL; returns the bytes
    /// before it.
    fn take_until_nul(&mut self) -> Result<&'a [u8]> {
        let rest = &self.buf[self.pos..];
        match rest.iter().position(|&b| b == 0) {
            Some(nul) => {
                let slice = &rest[..nul];
                self.pos += nul + 1;
                Ok(slice)
            }
            None => Err(Error::UnexpectedEof(self.buf.len() as u64)),
        }
    }

    fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }
}

fn parse_node(cur: &mut Cursor<'_>, doc: &mut CastDocument, parent: Option<NodeId>) -> Result<NodeId> {
    let start = cur.pos();

    let identifier = cur.read_u32()?;
    let node_size = cur.read_u32()?;
    let hash = cur.read_u64()?;
    let property_count = cur.read_i32()?;
    let child_count = cur.read_i32()?;
    if property_count < 0 || child_count < 0 {
        return Err(Error::invalid(format!(
            "negative counts in node header: {property_count} properties, {child_count} children"
        )));
    }

    let node = CastNode::with_hash(NodeKind::from_id(identifier), hash);
    let id = match parent {
        Some(p) => doc.add_child(p, node),
        None => doc.add_root(node),
    };

    for _ in 0..property_count {
        let (key, prop) = parse_property(cur)?;
        // Duplicate keys on the wire keep only the last payload.
        doc.node_mut(id).properties_mut().insert(key, prop);
    }
    for _ in 0..child_count {
        parse_node(cur, doc, Some(id))?;
    }

    let consumed = cur.pos() - start;
    if consumed != node_size as usize {
        return Err(Error::SizeMismatch {
            expected: node_size as u64,
            actual: consumed as u64,
        });
    }
    Ok(id)
}

fn parse_property(cur: &mut Cursor<'_>) -> Result<(String, Property)> {
    let raw_kind = cur.read_u16()?;
    let kind = PropertyKind::from_id(raw_kind).ok_or(Error::UnknownPropertyKind(raw_kind))?;
    let key_length = cur.read_u16()? as usize;
    let value_count = cur.read_i32()?;
    if value_count < 0 {
        return Err(Error::invalid(format!("negative property count: {value_count}")));
    }
    let key = String::from_utf8(cur.take(key_length)?.to_vec())?;

    let prop = match kind {
        PropertyKind::String => {
            let bytes = cur.take_until_nul()?;
            Property::String(String::from_utf8(bytes.to_vec())?)
        }
        array_kind => {
            let count = value_count as usize;
            let payload_len = count
                .checked_mul(array_kind.element_size())
                .ok_or_else(|| Error::invalid("property payload overflows"))?;
            let bytes = cur.take(payload_len)?;
            decode_payload(array_kind, bytes)
        }
    };
    Ok((key, prop))
}

fn decode_payload(kind: PropertyKind, bytes: &[u8]) -> Property {
    match kind {
        PropertyKind::Byte => Property::Byte(bytes.to_vec()),
        PropertyKind::Short => Property::Short(decode_array::<u16>(bytes)),
        PropertyKind::Integer32 => Property::Integer32(decode_array::<u32>(bytes)),
        PropertyKind::Integer64 => Property::Integer64(decode_array::<u64>(bytes)),
        PropertyKind::Float => Property::Float(decode_array::<f32>(bytes)),
        PropertyKind::Double => Property::Double(decode_array::<f64>(bytes)),
        PropertyKind::Vector2 => Property::Vector2(decode_array::<Vec2>(bytes)),
        PropertyKind::Vector3 => Property::Vector3(decode_array::<Vec3>(bytes)),
        PropertyKind::Vector4 => Property::Vector4(decode_array::<Vec4>(bytes)),
        // Handled by the caller; strings are terminator-delimited.
        PropertyKind::String => Property::String(String::new()),
    }
}

/// Decode a packed little-endian array. On little-endian hosts an aligned
/// input is a straight bulk copy; otherwise elements convert one by one.
fn decode_array<T: PropertyValue>(bytes: &[u8]) -> Vec<T> {
    if cfg!(target_endian = "little") {
        if let Ok(values) = bytemuck::try_cast_slice::<u8, T>(bytes) {
            return values.to_vec();
        }
    }
    bytes
        .chunks_exact(T::KIND.element_size())
        .map(T::from_wire)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::FILE_HEADER_SIZE;

    fn header(root_count: i32) -> Vec<u8> {
        let mut out = Vec::with_capacity(FILE_HEADER_SIZE);
        out.extend_from_slice(&CAST_MAGIC.to_le_bytes());
        out.extend_from_slice(&CAST_VERSION.to_le_bytes());
        out.extend_from_slice(&root_count.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out
    }

    fn node_header(id: u32, size: u32, hash: u64, nprop: i32, nchild: i32) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&id.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&hash.to_le_bytes());
        out.extend_from_slice(&nprop.to_le_bytes());
        out.extend_from_slice(&nchild.to_le_bytes());
        out
    }

    #[test]
    fn test_empty_document() {
        let doc = decode(&header(0)).unwrap();
        assert_eq!(doc.roots().len(), 0);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = header(0);
        bytes[0] = b'x';
        assert!(matches!(decode(&bytes), Err(Error::BadMagic)));
    }

    #[test]
    fn test_unsupported_version() {
        let mut bytes = header(0);
        bytes[4] = 2;
        assert!(matches!(decode(&bytes), Err(Error::UnsupportedVersion(2))));
    }

    #[test]
    fn test_truncated_header() {
        let bytes = header(0);
        assert!(matches!(
            decode(&bytes[..10]),
            Err(Error::UnexpectedEof(_))
        ));
    }

    #[test]
    fn test_negative_root_count() {
        let bytes = header(-1);
        assert!(matches!(decode(&bytes), Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_single_node() {
        let mut bytes = header(1);
        bytes.extend_from_slice(&node_header(NodeKind::Root.id(), 24, 7, 0, 0));

        let doc = decode(&bytes).unwrap();
        assert_eq!(doc.roots().len(), 1);
        let root = doc.get(doc.roots()[0]);
        assert_eq!(root.kind(), NodeKind::Root);
        assert_eq!(root.hash(), 7);
        assert_eq!(root.child_count(), 0);
    }

    #[test]
    fn test_node_with_string_property() {
        // prop: 's', keylen 1, count 1, "n", "ok\0" => 8 + 1 + 3 = 12 bytes
        let mut bytes = header(1);
        bytes.extend_from_slice(&node_header(NodeKind::Bone.id(), 24 + 12, 0, 1, 0));
        bytes.extend_from_slice(&0x73u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(b'n');
        bytes.extend_from_slice(b"ok\0");

        let doc = decode(&bytes).unwrap();
        let bone = doc.get(doc.roots()[0]);
        assert_eq!(bone.string("n").unwrap(), "ok");
    }

    #[test]
    fn test_unknown_property_kind() {
        let mut bytes = header(1);
        bytes.extend_from_slice(&node_header(NodeKind::Bone.id(), 24 + 12, 0, 1, 0));
        bytes.extend_from_slice(&0x7635u16.to_le_bytes()); // "v5"
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(b'x');
        bytes.extend_from_slice(&[0, 0, 0]);

        assert!(matches!(
            decode(&bytes),
            Err(Error::UnknownPropertyKind(0x7635))
        ));
    }

    #[test]
    fn test_size_mismatch() {
        // Header claims 32 bytes but the node only spans 24.
        let mut bytes = header(1);
        bytes.extend_from_slice(&node_header(NodeKind::Root.id(), 32, 0, 0, 0));
        bytes.extend_from_slice(&[0u8; 8]); // trailing garbage the node does not cover

        let err = decode(&bytes).unwrap_err();
        assert!(matches!(
            err,
            Error::SizeMismatch {
                expected: 32,
                actual: 24
            }
        ));
    }

    #[test]
    fn test_string_missing_terminator() {
        let mut bytes = header(1);
        bytes.extend_from_slice(&node_header(NodeKind::Bone.id(), 24 + 11, 0, 1, 0));
        bytes.extend_from_slice(&0x73u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.push(b'n');
        bytes.extend_from_slice(b"ok"); // no NUL

        assert!(matches!(decode(&bytes), Err(Error::UnexpectedEof(_))));
    }

    #[test]
    fn test_duplicate_keys_keep_last() {
        // Two u32 single-value properties under the same key "p".
        let prop_size = 8 + 1 + 4;
        let mut bytes = header(1);
        bytes.extend_from_slice(&node_header(
            NodeKind::Bone.id(),
            (24 + 2 * prop_size) as u32,
            0,
            2,
            0,
        ));
        for value in [1u32, 2u32] {
            bytes.extend_from_slice(&0x69u16.to_le_bytes());
            bytes.extend_from_slice(&1u16.to_le_bytes());
            bytes.extend_from_slice(&1i32.to_le_bytes());
            bytes.push(b'p');
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        let doc = decode(&bytes).unwrap();
        let bone = doc.get(doc.roots()[0]);
        assert_eq!(bone.node().properties().len(), 1);
        assert_eq!(bone.first::<u32>("p").unwrap(), 2);
    }

    #[test]
    fn test_nested_children() {
        let inner = node_header(NodeKind::Skeleton.id(), 24, 0, 0, 0);
        let outer = node_header(NodeKind::Model.id(), 48, 0, 0, 1);
        let mut bytes = header(1);
        bytes.extend_from_slice(&outer);
        bytes.extend_from_slice(&inner);

        let doc = decode(&bytes).unwrap();
        let model = doc.get(doc.roots()[0]);
        assert_eq!(model.kind(), NodeKind::Model);
        let skel = model.first_child().unwrap();
        assert_eq!(skel.kind(), NodeKind::Skeleton);
        assert_eq!(skel.parent().unwrap().id(), model.id());
    }
}
