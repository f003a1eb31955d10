//! Cast format encoder.
//!
//! Serialization is two passes per subtree: a bottom-up size pass that
//! memoizes every node's total span (the value the reader validates
//! against), then a depth-first write of headers, properties in insertion
//! order and children in list order. Re-encoding an unmodified document is
//! byte-identical.

use crate::document::{CastDocument, NodeId};
use crate::format::{CAST_MAGIC, CAST_VERSION, FILE_HEADER_SIZE, NODE_HEADER_SIZE, PROPERTY_HEADER_SIZE};
use crate::property::{Property, PropertyValue};
use crate::util::{Error, Result};

/// Encode a whole document.
pub fn encode(doc: &CastDocument) -> Result<Vec<u8>> {
    encode_roots(doc, doc.roots())
}

/// Encode a single node (and its subtree) as a one-root document.
pub fn encode_node(doc: &CastDocument, id: NodeId) -> Result<Vec<u8>> {
    encode_roots(doc, &[id])
}

/// Encode the given nodes as the document's roots, in order.
pub fn encode_roots(doc: &CastDocument, roots: &[NodeId]) -> Result<Vec<u8>> {
    if roots.len() > i32::MAX as usize {
        return Err(Error::invalid("too many root nodes"));
    }

    let mut sizes = vec![0u32; doc.node_count()];
    let mut total = FILE_HEADER_SIZE as u64;
    for &root in roots {
        total += compute_size(doc, root, &mut sizes)? as u64;
    }

    let mut out = Vec::with_capacity(total as usize);
    out.extend_from_slice(&CAST_MAGIC.to_le_bytes());
    out.extend_from_slice(&CAST_VERSION.to_le_bytes());
    out.extend_from_slice(&(roots.len() as u32).to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes());
    for &root in roots {
        write_node(doc, root, &sizes, &mut out);
    }
    Ok(out)
}

/// Bottom-up serialized-size computation, memoized per arena slot.
fn compute_size(doc: &CastDocument, id: NodeId, sizes: &mut [u32]) -> Result<u32> {
    let node = doc.node(id);
    let mut size = NODE_HEADER_SIZE as u64;

    if node.properties().len() > i32::MAX as usize {
        return Err(Error::invalid("too many properties on one node"));
    }
    for (key, prop) in node.properties().iter() {
        if key.len() > u16::MAX as usize {
            return Err(Error::invalid(format!(
                "property key exceeds 65535 bytes: {} bytes",
                key.len()
            )));
        }
        if prop.value_count() > i32::MAX as usize {
            return Err(Error::invalid(format!(
                "property '{key}' exceeds the 32-bit value count"
            )));
        }
        size += (PROPERTY_HEADER_SIZE + key.len() + prop.data_size()) as u64;
    }

    let children = doc.children_of(id);
    if children.len() > i32::MAX as usize {
        return Err(Error::invalid("too many children on one node"));
    }
    for &child in children {
        size += compute_size(doc, child, sizes)? as u64;
    }

    let size = u32::try_from(size)
        .map_err(|_| Error::invalid("node exceeds the 32-bit size field"))?;
    sizes[id.index()] = size;
    Ok(size)
}

/// Depth-first write using the memoized sizes. Infallible once the size
/// pass has validated the tree.
fn write_node(doc: &CastDocument, id: NodeId, sizes: &[u32], out: &mut Vec<u8>) {
    let node = doc.node(id);
    let children = doc.children_of(id);

    out.extend_from_slice(&node.identifier().to_le_bytes());
    out.extend_from_slice(&sizes[id.index()].to_le_bytes());
    out.extend_from_slice(&node.hash().to_le_bytes());
    out.extend_from_slice(&(node.properties().len() as u32).to_le_bytes());
    out.extend_from_slice(&(children.len() as u32).to_le_bytes());

    for (key, prop) in node.properties().iter() {
        out.extend_from_slice(&prop.kind().id().to_le_bytes());
        out.extend_from_slice(&(key.len() as u16).to_le_bytes());
        out.extend_from_slice(&(prop.value_count() as u32).to_le_bytes());
        out.extend_from_slice(key.as_bytes());
        write_payload(prop, out);
    }
    for &child in children {
        write_node(doc, child, sizes, out);
    }
}

fn write_payload(prop: &Property, out: &mut Vec<u8>) {
    match prop {
        Property::String(s) => {
            out.extend_from_slice(s.as_bytes());
            out.push(0);
        }
        Property::Byte(v) => out.extend_from_slice(v),
        Property::Short(v) => encode_array(v, out),
        Property::Integer32(v) => encode_array(v, out),
        Property::Integer64(v) => encode_array(v, out),
        Property::Float(v) => encode_array(v, out),
        Property::Double(v) => encode_array(v, out),
        Property::Vector2(v) => encode_array(v, out),
        Property::Vector3(v) => encode_array(v, out),
        Property::Vector4(v) => encode_array(v, out),
    }
}

/// Append a packed little-endian array. On little-endian hosts this is a
/// straight bulk copy of the value storage.
fn encode_array<T: PropertyValue>(values: &[T], out: &mut Vec<u8>) {
    if cfg!(target_endian = "little") {
        out.extend_from_slice(bytemuck::cast_slice(values));
    } else {
        for &value in values {
            value.write_wire(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NodeKind;
    use glam::Vec3;

    #[test]
    fn test_empty_document_is_bare_header() {
        let doc = CastDocument::new();
        let bytes = encode(&doc).unwrap();
        assert_eq!(
            bytes,
            [
                0x63, 0x61, 0x73, 0x74, // "cast"
                0x01, 0x00, 0x00, 0x00, // version 1
                0x00, 0x00, 0x00, 0x00, // no roots
                0x00, 0x00, 0x00, 0x00, // reserved
            ]
        );
    }

    #[test]
    fn test_bare_node_is_header_only() {
        let mut doc = CastDocument::new();
        let root = doc.create_root(NodeKind::Root);
        let bytes = encode(&doc).unwrap();
        assert_eq!(bytes.len(), FILE_HEADER_SIZE + NODE_HEADER_SIZE);
        // size field covers the node's own header
        assert_eq!(&bytes[20..24], &24u32.to_le_bytes());
        let _ = root;
    }

    #[test]
    fn test_size_invariant() {
        let mut doc = CastDocument::new();
        let root = doc.create_root(NodeKind::Root);
        let model = doc.create_child(root, NodeKind::Model);
        doc.node_mut(model).set_string("n", "gun"); // 8 + 1 + 4
        doc.node_mut(model)
            .set_array("vp", vec![Vec3::ZERO, Vec3::ONE]); // 8 + 2 + 24

        let mut sizes = vec![0u32; doc.node_count()];
        let size = compute_size(&doc, root, &mut sizes).unwrap();
        let model_size = 24 + (8 + 1 + 4) + (8 + 2 + 24);
        assert_eq!(sizes[model.index()], model_size);
        assert_eq!(size, 24 + model_size);

        let bytes = encode(&doc).unwrap();
        assert_eq!(bytes.len(), FILE_HEADER_SIZE + size as usize);
    }

    #[test]
    fn test_oversized_key_rejected() {
        let mut doc = CastDocument::new();
        let root = doc.create_root(NodeKind::Root);
        let key = "k".repeat(70_000);
        doc.node_mut(root).set_value(key, 1u32);
        assert!(matches!(encode(&doc), Err(Error::InvalidStructure(_))));
    }

    #[test]
    fn test_deterministic_output() {
        let mut doc = CastDocument::new();
        let root = doc.create_root(NodeKind::Root);
        doc.node_mut(root).set_string("a", "1");
        doc.node_mut(root).set_value("b", 2u32);
        doc.node_mut(root).set_array("c", vec![3.0f32]);

        let first = encode(&doc).unwrap();
        let second = encode(&doc).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_node_synthesizes_single_root() {
        let mut doc = CastDocument::new();
        let a = doc.create_root(NodeKind::Root);
        let b = doc.create_root(NodeKind::Root);
        doc.node_mut(b).set_hash(9);

        let bytes = encode_node(&doc, b).unwrap();
        // root count is 1 even though the document has two roots
        assert_eq!(&bytes[8..12], &1u32.to_le_bytes());
        let reloaded = CastDocument::from_bytes(&bytes).unwrap();
        assert_eq!(reloaded.roots().len(), 1);
        assert_eq!(reloaded.get(reloaded.roots()[0]).hash(), 9);
        let _ = a;
    }
}
