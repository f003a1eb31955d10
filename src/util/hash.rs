//! 64-bit FNV-1a - the name hash used throughout Cast files.
//!
//! Node hashes are derived from names (bone names, material names, file
//! paths) with this function, and cross-node references store the resulting
//! 64-bit value. The hash is stable by definition; a hash of zero is reserved
//! to mean "unset".

/// FNV-1a 64-bit offset basis.
const FNV_OFFSET: u64 = 0xCBF2_9CE4_8422_2325;

/// FNV-1a 64-bit prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

/// Compute the 64-bit FNV-1a hash of a string's UTF-8 bytes.
#[inline]
pub fn fnv1a(text: &str) -> u64 {
    fnv1a_bytes(text.as_bytes())
}

/// Compute the 64-bit FNV-1a hash of raw bytes.
#[inline]
pub fn fnv1a_bytes(data: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &byte in data {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_offset_basis() {
        assert_eq!(fnv1a(""), 0xCBF2_9CE4_8422_2325);
    }

    #[test]
    fn test_known_vectors() {
        assert_eq!(fnv1a("a"), 0xAF63_DC4C_8601_EC8C);
        assert_eq!(fnv1a("bone_0"), 0x2563_7676_323F_A920);
        assert_eq!(fnv1a("root"), 0xA354_FD1F_F0C4_67C5);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(fnv1a("default_material"), fnv1a("default_material"));
        assert_ne!(fnv1a("target_a"), fnv1a("target_b"));
    }

    #[test]
    fn test_bytes_matches_str() {
        assert_eq!(fnv1a("pelvis"), fnv1a_bytes(b"pelvis"));
    }
}
