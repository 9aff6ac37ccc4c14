// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025-2026 natyamatsya contributors
//
// Portable object-name adaptation for named events and shared memory
// regions. POSIX requires a leading '/' and enforces a per-OS length
// limit; over-long names are shortened deterministically with an
// FNV-1a hash suffix so unrelated processes derive the same OS name.

/// FNV-1a 64-bit hash.
pub fn fnv1a_64(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for &b in data {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

/// Convert a 64-bit value to a fixed-width 16-char lowercase hex string.
fn to_hex(val: u64) -> [u8; 16] {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut buf = [0u8; 16];
    let mut v = val;
    for i in (0..16).rev() {
        buf[i] = DIGITS[(v & 0xf) as usize];
        v >>= 4;
    }
    buf
}

/// Maximum length for POSIX object names. Set to 0 to disable truncation.
///
/// On macOS both `PSHMNAMLEN` and `PSEMNAMLEN` are 31, and the limit
/// counts the leading '/'. On Linux the practical limit is 255 (NAME_MAX),
/// long enough that truncation is never needed for sane callers.
#[cfg(target_os = "macos")]
pub const OBJ_NAME_MAX: usize = 31;

#[cfg(not(target_os = "macos"))]
pub const OBJ_NAME_MAX: usize = 0; // 0 = no truncation

/// Produce a POSIX-safe object name (with leading '/').
///
/// When `OBJ_NAME_MAX > 0`, names whose POSIX form (including the leading
/// '/') would exceed that limit are shortened to:
///     `/<prefix>_<16-hex-FNV-1a-hash>`
/// where `<prefix>` is a truncated portion of the original name for
/// debuggability. The shortening is a pure function of the input, so every
/// process arrives at the same OS-level name for the same caller name.
pub fn make_object_name(name: &str) -> String {
    let result = if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{name}")
    };

    if OBJ_NAME_MAX == 0 {
        return result;
    }

    if result.len() <= OBJ_NAME_MAX {
        return result;
    }

    // 1 (underscore) + 16 (hex hash)
    const HASH_SUFFIX_LEN: usize = 1 + 16;
    let prefix_len = if OBJ_NAME_MAX > HASH_SUFFIX_LEN + 1 {
        OBJ_NAME_MAX - HASH_SUFFIX_LEN - 1 // -1 for leading '/'
    } else {
        0
    };

    let hash = fnv1a_64(result.as_bytes());
    let hex = to_hex(hash);
    let hex_str = std::str::from_utf8(&hex).unwrap();

    let mut shortened = String::with_capacity(OBJ_NAME_MAX);
    shortened.push('/');
    if prefix_len > 0 {
        // Skip the leading '/' of the original, take prefix_len bytes
        let original_body = &result[1..];
        let take = prefix_len.min(original_body.len());
        shortened.push_str(&original_body[..take]);
    }
    shortened.push('_');
    shortened.push_str(hex_str);
    shortened
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_known_value() {
        // FNV-1a of empty string
        assert_eq!(fnv1a_64(b""), 0xcbf29ce484222325);
    }

    #[test]
    fn make_object_name_prepends_slash() {
        let name = make_object_name("evt1");
        assert!(name.starts_with('/'));
        assert!(name.contains("evt1"));
    }

    #[test]
    fn make_object_name_keeps_existing_slash() {
        let name = make_object_name("/shm1");
        assert_eq!(&name[..5], "/shm1");
    }

    #[test]
    fn make_object_name_is_deterministic() {
        let long = "a".repeat(128);
        assert_eq!(make_object_name(&long), make_object_name(&long));
    }

    #[test]
    fn make_object_name_respects_limit() {
        if OBJ_NAME_MAX > 0 {
            let long = "region".repeat(32);
            assert!(make_object_name(&long).len() <= OBJ_NAME_MAX);
        }
    }

    #[test]
    fn to_hex_roundtrip() {
        let hex = to_hex(0x0123456789abcdef);
        assert_eq!(&hex, b"0123456789abcdef");
    }
}
