//! Compact checksum-identifier decoding.
//!
//! Index stanzas carry the manifest container's digest as a short string: a
//! two-character scheme prefix (`Q1` for SHA1, `Q2` for SHA256) followed by a
//! base64-alphabet payload. The packing is not general base64: each group of
//! four characters emits three bytes except the last, which emits two,
//! because the digest sizes (20 and 32) are one byte short of a multiple of
//! three. A `=` pad is permitted only as the final payload character.

use alpk_schema::Checksum;

/// Decode a checksum identifier, or `None` if it is malformed in any way
/// (wrong length, unknown scheme, character outside the alphabet, misplaced
/// pad). Malformed identifiers are not errors: the record simply keeps no
/// header checksum.
pub fn decode_checksum_id(id: &str) -> Option<Checksum> {
    let (scheme, payload) = id.as_bytes().split_at_checked(2)?;
    let pad_pos = if scheme == b"Q1" && payload.len() == 28 {
        27
    } else if scheme == b"Q2" && payload.len() == 44 {
        43
    } else {
        return None;
    };

    let mut out = Vec::with_capacity(payload.len() / 4 * 3);
    let mut acc: u32 = 0;
    for (i, &c) in payload.iter().enumerate() {
        let v = match c {
            b'A'..=b'Z' => u32::from(c - b'A'),
            b'a'..=b'z' => u32::from(c - b'a') + 26,
            b'0'..=b'9' => u32::from(c - b'0') + 52,
            b'+' => 62,
            b'/' => 63,
            b'=' if i == pad_pos => 0,
            _ => return None,
        };
        acc = (acc << 6) | v;
        if i % 4 == 3 {
            out.push((acc >> 16) as u8);
            out.push((acc >> 8) as u8);
            // The group ending at the pad offset is the short one.
            if i != pad_pos {
                out.push(acc as u8);
            }
            acc = 0;
        }
    }

    Checksum::from_bytes(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alpk_schema::ChecksumKind;
    use base64::Engine as _;
    use base64::engine::general_purpose::STANDARD;

    // The wire format is "Q1" (or "Q2") + standard base64 of the digest; 20-
    // and 32-byte digests base64-encode to 28 and 44 characters with one
    // trailing pad each, which is exactly the shape the decoder accepts.
    fn ident(scheme: &str, digest: &[u8]) -> String {
        format!("{scheme}{}", STANDARD.encode(digest))
    }

    #[test]
    fn q1_decodes_to_sha1_bytes() {
        let digest: Vec<u8> = (0..20).collect();
        let id = ident("Q1", &digest);
        assert_eq!(id.len(), 30);

        let sum = decode_checksum_id(&id).expect("valid identifier");
        assert_eq!(sum.kind(), ChecksumKind::Sha1);
        assert_eq!(sum.bytes(), digest.as_slice());
    }

    #[test]
    fn q2_decodes_to_sha256_bytes() {
        let digest: Vec<u8> = (0..32).map(|i| i * 7).collect();
        let id = ident("Q2", &digest);
        assert_eq!(id.len(), 46);

        let sum = decode_checksum_id(&id).expect("valid identifier");
        assert_eq!(sum.kind(), ChecksumKind::Sha256);
        assert_eq!(sum.bytes(), digest.as_slice());
    }

    #[test]
    fn wrong_length_is_rejected() {
        assert!(decode_checksum_id("Q1").is_none());
        assert!(decode_checksum_id("").is_none());
        // SHA1-shaped payload under the SHA256 scheme and vice versa.
        assert!(decode_checksum_id(&ident("Q2", &[0u8; 20])).is_none());
        assert!(decode_checksum_id(&ident("Q1", &[0u8; 32])).is_none());
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let digest = [0u8; 20];
        let id = ident("Q3", &digest);
        assert!(decode_checksum_id(&id).is_none());
        let id = ident("X1", &digest);
        assert!(decode_checksum_id(&id).is_none());
    }

    #[test]
    fn invalid_character_is_rejected() {
        let mut id = ident("Q1", &[0u8; 20]);
        id.replace_range(10..11, "*");
        assert!(decode_checksum_id(&id).is_none());
    }

    #[test]
    fn misplaced_pad_is_rejected() {
        let mut id = ident("Q1", &[0u8; 20]);
        id.replace_range(10..11, "=");
        assert!(decode_checksum_id(&id).is_none());
    }

    #[test]
    fn pad_is_optional_at_the_final_offset() {
        // A non-pad character at the final offset decodes too; its low bits
        // fall into the byte the short group never emits.
        let digest: Vec<u8> = (100..120).collect();
        let id = ident("Q1", &digest).replace('=', "A");
        let sum = decode_checksum_id(&id).expect("valid identifier");
        assert_eq!(sum.bytes(), digest.as_slice());
    }
}
