//! Minimal BER/ASN.1 TLV encoding for the handful of SNMPv2c trap fields we
//! emit: INTEGER, OCTET STRING, OBJECT IDENTIFIER, TimeTicks, and SEQUENCE.
//!
//! No general-purpose ASN.1 crate in the corpus covers SNMP traps, so this
//! mirrors the workspace's existing precedent of hand-rolling small wire
//! formats (see `opspulse_core::line_protocol`) rather than pulling in a
//! large ASN.1 toolkit for four tag types.

pub const TAG_INTEGER: u8 = 0x02;
pub const TAG_OCTET_STRING: u8 = 0x04;
pub const TAG_OID: u8 = 0x06;
pub const TAG_SEQUENCE: u8 = 0x30;
pub const TAG_TIMETICKS: u8 = 0x43; // application-class tag 2, primitive

fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let significant: Vec<u8> = bytes.iter().copied().skip_while(|b| *b == 0).collect();
    out.push(0x80 | significant.len() as u8);
    out.extend_from_slice(&significant);
}

pub fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(content.len() + 4);
    out.push(tag);
    encode_length(content.len(), &mut out);
    out.extend_from_slice(content);
    out
}

pub fn integer(value: i64) -> Vec<u8> {
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 && bytes[0] == 0x00 && bytes[1] & 0x80 == 0 {
        bytes.remove(0);
    }
    while bytes.len() > 1 && bytes[0] == 0xff && bytes[1] & 0x80 != 0 {
        bytes.remove(0);
    }
    tlv(TAG_INTEGER, &bytes)
}

pub fn timeticks(value: u32) -> Vec<u8> {
    tlv(TAG_TIMETICKS, &value.to_be_bytes())
}

pub fn octet_string(bytes: &[u8]) -> Vec<u8> {
    tlv(TAG_OCTET_STRING, bytes)
}

/// Encode a dotted OID such as `[1, 3, 6, 1, 2, 1, 1, 3, 0]`.
///
/// # Panics
/// Panics if `components` has fewer than two elements; every valid OID has
/// at least a root arc and a sub-arc.
pub fn oid(components: &[u32]) -> Vec<u8> {
    assert!(components.len() >= 2, "OID must have at least two components");
    let mut content = vec![(components[0] * 40 + components[1]) as u8];
    for &component in &components[2..] {
        content.extend(encode_base128(component));
    }
    tlv(TAG_OID, &content)
}

fn encode_base128(mut value: u32) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }
    let mut groups = Vec::new();
    while value > 0 {
        groups.push((value & 0x7f) as u8);
        value >>= 7;
    }
    groups.reverse();
    let last = groups.len() - 1;
    for (i, group) in groups.iter_mut().enumerate() {
        if i != last {
            *group |= 0x80;
        }
    }
    groups
}

pub fn sequence(tag: u8, parts: &[Vec<u8>]) -> Vec<u8> {
    let content: Vec<u8> = parts.iter().flat_map(|p| p.iter().copied()).collect();
    tlv(tag, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_integer_roundtrips_shape() {
        assert_eq!(integer(0), vec![0x02, 0x01, 0x00]);
        assert_eq!(integer(127), vec![0x02, 0x01, 0x7f]);
    }

    #[test]
    fn negative_integer_keeps_sign_byte() {
        assert_eq!(integer(-1), vec![0x02, 0x01, 0xff]);
    }

    #[test]
    fn oid_encodes_sys_up_time() {
        // 1.3.6.1.2.1.1.3.0
        let encoded = oid(&[1, 3, 6, 1, 2, 1, 1, 3, 0]);
        assert_eq!(encoded, vec![0x06, 0x08, 0x2b, 0x06, 0x01, 0x02, 0x01, 0x01, 0x03, 0x00]);
    }

    #[test]
    fn long_length_uses_multibyte_form() {
        let content = vec![0u8; 200];
        let encoded = tlv(TAG_OCTET_STRING, &content);
        assert_eq!(encoded[0], TAG_OCTET_STRING);
        assert_eq!(encoded[1], 0x81); // one length-of-length byte follows
        assert_eq!(encoded[2], 200);
    }

    #[test]
    fn sequence_concatenates_parts() {
        let a = integer(1);
        let b = integer(2);
        let seq = sequence(TAG_SEQUENCE, &[a.clone(), b.clone()]);
        assert_eq!(seq[0], TAG_SEQUENCE);
        assert_eq!(&seq[2..], [a, b].concat().as_slice());
    }
}
