//! Encoding utilities for variable-length integers and length-prefixed
//! byte strings.

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Maximum bytes needed to encode a varint64.
pub const MAX_VARINT64_LEN: usize = 10;

/// Encode a 64-bit unsigned integer as a base-128 little-endian varint.
///
/// Returns the number of bytes written.
pub fn encode_varint64(buf: &mut BytesMut, mut value: u64) -> usize {
    let mut count = 0;
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
        count += 1;
    }
    buf.put_u8(value as u8);
    count + 1
}

/// Decode a 64-bit varint from a buffer.
///
/// Returns None if the buffer is too short or the varint overflows.
pub fn decode_varint64(buf: &mut &[u8]) -> Option<u64> {
    let mut result = 0u64;
    let mut shift = 0;

    for _ in 0..MAX_VARINT64_LEN {
        if buf.is_empty() {
            return None;
        }

        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as u64) << shift;

        if byte & 0x80 == 0 {
            return Some(result);
        }

        shift += 7;
    }

    None // Varint too long
}

/// Get the number of bytes needed to encode a varint.
pub fn varint_length(value: u64) -> usize {
    let mut len = 1;
    let mut v = value;
    while v >= 0x80 {
        v >>= 7;
        len += 1;
    }
    len
}

/// Encode a length-prefixed byte slice.
pub fn encode_length_prefixed(buf: &mut BytesMut, data: &[u8]) {
    encode_varint64(buf, data.len() as u64);
    buf.put_slice(data);
}

/// Decode a length-prefixed byte slice.
pub fn decode_length_prefixed(buf: &mut &[u8]) -> Option<Bytes> {
    let len = decode_varint64(buf)? as usize;
    if buf.len() < len {
        return None;
    }
    let data = Bytes::copy_from_slice(&buf[..len]);
    buf.advance(len);
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint64_roundtrip() {
        let test_values = [
            0u64,
            1,
            127,
            128,
            255,
            256,
            16383,
            16384,
            (1 << 21) - 1,
            1 << 21,
            (1 << 35) - 1,
            1 << 35,
            u64::MAX >> 1,
            u64::MAX,
        ];

        for &val in &test_values {
            let mut buf = BytesMut::new();
            encode_varint64(&mut buf, val);

            let mut slice: &[u8] = &buf;
            let decoded = decode_varint64(&mut slice).unwrap();

            assert_eq!(val, decoded, "Failed for value {}", val);
            assert!(slice.is_empty(), "Buffer not fully consumed");
        }
    }

    #[test]
    fn test_varint_length() {
        assert_eq!(varint_length(0), 1);
        assert_eq!(varint_length(127), 1);
        assert_eq!(varint_length(128), 2);
        assert_eq!(varint_length(16383), 2);
        assert_eq!(varint_length(16384), 3);
    }

    #[test]
    fn test_length_prefixed() {
        let data = b"hello world";

        let mut buf = BytesMut::new();
        encode_length_prefixed(&mut buf, data);

        let mut slice: &[u8] = &buf;
        let decoded = decode_length_prefixed(&mut slice).unwrap();

        assert_eq!(&decoded[..], data);
        assert!(slice.is_empty());
    }

    #[test]
    fn test_decode_truncated() {
        let mut empty: &[u8] = &[];
        assert!(decode_varint64(&mut empty).is_none());

        let short: &[u8] = &[0x80, 0x80]; // Incomplete varint
        let mut slice = short;
        assert!(decode_varint64(&mut slice).is_none());

        // Length prefix promising more bytes than remain.
        let truncated: &[u8] = &[5, b'a', b'b'];
        let mut slice = truncated;
        assert!(decode_length_prefixed(&mut slice).is_none());
    }
}
