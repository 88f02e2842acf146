const INITIAL_KEY: u8 = 0xAB;

/// How a frame travels on the wire. Stream frames (TCP) carry a 4 byte
/// header in front of the ciphertext, datagrams (UDP) carry none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Stream,
    Datagram,
}

impl Framing {
    pub const fn header_len(self) -> usize {
        match self {
            Framing::Stream => 4,
            Framing::Datagram => 0,
        }
    }
}

/// Autokey XOR: every produced byte becomes the key for the next one.
pub fn encode(payload: &[u8], framing: Framing) -> Vec<u8> {
    if payload.is_empty() {
        return vec![];
    }

    let mut frame = vec![0; framing.header_len()];
    frame.reserve(payload.len());

    let mut key = INITIAL_KEY;
    for byte in payload {
        key ^= byte;
        frame.push(key);
    }

    frame
}

/// Inverse of [`encode`]: here the consumed ciphertext byte is the next key.
pub fn decode(frame: &[u8], framing: Framing) -> Vec<u8> {
    let body = frame.get(framing.header_len()..).unwrap_or_default();

    let mut key = INITIAL_KEY;
    body.iter()
        .map(|&byte| {
            let plain = key ^ byte;
            key = byte;
            plain
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    const SYSINFO: &[u8] = br#"{"system":{"get_sysinfo":null}}"#;
    const SYSINFO_ENCODED: [u8; 31] = hex!(
        "d0f2 81f8 8bff 9af7 d5ef 94b6 d1b4 c09f ec95 e68f e187 e8ca f09e eb87 eb96 eb"
    );

    #[test]
    fn test_encode_stream() {
        let frame = encode(SYSINFO, Framing::Stream);

        assert_eq!(frame.len(), SYSINFO.len() + 4);
        assert_eq!(frame[..4], [0, 0, 0, 0]);
        assert_eq!(frame[4..], SYSINFO_ENCODED);
    }

    #[test]
    fn test_encode_datagram() {
        let frame = encode(SYSINFO, Framing::Datagram);

        assert_eq!(frame.len(), SYSINFO.len());
        assert_eq!(frame, SYSINFO_ENCODED);
    }

    #[test]
    fn test_decode_skips_stream_header() {
        let mut frame = vec![0xde, 0xad, 0xbe, 0xef];
        frame.extend_from_slice(&SYSINFO_ENCODED);

        assert_eq!(decode(&frame, Framing::Stream), SYSINFO);
        assert_eq!(decode(&SYSINFO_ENCODED, Framing::Datagram), SYSINFO);
    }

    #[test]
    fn test_roundtrip_all_byte_values() {
        let payload: Vec<u8> = (0..=255u8).chain((0..=255u8).rev()).collect();

        for framing in [Framing::Stream, Framing::Datagram] {
            assert_eq!(decode(&encode(&payload, framing), framing), payload);
        }
    }

    #[test]
    fn test_empty() {
        assert!(encode(&[], Framing::Stream).is_empty());
        assert!(encode(&[], Framing::Datagram).is_empty());
        assert!(decode(&[], Framing::Stream).is_empty());
        assert!(decode(&[0, 0], Framing::Stream).is_empty());
    }
}
