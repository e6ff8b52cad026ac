use mlt_rs_core::traits::packet::seq::SequencedPacket;

/// Bytes of the sequence header in front of every tunneled payload.
pub const SEQ_HEADER_LEN: usize = 8;

/// One datagram received from a link: a big-endian 64-bit sequence
/// number followed by the tunneled payload.
#[derive(Debug)]
pub struct Datagram {
    pub sequence: u64,
    pub payload: Vec<u8>,
    /// index of the link it arrived on
    pub link: usize,
}

impl Datagram {
    /// `None` if the frame is too short to carry a sequence header.
    pub fn parse(link: usize, frame: &[u8]) -> Option<Self> {
        if frame.len() < SEQ_HEADER_LEN {
            return None;
        }
        let sequence = u64::from_be_bytes(frame[..SEQ_HEADER_LEN].try_into().ok()?);
        Some(Self {
            sequence,
            payload: frame[SEQ_HEADER_LEN..].to_vec(),
            link,
        })
    }
}

impl SequencedPacket<u64> for Datagram {
    fn sequence(&self) -> u64 {
        self.sequence
    }
}

#[cfg(test)]
mod tests {
    use super::{Datagram, SEQ_HEADER_LEN};

    #[test]
    fn parse_frame() {
        let mut frame = 42u64.to_be_bytes().to_vec();
        frame.extend_from_slice(b"payload");
        let datagram = Datagram::parse(3, &frame).unwrap();
        assert_eq!(datagram.sequence, 42);
        assert_eq!(datagram.payload, b"payload");
        assert_eq!(datagram.link, 3);
    }

    #[test]
    fn parse_header_only() {
        let frame = 7u64.to_be_bytes();
        let datagram = Datagram::parse(0, &frame).unwrap();
        assert_eq!(datagram.sequence, 7);
        assert!(datagram.payload.is_empty());
    }

    #[test]
    fn reject_runt() {
        assert!(Datagram::parse(0, &[0u8; SEQ_HEADER_LEN - 1]).is_none());
        assert!(Datagram::parse(0, &[]).is_none());
    }
}
