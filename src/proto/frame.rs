use bytes::Bytes;
use etherparse::{SlicedPacket, TransportSlice};
use tracing::trace;

/// One captured datagram, already stripped down to its UDP payload.
///
/// Ports are optional since not every capture source can supply them. A
/// frame without ports is always handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub src_port: Option<u16>,
    pub dst_port: Option<u16>,
    pub payload: Bytes,
}

impl Frame {
    pub fn udp(src_port: u16, dst_port: u16, payload: impl Into<Bytes>) -> Self {
        Frame {
            src_port: Some(src_port),
            dst_port: Some(dst_port),
            payload: payload.into(),
        }
    }

    pub fn payload_only(payload: impl Into<Bytes>) -> Self {
        Frame {
            src_port: None,
            dst_port: None,
            payload: payload.into(),
        }
    }

    /// Decapsulate an Ethernet II frame. `None` for anything that isn't UDP
    /// over IPv4 or IPv6.
    pub fn from_ethernet(data: &[u8]) -> Option<Self> {
        match SlicedPacket::from_ethernet(data) {
            Ok(sliced) => Self::from_sliced(&sliced),
            Err(err) => {
                trace!(?err, "unable to slice ethernet frame");
                None
            }
        }
    }

    /// As [`Frame::from_ethernet`] for captures without a link layer.
    pub fn from_ip(data: &[u8]) -> Option<Self> {
        match SlicedPacket::from_ip(data) {
            Ok(sliced) => Self::from_sliced(&sliced),
            Err(err) => {
                trace!(?err, "unable to slice ip packet");
                None
            }
        }
    }

    fn from_sliced(sliced: &SlicedPacket<'_>) -> Option<Self> {
        match &sliced.transport {
            Some(TransportSlice::Udp(udp)) => Some(Frame::udp(
                udp.source_port(),
                udp.destination_port(),
                Bytes::copy_from_slice(udp.payload()),
            )),
            _ => None,
        }
    }

    /// Either port is `port`, or the frame carries no ports at all.
    pub fn matches_port(&self, port: u16) -> bool {
        match (self.src_port, self.dst_port) {
            (None, None) => true,
            (src, dst) => src == Some(port) || dst == Some(port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use bytes::Bytes;

    #[test]
    fn frame_port_matching() {
        assert!(Frame::udp(1088, 88, Bytes::new()).matches_port(88));
        assert!(Frame::udp(88, 1088, Bytes::new()).matches_port(88));
        assert!(!Frame::udp(53, 1088, Bytes::new()).matches_port(88));
        assert!(Frame::payload_only(Bytes::new()).matches_port(88));
        assert!(!Frame {
            src_port: Some(53),
            dst_port: None,
            payload: Bytes::new(),
        }
        .matches_port(88));
    }

    #[test]
    fn frame_from_ethernet_udp() {
        // Ethernet, IPv4 10.1.12.2 -> 10.5.3.1, UDP 1088 -> 88, four byte payload.
        let data = hex::decode(concat!(
            "0003ffa6ab0c0003ffa7ab0c0800",
            "4500002001f7000080110000", "0a010c02", "0a050301",
            "04400058000c0000",
            "deadbeef",
        ))
        .expect("Failed to decode sample");
        let frame = Frame::from_ethernet(&data).expect("Failed to slice frame");
        assert_eq!(frame.src_port, Some(1088));
        assert_eq!(frame.dst_port, Some(88));
        assert_eq!(frame.payload.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn frame_from_ethernet_not_udp() {
        // ARP request.
        let data = hex::decode(concat!(
            "ffffffffffff0003ffa7ab0c0806",
            "0001080006040001", "0003ffa7ab0c", "0a010c02", "000000000000", "0a050301",
        ))
        .expect("Failed to decode sample");
        assert!(Frame::from_ethernet(&data).is_none());
        assert!(Frame::from_ethernet(&[]).is_none());
    }
}
