use super::frame::Frame;
use super::hash::AsReqHash;
use super::request::KrbRequest;
use crate::asn1::tlv::DecodeLimits;
use crate::config::SnifferConfig;
use crate::error::KrbError;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, instrument, trace};

/// Accumulates every AS-REQ seen on the Kerberos port, in capture order.
///
/// Safe to share between capture threads. Nothing is ever removed or
/// deduplicated: the same request captured twice is recorded twice.
#[derive(Debug)]
pub struct KrbHandler {
    port: u16,
    limits: DecodeLimits,
    requests: RwLock<Vec<Arc<KrbRequest>>>,
}

impl Default for KrbHandler {
    fn default() -> Self {
        KrbHandler::new(&SnifferConfig::default())
    }
}

impl KrbHandler {
    pub fn new(config: &SnifferConfig) -> Self {
        KrbHandler {
            port: config.kerberos_port,
            limits: config.limits(),
            requests: RwLock::new(Vec::new()),
        }
    }

    /// Decode a frame without recording it. `Ok(None)` means the frame was
    /// not for the Kerberos port and was never looked at.
    pub fn process(&self, frame: &Frame) -> Result<Option<KrbRequest>, KrbError> {
        if !frame.matches_port(self.port) {
            return Ok(None);
        }

        KrbRequest::from_der_with_limits(&frame.payload, &self.limits).map(Some)
    }

    /// Ingest one captured frame. Bad input is dropped here, so a capture
    /// loop can feed anything it sees without checking results.
    #[instrument(level = "trace", skip_all)]
    pub fn handle_packet(&self, frame: &Frame) {
        match self.process(frame) {
            Ok(Some(req)) => {
                info!(
                    client_name = %req.client_name,
                    realm = %req.realm,
                    preauth_entries = req.preauth.len(),
                    "AS-REQ captured"
                );
                self.requests.write().push(Arc::new(req));
            }
            Ok(None) => {
                trace!(src_port = ?frame.src_port, dst_port = ?frame.dst_port, "not kerberos");
            }
            Err(err) => {
                debug!(?err, len = frame.payload.len(), "dropping kerberos packet");
            }
        }
    }

    pub fn requests(&self) -> Vec<Arc<KrbRequest>> {
        self.requests.read().clone()
    }

    pub fn get(&self, index: usize) -> Option<Arc<KrbRequest>> {
        self.requests.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.requests.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.read().is_empty()
    }

    /// Formatted hashes of every recorded request that has pre-auth material,
    /// in capture order. Lossy for non UTF-8 names, see [`KrbHandler::hash_lines`].
    pub fn hashes(&self) -> Vec<String> {
        self.collect_hashes(|hash| hash.to_string())
    }

    /// As [`KrbHandler::hashes`], with names copied verbatim. This is what
    /// gets written out for the crackers.
    pub fn hash_lines(&self) -> Vec<Vec<u8>> {
        self.collect_hashes(|hash| hash.to_bytes())
    }

    fn collect_hashes<T>(&self, render: impl Fn(&AsReqHash) -> T) -> Vec<T> {
        self.requests
            .read()
            .iter()
            .filter_map(|req| match req.hash() {
                Ok(hash) => Some(render(&hash)),
                Err(err) => {
                    debug!(?err, client_name = %req.client_name, "no hash for request");
                    None
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::KrbHandler;
    use crate::config::SnifferConfig;
    use crate::error::KrbError;
    use crate::proto::Frame;
    use std::sync::Arc;
    use std::thread;

    const DENYDC_AS_REQ: &str = concat!(
        "6a82011e3082011aa103020105a20302010aa35f305d3048a103020102a241043f303da003020117a236043471319a93d60531fcb443f7e96039f540addbe67ccf9dd3c3da9e233612816c5720447ae202cfe7a84a719e1ef70b93bcef49786f3011a10402020080a20904073005a0030101ff",
        "a481ac3081a9a00703050040810010a10f300da003020101a10630041b027535a2081b0644454e594443a31b3019a003020102a11230101b066b72627467741b0644454e594443a511180f32303337303931333032343830355aa611180f32303337303931333032343830355aa7060204320fe8aca81930170201170202ff7b0201800201030201010201180202ff79a91d301b3019a003020114a112041058503120202020202020202020202020",
    );

    const DENYDC_HASH: &str = "$krb5$23$u5$DENYDC$nodata$71319a93d60531fcb443f7e96039f540addbe67ccf9dd3c3da9e233612816c5720447ae202cfe7a84a719e1ef70b93bcef49786f";

    fn denydc_frame() -> Frame {
        let payload = hex::decode(DENYDC_AS_REQ).expect("Failed to decode sample");
        Frame::udp(1088, 88, payload)
    }

    #[test]
    fn intake_records_as_req() {
        let _ = tracing_subscriber::fmt::try_init();

        let handler = KrbHandler::default();
        handler.handle_packet(&denydc_frame());

        assert_eq!(handler.len(), 1);
        let req = handler.get(0).expect("request must be recorded");
        assert_eq!(req.to_hash_string(), Ok(DENYDC_HASH.to_string()));
        assert_eq!(handler.hashes(), vec![DENYDC_HASH.to_string()]);
        assert_eq!(handler.hash_lines(), vec![DENYDC_HASH.as_bytes().to_vec()]);
    }

    #[test]
    fn intake_non_utf8_realm_is_verbatim() {
        let mut payload = hex::decode(DENYDC_AS_REQ).expect("Failed to decode sample");
        // First octet of the realm GeneralString, D -> 0xc4.
        let realm = payload
            .windows(8)
            .position(|w| w == [0x1b, 0x06, 0x44, 0x45, 0x4e, 0x59, 0x44, 0x43])
            .expect("realm must be in sample");
        payload[realm + 2] = 0xc4;

        let handler = KrbHandler::default();
        handler.handle_packet(&Frame::udp(1088, 88, payload));
        assert_eq!(handler.len(), 1);

        let req = handler.get(0).expect("request must be recorded");
        assert_eq!(req.realm.as_bytes(), &[0xc4, 0x45, 0x4e, 0x59, 0x44, 0x43]);

        let mut expected = DENYDC_HASH.as_bytes().to_vec();
        let at = expected
            .windows(8)
            .position(|w| w == b"$DENYDC$")
            .expect("realm must be in hash");
        expected[at + 1] = 0xc4;
        assert_eq!(handler.hash_lines(), vec![expected]);
    }

    #[test]
    fn intake_does_not_deduplicate() {
        let handler = KrbHandler::default();
        let frame = denydc_frame();
        handler.handle_packet(&frame);
        handler.handle_packet(&frame);

        let requests = handler.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0], requests[1]);
    }

    #[test]
    fn intake_ignores_other_ports() {
        let handler = KrbHandler::default();
        let mut frame = denydc_frame();
        frame.src_port = Some(1088);
        frame.dst_port = Some(53);
        handler.handle_packet(&frame);
        assert!(handler.is_empty());
        assert_eq!(handler.process(&frame), Ok(None));
    }

    #[test]
    fn intake_configured_port() {
        let config = SnifferConfig {
            kerberos_port: 8888,
            ..Default::default()
        };
        let handler = KrbHandler::new(&config);

        handler.handle_packet(&denydc_frame());
        assert!(handler.is_empty());

        let mut frame = denydc_frame();
        frame.dst_port = Some(8888);
        handler.handle_packet(&frame);
        assert_eq!(handler.len(), 1);
    }

    #[test]
    fn intake_drops_truncated_payload() {
        let handler = KrbHandler::default();
        let mut payload = hex::decode(DENYDC_AS_REQ).expect("Failed to decode sample");
        payload.pop();
        let frame = Frame::udp(1088, 88, payload);

        handler.handle_packet(&frame);
        assert!(handler.is_empty());
        assert_eq!(handler.process(&frame), Err(KrbError::MalformedEncoding));
    }

    #[test]
    fn intake_drops_non_as_req() {
        let handler = KrbHandler::default();

        // KRB-ERROR reply coming back from the KDC, [APPLICATION 30].
        let frame = Frame::udp(88, 1088, vec![0x7e_u8, 0x02, 0x30, 0x00]);
        handler.handle_packet(&frame);
        // pvno missing.
        let frame = Frame::udp(1088, 88, vec![0x6a_u8, 0x07, 0x30, 0x05, 0xa2, 0x03, 0x02, 0x01, 0x0a]);
        handler.handle_packet(&frame);
        // Not even TLV.
        let frame = Frame::udp(1088, 88, vec![0x6a_u8]);
        handler.handle_packet(&frame);

        assert!(handler.is_empty());
    }

    #[test]
    fn intake_empty_padata_has_no_hash() {
        // AS-REQ with an empty padata sequence.
        let payload = hex::decode(concat!(
            "6a36", "3034",
            "a103020105", "a20302010a",
            "a3023000",
            "a424", "3022",
            "a10f300da003020101a10630041b027535",
            "a2081b0644454e594443",
            "a8053003020117",
        ))
        .expect("Failed to decode sample");

        let handler = KrbHandler::default();
        handler.handle_packet(&Frame::udp(1088, 88, payload));
        assert_eq!(handler.len(), 1);

        let req = handler.get(0).expect("request must be recorded");
        assert!(req.preauth.is_empty());
        assert_eq!(req.to_hash_string(), Err(KrbError::NoPreAuthData));
        assert!(handler.hashes().is_empty());
    }

    #[test]
    fn intake_shared_between_threads() {
        let handler = Arc::new(KrbHandler::default());

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handler = handler.clone();
                thread::spawn(move || {
                    let frame = denydc_frame();
                    for _ in 0..8 {
                        handler.handle_packet(&frame);
                    }
                })
            })
            .collect();

        for worker in workers {
            assert!(worker.join().is_ok());
        }

        assert_eq!(handler.len(), 32);
        assert!(handler.hashes().iter().all(|hash| hash == DENYDC_HASH));
    }
}
