//! Codec Registry
//!
//! Static table of the codecs this device can negotiate, keyed by direction
//! and [`CodecId`]. The table is kept in descriptor order (sources first,
//! then ascending codec identifier), which is also the order in which local
//! codecs are offered.
//!
//! Remote stream endpoints are ordered differently: by codec first and
//! direction second, so that all endpoints offering the same codec are
//! attempted together.

use crate::{
    A2dpError, Direction,
    codec::{CodecOps, aac, aptx, ldac, mpeg, sbc},
    codec_id::{CodecId, codec_id_from_capabilities},
    constants::{MAX_CAPABILITIES_SIZE, MAX_CODECS, MAX_STREAM_ENDPOINTS},
};
use core::cmp::Ordering;
use core::fmt;
use heapless::Vec;

/// Stream Endpoint Identifier
pub type StreamEndpointId = u8;

/// A codec this device can negotiate in one direction
///
/// Descriptors compare by `(direction, codec_id)` only.
#[derive(Clone, Copy)]
pub struct CodecDescriptor {
    direction: Direction,
    codec_id: CodecId,
    ops: &'static dyn CodecOps,
}

impl CodecDescriptor {
    /// Create a new codec descriptor
    #[must_use]
    pub const fn new(direction: Direction, codec_id: CodecId, ops: &'static dyn CodecOps) -> Self {
        Self {
            direction,
            codec_id,
            ops,
        }
    }

    /// Local stream direction
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Codec identifier
    #[must_use]
    pub const fn codec_id(&self) -> CodecId {
        self.codec_id
    }

    /// Codec specific negotiation operations
    #[must_use]
    pub fn ops(&self) -> &'static dyn CodecOps {
        self.ops
    }

    /// Size of the codec capability blob in bytes
    #[must_use]
    pub fn capabilities_size(&self) -> usize {
        self.ops.capabilities_size()
    }

    /// Encode the locally supported capabilities
    ///
    /// # Errors
    /// Returns [`A2dpError::BufferTooSmall`] if `buffer` cannot hold the capabilities
    pub fn write_capabilities(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        self.ops.write_capabilities(buffer)
    }

    const fn key(&self) -> (Direction, CodecId) {
        (self.direction, self.codec_id)
    }
}

impl fmt::Debug for CodecDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodecDescriptor")
            .field("direction", &self.direction)
            .field("codec_id", &self.codec_id)
            .field("name", &self.codec_id.name())
            .finish_non_exhaustive()
    }
}

impl PartialEq for CodecDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for CodecDescriptor {}

impl PartialOrd for CodecDescriptor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CodecDescriptor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// SBC encoder
pub static SBC_SOURCE: CodecDescriptor =
    CodecDescriptor::new(Direction::Source, CodecId::SBC, &sbc::SBC);
/// MP3 encoder
pub static MPEG12_SOURCE: CodecDescriptor =
    CodecDescriptor::new(Direction::Source, CodecId::MPEG12, &mpeg::MPEG_SOURCE);
/// AAC encoder
pub static MPEG24_SOURCE: CodecDescriptor =
    CodecDescriptor::new(Direction::Source, CodecId::MPEG24, &aac::AAC);
/// aptX encoder
pub static APTX_SOURCE: CodecDescriptor =
    CodecDescriptor::new(Direction::Source, CodecId::APTX, &aptx::APTX_SOURCE);
/// aptX HD encoder
pub static APTX_HD_SOURCE: CodecDescriptor =
    CodecDescriptor::new(Direction::Source, CodecId::APTX_HD, &aptx::APTX_HD_SOURCE);
/// LDAC encoder
pub static LDAC_SOURCE: CodecDescriptor =
    CodecDescriptor::new(Direction::Source, CodecId::LDAC, &ldac::LDAC_SOURCE);
/// SBC decoder
pub static SBC_SINK: CodecDescriptor =
    CodecDescriptor::new(Direction::Sink, CodecId::SBC, &sbc::SBC);
/// MPEG-1,2 Audio decoder
pub static MPEG12_SINK: CodecDescriptor =
    CodecDescriptor::new(Direction::Sink, CodecId::MPEG12, &mpeg::MPEG_SINK);
/// AAC decoder
pub static MPEG24_SINK: CodecDescriptor =
    CodecDescriptor::new(Direction::Sink, CodecId::MPEG24, &aac::AAC);
/// aptX decoder
pub static APTX_SINK: CodecDescriptor =
    CodecDescriptor::new(Direction::Sink, CodecId::APTX, &aptx::APTX_SINK);
/// aptX HD decoder
pub static APTX_HD_SINK: CodecDescriptor =
    CodecDescriptor::new(Direction::Sink, CodecId::APTX_HD, &aptx::APTX_HD_SINK);

/// Registered codecs in descriptor order
static CODECS: [&CodecDescriptor; 11] = [
    &SBC_SOURCE,
    &MPEG12_SOURCE,
    &MPEG24_SOURCE,
    &APTX_SOURCE,
    &APTX_HD_SOURCE,
    &LDAC_SOURCE,
    &SBC_SINK,
    &MPEG12_SINK,
    &MPEG24_SINK,
    &APTX_SINK,
    &APTX_HD_SINK,
];

/// Every registered codec, sorted by direction then codec identifier
#[must_use]
pub fn codecs() -> &'static [&'static CodecDescriptor] {
    &CODECS
}

/// Registered codecs for one local direction, in descriptor order
#[must_use]
pub fn codecs_for(direction: Direction) -> Vec<&'static CodecDescriptor, MAX_CODECS> {
    CODECS
        .iter()
        .copied()
        .filter(|codec| codec.direction == direction)
        .collect()
}

/// Find the registered codec for an identifier and local direction
#[must_use]
pub fn lookup(codec_id: CodecId, direction: Direction) -> Option<&'static CodecDescriptor> {
    CODECS
        .binary_search_by(|codec| codec.key().cmp(&(direction, codec_id)))
        .ok()
        .map(|index| CODECS[index])
}

/// Sort codec descriptors by direction then codec identifier
pub fn sort_codecs(codecs: &mut [&CodecDescriptor]) {
    codecs.sort_unstable();
}

/// Remote AVDTP stream endpoint with its advertised codec capabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEndpoint {
    /// Stream Endpoint Identifier
    pub seid: StreamEndpointId,
    /// Endpoint direction (as seen by the remote device)
    pub direction: Direction,
    /// Advertised codec
    pub codec_id: CodecId,
    /// Advertised codec capabilities
    pub capabilities: Vec<u8, MAX_CAPABILITIES_SIZE>,
}

impl StreamEndpoint {
    /// Create a new stream endpoint without capabilities
    #[must_use]
    pub fn new(seid: StreamEndpointId, direction: Direction, codec_id: CodecId) -> Self {
        Self {
            seid,
            direction,
            codec_id,
            capabilities: Vec::new(),
        }
    }

    /// Create a stream endpoint from an AVDTP media codec capability
    ///
    /// # Errors
    /// * [`A2dpError::InvalidLength`] if the capabilities exceed the supported size
    /// * Vendor codec identification errors, see [`crate::codec_id::vendor_codec_id`]
    pub fn from_media_codec(
        seid: StreamEndpointId,
        direction: Direction,
        codec_type: u8,
        capabilities: &[u8],
    ) -> Result<Self, A2dpError> {
        let codec_id = codec_id_from_capabilities(codec_type, capabilities)?;
        Self::new(seid, direction, codec_id).with_capabilities(capabilities)
    }

    /// Attach advertised capabilities
    ///
    /// # Errors
    /// Returns [`A2dpError::InvalidLength`] if the capabilities exceed the supported size
    pub fn with_capabilities(mut self, capabilities: &[u8]) -> Result<Self, A2dpError> {
        self.capabilities =
            Vec::from_slice(capabilities).map_err(|()| A2dpError::InvalidLength)?;
        Ok(self)
    }

    /// Local codec able to stream with this endpoint
    ///
    /// A remote sink pairs with a local source and vice versa.
    #[must_use]
    pub fn local_codec(&self) -> Option<&'static CodecDescriptor> {
        lookup(self.codec_id, self.direction.opposite())
    }

    fn key(&self) -> (CodecId, Direction, StreamEndpointId) {
        (self.codec_id, self.direction, self.seid)
    }
}

/// Sort stream endpoints by codec identifier, then direction
///
/// Endpoints with the same codec and direction keep a stable order by SEID.
pub fn sort_endpoints(endpoints: &mut [StreamEndpoint]) {
    endpoints.sort_unstable_by_key(StreamEndpoint::key);
}

/// Remote endpoints which have a local counterpart, in attempt order
///
/// At most [`MAX_STREAM_ENDPOINTS`] endpoints are returned. When more are
/// negotiable, the ones latest in attempt order are dropped.
#[must_use]
pub fn negotiable_endpoints(
    endpoints: &[StreamEndpoint],
) -> Vec<&StreamEndpoint, MAX_STREAM_ENDPOINTS> {
    let mut negotiable: Vec<&StreamEndpoint, MAX_STREAM_ENDPOINTS> = Vec::new();
    for endpoint in endpoints {
        if endpoint.local_codec().is_none() {
            trace!(
                "[REGISTRY] No local codec for SEID {=u8} ({=u32:#x})",
                endpoint.seid,
                endpoint.codec_id.raw()
            );
            continue;
        }
        let position = negotiable.partition_point(|other| other.key() <= endpoint.key());
        if negotiable.is_full() {
            warn!(
                "[REGISTRY] Too many stream endpoints, dropping the last in attempt order"
            );
            if position == negotiable.len() {
                continue;
            }
            negotiable.pop();
        }
        if negotiable.insert(position, endpoint).is_err() {
            continue;
        }
    }
    negotiable
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::ptr;

    #[test]
    fn test_codec_descriptor_ordering() {
        let codec1 = CodecDescriptor::new(Direction::Source, CodecId::SBC, &sbc::SBC);
        let codec2 = CodecDescriptor::new(Direction::Source, CodecId::MPEG24, &aac::AAC);
        let codec3 = CodecDescriptor::new(Direction::Source, CodecId::APTX, &aptx::APTX_SOURCE);
        let codec4 = CodecDescriptor::new(Direction::Sink, CodecId::SBC, &sbc::SBC);
        let codec5 = CodecDescriptor::new(Direction::Sink, CodecId::APTX, &aptx::APTX_SINK);

        let mut codecs = [&codec3, &codec1, &codec4, &codec5, &codec2];
        sort_codecs(&mut codecs);

        assert!(ptr::eq(codecs[0], &codec1));
        assert!(ptr::eq(codecs[1], &codec2));
        assert!(ptr::eq(codecs[2], &codec3));
        assert!(ptr::eq(codecs[3], &codec4));
        assert!(ptr::eq(codecs[4], &codec5));

        // Every permutation sorts the same way
        let mut reversed = [&codec5, &codec4, &codec3, &codec2, &codec1];
        sort_codecs(&mut reversed);
        assert!(reversed.iter().zip(codecs.iter()).all(|(a, b)| ptr::eq(*a, *b)));
    }

    #[test]
    fn test_registry_is_sorted() {
        assert!(codecs().is_sorted());
        assert!(codecs().windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(codecs().len(), 11);
    }

    #[test]
    fn test_codecs_for_direction() {
        let sources = codecs_for(Direction::Source);
        assert_eq!(sources.len(), 6);
        assert!(sources.iter().all(|codec| codec.direction() == Direction::Source));
        assert_eq!(sources[0].codec_id(), CodecId::SBC);
        assert_eq!(sources[5].codec_id(), CodecId::LDAC);

        let sinks = codecs_for(Direction::Sink);
        assert_eq!(sinks.len(), 5);
        assert!(!sinks.iter().any(|codec| codec.codec_id() == CodecId::LDAC));
    }

    #[test]
    fn test_codec_lookup() {
        assert!(ptr::eq(
            lookup(CodecId::SBC, Direction::Source).unwrap(),
            &SBC_SOURCE
        ));
        assert!(ptr::eq(
            lookup(CodecId::APTX_HD, Direction::Sink).unwrap(),
            &APTX_HD_SINK
        ));
        assert!(lookup(CodecId::UNKNOWN, Direction::Source).is_none());
        assert!(lookup(CodecId::LDAC, Direction::Sink).is_none());
        assert!(lookup(CodecId::ATRAC, Direction::Source).is_none());
    }

    #[test]
    fn test_endpoint_ordering() {
        let mut seps = [
            StreamEndpoint::new(1, Direction::Source, CodecId::APTX),
            StreamEndpoint::new(2, Direction::Sink, CodecId::SBC),
            StreamEndpoint::new(3, Direction::Sink, CodecId::APTX),
            StreamEndpoint::new(4, Direction::Source, CodecId::MPEG24),
            StreamEndpoint::new(5, Direction::Source, CodecId::SBC),
        ];
        sort_endpoints(&mut seps);

        let order: [(CodecId, Direction); 5] = [
            (CodecId::SBC, Direction::Source),
            (CodecId::SBC, Direction::Sink),
            (CodecId::MPEG24, Direction::Source),
            (CodecId::APTX, Direction::Source),
            (CodecId::APTX, Direction::Sink),
        ];
        for (sep, (codec_id, direction)) in seps.iter().zip(order) {
            assert_eq!(sep.codec_id, codec_id);
            assert_eq!(sep.direction, direction);
        }
    }

    #[test]
    fn test_endpoint_ordering_ties_by_seid() {
        let mut seps = [
            StreamEndpoint::new(9, Direction::Sink, CodecId::SBC),
            StreamEndpoint::new(3, Direction::Sink, CodecId::SBC),
        ];
        sort_endpoints(&mut seps);
        assert_eq!(seps[0].seid, 3);
        assert_eq!(seps[1].seid, 9);
    }

    #[test]
    fn test_endpoint_from_media_codec() {
        let sep =
            StreamEndpoint::from_media_codec(1, Direction::Sink, 0x00, &[0xFF, 0xFF, 2, 53])
                .unwrap();
        assert_eq!(sep.codec_id, CodecId::SBC);
        assert_eq!(sep.capabilities.as_slice(), &[0xFF, 0xFF, 2, 53]);
        assert!(ptr::eq(sep.local_codec().unwrap(), &SBC_SOURCE));

        let aptx_caps = [0x4F, 0x00, 0x00, 0x00, 0x01, 0x00, 0x32];
        let sep = StreamEndpoint::from_media_codec(2, Direction::Source, 0xFF, &aptx_caps).unwrap();
        assert_eq!(sep.codec_id, CodecId::APTX);
        assert!(ptr::eq(sep.local_codec().unwrap(), &APTX_SINK));

        assert_eq!(
            StreamEndpoint::from_media_codec(3, Direction::Sink, 0xFF, &aptx_caps[..4]),
            Err(A2dpError::InvalidLength)
        );
        assert_eq!(
            StreamEndpoint::new(4, Direction::Sink, CodecId::SBC).with_capabilities(&[0u8; 33]),
            Err(A2dpError::InvalidLength)
        );
    }

    #[test]
    fn test_negotiable_endpoints() {
        let seps = [
            StreamEndpoint::new(1, Direction::Sink, CodecId::APTX),
            StreamEndpoint::new(2, Direction::Sink, CodecId::LC3PLUS),
            StreamEndpoint::new(3, Direction::Source, CodecId::LDAC),
            StreamEndpoint::new(4, Direction::Sink, CodecId::SBC),
            StreamEndpoint::new(5, Direction::Sink, CodecId::LDAC),
        ];
        let negotiable = negotiable_endpoints(&seps);
        let seids: Vec<StreamEndpointId, 5> = negotiable.iter().map(|sep| sep.seid).collect();
        // No local LC3plus codec and no local LDAC decoder
        assert_eq!(seids.as_slice(), &[4, 1, 5]);
    }

    #[test]
    fn test_negotiable_endpoints_bounded_in_attempt_order() {
        let mut seps: Vec<StreamEndpoint, 20> = Vec::new();
        for seid in 0..MAX_STREAM_ENDPOINTS as u8 {
            seps.push(StreamEndpoint::new(seid, Direction::Sink, CodecId::APTX_HD))
                .unwrap();
        }
        seps.push(StreamEndpoint::new(99, Direction::Sink, CodecId::SBC)).unwrap();
        seps.push(StreamEndpoint::new(98, Direction::Sink, CodecId::APTX)).unwrap();

        let negotiable = negotiable_endpoints(&seps);
        assert_eq!(negotiable.len(), MAX_STREAM_ENDPOINTS);
        assert_eq!(negotiable[0].seid, 99);
        assert_eq!(negotiable[1].seid, 98);
        assert_eq!(negotiable[2].seid, 0);
        // The highest SEIDs of the last codec are dropped
        assert_eq!(negotiable[MAX_STREAM_ENDPOINTS - 1].seid, 13);
        assert!(negotiable.iter().map(|sep| sep.key()).is_sorted());
    }
}
