//! Codec Identifiers
//!
//! Standard A2DP codecs are identified by their 8-bit media codec type.
//! Vendor-specific codecs carry a (vendor ID, codec ID) pair in the first six
//! bytes of their capabilities; it is folded into a single 32-bit [`CodecId`]
//! which always lies above the 16-bit range, so standard and vendor
//! identifiers never collide and both can key the codec registry.

use crate::A2dpError;
use crate::constants::{
    APT_VENDOR_ID, APTX_AD_CODEC_ID, APTX_CODEC_ID, APTX_HD_CODEC_ID, APTX_LL_CODEC_ID,
    CSR_VENDOR_ID, FASTSTREAM_CODEC_ID, FRAUNHOFER_VENDOR_ID, LC3PLUS_CODEC_ID, LDAC_CODEC_ID,
    QUALCOMM_VENDOR_ID, SONY_VENDOR_ID, VENDOR_CODEC_HEADER_LENGTH, VENDOR_CODEC_TYPE,
};

/// A2DP codec identifier
///
/// Ordering follows the raw value, so every vendor codec sorts after every
/// standard codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CodecId(u32);

impl CodecId {
    /// SBC (Sub-Band Coding), mandatory for A2DP
    pub const SBC: Self = Self::standard(0x00);
    /// MPEG-1,2 Audio (MP3)
    pub const MPEG12: Self = Self::standard(0x01);
    /// MPEG-2,4 AAC
    pub const MPEG24: Self = Self::standard(0x02);
    /// MPEG-D USAC
    pub const MPEGD: Self = Self::standard(0x03);
    /// ATRAC family
    pub const ATRAC: Self = Self::standard(0x04);
    /// aptX
    pub const APTX: Self = Self::vendor(APT_VENDOR_ID, APTX_CODEC_ID);
    /// aptX Adaptive
    pub const APTX_AD: Self = Self::vendor(QUALCOMM_VENDOR_ID, APTX_AD_CODEC_ID);
    /// aptX HD
    pub const APTX_HD: Self = Self::vendor(QUALCOMM_VENDOR_ID, APTX_HD_CODEC_ID);
    /// aptX Low Latency
    pub const APTX_LL: Self = Self::vendor(CSR_VENDOR_ID, APTX_LL_CODEC_ID);
    /// FastStream
    pub const FASTSTREAM: Self = Self::vendor(CSR_VENDOR_ID, FASTSTREAM_CODEC_ID);
    /// LC3plus
    pub const LC3PLUS: Self = Self::vendor(FRAUNHOFER_VENDOR_ID, LC3PLUS_CODEC_ID);
    /// LDAC
    pub const LDAC: Self = Self::vendor(SONY_VENDOR_ID, LDAC_CODEC_ID);

    /// Reserved value returned for codecs which could not be identified.
    ///
    /// Above every standard codec type and below every vendor identifier.
    pub const UNKNOWN: Self = Self(0xFFFF);

    /// Identifier of a standard codec from its media codec type
    #[must_use]
    pub const fn standard(codec_type: u8) -> Self {
        Self(codec_type as u32)
    }

    /// Composite identifier of a vendor-specific codec
    ///
    /// A zero `vendor_id` would fold into the standard range, so it yields
    /// [`CodecId::UNKNOWN`].
    #[must_use]
    pub const fn vendor(vendor_id: u16, codec_id: u16) -> Self {
        if vendor_id == 0 {
            return Self::UNKNOWN;
        }
        Self(((vendor_id as u32) << 16) | codec_id as u32)
    }

    /// Get the raw identifier value
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if this identifier denotes a vendor-specific codec
    #[must_use]
    pub const fn is_vendor(self) -> bool {
        self.0 > 0xFFFF
    }

    /// Media codec type as carried in AVDTP media codec capabilities
    #[must_use]
    pub const fn codec_type(self) -> u8 {
        if self.is_vendor() {
            VENDOR_CODEC_TYPE
        } else {
            (self.0 & 0xFF) as u8
        }
    }

    /// Vendor ID of a vendor-specific codec
    #[must_use]
    pub const fn vendor_id(self) -> Option<u16> {
        if self.is_vendor() {
            Some((self.0 >> 16) as u16)
        } else {
            None
        }
    }

    /// Vendor codec ID of a vendor-specific codec
    #[must_use]
    pub const fn vendor_codec_id(self) -> Option<u16> {
        if self.is_vendor() {
            Some((self.0 & 0xFFFF) as u16)
        } else {
            None
        }
    }

    /// Vendor codec header for a vendor-specific codec
    #[must_use]
    pub const fn vendor_header(self) -> Option<VendorCodecHeader> {
        if self.is_vendor() {
            Some(VendorCodecHeader::new(
                (self.0 >> 16) & 0xFFFF,
                (self.0 & 0xFFFF) as u16,
            ))
        } else {
            None
        }
    }

    /// Canonical display name
    #[must_use]
    pub fn name(self) -> Option<&'static str> {
        codec_id_to_name(self)
    }
}

/// Vendor codecs this crate can identify, whether or not they are registered
const KNOWN_VENDOR_CODECS: [CodecId; 7] = [
    CodecId::APTX,
    CodecId::APTX_AD,
    CodecId::APTX_HD,
    CodecId::APTX_LL,
    CodecId::FASTSTREAM,
    CodecId::LC3PLUS,
    CodecId::LDAC,
];

/// Vendor codec header (A2DP Sec. 4.7.2)
///
/// Octets 0-3 carry the Bluetooth SIG company identifier and octets 4-5 the
/// vendor defined codec ID, both little-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VendorCodecHeader {
    /// Company identifier
    pub vendor_id: u32,
    /// Vendor defined codec ID
    pub codec_id: u16,
}

impl VendorCodecHeader {
    /// Create a new vendor codec header
    #[must_use]
    pub const fn new(vendor_id: u32, codec_id: u16) -> Self {
        Self {
            vendor_id,
            codec_id,
        }
    }

    /// Parse the header from the start of a capability blob
    ///
    /// # Errors
    /// Returns [`A2dpError::InvalidLength`] if the blob is shorter than the header
    pub fn parse(bytes: &[u8]) -> Result<Self, A2dpError> {
        if bytes.len() < VENDOR_CODEC_HEADER_LENGTH {
            return Err(A2dpError::InvalidLength);
        }
        Ok(Self {
            vendor_id: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            codec_id: u16::from_le_bytes([bytes[4], bytes[5]]),
        })
    }

    /// Encode the header to bytes
    ///
    /// # Errors
    /// Returns [`A2dpError::BufferTooSmall`] if the buffer cannot hold the header
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        if buffer.len() < VENDOR_CODEC_HEADER_LENGTH {
            return Err(A2dpError::BufferTooSmall);
        }
        buffer[..4].copy_from_slice(&self.vendor_id.to_le_bytes());
        buffer[4..VENDOR_CODEC_HEADER_LENGTH].copy_from_slice(&self.codec_id.to_le_bytes());
        Ok(VENDOR_CODEC_HEADER_LENGTH)
    }

    /// Resolve the header against the known vendor codecs
    ///
    /// # Errors
    /// * [`A2dpError::UnknownVendor`] if no known codec uses this vendor ID
    /// * [`A2dpError::UnsupportedVendorCodec`] if the vendor is known but the codec ID is not
    pub fn resolve(&self) -> Result<CodecId, A2dpError> {
        let vendor_id = u16::try_from(self.vendor_id).map_err(|_| A2dpError::UnknownVendor)?;
        if !KNOWN_VENDOR_CODECS
            .iter()
            .any(|id| id.vendor_id() == Some(vendor_id))
        {
            return Err(A2dpError::UnknownVendor);
        }

        let codec_id = CodecId::vendor(vendor_id, self.codec_id);
        if KNOWN_VENDOR_CODECS.contains(&codec_id) {
            Ok(codec_id)
        } else {
            Err(A2dpError::UnsupportedVendorCodec)
        }
    }
}

/// Identify the vendor codec whose header starts `capabilities`
///
/// # Errors
/// * [`A2dpError::InvalidLength`] if the blob cannot hold a vendor header
/// * [`A2dpError::UnknownVendor`] if the vendor ID is not known
/// * [`A2dpError::UnsupportedVendorCodec`] if the vendor is known but its codec is not
pub fn vendor_codec_id(capabilities: &[u8]) -> Result<CodecId, A2dpError> {
    let header = VendorCodecHeader::parse(capabilities)?;
    header.resolve().inspect_err(|_| {
        debug!(
            "[CODEC] Unrecognized vendor codec: {=u32:#x}:{=u16:#x}",
            header.vendor_id,
            header.codec_id
        );
    })
}

/// Identify a codec from its AVDTP media codec type and capabilities
///
/// # Errors
/// Propagates [`vendor_codec_id`] errors for vendor-specific codecs
pub fn codec_id_from_capabilities(codec_type: u8, capabilities: &[u8]) -> Result<CodecId, A2dpError> {
    if codec_type == VENDOR_CODEC_TYPE {
        vendor_codec_id(capabilities)
    } else {
        Ok(CodecId::standard(codec_type))
    }
}

/// Canonical name followed by accepted aliases
struct CodecNames {
    codec_id: CodecId,
    names: &'static [&'static str],
}

const CODEC_NAMES: [CodecNames; 12] = [
    CodecNames { codec_id: CodecId::SBC, names: &["SBC"] },
    CodecNames { codec_id: CodecId::MPEG12, names: &["MP3", "MPEG12", "MPEG"] },
    CodecNames { codec_id: CodecId::MPEG24, names: &["AAC", "MPEG24"] },
    CodecNames { codec_id: CodecId::MPEGD, names: &["USAC", "MPEG-D"] },
    CodecNames { codec_id: CodecId::ATRAC, names: &["ATRAC"] },
    CodecNames { codec_id: CodecId::APTX, names: &["aptX", "apt-x"] },
    CodecNames { codec_id: CodecId::APTX_AD, names: &["aptX-AD", "apt-x-ad"] },
    CodecNames { codec_id: CodecId::APTX_HD, names: &["aptX-HD", "apt-x-hd"] },
    CodecNames { codec_id: CodecId::APTX_LL, names: &["aptX-LL", "apt-x-ll"] },
    CodecNames { codec_id: CodecId::FASTSTREAM, names: &["FastStream", "FS"] },
    CodecNames { codec_id: CodecId::LC3PLUS, names: &["LC3plus", "LC3-plus"] },
    CodecNames { codec_id: CodecId::LDAC, names: &["LDAC"] },
];

/// Look up a codec by canonical name or alias, ignoring ASCII case
///
/// Returns [`CodecId::UNKNOWN`] for names which are not recognized.
#[must_use]
pub fn codec_id_from_name(name: &str) -> CodecId {
    CODEC_NAMES
        .iter()
        .find(|entry| entry.names.iter().any(|n| n.eq_ignore_ascii_case(name)))
        .map_or(CodecId::UNKNOWN, |entry| entry.codec_id)
}

/// Canonical display name of a codec
#[must_use]
pub fn codec_id_to_name(codec_id: CodecId) -> Option<&'static str> {
    CODEC_NAMES
        .iter()
        .find(|entry| entry.codec_id == codec_id)
        .and_then(|entry| entry.names.first().copied())
}

/// Resolve an alias to its canonical spelling
///
/// Unknown names are returned unchanged.
#[must_use]
pub fn canonical_name(name: &str) -> &str {
    codec_id_to_name(codec_id_from_name(name)).unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_id_from_name() {
        assert_eq!(codec_id_from_name("SBC"), CodecId::SBC);
        assert_eq!(codec_id_from_name("apt-x"), CodecId::APTX);
        assert_eq!(codec_id_from_name("mpeg"), CodecId::MPEG12);
        assert_eq!(codec_id_from_name("APTX-HD"), CodecId::APTX_HD);
        assert_eq!(codec_id_from_name("unknown"), CodecId::UNKNOWN);
        assert_eq!(codec_id_from_name(""), CodecId::UNKNOWN);
        assert_eq!(CodecId::UNKNOWN.raw(), 0xFFFF);
    }

    #[test]
    fn test_codec_id_to_name() {
        assert_eq!(codec_id_to_name(CodecId::SBC), Some("SBC"));
        assert_eq!(codec_id_to_name(CodecId::APTX), Some("aptX"));
        assert_eq!(codec_id_to_name(CodecId::MPEG24), Some("AAC"));
        assert_eq!(codec_id_to_name(CodecId::UNKNOWN), None);
        assert_eq!(CodecId::LDAC.name(), Some("LDAC"));
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(canonical_name("apt-x"), "aptX");
        assert_eq!(canonical_name("MPEG24"), "AAC");
        assert_eq!(canonical_name("Foo-Bar"), "Foo-Bar");
    }

    #[test]
    fn test_names_round_trip_to_canonical() {
        for entry in &CODEC_NAMES {
            let canonical = entry.names[0];
            for name in entry.names {
                let id = codec_id_from_name(name);
                assert_eq!(id, entry.codec_id);
                assert_eq!(codec_id_to_name(id), Some(canonical));

                let once = canonical_name(name);
                assert_eq!(once, canonical);
                assert_eq!(canonical_name(once), once);
            }
        }
    }

    #[test]
    fn test_vendor_ids_above_standard_range() {
        for id in KNOWN_VENDOR_CODECS {
            assert!(id.is_vendor());
            assert!(id > CodecId::UNKNOWN);
            assert_eq!(id.codec_type(), VENDOR_CODEC_TYPE);
        }
        for id in [CodecId::SBC, CodecId::MPEG12, CodecId::MPEG24, CodecId::ATRAC] {
            assert!(!id.is_vendor());
            assert!(id < CodecId::UNKNOWN);
            assert_eq!(id.vendor_id(), None);
        }

        assert_eq!(CodecId::APTX.vendor_id(), Some(APT_VENDOR_ID));
        assert_eq!(CodecId::APTX.vendor_codec_id(), Some(APTX_CODEC_ID));
        assert_eq!(CodecId::MPEG24.codec_type(), 0x02);
    }

    #[test]
    fn test_vendor_zero_never_collides() {
        assert_eq!(CodecId::vendor(0, 0), CodecId::UNKNOWN);
        assert_ne!(CodecId::vendor(0, 0), CodecId::SBC);
        assert_eq!(CodecId::vendor(0, 0x0002), CodecId::UNKNOWN);
        assert!(CodecId::vendor(1, 0).is_vendor());
    }

    #[test]
    fn test_vendor_codec_id() {
        // Too short to hold a vendor header
        let cfg0 = [0xDE, 0xAD, 0xB0, 0xBE];
        assert_eq!(vendor_codec_id(&cfg0), Err(A2dpError::InvalidLength));

        // Unknown vendor
        let cfg1 = [0xDE, 0xAD, 0xB0, 0xBE, 0x01, 0x00, 0x00];
        assert_eq!(vendor_codec_id(&cfg1), Err(A2dpError::UnknownVendor));

        let mut cfg2 = [0u8; 7];
        VendorCodecHeader::new(u32::from(APT_VENDOR_ID), APTX_CODEC_ID)
            .encode(&mut cfg2)
            .unwrap();
        assert_eq!(cfg2[..6], [0x4F, 0x00, 0x00, 0x00, 0x01, 0x00]);
        assert_eq!(vendor_codec_id(&cfg2), Ok(CodecId::APTX));

        // Known vendor, unknown codec
        let mut cfg3 = [0u8; 7];
        VendorCodecHeader::new(u32::from(APT_VENDOR_ID), 0x69)
            .encode(&mut cfg3)
            .unwrap();
        assert_eq!(
            vendor_codec_id(&cfg3),
            Err(A2dpError::UnsupportedVendorCodec)
        );
    }

    #[test]
    fn test_vendor_header_from_codec_id() {
        let header = CodecId::LDAC.vendor_header().unwrap();
        assert_eq!(header.vendor_id, u32::from(SONY_VENDOR_ID));
        assert_eq!(header.codec_id, LDAC_CODEC_ID);
        assert_eq!(header.resolve(), Ok(CodecId::LDAC));
        assert_eq!(CodecId::SBC.vendor_header(), None);

        let mut short = [0u8; 4];
        assert_eq!(header.encode(&mut short), Err(A2dpError::BufferTooSmall));
    }

    #[test]
    fn test_codec_id_from_capabilities() {
        assert_eq!(codec_id_from_capabilities(0x00, &[0xFF; 4]), Ok(CodecId::SBC));
        assert_eq!(codec_id_from_capabilities(0x02, &[]), Ok(CodecId::MPEG24));

        let mut caps = [0u8; 11];
        CodecId::APTX_HD
            .vendor_header()
            .unwrap()
            .encode(&mut caps)
            .unwrap();
        assert_eq!(
            codec_id_from_capabilities(VENDOR_CODEC_TYPE, &caps),
            Ok(CodecId::APTX_HD)
        );
        assert_eq!(
            codec_id_from_capabilities(VENDOR_CODEC_TYPE, &caps[..3]),
            Err(A2dpError::InvalidLength)
        );
    }
}
