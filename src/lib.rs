#![no_std]
#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

mod fmt;

pub mod bitfield;
pub mod check;
pub mod codec;
pub mod codec_id;
pub mod constants;
pub mod negotiate;
pub mod policy;
pub mod registry;

pub use check::CheckFlags;
pub use codec_id::{
    CodecId, VendorCodecHeader, canonical_name, codec_id_from_name, codec_id_to_name,
    vendor_codec_id,
};
pub use negotiate::{Configuration, check_configuration, filter_capabilities, select_configuration};
pub use policy::{NegotiationPolicy, POLICY, PolicyStore, QualityTier};
pub use registry::{CodecDescriptor, StreamEndpoint, lookup};

/// A2DP stream direction
///
/// Sources order before sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Audio source (encodes and sends audio)
    Source,
    /// Audio sink (receives and decodes audio)
    Sink,
}

impl Direction {
    /// The direction of the peer endpoint
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Sink,
            Self::Sink => Self::Source,
        }
    }
}

/// A2DP codec negotiation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum A2dpError {
    /// Capability or configuration blob has the wrong size for its codec
    InvalidLength,
    /// Vendor codec header names an unknown vendor
    UnknownVendor,
    /// Vendor is known but its codec is not
    UnsupportedVendorCodec,
    /// Output buffer cannot hold the encoded bytes
    BufferTooSmall,
    /// No valid configuration exists; every offending field is flagged
    SelectionImpossible(CheckFlags),
}
