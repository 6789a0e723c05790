//! aptX and aptX HD Codecs
//!
//! Both codecs share one capabilities layout after the vendor codec header:
//!
//! - Octet 0-5: Vendor Codec Header
//! - Octet 6: Sampling Frequency (b4-7), Channel Mode (b0-3)
//!
//! aptX HD appends 4 reserved octets which are always zero in a configuration.

use super::{CodecOps, check_vendor_header, require, selection_result};
use crate::{
    A2dpError, bitfield::FieldSet, check::CheckFlags, codec_id::CodecId,
    constants::VENDOR_CODEC_HEADER_LENGTH, policy::NegotiationPolicy,
};
use bitflags::bitflags;

/// aptX capabilities are 7 bytes
pub const APTX_CAPABILITIES_SIZE: usize = 7;

/// aptX HD capabilities are 11 bytes
pub const APTX_HD_CAPABILITIES_SIZE: usize = 11;

bitflags! {
    /// aptX Sampling Frequency (Octet 6; b4-7)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AptxSamplingFrequency: u8 {
        /// 16000 Hz
        const HZ_16000 = 0x08;
        /// 32000 Hz
        const HZ_32000 = 0x04;
        /// 44100 Hz
        const HZ_44100 = 0x02;
        /// 48000 Hz
        const HZ_48000 = 0x01;
    }
}

bitflags! {
    /// aptX Channel Mode (Octet 6; b0-3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AptxChannelMode: u8 {
        /// Mono
        const MONO = 0x01;
        /// Stereo
        const STEREO = 0x02;
    }
}

const SAMPLING_PRIORITY: [AptxSamplingFrequency; 4] = [
    AptxSamplingFrequency::HZ_48000,
    AptxSamplingFrequency::HZ_44100,
    AptxSamplingFrequency::HZ_32000,
    AptxSamplingFrequency::HZ_16000,
];

const CHANNEL_MODE_PRIORITY: [AptxChannelMode; 2] = [AptxChannelMode::STEREO, AptxChannelMode::MONO];

/// aptX Codec Capabilities (without the vendor codec header)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AptxCapabilities {
    /// Sampling frequency support (bitfield)
    pub sampling_frequencies: AptxSamplingFrequency,
    /// Channel mode support (bitfield)
    pub channel_modes: AptxChannelMode,
}

impl AptxCapabilities {
    /// Decode from the octet following the vendor codec header
    #[must_use]
    pub const fn from_octet(octet: u8) -> Self {
        Self {
            sampling_frequencies: AptxSamplingFrequency::from_bits_retain(octet >> 4),
            channel_modes: AptxChannelMode::from_bits_retain(octet & 0x0F),
        }
    }

    /// Encode to the octet following the vendor codec header
    #[must_use]
    pub const fn to_octet(&self) -> u8 {
        (self.sampling_frequencies.bits() << 4) | (self.channel_modes.bits() & 0x0F)
    }
}

/// aptX family codec negotiation
///
/// One type serves aptX and aptX HD; they differ in vendor codec ID and
/// capabilities size only.
#[derive(Debug)]
pub struct AptxCodec {
    codec_id: CodecId,
    size: usize,
    capabilities: AptxCapabilities,
}

impl AptxCodec {
    /// Create an aptX family codec
    ///
    /// `size` includes the vendor codec header. A size too small to hold the
    /// capabilities octet makes every blob fail with
    /// [`A2dpError::InvalidLength`].
    #[must_use]
    pub const fn new(codec_id: CodecId, size: usize, capabilities: AptxCapabilities) -> Self {
        Self {
            codec_id,
            size,
            capabilities,
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<AptxCapabilities, A2dpError> {
        if bytes.len() != self.size {
            return Err(A2dpError::InvalidLength);
        }
        let octet = bytes
            .get(VENDOR_CODEC_HEADER_LENGTH)
            .ok_or(A2dpError::InvalidLength)?;
        Ok(AptxCapabilities::from_octet(*octet))
    }

    fn encode(&self, caps: &AptxCapabilities, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        if buffer.len() < self.size {
            return Err(A2dpError::BufferTooSmall);
        }
        let header = self
            .codec_id
            .vendor_header()
            .ok_or(A2dpError::UnsupportedVendorCodec)?;
        let Some((octet, reserved)) = buffer
            .get_mut(VENDOR_CODEC_HEADER_LENGTH..self.size)
            .and_then(<[u8]>::split_first_mut)
        else {
            return Err(A2dpError::InvalidLength);
        };
        *octet = caps.to_octet();
        reserved.fill(0);
        header.encode(buffer)?;
        Ok(self.size)
    }
}

const SOURCE_CAPABILITIES: AptxCapabilities = AptxCapabilities {
    sampling_frequencies: AptxSamplingFrequency::all(),
    channel_modes: AptxChannelMode::STEREO,
};

const SINK_CAPABILITIES: AptxCapabilities = AptxCapabilities {
    sampling_frequencies: AptxSamplingFrequency::HZ_44100.union(AptxSamplingFrequency::HZ_48000),
    channel_modes: AptxChannelMode::STEREO,
};

pub(crate) static APTX_SOURCE: AptxCodec =
    AptxCodec::new(CodecId::APTX, APTX_CAPABILITIES_SIZE, SOURCE_CAPABILITIES);
pub(crate) static APTX_SINK: AptxCodec =
    AptxCodec::new(CodecId::APTX, APTX_CAPABILITIES_SIZE, SINK_CAPABILITIES);
pub(crate) static APTX_HD_SOURCE: AptxCodec =
    AptxCodec::new(CodecId::APTX_HD, APTX_HD_CAPABILITIES_SIZE, SOURCE_CAPABILITIES);
pub(crate) static APTX_HD_SINK: AptxCodec =
    AptxCodec::new(CodecId::APTX_HD, APTX_HD_CAPABILITIES_SIZE, SINK_CAPABILITIES);

impl CodecOps for AptxCodec {
    fn capabilities_size(&self) -> usize {
        self.size
    }

    fn write_capabilities(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        self.encode(&self.capabilities, buffer)
    }

    fn select(
        &self,
        capabilities: &mut [u8],
        policy: &NegotiationPolicy,
    ) -> Result<(), A2dpError> {
        let caps = self.decode(capabilities)?;
        let local = &self.capabilities;
        let mut missing = CheckFlags::OK;

        let frequency = require(
            (caps.sampling_frequencies & local.sampling_frequencies).best_preferring(
                policy.force_44100.then_some(AptxSamplingFrequency::HZ_44100),
                &SAMPLING_PRIORITY,
            ),
            CheckFlags::SAMPLING,
            &mut missing,
        );
        let channel_mode = require(
            (caps.channel_modes & local.channel_modes).best_preferring(
                policy.force_mono.then_some(AptxChannelMode::MONO),
                &CHANNEL_MODE_PRIORITY,
            ),
            CheckFlags::CHANNELS,
            &mut missing,
        );
        selection_result("APTX", missing)?;

        debug!(
            "[APTX] Selected frequency {=u8:#x}, channel mode {=u8:#x}",
            frequency.bits(),
            channel_mode.bits()
        );

        let configuration = AptxCapabilities {
            sampling_frequencies: frequency,
            channel_modes: channel_mode,
        };
        self.encode(&configuration, capabilities)?;
        Ok(())
    }

    fn check(&self, configuration: &[u8]) -> CheckFlags {
        let Ok(conf) = self.decode(configuration) else {
            return CheckFlags::SIZE;
        };
        let local = &self.capabilities;
        let mut flags = check_vendor_header(configuration, self.codec_id);

        if !conf.sampling_frequencies.is_choice_of(local.sampling_frequencies) {
            debug!(
                "[APTX] Invalid sampling frequency: {=u8:#x}",
                conf.sampling_frequencies.bits()
            );
            flags |= CheckFlags::SAMPLING;
        }
        if !conf.channel_modes.is_choice_of(local.channel_modes) {
            debug!("[APTX] Invalid channel mode: {=u8:#x}", conf.channel_modes.bits());
            flags |= CheckFlags::CHANNELS;
        }

        flags
    }
}
