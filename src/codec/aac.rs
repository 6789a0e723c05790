//! MPEG-2,4 AAC Codec
//!
//! Capabilities layout (A2DP Sec. 4.5.2):
//!
//! - Octet 0: Object Type
//! - Octet 1: Sampling Frequency (high 8 bits)
//! - Octet 2: Sampling Frequency (b4-7), Channels (b2-3), RFA (b0-1)
//! - Octet 3: VBR (b7), Bit Rate (b0-6, bits 16-22)
//! - Octet 4-5: Bit Rate (bits 0-15)
//!
//! The bit rate is the maximum bit rate in bits per second. Zero means the
//! peer did not specify one.

use super::{CodecOps, require, selection_result};
use crate::{A2dpError, bitfield::FieldSet, check::CheckFlags, policy::NegotiationPolicy};
use bitflags::bitflags;

/// AAC capabilities are 6 bytes
pub const AAC_CAPABILITIES_SIZE: usize = 6;

/// Largest bit rate representable in the 23-bit field
pub const AAC_MAX_BITRATE: u32 = 0x7F_FFFF;

bitflags! {
    /// AAC Object Type (Octet 0)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AacObjectType: u8 {
        /// MPEG-2 AAC LC
        const MPEG2_AAC_LC = 0x80;
        /// MPEG-4 AAC LC
        const MPEG4_AAC_LC = 0x40;
        /// MPEG-4 AAC LTP
        const MPEG4_AAC_LTP = 0x20;
        /// MPEG-4 AAC scalable
        const MPEG4_AAC_SCA = 0x10;
    }
}

bitflags! {
    /// AAC Sampling Frequency (Octet 1 and Octet 2; b4-7)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AacSamplingFrequency: u16 {
        /// 8000 Hz
        const HZ_8000 = 0x800;
        /// 11025 Hz
        const HZ_11025 = 0x400;
        /// 12000 Hz
        const HZ_12000 = 0x200;
        /// 16000 Hz
        const HZ_16000 = 0x100;
        /// 22050 Hz
        const HZ_22050 = 0x080;
        /// 24000 Hz
        const HZ_24000 = 0x040;
        /// 32000 Hz
        const HZ_32000 = 0x020;
        /// 44100 Hz
        const HZ_44100 = 0x010;
        /// 48000 Hz
        const HZ_48000 = 0x008;
        /// 64000 Hz
        const HZ_64000 = 0x004;
        /// 88200 Hz
        const HZ_88200 = 0x002;
        /// 96000 Hz
        const HZ_96000 = 0x001;
    }
}

bitflags! {
    /// AAC Channels (Octet 2; b2-3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AacChannels: u8 {
        /// Single channel
        const ONE = 0x02;
        /// Two channels
        const TWO = 0x01;
    }
}

const OBJECT_TYPE_PRIORITY: [AacObjectType; 3] = [
    AacObjectType::MPEG4_AAC_LTP,
    AacObjectType::MPEG4_AAC_LC,
    AacObjectType::MPEG2_AAC_LC,
];

const SAMPLING_PRIORITY: [AacSamplingFrequency; 12] = [
    AacSamplingFrequency::HZ_96000,
    AacSamplingFrequency::HZ_88200,
    AacSamplingFrequency::HZ_64000,
    AacSamplingFrequency::HZ_48000,
    AacSamplingFrequency::HZ_44100,
    AacSamplingFrequency::HZ_32000,
    AacSamplingFrequency::HZ_24000,
    AacSamplingFrequency::HZ_22050,
    AacSamplingFrequency::HZ_16000,
    AacSamplingFrequency::HZ_12000,
    AacSamplingFrequency::HZ_11025,
    AacSamplingFrequency::HZ_8000,
];

const CHANNELS_PRIORITY: [AacChannels; 2] = [AacChannels::TWO, AacChannels::ONE];

/// MPEG-2,4 AAC Codec Capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AacCapabilities {
    /// Object type support (bitfield)
    pub object_types: AacObjectType,
    /// Sampling frequency support (bitfield)
    pub sampling_frequencies: AacSamplingFrequency,
    /// Channels support (bitfield)
    pub channels: AacChannels,
    /// Variable bit rate support
    pub vbr: bool,
    /// Maximum bit rate in bits per second (23 bits, 0 = unspecified)
    pub bitrate: u32,
}

impl AacCapabilities {
    /// Decode AAC capabilities from bytes
    ///
    /// # Errors
    /// Returns [`A2dpError::InvalidLength`] unless `bytes` is exactly 6 bytes long
    pub fn decode(bytes: &[u8]) -> Result<Self, A2dpError> {
        let &[octet0, octet1, octet2, octet3, octet4, octet5] = bytes else {
            return Err(A2dpError::InvalidLength);
        };
        Ok(Self {
            object_types: AacObjectType::from_bits_retain(octet0),
            sampling_frequencies: AacSamplingFrequency::from_bits_retain(
                (u16::from(octet1) << 4) | u16::from(octet2 >> 4),
            ),
            channels: AacChannels::from_bits_retain((octet2 >> 2) & 0x03),
            vbr: octet3 & 0x80 != 0,
            bitrate: u32::from_be_bytes([0, octet3 & 0x7F, octet4, octet5]),
        })
    }

    /// Encode AAC capabilities to bytes
    ///
    /// # Errors
    /// Returns [`A2dpError::BufferTooSmall`] if the buffer is shorter than 6 bytes
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        if buffer.len() < AAC_CAPABILITIES_SIZE {
            return Err(A2dpError::BufferTooSmall);
        }

        let frequencies = self.sampling_frequencies.bits() & 0x0FFF;
        let [_, bitrate_high, bitrate_mid, bitrate_low] =
            (self.bitrate & AAC_MAX_BITRATE).to_be_bytes();
        buffer[0] = self.object_types.bits();
        buffer[1] = (frequencies >> 4) as u8;
        buffer[2] = (((frequencies & 0x0F) as u8) << 4) | ((self.channels.bits() & 0x03) << 2);
        buffer[3] = (u8::from(self.vbr) << 7) | bitrate_high;
        buffer[4] = bitrate_mid;
        buffer[5] = bitrate_low;

        Ok(AAC_CAPABILITIES_SIZE)
    }
}

/// MPEG-2,4 AAC codec negotiation
#[derive(Debug)]
pub struct AacCodec {
    capabilities: AacCapabilities,
}

impl AacCodec {
    /// Create an AAC codec with the given local capabilities
    #[must_use]
    pub const fn new(capabilities: AacCapabilities) -> Self {
        Self { capabilities }
    }

    /// Remote maximum bit rate narrowed to local support
    fn filtered_bitrate(&self, remote: u32) -> u32 {
        if remote == 0 {
            self.capabilities.bitrate
        } else {
            remote.min(self.capabilities.bitrate)
        }
    }
}

/// Local AAC support, identical for source and sink
pub(crate) static AAC: AacCodec = AacCodec::new(AacCapabilities {
    object_types: AacObjectType::MPEG2_AAC_LC
        .union(AacObjectType::MPEG4_AAC_LC)
        .union(AacObjectType::MPEG4_AAC_LTP),
    sampling_frequencies: AacSamplingFrequency::all(),
    channels: AacChannels::all(),
    vbr: true,
    bitrate: AAC_MAX_BITRATE,
});

impl CodecOps for AacCodec {
    fn capabilities_size(&self) -> usize {
        AAC_CAPABILITIES_SIZE
    }

    fn write_capabilities(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        self.capabilities.encode(buffer)
    }

    fn filter(&self, capabilities: &mut [u8]) -> Result<(), A2dpError> {
        let mut caps = AacCapabilities::decode(capabilities)?;
        caps.bitrate = self.filtered_bitrate(caps.bitrate);
        caps.encode(capabilities)?;
        Ok(())
    }

    fn select(
        &self,
        capabilities: &mut [u8],
        policy: &NegotiationPolicy,
    ) -> Result<(), A2dpError> {
        let caps = AacCapabilities::decode(capabilities)?;
        let local = &self.capabilities;
        let mut missing = CheckFlags::OK;

        let object_type = require(
            (caps.object_types & local.object_types).best(&OBJECT_TYPE_PRIORITY),
            CheckFlags::AAC_OBJECT_TYPE,
            &mut missing,
        );
        let frequency = require(
            (caps.sampling_frequencies & local.sampling_frequencies).best_preferring(
                policy.force_44100.then_some(AacSamplingFrequency::HZ_44100),
                &SAMPLING_PRIORITY,
            ),
            CheckFlags::SAMPLING,
            &mut missing,
        );
        let channels = require(
            (caps.channels & local.channels).best_preferring(
                policy.force_mono.then_some(AacChannels::ONE),
                &CHANNELS_PRIORITY,
            ),
            CheckFlags::CHANNELS,
            &mut missing,
        );
        selection_result("AAC", missing)?;

        // Zero policy bit rate leaves the negotiated maximum uncapped
        let mut bitrate = self.filtered_bitrate(caps.bitrate);
        if policy.aac_bitrate != 0 {
            bitrate = bitrate.min(policy.aac_bitrate);
        }
        let vbr = caps.vbr && local.vbr && policy.aac_prefer_vbr;

        debug!(
            "[AAC] Selected object type {=u8:#x}, frequency {=u16:#x}, bit rate {=u32} (VBR: {=bool})",
            object_type.bits(),
            frequency.bits(),
            bitrate,
            vbr
        );

        let configuration = AacCapabilities {
            object_types: object_type,
            sampling_frequencies: frequency,
            channels,
            vbr,
            bitrate,
        };
        configuration.encode(capabilities)?;
        Ok(())
    }

    fn check(&self, configuration: &[u8]) -> CheckFlags {
        let Ok(conf) = AacCapabilities::decode(configuration) else {
            return CheckFlags::SIZE;
        };
        let local = &self.capabilities;
        let mut flags = CheckFlags::OK;

        if !conf.object_types.is_choice_of(local.object_types) {
            debug!("[AAC] Invalid object type: {=u8:#x}", conf.object_types.bits());
            flags |= CheckFlags::AAC_OBJECT_TYPE;
        }
        if !conf.sampling_frequencies.is_choice_of(local.sampling_frequencies) {
            debug!(
                "[AAC] Invalid sampling frequency: {=u16:#x}",
                conf.sampling_frequencies.bits()
            );
            flags |= CheckFlags::SAMPLING;
        }
        if !conf.channels.is_choice_of(local.channels) {
            debug!("[AAC] Invalid channels: {=u8:#x}", conf.channels.bits());
            flags |= CheckFlags::CHANNELS;
        }
        if conf.bitrate == 0 || conf.bitrate > local.bitrate {
            debug!("[AAC] Invalid bit rate: {=u32}", conf.bitrate);
            flags |= CheckFlags::BITRATE;
        }

        flags
    }
}
