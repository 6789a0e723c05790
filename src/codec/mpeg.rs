//! MPEG-1,2 Audio Codec
//!
//! Capabilities layout (A2DP Sec. 4.4.2):
//!
//! - Octet 0: Layer (b5-7), CRC (b4), Channel Mode (b0-3)
//! - Octet 1: RFA (b7), MPF (b6), Sampling Frequency (b0-5)
//! - Octet 2: VBR (b7), Bit Rate Index (b0-6, high bits)
//! - Octet 3: Bit Rate Index (low bits)

use super::{CodecOps, require, selection_result};
use crate::{A2dpError, bitfield::FieldSet, check::CheckFlags, policy::NegotiationPolicy};
use bitflags::bitflags;

/// MPEG-1,2 Audio capabilities are 4 bytes
pub const MPEG_CAPABILITIES_SIZE: usize = 4;

/// Every bit rate index (free format and indices 1-14)
pub const MPEG_BITRATE_ALL: u16 = 0x7FFF;

bitflags! {
    /// MPEG Layer (Octet 0; b5-7)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MpegLayer: u8 {
        /// Layer I (mp1)
        const LAYER1 = 0x04;
        /// Layer II (mp2)
        const LAYER2 = 0x02;
        /// Layer III (mp3)
        const LAYER3 = 0x01;
    }
}

bitflags! {
    /// MPEG Channel Mode (Octet 0; b0-3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MpegChannelMode: u8 {
        /// Mono
        const MONO = 0x08;
        /// Dual Channel
        const DUAL_CHANNEL = 0x04;
        /// Stereo
        const STEREO = 0x02;
        /// Joint Stereo
        const JOINT_STEREO = 0x01;
    }
}

bitflags! {
    /// MPEG Sampling Frequency (Octet 1; b0-5)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MpegSamplingFrequency: u8 {
        /// 16000 Hz
        const HZ_16000 = 0x20;
        /// 22050 Hz
        const HZ_22050 = 0x10;
        /// 24000 Hz
        const HZ_24000 = 0x08;
        /// 32000 Hz
        const HZ_32000 = 0x04;
        /// 44100 Hz
        const HZ_44100 = 0x02;
        /// 48000 Hz
        const HZ_48000 = 0x01;
    }
}

const LAYER_PRIORITY: [MpegLayer; 3] = [MpegLayer::LAYER3, MpegLayer::LAYER2, MpegLayer::LAYER1];

const CHANNEL_MODE_PRIORITY: [MpegChannelMode; 4] = [
    MpegChannelMode::JOINT_STEREO,
    MpegChannelMode::STEREO,
    MpegChannelMode::DUAL_CHANNEL,
    MpegChannelMode::MONO,
];

const SAMPLING_PRIORITY: [MpegSamplingFrequency; 6] = [
    MpegSamplingFrequency::HZ_48000,
    MpegSamplingFrequency::HZ_44100,
    MpegSamplingFrequency::HZ_32000,
    MpegSamplingFrequency::HZ_24000,
    MpegSamplingFrequency::HZ_22050,
    MpegSamplingFrequency::HZ_16000,
];

/// MPEG-1,2 Audio Codec Capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpegCapabilities {
    /// Layer support (bitfield)
    pub layers: MpegLayer,
    /// CRC protection support
    pub crc: bool,
    /// Channel mode support (bitfield)
    pub channel_modes: MpegChannelMode,
    /// Media payload format 2 (RFC 3119) support
    pub mpf: bool,
    /// Sampling frequency support (bitfield)
    pub sampling_frequencies: MpegSamplingFrequency,
    /// Variable bit rate support
    pub vbr: bool,
    /// Bit rate index support (15-bit bitfield)
    pub bitrate: u16,
}

impl MpegCapabilities {
    /// Decode MPEG capabilities from bytes
    ///
    /// # Errors
    /// Returns [`A2dpError::InvalidLength`] unless `bytes` is exactly 4 bytes long
    pub fn decode(bytes: &[u8]) -> Result<Self, A2dpError> {
        let &[octet0, octet1, octet2, octet3] = bytes else {
            return Err(A2dpError::InvalidLength);
        };
        Ok(Self {
            layers: MpegLayer::from_bits_retain(octet0 >> 5),
            crc: octet0 & 0x10 != 0,
            channel_modes: MpegChannelMode::from_bits_retain(octet0 & 0x0F),
            mpf: octet1 & 0x40 != 0,
            sampling_frequencies: MpegSamplingFrequency::from_bits_retain(octet1 & 0x3F),
            vbr: octet2 & 0x80 != 0,
            bitrate: u16::from_be_bytes([octet2 & 0x7F, octet3]),
        })
    }

    /// Encode MPEG capabilities to bytes
    ///
    /// # Errors
    /// Returns [`A2dpError::BufferTooSmall`] if the buffer is shorter than 4 bytes
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        if buffer.len() < MPEG_CAPABILITIES_SIZE {
            return Err(A2dpError::BufferTooSmall);
        }

        let [bitrate_high, bitrate_low] = (self.bitrate & MPEG_BITRATE_ALL).to_be_bytes();
        buffer[0] = (self.layers.bits() << 5)
            | (u8::from(self.crc) << 4)
            | (self.channel_modes.bits() & 0x0F);
        buffer[1] = (u8::from(self.mpf) << 6) | (self.sampling_frequencies.bits() & 0x3F);
        buffer[2] = (u8::from(self.vbr) << 7) | bitrate_high;
        buffer[3] = bitrate_low;

        Ok(MPEG_CAPABILITIES_SIZE)
    }
}

/// MPEG-1,2 Audio codec negotiation
#[derive(Debug)]
pub struct MpegCodec {
    capabilities: MpegCapabilities,
}

impl MpegCodec {
    /// Create an MPEG codec with the given local capabilities
    #[must_use]
    pub const fn new(capabilities: MpegCapabilities) -> Self {
        Self { capabilities }
    }
}

/// Layer III encoding
pub(crate) static MPEG_SOURCE: MpegCodec = MpegCodec::new(MpegCapabilities {
    layers: MpegLayer::LAYER3,
    crc: true,
    channel_modes: MpegChannelMode::all(),
    mpf: true,
    sampling_frequencies: MpegSamplingFrequency::all(),
    vbr: true,
    bitrate: MPEG_BITRATE_ALL,
});

/// Decoding of every layer
pub(crate) static MPEG_SINK: MpegCodec = MpegCodec::new(MpegCapabilities {
    layers: MpegLayer::all(),
    crc: true,
    channel_modes: MpegChannelMode::all(),
    mpf: true,
    sampling_frequencies: MpegSamplingFrequency::all(),
    vbr: true,
    bitrate: MPEG_BITRATE_ALL,
});

impl CodecOps for MpegCodec {
    fn capabilities_size(&self) -> usize {
        MPEG_CAPABILITIES_SIZE
    }

    fn write_capabilities(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        self.capabilities.encode(buffer)
    }

    fn select(
        &self,
        capabilities: &mut [u8],
        policy: &NegotiationPolicy,
    ) -> Result<(), A2dpError> {
        let caps = MpegCapabilities::decode(capabilities)?;
        let local = &self.capabilities;
        let mut missing = CheckFlags::OK;

        let layer = require(
            (caps.layers & local.layers).best(&LAYER_PRIORITY),
            CheckFlags::MPEG_LAYER,
            &mut missing,
        );
        let channel_mode = require(
            (caps.channel_modes & local.channel_modes).best_preferring(
                policy.force_mono.then_some(MpegChannelMode::MONO),
                &CHANNEL_MODE_PRIORITY,
            ),
            CheckFlags::CHANNELS,
            &mut missing,
        );
        let frequency = require(
            (caps.sampling_frequencies & local.sampling_frequencies).best_preferring(
                policy.force_44100.then_some(MpegSamplingFrequency::HZ_44100),
                &SAMPLING_PRIORITY,
            ),
            CheckFlags::SAMPLING,
            &mut missing,
        );
        let bitrate = caps.bitrate & local.bitrate;
        if bitrate == 0 {
            missing |= CheckFlags::BITRATE;
        }
        selection_result("MPEG", missing)?;

        debug!(
            "[MPEG] Selected layer {=u8:#x}, frequency {=u8:#x}, bit rate indices {=u16:#x}",
            layer.bits(),
            frequency.bits(),
            bitrate
        );

        let configuration = MpegCapabilities {
            layers: layer,
            crc: caps.crc && local.crc,
            channel_modes: channel_mode,
            mpf: caps.mpf && local.mpf,
            sampling_frequencies: frequency,
            vbr: caps.vbr && local.vbr,
            bitrate,
        };
        configuration.encode(capabilities)?;
        Ok(())
    }

    fn check(&self, configuration: &[u8]) -> CheckFlags {
        let Ok(conf) = MpegCapabilities::decode(configuration) else {
            return CheckFlags::SIZE;
        };
        let local = &self.capabilities;
        let mut flags = CheckFlags::OK;

        if !conf.layers.is_choice_of(local.layers) {
            debug!("[MPEG] Invalid layer: {=u8:#x}", conf.layers.bits());
            flags |= CheckFlags::MPEG_LAYER;
        }
        if !conf.channel_modes.is_choice_of(local.channel_modes) {
            debug!("[MPEG] Invalid channel mode: {=u8:#x}", conf.channel_modes.bits());
            flags |= CheckFlags::CHANNELS;
        }
        if !conf.sampling_frequencies.is_choice_of(local.sampling_frequencies) {
            debug!(
                "[MPEG] Invalid sampling frequency: {=u8:#x}",
                conf.sampling_frequencies.bits()
            );
            flags |= CheckFlags::SAMPLING;
        }
        if conf.bitrate == 0 || conf.bitrate & !local.bitrate != 0 {
            debug!("[MPEG] Invalid bit rate indices: {=u16:#x}", conf.bitrate);
            flags |= CheckFlags::BITRATE;
        }

        flags
    }
}
