//! SBC (Sub-Band Coding) Codec
//!
//! SBC is the mandatory codec for A2DP. Capabilities layout (A2DP Sec. 4.3.2):
//!
//! - Octet 0: Sampling Frequency (b4-7), Channel Mode (b0-3)
//! - Octet 1: Block Length (b4-7), Subbands (b2-3), Allocation Method (b0-1)
//! - Octet 2: Minimum Bitpool Value
//! - Octet 3: Maximum Bitpool Value

use super::{CodecOps, require, selection_result};
use crate::{
    A2dpError,
    bitfield::FieldSet,
    check::CheckFlags,
    constants::{SBC_MAX_BITPOOL, SBC_MIN_BITPOOL},
    policy::{NegotiationPolicy, QualityTier},
};
use bitflags::bitflags;

/// SBC capabilities are 4 bytes
pub const SBC_CAPABILITIES_SIZE: usize = 4;

/// A2DP recommended middle quality bitpool, mono and dual channel
pub const SBC_BITPOOL_MQ_MONO: u8 = 19;
/// A2DP recommended middle quality bitpool, stereo and joint stereo
pub const SBC_BITPOOL_MQ_JOINT_STEREO: u8 = 35;
/// A2DP recommended high quality bitpool, mono and dual channel
pub const SBC_BITPOOL_HQ_MONO: u8 = 31;
/// A2DP recommended high quality bitpool, stereo and joint stereo
pub const SBC_BITPOOL_HQ_JOINT_STEREO: u8 = 53;

bitflags! {
    /// SBC Sampling Frequency (Octet 0; b4-7)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SbcSamplingFrequency: u8 {
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
    /// SBC Channel Mode (Octet 0; b0-3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SbcChannelMode: u8 {
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
    /// SBC Block Length (Octet 1; b4-7)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SbcBlockLength: u8 {
        /// 4 blocks
        const BLOCKS_4 = 0x08;
        /// 8 blocks
        const BLOCKS_8 = 0x04;
        /// 12 blocks
        const BLOCKS_12 = 0x02;
        /// 16 blocks
        const BLOCKS_16 = 0x01;
    }
}

bitflags! {
    /// SBC Subbands (Octet 1; b2-3)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SbcSubbands: u8 {
        /// 4 subbands
        const SUBBANDS_4 = 0x02;
        /// 8 subbands
        const SUBBANDS_8 = 0x01;
    }
}

bitflags! {
    /// SBC Allocation Method (Octet 1; b0-1)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SbcAllocationMethod: u8 {
        /// SNR allocation method
        const SNR = 0x02;
        /// Loudness allocation method
        const LOUDNESS = 0x01;
    }
}

const SAMPLING_PRIORITY: [SbcSamplingFrequency; 4] = [
    SbcSamplingFrequency::HZ_48000,
    SbcSamplingFrequency::HZ_44100,
    SbcSamplingFrequency::HZ_32000,
    SbcSamplingFrequency::HZ_16000,
];

const CHANNEL_MODE_PRIORITY: [SbcChannelMode; 4] = [
    SbcChannelMode::JOINT_STEREO,
    SbcChannelMode::STEREO,
    SbcChannelMode::DUAL_CHANNEL,
    SbcChannelMode::MONO,
];

const BLOCK_LENGTH_PRIORITY: [SbcBlockLength; 4] = [
    SbcBlockLength::BLOCKS_16,
    SbcBlockLength::BLOCKS_12,
    SbcBlockLength::BLOCKS_8,
    SbcBlockLength::BLOCKS_4,
];

const SUBBANDS_PRIORITY: [SbcSubbands; 2] = [SbcSubbands::SUBBANDS_8, SbcSubbands::SUBBANDS_4];

const ALLOCATION_PRIORITY: [SbcAllocationMethod; 2] =
    [SbcAllocationMethod::LOUDNESS, SbcAllocationMethod::SNR];

/// SBC Codec Capabilities
///
/// Either a set of acceptable values per field (capabilities) or a single
/// value per field (configuration).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SbcCapabilities {
    /// Sampling frequency support (bitfield)
    pub sampling_frequencies: SbcSamplingFrequency,
    /// Channel mode support (bitfield)
    pub channel_modes: SbcChannelMode,
    /// Block length support (bitfield)
    pub block_lengths: SbcBlockLength,
    /// Subbands support (bitfield)
    pub subbands: SbcSubbands,
    /// Allocation method support (bitfield)
    pub allocation_methods: SbcAllocationMethod,
    /// Minimum bitpool value (2-250)
    pub min_bitpool: u8,
    /// Maximum bitpool value (2-250)
    pub max_bitpool: u8,
}

impl SbcCapabilities {
    /// Every SBC feature with the full bitpool range
    #[must_use]
    pub const fn all() -> Self {
        Self {
            sampling_frequencies: SbcSamplingFrequency::all(),
            channel_modes: SbcChannelMode::all(),
            block_lengths: SbcBlockLength::all(),
            subbands: SbcSubbands::all(),
            allocation_methods: SbcAllocationMethod::all(),
            min_bitpool: SBC_MIN_BITPOOL,
            max_bitpool: SBC_MAX_BITPOOL,
        }
    }

    /// Decode SBC capabilities from bytes
    ///
    /// Reserved bits are preserved so that validation can reject them.
    ///
    /// # Errors
    /// Returns [`A2dpError::InvalidLength`] unless `bytes` is exactly 4 bytes long
    pub fn decode(bytes: &[u8]) -> Result<Self, A2dpError> {
        let &[octet0, octet1, min_bitpool, max_bitpool] = bytes else {
            return Err(A2dpError::InvalidLength);
        };
        Ok(Self {
            sampling_frequencies: SbcSamplingFrequency::from_bits_retain(octet0 >> 4),
            channel_modes: SbcChannelMode::from_bits_retain(octet0 & 0x0F),
            block_lengths: SbcBlockLength::from_bits_retain(octet1 >> 4),
            subbands: SbcSubbands::from_bits_retain((octet1 >> 2) & 0x03),
            allocation_methods: SbcAllocationMethod::from_bits_retain(octet1 & 0x03),
            min_bitpool,
            max_bitpool,
        })
    }

    /// Encode SBC capabilities to bytes
    ///
    /// # Errors
    /// Returns [`A2dpError::BufferTooSmall`] if the buffer is shorter than 4 bytes
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        if buffer.len() < SBC_CAPABILITIES_SIZE {
            return Err(A2dpError::BufferTooSmall);
        }

        buffer[0] = (self.sampling_frequencies.bits() << 4) | (self.channel_modes.bits() & 0x0F);
        buffer[1] = (self.block_lengths.bits() << 4)
            | ((self.subbands.bits() & 0x03) << 2)
            | (self.allocation_methods.bits() & 0x03);
        buffer[2] = self.min_bitpool;
        buffer[3] = self.max_bitpool;

        Ok(SBC_CAPABILITIES_SIZE)
    }
}

impl Default for SbcCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// Maximum bitpool allowed by a quality tier for the given channel mode
///
/// Mono and dual channel streams spend the bitpool on a single channel, so
/// they get the per-channel column of the A2DP recommendations.
#[must_use]
pub const fn quality_bitpool_ceiling(tier: QualityTier, channel_mode: SbcChannelMode) -> u8 {
    let per_channel = channel_mode.bits()
        & (SbcChannelMode::MONO.bits() | SbcChannelMode::DUAL_CHANNEL.bits())
        != 0;
    match tier {
        QualityTier::Low if per_channel => SBC_BITPOOL_MQ_MONO,
        QualityTier::Low => SBC_BITPOOL_MQ_JOINT_STEREO,
        QualityTier::Medium if per_channel => SBC_BITPOOL_HQ_MONO,
        QualityTier::Medium => SBC_BITPOOL_HQ_JOINT_STEREO,
        QualityTier::High | QualityTier::ExtraQuality => SBC_MAX_BITPOOL,
    }
}

/// SBC codec negotiation
#[derive(Debug)]
pub struct SbcCodec {
    capabilities: SbcCapabilities,
}

impl SbcCodec {
    /// Create an SBC codec with the given local capabilities
    #[must_use]
    pub const fn new(capabilities: SbcCapabilities) -> Self {
        Self { capabilities }
    }

    /// Locally supported capabilities
    #[must_use]
    pub const fn capabilities(&self) -> &SbcCapabilities {
        &self.capabilities
    }
}

/// Local SBC support, identical for source and sink
pub(crate) static SBC: SbcCodec = SbcCodec::new(SbcCapabilities::all());

impl CodecOps for SbcCodec {
    fn capabilities_size(&self) -> usize {
        SBC_CAPABILITIES_SIZE
    }

    fn write_capabilities(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        self.capabilities.encode(buffer)
    }

    fn filter(&self, capabilities: &mut [u8]) -> Result<(), A2dpError> {
        let mut caps = SbcCapabilities::decode(capabilities)?;
        caps.min_bitpool = caps.min_bitpool.max(self.capabilities.min_bitpool);
        caps.max_bitpool = caps.max_bitpool.min(self.capabilities.max_bitpool);
        caps.encode(capabilities)?;
        Ok(())
    }

    fn select(
        &self,
        capabilities: &mut [u8],
        policy: &NegotiationPolicy,
    ) -> Result<(), A2dpError> {
        let caps = SbcCapabilities::decode(capabilities)?;
        let local = &self.capabilities;
        let xq = policy.sbc_quality == QualityTier::ExtraQuality;
        let mut missing = CheckFlags::OK;

        let frequencies = caps.sampling_frequencies & local.sampling_frequencies;
        if xq && !frequencies.contains(SbcSamplingFrequency::HZ_44100) {
            warn!(
                "[SBC] XQ: 44.1 kHz not supported: {=u8:#x}",
                caps.sampling_frequencies.bits()
            );
        }
        let prefer_44100 = (policy.force_44100 || xq).then_some(SbcSamplingFrequency::HZ_44100);
        let frequency = require(
            frequencies.best_preferring(prefer_44100, &SAMPLING_PRIORITY),
            CheckFlags::SAMPLING,
            &mut missing,
        );

        let modes = caps.channel_modes & local.channel_modes;
        if xq && !modes.contains(SbcChannelMode::DUAL_CHANNEL) {
            warn!(
                "[SBC] XQ: Dual channel mode not supported: {=u8:#x}",
                caps.channel_modes.bits()
            );
        }
        let preferred_mode = if policy.force_mono {
            Some(SbcChannelMode::MONO)
        } else if xq {
            Some(SbcChannelMode::DUAL_CHANNEL)
        } else {
            None
        };
        let channel_mode = require(
            modes.best_preferring(preferred_mode, &CHANNEL_MODE_PRIORITY),
            CheckFlags::CHANNELS,
            &mut missing,
        );

        let block_length = require(
            (caps.block_lengths & local.block_lengths).best(&BLOCK_LENGTH_PRIORITY),
            CheckFlags::BLOCK_LENGTH,
            &mut missing,
        );
        let subbands = require(
            (caps.subbands & local.subbands).best(&SUBBANDS_PRIORITY),
            CheckFlags::SUB_BANDS,
            &mut missing,
        );
        let allocation_method = require(
            (caps.allocation_methods & local.allocation_methods).best(&ALLOCATION_PRIORITY),
            CheckFlags::ALLOCATION,
            &mut missing,
        );
        selection_result("SBC", missing)?;

        let ceiling = quality_bitpool_ceiling(policy.sbc_quality, channel_mode);
        let min_bitpool = caps.min_bitpool.max(local.min_bitpool);
        let max_bitpool = caps.max_bitpool.min(local.max_bitpool).min(ceiling);

        debug!(
            "[SBC] Selected frequency {=u8:#x}, channel mode {=u8:#x}, bitpool {=u8}-{=u8}",
            frequency.bits(),
            channel_mode.bits(),
            min_bitpool,
            max_bitpool
        );

        let configuration = SbcCapabilities {
            sampling_frequencies: frequency,
            channel_modes: channel_mode,
            block_lengths: block_length,
            subbands,
            allocation_methods: allocation_method,
            min_bitpool,
            max_bitpool,
        };
        configuration.encode(capabilities)?;
        Ok(())
    }

    fn check(&self, configuration: &[u8]) -> CheckFlags {
        let Ok(conf) = SbcCapabilities::decode(configuration) else {
            return CheckFlags::SIZE;
        };
        let local = &self.capabilities;
        let mut flags = CheckFlags::OK;

        if !conf.sampling_frequencies.is_choice_of(local.sampling_frequencies) {
            debug!(
                "[SBC] Invalid sampling frequency: {=u8:#x}",
                conf.sampling_frequencies.bits()
            );
            flags |= CheckFlags::SAMPLING;
        }
        if !conf.channel_modes.is_choice_of(local.channel_modes) {
            debug!("[SBC] Invalid channel mode: {=u8:#x}", conf.channel_modes.bits());
            flags |= CheckFlags::CHANNELS;
        }
        if !conf.block_lengths.is_choice_of(local.block_lengths) {
            debug!("[SBC] Invalid block length: {=u8:#x}", conf.block_lengths.bits());
            flags |= CheckFlags::BLOCK_LENGTH;
        }
        if !conf.subbands.is_choice_of(local.subbands) {
            debug!("[SBC] Invalid number of subbands: {=u8:#x}", conf.subbands.bits());
            flags |= CheckFlags::SUB_BANDS;
        }
        if !conf.allocation_methods.is_choice_of(local.allocation_methods) {
            debug!(
                "[SBC] Invalid allocation method: {=u8:#x}",
                conf.allocation_methods.bits()
            );
            flags |= CheckFlags::ALLOCATION;
        }
        if conf.min_bitpool > conf.max_bitpool
            || conf.min_bitpool < local.min_bitpool
            || conf.max_bitpool > local.max_bitpool
        {
            debug!(
                "[SBC] Invalid bitpool range: {=u8}-{=u8}",
                conf.min_bitpool,
                conf.max_bitpool
            );
            flags |= CheckFlags::BITPOOL;
        }

        flags
    }
}
