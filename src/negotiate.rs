//! Configuration Negotiation
//!
//! Entry points which run a remote capability blob through the codec of a
//! registry descriptor:
//!
//! 1. [`filter_capabilities`] narrows range fields to local support
//! 2. [`select_configuration`] picks one value per field under a policy
//! 3. [`check_configuration`] diagnoses a configuration
//!
//! All three reject blobs whose size does not match the codec.
//!
//! ```rust
//! use tunebird::{Direction, codec_id::CodecId, negotiate, policy::POLICY, registry};
//!
//! let sbc = registry::lookup(CodecId::SBC, Direction::Source).unwrap();
//! let mut caps = [0xFF, 0xFF, 2, 250];
//! negotiate::filter_capabilities(sbc, &mut caps).unwrap();
//!
//! let configuration = negotiate::select_configuration(sbc, &mut caps, &POLICY.snapshot()).unwrap();
//! assert_eq!(configuration.as_bytes(), &caps);
//! assert!(negotiate::check_configuration(sbc, &caps).is_ok());
//! ```

use crate::{
    A2dpError, Direction, check::CheckFlags, codec_id::CodecId,
    constants::MAX_CAPABILITIES_SIZE, policy::NegotiationPolicy, registry::CodecDescriptor,
};
use heapless::Vec;

/// Negotiated codec configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    codec_id: CodecId,
    direction: Direction,
    bytes: Vec<u8, MAX_CAPABILITIES_SIZE>,
}

impl Configuration {
    /// Configured codec
    #[must_use]
    pub const fn codec_id(&self) -> CodecId {
        self.codec_id
    }

    /// Direction of the local codec
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Configuration bytes, ready for AVDTP Set Configuration
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for Configuration {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

fn ensure_size(codec: &CodecDescriptor, blob: &[u8]) -> Result<(), A2dpError> {
    let expected = codec.capabilities_size();
    if blob.len() == expected {
        Ok(())
    } else {
        warn!(
            "[NEGOTIATE] Invalid capabilities size: {=usize} != {=usize}",
            blob.len(),
            expected
        );
        Err(A2dpError::InvalidLength)
    }
}

/// Narrow the range fields of remote capabilities to local support, in place
///
/// Bit set fields are never modified.
///
/// # Errors
/// Returns [`A2dpError::InvalidLength`] if the blob size does not match the codec
pub fn filter_capabilities(codec: &CodecDescriptor, capabilities: &mut [u8]) -> Result<(), A2dpError> {
    ensure_size(codec, capabilities)?;
    codec.ops().filter(capabilities)
}

/// Select a single configuration from remote capabilities
///
/// The selection is validated, then written back over `capabilities` and
/// returned. On failure the blob is left untouched.
///
/// # Errors
/// * [`A2dpError::InvalidLength`] if the blob size does not match the codec
/// * [`A2dpError::SelectionImpossible`] flagging every field without a valid choice
pub fn select_configuration(
    codec: &CodecDescriptor,
    capabilities: &mut [u8],
    policy: &NegotiationPolicy,
) -> Result<Configuration, A2dpError> {
    ensure_size(codec, capabilities)?;
    let mut bytes: Vec<u8, MAX_CAPABILITIES_SIZE> =
        Vec::from_slice(capabilities).map_err(|()| A2dpError::InvalidLength)?;

    codec.ops().select(&mut bytes, policy)?;

    let flags = codec.ops().check(&bytes);
    if !flags.is_ok() {
        warn!(
            "[NEGOTIATE] Selected configuration is invalid: {=u16:#x}",
            flags.bits()
        );
        return Err(A2dpError::SelectionImpossible(flags));
    }

    capabilities.copy_from_slice(&bytes);
    debug!(
        "[NEGOTIATE] Configuration selected for codec {=u32:#x}",
        codec.codec_id().raw()
    );
    Ok(Configuration {
        codec_id: codec.codec_id(),
        direction: codec.direction(),
        bytes,
    })
}

/// Diagnose every invalid field of a configuration
///
/// Returns [`CheckFlags::SIZE`] alone if the size does not match the codec.
#[must_use]
pub fn check_configuration(codec: &CodecDescriptor, configuration: &[u8]) -> CheckFlags {
    if ensure_size(codec, configuration).is_err() {
        return CheckFlags::SIZE;
    }
    codec.ops().check(configuration)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::aac::{AacCapabilities, AacChannels, AacObjectType, AacSamplingFrequency};
    use crate::codec::sbc::{
        SbcAllocationMethod, SbcBlockLength, SbcCapabilities, SbcChannelMode,
        SbcSamplingFrequency, SbcSubbands,
    };
    use crate::policy::QualityTier;
    use crate::registry::{
        APTX_HD_SINK, APTX_SOURCE, LDAC_SOURCE, MPEG12_SINK, MPEG24_SOURCE, SBC_SINK, SBC_SOURCE,
    };

    /// 16 | 44.1 | 48 kHz, mono | dual | stereo, 4 | 8 blocks, 4 | 8 subbands,
    /// both allocation methods, bitpool 42-255
    const SBC_REMOTE: [u8; 4] = [0xBE, 0xCF, 42, 255];

    fn sbc(bytes: &[u8]) -> SbcCapabilities {
        SbcCapabilities::decode(bytes).unwrap()
    }

    #[test]
    fn test_check_configuration() {
        let valid = SbcCapabilities {
            sampling_frequencies: SbcSamplingFrequency::HZ_44100,
            channel_modes: SbcChannelMode::STEREO,
            block_lengths: SbcBlockLength::BLOCKS_8,
            subbands: SbcSubbands::SUBBANDS_8,
            allocation_methods: SbcAllocationMethod::SNR,
            min_bitpool: 42,
            max_bitpool: 62,
        };
        let mut conf = [0u8; 4];
        valid.encode(&mut conf).unwrap();
        assert_eq!(check_configuration(&SBC_SOURCE, &conf), CheckFlags::OK);

        // 16 | 44.1 kHz, stereo | joint stereo, 8 blocks, no subbands, SNR
        let invalid = [0xA3, 0x42, 42, 62];
        assert_eq!(
            check_configuration(&SBC_SOURCE, &invalid),
            CheckFlags::SAMPLING | CheckFlags::CHANNELS | CheckFlags::SUB_BANDS
        );

        // Same with an unset bitpool range
        let invalid = [0xA3, 0x42, 0, 0];
        assert_eq!(
            check_configuration(&SBC_SOURCE, &invalid),
            CheckFlags::SAMPLING | CheckFlags::CHANNELS | CheckFlags::SUB_BANDS | CheckFlags::BITPOOL
        );

        assert_eq!(check_configuration(&SBC_SOURCE, &[0x21, 0x15, 2]), CheckFlags::SIZE);
    }

    #[test]
    fn test_check_bitpool_range() {
        assert_eq!(check_configuration(&SBC_SINK, &[0x21, 0x15, 53, 35]), CheckFlags::BITPOOL);
        assert_eq!(check_configuration(&SBC_SINK, &[0x21, 0x15, 1, 35]), CheckFlags::BITPOOL);
        assert_eq!(check_configuration(&SBC_SINK, &[0x21, 0x15, 2, 251]), CheckFlags::BITPOOL);
        assert!(check_configuration(&SBC_SINK, &[0x21, 0x15, 2, 250]).is_ok());
    }

    #[test]
    fn test_filter_capabilities() {
        // 44.1 kHz, mono | stereo, 4 | 8 blocks, 4 subbands, SNR, bitpool 42-255
        let mut caps = [0x2A, 0xCA, 42, 255];
        filter_capabilities(&SBC_SOURCE, &mut caps).unwrap();

        let filtered = sbc(&caps);
        assert_eq!(filtered.sampling_frequencies, SbcSamplingFrequency::HZ_44100);
        assert_eq!(
            filtered.channel_modes,
            SbcChannelMode::MONO | SbcChannelMode::STEREO
        );
        assert_eq!(
            filtered.block_lengths,
            SbcBlockLength::BLOCKS_4 | SbcBlockLength::BLOCKS_8
        );
        assert_eq!(filtered.subbands, SbcSubbands::SUBBANDS_4);
        assert_eq!(filtered.allocation_methods, SbcAllocationMethod::SNR);
        assert_eq!(filtered.min_bitpool, 42);
        assert_eq!(filtered.max_bitpool, 250);

        assert_eq!(
            filter_capabilities(&SBC_SOURCE, &mut [0u8; 5]),
            Err(A2dpError::InvalidLength)
        );
    }

    #[test]
    fn test_select_configuration() {
        let mut oversized = [0u8; 5];
        oversized[..4].copy_from_slice(&SBC_REMOTE);
        assert_eq!(
            select_configuration(&SBC_SOURCE, &mut oversized, &NegotiationPolicy::DEFAULT),
            Err(A2dpError::InvalidLength)
        );

        let mut caps = SBC_REMOTE;
        let conf =
            select_configuration(&SBC_SOURCE, &mut caps, &NegotiationPolicy::DEFAULT).unwrap();
        assert_eq!(conf.codec_id(), CodecId::SBC);
        assert_eq!(conf.direction(), Direction::Source);
        assert_eq!(conf.as_bytes(), &caps);

        let selected = sbc(conf.as_bytes());
        assert_eq!(selected.sampling_frequencies, SbcSamplingFrequency::HZ_48000);
        assert_eq!(selected.channel_modes, SbcChannelMode::STEREO);
        assert_eq!(selected.block_lengths, SbcBlockLength::BLOCKS_8);
        assert_eq!(selected.subbands, SbcSubbands::SUBBANDS_8);
        assert_eq!(selected.allocation_methods, SbcAllocationMethod::LOUDNESS);
        assert_eq!(selected.min_bitpool, 42);
        assert_eq!(selected.max_bitpool, 250);
        assert!(check_configuration(&SBC_SOURCE, conf.as_ref()).is_ok());
    }

    #[test]
    fn test_select_configuration_extra_quality() {
        let policy = NegotiationPolicy::DEFAULT
            .with_force_44100(true)
            .with_sbc_quality(QualityTier::ExtraQuality);
        let mut caps = SBC_REMOTE;
        select_configuration(&SBC_SOURCE, &mut caps, &policy).unwrap();

        let selected = sbc(&caps);
        assert_eq!(selected.sampling_frequencies, SbcSamplingFrequency::HZ_44100);
        assert_eq!(selected.channel_modes, SbcChannelMode::DUAL_CHANNEL);
        assert_eq!(selected.block_lengths, SbcBlockLength::BLOCKS_8);
        assert_eq!(selected.subbands, SbcSubbands::SUBBANDS_8);
        assert_eq!(selected.allocation_methods, SbcAllocationMethod::LOUDNESS);
        assert_eq!(selected.min_bitpool, 42);
        assert_eq!(selected.max_bitpool, 250);
    }

    #[test]
    fn test_select_configuration_stricter_tier() {
        let policy = NegotiationPolicy::DEFAULT
            .with_force_44100(true)
            .with_sbc_quality(QualityTier::Medium);
        let mut caps = SBC_REMOTE;
        select_configuration(&SBC_SOURCE, &mut caps, &policy).unwrap();

        let selected = sbc(&caps);
        assert_eq!(selected.sampling_frequencies, SbcSamplingFrequency::HZ_44100);
        assert_eq!(selected.channel_modes, SbcChannelMode::STEREO);
        assert_eq!(selected.min_bitpool, 42);
        assert_eq!(selected.max_bitpool, 53);
    }

    #[test]
    fn test_select_configuration_empty_bitpool_range() {
        // Mono low quality caps the bitpool below the remote minimum
        let policy = NegotiationPolicy::DEFAULT
            .with_force_mono(true)
            .with_sbc_quality(QualityTier::Low);
        let mut caps = SBC_REMOTE;
        assert_eq!(
            select_configuration(&SBC_SOURCE, &mut caps, &policy),
            Err(A2dpError::SelectionImpossible(CheckFlags::BITPOOL))
        );
        assert_eq!(caps, SBC_REMOTE);
    }

    #[test]
    fn test_select_configuration_is_deterministic() {
        let policy = NegotiationPolicy::DEFAULT.with_force_44100(true);
        let (mut a, mut b) = (SBC_REMOTE, SBC_REMOTE);
        let first = select_configuration(&SBC_SOURCE, &mut a, &policy).unwrap();
        let second = select_configuration(&SBC_SOURCE, &mut b, &policy).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_select_configuration_mpeg() {
        // Layer I | II | III, CRC, joint stereo, MPF, 44.1 | 48 kHz, VBR, every bit rate
        let mut caps = [0xF1, 0x43, 0xFF, 0xFF];
        let conf =
            select_configuration(&MPEG12_SINK, &mut caps, &NegotiationPolicy::DEFAULT).unwrap();
        assert_eq!(caps, [0x31, 0x41, 0xFF, 0xFF]);
        assert_eq!(conf.direction(), Direction::Sink);
    }

    #[test]
    fn test_select_configuration_aac() {
        let remote = AacCapabilities {
            object_types: AacObjectType::MPEG2_AAC_LC | AacObjectType::MPEG4_AAC_LC,
            sampling_frequencies: AacSamplingFrequency::all(),
            channels: AacChannels::all(),
            vbr: true,
            bitrate: 0,
        };
        let mut caps = [0u8; 6];
        remote.encode(&mut caps).unwrap();
        filter_capabilities(&MPEG24_SOURCE, &mut caps).unwrap();

        let policy = NegotiationPolicy::DEFAULT.with_aac(256_000, true);
        let conf = select_configuration(&MPEG24_SOURCE, &mut caps, &policy).unwrap();
        let selected = AacCapabilities::decode(conf.as_bytes()).unwrap();
        assert_eq!(selected.object_types, AacObjectType::MPEG4_AAC_LC);
        assert_eq!(selected.sampling_frequencies, AacSamplingFrequency::HZ_96000);
        assert_eq!(selected.channels, AacChannels::TWO);
        assert!(selected.vbr);
        assert_eq!(selected.bitrate, 256_000);
    }

    #[test]
    fn test_select_configuration_vendor() {
        let mut caps = [0u8; 11];
        APTX_HD_SINK.write_capabilities(&mut caps).unwrap();
        assert_eq!(
            select_configuration(&APTX_SOURCE, &mut caps, &NegotiationPolicy::DEFAULT),
            Err(A2dpError::InvalidLength)
        );

        let mut remote = [0x4F, 0x00, 0x00, 0x00, 0x01, 0x00, 0x22];
        let conf =
            select_configuration(&APTX_SOURCE, &mut remote, &NegotiationPolicy::DEFAULT).unwrap();
        assert_eq!(conf.codec_id(), CodecId::APTX);
        assert_eq!(remote[6], 0x22);

        let mut remote = [0x2D, 0x01, 0x00, 0x00, 0xAA, 0x00, 0x30, 0x07];
        let conf =
            select_configuration(&LDAC_SOURCE, &mut remote, &NegotiationPolicy::DEFAULT).unwrap();
        assert_eq!(conf.codec_id(), CodecId::LDAC);
        assert_eq!(remote[6..], [0x10, 0x01]);
    }
}
