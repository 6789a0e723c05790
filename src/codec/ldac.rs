//! LDAC Codec
//!
//! - Octet 0-5: Vendor Codec Header
//! - Octet 6: Sampling Frequency (b0-5)
//! - Octet 7: Channel Mode (b0-2)

use super::{CodecOps, check_vendor_header, require, selection_result};
use crate::{
    A2dpError, bitfield::FieldSet, check::CheckFlags, codec_id::CodecId,
    constants::VENDOR_CODEC_HEADER_LENGTH, policy::NegotiationPolicy,
};
use bitflags::bitflags;

/// LDAC capabilities are 8 bytes
pub const LDAC_CAPABILITIES_SIZE: usize = 8;

bitflags! {
    /// LDAC Sampling Frequency (Octet 6; b0-5)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LdacSamplingFrequency: u8 {
        /// 44100 Hz
        const HZ_44100 = 0x20;
        /// 48000 Hz
        const HZ_48000 = 0x10;
        /// 88200 Hz
        const HZ_88200 = 0x08;
        /// 96000 Hz
        const HZ_96000 = 0x04;
        /// 176400 Hz
        const HZ_176400 = 0x02;
        /// 192000 Hz
        const HZ_192000 = 0x01;
    }
}

bitflags! {
    /// LDAC Channel Mode (Octet 7; b0-2)
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LdacChannelMode: u8 {
        /// Mono
        const MONO = 0x04;
        /// Dual Channel
        const DUAL_CHANNEL = 0x02;
        /// Stereo
        const STEREO = 0x01;
    }
}

const SAMPLING_PRIORITY: [LdacSamplingFrequency; 4] = [
    LdacSamplingFrequency::HZ_96000,
    LdacSamplingFrequency::HZ_88200,
    LdacSamplingFrequency::HZ_48000,
    LdacSamplingFrequency::HZ_44100,
];

const CHANNEL_MODE_PRIORITY: [LdacChannelMode; 3] = [
    LdacChannelMode::STEREO,
    LdacChannelMode::DUAL_CHANNEL,
    LdacChannelMode::MONO,
];

/// LDAC Codec Capabilities (without the vendor codec header)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LdacCapabilities {
    /// Sampling frequency support (bitfield)
    pub sampling_frequencies: LdacSamplingFrequency,
    /// Channel mode support (bitfield)
    pub channel_modes: LdacChannelMode,
}

impl LdacCapabilities {
    /// Decode LDAC capabilities, including the vendor codec header
    ///
    /// The header itself is not interpreted here.
    ///
    /// # Errors
    /// Returns [`A2dpError::InvalidLength`] unless `bytes` is exactly 8 bytes long
    pub fn decode(bytes: &[u8]) -> Result<Self, A2dpError> {
        let &[_, _, _, _, _, _, frequency, channel_mode] = bytes else {
            return Err(A2dpError::InvalidLength);
        };
        Ok(Self {
            sampling_frequencies: LdacSamplingFrequency::from_bits_retain(frequency & 0x3F),
            channel_modes: LdacChannelMode::from_bits_retain(channel_mode & 0x07),
        })
    }

    /// Encode LDAC capabilities, including the vendor codec header
    ///
    /// # Errors
    /// Returns [`A2dpError::BufferTooSmall`] if the buffer is shorter than 8 bytes
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        if buffer.len() < LDAC_CAPABILITIES_SIZE {
            return Err(A2dpError::BufferTooSmall);
        }
        let header = CodecId::LDAC
            .vendor_header()
            .ok_or(A2dpError::UnsupportedVendorCodec)?;
        header.encode(buffer)?;
        buffer[VENDOR_CODEC_HEADER_LENGTH] = self.sampling_frequencies.bits();
        buffer[VENDOR_CODEC_HEADER_LENGTH + 1] = self.channel_modes.bits();
        Ok(LDAC_CAPABILITIES_SIZE)
    }
}

/// LDAC codec negotiation
#[derive(Debug)]
pub struct LdacCodec {
    capabilities: LdacCapabilities,
}

impl LdacCodec {
    /// Create an LDAC codec with the given local capabilities
    #[must_use]
    pub const fn new(capabilities: LdacCapabilities) -> Self {
        Self { capabilities }
    }
}

/// Local LDAC encoder support
pub(crate) static LDAC_SOURCE: LdacCodec = LdacCodec::new(LdacCapabilities {
    sampling_frequencies: LdacSamplingFrequency::HZ_44100
        .union(LdacSamplingFrequency::HZ_48000)
        .union(LdacSamplingFrequency::HZ_88200)
        .union(LdacSamplingFrequency::HZ_96000),
    channel_modes: LdacChannelMode::all(),
});

impl CodecOps for LdacCodec {
    fn capabilities_size(&self) -> usize {
        LDAC_CAPABILITIES_SIZE
    }

    fn write_capabilities(&self, buffer: &mut [u8]) -> Result<usize, A2dpError> {
        self.capabilities.encode(buffer)
    }

    fn select(
        &self,
        capabilities: &mut [u8],
        policy: &NegotiationPolicy,
    ) -> Result<(), A2dpError> {
        let caps = LdacCapabilities::decode(capabilities)?;
        let local = &self.capabilities;
        let mut missing = CheckFlags::OK;

        let frequency = require(
            (caps.sampling_frequencies & local.sampling_frequencies).best_preferring(
                policy.force_44100.then_some(LdacSamplingFrequency::HZ_44100),
                &SAMPLING_PRIORITY,
            ),
            CheckFlags::SAMPLING,
            &mut missing,
        );
        let channel_mode = require(
            (caps.channel_modes & local.channel_modes).best_preferring(
                policy.force_mono.then_some(LdacChannelMode::MONO),
                &CHANNEL_MODE_PRIORITY,
            ),
            CheckFlags::CHANNELS,
            &mut missing,
        );
        selection_result("LDAC", missing)?;

        debug!(
            "[LDAC] Selected frequency {=u8:#x}, channel mode {=u8:#x}",
            frequency.bits(),
            channel_mode.bits()
        );

        let configuration = LdacCapabilities {
            sampling_frequencies: frequency,
            channel_modes: channel_mode,
        };
        configuration.encode(capabilities)?;
        Ok(())
    }

    fn check(&self, configuration: &[u8]) -> CheckFlags {
        let Ok(conf) = LdacCapabilities::decode(configuration) else {
            return CheckFlags::SIZE;
        };
        let local = &self.capabilities;
        let mut flags = check_vendor_header(configuration, CodecId::LDAC);

        if !conf.sampling_frequencies.is_choice_of(local.sampling_frequencies) {
            debug!(
                "[LDAC] Invalid sampling frequency: {=u8:#x}",
                conf.sampling_frequencies.bits()
            );
            flags |= CheckFlags::SAMPLING;
        }
        if !conf.channel_modes.is_choice_of(local.channel_modes) {
            debug!("[LDAC] Invalid channel mode: {=u8:#x}", conf.channel_modes.bits());
            flags |= CheckFlags::CHANNELS;
        }

        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [u8; 6] = [0x2D, 0x01, 0x00, 0x00, 0xAA, 0x00];

    fn remote(frequency: u8, channel_mode: u8) -> [u8; 8] {
        let mut caps = [0u8; 8];
        caps[..6].copy_from_slice(&HEADER);
        caps[6] = frequency;
        caps[7] = channel_mode;
        caps
    }

    #[test]
    fn test_ldac_capabilities() {
        let mut buffer = [0u8; 8];
        assert_eq!(LDAC_SOURCE.write_capabilities(&mut buffer), Ok(8));
        assert_eq!(buffer, remote(0x3C, 0x07));
        assert_eq!(
            LDAC_SOURCE.write_capabilities(&mut buffer[..7]),
            Err(A2dpError::BufferTooSmall)
        );
    }

    #[test]
    fn test_ldac_select() {
        // Remote sink supports every rate up to 192 kHz
        let mut caps = remote(0x3F, 0x07);
        LDAC_SOURCE
            .select(&mut caps, &NegotiationPolicy::DEFAULT)
            .unwrap();
        assert_eq!(caps, remote(0x04, 0x01));
        assert!(LDAC_SOURCE.check(&caps).is_ok());

        let mut caps = remote(0x3F, 0x07);
        let policy = NegotiationPolicy::DEFAULT
            .with_force_44100(true)
            .with_force_mono(true);
        LDAC_SOURCE.select(&mut caps, &policy).unwrap();
        assert_eq!(caps, remote(0x20, 0x04));
    }

    #[test]
    fn test_ldac_select_high_rates_only() {
        let mut caps = remote(0x03, 0x01);
        assert_eq!(
            LDAC_SOURCE.select(&mut caps, &NegotiationPolicy::DEFAULT),
            Err(A2dpError::SelectionImpossible(CheckFlags::SAMPLING))
        );
    }

    #[test]
    fn test_ldac_check() {
        let mut conf = remote(0x30, 0x01);
        assert_eq!(LDAC_SOURCE.check(&conf), CheckFlags::SAMPLING);

        conf[4] = 0xAB;
        assert_eq!(
            LDAC_SOURCE.check(&conf),
            CheckFlags::SAMPLING | CheckFlags::CODEC_ID
        );
        assert_eq!(LDAC_SOURCE.check(&conf[..7]), CheckFlags::SIZE);
    }
}
