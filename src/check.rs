//! Configuration diagnosis flags

use bitflags::bitflags;

bitflags! {
    /// Result of validating a codec configuration
    ///
    /// Every field category is checked independently and contributes its own
    /// flag, so one value can report several violations at once. An empty set
    /// means the configuration is valid.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CheckFlags: u16 {
        /// Configuration size does not match the codec
        const SIZE = 1 << 0;
        /// Sampling frequency is not exactly one supported value
        const SAMPLING = 1 << 1;
        /// Channel mode is not exactly one supported value
        const CHANNELS = 1 << 2;
        /// SBC block length is not exactly one supported value
        const BLOCK_LENGTH = 1 << 3;
        /// SBC subband count is not exactly one supported value
        const SUB_BANDS = 1 << 4;
        /// SBC allocation method is not exactly one supported value
        const ALLOCATION = 1 << 5;
        /// SBC bitpool range is empty or out of bounds
        const BITPOOL = 1 << 6;
        /// MPEG layer is not exactly one supported value
        const MPEG_LAYER = 1 << 7;
        /// AAC object type is not exactly one supported value
        const AAC_OBJECT_TYPE = 1 << 8;
        /// Bitrate is missing or not supported
        const BITRATE = 1 << 9;
        /// Vendor codec header does not name the configured codec
        const CODEC_ID = 1 << 10;
    }
}

impl CheckFlags {
    /// Valid configuration
    pub const OK: Self = Self::empty();

    /// Check if no violation was recorded
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.is_empty()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CheckFlags {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "CheckFlags({=u16:#x})", self.bits());
    }
}
