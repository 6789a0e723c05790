//! `Tunebird` Constants
//!
//! Limits, wire sizes and Bluetooth SIG assigned numbers used throughout the
//! negotiation engine.

/// Largest codec capability blob handled by any registered codec
pub const MAX_CAPABILITIES_SIZE: usize = 32;

/// Maximum number of registered codec descriptors
pub const MAX_CODECS: usize = 16;

/// Maximum number of stream endpoints considered in one negotiation round
pub const MAX_STREAM_ENDPOINTS: usize = 16;

/// Media codec type marking a vendor-specific codec (A2DP Sec. 4.7)
pub const VENDOR_CODEC_TYPE: u8 = 0xFF;

/// Vendor codec header length: 4-byte vendor ID followed by 2-byte codec ID
pub const VENDOR_CODEC_HEADER_LENGTH: usize = 6;

/// Lowest SBC bitpool value allowed by A2DP
pub const SBC_MIN_BITPOOL: u8 = 2;

/// Highest SBC bitpool value allowed by A2DP
pub const SBC_MAX_BITPOOL: u8 = 250;

/// Default AAC bitrate cap in bits per second
pub const AAC_DEFAULT_BITRATE: u32 = 320_000;

/// APT Licensing Ltd.
pub const APT_VENDOR_ID: u16 = 0x004F;

/// Cambridge Silicon Radio
pub const CSR_VENDOR_ID: u16 = 0x000A;

/// Qualcomm Technologies, Inc.
pub const QUALCOMM_VENDOR_ID: u16 = 0x00D7;

/// Sony Corporation
pub const SONY_VENDOR_ID: u16 = 0x012D;

/// Fraunhofer IIS
pub const FRAUNHOFER_VENDOR_ID: u16 = 0x08A9;

/// aptX codec ID (APT Licensing)
pub const APTX_CODEC_ID: u16 = 0x0001;

/// aptX HD codec ID (Qualcomm)
pub const APTX_HD_CODEC_ID: u16 = 0x0024;

/// aptX Adaptive codec ID (Qualcomm)
pub const APTX_AD_CODEC_ID: u16 = 0x00AD;

/// aptX Low Latency codec ID (CSR)
pub const APTX_LL_CODEC_ID: u16 = 0x0002;

/// FastStream codec ID (CSR)
pub const FASTSTREAM_CODEC_ID: u16 = 0x0001;

/// LC3plus codec ID (Fraunhofer)
pub const LC3PLUS_CODEC_ID: u16 = 0x0001;

/// LDAC codec ID (Sony)
pub const LDAC_CODEC_ID: u16 = 0x00AA;
