//! Audio Codec Support for A2DP
//!
//! Each codec implements [`CodecOps`] over its A2DP capability layout. The
//! registry pairs a direction and codec identifier with one of these
//! implementations; negotiation dispatches through the trait object.
//!
//! ## Supported codecs
//!
//! - **SBC** - mandatory A2DP codec
//! - **MPEG-1,2 Audio** - MP3
//! - **MPEG-2,4 AAC**
//! - **aptX** and **aptX HD** - Qualcomm vendor codecs
//! - **LDAC** - Sony vendor codec

pub mod aac;
pub mod aptx;
pub mod ldac;
pub mod mpeg;
pub mod sbc;

use crate::{
    A2dpError, bitfield::FieldSet, check::CheckFlags, codec_id::CodecId,
    codec_id::VendorCodecHeader, policy::NegotiationPolicy,
};

/// Codec specific negotiation operations
///
/// Callers guarantee that every blob passed in is exactly
/// [`CodecOps::capabilities_size`] bytes long.
pub trait CodecOps: Sync {
    /// Size of the codec capability blob in bytes
    fn capabilities_size(&self) -> usize;

    /// Encode the locally supported capabilities
    ///
    /// # Errors
    /// Returns [`A2dpError::BufferTooSmall`] if `buffer` cannot hold the capabilities
    fn write_capabilities(&self, buffer: &mut [u8]) -> Result<usize, A2dpError>;

    /// Narrow the range fields of remote `capabilities` to local support
    ///
    /// Bit set fields are left untouched. Codecs without range fields keep
    /// the default, which changes nothing.
    ///
    /// # Errors
    /// Returns an error if the capabilities cannot be decoded
    fn filter(&self, capabilities: &mut [u8]) -> Result<(), A2dpError> {
        let _ = capabilities;
        Ok(())
    }

    /// Reduce `capabilities` in place to a single configuration
    ///
    /// # Errors
    /// Returns [`A2dpError::SelectionImpossible`] flagging every field without
    /// a value supported by both sides
    fn select(&self, capabilities: &mut [u8], policy: &NegotiationPolicy)
    -> Result<(), A2dpError>;

    /// Diagnose every invalid field of `configuration`
    fn check(&self, configuration: &[u8]) -> CheckFlags;
}

/// Unwrap a selected field value, flagging the field when nothing was selectable
pub(crate) fn require<T: FieldSet>(value: Option<T>, flag: CheckFlags, missing: &mut CheckFlags) -> T {
    value.unwrap_or_else(|| {
        *missing |= flag;
        T::empty()
    })
}

/// Turn accumulated selection failures into a result
pub(crate) fn selection_result(codec: &str, missing: CheckFlags) -> Result<(), A2dpError> {
    if missing.is_ok() {
        Ok(())
    } else {
        warn!(
            "[{=str}] No common value for fields: {=u16:#x}",
            codec,
            missing.bits()
        );
        Err(A2dpError::SelectionImpossible(missing))
    }
}

/// Check that a vendor codec configuration carries the expected header
pub(crate) fn check_vendor_header(configuration: &[u8], codec_id: CodecId) -> CheckFlags {
    match VendorCodecHeader::parse(configuration).map(|header| header.resolve()) {
        Ok(Ok(id)) if id == codec_id => CheckFlags::OK,
        _ => CheckFlags::CODEC_ID,
    }
}
