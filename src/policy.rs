//! Negotiation Policy
//!
//! Local preferences which steer configuration selection. The policy is
//! process-wide and may be updated at any time, so selection never reads the
//! shared store directly: callers take a [`NegotiationPolicy`] snapshot once
//! per negotiation attempt and pass it down explicitly.
//!
//! ```rust
//! use tunebird::policy::{POLICY, QualityTier};
//!
//! POLICY.update(|policy| policy.sbc_quality = QualityTier::Medium);
//! let snapshot = POLICY.snapshot();
//! assert_eq!(snapshot.sbc_quality, QualityTier::Medium);
//! ```

use crate::constants::AAC_DEFAULT_BITRATE;
use core::cell::Cell;
use embassy_sync::blocking_mutex::{Mutex, raw::CriticalSectionRawMutex};

/// SBC quality tier
///
/// Each tier caps the negotiated maximum bitpool; see
/// [`crate::codec::sbc`] for the ceiling table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QualityTier {
    /// A2DP recommended middle quality bitpool
    Low,
    /// A2DP recommended high quality bitpool
    Medium,
    /// Bitpool limited only by the codec bounds
    #[default]
    High,
    /// Dual channel at 44.1 kHz with the full bitpool per channel
    ExtraQuality,
}

/// Point-in-time view of the local negotiation preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NegotiationPolicy {
    /// Prefer 44.1 kHz whenever the peer supports it
    pub force_44100: bool,
    /// Prefer single channel audio whenever the peer supports it
    pub force_mono: bool,
    /// SBC quality tier
    pub sbc_quality: QualityTier,
    /// Use AAC variable bitrate when both sides support it
    pub aac_prefer_vbr: bool,
    /// Upper bound for the negotiated AAC bitrate (bits per second)
    pub aac_bitrate: u32,
}

impl NegotiationPolicy {
    /// Default policy: no overrides, high quality
    pub const DEFAULT: Self = Self {
        force_44100: false,
        force_mono: false,
        sbc_quality: QualityTier::High,
        aac_prefer_vbr: false,
        aac_bitrate: AAC_DEFAULT_BITRATE,
    };

    /// Set the 44.1 kHz preference
    #[must_use]
    pub const fn with_force_44100(mut self, force_44100: bool) -> Self {
        self.force_44100 = force_44100;
        self
    }

    /// Set the mono preference
    #[must_use]
    pub const fn with_force_mono(mut self, force_mono: bool) -> Self {
        self.force_mono = force_mono;
        self
    }

    /// Set the SBC quality tier
    #[must_use]
    pub const fn with_sbc_quality(mut self, sbc_quality: QualityTier) -> Self {
        self.sbc_quality = sbc_quality;
        self
    }

    /// Set the AAC bitrate cap and VBR preference
    #[must_use]
    pub const fn with_aac(mut self, bitrate: u32, prefer_vbr: bool) -> Self {
        self.aac_bitrate = bitrate;
        self.aac_prefer_vbr = prefer_vbr;
        self
    }
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Shared, updatable negotiation policy
///
/// Reads and writes copy the whole policy inside one critical section, so a
/// snapshot never mixes values from before and after an update.
pub struct PolicyStore {
    policy: Mutex<CriticalSectionRawMutex, Cell<NegotiationPolicy>>,
}

impl PolicyStore {
    /// Create a store holding `policy`
    #[must_use]
    pub const fn new(policy: NegotiationPolicy) -> Self {
        Self {
            policy: Mutex::new(Cell::new(policy)),
        }
    }

    /// Copy of the current policy
    #[must_use]
    pub fn snapshot(&self) -> NegotiationPolicy {
        self.policy.lock(Cell::get)
    }

    /// Replace the whole policy
    pub fn replace(&self, policy: NegotiationPolicy) {
        self.policy.lock(|cell| cell.set(policy));
        debug!("[POLICY] Policy replaced");
    }

    /// Modify the policy in place
    pub fn update(&self, f: impl FnOnce(&mut NegotiationPolicy)) {
        self.policy.lock(|cell| {
            let mut policy = cell.get();
            f(&mut policy);
            cell.set(policy);
        });
        debug!("[POLICY] Policy updated");
    }
}

impl Default for PolicyStore {
    fn default() -> Self {
        Self::new(NegotiationPolicy::DEFAULT)
    }
}

/// Process-wide negotiation policy
pub static POLICY: PolicyStore = PolicyStore::new(NegotiationPolicy::DEFAULT);
