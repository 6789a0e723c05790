//! Capability field bit sets
//!
//! Every discrete capability field is a `bitflags` type in which each flag is
//! one acceptable value. A capability blob may set several flags per field; a
//! configuration sets exactly one. [`FieldSet`] adds the operations the
//! selector and validator need on top of [`bitflags::Flags`].

use bitflags::Flags;

/// Selection and validation helpers for capability field bit sets
pub trait FieldSet: Flags + Copy {
    /// Check if exactly one known value is set
    fn is_single(&self) -> bool {
        let mut values = self.iter();
        values.next().is_some() && values.next().is_none()
    }

    /// Check if this is a single value allowed by `allowed`
    fn is_choice_of(&self, allowed: Self) -> bool {
        self.is_single() && allowed.contains(*self)
    }

    /// Pick the first value of `priority` present in this set
    fn best(&self, priority: &[Self]) -> Option<Self> {
        priority.iter().copied().find(|value| self.contains(*value))
    }

    /// Pick `preferred` if present, otherwise fall back to [`FieldSet::best`]
    fn best_preferring(&self, preferred: Option<Self>, priority: &[Self]) -> Option<Self> {
        preferred
            .filter(|value| self.contains(*value))
            .or_else(|| self.best(priority))
    }
}

impl<T: Flags + Copy> FieldSet for T {}
