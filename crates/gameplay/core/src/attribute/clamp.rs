//! Clamp hooks run around every attribute modification.

use super::Attribute;

/// Hook pair invoked before attribute values change.
///
/// Clamp violations are corrected in place, never rejected.
pub trait Clampable {
    /// Clamps a new current value.
    fn pre_change(&self, attribute: Attribute, value: &mut f32);

    /// Clamps a new base value. Defaults to the current-value clamp.
    fn pre_base_change(&self, attribute: Attribute, value: &mut f32) {
        self.pre_change(attribute, value);
    }
}

/// Clamps `value` into `[min, max]`, tolerating `max < min` by pinning to `min`.
pub(super) fn clamp_range(value: f32, min: f32, max: f32) -> f32 {
    if value.is_nan() {
        return min;
    }
    value.min(max).max(min)
}
