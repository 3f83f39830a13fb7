//! Balance logic shared by every median variant.
//!
//! Each variant keeps a lower half (largest value on top) and an upper half
//! (smallest value on top). The sizes reported through [`Halves`] are logical
//! sizes: for the lazy window they exclude tombstoned entries.

use crate::error::MedianError;
use crate::observation::Observation;

pub(crate) trait Halves {
    fn low_len(&self) -> usize;
    fn high_len(&self) -> usize;

    /// Moves the top of the lower half into the upper half.
    fn shift_low_to_high(&mut self);

    /// Moves the top of the upper half into the lower half.
    fn shift_high_to_low(&mut self);
}

/// Restores `high_len <= low_len <= high_len + 1`.
///
/// A removal from a window can leave either side more than one element
/// ahead, so both directions loop.
pub(crate) fn rebalance<H: Halves>(halves: &mut H) {
    while halves.low_len() > halves.high_len() + 1 {
        halves.shift_low_to_high();
    }
    while halves.high_len() > halves.low_len() {
        halves.shift_high_to_low();
    }
}

/// Reads the median from the two tops.
///
/// Callers pass logical sizes and tops that are known to be live.
pub(crate) fn median_from<T: Observation>(
    low_len: usize,
    high_len: usize,
    low_top: Option<T>,
    high_top: Option<T>,
) -> Result<f64, MedianError> {
    if low_len == 0 {
        return Err(MedianError::EmptyStructure);
    }
    let low_top = low_top.ok_or_else(|| {
        MedianError::InvariantViolation(format!(
            "lower half reports {low_len} entries but has no top"
        ))
    })?;
    if low_len > high_len {
        return Ok(low_top.to_f64());
    }
    let high_top = high_top.ok_or_else(|| {
        MedianError::InvariantViolation(format!(
            "upper half reports {high_len} entries but has no top"
        ))
    })?;
    Ok(low_top.midpoint(high_top))
}

/// Checks the size invariant between the two halves.
pub(crate) fn balance_violation(low_len: usize, high_len: usize) -> Option<MedianError> {
    if low_len > high_len + 1 || high_len > low_len {
        Some(MedianError::InvariantViolation(format!(
            "halves out of balance (low: {low_len}, high: {high_len})"
        )))
    } else {
        None
    }
}

/// Checks that the lower top does not exceed the upper top.
pub(crate) fn order_violation<T: Observation>(
    low_top: Option<T>,
    high_top: Option<T>,
) -> Option<MedianError> {
    match (low_top, high_top) {
        (Some(low), Some(high)) if low > high => Some(MedianError::InvariantViolation(format!(
            "lower half top {low:?} exceeds upper half top {high:?}"
        ))),
        _ => None,
    }
}

/// Continuing after a broken invariant would corrupt every later median.
#[cold]
#[track_caller]
pub(crate) fn invariant_violation(message: String) -> ! {
    let error = MedianError::InvariantViolation(message);
    tracing::error!(%error, "Aborting median engine operation");
    panic!("{error}");
}
