use std::fmt::Debug;
use std::hash::Hash;

use ordered_float::OrderedFloat;

/// A value the engine can order, hash and average.
///
/// `Ord` drives the heaps, `Hash` keys the pending-removal map of the lazy
/// window, and `to_f64` / `midpoint` produce the median itself.
pub trait Observation: Copy + Ord + Hash + Debug {
    /// Nearest `f64`. Integers wider than 53 bits of magnitude are rounded.
    fn to_f64(self) -> f64;

    /// Mean of two values, rounded to `f64` only once.
    fn midpoint(self, other: Self) -> f64 {
        (self.to_f64() + other.to_f64()) / 2.0
    }
}

macro_rules! impl_observation_for_ints {
    ($($t:ty),*) => {
        $(
            impl Observation for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }

                /// Averages in the integer domain so neither operand is rounded first.
                #[inline]
                fn midpoint(self, other: Self) -> f64 {
                    let floor = (self & other) + ((self ^ other) >> 1);
                    let half = if (self ^ other) & 1 == 0 { 0.0 } else { 0.5 };
                    floor as f64 + half
                }
            }
        )*
    };
}

impl_observation_for_ints!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Observation for OrderedFloat<f64> {
    #[inline]
    fn to_f64(self) -> f64 {
        self.into_inner()
    }
}

impl Observation for OrderedFloat<f32> {
    #[inline]
    fn to_f64(self) -> f64 {
        self.into_inner() as f64
    }
}
