//! Convenience operations for the built-in value kinds.
//!
//! Numbers and integers get [`NumberExt`] and [`IntegerExt`], strings get
//! [`StrExt`], slices and vectors get [`SliceExt`], [`NumericSliceExt`],
//! [`ValuesExt`] and [`VecExt`], and ordered string-keyed objects are modelled by
//! [`ObjectMap`].

mod array;
mod function;
mod number;
mod object;
mod random;
mod string;

pub use array::{NumericSliceExt, SliceExt, ValuesExt, VecExt};
pub use function::{curry, least_fixed_point, memoize};
pub use number::{IntegerExt, NumberExt, choose_exact, factorial_exact, fibonacci, gcd};
pub use object::ObjectMap;
pub use random::Rng;
pub use string::StrExt;
