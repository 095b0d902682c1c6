//! colbayes math utilities.

pub mod math;

pub use math::moments::*;
pub use math::smoothing::*;
pub use math::stable::*;
