//! Core math modules.

pub mod moments;
pub mod smoothing;
pub mod stable;
