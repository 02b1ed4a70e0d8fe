//! Builder-style entry points.

pub mod inspect;
