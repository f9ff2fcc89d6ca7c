//! Keep-path domain models

mod markers;

pub use markers::{KeepMarkers, KeepReport};
