//! zoneplot library
//!
//! Parses zone-segmented numeric simulation output and renders it as
//! color-mapped multi-panel figures or animated GIF sequences.

pub mod config;
pub mod pipeline;
pub mod plot;
