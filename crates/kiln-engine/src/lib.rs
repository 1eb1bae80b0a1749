//! Kiln engine crate.
//!
//! Render contexts with per-context asset registries, a renderer over a pluggable
//! graphics driver, and the platform runtime that drives them.

pub mod uuid;
pub mod color;
pub mod driver;
pub mod assets;
pub mod context;
pub mod render;

pub mod input;
pub mod time;
pub mod core;
pub mod window;

pub mod logging;
