//! CLI command implementations

pub mod find;
pub mod info;
pub mod json_output;
pub mod reencode;
pub mod snap;
pub mod split;

mod common;

pub use common::{ConfigArgs, FramePosition};
