//! Rendering hand-off
//!
//! The drawing surface itself lives outside the crate. Each frame it gets
//! a `DrawList` of tightly packed instances it can upload as-is.

pub mod draw_list;
pub mod instance;

pub use draw_list::DrawList;
pub use instance::{PointInstance, colors};
