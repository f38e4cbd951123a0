//! Platform layer
//!
//! Browser bindings live in `web` (wasm32 only). Native builds run the
//! simulation headless from `main.rs` and need nothing here.

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::EchoApp;
