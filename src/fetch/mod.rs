// src/fetch/mod.rs
pub mod client;
pub mod render;
pub mod tables;

pub use client::{TableSource, WebTableSource};
pub use render::PageRenderer;
#[cfg(feature = "headless")]
pub use render::ChromeRenderer;
