//! Pipeline stages for page-to-document conversion.
//!
//! Each submodule implements one step; the orchestrator
//! ([`crate::orchestrator`]) sequences them and records progress.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract ──▶ layout ──▶ pdf | docx
//! (HTTP/     (DOM →      (headings,   (file written
//!  browser)   text)       filename)    atomically)
//! ```
//!
//! 1. [`fetch`]: load the page through a [`fetch::PageFetcher`]; the only
//!    stage with network I/O
//! 2. [`extract`]: strip noise elements, pick the content root, emit
//!    newline-structured text
//! 3. [`layout`]: classify lines, derive the artifact filename, estimate
//!    the page count
//! 4. [`render`]: write the document through [`pdf`] or [`docx`] inside
//!    `spawn_blocking`

pub mod docx;
pub mod extract;
pub mod fetch;
pub mod fonts;
pub mod layout;
pub mod pdf;
pub mod render;
