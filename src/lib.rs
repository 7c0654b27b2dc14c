//! Decoder for Aseprite `.ase`/`.aseprite` sprite files.
//!
//! ```no_run
//! let bytes = std::fs::read("walk.aseprite")?;
//! let sprite = aseprite_decoder::decode(&bytes, &Default::default())?;
//! for (index, frame) in sprite.frames().iter().enumerate() {
//!     println!("frame {index}: {} cels, {}ms", frame.cels.len(), frame.duration_ms);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`ase_file`] holds the raw wire layouts for callers that want to walk the
//! chunk stream themselves.

pub mod ase_file;
mod assembler;
mod compression;
mod decoder;
mod document;
mod error;

pub use decoder::{decode, DecodeOptions};
pub use document::*;
pub use error::{DecodeError, Result};
