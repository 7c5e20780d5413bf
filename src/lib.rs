//! typesetd Library
//!
//! This library provides the core components of the typesetting worker:
//!
//! - `proto` - framing primitives and packet codec for the stdio protocol
//! - `engine` - rendering engine seam and the bundled glyph engine
//! - `server` - the request dispatcher loop
//!
//! # Embedding
//!
//! The worker binary wires these together over stdin/stdout, but the
//! dispatcher runs against any pair of byte streams:
//!
//! ```ignore
//! use typesetd::engine::GlyphEngine;
//! use typesetd::server;
//!
//! let mut engine = GlyphEngine::new(None);
//! server::run(&mut reader, &mut writer, &mut engine).await?;
//! ```

pub mod engine;
pub mod proto;
pub mod server;
