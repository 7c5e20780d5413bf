//! Worker-side protocol boundary: framing primitives and packet codec.
//!
//! This module implements the binary protocol the worker speaks with the
//! program that spawned it. The caller owns the process lifetime; the worker
//! owns nothing but its two standard streams:
//!
//! ```text
//! ┌─────────────────┐        stdin / stdout        ┌─────────────────────┐
//! │  calling program │ ◄──────────────────────────► │  typesetd (worker)  │
//! │                  │   length-prefixed framing    │                     │
//! └─────────────────┘                              └─────────────────────┘
//! ```
//!
//! # Protocol
//!
//! Every incoming packet starts with a 4-byte little-endian tag. Outgoing
//! packets carry no tag: the response type is implied by the request that
//! produced it, and strict FIFO servicing keeps the pairing unambiguous.
//!
//! ```text
//! tag 0  Conversion   u32 aspectLen, aspect, u32 textLen, source
//! tag 1  Stylesheet   (no body)
//! tag 2  Shutdown     (no body)
//! ```
//!
//! Responses: a conversion answers with `u64 LE length + graphic bytes`, a
//! stylesheet request with `u32 LE length + stylesheet bytes`, a shutdown
//! with nothing at all. The 64/32-bit asymmetry between the two response
//! length fields is part of the wire contract and preserved bit-exactly.
//!
//! # Usage
//!
//! ```ignore
//! use typesetd::proto::{read_tag, read_conversion_request, RequestTag};
//!
//! let tag = read_tag(&mut reader).await?;
//! if tag == RequestTag::Conversion {
//!     let request = read_conversion_request(&mut reader).await?;
//! }
//! ```

mod codec;
mod framing;

pub use codec::{
    encode_conversion_response, encode_stylesheet_response, read_conversion_request, read_tag,
    ConversionRequest, RequestTag,
};
pub use framing::{finish, read_chunk, write_chunk};

use thiserror::Error;

/// Protocol-level error types.
///
/// Every variant is fatal: the protocol has no recovery packet, so the worker
/// terminates and the caller observes abnormal process exit.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The input stream ended before a requested byte count was satisfied,
    /// or a stream-level I/O error occurred on either direction.
    #[error("stream terminated: {0}")]
    Stream(#[source] std::io::Error),

    /// An incoming packet carried a tag outside the known set.
    #[error("unknown request tag {0}")]
    UnknownTag(u32),

    /// A read reported success but returned fewer bytes than requested.
    /// This indicates a bug in the stream layer, not a recoverable condition.
    #[error("short read: wanted {wanted} bytes, got {got}")]
    ShortRead {
        /// Bytes requested from the stream.
        wanted: usize,
        /// Bytes actually obtained.
        got: usize,
    },

    /// A stylesheet payload does not fit the 32-bit length field of its
    /// response frame.
    #[error("stylesheet of {0} bytes exceeds the u32 length field")]
    OversizedStylesheet(usize),
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        ProtocolError::Stream(err)
    }
}
