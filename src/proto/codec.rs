//! Packet encoding and decoding for the worker protocol.
//!
//! All integers on the wire are little-endian. Incoming packets are tagged;
//! outgoing packets are positional, their type implied by the request that
//! produced them. Field bytes pass through unvalidated — UTF-8 decoding is
//! the engine boundary's concern, not the codec's.

use std::borrow::Cow;

use tokio::io::AsyncRead;

use crate::proto::framing::read_chunk;
use crate::proto::ProtocolError;

/// Incoming packet types.
///
/// The set is closed: any other 32-bit value on the wire is a protocol
/// violation and terminates the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTag {
    /// Convert a piece of source markup into a graphic.
    Conversion = 0,
    /// Dump the stylesheet accumulated since the previous dump.
    Stylesheet = 1,
    /// Close the output stream and exit cleanly.
    Shutdown = 2,
}

impl TryFrom<u32> for RequestTag {
    type Error = ProtocolError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(RequestTag::Conversion),
            1 => Ok(RequestTag::Stylesheet),
            2 => Ok(RequestTag::Shutdown),
            other => Err(ProtocolError::UnknownTag(other)),
        }
    }
}

/// Body of a conversion request.
///
/// Both fields arrive length-prefixed and are kept as raw bytes until the
/// engine boundary. The request lives for exactly one cycle: decoded from the
/// stream, handed to the engine, discarded.
#[derive(Debug, PartialEq, Eq)]
pub struct ConversionRequest {
    /// Opaque styling directive; empty means "no directive".
    pub aspect_ratio: Vec<u8>,
    /// Source markup to render.
    pub source: Vec<u8>,
}

impl ConversionRequest {
    /// The styling directive as text, if one was supplied.
    pub fn aspect_ratio_hint(&self) -> Option<Cow<'_, str>> {
        if self.aspect_ratio.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.aspect_ratio))
        }
    }

    /// The source markup as text.
    pub fn source_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.source)
    }
}

/// Read the 4-byte little-endian tag that opens every incoming packet.
///
/// # Errors
///
/// Returns `ProtocolError::UnknownTag` for values outside the closed set, and
/// `ProtocolError::Stream` if the stream ends or errors mid-read.
pub async fn read_tag<R>(reader: &mut R) -> Result<RequestTag, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    RequestTag::try_from(read_u32(reader).await?)
}

/// Decode a conversion request body from the stream.
///
/// Performs, in strict sequence: a 4-byte length read, a variable-length read
/// for the aspect-ratio directive, a 4-byte length read, a variable-length
/// read for the source markup. Lengths are unsigned and bounded only by
/// available memory; a zero length yields an empty field.
pub async fn read_conversion_request<R>(reader: &mut R) -> Result<ConversionRequest, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let aspect_ratio = read_prefixed(reader).await?;
    let source = read_prefixed(reader).await?;
    Ok(ConversionRequest {
        aspect_ratio,
        source,
    })
}

/// Frame a conversion response: u64 little-endian length, then the graphic.
///
/// The 64-bit width is deliberate. Inputs use 32-bit prefixes and the
/// asymmetry is part of the wire contract.
pub fn encode_conversion_response(graphic: &str) -> Vec<u8> {
    let bytes = graphic.as_bytes();
    let mut frame = Vec::with_capacity(8 + bytes.len());
    frame.extend_from_slice(&(bytes.len() as u64).to_le_bytes());
    frame.extend_from_slice(bytes);
    frame
}

/// Frame a stylesheet response: u32 little-endian length, then the stylesheet.
///
/// # Errors
///
/// Returns `ProtocolError::OversizedStylesheet` if the payload does not fit
/// the 32-bit length field. Never truncates.
pub fn encode_stylesheet_response(stylesheet: &str) -> Result<Vec<u8>, ProtocolError> {
    let bytes = stylesheet.as_bytes();
    let len = u32::try_from(bytes.len())
        .map_err(|_| ProtocolError::OversizedStylesheet(bytes.len()))?;
    let mut frame = Vec::with_capacity(4 + bytes.len());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(bytes);
    Ok(frame)
}

/// Read a field preceded by its own u32 little-endian length prefix.
async fn read_prefixed<R>(reader: &mut R) -> Result<Vec<u8>, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let len = read_u32(reader).await?;
    read_chunk(reader, len as usize).await
}

async fn read_u32<R>(reader: &mut R) -> Result<u32, ProtocolError>
where
    R: AsyncRead + Unpin,
{
    let bytes = read_chunk(reader, 4).await?;
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes);
    Ok(u32::from_le_bytes(raw))
}
