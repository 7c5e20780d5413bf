//! Request dispatcher: the worker's main loop.
//!
//! One task, one cycle at a time. The dispatcher reads a tag, services the
//! request against the engine, writes the positional response, and only then
//! reads the next tag — the K-th response is fully flushed before the
//! (K+1)-th request is touched, which is what makes the untagged response
//! stream unambiguous. A shutdown packet finalizes the output stream and
//! returns; everything else that goes wrong is fatal.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use crate::engine::{EngineError, RenderEngine};
use crate::proto::{
    encode_conversion_response, encode_stylesheet_response, finish, read_conversion_request,
    read_tag, write_chunk, ProtocolError, RequestTag,
};

/// Dispatcher-level error types.
///
/// Both variants terminate the worker: the protocol has no error packet, so
/// failures surface to the caller as abnormal process exit.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Framing, codec, or stream failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The engine rejected a request. Applied uniformly: a fully-read request
    /// either produces its response or terminates the process.
    #[error("engine failure: {0}")]
    Engine(#[from] EngineError),
}

/// Run the request loop until shutdown.
///
/// Entered once the engine has finished initializing. Returns `Ok(())` after
/// a shutdown packet has been serviced (output stream finalized, no response
/// emitted); every error is fatal and maps to a non-zero process exit.
pub async fn run<R, W, E>(reader: &mut R, writer: &mut W, engine: &mut E) -> Result<(), ServerError>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    E: RenderEngine,
{
    let mut cycles: u64 = 0;

    loop {
        let tag = read_tag(reader).await?;
        debug!(?tag, cycle = cycles + 1, "request received");

        match tag {
            RequestTag::Conversion => {
                let request = read_conversion_request(reader).await?;
                let hint = request.aspect_ratio_hint();
                let graphic = engine.render(&request.source_text(), hint.as_deref())?;
                write_chunk(writer, &encode_conversion_response(&graphic)).await?;
            }
            RequestTag::Stylesheet => {
                let stylesheet = engine.dump_stylesheet()?;
                write_chunk(writer, &encode_stylesheet_response(&stylesheet)?).await?;
            }
            RequestTag::Shutdown => {
                info!(cycles, "shutdown requested");
                finish(writer).await?;
                return Ok(());
            }
        }

        cycles += 1;
    }
}
