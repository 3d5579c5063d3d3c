//! Length-prefixed framing over a byte stream
//!
//! Each frame is a 4-byte big-endian length followed by exactly that many
//! payload bytes. A stream may only end cleanly between frames.

use tokio::io::{AsyncRead, AsyncReadExt};
use zonebridge_common::FRAME_LENGTH_BYTES;

use crate::domain::FrameError;

/// Read the next frame payload
///
/// Returns `Ok(None)` when the peer closes the stream on a frame boundary.
///
/// # Errors
/// Returns [`FrameError::UnexpectedEof`] if the stream ends inside a frame,
/// [`FrameError::TooLarge`] if the declared length exceeds `max_frame_bytes`,
/// or the underlying I/O error.
pub async fn read_frame<R>(reader: &mut R, max_frame_bytes: usize) -> Result<Option<Vec<u8>>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut prefix = [0u8; FRAME_LENGTH_BYTES];
    let mut filled = 0;
    while filled < FRAME_LENGTH_BYTES {
        let n = reader.read(&mut prefix[filled..]).await?;
        if n == 0 {
            return if filled == 0 { Ok(None) } else { Err(FrameError::UnexpectedEof) };
        }
        filled += n;
    }

    let size = u32::from_be_bytes(prefix) as usize;
    if size > max_frame_bytes {
        return Err(FrameError::TooLarge { size, limit: max_frame_bytes });
    }

    let mut payload = vec![0u8; size];
    match reader.read_exact(&mut payload).await {
        Ok(_) => Ok(Some(payload)),
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => Err(FrameError::UnexpectedEof),
        Err(e) => Err(FrameError::Io(e)),
    }
}
