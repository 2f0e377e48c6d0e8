//! Framed message I/O over any async byte stream.

use crate::domain::wire::{
    build_version_payload, decode_header, encode_frame, parse_version, verify_payload, Command,
    VersionInfo, WireMessage, HEADER_LEN,
};
use crate::domain::WireError;
use chrono::Utc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// Read one message, verifying magic, size and checksum.
///
/// # Errors
///
/// I/O failure or malformed frame.
pub async fn read_message<R: AsyncRead + Unpin>(
    reader: &mut R,
    magic: [u8; 4],
) -> Result<WireMessage, WireError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;
    let header = decode_header(magic, &header)?;
    let mut payload = vec![0u8; header.length];
    reader.read_exact(&mut payload).await?;
    verify_payload(&header, &payload)?;
    trace!(command = header.command.as_str(), len = header.length, "Message received");
    Ok(WireMessage::new(header.command, payload))
}

/// Write one message.
///
/// # Errors
///
/// I/O failure.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    magic: [u8; 4],
    message: &WireMessage,
) -> Result<(), WireError> {
    let frame = encode_frame(magic, message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    trace!(command = message.command.as_str(), len = message.payload.len(), "Message sent");
    Ok(())
}

/// Exchange `version` / `verack`, answering pings on the way.
///
/// # Errors
///
/// I/O failure or malformed frame before the handshake completes.
pub async fn handshake<S: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut S,
    magic: [u8; 4],
) -> Result<VersionInfo, WireError> {
    let version = build_version_payload(rand::random(), Utc::now().timestamp(), true);
    write_message(stream, magic, &WireMessage::new(Command::Version, version)).await?;

    let mut remote = None;
    let mut got_verack = false;
    while remote.is_none() || !got_verack {
        let message = read_message(stream, magic).await?;
        match message.command {
            Command::Version => {
                remote = Some(parse_version(&message.payload)?);
                write_message(stream, magic, &WireMessage::empty(Command::Verack)).await?;
            }
            Command::Verack => got_verack = true,
            Command::Ping => {
                write_message(stream, magic, &WireMessage::new(Command::Pong, message.payload))
                    .await?;
            }
            _ => {}
        }
    }

    remote.ok_or(WireError::UnexpectedEof { field: "version" })
}
