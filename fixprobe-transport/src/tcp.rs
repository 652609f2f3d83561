/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! TCP connect and accept helpers.
//!
//! Both sides end up with a [`FixReader`]/[`FixWriter`] pair so that reading
//! and writing can proceed from different tasks.

use crate::codec::FixCodec;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::debug;

/// Framed read half of a FIX connection.
pub type FixReader = FramedRead<OwnedReadHalf, FixCodec>;

/// Framed write half of a FIX connection.
pub type FixWriter = FramedWrite<OwnedWriteHalf, FixCodec>;

/// Splits a connected stream into framed halves.
///
/// # Arguments
/// * `stream` - The connected socket
/// * `codec` - Framing settings shared by both halves
#[must_use]
pub fn split(stream: TcpStream, codec: FixCodec) -> (FixReader, FixWriter) {
    let (read, write) = stream.into_split();
    (
        FramedRead::new(read, codec.clone()),
        FramedWrite::new(write, codec),
    )
}

/// Connects to a FIX acceptor.
///
/// # Errors
/// Returns an I/O error if the connection fails or does not complete within `timeout`.
pub async fn connect<A: ToSocketAddrs>(addr: A, timeout: Duration) -> std::io::Result<TcpStream> {
    let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out"))??;
    stream.set_nodelay(true)?;
    debug!(peer = ?stream.peer_addr().ok(), "connected");
    Ok(stream)
}

/// Accepts one connection from a listener.
///
/// # Errors
/// Returns an I/O error if accepting fails.
pub async fn accept(listener: &TcpListener) -> std::io::Result<(TcpStream, SocketAddr)> {
    let (stream, peer) = listener.accept().await?;
    stream.set_nodelay(true)?;
    debug!(%peer, "accepted");
    Ok((stream, peer))
}
