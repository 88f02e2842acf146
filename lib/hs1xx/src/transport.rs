use std::net::SocketAddr;
use std::time::Duration;

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::{self, Instant};

use crate::codec::{self, Framing};
use crate::error::{ConnectFailure, Incompatible};
use crate::{Command, Error, Result};

pub const PORT: u16 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub send: Duration,
    pub receive: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            send: Duration::from_secs(2),
            receive: Duration::from_secs(5),
        }
    }
}

/// Sends `command` and closes the write side without waiting for a reply.
pub async fn send_command(addr: SocketAddr, command: &Command, timeouts: &Timeouts) -> Result<()> {
    let mut stream = connect(addr, timeouts.connect).await?;

    let result = async {
        write_frame(&mut stream, command, timeouts.send).await?;
        stream.shutdown().await?;
        Ok::<_, Incompatible>(())
    }
    .await;

    result.map_err(|cause| Error::incompatible(command, cause))
}

/// Sends `command` and returns the decoded reply payload.
pub async fn send_and_receive(
    addr: SocketAddr,
    command: &Command,
    timeouts: &Timeouts,
) -> Result<Vec<u8>> {
    let mut stream = connect(addr, timeouts.connect).await?;

    exchange(&mut stream, command, timeouts)
        .await
        .map_err(|cause| Error::incompatible(command, cause))
}

pub(crate) async fn connect(addr: SocketAddr, limit: Duration) -> Result<TcpStream> {
    match time::timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => {
            trace!("{addr} connected");
            Ok(stream)
        }
        Ok(Err(err)) => Err(Error::Connection {
            addr,
            cause: ConnectFailure::Io(err),
        }),
        Err(_) => Err(Error::Connection {
            addr,
            cause: ConnectFailure::TimedOut,
        }),
    }
}

async fn exchange<IO>(
    stream: &mut IO,
    command: &Command,
    timeouts: &Timeouts,
) -> std::result::Result<Vec<u8>, Incompatible>
where
    IO: AsyncRead + AsyncWrite + Unpin,
{
    write_frame(stream, command, timeouts.send).await?;
    let frame = read_frame(stream, timeouts.receive).await?;

    let payload = codec::decode(&frame, Framing::Stream);
    trace!(
        "{} response: {}",
        command.method(),
        String::from_utf8_lossy(&payload)
    );

    Ok(payload)
}

async fn write_frame<IO>(
    stream: &mut IO,
    command: &Command,
    limit: Duration,
) -> std::result::Result<(), Incompatible>
where
    IO: AsyncWrite + Unpin,
{
    let payload = serde_json::to_vec(command)?;
    trace!("request: {}", String::from_utf8_lossy(&payload));

    let frame = codec::encode(&payload, Framing::Stream);

    let write = async {
        stream.write_all(&frame).await?;
        stream.flush().await
    };

    match time::timeout(limit, write).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(Incompatible::SendTimeout),
    }
}

/// Reads until the peer closes the stream. The plug prefixes its reply with
/// the big-endian payload length, so a complete reply also ends the read.
async fn read_frame<IO>(
    stream: &mut IO,
    limit: Duration,
) -> std::result::Result<Vec<u8>, Incompatible>
where
    IO: AsyncRead + Unpin,
{
    let deadline = Instant::now() + limit;

    let mut frame = vec![];
    let mut chunk = [0; 1024];

    loop {
        match time::timeout_at(deadline, stream.read(&mut chunk)).await {
            Ok(Ok(0)) => break,
            Ok(Ok(read)) => {
                frame.extend_from_slice(&chunk[..read]);

                if is_complete(&frame) {
                    break;
                }
            }
            Ok(Err(err)) => return Err(err.into()),
            Err(_) if frame.is_empty() => return Err(Incompatible::ReceiveTimeout),
            Err(_) => {
                debug!("receive window elapsed with {} bytes buffered", frame.len());
                break;
            }
        }
    }

    Ok(frame)
}

fn is_complete(frame: &[u8]) -> bool {
    let header = Framing::Stream.header_len();

    match frame.get(..header) {
        Some(prefix) => {
            let mut length = [0; 4];
            length.copy_from_slice(prefix);

            let length = u32::from_be_bytes(length) as usize;
            length > 0 && frame.len() >= header + length
        }
        None => false,
    }
}
