use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::error::IoError;
use super::query_io::{IncompleteFrame, QueryIO, deserialize};

pub trait TRead {
    fn read_bytes(
        &mut self,
        buf: &mut BytesMut,
    ) -> impl std::future::Future<Output = Result<(), std::io::Error>> + Send;

    fn read_values(&mut self) -> impl std::future::Future<Output = anyhow::Result<Vec<QueryIO>>>;
}

pub trait TWrite {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> impl std::future::Future<Output = Result<(), IoError>> + Send;
}

impl<T: AsyncWriteExt + std::marker::Unpin + Sync + Send> TWrite for T {
    async fn write(&mut self, buf: &[u8]) -> Result<(), IoError> {
        self.write_all(buf).await.map_err(|e| Into::<IoError>::into(e.kind()))?;
        self.flush().await.map_err(|e| Into::<IoError>::into(e.kind()))
    }
}

impl<T: AsyncReadExt + std::marker::Unpin + Sync + Send> TRead for T {
    // A single read appended to the caller's buffer. TCP doesn't inherently
    // delimit messages, so the caller keeps reading until the accumulated
    // bytes deserialize into a complete frame.
    async fn read_bytes(&mut self, buffer: &mut BytesMut) -> Result<(), std::io::Error> {
        let mut temp_buffer = [0u8; 512];
        let bytes_read = self.read(&mut temp_buffer).await?;

        // Zero bytes read means the peer closed the connection.
        if bytes_read == 0 {
            return Err(std::io::Error::from(std::io::ErrorKind::ConnectionAborted));
        }

        buffer.extend_from_slice(&temp_buffer[..bytes_read]);
        Ok(())
    }

    async fn read_values(&mut self) -> anyhow::Result<Vec<QueryIO>> {
        let mut buffer = BytesMut::with_capacity(512);
        loop {
            self.read_bytes(&mut buffer).await?;

            match extract_frames(&buffer) {
                Ok(values) => return Ok(values),
                // Mid-frame: fetch more bytes and retry the parse.
                Err(e) if e.downcast_ref::<IncompleteFrame>().is_some() => continue,
                Err(e) => return Err(anyhow::anyhow!("Parsing error: {:?}", e)),
            }
        }
    }
}

fn extract_frames(buffer: &BytesMut) -> anyhow::Result<Vec<QueryIO>> {
    let mut parsed_values = Vec::new();
    let mut remaining_buffer = buffer.clone();

    while !remaining_buffer.is_empty() {
        let (query_io, consumed) = deserialize(remaining_buffer.clone())?;
        parsed_values.push(query_io);

        // * Remove the parsed portion from the buffer
        remaining_buffer = remaining_buffer.split_off(consumed);
    }
    Ok(parsed_values)
}
