use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;

use sparkdb_common::{ConnectionError, INITIAL_BUFFER_CAPACITY, MAX_FRAME_SIZE, ProtocolError};
use sparkdb_protocol::{Frame, RequestScan};

/// Wrapper sobre o stream com buffer para ler requests e escrever replies.
pub struct Connection<S = TcpStream> {
    stream: BufWriter<S>,
    buffer: BytesMut,
    scan: RequestScan,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufWriter::new(stream),
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            scan: RequestScan::default(),
        }
    }

    /// Lê um request completo do stream. Retorna None no EOF entre requests;
    /// EOF no meio de um request é `ProtocolError::Truncated`.
    pub async fn read_request(&mut self) -> Result<Option<Frame>, ConnectionError> {
        loop {
            if let Some(frame) = self.parse_request()? {
                return Ok(Some(frame));
            }

            let n = self.stream.read_buf(&mut self.buffer).await?;
            if n == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ProtocolError::Truncated.into());
            }
        }
    }

    /// Escreve um frame no stream.
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectionError> {
        let mut buf = BytesMut::new();
        frame.encode(&mut buf);
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    fn parse_request(&mut self) -> Result<Option<Frame>, ProtocolError> {
        let mut cursor = Cursor::new(&self.buffer[..]);

        match self.scan.check(&mut cursor) {
            Ok(()) => {
                let len = cursor.position() as usize;
                cursor.set_position(0);
                let frame = Frame::parse_request(&mut cursor)?;
                self.buffer.advance(len);
                Ok(Some(frame))
            }
            Err(ProtocolError::Incomplete) if self.buffer.len() > MAX_FRAME_SIZE => {
                Err(ProtocolError::FrameTooLarge(self.buffer.len()))
            }
            Err(ProtocolError::Incomplete) => Ok(None),
            Err(e) => Err(e),
        }
    }
}
