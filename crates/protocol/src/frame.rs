use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::Cursor;
use sparkdb_common::{MAX_FRAME_SIZE, ProtocolError};

/// Um frame do protocolo: request decodificado ou reply a ser enviado.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Simple(String),
    Error(String),
    Integer(i64),
    Bulk(Bytes),
    Null,
    Array(Vec<Frame>),
}

impl Frame {
    /// Verifica se um reply completo está no buffer, sem alocar.
    /// Usado pelo lado cliente (CLI e testes) para ler respostas do servidor.
    pub fn check(src: &mut Cursor<&[u8]>) -> Result<(), ProtocolError> {
        match get_u8(src)? {
            b'+' | b'-' | b':' => get_line(src).map(|_| ()),
            b'$' => match bulk_len(src)? {
                Some(len) => skip(src, len + 2),
                None => Ok(()),
            },
            b'*' => {
                let count = get_decimal(src)?;
                if count < 0 {
                    return Err(ProtocolError::InvalidArrayLength(count));
                }
                for _ in 0..count {
                    Frame::check(src)?;
                }
                Ok(())
            }
            byte => Err(ProtocolError::InvalidFrameType(byte)),
        }
    }

    /// Faz o parse de um reply completo. Chamar só depois de `check()`.
    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Frame, ProtocolError> {
        match get_u8(src)? {
            b'+' => get_text(src).map(Frame::Simple),
            b'-' => get_text(src).map(Frame::Error),
            b':' => get_decimal(src).map(Frame::Integer),
            b'$' => {
                let Some(len) = bulk_len(src)? else {
                    return Ok(Frame::Null);
                };
                if src.remaining() < len + 2 {
                    return Err(ProtocolError::Incomplete);
                }
                let data = src.copy_to_bytes(len);
                src.advance(2);
                Ok(Frame::Bulk(data))
            }
            b'*' => {
                let count = get_decimal(src)?;
                if count < 0 {
                    return Err(ProtocolError::InvalidArrayLength(count));
                }
                (0..count)
                    .map(|_| Frame::parse(src))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Frame::Array)
            }
            byte => Err(ProtocolError::InvalidFrameType(byte)),
        }
    }

    /// Serializa o frame no buffer de saída.
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Frame::Simple(s) => put_line(dst, b'+', s.as_bytes()),
            Frame::Error(s) => put_line(dst, b'-', s.as_bytes()),
            Frame::Integer(n) => put_line(dst, b':', n.to_string().as_bytes()),
            Frame::Bulk(data) => {
                put_line(dst, b'$', data.len().to_string().as_bytes());
                dst.put_slice(data);
                dst.put_slice(b"\r\n");
            }
            Frame::Null => dst.put_slice(b"$-1\r\n"),
            Frame::Array(items) => {
                put_line(dst, b'*', items.len().to_string().as_bytes());
                for item in items {
                    item.encode(dst);
                }
            }
        }
    }

    /// Helper: cria um Frame::Bulk a partir de &str.
    pub fn bulk(s: &str) -> Frame {
        Frame::Bulk(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Helper: cria um Array de Bulk strings a partir de &[&str].
    pub fn array_from_strs(strs: &[&str]) -> Frame {
        Frame::Array(strs.iter().map(|s| Frame::bulk(s)).collect())
    }

    /// Helper: Array de Bulk a partir dos valores guardados no store.
    pub fn bulk_array(values: Vec<Bytes>) -> Frame {
        Frame::Array(values.into_iter().map(Frame::Bulk).collect())
    }
}

fn put_line(dst: &mut BytesMut, prefix: u8, body: &[u8]) {
    dst.put_u8(prefix);
    dst.put_slice(body);
    dst.put_slice(b"\r\n");
}

pub(crate) fn get_u8(src: &mut Cursor<&[u8]>) -> Result<u8, ProtocolError> {
    if !src.has_remaining() {
        return Err(ProtocolError::Incomplete);
    }
    Ok(src.get_u8())
}

/// Linha terminada estritamente por `\r\n` (formato dos replies).
fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], ProtocolError> {
    let buf: &'a [u8] = *src.get_ref();
    let start = src.position() as usize;
    let pos = buf[start..]
        .windows(2)
        .position(|w| w == b"\r\n")
        .ok_or(ProtocolError::Incomplete)?;
    src.set_position((start + pos + 2) as u64);
    Ok(&buf[start..start + pos])
}

fn get_text(src: &mut Cursor<&[u8]>) -> Result<String, ProtocolError> {
    let line = get_line(src)?;
    String::from_utf8(line.to_vec()).map_err(|e| ProtocolError::InvalidEncoding(e.to_string()))
}

pub(crate) fn get_decimal(src: &mut Cursor<&[u8]>) -> Result<i64, ProtocolError> {
    parse_decimal(get_line(src)?)
}

pub(crate) fn parse_decimal(line: &[u8]) -> Result<i64, ProtocolError> {
    let s = std::str::from_utf8(line).map_err(|e| ProtocolError::InvalidInteger(e.to_string()))?;
    s.parse::<i64>()
        .map_err(|e| ProtocolError::InvalidInteger(format!("'{s}': {e}")))
}

/// Comprimento de um bulk; `None` para o bulk nulo (`$-1`).
fn bulk_len(src: &mut Cursor<&[u8]>) -> Result<Option<usize>, ProtocolError> {
    match get_decimal(src)? {
        -1 => Ok(None),
        len if len < 0 => Err(ProtocolError::InvalidBulkLength(len)),
        len if len as usize > MAX_FRAME_SIZE => Err(ProtocolError::FrameTooLarge(len as usize)),
        len => Ok(Some(len as usize)),
    }
}

fn skip(src: &mut Cursor<&[u8]>, n: usize) -> Result<(), ProtocolError> {
    if src.remaining() < n {
        return Err(ProtocolError::Incomplete);
    }
    src.advance(n);
    Ok(())
}
