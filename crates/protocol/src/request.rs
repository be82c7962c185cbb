use bytes::Bytes;
use std::io::Cursor;
use sparkdb_common::{MAX_FRAME_SIZE, ProtocolError};

use crate::Frame;
use crate::frame::{get_u8, parse_decimal};

// Requests chegam como `*<n>` seguido de `n` pares de linhas: `$<len>` e o
// valor. O comprimento declarado não é usado; cada valor vai até o fim da linha.
impl Frame {
    /// Verifica se um request completo está no buffer.
    pub fn check_request(src: &mut Cursor<&[u8]>) -> Result<(), ProtocolError> {
        RequestScan::default().check(src)
    }

    /// Faz o parse de um request em `Frame::Array` de `Frame::Bulk`.
    /// Deve ser chamado apenas após `check_request()` retornar Ok.
    pub fn parse_request(src: &mut Cursor<&[u8]>) -> Result<Frame, ProtocolError> {
        let count = request_header(src)?;
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            read_line(src)?;
            let value = read_line(src)?;
            args.push(Frame::Bulk(Bytes::copy_from_slice(value)));
        }
        Ok(Frame::Array(args))
    }
}

/// Verificação retomável de um request que chega em pedaços.
///
/// Depois de um `Incomplete`, a próxima chamada continua de onde a anterior
/// parou em vez de varrer o buffer desde o início. O buffer deve crescer
/// apenas no fim e começar sempre no início do request.
#[derive(Debug, Default)]
pub struct RequestScan {
    pending: Option<Pending>,
}

#[derive(Debug)]
struct Pending {
    /// Linhas ainda sem `\n`.
    lines: usize,
    /// Primeiro byte ainda não varrido.
    pos: usize,
}

impl RequestScan {
    /// Como `Frame::check_request`. Em `Ok`, o cursor fica no fim do request
    /// e o estado é zerado para o próximo.
    pub fn check(&mut self, src: &mut Cursor<&[u8]>) -> Result<(), ProtocolError> {
        let mut pending = match self.pending.take() {
            Some(pending) => pending,
            None => {
                let count = request_header(src)?;
                Pending {
                    lines: count * 2,
                    pos: src.position() as usize,
                }
            }
        };

        let buf: &[u8] = src.get_ref();
        while pending.lines > 0 {
            match buf[pending.pos..].iter().position(|&b| b == b'\n') {
                Some(i) => {
                    pending.pos += i + 1;
                    pending.lines -= 1;
                }
                None => {
                    pending.pos = buf.len();
                    self.pending = Some(pending);
                    return Err(ProtocolError::Incomplete);
                }
            }
        }

        src.set_position(pending.pos as u64);
        Ok(())
    }
}

fn request_header(src: &mut Cursor<&[u8]>) -> Result<usize, ProtocolError> {
    match get_u8(src)? {
        b'*' => {}
        byte => return Err(ProtocolError::InvalidFrameType(byte)),
    }
    let count = parse_decimal(read_line(src)?)?;
    if count < 0 {
        return Err(ProtocolError::InvalidArrayLength(count));
    }
    if count as usize > MAX_FRAME_SIZE {
        return Err(ProtocolError::FrameTooLarge(count as usize));
    }
    Ok(count as usize)
}

/// Linha terminada por `\n`, sem o `\r` opcional antes dele.
fn read_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], ProtocolError> {
    let buf: &'a [u8] = *src.get_ref();
    let start = src.position() as usize;
    let len = buf[start..]
        .iter()
        .position(|&b| b == b'\n')
        .ok_or(ProtocolError::Incomplete)?;
    src.set_position((start + len + 1) as u64);
    let line = &buf[start..start + len];
    Ok(line.strip_suffix(b"\r").unwrap_or(line))
}
