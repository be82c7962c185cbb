use bytes::Bytes;
use sparkdb_common::CommandError;

use crate::Frame;

/// Cursor sobre os argumentos de um request para extraí-los em ordem.
pub struct Parse {
    parts: std::vec::IntoIter<Frame>,
}

impl Parse {
    /// Cria um Parse a partir de um Frame. O frame deve ser Array.
    pub fn new(frame: Frame) -> Result<Parse, CommandError> {
        match frame {
            Frame::Array(parts) => Ok(Parse {
                parts: parts.into_iter(),
            }),
            _ => Err(CommandError::InvalidArgument("esperado array".into())),
        }
    }

    /// Próximo argumento como String UTF-8 (nomes de comando e chaves).
    pub fn next_string(&mut self) -> Result<String, CommandError> {
        let data = self.next_bytes()?;
        String::from_utf8(data.to_vec())
            .map_err(|_| CommandError::InvalidArgument("string UTF-8 inválida".into()))
    }

    /// Próximo argumento como Bytes (valores).
    pub fn next_bytes(&mut self) -> Result<Bytes, CommandError> {
        match self.parts.next() {
            Some(Frame::Bulk(data)) => Ok(data),
            Some(_) => Err(CommandError::InvalidArgument("esperado bulk".into())),
            None => Err(CommandError::MissingArgument),
        }
    }

    /// Próximo argumento como i64. O argumento é consumido mesmo se inválido.
    pub fn next_int(&mut self) -> Result<i64, CommandError> {
        let data = self.next_bytes()?;
        std::str::from_utf8(&data)
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .ok_or(CommandError::NotAnInteger)
    }

    /// Consome todos os argumentos restantes como Bytes.
    pub fn rest_bytes(&mut self) -> Result<Vec<Bytes>, CommandError> {
        let mut values = Vec::with_capacity(self.remaining());
        while self.has_remaining() {
            values.push(self.next_bytes()?);
        }
        Ok(values)
    }

    /// Verifica se todos os argumentos foram consumidos.
    pub fn finish(&self) -> Result<(), CommandError> {
        if self.has_remaining() {
            Err(CommandError::ExtraArgument)
        } else {
            Ok(())
        }
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining() > 0
    }

    pub fn remaining(&self) -> usize {
        self.parts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_extracts_strings() {
        let frame = Frame::array_from_strs(&["SET", "key", "value"]);
        let mut parse = Parse::new(frame).unwrap();
        assert_eq!(parse.next_string().unwrap(), "SET");
        assert_eq!(parse.next_string().unwrap(), "key");
        assert_eq!(parse.next_bytes().unwrap(), Bytes::from("value"));
        parse.finish().unwrap();
    }

    #[test]
    fn parse_extracts_int_from_bulk() {
        let frame = Frame::array_from_strs(&["-2", "abc"]);
        let mut parse = Parse::new(frame).unwrap();
        assert_eq!(parse.next_int().unwrap(), -2);
        assert_eq!(parse.next_int(), Err(CommandError::NotAnInteger));
        assert!(!parse.has_remaining());
    }

    #[test]
    fn parse_rest_bytes() {
        let frame = Frame::array_from_strs(&["RPUSH", "l", "a", "b"]);
        let mut parse = Parse::new(frame).unwrap();
        parse.next_string().unwrap();
        parse.next_string().unwrap();
        assert_eq!(
            parse.rest_bytes().unwrap(),
            vec![Bytes::from("a"), Bytes::from("b")]
        );
        parse.finish().unwrap();
    }

    #[test]
    fn parse_not_array_fails() {
        let frame = Frame::Simple("OK".into());
        assert!(Parse::new(frame).is_err());
    }

    #[test]
    fn parse_extra_args_fails_finish() {
        let frame = Frame::array_from_strs(&["PING", "extra"]);
        let mut parse = Parse::new(frame).unwrap();
        parse.next_string().unwrap();
        assert_eq!(parse.finish(), Err(CommandError::ExtraArgument));
    }

    #[test]
    fn parse_insufficient_args() {
        let frame = Frame::array_from_strs(&["GET"]);
        let mut parse = Parse::new(frame).unwrap();
        parse.next_string().unwrap();
        assert_eq!(parse.next_string(), Err(CommandError::MissingArgument));
    }

    #[test]
    fn arguments_must_be_bulk() {
        let frame = Frame::Array(vec![Frame::Simple("GET".into()), Frame::Integer(1)]);
        let mut parse = Parse::new(frame).unwrap();
        assert!(matches!(
            parse.next_bytes(),
            Err(CommandError::InvalidArgument(_))
        ));
        assert!(matches!(
            parse.next_int(),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn parse_rejects_invalid_utf8_key() {
        let frame = Frame::Array(vec![Frame::Bulk(Bytes::from_static(&[0xff, 0xfe]))]);
        let mut parse = Parse::new(frame).unwrap();
        assert!(matches!(
            parse.next_string(),
            Err(CommandError::InvalidArgument(_))
        ));
    }
}
