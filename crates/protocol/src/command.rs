use std::time::Duration;

use bytes::Bytes;
use sparkdb_common::CommandError;

use crate::{Frame, Parse};

/// Enum com todos os comandos suportados.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Ping,
    Echo(Bytes),
    Get(String),
    Set {
        key: String,
        value: Bytes,
        ttl: Option<Duration>,
    },
    LPush {
        key: String,
        values: Vec<Bytes>,
    },
    RPush {
        key: String,
        values: Vec<Bytes>,
    },
    /// `count` é `None` sem argumento e `Some(0)` quando o argumento
    /// não é um inteiro positivo.
    LPop {
        key: String,
        count: Option<usize>,
    },
    RPop {
        key: String,
        count: Option<usize>,
    },
    LRange {
        key: String,
        start: i64,
        stop: i64,
    },
    LLen(String),
    Unknown(String),
}

impl Command {
    /// Faz o parse de um request em um Command.
    ///
    /// Falta ou sobra de argumentos vira `WrongArity` com o nome do comando.
    pub fn from_frame(frame: Frame) -> Result<Command, CommandError> {
        let mut parse = Parse::new(frame)?;
        let name = match parse.next_string() {
            Ok(name) => name.to_uppercase(),
            Err(CommandError::MissingArgument) => {
                return Err(CommandError::InvalidArgument("request vazio".into()));
            }
            Err(e) => return Err(e),
        };

        match parse_command(&name, &mut parse) {
            Err(CommandError::MissingArgument | CommandError::ExtraArgument) => {
                Err(CommandError::WrongArity(name))
            }
            result => result,
        }
    }

    /// Nome do comando, para logs.
    pub fn name(&self) -> &str {
        match self {
            Command::Ping => "PING",
            Command::Echo(_) => "ECHO",
            Command::Get(_) => "GET",
            Command::Set { .. } => "SET",
            Command::LPush { .. } => "LPUSH",
            Command::RPush { .. } => "RPUSH",
            Command::LPop { .. } => "LPOP",
            Command::RPop { .. } => "RPOP",
            Command::LRange { .. } => "LRANGE",
            Command::LLen(_) => "LLEN",
            Command::Unknown(name) => name,
        }
    }
}

fn parse_command(name: &str, parse: &mut Parse) -> Result<Command, CommandError> {
    let cmd = match name {
        "PING" => Command::Ping,
        "ECHO" => Command::Echo(parse.next_bytes()?),
        "GET" => Command::Get(parse.next_string()?),
        "SET" => parse_set(parse)?,
        "LPUSH" | "RPUSH" => {
            let key = parse.next_string()?;
            if !parse.has_remaining() {
                return Err(CommandError::MissingArgument);
            }
            let values = parse.rest_bytes()?;
            if name == "LPUSH" {
                Command::LPush { key, values }
            } else {
                Command::RPush { key, values }
            }
        }
        "LPOP" => {
            let (key, count) = parse_pop(parse)?;
            Command::LPop { key, count }
        }
        "RPOP" => {
            let (key, count) = parse_pop(parse)?;
            Command::RPop { key, count }
        }
        "LRANGE" => {
            let key = parse.next_string()?;
            let start = parse.next_int()?;
            let stop = parse.next_int()?;
            Command::LRange { key, start, stop }
        }
        "LLEN" => Command::LLen(parse.next_string()?),
        _ => return Ok(Command::Unknown(name.to_string())),
    };

    parse.finish()?;
    Ok(cmd)
}

/// `SET key value` ou `SET key value PX|EX <n>`. Prazo `<= 0` é aceito e a
/// chave já nasce expirada.
fn parse_set(parse: &mut Parse) -> Result<Command, CommandError> {
    let key = parse.next_string()?;
    let value = parse.next_bytes()?;

    let ttl = match parse.remaining() {
        0 => None,
        2 => {
            let unit = parse.next_string()?.to_uppercase();
            let to_duration: fn(u64) -> Duration = match unit.as_str() {
                "PX" => Duration::from_millis,
                "EX" => Duration::from_secs,
                _ => return Err(CommandError::SyntaxError),
            };
            match parse.next_int() {
                Ok(n) => Some(to_duration(n.max(0) as u64)),
                Err(_) => return Err(CommandError::InvalidExpireTime),
            }
        }
        _ => return Err(CommandError::WrongArity("SET".into())),
    };

    Ok(Command::Set { key, value, ttl })
}

fn parse_pop(parse: &mut Parse) -> Result<(String, Option<usize>), CommandError> {
    let key = parse.next_string()?;
    let count = if parse.has_remaining() {
        let n = parse.next_int().ok().filter(|n| *n > 0).unwrap_or(0);
        Some(n as usize)
    } else {
        None
    };
    Ok((key, count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(args: &[&str]) -> Result<Command, CommandError> {
        Command::from_frame(Frame::array_from_strs(args))
    }

    #[test]
    fn parse_ping() {
        assert_eq!(cmd(&["PING"]).unwrap(), Command::Ping);
        assert_eq!(cmd(&["ping"]).unwrap(), Command::Ping);
        assert_eq!(
            cmd(&["PING", "hello"]),
            Err(CommandError::WrongArity("PING".into()))
        );
    }

    #[test]
    fn parse_echo() {
        assert_eq!(
            cmd(&["ECHO", "hello world"]).unwrap(),
            Command::Echo(Bytes::from("hello world"))
        );
        assert_eq!(cmd(&["ECHO"]), Err(CommandError::WrongArity("ECHO".into())));
    }

    #[test]
    fn parse_get() {
        assert_eq!(cmd(&["GET", "mykey"]).unwrap(), Command::Get("mykey".into()));
        assert_eq!(
            cmd(&["GET", "a", "b"]),
            Err(CommandError::WrongArity("GET".into()))
        );
    }

    #[test]
    fn parse_set_simple() {
        assert_eq!(
            cmd(&["SET", "key", "value"]).unwrap(),
            Command::Set {
                key: "key".into(),
                value: Bytes::from("value"),
                ttl: None,
            }
        );
    }

    #[test]
    fn parse_set_with_px_and_ex() {
        match cmd(&["SET", "key", "value", "PX", "100"]).unwrap() {
            Command::Set { ttl, .. } => assert_eq!(ttl, Some(Duration::from_millis(100))),
            other => panic!("expected Set, got {other:?}"),
        }
        match cmd(&["set", "key", "value", "ex", "10"]).unwrap() {
            Command::Set { ttl, .. } => assert_eq!(ttl, Some(Duration::from_secs(10))),
            other => panic!("expected Set, got {other:?}"),
        }
    }

    #[test]
    fn set_wrong_arity() {
        assert_eq!(cmd(&["SET", "k"]), Err(CommandError::WrongArity("SET".into())));
        assert_eq!(
            cmd(&["SET", "k", "v", "PX"]),
            Err(CommandError::WrongArity("SET".into()))
        );
        assert_eq!(
            cmd(&["SET", "k", "v", "PX", "10", "NX"]),
            Err(CommandError::WrongArity("SET".into()))
        );
    }

    #[test]
    fn set_invalid_expire_time() {
        assert_eq!(
            cmd(&["SET", "k", "v", "PX", "soon"]),
            Err(CommandError::InvalidExpireTime)
        );
        assert_eq!(
            cmd(&["SET", "k", "v", "EX", "1.5"]),
            Err(CommandError::InvalidExpireTime)
        );
    }

    #[test]
    fn set_non_positive_ttl_is_zero() {
        for (unit, n) in [("PX", "0"), ("EX", "-5"), ("px", "-1")] {
            match cmd(&["SET", "k", "v", unit, n]).unwrap() {
                Command::Set { ttl, .. } => assert_eq!(ttl, Some(Duration::ZERO)),
                other => panic!("expected Set, got {other:?}"),
            }
        }
    }

    #[test]
    fn set_unknown_option() {
        assert_eq!(
            cmd(&["SET", "k", "v", "KEEP", "10"]),
            Err(CommandError::SyntaxError)
        );
    }

    #[test]
    fn parse_lpush_rpush() {
        assert_eq!(
            cmd(&["LPUSH", "list", "a", "b"]).unwrap(),
            Command::LPush {
                key: "list".into(),
                values: vec![Bytes::from("a"), Bytes::from("b")],
            }
        );
        assert_eq!(
            cmd(&["rpush", "list", "c"]).unwrap(),
            Command::RPush {
                key: "list".into(),
                values: vec![Bytes::from("c")],
            }
        );
        assert_eq!(
            cmd(&["RPUSH", "list"]),
            Err(CommandError::WrongArity("RPUSH".into()))
        );
    }

    #[test]
    fn parse_lpop_rpop() {
        assert_eq!(
            cmd(&["LPOP", "list"]).unwrap(),
            Command::LPop {
                key: "list".into(),
                count: None,
            }
        );
        assert_eq!(
            cmd(&["RPOP", "list", "3"]).unwrap(),
            Command::RPop {
                key: "list".into(),
                count: Some(3),
            }
        );
    }

    #[test]
    fn pop_invalid_count_is_zero() {
        for bad in ["abc", "0", "-2"] {
            assert_eq!(
                cmd(&["LPOP", "list", bad]).unwrap(),
                Command::LPop {
                    key: "list".into(),
                    count: Some(0),
                }
            );
        }
    }

    #[test]
    fn parse_lrange() {
        assert_eq!(
            cmd(&["LRANGE", "list", "0", "-1"]).unwrap(),
            Command::LRange {
                key: "list".into(),
                start: 0,
                stop: -1,
            }
        );
        assert_eq!(
            cmd(&["LRANGE", "list", "zero", "-1"]),
            Err(CommandError::NotAnInteger)
        );
        assert_eq!(
            cmd(&["LRANGE", "list", "0"]),
            Err(CommandError::WrongArity("LRANGE".into()))
        );
    }

    #[test]
    fn parse_llen() {
        assert_eq!(cmd(&["LLEN", "list"]).unwrap(), Command::LLen("list".into()));
    }

    #[test]
    fn parse_unknown_command() {
        assert_eq!(
            cmd(&["foobar", "x"]).unwrap(),
            Command::Unknown("FOOBAR".into())
        );
    }

    #[test]
    fn empty_request_is_rejected() {
        assert!(matches!(
            Command::from_frame(Frame::Array(vec![])),
            Err(CommandError::InvalidArgument(_))
        ));
    }
}
