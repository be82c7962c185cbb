use std::io::{self, Cursor, Write};

use bytes::{Buf, BytesMut};
use clap::Parser;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use sparkdb_common::{DEFAULT_HOST, DEFAULT_PORT, INITIAL_BUFFER_CAPACITY, ProtocolError};
use sparkdb_protocol::Frame;

#[derive(Parser, Debug)]
#[command(name = "sparkdb-cli", about = "SparkDB CLI client")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, short, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Comando para executar diretamente (modo não interativo)
    #[arg(trailing_var_arg = true)]
    command: Vec<String>,
}

/// Conexão do lado cliente. O buffer sobrevive entre replies.
struct Client {
    stream: TcpStream,
    buffer: BytesMut,
}

impl Client {
    async fn connect(addr: &str) -> anyhow::Result<Self> {
        Ok(Self {
            stream: TcpStream::connect(addr).await?,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        })
    }

    async fn request(&mut self, args: &[String]) -> anyhow::Result<Frame> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let mut buf = BytesMut::new();
        Frame::array_from_strs(&args).encode(&mut buf);
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> anyhow::Result<Frame> {
        loop {
            let mut cursor = Cursor::new(&self.buffer[..]);
            match Frame::check(&mut cursor) {
                Ok(()) => {
                    let len = cursor.position() as usize;
                    cursor.set_position(0);
                    let frame = Frame::parse(&mut cursor)?;
                    self.buffer.advance(len);
                    return Ok(frame);
                }
                Err(ProtocolError::Incomplete) => {}
                Err(e) => return Err(e.into()),
            }

            if self.stream.read_buf(&mut self.buffer).await? == 0 {
                anyhow::bail!("servidor fechou a conexão");
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let mut client = Client::connect(&addr).await?;

    // Modo comando único (via argumentos)
    if !args.command.is_empty() {
        let reply = client.request(&args.command).await?;
        println!("{}", format_reply(&reply));
        return Ok(());
    }

    println!("Conectado a {addr}");

    let stdin = io::stdin();
    let mut input = String::new();

    loop {
        print!("{addr}> ");
        io::stdout().flush()?;

        input.clear();
        if stdin.read_line(&mut input)? == 0 {
            break; // EOF
        }

        let line = input.trim();
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
            break;
        }

        let tokens = tokenize(line);
        if tokens.is_empty() {
            continue;
        }

        match client.request(&tokens).await {
            Ok(reply) => println!("{}", format_reply(&reply)),
            Err(e) => {
                // Erro de protocolo ou conexão fechada: a sessão não tem volta
                println!("(error) {e}");
                break;
            }
        }
    }

    Ok(())
}

/// Divide a linha em argumentos. Aspas simples ou duplas agrupam espaços;
/// dentro de aspas duplas `\n`, `\t`, `\\` e `\"` são escapes.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current: Option<String> = None;
    let mut quote: Option<char> = None;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') => {
                let escaped = match chars.next() {
                    Some('n') => '\n',
                    Some('t') => '\t',
                    Some(other) => other,
                    None => '\\',
                };
                current.get_or_insert_with(String::new).push(escaped);
            }
            (Some(_), c) => current.get_or_insert_with(String::new).push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                // `""` é um argumento vazio válido
                current.get_or_insert_with(String::new);
            }
            (None, c) if c.is_whitespace() => tokens.extend(current.take()),
            (None, c) => current.get_or_insert_with(String::new).push(c),
        }
    }

    tokens.extend(current);
    tokens
}

/// Formata um reply no estilo do redis-cli.
fn format_reply(frame: &Frame) -> String {
    match frame {
        Frame::Simple(s) => s.clone(),
        Frame::Error(s) => format!("(error) {s}"),
        Frame::Integer(n) => format!("(integer) {n}"),
        Frame::Bulk(data) => match std::str::from_utf8(data) {
            Ok(s) => format!("{s:?}"),
            Err(_) => format!("(binary) {} bytes", data.len()),
        },
        Frame::Null => "(nil)".to_string(),
        Frame::Array(items) if items.is_empty() => "(empty array)".to_string(),
        Frame::Array(items) => {
            let width = items.len().to_string().len();
            items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let nested = format_reply(item).replace('\n', &format!("\n{}", " ".repeat(width + 2)));
                    format!("{:>width$}) {nested}", i + 1)
                })
                .collect::<Vec<_>>()
                .join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn tokenize_simple() {
        assert_eq!(tokenize("SET key value"), vec!["SET", "key", "value"]);
        assert_eq!(tokenize("  LRANGE   l 0  -1 "), vec!["LRANGE", "l", "0", "-1"]);
    }

    #[test]
    fn tokenize_quoted() {
        assert_eq!(
            tokenize(r#"SET key "hello world""#),
            vec!["SET", "key", "hello world"]
        );
        assert_eq!(
            tokenize("SET key 'hello world'"),
            vec!["SET", "key", "hello world"]
        );
    }

    #[test]
    fn tokenize_escapes_and_empty_argument() {
        assert_eq!(
            tokenize(r#"ECHO "a\"b\n""#),
            vec!["ECHO".to_string(), "a\"b\n".to_string()]
        );
        assert_eq!(tokenize(r#"SET k """#), vec!["SET", "k", ""]);
    }

    #[test]
    fn tokenize_empty() {
        assert_eq!(tokenize(""), Vec::<String>::new());
        assert_eq!(tokenize("   "), Vec::<String>::new());
    }

    #[test]
    fn format_scalars() {
        assert_eq!(format_reply(&Frame::Simple("PONG".into())), "PONG");
        assert_eq!(format_reply(&Frame::Integer(42)), "(integer) 42");
        assert_eq!(format_reply(&Frame::Null), "(nil)");
        assert_eq!(format_reply(&Frame::bulk("v")), "\"v\"");
        assert_eq!(
            format_reply(&Frame::Error("ERR unknown command 'X'".into())),
            "(error) ERR unknown command 'X'"
        );
        assert_eq!(
            format_reply(&Frame::Bulk(Bytes::from_static(&[0xff]))),
            "(binary) 1 bytes"
        );
    }

    #[test]
    fn format_arrays() {
        assert_eq!(format_reply(&Frame::Array(vec![])), "(empty array)");
        assert_eq!(
            format_reply(&Frame::array_from_strs(&["a", "b"])),
            "1) \"a\"\n2) \"b\""
        );

        let ten: Vec<String> = (1..=10).map(|i| i.to_string()).collect();
        let ten: Vec<&str> = ten.iter().map(String::as_str).collect();
        let out = format_reply(&Frame::array_from_strs(&ten));
        assert!(out.starts_with(" 1) \"1\"\n"));
        assert!(out.ends_with("10) \"10\""));
    }
}
