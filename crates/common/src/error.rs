/// Erros de framing do protocolo. Sempre fatais para a conexão.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("frame incompleto")]
    Incomplete,
    #[error("byte de tipo inválido: {0:#x}")]
    InvalidFrameType(u8),
    #[error("inteiro inválido: {0}")]
    InvalidInteger(String),
    #[error("comprimento de bulk inválido: {0}")]
    InvalidBulkLength(i64),
    #[error("comprimento de array inválido: {0}")]
    InvalidArrayLength(i64),
    #[error("frame excede tamanho máximo ({0} bytes)")]
    FrameTooLarge(usize),
    #[error("encoding inválido: {0}")]
    InvalidEncoding(String),
    #[error("stream encerrado no meio de um frame")]
    Truncated,
}

/// Erros de validação de comandos.
///
/// O `Display` destas variantes vai para o cliente (prefixado com `ERR `),
/// por isso segue o texto do Redis.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum CommandError {
    #[error("wrong number of arguments for '{0}'")]
    WrongArity(String),
    #[error("invalid expire time")]
    InvalidExpireTime,
    #[error("syntax error")]
    SyntaxError,
    #[error("value is not an integer or out of range")]
    NotAnInteger,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Levantado pelo cursor de argumentos; convertido em `WrongArity`.
    #[error("argumentos insuficientes")]
    MissingArgument,
    /// Levantado pelo cursor de argumentos; convertido em `WrongArity`.
    #[error("argumentos extras não esperados")]
    ExtraArgument,
}

/// Erros de uma sessão de conexão.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("protocolo: {0}")]
    Protocol(#[from] ProtocolError),
}
