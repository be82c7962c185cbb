use bytes::Bytes;
use tracing::debug;

use sparkdb_protocol::{Command, Frame};
use sparkdb_storage::Db;

/// Transforma um request em reply: parse do comando, execução e erros de
/// comando viram `-ERR ...` sem derrubar a conexão.
pub fn dispatch(frame: Frame, db: &Db) -> Frame {
    match Command::from_frame(frame) {
        Ok(cmd) => {
            debug!(command = cmd.name(), "comando recebido");
            execute(&cmd, db)
        }
        Err(e) => Frame::Error(format!("ERR {e}")),
    }
}

/// Executa um comando e retorna o Frame de resposta.
pub fn execute(cmd: &Command, db: &Db) -> Frame {
    match cmd {
        Command::Ping => Frame::Simple("PONG".into()),
        Command::Echo(msg) => Frame::Bulk(msg.clone()),
        Command::Get(key) => db.get(key).map_or(Frame::Null, Frame::Bulk),
        Command::Set { key, value, ttl } => {
            db.set(key.clone(), value.clone(), *ttl);
            Frame::Simple("OK".into())
        }
        Command::LPush { key, values } => Frame::Integer(db.lpush(key, values) as i64),
        Command::RPush { key, values } => Frame::Integer(db.rpush(key, values) as i64),
        Command::LPop { key, count } => pop_reply(*count, |n| db.lpop(key, n)),
        Command::RPop { key, count } => pop_reply(*count, |n| db.rpop(key, n)),
        Command::LRange { key, start, stop } => Frame::bulk_array(db.lrange(key, *start, *stop)),
        Command::LLen(key) => Frame::Integer(db.llen(key) as i64),
        Command::Unknown(name) => Frame::Error(format!("ERR unknown command '{name}'")),
    }
}

/// Um único elemento vai como bulk, vários como array, lista ausente como nulo.
/// Contagem inválida responde array vazio, sem consultar a lista.
fn pop_reply(count: Option<usize>, pop: impl FnOnce(usize) -> Option<Vec<Bytes>>) -> Frame {
    if count == Some(0) {
        return Frame::Array(vec![]);
    }
    match pop(count.unwrap_or(1)) {
        None => Frame::Null,
        Some(mut items) if items.len() == 1 => Frame::Bulk(items.swap_remove(0)),
        Some(items) => Frame::bulk_array(items),
    }
}
