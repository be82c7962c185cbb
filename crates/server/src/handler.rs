use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;

use sparkdb_common::{ConnectionError, ProtocolError};
use sparkdb_protocol::Frame;
use sparkdb_storage::Db;

use crate::Connection;
use crate::dispatch::dispatch;

/// Loop principal de tratamento de uma conexão: um request por vez, na ordem
/// em que chegam. Termina no EOF, no shutdown ou num erro de protocolo.
pub async fn handle_connection<S>(
    mut conn: Connection<S>,
    db: Db,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<(), ConnectionError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    loop {
        let result = tokio::select! {
            result = conn.read_request() => result,
            _ = shutdown.recv() => {
                return Ok(());
            }
        };

        let frame = match result {
            Ok(Some(f)) => f,
            Ok(None) => return Ok(()), // EOF
            Err(ConnectionError::Protocol(e)) => {
                // Peer que fechou no meio do frame não lê mais nada
                if !matches!(e, ProtocolError::Truncated) {
                    let _ = conn
                        .write_frame(&Frame::Error("ERR Protocol error".into()))
                        .await;
                }
                return Err(e.into());
            }
            Err(e) => return Err(e),
        };

        // `*0`: nada a executar nem a responder
        if matches!(&frame, Frame::Array(args) if args.is_empty()) {
            continue;
        }

        let response = dispatch(frame, &db);
        conn.write_frame(&response).await?;
    }
}
