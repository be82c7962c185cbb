use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::{Semaphore, broadcast};
use tokio::time::Duration;
use tracing::{error, info, warn};

use sparkdb_common::{
    ConnectionError, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SWEEP_INTERVAL_MS, MAX_CONNECTIONS,
};
use sparkdb_server::{Connection, handle_connection};
use sparkdb_storage::{Db, ExpirySweeper};

#[derive(Parser, Debug)]
#[command(name = "sparkdb-server", about = "SparkDB in-memory key/value and list store server")]
struct Args {
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long, default_value_t = MAX_CONNECTIONS)]
    max_connections: usize,
    /// Intervalo entre ciclos do sweeper de expiração, em milissegundos
    #[arg(
        long,
        default_value_t = DEFAULT_SWEEP_INTERVAL_MS,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    sweep_interval_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sparkdb_server=info,sparkdb_storage=info".into()),
        )
        .init();

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);

    let db = Db::new();
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let sweeper = ExpirySweeper::new(db.clone(), Duration::from_millis(args.sweep_interval_ms))
        .spawn(shutdown_tx.subscribe());

    let listener = TcpListener::bind(&addr).await?;
    info!("SparkDB escutando em {addr}");

    let semaphore = Arc::new(Semaphore::new(args.max_connections));

    loop {
        let permit = tokio::select! {
            permit = semaphore.clone().acquire_owned() => permit?,
            _ = signal::ctrl_c() => break,
        };

        let (socket, peer) = tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok(v) => v,
                    Err(e) => {
                        error!("erro ao aceitar conexão: {e}");
                        continue;
                    }
                }
            }
            _ = signal::ctrl_c() => break,
        };

        info!("nova conexão: {peer}");
        let db = db.clone();
        let mut shutdown_rx = shutdown_tx.subscribe();

        tokio::spawn(async move {
            let conn = Connection::new(socket);
            match handle_connection(conn, db, &mut shutdown_rx).await {
                Ok(()) => {}
                Err(ConnectionError::Protocol(e)) => warn!("erro de protocolo em {peer}: {e}"),
                Err(e) => error!("erro na conexão {peer}: {e}"),
            }
            info!("conexão encerrada: {peer}");
            drop(permit);
        });
    }

    info!("shutdown signal recebido");
    // Dropar o sender encerra as sessões e o sweeper
    drop(shutdown_tx);
    sweeper.await?;

    Ok(())
}
