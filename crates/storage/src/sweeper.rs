use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant, MissedTickBehavior};
use tracing::debug;

use crate::Db;

/// Task periódica que remove strings expiradas que ninguém voltou a ler.
///
/// `Db::get` já esconde valores expirados; o sweeper apenas libera a memória
/// de chaves que não são mais acessadas.
pub struct ExpirySweeper {
    db: Db,
    period: Duration,
}

impl ExpirySweeper {
    pub fn new(db: Db, period: Duration) -> Self {
        Self {
            db,
            // interval() não aceita período zero
            period: period.max(Duration::from_millis(1)),
        }
    }

    /// Roda o sweeper numa task própria até o shutdown.
    pub fn spawn(self, shutdown: broadcast::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Um ciclo a cada `period`, o primeiro um período após o início.
    /// Termina quando o shutdown é sinalizado ou o sender é dropado.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        let mut ticker = time::interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(period = ?self.period, "sweeper de expiração iniciado");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => break,
            }
        }

        debug!("sweeper de expiração encerrado");
    }

    fn sweep(&self) -> usize {
        let evicted = self.db.purge_expired(Instant::now());
        if evicted > 0 {
            debug!(evicted, remaining = self.db.key_count(), "ciclo de expiração");
        }
        evicted
    }
}
