use bytes::Bytes;
use tokio::time::Instant;

/// Entrada do espaço de strings: valor + prazo de expiração opcional.
#[derive(Debug, Clone)]
pub struct StringEntry {
    pub value: Bytes,
    pub expires_at: Option<Instant>,
}

impl StringEntry {
    pub fn new(value: Bytes, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    /// Expirada quando o prazo já foi atingido (`expires_at <= now`).
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|t| t <= now)
    }
}
