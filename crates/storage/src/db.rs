use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::entry::StringEntry;

/// Os dois espaços de chaves. O mesmo nome pode existir nos dois sem conflito.
#[derive(Default)]
struct State {
    strings: HashMap<String, StringEntry>,
    lists: HashMap<String, VecDeque<Bytes>>,
}

/// Handle para o banco de dados in-memory.
///
/// Um único `RwLock` cobre os dois espaços: leituras compartilham o lock e
/// qualquer escrita (inclusive remover uma chave expirada) é exclusiva.
/// Nenhuma operação segura o lock através de um `.await`.
#[derive(Clone, Default)]
pub struct Db {
    shared: Arc<RwLock<State>>,
}

impl Db {
    pub fn new() -> Self {
        Self::default()
    }

    // --- String operations ---

    /// Lê uma string. Uma chave expirada é removida aqui mesmo e tratada
    /// como inexistente.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        {
            let state = self.shared.read();
            match state.strings.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(Instant::now()) => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Entre soltar o lock de leitura e pegar o de escrita outra conexão
        // pode ter removido ou reescrito a chave; a checagem é refeita.
        let mut state = self.shared.write();
        if evict_if_expired(&mut state, key, Instant::now()) {
            debug!(key, "chave expirada removida na leitura");
        }
        state.strings.get(key).map(|entry| entry.value.clone())
    }

    /// Sobrescreve a string. Sem `ttl`, qualquer expiração anterior é descartada.
    pub fn set(&self, key: String, value: Bytes, ttl: Option<Duration>) {
        // Prazo que não cabe num Instant equivale a nunca expirar.
        let expires_at = ttl.and_then(|ttl| Instant::now().checked_add(ttl));
        self.shared
            .write()
            .strings
            .insert(key, StringEntry::new(value, expires_at));
    }

    // --- List operations ---

    /// Insere cada valor na cabeça, na ordem dos argumentos.
    pub fn lpush(&self, key: &str, values: &[Bytes]) -> usize {
        let mut state = self.shared.write();
        let list = state.lists.entry(key.to_string()).or_default();
        for v in values {
            list.push_front(v.clone());
        }
        list.len()
    }

    pub fn rpush(&self, key: &str, values: &[Bytes]) -> usize {
        let mut state = self.shared.write();
        let list = state.lists.entry(key.to_string()).or_default();
        list.extend(values.iter().cloned());
        list.len()
    }

    /// Remove até `count` elementos da cabeça.
    /// `None` quando a lista não existe, para distinguir de "removeu zero".
    pub fn lpop(&self, key: &str, count: usize) -> Option<Vec<Bytes>> {
        self.list_pop(key, count, true)
    }

    /// Remove até `count` elementos da cauda, devolvidos na ordem da lista.
    pub fn rpop(&self, key: &str, count: usize) -> Option<Vec<Bytes>> {
        self.list_pop(key, count, false)
    }

    fn list_pop(&self, key: &str, count: usize, from_left: bool) -> Option<Vec<Bytes>> {
        let mut state = self.shared.write();
        let list = state.lists.get_mut(key)?;

        let n = count.min(list.len());
        let popped: Vec<Bytes> = if from_left {
            list.drain(..n).collect()
        } else {
            let at = list.len() - n;
            list.drain(at..).collect()
        };

        // Lista vazia equivale a chave inexistente
        if list.is_empty() {
            state.lists.remove(key);
        }
        Some(popped)
    }

    pub fn lrange(&self, key: &str, start: i64, stop: i64) -> Vec<Bytes> {
        let state = self.shared.read();
        let Some(list) = state.lists.get(key) else {
            return vec![];
        };
        match normalize_range(list.len(), start, stop) {
            Some((s, e)) => list.range(s..=e).cloned().collect(),
            None => vec![],
        }
    }

    pub fn llen(&self, key: &str) -> usize {
        self.shared.read().lists.get(key).map_or(0, VecDeque::len)
    }

    // --- Expiração / introspecção ---

    /// Remove todas as strings com prazo `<= now`. Retorna quantas saíram.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let mut state = self.shared.write();
        let candidates: Vec<String> = state
            .strings
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        let mut evicted = 0;
        for key in &candidates {
            if evict_if_expired(&mut state, key, now) {
                debug!(key = %key, "chave expirada removida pelo sweeper");
                evicted += 1;
            }
        }
        evicted
    }

    /// Total de chaves nos dois espaços, incluindo strings expiradas que
    /// ainda não foram removidas.
    pub fn key_count(&self) -> usize {
        let state = self.shared.read();
        state.strings.len() + state.lists.len()
    }
}

/// Único ponto que remove uma string expirada, usado pela leitura e pelo sweeper.
fn evict_if_expired(state: &mut State, key: &str, now: Instant) -> bool {
    let expired = state
        .strings
        .get(key)
        .is_some_and(|entry| entry.is_expired(now));
    if expired {
        state.strings.remove(key);
    }
    expired
}

/// Normaliza índices estilo Redis (negativos contam do fim) e limita ambos a
/// `[0, len-1]`. `None` quando o intervalo resultante é vazio.
fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as i64;
    let clamp = |i: i64| if i < 0 { (len + i).max(0) } else { i };

    let start = clamp(start);
    let stop = clamp(stop).min(len - 1);
    if start > stop || start >= len {
        return None;
    }
    Some((start as usize, stop as usize))
}
