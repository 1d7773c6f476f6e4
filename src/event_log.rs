use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::{openapi, JsonSchema};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::state::GameState;

/// Event payloads for the append-only log, one variant per observable
/// game mutation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "type")]
pub enum EventPayload {
    PlayerJoined {
        game_id: u64,
        equipe_id: String,
    },
    CardDrawn {
        game_id: u64,
        equipe_id: String,
        card_code: String,
    },
    DuelStarted {
        duel_id: u64,
        source: String,
        target: String,
    },
    CardSubmitted {
        duel_id: u64,
        equipe_id: String,
        card_code: String,
        round_index: u32,
    },
    DuelResolved {
        duel_id: u64,
        winner: Option<String>,
    },
    DeckReset {
        game_id: u64,
    },
    SeedSet {
        seed: u64,
    },
}

/// Stored entry in the append-only event log.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct EventEntry {
    pub seq: u64,
    pub event_type: String,
    pub payload: EventPayload,
    pub timestamp: String,
}

#[derive(Debug)]
pub struct EventLog {
    pub entries: Arc<Mutex<Vec<EventEntry>>>,
    pub seq: AtomicU64,
}

impl Default for EventLog {
    fn default() -> Self {
        EventLog::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        EventLog {
            entries: Arc::new(Mutex::new(Vec::new())),
            seq: AtomicU64::new(0),
        }
    }

    /// Append an event entry, assigning an incrementing sequence number.
    /// Writes into the in-memory entries immediately so readers observe the
    /// entry as soon as the call returns.
    pub fn append(&self, event_type: &str, payload: EventPayload) -> EventEntry {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let timestamp = match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
            Ok(dur) => format!("{}", dur.as_millis()),
            Err(_) => "0".to_string(),
        };
        let entry = EventEntry {
            seq,
            event_type: event_type.to_string(),
            payload,
            timestamp,
        };
        match self.entries.lock() {
            Ok(mut g) => g.push(entry.clone()),
            Err(e) => e.into_inner().push(entry.clone()),
        }
        entry
    }

    /// Return a cloned snapshot of entries for inspection.
    pub fn entries(&self) -> Vec<EventEntry> {
        match self.entries.lock() {
            Ok(g) => g.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct EventLogResponse {
    pub entries: Vec<EventEntry>,
    pub next_seq: Option<u64>,
    pub limit: usize,
}

#[openapi]
#[get("/events?<from_seq>&<limit>&<event_type>")]
pub async fn list_events(
    from_seq: Option<u64>,
    limit: Option<usize>,
    event_type: Option<String>,
    game_state: &rocket::State<std::sync::Arc<rocket::futures::lock::Mutex<GameState>>>,
) -> Json<EventLogResponse> {
    let gs = game_state.lock().await;
    let entries = gs.event_log.entries();
    let mut filtered: Vec<EventEntry> = entries
        .into_iter()
        .filter(|e| {
            if let Some(f) = from_seq {
                if e.seq < f {
                    return false;
                }
            }
            if let Some(ref t) = event_type {
                if e.event_type != *t {
                    return false;
                }
            }
            true
        })
        .collect();
    let max = limit.unwrap_or(1000);
    let has_more = filtered.len() > max;
    filtered.truncate(max);
    let next_seq = if has_more {
        filtered.last().map(|e| e.seq + 1)
    } else {
        None
    };
    Json(EventLogResponse {
        entries: filtered,
        next_seq,
        limit: max,
    })
}
