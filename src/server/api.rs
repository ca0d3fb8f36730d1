//! JSON payloads for the match API. Each `*_payload` function takes the raw request body
//! (or a match id) and returns the response body; [crate::server::routes] maps errors to
//! status codes.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::CardCatalog;
use crate::combat::{CombatEvent, Rng, RollOutcome};
use crate::config::TimingConfig;
use crate::game::{Game, GameView};

/// Open matches kept at once; creating one more evicts the least recently used.
const MAX_SESSIONS: usize = 1024;
/// Matches with no request for this long are dropped on the next create.
const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
pub enum ApiError {
    Parse(serde_json::Error),
    NotFound,
    BadRequest(String),
    Internal(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid request body: {err}"),
            Self::NotFound => f.write_str("match not found"),
            Self::BadRequest(msg) => f.write_str(msg),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

struct Session {
    game: Game,
    last_seen: Instant,
    touched: u64,
}

impl Session {
    /// Bring the virtual clock up to wall time since the previous request.
    fn catch_up(&mut self) -> &mut Game {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_seen).as_millis();
        self.last_seen = now;
        self.game.advance(u64::try_from(elapsed).unwrap_or(u64::MAX));
        &mut self.game
    }
}

/// Open matches by id. Inserting never fails: idle sessions past the TTL go first, then
/// the least recently touched one if the store is still full.
struct SessionStore {
    sessions: HashMap<Uuid, Session>,
    capacity: usize,
    ttl: Duration,
    next_touch: u64,
}

impl SessionStore {
    fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            sessions: HashMap::new(),
            capacity: capacity.max(1),
            ttl,
            next_touch: 0,
        }
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }

    fn touch(&mut self) -> u64 {
        self.next_touch += 1;
        self.next_touch
    }

    fn insert(&mut self, id: Uuid, game: Game) {
        self.evict_expired(Instant::now());
        while self.sessions.len() >= self.capacity {
            let Some(oldest) = self
                .sessions
                .iter()
                .min_by_key(|(_, session)| session.touched)
                .map(|(id, _)| *id)
            else {
                break;
            };
            self.sessions.remove(&oldest);
            info!("match {oldest} evicted (store full)");
        }
        let touched = self.touch();
        self.sessions.insert(
            id,
            Session {
                game,
                last_seen: Instant::now(),
                touched,
            },
        );
    }

    fn get_mut(&mut self, id: &Uuid) -> Option<&mut Session> {
        let touched = self.touch();
        let session = self.sessions.get_mut(id)?;
        session.touched = touched;
        Some(session)
    }

    fn remove(&mut self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    fn evict_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now.duration_since(session.last_seen) < ttl);
        let dropped = before - self.sessions.len();
        if dropped > 0 {
            info!("{dropped} idle matches expired");
        }
    }
}

pub struct ApiState {
    catalog: Arc<CardCatalog>,
    timing: TimingConfig,
    started_at: DateTime<Utc>,
    sessions: Mutex<SessionStore>,
}

impl ApiState {
    fn new(catalog: Arc<CardCatalog>, timing: TimingConfig) -> Self {
        Self {
            catalog,
            timing,
            started_at: Utc::now(),
            sessions: Mutex::new(SessionStore::new(MAX_SESSIONS, SESSION_TTL)),
        }
    }

    fn with_session<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Game) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let id = Uuid::parse_str(id).map_err(|_| ApiError::NotFound)?;
        let mut sessions = self.lock_sessions()?;
        let session = sessions.get_mut(&id).ok_or(ApiError::NotFound)?;
        f(session.catch_up())
    }

    fn lock_sessions(&self) -> Result<std::sync::MutexGuard<'_, SessionStore>, ApiError> {
        self.sessions
            .lock()
            .map_err(|_| ApiError::Internal("session store poisoned".to_string()))
    }
}

static STATE: OnceLock<ApiState> = OnceLock::new();

/// Install the catalog and timings the API serves. Only the first call takes effect;
/// without one, the built-in roster and default timings are used.
pub fn init_state(catalog: CardCatalog, timing: TimingConfig) -> bool {
    STATE.set(ApiState::new(Arc::new(catalog), timing)).is_ok()
}

fn state() -> &'static ApiState {
    STATE.get_or_init(|| ApiState::new(Arc::new(CardCatalog::builtin()), TimingConfig::default()))
}

fn parse_body<T: for<'de> Deserialize<'de> + Default>(body: &str) -> Result<T, ApiError> {
    if body.trim().is_empty() {
        return Ok(T::default());
    }
    Ok(serde_json::from_str(body)?)
}

pub fn health_payload() -> Result<String, ApiError> {
    let state = state();
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "diceduel-api",
        "version": env!("CARGO_PKG_VERSION"),
        "started_at": state.started_at.to_rfc3339(),
    }))?)
}

pub fn cards_payload() -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "cards": state().catalog.cards(),
    }))?)
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateMatchRequest {
    pub p1: Option<String>,
    pub p2: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct MatchEnvelope<'a> {
    id: &'a str,
    #[serde(flatten)]
    view: GameView,
}

fn match_json(id: &str, game: &Game) -> Result<String, ApiError> {
    Ok(serde_json::to_string_pretty(&MatchEnvelope {
        id,
        view: game.view(),
    })?)
}

pub fn create_match_payload(body: &str) -> Result<String, ApiError> {
    let request: CreateMatchRequest = parse_body(body)?;
    let state = state();
    let rng = request.seed.map_or_else(Rng::from_entropy, Rng::new);
    let game = Game::from_deep_link(
        Arc::clone(&state.catalog),
        state.timing,
        rng,
        request.p1.as_deref(),
        request.p2.as_deref(),
    );

    let id = Uuid::new_v4();
    let payload = match_json(&id.to_string(), &game)?;
    let mut sessions = state.lock_sessions()?;
    sessions.insert(id, game);
    info!("match {id} created ({} open)", sessions.len());
    Ok(payload)
}

/// Close a match and free its slot.
pub fn delete_match_payload(id: &str) -> Result<String, ApiError> {
    let uuid = Uuid::parse_str(id).map_err(|_| ApiError::NotFound)?;
    if !state().lock_sessions()?.remove(&uuid) {
        return Err(ApiError::NotFound);
    }
    info!("match {id} closed");
    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "id": id,
        "status": "closed",
    }))?)
}

pub fn match_payload(id: &str) -> Result<String, ApiError> {
    state().with_session(id, |game| match_json(id, game))
}

#[derive(Debug, Default, Deserialize)]
pub struct SelectRequest {
    pub card_id: Option<u32>,
    pub card: Option<String>,
}

pub fn select_payload(id: &str, body: &str) -> Result<String, ApiError> {
    let request: SelectRequest = parse_body(body)?;
    let state = state();
    let card_id = match (request.card_id, request.card.as_deref()) {
        (Some(card_id), _) => card_id,
        (None, Some(key)) => state
            .catalog
            .lookup(key)
            .map(|card| card.id)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown card '{key}'")))?,
        (None, None) => return Err(ApiError::BadRequest("card_id or card required".to_string())),
    };
    state.with_session(id, |game| {
        game.select(card_id);
        match_json(id, game)
    })
}

pub fn confirm_payload(id: &str) -> Result<String, ApiError> {
    state().with_session(id, |game| {
        if !game.confirm() {
            debug!("match {id}: confirm was a no-op");
        }
        match_json(id, game)
    })
}

pub fn back_payload(id: &str) -> Result<String, ApiError> {
    state().with_session(id, |game| {
        game.back();
        match_json(id, game)
    })
}

#[derive(Debug, Serialize)]
struct RollResponse<'a> {
    id: &'a str,
    outcome: RollOutcome,
    #[serde(flatten)]
    view: GameView,
}

pub fn roll_payload(id: &str) -> Result<String, ApiError> {
    state().with_session(id, |game| {
        let outcome = game.roll();
        Ok(serde_json::to_string_pretty(&RollResponse {
            id,
            outcome,
            view: game.view(),
        })?)
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct OverrideRequest {
    pub roll: Option<u8>,
}

pub fn override_payload(id: &str, body: &str) -> Result<String, ApiError> {
    let request: OverrideRequest = parse_body(body)?;
    state().with_session(id, |game| {
        if !game.set_roll_override(request.roll) {
            return Err(ApiError::BadRequest(format!(
                "roll override must be between 1 and 6, got {:?}",
                request.roll
            )));
        }
        match_json(id, game)
    })
}

pub fn reset_payload(id: &str) -> Result<String, ApiError> {
    state().with_session(id, |game| {
        game.play_again();
        match_json(id, game)
    })
}

#[derive(Debug, Serialize)]
struct EventsResponse<'a> {
    id: &'a str,
    events: Vec<CombatEvent>,
}

/// Events since the previous call for this match.
pub fn events_payload(id: &str) -> Result<String, ApiError> {
    state().with_session(id, |game| {
        Ok(serde_json::to_string_pretty(&EventsResponse {
            id,
            events: game.drain_events(),
        })?)
    })
}
