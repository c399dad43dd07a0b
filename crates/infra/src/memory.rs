//! In-process backend implementing both service contracts.
//!
//! Intended for tests/dev. Rows are plain JSON objects kept per table; the
//! auth side knows a fixed set of email/password accounts.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Duration;
use serde_json::{Map, Value};
use tokio::sync::broadcast;
use uuid::Uuid;

use clinic_auth::{AuthError, AuthEvent, AuthService, AuthSession, Credentials, Principal};
use clinic_core::{Clock, SystemClock, UserId};

use crate::{BackendError, BackendResult, DataService, EVOLUTIONS_TABLE, Filter, PATIENTS_TABLE, Select};

const EVENT_CAPACITY: usize = 16;
const SESSION_TTL_SECS: i64 = 3600;
const BAD_CREDENTIALS: &str = "Invalid login credentials";

pub struct InMemoryBackend {
    tables: RwLock<HashMap<String, Vec<Value>>>,
    accounts: RwLock<HashMap<String, (String, Principal)>>,
    session: RwLock<Option<AuthSession>>,
    events: broadcast::Sender<AuthEvent>,
    /// `Some` while notifications are being held back.
    held: Mutex<Option<Vec<AuthEvent>>>,
    clock: Arc<dyn Clock>,
    unreachable: AtomicBool,
    data_calls: AtomicUsize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            tables: RwLock::new(HashMap::new()),
            accounts: RwLock::new(HashMap::new()),
            session: RwLock::new(None),
            events,
            held: Mutex::new(None),
            clock,
            unreachable: AtomicBool::new(false),
            data_calls: AtomicUsize::new(0),
        }
    }

    /// Register an account that can sign in with `password`.
    pub fn with_account(self, email: &str, password: &str) -> Self {
        let principal = Principal::new(UserId::new(), email);
        write(&self.accounts).insert(email.to_string(), (password.to_string(), principal));
        self
    }

    /// Start with an open session for a registered account, as if restored
    /// from an earlier run. No notification is published.
    pub fn with_session_for(self, email: &str) -> Self {
        let principal = read(&self.accounts).get(email).map(|(_, p)| p.clone());
        if let Some(user) = principal {
            let session = self.open_session(user);
            *write(&self.session) = Some(session);
        }
        self
    }

    /// Queue session notifications instead of delivering them.
    pub fn hold_notifications(&self) {
        let mut held = lock(&self.held);
        if held.is_none() {
            *held = Some(Vec::new());
        }
    }

    /// Deliver every queued notification and stop holding.
    pub fn release_notifications(&self) {
        let queued = lock(&self.held).take().unwrap_or_default();
        for event in queued {
            let _ = self.events.send(event);
        }
    }

    /// Make every call fail as if the service could not be reached.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, AtomicOrdering::SeqCst);
    }

    /// Number of data calls received so far, failed ones included.
    pub fn data_calls(&self) -> usize {
        self.data_calls.load(AtomicOrdering::SeqCst)
    }

    /// Store a row directly, filling `id` and `criado_em` when absent.
    pub fn seed(&self, table: &str, row: Value) -> Value {
        let row = self.complete_row(row);
        write(&self.tables)
            .entry(table.to_string())
            .or_default()
            .push(row.clone());
        row
    }

    /// Snapshot of a table's rows in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        read(&self.tables).get(table).cloned().unwrap_or_default()
    }

    fn open_session(&self, user: Principal) -> AuthSession {
        AuthSession {
            access_token: format!("mem-{}", Uuid::now_v7()),
            refresh_token: format!("mem-refresh-{}", Uuid::now_v7()),
            expires_at: self.clock.now() + Duration::seconds(SESSION_TTL_SECS),
            user,
        }
    }

    fn publish(&self, event: AuthEvent) {
        let mut held = lock(&self.held);
        match held.as_mut() {
            Some(queue) => queue.push(event),
            None => {
                let _ = self.events.send(event);
            }
        }
    }

    fn complete_row(&self, row: Value) -> Value {
        let mut row = match row {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        row.entry("id")
            .or_insert_with(|| Value::String(Uuid::now_v7().to_string()));
        row.entry("criado_em")
            .or_insert_with(|| Value::String(self.clock.now().to_rfc3339()));
        Value::Object(row)
    }

    fn begin_data_call(&self) -> BackendResult<()> {
        self.data_calls.fetch_add(1, AtomicOrdering::SeqCst);
        if self.unreachable.load(AtomicOrdering::SeqCst) {
            return Err(BackendError::Network("connection refused".to_string()));
        }
        Ok(())
    }

    fn begin_auth_call(&self) -> Result<(), AuthError> {
        if self.unreachable.load(AtomicOrdering::SeqCst) {
            return Err(AuthError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    /// Evolutions must point at an existing patient.
    fn check_references(&self, table: &str, row: &Value) -> BackendResult<()> {
        if table != EVOLUTIONS_TABLE {
            return Ok(());
        }
        let Some(patient_id) = row.get("paciente_id").and_then(Value::as_str) else {
            return Ok(());
        };
        let known = read(&self.tables)
            .get(PATIENTS_TABLE)
            .is_some_and(|rows| rows.iter().any(|r| Filter::eq("id", patient_id).matches(r)));
        if known {
            Ok(())
        } else {
            Err(BackendError::api(
                409,
                Some("23503".to_string()),
                format!("insert or update on table \"{table}\" violates foreign key constraint"),
            ))
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Ascending order over JSON scalars; missing and null sort last.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or_default(), y.as_f64().unwrap_or_default());
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait::async_trait]
impl DataService for InMemoryBackend {
    async fn select(&self, query: &Select) -> BackendResult<Vec<Value>> {
        self.begin_data_call()?;
        let mut rows: Vec<Value> = read(&self.tables)
            .get(&query.table)
            .map(|rows| rows.iter().filter(|r| query.matches(r)).cloned().collect())
            .unwrap_or_default();
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ordering = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ordering
                } else {
                    ordering.reverse()
                }
            });
        }
        Ok(rows)
    }

    async fn select_single(&self, query: &Select) -> BackendResult<Value> {
        let mut rows = self.select(query).await?;
        match rows.len() {
            0 => Err(BackendError::NotFound),
            1 => Ok(rows.remove(0)),
            n => Err(BackendError::api(
                406,
                Some("PGRST116".to_string()),
                format!("JSON object requested, multiple ({n}) rows returned"),
            )),
        }
    }

    async fn insert(&self, table: &str, row: Value) -> BackendResult<Value> {
        self.begin_data_call()?;
        if !row.is_object() {
            return Err(BackendError::api(400, None, "row must be a JSON object"));
        }
        self.check_references(table, &row)?;
        Ok(self.seed(table, row))
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> BackendResult<Value> {
        self.begin_data_call()?;
        let Value::Object(patch) = patch else {
            return Err(BackendError::api(400, None, "patch must be a JSON object"));
        };
        let mut tables = write(&self.tables);
        let row = tables
            .get_mut(table)
            .and_then(|rows| rows.iter_mut().find(|r| filter.matches(r)))
            .ok_or(BackendError::NotFound)?;
        if let Value::Object(fields) = &mut *row {
            for (key, value) in patch {
                fields.insert(key, value);
            }
        }
        Ok(row.clone())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> BackendResult<()> {
        self.begin_data_call()?;
        if let Some(rows) = write(&self.tables).get_mut(table) {
            rows.retain(|r| !filter.matches(r));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthService for InMemoryBackend {
    async fn sign_in_with_password(
        &self,
        credentials: &Credentials,
    ) -> Result<AuthSession, AuthError> {
        self.begin_auth_call()?;
        let user = read(&self.accounts)
            .get(&credentials.email)
            .filter(|(password, _)| *password == credentials.password)
            .map(|(_, user)| user.clone())
            .ok_or_else(|| AuthError::rejected(400, BAD_CREDENTIALS))?;

        let session = self.open_session(user);
        *write(&self.session) = Some(session.clone());
        self.publish(AuthEvent::signed_in(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.begin_auth_call()?;
        *write(&self.session) = None;
        self.publish(AuthEvent::signed_out());
        Ok(())
    }

    async fn current_user(&self) -> Result<Option<Principal>, AuthError> {
        self.begin_auth_call()?;
        Ok(read(&self.session).as_ref().map(|s| s.user.clone()))
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}
