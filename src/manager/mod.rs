//! Manager (C4): the process-wide orchestrator. Holds the single shared server table, drives the
//! per-server state machine, and is the only component with strong ownership of sessions.
//! Grounded on the teacher's `client::gateway::McpClientGateway` — its `active_clients` map plus
//! event broadcast is the closest match to §4.4/§5's state machine and concurrency model.

pub mod peer;

use crate::client::ConnectionFactory;
use crate::config;
use crate::error::GatewayError;
use crate::session::{ServerSession, SessionState, SharedSession};
use crate::toolkit::Toolkit;
use crate::types::{ServerInfo, ServerParams};
use rmcp::model::CallToolResult;
use serde_json::{Map as JsonMap, Value};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{broadcast, Mutex};
use tokio_util::sync::CancellationToken;

/// Observability events broadcast as sessions move through the state machine (§3.1 ambient
/// addition). Nobody is required to subscribe; the Manager never blocks on a lagging receiver.
#[derive(Debug, Clone)]
pub enum GatewayEvent {
    Initializing { name: String },
    Ready { name: String, tool_count: usize },
    Failed { name: String, error: String },
    Closing { name: String },
    Closed { name: String },
}

/// Outcome of `Manager::initialize` (§4.4: "emits a structured init summary").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InitSummary {
    pub total: usize,
    pub ready: usize,
    pub failed: usize,
}

struct ManagerInner {
    /// The single shared mutable structure (§5). Guarded only across map mutations; transport
    /// I/O always happens after releasing this lock.
    sessions: Mutex<HashMap<String, SharedSession>>,
    /// Registration order, for reverse-order shutdown.
    registration_order: Mutex<Vec<String>>,
    factory: Arc<dyn ConnectionFactory>,
    default_call_timeout: Duration,
    event_tx: broadcast::Sender<GatewayEvent>,
}

/// The Manager. Cheap to clone — all state lives behind the inner `Arc`.
#[derive(Clone)]
pub struct Manager {
    inner: Arc<ManagerInner>,
}

/// A weak, name-keyed-style handle back to the Manager. Toolkit adapters and the Re-exporter hold
/// only this — never a strong `Manager` — so they can never extend a session's lifetime (§5,
/// §9's "broken by name-keyed weak reference").
#[derive(Clone)]
pub struct ManagerHandle(Weak<ManagerInner>);

impl ManagerHandle {
    pub fn upgrade(&self) -> Option<Manager> {
        self.0.upgrade().map(|inner| Manager { inner })
    }

    /// A handle that never upgrades. Used in tests that need a Toolkit without a live Manager.
    pub fn none() -> Self {
        let discarded = Arc::new(ManagerInner {
            sessions: Mutex::new(HashMap::new()),
            registration_order: Mutex::new(Vec::new()),
            factory: Arc::new(crate::client::DefaultConnectionFactory),
            default_call_timeout: Duration::from_secs(crate::types::DEFAULT_CALL_TIMEOUT_SECONDS),
            event_tx: broadcast::channel(1).0,
        });
        ManagerHandle(Arc::downgrade(&discarded))
    }
}

impl Manager {
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self {
            inner: Arc::new(ManagerInner {
                sessions: Mutex::new(HashMap::new()),
                registration_order: Mutex::new(Vec::new()),
                factory,
                default_call_timeout: Duration::from_secs(crate::types::DEFAULT_CALL_TIMEOUT_SECONDS),
                event_tx,
            }),
        }
    }

    pub fn with_default_transports() -> Self {
        Self::new(Arc::new(crate::client::DefaultConnectionFactory))
    }

    pub fn handle(&self) -> ManagerHandle {
        ManagerHandle(Arc::downgrade(&self.inner))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.inner.event_tx.subscribe()
    }

    async fn session_arc(&self, name: &str) -> Option<SharedSession> {
        self.inner.sessions.lock().await.get(name).cloned()
    }

    async fn register(&self, params: ServerParams) -> SharedSession {
        let session = Arc::new(Mutex::new(ServerSession::pending(params.clone())));
        self.inner.sessions.lock().await.insert(params.name.clone(), session.clone());
        self.inner.registration_order.lock().await.push(params.name.clone());
        session
    }

    /// Checks for a name collision and inserts the new session atomically, under a single held
    /// table-lock guard — unlike `register`, which assumes the caller has already reserved the
    /// name. Used by `add_peer` so two concurrent registrations of the same new name cannot both
    /// pass a check and both insert (invariant 1: no silent overwrite).
    async fn try_register(&self, params: ServerParams) -> Result<SharedSession, GatewayError> {
        let session = Arc::new(Mutex::new(ServerSession::pending(params.clone())));
        {
            let mut sessions = self.inner.sessions.lock().await;
            if sessions.contains_key(&params.name) {
                return Err(GatewayError::invalid_config(&params.name, "a server with this name already exists"));
            }
            sessions.insert(params.name.clone(), session.clone());
        }
        self.inner.registration_order.lock().await.push(params.name.clone());
        Ok(session)
    }

    /// Drives one session from `Pending`/`Closed` through `Initializing` to `Ready`/`Failed`.
    /// Connection failures are captured into `last_error` and never propagated from this path
    /// (§4.4 error-handling policy for `initialize`).
    async fn start_session(&self, session: &SharedSession, params: &ServerParams) {
        {
            let mut guard = session.lock().await;
            guard.mark_initializing();
        }
        let _ = self.inner.event_tx.send(GatewayEvent::Initializing { name: params.name.clone() });

        match self.inner.factory.open(params).await {
            Ok((connection, tools)) => {
                let tool_count = tools.len();
                let mut guard = session.lock().await;
                guard.mark_ready(connection, tools);
                tracing::info!(server = %params.name, tool_count, "server ready");
                let _ = self.inner.event_tx.send(GatewayEvent::Ready {
                    name: params.name.clone(),
                    tool_count,
                });
            }
            Err(e) => {
                tracing::warn!(server = %params.name, error = %e, "server initialization failed");
                let mut guard = session.lock().await;
                guard.mark_failed(&e);
                let _ = self.inner.event_tx.send(GatewayEvent::Failed {
                    name: params.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Registers every entry of `catalog` and, for enabled ones, starts them with bounded
    /// concurrency — each bounded by its own `timeoutSeconds`, all running in parallel. Returns
    /// once every server has reached Ready/Failed.
    pub async fn initialize(&self, catalog: HashMap<String, ServerParams>) -> InitSummary {
        let mut handles = Vec::with_capacity(catalog.len());
        let total = catalog.len();

        for (_, params) in catalog {
            let session = self.register(params.clone()).await;
            if !params.enabled {
                continue;
            }
            let manager = self.clone();
            handles.push(tokio::spawn(async move {
                manager.start_session(&session, &params).await;
            }));
        }

        for handle in handles {
            let _ = handle.await;
        }

        let (ready, failed) = self.count_terminal().await;
        InitSummary { total, ready, failed }
    }

    async fn count_terminal(&self) -> (usize, usize) {
        let sessions: Vec<SharedSession> = {
            let sessions = self.inner.sessions.lock().await;
            sessions.values().cloned().collect()
        };
        let mut ready = 0;
        let mut failed = 0;
        for session in sessions {
            match session.lock().await.state {
                SessionState::Ready => ready += 1,
                SessionState::Failed => failed += 1,
                _ => {}
            }
        }
        (ready, failed)
    }

    /// Pure read of current state; fails with `NotFound` for an unknown name, `Disabled` if the
    /// catalog entry is disabled, `NotReady` if the session has not reached `Ready`.
    pub async fn get_toolkit(&self, server_name: &str, allowed_functions: Option<Vec<String>>) -> Result<Toolkit, GatewayError> {
        let session = self.session_arc(server_name).await.ok_or_else(|| GatewayError::not_found(server_name))?;
        let guard = session.lock().await;

        if !guard.params.enabled {
            return Err(GatewayError::disabled(server_name));
        }
        if guard.state != SessionState::Ready {
            return Err(GatewayError::not_ready(server_name));
        }

        Ok(Toolkit::new(server_name, allowed_functions, &guard.tools, self.handle()))
    }

    /// Pure read across the whole table. Clones the session handles out from under the table
    /// lock before locking any of them individually, so a session with an in-flight tool call
    /// (which holds its own lock across transport I/O) never blocks `register`/`reload`/
    /// `add_peer`/`remove_peer`/`shutdown` by way of a lock held on the shared table (§5).
    pub async fn list_servers(&self) -> Vec<ServerInfo> {
        let sessions: Vec<SharedSession> = {
            let sessions = self.inner.sessions.lock().await;
            sessions.values().cloned().collect()
        };

        let mut result = Vec::with_capacity(sessions.len());
        for session in sessions {
            let guard = session.lock().await;
            result.push(ServerInfo {
                name: guard.params.name.clone(),
                enabled: guard.params.enabled,
                connected: guard.state == SessionState::Ready,
                description: guard.params.description.clone(),
                functions: guard.function_names(),
            });
        }
        result.sort_by(|a, b| a.name.cmp(&b.name));
        result
    }

    /// Closes the existing session (if any) and rebuilds it from its stored params. Concurrent
    /// reloads of the *same* server are serialized by the per-session lock held for the whole
    /// operation; different servers proceed in parallel.
    pub async fn reload(&self, server_name: &str) -> Result<(), GatewayError> {
        let session = self.session_arc(server_name).await.ok_or_else(|| GatewayError::not_found(server_name))?;
        let mut guard = session.lock().await;
        let params = guard.params.clone();

        guard.mark_closing();
        let _ = self.inner.event_tx.send(GatewayEvent::Closing { name: server_name.to_string() });
        guard.close().await;
        let _ = self.inner.event_tx.send(GatewayEvent::Closed { name: server_name.to_string() });

        if !params.enabled {
            return Err(GatewayError::disabled(server_name));
        }

        guard.mark_initializing();
        let _ = self.inner.event_tx.send(GatewayEvent::Initializing { name: server_name.to_string() });

        match self.inner.factory.open(&params).await {
            Ok((connection, tools)) => {
                let tool_count = tools.len();
                guard.mark_ready(connection, tools);
                let _ = self.inner.event_tx.send(GatewayEvent::Ready {
                    name: server_name.to_string(),
                    tool_count,
                });
                Ok(())
            }
            Err(e) => {
                guard.mark_failed(&e);
                let _ = self.inner.event_tx.send(GatewayEvent::Failed {
                    name: server_name.to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Equivalent to `reload` applied to every *enabled* server, concurrently across servers.
    /// Disabled entries are left untouched rather than cycled through Closing/Closed and reported
    /// as a spurious `Disabled` failure.
    pub async fn reload_all(&self) -> Vec<(String, Result<(), GatewayError>)> {
        let sessions: Vec<(String, SharedSession)> = {
            let sessions = self.inner.sessions.lock().await;
            sessions.iter().map(|(name, session)| (name.clone(), session.clone())).collect()
        };

        let mut names = Vec::with_capacity(sessions.len());
        for (name, session) in sessions {
            if session.lock().await.params.enabled {
                names.push(name);
            }
        }

        let mut handles = Vec::with_capacity(names.len());
        for name in names {
            let manager = self.clone();
            handles.push(tokio::spawn(async move {
                let result = manager.reload(&name).await;
                (name, result)
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(pair) = handle.await {
                results.push(pair);
            }
        }
        results
    }

    /// Registers a new HTTP-transport server at runtime. Refuses on name collision without
    /// mutating any state (testable property 3); on connection failure the entry is still
    /// registered (as `Failed`) and the error is propagated to the caller.
    ///
    /// The collision check and the reservation insert happen under a single held table-lock
    /// guard (`try_register`) so two concurrent calls for the same new name cannot both pass the
    /// check and both register — the second would otherwise silently overwrite the first
    /// session's `Arc`, orphaning a live transport (invariants 1 and 2).
    pub async fn add_peer(&self, params: ServerParams) -> Result<ServerInfo, GatewayError> {
        crate::config::validation::validate_server(&params)?;

        let session = self.try_register(params.clone()).await?;
        self.start_session(&session, &params).await;

        let guard = session.lock().await;
        let info = ServerInfo {
            name: guard.params.name.clone(),
            enabled: guard.params.enabled,
            connected: guard.state == SessionState::Ready,
            description: guard.params.description.clone(),
            functions: guard.function_names(),
        };

        if let Some(error) = &guard.last_error {
            return Err(GatewayError::connection(&params.name, error.clone()));
        }
        Ok(info)
    }

    /// Transitions the named server to `Closing` then `Closed` and removes it from the table.
    pub async fn remove_peer(&self, server_name: &str) -> Result<(), GatewayError> {
        let session = {
            let mut sessions = self.inner.sessions.lock().await;
            sessions.remove(server_name)
        }
        .ok_or_else(|| GatewayError::not_found(server_name))?;

        let mut guard = session.lock().await;
        guard.mark_closing();
        let _ = self.inner.event_tx.send(GatewayEvent::Closing { name: server_name.to_string() });
        guard.close().await;
        let _ = self.inner.event_tx.send(GatewayEvent::Closed { name: server_name.to_string() });
        Ok(())
    }

    /// Closes all sessions in reverse registration order. Idempotent; errors are swallowed and
    /// logged, never raised (§4.4 cleanup policy).
    pub async fn shutdown(&self) {
        let order = {
            let mut order = self.inner.registration_order.lock().await;
            std::mem::take(&mut *order)
        };

        for name in order.into_iter().rev() {
            let session = { self.inner.sessions.lock().await.remove(&name) };
            if let Some(session) = session {
                let mut guard = session.lock().await;
                guard.mark_closing();
                let _ = self.inner.event_tx.send(GatewayEvent::Closing { name: name.clone() });
                guard.close().await;
                let _ = self.inner.event_tx.send(GatewayEvent::Closed { name: name.clone() });
            }
        }
    }

    /// Invoked by a `Toolkit` after argument validation has already passed. Looks up the live
    /// session, checks readiness, and forwards to the transport. The per-session lock is held for
    /// the duration of the call, which both serializes same-session calls into submission order
    /// and blocks them from racing a concurrent `reload`/`close` (§5).
    pub(crate) async fn call_tool(
        &self,
        server_name: &str,
        tool_name: &str,
        arguments: JsonMap<String, Value>,
        deadline: Duration,
        cancel: CancellationToken,
    ) -> Result<CallToolResult, GatewayError> {
        let session = self.session_arc(server_name).await.ok_or_else(|| GatewayError::not_found(server_name))?;
        let guard = session.lock().await;

        if guard.state != SessionState::Ready {
            return Err(GatewayError::not_ready(server_name));
        }

        let connection = guard
            .connection
            .as_ref()
            .ok_or_else(|| GatewayError::not_ready(server_name))?;

        connection.call_tool(tool_name, arguments, deadline, cancel).await
    }

    pub fn default_call_timeout(&self) -> Duration {
        self.inner.default_call_timeout
    }

    /// Convenience wrapper used by the default catalog entrypoint; loads and validates a catalog
    /// file the same way `config::load_catalog` does.
    pub async fn initialize_from_path(&self, path: &std::path::Path, base_path: &str) -> Result<InitSummary, GatewayError> {
        let catalog = config::load_catalog_from_path(path, base_path).await?;
        Ok(self.initialize(catalog).await)
    }
}
