use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::handler::{ToolEntry, ToolHandler, ToolRegistry};
use crate::request::{Identity, Request};
use crate::response::Response;
use picomcp_circuitbreaker::{CircuitBreakerConfig, CircuitBreakerRegistry};
use picomcp_core::SharedClock;
use picomcp_eventlog::{AuditAction, AuditLog, EventStore, Severity};
use picomcp_ratelimiter::{Decision, KeyedRateLimiter, RateLimiterConfig};
use picomcp_rbac::AccessControl;
use picomcp_retry::{PolicyRegistry, RetryError, RetryExecutor, RetryPolicy};
use picomcp_scheduler::Scheduler;
use picomcp_sessions::SessionManager;
use picomcp_store::StateStore;
use picomcp_tasks::{TaskManager, DEFAULT_POLL_INTERVAL_MS};
use picomcp_watchdog::Watchdog;
use serde_json::{json, Value};

/// The root context of the runtime.
///
/// Owns every governance component and dispatches parsed JSON-RPC
/// requests through the resilience pipeline. All components share one
/// injected clock; nothing here blocks except the retry executor's
/// delay primitive.
pub struct Dispatcher {
    clock: SharedClock,
    default_task_ttl_ms: i64,
    sessions: SessionManager,
    rbac: AccessControl,
    limiter: KeyedRateLimiter,
    breakers: CircuitBreakerRegistry,
    executor: RetryExecutor,
    policies: PolicyRegistry,
    default_retry_policy: RetryPolicy,
    tasks: TaskManager,
    scheduler: Scheduler,
    watchdog: Watchdog,
    store: StateStore,
    events: EventStore,
    audit: AuditLog,
    tools: ToolRegistry,
}

impl Dispatcher {
    pub(crate) fn new(config: DispatcherConfig) -> Self {
        let clock = config.clock.clone();
        let sessions = SessionManager::new(
            config.max_sessions,
            config.session_idle_timeout_ms,
            clock.clone(),
            config.rng.clone(),
        );
        let limiter = RateLimiterConfig::builder()
            .capacity(config.rate_capacity)
            .refill_per_sec(config.rate_refill_per_sec)
            .max_keys(config.rate_max_keys)
            .clock(clock.clone())
            .name("dispatch")
            .build_keyed();
        let breaker_template = CircuitBreakerConfig::builder()
            .failure_threshold(config.breaker_failure_threshold)
            .recovery_timeout_ms(config.breaker_recovery_timeout_ms)
            .half_open_success_threshold(config.breaker_half_open_successes)
            .clock(clock.clone())
            .build_config();
        let executor = RetryExecutor::builder()
            .clock(clock.clone())
            .delay(config.delay.clone())
            .rng(config.rng.clone())
            .name("dispatch")
            .build();

        Self {
            sessions,
            rbac: AccessControl::new(&config.default_role),
            limiter,
            breakers: CircuitBreakerRegistry::with_capacity(breaker_template, config.max_breakers),
            executor,
            policies: PolicyRegistry::new(clock.clone()),
            default_retry_policy: config.default_retry_policy,
            tasks: TaskManager::new(config.max_tasks, clock.clone()),
            scheduler: Scheduler::new(config.scheduler_capacity, clock.clone()),
            watchdog: Watchdog::new(config.watchdog_capacity, clock.clone()),
            store: StateStore::new(config.store_capacity, clock.clone()),
            events: EventStore::new(config.event_capacity, clock.clone()),
            audit: AuditLog::new(config.audit_capacity, clock.clone()),
            tools: ToolRegistry::new(),
            default_task_ttl_ms: config.default_task_ttl_ms,
            clock,
        }
    }

    /// Registers a tool.
    pub fn register_tool(&mut self, entry: ToolEntry) {
        self.tools.register(entry);
    }

    /// Dispatches one request and produces its response.
    ///
    /// Never panics and never unwinds: every rejection is a typed
    /// error response identifying the responsible subsystem.
    pub fn dispatch(&mut self, request: &Request, identity: &Identity) -> Response {
        let id = request.id.clone();
        let result = match request.method.as_str() {
            "tools/call" => {
                let (name, args) = match Self::call_params(&request.params) {
                    Ok(parts) => parts,
                    Err(err) => return err.into_response(id),
                };
                self.tool_call(&name, &args, identity)
            }
            "tools/list" => Ok(json!({ "tools": self.tools.names() })),
            "tasks/create" => {
                let (name, args) = match Self::call_params(&request.params) {
                    Ok(parts) => parts,
                    Err(err) => return err.into_response(id),
                };
                self.task_create(&name, &args, identity)
            }
            "tasks/get" => self.task_get(&request.params),
            "tasks/cancel" => self.task_cancel(&request.params),
            "tasks/list" => self.task_list(&request.params),
            // A registered tool name used directly as the method is an
            // implicit tools/call.
            method if self.tools.contains(method) => {
                let name = method.to_string();
                self.tool_call(&name, &request.params.clone(), identity)
            }
            method => Err(DispatchError::MethodNotFound {
                method: method.to_string(),
            }),
        };

        match result {
            Ok(value) => Response::success(id, value),
            Err(error) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(code = error.code(), %error, "request rejected");
                #[cfg(feature = "metrics")]
                metrics::counter!("picomcp_dispatch_rejections_total").increment(1);
                error.into_response(id)
            }
        }
    }

    /// One cooperative tick: runs due scheduled tasks, checks watchdog
    /// deadlines, sweeps expired state, and prunes idle sessions.
    pub fn tick(&mut self) {
        self.scheduler.run_pending();
        self.watchdog.check();
        self.store.purge_expired();
        self.sessions.prune();
    }

    fn call_params(params: &Value) -> Result<(String, Value), DispatchError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| DispatchError::InvalidParams {
                message: "missing tool name".to_string(),
            })?
            .to_string();
        let args = params.get("arguments").cloned().unwrap_or(Value::Null);
        Ok((name, args))
    }

    /// Pipeline steps 1-4: session, RBAC, rate limit, breaker.
    ///
    /// These are policy gates; a denial here is never recorded as a
    /// breaker failure.
    fn guard(
        &mut self,
        tool: &str,
        identity: &Identity,
        requires_session: bool,
    ) -> Result<(), DispatchError> {
        if requires_session {
            let valid = identity
                .session_id
                .as_deref()
                .map(|sid| self.sessions.validate(sid))
                .unwrap_or(false);
            if !valid {
                self.events
                    .emit("dispatch", "session missing or expired", Severity::Warning);
                return Err(DispatchError::SessionInvalid);
            }
        }

        if !self.rbac.can_access(tool, identity.api_key.as_deref()) {
            let role = self.rbac.role_for(identity.api_key.as_deref()).to_string();
            self.audit.append(
                AuditAction::AccessDenied,
                identity.actor(),
                tool,
                &format!("role {role}"),
                false,
            );
            return Err(DispatchError::AccessDenied {
                tool: tool.to_string(),
            });
        }

        if let Decision::Denied { retry_after_ms } = self.limiter.try_acquire_one(identity.actor())
        {
            return Err(DispatchError::RateLimited { retry_after_ms });
        }

        let breaker = self.breakers.get_or_insert(tool);
        if !breaker.allow_request() {
            let retry_after_ms = breaker.retry_after_ms();
            return Err(DispatchError::CircuitOpen {
                tool: tool.to_string(),
                retry_after_ms,
            });
        }

        Ok(())
    }

    fn tool_call(
        &mut self,
        name: &str,
        args: &Value,
        identity: &Identity,
    ) -> Result<Value, DispatchError> {
        let (requires_session, long_running, policy_name) = match self.tools.get_mut(name) {
            Some(entry) => (
                entry.requires_session,
                matches!(entry.handler, ToolHandler::LongRunning { .. }),
                entry.retry_policy.clone(),
            ),
            None => {
                return Err(DispatchError::MethodNotFound {
                    method: name.to_string(),
                })
            }
        };

        self.guard(name, identity, requires_session)?;

        if long_running {
            return self.start_task(name, args, identity);
        }

        let outcome = {
            let Self {
                tools,
                executor,
                policies,
                default_retry_policy,
                ..
            } = self;
            let Some(entry) = tools.get_mut(name) else {
                return Err(DispatchError::MethodNotFound {
                    method: name.to_string(),
                });
            };
            let ToolHandler::Sync(handler) = &mut entry.handler else {
                return Err(DispatchError::InvalidParams {
                    message: format!("tool {name:?} is long-running"),
                });
            };
            let op = |_attempt: u32| handler(args);
            match policy_name {
                Some(policy) => policies.execute(&policy, executor, default_retry_policy, op),
                None => executor.execute(default_retry_policy, op),
            }
        };

        match outcome {
            Ok(value) => {
                self.breakers.get_or_insert(name).record_success();
                self.audit
                    .append(AuditAction::ToolCall, identity.actor(), name, "", true);
                self.events
                    .emit("tool", &format!("{name} completed"), Severity::Info);
                Ok(value)
            }
            Err(error) => {
                self.breakers.get_or_insert(name).record_failure();
                self.audit
                    .append(AuditAction::ToolCall, identity.actor(), name, "", false);
                self.events
                    .emit("tool", &format!("{name} failed: {error}"), Severity::Error);
                let message = match &error {
                    RetryError::Exhausted(e) | RetryError::Fatal(e) => e.message.clone(),
                    RetryError::TimedOut { .. } => "total timeout exceeded".to_string(),
                };
                Err(DispatchError::ToolFailed { message })
            }
        }
    }

    fn task_create(
        &mut self,
        name: &str,
        args: &Value,
        identity: &Identity,
    ) -> Result<Value, DispatchError> {
        let requires_session = match self.tools.get_mut(name) {
            Some(entry) => {
                if matches!(entry.handler, ToolHandler::Sync(_)) {
                    return Err(DispatchError::InvalidParams {
                        message: format!("tool {name:?} is not long-running"),
                    });
                }
                entry.requires_session
            }
            None => {
                return Err(DispatchError::MethodNotFound {
                    method: name.to_string(),
                })
            }
        };

        self.guard(name, identity, requires_session)?;
        self.start_task(name, args, identity)
    }

    /// Task path: pipeline already passed; create the record and hand
    /// it to the handler. The breaker outcome is recorded when the
    /// handler terminates the task through
    /// [`complete_task`](Self::complete_task) /
    /// [`fail_task`](Self::fail_task), not here.
    fn start_task(
        &mut self,
        name: &str,
        args: &Value,
        identity: &Identity,
    ) -> Result<Value, DispatchError> {
        let poll_interval_ms = match self.tools.get_mut(name) {
            Some(ToolEntry {
                handler: ToolHandler::LongRunning {
                    poll_interval_ms, ..
                },
                ..
            }) => *poll_interval_ms,
            _ => DEFAULT_POLL_INTERVAL_MS,
        };

        let task_id = self
            .tasks
            .create_task(name, self.default_task_ttl_ms, poll_interval_ms)
            .map_err(|_| {
                self.events
                    .emit("task", "task pool full", Severity::Warning);
                DispatchError::TaskPoolFull
            })?;

        let started = match self.tools.get_mut(name).map(|e| &mut e.handler) {
            Some(ToolHandler::LongRunning { start, .. }) => start(args, &task_id),
            _ => Ok(()),
        };

        match started {
            Ok(()) => {
                self.audit
                    .append(AuditAction::ToolCall, identity.actor(), name, &task_id, true);
                self.events
                    .emit("task", &format!("{task_id} started for {name}"), Severity::Info);
                Ok(json!({
                    "taskId": task_id,
                    "status": "working",
                    "pollIntervalMs": poll_interval_ms,
                }))
            }
            Err(error) => {
                self.tasks.fail_task(&task_id, &error.message);
                self.breakers.get_or_insert(name).record_failure();
                self.audit
                    .append(AuditAction::ToolCall, identity.actor(), name, &task_id, false);
                self.events.emit(
                    "task",
                    &format!("{task_id} failed to start: {error}"),
                    Severity::Error,
                );
                Err(DispatchError::ToolFailed {
                    message: error.message,
                })
            }
        }
    }

    /// Terminates a task successfully, storing its opaque result and
    /// recording a success with the owning tool's circuit breaker.
    ///
    /// Handlers must finish their tasks through this (or
    /// [`fail_task`](Self::fail_task)) rather than through the task
    /// manager directly, or the breaker never sees the outcome.
    /// Returns false (recording nothing) when the task is unknown or
    /// already terminal.
    pub fn complete_task(&mut self, id: &str, result: Vec<u8>) -> bool {
        let Some(tool) = self.tasks.get(id).map(|t| t.tool_name.clone()) else {
            return false;
        };
        if !self.tasks.complete_task(id, result) {
            return false;
        }
        self.breakers.get_or_insert(&tool).record_success();
        self.events
            .emit("task", &format!("{id} completed"), Severity::Info);
        true
    }

    /// Terminates a task as failed and records a failure with the
    /// owning tool's circuit breaker.
    ///
    /// Returns false (recording nothing) when the task is unknown or
    /// already terminal.
    pub fn fail_task(&mut self, id: &str, message: &str) -> bool {
        let Some(tool) = self.tasks.get(id).map(|t| t.tool_name.clone()) else {
            return false;
        };
        if !self.tasks.fail_task(id, message) {
            return false;
        }
        self.breakers.get_or_insert(&tool).record_failure();
        self.events
            .emit("task", &format!("{id} failed: {message}"), Severity::Error);
        true
    }

    fn task_get(&mut self, params: &Value) -> Result<Value, DispatchError> {
        let id = Self::task_id_param(params)?;
        let task = self
            .tasks
            .get(&id)
            .ok_or_else(|| DispatchError::InvalidParams {
                message: format!("unknown task {id:?}"),
            })?;
        Ok(json!({
            "taskId": task.id,
            "status": task.status,
            "statusMessage": task.status_message,
            "toolName": task.tool_name,
            "createdAt": task.created_at,
            "lastUpdatedAt": task.last_updated_at,
            "pollIntervalMs": task.poll_interval_ms,
            // Result bytes are opaque to the core; they cross the wire
            // hex-encoded rather than decoded as text.
            "result": task.result.as_deref().map(hex_encode),
        }))
    }

    fn task_cancel(&mut self, params: &Value) -> Result<Value, DispatchError> {
        let id = Self::task_id_param(params)?;
        if self.tasks.get(&id).is_none() {
            return Err(DispatchError::InvalidParams {
                message: format!("unknown task {id:?}"),
            });
        }
        let cancelled = self.tasks.cancel_task(&id);
        if !cancelled {
            // Refused mutation of a terminal task: a caller bug worth
            // recording, not an error response.
            self.events.emit(
                "task",
                &format!("cancel refused on terminal {id}"),
                Severity::Error,
            );
        }
        Ok(json!({ "taskId": id, "cancelled": cancelled }))
    }

    fn task_list(&mut self, params: &Value) -> Result<Value, DispatchError> {
        let start = params
            .get("start")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        let page_size = params
            .get("pageSize")
            .and_then(Value::as_u64)
            .unwrap_or(10) as usize;
        let page = self.tasks.list_tasks(start, page_size);
        serde_json::to_value(&page).map_err(|e| DispatchError::InvalidParams {
            message: e.to_string(),
        })
    }

    fn task_id_param(params: &Value) -> Result<String, DispatchError> {
        params
            .get("taskId")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| DispatchError::InvalidParams {
                message: "missing taskId".to_string(),
            })
    }

    /// Aggregated diagnostic snapshot of every component.
    pub fn stats(&self) -> Value {
        json!({
            "uptimeMs": self.clock.now_ms(),
            "rateLimiter": self.limiter.stats(),
            "circuitBreakers": self.breakers.stats(),
            "retry": self.executor.stats(),
            "retryPolicies": self.policies.stats(),
            "tasks": self.tasks.stats(),
            "sessions": self.sessions.stats(),
            "scheduler": self.scheduler.stats(),
            "watchdog": self.watchdog.stats(),
            "store": self.store.stats(),
            "events": self.events.stats(),
            "audit": self.audit.stats(),
            "rbac": self.rbac.stats(),
            "toolCount": self.tools.len(),
        })
    }

    // Component accessors for the embedding layer and tests.

    pub fn sessions_mut(&mut self) -> &mut SessionManager {
        &mut self.sessions
    }

    pub fn rbac_mut(&mut self) -> &mut AccessControl {
        &mut self.rbac
    }

    pub fn limiter_mut(&mut self) -> &mut KeyedRateLimiter {
        &mut self.limiter
    }

    pub fn breakers_mut(&mut self) -> &mut CircuitBreakerRegistry {
        &mut self.breakers
    }

    pub fn policies_mut(&mut self) -> &mut PolicyRegistry {
        &mut self.policies
    }

    pub fn tasks_mut(&mut self) -> &mut TaskManager {
        &mut self.tasks
    }

    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn watchdog_mut(&mut self) -> &mut Watchdog {
        &mut self.watchdog
    }

    pub fn store_mut(&mut self) -> &mut StateStore {
        &mut self.store
    }

    pub fn events(&self) -> &EventStore {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventStore {
        &mut self.events
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    pub fn audit_mut(&mut self) -> &mut AuditLog {
        &mut self.audit
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write as _;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}
