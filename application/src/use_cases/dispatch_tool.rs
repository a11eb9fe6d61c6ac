//! Tool dispatcher
//!
//! [`ToolDispatcher::execute`] is the single boundary between the reasoning
//! loop and the bridge. It never returns an error: every failure becomes a
//! [`ToolResult`] carrying a [`ToolError`], and every call appends exactly one
//! [`StepRecord`](ceagent_domain::StepRecord) to the session context.
//!
//! Classification, first match wins:
//!
//! 1. unregistered name → `ParameterError`
//! 2. validation failure → `ParameterError`
//! 3. transport timeout → `TimeoutError` (after bounded retries)
//! 4. transport disconnect → `ConnectionError`
//! 5. remote error object, or a result reporting `success: false` / `error` → `ServerError`
//! 6. anything else → `UnknownError`

use crate::config::TimeoutPolicy;
use crate::ports::rpc_transport::{RpcTransport, TransportError};
use ceagent_domain::core::string::compact_json;
use ceagent_domain::{ContextStore, ErrorKind, ToolError, ToolRegistry, ToolResult};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Validates, sends, classifies and records tool calls.
pub struct ToolDispatcher<T: RpcTransport> {
    registry: Arc<ToolRegistry>,
    transport: Arc<T>,
    timeouts: TimeoutPolicy,
}

impl<T: RpcTransport> ToolDispatcher<T> {
    pub fn new(registry: Arc<ToolRegistry>, transport: Arc<T>) -> Self {
        Self {
            registry,
            transport,
            timeouts: TimeoutPolicy::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Execute one tool call and record it in `context`.
    ///
    /// The returned result carries the index of the step it produced in
    /// `metadata.step_index`.
    pub async fn execute(
        &self,
        name: &str,
        raw_args: &Map<String, Value>,
        context: &mut ContextStore,
    ) -> ToolResult {
        self.execute_until(name, raw_args, context, None).await
    }

    /// Like [`execute`](Self::execute), but no send outlives `deadline`.
    ///
    /// Each attempt waits for the smaller of its class timeout and the time
    /// left; a retry whose backoff would reach the deadline is skipped. A call
    /// cut short this way is still recorded as a `TimeoutError`.
    pub async fn execute_until(
        &self,
        name: &str,
        raw_args: &Map<String, Value>,
        context: &mut ContextStore,
        deadline: Option<Instant>,
    ) -> ToolResult {
        let started = Instant::now();
        let (recorded_args, result) = self.run(name, raw_args, deadline).await;
        let result = result.with_duration(started.elapsed().as_millis() as u64);

        let index = context.record(recorded_args, &result);
        match result.error() {
            None => debug!(tool = %result.tool_name, step = index, "tool succeeded"),
            Some(err) => info!(tool = %result.tool_name, step = index, error = %err, "tool failed"),
        }
        result.with_step_index(index)
    }

    async fn run(
        &self,
        name: &str,
        raw_args: &Map<String, Value>,
        deadline: Option<Instant>,
    ) -> (Map<String, Value>, ToolResult) {
        let Some(descriptor) = self.registry.lookup(name) else {
            let error = ToolError::unknown_tool(name).with_details(name, raw_args.clone());
            return (raw_args.clone(), ToolResult::failure(name, error));
        };
        let canonical = descriptor.name.clone();

        let args = match self.registry.validate_and_coerce(&canonical, raw_args) {
            Ok(args) => args,
            Err(error) => {
                let error = error.with_details(&canonical, raw_args.clone());
                return (raw_args.clone(), ToolResult::failure(canonical, error));
            }
        };

        let class = descriptor.timeout_class;
        let class_timeout = self.timeouts.for_class(class);
        let retries = self.timeouts.retries_for(class);

        let mut attempt = 0;
        let outcome = loop {
            let timeout = match deadline {
                Some(deadline) => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        debug!(tool = %canonical, "session deadline reached before sending");
                        break Err(TransportError::Timeout(left));
                    }
                    class_timeout.min(left)
                }
                None => class_timeout,
            };

            let params = Value::Object(args.clone());
            match self.transport.send(&canonical, params, timeout).await {
                Err(TransportError::Timeout(waited)) if attempt < retries => {
                    attempt += 1;
                    let backoff = self.timeouts.backoff(attempt);
                    if deadline.is_some_and(|d| Instant::now() + backoff >= d) {
                        debug!(tool = %canonical, attempt, "retry would pass the session deadline");
                        break Err(TransportError::Timeout(waited));
                    }
                    warn!(
                        tool = %canonical,
                        waited_ms = waited.as_millis() as u64,
                        attempt,
                        "tool call timed out, retrying after {:?}",
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                other => break other,
            }
        };

        let result = match outcome {
            Ok(payload) => match reported_failure(&payload) {
                Some(message) => ToolResult::failure(
                    &canonical,
                    ToolError::server(message).with_details(&canonical, args.clone()),
                ),
                None => ToolResult::success(&canonical, payload),
            },
            Err(err) => ToolResult::failure(
                &canonical,
                classify(&canonical, &err).with_details(&canonical, args.clone()),
            ),
        };
        (args, result)
    }
}

/// Map a transport failure onto the error taxonomy.
fn classify(tool: &str, err: &TransportError) -> ToolError {
    match err {
        TransportError::Timeout(waited) => ToolError::timeout(tool, waited.as_secs_f64()),
        TransportError::Disconnected(message) => ToolError::connection(message.clone()),
        TransportError::Remote { code, message } => {
            ToolError::server(format!("{} (code {})", message, code))
        }
        TransportError::Protocol(message) => ToolError::new(ErrorKind::UnknownError, message.clone()),
    }
}

/// A bridge may answer with a normal result that itself reports failure:
/// `{"success": false, "error": "..."}` or `{"error": "..."}`.
fn reported_failure(payload: &Value) -> Option<String> {
    let map = payload.as_object()?;
    let explicit_failure = map.get("success").and_then(Value::as_bool) == Some(false);
    let error = map.get("error").filter(|e| !e.is_null());

    match (explicit_failure, error) {
        (_, Some(Value::String(message))) => Some(message.clone()),
        (true, Some(other)) => Some(compact_json(other, 200)),
        (true, None) => Some(
            map.get("message")
                .and_then(Value::as_str)
                .unwrap_or("remote call reported failure")
                .to_string(),
        ),
        (false, _) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use ceagent_domain::{ParamType, ParameterSpec, TimeoutClass, ToolCategory, ToolDescriptor};
    use serde_json::json;
    use std::time::Duration;

    fn registry() -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        registry
            .register(
                ToolDescriptor::new("ping", ToolCategory::Basic)
                    .with_timeout_class(TimeoutClass::Quick),
            )
            .unwrap();
        registry
            .register(
                ToolDescriptor::new("read_memory", ToolCategory::MemoryRead)
                    .with_parameter(ParameterSpec::required("address", ParamType::Integer))
                    .with_parameter(ParameterSpec::with_default("size", ParamType::Integer, 256)),
            )
            .unwrap();
        registry
            .register(
                ToolDescriptor::new("scan_all", ToolCategory::PatternScan)
                    .with_parameter(ParameterSpec::required("value", ParamType::String))
                    .with_timeout_class(TimeoutClass::Scan),
            )
            .unwrap();
        registry.register_alias("read", "read_memory");
        Arc::new(registry)
    }

    fn args(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn dispatcher(transport: ScriptedTransport) -> ToolDispatcher<ScriptedTransport> {
        ToolDispatcher::new(registry(), Arc::new(transport))
    }

    #[tokio::test]
    async fn test_unregistered_tool_is_parameter_error_with_one_step() {
        let dispatcher = dispatcher(ScriptedTransport::replying(json!("pong")));
        let mut context = ContextStore::default();

        let result = dispatcher
            .execute("format_disk", &args(json!({"drive": "c"})), &mut context)
            .await;

        assert!(!result.success);
        assert_eq!(result.error_kind(), Some(ErrorKind::ParameterError));
        assert_eq!(context.total_steps(), 1);
        assert_eq!(context.last_step().unwrap().tool_name, "format_disk");
        assert!(dispatcher.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_never_reaches_transport() {
        let dispatcher = dispatcher(ScriptedTransport::replying(json!({})));
        let mut context = ContextStore::default();

        let result = dispatcher
            .execute("read_memory", &args(json!({"size": "16"})), &mut context)
            .await;

        let error = result.error().unwrap();
        assert_eq!(error.kind, ErrorKind::ParameterError);
        assert_eq!(error.parameter.as_deref(), Some("address"));
        assert_eq!(error.details.as_ref().unwrap().command, "read_memory");
        assert_eq!(context.total_steps(), 1);
        assert!(dispatcher.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_success_sends_coerced_args_under_canonical_name() {
        let dispatcher = dispatcher(ScriptedTransport::replying(json!({"bytes": "90 90"})));
        let mut context = ContextStore::default();

        let result = dispatcher
            .execute("read", &args(json!({"address": "0x1000"})), &mut context)
            .await;

        assert!(result.success);
        assert_eq!(result.tool_name, "read_memory");
        assert_eq!(result.metadata.step_index, Some(0));
        let calls = dispatcher.transport().calls();
        assert_eq!(calls[0].0, "read_memory");
        assert_eq!(calls[0].1, json!({"address": 4096, "size": 256}));
        assert_eq!(
            context.last_step().unwrap().arguments,
            args(json!({"address": 4096, "size": 256}))
        );
    }

    #[tokio::test]
    async fn test_disconnect_is_connection_error() {
        let dispatcher = dispatcher(ScriptedTransport::from_fn(|_, _, _| {
            Err(TransportError::Disconnected("broken pipe".into()))
        }));
        let mut context = ContextStore::default();

        let result = dispatcher.execute("ping", &Map::new(), &mut context).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::ConnectionError));
        assert!(result.error().unwrap().message.contains("broken pipe"));
    }

    #[tokio::test]
    async fn test_remote_error_and_reported_failure_are_server_errors() {
        let dispatcher = dispatcher(ScriptedTransport::from_fn(|method, _, _| match method {
            "ping" => Err(TransportError::Remote {
                code: -32000,
                message: "no process opened".into(),
            }),
            _ => Ok(json!({"success": false, "error": "access violation"})),
        }));
        let mut context = ContextStore::default();

        let remote = dispatcher.execute("ping", &Map::new(), &mut context).await;
        assert_eq!(remote.error_kind(), Some(ErrorKind::ServerError));
        assert!(remote.error().unwrap().message.contains("no process opened"));

        let reported = dispatcher
            .execute("read_memory", &args(json!({"address": 1})), &mut context)
            .await;
        assert_eq!(reported.error_kind(), Some(ErrorKind::ServerError));
        assert_eq!(reported.error().unwrap().message, "access violation");
        assert_eq!(context.total_steps(), 2);
    }

    #[tokio::test]
    async fn test_protocol_error_is_unknown_error() {
        let dispatcher = dispatcher(ScriptedTransport::from_fn(|_, _, _| {
            Err(TransportError::Protocol("response without result".into()))
        }));
        let mut context = ContextStore::default();
        let result = dispatcher.execute("ping", &Map::new(), &mut context).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::UnknownError));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_retried_once_then_reported() {
        let dispatcher = dispatcher(ScriptedTransport::from_fn(|_, _, timeout| {
            Err(TransportError::Timeout(timeout))
        }));
        let mut context = ContextStore::default();

        let result = dispatcher.execute("ping", &Map::new(), &mut context).await;
        assert_eq!(result.error_kind(), Some(ErrorKind::TimeoutError));
        assert_eq!(dispatcher.transport().calls().len(), 2);
        assert_eq!(dispatcher.transport().calls()[0].2, Duration::from_secs(10));
        assert_eq!(context.total_steps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_retry_can_recover() {
        let dispatcher = dispatcher(ScriptedTransport::sequence(vec![
            Err(TransportError::Timeout(Duration::from_secs(10))),
            Ok(json!("pong")),
        ]));
        let mut context = ContextStore::default();

        let result = dispatcher.execute("ping", &Map::new(), &mut context).await;
        assert!(result.success);
        assert_eq!(context.total_steps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scans_are_not_retried() {
        let dispatcher = dispatcher(ScriptedTransport::from_fn(|_, _, timeout| {
            Err(TransportError::Timeout(timeout))
        }));
        let mut context = ContextStore::default();

        let result = dispatcher
            .execute("scan_all", &args(json!({"value": 100})), &mut context)
            .await;
        assert_eq!(result.error_kind(), Some(ErrorKind::TimeoutError));
        let calls = dispatcher.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].1, json!({"value": "100"}));
        assert_eq!(calls[0].2, Duration::from_secs(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_caps_scan_timeout() {
        let dispatcher = dispatcher(
            ScriptedTransport::replying(json!({"count": 1})).with_latency(Duration::from_secs(1000)),
        );
        let mut context = ContextStore::default();
        let started = Instant::now();
        let deadline = started + Duration::from_secs(10);

        let result = dispatcher
            .execute_until("scan_all", &args(json!({"value": 100})), &mut context, Some(deadline))
            .await;

        assert_eq!(result.error_kind(), Some(ErrorKind::TimeoutError));
        assert!(started.elapsed() <= Duration::from_secs(10));
        let calls = dispatcher.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, Duration::from_secs(10));
        assert_eq!(context.total_steps(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_skipped_when_backoff_crosses_deadline() {
        let dispatcher = dispatcher(
            ScriptedTransport::replying(json!("pong")).with_latency(Duration::from_secs(60)),
        );
        let mut context = ContextStore::default();
        let deadline = Instant::now() + Duration::from_secs(5);

        let result = dispatcher
            .execute_until("ping", &Map::new(), &mut context, Some(deadline))
            .await;

        assert_eq!(result.error_kind(), Some(ErrorKind::TimeoutError));
        let calls = dispatcher.transport().calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].2, Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_passed_deadline_records_timeout_without_sending() {
        let dispatcher = dispatcher(ScriptedTransport::replying(json!("pong")));
        let mut context = ContextStore::default();
        let deadline = Instant::now();

        let result = dispatcher
            .execute_until("ping", &Map::new(), &mut context, Some(deadline))
            .await;

        assert_eq!(result.error_kind(), Some(ErrorKind::TimeoutError));
        assert!(dispatcher.transport().calls().is_empty());
        assert_eq!(context.total_steps(), 1);
    }

    #[test]
    fn test_reported_failure_shapes() {
        assert_eq!(reported_failure(&json!({"error": "bad"})), Some("bad".into()));
        assert_eq!(
            reported_failure(&json!({"success": false, "message": "nope"})),
            Some("nope".into())
        );
        assert_eq!(reported_failure(&json!({"success": true, "error": null})), None);
        assert_eq!(reported_failure(&json!({"count": 3})), None);
        assert_eq!(reported_failure(&json!("error")), None);
    }
}
