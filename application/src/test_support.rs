//! Scripted doubles for the transport, planner and session logger ports.

use crate::ports::planner::{Planner, PlannerError};
use crate::ports::rpc_transport::{RpcTransport, TransportError};
use crate::ports::session_logger::{SessionEvent, SessionLogger};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

type Responder = dyn Fn(&str, &Value, Duration) -> Result<Value, TransportError> + Send + Sync;

/// Transport answering from a closure or a fixed sequence, recording calls.
pub struct ScriptedTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<(String, Value, Duration)>>,
    open: AtomicBool,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn from_fn(
        f: impl Fn(&str, &Value, Duration) -> Result<Value, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(f),
            calls: Mutex::new(Vec::new()),
            open: AtomicBool::new(true),
            latency: None,
        }
    }

    /// Always answers with `value`.
    pub fn replying(value: Value) -> Self {
        Self::from_fn(move |_, _, _| Ok(value.clone()))
    }

    /// Answers in order, then reports a disconnect.
    pub fn sequence(responses: Vec<Result<Value, TransportError>>) -> Self {
        let queue = Mutex::new(VecDeque::from(responses));
        Self::from_fn(move |_, _, _| {
            queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Disconnected("script exhausted".into())))
        })
    }

    /// Every send waits `latency` (or its timeout, if shorter) first.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<(String, Value, Duration)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcTransport for ScriptedTransport {
    async fn send(
        &self,
        method: &str,
        params: Value,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone(), timeout));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency.min(timeout)).await;
            if latency >= timeout {
                return Err(TransportError::Timeout(timeout));
            }
        }
        if !self.is_open() {
            return Err(TransportError::Disconnected("transport closed".into()));
        }
        (self.responder)(method, &params, timeout)
    }

    async fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }
}

/// Which prompt the loop sent, recognised by its instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Planning,
    Selection,
    Observation,
    Reprompt,
}

impl Stage {
    pub fn of(prompt: &str) -> Self {
        if prompt.contains("could not be parsed reliably") {
            Stage::Reprompt
        } else if prompt.contains("Break the request into subtasks") {
            Stage::Planning
        } else if prompt.contains("Choose the next action") {
            Stage::Selection
        } else {
            Stage::Observation
        }
    }
}

type Script = dyn Fn(Stage, usize) -> Result<String, PlannerError> + Send + Sync;

/// Planner answering per stage; the closure also receives how many prompts
/// of that stage came before.
pub struct ScriptedPlanner {
    script: Box<Script>,
    prompts: Mutex<Vec<(Stage, String)>>,
    latency: Option<Duration>,
}

impl ScriptedPlanner {
    pub fn new(
        f: impl Fn(Stage, usize) -> Result<String, PlannerError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            script: Box::new(f),
            prompts: Mutex::new(Vec::new()),
            latency: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn prompts(&self) -> Vec<(Stage, String)> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn count(&self, stage: Stage) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == stage)
            .count()
    }
}

#[async_trait]
impl Planner for ScriptedPlanner {
    async fn complete(&self, prompt: &str) -> Result<String, PlannerError> {
        let stage = Stage::of(prompt);
        let seen = self.count(stage);
        self.prompts
            .lock()
            .unwrap()
            .push((stage, prompt.to_string()));
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        (self.script)(stage, seen)
    }
}

/// Session logger keeping every event in memory.
#[derive(Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<(&'static str, Value)>>,
}

impl RecordingLogger {
    pub fn of_type(&self, event_type: &str) -> Vec<Value> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == event_type)
            .map(|(_, payload)| payload.clone())
            .collect()
    }
}

impl SessionLogger for RecordingLogger {
    fn log(&self, event: SessionEvent) {
        self.events
            .lock()
            .unwrap()
            .push((event.event_type, event.payload));
    }
}
