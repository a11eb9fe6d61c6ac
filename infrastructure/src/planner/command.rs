//! Planner backed by an external command.
//!
//! Each prompt runs the command once: the prompt is written to stdin and the
//! whole of stdout is the answer. A non-zero exit, a spawn failure or a
//! timeout becomes a [`PlannerError`].

use async_trait::async_trait;
use ceagent_application::{Planner, PlannerError};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default time a single planner invocation may take
pub const DEFAULT_PLANNER_TIMEOUT: Duration = Duration::from_secs(120);

/// Maximum stderr included in a failure message
const STDERR_EXCERPT: usize = 512;

#[derive(Debug, Clone)]
pub struct CommandPlanner {
    command: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandPlanner {
    pub fn new(command: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            command: command.into(),
            args,
            timeout: DEFAULT_PLANNER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    async fn run(&self, prompt: &str) -> Result<String, PlannerError> {
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                PlannerError::Unavailable(format!("failed to spawn '{}': {}", self.command, e))
            })?;

        // Feed stdin while draining stdout so a large prompt cannot fill both pipes.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                // A planner that ignores stdin may exit before reading it all.
                if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                    debug!("Planner closed stdin early: {}", e);
                }
            }
        };
        let ((), output) = tokio::join!(feed, child.wait_with_output());
        let output =
            output.map_err(|e| PlannerError::Failed(format!("failed to wait for planner: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt = ceagent_domain::truncate(stderr.trim(), STDERR_EXCERPT);
            return Err(PlannerError::Failed(format!(
                "'{}' exited with {}: {}",
                self.command, output.status, excerpt
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Planner for CommandPlanner {
    async fn complete(&self, prompt: &str) -> Result<String, PlannerError> {
        debug!(command = %self.command, "Planner prompt ({} bytes)", prompt.len());
        match tokio::time::timeout(self.timeout, self.run(prompt)).await {
            Ok(result) => {
                if let Ok(text) = &result {
                    debug!("Planner answered ({} bytes)", text.len());
                }
                result
            }
            Err(_) => {
                warn!(
                    command = %self.command,
                    "Planner timed out after {}s", self.timeout.as_secs()
                );
                Err(PlannerError::Timeout(self.timeout.as_secs()))
            }
        }
    }

    fn name(&self) -> &str {
        &self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn sh(script: &str) -> CommandPlanner {
        CommandPlanner::new("sh", vec!["-c".to_string(), script.to_string()])
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_prompt_goes_to_stdin() {
        let planner = sh("cat");
        let answer = planner.complete("{\"kind\": \"finalize\"}").await.unwrap();
        assert_eq!(answer, "{\"kind\": \"finalize\"}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let planner = sh("echo 'quota exceeded' >&2; exit 2");
        let err = planner.complete("hi").await.unwrap_err();
        match err {
            PlannerError::Failed(message) => assert!(message.contains("quota exceeded")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let planner = sh("sleep 5").with_timeout(Duration::from_millis(100));
        let err = planner.complete("hi").await.unwrap_err();
        assert_eq!(err, PlannerError::Timeout(0));
    }

    #[tokio::test]
    async fn test_missing_command_is_unavailable() {
        let planner = CommandPlanner::new("/nonexistent/planner", vec![]);
        let err = planner.complete("hi").await.unwrap_err();
        assert!(matches!(err, PlannerError::Unavailable(_)));
    }

    #[test]
    fn test_name_is_command() {
        assert_eq!(CommandPlanner::new("llm", vec![]).name(), "llm");
    }
}
