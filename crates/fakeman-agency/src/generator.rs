//! Text generation boundary.
//!
//! The agency never talks to a language model directly: it hands a prompt
//! to a [`Generator`] and gets text back or a failure. Deadlines are
//! enforced by the caller with `tokio::time::timeout`; a dropped call kills
//! any child process it started.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use fakeman_memory::{SummarizeError, Summarizer, SummaryInput};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::GeneratorError;
use crate::prompt;

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

/// Runs an external program per call: prompt on stdin, text on stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    program: String,
    args:    Vec<String>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            program: program.into(),
            args:    args.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a whitespace-separated command line. `None` when blank.
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let program = parts.next()?;
        Some(Self::new(program, parts))
    }
}

#[async_trait]
impl Generator for CommandGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(prompt.as_bytes()).await {
                Ok(()) => {}
                // The child may exit without reading; its status decides.
                Err(e) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
                Err(e) => return Err(e.into()),
            }
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GeneratorError::Failed(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(GeneratorError::Empty);
        }
        Ok(text)
    }
}

/// Dry-run generator: answers with the last line of the prompt.
#[derive(Debug, Clone, Default)]
pub struct EchoGenerator;

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let last = prompt.lines().rev().find(|l| !l.trim().is_empty()).unwrap_or("");
        Ok(format!("(echo) {}", last.trim()))
    }
}

/// Uses a [`Generator`] as the compaction log's summarizer.
///
/// Accepts either a JSON object with a `summary` field or plain text.
pub struct GeneratorSummarizer {
    generator: Arc<dyn Generator>,
}

impl GeneratorSummarizer {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl Summarizer for GeneratorSummarizer {
    async fn summarize(&self, inputs: &[SummaryInput]) -> Result<String, SummarizeError> {
        let text = self
            .generator
            .generate(&prompt::summary_prompt(inputs))
            .await
            .map_err(|e| SummarizeError::Failed(e.to_string()))?;

        let summary = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(serde_json::Value::Object(map)) => map
                .get("summary")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .ok_or_else(|| SummarizeError::Malformed("missing \"summary\" field".into()))?,
            _ => text,
        };
        let summary = summary.trim().to_string();
        if summary.is_empty() {
            return Err(SummarizeError::Malformed("empty summary".into()));
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct Fixed(&'static str);

    #[async_trait]
    impl Generator for Fixed {
        async fn generate(&self, _: &str) -> Result<String, GeneratorError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn command_generator_pipes_prompt_through() {
        let g = CommandGenerator::from_command_line("cat").unwrap();
        assert_eq!(g.generate("hello there\n").await.unwrap(), "hello there");
    }

    #[tokio::test]
    async fn command_generator_reports_exit_status() {
        let g = CommandGenerator::new("sh", ["-c", "echo boom >&2; exit 3"]);
        match g.generate("ignored").await {
            Err(GeneratorError::Failed(msg)) => assert!(msg.contains("boom")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn command_generator_can_be_abandoned() {
        let g = CommandGenerator::new("sleep", ["5"]);
        let r = tokio::time::timeout(Duration::from_millis(50), g.generate("x")).await;
        assert!(r.is_err());
    }

    #[test]
    fn blank_command_line_is_none() {
        assert!(CommandGenerator::from_command_line("   ").is_none());
    }

    #[tokio::test]
    async fn echo_returns_last_line() {
        let out = EchoGenerator.generate("context\nwhat now?\n\n").await.unwrap();
        assert_eq!(out, "(echo) what now?");
    }

    #[tokio::test]
    async fn summarizer_accepts_json_or_text() {
        let json = GeneratorSummarizer::new(Arc::new(Fixed(r#"{"summary":"talked about rain","key_events":["rain"]}"#)));
        assert_eq!(json.summarize(&[]).await.unwrap(), "talked about rain");

        let plain = GeneratorSummarizer::new(Arc::new(Fixed("  we chatted  ")));
        assert_eq!(plain.summarize(&[]).await.unwrap(), "we chatted");

        let bad = GeneratorSummarizer::new(Arc::new(Fixed(r#"{"text":"x"}"#)));
        assert!(matches!(bad.summarize(&[]).await, Err(SummarizeError::Malformed(_))));
    }
}
