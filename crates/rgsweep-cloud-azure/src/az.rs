//! az CLI wrapper
//!
//! Runs `az` as a subprocess with JSON output and turns failures into
//! classified errors.

use crate::error::{AzureError, Result, classify_stderr};
use serde_json::Value;
use std::process::Stdio;
use tokio::process::Command;

/// az CLI wrapper
#[derive(Debug, Clone)]
pub struct AzCli {
    program: String,
    subscription: Option<String>,
}

impl Default for AzCli {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AzCli {
    pub fn new(subscription: Option<String>) -> Self {
        Self {
            program: "az".to_string(),
            subscription,
        }
    }

    /// Use a different executable (wrapper scripts, tests)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn subscription(&self) -> Option<&str> {
        self.subscription.as_deref()
    }

    /// Check that az is installed and logged in; returns the account name
    pub async fn check_auth(&self) -> Result<String> {
        let account = self.json(&["account", "show"]).await?;
        account
            .get("name")
            .and_then(|n| n.as_str())
            .map(str::to_string)
            .ok_or_else(|| AzureError::UnexpectedOutput("account show without a name".into()))
    }

    /// Full argument list for one invocation
    ///
    /// `az rest` addresses the subscription through its URL and takes no
    /// `--subscription`.
    pub fn command_line(&self, args: &[&str]) -> Vec<String> {
        let mut line: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        if let Some(subscription) = &self.subscription {
            if args.first() != Some(&"rest") {
                line.push("--subscription".to_string());
                line.push(subscription.clone());
            }
        }
        line.push("--output".to_string());
        line.push("json".to_string());
        line
    }

    /// Run an az command and return stdout
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        let line = self.command_line(args);
        let mut cmd = Command::new(&self.program);
        cmd.args(&line);
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Running: {} {}", self.program, line.join(" "));

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AzureError::CliNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_stderr(&stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    /// Run a command whose output is a JSON document (`Null` when empty)
    pub async fn json(&self, args: &[&str]) -> Result<Value> {
        let output = self.run(args).await?;
        if output.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&output)?)
    }

    /// Run a list command
    ///
    /// Accepts a bare array or a REST page (`{"value": [...]}`); empty output
    /// is an empty list.
    pub async fn list(&self, args: &[&str]) -> Result<Vec<Value>> {
        let value = self.json(args).await?;
        into_items(value)
    }

    /// Run a command for its effect only
    pub async fn exec(&self, args: &[&str]) -> Result<()> {
        self.run(args).await?;
        Ok(())
    }
}

fn into_items(value: Value) -> Result<Vec<Value>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        Value::Object(mut page) => match page.remove("value") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(AzureError::UnexpectedOutput(
                "expected a list or a page with 'value'".into(),
            )),
        },
        other => Err(AzureError::UnexpectedOutput(format!(
            "expected a list, got {}",
            other
        ))),
    }
}
