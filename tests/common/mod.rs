//! Shared integration-test harness for running `deckhand` as a child
//! process: headless presentations driven by a script on stdin, and one-shot
//! commands such as `validate` and `list`.

#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

/// Default timeout for a whole headless run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Returns the absolute path of a file under `tests/fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Runs a one-shot `deckhand` command and waits for it to exit.
#[allow(clippy::missing_panics_doc)]
pub fn spawn_command(args: &[&str]) -> std::process::Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_deckhand"))
        .args(args)
        .env_remove("DECKHAND_DECK")
        .env_remove("DECKHAND_LOG_LEVEL")
        .output()
        .expect("failed to run deckhand")
}

/// The outcome of a headless run.
#[derive(Debug)]
pub struct Run {
    /// Process exit code
    pub code: Option<i32>,
    /// Parsed JSONL events, in emission order
    pub events: Vec<Value>,
}

impl Run {
    /// Events of the given `type`.
    pub fn of_type(&self, kind: &str) -> Vec<&Value> {
        self.events.iter().filter(|e| e["type"] == kind).collect()
    }

    /// `type` of every event, in order.
    pub fn types(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| e["type"].as_str().map(ToString::to_string))
            .collect()
    }

    /// The final `DeckStopped` event.
    #[allow(clippy::missing_panics_doc)]
    pub fn stopped(&self) -> &Value {
        self.events
            .iter()
            .rev()
            .find(|e| e["type"] == "DeckStopped")
            .expect("no DeckStopped event")
    }

    /// Indices of every `SlideActivated` event, in order.
    pub fn activations(&self) -> Vec<u64> {
        self.of_type("SlideActivated")
            .iter()
            .filter_map(|e| e["index"].as_u64())
            .collect()
    }
}

/// Presents `deck` headlessly, feeding `script` on stdin, and collects the
/// event stream from stdout.
///
/// The child process is killed on drop via `kill_on_drop(true)`.
#[allow(clippy::missing_panics_doc)]
pub async fn present(deck: Option<&str>, script: &str, extra: &[&str]) -> Run {
    let mut args = vec!["present".to_string(), "--headless".to_string(), "--quiet".to_string()];
    if let Some(name) = deck {
        args.push(fixture_path(name).display().to_string());
    }
    args.extend(extra.iter().map(ToString::to_string));

    let mut child = Command::new(env!("CARGO_BIN_EXE_deckhand"))
        .args(&args)
        .env_remove("DECKHAND_DECK")
        .env_remove("DECKHAND_EVENTS_FILE")
        .env_remove("DECKHAND_SEED")
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("failed to spawn deckhand");

    let mut stdin = child.stdin.take().expect("stdin not captured");
    let stdout = child.stdout.take().expect("stdout not captured");

    stdin
        .write_all(script.as_bytes())
        .await
        .expect("failed to write script");
    drop(stdin);

    let collect = async {
        let mut events = Vec::new();
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines.next_line().await.expect("read_line I/O error") {
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                events.push(
                    serde_json::from_str::<Value>(trimmed)
                        .unwrap_or_else(|e| panic!("invalid JSON from deckhand: {e}: {trimmed}")),
                );
            }
        }
        let status = child.wait().await.expect("wait failed");
        Run {
            code: status.code(),
            events,
        }
    };

    tokio::time::timeout(DEFAULT_TIMEOUT, collect)
        .await
        .expect("deckhand did not finish in time")
}
