use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use common::{Error, Notifier, Result};

/// Fans a message out to every configured notifier without blocking the
/// caller. Each delivery runs in its own task under a timeout; failures are
/// logged inside that task.
#[derive(Clone)]
pub struct AlertDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    timeout: Duration,
}

impl AlertDispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            notifiers: Vec::new(),
            timeout,
        }
    }

    pub fn with(mut self, notifier: Arc<dyn Notifier>) -> Self {
        info!(notifier = notifier.name(), "Registered alert channel");
        self.notifiers.push(notifier);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    /// Spawn one detached delivery per notifier. The handles may be dropped;
    /// they are returned so callers that care can wait for completion.
    pub fn dispatch(&self, message: &str) -> Vec<JoinHandle<()>> {
        self.notifiers
            .iter()
            .map(|notifier| {
                let notifier = Arc::clone(notifier);
                let message = message.to_string();
                let timeout = self.timeout;
                tokio::spawn(async move {
                    match tokio::time::timeout(timeout, notifier.notify(&message)).await {
                        Ok(Ok(())) => debug!(notifier = notifier.name(), "Alert delivered"),
                        Ok(Err(e)) => {
                            warn!(notifier = notifier.name(), error = %e, "Alert delivery failed")
                        }
                        Err(_) => {
                            warn!(notifier = notifier.name(), ?timeout, "Alert delivery timed out")
                        }
                    }
                })
            })
            .collect()
    }
}

/// Runs an external program per alert, e.g. `notify-send` for a desktop
/// pop-up or `paplay notification.wav` for a sound cue. Every `{message}` in
/// the arguments is replaced with the alert text.
#[derive(Debug, Clone)]
pub struct CommandNotifier {
    name: String,
    program: String,
    args: Vec<String>,
}

impl CommandNotifier {
    /// Build from a command line. Arguments are split on whitespace; double
    /// quotes group words into one argument.
    pub fn parse(name: impl Into<String>, command_line: &str) -> Result<Self> {
        let mut words = split_command_line(command_line).into_iter();
        let program = words
            .next()
            .ok_or_else(|| Error::Config("alert command must not be empty".into()))?;
        Ok(Self {
            name: name.into(),
            program,
            args: words.collect(),
        })
    }

    fn render_args(&self, message: &str) -> Vec<String> {
        self.args.iter().map(|a| a.replace("{message}", message)).collect()
    }
}

#[async_trait]
impl Notifier for CommandNotifier {
    fn name(&self) -> &str {
        &self.name
    }

    async fn notify(&self, message: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(self.render_args(message))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;

        if status.success() {
            Ok(())
        } else {
            Err(Error::Notify(format!("'{}' exited with {status}", self.program)))
        }
    }
}

fn split_command_line(line: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_word = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }
    if has_word {
        words.push(current);
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recording {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn notify(&self, message: &str) -> Result<()> {
            self.seen.lock().unwrap().push(message.to_string());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        async fn notify(&self, _message: &str) -> Result<()> {
            Err(Error::Notify("speaker unplugged".into()))
        }
    }

    struct Hanging;

    #[async_trait]
    impl Notifier for Hanging {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn notify(&self, _message: &str) -> Result<()> {
            std::future::pending::<()>().await;
            Ok(())
        }
    }

    #[test]
    fn command_line_respects_quotes() {
        assert_eq!(
            split_command_line(r#"notify-send "Crypto Trading Signal" {message}"#),
            vec!["notify-send", "Crypto Trading Signal", "{message}"]
        );
        assert_eq!(split_command_line("  paplay  a.wav "), vec!["paplay", "a.wav"]);
        assert_eq!(split_command_line(r#"echo """#), vec!["echo", ""]);
        assert!(split_command_line("   ").is_empty());
    }

    #[test]
    fn message_placeholder_is_substituted() {
        let n = CommandNotifier::parse("desktop", r#"notify-send "Signal: {message}""#).unwrap();
        assert_eq!(n.render_args("BUY"), vec!["Signal: BUY"]);
        assert!(CommandNotifier::parse("empty", "").is_err());
    }

    #[tokio::test]
    async fn failures_and_hangs_do_not_block_other_channels() {
        let recording = Arc::new(Recording { seen: Mutex::new(Vec::new()) });
        let dispatcher = AlertDispatcher::new(Duration::from_millis(50))
            .with(Arc::new(Failing))
            .with(Arc::new(Hanging))
            .with(recording.clone());

        let handles = dispatcher.dispatch("SELL SIGNAL for BTCUSDT at $1.00");
        assert_eq!(handles.len(), 3);
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(*recording.seen.lock().unwrap(), vec!["SELL SIGNAL for BTCUSDT at $1.00"]);
    }

    #[tokio::test]
    async fn empty_dispatcher_spawns_nothing() {
        let dispatcher = AlertDispatcher::new(Duration::from_secs(1));
        assert!(dispatcher.is_empty());
        assert!(dispatcher.dispatch("hello").is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn command_exit_status_is_reported() {
        let ok = CommandNotifier::parse("ok", "true").unwrap();
        assert!(ok.notify("x").await.is_ok());

        let failing = CommandNotifier::parse("fail", "false").unwrap();
        assert!(matches!(failing.notify("x").await, Err(Error::Notify(_))));
    }
}
