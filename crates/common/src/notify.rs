use async_trait::async_trait;

use crate::Result;

/// Best-effort alert channel (desktop pop-up, sound, chat message).
///
/// Callers run notifiers in detached tasks, so an implementation may block
/// for as long as it needs; it will be cut off by the dispatcher's timeout.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn notify(&self, message: &str) -> Result<()>;
}
