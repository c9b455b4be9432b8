use async_trait::async_trait;

/// Fire-and-forget alert channel.
///
/// Implementations swallow delivery failures (logging them at most);
/// a dead notifier must never affect engine correctness.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, text: &str);
}
