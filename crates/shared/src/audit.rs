//! Security audit sink.
//!
//! Fire-and-forget recording of security-relevant events (lockouts,
//! password resets, second-factor changes). Implementations must never
//! fail the calling flow and must never be handed raw tokens or secrets;
//! metadata is restricted to user ids, emails, and action names.

use async_trait::async_trait;

/// Contract for recording security events.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Records one event. Infallible from the caller's perspective.
    async fn record(&self, event_type: &str, metadata: serde_json::Value);
}

/// Audit sink that emits events into the tracing pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

#[async_trait]
impl AuditSink for TracingAuditSink {
    async fn record(&self, event_type: &str, metadata: serde_json::Value) {
        tracing::info!(target: "florin::audit", event = event_type, %metadata, "security event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_tracing_sink_accepts_events() {
        let sink = TracingAuditSink;
        sink.record("account_locked", json!({ "email": "user@example.com" }))
            .await;
    }
}
