use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use backend_domain::{EventScope, ParticipantId, RedemptionLogEntry, RedemptionLogRepository};

/// Process-local audit log, used when no ClickHouse is configured and in tests.
#[derive(Default)]
pub struct MemoryRedemptionLog {
    entries: Mutex<Vec<RedemptionLogEntry>>,
}

impl MemoryRedemptionLog {
    pub fn new() -> Self {
        Self::default()
    }
}

fn in_scope(entry: &RedemptionLogEntry, scope: &EventScope) -> bool {
    entry.period == scope.period && entry.event_key == scope.event_key
}

#[async_trait]
impl RedemptionLogRepository for MemoryRedemptionLog {
    async fn append(&self, entry: &RedemptionLogEntry) -> Result<()> {
        self.entries.lock().await.push(entry.clone());
        Ok(())
    }

    async fn list_for_event(&self, scope: &EventScope) -> Result<Vec<RedemptionLogEntry>> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .filter(|entry| in_scope(entry, scope))
            .cloned()
            .collect())
    }

    async fn delete_for_participant_event(
        &self,
        scope: &EventScope,
        participant_id: &ParticipantId,
    ) -> Result<u64> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|entry| !(in_scope(entry, scope) && &entry.participant_id == participant_id));
        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
