use anyhow::{anyhow, Result};
use async_trait::async_trait;
use clickhouse::{Client, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use backend_domain::{
    EventKey,
    EventScope,
    ParticipantId,
    RedemptionLogEntry,
    RedemptionLogRepository,
};

use crate::utils::{chrono_to_offset, offset_to_chrono};

#[derive(Debug, Clone, Row, Serialize, Deserialize)]
struct RedemptionLogRow {
    id: String,
    period: String,
    participant_id: String,
    event_key: String,
    count: u32,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    at: OffsetDateTime,
    participant_name: String,
    event_name: String,
    quantity: u32,
    redeemed_after: bool,
}

impl From<&RedemptionLogEntry> for RedemptionLogRow {
    fn from(entry: &RedemptionLogEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            period: entry.period.clone(),
            participant_id: entry.participant_id.to_string(),
            event_key: entry.event_key.to_string(),
            count: entry.count,
            at: chrono_to_offset(entry.at),
            participant_name: entry.participant_name.clone().unwrap_or_default(),
            event_name: entry.event_name.clone().unwrap_or_default(),
            quantity: entry.quantity,
            redeemed_after: entry.redeemed_after,
        }
    }
}

impl TryFrom<RedemptionLogRow> for RedemptionLogEntry {
    type Error = anyhow::Error;

    fn try_from(row: RedemptionLogRow) -> Result<Self> {
        Ok(Self {
            id: Uuid::parse_str(&row.id).map_err(|err| anyhow!("bad log row id '{}': {}", row.id, err))?,
            period: row.period,
            participant_id: ParticipantId(row.participant_id),
            event_key: EventKey(row.event_key),
            count: row.count,
            at: offset_to_chrono(row.at),
            participant_name: Some(row.participant_name).filter(|name| !name.is_empty()),
            event_name: Some(row.event_name).filter(|name| !name.is_empty()),
            quantity: row.quantity,
            redeemed_after: row.redeemed_after,
        })
    }
}

/// Redemption audit log in ClickHouse.
#[derive(Clone)]
pub struct ClickhouseRedemptionLog {
    client: Client,
    database: String,
}

impl ClickhouseRedemptionLog {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        let create_log = r#"
CREATE TABLE IF NOT EXISTS redemption_log (
    id String,
    period String,
    participant_id String,
    event_key String,
    count UInt32,
    at DateTime64(3),
    participant_name String,
    event_name String,
    quantity UInt32,
    redeemed_after Bool
) ENGINE = MergeTree
PARTITION BY period
ORDER BY (period, event_key, participant_id, at)
"#;
        self.client.query(create_log).execute().await?;
        info!(database = %self.database, "redemption log schema ready");
        Ok(())
    }
}

#[async_trait]
impl RedemptionLogRepository for ClickhouseRedemptionLog {
    async fn append(&self, entry: &RedemptionLogEntry) -> Result<()> {
        let mut insert = self.client.insert("redemption_log")?;
        insert.write(&RedemptionLogRow::from(entry)).await?;
        insert.end().await?;
        Ok(())
    }

    async fn list_for_event(&self, scope: &EventScope) -> Result<Vec<RedemptionLogEntry>> {
        let rows = self
            .client
            .query("SELECT ?fields FROM redemption_log WHERE period = ? AND event_key = ? ORDER BY at DESC")
            .bind(scope.period.as_str())
            .bind(scope.event_key.as_str())
            .fetch_all::<RedemptionLogRow>()
            .await?;
        rows.into_iter().map(RedemptionLogEntry::try_from).collect()
    }

    async fn delete_for_participant_event(
        &self,
        scope: &EventScope,
        participant_id: &ParticipantId,
    ) -> Result<u64> {
        let matching: u64 = self
            .client
            .query("SELECT count() FROM redemption_log WHERE period = ? AND event_key = ? AND participant_id = ?")
            .bind(scope.period.as_str())
            .bind(scope.event_key.as_str())
            .bind(participant_id.as_str())
            .fetch_one()
            .await?;
        if matching == 0 {
            return Ok(0);
        }
        self.client
            .query("DELETE FROM redemption_log WHERE period = ? AND event_key = ? AND participant_id = ?")
            .bind(scope.period.as_str())
            .bind(scope.event_key.as_str())
            .bind(participant_id.as_str())
            .execute()
            .await?;
        Ok(matching)
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn row_conversion_keeps_optional_names() {
        let entry = RedemptionLogEntry {
            id: Uuid::new_v4(),
            period: "2025".to_string(),
            participant_id: ParticipantId("355".to_string()),
            event_key: EventKey("SOUPS".to_string()),
            count: 2,
            at: Utc.with_ymd_and_hms(2025, 11, 17, 22, 0, 0).unwrap(),
            participant_name: None,
            event_name: Some("Soup night".to_string()),
            quantity: 3,
            redeemed_after: false,
        };
        let row = RedemptionLogRow::from(&entry);
        assert_eq!(row.participant_name, "");
        let back = RedemptionLogEntry::try_from(row).expect("convert");
        assert_eq!(back, entry);
    }
}
