use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::info;

use backend_domain::{Participant, ParticipantDirectory, ParticipantId};

use crate::utils::write_file_atomic;

/// Participant directory kept in memory and mirrored to a JSON file when a
/// path is configured.
pub struct FileParticipantDirectory {
    path: Option<PathBuf>,
    participants: RwLock<HashMap<ParticipantId, Participant>>,
}

impl FileParticipantDirectory {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            participants: RwLock::new(HashMap::new()),
        }
    }

    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let participants = if fs::try_exists(&path).await? {
            let content = fs::read_to_string(&path).await?;
            let list: Vec<Participant> = serde_json::from_str(&content)?;
            info!(path = %path.display(), participants = list.len(), "participant directory loaded");
            list.into_iter()
                .map(|participant| (participant.participant_id.clone(), participant))
                .collect()
        } else {
            HashMap::new()
        };
        Ok(Self {
            path: Some(path),
            participants: RwLock::new(participants),
        })
    }
}

async fn save(path: &Path, participants: &HashMap<ParticipantId, Participant>) -> Result<()> {
    let mut list: Vec<&Participant> = participants.values().collect();
    list.sort_by(|a, b| a.participant_id.cmp(&b.participant_id));
    let content = serde_json::to_string_pretty(&list)?;
    write_file_atomic(path, content).await
}

#[async_trait]
impl ParticipantDirectory for FileParticipantDirectory {
    async fn lookup(&self, participant_id: &ParticipantId) -> Result<Option<Participant>> {
        Ok(self.participants.read().await.get(participant_id).cloned())
    }

    /// Fields missing from `participant` keep their stored value.
    async fn upsert(&self, participant: &Participant) -> Result<()> {
        let mut participants = self.participants.write().await;
        let merged = match participants.get(&participant.participant_id) {
            Some(existing) => Participant {
                participant_id: participant.participant_id.clone(),
                name: participant.name.clone().or_else(|| existing.name.clone()),
                hotel: participant.hotel.clone().or_else(|| existing.hotel.clone()),
                reservation_num: participant
                    .reservation_num
                    .clone()
                    .or_else(|| existing.reservation_num.clone()),
                adults: participant.adults.or(existing.adults),
            },
            None => participant.clone(),
        };
        participants.insert(merged.participant_id.clone(), merged);
        if let Some(path) = self.path.as_ref() {
            save(path, &participants).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(name: Option<&str>, adults: Option<u32>) -> Participant {
        Participant {
            participant_id: ParticipantId("355".to_string()),
            name: name.map(str::to_string),
            hotel: None,
            reservation_num: None,
            adults,
        }
    }

    #[tokio::test]
    async fn upsert_merges_missing_fields() {
        let directory = FileParticipantDirectory::in_memory();
        directory
            .upsert(&participant(Some("Dana"), Some(2)))
            .await
            .expect("upsert");
        directory
            .upsert(&participant(None, Some(3)))
            .await
            .expect("upsert");

        let found = directory
            .lookup(&ParticipantId("355".to_string()))
            .await
            .expect("lookup")
            .expect("present");
        assert_eq!(found.name.as_deref(), Some("Dana"));
        assert_eq!(found.adults, Some(3));
    }

    #[tokio::test]
    async fn file_directory_round_trips() {
        let path = std::env::temp_dir().join(format!("voucher-participants-{}.json", uuid::Uuid::new_v4()));
        let directory = FileParticipantDirectory::load(&path).await.expect("load");
        directory
            .upsert(&participant(Some("Dana"), Some(2)))
            .await
            .expect("upsert");

        let reloaded = FileParticipantDirectory::load(&path).await.expect("reload");
        let found = reloaded
            .lookup(&ParticipantId("355".to_string()))
            .await
            .expect("lookup");
        assert!(found.is_some());

        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        assert!(!std::path::PathBuf::from(tmp).exists());
        let _ = std::fs::remove_file(path);
    }
}
