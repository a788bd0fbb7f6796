use std::path::Path;

use async_trait::async_trait;
use tokio::fs;

use backend_domain::{ConfigRepository, EventCatalogEntry};

pub struct ConfigFileRepository;

impl ConfigFileRepository {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ConfigFileRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigRepository for ConfigFileRepository {
    /// A missing catalog file is an empty catalog.
    async fn load_event_catalog(&self, path: &str) -> anyhow::Result<Vec<EventCatalogEntry>> {
        if !Path::new(path).exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path).await?;
        let entries: Vec<EventCatalogEntry> = serde_yaml::from_str(&content)?;
        Ok(entries)
    }

    async fn save_event_catalog(&self, path: &str, entries: &[EventCatalogEntry]) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_yaml::to_string(entries)?;
        fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use backend_domain::EventKey;

    use super::*;

    #[tokio::test]
    async fn catalog_yaml_with_default_schedule_parses() {
        let path = std::env::temp_dir().join(format!("voucher-events-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(
            &path,
            r#"
- event_key: SOUPS
  display_name: Soup night
  default_schedule:
    date: "2025-11-17"
    open_time: "23:30"
    close_time: "02:00"
- event_key: RB1
  display_name: Rooftop bar
"#,
        )
        .expect("write fixture");

        let repo = ConfigFileRepository::new();
        let path_str = path.to_string_lossy().to_string();
        let entries = repo.load_event_catalog(&path_str).await.expect("load");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].event_key, EventKey("SOUPS".to_string()));
        let schedule = entries[0].default_schedule.as_ref().expect("schedule");
        assert_eq!(schedule.close_time.as_deref(), Some("02:00"));
        assert!(entries[1].default_schedule.is_none());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn missing_catalog_is_empty() {
        let repo = ConfigFileRepository::new();
        let entries = repo
            .load_event_catalog("/nonexistent/voucher/events.yaml")
            .await
            .expect("load");
        assert!(entries.is_empty());
    }
}
