use serde::{Deserialize, Serialize};

/// One row of the catalog ledger.
///
/// Rows are addressed over the wire by their ordinal position at read time,
/// which shifts on delete; `id` is a stable generated key persisted for
/// forward migration but not yet part of the HTTP contract. Optional fields
/// serialize as empty strings so the CSV stays flat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub date: String,
    pub length: u64,
    pub tone: String,
    pub prompt: String,
    pub voice: String,
    pub speed: String,
    pub pitch: String,
    pub format: String,
    pub quality: String,
    pub file_path: String,
    pub user: String,
    pub tenant: String,
    pub object_store_url: String,
}

/// Conjunctive catalog filters. Exact match everywhere except `title`
/// (case-insensitive substring) and `date` (matches the date prefix of the
/// stored timestamp).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilters {
    pub user: Option<String>,
    pub tenant: Option<String>,
    pub date: Option<String>,
    pub format: Option<String>,
    pub title: Option<String>,
}

impl CatalogFilters {
    pub fn matches(&self, entry: &CatalogEntry) -> bool {
        if let Some(user) = &self.user {
            if &entry.user != user {
                return false;
            }
        }
        if let Some(tenant) = &self.tenant {
            if &entry.tenant != tenant {
                return false;
            }
        }
        if let Some(date) = &self.date {
            if !entry.date.starts_with(date.as_str()) {
                return false;
            }
        }
        if let Some(format) = &self.format {
            if &entry.format != format {
                return false;
            }
        }
        if let Some(title) = &self.title {
            if !entry
                .title
                .to_lowercase()
                .contains(&title.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Fields a caller may change on an existing entry. Everything else
/// (paths, ownership, timestamps) is fixed at creation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CatalogUpdate {
    pub title: Option<String>,
    pub tone: Option<String>,
    pub prompt: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<String>,
    pub pitch: Option<String>,
    pub quality: Option<String>,
}

impl CatalogUpdate {
    pub fn apply(&self, entry: &mut CatalogEntry) {
        if let Some(v) = &self.title {
            entry.title = v.clone();
        }
        if let Some(v) = &self.tone {
            entry.tone = v.clone();
        }
        if let Some(v) = &self.prompt {
            entry.prompt = v.clone();
        }
        if let Some(v) = &self.voice {
            entry.voice = v.clone();
        }
        if let Some(v) = &self.speed {
            entry.speed = v.clone();
        }
        if let Some(v) = &self.pitch {
            entry.pitch = v.clone();
        }
        if let Some(v) = &self.quality {
            entry.quality = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> CatalogEntry {
        CatalogEntry {
            id: "id-1".to_string(),
            title: "Morning News".to_string(),
            date: "2026-08-31 09:15:00".to_string(),
            length: 42,
            tone: String::new(),
            prompt: String::new(),
            voice: "ava".to_string(),
            speed: String::new(),
            pitch: String::new(),
            format: "wav".to_string(),
            quality: "medium".to_string(),
            file_path: "2026/08/31/x.wav".to_string(),
            user: "alice".to_string(),
            tenant: "acme".to_string(),
            object_store_url: String::new(),
        }
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let filters = CatalogFilters {
            user: Some("alice".to_string()),
            format: Some("wav".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&entry()));

        let filters = CatalogFilters {
            user: Some("alice".to_string()),
            format: Some("mp3".to_string()),
            ..Default::default()
        };
        assert!(!filters.matches(&entry()));
    }

    #[test]
    fn test_title_filter_is_case_insensitive_substring() {
        let filters = CatalogFilters {
            title: Some("morning".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&entry()));

        let filters = CatalogFilters {
            title: Some("evening".to_string()),
            ..Default::default()
        };
        assert!(!filters.matches(&entry()));
    }

    #[test]
    fn test_date_filter_matches_day_prefix() {
        let filters = CatalogFilters {
            date: Some("2026-08-31".to_string()),
            ..Default::default()
        };
        assert!(filters.matches(&entry()));

        let filters = CatalogFilters {
            date: Some("2026-09-01".to_string()),
            ..Default::default()
        };
        assert!(!filters.matches(&entry()));
    }

    #[test]
    fn test_update_applies_only_declared_fields() {
        let mut e = entry();
        let update = CatalogUpdate {
            title: Some("Evening News".to_string()),
            tone: Some("calm".to_string()),
            ..Default::default()
        };
        update.apply(&mut e);
        assert_eq!(e.title, "Evening News");
        assert_eq!(e.tone, "calm");
        assert_eq!(e.voice, "ava");
        assert_eq!(e.file_path, "2026/08/31/x.wav");
    }
}
