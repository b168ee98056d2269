use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One bookmarked URL as returned by LinkAce. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkRecord {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub saved_at: DateTime<Utc>,
    pub tags: Vec<String>,
}

/// A grouped slice of the week's links with an LLM-written summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub heading: String,
    pub items: Vec<LinkRecord>,
    pub summary: String,
}

/// The reviewable digest draft. Built by the generator, edited in place
/// during review, consumed once by the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    pub intro: String,
    pub suggested_tags: Vec<String>,
    pub sections: Vec<Section>,
}

impl Draft {
    pub fn link_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// All records currently in the draft, in section order.
    pub fn links(&self) -> Vec<LinkRecord> {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter().cloned())
            .collect()
    }
}

#[cfg(test)]
pub(crate) fn test_link(id: i64, title: &str) -> LinkRecord {
    use chrono::TimeZone;

    LinkRecord {
        id,
        url: format!("https://example.com/{}", id),
        title: title.to_string(),
        description: Some(format!("About {}", title)),
        saved_at: Utc.with_ymd_and_hms(2026, 8, 25, 12, 0, 0).unwrap(),
        tags: vec!["rust".to_string()],
    }
}
