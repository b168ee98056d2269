use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::digest::LinkRecord;
use crate::error::{DigestError, Result};

#[derive(Debug, Deserialize)]
struct RawLink {
    id: i64,
    url: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    created_at: String,
    #[serde(default)]
    tags: Vec<RawTag>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    name: String,
}

/// Laravel pagination envelope returned by LinkAce list endpoints.
#[derive(Debug, Deserialize)]
struct LinkPage {
    current_page: u32,
    last_page: u32,
    data: Vec<RawLink>,
}

pub struct LinkAceClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl LinkAceClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DigestError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    /// Fetch all links in the list saved on or after `since`, in the
    /// server-provided (newest first) order.
    pub async fn fetch_links(&self, list_id: i64, since: DateTime<Utc>) -> Result<Vec<LinkRecord>> {
        let mut all_links = Vec::new();
        let mut page = 1;

        loop {
            let url = format!(
                "{}/api/v2/lists/{}/links?per_page=100&order_by=created_at&order_dir=desc&page={}",
                self.base_url, list_id, page
            );

            let response = self
                .client
                .get(&url)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(|e| DigestError::Fetch(format!("Request to LinkAce failed: {}", e)))?;

            let status = response.status();
            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("unknown error"));
                return Err(DigestError::Fetch(format!(
                    "LinkAce API returned error: {} - {}",
                    status, error_text
                )));
            }

            let body = response
                .text()
                .await
                .map_err(|e| DigestError::Fetch(format!("Failed to read response body: {}", e)))?;

            let link_page = parse_page(&body)?;
            let is_last = link_page.current_page >= link_page.last_page;

            let records = convert_links(link_page.data)?;

            // Pages are newest first, so once a page runs past the window
            // the remaining pages are all older.
            let page_exhausted = records.iter().any(|r| r.saved_at < since);
            all_links.extend(records);

            if is_last || page_exhausted {
                break;
            }
            page += 1;
        }

        Ok(filter_since(all_links, since))
    }
}

fn parse_page(body: &str) -> Result<LinkPage> {
    serde_json::from_str(body)
        .map_err(|e| DigestError::Fetch(format!("Failed to parse LinkAce response: {}", e)))
}

fn convert_links(raw: Vec<RawLink>) -> Result<Vec<LinkRecord>> {
    raw.into_iter()
        .map(|link| {
            let saved_at = link.created_at.parse::<DateTime<Utc>>().map_err(|e| {
                DigestError::Fetch(format!(
                    "Invalid created_at '{}' on link {}: {}",
                    link.created_at, link.id, e
                ))
            })?;

            Ok(LinkRecord {
                id: link.id,
                url: link.url,
                title: link.title,
                description: link.description.filter(|d| !d.trim().is_empty()),
                saved_at,
                tags: link.tags.into_iter().map(|t| t.name).collect(),
            })
        })
        .collect()
}

fn filter_since(links: Vec<LinkRecord>, since: DateTime<Utc>) -> Vec<LinkRecord> {
    links.into_iter().filter(|l| l.saved_at >= since).collect()
}
