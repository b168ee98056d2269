use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::digest::{Draft, LinkRecord, Section};
use crate::error::{DigestError, Result};

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const SYSTEM_PROMPT: &str = "You are an expert content curator and technical writer.";

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

/// The JSON shape the model is asked to produce. Links are referenced
/// by index into the numbered list embedded in the prompt, so the model
/// cannot smuggle in URLs that were never fetched.
#[derive(Serialize, Deserialize)]
struct RawDraft {
    #[serde(default)]
    intro: String,
    #[serde(default)]
    tags: Vec<String>,
    sections: Vec<RawSection>,
}

#[derive(Serialize, Deserialize)]
struct RawSection {
    heading: String,
    #[serde(default)]
    summary: String,
    link_indices: Vec<usize>,
}

pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| DigestError::Generation(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            model,
        })
    }

    /// Send one chat completion. A single retry on a 5xx status is the
    /// only recovery; everything else is surfaced as-is.
    pub async fn complete(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            temperature,
            max_tokens: 2048,
            top_p: 0.95,
        };

        for attempt in 0..2 {
            let response = self
                .client
                .post(OPENROUTER_URL)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    DigestError::Generation(format!("Request to OpenRouter failed: {}", e))
                })?;

            let status = response.status();

            if status.is_server_error() && attempt == 0 {
                eprintln!("OpenRouter returned {}, retrying once...", status);
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                continue;
            }

            if !status.is_success() {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| String::from("unknown error"));
                return Err(DigestError::Generation(format!(
                    "OpenRouter API returned error: {} - {}",
                    status, error_text
                )));
            }

            let chat_response = response.json::<ChatResponse>().await.map_err(|e| {
                DigestError::Generation(format!("Failed to parse OpenRouter response: {}", e))
            })?;

            let content = chat_response
                .choices
                .first()
                .map(|c| c.message.content.trim().to_string())
                .unwrap_or_default();

            if content.is_empty() {
                return Err(DigestError::Generation(
                    "Empty content in LLM response".to_string(),
                ));
            }

            return Ok(content);
        }

        Err(DigestError::Generation(
            "OpenRouter retry exhausted".to_string(),
        ))
    }
}

pub struct DraftGenerator {
    openrouter: OpenRouterClient,
}

impl DraftGenerator {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Ok(Self {
            openrouter: OpenRouterClient::new(api_key, model)?,
        })
    }

    pub async fn generate(&self, links: &[LinkRecord]) -> Result<Draft> {
        let prompt = build_prompt(links);
        let response = self.openrouter.complete(&prompt, 0.7).await?;
        parse_draft(&response, links)
    }

    /// Revise a draft from the operator's free-text feedback. The valid
    /// link set is what the draft currently holds, so links the operator
    /// already removed stay removed.
    pub async fn polish(&self, draft: &Draft, feedback: &str) -> Result<Draft> {
        let links = draft.links();
        let prompt = build_polish_prompt(draft, feedback);
        let response = self.openrouter.complete(&prompt, 0.5).await?;
        parse_draft(&response, &links)
    }
}

pub fn build_prompt(links: &[LinkRecord]) -> String {
    format!(
        "Create a well-structured weekly digest from these {count} links saved this week.\n\n\
        LINKS DATA:\n{links}\n\
        REQUIREMENTS:\n\
        1. Group the links into a small number of themed sections\n\
        2. Write a general 300 word description of the week's activity as the intro\n\
        3. Write a brief, insightful summary for each section\n\
        4. Each link must come from LINKS DATA, referenced by its index\n\
        5. Keep the tone professional but engaging, you have 20+ years experience of url link curation\n\
        6. Suggest relevant tags for the post\n\
        7. DO NOT reference link indices not present in LINKS DATA\n\n\
        Respond with a single JSON object and nothing else:\n\
        {{\n\
          \"intro\": \"general description of the week\",\n\
          \"tags\": [\"tag-one\", \"tag-two\"],\n\
          \"sections\": [\n\
            {{\n\
              \"heading\": \"Section Title\",\n\
              \"summary\": \"what ties these links together\",\n\
              \"link_indices\": [0, 2]\n\
            }}\n\
          ]\n\
        }}\n\n\
        Important: every link index from 0 to {max} must appear in exactly one section.",
        count = links.len(),
        links = format_links(links),
        max = links.len().saturating_sub(1)
    )
}

pub fn build_polish_prompt(draft: &Draft, feedback: &str) -> String {
    let links = draft.links();
    let current = draft_to_raw_json(draft);

    format!(
        "Here is the current draft of a weekly link digest, as JSON. Link indices\n\
        refer to the LINKS DATA below.\n\n\
        CURRENT DRAFT:\n{current}\n\n\
        LINKS DATA:\n{links_text}\n\
        EDITOR FEEDBACK:\n{feedback}\n\n\
        Revise the draft based on the editor's feedback while maintaining the same\n\
        JSON structure, an engaging tone, and technical accuracy. Respond with a\n\
        single JSON object and nothing else. Every link index from 0 to {max} must\n\
        appear in exactly one section.",
        current = current,
        links_text = format_links(&links),
        feedback = feedback,
        max = links.len().saturating_sub(1)
    )
}

fn format_links(links: &[LinkRecord]) -> String {
    links
        .iter()
        .enumerate()
        .map(|(idx, link)| {
            format!(
                "{idx}: **{title}**\n   URL: {url}\n   Description: {desc}\n   Tags: {tags}\n   Saved: {saved}\n",
                idx = idx,
                title = link.title,
                url = link.url,
                desc = link.description.as_deref().unwrap_or("(none)"),
                tags = link.tags.join(", "),
                saved = link.saved_at.format("%Y-%m-%d")
            )
        })
        .collect()
}

fn draft_to_raw_json(draft: &Draft) -> String {
    let mut next_index = 0;
    let raw = RawDraft {
        intro: draft.intro.clone(),
        tags: draft.suggested_tags.clone(),
        sections: draft
            .sections
            .iter()
            .map(|section| {
                let indices = (next_index..next_index + section.items.len()).collect();
                next_index += section.items.len();
                RawSection {
                    heading: section.heading.clone(),
                    summary: section.summary.clone(),
                    link_indices: indices,
                }
            })
            .collect(),
    };

    // RawDraft has no non-serializable fields, so this cannot fail
    serde_json::to_string_pretty(&raw).unwrap_or_default()
}

/// Parse the model's response into a Draft, repairing index mistakes so
/// that every fetched link lands in exactly one section:
/// out-of-range indices are dropped (they reference nothing we fetched),
/// duplicates keep their first placement, and links the model forgot are
/// collected into a trailing "Also Noted" section.
pub fn parse_draft(response: &str, links: &[LinkRecord]) -> Result<Draft> {
    let json_text = extract_json(response);

    let raw: RawDraft = serde_json::from_str(json_text).map_err(|e| {
        DigestError::Generation(format!("Failed to parse draft JSON response: {}", e))
    })?;

    if raw.sections.is_empty() && !links.is_empty() {
        return Err(DigestError::Generation(
            "Draft response contained no sections".to_string(),
        ));
    }

    let mut seen = vec![false; links.len()];
    let mut sections = Vec::new();

    for raw_section in raw.sections {
        let mut items = Vec::new();
        for idx in raw_section.link_indices {
            if idx >= links.len() {
                eprintln!("⚠ Ignoring hallucinated link index {} in draft", idx);
                continue;
            }
            if seen[idx] {
                eprintln!("⚠ Link index {} appeared twice, keeping first placement", idx);
                continue;
            }
            seen[idx] = true;
            items.push(links[idx].clone());
        }
        if !items.is_empty() {
            sections.push(Section {
                heading: raw_section.heading,
                items,
                summary: raw_section.summary,
            });
        }
    }

    let forgotten: Vec<LinkRecord> = seen
        .iter()
        .enumerate()
        .filter(|(_, seen)| !**seen)
        .map(|(idx, _)| links[idx].clone())
        .collect();

    if !forgotten.is_empty() {
        eprintln!(
            "⚠ Draft omitted {} link(s), adding them to an 'Also Noted' section",
            forgotten.len()
        );
        sections.push(Section {
            heading: "Also Noted".to_string(),
            items: forgotten,
            summary: String::new(),
        });
    }

    Ok(Draft {
        intro: raw.intro,
        suggested_tags: raw.tags,
        sections,
    })
}

/// Models often wrap JSON in prose or code fences; take the outermost
/// brace-delimited slice.
fn extract_json(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}
