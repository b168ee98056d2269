use chrono::{DateTime, Utc};
use std::fs;
use std::path::PathBuf;

use crate::digest::Draft;
use crate::error::{DigestError, Result};

const BASE_TAGS: [&str; 3] = ["weekly-digest", "curated-links", "reading-list"];

/// Renders the approved draft as a Hugo content file and writes it into
/// the site's content directory. The only component with a side effect.
pub struct HugoExporter {
    content_dir: PathBuf,
    author: String,
    filename_prefix: String,
}

impl HugoExporter {
    pub fn new(
        content_dir: impl Into<PathBuf>,
        author: impl Into<String>,
        filename_prefix: impl Into<String>,
    ) -> Self {
        Self {
            content_dir: content_dir.into(),
            author: author.into(),
            filename_prefix: filename_prefix.into(),
        }
    }

    pub fn filename(&self, date: DateTime<Utc>) -> String {
        format!("{}-{}.md", date.format("%Y-%m-%d"), self.filename_prefix)
    }

    pub fn target_path(&self, date: DateTime<Utc>) -> PathBuf {
        self.content_dir.join(self.filename(date))
    }

    /// Render the full document: front matter in fixed key order, then
    /// the Markdown body. Byte-identical for the same draft and date.
    pub fn render(&self, draft: &Draft, date: DateTime<Utc>) -> String {
        let mut doc = self.render_front_matter(draft, date);
        doc.push_str(&render_body(draft));
        doc
    }

    fn render_front_matter(&self, draft: &Draft, date: DateTime<Utc>) -> String {
        let title = digest_title(date);
        let tags = merged_tags(&draft.suggested_tags);
        // Tags render as a JSON array, which is valid front-matter YAML
        let tags_json = serde_json::to_string(&tags).unwrap_or_else(|_| "[]".to_string());

        format!(
            "---\n\
            title: \"{title}\"\n\
            date: {date}\n\
            draft: false\n\
            description: \"Weekly curated links and insights from my reading list\"\n\
            categories: [\"Weekly Digest\", \"Curated Links\"]\n\
            tags: {tags}\n\
            author: \"{author}\"\n\
            ---\n\n",
            title = title,
            date = date.format("%Y-%m-%dT%H:%M:%S%z"),
            tags = tags_json,
            author = self.author
        )
    }

    /// Write the rendered document. Refuses to clobber an existing file
    /// unless `force` is set; the content is fully rendered before the
    /// single write call, so a failure leaves nothing partial behind.
    pub fn export(&self, draft: &Draft, date: DateTime<Utc>, force: bool) -> Result<PathBuf> {
        let filepath = self.target_path(date);

        if filepath.exists() && !force {
            return Err(DigestError::Write(format!(
                "{} already exists (use --force to overwrite)",
                filepath.display()
            )));
        }

        fs::create_dir_all(&self.content_dir).map_err(|e| {
            DigestError::Write(format!(
                "Failed to create content directory {}: {}",
                self.content_dir.display(),
                e
            ))
        })?;

        let content = self.render(draft, date);
        fs::write(&filepath, content)
            .map_err(|e| DigestError::Write(format!("Failed to write {}: {}", filepath.display(), e)))?;

        Ok(filepath)
    }
}

pub fn digest_title(date: DateTime<Utc>) -> String {
    format!("Weekly Links Digest - Week of {}", date.format("%B %-d, %Y"))
}

fn merged_tags(suggested: &[String]) -> Vec<String> {
    let mut tags: Vec<String> = BASE_TAGS.iter().map(|t| t.to_string()).collect();
    for tag in suggested {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn render_body(draft: &Draft) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "*This week I discovered {} interesting links. Here's what caught my attention:*\n\n",
        draft.link_count()
    ));

    if !draft.intro.is_empty() {
        body.push_str(&draft.intro);
        body.push_str("\n\n");
    }

    for section in &draft.sections {
        body.push_str(&format!("## {}\n\n", section.heading));
        if !section.summary.is_empty() {
            body.push_str(&section.summary);
            body.push_str("\n\n");
        }
        for link in &section.items {
            match &link.description {
                Some(desc) => body.push_str(&format!(
                    "- [{}]({}) - {}\n",
                    link.title, link.url, desc
                )),
                None => body.push_str(&format!("- [{}]({})\n", link.title, link.url)),
            }
        }
        body.push('\n');
    }

    body.push_str("---\n");
    body.push_str(
        "*This digest was automatically generated from my [LinkAce](https://linkace.org) \
        bookmark collection and curated with AI assistance.*\n",
    );
    body
}

/// True when the draft has nothing worth publishing.
pub fn is_empty_draft(draft: &Draft) -> bool {
    draft.sections.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{test_link, Section};
    use chrono::TimeZone;
    use std::path::Path;

    fn sample_draft() -> Draft {
        Draft {
            intro: "A quiet week with a few gems.".to_string(),
            suggested_tags: vec!["rust".to_string(), "Weekly-Digest".to_string()],
            sections: vec![Section {
                heading: "Languages".to_string(),
                items: vec![test_link(1, "Alpha"), test_link(2, "Beta")],
                summary: "Two language picks.".to_string(),
            }],
        }
    }

    fn fixed_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 28, 10, 30, 0).unwrap()
    }

    fn exporter(dir: &Path) -> HugoExporter {
        HugoExporter::new(dir, "Alex", "weekly-links")
    }

    #[test]
    fn test_front_matter_has_title_and_date() {
        let doc = exporter(Path::new("/tmp")).render(&sample_draft(), fixed_date());

        assert!(doc.starts_with("---\n"));
        assert!(doc.contains("title: \"Weekly Links Digest - Week of August 28, 2026\"\n"));
        assert!(doc.contains("date: 2026-08-28T10:30:00+0000\n"));
        assert!(doc.contains("author: \"Alex\"\n"));
    }

    #[test]
    fn test_front_matter_key_order_is_fixed() {
        let doc = exporter(Path::new("/tmp")).render(&sample_draft(), fixed_date());
        let keys = ["title:", "date:", "draft:", "description:", "categories:", "tags:", "author:"];

        let positions: Vec<usize> = keys.iter().map(|k| doc.find(k).unwrap()).collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_tags_merge_without_duplicates() {
        let tags = merged_tags(&["rust".to_string(), "Weekly-Digest".to_string()]);
        assert_eq!(
            tags,
            vec!["weekly-digest", "curated-links", "reading-list", "rust"]
        );
    }

    #[test]
    fn test_body_contains_sections_and_links() {
        let doc = exporter(Path::new("/tmp")).render(&sample_draft(), fixed_date());

        assert!(doc.contains("## Languages\n"));
        assert!(doc.contains("Two language picks."));
        assert!(doc.contains("- [Alpha](https://example.com/1) - About Alpha\n"));
        assert!(doc.contains("2 interesting links"));
        assert!(doc.contains("A quiet week with a few gems."));
    }

    #[test]
    fn test_render_is_deterministic() {
        let exporter = exporter(Path::new("/tmp"));
        let draft = sample_draft();
        let date = fixed_date();

        assert_eq!(exporter.render(&draft, date), exporter.render(&draft, date));
    }

    #[test]
    fn test_render_empty_draft_does_not_panic() {
        let draft = Draft {
            intro: String::new(),
            suggested_tags: vec![],
            sections: vec![],
        };
        let doc = exporter(Path::new("/tmp")).render(&draft, fixed_date());

        assert!(is_empty_draft(&draft));
        assert!(doc.contains("0 interesting links"));
        assert!(doc.contains("title:"));
    }

    #[test]
    fn test_filename_derives_from_date() {
        let exporter = exporter(Path::new("/tmp"));
        assert_eq!(exporter.filename(fixed_date()), "2026-08-28-weekly-links.md");
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter(dir.path());

        let path = exporter.export(&sample_draft(), fixed_date(), false).unwrap();
        assert!(path.exists());

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, exporter.render(&sample_draft(), fixed_date()));
    }

    #[test]
    fn test_export_creates_missing_content_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("content").join("posts");
        let exporter = exporter(&nested);

        let path = exporter.export(&sample_draft(), fixed_date(), false).unwrap();
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn test_export_refuses_existing_file_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = exporter(dir.path());

        exporter.export(&sample_draft(), fixed_date(), false).unwrap();
        let err = exporter
            .export(&sample_draft(), fixed_date(), false)
            .unwrap_err();
        assert!(matches!(err, DigestError::Write(_)));

        // With force it overwrites
        exporter.export(&sample_draft(), fixed_date(), true).unwrap();
    }

    #[test]
    fn test_export_unwritable_target_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        // Occupy the content-dir path with a plain file
        let blocked = dir.path().join("posts");
        fs::write(&blocked, b"not a directory").unwrap();

        let exporter = exporter(&blocked);
        let err = exporter
            .export(&sample_draft(), fixed_date(), false)
            .unwrap_err();
        assert!(matches!(err, DigestError::Write(_)));

        // No partial digest file appeared anywhere
        let target = exporter.target_path(fixed_date());
        assert!(!target.exists());
    }
}
