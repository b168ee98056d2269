use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use shared::{Config, DraftGenerator, HugoExporter, LinkAceClient, ReviewOutcome};

#[derive(Parser)]
#[command(name = "weekly-digest")]
#[command(about = "Generate a weekly Hugo digest post from your LinkAce bookmarks")]
struct Args {
    /// Number of days to look back for saved links
    #[arg(short, long, default_value = "7")]
    days: i64,

    /// Overwrite the output file if it already exists
    #[arg(short, long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_env()?;

    let now = Utc::now();
    let since = now - Duration::days(args.days);

    println!("🔗 Fetching links from LinkAce list {}...", config.linkace_list_id);
    let linkace = LinkAceClient::new(config.linkace_url, config.linkace_api_key)?;
    let links = linkace
        .fetch_links(config.linkace_list_id, since)
        .await
        .context("Failed to fetch links")?;

    if links.is_empty() {
        println!(
            "No links found in list {} in the past {} days. Nothing to export.",
            config.linkace_list_id, args.days
        );
        return Ok(());
    }

    println!("✓ Found {} links from the past {} days", links.len(), args.days);

    println!("🤖 Structuring content with {}...", config.openrouter_model);
    let generator = DraftGenerator::new(config.openrouter_api_key, config.openrouter_model)?;
    let mut draft = generator
        .generate(&links)
        .await
        .context("Failed to generate draft")?;

    println!("✓ Draft has {} sections", draft.sections.len());

    println!("✏️ Starting editor review...");
    let approved = loop {
        match shared::review_draft(draft)? {
            ReviewOutcome::Approved(final_draft) => break final_draft,
            ReviewOutcome::Aborted => {
                println!("Review aborted. No file written.");
                return Ok(());
            }
            ReviewOutcome::Feedback(current, feedback) => {
                println!("✨ Polishing content...");
                draft = generator
                    .polish(&current, &feedback)
                    .await
                    .context("Failed to polish draft")?;
            }
        }
    };

    if approved.sections.is_empty() {
        println!("All sections were removed during review. Nothing to export.");
        return Ok(());
    }

    println!("📝 Generating Hugo markdown file...");
    let exporter = HugoExporter::new(
        config.hugo_content_dir,
        config.editor_name,
        config.filename_prefix,
    );
    let output_file = exporter.export(&approved, now, args.force)?;

    println!("🎉 Complete! Hugo content ready at: {}", output_file.display());
    println!("💡 Run 'hugo server' in your Hugo directory to preview");

    Ok(())
}
