use anyhow::Result;
use std::io::{self, BufRead, Write};

use crate::digest::Draft;

/// How the operator ended the review session.
#[derive(Debug)]
pub enum ReviewOutcome {
    /// The draft as it stands, ready for export.
    Approved(Draft),
    /// Operator wants an LLM polish pass with this feedback; the caller
    /// runs it and re-enters review with the revised draft.
    Feedback(Draft, String),
    /// Operator abandoned the run. Nothing is written.
    Aborted,
}

const HELP: &str = "Commands: [Enter/a] approve  [h N TEXT] rename heading  [s N] edit summary\n          [r N M] remove link M from section N  [d N] drop section N\n          [f] feedback for AI revision  [q] quit without writing";

/// Interactive review on stdin/stdout.
pub fn review_draft(draft: Draft) -> Result<ReviewOutcome> {
    let stdin = io::stdin();
    run_review(draft, stdin.lock(), io::stdout())
}

/// The actual prompt/response cycle, generic over its streams.
pub fn run_review<R: BufRead, W: Write>(
    mut draft: Draft,
    mut input: R,
    mut output: W,
) -> Result<ReviewOutcome> {
    writeln!(output, "{}", render_preview(&draft))?;
    writeln!(output, "{}", HELP)?;

    loop {
        write!(output, "\n> ")?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            // Stream closed without an approval
            return Ok(ReviewOutcome::Aborted);
        }
        let line = line.trim();

        match parse_command(line) {
            Command::Approve => return Ok(ReviewOutcome::Approved(draft)),
            Command::Quit => return Ok(ReviewOutcome::Aborted),
            Command::Feedback => {
                write!(output, "Feedback for the AI editor: ")?;
                output.flush()?;
                let mut feedback = String::new();
                input.read_line(&mut feedback)?;
                let feedback = feedback.trim().to_string();
                if feedback.is_empty() {
                    writeln!(output, "No feedback given.")?;
                    continue;
                }
                return Ok(ReviewOutcome::Feedback(draft, feedback));
            }
            Command::RenameHeading(n, text) => {
                if let Some(section) = checked_section(&mut draft, n, &mut output)? {
                    section.heading = text;
                    writeln!(output, "{}", render_preview(&draft))?;
                }
            }
            Command::EditSummary(n) => {
                if checked_section(&mut draft, n, &mut output)?.is_some() {
                    write!(output, "New summary: ")?;
                    output.flush()?;
                    let mut summary = String::new();
                    input.read_line(&mut summary)?;
                    draft.sections[n - 1].summary = summary.trim().to_string();
                    writeln!(output, "{}", render_preview(&draft))?;
                }
            }
            Command::DropSection(n) => {
                if checked_section(&mut draft, n, &mut output)?.is_some() {
                    let removed = draft.sections.remove(n - 1);
                    writeln!(output, "Dropped section \"{}\"", removed.heading)?;
                    writeln!(output, "{}", render_preview(&draft))?;
                }
            }
            Command::RemoveLink(n, m) => {
                if let Some(section) = checked_section(&mut draft, n, &mut output)? {
                    if m == 0 || m > section.items.len() {
                        writeln!(output, "No link {} in section {}.", m, n)?;
                        continue;
                    }
                    let removed = section.items.remove(m - 1);
                    writeln!(output, "Removed \"{}\"", removed.title)?;
                    if section.items.is_empty() {
                        draft.sections.remove(n - 1);
                        writeln!(output, "Section {} is now empty, dropping it.", n)?;
                    }
                    writeln!(output, "{}", render_preview(&draft))?;
                }
            }
            Command::Unknown => {
                writeln!(output, "{}", HELP)?;
            }
        }
    }
}

enum Command {
    Approve,
    Quit,
    Feedback,
    RenameHeading(usize, String),
    EditSummary(usize),
    DropSection(usize),
    RemoveLink(usize, usize),
    Unknown,
}

fn parse_command(line: &str) -> Command {
    if line.is_empty() || line == "a" {
        return Command::Approve;
    }
    if line == "q" {
        return Command::Quit;
    }
    if line == "f" {
        return Command::Feedback;
    }

    let mut parts = line.splitn(3, ' ');
    let verb = parts.next().unwrap_or("");
    let first = parts.next().and_then(|p| p.parse::<usize>().ok());

    match (verb, first) {
        ("h", Some(n)) => match parts.next() {
            Some(text) if !text.trim().is_empty() => {
                Command::RenameHeading(n, text.trim().to_string())
            }
            _ => Command::Unknown,
        },
        ("s", Some(n)) => Command::EditSummary(n),
        ("d", Some(n)) => Command::DropSection(n),
        ("r", Some(n)) => match parts.next().and_then(|p| p.trim().parse::<usize>().ok()) {
            Some(m) => Command::RemoveLink(n, m),
            None => Command::Unknown,
        },
        _ => Command::Unknown,
    }
}

/// Look up section `n` (1-based); prints a message and returns None when
/// out of range.
fn checked_section<'a, W: Write>(
    draft: &'a mut Draft,
    n: usize,
    output: &mut W,
) -> Result<Option<&'a mut crate::digest::Section>> {
    if n == 0 || n > draft.sections.len() {
        writeln!(output, "No section {}.", n)?;
        return Ok(None);
    }
    Ok(Some(&mut draft.sections[n - 1]))
}

/// Plain-text rendering of the draft for the operator.
pub fn render_preview(draft: &Draft) -> String {
    let mut text = String::new();

    text.push_str(&"=".repeat(80));
    text.push_str("\nDRAFT REVIEW\n");
    text.push_str(&"=".repeat(80));
    text.push('\n');

    if !draft.intro.is_empty() {
        text.push_str(&format!("\n{}\n", draft.intro));
    }
    if !draft.suggested_tags.is_empty() {
        text.push_str(&format!(
            "\nSuggested tags: {}\n",
            draft.suggested_tags.join(", ")
        ));
    }

    for (i, section) in draft.sections.iter().enumerate() {
        text.push_str(&format!("\n{}. {}\n", i + 1, section.heading));
        if !section.summary.is_empty() {
            text.push_str(&format!("   {}\n", section.summary));
        }
        for (j, link) in section.items.iter().enumerate() {
            text.push_str(&format!("   {}) {} - {}\n", j + 1, link.title, link.url));
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::digest::{test_link, Section};
    use std::io::Cursor;

    fn sample_draft() -> Draft {
        Draft {
            intro: "The week in links.".to_string(),
            suggested_tags: vec!["rust".to_string()],
            sections: vec![
                Section {
                    heading: "Languages".to_string(),
                    items: vec![test_link(1, "Alpha"), test_link(2, "Beta")],
                    summary: "Language news.".to_string(),
                },
                Section {
                    heading: "Tools".to_string(),
                    items: vec![test_link(3, "Gamma")],
                    summary: "Tooling.".to_string(),
                },
            ],
        }
    }

    fn review(draft: Draft, input: &str) -> ReviewOutcome {
        let mut output = Vec::new();
        run_review(draft, Cursor::new(input.as_bytes()), &mut output).unwrap()
    }

    #[test]
    fn test_empty_line_approves() {
        match review(sample_draft(), "\n") {
            ReviewOutcome::Approved(draft) => assert_eq!(draft.sections.len(), 2),
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_quit_aborts() {
        assert!(matches!(
            review(sample_draft(), "q\n"),
            ReviewOutcome::Aborted
        ));
    }

    #[test]
    fn test_eof_aborts() {
        assert!(matches!(review(sample_draft(), ""), ReviewOutcome::Aborted));
    }

    #[test]
    fn test_rename_heading() {
        match review(sample_draft(), "h 1 This Week in Languages\na\n") {
            ReviewOutcome::Approved(draft) => {
                assert_eq!(draft.sections[0].heading, "This Week in Languages");
            }
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_edit_summary() {
        match review(sample_draft(), "s 2\nBetter summary.\na\n") {
            ReviewOutcome::Approved(draft) => {
                assert_eq!(draft.sections[1].summary, "Better summary.");
            }
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_drop_section() {
        match review(sample_draft(), "d 2\na\n") {
            ReviewOutcome::Approved(draft) => {
                assert_eq!(draft.sections.len(), 1);
                assert_eq!(draft.sections[0].heading, "Languages");
            }
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_remove_link() {
        match review(sample_draft(), "r 1 2\na\n") {
            ReviewOutcome::Approved(draft) => {
                assert_eq!(draft.sections[0].items.len(), 1);
                assert_eq!(draft.sections[0].items[0].title, "Alpha");
            }
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_removing_last_link_drops_section() {
        match review(sample_draft(), "r 2 1\na\n") {
            ReviewOutcome::Approved(draft) => {
                assert_eq!(draft.sections.len(), 1);
            }
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_feedback_returned_to_caller() {
        match review(sample_draft(), "f\nLess corporate tone please.\n") {
            ReviewOutcome::Feedback(draft, feedback) => {
                assert_eq!(feedback, "Less corporate tone please.");
                assert_eq!(draft.sections.len(), 2);
            }
            other => panic!("expected feedback, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_section_keeps_looping() {
        match review(sample_draft(), "d 9\na\n") {
            ReviewOutcome::Approved(draft) => assert_eq!(draft.sections.len(), 2),
            other => panic!("expected approval, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_command_prints_help() {
        let mut output = Vec::new();
        let outcome = run_review(
            sample_draft(),
            Cursor::new(b"banana\na\n".as_slice()),
            &mut output,
        )
        .unwrap();

        assert!(matches!(outcome, ReviewOutcome::Approved(_)));
        let printed = String::from_utf8(output).unwrap();
        // Help shown once up front and again after the bad command
        assert!(printed.matches("Commands:").count() >= 2);
    }

    #[test]
    fn test_render_preview_lists_sections_and_links() {
        let preview = render_preview(&sample_draft());
        assert!(preview.contains("1. Languages"));
        assert!(preview.contains("2. Tools"));
        assert!(preview.contains("1) Alpha - https://example.com/1"));
        assert!(preview.contains("The week in links."));
    }
}
