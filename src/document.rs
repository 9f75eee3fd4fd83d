// Document model: a card document is a flat sequence of paragraphs,
// each tagged with a style derived from its line syntax. The parser
// only ever sees `Paragraph` values, so the on-disk format stays
// contained in this module.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

/// Style tag attached to each paragraph of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphStyle {
    /// `# `-style heading; the level is the number of marks. Level 1
    /// starts a new card, deeper levels are ordinary body text.
    Heading(u8),
    /// `- ` or `* ` list line.
    Bullet,
    /// `1. ` or `1) ` list line.
    Numbered,
    /// Anything else, including blank lines.
    Normal,
}

/// One paragraph of the input document with its style tag and
/// whitespace-trimmed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub style: ParagraphStyle,
    pub text: String,
}

impl Paragraph {
    /// A blank separator line: normal style with no text.
    pub fn is_blank(&self) -> bool {
        self.style == ParagraphStyle::Normal && self.text.is_empty()
    }
}

/// Tag every line of `text` with a paragraph style.
pub fn paragraphs_from_text(text: &str) -> Vec<Paragraph> {
    text.lines().map(classify_line).collect()
}

/// Read a document file into styled paragraphs.
pub fn read_document(path: &Path) -> Result<Vec<Paragraph>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document '{}'", path.display()))?;
    Ok(paragraphs_from_text(&text))
}

fn classify_line(line: &str) -> Paragraph {
    let trimmed = line.trim();

    if let Some((level, rest)) = heading_text(trimmed) {
        return Paragraph {
            style: ParagraphStyle::Heading(level),
            text: rest.trim().to_string(),
        };
    }

    if let Some(rest) = trimmed.strip_prefix("- ").or_else(|| trimmed.strip_prefix("* ")) {
        return Paragraph {
            style: ParagraphStyle::Bullet,
            text: rest.trim().to_string(),
        };
    }

    if let Some(rest) = numbered_text(trimmed) {
        return Paragraph {
            style: ParagraphStyle::Numbered,
            text: rest.trim().to_string(),
        };
    }

    Paragraph {
        style: ParagraphStyle::Normal,
        text: trimmed.to_string(),
    }
}

/// Returns the heading level and the text after the marks, or `None`
/// if the line is not a heading (`#` marks must be followed by a space).
fn heading_text(line: &str) -> Option<(u8, &str)> {
    let stripped = line.trim_start_matches('#');
    let marks = line.len() - stripped.len();
    if marks == 0 {
        return None;
    }
    let rest = stripped.strip_prefix(' ')?;
    Some((marks.min(u8::MAX as usize) as u8, rest))
}

/// Returns the text after a `1. ` / `1) ` marker, or `None`.
fn numbered_text(line: &str) -> Option<&str> {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix(". ")
        .or_else(|| rest.strip_prefix(") "))
}

/// Contents of the generated sample document: one card exercising
/// every recognized field.
pub const SAMPLE_TEMPLATE: &str = "\
# Sample Card Title

This is the description of the card.

Labels: Marketing, Urgent
Due Date: 2023-12-31T23:59:00
Members: username1, username2
List: To Do
Checklist:
- First item
- Second item
Attachments:
https://example.com/document.pdf
/path/to/file.pdf
Image: https://example.com/image.png
";

/// Write the sample document template to `path`.
pub fn write_sample_template(path: &Path) -> Result<()> {
    fs::write(path, SAMPLE_TEMPLATE)
        .with_context(|| format!("Failed to write sample template '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style_of(line: &str) -> ParagraphStyle {
        classify_line(line).style
    }

    #[test]
    fn headings_carry_their_level() {
        let para = classify_line("# Card Title");
        assert_eq!(para.style, ParagraphStyle::Heading(1));
        assert_eq!(para.text, "Card Title");

        assert_eq!(style_of("## Section"), ParagraphStyle::Heading(2));
        assert_eq!(style_of("### Deep"), ParagraphStyle::Heading(3));
    }

    #[test]
    fn heading_marks_require_a_space() {
        assert_eq!(style_of("#NoSpace"), ParagraphStyle::Normal);
        assert_eq!(style_of("#"), ParagraphStyle::Normal);
    }

    #[test]
    fn bullets_and_numbered_lines() {
        let para = classify_line("- first item");
        assert_eq!(para.style, ParagraphStyle::Bullet);
        assert_eq!(para.text, "first item");

        assert_eq!(style_of("* starred"), ParagraphStyle::Bullet);
        assert_eq!(style_of("1. ordered"), ParagraphStyle::Numbered);
        assert_eq!(style_of("12) ordered"), ParagraphStyle::Numbered);
        assert_eq!(classify_line("3. third").text, "third");
    }

    #[test]
    fn dash_without_space_is_normal_text() {
        assert_eq!(style_of("-dash"), ParagraphStyle::Normal);
        assert_eq!(style_of("1.no-space"), ParagraphStyle::Normal);
    }

    #[test]
    fn blank_lines_are_blank_normal_paragraphs() {
        let para = classify_line("   ");
        assert_eq!(para.style, ParagraphStyle::Normal);
        assert!(para.is_blank());
    }

    #[test]
    fn plain_text_is_trimmed_normal() {
        let para = classify_line("  Labels: A, B  ");
        assert_eq!(para.style, ParagraphStyle::Normal);
        assert_eq!(para.text, "Labels: A, B");
    }

    #[test]
    fn read_document_round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.md");
        std::fs::write(&path, "# Title\n\nBody text\n").unwrap();

        let paragraphs = read_document(&path).unwrap();
        assert_eq!(paragraphs.len(), 3);
        assert_eq!(paragraphs[0].style, ParagraphStyle::Heading(1));
        assert!(paragraphs[1].is_blank());
        assert_eq!(paragraphs[2].text, "Body text");
    }

    #[test]
    fn write_sample_template_creates_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample_template.md");
        write_sample_template(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# Sample Card Title"));
    }
}
