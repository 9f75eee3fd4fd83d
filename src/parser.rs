// Card parser: walks the document's styled paragraphs and groups them
// into card records. Every level-1 heading starts a new card; the body
// is scanned by a small state machine that switches between free-text
// description, one-line fields, and the two multi-paragraph sections
// (checklist and attachments).

use log::warn;

use crate::document::{Paragraph, ParagraphStyle};

/// One card as described by the document. All fields are transient:
/// parsed once, consumed once during submission, never persisted.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CardRecord {
    pub title: String,
    pub description: String,
    pub labels: Vec<String>,
    pub due_date: Option<String>,
    pub members: Vec<String>,
    pub list_name: Option<String>,
    pub checklist: Vec<String>,
    pub attachments: Vec<String>,
    pub image: Option<String>,
}

/// Field prefixes recognized inside a card body. Matching is
/// case-sensitive and positional (start of the paragraph).
const FIELD_PREFIXES: [&str; 7] = [
    "Labels:",
    "Due Date:",
    "Members:",
    "List:",
    "Checklist:",
    "Attachments:",
    "Image:",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyState {
    /// Collecting free-text description paragraphs.
    Description,
    /// Scanning for one-line `Field:` paragraphs.
    Fields,
    /// Consuming bullet/numbered checklist items.
    Checklist,
    /// Consuming attachment URLs or file paths.
    Attachments,
}

struct CardBuilder {
    record: CardRecord,
    description_lines: Vec<String>,
    state: BodyState,
}

impl CardBuilder {
    fn new(title: String) -> Self {
        CardBuilder {
            record: CardRecord {
                title,
                ..CardRecord::default()
            },
            description_lines: Vec::new(),
            state: BodyState::Description,
        }
    }

    /// Feed one body paragraph through the state machine. A paragraph
    /// that terminates a checklist or attachment section is
    /// re-dispatched in `Fields` so it is not lost.
    fn consume(&mut self, para: &Paragraph) {
        loop {
            match self.state {
                BodyState::Description => {
                    if field_prefix(&para.text).is_some() {
                        self.state = BodyState::Fields;
                        continue;
                    }
                    self.description_lines.push(para.text.clone());
                }
                BodyState::Fields => {
                    let text = para.text.as_str();
                    if let Some(rest) = text.strip_prefix("Labels:") {
                        self.record.labels = split_comma_list(rest);
                    } else if let Some(rest) = text.strip_prefix("Due Date:") {
                        self.record.due_date = non_empty(rest);
                    } else if let Some(rest) = text.strip_prefix("Members:") {
                        self.record.members = split_comma_list(rest);
                    } else if let Some(rest) = text.strip_prefix("List:") {
                        self.record.list_name = non_empty(rest);
                    } else if text.starts_with("Checklist:") {
                        self.state = BodyState::Checklist;
                    } else if text.starts_with("Attachments:") {
                        self.state = BodyState::Attachments;
                    } else if let Some(rest) = text.strip_prefix("Image:") {
                        self.record.image = non_empty(rest);
                    }
                    // anything else inside the body is silently skipped
                }
                BodyState::Checklist => match para.style {
                    ParagraphStyle::Bullet | ParagraphStyle::Numbered => {
                        self.record.checklist.push(para.text.clone());
                    }
                    _ if para.is_blank() => {}
                    _ => {
                        self.state = BodyState::Fields;
                        continue;
                    }
                },
                BodyState::Attachments => {
                    if para.text.starts_with("Image:") {
                        self.state = BodyState::Fields;
                        continue;
                    }
                    if para.is_blank() {
                        // a blank line ends the attachment section
                        self.state = BodyState::Fields;
                    } else {
                        self.record.attachments.push(para.text.clone());
                    }
                }
            }
            break;
        }
    }

    fn finish(mut self) -> Option<CardRecord> {
        self.record.description = self.description_lines.join("\n").trim().to_string();
        if self.record.title.is_empty() {
            warn!("Skipping a card with an empty title.");
            return None;
        }
        Some(self.record)
    }
}

/// Group paragraphs into card records, preserving document order.
/// Paragraphs before the first level-1 heading are ignored; a document
/// with no headings yields an empty list.
pub fn parse_cards(paragraphs: &[Paragraph]) -> Vec<CardRecord> {
    let mut cards = Vec::new();
    let mut current: Option<CardBuilder> = None;

    for para in paragraphs {
        if para.style == ParagraphStyle::Heading(1) {
            if let Some(builder) = current.take() {
                cards.extend(builder.finish());
            }
            current = Some(CardBuilder::new(para.text.clone()));
        } else if let Some(builder) = current.as_mut() {
            builder.consume(para);
        }
    }
    if let Some(builder) = current.take() {
        cards.extend(builder.finish());
    }
    cards
}

fn field_prefix(text: &str) -> Option<&'static str> {
    FIELD_PREFIXES.iter().copied().find(|p| text.starts_with(p))
}

fn split_comma_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{paragraphs_from_text, SAMPLE_TEMPLATE};

    fn parse(text: &str) -> Vec<CardRecord> {
        parse_cards(&paragraphs_from_text(text))
    }

    #[test]
    fn document_without_headings_yields_no_cards() {
        assert!(parse("").is_empty());
        assert!(parse("just some text\nLabels: A, B\n- a bullet\n").is_empty());
    }

    #[test]
    fn free_text_body_becomes_the_description() {
        let cards = parse("# Card\nfirst line\n\nsecond line\n");
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.title, "Card");
        assert_eq!(card.description, "first line\n\nsecond line");
        assert!(card.labels.is_empty());
        assert!(card.members.is_empty());
        assert!(card.checklist.is_empty());
        assert!(card.attachments.is_empty());
        assert_eq!(card.due_date, None);
        assert_eq!(card.list_name, None);
        assert_eq!(card.image, None);
    }

    #[test]
    fn labels_are_split_trimmed_and_empties_dropped() {
        let cards = parse("# Card\nLabels: A, B\n");
        assert_eq!(cards[0].labels, vec!["A", "B"]);

        let cards = parse("# Card\nLabels:  A ,  , B ,\n");
        assert_eq!(cards[0].labels, vec!["A", "B"]);
    }

    #[test]
    fn duplicate_labels_are_preserved_in_order() {
        let cards = parse("# Card\nLabels: Urgent, Review, Urgent\n");
        assert_eq!(cards[0].labels, vec!["Urgent", "Review", "Urgent"]);
    }

    #[test]
    fn checklist_collects_bullets_across_blank_lines() {
        let text = "# Card\nChecklist:\n- First item\n\n- Second item\n";
        let cards = parse(text);
        assert_eq!(cards[0].checklist, vec!["First item", "Second item"]);
    }

    #[test]
    fn checklist_accepts_numbered_items() {
        let cards = parse("# Card\nChecklist:\n1. one\n2) two\n");
        assert_eq!(cards[0].checklist, vec!["one", "two"]);
    }

    #[test]
    fn checklist_ends_at_the_next_field() {
        let text = "# Card\nChecklist:\n- item\nAttachments:\nhttps://example.com/a.pdf\n";
        let cards = parse(text);
        assert_eq!(cards[0].checklist, vec!["item"]);
        assert_eq!(cards[0].attachments, vec!["https://example.com/a.pdf"]);
    }

    #[test]
    fn attachments_terminate_at_the_image_line() {
        let text = "# Card\nAttachments:\nhttps://example.com/a.pdf\n/local/file.pdf\nImage: https://example.com/cover.png\n";
        let cards = parse(text);
        let card = &cards[0];
        assert_eq!(
            card.attachments,
            vec!["https://example.com/a.pdf", "/local/file.pdf"]
        );
        assert_eq!(card.image.as_deref(), Some("https://example.com/cover.png"));
    }

    #[test]
    fn attachments_end_at_a_blank_line() {
        let text = "# Card\nAttachments:\nhttps://example.com/a.pdf\n\nhttps://example.com/b.pdf\n";
        let cards = parse(text);
        // the second URL is outside the section and matches no field
        assert_eq!(cards[0].attachments, vec!["https://example.com/a.pdf"]);
    }

    #[test]
    fn description_stops_at_the_first_field_prefix() {
        let text = "# Card\nintro text\nDue Date: 2024-06-01\ntrailing text\n";
        let cards = parse(text);
        assert_eq!(cards[0].description, "intro text");
        assert_eq!(cards[0].due_date.as_deref(), Some("2024-06-01"));
        // trailing free text after the fields begin is skipped
        assert!(!cards[0].description.contains("trailing"));
    }

    #[test]
    fn unrecognized_body_paragraphs_are_skipped() {
        let text = "# Card\nList: Doing\nSomething unrelated\nMembers: alice\n";
        let cards = parse(text);
        assert_eq!(cards[0].list_name.as_deref(), Some("Doing"));
        assert_eq!(cards[0].members, vec!["alice"]);
    }

    #[test]
    fn multiple_cards_preserve_document_order() {
        let text = "# First\nLabels: A\n# Second\nLabels: B\n# Third\n";
        let cards = parse(text);
        let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
        assert_eq!(cards[0].labels, vec!["A"]);
        assert_eq!(cards[1].labels, vec!["B"]);
    }

    #[test]
    fn empty_titled_heading_delimits_but_is_dropped() {
        use crate::document::{Paragraph, ParagraphStyle};

        let heading = |text: &str| Paragraph {
            style: ParagraphStyle::Heading(1),
            text: text.to_string(),
        };
        let normal = |text: &str| Paragraph {
            style: ParagraphStyle::Normal,
            text: text.to_string(),
        };
        let paragraphs = vec![
            heading("Real"),
            normal("description"),
            heading(""),
            normal("Labels: Lost"),
            heading("Next"),
        ];

        let cards = parse_cards(&paragraphs);
        let titles: Vec<&str> = cards.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Real", "Next"]);
        // the dropped card's body does not leak into its neighbours
        assert!(cards[0].labels.is_empty());
        assert_eq!(cards[0].description, "description");
        assert!(cards[1].labels.is_empty());
    }

    #[test]
    fn empty_field_values_stay_unset() {
        let text = "# Card\nDue Date:\nList:\nImage:\nLabels:\n";
        let cards = parse(text);
        let card = &cards[0];
        assert_eq!(card.due_date, None);
        assert_eq!(card.list_name, None);
        assert_eq!(card.image, None);
        assert!(card.labels.is_empty());
    }

    #[test]
    fn sample_template_parses_into_the_expected_card() {
        let cards = parse(SAMPLE_TEMPLATE);
        assert_eq!(cards.len(), 1);
        let card = &cards[0];
        assert_eq!(card.title, "Sample Card Title");
        assert_eq!(card.description, "This is the description of the card.");
        assert_eq!(card.labels, vec!["Marketing", "Urgent"]);
        assert_eq!(card.due_date.as_deref(), Some("2023-12-31T23:59:00"));
        assert_eq!(card.members, vec!["username1", "username2"]);
        assert_eq!(card.list_name.as_deref(), Some("To Do"));
        assert_eq!(card.checklist, vec!["First item", "Second item"]);
        assert_eq!(
            card.attachments,
            vec!["https://example.com/document.pdf", "/path/to/file.pdf"]
        );
        assert_eq!(card.image.as_deref(), Some("https://example.com/image.png"));
    }
}
