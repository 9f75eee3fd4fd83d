// Library root
// -----------
// This crate exposes a small library surface for the CLI. The binary
// (`main.rs`) uses these modules to implement the run flow.
//
// Module responsibilities:
// - `document`: Styled-paragraph document model, file loading and the
//   generated sample template.
// - `parser`: Groups paragraphs into card records (the only component
//   with real parsing logic).
// - `credentials`: Cached API credentials behind a store trait.
// - `api`: Blocking HTTP calls against the Trello REST API.
// - `submit`: Per-card submission with log-and-skip failure handling.
// - `ui`: Interactive credential prompts and document selection.
//
// The parser and submission logic never touch the terminal, so they
// can be tested without the interactive pieces.
pub mod api;
pub mod credentials;
pub mod document;
pub mod error;
pub mod parser;
pub mod submit;
pub mod ui;
