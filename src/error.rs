// Fatal, user-facing error conditions. Per-call failures during card
// submission are not represented here: those are logged and the
// affected card or sub-step is skipped while the run continues.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that terminate the run with a non-zero exit code.
#[derive(Error, Debug)]
pub enum CardfileError {
    /// The board URL did not contain a recognizable short id.
    #[error("could not extract a board id from '{0}'; expected something like https://trello.com/b/YourBoardId")]
    InvalidBoardUrl(String),

    /// Credentials were valid JSON but the token cannot see the board.
    #[error("access to board '{0}' is denied; generate an API token with access to this board and try again")]
    BoardAccessDenied(String),

    /// `--file` pointed at something that is not a readable file.
    #[error("the file '{}' does not exist", .0.display())]
    MissingInputFile(PathBuf),

    /// The document parsed cleanly but contained no card headings.
    #[error("no cards found in '{}'; every card must start with a top-level '# ' heading", .0.display())]
    NoCards(PathBuf),

    /// The file dialog was dismissed without a selection.
    #[error("no file selected")]
    NoFileSelected,
}
