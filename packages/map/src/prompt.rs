//! Blocking user prompts.

/// Modal interactions with the user.
///
/// Front ends implement this with whatever their toolkit offers: the
/// terminal front end uses `dialoguer`, tests use scripted answers.
pub trait Prompt {
    /// Shows a message the user must acknowledge.
    fn alert(&self, message: &str);

    /// Asks a yes/no question.
    fn confirm(&self, message: &str) -> bool;
}
