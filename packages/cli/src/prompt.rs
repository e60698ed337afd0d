//! Terminal prompts.

use dialoguer::Confirm;
use trail_map_map::Prompt;

/// [`Prompt`] backed by `dialoguer`.
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn alert(&self, message: &str) {
        eprintln!("\n  ! {message}\n");
    }

    fn confirm(&self, message: &str) -> bool {
        Confirm::new()
            .with_prompt(message)
            .default(false)
            .interact()
            .unwrap_or_else(|e| {
                log::warn!("Confirmation failed, treating as no: {e}");
                false
            })
    }
}
