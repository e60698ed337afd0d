//! Interactive mode.

use std::error::Error;

use dialoguer::Select;

use crate::commands::{self, App};

/// Top-level actions.
enum Tool {
    Trails,
    Report,
    Neighbors,
    Parties,
}

impl Tool {
    const ALL: &[Self] = &[Self::Trails, Self::Report, Self::Neighbors, Self::Parties];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Trails => "Show trails and issues",
            Self::Report => "Report a trail issue",
            Self::Neighbors => "Browse neighbors",
            Self::Parties => "List party codes",
        }
    }
}

/// Runs the interactive menu.
pub async fn run(app: &App) -> Result<(), Box<dyn Error>> {
    println!("Trail Map");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Trails => commands::trails(app).await?,
        Tool::Report => commands::report(app).await?,
        Tool::Neighbors => commands::browse_neighbors(app).await?,
        Tool::Parties => commands::parties(),
    }

    Ok(())
}
