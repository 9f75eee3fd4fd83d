// Interactive flows: credential prompting and document selection,
// using `dialoguer` for terminal input and `rfd` for the file picker.
// Kept apart from the parser and submission logic so those stay
// testable without a terminal.

use std::path::PathBuf;

use anyhow::Result;
use dialoguer::{Confirm, Input, Password};
use log::{error, info};

use crate::api::{extract_board_short_id, ApiClient};
use crate::credentials::{CredentialStore, Credentials};
use crate::document;
use crate::error::CardfileError;

/// Load cached credentials or walk the user through entering them,
/// verifying board access before anything is submitted. The resolved
/// values are saved back through the store for the next run.
pub fn resolve_credentials(store: &dyn CredentialStore) -> Result<Credentials> {
    match store.load()? {
        Some(stored) => {
            let update = Confirm::new()
                .with_prompt("Do you want to update your API key, token, or board ID?")
                .default(false)
                .interact()?;
            if update {
                return prompt_for_new_credentials(store, Some(&stored), false);
            }

            info!("Using stored API credentials and board ID.");
            let api = ApiClient::new(&stored.api_key, &stored.api_token)?;
            if api.verify_board_access(&stored.board_id)? {
                Ok(stored)
            } else {
                error!(
                    "Access to the stored board is denied. Please update your API token and board ID."
                );
                prompt_for_new_credentials(store, Some(&stored), true)
            }
        }
        None => prompt_for_new_credentials(store, None, false),
    }
}

/// Prompt for a new credential set. Stored values show as a masked
/// default and are kept when the input is left blank; after an access
/// denial the token must be re-entered (`force_token_update`).
fn prompt_for_new_credentials(
    store: &dyn CredentialStore,
    stored: Option<&Credentials>,
    force_token_update: bool,
) -> Result<Credentials> {
    println!("\nPlease enter new values. Leave blank to keep the existing value.\n");

    let stored_key = stored.map(|c| c.api_key.as_str());
    let api_key = prompt_with_masked_default("Enter your Trello API key", stored_key)?;

    let stored_token = stored.map(|c| c.api_token.as_str());
    let api_token = if force_token_update {
        println!("You need to enter a new API token.");
        let token: String = Password::new()
            .with_prompt("Enter your Trello API token (input is hidden)")
            .interact()?;
        token.trim().to_string()
    } else {
        let masked = if stored_token.is_some() {
            " [********]"
        } else {
            ""
        };
        let entered: String = Password::new()
            .with_prompt(format!(
                "Enter your Trello API token (input is hidden){}",
                masked
            ))
            .allow_empty_password(stored_token.is_some())
            .interact()?;
        let entered = entered.trim().to_string();
        if entered.is_empty() {
            stored_token.unwrap_or_default().to_string()
        } else {
            entered
        }
    };

    let token_updated = stored_token != Some(api_token.as_str());
    let stored_board = stored.map(|c| c.board_id.as_str());

    let board_id = match stored_board {
        Some(existing) if !token_updated => {
            let board_url: String = Input::new()
                .with_prompt("Enter your Trello board URL [stored]")
                .allow_empty(true)
                .interact_text()?;
            let board_url = board_url.trim().to_string();
            if board_url.is_empty() {
                existing.to_string()
            } else {
                let api = ApiClient::new(&api_key, &api_token)?;
                let short_id = extract_board_short_id(&board_url)
                    .ok_or_else(|| CardfileError::InvalidBoardUrl(board_url.clone()))?;
                api.board_id(&short_id)?
            }
        }
        _ => {
            println!("\nSince the API token was updated, you need to provide the Trello board URL.");
            let api = ApiClient::new(&api_key, &api_token)?;
            prompt_for_board_id(&api)?
        }
    };

    let credentials = Credentials {
        api_key,
        api_token,
        board_id,
    };
    store.save(&credentials)?;
    info!("Credentials updated and saved.");
    Ok(credentials)
}

/// Prompt for a board URL and resolve it to a verified board id.
fn prompt_for_board_id(api: &ApiClient) -> Result<String> {
    let board_url: String = Input::new()
        .with_prompt("Enter your Trello board URL (e.g., https://trello.com/b/YourBoardId)")
        .interact_text()?;
    let board_url = board_url.trim().to_string();
    let short_id = extract_board_short_id(&board_url)
        .ok_or_else(|| CardfileError::InvalidBoardUrl(board_url.clone()))?;
    api.board_id(&short_id)
}

fn prompt_with_masked_default(prompt: &str, stored: Option<&str>) -> Result<String> {
    let masked = if stored.is_some() { " [********]" } else { "" };
    let entered: String = Input::new()
        .with_prompt(format!("{}{}", prompt, masked))
        .allow_empty(stored.is_some())
        .interact_text()?;
    let entered = entered.trim().to_string();
    if entered.is_empty() {
        Ok(stored.unwrap_or_default().to_string())
    } else {
        Ok(entered)
    }
}

/// Ask for the card document. Returns `None` when the user asked for a
/// sample template instead (which ends the run), and an error when the
/// file dialog was dismissed.
pub fn select_document() -> Result<Option<PathBuf>> {
    println!("\nPlease select the document containing your card details.");
    println!("If you don't have one, a sample template can be generated for you.");
    let ready = Confirm::new()
        .with_prompt("Do you have a document ready?")
        .default(true)
        .interact()?;

    if !ready {
        let path = PathBuf::from("sample_template.md");
        document::write_sample_template(&path)?;
        info!(
            "Sample template '{}' has been created in the current directory.",
            path.display()
        );
        info!("Please fill in your card details in this file and run the tool again.");
        return Ok(None);
    }

    let picked = rfd::FileDialog::new()
        .add_filter("Documents", &["md", "txt"])
        .set_title("Select card document")
        .pick_file();
    match picked {
        Some(path) => Ok(Some(path)),
        None => Err(CardfileError::NoFileSelected.into()),
    }
}
