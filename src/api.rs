// API client module: a small blocking HTTP client for the Trello REST
// API. Every call authenticates with the key/token pair as query
// parameters; non-success responses become errors carrying the status
// and the response body so failures are diagnosable from the log.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use log::error;
use regex::Regex;
use reqwest::blocking::{multipart, Client, Response};
use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::CardfileError;

const DEFAULT_BASE_URL: &str = "https://api.trello.com/1";

/// Blocking Trello client holding the HTTP client, the API base URL
/// and the credential pair used on every request.
pub struct ApiClient {
    client: Client,
    base_url: String,
    api_key: String,
    api_token: String,
}

/// Board lookup response (`fields=id`).
#[derive(Deserialize, Debug)]
struct BoardSummary {
    id: String,
}

/// A list or label on the board (`fields=name,id`).
#[derive(Deserialize, Debug, Clone)]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

/// Responses where only the created/fetched id matters.
#[derive(Deserialize, Debug)]
struct IdRef {
    id: String,
}

/// Everything the card-creation call carries. Label and member ids are
/// comma-joined into `idLabels`/`idMembers` as the API expects.
#[derive(Debug, Default)]
pub struct NewCard {
    pub name: String,
    pub desc: String,
    pub list_id: String,
    pub due: Option<String>,
    pub label_ids: Vec<String>,
    pub member_ids: Vec<String>,
}

/// Extract the short board id from a Trello board URL, e.g.
/// `https://trello.com/b/abcd1234/board-name` -> `abcd1234`.
/// Logs and returns `None` when the URL has no such segment.
pub fn extract_board_short_id(board_url: &str) -> Option<String> {
    let pattern = Regex::new(r"trello\.com/(?:b|board)/(\w+)").expect("board URL pattern");
    match pattern.captures(board_url) {
        Some(caps) => Some(caps[1].to_string()),
        None => {
            error!("Could not extract board ID from URL. Please ensure the URL is correct.");
            None
        }
    }
}

impl ApiClient {
    /// Create a client for the given credential pair. The base URL can
    /// be overridden through `TRELLO_API_BASE_URL`.
    pub fn new(api_key: &str, api_token: &str) -> Result<Self> {
        let base_url =
            std::env::var("TRELLO_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url,
            api_key: api_key.to_string(),
            api_token: api_token.to_string(),
        })
    }

    fn auth(&self) -> [(&str, &str); 2] {
        [
            ("key", self.api_key.as_str()),
            ("token", self.api_token.as_str()),
        ]
    }

    /// Resolve a board identifier (short link or full id) to the full
    /// board id, verifying that the token can actually see the board.
    pub fn board_id(&self, identifier: &str) -> Result<String> {
        let url = format!("{}/boards/{}", self.base_url, identifier);
        let res = self
            .client
            .get(&url)
            .query(&self.auth())
            .query(&[("fields", "id")])
            .send()
            .context("Failed to fetch board")?;
        let res = success_or_bail(res, "Error fetching board id")?;
        let board: BoardSummary = res.json().context("Parsing board response json")?;

        if self.verify_board_access(&board.id)? {
            Ok(board.id)
        } else {
            Err(CardfileError::BoardAccessDenied(board.id).into())
        }
    }

    /// Lightweight access check: `Ok(true)` when the board is visible,
    /// `Ok(false)` on a 401. Other failures are logged and treated as
    /// no access.
    pub fn verify_board_access(&self, board_id: &str) -> Result<bool> {
        let url = format!("{}/boards/{}", self.base_url, board_id);
        let res = self
            .client
            .get(&url)
            .query(&self.auth())
            .query(&[("fields", "id")])
            .send()
            .context("Failed to verify board access")?;
        match res.status() {
            status if status.is_success() => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            status => {
                let body = res.text().unwrap_or_else(|_| "".into());
                error!("Error verifying board access: {} - {}", status, body);
                Ok(false)
            }
        }
    }

    /// All lists on the board with their names.
    pub fn board_lists(&self, board_id: &str) -> Result<Vec<NamedRef>> {
        let url = format!("{}/boards/{}/lists", self.base_url, board_id);
        let res = self
            .client
            .get(&url)
            .query(&self.auth())
            .query(&[("fields", "name,id")])
            .send()
            .context("Failed to fetch board lists")?;
        let res = success_or_bail(res, "Error fetching lists")?;
        res.json().context("Parsing lists response json")
    }

    /// The board's first list, if any.
    pub fn first_list(&self, board_id: &str) -> Result<Option<NamedRef>> {
        let url = format!("{}/boards/{}/lists", self.base_url, board_id);
        let res = self
            .client
            .get(&url)
            .query(&self.auth())
            .query(&[("limit", "1")])
            .send()
            .context("Failed to fetch board lists")?;
        let res = success_or_bail(res, "Error fetching lists")?;
        let lists: Vec<NamedRef> = res.json().context("Parsing lists response json")?;
        Ok(lists.into_iter().next())
    }

    /// Create a new list on the board.
    pub fn create_list(&self, board_id: &str, name: &str) -> Result<NamedRef> {
        let url = format!("{}/lists", self.base_url);
        let res = self
            .client
            .post(&url)
            .query(&self.auth())
            .query(&[("name", name), ("idBoard", board_id)])
            .send()
            .context("Failed to create list")?;
        let res = success_or_bail(res, "Error creating list")?;
        res.json().context("Parsing created list json")
    }

    /// All labels on the board with their names.
    pub fn board_labels(&self, board_id: &str) -> Result<Vec<NamedRef>> {
        let url = format!("{}/boards/{}/labels", self.base_url, board_id);
        let res = self
            .client
            .get(&url)
            .query(&self.auth())
            .query(&[("fields", "name,id")])
            .send()
            .context("Failed to fetch board labels")?;
        let res = success_or_bail(res, "Error fetching labels")?;
        res.json().context("Parsing labels response json")
    }

    /// Create a new label on the board. The color is left unset.
    pub fn create_label(&self, board_id: &str, name: &str) -> Result<NamedRef> {
        let url = format!("{}/labels", self.base_url);
        let res = self
            .client
            .post(&url)
            .query(&self.auth())
            .query(&[("idBoard", board_id), ("name", name)])
            .send()
            .context("Failed to create label")?;
        let res = success_or_bail(res, "Error creating label")?;
        res.json().context("Parsing created label json")
    }

    /// Look up a member id by username.
    pub fn member_id(&self, username: &str) -> Result<String> {
        let url = format!("{}/members/{}", self.base_url, username);
        let res = self
            .client
            .get(&url)
            .query(&self.auth())
            .send()
            .context("Failed to fetch member")?;
        let res = success_or_bail(res, "Error fetching member")?;
        let member: IdRef = res.json().context("Parsing member response json")?;
        Ok(member.id)
    }

    /// Create a card and return its id.
    pub fn create_card(&self, card: &NewCard) -> Result<String> {
        let url = format!("{}/cards", self.base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("name", card.name.clone()),
            ("desc", card.desc.clone()),
            ("idList", card.list_id.clone()),
        ];
        if let Some(due) = &card.due {
            params.push(("due", due.clone()));
        }
        if !card.label_ids.is_empty() {
            params.push(("idLabels", card.label_ids.join(",")));
        }
        if !card.member_ids.is_empty() {
            params.push(("idMembers", card.member_ids.join(",")));
        }

        let res = self
            .client
            .post(&url)
            .query(&self.auth())
            .query(&params)
            .send()
            .context("Failed to create card")?;
        let res = success_or_bail(res, "Error creating card")?;
        let created: IdRef = res.json().context("Parsing created card json")?;
        Ok(created.id)
    }

    /// Create an (empty) checklist on a card and return its id.
    pub fn create_checklist(&self, card_id: &str, name: &str) -> Result<String> {
        let url = format!("{}/cards/{}/checklists", self.base_url, card_id);
        let res = self
            .client
            .post(&url)
            .query(&self.auth())
            .query(&[("name", name)])
            .send()
            .context("Failed to create checklist")?;
        let res = success_or_bail(res, "Error creating checklist")?;
        let checklist: IdRef = res.json().context("Parsing created checklist json")?;
        Ok(checklist.id)
    }

    /// Append one item to a checklist.
    pub fn add_checklist_item(&self, checklist_id: &str, item: &str) -> Result<()> {
        let url = format!("{}/checklists/{}/checkItems", self.base_url, checklist_id);
        let res = self
            .client
            .post(&url)
            .query(&self.auth())
            .query(&[("name", item)])
            .send()
            .context("Failed to add checklist item")?;
        success_or_bail(res, "Error adding checklist item")?;
        Ok(())
    }

    /// Attach a URL to a card, optionally making it the cover.
    pub fn attach_url(&self, card_id: &str, attachment_url: &str, set_cover: bool) -> Result<()> {
        let url = format!("{}/cards/{}/attachments", self.base_url, card_id);
        let res = self
            .client
            .post(&url)
            .query(&self.auth())
            .query(&[("url", attachment_url), ("setCover", cover_flag(set_cover))])
            .send()
            .context("Failed to attach URL")?;
        success_or_bail(res, "Error adding attachment")?;
        Ok(())
    }

    /// Upload a local file as a card attachment via multipart
    /// form-data, optionally making it the cover.
    pub fn attach_file(&self, card_id: &str, path: &Path, set_cover: bool) -> Result<()> {
        let url = format!("{}/cards/{}/attachments", self.base_url, card_id);

        let file = File::open(path)
            .with_context(|| format!("Failed to open attachment '{}'", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("attachment")
            .to_string();
        let part = multipart::Part::reader(file).file_name(file_name);
        let form = multipart::Form::new().part("file", part);

        let res = self
            .client
            .post(&url)
            .query(&self.auth())
            .query(&[("setCover", cover_flag(set_cover))])
            .multipart(form)
            .send()
            .context("Failed to upload attachment")?;
        success_or_bail(res, "Error adding attachment")?;
        Ok(())
    }
}

fn cover_flag(set_cover: bool) -> &'static str {
    if set_cover {
        "true"
    } else {
        "false"
    }
}

/// Pass the response through on success, otherwise turn the status and
/// body into an error.
fn success_or_bail(res: Response, action: &str) -> Result<Response> {
    if res.status().is_success() {
        return Ok(res);
    }
    let status = res.status();
    let body = res.text().unwrap_or_else(|_| "".into());
    anyhow::bail!("{}: {} - {}", action, status, body)
}
