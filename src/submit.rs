// Card submission: turns parsed card records into API calls, one card
// at a time. A failed lookup or follow-up call is logged and skipped;
// only a missing target list or a failed card-creation call marks the
// whole card as failed. Nothing is rolled back.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use log::{error, info, warn};

use crate::api::{ApiClient, NewCard};
use crate::parser::CardRecord;

/// Run-scoped cache of list name -> list id, passed explicitly into
/// each submission so nothing outlives the run.
#[derive(Debug, Default)]
pub struct ListCache {
    ids_by_name: HashMap<String, String>,
}

impl ListCache {
    pub fn new() -> Self {
        ListCache::default()
    }

    fn get(&self, name: &str) -> Option<String> {
        self.ids_by_name.get(name).cloned()
    }

    fn insert(&mut self, name: String, id: String) {
        self.ids_by_name.insert(name, id);
    }
}

/// Create one card with all of its sub-resources. Returns whether the
/// card itself was created; checklist/attachment/cover failures are
/// logged but do not count as card failure.
pub fn submit_card(
    api: &ApiClient,
    cache: &mut ListCache,
    board_id: &str,
    card: &CardRecord,
) -> bool {
    let list_id = match &card.list_name {
        Some(name) => match resolve_list_id(api, cache, board_id, name) {
            Some(id) => id,
            None => {
                error!("Skipping card '{}' due to missing list.", card.title);
                return false;
            }
        },
        // no explicit list: default to the board's first list
        None => match api.first_list(board_id) {
            Ok(Some(list)) => list.id,
            Ok(None) => {
                error!(
                    "No lists found on the board. Cannot create card '{}'.",
                    card.title
                );
                return false;
            }
            Err(err) => {
                error!("Error fetching lists: {:#}", err);
                return false;
            }
        },
    };

    let due = card.due_date.as_deref().and_then(|raw| {
        let normalized = normalize_due_date(raw);
        if normalized.is_none() {
            warn!(
                "Invalid due date format for card '{}': {}",
                card.title, raw
            );
        }
        normalized
    });

    let label_ids = card
        .labels
        .iter()
        .filter_map(|name| resolve_label_id(api, board_id, name))
        .collect();
    let member_ids = card
        .members
        .iter()
        .filter_map(|username| match api.member_id(username) {
            Ok(id) => Some(id),
            Err(err) => {
                error!("Error fetching member '{}': {:#}", username, err);
                None
            }
        })
        .collect();

    let new_card = NewCard {
        name: card.title.clone(),
        desc: card.description.clone(),
        list_id,
        due,
        label_ids,
        member_ids,
    };
    let card_id = match api.create_card(&new_card) {
        Ok(id) => id,
        Err(err) => {
            error!("Error creating card '{}': {:#}", card.title, err);
            return false;
        }
    };
    info!("Card '{}' created successfully.", card.title);

    if !card.checklist.is_empty() {
        create_checklist(api, &card_id, &card.checklist);
    }
    for attachment in &card.attachments {
        add_attachment(api, &card_id, attachment, false);
    }
    if let Some(image) = &card.image {
        add_attachment(api, &card_id, image, true);
    }
    true
}

/// Look a list up by name, creating it when the board does not have
/// it. The full list table is cached on first use.
fn resolve_list_id(
    api: &ApiClient,
    cache: &mut ListCache,
    board_id: &str,
    list_name: &str,
) -> Option<String> {
    if let Some(id) = cache.get(list_name) {
        return Some(id);
    }
    let lists = match api.board_lists(board_id) {
        Ok(lists) => lists,
        Err(err) => {
            error!("Error fetching lists from the board: {:#}", err);
            return None;
        }
    };
    for list in lists {
        cache.insert(list.name, list.id);
    }
    if let Some(id) = cache.get(list_name) {
        return Some(id);
    }

    info!("List '{}' not found on the board. Creating it now.", list_name);
    match api.create_list(board_id, list_name) {
        Ok(list) => {
            let id = list.id.clone();
            cache.insert(list.name, list.id);
            Some(id)
        }
        Err(err) => {
            error!("Failed to create list '{}': {:#}", list_name, err);
            None
        }
    }
}

/// Look a label up by name (case-insensitive), creating it when the
/// board does not have it.
fn resolve_label_id(api: &ApiClient, board_id: &str, label_name: &str) -> Option<String> {
    let labels = match api.board_labels(board_id) {
        Ok(labels) => labels,
        Err(err) => {
            error!("Error fetching labels from the board: {:#}", err);
            return None;
        }
    };
    let wanted = label_name.to_lowercase();
    if let Some(label) = labels.iter().find(|label| label.name.to_lowercase() == wanted) {
        return Some(label.id.clone());
    }
    match api.create_label(board_id, label_name) {
        Ok(label) => Some(label.id),
        Err(err) => {
            error!("Error creating label '{}': {:#}", label_name, err);
            None
        }
    }
}

fn create_checklist(api: &ApiClient, card_id: &str, items: &[String]) {
    let checklist_id = match api.create_checklist(card_id, "Checklist") {
        Ok(id) => id,
        Err(err) => {
            error!("Error creating checklist: {:#}", err);
            return;
        }
    };
    for item in items {
        if let Err(err) = api.add_checklist_item(&checklist_id, item) {
            error!("Error adding checklist item '{}': {:#}", item, err);
        }
    }
}

fn add_attachment(api: &ApiClient, card_id: &str, target: &str, set_cover: bool) {
    if target.starts_with("http://") || target.starts_with("https://") {
        if let Err(err) = api.attach_url(card_id, target, set_cover) {
            error!("Error adding attachment '{}': {:#}", target, err);
        }
        return;
    }

    let path = Path::new(target);
    if !path.is_file() {
        warn!("Attachment file not found: {}", target);
        return;
    }
    if let Err(err) = api.attach_file(card_id, path, set_cover) {
        error!("Error adding attachment '{}': {:#}", target, err);
    }
}

/// Bring a document due date into the shape the API accepts. Accepts
/// an offset-carrying RFC 3339 timestamp, a naive datetime, or a bare
/// date (midnight). Anything else is rejected so the caller can warn
/// and submit the card without a due date.
fn normalize_due_date(raw: &str) -> Option<String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.to_rfc3339());
    }
    if let Ok(dt) = raw.parse::<NaiveDateTime>() {
        return Some(dt.format("%Y-%m-%dT%H:%M:%S").to_string());
    }
    if let Ok(date) = raw.parse::<NaiveDate>() {
        return Some(date.format("%Y-%m-%dT00:00:00").to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naive_datetime_is_accepted() {
        assert_eq!(
            normalize_due_date("2023-12-31T23:59:00").as_deref(),
            Some("2023-12-31T23:59:00")
        );
    }

    #[test]
    fn rfc3339_timestamp_keeps_its_offset() {
        let due = normalize_due_date("2023-12-31T23:59:00+02:00").unwrap();
        assert!(due.starts_with("2023-12-31T23:59:00"));
        assert!(due.ends_with("+02:00"));
    }

    #[test]
    fn bare_date_becomes_midnight() {
        assert_eq!(
            normalize_due_date("2024-06-01").as_deref(),
            Some("2024-06-01T00:00:00")
        );
    }

    #[test]
    fn garbage_due_dates_are_rejected() {
        assert_eq!(normalize_due_date("next tuesday"), None);
        assert_eq!(normalize_due_date("31/12/2023"), None);
        assert_eq!(normalize_due_date(""), None);
    }

    #[test]
    fn list_cache_returns_inserted_ids() {
        let mut cache = ListCache::new();
        assert_eq!(cache.get("To Do"), None);
        cache.insert("To Do".into(), "abc123".into());
        assert_eq!(cache.get("To Do").as_deref(), Some("abc123"));
    }
}
