use crate::cli::util::confirm_deletion;
use crate::cli_error::CliError;
use crate::data_store::models::{Event, NewEventType};
use crate::data_store::{get_store_from_env, BookingStore, EventId, EventTypeId};
use chrono::NaiveDate;
use log::info;
use uuid::Uuid;

pub fn print_event_type_list(include_inactive: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let event_types = data_store.get_event_types(!include_inactive)?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "name", "description", "active", "created"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(event_types.into_iter().map(|event_type| {
            [
                event_type.id.to_string(),
                event_type.name,
                event_type.description.unwrap_or_default(),
                if event_type.is_active { "yes" } else { "no" }.to_string(),
                event_type.created_date.format("%Y-%m-%d %H:%M").to_string(),
            ]
        }));

    println!("{table}");
    Ok(())
}

pub fn add_event_type(name: String, description: Option<String>) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let event_type_id = data_store.create_event_type(NewEventType {
        name,
        description: description.filter(|d| !d.trim().is_empty()),
        is_active: true,
    })?;
    info!("Created event type {}", event_type_id);
    println!("Created event type with id {}.", event_type_id);
    Ok(())
}

pub fn set_event_type_active(event_type_id: EventTypeId, active: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    data_store.set_event_type_active(event_type_id, active)?;
    info!(
        "{} event type {}",
        if active { "Activated" } else { "Deactivated" },
        event_type_id
    );
    Ok(())
}

pub fn delete_event_type(event_type_id: EventTypeId, confirmed: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let event_type = data_store.get_event_type(event_type_id)?;
    if !confirm_deletion(&format!("event type \"{}\"", event_type.name), confirmed) {
        return Ok(());
    }
    data_store.delete_event_type(event_type_id)?;
    info!("Deleted event type {}", event_type_id);
    Ok(())
}

pub fn print_event_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let events = data_store.get_events()?;
    let event_types = data_store.get_event_types(false)?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "date", "name", "type", "description"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(events.into_iter().map(|event| {
            [
                event.id.to_string(),
                event.event_date.to_string(),
                event.name,
                event_types
                    .iter()
                    .find(|t| t.id == event.event_type_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| event.event_type_id.to_string()),
                event.description,
            ]
        }));

    println!("{table}");
    Ok(())
}

pub fn add_event(
    name: String,
    date: NaiveDate,
    description: String,
    event_type_id: EventTypeId,
) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let event = Event {
        id: Uuid::now_v7(),
        name,
        event_date: date,
        description,
        event_type_id,
    };
    data_store.create_event(event.clone())?;
    info!("Created event {} ({})", event.name, event.id);
    println!("Created event with id {}.", event.id);
    Ok(())
}

/// Changes of an event's data. Fields, which are None, are kept.
#[derive(Default)]
pub struct EventChanges {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub event_type_id: Option<EventTypeId>,
}

pub fn update_event(event_id: EventId, changes: EventChanges) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let mut event = data_store.get_event(event_id)?;
    if let Some(name) = changes.name {
        event.name = name;
    }
    if let Some(date) = changes.date {
        event.event_date = date;
    }
    if let Some(description) = changes.description {
        event.description = description;
    }
    if let Some(event_type_id) = changes.event_type_id {
        event.event_type_id = event_type_id;
    }
    data_store.update_event(event)?;
    info!("Updated event {}", event_id);
    Ok(())
}

pub fn delete_event(event_id: EventId, confirmed: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let event = data_store.get_event(event_id)?;
    if !confirm_deletion(
        &format!("event \"{}\" on {}", event.name, event.event_date),
        confirmed,
    ) {
        return Ok(());
    }
    data_store.delete_event(event_id)?;
    info!("Deleted event {}", event_id);
    Ok(())
}
