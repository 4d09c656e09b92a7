use crate::cli::util::confirm_deletion;
use crate::cli_error::CliError;
use crate::data_store::models::{Booking, BookingRecord};
use crate::data_store::{
    get_store_from_env, BookingId, BookingSearch, BookingStore, EventId, VenueId,
};
use chrono::NaiveDate;
use log::info;
use uuid::Uuid;

pub fn print_booking_list() -> Result<(), CliError> {
    search_bookings(&BookingSearch::default(), false)
}

/// Search bookings and print the matching records as table or as JSON.
pub fn search_bookings(search: &BookingSearch, as_json: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let records = data_store.search_bookings(search)?;

    if as_json {
        let records: Vec<venue_booking_api_types::BookingRecord> =
            records.into_iter().map(|r| r.into()).collect();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No bookings found matching your search criteria.");
        return Ok(());
    }
    println!("{}", booking_table(records));
    Ok(())
}

fn booking_table(records: Vec<BookingRecord>) -> comfy_table::Table {
    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec![
            "booking id",
            "booking date",
            "event",
            "event type",
            "event date",
            "venue",
            "location",
            "capacity",
        ])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(records.into_iter().map(|record| {
            [
                record.booking_id.to_string(),
                record.booking_date.to_string(),
                record.event_name,
                record.event_type_name,
                record.event_date.to_string(),
                record.venue_name,
                record.venue_location,
                record.venue_capacity.to_string(),
            ]
        }));
    table
}

pub fn add_booking(
    venue_id: VenueId,
    event_id: EventId,
    booking_date: NaiveDate,
) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let booking = Booking {
        id: Uuid::now_v7(),
        venue_id,
        event_id,
        booking_date,
    };
    data_store.create_booking(booking.clone())?;
    info!("Created booking {}", booking.id);
    println!("Created booking with id {}.", booking.id);
    Ok(())
}

/// Changes of a booking. Fields, which are None, are kept.
#[derive(Default)]
pub struct BookingChanges {
    pub venue_id: Option<VenueId>,
    pub event_id: Option<EventId>,
    pub booking_date: Option<NaiveDate>,
}

pub fn update_booking(booking_id: BookingId, changes: BookingChanges) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let mut booking = data_store.get_booking(booking_id)?;
    if let Some(venue_id) = changes.venue_id {
        booking.venue_id = venue_id;
    }
    if let Some(event_id) = changes.event_id {
        booking.event_id = event_id;
    }
    if let Some(booking_date) = changes.booking_date {
        booking.booking_date = booking_date;
    }
    data_store.update_booking(booking)?;
    info!("Updated booking {}", booking_id);
    Ok(())
}

pub fn delete_booking(booking_id: BookingId, confirmed: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let booking = data_store.get_booking(booking_id)?;
    if !confirm_deletion(
        &format!("booking {} on {}", booking.id, booking.booking_date),
        confirmed,
    ) {
        return Ok(());
    }
    data_store.delete_booking(booking_id)?;
    info!("Deleted booking {}", booking_id);
    Ok(())
}
