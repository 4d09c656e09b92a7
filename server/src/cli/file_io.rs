use crate::cli_error::CliError;
use crate::data_store::{get_store_from_env, BookingStore, BookingStoreFacade};
use log::info;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;
use uuid::Uuid;
use venue_booking_api_types::BookingData;

pub fn load_data_from_file(path: &PathBuf, generate_new_uuids: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let f = File::open(path).map_err(|e| {
        CliError::FileError(format!("Could not open {:?} for reading: {}", path, e))
    })?;
    let mut data: BookingData = serde_json::from_reader(BufReader::new(f))?;

    if generate_new_uuids {
        regenerate_uuids(&mut data)?;
    }
    import_data(data_store.as_mut(), data)?;

    Ok(())
}

pub fn export_data_to_file(path: &PathBuf) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let data = export_data(data_store.as_mut())?;

    let f = File::create(path).map_err(|e| {
        CliError::FileError(format!(
            "Could not create or open {:?} for writing: {}",
            path, e
        ))
    })?;
    serde_json::to_writer_pretty(BufWriter::new(f), &data)?;
    info!(
        "Exported {} venue(s), {} event(s) and {} booking(s) to {:?}",
        data.venues.len(),
        data.events.len(),
        data.bookings.len(),
        path
    );

    Ok(())
}

/// Collect all entities of the store
fn export_data(data_store: &mut dyn BookingStoreFacade) -> Result<BookingData, CliError> {
    let event_types = data_store.get_event_types(false)?;
    let venues = data_store.get_venues()?;
    let events = data_store.get_events()?;
    let bookings = data_store
        .search_bookings(&Default::default())?
        .into_iter()
        .map(|record| data_store.get_booking(record.booking_id))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(BookingData {
        event_types: event_types.into_iter().map(|t| t.into()).collect(),
        venues: venues.into_iter().map(|v| v.into()).collect(),
        events: events.into_iter().map(|e| e.into()).collect(),
        bookings: bookings.into_iter().map(|b| b.into()).collect(),
    })
}

/// Create all entities of `data` in the store within one transaction.
///
/// Event types are matched to existing ones by name or created with a new store-assigned id; the
/// events of the imported data are adjusted accordingly. Event type ids, which are not part of the
/// imported data, are expected to refer to existing event types.
fn import_data(data_store: &mut dyn BookingStoreFacade, data: BookingData) -> Result<(), CliError> {
    let summary = data_store.import_data(data.into())?;
    info!(
        "Imported {} venue(s), {} event(s) and {} booking(s). Created {} and reused {} event type(s).",
        summary.venues,
        summary.events,
        summary.bookings,
        summary.created_event_types,
        summary.reused_event_types
    );
    Ok(())
}

fn regenerate_uuids(data: &mut BookingData) -> Result<(), CliError> {
    let mut venue_id_map = BTreeMap::<Uuid, Uuid>::new();
    for venue in data.venues.iter_mut() {
        let new_id = Uuid::now_v7();
        venue_id_map.insert(venue.id, new_id);
        venue.id = new_id;
    }
    let mut event_id_map = BTreeMap::<Uuid, Uuid>::new();
    for event in data.events.iter_mut() {
        let new_id = Uuid::now_v7();
        event_id_map.insert(event.id, new_id);
        event.id = new_id;
    }
    for booking in data.bookings.iter_mut() {
        booking.venue_id = *venue_id_map
            .get(&booking.venue_id)
            .ok_or(CliError::DataError(format!(
                "Venue {} of booking {} does not exist",
                booking.venue_id, booking.id
            )))?;
        booking.event_id = *event_id_map
            .get(&booking.event_id)
            .ok_or(CliError::DataError(format!(
                "Event {} of booking {} does not exist",
                booking.event_id, booking.id
            )))?;
        booking.id = Uuid::now_v7();
    }

    Ok(())
}
