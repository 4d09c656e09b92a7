use crate::data_store::{BookingId, EventId, EventTypeId, StoreError, VenueId};
use chrono::{naive::NaiveDate, DateTime, Utc};
use diesel::prelude::*;

pub const VENUE_NAME_MAX_LENGTH: usize = 100;
pub const VENUE_LOCATION_MAX_LENGTH: usize = 255;
pub const VENUE_CAPACITY_RANGE: std::ops::RangeInclusive<i32> = 1..=100_000;
pub const EVENT_TYPE_NAME_MAX_LENGTH: usize = 50;
pub const EVENT_TYPE_DESCRIPTION_MAX_LENGTH: usize = 255;
pub const EVENT_NAME_MAX_LENGTH: usize = 100;
pub const EVENT_DESCRIPTION_MAX_LENGTH: usize = 500;

/// Name substituted in [BookingRecord]s for bookings whose event type can not be resolved
pub const UNKNOWN_EVENT_TYPE_NAME: &str = "Unknown";

#[derive(Clone, Debug, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::venues)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub location: String,
    pub capacity: i32,
    /// Stable relative path of the venue's image or a placeholder, if no image has been uploaded
    pub image_url: String,
}

impl Venue {
    pub fn validate(&self) -> Result<(), StoreError> {
        check_required_text("Venue name", &self.name, VENUE_NAME_MAX_LENGTH)?;
        check_required_text("Venue location", &self.location, VENUE_LOCATION_MAX_LENGTH)?;
        if !VENUE_CAPACITY_RANGE.contains(&self.capacity) {
            return Err(StoreError::InvalidInputData(format!(
                "Venue capacity must be between {} and {}.",
                VENUE_CAPACITY_RANGE.start(),
                VENUE_CAPACITY_RANGE.end()
            )));
        }
        if self.image_url.trim().is_empty() {
            return Err(StoreError::InvalidInputData(
                "Venue must have an image associated with it.".to_owned(),
            ));
        }
        Ok(())
    }
}

impl From<venue_booking_api_types::Venue> for Venue {
    fn from(value: venue_booking_api_types::Venue) -> Self {
        Self {
            id: value.id,
            name: value.name,
            location: value.location,
            capacity: value.capacity,
            image_url: value.image_url,
        }
    }
}

impl From<Venue> for venue_booking_api_types::Venue {
    fn from(value: Venue) -> Self {
        Self {
            id: value.id,
            name: value.name,
            location: value.location,
            capacity: value.capacity,
            image_url: value.image_url,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Queryable, Selectable)]
#[diesel(table_name=super::schema::event_types)]
pub struct EventType {
    pub id: EventTypeId,
    pub name: String,
    pub description: Option<String>,
    /// Inactive event types are not offered for selection, but stay valid for existing events
    pub is_active: bool,
    pub created_date: DateTime<Utc>,
}

impl From<EventType> for venue_booking_api_types::EventType {
    fn from(value: EventType) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            is_active: value.is_active,
            created_date: value.created_date,
        }
    }
}

#[derive(Clone, Debug, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::event_types)]
#[diesel(treat_none_as_null = true)]
pub struct NewEventType {
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
}

impl NewEventType {
    pub fn validate(&self) -> Result<(), StoreError> {
        check_required_text("Event type name", &self.name, EVENT_TYPE_NAME_MAX_LENGTH)?;
        if let Some(description) = &self.description {
            if description.chars().count() > EVENT_TYPE_DESCRIPTION_MAX_LENGTH {
                return Err(StoreError::InvalidInputData(format!(
                    "Event type description must not exceed {} characters.",
                    EVENT_TYPE_DESCRIPTION_MAX_LENGTH
                )));
            }
        }
        Ok(())
    }
}

impl From<venue_booking_api_types::EventType> for NewEventType {
    fn from(value: venue_booking_api_types::EventType) -> Self {
        Self {
            name: value.name,
            description: value.description,
            is_active: value.is_active,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::events)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub event_date: NaiveDate,
    pub description: String,
    pub event_type_id: EventTypeId,
}

impl Event {
    pub fn validate(&self) -> Result<(), StoreError> {
        check_required_text("Event name", &self.name, EVENT_NAME_MAX_LENGTH)?;
        check_required_text(
            "Event description",
            &self.description,
            EVENT_DESCRIPTION_MAX_LENGTH,
        )?;
        Ok(())
    }
}

impl From<venue_booking_api_types::Event> for Event {
    fn from(value: venue_booking_api_types::Event) -> Self {
        Self {
            id: value.id,
            name: value.name,
            event_date: value.date,
            description: value.description,
            event_type_id: value.event_type_id,
        }
    }
}

impl From<Event> for venue_booking_api_types::Event {
    fn from(value: Event) -> Self {
        Self {
            id: value.id,
            name: value.name,
            date: value.event_date,
            description: value.description,
            event_type_id: value.event_type_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name=super::schema::bookings)]
pub struct Booking {
    pub id: BookingId,
    pub venue_id: VenueId,
    pub event_id: EventId,
    pub booking_date: NaiveDate,
}

impl From<venue_booking_api_types::Booking> for Booking {
    fn from(value: venue_booking_api_types::Booking) -> Self {
        Self {
            id: value.id,
            venue_id: value.venue_id,
            event_id: value.event_id,
            booking_date: value.booking_date,
        }
    }
}

impl From<Booking> for venue_booking_api_types::Booking {
    fn from(value: Booking) -> Self {
        Self {
            id: value.id,
            venue_id: value.venue_id,
            event_id: value.event_id,
            booking_date: value.booking_date,
        }
    }
}

/// A complete data set to be created at once by
/// [crate::data_store::BookingStoreFacade::import_data]
#[derive(Clone, Debug, Default)]
pub struct DataImport {
    /// Event types, each with its id within the imported data set. Events referring to one of
    /// these ids are attached to the stored event type.
    pub event_types: Vec<(EventTypeId, NewEventType)>,
    pub venues: Vec<Venue>,
    pub events: Vec<Event>,
    pub bookings: Vec<Booking>,
}

impl From<venue_booking_api_types::BookingData> for DataImport {
    fn from(value: venue_booking_api_types::BookingData) -> Self {
        Self {
            event_types: value
                .event_types
                .into_iter()
                .map(|t| (t.id, t.into()))
                .collect(),
            venues: value.venues.into_iter().map(|v| v.into()).collect(),
            events: value.events.into_iter().map(|e| e.into()).collect(),
            bookings: value.bookings.into_iter().map(|b| b.into()).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created_event_types: usize,
    /// Imported event types, which have been matched to an existing event type of the same name
    pub reused_event_types: usize,
    pub venues: usize,
    pub events: usize,
    pub bookings: usize,
}

/// Read model of a booking, joined with its event, the event's type and the venue.
///
/// Records are never written back; they are produced by
/// [crate::data_store::BookingStoreFacade::search_bookings] only.
#[derive(Clone, Debug, PartialEq)]
pub struct BookingRecord {
    pub booking_id: BookingId,
    pub event_name: String,
    pub event_type_name: String,
    pub event_type_id: EventTypeId,
    pub venue_name: String,
    pub event_date: NaiveDate,
    pub booking_date: NaiveDate,
    pub venue_location: String,
    pub venue_capacity: i32,
}

impl BookingRecord {
    /// Flatten the joined rows. A missing event type is represented by
    /// [UNKNOWN_EVENT_TYPE_NAME].
    pub fn from_joined(
        booking: &Booking,
        event: &Event,
        event_type: Option<&EventType>,
        venue: &Venue,
    ) -> Self {
        Self {
            booking_id: booking.id,
            event_name: event.name.clone(),
            event_type_name: event_type
                .map(|t| t.name.clone())
                .unwrap_or_else(|| UNKNOWN_EVENT_TYPE_NAME.to_owned()),
            event_type_id: event.event_type_id,
            venue_name: venue.name.clone(),
            event_date: event.event_date,
            booking_date: booking.booking_date,
            venue_location: venue.location.clone(),
            venue_capacity: venue.capacity,
        }
    }
}

impl From<BookingRecord> for venue_booking_api_types::BookingRecord {
    fn from(value: BookingRecord) -> Self {
        Self {
            booking_id: value.booking_id,
            event_name: value.event_name,
            event_type_name: value.event_type_name,
            event_type_id: value.event_type_id,
            venue_name: value.venue_name,
            event_date: value.event_date,
            booking_date: value.booking_date,
            venue_location: value.venue_location,
            venue_capacity: value.venue_capacity,
        }
    }
}

fn check_required_text(field: &str, value: &str, max_length: usize) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::InvalidInputData(format!("{} is required.", field)));
    }
    if value.chars().count() > max_length {
        return Err(StoreError::InvalidInputData(format!(
            "{} must not exceed {} characters.",
            field, max_length
        )));
    }
    Ok(())
}
