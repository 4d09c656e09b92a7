use chrono::{naive::NaiveDate, DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub capacity: i32,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventType {
    pub id: i32,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true", rename = "isActive")]
    pub is_active: bool,
    #[serde(rename = "createdDate")]
    pub created_date: DateTime<Utc>,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub date: NaiveDate,
    pub description: String,
    #[serde(rename = "eventTypeId")]
    pub event_type_id: i32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Booking {
    pub id: Uuid,
    #[serde(rename = "venueId")]
    pub venue_id: Uuid,
    #[serde(rename = "eventId")]
    pub event_id: Uuid,
    #[serde(rename = "bookingDate")]
    pub booking_date: NaiveDate,
}

/// Flattened, read-only view of a booking with its event, event type and venue
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct BookingRecord {
    #[serde(rename = "bookingId")]
    pub booking_id: Uuid,
    #[serde(rename = "eventName")]
    pub event_name: String,
    #[serde(rename = "eventTypeName")]
    pub event_type_name: String,
    #[serde(rename = "eventTypeId")]
    pub event_type_id: i32,
    #[serde(rename = "venueName")]
    pub venue_name: String,
    #[serde(rename = "eventDate")]
    pub event_date: NaiveDate,
    #[serde(rename = "bookingDate")]
    pub booking_date: NaiveDate,
    #[serde(rename = "venueLocation")]
    pub venue_location: String,
    #[serde(rename = "venueCapacity")]
    pub venue_capacity: i32,
}

/// Complete contents of a booking database, as used for export and import
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct BookingData {
    #[serde(default, rename = "eventTypes")]
    pub event_types: Vec<EventType>,
    #[serde(default)]
    pub venues: Vec<Venue>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub bookings: Vec<Booking>,
}
