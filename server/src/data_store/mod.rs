//! The backend part of the booking manager: the database interface
//!
//! The primary entry point to this module is the function [get_store_from_env], which returns an
//! object implementing the [BookingStore] trait. This object can be shared between threads and be
//! used to create [BookingStoreFacade] instances for interaction with the database. These provide
//! a CRUD-like interface, using the data models from the [models] module, and the booking search
//! defined in [search].
//!
//! Every mutating facade method runs the checks of the [integrity] module within the same
//! transaction as the write itself, so uniqueness and restrict-on-delete rules hold for concurrent
//! writers, too.
//!
//! The primary implementation of [BookingStore] ([postgres::PgDataStore]) wraps a PostgreSQL
//! connection pool and its corresponding [BookingStoreFacade] objects hold a reference to one pooled
//! connection each, using the Diesel query DSL for implementing the database interaction.
//!
//! There is also an in-memory mock implementation for unittests.

use crate::cli_error::CliError;
use crate::setup;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod integrity;
pub mod models;
mod postgres;
mod schema;
pub mod search;
#[cfg(test)]
pub mod store_mock;

pub use search::{BookingSearch, BookingSearchBuilder};

/// Get a [BookingStore] instance, according to the "DATABASE_URL" and "STORE_TIMEOUT_SECONDS"
/// environment variables.
///
/// The DATABASE_URL must be a PosgreSQL connection url, following the schema
/// "postgres://{user}:{password}@{host}/{database}".
pub fn get_store_from_env() -> Result<impl BookingStore, CliError> {
    let timeout = setup::get_store_timeout_from_env()?;
    postgres::PgDataStore::new(&setup::get_database_url_from_env()?, timeout)
        .map_err(|err| CliError::CouldNotConnectToDatabase(err.to_string()))
}

pub type VenueId = uuid::Uuid;
pub type EventId = uuid::Uuid;
pub type EventTypeId = i32;
pub type BookingId = uuid::Uuid;

/// Default upper bound for a single storage call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// A parent entity that bookings may depend on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingDependency {
    Venue(VenueId),
    Event(EventId),
}

impl Display for BookingDependency {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BookingDependency::Venue(id) => write!(f, "venue {}", id),
            BookingDependency::Event(id) => write!(f, "event {}", id),
        }
    }
}

/// The uniqueness rules, which are policed by the [integrity] module
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UniquenessRule {
    /// No two venues with the same (name, location)
    VenueNameAndLocation,
    /// No two events with the same (name, date)
    EventNameAndDate,
    /// No two bookings with the same (venue, event, booking date)
    BookingVenueEventAndDate,
    /// Booking ids are globally unique
    BookingId,
}

impl UniquenessRule {
    /// Identify the rule checked by a specific constraint of our Postgres database schema.
    pub fn from_postgres_constraint(constraint_name: &str) -> Option<Self> {
        match constraint_name {
            "venues_name_location_key" => Some(Self::VenueNameAndLocation),
            "events_name_date_key" => Some(Self::EventNameAndDate),
            "bookings_venue_event_date_key" => Some(Self::BookingVenueEventAndDate),
            "bookings_pkey" => Some(Self::BookingId),
            _ => None,
        }
    }
}

impl Display for UniquenessRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UniquenessRule::VenueNameAndLocation => {
                "A venue with the same name and location already exists."
            }
            UniquenessRule::EventNameAndDate => {
                "An event with the same name and date already exists."
            }
            UniquenessRule::BookingVenueEventAndDate => {
                "A booking already exists for this venue and event on the selected date."
            }
            UniquenessRule::BookingId => "A booking with the same id already exists.",
        })
    }
}

pub trait BookingStoreFacade {
    /// Get all event types, ordered by name. If `only_active` is true, deactivated event types are
    /// left out, which is what selection lists should offer.
    fn get_event_types(&mut self, only_active: bool) -> Result<Vec<models::EventType>, StoreError>;
    fn get_event_type(
        &mut self,
        event_type_id: EventTypeId,
    ) -> Result<models::EventType, StoreError>;
    /// Create a new event type and return its store-assigned id
    fn create_event_type(
        &mut self,
        event_type: models::NewEventType,
    ) -> Result<EventTypeId, StoreError>;
    fn update_event_type(
        &mut self,
        event_type_id: EventTypeId,
        event_type: models::NewEventType,
    ) -> Result<(), StoreError>;
    fn set_event_type_active(
        &mut self,
        event_type_id: EventTypeId,
        is_active: bool,
    ) -> Result<(), StoreError>;
    /// Delete an event type.
    ///
    /// Fails with [StoreError::ReferencedByEvents] while any event is of this type.
    fn delete_event_type(&mut self, event_type_id: EventTypeId) -> Result<(), StoreError>;

    /// Get all venues, ordered by (name, location)
    fn get_venues(&mut self) -> Result<Vec<models::Venue>, StoreError>;
    fn get_venue(&mut self, venue_id: VenueId) -> Result<models::Venue, StoreError>;
    /// Create a new venue.
    ///
    /// # return value
    /// - `Ok(())` if the venue has been created, successfully
    /// - `Err(StoreError::Duplicate(_))` if a venue with the same name and location exists
    /// - `Err(_)` if something different went wrong, as usual
    fn create_venue(&mut self, venue: models::Venue) -> Result<(), StoreError>;
    fn update_venue(&mut self, venue: models::Venue) -> Result<(), StoreError>;
    /// Delete a venue and return the deleted row (e.g. for cleaning up its image).
    ///
    /// Fails with [StoreError::ReferencedByBookings] and leaves the store unchanged while any
    /// booking references the venue.
    fn delete_venue(&mut self, venue_id: VenueId) -> Result<models::Venue, StoreError>;

    /// Get all events, ordered by (date, name)
    fn get_events(&mut self) -> Result<Vec<models::Event>, StoreError>;
    fn get_event(&mut self, event_id: EventId) -> Result<models::Event, StoreError>;
    fn create_event(&mut self, event: models::Event) -> Result<(), StoreError>;
    fn update_event(&mut self, event: models::Event) -> Result<(), StoreError>;
    /// Delete an event.
    ///
    /// Fails with [StoreError::ReferencedByBookings] and leaves the store unchanged while any
    /// booking references the event.
    fn delete_event(&mut self, event_id: EventId) -> Result<(), StoreError>;

    fn get_booking(&mut self, booking_id: BookingId) -> Result<models::Booking, StoreError>;
    /// Create a new booking.
    ///
    /// # return value
    /// - `Ok(())` if the booking has been created, successfully
    /// - `Err(StoreError::InvalidInputData(_))` if the venue or event does not exist
    /// - `Err(StoreError::Duplicate(_))` if a booking for the same venue, event and date exists,
    ///   or the booking id is taken
    /// - `Err(_)` if something different went wrong, as usual
    fn create_booking(&mut self, booking: models::Booking) -> Result<(), StoreError>;
    /// Update an existing booking. The duplicate-booking rule is applied like on creation,
    /// ignoring the booking itself.
    fn update_booking(&mut self, booking: models::Booking) -> Result<(), StoreError>;
    fn delete_booking(&mut self, booking_id: BookingId) -> Result<(), StoreError>;
    /// Get the ids of all bookings referencing the given venue or event
    fn get_dependent_bookings(
        &mut self,
        dependency: BookingDependency,
    ) -> Result<Vec<BookingId>, StoreError>;

    /// Create all entities of a data set in a single transaction.
    ///
    /// Imported event types are matched to existing event types by name; only unknown ones are
    /// created. All entities pass the same integrity checks as on individual creation. If any of
    /// them is rejected, nothing is stored.
    fn import_data(
        &mut self,
        data: models::DataImport,
    ) -> Result<models::ImportSummary, StoreError>;

    /// Search bookings, joined with their event, event type and venue.
    ///
    /// Records are returned ordered by booking date, newest first, and by booking id for equal
    /// dates.
    fn search_bookings(
        &mut self,
        search: &BookingSearch,
    ) -> Result<Vec<models::BookingRecord>, StoreError>;
}

pub trait BookingStore: Send + Sync {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn BookingStoreFacade + 'a>, StoreError>;
}

#[derive(Debug)]
pub enum StoreError {
    /// Connection the database failed or no pooled connection became available in time. See
    /// string description for details.
    ConnectionError(String),
    /// A storage call did not complete within the configured timeout
    Timeout,
    /// The query could not be executed because of some error not covered by the other members (see
    /// string description)
    QueryError(diesel::result::Error),
    /// Database transaction could not be commited due to a conflicting concurrent transaction
    TransactionConflict,
    /// The requested entity does not exist
    NotExisting,
    /// The entity could not be written, because it would violate the given uniqueness rule
    Duplicate(UniquenessRule),
    /// The venue or event can not be deleted, because bookings still reference it. `bookings`
    /// lists the dependent bookings (it may be empty, if the violation was only detected by a
    /// database constraint).
    ReferencedByBookings {
        dependency: BookingDependency,
        bookings: Vec<BookingId>,
    },
    /// The event type can not be deleted, because events still reference it.
    ReferencedByEvents {
        event_type_id: EventTypeId,
        events: Vec<EventId>,
    },
    /// The provided data is invalid, i.e. it does not match the expected ranges, references a
    /// non-existing entity or violates a SQL constraint. See string description for details.
    InvalidInputData(String),
    /// Some data queried from the database could not be deserialized. See string description for
    /// details.
    InvalidDataInDatabase(String),
}

impl StoreError {
    /// Check if the failed operation may be retried with the same inputs.
    ///
    /// Creating operations should only be retried after confirming that the failed attempt has
    /// not been committed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionError(_) | Self::Timeout | Self::TransactionConflict
        )
    }

    /// Check if this is a domain-level rejection (as opposed to a fault of the storage layer)
    pub fn is_domain_error(&self) -> bool {
        matches!(
            self,
            Self::NotExisting
                | Self::Duplicate(_)
                | Self::ReferencedByBookings { .. }
                | Self::ReferencedByEvents { .. }
                | Self::InvalidInputData(_)
        )
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(error: diesel::result::Error) -> Self {
        use diesel::result::DatabaseErrorKind;
        match error {
            diesel::result::Error::NotFound => Self::NotExisting,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info) => {
                match info
                    .constraint_name()
                    .and_then(UniquenessRule::from_postgres_constraint)
                {
                    Some(rule) => Self::Duplicate(rule),
                    None => Self::InvalidInputData(info.message().to_owned()),
                }
            }
            diesel::result::Error::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
                Self::TransactionConflict
            }
            diesel::result::Error::DatabaseError(
                e @ DatabaseErrorKind::ForeignKeyViolation | e @ DatabaseErrorKind::CheckViolation,
                ref info,
            ) => Self::InvalidInputData(
                info.constraint_name()
                    .and_then(postgres::description_for_postgres_constraint)
                    .map(|d| d.to_owned())
                    .unwrap_or_else(|| format!("{:?}", e)),
            ),
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ClosedConnection, ref info) => {
                Self::ConnectionError(info.message().to_owned())
            }
            diesel::result::Error::DatabaseError(_, ref info)
                if postgres::is_timeout_message(info.message()) =>
            {
                Self::Timeout
            }
            diesel::result::Error::SerializationError(e) => Self::InvalidInputData(e.to_string()),
            diesel::result::Error::DeserializationError(e) => {
                Self::InvalidDataInDatabase(e.to_string())
            }
            _ => Self::QueryError(error),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(error: r2d2::Error) -> Self {
        Self::ConnectionError(error.to_string())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConnectionError(e) => write!(f, "Error connecting to database: {}", e),
            Self::Timeout => f.write_str("Database operation timed out."),
            Self::QueryError(e) => write!(f, "Error while executing database query: {}", e),
            Self::TransactionConflict => f.write_str("Database transaction could not be commited due to a conflicting concurrent transaction"),
            Self::NotExisting => f.write_str("Database record does not exist."),
            Self::Duplicate(rule) => rule.fmt(f),
            Self::ReferencedByBookings { dependency, bookings } => {
                write!(
                    f,
                    "Cannot delete {} because there are existing bookings linked to it",
                    dependency
                )?;
                if !bookings.is_empty() {
                    write!(
                        f,
                        " ({})",
                        bookings
                            .iter()
                            .map(|b| b.to_string())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )?;
                }
                f.write_str(". Delete or reassign these bookings first.")
            }
            Self::ReferencedByEvents { event_type_id, events } => write!(
                f,
                "Cannot delete event type {} because {} event(s) are of this type.",
                event_type_id,
                events.len()
            ),
            Self::InvalidInputData(e) => {
                write!(f, "Data to be stored in database is not valid: {}", e)
            }
            StoreError::InvalidDataInDatabase(e) => {
                write!(f, "Data queried from database could not be deserialized: {}", e)
            },
        }
    }
}

impl std::error::Error for StoreError {}
