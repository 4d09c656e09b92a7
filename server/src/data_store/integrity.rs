//! Integrity rules of the Venue/Event/Booking graph, which are not (only) enforced by the storage
//! engine itself:
//!
//! - no two venues with the same (name, location)
//! - no two events with the same (name, date)
//! - no two bookings with the same (venue, event, booking date)
//! - bookings reference existing venues and events; events reference existing event types
//! - venues and events can not be deleted while bookings reference them ("restrict" semantics),
//!   event types can not be deleted while events reference them
//!
//! The checks are formulated against the [IntegrityLookup] trait, so every [BookingStore]
//! implementation can run them on its own connection, within the transaction of the subsequent
//! write.
//!
//! [BookingStore]: super::BookingStore

use super::models::{Booking, Event, Venue};
use super::{
    BookingDependency, BookingId, EventId, EventTypeId, StoreError, UniquenessRule, VenueId,
};
use chrono::NaiveDate;
use log::{debug, warn};

/// Existence queries over the current store state, as required for the integrity checks.
///
/// All `exclude_*` parameters name the record that is currently being edited, which must not
/// count as its own duplicate.
pub trait IntegrityLookup {
    fn venue_exists(&mut self, venue_id: VenueId) -> Result<bool, StoreError>;
    fn event_exists(&mut self, event_id: EventId) -> Result<bool, StoreError>;
    fn event_type_exists(&mut self, event_type_id: EventTypeId) -> Result<bool, StoreError>;
    fn booking_exists(&mut self, booking_id: BookingId) -> Result<bool, StoreError>;

    fn venue_with_name_and_location_exists(
        &mut self,
        name: &str,
        location: &str,
        exclude_venue_id: Option<VenueId>,
    ) -> Result<bool, StoreError>;
    fn event_with_name_and_date_exists(
        &mut self,
        name: &str,
        event_date: NaiveDate,
        exclude_event_id: Option<EventId>,
    ) -> Result<bool, StoreError>;
    fn booking_with_key_exists(
        &mut self,
        venue_id: VenueId,
        event_id: EventId,
        booking_date: NaiveDate,
        exclude_booking_id: Option<BookingId>,
    ) -> Result<bool, StoreError>;

    fn dependent_bookings(
        &mut self,
        dependency: BookingDependency,
    ) -> Result<Vec<BookingId>, StoreError>;
    fn dependent_events(&mut self, event_type_id: EventTypeId) -> Result<Vec<EventId>, StoreError>;
}

/// Check if another booking for the same venue and event exists on the given date
pub fn check_booking_duplicate<L: IntegrityLookup + ?Sized>(
    lookup: &mut L,
    venue_id: VenueId,
    event_id: EventId,
    booking_date: NaiveDate,
    exclude_booking_id: Option<BookingId>,
) -> Result<bool, StoreError> {
    lookup.booking_with_key_exists(venue_id, event_id, booking_date, exclude_booking_id)
}

/// Check if another event with the same name takes place on the given date
pub fn check_event_duplicate<L: IntegrityLookup + ?Sized>(
    lookup: &mut L,
    name: &str,
    event_date: NaiveDate,
    exclude_event_id: Option<EventId>,
) -> Result<bool, StoreError> {
    lookup.event_with_name_and_date_exists(name, event_date, exclude_event_id)
}

/// Check if another venue with the same name exists at the given location
pub fn check_venue_duplicate<L: IntegrityLookup + ?Sized>(
    lookup: &mut L,
    name: &str,
    location: &str,
    exclude_venue_id: Option<VenueId>,
) -> Result<bool, StoreError> {
    lookup.venue_with_name_and_location_exists(name, location, exclude_venue_id)
}

/// Check if any booking references the given venue or event
pub fn has_dependent_bookings<L: IntegrityLookup + ?Sized>(
    lookup: &mut L,
    dependency: BookingDependency,
) -> Result<bool, StoreError> {
    Ok(!lookup.dependent_bookings(dependency)?.is_empty())
}

/// Ensure that the venue may be written: no other venue with the same name and location.
///
/// `existing_venue_id` is `None` for new venues and the venue's own id for updates.
pub fn ensure_venue_writable<L: IntegrityLookup + ?Sized>(
    lookup: &mut L,
    venue: &Venue,
    existing_venue_id: Option<VenueId>,
) -> Result<(), StoreError> {
    venue.validate()?;
    if check_venue_duplicate(lookup, &venue.name, &venue.location, existing_venue_id)? {
        return Err(rejected(UniquenessRule::VenueNameAndLocation));
    }
    Ok(())
}

/// Ensure that the event may be written: its event type exists and there is no other event with
/// the same name on the same date.
pub fn ensure_event_writable<L: IntegrityLookup + ?Sized>(
    lookup: &mut L,
    event: &Event,
    existing_event_id: Option<EventId>,
) -> Result<(), StoreError> {
    event.validate()?;
    if !lookup.event_type_exists(event.event_type_id)? {
        return Err(StoreError::InvalidInputData(
            "Event's event type must reference an existing event type.".to_owned(),
        ));
    }
    if check_event_duplicate(lookup, &event.name, event.event_date, existing_event_id)? {
        return Err(rejected(UniquenessRule::EventNameAndDate));
    }
    Ok(())
}

/// Ensure that the booking may be written: its venue and event exist, and there is no other
/// booking for the same venue and event on the same date. For new bookings
/// (`existing_booking_id` is `None`), the booking id must not be taken.
pub fn ensure_booking_writable<L: IntegrityLookup + ?Sized>(
    lookup: &mut L,
    booking: &Booking,
    existing_booking_id: Option<BookingId>,
) -> Result<(), StoreError> {
    if existing_booking_id.is_none() && lookup.booking_exists(booking.id)? {
        return Err(rejected(UniquenessRule::BookingId));
    }
    if !lookup.venue_exists(booking.venue_id)? {
        return Err(StoreError::InvalidInputData(
            "Booking's venue must reference an existing venue.".to_owned(),
        ));
    }
    if !lookup.event_exists(booking.event_id)? {
        return Err(StoreError::InvalidInputData(
            "Booking's event must reference an existing event.".to_owned(),
        ));
    }
    if check_booking_duplicate(
        lookup,
        booking.venue_id,
        booking.event_id,
        booking.booking_date,
        existing_booking_id,
    )? {
        return Err(rejected(UniquenessRule::BookingVenueEventAndDate));
    }
    Ok(())
}

/// Ensure that the venue or event may be deleted, i.e. no booking references it.
///
/// On violation, the returned [StoreError::ReferencedByBookings] lists the dependent bookings.
pub fn ensure_no_dependent_bookings<L: IntegrityLookup + ?Sized>(
    lookup: &mut L,
    dependency: BookingDependency,
) -> Result<(), StoreError> {
    let bookings = lookup.dependent_bookings(dependency)?;
    if !bookings.is_empty() {
        warn!(
            "Refusing to delete {}: {} dependent booking(s)",
            dependency,
            bookings.len()
        );
        return Err(StoreError::ReferencedByBookings {
            dependency,
            bookings,
        });
    }
    Ok(())
}

/// Ensure that the event type may be deleted, i.e. no event references it.
pub fn ensure_no_dependent_events<L: IntegrityLookup + ?Sized>(
    lookup: &mut L,
    event_type_id: EventTypeId,
) -> Result<(), StoreError> {
    let events = lookup.dependent_events(event_type_id)?;
    if !events.is_empty() {
        warn!(
            "Refusing to delete event type {}: {} dependent event(s)",
            event_type_id,
            events.len()
        );
        return Err(StoreError::ReferencedByEvents {
            event_type_id,
            events,
        });
    }
    Ok(())
}

fn rejected(rule: UniquenessRule) -> StoreError {
    debug!("Write rejected by uniqueness rule {:?}", rule);
    StoreError::Duplicate(rule)
}
