use crate::data_store::integrity::{self, IntegrityLookup};
use crate::data_store::models::{
    Booking, BookingRecord, DataImport, Event, EventType, ImportSummary, NewEventType, Venue,
};
use crate::data_store::{
    BookingDependency, BookingId, BookingSearch, BookingStore, BookingStoreFacade, EventId,
    EventTypeId, StoreError, VenueId,
};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Mutex;

/**
 * A mock [BookingStore] implementation for testing.
 *
 * The simulated database consists of the [StoreMockData] structure with vectors of entities. These
 * can be directly modified by the tests. Each facade call holds the mutex for its whole duration,
 * which makes it behave like a serializable transaction.
 *
 * Mutations run the same integrity checks as the real database store. The
 * [StoreMockData.next_error] attribute can be set to simulate a database error.
 */
#[derive(Default)]
pub struct StoreMock {
    pub data: Mutex<StoreMockData>,
}

impl BookingStore for StoreMock {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn BookingStoreFacade + 'a>, StoreError> {
        Ok(Box::new(StoreMockFacade { store: self }))
    }
}

#[derive(Default)]
pub struct StoreMockData {
    pub event_types: Vec<EventType>,
    pub venues: Vec<Venue>,
    pub events: Vec<Event>,
    pub bookings: Vec<Booking>,
    /// If not none, the next call to a store facade method will return this error.
    pub next_error: Option<StoreError>,
}

impl StoreMockData {
    fn joined_records(&self) -> Vec<BookingRecord> {
        self.bookings
            .iter()
            .filter_map(|booking| {
                let event = self.events.iter().find(|e| e.id == booking.event_id)?;
                let venue = self.venues.iter().find(|v| v.id == booking.venue_id)?;
                let event_type = self
                    .event_types
                    .iter()
                    .find(|t| t.id == event.event_type_id);
                Some(BookingRecord::from_joined(booking, event, event_type, venue))
            })
            .collect()
    }
}

impl StoreMockData {
    fn next_event_type_id(&self) -> EventTypeId {
        self.event_types.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    /// Insert the imported entities one by one. Leaves a partial import behind on failure.
    fn insert_import(&mut self, import: DataImport) -> Result<ImportSummary, StoreError> {
        let mut summary = ImportSummary::default();
        let mut event_type_ids = BTreeMap::<EventTypeId, EventTypeId>::new();
        for (imported_id, event_type) in import.event_types {
            event_type.validate()?;
            let existing = self
                .event_types
                .iter()
                .filter(|t| t.name == event_type.name)
                .map(|t| t.id)
                .min();
            let stored_id = match existing {
                Some(existing_id) => {
                    summary.reused_event_types += 1;
                    existing_id
                }
                None => {
                    summary.created_event_types += 1;
                    let id = self.next_event_type_id();
                    self.event_types.push(EventType {
                        id,
                        name: event_type.name,
                        description: event_type.description,
                        is_active: event_type.is_active,
                        created_date: chrono::Utc::now(),
                    });
                    id
                }
            };
            event_type_ids.insert(imported_id, stored_id);
        }
        for venue in import.venues {
            if self.venue_exists(venue.id)? {
                return Err(StoreError::InvalidInputData(format!(
                    "A venue with the id {} already exists.",
                    venue.id
                )));
            }
            integrity::ensure_venue_writable(&mut *self, &venue, None)?;
            self.venues.push(venue);
            summary.venues += 1;
        }
        for mut event in import.events {
            if let Some(stored_id) = event_type_ids.get(&event.event_type_id) {
                event.event_type_id = *stored_id;
            }
            if self.event_exists(event.id)? {
                return Err(StoreError::InvalidInputData(format!(
                    "An event with the id {} already exists.",
                    event.id
                )));
            }
            integrity::ensure_event_writable(&mut *self, &event, None)?;
            self.events.push(event);
            summary.events += 1;
        }
        for booking in import.bookings {
            integrity::ensure_booking_writable(&mut *self, &booking, None)?;
            self.bookings.push(booking);
            summary.bookings += 1;
        }
        Ok(summary)
    }
}

impl IntegrityLookup for StoreMockData {
    fn venue_exists(&mut self, venue_id: VenueId) -> Result<bool, StoreError> {
        Ok(self.venues.iter().any(|v| v.id == venue_id))
    }

    fn event_exists(&mut self, event_id: EventId) -> Result<bool, StoreError> {
        Ok(self.events.iter().any(|e| e.id == event_id))
    }

    fn event_type_exists(&mut self, event_type_id: EventTypeId) -> Result<bool, StoreError> {
        Ok(self.event_types.iter().any(|t| t.id == event_type_id))
    }

    fn booking_exists(&mut self, booking_id: BookingId) -> Result<bool, StoreError> {
        Ok(self.bookings.iter().any(|b| b.id == booking_id))
    }

    fn venue_with_name_and_location_exists(
        &mut self,
        name: &str,
        location: &str,
        exclude_venue_id: Option<VenueId>,
    ) -> Result<bool, StoreError> {
        Ok(self.venues.iter().any(|v| {
            v.name == name && v.location == location && Some(v.id) != exclude_venue_id
        }))
    }

    fn event_with_name_and_date_exists(
        &mut self,
        name: &str,
        event_date: NaiveDate,
        exclude_event_id: Option<EventId>,
    ) -> Result<bool, StoreError> {
        Ok(self.events.iter().any(|e| {
            e.name == name && e.event_date == event_date && Some(e.id) != exclude_event_id
        }))
    }

    fn booking_with_key_exists(
        &mut self,
        venue_id: VenueId,
        event_id: EventId,
        booking_date: NaiveDate,
        exclude_booking_id: Option<BookingId>,
    ) -> Result<bool, StoreError> {
        Ok(self.bookings.iter().any(|b| {
            b.venue_id == venue_id
                && b.event_id == event_id
                && b.booking_date == booking_date
                && Some(b.id) != exclude_booking_id
        }))
    }

    fn dependent_bookings(
        &mut self,
        dependency: BookingDependency,
    ) -> Result<Vec<BookingId>, StoreError> {
        Ok(self
            .bookings
            .iter()
            .filter(|b| match dependency {
                BookingDependency::Venue(venue_id) => b.venue_id == venue_id,
                BookingDependency::Event(event_id) => b.event_id == event_id,
            })
            .map(|b| b.id)
            .collect())
    }

    fn dependent_events(&mut self, event_type_id: EventTypeId) -> Result<Vec<EventId>, StoreError> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.event_type_id == event_type_id)
            .map(|e| e.id)
            .collect())
    }
}

struct StoreMockFacade<'a> {
    store: &'a StoreMock,
}

impl<'a> StoreMockFacade<'a> {
    /// Lock the mock database for the duration of one facade call
    fn lock(&self) -> Result<std::sync::MutexGuard<'a, StoreMockData>, StoreError> {
        let mut data = self.store.data.lock().expect("Error while locking mutex.");
        if let Some(e) = data.next_error.take() {
            return Err(e);
        }
        Ok(data)
    }
}

impl<'a> BookingStoreFacade for StoreMockFacade<'a> {
    fn get_event_types(&mut self, only_active: bool) -> Result<Vec<EventType>, StoreError> {
        let data = self.lock()?;
        let mut result: Vec<EventType> = data
            .event_types
            .iter()
            .filter(|t| t.is_active || !only_active)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(result)
    }

    fn get_event_type(&mut self, event_type_id: EventTypeId) -> Result<EventType, StoreError> {
        let data = self.lock()?;
        data.event_types
            .iter()
            .find(|t| t.id == event_type_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_event_type(&mut self, event_type: NewEventType) -> Result<EventTypeId, StoreError> {
        let mut data = self.lock()?;
        event_type.validate()?;
        let id = data.next_event_type_id();
        data.event_types.push(EventType {
            id,
            name: event_type.name,
            description: event_type.description,
            is_active: event_type.is_active,
            created_date: chrono::Utc::now(),
        });
        Ok(id)
    }

    fn update_event_type(
        &mut self,
        event_type_id: EventTypeId,
        event_type: NewEventType,
    ) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        event_type.validate()?;
        let existing = data
            .event_types
            .iter_mut()
            .find(|t| t.id == event_type_id)
            .ok_or(StoreError::NotExisting)?;
        existing.name = event_type.name;
        existing.description = event_type.description;
        existing.is_active = event_type.is_active;
        Ok(())
    }

    fn set_event_type_active(
        &mut self,
        event_type_id: EventTypeId,
        is_active: bool,
    ) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        let existing = data
            .event_types
            .iter_mut()
            .find(|t| t.id == event_type_id)
            .ok_or(StoreError::NotExisting)?;
        existing.is_active = is_active;
        Ok(())
    }

    fn delete_event_type(&mut self, event_type_id: EventTypeId) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        if !data.event_type_exists(event_type_id)? {
            return Err(StoreError::NotExisting);
        }
        integrity::ensure_no_dependent_events(&mut *data, event_type_id)?;
        data.event_types.retain(|t| t.id != event_type_id);
        Ok(())
    }

    fn get_venues(&mut self) -> Result<Vec<Venue>, StoreError> {
        let data = self.lock()?;
        let mut result = data.venues.clone();
        result.sort_by(|a, b| (&a.name, &a.location).cmp(&(&b.name, &b.location)));
        Ok(result)
    }

    fn get_venue(&mut self, venue_id: VenueId) -> Result<Venue, StoreError> {
        let data = self.lock()?;
        data.venues
            .iter()
            .find(|v| v.id == venue_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_venue(&mut self, venue: Venue) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        if data.venue_exists(venue.id)? {
            return Err(StoreError::InvalidInputData(
                "A venue with the same id already exists.".to_owned(),
            ));
        }
        integrity::ensure_venue_writable(&mut *data, &venue, None)?;
        data.venues.push(venue);
        Ok(())
    }

    fn update_venue(&mut self, venue: Venue) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        if !data.venue_exists(venue.id)? {
            return Err(StoreError::NotExisting);
        }
        integrity::ensure_venue_writable(&mut *data, &venue, Some(venue.id))?;
        if let Some(existing) = data.venues.iter_mut().find(|v| v.id == venue.id) {
            *existing = venue;
        }
        Ok(())
    }

    fn delete_venue(&mut self, venue_id: VenueId) -> Result<Venue, StoreError> {
        let mut data = self.lock()?;
        let position = data
            .venues
            .iter()
            .position(|v| v.id == venue_id)
            .ok_or(StoreError::NotExisting)?;
        integrity::ensure_no_dependent_bookings(&mut *data, BookingDependency::Venue(venue_id))?;
        Ok(data.venues.remove(position))
    }

    fn get_events(&mut self) -> Result<Vec<Event>, StoreError> {
        let data = self.lock()?;
        let mut result = data.events.clone();
        result.sort_by(|a, b| (a.event_date, &a.name).cmp(&(b.event_date, &b.name)));
        Ok(result)
    }

    fn get_event(&mut self, event_id: EventId) -> Result<Event, StoreError> {
        let data = self.lock()?;
        data.events
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_event(&mut self, event: Event) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        if data.event_exists(event.id)? {
            return Err(StoreError::InvalidInputData(
                "An event with the same id already exists.".to_owned(),
            ));
        }
        integrity::ensure_event_writable(&mut *data, &event, None)?;
        data.events.push(event);
        Ok(())
    }

    fn update_event(&mut self, event: Event) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        if !data.event_exists(event.id)? {
            return Err(StoreError::NotExisting);
        }
        integrity::ensure_event_writable(&mut *data, &event, Some(event.id))?;
        if let Some(existing) = data.events.iter_mut().find(|e| e.id == event.id) {
            *existing = event;
        }
        Ok(())
    }

    fn delete_event(&mut self, event_id: EventId) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        if !data.event_exists(event_id)? {
            return Err(StoreError::NotExisting);
        }
        integrity::ensure_no_dependent_bookings(&mut *data, BookingDependency::Event(event_id))?;
        data.events.retain(|e| e.id != event_id);
        Ok(())
    }

    fn get_booking(&mut self, booking_id: BookingId) -> Result<Booking, StoreError> {
        let data = self.lock()?;
        data.bookings
            .iter()
            .find(|b| b.id == booking_id)
            .cloned()
            .ok_or(StoreError::NotExisting)
    }

    fn create_booking(&mut self, booking: Booking) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        integrity::ensure_booking_writable(&mut *data, &booking, None)?;
        data.bookings.push(booking);
        Ok(())
    }

    fn update_booking(&mut self, booking: Booking) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        if !data.booking_exists(booking.id)? {
            return Err(StoreError::NotExisting);
        }
        integrity::ensure_booking_writable(&mut *data, &booking, Some(booking.id))?;
        if let Some(existing) = data.bookings.iter_mut().find(|b| b.id == booking.id) {
            *existing = booking;
        }
        Ok(())
    }

    fn delete_booking(&mut self, booking_id: BookingId) -> Result<(), StoreError> {
        let mut data = self.lock()?;
        if !data.booking_exists(booking_id)? {
            return Err(StoreError::NotExisting);
        }
        data.bookings.retain(|b| b.id != booking_id);
        Ok(())
    }

    fn get_dependent_bookings(
        &mut self,
        dependency: BookingDependency,
    ) -> Result<Vec<BookingId>, StoreError> {
        let mut data = self.lock()?;
        data.dependent_bookings(dependency)
    }

    fn import_data(&mut self, import: DataImport) -> Result<ImportSummary, StoreError> {
        let mut data = self.lock()?;
        let event_types = data.event_types.clone();
        let venues = data.venues.clone();
        let events = data.events.clone();
        let bookings = data.bookings.clone();
        let result = data.insert_import(import);
        if result.is_err() {
            data.event_types = event_types;
            data.venues = venues;
            data.events = events;
            data.bookings = bookings;
        }
        result
    }

    fn search_bookings(&mut self, search: &BookingSearch) -> Result<Vec<BookingRecord>, StoreError> {
        let data = self.lock()?;
        Ok(search.apply(data.joined_records()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_store::{BookingSearchBuilder, UniquenessRule};
    use uuid::uuid;

    const VENUE_1: VenueId = uuid!("0197a0c1-0000-7000-8000-0000000000a1");
    const VENUE_2: VenueId = uuid!("0197a0c1-0000-7000-8000-0000000000a2");
    const EVENT_1: EventId = uuid!("0197a0c1-0000-7000-8000-0000000000e1");
    const EVENT_2: EventId = uuid!("0197a0c1-0000-7000-8000-0000000000e2");

    fn date(value: &str) -> NaiveDate {
        value.parse().unwrap()
    }

    fn booking(id: BookingId, venue_id: VenueId, event_id: EventId, booking_date: &str) -> Booking {
        Booking {
            id,
            venue_id,
            event_id,
            booking_date: date(booking_date),
        }
    }

    fn sample_store() -> StoreMock {
        let store = StoreMock::default();
        {
            let mut data = store.data.lock().unwrap();
            data.event_types.push(EventType {
                id: 1,
                name: "Concert".to_string(),
                description: Some("Live music".to_string()),
                is_active: true,
                created_date: Default::default(),
            });
            data.venues.push(Venue {
                id: VENUE_1,
                name: "Town Hall".to_string(),
                location: "Main Street 1".to_string(),
                capacity: 500,
                image_url: "/images/placeholder.png".to_string(),
            });
            data.venues.push(Venue {
                id: VENUE_2,
                name: "Open Air Park".to_string(),
                location: "Riverside".to_string(),
                capacity: 5000,
                image_url: "/images/placeholder.png".to_string(),
            });
            data.events.push(Event {
                id: EVENT_1,
                name: "Summer Gala".to_string(),
                event_date: date("2025-06-01"),
                description: "Annual gala".to_string(),
                event_type_id: 1,
            });
            data.events.push(Event {
                id: EVENT_2,
                name: "Jazz Night".to_string(),
                event_date: date("2025-07-15"),
                description: "Jazz on the lawn".to_string(),
                event_type_id: 1,
            });
        }
        store
    }

    #[test]
    fn test_duplicate_booking_is_rejected() {
        let store = sample_store();
        let mut facade = store.get_facade().unwrap();
        facade
            .create_booking(booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-06-01"))
            .unwrap();

        let result =
            facade.create_booking(booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-06-01"));
        match result {
            Err(e @ StoreError::Duplicate(UniquenessRule::BookingVenueEventAndDate)) => {
                assert!(e.is_domain_error());
                assert!(!e.is_transient());
            }
            other => panic!("Unexpected result: {:?}", other),
        }

        facade
            .create_booking(booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-06-02"))
            .unwrap();
        facade
            .create_booking(booking(uuid::Uuid::now_v7(), VENUE_2, EVENT_1, "2025-06-01"))
            .unwrap();
        assert_eq!(store.data.lock().unwrap().bookings.len(), 3);
    }

    #[test]
    fn test_update_booking_checks_duplicates_excluding_itself() {
        let store = sample_store();
        let mut facade = store.get_facade().unwrap();
        let first = booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-06-01");
        let second = booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-06-02");
        facade.create_booking(first.clone()).unwrap();
        facade.create_booking(second.clone()).unwrap();

        // Saving unchanged must not collide with the booking itself
        facade.update_booking(second.clone()).unwrap();

        let moved = Booking {
            booking_date: first.booking_date,
            ..second.clone()
        };
        assert!(matches!(
            facade.update_booking(moved),
            Err(StoreError::Duplicate(UniquenessRule::BookingVenueEventAndDate))
        ));
        assert_eq!(facade.get_booking(second.id).unwrap(), second);

        let unknown = booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-06-03");
        assert!(matches!(
            facade.update_booking(unknown),
            Err(StoreError::NotExisting)
        ));
    }

    #[test]
    fn test_delete_event_is_restricted_by_bookings() {
        let store = sample_store();
        let mut facade = store.get_facade().unwrap();
        let the_booking = booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-06-01");
        facade.create_booking(the_booking.clone()).unwrap();

        match facade.delete_event(EVENT_1) {
            Err(StoreError::ReferencedByBookings {
                dependency,
                bookings,
            }) => {
                assert_eq!(dependency, BookingDependency::Event(EVENT_1));
                assert_eq!(bookings, vec![the_booking.id]);
            }
            other => panic!("Unexpected result: {:?}", other),
        }
        assert!(facade.get_event(EVENT_1).is_ok());

        facade.delete_booking(the_booking.id).unwrap();
        facade.delete_event(EVENT_1).unwrap();
        assert!(matches!(
            facade.get_event(EVENT_1),
            Err(StoreError::NotExisting)
        ));
        assert!(matches!(
            facade.delete_event(EVENT_1),
            Err(StoreError::NotExisting)
        ));
    }

    #[test]
    fn test_delete_venue_is_restricted_by_bookings() {
        let store = sample_store();
        let mut facade = store.get_facade().unwrap();
        facade
            .create_booking(booking(uuid::Uuid::now_v7(), VENUE_2, EVENT_2, "2025-07-01"))
            .unwrap();

        assert!(matches!(
            facade.delete_venue(VENUE_2),
            Err(StoreError::ReferencedByBookings { .. })
        ));
        assert_eq!(
            facade
                .get_dependent_bookings(BookingDependency::Venue(VENUE_2))
                .unwrap()
                .len(),
            1
        );

        let deleted = facade.delete_venue(VENUE_1).unwrap();
        assert_eq!(deleted.name, "Town Hall");
        assert_eq!(facade.get_venues().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_event_type_is_restricted_by_events() {
        let store = sample_store();
        let mut facade = store.get_facade().unwrap();
        let unused = facade
            .create_event_type(NewEventType {
                name: "Workshop".to_string(),
                description: None,
                is_active: true,
            })
            .unwrap();
        assert_eq!(unused, 2);

        assert!(matches!(
            facade.delete_event_type(1),
            Err(StoreError::ReferencedByEvents { .. })
        ));
        facade.delete_event_type(unused).unwrap();

        facade.set_event_type_active(1, false).unwrap();
        assert!(facade.get_event_types(true).unwrap().is_empty());
        assert_eq!(facade.get_event_types(false).unwrap().len(), 1);
    }

    #[test]
    fn test_venue_and_event_uniqueness() {
        let store = sample_store();
        let mut facade = store.get_facade().unwrap();

        let mut venue = facade.get_venue(VENUE_2).unwrap();
        venue.id = uuid::Uuid::now_v7();
        assert!(matches!(
            facade.create_venue(venue.clone()),
            Err(StoreError::Duplicate(UniquenessRule::VenueNameAndLocation))
        ));
        venue.location = "Lakeside".to_string();
        facade.create_venue(venue).unwrap();

        let mut event = facade.get_event(EVENT_2).unwrap();
        event.event_date = date("2025-06-01");
        event.name = "Summer Gala".to_string();
        assert!(matches!(
            facade.update_event(event),
            Err(StoreError::Duplicate(UniquenessRule::EventNameAndDate))
        ));
    }

    #[test]
    fn test_search_bookings() {
        let store = sample_store();
        let mut facade = store.get_facade().unwrap();
        let older = booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-05-01");
        let newer = booking(uuid::Uuid::now_v7(), VENUE_2, EVENT_2, "2025-07-01");
        facade.create_booking(older.clone()).unwrap();
        facade.create_booking(newer.clone()).unwrap();

        let all = facade.search_bookings(&BookingSearch::default()).unwrap();
        assert_eq!(
            all.iter().map(|r| r.booking_id).collect::<Vec<_>>(),
            vec![newer.id, older.id]
        );
        assert_eq!(all[0].event_type_name, "Concert");
        assert_eq!(all[0].venue_capacity, 5000);

        let search = BookingSearchBuilder::new()
            .event_name_contains("Gala")
            .event_on_or_before(date("2025-06-01"))
            .build();
        let result = facade.search_bookings(&search).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].booking_id, older.id);
        assert_eq!(result[0].venue_name, "Town Hall");

        store.data.lock().unwrap().event_types.clear();
        let result = facade.search_bookings(&BookingSearch::default()).unwrap();
        assert!(result
            .iter()
            .all(|r| r.event_type_name == crate::data_store::models::UNKNOWN_EVENT_TYPE_NAME));
    }

    #[test]
    fn test_next_error_is_returned_once() {
        let store = sample_store();
        store.data.lock().unwrap().next_error = Some(StoreError::Timeout);
        let mut facade = store.get_facade().unwrap();

        let result = facade.create_booking(booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-06-01"));
        match result {
            Err(e) => assert!(e.is_transient()),
            Ok(_) => panic!("Expected simulated timeout"),
        }
        assert!(store.data.lock().unwrap().bookings.is_empty());

        facade
            .create_booking(booking(uuid::Uuid::now_v7(), VENUE_1, EVENT_1, "2025-06-01"))
            .unwrap();
    }

    #[test]
    fn test_failed_import_stores_nothing() {
        let store = sample_store();
        let mut facade = store.get_facade().unwrap();
        let venue_count = facade.get_venues().unwrap().len();
        let event_count = facade.get_events().unwrap().len();

        let new_venue = Venue {
            id: uuid!("0197a0c1-0000-7000-8000-0000000000a3"),
            name: "Harbour Stage".to_string(),
            location: "Pier 4".to_string(),
            capacity: 300,
            image_url: "/images/placeholder.png".to_string(),
        };
        let new_event = Event {
            id: uuid!("0197a0c1-0000-7000-8000-0000000000e3"),
            name: "Jazz Night".to_string(),
            event_date: date("2025-08-15"),
            description: "Late night jazz".to_string(),
            event_type_id: 42,
        };
        let import = DataImport {
            event_types: vec![(
                42,
                NewEventType {
                    name: "Festival".to_string(),
                    description: None,
                    is_active: true,
                },
            )],
            venues: vec![new_venue.clone()],
            events: vec![new_event.clone()],
            bookings: vec![booking(
                uuid!("0197a0c1-0000-7000-8000-0000000000b3"),
                new_venue.id,
                uuid!("0197a0c1-0000-7000-8000-0000000000ff"),
                "2025-08-15",
            )],
        };

        let result = facade.import_data(import.clone());
        assert!(matches!(result, Err(StoreError::InvalidInputData(_))));
        assert_eq!(facade.get_event_types(false).unwrap().len(), 1);
        assert_eq!(facade.get_venues().unwrap().len(), venue_count);
        assert_eq!(facade.get_events().unwrap().len(), event_count);
        assert!(facade.get_venue(new_venue.id).is_err());

        let mut fixed = import;
        fixed.bookings[0].event_id = new_event.id;
        let summary = facade.import_data(fixed).unwrap();
        assert_eq!(
            summary,
            ImportSummary {
                created_event_types: 1,
                reused_event_types: 0,
                venues: 1,
                events: 1,
                bookings: 1,
            }
        );
        let festival = facade.get_event(new_event.id).unwrap().event_type_id;
        assert_eq!(facade.get_event_type(festival).unwrap().name, "Festival");
    }

    #[test]
    fn test_import_reuses_event_types_by_name() {
        let store = sample_store();
        let mut facade = store.get_facade().unwrap();
        let import = DataImport {
            event_types: vec![(
                9,
                NewEventType {
                    name: "Concert".to_string(),
                    description: None,
                    is_active: true,
                },
            )],
            events: vec![Event {
                id: uuid!("0197a0c1-0000-7000-8000-0000000000e3"),
                name: "Brass Band".to_string(),
                event_date: date("2025-09-01"),
                description: "Open air brass".to_string(),
                event_type_id: 9,
            }],
            ..Default::default()
        };

        let summary = facade.import_data(import).unwrap();
        assert_eq!(summary.reused_event_types, 1);
        assert_eq!(summary.created_event_types, 0);
        assert_eq!(facade.get_event_types(false).unwrap().len(), 1);
        assert_eq!(
            facade
                .get_event(uuid!("0197a0c1-0000-7000-8000-0000000000e3"))
                .unwrap()
                .event_type_id,
            1
        );
    }
}
