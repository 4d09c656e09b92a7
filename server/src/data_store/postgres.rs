use super::integrity::{self, IntegrityLookup};
use super::{
    models, schema, BookingDependency, BookingId, BookingSearch, BookingStore,
    BookingStoreFacade, EventId, EventTypeId, StoreError, VenueId,
};
use chrono::NaiveDate;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, CustomizeConnection};
use diesel::result::DatabaseErrorKind;
use log::debug;
use std::collections::BTreeMap;
use std::time::Duration;

type PgPool = diesel::r2d2::Pool<ConnectionManager<PgConnection>>;
type PgPooledConnection = diesel::r2d2::PooledConnection<ConnectionManager<PgConnection>>;

#[derive(Clone)]
pub struct PgDataStore {
    pool: PgPool,
}

impl PgDataStore {
    /// Create a connection pool for the given database.
    ///
    /// `timeout` bounds every storage call: it is used as the timeout for checking out a pooled
    /// connection and as the `statement_timeout` of each connection.
    pub fn new(database_url: &str, timeout: Duration) -> Result<Self, StoreError> {
        let connection_manager = ConnectionManager::<PgConnection>::new(database_url);
        Ok(Self {
            pool: diesel::r2d2::Pool::builder()
                .test_on_check_out(true)
                .min_idle(Some(2))
                .connection_timeout(timeout)
                .connection_customizer(Box::new(StatementTimeout(timeout)))
                .build(connection_manager)?,
        })
    }
}

impl BookingStore for PgDataStore {
    fn get_facade<'a>(&'a self) -> Result<Box<dyn BookingStoreFacade + 'a>, StoreError> {
        Ok(Box::new(PgDataStoreFacade::with_pooled_connection(
            self.pool.get()?,
        )))
    }
}

/// Sets the `statement_timeout` of each new pooled connection
#[derive(Debug)]
struct StatementTimeout(Duration);

impl CustomizeConnection<PgConnection, diesel::r2d2::Error> for StatementTimeout {
    fn on_acquire(&self, connection: &mut PgConnection) -> Result<(), diesel::r2d2::Error> {
        diesel::sql_query(format!("SET statement_timeout = {}", self.0.as_millis()))
            .execute(connection)
            .map(|_| ())
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub struct PgDataStoreFacade {
    connection: PgPooledConnection,
}

impl PgDataStoreFacade {
    pub fn with_pooled_connection(connection: PgPooledConnection) -> Self {
        Self { connection }
    }
}

impl BookingStoreFacade for PgDataStoreFacade {
    fn get_event_types(&mut self, only_active: bool) -> Result<Vec<models::EventType>, StoreError> {
        use schema::event_types::dsl::*;

        let mut query = event_types
            .select(models::EventType::as_select())
            .order_by((name.asc(), id.asc()))
            .into_boxed();
        if only_active {
            query = query.filter(is_active.eq(true));
        }
        query
            .load::<models::EventType>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_event_type(
        &mut self,
        event_type_id: EventTypeId,
    ) -> Result<models::EventType, StoreError> {
        use schema::event_types::dsl::*;

        event_types
            .filter(id.eq(event_type_id))
            .select(models::EventType::as_select())
            .first::<models::EventType>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_event_type(
        &mut self,
        event_type: models::NewEventType,
    ) -> Result<EventTypeId, StoreError> {
        use schema::event_types::dsl::*;
        event_type.validate()?;

        Ok(diesel::insert_into(event_types)
            .values(&event_type)
            .returning(id)
            .get_result::<EventTypeId>(&mut self.connection)?)
    }

    fn update_event_type(
        &mut self,
        event_type_id: EventTypeId,
        event_type: models::NewEventType,
    ) -> Result<(), StoreError> {
        use schema::event_types::dsl::*;
        event_type.validate()?;

        let count = diesel::update(event_types)
            .filter(id.eq(event_type_id))
            .set(&event_type)
            .execute(&mut self.connection)?;
        if count == 1 {
            Ok(())
        } else {
            Err(StoreError::NotExisting)
        }
    }

    fn set_event_type_active(
        &mut self,
        event_type_id: EventTypeId,
        active: bool,
    ) -> Result<(), StoreError> {
        use schema::event_types::dsl::*;

        let count = diesel::update(event_types)
            .filter(id.eq(event_type_id))
            .set(is_active.eq(active))
            .execute(&mut self.connection)?;
        if count == 1 {
            Ok(())
        } else {
            Err(StoreError::NotExisting)
        }
    }

    fn delete_event_type(&mut self, event_type_id: EventTypeId) -> Result<(), StoreError> {
        use schema::event_types::dsl::*;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let mut lookup = PgLookup { connection };
                if !lookup.event_type_exists(event_type_id)? {
                    return Err(StoreError::NotExisting);
                }
                integrity::ensure_no_dependent_events(&mut lookup, event_type_id)?;

                diesel::delete(event_types)
                    .filter(id.eq(event_type_id))
                    .execute(lookup.connection)
                    .map_err(|e| {
                        restrict_violation(e, || StoreError::ReferencedByEvents {
                            event_type_id,
                            events: Vec::new(),
                        })
                    })?;
                Ok(())
            })
    }

    fn get_venues(&mut self) -> Result<Vec<models::Venue>, StoreError> {
        use schema::venues::dsl::*;

        venues
            .select(models::Venue::as_select())
            .order_by((name.asc(), location.asc()))
            .load::<models::Venue>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_venue(&mut self, venue_id: VenueId) -> Result<models::Venue, StoreError> {
        use schema::venues::dsl::*;

        venues
            .filter(id.eq(venue_id))
            .select(models::Venue::as_select())
            .first::<models::Venue>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_venue(&mut self, venue: models::Venue) -> Result<(), StoreError> {
        use schema::venues::dsl::*;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let mut lookup = PgLookup { connection };
                if lookup.venue_exists(venue.id)? {
                    return Err(StoreError::InvalidInputData(
                        "A venue with the same id already exists.".to_owned(),
                    ));
                }
                integrity::ensure_venue_writable(&mut lookup, &venue, None)?;

                diesel::insert_into(venues)
                    .values(&venue)
                    .execute(lookup.connection)?;
                Ok(())
            })
    }

    fn update_venue(&mut self, venue: models::Venue) -> Result<(), StoreError> {
        use schema::venues::dsl::*;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let mut lookup = PgLookup { connection };
                integrity::ensure_venue_writable(&mut lookup, &venue, Some(venue.id))?;

                let count = diesel::update(venues)
                    .filter(id.eq(venue.id))
                    .set(&venue)
                    .execute(lookup.connection)?;
                if count == 0 {
                    return Err(StoreError::NotExisting);
                }
                Ok(())
            })
    }

    fn delete_venue(&mut self, venue_id: VenueId) -> Result<models::Venue, StoreError> {
        use schema::venues::dsl::*;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let venue = venues
                    .filter(id.eq(venue_id))
                    .select(models::Venue::as_select())
                    .first::<models::Venue>(connection)?;
                let dependency = BookingDependency::Venue(venue_id);
                let mut lookup = PgLookup { connection };
                integrity::ensure_no_dependent_bookings(&mut lookup, dependency)?;

                diesel::delete(venues)
                    .filter(id.eq(venue_id))
                    .execute(lookup.connection)
                    .map_err(|e| {
                        restrict_violation(e, || StoreError::ReferencedByBookings {
                            dependency,
                            bookings: Vec::new(),
                        })
                    })?;
                Ok(venue)
            })
    }

    fn get_events(&mut self) -> Result<Vec<models::Event>, StoreError> {
        use schema::events::dsl::*;

        events
            .select(models::Event::as_select())
            .order_by((event_date.asc(), name.asc()))
            .load::<models::Event>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn get_event(&mut self, event_id: EventId) -> Result<models::Event, StoreError> {
        use schema::events::dsl::*;

        events
            .filter(id.eq(event_id))
            .select(models::Event::as_select())
            .first::<models::Event>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_event(&mut self, event: models::Event) -> Result<(), StoreError> {
        use schema::events::dsl::*;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let mut lookup = PgLookup { connection };
                if lookup.event_exists(event.id)? {
                    return Err(StoreError::InvalidInputData(
                        "An event with the same id already exists.".to_owned(),
                    ));
                }
                integrity::ensure_event_writable(&mut lookup, &event, None)?;

                diesel::insert_into(events)
                    .values(&event)
                    .execute(lookup.connection)?;
                Ok(())
            })
    }

    fn update_event(&mut self, event: models::Event) -> Result<(), StoreError> {
        use schema::events::dsl::*;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let mut lookup = PgLookup { connection };
                if !lookup.event_exists(event.id)? {
                    return Err(StoreError::NotExisting);
                }
                integrity::ensure_event_writable(&mut lookup, &event, Some(event.id))?;

                diesel::update(events)
                    .filter(id.eq(event.id))
                    .set(&event)
                    .execute(lookup.connection)?;
                Ok(())
            })
    }

    fn delete_event(&mut self, event_id: EventId) -> Result<(), StoreError> {
        use schema::events::dsl::*;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let mut lookup = PgLookup { connection };
                if !lookup.event_exists(event_id)? {
                    return Err(StoreError::NotExisting);
                }
                let dependency = BookingDependency::Event(event_id);
                integrity::ensure_no_dependent_bookings(&mut lookup, dependency)?;

                diesel::delete(events)
                    .filter(id.eq(event_id))
                    .execute(lookup.connection)
                    .map_err(|e| {
                        restrict_violation(e, || StoreError::ReferencedByBookings {
                            dependency,
                            bookings: Vec::new(),
                        })
                    })?;
                Ok(())
            })
    }

    fn get_booking(&mut self, booking_id: BookingId) -> Result<models::Booking, StoreError> {
        use schema::bookings::dsl::*;

        bookings
            .filter(id.eq(booking_id))
            .select(models::Booking::as_select())
            .first::<models::Booking>(&mut self.connection)
            .map_err(|e| e.into())
    }

    fn create_booking(&mut self, booking: models::Booking) -> Result<(), StoreError> {
        use schema::bookings::dsl::*;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let mut lookup = PgLookup { connection };
                integrity::ensure_booking_writable(&mut lookup, &booking, None)?;

                diesel::insert_into(bookings)
                    .values(&booking)
                    .execute(lookup.connection)?;
                Ok(())
            })
    }

    fn update_booking(&mut self, booking: models::Booking) -> Result<(), StoreError> {
        use schema::bookings::dsl::*;

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let mut lookup = PgLookup { connection };
                if !lookup.booking_exists(booking.id)? {
                    return Err(StoreError::NotExisting);
                }
                integrity::ensure_booking_writable(&mut lookup, &booking, Some(booking.id))?;

                diesel::update(bookings)
                    .filter(id.eq(booking.id))
                    .set(&booking)
                    .execute(lookup.connection)?;
                Ok(())
            })
    }

    fn delete_booking(&mut self, booking_id: BookingId) -> Result<(), StoreError> {
        use schema::bookings::dsl::*;

        let count = diesel::delete(bookings)
            .filter(id.eq(booking_id))
            .execute(&mut self.connection)?;
        if count == 0 {
            return Err(StoreError::NotExisting);
        }
        Ok(())
    }

    fn get_dependent_bookings(
        &mut self,
        dependency: BookingDependency,
    ) -> Result<Vec<BookingId>, StoreError> {
        PgLookup {
            connection: &mut self.connection,
        }
        .dependent_bookings(dependency)
    }

    fn import_data(
        &mut self,
        data: models::DataImport,
    ) -> Result<models::ImportSummary, StoreError> {
        use schema::{bookings, event_types, events, venues};

        self.connection
            .build_transaction()
            .serializable()
            .run(|connection| {
                let mut summary = models::ImportSummary::default();
                let mut event_type_ids = BTreeMap::<EventTypeId, EventTypeId>::new();
                for (imported_id, event_type) in data.event_types {
                    event_type.validate()?;
                    let existing = event_types::table
                        .filter(event_types::name.eq(&event_type.name))
                        .select(event_types::id)
                        .order_by(event_types::id.asc())
                        .first::<EventTypeId>(connection)
                        .optional()?;
                    let stored_id = match existing {
                        Some(existing_id) => {
                            summary.reused_event_types += 1;
                            existing_id
                        }
                        None => {
                            summary.created_event_types += 1;
                            diesel::insert_into(event_types::table)
                                .values(&event_type)
                                .returning(event_types::id)
                                .get_result::<EventTypeId>(connection)?
                        }
                    };
                    event_type_ids.insert(imported_id, stored_id);
                }

                let mut lookup = PgLookup { connection };
                for venue in data.venues {
                    if lookup.venue_exists(venue.id)? {
                        return Err(StoreError::InvalidInputData(format!(
                            "A venue with the id {} already exists.",
                            venue.id
                        )));
                    }
                    integrity::ensure_venue_writable(&mut lookup, &venue, None)?;
                    diesel::insert_into(venues::table)
                        .values(&venue)
                        .execute(lookup.connection)?;
                    summary.venues += 1;
                }
                for mut event in data.events {
                    if let Some(stored_id) = event_type_ids.get(&event.event_type_id) {
                        event.event_type_id = *stored_id;
                    }
                    if lookup.event_exists(event.id)? {
                        return Err(StoreError::InvalidInputData(format!(
                            "An event with the id {} already exists.",
                            event.id
                        )));
                    }
                    integrity::ensure_event_writable(&mut lookup, &event, None)?;
                    diesel::insert_into(events::table)
                        .values(&event)
                        .execute(lookup.connection)?;
                    summary.events += 1;
                }
                for booking in data.bookings {
                    integrity::ensure_booking_writable(&mut lookup, &booking, None)?;
                    diesel::insert_into(bookings::table)
                        .values(&booking)
                        .execute(lookup.connection)?;
                    summary.bookings += 1;
                }
                Ok(summary)
            })
    }

    fn search_bookings(
        &mut self,
        search: &BookingSearch,
    ) -> Result<Vec<models::BookingRecord>, StoreError> {
        use schema::{bookings, event_types, events, venues};

        let mut query = bookings::table
            .inner_join(venues::table)
            .inner_join(events::table.left_join(event_types::table))
            .select((
                bookings::id,
                events::name,
                event_types::name.nullable(),
                events::event_type_id,
                venues::name,
                events::event_date,
                bookings::booking_date,
                venues::location,
                venues::capacity,
            ))
            .into_boxed();
        if let Some(booking_id) = search.booking_id {
            query = query.filter(bookings::id.eq(booking_id));
        }
        if let Some(pattern) = &search.event_name {
            query = query.filter(events::name.like(contains_pattern(pattern)));
        }
        if let Some(event_type_id) = search.event_type_id {
            query = query.filter(events::event_type_id.eq(event_type_id));
        }
        if let Some(pattern) = &search.venue_name {
            query = query.filter(venues::name.like(contains_pattern(pattern)));
        }
        if let Some(start_date) = search.start_date {
            query = query.filter(events::event_date.ge(start_date));
        }
        if let Some(end_date) = search.end_date {
            query = query.filter(events::event_date.le(end_date));
        }

        let rows = query
            .order_by((bookings::booking_date.desc(), bookings::id.asc()))
            .load::<SearchRow>(&mut self.connection)?;
        debug!("Booking search {:?} matched {} record(s)", search, rows.len());

        Ok(rows
            .into_iter()
            .map(
                |(
                    booking_id,
                    event_name,
                    event_type_name,
                    event_type_id,
                    venue_name,
                    event_date,
                    booking_date,
                    venue_location,
                    venue_capacity,
                )| models::BookingRecord {
                    booking_id,
                    event_name,
                    event_type_name: event_type_name
                        .unwrap_or_else(|| models::UNKNOWN_EVENT_TYPE_NAME.to_owned()),
                    event_type_id,
                    venue_name,
                    event_date,
                    booking_date,
                    venue_location,
                    venue_capacity,
                },
            )
            .collect())
    }
}

type SearchRow = (
    BookingId,
    String,
    Option<String>,
    EventTypeId,
    String,
    NaiveDate,
    NaiveDate,
    String,
    i32,
);

/// [IntegrityLookup] implementation, running the existence queries on the connection of the
/// current transaction
struct PgLookup<'c> {
    connection: &'c mut PgConnection,
}

impl IntegrityLookup for PgLookup<'_> {
    fn venue_exists(&mut self, venue_id: VenueId) -> Result<bool, StoreError> {
        use schema::venues::dsl::*;
        Ok(diesel::select(diesel::dsl::exists(venues.filter(id.eq(venue_id))))
            .get_result::<bool>(self.connection)?)
    }

    fn event_exists(&mut self, event_id: EventId) -> Result<bool, StoreError> {
        use schema::events::dsl::*;
        Ok(diesel::select(diesel::dsl::exists(events.filter(id.eq(event_id))))
            .get_result::<bool>(self.connection)?)
    }

    fn event_type_exists(&mut self, event_type_id: EventTypeId) -> Result<bool, StoreError> {
        use schema::event_types::dsl::*;
        Ok(
            diesel::select(diesel::dsl::exists(event_types.filter(id.eq(event_type_id))))
                .get_result::<bool>(self.connection)?,
        )
    }

    fn booking_exists(&mut self, booking_id: BookingId) -> Result<bool, StoreError> {
        use schema::bookings::dsl::*;
        Ok(diesel::select(diesel::dsl::exists(bookings.filter(id.eq(booking_id))))
            .get_result::<bool>(self.connection)?)
    }

    fn venue_with_name_and_location_exists(
        &mut self,
        venue_name: &str,
        venue_location: &str,
        exclude_venue_id: Option<VenueId>,
    ) -> Result<bool, StoreError> {
        use schema::venues::dsl::*;

        let mut query = venues
            .select(id)
            .filter(name.eq(venue_name))
            .filter(location.eq(venue_location))
            .into_boxed();
        if let Some(exclude) = exclude_venue_id {
            query = query.filter(id.ne(exclude));
        }
        Ok(query
            .first::<VenueId>(self.connection)
            .optional()?
            .is_some())
    }

    fn event_with_name_and_date_exists(
        &mut self,
        event_name: &str,
        date: NaiveDate,
        exclude_event_id: Option<EventId>,
    ) -> Result<bool, StoreError> {
        use schema::events::dsl::*;

        let mut query = events
            .select(id)
            .filter(name.eq(event_name))
            .filter(event_date.eq(date))
            .into_boxed();
        if let Some(exclude) = exclude_event_id {
            query = query.filter(id.ne(exclude));
        }
        Ok(query
            .first::<EventId>(self.connection)
            .optional()?
            .is_some())
    }

    fn booking_with_key_exists(
        &mut self,
        the_venue_id: VenueId,
        the_event_id: EventId,
        the_booking_date: NaiveDate,
        exclude_booking_id: Option<BookingId>,
    ) -> Result<bool, StoreError> {
        use schema::bookings::dsl::*;

        let mut query = bookings
            .select(id)
            .filter(venue_id.eq(the_venue_id))
            .filter(event_id.eq(the_event_id))
            .filter(booking_date.eq(the_booking_date))
            .into_boxed();
        if let Some(exclude) = exclude_booking_id {
            query = query.filter(id.ne(exclude));
        }
        Ok(query
            .first::<BookingId>(self.connection)
            .optional()?
            .is_some())
    }

    fn dependent_bookings(
        &mut self,
        dependency: BookingDependency,
    ) -> Result<Vec<BookingId>, StoreError> {
        use schema::bookings::dsl::*;

        let query = bookings.select(id).order_by(id.asc()).into_boxed();
        let query = match dependency {
            BookingDependency::Venue(the_venue_id) => query.filter(venue_id.eq(the_venue_id)),
            BookingDependency::Event(the_event_id) => query.filter(event_id.eq(the_event_id)),
        };
        Ok(query.load::<BookingId>(self.connection)?)
    }

    fn dependent_events(&mut self, the_event_type_id: EventTypeId) -> Result<Vec<EventId>, StoreError> {
        use schema::events::dsl::*;

        Ok(events
            .select(id)
            .filter(event_type_id.eq(the_event_type_id))
            .order_by(id.asc())
            .load::<EventId>(self.connection)?)
    }
}

/// Map a foreign key violation on deletion, which means that a concurrent transaction added a
/// dependent row, to the respective domain error.
fn restrict_violation(
    error: diesel::result::Error,
    on_violation: impl FnOnce() -> StoreError,
) -> StoreError {
    match error {
        diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            on_violation()
        }
        e => e.into(),
    }
}

/// Build a LIKE pattern matching all strings containing `value` literally
fn contains_pattern(value: &str) -> String {
    let mut result = String::with_capacity(value.len() + 2);
    result.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            result.push('\\');
        }
        result.push(c);
    }
    result.push('%');
    result
}

/// Check if a Postgres error message reports the cancellation of a statement by
/// `statement_timeout` or `lock_timeout`.
pub fn is_timeout_message(message: &str) -> bool {
    message.starts_with("canceling statement due to")
        && (message.contains("statement timeout") || message.contains("lock timeout"))
}

/// Get a human-readable description of the consistency expectation that is checked by a specific
/// constraint in our Postgres database schema by the constraint's name.
///
/// Returns None, when no human-readable description is present of the given constraint name. This
/// may be the case when we don't expect this constraint to be violated by a user interaction.
pub fn description_for_postgres_constraint(constraint_name: &str) -> Option<&'static str> {
    match constraint_name {
        "venues_capacity_range" => Some("Venue's capacity must be between 1 and 100000."),
        "events_event_type_id_fkey" => Some("Event's event type must reference an existing event type."),
        "bookings_venue_id_fkey" => Some("Booking's venue must reference an existing venue."),
        "bookings_event_id_fkey" => Some("Booking's event must reference an existing event."),
        _ => None,
    }
}
