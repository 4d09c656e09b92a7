//! Composition of booking searches from a sparse set of optional criteria
//!
//! Each present criterion of a [BookingSearch] contributes one predicate; the predicates are
//! combined by logical AND. Absent criteria contribute nothing, so an empty search matches every
//! booking. Store implementations either evaluate [BookingSearch::matches] on the joined records
//! or translate the same criteria into their query language.

use super::models::BookingRecord;
use super::{BookingId, EventTypeId};
use chrono::NaiveDate;

/// Filter options for searching bookings via BookingStoreFacade::search_bookings()
///
/// Can be constructed through the BookingSearchBuilder
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingSearch {
    /// Filter for the booking with exactly this id
    pub booking_id: Option<BookingId>,
    /// Filter for bookings whose event name contains this string (case-sensitive)
    pub event_name: Option<String>,
    /// Filter for bookings whose event is of this event type
    pub event_type_id: Option<EventTypeId>,
    /// Filter for bookings whose venue name contains this string (case-sensitive)
    pub venue_name: Option<String>,
    /// Filter for bookings whose event takes place on or after this date
    pub start_date: Option<NaiveDate>,
    /// Filter for bookings whose event takes place on or before this date
    pub end_date: Option<NaiveDate>,
}

type RecordPredicate<'a> = Box<dyn Fn(&BookingRecord) -> bool + 'a>;

impl BookingSearch {
    /// Check if no criterion is present, i.e. the search matches every booking
    pub fn is_empty(&self) -> bool {
        self.booking_id.is_none()
            && self.event_name.is_none()
            && self.event_type_id.is_none()
            && self.venue_name.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }

    /// Build one predicate per present criterion
    pub fn predicates(&self) -> Vec<RecordPredicate<'_>> {
        let mut predicates: Vec<RecordPredicate<'_>> = Vec::new();
        if let Some(booking_id) = self.booking_id {
            predicates.push(Box::new(move |r: &BookingRecord| r.booking_id == booking_id));
        }
        if let Some(event_name) = self.event_name.as_deref() {
            predicates.push(Box::new(move |r: &BookingRecord| r.event_name.contains(event_name)));
        }
        if let Some(event_type_id) = self.event_type_id {
            predicates.push(Box::new(move |r: &BookingRecord| r.event_type_id == event_type_id));
        }
        if let Some(venue_name) = self.venue_name.as_deref() {
            predicates.push(Box::new(move |r: &BookingRecord| r.venue_name.contains(venue_name)));
        }
        if let Some(start_date) = self.start_date {
            predicates.push(Box::new(move |r: &BookingRecord| r.event_date >= start_date));
        }
        if let Some(end_date) = self.end_date {
            predicates.push(Box::new(move |r: &BookingRecord| r.event_date <= end_date));
        }
        predicates
    }

    /// Checks if a given booking record matches all criteria of the search
    ///
    /// Usually, filtering should be done by the database. This function can be used for separate
    /// checks of individual records in software.
    pub fn matches(&self, record: &BookingRecord) -> bool {
        self.predicates()
            .iter()
            .fold(true, |acc, predicate| acc && predicate(record))
    }

    /// Filter the given records and return the matching ones in search result order
    pub fn apply<I: IntoIterator<Item = BookingRecord>>(&self, records: I) -> Vec<BookingRecord> {
        let predicates = self.predicates();
        let mut result: Vec<BookingRecord> = records
            .into_iter()
            .filter(|r| predicates.iter().all(|p| p(r)))
            .collect();
        sort_search_results(&mut result);
        result
    }
}

/// Sort booking records in search result order: newest booking date first, ties ordered by
/// booking id.
pub fn sort_search_results(records: &mut [BookingRecord]) {
    records.sort_by(|a, b| {
        b.booking_date
            .cmp(&a.booking_date)
            .then_with(|| a.booking_id.cmp(&b.booking_id))
    });
}

/// Builder for constructing BookingSearch objects
///
/// Empty inputs, as they come from unselected form fields, don't add a criterion: name patterns
/// consisting only of whitespace and the nil booking id are ignored.
pub struct BookingSearchBuilder {
    result: BookingSearch,
}

impl BookingSearchBuilder {
    pub fn new() -> Self {
        Self {
            result: BookingSearch::default(),
        }
    }

    /// Add filter to only include the booking with the given id
    pub fn booking_id(&mut self, booking_id: BookingId) -> &mut Self {
        if !booking_id.is_nil() {
            self.result.booking_id = Some(booking_id);
        }
        self
    }

    /// Add filter to only include bookings whose event name contains the given string
    pub fn event_name_contains(&mut self, pattern: &str) -> &mut Self {
        if !pattern.trim().is_empty() {
            self.result.event_name = Some(pattern.to_owned());
        }
        self
    }

    /// Add filter to only include bookings of events with the given event type
    pub fn event_type(&mut self, event_type_id: EventTypeId) -> &mut Self {
        self.result.event_type_id = Some(event_type_id);
        self
    }

    /// Add filter to only include bookings whose venue name contains the given string
    pub fn venue_name_contains(&mut self, pattern: &str) -> &mut Self {
        if !pattern.trim().is_empty() {
            self.result.venue_name = Some(pattern.to_owned());
        }
        self
    }

    /// Add filter to only include bookings of events taking place on or after the given date
    pub fn event_on_or_after(&mut self, start_date: NaiveDate) -> &mut Self {
        self.result.start_date = Some(start_date);
        self
    }

    /// Add filter to only include bookings of events taking place on or before the given date
    pub fn event_on_or_before(&mut self, end_date: NaiveDate) -> &mut Self {
        self.result.end_date = Some(end_date);
        self
    }

    /// Create the BookingSearch object
    pub fn build(&self) -> BookingSearch {
        self.result.clone()
    }
}

impl Default for BookingSearchBuilder {
    fn default() -> Self {
        Self::new()
    }
}
