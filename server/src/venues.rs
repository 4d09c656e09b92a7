//! Venue create/update/delete, coordinating the venue records with their uploaded images
//!
//! Image files and database rows can not be changed atomically. The workflows order their steps
//! such that a failure leaves at worst an unreferenced image file behind, never a venue
//! referencing a missing image:
//!
//! - new images are stored before the venue row is written, and removed again (best effort) if
//!   the write fails
//! - replaced or deleted images are removed only after the venue row has been committed, and
//!   only if no other venue refers to the same image
//!
//! An empty upload is treated like no upload at all.
//!
//! Leftovers can be removed with [cleanup_orphaned_images].

use crate::data_store::models::Venue;
use crate::data_store::{BookingStoreFacade, StoreError, VenueId};
use crate::images::{BlobStorage, ImageError, ImageManager, ImageUpload};
use log::{info, warn};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum VenueError {
    Store(StoreError),
    Image(ImageError),
}

impl From<StoreError> for VenueError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ImageError> for VenueError {
    fn from(value: ImageError) -> Self {
        Self::Image(value)
    }
}

impl Display for VenueError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => e.fmt(f),
            Self::Image(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for VenueError {}

/// Create a venue, optionally with a newly uploaded image.
///
/// With an upload, the venue's `image_url` is replaced by the stored image's path. Returns the
/// venue as it has been stored.
pub fn create_venue<S: BlobStorage>(
    store: &mut dyn BookingStoreFacade,
    images: &ImageManager<S>,
    mut venue: Venue,
    upload: Option<&ImageUpload>,
) -> Result<Venue, VenueError> {
    let stored_image = match upload.filter(|u| !u.is_empty()) {
        Some(upload) => Some(images.store_image(upload)?),
        None => None,
    };
    if let Some(path) = &stored_image {
        venue.image_url = path.clone();
    }

    if let Err(e) = store.create_venue(venue.clone()) {
        if let Some(path) = &stored_image {
            images.discard_image(path);
        }
        return Err(e.into());
    }
    info!("Created venue {} ({})", venue.name, venue.id);
    Ok(venue)
}

/// Update a venue's data and optionally replace its image.
///
/// Without an upload, the currently stored image path is kept, regardless of `venue.image_url`.
pub fn update_venue<S: BlobStorage>(
    store: &mut dyn BookingStoreFacade,
    images: &ImageManager<S>,
    mut venue: Venue,
    upload: Option<&ImageUpload>,
) -> Result<Venue, VenueError> {
    let previous = store.get_venue(venue.id)?;
    images.replace_image(
        &previous.image_url,
        upload,
        |image_url: &str| -> Result<bool, VenueError> {
            let previous_image_in_use = image_url == previous.image_url
                || image_referenced_elsewhere(store, &previous.image_url, venue.id)?;
            venue.image_url = image_url.to_owned();
            store.update_venue(venue.clone())?;
            Ok(!previous_image_in_use)
        },
    )?;
    info!("Updated venue {} ({})", venue.name, venue.id);
    Ok(venue)
}

/// Delete a venue and its image.
///
/// While bookings reference the venue, this fails with [StoreError::ReferencedByBookings] and
/// neither the venue nor its image is touched. The image is kept, if another venue uses it, too.
pub fn delete_venue<S: BlobStorage>(
    store: &mut dyn BookingStoreFacade,
    images: &ImageManager<S>,
    venue_id: VenueId,
) -> Result<Venue, VenueError> {
    let venue = store.delete_venue(venue_id)?;
    match image_referenced_elsewhere(store, &venue.image_url, venue.id) {
        Ok(false) => images.discard_image(&venue.image_url),
        Ok(true) => info!(
            "Keeping image {}, since other venues still use it",
            venue.image_url
        ),
        Err(e) => warn!(
            "Could not check if image {} is still in use, keeping it: {}",
            venue.image_url, e
        ),
    }
    info!("Deleted venue {} ({})", venue.name, venue.id);
    Ok(venue)
}

/// Remove all stored images, which are not referenced by any venue. Returns the removed paths.
///
/// Must not run concurrently with venue creations or updates: their freshly stored image is not
/// referenced until the venue row has been written.
pub fn cleanup_orphaned_images<S: BlobStorage>(
    store: &mut dyn BookingStoreFacade,
    images: &ImageManager<S>,
) -> Result<Vec<String>, VenueError> {
    let referenced: BTreeSet<String> = store
        .get_venues()?
        .into_iter()
        .map(|v| v.image_url)
        .collect();
    let mut removed = Vec::new();
    for path in images.stored_images()? {
        if referenced.contains(&path) {
            continue;
        }
        match images.delete_image(&path) {
            Ok(true) => removed.push(path),
            Ok(false) => {}
            Err(e) => warn!("Could not remove orphaned image {}: {}", path, e),
        }
    }
    info!("Removed {} orphaned image(s)", removed.len());
    Ok(removed)
}

/// Check if any venue apart from `venue_id` refers to the image at `path`
fn image_referenced_elsewhere(
    store: &mut dyn BookingStoreFacade,
    path: &str,
    venue_id: VenueId,
) -> Result<bool, StoreError> {
    Ok(store
        .get_venues()?
        .iter()
        .any(|v| v.id != venue_id && v.image_url == path))
}
