use crate::cli::util::confirm_deletion;
use crate::cli::{get_image_manager_from_env, read_upload};
use crate::cli_error::CliError;
use crate::data_store::models::Venue;
use crate::data_store::{get_store_from_env, BookingStore, VenueId};
use crate::venues;
use std::path::PathBuf;
use uuid::Uuid;

/// Image path stored for venues, which have been created without uploading an image
pub const PLACEHOLDER_IMAGE_URL: &str = "/images/placeholder.png";

pub fn print_venue_list() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;

    let venues = data_store.get_venues()?;

    let mut table = comfy_table::Table::new();
    table
        .load_preset(comfy_table::presets::ASCII_BORDERS_ONLY_CONDENSED)
        .set_header(vec!["id", "name", "location", "capacity", "image"])
        .set_content_arrangement(comfy_table::ContentArrangement::Dynamic)
        .add_rows(venues.into_iter().map(|venue| {
            [
                venue.id.to_string(),
                venue.name,
                venue.location,
                venue.capacity.to_string(),
                venue.image_url,
            ]
        }));

    println!("{table}");
    Ok(())
}

pub fn add_venue(
    name: String,
    location: String,
    capacity: i32,
    image: Option<PathBuf>,
    image_url: Option<String>,
) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let images = get_image_manager_from_env()?;

    let upload = image.as_deref().map(read_upload).transpose()?;
    let venue = Venue {
        id: Uuid::now_v7(),
        name,
        location,
        capacity,
        image_url: image_url.unwrap_or_else(|| PLACEHOLDER_IMAGE_URL.to_owned()),
    };
    let venue = venues::create_venue(data_store.as_mut(), &images, venue, upload.as_ref())?;
    println!("Created venue with id {}.", venue.id);
    Ok(())
}

/// Changes of a venue's data. Fields, which are None, are kept.
#[derive(Default)]
pub struct VenueChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<i32>,
    /// Local file to be uploaded as the venue's new image
    pub image: Option<PathBuf>,
}

pub fn update_venue(venue_id: VenueId, changes: VenueChanges) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let images = get_image_manager_from_env()?;

    let upload = changes.image.as_deref().map(read_upload).transpose()?;
    let mut venue = data_store.get_venue(venue_id)?;
    if let Some(name) = changes.name {
        venue.name = name;
    }
    if let Some(location) = changes.location {
        venue.location = location;
    }
    if let Some(capacity) = changes.capacity {
        venue.capacity = capacity;
    }
    let venue = venues::update_venue(data_store.as_mut(), &images, venue, upload.as_ref())?;
    println!("Venue image: {}", venue.image_url);
    Ok(())
}

pub fn delete_venue(venue_id: VenueId, confirmed: bool) -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let images = get_image_manager_from_env()?;

    let venue = data_store.get_venue(venue_id)?;
    if !confirm_deletion(
        &format!("venue \"{}\" ({})", venue.name, venue.location),
        confirmed,
    ) {
        return Ok(());
    }
    venues::delete_venue(data_store.as_mut(), &images, venue_id)?;
    Ok(())
}

pub fn cleanup_images() -> Result<(), CliError> {
    let data_store_pool = get_store_from_env()?;
    let mut data_store = data_store_pool.get_facade()?;
    let images = get_image_manager_from_env()?;

    let removed = venues::cleanup_orphaned_images(data_store.as_mut(), &images)?;
    for path in removed.iter() {
        println!("Removed {}", path);
    }
    println!("Removed {} orphaned image(s).", removed.len());
    Ok(())
}
