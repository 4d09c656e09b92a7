//! Implementation of the `venue-booking` command line subcommands
//!
//! Each function runs one subcommand against the database given by the environment (see
//! [crate::data_store::get_store_from_env]) and prints its results to stdout.

use crate::cli_error::CliError;
use crate::images::{ImageManager, ImageUpload, LocalDiskStorage};
use crate::setup;
use std::path::Path;

pub mod database_migration;
pub mod file_io;
pub mod manage_bookings;
pub mod manage_events;
pub mod manage_venues;
mod util;

/// Get the [ImageManager] for the image directory given by the "IMAGE_STORAGE_PATH" environment
/// variable.
fn get_image_manager_from_env() -> Result<ImageManager<LocalDiskStorage>, CliError> {
    Ok(ImageManager::new(LocalDiskStorage::new(
        setup::get_image_storage_path_from_env()?,
    )))
}

fn read_upload(path: &Path) -> Result<ImageUpload, CliError> {
    ImageUpload::from_file(path)
        .map_err(|e| CliError::FileError(format!("Could not read {:?}: {}", path, e)))
}
