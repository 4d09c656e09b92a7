pub mod cli;
pub mod cli_error;
pub mod data_store;
pub mod images;
mod setup;
pub mod venues;
