use chrono::NaiveDate;
use clap::ArgAction;
use clap::{Args, Parser, Subcommand};
use dotenvy::dotenv;
use log::{error, warn};
use std::path::PathBuf;
use uuid::Uuid;
use venue_booking_server::cli::manage_bookings::BookingChanges;
use venue_booking_server::cli::manage_events::EventChanges;
use venue_booking_server::cli::manage_venues::VenueChanges;
use venue_booking_server::cli::{
    database_migration, file_io, manage_bookings, manage_events, manage_venues,
};
use venue_booking_server::cli_error::CliError;
use venue_booking_server::data_store::BookingSearchBuilder;

fn main() {
    let args = CliArgs::parse();
    let dotenv_result = dotenv();

    let env = env_logger::Env::new().filter_or(
        "RUST_LOG",
        match args.global_opts.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        },
    );
    env_logger::Builder::from_env(env).init();
    if let Err(e) = dotenv_result {
        warn!("Could not read .env file: {}", e);
    }

    if let Err(e) = run(args.command) {
        error!("{}", e);
        eprintln!("{}", e);
        std::process::exit(e.exit_code());
    }
}

fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Migrate { check } => {
            if check {
                database_migration::check_migration_state()
            } else {
                database_migration::run_migrations()
            }
        }
        Command::EventType { command } => match command {
            EventTypeCommand::List { all } => manage_events::print_event_type_list(all),
            EventTypeCommand::Add { name, description } => {
                manage_events::add_event_type(name, description)
            }
            EventTypeCommand::Activate { id } => manage_events::set_event_type_active(id, true),
            EventTypeCommand::Deactivate { id } => {
                manage_events::set_event_type_active(id, false)
            }
            EventTypeCommand::Delete { id, yes } => manage_events::delete_event_type(id, yes),
        },
        Command::Venue { command } => match command {
            VenueCommand::List => manage_venues::print_venue_list(),
            VenueCommand::Add {
                name,
                location,
                capacity,
                image,
                image_url,
            } => manage_venues::add_venue(name, location, capacity, image, image_url),
            VenueCommand::Update {
                id,
                name,
                location,
                capacity,
                image,
            } => manage_venues::update_venue(
                id,
                VenueChanges {
                    name,
                    location,
                    capacity,
                    image,
                },
            ),
            VenueCommand::Delete { id, yes } => manage_venues::delete_venue(id, yes),
        },
        Command::Event { command } => match command {
            EventCommand::List => manage_events::print_event_list(),
            EventCommand::Add {
                name,
                date,
                description,
                event_type,
            } => manage_events::add_event(name, date, description, event_type),
            EventCommand::Update {
                id,
                name,
                date,
                description,
                event_type,
            } => manage_events::update_event(
                id,
                EventChanges {
                    name,
                    date,
                    description,
                    event_type_id: event_type,
                },
            ),
            EventCommand::Delete { id, yes } => manage_events::delete_event(id, yes),
        },
        Command::Booking { command } => match command {
            BookingCommand::List => manage_bookings::print_booking_list(),
            BookingCommand::Add { venue, event, date } => {
                manage_bookings::add_booking(venue, event, date)
            }
            BookingCommand::Update {
                id,
                venue,
                event,
                date,
            } => manage_bookings::update_booking(
                id,
                BookingChanges {
                    venue_id: venue,
                    event_id: event,
                    booking_date: date,
                },
            ),
            BookingCommand::Delete { id, yes } => manage_bookings::delete_booking(id, yes),
        },
        Command::Search(search_args) => {
            let mut builder = BookingSearchBuilder::new();
            if let Some(booking_id) = search_args.booking_id {
                builder.booking_id(booking_id);
            }
            if let Some(pattern) = &search_args.event_name {
                builder.event_name_contains(pattern);
            }
            if let Some(event_type) = search_args.event_type {
                builder.event_type(event_type);
            }
            if let Some(pattern) = &search_args.venue_name {
                builder.venue_name_contains(pattern);
            }
            if let Some(start_date) = search_args.start_date {
                builder.event_on_or_after(start_date);
            }
            if let Some(end_date) = search_args.end_date {
                builder.event_on_or_before(end_date);
            }
            manage_bookings::search_bookings(&builder.build(), search_args.json)
        }
        Command::ExportData { path } => file_io::export_data_to_file(&path),
        Command::LoadData { path, new_ids } => file_io::load_data_from_file(&path, new_ids),
        Command::CleanupImages => manage_venues::cleanup_images(),
    }
}

/// Management of venues, events and their bookings
#[derive(Debug, Parser)]
#[clap(name = "venue-booking", version)]
pub struct CliArgs {
    #[clap(flatten)]
    global_opts: GlobalOpts,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Migrate the database schema to the current version
    Migrate {
        /// Only check for pending migrations, don't apply them
        #[clap(long)]
        check: bool,
    },
    /// Manage event types
    EventType {
        #[clap(subcommand)]
        command: EventTypeCommand,
    },
    /// Manage venues and their images
    Venue {
        #[clap(subcommand)]
        command: VenueCommand,
    },
    /// Manage events
    Event {
        #[clap(subcommand)]
        command: EventCommand,
    },
    /// Manage bookings
    Booking {
        #[clap(subcommand)]
        command: BookingCommand,
    },
    /// Search bookings. All given criteria must match.
    Search(SearchArgs),
    /// Export all data to a JSON file
    ExportData {
        /// The path of the JSON file to write to
        path: PathBuf,
    },
    /// Load data from JSON file
    LoadData {
        /// The path of the JSON file to read from
        path: PathBuf,
        /// Assign new ids to the loaded venues, events and bookings
        #[clap(long)]
        new_ids: bool,
    },
    /// Remove stored venue images, which no venue refers to
    CleanupImages,
}

#[derive(Debug, Subcommand)]
enum EventTypeCommand {
    /// List active event types
    List {
        /// Include deactivated event types
        #[clap(long)]
        all: bool,
    },
    Add {
        name: String,
        #[clap(long)]
        description: Option<String>,
    },
    /// Offer the event type for new events again
    Activate { id: i32 },
    /// Stop offering the event type for new events
    Deactivate { id: i32 },
    Delete {
        id: i32,
        /// Don't ask for confirmation
        #[clap(long, short)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum VenueCommand {
    List,
    Add {
        #[clap(long)]
        name: String,
        #[clap(long)]
        location: String,
        #[clap(long)]
        capacity: i32,
        /// Image file to upload (JPG, PNG or GIF, at most 5 MB)
        #[clap(long, conflicts_with = "image_url")]
        image: Option<PathBuf>,
        /// Use an existing image path instead of uploading one
        #[clap(long)]
        image_url: Option<String>,
    },
    Update {
        id: Uuid,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        location: Option<String>,
        #[clap(long)]
        capacity: Option<i32>,
        /// New image file to upload, replacing the current image
        #[clap(long)]
        image: Option<PathBuf>,
    },
    Delete {
        id: Uuid,
        /// Don't ask for confirmation
        #[clap(long, short)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum EventCommand {
    List,
    Add {
        #[clap(long)]
        name: String,
        /// Date of the event (YYYY-MM-DD)
        #[clap(long)]
        date: NaiveDate,
        #[clap(long)]
        description: String,
        /// Id of the event type
        #[clap(long)]
        event_type: i32,
    },
    Update {
        id: Uuid,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        date: Option<NaiveDate>,
        #[clap(long)]
        description: Option<String>,
        #[clap(long)]
        event_type: Option<i32>,
    },
    Delete {
        id: Uuid,
        /// Don't ask for confirmation
        #[clap(long, short)]
        yes: bool,
    },
}

#[derive(Debug, Subcommand)]
enum BookingCommand {
    List,
    Add {
        #[clap(long)]
        venue: Uuid,
        #[clap(long)]
        event: Uuid,
        /// Date of the booking (YYYY-MM-DD)
        #[clap(long)]
        date: NaiveDate,
    },
    Update {
        id: Uuid,
        #[clap(long)]
        venue: Option<Uuid>,
        #[clap(long)]
        event: Option<Uuid>,
        #[clap(long)]
        date: Option<NaiveDate>,
    },
    Delete {
        id: Uuid,
        /// Don't ask for confirmation
        #[clap(long, short)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
struct SearchArgs {
    #[clap(long)]
    booking_id: Option<Uuid>,
    /// Part of the event name (case-sensitive)
    #[clap(long)]
    event_name: Option<String>,
    /// Id of the event type
    #[clap(long)]
    event_type: Option<i32>,
    /// Part of the venue name (case-sensitive)
    #[clap(long)]
    venue_name: Option<String>,
    /// Earliest event date (inclusive)
    #[clap(long)]
    start_date: Option<NaiveDate>,
    /// Latest event date (inclusive)
    #[clap(long)]
    end_date: Option<NaiveDate>,
    /// Print the results as JSON
    #[clap(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct GlobalOpts {
    /// Verbosity level (can be specified multiple times)
    #[clap(long, short, global = true, action = ArgAction::Count)]
    verbose: u8,
}
