use crate::data_store::StoreError;
use crate::images::ImageError;
use crate::setup::SetupError;
use crate::venues::VenueError;
use diesel::ConnectionError;

#[derive(Debug)]
pub enum CliError {
    /// The application setup (environment variables) are not complete or invalid
    SetupError(String),
    /// Could not connect to the database server
    CouldNotConnectToDatabase(String),
    /// The database did not respond in time or the transaction collided with a concurrent one.
    /// Retrying the command may succeed.
    TransientStoreError(String),
    /// Somehow, the database connection or our data_store abstraction failed during cli data
    /// transactions
    UnexpectedStoreError(String),
    /// Somehow, migrating the database to the current schema version failed
    DatabaseMigrationError(String),
    /// One or more database schema migrations are pending
    DatabaseMigrationRequired {
        /// The names of the pending database schema migrations
        missing_migrations: Vec<String>,
    },
    /// Failure while handling some file for a cli data transaction
    FileError(String),
    /// Could not complete command because the provided data (e.g. an input file) is not valid
    DataError(String),
    /// The command was refused by one of the booking rules (duplicates, dependent bookings, ...)
    Rejected(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::SetupError { .. } => 1,
            CliError::CouldNotConnectToDatabase(_) => 4,
            CliError::DatabaseMigrationRequired { .. } => 5,
            CliError::TransientStoreError(_) => 75,
            CliError::DataError(_) => 1,
            CliError::FileError(_) => 1,
            CliError::Rejected(_) => 3,
            CliError::DatabaseMigrationError(_) => 4,
            CliError::UnexpectedStoreError(_) => 2,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::SetupError(e) => {
                write!(f, "Setup invalid: {}", e)
            }
            CliError::CouldNotConnectToDatabase(e) => {
                write!(f, "Could not connect to database: {}", e)
            }
            CliError::TransientStoreError(e) => {
                write!(f, "{} Please try again.", e)
            }
            CliError::DatabaseMigrationRequired { missing_migrations } => {
                write!(
                    f,
                    "Database migration required. Missing migrations: {}",
                    missing_migrations.join(", ")
                )
            }
            CliError::DataError(e) => {
                write!(f, "Provided data is invalid: {}", e)
            }
            CliError::FileError(e) => f.write_str(e),
            CliError::Rejected(e) => f.write_str(e),
            CliError::DatabaseMigrationError(e) => {
                write!(f, "Error while applying database migrations: {}", e)
            }
            CliError::UnexpectedStoreError(e) => {
                write!(f, "Unexpected error in data store: {}", e)
            }
        }
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::ConnectionError(e) => Self::CouldNotConnectToDatabase(e),
            e @ StoreError::Timeout | e @ StoreError::TransactionConflict => {
                Self::TransientStoreError(e.to_string())
            }
            StoreError::QueryError(e) => Self::UnexpectedStoreError(e.to_string()),
            StoreError::NotExisting => Self::DataError("Item not existing".to_string()),
            e @ StoreError::Duplicate(_) => Self::Rejected(e.to_string()),
            e @ StoreError::ReferencedByBookings { .. } => Self::Rejected(format!(
                "{}\nUse `booking list` or `search` to view the bookings.",
                e
            )),
            e @ StoreError::ReferencedByEvents { .. } => Self::Rejected(e.to_string()),
            StoreError::InvalidInputData(e) => Self::DataError(e),
            StoreError::InvalidDataInDatabase(e) => Self::UnexpectedStoreError(e),
        }
    }
}

impl From<ImageError> for CliError {
    fn from(e: ImageError) -> Self {
        match e {
            e @ ImageError::InvalidFileType(_) | e @ ImageError::FileTooLarge { .. } => {
                Self::Rejected(e.to_string())
            }
            e @ ImageError::NotFound(_) => Self::DataError(e.to_string()),
            ImageError::StorageFailure(e) => Self::FileError(e),
        }
    }
}

impl From<VenueError> for CliError {
    fn from(e: VenueError) -> Self {
        match e {
            VenueError::Store(e) => e.into(),
            VenueError::Image(e) => e.into(),
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::DataError(value.to_string())
    }
}

impl From<SetupError> for CliError {
    fn from(value: SetupError) -> Self {
        Self::SetupError(value.to_string())
    }
}

impl From<diesel::ConnectionError> for CliError {
    fn from(value: ConnectionError) -> Self {
        Self::CouldNotConnectToDatabase(value.to_string())
    }
}
