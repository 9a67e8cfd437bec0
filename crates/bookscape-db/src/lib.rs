pub mod error;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod queries;
pub mod subscribers;

pub use error::{DbError, Result};
pub use memory::MemorySubscriberStore;
pub use subscribers::SubscriberStore;

use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{error, info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

enum Location {
    File(PathBuf),
    Memory,
}

impl Location {
    fn describe(&self) -> String {
        match self {
            Location::File(path) => path.display().to_string(),
            Location::Memory => ":memory:".to_string(),
        }
    }

    fn open(&self) -> Result<Connection> {
        let conn = match self {
            Location::File(path) => Connection::open(path),
            Location::Memory => Connection::open_in_memory(),
        }
        .map_err(|e| DbError::Unavailable(format!("{}: {}", self.describe(), e)))?;

        if let Location::File(_) = self {
            // WAL mode for concurrent reads
            conn.pragma_update(None, "journal_mode", "WAL")?;
        }
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        migrations::run(&conn)?;
        Ok(conn)
    }
}

/// The persistent store. Holds a single SQLite connection that is opened
/// lazily: if the database cannot be opened, every call retries the open and
/// fails with a connectivity-class error until it succeeds.
pub struct Database {
    location: Location,
    conn: Mutex<Option<Connection>>,
}

impl Database {
    /// Open the database at `path`, failing if it cannot be opened now.
    pub fn open(path: &Path) -> Result<Self> {
        let location = Location::File(path.to_path_buf());
        let conn = location.open()?;
        info!("Database opened at {}", path.display());
        Ok(Self {
            location,
            conn: Mutex::new(Some(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let location = Location::Memory;
        let conn = location.open()?;
        Ok(Self {
            location,
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Like `open`, but an unreachable database is logged rather than fatal.
    pub fn connect(path: &Path) -> Self {
        match Self::open(path) {
            Ok(db) => db,
            Err(e) => {
                error!("Database connection error: {}", e);
                Self {
                    location: Location::File(path.to_path_buf()),
                    conn: Mutex::new(None),
                }
            }
        }
    }

    /// `:memory:` selects an in-memory database, anything else is a file path.
    pub fn connect_url(url: &str) -> Self {
        if url == ":memory:" {
            match Self::open_in_memory() {
                Ok(db) => return db,
                Err(e) => error!("In-memory database failed to open: {}", e),
            }
        }
        Self::connect(Path::new(url))
    }

    #[cfg(test)]
    fn is_connected(&self) -> bool {
        self.conn.lock().map(|c| c.is_some()).unwrap_or(false)
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut guard = self.conn.lock().map_err(|_| DbError::Poisoned)?;

        if guard.is_none() {
            let conn = self.location.open()?;
            info!("Database reconnected at {}", self.location.describe());
            *guard = Some(conn);
        }

        let Some(conn) = guard.as_ref() else {
            return Err(DbError::Unavailable(self.location.describe()));
        };

        let result = f(conn);
        if let Err(e) = &result {
            // An in-memory database would lose its contents if dropped.
            if e.is_connectivity() && matches!(self.location, Location::File(_)) {
                warn!("Dropping database connection after: {}", e);
                *guard = None;
            }
        }
        result
    }
}
