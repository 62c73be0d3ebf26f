//! Session management
//!
//! A session is one run of an executable. It owns a timestamped directory under
//! `$LINACT_SW_ROOT/<sessions_dir>` which holds the run's log file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use chrono::{DateTime, Utc};
use conquer_once::OnceCell;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

// Internal imports
use crate::time;

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

/// Start of the process's session, the log timestamps count from here.
static SESSION_EPOCH: OnceCell<DateTime<Utc>> = OnceCell::uninit();

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// `strftime` format of the timestamp in session directory names.
const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Paths and start time of the current run.
#[derive(Clone, Debug)]
pub struct Session {
    /// Directory holding everything produced by this run
    pub session_root: PathBuf,

    /// The run's log file, inside `session_root`
    pub log_file_path: PathBuf,

    /// When the session was started
    pub epoch: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("The software root environment variable (LINACT_SW_ROOT) is not set")]
    SwRootNotSet,

    #[error("Cannot create the session directory: {0}")]
    CannotCreateDir(std::io::Error),

    #[error("A session has already been started in this process")]
    AlreadyStarted,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Session {
    /// Start the process's session in `$LINACT_SW_ROOT/<sessions_dir>`.
    ///
    /// Only one session may be started per process.
    pub fn new(exec_name: &str, sessions_dir: &str) -> Result<Self, SessionError> {
        let root = crate::host::get_sw_root().map_err(|_| SessionError::SwRootNotSet)?;

        SESSION_EPOCH
            .try_init_once(Utc::now)
            .map_err(|_| SessionError::AlreadyStarted)?;
        let epoch = *SESSION_EPOCH.get().ok_or(SessionError::AlreadyStarted)?;

        Self::create_in(&root.join(sessions_dir), exec_name, epoch)
    }

    /// Create the directory `<dir>/<exec_name>_<timestamp>` for a session
    /// starting at `epoch`.
    ///
    /// Does not touch the process's session epoch.
    pub fn create_in(
        dir: &Path,
        exec_name: &str,
        epoch: DateTime<Utc>
    ) -> Result<Self, SessionError> {
        let session_root = dir.join(format!(
            "{}_{}",
            exec_name,
            epoch.format(TIMESTAMP_FORMAT)
        ));

        fs::create_dir_all(&session_root).map_err(SessionError::CannotCreateDir)?;

        Ok(Session {
            log_file_path: session_root.join(format!("{}.log", exec_name)),
            session_root,
            epoch,
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Seconds since the process's session started, NaN before one has.
pub fn get_elapsed_seconds() -> f64 {
    SESSION_EPOCH
        .get()
        .and_then(|e| time::duration_to_seconds(Utc::now() - *e))
        .unwrap_or(std::f64::NAN)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_create_in() {
        let dir = std::env::temp_dir().join("linact_session_test");
        let epoch = DateTime::parse_from_rfc3339("2021-03-04T05:06:07Z")
            .unwrap()
            .with_timezone(&Utc);

        let session = Session::create_in(&dir, "act_exec", epoch).unwrap();

        assert_eq!(session.session_root, dir.join("act_exec_20210304_050607"));
        assert_eq!(
            session.log_file_path,
            dir.join("act_exec_20210304_050607").join("act_exec.log")
        );
        assert!(session.session_root.is_dir());

        // Creating the same session again reuses the directory
        assert!(Session::create_in(&dir, "act_exec", epoch).is_ok());
    }
}
