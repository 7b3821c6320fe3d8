//! Struct archiving functionality
//!
//! Cyclic data such as guidance status reports are retained as timestamped
//! CSV files in the session's archive directory.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use csv::WriterBuilder;
pub use csv::Writer;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::path::Path;

// Internal imports
use crate::session::Session;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An object used to write CSV archive files.
#[derive(Default)]
pub struct Archiver {
    writer: Option<Writer<File>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Archiver {
    /// Create a new archiver from a paricular path relative to the session's
    /// archive root.
    pub fn from_path<P: AsRef<Path>>(
        session: &Session,
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut session_path = session.arch_root.clone();
        session_path.push(path);

        // Create the file if it does not exist
        std::fs::File::create(session_path.clone())?;

        // Open the file in append mode
        let file = match OpenOptions::new().append(true).open(session_path) {
            Ok(f) => f,
            Err(e) => return Err(Box::new(e)),
        };

        let w = WriterBuilder::new().has_headers(true).from_writer(file);

        Ok(Self { writer: Some(w) })
    }

    /// Serialise a record into the archive.
    pub fn serialise<T: Serialize>(
        &mut self,
        record: T,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match self.writer {
            Some(ref mut w) => {
                w.serialize(record)?;
                w.flush()?
            }
            // An uninitialised archiver silently drops records, so that
            // modules may run without a session (for example in tests).
            None => (),
        }

        Ok(())
    }
}
