use thiserror::Error;

use crate::records::RecordKind;

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid type: {0}")]
    InvalidKind(String),

    #[error("No entries to undo in {} for {year}", .kind.file_name())]
    NothingToUndo { kind: RecordKind, year: i32 },

    #[error("Invalid input: {0}")]
    Validation(String),
}

impl FleetError {
    /// Errors caused by what the caller asked for rather than by the data directory.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FleetError::InvalidKind(_)
                | FleetError::NothingToUndo { .. }
                | FleetError::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
