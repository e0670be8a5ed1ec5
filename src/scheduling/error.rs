use thiserror::Error;

use crate::db::DatabaseError;

/// Broad failure class, one per HTTP status family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Overlap,
    StateConflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum SchedulingError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid range: {0}")]
    InvalidRange(String),

    #[error("Appointment must start in the future")]
    InPast,

    #[error("The doctor already has an appointment overlapping this time block")]
    DuplicateSlot,

    #[error("{0} generated block(s) overlap existing appointments; nothing was created")]
    DuplicateRange(usize),

    #[error("Appointment is already booked")]
    AlreadyBooked,

    #[error("Appointment is not available for booking")]
    NotAvailable,

    #[error("Pet already has an upcoming appointment")]
    PetAlreadyScheduled,

    #[error("Appointment is already {0} and cannot be canceled")]
    NotCancelable(&'static str),

    #[error("Appointment has no pet booked")]
    MissingPet,

    #[error("Appointment already has a diagnosis or was canceled")]
    AlreadyCompleted,

    #[error("A diagnosis can only be recorded between the start and one hour five minutes after the end")]
    CompletionWindow,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl SchedulingError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidRange(_) | Self::InPast | Self::CompletionWindow => ErrorKind::Validation,
            Self::DuplicateSlot | Self::DuplicateRange(_) => ErrorKind::Overlap,
            Self::AlreadyBooked
            | Self::NotAvailable
            | Self::PetAlreadyScheduled
            | Self::NotCancelable(_)
            | Self::MissingPet
            | Self::AlreadyCompleted => ErrorKind::StateConflict,
            // The live-slot unique index fired: a concurrent writer won the block.
            Self::Database(DatabaseError::ConstraintViolation(_)) => ErrorKind::Overlap,
            Self::Database(DatabaseError::NotFound { .. }) => ErrorKind::NotFound,
            Self::Database(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for API bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidRange(_) => "INVALID_RANGE",
            Self::InPast => "IN_PAST",
            Self::DuplicateSlot => "DUPLICATE_SLOT",
            Self::DuplicateRange(_) => "DUPLICATE_RANGE",
            Self::AlreadyBooked => "ALREADY_BOOKED",
            Self::NotAvailable => "NOT_AVAILABLE",
            Self::PetAlreadyScheduled => "PET_ALREADY_SCHEDULED",
            Self::NotCancelable(_) => "NOT_CANCELABLE",
            Self::MissingPet => "MISSING_PET",
            Self::AlreadyCompleted => "ALREADY_COMPLETED",
            Self::CompletionWindow => "COMPLETION_WINDOW",
            Self::Database(DatabaseError::ConstraintViolation(_)) => "DUPLICATE_SLOT",
            Self::Database(DatabaseError::NotFound { .. }) => "NOT_FOUND",
            Self::Database(_) => "INTERNAL_ERROR",
        }
    }
}
