pub use crate::cli::{SessionEnd, command, run_app, run_session};
pub use crate::domain::{
    AddOutcome, ContactManager,
    contact::{self, Contact},
    manager,
};
pub use crate::errors::AppError;
pub use crate::storage::{self, ContactStore, JsonStorage, MemStorage};
