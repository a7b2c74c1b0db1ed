pub mod contact;
pub mod manager;

use crate::errors::AppError;

pub use contact::Contact;
pub use manager::{AddOutcome, ContactManager};
