use super::*;
use std::cell::RefCell;

/// Keeps the snapshot in process memory. Nothing survives a restart.
#[derive(Default)]
pub struct MemStorage {
    data: RefCell<Vec<Contact>>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contacts(contacts: Vec<Contact>) -> Self {
        Self {
            data: RefCell::new(contacts),
        }
    }

    /// Copy of what the last `save` stored.
    pub fn snapshot(&self) -> Vec<Contact> {
        self.data.borrow().clone()
    }
}

impl ContactStore for MemStorage {
    fn load(&self) -> Result<Vec<Contact>, AppError> {
        Ok(self.data.borrow().clone())
    }

    fn save(&self, contacts: &[Contact]) -> Result<(), AppError> {
        *self.data.borrow_mut() = contacts.to_vec();
        Ok(())
    }

    fn get_medium(&self) -> &str {
        "mem"
    }
}
