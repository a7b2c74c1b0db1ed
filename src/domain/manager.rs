use super::*;

use crate::storage::ContactStore;
use std::collections::HashSet;
use super::contact::{Local, NaiveDate, parse_birthday, validate_name, validate_phone};

pub const DEFAULT_BIRTHDAY_WINDOW: i64 = 7;

/// What `add` did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Created,
    PhoneAdded,
    Unchanged,
}

pub struct ContactManager {
    pub mem: Vec<Contact>,
    pub storage: Box<dyn ContactStore>,
}

impl ContactManager {
    /// Builds a manager over `storage` and loads its snapshot.
    pub fn new(storage: Box<dyn ContactStore>) -> Result<Self, AppError> {
        let mut manager = Self {
            mem: Vec::new(),
            storage,
        };
        manager.load()?;
        Ok(manager)
    }

    pub fn load(&mut self) -> Result<(), AppError> {
        let contacts = self.storage.load()?;

        let mut seen = HashSet::new();
        for contact in &contacts {
            if validate_name(&contact.name).is_err() || !seen.insert(contact.name.as_str()) {
                return Err(AppError::Persistence(format!(
                    "snapshot holds an invalid or duplicate contact name '{}'",
                    contact.name
                )));
            }

            let mut phones = HashSet::new();
            for phone in &contact.phones {
                if validate_phone(phone).is_err() || !phones.insert(phone.as_str()) {
                    return Err(AppError::Persistence(format!(
                        "snapshot holds an invalid or duplicate phone '{}' for contact '{}'",
                        phone, contact.name
                    )));
                }
            }
        }

        tracing::info!(
            count = contacts.len(),
            medium = self.storage.get_medium(),
            "contacts loaded"
        );
        self.mem = contacts;
        Ok(())
    }

    pub fn save(&self) -> Result<(), AppError> {
        self.storage.save(&self.mem)
    }

    pub fn get_index_by_name(&self, name: &str) -> Option<usize> {
        self.mem.iter().position(|c| c.name == name)
    }

    pub fn get(&self, name: &str) -> Result<&Contact, AppError> {
        self.get_index_by_name(name)
            .map(|index| &self.mem[index])
            .ok_or_else(|| not_found(name))
    }

    fn get_mut(&mut self, name: &str) -> Result<&mut Contact, AppError> {
        match self.get_index_by_name(name) {
            Some(index) => Ok(&mut self.mem[index]),
            None => Err(not_found(name)),
        }
    }

    /// Creates the contact if absent, then attaches `phone` when given.
    pub fn add(
        &mut self,
        name: &str,
        phone: Option<&str>,
    ) -> Result<(&Contact, AddOutcome), AppError> {
        validate_name(name)?;

        if let Some(index) = self.get_index_by_name(name) {
            let mut outcome = AddOutcome::Unchanged;
            if let Some(phone) = phone
                && self.mem[index].add_phone(phone)?
            {
                outcome = AddOutcome::PhoneAdded;
            }
            return Ok((&self.mem[index], outcome));
        }

        // The phone is validated before the contact is stored so a bad number adds nothing
        let mut contact = Contact::new(name)?;
        if let Some(phone) = phone {
            contact.add_phone(phone)?;
        }
        self.mem.push(contact);

        tracing::debug!(name, "contact created");
        Ok((&self.mem[self.mem.len() - 1], AddOutcome::Created))
    }

    pub fn update_phone(&mut self, name: &str, old: &str, new: &str) -> Result<&Contact, AppError> {
        let contact = self.get_mut(name)?;
        contact.edit_phone(old, new)?;
        Ok(contact)
    }

    pub fn remove_phone(&mut self, name: &str, phone: &str) -> Result<&Contact, AppError> {
        let contact = self.get_mut(name)?;
        contact.remove_phone(phone)?;
        Ok(contact)
    }

    /// Sets the birthday from `DD.MM.YYYY` text.
    /// The flag is `true` when an earlier birthday was replaced.
    pub fn add_birthday(&mut self, name: &str, date: &str) -> Result<(&Contact, bool), AppError> {
        let contact = self.get_mut(name)?;
        let birthday = parse_birthday(date)?;
        let replaced = contact.set_birthday(birthday);
        Ok((contact, replaced))
    }

    pub fn delete(&mut self, name: &str) -> Result<Contact, AppError> {
        let index = self.get_index_by_name(name).ok_or_else(|| not_found(name))?;
        // `remove` keeps the remaining contacts in insertion order
        Ok(self.mem.remove(index))
    }

    pub fn list_all(&self) -> &[Contact] {
        &self.mem
    }

    /// Contacts whose next birthday falls within `window_days` of `today`, inclusive.
    pub fn upcoming_birthdays(
        &self,
        today: NaiveDate,
        window_days: i64,
    ) -> Vec<(&Contact, NaiveDate)> {
        let mut upcoming: Vec<(&Contact, NaiveDate)> = self
            .mem
            .iter()
            .filter_map(|contact| {
                let next = contact.next_birthday(today)?;
                let days_out = (next - today).num_days();
                (0..=window_days)
                    .contains(&days_out)
                    .then_some((contact, next))
            })
            .collect();

        upcoming.sort_by(|(a, a_date), (b, b_date)| {
            a_date.cmp(b_date).then_with(|| a.name.cmp(&b.name))
        });
        upcoming
    }
}

fn not_found(name: &str) -> AppError {
    AppError::NotFound(format!("Contact '{}'", name))
}

/// Whole days from `today` until `date`.
pub fn days_until(today: NaiveDate, date: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Current local date, used by the interactive session.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}
