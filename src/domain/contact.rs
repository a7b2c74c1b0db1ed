use std::fmt;
use std::sync::LazyLock;

use super::*;
pub use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const BIRTHDAY_FORMAT: &str = "%d.%m.%Y";
const MAX_NAME_LENGTH: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,

    #[serde(default)]
    pub phones: Vec<String>,

    #[serde(default)]
    pub birthday: Option<NaiveDate>,
}

/// User-facing descriptions of the input rules.
pub struct ValidationReq;

impl ValidationReq {
    pub fn name_req() -> String {
        "Name must not be empty, must not contain spaces and must not exceed 50 characters"
            .to_string()
    }

    pub fn phone_req() -> String {
        "Phone number must contain exactly 10 digits".to_string()
    }

    pub fn birthday_req() -> String {
        "Invalid date format. Use DD.MM.YYYY".to_string()
    }
}

impl Contact {
    pub fn new(name: &str) -> Result<Self, AppError> {
        validate_name(name)?;

        Ok(Contact {
            name: name.to_string(),
            phones: Vec::new(),
            birthday: None,
        })
    }

    /// Attaches `phone` unless it is already on file.
    /// Returns `false` when the number was already present.
    pub fn add_phone(&mut self, phone: &str) -> Result<bool, AppError> {
        validate_phone(phone)?;

        if self.find_phone(phone).is_some() {
            return Ok(false);
        }
        self.phones.push(phone.to_string());
        Ok(true)
    }

    pub fn remove_phone(&mut self, phone: &str) -> Result<(), AppError> {
        let index = self.phone_position(phone)?;
        self.phones.remove(index);
        Ok(())
    }

    /// Replaces `old` with `new` in place, keeping display order.
    ///
    /// The old number is looked up before the new one is validated, so a
    /// missing number is reported as not found whatever `new` looks like.
    pub fn edit_phone(&mut self, old: &str, new: &str) -> Result<(), AppError> {
        let index = self.phone_position(old)?;
        validate_phone(new)?;

        if old != new && self.find_phone(new).is_some() {
            // New number already on file; dropping the old one keeps the set unique
            self.phones.remove(index);
        } else {
            self.phones[index] = new.to_string();
        }
        Ok(())
    }

    pub fn find_phone(&self, phone: &str) -> Option<&String> {
        self.phones.iter().find(|p| p.as_str() == phone)
    }

    /// Returns `true` when an existing birthday was overwritten.
    pub fn set_birthday(&mut self, birthday: NaiveDate) -> bool {
        self.birthday.replace(birthday).is_some()
    }

    /// Next calendar occurrence of the birthday on or after `today`.
    pub fn next_birthday(&self, today: NaiveDate) -> Option<NaiveDate> {
        let birthday = self.birthday?;
        let this_year = occurrence_in_year(birthday, today.year())?;

        if this_year >= today {
            Some(this_year)
        } else {
            occurrence_in_year(birthday, today.year() + 1)
        }
    }

    fn phone_position(&self, phone: &str) -> Result<usize, AppError> {
        self.phones
            .iter()
            .position(|p| p.as_str() == phone)
            .ok_or_else(|| {
                AppError::NotFound(format!("Phone {} of contact '{}'", phone, self.name))
            })
    }
}

impl fmt::Display for Contact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Contact: {}, Phones: {}",
            self.name,
            self.phones.join("; ")
        )?;
        if let Some(birthday) = self.birthday {
            write!(f, ", Birthday: {}", format_date(birthday))?;
        }
        Ok(())
    }
}

pub fn validate_name(name: &str) -> Result<(), AppError> {
    // Names are single tokens on the command line
    let valid = !name.is_empty()
        && name.chars().count() <= MAX_NAME_LENGTH
        && !name.chars().any(char::is_whitespace);

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation(ValidationReq::name_req()))
    }
}

static PHONE_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$"));

pub fn validate_phone(phone: &str) -> Result<(), AppError> {
    let re = PHONE_PATTERN
        .as_ref()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    if re.is_match(phone) {
        Ok(())
    } else {
        Err(AppError::Validation(ValidationReq::phone_req()))
    }
}

pub fn parse_birthday(text: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(text.trim(), BIRTHDAY_FORMAT)
        .map_err(|_| AppError::Validation(ValidationReq::birthday_req()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(BIRTHDAY_FORMAT).to_string()
}

/// The day a birthday is observed in `year`. Feb 29 falls on Mar 1 in common years.
pub fn occurrence_in_year(birthday: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birthday.month(), birthday.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 3, 1))
}
