use crate::errors::AppError;
use crate::storage::DEFAULT_STORAGE_PATH;
use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(
    name = "rolodex-bot",
    version,
    about = "Interactive contact book with birthday reminders"
)]
pub struct Cli {
    /// File holding the saved address book
    #[arg(long, env = "ROLODEX_PATH", default_value = DEFAULT_STORAGE_PATH)]
    pub path: PathBuf,
}

/// Commands understood by the interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Hello,
    Add,
    Change,
    RemovePhone,
    Phone,
    All,
    AddBirthday,
    ShowBirthday,
    Birthdays,
    Delete,
    Help,
    Exit,
}

impl Command {
    pub const ALL: [Command; 12] = [
        Command::Hello,
        Command::Add,
        Command::Change,
        Command::RemovePhone,
        Command::Phone,
        Command::All,
        Command::AddBirthday,
        Command::ShowBirthday,
        Command::Birthdays,
        Command::Delete,
        Command::Help,
        Command::Exit,
    ];

    pub fn usage(&self) -> &'static str {
        match self {
            Command::Hello => "hello",
            Command::Add => "add <name> [phone]",
            Command::Change => "change <name> <old_phone> <new_phone>",
            Command::RemovePhone => "remove-phone <name> <phone>",
            Command::Phone => "phone <name>",
            Command::All => "all",
            Command::AddBirthday => "add-birthday <name> <DD.MM.YYYY>",
            Command::ShowBirthday => "show-birthday <name>",
            Command::Birthdays => "birthdays [days]",
            Command::Delete => "delete <name>",
            Command::Help => "help",
            Command::Exit => "exit | close",
        }
    }

    /// Accepted argument count as (required, optional).
    fn arity(&self) -> (usize, usize) {
        match self {
            Command::Hello | Command::All | Command::Help | Command::Exit => (0, 0),
            Command::Add => (1, 1),
            Command::Change => (3, 0),
            Command::RemovePhone | Command::AddBirthday => (2, 0),
            Command::Phone | Command::ShowBirthday | Command::Delete => (1, 0),
            Command::Birthdays => (0, 1),
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Command::Add
                | Command::Change
                | Command::RemovePhone
                | Command::AddBirthday
                | Command::Delete
        )
    }

    pub fn check_arity(&self, args: &[&str]) -> Result<(), AppError> {
        let (required, optional) = self.arity();

        if args.len() < required || args.len() > required + optional {
            return Err(AppError::Validation(format!("Usage: {}", self.usage())));
        }
        Ok(())
    }
}

impl FromStr for Command {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hello" => Ok(Command::Hello),
            "add" => Ok(Command::Add),
            "change" => Ok(Command::Change),
            "remove-phone" => Ok(Command::RemovePhone),
            "phone" => Ok(Command::Phone),
            "all" => Ok(Command::All),
            "add-birthday" => Ok(Command::AddBirthday),
            "show-birthday" => Ok(Command::ShowBirthday),
            "birthdays" => Ok(Command::Birthdays),
            "delete" => Ok(Command::Delete),
            "help" => Ok(Command::Help),
            "exit" | "close" => Ok(Command::Exit),
            _ => Err(AppError::ParseCommand(s.to_string())),
        }
    }
}

/// Splits a line into its command word and arguments. Blank lines yield `None`.
pub fn parse_input(line: &str) -> Option<(&str, Vec<&str>)> {
    let mut tokens = line.split_whitespace();
    let command = tokens.next()?;
    Some((command, tokens.collect()))
}
