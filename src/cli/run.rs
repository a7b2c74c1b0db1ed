use crate::{
    cli::{get_input, prompt},
    prelude::{
        AddOutcome, AppError, ContactManager, JsonStorage,
        command::{Cli, Command, parse_input},
        contact::{NaiveDate, format_date},
        manager::{DEFAULT_BIRTHDAY_WINDOW, days_until},
    },
};
use std::io::{self, BufRead, Write};
use std::str::FromStr;

const MAX_BIRTHDAY_WINDOW: i64 = 366;

/// Ctrl-C skips the exit save, which only matters once an autosave has failed.
pub const INTERRUPT_NOTE: &str = "Changes are saved after each command. If a save fails, \
Ctrl-C discards the unsaved changes; use `exit` to retry the save.";

/// How the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// `exit`/`close`, or end of input with the snapshot written.
    Saved,
    /// Input ended while the last save attempt failed.
    Unsaved,
}

/// Text produced by one command, and whether the store changed.
#[derive(Debug, PartialEq, Eq)]
pub struct Reply {
    pub message: String,
    pub mutated: bool,
}

impl Reply {
    fn read(message: impl Into<String>) -> Self {
        Reply {
            message: message.into(),
            mutated: false,
        }
    }

    fn write(message: impl Into<String>) -> Self {
        Reply {
            message: message.into(),
            mutated: true,
        }
    }
}

/// Loads the address book at `cli.path` and serves stdin until the user leaves.
pub fn run_app(cli: Cli) -> Result<SessionEnd, AppError> {
    tracing::info!(path = %cli.path.display(), "opening address book");
    let mut manager = ContactManager::new(Box::new(JsonStorage::new(cli.path)))?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(
        &mut manager,
        stdin.lock(),
        stdout.lock(),
        crate::domain::manager::today,
    )
}

/// Runs the command loop until `exit`/`close` or end of input.
///
/// Domain errors are printed and the loop goes on. The store is saved after
/// every mutating command; a failed save is reported without ending the session.
pub fn run_session<R, W, C>(
    manager: &mut ContactManager,
    mut input: R,
    mut output: W,
    today: C,
) -> Result<SessionEnd, AppError>
where
    R: BufRead,
    W: Write,
    C: Fn() -> NaiveDate,
{
    writeln!(output, "Welcome to the assistant bot!")?;

    loop {
        prompt(&mut output, "Enter a command: ")?;

        let Some(line) = get_input(&mut input)? else {
            // End of input takes the same path as `exit`
            writeln!(output)?;
            return match manager.save() {
                Ok(()) => {
                    writeln!(output, "Good bye!")?;
                    Ok(SessionEnd::Saved)
                }
                Err(e) => {
                    tracing::error!(error = %e, "final save failed");
                    writeln!(output, "{}\nChanges made in this session were lost.", e)?;
                    Ok(SessionEnd::Unsaved)
                }
            };
        };

        let Some((name, args)) = parse_input(&line) else {
            continue;
        };

        let command = match Command::from_str(name) {
            Ok(command) => command,
            Err(e) => {
                tracing::debug!(error = %e, "unknown command");
                writeln!(output, "Invalid command.")?;
                continue;
            }
        };

        if command == Command::Exit {
            if let Err(e) = command.check_arity(&args) {
                writeln!(output, "{}", e)?;
                continue;
            }
            match manager.save() {
                Ok(()) => {
                    writeln!(output, "Good bye!")?;
                    return Ok(SessionEnd::Saved);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "save on exit failed");
                    writeln!(
                        output,
                        "{}\nChanges are kept in memory only. Retry `exit` to save again.",
                        e
                    )?;
                    continue;
                }
            }
        }

        tracing::debug!(?command, args = args.len(), "dispatching");
        match execute(manager, command, &args, today()) {
            Ok(reply) => {
                writeln!(output, "{}", reply.message)?;
                if reply.mutated
                    && let Err(e) = manager.save()
                {
                    tracing::warn!(error = %e, "autosave failed");
                    writeln!(output, "Warning: {}\nChanges are kept in memory only.", e)?;
                }
            }
            Err(e) if e.is_recoverable() => writeln!(output, "{}", e)?,
            Err(e) => return Err(e),
        }
    }
}

/// Applies one command to the store. `Exit` is rejected here: only the
/// session loop may save and say goodbye.
pub fn execute(
    manager: &mut ContactManager,
    command: Command,
    args: &[&str],
    today: NaiveDate,
) -> Result<Reply, AppError> {
    command.check_arity(args)?;

    match command {
        Command::Hello => Ok(Reply::read("How can I help you?")),

        Command::Add => {
            let name = args[0];
            let phone = args.get(1).copied();
            let (_, outcome) = manager.add(name, phone)?;

            Ok(match (outcome, phone) {
                (AddOutcome::Created, _) => Reply::write("Contact added."),
                (AddOutcome::PhoneAdded, _) => Reply::write("Phone added to existing contact."),
                (AddOutcome::Unchanged, Some(phone)) => Reply::read(format!(
                    "Phone {} is already recorded for contact '{}'.",
                    phone, name
                )),
                (AddOutcome::Unchanged, None) => {
                    Reply::read(format!("Contact '{}' already exists.", name))
                }
            })
        }

        Command::Change => {
            let (name, old, new) = (args[0], args[1], args[2]);
            manager.update_phone(name, old, new)?;
            Ok(Reply::write(format!(
                "Phone number updated for contact '{}'.",
                name
            )))
        }

        Command::RemovePhone => {
            let (name, phone) = (args[0], args[1]);
            manager.remove_phone(name, phone)?;
            Ok(Reply::write(format!(
                "Phone {} removed from contact '{}'.",
                phone, name
            )))
        }

        Command::Phone => {
            let contact = manager.get(args[0])?;
            if contact.phones.is_empty() {
                return Ok(Reply::read(format!(
                    "No phone numbers found for contact '{}'.",
                    contact.name
                )));
            }
            Ok(Reply::read(format!(
                "Phone numbers for '{}': {}",
                contact.name,
                contact.phones.join(", ")
            )))
        }

        Command::All => {
            let contacts = manager.list_all();
            if contacts.is_empty() {
                return Ok(Reply::read("Address book is empty."));
            }
            let lines: Vec<String> = contacts.iter().map(|c| c.to_string()).collect();
            Ok(Reply::read(lines.join("\n")))
        }

        Command::AddBirthday => {
            let (_, replaced) = manager.add_birthday(args[0], args[1])?;
            Ok(Reply::write(if replaced {
                "Birthday updated."
            } else {
                "Birthday added."
            }))
        }

        Command::ShowBirthday => {
            let contact = manager.get(args[0])?;
            Ok(Reply::read(match contact.birthday {
                Some(birthday) => format!("{}: {}", contact.name, format_date(birthday)),
                None => format!("Birthday for '{}' is not set.", contact.name),
            }))
        }

        Command::Birthdays => {
            let window = match args.first() {
                Some(days) => parse_window(days)?,
                None => DEFAULT_BIRTHDAY_WINDOW,
            };
            let upcoming = manager.upcoming_birthdays(today, window);
            if upcoming.is_empty() {
                return Ok(Reply::read("No upcoming birthdays."));
            }

            let mut message = String::from("Upcoming Birthdays:");
            for (contact, date) in upcoming {
                message.push_str(&format!(
                    "\n{}: {} ({})",
                    contact.name,
                    format_date(date),
                    describe_offset(days_until(today, date))
                ));
            }
            Ok(Reply::read(message))
        }

        Command::Delete => {
            let removed = manager.delete(args[0])?;
            Ok(Reply::write(format!(
                "Contact '{}' has been deleted.",
                removed.name
            )))
        }

        Command::Help => {
            let mut message = String::from("Available commands:");
            for command in Command::ALL {
                message.push_str(&format!("\n  {}", command.usage()));
            }
            message.push_str(&format!("\n{}", INTERRUPT_NOTE));
            Ok(Reply::read(message))
        }

        Command::Exit => Err(AppError::ParseCommand(
            "exit outside of an interactive session".to_string(),
        )),
    }
}

fn parse_window(days: &str) -> Result<i64, AppError> {
    match days.parse::<i64>() {
        Ok(days) if (0..=MAX_BIRTHDAY_WINDOW).contains(&days) => Ok(days),
        _ => Err(AppError::Validation(format!(
            "Days must be a whole number between 0 and {}",
            MAX_BIRTHDAY_WINDOW
        ))),
    }
}

fn describe_offset(days: i64) -> String {
    match days {
        0 => "today".to_string(),
        1 => "in 1 day".to_string(),
        n => format!("in {} days", n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ContactStore, MemStorage};
    use std::io::Cursor;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn manager() -> Result<ContactManager, AppError> {
        ContactManager::new(Box::new(MemStorage::new()))
    }

    fn run_lines(manager: &mut ContactManager, lines: &str) -> Result<(String, SessionEnd), AppError> {
        run_bytes(manager, lines.as_bytes())
    }

    fn run_bytes(manager: &mut ContactManager, bytes: &[u8]) -> Result<(String, SessionEnd), AppError> {
        let mut output = Vec::new();
        let end = run_session(
            manager,
            Cursor::new(bytes.to_vec()),
            &mut output,
            || date(2026, 6, 5),
        )?;
        Ok((String::from_utf8_lossy(&output).into_owned(), end))
    }

    struct BrokenStorage;

    impl ContactStore for BrokenStorage {
        fn load(&self) -> Result<Vec<crate::prelude::Contact>, AppError> {
            Ok(Vec::new())
        }

        fn save(&self, _contacts: &[crate::prelude::Contact]) -> Result<(), AppError> {
            Err(AppError::Persistence("disk is read-only".to_string()))
        }

        fn get_medium(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn john_birthday_is_listed_today() -> Result<(), AppError> {
        let mut store = manager()?;

        let (output, end) = run_lines(
            &mut store,
            "add John\nadd-birthday John 05.06.2000\nbirthdays\nexit\n",
        )?;

        assert_eq!(end, SessionEnd::Saved);
        assert!(output.contains("Contact added."));
        assert!(output.contains("Birthday added."));
        assert!(output.contains("Upcoming Birthdays:\nJohn: 05.06.2026 (today)"));
        assert!(output.contains("Good bye!"));
        Ok(())
    }

    #[test]
    fn ann_change_without_phone_is_not_found() -> Result<(), AppError> {
        let mut store = manager()?;

        let (output, _) = run_lines(&mut store, "add Ann\nchange Ann 123 456\n")?;

        assert!(output.contains("Phone 123 of contact 'Ann' not found"));
        assert!(store.get("Ann")?.phones.is_empty());
        Ok(())
    }

    #[test]
    fn unknown_command_keeps_the_loop_running() -> Result<(), AppError> {
        let mut store = manager()?;

        let (output, end) = run_lines(&mut store, "fly\nHELLO\nclose\n")?;

        assert!(output.contains("Invalid command."));
        assert!(output.contains("How can I help you?"));
        assert_eq!(end, SessionEnd::Saved);
        Ok(())
    }

    #[test]
    fn end_of_input_saves() -> Result<(), AppError> {
        let storage = MemStorage::new();
        let mut store = ContactManager::new(Box::new(storage))?;

        let (output, end) = run_lines(&mut store, "add Uche 0123456789")?;

        assert_eq!(end, SessionEnd::Saved);
        assert!(output.ends_with("Good bye!\n"));
        assert_eq!(store.storage.load()?.len(), 1);
        Ok(())
    }

    #[test]
    fn line_that_is_not_utf8_is_an_invalid_command() -> Result<(), AppError> {
        let mut store = manager()?;

        let (output, end) = run_bytes(&mut store, b"add Ann\n\xff\xfe\nhello\nexit\n")?;

        assert_eq!(end, SessionEnd::Saved);
        assert!(output.contains("Contact added."));
        assert!(output.contains("Invalid command."));
        assert!(output.contains("How can I help you?"));
        assert!(output.ends_with("Good bye!\n"));
        assert_eq!(store.storage.load()?.len(), 1);
        Ok(())
    }

    #[test]
    fn execute_refuses_exit() -> Result<(), AppError> {
        let mut store = manager()?;

        let result = execute(&mut store, Command::Exit, &[], date(2026, 1, 1));

        assert!(matches!(result, Err(AppError::ParseCommand(_))));
        Ok(())
    }

    #[test]
    fn help_warns_about_interrupts() -> Result<(), AppError> {
        let mut store = manager()?;

        let reply = execute(&mut store, Command::Help, &[], date(2026, 1, 1))?;

        assert!(reply.message.contains("add <name> [phone]"));
        assert!(reply.message.contains(INTERRUPT_NOTE));
        assert!(!reply.mutated);
        Ok(())
    }

    #[test]
    fn failed_save_keeps_session_open() -> Result<(), AppError> {
        let mut store = ContactManager::new(Box::new(BrokenStorage))?;

        let (output, end) = run_lines(&mut store, "add Uche\nphone Uche\nexit\n")?;

        assert!(output.contains("Changes are kept in memory only."));
        assert!(output.contains("No phone numbers found for contact 'Uche'."));
        assert!(output.contains("Retry `exit` to save again."));
        assert_eq!(end, SessionEnd::Unsaved);
        assert_eq!(store.list_all().len(), 1);
        Ok(())
    }

    #[test]
    fn execute_reports_usage_on_bad_arity() -> Result<(), AppError> {
        let mut store = manager()?;

        let err = execute(&mut store, Command::Change, &["Ann"], date(2026, 1, 1)).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Validation failed: Usage: change <name> <old_phone> <new_phone>"
        );
        Ok(())
    }

    #[test]
    fn execute_phone_and_all() -> Result<(), AppError> {
        let mut store = manager()?;
        let today = date(2026, 1, 1);

        execute(&mut store, Command::Add, &["John", "1234567890"], today)?;
        let reply = execute(&mut store, Command::Add, &["John", "5555555555"], today)?;
        assert_eq!(reply, Reply::write("Phone added to existing contact."));

        let reply = execute(&mut store, Command::Add, &["John", "5555555555"], today)?;
        assert!(!reply.mutated);

        let reply = execute(&mut store, Command::Phone, &["John"], today)?;
        assert_eq!(
            reply.message,
            "Phone numbers for 'John': 1234567890, 5555555555"
        );

        execute(&mut store, Command::Add, &["Ann"], today)?;
        let reply = execute(&mut store, Command::All, &[], today)?;
        assert_eq!(
            reply.message,
            "Contact: John, Phones: 1234567890; 5555555555\nContact: Ann, Phones: "
        );
        Ok(())
    }

    #[test]
    fn show_birthday_and_custom_window() -> Result<(), AppError> {
        let mut store = manager()?;
        let today = date(2026, 6, 1);

        execute(&mut store, Command::Add, &["Ann"], today)?;
        let reply = execute(&mut store, Command::ShowBirthday, &["Ann"], today)?;
        assert_eq!(reply.message, "Birthday for 'Ann' is not set.");

        execute(&mut store, Command::AddBirthday, &["Ann", "20.06.1995"], today)?;
        let reply = execute(&mut store, Command::ShowBirthday, &["Ann"], today)?;
        assert_eq!(reply.message, "Ann: 20.06.1995");

        let reply = execute(&mut store, Command::Birthdays, &[], today)?;
        assert_eq!(reply.message, "No upcoming birthdays.");

        let reply = execute(&mut store, Command::Birthdays, &["30"], today)?;
        assert_eq!(reply.message, "Upcoming Birthdays:\nAnn: 20.06.2026 (in 19 days)");

        assert!(matches!(
            execute(&mut store, Command::Birthdays, &["-1"], today),
            Err(AppError::Validation(_))
        ));
        Ok(())
    }

    #[test]
    fn delete_and_remove_phone() -> Result<(), AppError> {
        let mut store = manager()?;
        let today = date(2026, 1, 1);

        execute(&mut store, Command::Add, &["Ann", "1234567890"], today)?;
        let reply = execute(&mut store, Command::RemovePhone, &["Ann", "1234567890"], today)?;
        assert!(reply.mutated);
        assert!(store.get("Ann")?.phones.is_empty());

        let reply = execute(&mut store, Command::Delete, &["Ann"], today)?;
        assert_eq!(reply.message, "Contact 'Ann' has been deleted.");
        assert!(matches!(
            execute(&mut store, Command::Delete, &["Ann"], today),
            Err(AppError::NotFound(_))
        ));
        Ok(())
    }
}
