pub mod command;
pub mod run;

use crate::errors::AppError;
use std::io::{BufRead, Write};

pub use run::{Reply, SessionEnd, execute, run_app, run_session};

// OUTPUT FUNCTIONS
pub fn prompt<W: Write>(output: &mut W, text: &str) -> Result<(), AppError> {
    write!(output, "{}", text)?;
    output.flush()?;
    Ok(())
}

// INPUT FUNCTIONS
/// Reads one line. `None` once the input is exhausted.
/// Bytes that are not UTF-8 become U+FFFD so the line still reaches the parser.
pub fn get_input<R: BufRead>(input: &mut R) -> Result<Option<String>, AppError> {
    let mut buf = Vec::new();
    if input.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
}
