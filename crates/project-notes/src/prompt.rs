//! Interactive confirmation when no note folder is configured.

use std::io::{self, BufRead, Write};

const QUESTION: &str =
    "No folder is set for the project notes. Create them in the root of the vault? [y/N] ";

/// Ask whether to use the vault root. Anything but `y`/`yes` is a no.
pub fn confirm_use_root<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<bool> {
    output.write_all(QUESTION.as_bytes())?;
    output.flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}
