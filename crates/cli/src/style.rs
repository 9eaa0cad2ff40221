//! Terminal styling for svn-rebase output.

use std::fmt::Display;

use console::Style;

/// Green check mark line.
pub fn success(msg: impl Display) -> String {
    format!("{} {}", Style::new().green().apply_to("✓"), msg)
}

/// Red cross line.
pub fn error(msg: impl Display) -> String {
    format!("{} {}", Style::new().red().apply_to("✗"), msg)
}

/// Yellow warning line.
pub fn warn(msg: impl Display) -> String {
    format!("{} {}", Style::new().yellow().apply_to("⚠"), msg)
}

pub fn header(msg: impl Display) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

pub fn dim(msg: impl Display) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

/// A command the operator is expected to type.
pub fn command(cmd: impl Display) -> String {
    Style::new().cyan().bold().apply_to(cmd).to_string()
}
