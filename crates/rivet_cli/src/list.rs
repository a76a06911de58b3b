//! The `rivet list` command.

use crate::designs::DESIGNS;
use crate::GlobalArgs;

/// Prints every bundled design with its summary.
pub fn run(global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    if global.quiet {
        return Ok(0);
    }
    print!("{}", listing());
    Ok(0)
}

fn listing() -> String {
    let width = DESIGNS.iter().map(|d| d.name.len()).max().unwrap_or(0);
    DESIGNS
        .iter()
        .map(|d| format!("{:<width$}  {}\n", d.name, d.summary))
        .collect()
}
