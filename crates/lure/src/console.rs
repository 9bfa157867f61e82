//! Full-screen console view, redrawn after every cycle.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Print, PrintStyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};

use lure_core::render::report_sections;
use lure_core::tables::RateTables;

/// Clears the terminal and prints the header bar followed by the report.
pub(crate) fn draw(out: &mut impl Write, header: &str, tables: &RateTables) -> io::Result<()> {
    queue!(
        out,
        Clear(ClearType::All),
        MoveTo(0, 0),
        PrintStyledContent(header.black().on_green().bold()),
        Print("\n\n")
    )?;
    for (title, body) in report_sections(tables) {
        queue!(
            out,
            PrintStyledContent(title.as_str().bold()),
            Print("\n"),
            Print(body),
            Print("\n")
        )?;
    }
    out.flush()
}
