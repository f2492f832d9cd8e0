//! Colored terminal output for CLI progress messages.

use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Writes user-facing progress lines, honoring verbose and quiet modes.
///
/// Errors always print; everything else is suppressed by `quiet`, and
/// [`OutputManager::verbose`] lines only print with `verbose`.
#[derive(Debug, Clone, Copy)]
pub struct OutputManager {
    verbose: bool,
    quiet: bool,
    color: ColorChoice,
}

impl OutputManager {
    /// Creates an output manager. Colors follow the terminal.
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            color: ColorChoice::Auto,
        }
    }

    /// Whether verbose lines are printed.
    pub fn is_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    /// Plain informational line.
    pub fn info(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.print(&mut self.stdout(), None, false, "", message)
    }

    /// Warning line.
    pub fn warn(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.print(&mut self.stdout(), Some(Color::Yellow), true, "⚠ ", message)
    }

    /// Success line.
    pub fn success(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.print(&mut self.stdout(), Some(Color::Green), true, "✓ ", message)
    }

    /// Line only printed in verbose mode.
    pub fn verbose(&self, message: &str) -> io::Result<()> {
        if !self.is_verbose() {
            return Ok(());
        }
        self.print(&mut self.stdout(), Some(Color::White), false, "  ", message)
    }

    /// Step in progress.
    pub fn progress(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.print(&mut self.stdout(), Some(Color::Cyan), false, "→ ", message)
    }

    /// Section header.
    pub fn section(&self, title: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let mut stdout = self.stdout();
        writeln!(stdout)?;
        self.print(&mut stdout, Some(Color::Blue), true, "", title)?;
        writeln!(stdout, "{}", "─".repeat(title.chars().count()))
    }

    /// Indented detail line.
    pub fn indent(&self, message: &str) -> io::Result<()> {
        if self.quiet {
            return Ok(());
        }
        self.print(&mut self.stdout(), None, false, "    ", message)
    }

    fn stdout(&self) -> StandardStream {
        StandardStream::stdout(self.color)
    }

    fn print(
        &self,
        stream: &mut StandardStream,
        color: Option<Color>,
        bold: bool,
        prefix: &str,
        message: &str,
    ) -> io::Result<()> {
        stream.set_color(ColorSpec::new().set_fg(color).set_bold(bold))?;
        write!(stream, "{prefix}{message}")?;
        stream.reset()?;
        writeln!(stream)
    }
}

impl Default for OutputManager {
    fn default() -> Self {
        Self::new(false, false)
    }
}
