use std::fmt::Display;
use std::io::{BufRead, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Stylize, style};
use crossterm::terminal::{Clear, ClearType};

use crate::error::AppError;

const INPUT_MARKER: &str = "=> ";

#[derive(Debug, Clone, Copy)]
pub struct ConsoleStyle {
    pub color: bool,
    pub clear_screen: bool,
}

impl ConsoleStyle {
    pub fn plain() -> Self {
        Self {
            color: false,
            clear_screen: false,
        }
    }
}

/// Line-oriented request/response terminal. Every read consumes exactly one
/// line; end of input surfaces as [`AppError::InputClosed`].
pub struct Console<R, W> {
    reader: R,
    writer: W,
    style: ConsoleStyle,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(reader: R, writer: W, style: ConsoleStyle) -> Self {
        Self {
            reader,
            writer,
            style,
        }
    }

    /// Bytes that are not UTF-8 are replaced rather than rejected.
    pub fn read_line(&mut self) -> Result<String, AppError> {
        let mut buffer = Vec::new();
        if self.reader.read_until(b'\n', &mut buffer)? == 0 {
            return Err(AppError::InputClosed);
        }
        Ok(normalize_line(&String::from_utf8_lossy(&buffer)))
    }

    /// Prints the input marker and reads the answer.
    pub fn ask(&mut self) -> Result<String, AppError> {
        write!(self.writer, "{INPUT_MARKER}")?;
        self.writer.flush()?;
        self.read_line()
    }

    pub fn prompt(&mut self, question: &str) -> Result<String, AppError> {
        writeln!(self.writer)?;
        writeln!(self.writer, "{question}")?;
        self.ask()
    }

    /// Anything but `y`/`yes` declines.
    pub fn confirm(&mut self, question: &str) -> Result<bool, AppError> {
        let answer = self.prompt(&format!("{question} (y/n)"))?;
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }

    pub fn line(&mut self, text: impl Display) -> Result<(), AppError> {
        writeln!(self.writer, "{text}")?;
        Ok(())
    }

    pub fn blank(&mut self) -> Result<(), AppError> {
        writeln!(self.writer)?;
        Ok(())
    }

    pub fn heading(&mut self, text: impl Display) -> Result<(), AppError> {
        self.colored(text, Color::Cyan)
    }

    pub fn success(&mut self, text: impl Display) -> Result<(), AppError> {
        self.colored(text, Color::Green)
    }

    pub fn notice(&mut self, text: impl Display) -> Result<(), AppError> {
        self.colored(text, Color::Yellow)
    }

    pub fn failure(&mut self, text: impl Display) -> Result<(), AppError> {
        self.colored(format!("Error: {text}"), Color::Red)
    }

    pub fn clear(&mut self) -> Result<(), AppError> {
        if self.style.clear_screen {
            queue!(self.writer, Clear(ClearType::All), MoveTo(0, 0))?;
            self.writer.flush()?;
        }
        Ok(())
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn colored(&mut self, text: impl Display, color: Color) -> Result<(), AppError> {
        if self.style.color {
            writeln!(self.writer, "{}", style(text).with(color))?;
        } else {
            writeln!(self.writer, "{text}")?;
        }
        Ok(())
    }
}

/// Strips the line terminator (CRLF or LF) and surrounding whitespace.
pub fn normalize_line(raw: &str) -> String {
    raw.trim_end_matches(['\r', '\n']).trim().to_string()
}
