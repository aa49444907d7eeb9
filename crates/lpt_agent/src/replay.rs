use std::io::{self, Write};

use lpt_parser_core::PrinterHandler;

/// Prints a job as plain text. Overstruck lines are merged column by column,
/// pages are separated by form feeds.
pub struct PlainTextPrinter<W: Write> {
    out: W,
    overstrike: Vec<char>,
    error: Option<io::Error>,
}

impl<W: Write> PlainTextPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            overstrike: Vec::new(),
            error: None,
        }
    }

    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.out.flush()?;
        Ok(self.out)
    }

    fn write(&mut self, text: &str) {
        if self.error.is_none() {
            if let Err(err) = self.out.write_all(text.as_bytes()) {
                self.error = Some(err);
            }
        }
    }
}

impl<W: Write> PrinterHandler for PlainTextPrinter<W> {
    fn add_line(&mut self, line: &str, linefeed: bool) {
        for (i, ch) in line.chars().enumerate() {
            if i == self.overstrike.len() {
                self.overstrike.push(ch);
            } else if ch != ' ' {
                self.overstrike[i] = ch;
            }
        }
        if linefeed {
            let mut merged: String = self.overstrike.drain(..).collect();
            merged.truncate(merged.trim_end().len());
            merged.push('\n');
            self.write(&merged);
        }
    }

    fn page_break(&mut self) {
        self.write("\x0C");
    }

    fn end_of_job(&mut self, jobinfo: &str) {
        if !jobinfo.is_empty() {
            log::info!("end of job {}", jobinfo);
        }
    }
}

#[cfg(test)]
mod tests {
    use lpt_parser_core::{DirectiveLimits, read_directives};

    use super::*;

    #[test]
    fn merges_overstrikes() {
        let mut printer = PlainTextPrinter::new(Vec::new());
        let info = read_directives(&mut &b"L:TITLE\nO:ABC   \nO:   ___\nL:_\nP:\nL:END  \nJ:J1_X\n"[..], &mut printer, DirectiveLimits::default()).unwrap();
        assert_eq!(info, "J1_X");
        assert_eq!(String::from_utf8(printer.finish().unwrap()).unwrap(), "TITLE\n_BC___\n\x0CEND\n");
    }
}
