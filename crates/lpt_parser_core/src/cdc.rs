//! CDC NOS carriage control
//!
//! Same deferred-line scheme as ASA (see [`crate::AsaScanner`]) with the NOS
//! format effectors on top:
//!
//! - `'8'` - new page, like `'1'`
//! - `'2'` - skip to the last line of the form minus two (line 64)
//! - `'3'` - page eject
//! - `'4'`, `'5'`, `'6'` - skip forward 5, 4 and 3 lines
//! - `'7'` - triple space, like `'-'`
//! - `'Q'`, `'R'` - auto page eject select/clear, only accepted on the first
//!   line; later they single space and are reported as unknown
//!
//! Relative skips need to know where we are on the form, so the scanner keeps
//! a forms position in `0..=66` that advances with every input line and wraps
//! to 0 past the end of the form.

use crate::{
    ASA_DOUBLE_SPACE, ASA_NEW_PAGE, ASA_OVERSTRIKE, ASA_SINGLE_SPACE, ASA_TRIPLE_SPACE, CDC_AUTO_EJECT_OFF, CDC_AUTO_EJECT_ON, CDC_BOTTOM_LINE,
    CDC_NEW_PAGE, CDC_PAGE_EJECT, CDC_SKIP_3, CDC_SKIP_4, CDC_SKIP_5, CDC_SKIP_TO_BOTTOM, CDC_TRIPLE_SPACE, CarriageControlScanner, FORM_LENGTH,
    LineBuffer, ParseError, PrinterHandler, ScannerConfig, report,
};

pub struct CdcScanner {
    config: ScannerConfig,
    line_number: usize,
    form_line: i32,
    pending: LineBuffer<char>,
}

impl CdcScanner {
    pub fn new(config: ScannerConfig) -> Self {
        Self {
            config,
            line_number: 0,
            form_line: 0,
            pending: LineBuffer::new(),
        }
    }

    /// Current line on the form, `0..=66`.
    pub fn forms_position(&self) -> i32 {
        self.form_line
    }

    fn flush(&mut self, linefeed: bool, sink: &mut dyn PrinterHandler) {
        let text = self.pending.take_string();
        if self.config.trace {
            log::trace!("[{}] (lf: {}, form line: {}) cdc line: {}", self.config.name, linefeed, self.form_line, text);
        }
        sink.add_line(&text, linefeed);
    }

    fn blank_lines(&mut self, count: i32, sink: &mut dyn PrinterHandler) {
        for _ in 0..count {
            sink.add_line("", true);
        }
        self.form_line = (self.form_line + count).min(FORM_LENGTH);
    }

    /// Vertical tab: feeds blank lines until the form reaches `target`.
    /// Only moves forward and ignores targets past the end of the form.
    fn jump_to_line(&mut self, target: i32, sink: &mut dyn PrinterHandler) {
        if target <= self.form_line || target > FORM_LENGTH {
            return;
        }
        while self.form_line < target {
            sink.add_line("", true);
            self.form_line += 1;
        }
    }

    fn new_page(&mut self, sink: &mut dyn PrinterHandler) {
        sink.page_break();
        self.form_line = 0;
    }
}

impl CarriageControlScanner for CdcScanner {
    fn config(&self) -> &ScannerConfig {
        &self.config
    }

    fn line(&mut self, control: char, text: &str, sink: &mut dyn PrinterHandler) {
        self.line_number += 1;
        self.form_line += 1;
        if self.form_line > FORM_LENGTH {
            self.form_line = 0;
        }

        if self.line_number == 1 {
            match control {
                ASA_SINGLE_SPACE | ASA_NEW_PAGE | ASA_OVERSTRIKE | CDC_NEW_PAGE | CDC_PAGE_EJECT | CDC_AUTO_EJECT_OFF | CDC_AUTO_EJECT_ON => {
                    self.form_line = 0;
                }
                ASA_DOUBLE_SPACE => self.blank_lines(1, sink),
                ASA_TRIPLE_SPACE | CDC_TRIPLE_SPACE => self.blank_lines(2, sink),
                _ => report(&self.config.name, sink, ParseError::UnknownControl { control, line: 1 }),
            }
            self.pending.fill_from(text);
            return;
        }

        match control {
            ASA_SINGLE_SPACE => self.flush(true, sink),
            ASA_NEW_PAGE | CDC_NEW_PAGE => {
                self.flush(true, sink);
                self.new_page(sink);
            }
            ASA_DOUBLE_SPACE => {
                self.flush(true, sink);
                self.blank_lines(1, sink);
            }
            CDC_SKIP_TO_BOTTOM => {
                self.flush(true, sink);
                self.jump_to_line(CDC_BOTTOM_LINE, sink);
            }
            CDC_PAGE_EJECT => {
                if self.line_number > 2 {
                    self.flush(true, sink);
                    sink.page_break();
                    self.new_page(sink);
                } else {
                    // Eject right after the first line: the job already starts on a
                    // fresh page. The pending first line is replaced without being
                    // printed and the form position gives back the slot it used.
                    self.form_line -= 1;
                }
            }
            CDC_SKIP_5 => {
                self.flush(true, sink);
                self.jump_to_line(self.form_line + 5, sink);
            }
            CDC_SKIP_4 => {
                self.flush(true, sink);
                self.jump_to_line(self.form_line + 4, sink);
            }
            CDC_SKIP_3 => {
                self.flush(true, sink);
                self.jump_to_line(self.form_line + 3, sink);
            }
            ASA_TRIPLE_SPACE | CDC_TRIPLE_SPACE => {
                self.flush(true, sink);
                self.blank_lines(2, sink);
            }
            ASA_OVERSTRIKE => {
                self.flush(false, sink);
                self.form_line = (self.form_line - 1).max(0);
            }
            _ => {
                self.flush(true, sink);
                report(
                    &self.config.name,
                    sink,
                    ParseError::UnknownControl {
                        control,
                        line: self.line_number,
                    },
                );
            }
        }
        self.pending.fill_from(text);
    }

    fn finish(&mut self, sink: &mut dyn PrinterHandler) {
        self.flush(true, sink);
        sink.end_of_job(&self.config.job_name);
        self.line_number = 0;
        self.form_line = 0;
    }
}
