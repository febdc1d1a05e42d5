use std::io::Write;

use genlab_contracts::request::GenerationMode;
use genlab_contracts::sink::ResultSink;

/// Terminal display: progress redraws one status line on `err`, the media URL
/// lands on `out` by itself, errors go to `err` prefixed like fatal CLI errors.
pub struct ConsoleSink<O: Write, E: Write> {
    out: O,
    err: E,
    line_open: bool,
}

impl<O: Write, E: Write> ConsoleSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            line_open: false,
        }
    }

    fn close_line(&mut self) {
        if self.line_open {
            let _ = writeln!(self.err);
            self.line_open = false;
        }
    }

    #[cfg(test)]
    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> ResultSink for ConsoleSink<O, E> {
    fn on_progress(&mut self, percent: u8) {
        let _ = write!(self.err, "\rgenerating... {percent:>3}%");
        let _ = self.err.flush();
        self.line_open = true;
    }

    fn on_success(&mut self, media_url: &str, mode: GenerationMode) {
        self.close_line();
        log::debug!("{mode} ready");
        let _ = writeln!(self.out, "{media_url}");
        let _ = self.out.flush();
    }

    fn on_error(&mut self, message: &str) {
        self.close_line();
        let _ = writeln!(self.err, "genlab error: {message}");
        let _ = self.err.flush();
    }
}
