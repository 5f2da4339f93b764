//! Activity log on stdout: timestamped lines, upper-cased banners, and a
//! countdown that rewrites itself in place.

use std::io::{self, Write};

use chrono::Local;
use harvest_core::{AppViewModel, Notification, NotificationLevel};
use harvest_engine::{LogLine, LogStyle};

const RULE_WIDTH: usize = 60;
const CLEAR_LINE: &str = "\r\x1b[2K";

pub struct Console<W: Write> {
    out: W,
    clock: Box<dyn Fn() -> String>,
    countdown_open: bool,
}

impl Console<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout(), Box::new(|| Local::now().format("%H:%M:%S").to_string()))
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, clock: Box<dyn Fn() -> String>) -> Self {
        Self {
            out,
            clock,
            countdown_open: false,
        }
    }

    pub fn log_line(&mut self, line: &LogLine) {
        match line.style {
            LogStyle::Plain => self.plain(&line.message),
            LogStyle::Header => self.header(&line.message),
            LogStyle::Countdown => self.countdown(&line.message, false),
            LogStyle::CountdownDone => self.countdown(&line.message, true),
        }
    }

    pub fn plain(&mut self, message: &str) {
        self.close_countdown();
        let stamp = (self.clock)();
        self.write(format!("[{stamp}] {message}\n"));
    }

    pub fn header(&mut self, message: &str) {
        self.close_countdown();
        let stamp = (self.clock)();
        let rule = "=".repeat(RULE_WIDTH);
        self.write(format!(
            "\n{rule}\n[{stamp}] {}\n{rule}\n",
            message.to_uppercase()
        ));
    }

    pub fn notify(&mut self, notification: &Notification) {
        self.close_countdown();
        let level = match notification.level {
            NotificationLevel::Info => "INFO",
            NotificationLevel::Warning => "WARNING",
            NotificationLevel::Error => "ERROR",
        };
        self.write(format!(
            "*** {level}: {} ***\n{}\n",
            notification.title, notification.message
        ));
    }

    pub fn status(&mut self, view: &AppViewModel) {
        self.close_countdown();
        let mut text = format!(
            "Stage: {:?}{}\nMetadata URL: {}\nFirst chapter URL: {}\nOutput directory: {}\nEntries: {} ({} chapters)\n",
            view.stage,
            if view.paused { " (paused)" } else { "" },
            or_unset(&view.metadata_url),
            or_unset(&view.chapter_url),
            view.output_dir,
            view.entries,
            view.chapters,
        );
        if let Some(title) = &view.last_title {
            text.push_str(&format!("Last entry: {title}\n"));
        }
        if let Some(path) = &view.last_document {
            text.push_str(&format!("Last PDF: {}\n", path.display()));
        }
        self.write(text);
    }

    pub fn raw(&mut self, text: &str) {
        self.close_countdown();
        self.write(text.to_string());
    }

    fn countdown(&mut self, message: &str, done: bool) {
        let stamp = (self.clock)();
        let end = if done { "\n" } else { "" };
        self.write(format!("{CLEAR_LINE}[{stamp}] {message}{end}"));
        self.countdown_open = !done;
    }

    fn close_countdown(&mut self) {
        if std::mem::take(&mut self.countdown_open) {
            self.write("\n".to_string());
        }
    }

    fn write(&mut self, text: String) {
        // A closed stdout leaves nowhere to report to.
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out
    }
}

fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "(not set)"
    } else {
        value
    }
}
