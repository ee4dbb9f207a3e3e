//! Console feedback: leveled messages and progress bars.
//!
//! Messages are mirrored into `tracing` so a `--log-file` captures what the user saw on screen.

pub mod traits;

use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Write;
use std::time::Instant;

use console::Style;
use fieldx::fxstruct;
use indicatif::style::ProgressTracker;
use indicatif::MultiProgress;
use indicatif::ProgressBar;
use indicatif::ProgressState;
use indicatif::ProgressStyle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;
pub use traits::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MsgType {
    Debug,
    Info,
    Warn,
    Error,
}

impl Display for MsgType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MsgType::Debug => write!(f, "DEBUG"),
            MsgType::Info => write!(f, "INFO"),
            MsgType::Warn => write!(f, "WARN"),
            MsgType::Error => write!(f, "ERROR"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PStyle {
    /// Record counting bar for a load or generation stage.
    Main,
}

struct PerSecFmt;

impl ProgressTracker for PerSecFmt {
    fn clone_box(&self) -> Box<dyn ProgressTracker> {
        Box::new(PerSecFmt)
    }

    fn tick(&mut self, _state: &ProgressState, _now: Instant) {}

    fn reset(&mut self, _state: &ProgressState, _now: Instant) {}

    fn write(&self, state: &ProgressState, w: &mut dyn Write) {
        // "1234 rec/s"
        if let Err(err) = write!(w, "{:.0} rec/s", state.per_sec()) {
            debug!("Cannot render progress rate: {err}");
        }
    }
}

#[fxstruct(new(off), sync, builder)]
pub struct ProgressUI {
    #[fieldx(get(copy), default(false))]
    quiet: bool,

    #[fieldx(lazy, get, builder(off))]
    multi_progress: Option<MultiProgress>,

    #[fieldx(lazy, get(copy))]
    user_attended: bool,

    #[fieldx(lazy, private, get(clone))]
    progress_style_main: ProgressStyle,
}

impl ProgressUI {
    fn build_user_attended(&self) -> bool {
        !self.quiet && console::user_attended()
    }

    fn build_multi_progress(&self) -> Option<MultiProgress> {
        if self.user_attended() {
            Some(MultiProgress::new())
        }
        else {
            None
        }
    }

    #[inline(always)]
    fn build_progress_style_main(&self) -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{prefix:>14.bold}: [{elapsed_precise:.cyan}] {bar:30.cyan.on_240} {pos:>6}/{len:<6} {per_sec_short} {msg:.cyan}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .with_key("per_sec_short", PerSecFmt)
            .progress_chars("█▉▊▋▌▍▎▏ ")
    }

    pub fn message_style(&self, msg_type: MsgType) -> Style {
        match msg_type {
            MsgType::Debug => Style::new().magenta().for_stderr(),
            MsgType::Info => Style::new().green(),
            MsgType::Warn => Style::new().yellow().for_stderr(),
            MsgType::Error => Style::new().red().for_stderr(),
        }
    }

    fn _println(&self, msg_type: MsgType, msg: &str) {
        if self.quiet {
            return;
        }

        let prefix = self.message_style(msg_type).apply_to(format!("[{msg_type}]"));
        if matches!(msg_type, MsgType::Info) {
            println!("{prefix} {msg}");
        }
        else {
            eprintln!("{prefix} {msg}");
        }
    }

    pub fn print_message<S: ToString>(&self, msg_type: MsgType, msg: S) {
        let msg = msg.to_string();

        match msg_type {
            MsgType::Debug => debug!(target: "optiflow::ui", "{msg}"),
            MsgType::Info => info!(target: "optiflow::ui", "{msg}"),
            MsgType::Warn => warn!(target: "optiflow::ui", "{msg}"),
            MsgType::Error => error!(target: "optiflow::ui", "{msg}"),
        }

        if let Some(mp) = self.multi_progress().as_ref() {
            mp.suspend(|| {
                self._println(msg_type, &msg);
            })
        }
        else {
            self._println(msg_type, &msg);
        }
    }

    pub fn report_error<S: ToString>(&self, msg: S) {
        self.print_message(MsgType::Error, msg);
    }

    pub fn report_warn<S: ToString>(&self, msg: S) {
        self.print_message(MsgType::Warn, msg);
    }

    pub fn report_info<S: ToString>(&self, msg: S) {
        self.print_message(MsgType::Info, msg);
    }

    /// Prints a multi-line block, e.g. a rendered table, line by line.
    pub fn report_block<S: Display>(&self, block: S) {
        let block = block.to_string();
        for line in block.trim_end().lines() {
            self.report_info(line);
        }
    }

    pub fn progress_style(&self, style: PStyle) -> ProgressStyle {
        match style {
            PStyle::Main => self.progress_style_main(),
        }
    }

    /// A progress bar for `len` items labelled with `prefix`. `None` when nobody watches the terminal.
    pub fn acquire_progress<S: Into<String>>(&self, style: PStyle, prefix: S, len: u64) -> Option<ProgressBar> {
        let mp = self.multi_progress();

        if mp.is_none() {
            return None;
        }

        let style = self.progress_style(style);
        let pb = mp.maybe_add(ProgressBar::new(len).with_style(style));
        pb.maybe_set_prefix(prefix.into());
        pb
    }

    pub fn remove(&self, pb: Option<ProgressBar>) {
        self.multi_progress().maybe_remove(pb);
    }

    pub fn finish(&self) {
        if let Some(mp) = self.multi_progress().as_ref() {
            if let Err(err) = mp.clear() {
                debug!("Cannot clear progress bars: {err}");
            }
        }
    }
}

impl Debug for ProgressUI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressUI").field("quiet", &self.quiet).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_ui_has_no_bars() {
        let ui = ProgressUI::builder().quiet(true).build().unwrap();
        assert!(ui.quiet());
        assert!(!ui.user_attended());
        assert!(ui.acquire_progress(PStyle::Main, "products", 10).is_none());
        ui.report_info("not printed");
    }

    #[test]
    fn msg_type_labels() {
        assert_eq!(MsgType::Warn.to_string(), "WARN");
        assert!(MsgType::Error > MsgType::Info);
    }

    #[test]
    fn finish_without_bars_is_quiet() {
        let ui = ProgressUI::builder().quiet(true).build().unwrap();
        ui.finish();
        ui.remove(None);
    }
}
