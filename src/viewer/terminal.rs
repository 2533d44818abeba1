//! Terminal I/O layer: raw mode, screen drawing, status bar, OSC 52.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    style::{self, Stylize},
    terminal,
};
use std::io::{self, Write, stdout};

use super::state::{Layout, LineStyle, ScreenLine};
use crate::location::Location;

// ---------------------------------------------------------------------------
// RawGuard — restores raw mode / alternate screen / cursor on drop
// ---------------------------------------------------------------------------

pub(super) struct RawGuard {
    cleaned: bool,
}

impl RawGuard {
    pub(super) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout().execute(terminal::EnterAlternateScreen)?;
        stdout().execute(cursor::Hide)?;
        Ok(Self { cleaned: false })
    }

    pub(super) fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let mut out = stdout();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Truncate to at most `cols` characters and pad with spaces to exactly `cols`.
fn fit(text: &str, cols: usize) -> String {
    let display: String = text.chars().take(cols).collect();
    let pad = cols.saturating_sub(display.chars().count());
    format!("{display}{:pad$}", "")
}

/// Draw the content rows (everything above the status bar).
pub(super) fn draw_screen(layout: &Layout, lines: &[ScreenLine]) -> io::Result<()> {
    let mut out = stdout();
    let cols = layout.cols as usize;

    for (row, line) in lines.iter().enumerate() {
        out.queue(cursor::MoveTo(0, row as u16))?;
        let text = fit(&line.text, cols);
        match line.style {
            LineStyle::Title => write!(out, "{}", text.bold())?,
            LineStyle::Author => write!(out, "{}", text.italic())?,
            LineStyle::Date | LineStyle::Placeholder => write!(out, "{}", text.dark_grey())?,
            LineStyle::Separator => write!(out, "{}", text.dark_cyan())?,
            LineStyle::EntryTitle => write!(out, "{}", text.cyan())?,
            LineStyle::Preview => write!(out, "{}", text.grey())?,
            LineStyle::Body | LineStyle::Blank => write!(out, "{text}")?,
        }
    }
    out.queue(style::ResetColor)?;
    out.flush()
}

/// What the status bar shows besides the location.
pub(super) struct StatusInfo<'a> {
    pub location: &'a Location,
    pub loading: bool,
    pub can_back: bool,
    pub can_forward: bool,
    pub acc_peek: Option<u32>,
    pub flash: Option<&'a str>,
}

pub(super) fn status_text(info: &StatusInfo) -> String {
    let nav = match (info.can_back, info.can_forward) {
        (true, true) => " ◀▶",
        (true, false) => " ◀ ",
        (false, true) => "  ▶",
        (false, false) => "   ",
    };
    let loading = if info.loading { " | loading…" } else { "" };

    if let Some(msg) = info.flash {
        format!(" {}{nav}{loading} | {msg}", info.location)
    } else if let Some(n) = info.acc_peek {
        format!(" {}{nav}{loading} | :{n}_", info.location)
    } else {
        format!(
            " {}{nav}{loading} | [r:random /:search No:open NO:browser H/L:back/fwd y:yank ::cmd q:quit]",
            info.location
        )
    }
}

/// Draw the status bar on the last terminal row.
pub(super) fn draw_status_bar(layout: &Layout, info: &StatusInfo) -> io::Result<()> {
    let mut out = stdout();
    out.queue(cursor::MoveTo(0, layout.status_row))?;
    let padded = fit(&status_text(info), layout.cols as usize);
    write!(out, "{}", padded.on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

/// Draw a line-input prompt (`/query_` or `:command_`) on the status row.
pub(super) fn draw_prompt_bar(layout: &Layout, prefix: char, input: &str) -> io::Result<()> {
    let mut out = stdout();
    out.queue(cursor::MoveTo(0, layout.status_row))?;
    let padded = fit(&format!("{prefix}{input}_"), layout.cols as usize);
    write!(out, "{}", padded.on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

/// Send text to the system clipboard via OSC 52.
pub(super) fn send_osc52(text: &str) -> io::Result<()> {
    let encoded = BASE64.encode(text.as_bytes());
    let mut out = stdout();
    write!(out, "\x1b]52;c;{encoded}\x1b\\")?;
    out.flush()
}

pub(super) fn check_tty() -> anyhow::Result<()> {
    use std::io::IsTerminal;
    // Only stdout matters: crossterm's `use-dev-tty` reads keys from /dev/tty.
    if !io::stdout().is_terminal() {
        anyhow::bail!(
            "poemview viewer requires an interactive terminal.\n\
             \n\
             To print a poem instead, use: poemview show [POEM]"
        );
    }
    Ok(())
}
