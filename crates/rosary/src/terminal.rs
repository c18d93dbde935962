//! Terminal rendering and haptics

use rosary_api::{AnimationInputs, Frame, PrayerContent, ProgressView, Screen, SessionStatus};
use rosary_host_api::{AnimationDriver, HapticNotifier, HostResult, Renderer};
use rosary_util::{EpochMs, countdown_seconds};
use std::io::{IsTerminal, Write};
use std::sync::Mutex;

const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
const RAMP_WIDTH: usize = 24;

/// Paint a frame as plain text
pub fn render_frame(frame: &Frame, now: EpochMs, dev_controls: bool) -> String {
    let mut out = String::new();

    match &frame.screen {
        Screen::Start => {
            out.push_str("Anglican Rosary\n\n");
            out.push_str("[Enter] Start\n");
        }
        Screen::Load { countdown_secs, .. } => {
            out.push_str(&format!("Next in {}s\n", countdown_secs));
        }
        Screen::Prayer { node, view } => {
            out.push_str(&format!("{}\n{}\n\n", node.meta, node.title));
            push_content(&mut out, &view.content);
            out.push('\n');
            out.push_str(&footer(view, now));
            out.push('\n');
        }
        Screen::Finale => {
            out.push_str("Amen.\n");
        }
    }

    if let Some(index) = frame.node_index {
        out.push_str(&format!("\n{} / {}\n", index + 1, frame.node_count));
    }
    if dev_controls && frame.status == SessionStatus::InProgress {
        out.push_str("(n: skip, r: back to start)\n");
    }

    out
}

fn push_content(out: &mut String, content: &PrayerContent) {
    match content {
        PrayerContent::Plain { text } => {
            out.push_str(text);
            out.push('\n');
        }
        PrayerContent::Stanza { index, total, text } => {
            out.push_str(text);
            out.push_str(&format!("\n\n({}/{})\n", index + 1, total));
        }
        PrayerContent::Vr {
            versicle, response, ..
        } => {
            out.push_str(versicle);
            out.push('\n');
            if let Some(response) = response {
                out.push_str(response);
                out.push('\n');
            }
        }
    }
}

fn footer(view: &ProgressView, now: EpochMs) -> String {
    if view.capabilities.can_progress {
        "[Enter] Continue".to_string()
    } else if view.capabilities.can_advance {
        "[Enter] Next".to_string()
    } else {
        let remaining = view.advance_unlocks_at.map_or(0, |at| at - now);
        format!("Next in {}s", countdown_seconds(remaining))
    }
}

/// Ramp bar drawn under load screens
pub fn ramp_bar(inputs: &AnimationInputs) -> String {
    let filled = (inputs.ramp * RAMP_WIDTH as f64).round() as usize;
    let filled = filled.min(RAMP_WIDTH);
    format!("[{}{}]", "#".repeat(filled), " ".repeat(RAMP_WIDTH - filled))
}

/// Renderer writing to a terminal (or any writer)
pub struct TerminalRenderer<W: Write + Send> {
    out: Mutex<W>,
    dev_controls: bool,
    clear: bool,
}

impl TerminalRenderer<std::io::Stdout> {
    pub fn stdout(dev_controls: bool) -> Self {
        let stdout = std::io::stdout();
        let clear = stdout.is_terminal();
        Self::new(stdout, dev_controls, clear)
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    /// `clear` wipes the screen before each frame
    pub fn new(out: W, dev_controls: bool, clear: bool) -> Self {
        Self {
            out: Mutex::new(out),
            dev_controls,
            clear,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().unwrap()
    }

    /// Print a message below the current screen
    pub fn notice(&self, message: &str) -> HostResult<()> {
        let mut out = self.out.lock().unwrap();
        writeln!(out, "{}", message)?;
        out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> Renderer for TerminalRenderer<W> {
    fn render(&self, frame: &Frame) -> HostResult<()> {
        let text = render_frame(frame, rosary_util::now_epoch_ms(), self.dev_controls);
        let mut out = self.out.lock().unwrap();
        if self.clear {
            write!(out, "{}", CLEAR_SCREEN)?;
        }
        write!(out, "{}", text)?;
        out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> AnimationDriver for TerminalRenderer<W> {
    fn update(&self, inputs: &AnimationInputs) -> HostResult<()> {
        if inputs.status != SessionStatus::InProgress || inputs.ramp <= 0.0 {
            return Ok(());
        }
        let mut out = self.out.lock().unwrap();
        write!(out, "\r{}", ramp_bar(inputs))?;
        out.flush()?;
        Ok(())
    }
}

/// Light impact rendered as the terminal bell
#[derive(Debug, Default)]
pub struct BellHaptics;

impl HapticNotifier for BellHaptics {
    fn light_impact(&self) -> HostResult<()> {
        let mut err = std::io::stderr();
        write!(err, "\x07")?;
        err.flush()?;
        Ok(())
    }

    fn is_available(&self) -> bool {
        std::io::stderr().is_terminal()
    }
}
