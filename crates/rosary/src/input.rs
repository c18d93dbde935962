//! Line commands read from stdin

/// A user gesture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start, reveal the next part, or move on
    Tap,
    /// Skip to the next screen (dev controls)
    Skip,
    /// Back to start (dev controls)
    Reset,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    /// Parse one input line. Developer commands are unknown unless enabled.
    pub fn parse(line: &str, dev_controls: bool) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "next" => Command::Tap,
            "n" | "skip" if dev_controls => Command::Skip,
            "r" | "reset" if dev_controls => Command::Reset,
            "h" | "?" | "help" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Help text listing the available commands
pub fn help_text(dev_controls: bool) -> String {
    let mut text = String::from("Enter: continue   q: quit   h: help");
    if dev_controls {
        text.push_str("\nn: skip to next screen   r: back to start");
    }
    text
}
