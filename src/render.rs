//! Transcript rendering.
//!
//! Rendering is a pure function of the message sequence: each message gets a
//! [`SenderStyle`] derived from its sender and is printed in order. Nothing
//! here mutates session state.

use std::io::{self, Stdout, Write};

use crate::types::{FEEDBACK_AGENT_SENDER, Message, USER_SENDER};

/// ANSI escape code for bold text (used for sender labels).
const ANSI_BOLD: &str = "\x1b[1m";

/// ANSI escape code for dim text (used for progress notes).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for blue text (used for the user's own turns).
const ANSI_BLUE: &str = "\x1b[34m";

/// ANSI escape code for green text (used for the feedback tutor).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for yellow text (used for courtroom agents).
const ANSI_YELLOW: &str = "\x1b[33m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// How a message is presented, decided by who sent it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SenderStyle {
    /// The user's own turn.
    User,
    /// One of the backend's role-playing agents.
    Agent,
    /// The tutor that gives feedback and analysis.
    FeedbackAgent,
}

impl SenderStyle {
    /// Classifies a sender label.
    pub fn for_sender(sender: &str) -> Self {
        match sender {
            USER_SENDER => SenderStyle::User,
            FEEDBACK_AGENT_SENDER => SenderStyle::FeedbackAgent,
            _ => SenderStyle::Agent,
        }
    }

    fn color(&self) -> &'static str {
        match self {
            SenderStyle::User => ANSI_BLUE,
            SenderStyle::Agent => ANSI_YELLOW,
            SenderStyle::FeedbackAgent => ANSI_GREEN,
        }
    }
}

/// Formats one message as `Sender: content`, styling the label when
/// `use_color` is set.
pub fn format_message(message: &Message, use_color: bool) -> String {
    if use_color {
        let color = SenderStyle::for_sender(&message.sender).color();
        format!(
            "{ANSI_BOLD}{color}{}:{ANSI_RESET} {}",
            message.sender, message.content
        )
    } else {
        format!("{}: {}", message.sender, message.content)
    }
}

/// Trait for rendering chat output.
pub trait Renderer: Send {
    /// Print one transcript message.
    fn print_message(&mut self, message: &Message);

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);

    /// Called before a request is sent, while the user waits.
    fn start_pending(&mut self, note: &str);

    /// Called once the request has finished, successfully or not.
    fn finish_pending(&mut self);
}

/// Renders every message, in order.
pub fn render_messages<'a, I>(messages: I, renderer: &mut dyn Renderer)
where
    I: IntoIterator<Item = &'a Message>,
{
    for message in messages {
        renderer.print_message(message);
    }
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer {
    stdout: Stdout,
    use_color: bool,
    pending: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self {
            stdout: io::stdout(),
            use_color,
            pending: false,
        }
    }

    /// Returns whether ANSI styling is enabled.
    pub fn use_color(&self) -> bool {
        self.use_color
    }

    fn flush(&mut self) {
        let _ = self.stdout.flush();
    }

    fn clear_pending(&mut self) {
        if self.pending {
            if self.use_color {
                print!("\r\x1b[2K");
            } else {
                println!();
            }
            self.pending = false;
        }
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for PlainTextRenderer {
    fn print_message(&mut self, message: &Message) {
        self.clear_pending();
        println!("{}", format_message(message, self.use_color));
        self.flush();
    }

    fn print_error(&mut self, error: &str) {
        self.clear_pending();
        if self.use_color {
            eprintln!("{ANSI_RED}Error:{ANSI_RESET} {error}");
        } else {
            eprintln!("Error: {error}");
        }
    }

    fn print_info(&mut self, info: &str) {
        self.clear_pending();
        println!("{info}");
    }

    fn start_pending(&mut self, note: &str) {
        self.clear_pending();
        if self.use_color {
            print!("{ANSI_DIM}{note}{ANSI_RESET}");
        } else {
            print!("{note}");
        }
        self.pending = true;
        self.flush();
    }

    fn finish_pending(&mut self) {
        self.clear_pending();
        self.flush();
    }
}
