//! Command line parsing and dispatch.
//!
//! A line typed into the input surface is split into a verb and its
//! arguments.  Verbs starting with `:` are looked up in the closed
//! [`CommandKind`] table; anything else is taken as a container name and
//! switched to.
//!
//! ```text
//! :rename  personal , stuff   ->  verb ":rename", args ["personal", "stuff"]
//! work                        ->  switch to "work"
//! ```

use crate::command::{Hotkey, InputEvent};
use crate::error::CoreError;
use crate::session::Session;
use crate::traits::WindowSystem;
use log::{debug, info, warn};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Verbs in the command table all start with this sigil.
pub const COMMAND_PREFIX: char = ':';

/// How long the event loop waits for input before draining the window
/// system's message queue again.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A command line broken into its verb and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine<'a> {
    pub verb: &'a str,
    pub args: Vec<&'a str>,
}

impl CommandLine<'_> {
    /// The arguments joined by single spaces, used where a command takes a
    /// free-form name.
    pub fn joined_args(&self) -> String {
        self.args.join(" ")
    }
}

/// Split on runs of whitespace and commas.  The first token is the verb.
pub fn split_command(input: &str) -> CommandLine<'_> {
    let mut tokens = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty());
    CommandLine {
        verb: tokens.next().unwrap_or(""),
        args: tokens.collect(),
    }
}

/// Every named command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    ShowMainWindow,
    Quit,
    New,
    Switch,
    Rename,
    Scan,
    Kill,
    Release,
    Info,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::ShowMainWindow,
        CommandKind::Quit,
        CommandKind::New,
        CommandKind::Switch,
        CommandKind::Rename,
        CommandKind::Scan,
        CommandKind::Kill,
        CommandKind::Release,
        CommandKind::Info,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::ShowMainWindow => ":show_main_window",
            CommandKind::Quit => ":quit",
            CommandKind::New => ":new",
            CommandKind::Switch => ":switch",
            CommandKind::Rename => ":rename",
            CommandKind::Scan => ":scan",
            CommandKind::Kill => ":kill",
            CommandKind::Release => ":release",
            CommandKind::Info => ":info",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn parse(verb: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == verb)
    }

    /// Whether the input surface is hidden after the command succeeds.
    pub fn auto_hide(self) -> bool {
        match self {
            CommandKind::ShowMainWindow | CommandKind::Scan | CommandKind::Info => false,
            CommandKind::Quit
            | CommandKind::New
            | CommandKind::Switch
            | CommandKind::Rename
            | CommandKind::Kill
            | CommandKind::Release => true,
        }
    }

    /// Whether at least one argument is required.
    pub fn needs_args(self) -> bool {
        matches!(self, CommandKind::Switch | CommandKind::Rename)
    }
}

/// A global key combination and the command it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HotkeyBinding {
    pub command: CommandKind,
    pub hotkey: Hotkey,
}

/// What the input surface should do after an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Hide the input surface.
    pub hide: bool,
    /// Bring the input surface to the front.
    pub reveal: bool,
    /// Stop the event loop.
    pub quit: bool,
}

impl Outcome {
    fn hide() -> Self {
        Self {
            hide: true,
            ..Self::default()
        }
    }
}

/// Routes input events to the [`Session`].
///
/// Failed commands are logged, change nothing and never hide the input
/// surface.
pub struct Dispatcher<W: WindowSystem> {
    session: Session<W>,
    hotkeys: Vec<HotkeyBinding>,
}

impl<W: WindowSystem> Dispatcher<W> {
    pub fn new(session: Session<W>) -> Self {
        let hotkeys = vec![HotkeyBinding {
            command: CommandKind::ShowMainWindow,
            hotkey: session.config().hotkey,
        }];
        Self { session, hotkeys }
    }

    pub fn session(&self) -> &Session<W> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<W> {
        &mut self.session
    }

    pub fn into_session(self) -> Session<W> {
        self.session
    }

    /// The key combinations the shell has to register with the OS.
    pub fn hotkeys(&self) -> &[HotkeyBinding] {
        &self.hotkeys
    }

    /// Handle one input event.
    pub fn handle(&mut self, event: InputEvent) -> Outcome {
        match event {
            InputEvent::TextChanged(text) => {
                for line in self.preview(&text) {
                    info!("{}", line);
                }
                Outcome::default()
            }
            InputEvent::Confirmed(text) => self.run(&text),
            InputEvent::Abort => Outcome::hide(),
            InputEvent::Hotkey { modifiers, key } => self.handle_hotkey(modifiers, key),
        }
    }

    /// Everything the current verb would match: container names, window
    /// titles (as `"<container> - <title>"`) and command names.
    ///
    /// A container whose name matches is listed once, without its windows.
    pub fn preview(&self, input: &str) -> Vec<String> {
        let needle = split_command(input).verb;
        let ws = self.session.window_system();
        let mut lines = Vec::new();
        for c in self.session.registry().iter() {
            if c.name().contains(needle) {
                lines.push(c.name().to_string());
                continue;
            }
            for w in c.windows() {
                let title = ws.window_title(w.handle);
                if title.contains(needle) {
                    lines.push(format!("{} - {}", c.name(), title));
                }
            }
        }
        lines.extend(
            CommandKind::ALL
                .iter()
                .map(|k| k.name())
                .filter(|n| n.contains(needle))
                .map(String::from),
        );
        lines
    }

    /// Execute a confirmed line.  Returns whether the input surface should
    /// be hidden.
    pub fn execute(&mut self, input: &str) -> bool {
        self.run(input).hide
    }

    /// Execute a confirmed line and report everything the caller has to do.
    pub fn run(&mut self, input: &str) -> Outcome {
        let line = split_command(input);
        if line.verb.is_empty() {
            return Outcome::hide();
        }
        debug!("command {:?}", input);

        let Some(kind) = CommandKind::parse(line.verb) else {
            if line.verb.starts_with(COMMAND_PREFIX) {
                warn!("unknown command {:?}", line.verb);
                return Outcome::default();
            }
            return match self.session.switch_to(input.trim()) {
                Ok(()) => Outcome::hide(),
                Err(e) => {
                    warn!("switch failed: {}", e);
                    Outcome::default()
                }
            };
        };

        match self.invoke(kind, &line) {
            Ok(mut outcome) => {
                outcome.hide = kind.auto_hide();
                outcome
            }
            Err(e) => {
                warn!("{} failed: {}", kind.name(), e);
                Outcome::default()
            }
        }
    }

    /// Handle events from `events` one at a time until `:quit`, end of
    /// input, or a quit request from the window system.
    ///
    /// Between events the window system's message queue is drained at
    /// least every `poll`, so windows owned by this thread keep answering.
    pub fn run_loop(&mut self, events: &Receiver<InputEvent>, poll: Duration) {
        loop {
            if !self.session.window_system().process_messages() {
                info!("window system asked to quit");
                return;
            }
            let event = match events.recv_timeout(poll) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    info!("all input sources closed");
                    return;
                }
            };
            let outcome = self.handle(event);
            if outcome.reveal {
                info!("input surface shown");
            }
            if outcome.hide {
                info!("input surface hidden");
            }
            if outcome.quit {
                info!("quit requested");
                return;
            }
        }
    }

    /// Run the command bound to a fired hotkey.
    pub fn handle_hotkey(&mut self, modifiers: u32, key: u32) -> Outcome {
        let bound = self
            .hotkeys
            .iter()
            .find(|b| b.hotkey.matches(modifiers, key))
            .map(|b| b.command);
        match bound {
            Some(kind) => self.run(kind.name()),
            None => {
                debug!("unbound hotkey {:#x}+{:#x}", modifiers, key);
                Outcome::default()
            }
        }
    }

    fn invoke(&mut self, kind: CommandKind, line: &CommandLine<'_>) -> Result<Outcome, CoreError> {
        if kind.needs_args() && line.args.is_empty() {
            return Err(CoreError::Usage(format!("{} <name>", kind.name())));
        }
        let name = line.joined_args();
        let mut outcome = Outcome::default();
        match kind {
            CommandKind::ShowMainWindow => {
                match self.session.current_container() {
                    Some(c) => info!("{} ({} windows)", c.name(), c.len()),
                    None => info!("no container on this display"),
                }
                outcome.reveal = true;
            }
            CommandKind::Quit => outcome.quit = true,
            CommandKind::New => {
                let name = Some(name.as_str()).filter(|n| !n.is_empty());
                self.session.new_desktop(name)?;
            }
            CommandKind::Switch => self.session.switch_to(&name)?,
            CommandKind::Rename => self.session.rename_current(&name)?,
            CommandKind::Scan => self.session.scan()?,
            CommandKind::Kill => {
                let n = self.session.kill_current_windows()?;
                info!("asked {} window(s) to close", n);
            }
            CommandKind::Release => self.session.delete_current()?,
            CommandKind::Info => {
                for line in self.session.info() {
                    info!("{}", line);
                }
            }
        }
        Ok(outcome)
    }
}
