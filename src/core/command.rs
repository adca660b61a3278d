//! Console command grammar
//!
//! One command per line. Keywords are case-insensitive; arguments (uids,
//! resume codes, key names) are kept as typed.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::CommandError;
use crate::types::{KeyStroke, Signal};

lazy_static! {
    static ref RE_LOGIN: Regex = Regex::new(r"^(?i:login)(?:\s+(.*))?$").unwrap();
    static ref RE_SCORE: Regex = Regex::new(r"^(?i:score)(?:\s+(\S+))?$").unwrap();
    static ref RE_RESUME: Regex = Regex::new(r"^(?i:resume)(?:\s+(.*))?$").unwrap();
    static ref RE_KEY: Regex = Regex::new(r"^(?i:key)(?:\s+(\S+))?$").unwrap();
    static ref RE_DENY: Regex = Regex::new(r"^(?i:deny-fullscreen)(?:\s+(\S+))?$").unwrap();
}

pub const HELP: &str = "\
commands:
  login <uid>             validate credential and begin
  start                   start the next round (enters fullscreen)
  score <n>               finish the current round with score n
  results                 show final results
  resume <code>           staff override after termination
  escape                  leave fullscreen
  hide                    switch away from the tab
  key <combo>             press a key, e.g. ctrl+shift+i or F12
  menu                    open the context menu
  deny-fullscreen on|off  refuse future fullscreen requests
  status | history | reload | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login(String),
    Start,
    Score(u32),
    Results,
    Resume(String),
    Escape,
    Hide,
    Key(KeyStroke),
    Menu,
    DenyFullscreen(bool),
    Status,
    History,
    Reload,
    Help,
    Quit,
}

impl Command {
    /// Parse one input line. `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        // Empty arguments reach the controller, which owns those messages
        if let Some(caps) = RE_LOGIN.captures(line) {
            return Ok(Some(Command::Login(arg(&caps))));
        }
        if let Some(caps) = RE_RESUME.captures(line) {
            return Ok(Some(Command::Resume(arg(&caps))));
        }
        if let Some(caps) = RE_SCORE.captures(line) {
            let score = arg(&caps)
                .parse::<u32>()
                .map_err(|_| CommandError::Usage("score <non-negative integer>"))?;
            return Ok(Some(Command::Score(score)));
        }
        if let Some(caps) = RE_KEY.captures(line) {
            let stroke = KeyStroke::parse(&arg(&caps))
                .ok_or(CommandError::Usage("key [ctrl+][shift+]<key>"))?;
            return Ok(Some(Command::Key(stroke)));
        }
        if let Some(caps) = RE_DENY.captures(line) {
            return match arg(&caps).to_ascii_lowercase().as_str() {
                "on" => Ok(Some(Command::DenyFullscreen(true))),
                "off" => Ok(Some(Command::DenyFullscreen(false))),
                _ => Err(CommandError::Usage("deny-fullscreen on|off")),
            };
        }

        let command = match line.to_ascii_lowercase().as_str() {
            "start" => Command::Start,
            "results" => Command::Results,
            "escape" | "esc" => Command::Escape,
            "hide" => Command::Hide,
            "menu" => Command::Menu,
            "status" => Command::Status,
            "history" => Command::History,
            "reload" => Command::Reload,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            _ => return Err(CommandError::Unknown(line.to_string())),
        };
        Ok(Some(command))
    }

    /// The host signal this command simulates, if any
    pub fn signal(&self) -> Option<Signal> {
        match self {
            Command::Escape => Some(Signal::FullscreenChange { fullscreen: false }),
            Command::Hide => Some(Signal::VisibilityChange { hidden: true }),
            Command::Key(stroke) => Some(Signal::KeyDown(stroke.clone())),
            Command::Menu => Some(Signal::ContextMenu),
            _ => None,
        }
    }
}

fn arg(caps: &regex::Captures<'_>) -> String {
    caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default()
}
