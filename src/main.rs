//! proctorlock CLI
//!
//! Usage:
//!   proctorlock                                   # Interactive session, in-process registry
//!   proctorlock --registry-url http://host:3001   # Interactive session, remote registry
//!   proctorlock --serve --store file --roster users.json
//!   proctorlock --json                            # Transitions as JSON lines

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use colored::Colorize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use proctorlock::config::SessionConfig;
use proctorlock::core::command::HELP;
use proctorlock::core::{
    Collaborators, Command, CompletionDispatcher, CompletionRegistry, FileTerminationStore,
    HttpRegistryClient, ScoreSummary, SessionController, VirtualScreen,
};
use proctorlock::error::{SessionError, StoreError};
use proctorlock::service::{run_server, FileUidStore, LocalRegistry, MemoryUidStore, Roster, UidStore};
use proctorlock::types::{Phase, Signal};
use proctorlock::VERSION;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    Memory,
    File,
}

#[derive(Parser, Debug)]
#[command(
    name = "proctorlock",
    version = VERSION,
    about = "Proctored three-round assessment session, plus its completion registry",
    long_about = "proctorlock drives a proctored assessment: login, three timed rounds\n\
                  with a score gate after round 2, and a violation monitor that ends\n\
                  the attempt on fullscreen exit, tab switch, devtools keys, context\n\
                  menu or copy/paste. A termination survives restarts until a staff\n\
                  resume code clears it.\n\n\
                  Modes:\n  \
                  (default)  Interactive session on this terminal\n  \
                  --serve    Completion registry HTTP service\n\n\
                  Logging: PROCTORLOCK_LOG=debug (default info), written to stderr"
)]
struct Args {
    /// Run the completion registry HTTP service
    #[arg(short, long)]
    serve: bool,

    /// Service address
    #[arg(long, default_value = "127.0.0.1:3001")]
    addr: String,

    /// Registry backing store
    #[arg(long, value_enum, default_value = "memory")]
    store: StoreKind,

    /// Directory of the file store
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// JSON array of {"uid": ...} entries; unlisted credentials are unknown
    #[arg(long)]
    roster: Option<PathBuf>,

    /// Use a remote registry instead of an in-process one
    #[arg(long)]
    registry_url: Option<String>,

    /// Directory holding the termination record
    #[arg(long, default_value = "./.proctorlock")]
    state_dir: PathBuf,

    /// Session config file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print transitions as JSON lines
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Milliseconds per timer tick (one tick is one second of round time)
    #[arg(long, default_value_t = 1000)]
    tick_ms: u64,
}

const LOG_ENV: &str = "PROCTORLOCK_LOG";
const STORE_FILE_NAME: &str = "completions.json";

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let result = if args.serve { run_serve(&args) } else { run_session(&args) };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_uid_store(args: &Args) -> Result<Arc<dyn UidStore>, StoreError> {
    let roster = args.roster.as_deref().map(Roster::load).transpose()?;
    if let Some(roster) = &roster {
        info!(known = roster.len(), "Roster loaded");
    }
    Ok(match args.store {
        StoreKind::Memory => Arc::new(MemoryUidStore::new(roster)),
        StoreKind::File => Arc::new(FileUidStore::new(args.data_dir.join(STORE_FILE_NAME), roster)),
    })
}

/// Run the registry service
fn run_serve(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let store = build_uid_store(args)?;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(&args.addr, store))
}

/// Run an interactive session on this terminal
fn run_session(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => SessionConfig::load(path)?,
        None => SessionConfig::default(),
    };
    let registry: Arc<dyn CompletionRegistry> = match &args.registry_url {
        Some(url) => Arc::new(HttpRegistryClient::new(url)),
        None => Arc::new(LocalRegistry::new(build_uid_store(args)?)),
    };

    let mut console = Console::new(args, config, registry);
    print_header(args.no_color);
    console.show_status();

    let (tx, rx) = mpsc::channel::<String>();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let tick = Duration::from_millis(args.tick_ms.max(1));
    let mut next_tick = Instant::now() + tick;
    loop {
        let now = Instant::now();
        if now >= next_tick {
            console.tick();
            next_tick += tick;
            continue;
        }
        match rx.recv_timeout(next_tick - now) {
            Ok(line) => match Command::parse(&line) {
                Ok(Some(command)) => {
                    if !console.execute(command) {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => console.notice(&e.to_string()),
            },
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    info!("Session closed");
    Ok(())
}

/// Terminal host for one controller: owns the screen handle and prints
/// each new transition once.
struct Console<'a> {
    args: &'a Args,
    config: SessionConfig,
    registry: Arc<dyn CompletionRegistry>,
    screen: VirtualScreen,
    controller: SessionController,
    printed: usize,
}

impl<'a> Console<'a> {
    fn new(args: &'a Args, config: SessionConfig, registry: Arc<dyn CompletionRegistry>) -> Self {
        let screen = VirtualScreen::new();
        let controller = Self::build_controller(args, &config, &registry, &screen);
        Self { args, config, registry, screen, controller, printed: 0 }
    }

    fn build_controller(
        args: &Args,
        config: &SessionConfig,
        registry: &Arc<dyn CompletionRegistry>,
        screen: &VirtualScreen,
    ) -> SessionController {
        SessionController::new(
            config.clone(),
            Collaborators {
                store: Box::new(FileTerminationStore::new(&args.state_dir, &config.namespace)),
                registry: Arc::clone(registry),
                dispatcher: CompletionDispatcher::background(Arc::clone(registry)),
                screen: Box::new(screen.clone()),
            },
        )
    }

    /// Returns false when the session should end
    fn execute(&mut self, command: Command) -> bool {
        debug!(command = ?command, "Console command");
        if let Some(signal) = command.signal() {
            self.deliver(&command, signal);
            return true;
        }

        match command {
            Command::Login(uid) => {
                let result = self.controller.login(&uid);
                self.report(result);
            }
            Command::Start => match self.controller.phase().upcoming_round() {
                Some(round) => {
                    let result = self.controller.start_round(round);
                    self.report(result);
                }
                None => self.notice("Nothing to start from this screen."),
            },
            Command::Score(score) => match self.controller.phase().active_round() {
                Some(round) => {
                    let result = self.controller.complete_round(round, score);
                    self.report(result);
                }
                None => self.notice("No round in progress."),
            },
            Command::Results => {
                let result = self.controller.show_results();
                self.report(result);
            }
            Command::Resume(code) => {
                let result = self.controller.resume(&code);
                self.report(result);
            }
            Command::DenyFullscreen(deny) => {
                self.screen.deny_requests(deny);
                let state = if deny { "denied" } else { "allowed" };
                self.notice(&format!("Fullscreen requests are now {}.", state));
            }
            Command::Status => self.show_status(),
            Command::History => {
                for transition in self.controller.history() {
                    self.print_transition(transition);
                }
            }
            Command::Reload => self.reload(),
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
            Command::Escape | Command::Hide | Command::Key(_) | Command::Menu => {}
        }
        true
    }

    fn deliver(&mut self, command: &Command, signal: Signal) {
        if matches!(command, Command::Escape) {
            self.screen.leave();
        }
        let outcome = self.controller.handle_signal(&signal);
        if outcome.suppressed {
            println!("{}", "  (default action blocked)".dimmed());
        }
        self.flush();
    }

    fn tick(&mut self) {
        let before = self.controller.phase();
        self.controller.tick();
        if self.controller.phase() != before {
            self.flush();
        }
    }

    /// Drop the controller and rebuild it from persisted state only
    fn reload(&mut self) {
        info!("Reloading session");
        let controller = Self::build_controller(self.args, &self.config, &self.registry, &self.screen);
        self.controller = controller;
        self.printed = 0;
        self.show_status();
    }

    fn report(&mut self, result: Result<Phase, SessionError>) {
        if let Err(e) = result {
            self.notice(&e.to_string());
        }
        self.flush();
    }

    fn notice(&self, message: &str) {
        println!("{} {}", "!".yellow().bold(), message.yellow());
    }

    /// Print transitions not shown yet, then whatever the new phase displays
    fn flush(&mut self) {
        let history = self.controller.history();
        if history.len() < self.printed {
            self.printed = 0;
        }
        if history.len() == self.printed {
            return;
        }
        for transition in &history[self.printed..] {
            self.print_transition(transition);
        }
        self.printed = history.len();
        self.show_screen();
    }

    fn print_transition(&self, transition: &proctorlock::types::Transition) {
        if self.args.json {
            match serde_json::to_string(transition) {
                Ok(line) => println!("{}", line),
                Err(e) => self.notice(&format!("could not encode transition: {}", e)),
            }
        } else if self.args.no_color {
            println!("{}", transition.to_parseable_string());
        } else {
            println!("{}", transition.to_terminal_string());
        }
    }

    fn show_screen(&self) {
        let controller = &self.controller;
        match controller.phase() {
            Phase::Login => println!("Enter your UID: login <uid>"),
            Phase::Intro1 | Phase::Intro2 | Phase::Intro3 => {
                if let Some(notice) = controller.notice() {
                    self.notice(notice);
                }
                println!("Type `start` when ready. The round runs in fullscreen.");
            }
            Phase::Level1 | Phase::Level2 | Phase::Level3 => {
                let title = controller.round_title().unwrap_or_default();
                let clock = controller.remaining_clock().unwrap_or_default();
                println!("{}  {}", title.bold(), clock);
                println!("Finish with `score <n>`.");
            }
            Phase::IntroFinal => println!("All rounds complete. Type `results`."),
            Phase::Thankyou => {
                println!("{}", "Thank you for participating.".green().bold());
                self.print_summary();
            }
            Phase::Lost => {
                println!("{}", "You did not reach the score needed for the final round.".red().bold());
                self.print_summary();
            }
            Phase::Terminated => {
                println!("{}", "Assessment terminated.".red().bold());
                if let Some(reason) = controller.termination_reason() {
                    println!("Reason: {}", reason);
                }
                println!("Ask staff for a resume code: resume <code>");
            }
        }
    }

    fn print_summary(&self) {
        let Some(ScoreSummary { lines, total, possible }) = self.controller.summary() else {
            return;
        };
        for line in &lines {
            println!("  {:<28} {:>3} / {}", line.title, line.score, line.max);
        }
        let label = format!("{:<28}", "Total");
        println!("  {} {:>3} / {}", label.as_str().bold(), total, possible);
    }

    fn show_status(&self) {
        let controller = &self.controller;
        let phase = controller.phase();
        if self.args.no_color {
            println!("phase={}", phase);
        } else {
            println!("phase={}{}{}", phase.color_code(), phase, Phase::color_reset());
        }
        if let Some(uid) = controller.credential() {
            println!("uid={}", uid);
        }
        if let Some(clock) = controller.remaining_clock() {
            println!("remaining={}", clock);
        }
        let scores = controller.scores();
        println!("scores={}/{}/{}", scores.level1, scores.level2, scores.level3);
        self.show_screen();
    }
}

fn print_header(no_color: bool) {
    if no_color {
        println!("========================================");
        println!("  proctorlock v{}", VERSION);
        println!("========================================");
    } else {
        println!("{}", "╔════════════════════════════════════════╗".bold());
        let title = format!("║           proctorlock v{:<16}║", VERSION);
        println!("{}", title.as_str().bold());
        println!("{}", "╚════════════════════════════════════════╝".bold());
    }
    println!("Type `help` for commands.");
    println!();
}
