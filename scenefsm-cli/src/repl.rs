//! Interactive REPL.
//!
//! Steps a program by hand against a virtual clock. Nothing advances until
//! `tick` is entered, so timed transitions can be examined one step at a
//! time.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use scenefsm_core::{
    ImmediateActivator, Interpreter, Program, Submission, TickOutcome, TransitionRecord, Trigger,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const HELP_TEXT: &str = r#"
Available commands:
  help                  Show this help
  <event>               Submit an event to the current state
  tick [secs]           Advance the clock (default 0) and run one tick
  state                 Show the current state and status
  events                List events the current state accepts
  history               Show the transition history
  table                 Show the transition table
  reload                Recompile the program and restart the machine

  quit, exit            Exit the REPL
"#;

pub fn run(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "scenefsm REPL".bold().cyan());
    println!("Loading {}...", path.display());

    let mut session = Session::open(path)?;
    println!(
        "{} in state {}",
        "Ready".green(),
        session.interpreter.current_name().yellow()
    );

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(".scenefsm_history"))
        .unwrap_or_else(|_| ".scenefsm_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    loop {
        let prompt = format!("{} ", format!("{}>", session.interpreter.current_name()).cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match session.execute_repl_command(line) {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break,
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);
    Ok(())
}

/// A loaded program, its interpreter, and the virtual clock.
struct Session {
    path: PathBuf,
    program: Program,
    interpreter: Interpreter<ImmediateActivator>,
    now: Instant,
}

impl Session {
    fn open(path: PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let (program, interpreter) = load(&path)?;
        Ok(Self {
            path,
            program,
            interpreter,
            now: Instant::now(),
        })
    }

    fn execute_repl_command(
        &mut self,
        line: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(Some(String::new()));
        }

        let cmd = parts[0].to_lowercase();
        let args = &parts[1..];

        match cmd.as_str() {
            "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

            "quit" | "exit" | "q" => Ok(None),

            "tick" | "t" => {
                let secs: f64 = match args.first() {
                    Some(arg) => arg.parse()?,
                    None => 0.0,
                };
                let Some(now) = Duration::try_from_secs_f64(secs)
                    .ok()
                    .and_then(|step| self.now.checked_add(step))
                else {
                    return Ok(Some("Usage: tick [non-negative seconds]".to_string()));
                };
                self.now = now;
                Ok(Some(match self.interpreter.tick_at(self.now) {
                    TickOutcome::Transitioned(record) => format_transition(&record),
                    TickOutcome::Activating => "Activating resource".yellow().to_string(),
                    TickOutcome::Idle => format!(
                        "{} in {}",
                        "Idle".dimmed(),
                        self.interpreter.current_name().yellow()
                    ),
                }))
            }

            "state" | "s" => {
                let mut output = format!(
                    "{} ({:?})",
                    self.interpreter.current_name().yellow(),
                    self.interpreter.status()
                );
                if let Some(resource) = self
                    .interpreter
                    .current_state()
                    .and_then(|s| s.resource.as_deref())
                {
                    output.push_str(&format!("\n  Resource: {}", resource));
                }
                let pending = self.interpreter.pending_len();
                if pending > 0 {
                    output.push_str(&format!("\n  Pending: {}", pending));
                }
                Ok(Some(output))
            }

            "events" | "e" => {
                let events = self.interpreter.accepted_events();
                if events.is_empty() {
                    return Ok(Some("No events accepted".yellow().to_string()));
                }
                Ok(Some(
                    events
                        .iter()
                        .map(|e| format!("  {}", e.cyan()))
                        .collect::<Vec<_>>()
                        .join("\n"),
                ))
            }

            "history" | "h" => {
                let history = self.interpreter.history();
                if history.is_empty() {
                    return Ok(Some("No history".yellow().to_string()));
                }
                Ok(Some(history.join(" → ")))
            }

            "table" => {
                let rows = self.program.graph().transition_table();
                if rows.is_empty() {
                    return Ok(Some("No transitions".yellow().to_string()));
                }
                Ok(Some(
                    rows.iter()
                        .map(|row| format!("  {}", row))
                        .collect::<Vec<_>>()
                        .join("\n"),
                ))
            }

            "reload" => {
                let (program, interpreter) = load(&self.path)?;
                self.program = program;
                self.interpreter = interpreter;
                self.now = Instant::now();
                Ok(Some(format!(
                    "{} {} (checksum {})",
                    "Reloaded".green(),
                    self.path.display(),
                    self.program.graph().checksum()
                )))
            }

            _ => {
                if !args.is_empty() {
                    return Ok(Some(format!(
                        "Unknown command: {}. Type 'help' for help.",
                        cmd
                    )));
                }
                match self.interpreter.submit_event(parts[0])? {
                    Submission::Accepted => Ok(Some(format!(
                        "{} {} (tick to apply)",
                        "Accepted".green(),
                        parts[0].cyan()
                    ))),
                    Submission::Dropped => Ok(Some(format!(
                        "{} {}: not accepted in {}",
                        "Dropped".yellow(),
                        parts[0].cyan(),
                        self.interpreter.current_name()
                    ))),
                }
            }
        }
    }
}

/// Compiles a program and starts a fresh interpreter on it.
fn load(
    path: &Path,
) -> Result<(Program, Interpreter<ImmediateActivator>), Box<dyn std::error::Error>> {
    let program = Program::from_file(path)?;
    for diagnostic in program.diagnostics() {
        eprintln!("{}", diagnostic.to_string().red());
    }
    let graph = Arc::new(program.clone().into_graph()?);
    tracing::debug!(
        "Loaded {} ({} commands, checksum {})",
        path.display(),
        program.commands().len(),
        graph.checksum()
    );
    let interpreter = Interpreter::new(graph, ImmediateActivator::new())?;
    Ok((program, interpreter))
}

fn format_transition(record: &TransitionRecord) -> String {
    let trigger = match &record.trigger {
        Trigger::Timed { seconds } => format!("after {}s", seconds),
        Trigger::Named { event } => event.clone(),
        Trigger::Back { event } => format!("{} (back)", event),
    };
    let mut output = format!(
        "{} → {} [{}]",
        record.from,
        record.to.yellow(),
        trigger.cyan()
    );
    for event in &record.discarded {
        output.push_str(&format!("\n  {} {}", "Discarded".red(), event));
    }
    output
}
