//! Terminal front end for the Jotpad core.
//!
//! # Responsibility
//! - Stand in for the UI layer: print the list/editor view, forward commands.
//! - Run the event loop that wakes up for debounce deadlines.
//! - Supply the delete confirmation as a `y/N` prompt.

use chrono::Utc;
use clap::Parser;
use jotpad_core::config::{DEFAULT_HISTORY_DEPTH, DEFAULT_STORAGE_KEY};
use jotpad_core::{
    default_log_level, init_logging, parse_chord, CoreConfig, DeleteOutcome, EditorField,
    EditorState, Note, NoteId, SessionController, SessionError, SqliteKeyValueStore, SystemClock,
    ViewState,
};
use log::{error, info};
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

type Controller = SessionController<SqliteKeyValueStore, SystemClock>;

const HELP: &str = "\
commands:
  :new                 create a note and open it
  :open <id>           open a note
  :back                close the note and show the list
  :title <text>        replace the title
  :content <text>      replace the content
  :append <text>       append a line to the content
  :undo | :redo        step through edit history
  :key <chord>         keyboard shortcut, e.g. ctrl+z or ctrl+shift+z
  :delete              delete the open note (asks first)
  :search <term>       filter the list (empty term clears)
  :list                show the list
  :retry               retry a failed save
  :help | :quit";

#[derive(Parser)]
#[command(name = "jotpad")]
#[command(about = "Local notes with autosave and undo/redo")]
struct Cli {
    /// SQLite file holding the notes; an in-memory database when omitted
    #[arg(long)]
    db: Option<PathBuf>,

    /// Absolute directory for rolling log files; no logging when omitted
    #[arg(long)]
    log_dir: Option<String>,

    /// trace|debug|info|warn|error
    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,

    /// Quiet period before an edit is saved
    #[arg(long, default_value_t = 300)]
    autosave_ms: u64,

    /// Quiet period before an edit becomes an undo step
    #[arg(long, default_value_t = 300)]
    snapshot_ms: u64,

    /// Maximum undo steps kept per note, initial state included
    #[arg(long, default_value_t = DEFAULT_HISTORY_DEPTH)]
    history_depth: usize,

    /// Storage key of the note collection
    #[arg(long, default_value = DEFAULT_STORAGE_KEY)]
    storage_key: String,
}

impl Cli {
    fn core_config(&self) -> CoreConfig {
        CoreConfig {
            storage_key: self.storage_key.clone(),
            autosave_delay: Duration::from_millis(self.autosave_ms),
            snapshot_delay: Duration::from_millis(self.snapshot_ms),
            history_depth: self.history_depth,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("jotpad: {err}");
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(&cli.log_level, log_dir)?;
    }

    let kv = match cli.db.as_ref() {
        Some(path) => SqliteKeyValueStore::open(path)?,
        None => SqliteKeyValueStore::open_in_memory()?,
    };
    let mut controller = SessionController::from_config(kv, SystemClock, &cli.core_config())?;
    info!(
        "event=cli_start module=cli status=ok note_count={}",
        controller.store().len()
    );

    println!("jotpad {} - :help for commands", jotpad_core::core_version());
    render(&controller.view());

    let lines = spawn_line_reader();
    loop {
        let received = match controller.next_deadline() {
            Some(due) => {
                let wait = (due - Utc::now()).to_std().unwrap_or(Duration::ZERO);
                lines.recv_timeout(wait)
            }
            None => lines.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(line) => {
                if handle_line(&mut controller, &lines, line.trim_end()) == Flow::Quit {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        if let Err(err) = controller.run_due() {
            report(&err);
        }
    }

    if let Err(err) = controller.close_session() {
        report(&err);
    }
    info!("event=cli_exit module=cli status=ok");
    Ok(())
}

fn spawn_line_reader() -> Receiver<String> {
    let (sender, receiver) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
    receiver
}

fn handle_line(controller: &mut Controller, lines: &Receiver<String>, line: &str) -> Flow {
    let (command, argument) = match line.split_once(' ') {
        Some((command, argument)) => (command, argument),
        None => (line, ""),
    };

    let outcome: Result<(), SessionError> = match command {
        "" => Ok(()),
        ":quit" | ":q" => return Flow::Quit,
        ":help" => {
            println!("{HELP}");
            Ok(())
        }
        ":new" => controller.create_note().map(|state| render_editor(&state)),
        ":open" => match argument.trim().parse::<NoteId>() {
            Ok(note_id) => controller
                .open_session(note_id)
                .map(|state| render_editor(&state)),
            Err(_) => {
                println!("usage: :open <id>");
                Ok(())
            }
        },
        ":back" | ":close" => controller
            .close_session()
            .map(|()| render(&controller.view())),
        ":title" => controller
            .on_field_change(EditorField::Title, argument)
            .map(|state| render_editor(&state)),
        ":content" => controller
            .on_field_change(EditorField::Content, argument)
            .map(|state| render_editor(&state)),
        ":append" => append_line(controller, argument),
        ":undo" => controller.undo().map(|state| render_editor(&state)),
        ":redo" => controller.redo().map(|state| render_editor(&state)),
        ":key" => match parse_chord(argument) {
            Some(command) => controller
                .execute(command)
                .map(|state| render_editor(&state)),
            None => {
                println!("unbound chord `{argument}`");
                Ok(())
            }
        },
        ":delete" => delete_with_prompt(controller, lines),
        ":search" => {
            controller.search(argument.trim());
            render(&controller.view());
            Ok(())
        }
        ":list" => {
            render(&controller.view());
            Ok(())
        }
        ":retry" => controller.retry_persist().map(|()| println!("saved")),
        other => {
            println!("unknown command `{other}`; :help lists commands");
            Ok(())
        }
    };

    if let Err(err) = outcome {
        report(&err);
    }
    Flow::Continue
}

fn append_line(controller: &mut Controller, text: &str) -> Result<(), SessionError> {
    let current = controller
        .editor_state()
        .ok_or(SessionError::NoActiveSession)?;
    let content = if current.content.is_empty() {
        text.to_string()
    } else {
        format!("{}\n{text}", current.content)
    };
    let state = controller.on_field_change(EditorField::Content, content)?;
    render_editor(&state);
    Ok(())
}

fn delete_with_prompt(
    controller: &mut Controller,
    lines: &Receiver<String>,
) -> Result<(), SessionError> {
    let mut confirm = |note: &Note| {
        let title = if note.title.is_empty() {
            "Untitled"
        } else {
            note.title.as_str()
        };
        print!("Delete \"{title}\"? [y/N] ");
        let _ = io::stdout().flush();
        lines
            .recv()
            .map(|answer| answer.trim().eq_ignore_ascii_case("y"))
            .unwrap_or(false)
    };

    match controller.delete_current_note(&mut confirm)? {
        DeleteOutcome::Deleted(_) => render(&controller.view()),
        DeleteOutcome::Declined => println!("kept"),
        DeleteOutcome::NoSession => println!("no note is open"),
    }
    Ok(())
}

fn render(view: &ViewState) {
    if let Some(editor) = view.editor.as_ref() {
        render_editor(editor);
        return;
    }
    if !view.search_term.is_empty() {
        println!("search: {}", view.search_term);
    }
    if view.cards.is_empty() {
        println!("  No notes found");
    }
    for card in &view.cards {
        println!("  [{}] {} - {}", card.id, card.heading, card.updated_label);
        println!("      {}", card.excerpt);
    }
}

fn render_editor(state: &EditorState) {
    println!("--- note {} ---", state.note_id);
    println!("title:   {}", state.title);
    println!("content: {}", state.content);
    println!(
        "undo: {}  redo: {}",
        if state.can_undo { "on" } else { "off" },
        if state.can_redo { "on" } else { "off" }
    );
}

fn report(err: &SessionError) {
    if err.is_storage_unavailable() {
        error!("event=cli_save module=cli status=error error={err}");
        println!("! save failed: {err}. Your edits are kept; use :retry.");
    } else {
        println!("! {err}");
    }
}
