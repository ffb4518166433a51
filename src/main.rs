// ABOUTME: Entry point for simplesession — manage saved editor sessions from a terminal.
// ABOUTME: Parses CLI args, loads config, and runs one store or codec operation.

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use simplesession::config::Config;
use simplesession::session::codec::{self, EntryRef};
use simplesession::session::{SessionStore, complete};

#[derive(Parser, Debug)]
#[command(name = "simplesession", version, about = "Inspect and manage saved editor sessions")]
struct Cli {
    /// Sessions directory (defaults to the configured one).
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List sessions, named ones first, newest first.
    List {
        /// Print file paths instead of names.
        #[arg(long)]
        paths: bool,
    },
    /// Summarize the groups and entries of a session.
    Show { name: String },
    /// Print the file path of a session.
    Path { name: String },
    /// Delete a session.
    Delete { name: String },
    /// Print session names starting with a prefix.
    Complete {
        #[arg(default_value = "")]
        prefix: String,
    },
    /// Add the session suffix to legacy files.
    Migrate,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load().context("failed to load config")?;
    if cli.dir.is_some() {
        config.sessions_dir = cli.dir;
    }
    let store = SessionStore::from_config(&config, &Config::user_dir());

    match cli.command {
        Command::List { paths } => {
            for file in store.list_files()? {
                if paths {
                    println!("{}", file.path.display());
                } else {
                    println!("{}", file.name);
                }
            }
        }
        Command::Show { name } => {
            let path = existing_session(&store, &name)?;
            let record = codec::load_from(&path)?;
            println!("{}: {} groups", name, record.group_count());
            for (index, entries) in &record.groups {
                println!("group {}:", index);
                for entry in entries {
                    match entry {
                        EntryRef::File(path) => println!("  file   {}", path.display()),
                        EntryRef::Buffer(text) => {
                            let first = text.lines().next().unwrap_or("");
                            println!("  buffer {} chars: {}", text.chars().count(), first);
                        }
                    }
                }
            }
        }
        Command::Path { name } => {
            println!("{}", existing_session(&store, &name)?.display());
        }
        Command::Delete { name } => {
            let path = existing_session(&store, &name)?;
            store
                .delete(&path)
                .with_context(|| format!("failed to delete session {}", name))?;
        }
        Command::Complete { prefix } => {
            let names = store.list_names()?;
            for item in complete(&names, &prefix).unwrap_or_default() {
                println!("{}", item.value);
            }
        }
        Command::Migrate => {
            let count = store.migrate_legacy()?;
            println!("migrated {} files in {}", count, store.dir().display());
        }
    }

    Ok(())
}

fn existing_session(store: &SessionStore, name: &str) -> anyhow::Result<PathBuf> {
    let path = store.path_for_name(name);
    if !path.is_file() {
        bail!("no session named {:?} in {}", name, store.dir().display());
    }
    Ok(path)
}
