use crate::compile::compile_diagram_with_config;
use crate::config::load_config;
use crate::patch::remove_all_pos;
use crate::rename::{get_symbols, rename_symbol};
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "umlflow", version, about = "umlflow diagram DSL compiler")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Layout config JSON file
    #[arg(short = 'c', long = "configFile", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a diagram to its JSON description
    Compile {
        /// Input file (.uml) or '-' for stdin
        input: PathBuf,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },
    /// List all identifiers (explicit and implicit)
    Symbols {
        /// Input file (.uml) or '-' for stdin
        input: PathBuf,
    },
    /// Rename an identifier and print the new source
    Rename {
        /// Input file (.uml) or '-' for stdin
        input: PathBuf,
        old: String,
        new: String,
    },
    /// Remove all @pos directives and print the new source
    Strip {
        /// Input file (.uml) or '-' for stdin
        input: PathBuf,
    },
    /// Print the arrow registry as JSON
    Arrows,
}

pub fn run() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    let mut stdout = io::stdout().lock();

    match args.command {
        Command::Compile { input, pretty } => {
            let source = read_input(&input)?;
            let output = compile_diagram_with_config(&source, &config);
            let json = if pretty {
                serde_json::to_string_pretty(&output)?
            } else {
                serde_json::to_string(&output)?
            };
            writeln!(stdout, "{json}")?;
        }
        Command::Symbols { input } => {
            let source = read_input(&input)?;
            for symbol in get_symbols(&source) {
                writeln!(stdout, "{symbol}")?;
            }
        }
        Command::Rename { input, old, new } => {
            let source = read_input(&input)?;
            write!(stdout, "{}", rename_symbol(&source, &old, &new))?;
        }
        Command::Strip { input } => {
            let source = read_input(&input)?;
            write!(stdout, "{}", remove_all_pos(&source))?;
        }
        Command::Arrows => {
            let json = serde_json::to_string_pretty(crate::arrows::arrow_registry())?;
            writeln!(stdout, "{json}")?;
        }
    }

    Ok(())
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    Ok(std::fs::read_to_string(path)?)
}
