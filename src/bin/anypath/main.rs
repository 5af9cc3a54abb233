// Copyright 2025 Martin Pool.

// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Command-line access to local, HTTP, and object store paths.

use std::error::Error;
use std::io::{BufWriter, Write};
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{debug, error, Level};

use anypath::{Path, PurePath, Result};

mod trace;

use crate::trace::TraceTimeStyle;

#[derive(Debug, Parser)]
#[command(author, about, version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Show debug trace to stderr.
    #[arg(long, short = 'D', global = true)]
    debug: bool,

    /// Control timestamps prefixes on stderr.
    #[arg(long, value_enum, global = true, default_value_t = TraceTimeStyle::None)]
    trace_time: TraceTimeStyle,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the contents of a file.
    Cat { path: String },

    /// Print "true" if the path exists, otherwise "false".
    Exists { path: String },

    /// List the children of a directory.
    Ls { path: String },

    /// Create a directory.
    Mkdir {
        path: String,
        /// Create missing parent directories.
        #[arg(long, short)]
        parents: bool,
        /// Don't fail if the directory already exists.
        #[arg(long)]
        exist_ok: bool,
    },

    /// Show how a path is parsed, without accessing it.
    Parse {
        /// One or more strings, joined as the path.
        #[arg(required = true)]
        path: Vec<String>,
    },

    /// Delete a file.
    Rm {
        path: String,
        /// Don't fail if the file doesn't exist.
        #[arg(long, short)]
        force: bool,
    },

    /// Remove a directory.
    Rmdir { path: String },

    /// Create an empty file or update its modification time.
    Touch {
        path: String,
        /// Fail if the file already exists.
        #[arg(long)]
        no_exist_ok: bool,
    },

    /// Replace the contents of a file.
    Write { path: String, text: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl std::process::Termination for ExitCode {
    fn report(self) -> std::process::ExitCode {
        (self as u8).into()
    }
}

impl Command {
    fn run(&self) -> Result<ExitCode> {
        let mut stdout = BufWriter::new(std::io::stdout());
        match self {
            Command::Cat { path } => {
                stdout.write_all(&Path::parse(path)?.read_bytes()?)?;
            }
            Command::Exists { path } => {
                writeln!(stdout, "{}", Path::parse(path)?.exists()?)?;
            }
            Command::Ls { path } => {
                for child in Path::parse(path)?.iterdir()? {
                    writeln!(stdout, "{}", child?)?;
                }
            }
            Command::Mkdir {
                path,
                parents,
                exist_ok,
            } => Path::parse(path)?.mkdir(*parents, *exist_ok)?,
            Command::Parse { path } => {
                let path = PurePath::new(path)?;
                writeln!(stdout, "kind: {}", path.kind())?;
                writeln!(stdout, "path: {path}")?;
                writeln!(stdout, "drive: {}", path.drive())?;
                writeln!(stdout, "root: {}", path.root())?;
                writeln!(stdout, "anchor: {}", path.anchor())?;
                writeln!(stdout, "parts: {:?}", path.parts())?;
                writeln!(stdout, "name: {}", path.name())?;
                writeln!(stdout, "suffix: {}", path.suffix())?;
                writeln!(stdout, "parent: {}", path.parent())?;
                if let Ok(uri) = path.as_uri() {
                    writeln!(stdout, "uri: {uri}")?;
                }
            }
            Command::Rm { path, force } => Path::parse(path)?.unlink(*force)?,
            Command::Rmdir { path } => Path::parse(path)?.rmdir()?,
            Command::Touch { path, no_exist_ok } => Path::parse(path)?.touch(!no_exist_ok)?,
            Command::Write { path, text } => Path::parse(path)?.write_text(text)?,
        }
        stdout.flush()?;
        Ok(ExitCode::Success)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let start_time = Instant::now();
    let trace_level = if args.debug {
        Level::TRACE
    } else {
        Level::INFO
    };
    trace::enable_tracing(&args.trace_time, trace_level);
    let result = args.command.run();
    debug!(elapsed = ?start_time.elapsed());
    match result {
        Err(err) => {
            error!("{err}");
            let mut err: &dyn Error = &err;
            while let Some(source) = err.source() {
                error!("caused by: {source}");
                err = source;
            }
            ExitCode::Failure
        }
        Ok(exit_code) => exit_code,
    }
}

#[test]
fn verify_clap() {
    use clap::CommandFactory;
    Args::command().debug_assert()
}
