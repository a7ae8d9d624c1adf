//! Fetches a database's schema descriptor and emits typed Rust accessors
//! for its tables and reducers.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::debug;
use stdbconnect::{ApiClient, Schema, StdbError, StdbResult};

mod generate;

#[derive(Parser, Debug)]
#[command(
    name = "stdb-codegen",
    about = "Generates typed Rust table accessors from a schema descriptor"
)]
struct Args {
    /// Server host, e.g. localhost:3000
    #[arg(long)]
    host: Option<String>,

    /// Database name
    #[arg(long)]
    database: Option<String>,

    /// Output path; `-` writes to standard output
    #[arg(long)]
    output: Option<PathBuf>,

    /// Read the schema descriptor from standard input instead of fetching
    #[arg(long)]
    stdin: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> StdbResult<()> {
    let descriptor = if args.stdin {
        let mut descriptor = String::new();
        std::io::stdin().read_to_string(&mut descriptor)?;
        descriptor
    } else {
        let host = args
            .host
            .as_deref()
            .ok_or(StdbError::Usage("--host is required without --stdin"))?;
        let database = args
            .database
            .as_deref()
            .ok_or(StdbError::Usage("--database is required without --stdin"))?;
        debug!("fetching schema of {database} from {host}");
        ApiClient::new(host)?.schema_descriptor(database)?
    };

    let schema = Schema::from_json(&descriptor)?;
    let code = generate::module(&schema);

    match args.output.as_deref() {
        None => {
            std::io::stdout().write_all(code.as_bytes())?;
        }
        Some(path) if path.as_os_str() == "-" => {
            std::io::stdout().write_all(code.as_bytes())?;
        }
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(path, code)?;
            debug!("wrote {}", path.display());
        }
    }
    Ok(())
}
