use clap::{Parser, Subcommand};
use tns_rust::error::TnsError;
use tns_rust::TnsNames;

use std::io::{self, Read};
use std::path::PathBuf;

/// Inspect tnsnames.ora files.
#[derive(Parser)]
#[command(name = "tns", version, about)]
struct Cli {
    /// Show info-level logs (honours RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all logs
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the parsed table as JSON
    Json {
        /// File to read; stdin when omitted or `-`
        path: Option<PathBuf>,
        #[arg(long)]
        pretty: bool,
        /// Order aliases by name
        #[arg(long)]
        sort: bool,
    },
    /// Print one alias, or all of them, as TNS text
    Show {
        path: Option<PathBuf>,
        alias: Option<String>,
        #[arg(long)]
        sort: bool,
    },
    /// Print aliases whose name or values match a regular expression
    Search {
        term: String,
        path: Option<PathBuf>,
        #[arg(long)]
        case_sensitive: bool,
    },
    /// Print alias names
    List {
        path: Option<PathBuf>,
        #[arg(long)]
        sort: bool,
    },
}

fn init_tracing(cli: &Cli) {
    let filter = if cli.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(err) = run(cli.command) {
        eprintln!("error: {} ({})", err, err.code());
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), TnsError> {
    match command {
        Commands::Json { path, pretty, sort } => {
            let mut names = load(path.as_ref())?;
            if sort {
                names.sort();
            }
            let json = if pretty {
                names.to_json_pretty()?
            } else {
                names.to_json()?
            };
            println!("{}", json);
        }
        Commands::Show { path, alias, sort } => {
            let mut names = load(path.as_ref())?;
            match alias {
                Some(alias) => match names.entry_string(&alias) {
                    Some(text) => println!("{}", text),
                    None => return Err(TnsError::Lookup(alias)),
                },
                None => print!("{}", names.all_entries_string(sort)),
            }
        }
        Commands::Search {
            path,
            term,
            case_sensitive,
        } => {
            let names = load(path.as_ref())?;
            for name in names.search(&term, case_sensitive)? {
                println!("{}", name);
            }
        }
        Commands::List { path, sort } => {
            let mut names = load(path.as_ref())?;
            if sort {
                names.sort();
            }
            for (name, _) in names.iter() {
                println!("{}", name);
            }
        }
    }
    Ok(())
}

fn load(path: Option<&PathBuf>) -> Result<TnsNames, TnsError> {
    // Empty-input warnings are reported through tracing.
    let mut names = TnsNames::new();
    match path {
        Some(path) if path.as_os_str() != "-" => names.parse_file(path)?,
        _ => {
            let mut input = Vec::new();
            io::stdin()
                .read_to_end(&mut input)
                .map_err(|source| TnsError::Io {
                    path: PathBuf::from("<stdin>"),
                    source,
                })?;
            names.parse_bytes(&input)?
        }
    };
    Ok(names)
}
