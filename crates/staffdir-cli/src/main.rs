use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::{fs, str::FromStr};

use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use staffdir::DEFAULT_DIRECTORY_URL;
use staffdir::analysis::StaffSummary;
use staffdir::parse_staff_directory;
use staffdir::scraper::StaffScraper;
use staffdir::types::{OfficeAssignment, RowRangePolicy, StaffDirectory};

#[derive(Parser)]
#[command(name = "staffdir")]
#[command(about = "A university staff directory scraper", long_about = None)]
struct Cli {
    #[arg(
        short = 'l',
        long = "log-level",
        value_enum,
        default_value = "info",
        global = true,
        help = "Set the logging level"
    )]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SummaryFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OfficeMode {
    /// Each person belongs to the nearest office header above them
    Structural,
    /// Office headers own fixed row ranges (see --row-ranges)
    RowRanges,
}

#[derive(Debug, Args)]
struct OfficeArgs {
    #[arg(
        long,
        value_enum,
        default_value = "structural",
        help = "How office labels are attached to people"
    )]
    offices: OfficeMode,

    #[arg(
        long,
        value_name = "RANGES",
        value_parser = parse_row_ranges,
        help = "Row ranges per office header, e.g. 0-6,7-11,12,13- (with --offices row-ranges)"
    )]
    row_ranges: Option<RowRangePolicy>,
}

impl OfficeArgs {
    fn assignment(self) -> OfficeAssignment {
        match self.offices {
            OfficeMode::Structural => {
                if self.row_ranges.is_some() {
                    log::warn!("--row-ranges is ignored with --offices structural");
                }
                OfficeAssignment::Structural
            }
            OfficeMode::RowRanges => {
                OfficeAssignment::RowRanges(self.row_ranges.unwrap_or_default())
            }
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a staff directory page and print everyone listed on it
    Scrape {
        #[arg(long, default_value = DEFAULT_DIRECTORY_URL, help = "URL of the staff page")]
        url: String,

        #[command(flatten)]
        offices: OfficeArgs,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Extract people from a saved staff directory page
    Parse {
        #[arg(help = "Path to the saved HTML page")]
        file: PathBuf,

        #[command(flatten)]
        offices: OfficeArgs,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: OutputFormat,
    },
    /// Summarise titles, email domains, phone availability and office sizes
    Summary {
        #[arg(long, conflicts_with = "file", help = "URL of the staff page")]
        url: Option<String>,

        #[arg(long, help = "Path to a saved HTML page instead of fetching")]
        file: Option<PathBuf>,

        #[command(flatten)]
        offices: OfficeArgs,

        #[arg(
            short = 'o',
            long = "output",
            value_enum,
            default_value = "text",
            help = "Output format"
        )]
        format: SummaryFormat,
    },
}

fn parse_row_ranges(s: &str) -> Result<RowRangePolicy, String> {
    RowRangePolicy::from_str(s).map_err(|e| e.to_string())
}

fn serialize_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            log::error!("Error serializing to JSON: {}", e);
            process::exit(1);
        }
    }
}

async fn scrape(url: &str, assignment: &OfficeAssignment) -> StaffDirectory {
    let scraper = StaffScraper::new().unwrap_or_else(|e| {
        log::error!("Error creating scraper: {}", e);
        process::exit(1);
    });

    scraper
        .fetch_directory(url, assignment)
        .await
        .unwrap_or_else(|e| {
            log::error!("Error fetching staff directory: {}", e);
            process::exit(1);
        })
}

fn load(file: &Path, assignment: &OfficeAssignment) -> StaffDirectory {
    log::info!("Reading staff directory from {}...", file.display());

    let html = fs::read_to_string(file).unwrap_or_else(|e| {
        log::error!("Error reading {}: {}", file.display(), e);
        process::exit(1);
    });

    parse_staff_directory(&html, &file.display().to_string(), assignment).unwrap_or_else(|e| {
        log::error!("Error parsing staff directory: {}", e);
        process::exit(1);
    })
}

fn print_directory(directory: &StaffDirectory, format: OutputFormat) {
    match format {
        OutputFormat::Json => serialize_json(directory),
        OutputFormat::Csv => {
            if let Err(e) = staffdir::csv::write_records(io::stdout().lock(), &directory.records) {
                log::error!("Error writing CSV: {}", e);
                process::exit(1);
            }
        }
        OutputFormat::Text => {
            if directory.records.is_empty() {
                println!("No staff to display.");
            } else {
                print!("{}", directory);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level.clone().into())
        .init();

    match cli.command {
        Commands::Scrape {
            url,
            offices,
            format,
        } => {
            let directory = scrape(&url, &offices.assignment()).await;
            print_directory(&directory, format);
        }

        Commands::Parse {
            file,
            offices,
            format,
        } => {
            let directory = load(&file, &offices.assignment());
            print_directory(&directory, format);
        }

        Commands::Summary {
            url,
            file,
            offices,
            format,
        } => {
            let assignment = offices.assignment();
            let directory = match file {
                Some(file) => load(&file, &assignment),
                None => {
                    let url = url.as_deref().unwrap_or(DEFAULT_DIRECTORY_URL);
                    scrape(url, &assignment).await
                }
            };

            let summary = StaffSummary::from_records(&directory.records);
            match format {
                SummaryFormat::Json => serialize_json(&summary),
                SummaryFormat::Text => print!("{}", summary),
            }
        }
    }
}
