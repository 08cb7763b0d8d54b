use clap::{Parser, Subcommand, ValueEnum};
use log::LevelFilter;
use mediamill::{config, dispatch::StandardDispatch, logging, output, process};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediamill")]
#[command(about = "Config-driven batch media converter")]
#[command(long_about = "\
Config-driven batch media converter

Walks an input directory, matches each file's extension against the media
sections of config.toml, and writes the result to the same relative path
under the output directory. Images run through the operations listed in
their section, top to bottom:

  [image]
  input_exts = [\"bmp\", \"png\"]
  output_ext = \"png\"
  rotate = 90
  resize = { width = 800, height = 600, method = \"fit\" }

Files no section matches are copied verbatim (copy_other_files) or skipped.

Run 'mediamill gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Console log level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info, global = true)]
    log_level: LogLevel,

    /// Directory for the persisted log file
    #[arg(long, default_value = "logs", global = true)]
    log_dir: PathBuf,

    /// Do not write a log file
    #[arg(long, global = true)]
    no_log_file: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Convert the input tree into the output tree (default)
    Run,
    /// Validate config.toml and every media section's operations without touching files
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

#[derive(ValueEnum, Clone, Copy)]
enum LogLevel {
    Debug,
    Info,
    #[value(alias = "warn")]
    Warning,
    Error,
}

impl LogLevel {
    fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run);

    if let Command::GenConfig = command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    if let Some(path) = logging::init(cli.log_level.filter(), log_dir)? {
        log::debug!("Writing log to {}", path.display());
    }

    let result = match command {
        Command::Check => check(&cli),
        _ => run(&cli),
    };
    if let Err(e) = &result {
        log::error!("{e}");
    }
    log::logger().flush();
    result
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(&cli.config)?;
    log::info!("Loaded configuration from {}", cli.config.display());
    log::debug!(
        "Media sections: {}",
        config
            .media
            .iter()
            .map(|m| m.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_run_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(&config, Some(tx));
    printer
        .join()
        .map_err(|_| "progress printer thread panicked")?;
    result?;
    Ok(())
}

fn check(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = config::load_config(&cli.config)?;
    println!("==> Checking {}", cli.config.display());
    let problems = process::check_config(&StandardDispatch, &config);
    for line in output::format_check_report(&config, &problems) {
        println!("{}", line);
    }
    if problems.is_empty() {
        println!("==> Configuration is valid");
        Ok(())
    } else {
        Err(format!("{} media section(s) have problems", problems.len()).into())
    }
}
