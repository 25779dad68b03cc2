use std::path::PathBuf;
use std::process;

use automail::config::AutomailConfig;
use automail::{logging, sim};
use clap::{Parser, Subcommand};

/// Automail robot allocation simulator
#[derive(Parser, Debug)]
#[command(name = "automail")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file with [weights] and [simulation] tables
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the demo and print a summary (default)
    Demo,

    /// Run one benchmark and print a CSV row
    Bench {
        #[arg(long)]
        robots: Option<usize>,
        #[arg(long)]
        items: Option<usize>,
        #[arg(long)]
        floors: Option<u32>,
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Sweep robot and item counts, one CSV row per combination
    Stress {
        /// Comma-separated robot counts
        #[arg(long, value_delimiter = ',', default_values_t = vec![1usize, 2, 3, 4, 8])]
        robot_sets: Vec<usize>,
        /// Comma-separated mail item counts
        #[arg(long, value_delimiter = ',', default_values_t = vec![50usize, 200, 1000])]
        item_sets: Vec<usize>,
    },
}

fn load_config(path: Option<&PathBuf>) -> AutomailConfig {
    let Some(path) = path else {
        return AutomailConfig::default();
    };
    match AutomailConfig::load(path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("config error: {err}");
            process::exit(2);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = logging::init() {
        eprintln!("failed to initialise logging: {err}");
    }
    let mut config = load_config(cli.config.as_ref());

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => sim::run_demo(&config),
        Commands::Bench {
            robots,
            items,
            floors,
            seed,
        } => {
            let sim_config = &mut config.simulation;
            if let Some(robots) = robots {
                sim_config.robots = robots;
            }
            if let Some(items) = items {
                sim_config.mail_items = items;
            }
            if let Some(floors) = floors {
                sim_config.floors = floors;
            }
            if let Some(seed) = seed {
                sim_config.seed = seed;
            }
            if let Err(err) = config.simulation.validate() {
                eprintln!("benchmark error: {err}");
                process::exit(2);
            }
            sim::run_benchmark(&config);
        }
        Commands::Stress {
            robot_sets,
            item_sets,
        } => {
            if let Err(err) = sim::run_stress(&config, &robot_sets, &item_sets) {
                eprintln!("stress error: {err}");
                process::exit(2);
            }
        }
    }
}
