mod utils;
mod logger;
mod budget;
mod goal_seek;
mod prompts;
mod scenarios;
mod sweep;
mod charts;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::Ordering;

use goal_seek::{solve_logged, SeekSettings};
use logger::{Logger, LogEvent, ConsoleReceiver};
use prompts::Prompter;
use utils::{RAND_SEED, TOTAL_SEARCHES};

fn print_help() {
    println!("=== Campaign Budget Optimization Help ===");
    println!("Usage: goalseek [help | --h | test | sweep [runs] [start_seed] | chart] [options]");
    println!();
    println!("goalseek help | --h: Displays this help message.");
    println!("goalseek test: Runs the reference campaigns and validates each solved budget.");
    println!("goalseek sweep [runs] [start_seed]: Solves and validates randomly generated campaigns.");
    println!("goalseek chart: Renders the cost curve of the first reference campaign to charts/cost_curve.png.");
    println!("To run the program in regular mode, simply use: goalseek");
    println!();
    println!("Options:");
    println!(
        "  --tolerance <value>       Stop when the search interval is narrower than this (default {})",
        utils::DEFAULT_TOLERANCE
    );
    println!(
        "  --max-iterations <n>      Give up after this many bisection steps (default {})",
        utils::DEFAULT_MAX_ITERATIONS
    );
    println!("  --verbose search          Write every bisection step to log/<case>/search.log");
    println!("  --fastbreak               Stop test or sweep at the first failure");
    println!();
    println!("In regular mode, the program prompts for the ads, fees and approved budget.");
    println!();
}

/// Parse the numeric argument at `position`, exiting with a message when it is malformed
fn parse_arg<T: std::str::FromStr>(args: &[String], position: usize, name: &str, default: T) -> T {
    match args.get(position) {
        None => default,
        Some(text) => match text.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                eprintln!("Error: Invalid {} parameter '{}'. Expected a number.", name, text);
                std::process::exit(1);
            }
        },
    }
}

/// Regular mode: prompt for a campaign and print the maximum budget of the chosen ad
fn run_interactive(settings: SeekSettings) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Campaign Budget Optimization ===");

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let request = prompter.collect_request(settings)?;

    let mut logger = Logger::new();
    logger.add_file_receiver_or_warn(
        &PathBuf::from("log/interactive.log"),
        vec![LogEvent::Iteration, LogEvent::Convergence],
    );

    match solve_logged(&request, &mut logger) {
        Ok(outcome) => {
            println!();
            println!(
                "The maximum budget for ad {} is: {:.2}",
                utils::ad_label(request.target_index),
                outcome.max_spend
            );
            println!("=======================================");
        }
        Err(e) => {
            println!("Goal seek failed: {}", e);
        }
    }
    Ok(())
}

fn main() {
    let raw_args: Vec<String> = std::env::args().collect();

    // Pull out option flags, leaving the command and its positional arguments
    let mut args = Vec::new();
    let mut settings = SeekSettings::default();
    let mut fastbreak = false;
    let mut i = 0;
    while i < raw_args.len() {
        let arg = &raw_args[i];
        match arg.as_str() {
            "--verbose" => {
                if i + 1 < raw_args.len() && raw_args[i + 1] == "search" {
                    utils::VERBOSE_SEARCH.store(true, Ordering::Relaxed);
                    i += 1;
                }
            }
            "--fastbreak" => fastbreak = true,
            "--tolerance" => {
                settings.tolerance = parse_arg(&raw_args, i + 1, "tolerance", settings.tolerance);
                i += 1;
            }
            "--max-iterations" => {
                settings.max_iterations = parse_arg(&raw_args, i + 1, "max-iterations", settings.max_iterations);
                i += 1;
            }
            _ => args.push(arg.clone()),
        }
        i += 1;
    }

    if args.len() < 2 {
        if let Err(e) = run_interactive(settings) {
            eprintln!("An error occurred: {}", e);
            std::process::exit(1);
        }
        return;
    }

    match args[1].as_str() {
        "help" | "--h" => print_help(),
        "test" => {
            let mut logger = Logger::new();
            logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Scenario, LogEvent::Validation]));
            logger.add_file_receiver_or_warn(&PathBuf::from("log/summary.log"), vec![LogEvent::Validation]);

            logln!(logger, LogEvent::Validation, "=== Campaign Budget Optimization - Test Mode ===");
            let failures = scenarios::run_catalog(settings, fastbreak, &mut logger);
            logln!(logger, LogEvent::Validation, "=======================================");
            logln!(logger, LogEvent::Validation, "Total goal seeks completed: {}", TOTAL_SEARCHES.load(Ordering::Relaxed));
            let _ = logger.flush();
            if failures > 0 {
                std::process::exit(1);
            }
        }
        "sweep" => {
            let runs = parse_arg(&args, 2, "runs", 100u64);
            let start_seed = parse_arg(&args, 3, "start seed", 0u64);

            let mut logger = Logger::new();
            logger.add_receiver(ConsoleReceiver::new(vec![LogEvent::Validation]));
            logln!(logger, LogEvent::Validation, "Running {} random campaigns from seed {}...\n", runs, start_seed);
            let failures = sweep::run_sweep(runs, start_seed, settings, fastbreak, &mut logger);
            if failures > 0 {
                eprintln!("Last seed run: {}", RAND_SEED.load(Ordering::Relaxed));
                std::process::exit(1);
            }
        }
        "chart" => {
            if let Err(e) = charts::generate_cost_curve_chart(settings) {
                eprintln!("Error generating cost curve chart: {}", e);
                std::process::exit(1);
            }
        }
        _ => {
            println!("Invalid argument. Use help or --h for usage information.");
        }
    }
}
