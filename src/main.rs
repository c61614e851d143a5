use clap::Parser;
use deathlog_processor::cli::{args::Args, commands};
use std::process;

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    if let Err(error) = commands::run(args) {
        eprintln!("Error: {:#}", error);
        process::exit(1);
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("deathlog-inspect - game-server death-log inspector");
    println!("==================================================");
    println!();
    println!("Parse death-log CSV files into structured kill events and report");
    println!("per-player statistics.");
    println!();
    println!("USAGE:");
    println!("    deathlog-inspect <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    parse     Parse log files and summarise events and diagnostics");
    println!("    stats     Aggregate player statistics and print a leaderboard");
    println!("    detect    Show delimiter scores and the detected layout of a file");
    println!("    help      Show this help message or help for specific commands");
    println!();
    println!("EXAMPLES:");
    println!("    # Summarise every log under a server directory:");
    println!("    deathlog-inspect parse ./server1/deathlogs");
    println!();
    println!("    # Top 20 players by K/D on one platform:");
    println!("    deathlog-inspect stats ./logs --metric kd --limit 20 --platform PS5");
    println!();
    println!("    # Why did a file parse the way it did?");
    println!("    deathlog-inspect detect ./logs/2025.05.09-00.00.00.csv");
    println!();
    println!("For detailed help on any command, use:");
    println!("    deathlog-inspect <COMMAND> --help");
}
