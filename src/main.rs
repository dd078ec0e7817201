//! ODBC DSN Manager - Main CLI Application

use clap::Parser;
use odbc_dsn_manager::{app::App, cli::Cli, error::ErrorReporter};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    let cli = Cli::parse();

    if cli.should_show_topic_help() {
        println!("{}", cli.display_help());
        return;
    }

    let reporter = ErrorReporter::new(cli.use_colors(), cli.verbose);

    let result = match App::new(cli) {
        Ok(app) => app.run().await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        reporter.report_error(&e);
        process::exit(e.exit_code());
    }
}
