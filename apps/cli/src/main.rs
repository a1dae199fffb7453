mod args;
mod config;
mod dirs;
mod render;

use std::io;

use audit_app::{AppError, AppState, ensure_app_data_dir};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use args::{Cli, Command, SettingsArgs, ShowArgs};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut resolved = config::resolve(&cli).map_err(io::Error::other)?;
    if resolved.load.created {
        println!("Created config at {}.", resolved.load.path.display());
    }
    if let Command::Run(run_args) = &cli.command {
        config::apply_run_flags(&mut resolved.paths, run_args);
    }

    ensure_app_data_dir(&resolved.paths).map_err(|err| io::Error::other(err.to_string()))?;
    let app_state = AppState::new(resolved.app_config());
    if app_state.is_fresh_db() {
        tracing::info!(path = %app_state.config.db_path.display(), "creating database");
    }
    if let Err(err) = app_state.setup_db() {
        return Err(io::Error::other(format!("failed to initialize database: {}", err)).into());
    }

    let result = match &cli.command {
        Command::Run(run_args) => app_state
            .services
            .reconcile
            .run_for_date(run_args.date)
            .map(|report| render::print_run(&report)),
        Command::Settings(settings_args) => settings(&app_state, settings_args),
        Command::Show(show_args) => show(&app_state, show_args),
    };
    result.map_err(|err| io::Error::other(err.to_string()).into())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn settings(app_state: &AppState, args: &SettingsArgs) -> Result<(), AppError> {
    let service = &app_state.services.settings;
    for (key, value) in &args.set {
        let stored = service.update(key, value)?;
        println!("Set {key} = {stored}");
    }
    for key in &args.clear {
        if service.clear(key)? {
            println!("Cleared {key}");
        } else {
            println!("{key} was not set");
        }
    }
    render::print_settings(&service.get()?);
    Ok(())
}

fn show(app_state: &AppState, args: &ShowArgs) -> Result<(), AppError> {
    let reports = &app_state.services.reports;
    let output = reports.report(args.date)?;
    render::print_report(&output);
    if args.runs > 0 {
        render::print_runs(&reports.recent_runs(args.runs)?);
    }
    Ok(())
}
