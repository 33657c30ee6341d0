use clap::Parser;
use decompack::{
    Cli, Decompack, DecompackError, OutputFormatter, OutputMode, UserFriendlyError,
};
use std::path::PathBuf;
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();
    setup_logging(&cli);

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let Some(input_dir) = cli.input_directory.clone() else {
        eprintln!("An input directory is required");
        return 1;
    };

    let app = match Decompack::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    if cli.dry_run {
        return handle_dry_run(&app, &input_dir);
    }

    match app.run(&input_dir) {
        Ok(Some(report)) => {
            app.output_formatter().print_run_report(&report);

            if report.has_failures() {
                2
            } else {
                0
            }
        }
        Ok(None) => 0,
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &DecompackError) -> i32 {
    match error {
        DecompackError::Cancelled => 130,
        DecompackError::InvalidInputDirectory { .. } => 3,
        DecompackError::DecompilerNotFound { .. } => 4,
        DecompackError::ArchiveWrite { .. } => 5,
        DecompackError::Permission { .. } => 7,
        DecompackError::OutputDirectoryExists { .. } => 8,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("decompack.toml"));

    match Decompack::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path.display());
            println!("\nTo use this configuration:");
            println!("  decompack <input-directory> --config {}", config_path.display());
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(app: &Decompack, input_dir: &std::path::Path) -> i32 {
    let formatter = app.output_formatter();
    formatter.info("DRY RUN MODE - nothing will be extracted or written");

    match app.plan(input_dir) {
        Ok(Some(plan)) => {
            formatter.print_run_plan(&plan);
            0
        }
        Ok(None) => 0,
        Err(e) => {
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn print_startup_error(error: &DecompackError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

fn setup_logging(cli: &Cli) {
    let default_filter = if cli.quiet {
        "error"
    } else {
        match cli.verbosity_level() {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");
        let config_arg = config_path.to_string_lossy().to_string();

        let cli = Cli::try_parse_from(["decompack", "--generate-config", "--config", &config_arg])
            .unwrap();

        assert_eq!(handle_generate_config(&cli), 0);
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[archive]"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&DecompackError::Cancelled), 130);
        assert_eq!(
            exit_code_for(&DecompackError::InvalidInputDirectory {
                path: "x".to_string()
            }),
            3
        );
        assert_eq!(
            exit_code_for(&DecompackError::DecompilerNotFound {
                search_dir: ".".to_string()
            }),
            4
        );
        assert_eq!(
            exit_code_for(&DecompackError::OutputDirectoryExists {
                path: "out".to_string()
            }),
            8
        );
        assert_eq!(
            exit_code_for(&DecompackError::Config {
                message: "bad".to_string()
            }),
            1
        );
    }
}
