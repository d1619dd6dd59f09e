use clap::Parser;
use mokuro_extract::{
    Cli, ExtractError, JsonScanner, MokuroExtract, OutputFormatter, OutputLayout, OutputMode,
    OutputWriter, UserFriendlyError,
};
use std::process;

fn main() {
    let exit_code = run();
    process::exit(exit_code);
}

fn run() -> i32 {
    let cli = Cli::parse();

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let extractor = match MokuroExtract::from_cli(&cli) {
        Ok(extractor) => extractor,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    if cli.dry_run {
        return handle_dry_run(&cli, &extractor);
    }

    match extractor.extract(&cli.root) {
        Ok(report) => {
            extractor.output_formatter().print_extraction_report(&report);
            0
        }
        Err(ExtractError::NoInputFiles { root }) => {
            extractor
                .output_formatter()
                .info(&format!("No .json files found in {}. Nothing to do.", root));
            0
        }
        Err(e) => {
            extractor.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &ExtractError) -> i32 {
    match error {
        ExtractError::Cancelled => 130,
        ExtractError::NoInputFiles { .. } => 0,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "mokuro-extract.toml".to_string());

    match MokuroExtract::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  mokuro-extract <directory> --config {}", config_path);
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

fn handle_dry_run(cli: &Cli, extractor: &MokuroExtract) -> i32 {
    let formatter = extractor.output_formatter();
    let config = extractor.config();

    formatter.info("DRY RUN MODE - No files will be read or written");
    formatter.print_separator();

    formatter.info("Configuration that would be used:");
    println!("  Root: {}", cli.root.display());
    println!("  Recursive: {}", config.scan.recursive);
    match (config.scan.recursive, config.scan.max_depth) {
        (false, _) => println!("  Max depth: 1"),
        (true, Some(depth)) => println!("  Max depth: {}", depth),
        (true, None) => println!("  Max depth: unlimited"),
    }
    if !config.scan.exclude_dirs.is_empty() {
        println!("  Exclude directories: {}", config.scan.exclude_dirs.join(", "));
    }
    println!("  Output directory: {}", config.output.directory.display());
    println!("  Output file name: {}", config.output.filename);

    formatter.print_separator();

    let scan = match extractor.scan(&cli.root) {
        Ok(scan) => scan,
        Err(ExtractError::NoInputFiles { root }) => {
            formatter.info(&format!("No .json files found in {}. Nothing to do.", root));
            return 0;
        }
        Err(e) => {
            extractor.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    let statistics = JsonScanner::new(config).get_statistics(&scan.files);
    let writer = OutputWriter::new(config);

    formatter.info("Extraction plan:");
    for file in &scan.files {
        println!("  {} -> {}", file.display_path(), file.volume);
    }

    formatter.info("Outputs (only volumes with Japanese text are written):");
    match writer.layout() {
        OutputLayout::PerVolume => {
            for volume in statistics.files_by_volume.keys() {
                println!("  {}", writer.volume_path(volume).display());
            }
        }
        OutputLayout::Consolidated => {
            println!("  {}", writer.consolidated_path().display());
        }
    }

    formatter.print_separator();
    formatter.success("Dry run completed successfully");
    formatter.info("Run without --dry-run to perform the extraction");

    0
}

fn print_startup_error(error: &ExtractError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use mokuro_extract::{Config, GracefulShutdown};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::try_parse_from([
            "mokuro-extract",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();

        let exit_code = handle_generate_config(&cli);
        assert_eq!(exit_code, 0);

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[scan]"));
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let volume = temp_dir.path().join("Volume 01");
        fs::create_dir(&volume).unwrap();
        fs::write(volume.join("page.json"), r#"{"blocks":[{"lines":["本"]}]}"#).unwrap();

        let mut config = Config::default();
        config.output.directory = temp_dir.path().to_path_buf();
        let extractor = MokuroExtract::with_shutdown(
            config,
            OutputMode::Plain,
            0,
            true,
            GracefulShutdown::new_for_test(),
        );

        let cli = Cli::try_parse_from([
            "mokuro-extract",
            temp_dir.path().to_str().unwrap(),
            "--dry-run",
            "-q",
        ])
        .unwrap();

        assert_eq!(handle_dry_run(&cli, &extractor), 0);
        assert!(!temp_dir.path().join("Volume 01.txt").exists());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&ExtractError::Cancelled), 130);
        assert_eq!(
            exit_code_for(&ExtractError::NoInputFiles {
                root: ".".to_string()
            }),
            0
        );
        assert_eq!(
            exit_code_for(&ExtractError::Config {
                message: "bad".to_string()
            }),
            1
        );
    }
}
