//! `oac`: OpenAPI converter CLI.
//!
//! `convert` turns OpenAPI documents (optionally spread over several files)
//! into Nginx location blocks and VitePress pages. `sync` copies
//! documentation into place according to a regex mapping.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use oac_emit::{Conversion, ConvertOptions, Converter};
use oac_spec::DEFAULT_MAX_DEPTH;
use oac_sync::{DocSyncer, SyncedEntry};
use oac_telemetry::{LogFormat, TelemetryConfig};

mod config;
mod inputs;

use config::ConverterConfig;
use inputs::expand_input;

#[derive(Parser, Debug)]
#[command(
    name = "oac",
    about = "Convert OpenAPI specifications into Nginx routing and VitePress docs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log level filter. `RUST_LOG` takes precedence.
    #[arg(long, global = true, env = "OAC_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log output format (pretty or json).
    #[arg(
        long,
        global = true,
        env = "OAC_LOG_FORMAT",
        default_value = "pretty",
        value_parser = parse_log_format
    )]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert OpenAPI documents into Nginx configuration and VitePress docs.
    Convert(ConvertArgs),

    /// Synchronize documentation files using a regex mapping.
    Sync {
        /// JSON mapping file, or an inline JSON object.
        #[arg(short = 's', long = "sync-map")]
        sync_map: String,
    },
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Files, directories or glob patterns.
    #[arg(required = true, num_args = 1..)]
    inputs: Vec<String>,

    /// Output directory for Nginx configuration files.
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Output directory for VitePress API documentation.
    #[arg(short = 'd', long)]
    docs: Option<PathBuf>,

    /// VitePress index.md to update with a feature card per API.
    #[arg(short = 'i', long)]
    index: Option<PathBuf>,

    /// Prefix for generated file names.
    #[arg(long)]
    file_prefix: Option<String>,

    /// Path prefix for docs and Nginx rewrites, instead of the derived one.
    #[arg(long)]
    common_prefix: Option<String>,

    /// Generate an introduction page.
    #[arg(long)]
    write_introduction: bool,

    /// Merge allOf response definitions into single inline objects.
    #[arg(long)]
    merge_responses_inline: bool,

    /// Maximum schema nesting depth while resolving references.
    #[arg(long)]
    max_depth: Option<usize>,

    /// YAML file with defaults for the options above.
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConvertArgs {
    /// Merge flags over the config file.
    fn options(&self) -> anyhow::Result<ConvertOptions> {
        let file = match &self.config {
            Some(path) => ConverterConfig::load(path)?,
            None => ConverterConfig::default(),
        };

        let mut options = ConvertOptions::new()
            .with_file_prefix(
                self.file_prefix
                    .clone()
                    .or(file.file_prefix)
                    .unwrap_or_default(),
            )
            .with_introduction(self.write_introduction || file.write_introduction.unwrap_or(false))
            .with_merge_responses_inline(
                self.merge_responses_inline || file.merge_responses_inline.unwrap_or(false),
            )
            .with_max_depth(self.max_depth.or(file.max_depth).unwrap_or(DEFAULT_MAX_DEPTH));

        options.output_dir = self.output.clone().or(file.output);
        options.docs_dir = self.docs.clone().or(file.docs);
        options.index_path = self.index.clone().or(file.index);
        options.common_prefix = self.common_prefix.clone().or(file.common_prefix);
        Ok(options)
    }
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    LogFormat::parse(s).ok_or_else(|| format!("unknown log format '{s}' (expected pretty or json)"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = TelemetryConfig::new()
        .with_log_level(&cli.log_level)
        .with_log_format(cli.log_format);
    if let Err(e) = oac_telemetry::init(&telemetry) {
        eprintln!("warning: {e}");
    }

    match cli.command {
        Command::Convert(args) => run_convert(&args),
        Command::Sync { sync_map } => run_sync(&sync_map),
    }
}

fn run_convert(args: &ConvertArgs) -> ExitCode {
    let options = match args.options() {
        Ok(options) => options,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    let converter = Converter::new(options);

    let mut converted = 0usize;
    let mut failed = 0usize;

    for pattern in &args.inputs {
        let files = match expand_input(pattern) {
            Ok(files) => files,
            Err(e) => {
                eprintln!("error: {e:#}");
                failed += 1;
                continue;
            }
        };

        for file in files {
            match converter
                .convert(&file)
                .with_context(|| format!("failed to convert {}", file.display()))
            {
                Ok(conversion) => {
                    report(&conversion);
                    converted += 1;
                }
                Err(e) => {
                    oac_telemetry::log_conversion_failed!(
                        file = %file.display(),
                        error = %format!("{e:#}")
                    );
                    eprintln!("error: {e:#}");
                    failed += 1;
                }
            }
        }
    }

    if failed > 0 {
        eprintln!("{converted} converted, {failed} failed");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn report(conversion: &Conversion) {
    let file = conversion.input.display();
    oac_telemetry::log_spec_loaded!(
        file = %file,
        external_components = conversion.external_components
    );
    oac_telemetry::log_spec_validated!(file = %file, common_prefix = %conversion.common_prefix);

    if conversion.merged_schemas > 0 {
        println!(
            "✓ Merged {} response definition(s) for {file}",
            conversion.merged_schemas
        );
    }
    for artifact in &conversion.artifacts {
        oac_telemetry::log_artifact_written!(file = %artifact.display());
        println!("✓ Wrote {}", artifact.display());
    }
    if let Some(index) = &conversion.index_updated {
        println!("✓ Updated index features in {}", index.display());
    }
}

fn run_sync(sync_map: &str) -> ExitCode {
    match sync(sync_map) {
        Ok(entries) => {
            for entry in &entries {
                oac_telemetry::log_file_synced!(
                    source = %entry.source.path().display(),
                    destination = %entry.destination.display()
                );
                println!(
                    "Synced: {} -> {}",
                    entry.source.path().display(),
                    entry.destination.display()
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn sync(sync_map: &str) -> anyhow::Result<Vec<SyncedEntry>> {
    let base_dir = std::env::current_dir().context("failed to determine working directory")?;
    let syncer =
        DocSyncer::from_input(sync_map, base_dir).context("failed to initialize syncer")?;
    Ok(syncer.execute()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ConvertArgs {
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Convert(args) => args,
            other => panic!("expected convert, got {other:?}"),
        }
    }

    #[test]
    fn flags_map_onto_options() {
        let args = parse(&[
            "oac",
            "convert",
            "api.yaml",
            "-o",
            "nginx",
            "-d",
            "docs",
            "--file-prefix",
            "users-",
            "--write-introduction",
            "--max-depth",
            "8",
        ]);
        let options = args.options().unwrap();

        assert_eq!(options.output_dir, Some(PathBuf::from("nginx")));
        assert_eq!(options.docs_dir, Some(PathBuf::from("docs")));
        assert_eq!(options.file_prefix, "users-");
        assert!(options.write_introduction);
        assert!(!options.merge_responses_inline);
        assert_eq!(options.resolve.max_depth, 8);
        assert_eq!(options.common_prefix, None);
    }

    #[test]
    fn flags_override_config_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = temp.path().join("oac.yaml");
        std::fs::write(
            &config,
            "common_prefix: v2\nfile_prefix: cfg-\nmerge_responses_inline: true\n",
        )
        .unwrap();

        let args = parse(&[
            "oac",
            "convert",
            "api.yaml",
            "--common-prefix",
            "v1",
            "--config",
            &config.to_string_lossy(),
        ]);
        let options = args.options().unwrap();

        assert_eq!(options.common_prefix.as_deref(), Some("v1"));
        assert_eq!(options.file_prefix, "cfg-");
        assert!(options.merge_responses_inline);
        assert_eq!(options.resolve.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn log_format_is_validated() {
        assert!(Cli::try_parse_from(["oac", "--log-format", "xml", "sync", "-s", "{}"]).is_err());
        assert!(Cli::try_parse_from(["oac", "--log-format", "json", "sync", "-s", "{}"]).is_ok());
    }
}
