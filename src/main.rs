use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use nibrs_extract::cli::{self, Args, Commands, SchemaArgs, SegmentArgs};
use nibrs_extract::layout::LayoutParser;
use nibrs_extract::processor::{DatasetProcessor, convert_segment};
use std::process;

fn main() {
    let args = Args::parse();
    cli::setup_logging(&args);

    match run(args) {
        Ok(()) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

fn run(args: Args) -> Result<()> {
    let quiet = args.quiet;

    match args.command {
        Commands::Extract(extract) => {
            let mut config = extract.output.to_config(quiet);
            config.compress = extract.gzip;
            config.fail_fast = extract.fail_fast;

            let processor =
                DatasetProcessor::new(extract.dataset_path.clone(), extract.output_path.clone())
                    .with_context(|| {
                        format!("Cannot open dataset {}", extract.dataset_path.display())
                    })?
                    .with_config(config);

            let stats = processor.process()?;
            if stats.segments_failed > 0 {
                anyhow::bail!(
                    "{} of {} segments failed",
                    stats.segments_failed,
                    stats.segments_failed + stats.segments_processed
                );
            }
            Ok(())
        }
        Commands::Segment(segment) => run_segment(&segment, quiet),
        Commands::Schema(schema) => run_schema(&schema),
    }
}

fn run_segment(args: &SegmentArgs, quiet: bool) -> Result<()> {
    let config = args.output.to_config(quiet);
    let (csv_path, labels_path) = args.get_output_paths();

    if csv_path == args.data || labels_path == args.data {
        anyhow::bail!(
            "Output would overwrite the input data file {}",
            args.data.display()
        );
    }

    let output = convert_segment(
        &args.layout,
        &args.data,
        &csv_path,
        &labels_path,
        &config,
        None,
    )
    .with_context(|| format!("Failed to convert {}", args.data.display()))?;

    if !quiet {
        println!(
            "{} {} rows x {} fields -> {}",
            "Converted".bright_green(),
            output.rows_written.to_string().bright_white().bold(),
            output.fields,
            output.csv_path.display()
        );
        println!(
            "  {} {}",
            "Labels:".bright_cyan(),
            output.labels_path.display()
        );
    }
    Ok(())
}

fn run_schema(args: &SchemaArgs) -> Result<()> {
    let schema = LayoutParser::new()
        .with_label_policy(cli::label_policy(args.strict_labels))
        .parse_file(&args.layout)
        .with_context(|| format!("Failed to parse {}", args.layout.display()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    println!(
        "{} {} fields, record length {}",
        "Layout:".bright_cyan(),
        schema.len(),
        schema.record_length()
    );
    for field in schema.fields() {
        println!(
            "  {} {:>6}-{:<6} {:>4}  {}",
            format!("{:<12}", field.name).bright_white(),
            field.start,
            field.end,
            field.width(),
            field.label_or_empty()
        );
    }
    Ok(())
}
