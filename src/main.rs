use clap::Parser;
use dashmap::DashSet;
use log::{error, info, warn};
use std::process::ExitCode;

use voc2yolo::config::{ClassesArgs, ConvertArgs, SplitArgs};
use voc2yolo::io::{write_report, write_vocabulary_file};
use voc2yolo::utils::create_io_thread_pool;
use voc2yolo::{
    convert_directory, extract_classes, split_dataset, Args, Command, ConfigError,
    ProcessingStats, SplitConfig,
};

fn main() -> ExitCode {
    // Initialize the logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let pool = match create_io_thread_pool(args.workers) {
        Ok(pool) => pool,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match &args.command {
        Command::Convert(convert_args) => run_convert(convert_args, &pool),
        Command::Split(split_args) => pool.install(|| run_split(split_args)),
        Command::Classes(classes_args) => pool.install(|| run_classes(classes_args)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_convert(args: &ConvertArgs, pool: &rayon::ThreadPool) -> Result<(), ConfigError> {
    let vocabulary = args
        .vocabulary
        .load()?
        .ok_or(ConfigError::EmptyVocabulary)?;
    info!("Using {} classes: {:?}", vocabulary.len(), vocabulary.names());

    let mut stats = ProcessingStats::new();
    let mut converted_dirs = 0;
    let written = DashSet::new();
    for label_dir in &args.label_dirs {
        let output_dir = args.output_dir.as_deref();
        match convert_directory(label_dir, &vocabulary, output_dir, &written, pool) {
            Ok(dir_stats) => {
                stats.merge(&dir_stats);
                converted_dirs += 1;
            }
            // a bad directory does not stop the others
            Err(e) => error!("{}. Skipping.", e),
        }
    }
    stats.print_summary();

    if let Some(report) = &args.report {
        write_report(report, &stats)?;
    }
    if converted_dirs == 0 {
        return Err(ConfigError::NoDirectoriesConverted);
    }
    Ok(())
}

fn run_split(args: &SplitArgs) -> Result<(), ConfigError> {
    let vocabulary = args.vocabulary.load()?;
    let config = SplitConfig {
        images_dir: args.images_dir.clone(),
        annotations_dir: args.annotations_dir.clone(),
        output_dir: args.output_dir.clone(),
        train_ratio: args.train_size,
        seed: args.seed,
    };

    let stats = split_dataset(&config, vocabulary.as_ref())?;
    let unmatched = stats.train.unmatched + stats.val.unmatched;
    if unmatched > 0 {
        warn!("{} images had no matching annotation", unmatched);
    }

    if let Some(report) = &args.report {
        write_report(report, &stats)?;
    }
    Ok(())
}

fn run_classes(args: &ClassesArgs) -> Result<(), ConfigError> {
    let summary = extract_classes(&args.annotations_dir)?;
    if summary.counts.is_empty() {
        error!("Could not find any classes. Please check the annotations directory.");
        return Ok(());
    }

    summary.print_counts();
    // YAML block on stdout, everything else through the logger
    println!("{}", summary.to_yaml_snippet());

    if let Some(path) = &args.write_vocabulary {
        write_vocabulary_file(path, &summary.names())?;
        info!("Wrote {} class names to {}", summary.counts.len(), path.display());
    }
    if let Some(report) = &args.report {
        write_report(report, &summary)?;
    }
    Ok(())
}
