use anyhow::Result;
use clap::{Parser, Subcommand};
use repo_chunker::chunker::ChunkerRegistry;
use repo_chunker::config::Config;
use repo_chunker::curator::Curator;
use repo_chunker::pipeline::{chunk_files, collect_curated_files, Pipeline};
use repo_chunker::writer::RecordStore;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repo-chunker", version, about = "Structural code chunking with incremental rebuilds")]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "REPO_CHUNKER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the pipeline: curate, chunk, and persist records
    Run {
        /// Repository to process
        path: PathBuf,
        /// Reprocess every file instead of only changed ones
        #[arg(long)]
        full: bool,
    },
    /// Curate source files into markdown documents only
    Curate {
        /// Repository to curate
        path: PathBuf,
    },
    /// Chunk an already-curated directory
    Chunk {
        /// Directory of curated markdown documents
        input: PathBuf,
        /// Merge with previously stored records
        #[arg(long)]
        incremental: bool,
    },
    /// Report pending changes without processing
    Status {
        /// Repository to inspect
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env(),
    };

    match cli.command {
        Command::Run { path, full } => {
            let pipeline = Pipeline::new(&path, config, !full);
            let report = pipeline.run()?;
            if !report.errors.is_empty() {
                eprintln!("{} files failed:", report.errors.len());
                for error in &report.errors {
                    eprintln!("  {error}");
                }
            }
            println!(
                "Processed {} files, wrote {} chunks in {} ms",
                report.files_chunked, report.chunks_written, report.duration_ms
            );
        }
        Command::Curate { path } => {
            let repo_name = repo_name_of(&path);
            let curator = Curator::new(
                &path,
                &config.curated_dir(),
                &repo_name,
                config.curation.max_file_size,
                &config.curation.extra_ignore_patterns,
            )?;
            let written = curator.curate_all()?;
            println!("Curated {} files into {:?}", written.len(), curator.output_dir());
        }
        Command::Chunk { input, incremental } => {
            let repo_name = repo_name_of(&input);
            let inputs = collect_curated_files(&input);

            let mut registry = ChunkerRegistry::new();
            let stage = chunk_files(&inputs, &mut registry, &repo_name);
            for error in &stage.errors {
                eprintln!("  {error}");
            }

            let store = RecordStore::open(&config.chunks_dir(), &repo_name, incremental);
            let written = store.merge_and_save(stage.records, &stage.processed_sources)?;
            println!(
                "Processed {} files with a total of {} chunks",
                stage.files_chunked, written
            );
        }
        Command::Status { path } => {
            let pipeline = Pipeline::new(&path, config, true);
            let report = pipeline.status()?;
            println!(
                "{} new, {} modified, {} deleted",
                report.new_files, report.modified_files, report.deleted_files
            );
        }
    }

    Ok(())
}

fn repo_name_of(path: &PathBuf) -> String {
    path.canonicalize()
        .ok()
        .as_deref()
        .unwrap_or(path.as_path())
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "repository".to_string())
}
