//! Headless entry point: replay an event script and write the report.

mod args;
mod error;
mod script;

use args::Args;
use clap::Parser;
use defectmark_core::EditorConfig;
use error::CliResult;
use script::Script;
use std::path::Path;
use std::process::ExitCode;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting DefectMark");

    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Args) -> CliResult<EditorConfig> {
    if let Some(path) = &args.config {
        return Ok(EditorConfig::load(path)?);
    }
    match EditorConfig::default_path() {
        Some(path) => Ok(EditorConfig::load_or_default(&path)?),
        None => Ok(EditorConfig::default()),
    }
}

fn run(args: &Args) -> CliResult<()> {
    let config = load_config(args)?;
    let script = Script::load(&args.script)?;
    let base_dir = args.script.parent().unwrap_or(Path::new("."));
    let image_size = script.image_size(base_dir)?;
    log::info!(
        "Replaying {} steps on a {}x{} image",
        script.steps.len(),
        image_size.0,
        image_size.1
    );

    let (canvas, stats) = script.replay(config, image_size)?;
    log::info!(
        "Replay done: {} shapes completed, {} edits, {} annotations",
        stats.completed_shapes,
        stats.edits,
        canvas.document.len()
    );

    let name = script.image_name().unwrap_or_else(|| canvas.document.id.clone());
    let report = canvas.export_report(Some(name));
    match &args.output {
        Some(path) => {
            report.save(path)?;
            log::info!("Wrote report to {}", path.display());
        }
        None => println!("{}", report.to_json()?),
    }
    Ok(())
}
