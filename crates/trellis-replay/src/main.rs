//! Command-line entry point.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "trellis-replay")]
#[command(about = "Replay pointer gestures on a diagram and print the emitted edits", long_about = None)]
struct Args {
    /// Scene file: diagram snapshot plus its layout
    #[arg(value_name = "SCENE")]
    scene: PathBuf,

    /// Gesture script
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// Editor configuration (JSON); defaults are used when omitted
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,
}

fn run(args: &Args) -> Result<(), trellis_replay::ReplayError> {
    let scene = trellis_replay::load_scene(&args.scene)?;
    let script = trellis_replay::load_script(&args.script)?;
    let config = trellis_replay::load_config(args.config.as_deref())?;

    let steps = trellis_replay::replay(scene, &script, config)?;
    log::info!("{} edits emitted", steps.len());
    trellis_replay::write_steps(&steps, std::io::stdout().lock())
}

fn main() -> ExitCode {
    env_logger::init();
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
