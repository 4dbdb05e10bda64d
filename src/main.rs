//! verikit CLI entry point.
//!
//! Parses command-line arguments and either opens the IDE window or runs the
//! headless artifact cleanup.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use verikit::gui::run_gui;
use verikit::{PipelineCoordinator, ToolConfig, WorkspaceState};

#[derive(Parser)]
#[command(name = "verikit")]
#[command(
    version,
    about = "Verilog IDE wrapping iverilog, yosys, graphviz and gtkwave",
    after_help = "EXAMPLES:
    # Open the IDE in the current directory
    verikit

    # Open the IDE rooted at a project directory
    verikit rtl/counter

    # Remove generated artifacts without opening the IDE
    verikit clean rtl/counter"
)]
struct Cli {
    /// Project directory to open (defaults to the current directory)
    dir: Option<PathBuf>,

    /// Echo external tool command lines into the terminal log
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove generated artifacts (simulation binary, schematic files, traces)
    Clean {
        /// Directory to clean (defaults to the current directory)
        dir: Option<PathBuf>,
    },
}

fn clean_command(dir: PathBuf) -> verikit::Result<()> {
    let config = ToolConfig::load(&dir)?;
    let workspace = WorkspaceState::new(dir)?;
    PipelineCoordinator::new(&config).clean(&workspace, |line| println!("{line}"));
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Clean { dir }) => clean_command(dir.unwrap_or_else(|| PathBuf::from("."))),
        None => run_gui(
            cli.dir.unwrap_or_else(|| PathBuf::from(".")),
            cli.verbose,
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
