//! Command-line argument parsing.

use std::path::PathBuf;

use archivist_core::Priority;
use archivist_runtime::ExtractionMode;

pub const USAGE: &str = "\
Usage: archivist [options] FILE...
       archivist [options] --source-dir DIR --document NAME [--document NAME...]

Options:
  --mode parallel|consensus            Extraction strategy (default: parallel)
  --priority speed|balanced|accuracy   Model selection bias (default: balanced)
  --config FILE                        JSON extractor configuration
  --output DIR                         Where results are written (default: results)
  --source-dir DIR                     Directory of <name>.txt documents
  --document NAME                      Document to look up in --source-dir
  help                                 Show this help message";

/// What to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Inputs {
    Files(Vec<PathBuf>),
    Named { source_dir: PathBuf, documents: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub mode: ExtractionMode,
    pub priority: Priority,
    pub config: Option<PathBuf>,
    pub output: PathBuf,
    pub inputs: Inputs,
}

/// Parsed command line, or a request for help.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(CliArgs),
    Help,
}

/// Parse arguments, excluding the program name.
pub fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut mode = ExtractionMode::default();
    let mut priority = Priority::default();
    let mut config = None;
    let mut output = PathBuf::from("results");
    let mut source_dir = None;
    let mut documents = Vec::new();
    let mut files = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| {
            iter.next()
                .cloned()
                .ok_or_else(|| format!("{} requires a value", flag))
        };
        match arg.as_str() {
            "--help" | "-h" | "help" => return Ok(Command::Help),
            "--mode" => mode = value(arg)?.parse().map_err(|e| format!("{}", e))?,
            "--priority" => priority = value(arg)?.parse().map_err(|e| format!("{}", e))?,
            "--config" => config = Some(PathBuf::from(value(arg)?)),
            "--output" => output = PathBuf::from(value(arg)?),
            "--source-dir" => source_dir = Some(PathBuf::from(value(arg)?)),
            "--document" => documents.push(value(arg)?),
            flag if flag.starts_with("--") => return Err(format!("Unknown option: {}", flag)),
            file => files.push(PathBuf::from(file)),
        }
    }

    let inputs = match (source_dir, documents.is_empty(), files.is_empty()) {
        (Some(source_dir), false, true) => Inputs::Named {
            source_dir,
            documents,
        },
        (None, true, false) => Inputs::Files(files),
        (Some(_), true, _) => return Err("--source-dir needs at least one --document".into()),
        (None, false, _) => return Err("--document needs --source-dir".into()),
        (Some(_), false, false) => {
            return Err("Give either files or --source-dir with --document, not both".into())
        }
        (None, true, true) => return Err("No input documents given".into()),
    };

    Ok(Command::Run(CliArgs {
        mode,
        priority,
        config,
        output,
        inputs,
    }))
}
