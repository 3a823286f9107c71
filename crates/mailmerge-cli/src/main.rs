mod args;

use clap::{CommandFactory, Parser};
use log::error;
use mailmerge_core::package::{DocxPackage, MAIN_DOCUMENT_PART};
use mailmerge_core::Merger;
use std::path::Path;

#[derive(Parser)]
#[command(name = "mailmerge")]
#[command(about = "Populate merge fields in docx documents", long_about = None)]
struct Cli {
    /// Dump each file's main document XML to stdout instead of merging
    #[arg(long)]
    showxml: bool,

    /// Input/output file pairs, interleaved with name=value field assignments
    #[arg(value_name = "ARG")]
    args: Vec<String>,
}

fn main() {
    env_logger::init();

    // The original tool accepted a single-dash form of the flag.
    let argv = std::env::args().map(|a| {
        if a == "-showxml" {
            "--showxml".to_string()
        } else {
            a
        }
    });
    let cli = Cli::parse_from(argv);

    if cli.args.is_empty() {
        print_usage_and_exit();
    }

    if cli.showxml {
        show_each_file_as_xml(&cli.args);
    } else {
        merge_each_input_to_output(&cli.args);
    }
}

fn print_usage_and_exit() -> ! {
    let _ = Cli::command().print_help();
    std::process::exit(0);
}

fn show_each_file_as_xml(files: &[String]) -> ! {
    let first = Path::new(&files[0]);
    if !first.exists() {
        let message = format!("Called with --showxml {} but file not found", first.display());
        error!("{message}");
        println!("{message}");
        std::process::exit(1);
    }

    for file in files.iter().filter(|f| Path::new(f).exists()) {
        match dump_main_document_xml(Path::new(file)) {
            Ok(xml) => println!("{xml}"),
            Err(e) => error!("{}: {e}", file),
        }
    }
    std::process::exit(0);
}

fn dump_main_document_xml(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let package = DocxPackage::open(&bytes)?;
    let part = package
        .get_part(MAIN_DOCUMENT_PART)
        .ok_or_else(|| format!("no {MAIN_DOCUMENT_PART} part in {}", path.display()))?;
    Ok(String::from_utf8(part.to_vec())?)
}

fn merge_each_input_to_output(raw_args: &[String]) -> ! {
    let (files, fields) = args::split_merge_args(raw_args);
    if files.is_empty() || fields.is_empty() {
        print_usage_and_exit();
    }

    let merger = Merger::new();
    // One pair's failure is logged and the rest still run.
    for outcome in merger.merge_files(&files, &fields) {
        for err in &outcome.errors {
            error!("{err}");
        }
    }
    std::process::exit(0);
}
