use anyhow::{bail, Context, Result};
use clap::Parser as ClapParser;
use cstruct::registry::{StructDecl, TypeRegistry};
use cstruct::report::LayoutReport;
use ron::ser::PrettyConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Clone, Copy, Debug)]
enum OutputFormat {
    Text,
    Ron,
}

fn parse_output_format(s: &str) -> Result<OutputFormat, &'static str> {
    match s {
        "text" => Ok(OutputFormat::Text),
        "ron" => Ok(OutputFormat::Ron),
        _ => Err("Invalid output format, expected `text` or `ron`"),
    }
}

/// Prints the native memory layout of the structures declared in a RON file.
#[derive(ClapParser, Debug)]
#[command(version, about)]
struct Args {
    input_file: PathBuf,

    #[arg(short, long, value_parser = parse_output_format, default_value = "text")]
    format: OutputFormat,

    /// Only report this structure.
    #[arg(short = 's', long = "struct")]
    only: Option<String>,
}

fn run(args: Args) -> Result<()> {
    let Args {
        input_file,
        format,
        only,
    } = args;

    let source = fs::read_to_string(&input_file)
        .with_context(|| format!("failed to read {}", input_file.display()))?;
    let decls: Vec<StructDecl> = ron::from_str(&source)
        .with_context(|| format!("failed to parse {}", input_file.display()))?;

    let mut registry = TypeRegistry::with_primitives();
    let declared = registry.declare(&decls)?;

    let reports = declared
        .iter()
        .filter(|d| only.as_deref().map_or(true, |name| d.name() == name))
        .map(|d| LayoutReport::from_descriptor(d))
        .collect::<Vec<_>>();

    if let (Some(name), true) = (&only, reports.is_empty()) {
        bail!("no structure named `{}` in {}", name, input_file.display());
    }

    match format {
        OutputFormat::Text => {
            for report in &reports {
                println!("{}", report);
            }
        }
        OutputFormat::Ron => {
            println!("{}", ron::ser::to_string_pretty(&reports, PrettyConfig::default())?);
        }
    }

    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run(Args::parse()) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}
