use anyhow::Result;
use clap::Parser;
use mime_magic::RuleSet;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Identify file content types by magic-number signatures.
#[derive(Debug, Parser)]
#[command(name = "sniff", version)]
struct Cli {
    /// Alternate rule file to use instead of the bundled table.
    #[arg(short = 'm', long = "magic-file")]
    magic_file: Option<PathBuf>,

    /// Check that every file classifies exactly as TYPE; exit 1 otherwise.
    #[arg(long, value_name = "TYPE")]
    expect: Option<String>,

    /// Files to classify.
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rules = match &cli.magic_file {
        Some(path) => RuleSet::load(path)?,
        None => RuleSet::builtin(),
    };

    if let Some(expected) = &cli.expect {
        let mut all_match = true;
        for path in &cli.files {
            let ok = rules.is_type(path, expected)?;
            println!("{}: {}", path.display(), ok);
            all_match &= ok;
        }
        if !all_match {
            std::process::exit(1);
        }
        return Ok(());
    }

    for path in &cli.files {
        let label = match rules.classify_path(path, None)? {
            Some(classification) => classification,
            None => "data".to_string(),
        };
        println!("{}: {}", path.display(), label);
    }

    Ok(())
}
