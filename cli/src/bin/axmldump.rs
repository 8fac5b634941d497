use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use apkdump::Apk;
use clap::Parser;

/// Print the decoded AndroidManifest.xml of an APK.
///
/// The output is an inspection rendering of the element tree, not
/// well-formed XML.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the APK to dump
    apk: PathBuf,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let apk =
        Apk::open(&cli.apk).with_context(|| format!("can't open apk file: {:?}", cli.apk))?;

    let manifest = apk
        .manifest()
        .context("can't decode AndroidManifest.xml")?;
    println!("{manifest}");

    Ok(())
}
