use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use apkdump::Apk;
use clap::Parser;

/// List JUnit3 and JUnit4 test methods found in the dex files of an APK.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the APK to scan
    apk: PathBuf,

    /// Keep only classes whose dotted name contains one of these strings
    filters: Vec<String>,
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

    let tests = apk
        .find_tests(&cli.filters)
        .context("test discovery failed")?;

    for test in tests {
        println!("{test}");
    }

    Ok(())
}
