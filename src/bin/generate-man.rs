// Writes leadboard.1 (and one page per subcommand) into the given directory

use clap::CommandFactory;
use leadboard::cli::Cli;
use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("man"));
    std::fs::create_dir_all(&out_dir)?;

    let cmd = Cli::command();
    clap_mangen::generate_to(cmd, &out_dir)?;
    println!("Man pages written to {}", out_dir.display());
    Ok(())
}
