use mpibench::collect::{collect_lines, parse_cli, prepare_csvfile};
use std::io;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let (csvout, kind) = parse_cli();
    println!("append measurements from stdin to {}", csvout.display());
    let file = prepare_csvfile(&csvout, kind)?;
    let stdin = io::stdin();
    let written = collect_lines(stdin.lock(), io::BufWriter::new(file), kind)?;
    println!("appended {} rows to {}", written, csvout.display());
    Ok(())
}
