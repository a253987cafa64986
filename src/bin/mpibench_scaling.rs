use mpibench::scaling::parse_cli;
use mpibench::Scaling;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let (csvin, svgout, speedup, verbose) = parse_cli();
    println!(
        "read data from {} and plot to {}",
        csvin.display(),
        svgout.display()
    );
    let scaling = Scaling::from_csv(&csvin)?;
    if verbose {
        print!("{}", scaling);
    }
    scaling.plot(&svgout, speedup)?;
    Ok(())
}
