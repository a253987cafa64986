use mpibench::pingpong::parse_cli;
use mpibench::PingPong;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let (local_csv, remote_csv, svgout, verbose) = parse_cli();
    println!(
        "read data from {} and {} and plot to {}",
        local_csv.display(),
        remote_csv.display(),
        svgout.display()
    );
    let local = PingPong::from_csv(&local_csv)?;
    let remote = PingPong::from_csv(&remote_csv)?;
    if verbose {
        print!("{}", local);
        print!("{}", remote);
    }
    local.plot_with(&remote, ("Local", "Remote"), &svgout)?;
    Ok(())
}
