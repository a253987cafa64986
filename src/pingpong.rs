use super::VERSION;
use clap::{App, Arg};
use std::path::PathBuf;

/// Takes the CLI arguments that control the plotting of the pingpong benchmark.
pub fn parse_cli() -> (PathBuf, PathBuf, PathBuf, bool) {
    let arg_local = Arg::with_name("local_csvfile")
        .help("csv file with the single-node measurements")
        .short("l")
        .long("local")
        .takes_value(true)
        .required(true)
        .default_value("local.csv");
    let arg_remote = Arg::with_name("remote_csvfile")
        .help("csv file with the two-node measurements")
        .short("r")
        .long("remote")
        .takes_value(true)
        .required(true)
        .default_value("remote.csv");
    let arg_svgout = Arg::with_name("output_svgfile")
        .help("name of the output svg file")
        .short("o")
        .long("svgfile")
        .takes_value(true);
    let arg_verbose = Arg::with_name("verbose")
        .help("print the loaded tables")
        .short("v")
        .long("verbose")
        .takes_value(false)
        .required(false);
    let cli_args = App::new("mpibench_pingpong")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot the pingpong times and throughputs")
        .arg(arg_local)
        .arg(arg_remote)
        .arg(arg_svgout)
        .arg(arg_verbose)
        .get_matches();
    let local = PathBuf::from(cli_args.value_of("local_csvfile").unwrap_or_default());
    let remote = PathBuf::from(cli_args.value_of("remote_csvfile").unwrap_or_default());
    let svgout = match cli_args.value_of("output_svgfile") {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from("pingpong.svg"),
    };
    let verbose = cli_args.is_present("verbose");
    return (local, remote, svgout, verbose);
}
