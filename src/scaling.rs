use super::VERSION;
use clap::{App, Arg};
use std::path::PathBuf;

/// Takes the CLI arguments that control the plotting of the scaling benchmark.
pub fn parse_cli() -> (PathBuf, PathBuf, bool, bool) {
    let arg_csvin = Arg::with_name("input_csvfile")
        .help("csv file with the scaling measurements")
        .short("f")
        .long("csvfile")
        .takes_value(true)
        .required(true)
        .default_value("data.csv");
    let arg_svgout = Arg::with_name("output_svgfile")
        .help("name of the output svg file")
        .short("o")
        .long("svgfile")
        .takes_value(true);
    let arg_speedup = Arg::with_name("speedup")
        .help("add a panel with the measured and ideal speedup")
        .short("s")
        .long("speedup")
        .takes_value(false)
        .required(false);
    let arg_verbose = Arg::with_name("verbose")
        .help("print the loaded table")
        .short("v")
        .long("verbose")
        .takes_value(false)
        .required(false);
    let cli_args = App::new("mpibench_scaling")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to plot the processing time against the process count")
        .arg(arg_csvin)
        .arg(arg_svgout)
        .arg(arg_speedup)
        .arg(arg_verbose)
        .get_matches();
    let csvin = PathBuf::from(cli_args.value_of("input_csvfile").unwrap_or_default());
    let svgout = match cli_args.value_of("output_svgfile") {
        Some(p) => PathBuf::from(p),
        None => {
            let mut svgout = csvin.clone();
            svgout.set_extension("svg");
            svgout
        }
    };
    let speedup = cli_args.is_present("speedup");
    let verbose = cli_args.is_present("verbose");
    return (csvin, svgout, speedup, verbose);
}
