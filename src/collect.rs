use super::{valid_measurement, PingPongRecord, ScalingRecord, PINGPONG_HEADER, SCALING_HEADER, VERSION};
use anyhow::{bail, Context, Result};
use clap::{App, Arg};
use csv::Trim;
use log::{info, warn};
use serde::de::DeserializeOwned;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Measurement schema accepted by the collector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Kind {
    PingPong,
    Scaling,
}

impl Kind {
    pub fn header(self) -> &'static str {
        match self {
            Kind::PingPong => PINGPONG_HEADER,
            Kind::Scaling => SCALING_HEADER,
        }
    }

    fn default_csvfile(self) -> &'static str {
        match self {
            Kind::PingPong => "pingpong.csv",
            Kind::Scaling => "scaling.csv",
        }
    }

    /// Validates one input line against the schema and returns it in
    /// canonical csv form. Lines that are not measurements give None:
    /// empty lines, repeated headers, launcher banners, malformed or
    /// negative rows.
    pub fn parse_line(self, line: &str) -> Option<String> {
        let line = line.trim();
        if line.is_empty() || line == self.header() {
            return None;
        }
        match self {
            Kind::PingPong => match parse_fields::<PingPongRecord>(line) {
                Ok(r) if valid_measurement(r.total_time) && valid_measurement(r.throughput) => {
                    Some(format!("{},{},{}", r.message_len, r.total_time, r.throughput))
                }
                _ => None,
            },
            Kind::Scaling => match parse_fields::<ScalingRecord>(line) {
                Ok(r) if valid_measurement(r.time) => Some(format!("{},{}", r.n_proc, r.time)),
                _ => None,
            },
        }
    }
}

fn parse_fields<T: DeserializeOwned>(line: &str) -> Result<T> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_reader(line.as_bytes());
    match rdr.deserialize().next() {
        Some(record) => Ok(record?),
        None => bail!("empty record"),
    }
}

/// Opens the csv file for appending, writing the header first
/// when the file does not exist yet.
pub fn prepare_csvfile(file: &Path, kind: Kind) -> Result<File> {
    if file.exists() {
        info!("csvfile {} already exists, rows will be appended", file.display());
    } else {
        std::fs::write(file, format!("{}\n", kind.header()))
            .with_context(|| format!("could not initiate csvfile {}", file.display()))?;
        info!("initiated csvfile {}", file.display());
    }
    OpenOptions::new()
        .append(true)
        .open(file)
        .with_context(|| format!("could not open csvfile {}", file.display()))
}

/// Appends the valid measurement rows found in `input` to `out`,
/// skipping everything else, and returns the number of rows written.
pub fn collect_lines<R: BufRead, W: Write>(input: R, mut out: W, kind: Kind) -> Result<usize> {
    let mut written = 0;
    for line in input.lines() {
        let line = line.context("could not read line")?;
        match kind.parse_line(&line) {
            Some(row) => {
                writeln!(out, "{}", row)?;
                written += 1;
            }
            None => {
                if !line.trim().is_empty() && line.trim() != kind.header() {
                    warn!("skipping line that is not a measurement: {}", line);
                }
            }
        }
    }
    out.flush()?;
    Ok(written)
}

/// Takes the CLI arguments that control the collection of measurements.
pub fn parse_cli() -> (PathBuf, Kind) {
    let arg_csvfile = Arg::with_name("csvfile")
        .help("name for the csv file")
        .short("o")
        .long("csvfile")
        .takes_value(true);
    let arg_kind = Arg::with_name("kind")
        .help("measurement schema of the input rows")
        .short("k")
        .long("kind")
        .takes_value(true)
        .possible_values(&["pingpong", "scaling"])
        .default_value("pingpong");
    let cli_args = App::new("mpibench_collect")
        .version(VERSION.unwrap_or("unknown"))
        .about("cli app to append benchmark rows from stdin to a csv file")
        .arg(arg_csvfile)
        .arg(arg_kind)
        .get_matches();
    let kind = match cli_args.value_of("kind").unwrap_or_default() {
        "scaling" => Kind::Scaling,
        _ => Kind::PingPong,
    };
    let csvfile = match cli_args.value_of("csvfile") {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(kind.default_csvfile()),
    };
    return (csvfile, kind);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_line_accepts_a_pingpong_row() {
        assert_eq!(
            Kind::PingPong.parse_line("131072,0.018,1400.2"),
            Some("131072,0.018,1400.2".to_string())
        );
    }

    #[test]
    fn parse_line_normalizes_padded_fields() {
        assert_eq!(
            Kind::Scaling.parse_line(" 8 , 1.25 "),
            Some("8,1.25".to_string())
        );
    }

    #[test]
    fn parse_line_skips_header_and_noise() {
        assert_eq!(Kind::PingPong.parse_line("message_len,total_time,throughput"), None);
        assert_eq!(Kind::PingPong.parse_line(""), None);
        assert_eq!(Kind::PingPong.parse_line("Warning: Permanently added host"), None);
    }

    #[test]
    fn parse_line_rejects_negative_and_short_rows() {
        assert_eq!(Kind::PingPong.parse_line("1024,-0.5,10.0"), None);
        assert_eq!(Kind::PingPong.parse_line("1024,0.5"), None);
        assert_eq!(Kind::Scaling.parse_line("8,1.25,3.0"), None);
    }

    #[test]
    fn collect_lines_appends_only_valid_rows() {
        let input = "message_len,total_time,throughput\n\
                     1,0.001,0.9\n\
                     some mpi banner\n\
                     2,0.001,1.9\n";
        let mut out = Vec::new();
        let written = collect_lines(input.as_bytes(), &mut out, Kind::PingPong).unwrap();
        assert_eq!(written, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "1,0.001,0.9\n2,0.001,1.9\n");
    }
}
