use anyhow::{ensure, Context, Result};
use csv::Trim;
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
pub mod collect;
pub mod pingpong;
pub mod scaling;

pub const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

pub const PINGPONG_HEADER: &str = "message_len,total_time,throughput";
pub const SCALING_HEADER: &str = "n_proc,time";

/// One row of the pingpong benchmark: message length in bytes,
/// round-trip time in seconds, throughput in MiB/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PingPongRecord {
    pub message_len: u64,
    pub total_time: f64,
    pub throughput: f64,
}

/// One row of the merge sort scaling benchmark: number of processes
/// and processing time in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingRecord {
    pub n_proc: u64,
    pub time: f64,
}

pub(crate) fn valid_measurement(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

/// The main struct for the pingpong benchmark series
#[derive(Debug, Clone, Default)]
pub struct PingPong {
    pub message_len: Vec<u64>,
    pub total_time: Vec<f64>,
    pub throughput: Vec<f64>,
}

impl PingPong {
    pub fn new(capacity: usize) -> PingPong {
        PingPong {
            message_len: Vec::with_capacity(capacity),
            total_time: Vec::with_capacity(capacity),
            throughput: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.message_len.len()
    }

    pub fn is_empty(&self) -> bool {
        self.message_len.is_empty()
    }

    pub fn push(&mut self, record: PingPongRecord) {
        self.message_len.push(record.message_len);
        self.total_time.push(record.total_time);
        self.throughput.push(record.throughput);
    }

    /// Init a PingPong from a headered csv (message_len,total_time,throughput).
    /// Times and throughputs must be finite and non-negative,
    /// anything else aborts the load.
    pub fn from_csv(fin: &Path) -> Result<PingPong> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .from_path(fin)
            .with_context(|| format!("could not open {}", fin.display()))?;
        let mut series = PingPong::new(64);
        for (i, row) in rdr.deserialize().enumerate() {
            let record: PingPongRecord =
                row.with_context(|| format!("invalid row {} in {}", i + 1, fin.display()))?;
            ensure!(
                valid_measurement(record.total_time),
                "row {} in {}: invalid total_time {}",
                i + 1,
                fin.display(),
                record.total_time
            );
            ensure!(
                valid_measurement(record.throughput),
                "row {} in {}: invalid throughput {}",
                i + 1,
                fin.display(),
                record.throughput
            );
            series.push(record);
        }
        ensure!(!series.is_empty(), "no data rows in {}", fin.display());
        Ok(series)
    }

    /// writes the series as a headered csv at the given path
    pub fn to_csv(&self, fout: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(fout)
            .with_context(|| format!("could not create {}", fout.display()))?;
        for i in 0..self.len() {
            wtr.serialize(PingPongRecord {
                message_len: self.message_len[i],
                total_time: self.total_time[i],
                throughput: self.throughput[i],
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn points(&self, ys: &[f64]) -> Vec<(f64, f64)> {
        self.message_len
            .iter()
            .zip(ys.iter())
            .map(|(&x, &y)| (x as f64, y))
            .collect()
    }

    /// Plots total time and throughput against message length to svg,
    /// both panels log-log, with this series and `other` overlaid
    /// and labelled by `labels`.
    pub fn plot_with(&self, other: &PingPong, labels: (&str, &str), fout: &Path) -> Result<()> {
        let root = SVGBackend::new(fout, (1600, 800)).into_drawing_area();
        root.fill(&WHITE)?;
        let panels = root.split_evenly((1, 2));
        draw_loglog_panel(
            &panels[0],
            "Total time",
            "Total time (s)",
            &[
                (labels.0, self.points(&self.total_time), RED),
                (labels.1, other.points(&other.total_time), BLUE),
            ],
        )?;
        draw_loglog_panel(
            &panels[1],
            "Throughput",
            "Throughput (MiB/s)",
            &[
                (labels.0, self.points(&self.throughput), RED),
                (labels.1, other.points(&other.throughput), BLUE),
            ],
        )?;
        root.present()?;
        Ok(())
    }
}

impl fmt::Display for PingPong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", PINGPONG_HEADER)?;
        for i in 0..self.len() {
            writeln!(
                f,
                "{},{},{}",
                self.message_len[i], self.total_time[i], self.throughput[i]
            )?;
        }
        Ok(())
    }
}

/// The main struct for the merge sort scaling series
#[derive(Debug, Clone, Default)]
pub struct Scaling {
    pub n_proc: Vec<u64>,
    pub time: Vec<f64>,
}

impl Scaling {
    pub fn new(capacity: usize) -> Scaling {
        Scaling {
            n_proc: Vec::with_capacity(capacity),
            time: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.n_proc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.n_proc.is_empty()
    }

    pub fn push(&mut self, record: ScalingRecord) {
        self.n_proc.push(record.n_proc);
        self.time.push(record.time);
    }

    /// Init a Scaling from a headered csv (n_proc,time).
    pub fn from_csv(fin: &Path) -> Result<Scaling> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(Trim::All)
            .from_path(fin)
            .with_context(|| format!("could not open {}", fin.display()))?;
        let mut series = Scaling::new(64);
        for (i, row) in rdr.deserialize().enumerate() {
            let record: ScalingRecord =
                row.with_context(|| format!("invalid row {} in {}", i + 1, fin.display()))?;
            ensure!(
                valid_measurement(record.time),
                "row {} in {}: invalid time {}",
                i + 1,
                fin.display(),
                record.time
            );
            series.push(record);
        }
        ensure!(!series.is_empty(), "no data rows in {}", fin.display());
        Ok(series)
    }

    /// writes the series as a headered csv at the given path
    pub fn to_csv(&self, fout: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(fout)
            .with_context(|| format!("could not create {}", fout.display()))?;
        for i in 0..self.len() {
            wtr.serialize(ScalingRecord {
                n_proc: self.n_proc[i],
                time: self.time[i],
            })?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Speedup of every row relative to the first one,
    /// which is expected to hold the smallest process count.
    pub fn speedup(&self) -> Vec<f64> {
        match self.time.first() {
            Some(&t0) => self.time.iter().map(|&t| t0 / t).collect(),
            None => Vec::new(),
        }
    }

    /// Plots the processing time against the number of processes to svg,
    /// linear axes; with `with_speedup` the figure gains a second panel
    /// with the measured and ideal speedup.
    pub fn plot(&self, fout: &Path, with_speedup: bool) -> Result<()> {
        let size = if with_speedup { (1600, 800) } else { (800, 800) };
        let root = SVGBackend::new(fout, size).into_drawing_area();
        root.fill(&WHITE)?;
        if with_speedup {
            let panels = root.split_evenly((1, 2));
            self.draw_time_panel(&panels[0])?;
            self.draw_speedup_panel(&panels[1])?;
        } else {
            self.draw_time_panel(&root)?;
        }
        root.present()?;
        Ok(())
    }

    fn draw_time_panel(&self, area: &DrawingArea<SVGBackend, Shift>) -> Result<()> {
        let (pmin, pmax) = min_and_max(&self.n_proc).context("empty scaling series")?;
        let (tmin, tmax) = min_and_max(&self.time).context("empty scaling series")?;
        let (xmin, xmax) = pad_linear(pmin as f64, pmax as f64);
        let (ymin, ymax) = pad_linear(tmin, tmax);
        let mut chart = ChartBuilder::on(area)
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(xmin..xmax, ymin..ymax)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
            .set_all_tick_mark_size(2)
            .label_style(("sans-serif", 20))
            .x_desc("Number of processes")
            .y_desc("Processing time (s)")
            .x_label_formatter(&|x: &f64| format!("{:.0}", x))
            .draw()?;
        chart.draw_series(LineSeries::new(
            self.n_proc
                .iter()
                .zip(self.time.iter())
                .map(|(&p, &t)| (p as f64, t)),
            BLUE.stroke_width(2),
        ))?;
        Ok(())
    }

    fn draw_speedup_panel(&self, area: &DrawingArea<SVGBackend, Shift>) -> Result<()> {
        let speedup = self.speedup();
        ensure!(
            speedup.iter().all(|s| s.is_finite()),
            "speedup requires positive times"
        );
        let (pmin, pmax) = min_and_max(&self.n_proc).context("empty scaling series")?;
        let (smin, smax) = min_and_max(&speedup).context("empty scaling series")?;
        let ideal: Vec<(f64, f64)> = self
            .n_proc
            .iter()
            .map(|&p| (p as f64, p as f64 / pmin as f64))
            .collect();
        let imax = ideal.iter().fold(f64::NEG_INFINITY, |a, p| a.max(p.1));
        let (xmin, xmax) = pad_linear(pmin as f64, pmax as f64);
        let (ymin, ymax) = pad_linear(smin.min(1.0), smax.max(imax));
        let mut chart = ChartBuilder::on(area)
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(90)
            .build_cartesian_2d(xmin..xmax, ymin..ymax)?;
        chart
            .configure_mesh()
            .light_line_style(&TRANSPARENT)
            .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
            .set_all_tick_mark_size(2)
            .label_style(("sans-serif", 20))
            .x_desc("Number of processes")
            .y_desc("Speedup")
            .x_label_formatter(&|x: &f64| format!("{:.0}", x))
            .draw()?;
        let measured_style = BLUE.stroke_width(2);
        chart
            .draw_series(LineSeries::new(
                self.n_proc
                    .iter()
                    .zip(speedup.iter())
                    .map(|(&p, &s)| (p as f64, s)),
                measured_style,
            ))?
            .label("Measured")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], measured_style));
        let ideal_style = RGBColor(120, 120, 120).stroke_width(2);
        chart
            .draw_series(LineSeries::new(ideal.iter().copied(), ideal_style))?
            .label("Ideal")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], ideal_style));
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
        Ok(())
    }
}

impl fmt::Display for Scaling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", SCALING_HEADER)?;
        for i in 0..self.len() {
            writeln!(f, "{},{}", self.n_proc[i], self.time[i])?;
        }
        Ok(())
    }
}

fn draw_loglog_panel(
    area: &DrawingArea<SVGBackend, Shift>,
    title: &str,
    y_desc: &str,
    series: &[(&str, Vec<(f64, f64)>, RGBColor)],
) -> Result<()> {
    let mut xmin = f64::INFINITY;
    let mut xmax = f64::NEG_INFINITY;
    let mut ymin = f64::INFINITY;
    let mut ymax = f64::NEG_INFINITY;
    for (name, points, _) in series {
        ensure!(!points.is_empty(), "series {} has no points", name);
        for &(x, y) in points {
            xmin = xmin.min(x);
            xmax = xmax.max(x);
            ymin = ymin.min(y);
            ymax = ymax.max(y);
        }
    }
    // log(0) has nowhere to go on the chart
    ensure!(
        xmin > 0.0 && ymin > 0.0,
        "log-scaled axes require positive values"
    );
    let (xmin, xmax) = pad_log(xmin, xmax);
    let (ymin, ymax) = pad_log(ymin, ymax);
    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 32))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(90)
        .build_cartesian_2d((xmin..xmax).log_scale(), (ymin..ymax).log_scale())?;
    chart
        .configure_mesh()
        .light_line_style(&TRANSPARENT)
        .bold_line_style(RGBColor(150, 150, 150).stroke_width(1))
        .set_all_tick_mark_size(2)
        .label_style(("sans-serif", 20))
        .x_desc("Message length (bytes)")
        .y_desc(y_desc)
        .x_label_formatter(&|x: &f64| format!("{:.0}", x))
        .draw()?;
    for (name, points, color) in series {
        let style = color.stroke_width(2);
        chart
            .draw_series(LineSeries::new(points.iter().copied(), style))?
            .label(*name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], style));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

pub fn min_and_max<T: PartialOrd + Copy>(s: &[T]) -> Option<(T, T)> {
    let mut iter = s.iter();
    let (mut min, mut max) = match iter.next() {
        Some(&v) => (v, v),
        None => return None,
    };
    for &v in iter {
        if v > max {
            max = v
        }
        if v < min {
            min = v
        }
    }
    Some((min, max))
}

/// additive margin for linear axes, span/20 with a floor for flat series
pub fn pad_linear(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    let margin = if span.abs() < 1e-10 {
        max.abs() * 0.05 + 0.1
    } else {
        span / 20.0
    };
    (min - margin, max + margin)
}

/// multiplicative margin for log axes
pub fn pad_log(min: f64, max: f64) -> (f64, f64) {
    (min / 2.0, max * 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn tmpfile(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("mpibench_{}_{}", std::process::id(), name))
    }

    fn write_tmp(name: &str, content: &str) -> PathBuf {
        let path = tmpfile(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn sample_pingpong() -> PingPong {
        PingPong {
            message_len: vec![1, 1024, 1048576],
            total_time: vec![0.0021, 0.0043, 0.91],
            throughput: vec![0.91, 455.0, 2198.4],
        }
    }

    #[test]
    fn pingpong_from_csv_reads_all_rows() {
        let path = write_tmp(
            "pp_ok.csv",
            "message_len,total_time,throughput\n\
             1,0.002,0.95\n\
             1024,0.004,488.0\n\
             1048576,0.9,2200.5\n",
        );
        let pp = PingPong::from_csv(&path).unwrap();
        assert_eq!(pp.len(), 3);
        assert_eq!(pp.message_len, vec![1, 1024, 1048576]);
        assert!((pp.total_time[0] - 0.002).abs() < 1e-12);
        assert!((pp.throughput[2] - 2200.5).abs() < 1e-12);
    }

    #[test]
    fn pingpong_from_csv_rejects_negative_time() {
        let path = write_tmp(
            "pp_neg.csv",
            "message_len,total_time,throughput\n1024,-0.004,488.0\n",
        );
        let err = PingPong::from_csv(&path).unwrap_err();
        assert!(err.to_string().contains("total_time"));
    }

    #[test]
    fn pingpong_from_csv_rejects_malformed_row() {
        let path = write_tmp(
            "pp_bad.csv",
            "message_len,total_time,throughput\n1024,abc,488.0\n",
        );
        assert!(PingPong::from_csv(&path).is_err());
    }

    #[test]
    fn from_csv_errors_on_header_only() {
        let path = write_tmp("pp_empty.csv", "message_len,total_time,throughput\n");
        let err = PingPong::from_csv(&path).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn from_csv_errors_on_missing_file() {
        let path = tmpfile("does_not_exist.csv");
        assert!(PingPong::from_csv(&path).is_err());
        assert!(Scaling::from_csv(&path).is_err());
    }

    #[test]
    fn scaling_from_csv_reads_all_rows() {
        let path = write_tmp("sc_ok.csv", "n_proc,time\n1,7.9\n2,4.2\n4,2.3\n8,1.4\n");
        let sc = Scaling::from_csv(&path).unwrap();
        assert_eq!(sc.len(), 4);
        assert_eq!(sc.n_proc, vec![1, 2, 4, 8]);
        assert!((sc.time[3] - 1.4).abs() < 1e-12);
    }

    #[test]
    fn speedup_is_relative_to_the_first_row() {
        let sc = Scaling {
            n_proc: vec![1, 2, 4],
            time: vec![8.0, 4.0, 2.0],
        };
        assert_eq!(sc.speedup(), vec![1.0, 2.0, 4.0]);
        assert!(Scaling::default().speedup().is_empty());
    }

    #[test]
    fn to_csv_writes_a_readable_file() {
        let sc = Scaling {
            n_proc: vec![1, 2, 4],
            time: vec![8.0, 4.0, 2.0],
        };
        let path = tmpfile("sc_out.csv");
        sc.to_csv(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(SCALING_HEADER));
        let again = Scaling::from_csv(&path).unwrap();
        assert_eq!(again.n_proc, sc.n_proc);
        assert_eq!(again.time, sc.time);
        let pp = sample_pingpong();
        let path = tmpfile("pp_out.csv");
        pp.to_csv(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(PINGPONG_HEADER));
    }

    #[test]
    fn min_and_max_spans_the_slice() {
        assert_eq!(min_and_max(&[3u64, 1, 9, 4]), Some((1, 9)));
        assert_eq!(min_and_max::<f64>(&[]), None);
    }

    #[test]
    fn pad_linear_keeps_flat_series_visible() {
        let (lo, hi) = pad_linear(5.0, 5.0);
        assert!(lo < 5.0 && hi > 5.0);
        let (lo, hi) = pad_linear(1.0, 21.0);
        assert!((lo - 0.0).abs() < 1e-12 && (hi - 22.0).abs() < 1e-12);
    }

    #[test]
    fn pingpong_plot_draws_two_labelled_panels() {
        let local = sample_pingpong();
        let mut remote = sample_pingpong();
        remote.total_time = vec![0.09, 0.12, 2.4];
        remote.throughput = vec![0.02, 16.3, 830.0];
        let path = tmpfile("pp_plot.svg");
        local.plot_with(&remote, ("Local", "Remote"), &path).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Total time"));
        assert!(svg.contains("Throughput"));
        assert!(svg.contains("Local"));
        assert!(svg.contains("Remote"));
        assert!(svg.contains("Message length (bytes)"));
        assert!(svg.matches("<polyline").count() >= 4);
    }

    #[test]
    fn pingpong_plot_refuses_zero_on_log_axis() {
        let local = sample_pingpong();
        let mut remote = sample_pingpong();
        remote.throughput[0] = 0.0;
        let path = tmpfile("pp_zero.svg");
        let err = local
            .plot_with(&remote, ("Local", "Remote"), &path)
            .unwrap_err();
        assert!(err.to_string().contains("log-scaled"));
    }

    #[test]
    fn scaling_plot_labels_the_axes() {
        let sc = Scaling {
            n_proc: vec![1, 2, 4, 8],
            time: vec![7.9, 4.2, 2.3, 1.4],
        };
        let path = tmpfile("sc_plot.svg");
        sc.plot(&path, false).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Number of processes"));
        assert!(svg.contains("Processing time (s)"));
        assert!(!svg.contains("Speedup"));
    }

    #[test]
    fn scaling_plot_with_speedup_adds_a_panel() {
        let sc = Scaling {
            n_proc: vec![1, 2, 4, 8],
            time: vec![7.9, 4.2, 2.3, 1.4],
        };
        let path = tmpfile("sc_speedup.svg");
        sc.plot(&path, true).unwrap();
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Processing time (s)"));
        assert!(svg.contains("Speedup"));
        assert!(svg.contains("Measured"));
        assert!(svg.contains("Ideal"));
    }
}
