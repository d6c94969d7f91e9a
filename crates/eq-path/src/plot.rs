//! Staged 2-D plots.
//!
//! A plot collects one x column and any number of y series while the path
//! runs. When it has a file stem, finishing the path writes `<stem>.dat`
//! with the data and `<stem>.plt`, a gnuplot script that draws it.

use crate::error::PathResult;
use crate::sink::PathSink;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Plot configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlotSpec {
    file: Option<PathBuf>,
    x: Option<String>,
    ys: Vec<(String, String)>,
    title: Option<String>,
    xlabel: Option<String>,
    ylabel: Option<String>,
    xformat: Option<String>,
    yformat: Option<String>,
    legend: Option<String>,
}

impl PlotSpec {
    /// Query (or `t`) plotted on the x axis.
    pub fn x(&mut self, query: &str) -> &mut Self {
        self.x = Some(query.to_string());
        self
    }

    /// Add a curve: legend label and the query plotted on the y axis.
    pub fn y(&mut self, label: &str, query: &str) -> &mut Self {
        self.ys.push((label.to_string(), query.to_string()));
        self
    }

    pub fn title(&mut self, title: &str) -> &mut Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn xlabel(&mut self, label: &str) -> &mut Self {
        self.xlabel = Some(label.to_string());
        self
    }

    pub fn ylabel(&mut self, label: &str) -> &mut Self {
        self.ylabel = Some(label.to_string());
        self
    }

    /// printf-style tick format, e.g. `%g`.
    pub fn xformat(&mut self, format: &str) -> &mut Self {
        self.xformat = Some(format.to_string());
        self
    }

    pub fn yformat(&mut self, format: &str) -> &mut Self {
        self.yformat = Some(format.to_string());
        self
    }

    /// Legend placement, in gnuplot `set key` syntax.
    pub fn legend(&mut self, placement: &str) -> &mut Self {
        self.legend = Some(placement.to_string());
        self
    }

    /// File stem for the staged `.dat` and `.plt` files.
    pub fn file(&mut self, stem: impl Into<PathBuf>) -> &mut Self {
        self.file = Some(stem.into());
        self
    }

    pub fn x_query(&self) -> Option<&str> {
        self.x.as_deref()
    }

    /// `(label, query)` pairs of the y series.
    pub fn y_series(&self) -> &[(String, String)] {
        &self.ys
    }

    pub fn file_stem(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Same spec staged in `dir`, keeping the file name.
    pub fn relocated(&self, dir: &Path) -> Self {
        let mut spec = self.clone();
        if let Some(name) = self.file.as_ref().and_then(|p| p.file_name()) {
            spec.file = Some(dir.join(name));
        }
        spec
    }

    pub(crate) fn sink(&self) -> PlotSink {
        PlotSink {
            data: PlotData {
                title: self.title.clone(),
                xlabel: self.xlabel.clone(),
                ylabel: self.ylabel.clone(),
                xformat: self.xformat.clone(),
                yformat: self.yformat.clone(),
                legend: self.legend.clone(),
                x_label: String::new(),
                x: Vec::new(),
                series: Vec::new(),
            },
            file: self.file.clone(),
        }
    }
}

/// One y series of a plot.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub label: String,
    pub values: Vec<f64>,
}

/// Data staged by a plot during a path run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotData {
    pub title: Option<String>,
    pub xlabel: Option<String>,
    pub ylabel: Option<String>,
    pub xformat: Option<String>,
    pub yformat: Option<String>,
    pub legend: Option<String>,
    /// Column label of the x values
    pub x_label: String,
    pub x: Vec<f64>,
    pub series: Vec<PlotSeries>,
}

impl PlotData {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn series(&self, label: &str) -> Option<&PlotSeries> {
        self.series.iter().find(|s| s.label == label)
    }

    /// Whitespace-separated data table with a commented header.
    pub fn data_table(&self) -> String {
        let mut out = String::new();
        let mut header = vec![self.x_label.clone()];
        header.extend(self.series.iter().map(|s| s.label.clone()));
        let _ = writeln!(out, "# {}", header.join("\t"));
        for (row, x) in self.x.iter().enumerate() {
            let _ = write!(out, "{:.10e}", x);
            for s in &self.series {
                let _ = write!(out, "\t{:.10e}", s.values[row]);
            }
            out.push('\n');
        }
        out
    }

    /// gnuplot script plotting every series from `data_file`.
    pub fn gnuplot_script(&self, data_file: &str) -> String {
        let mut out = String::new();
        let settings = [
            ("title", &self.title),
            ("xlabel", &self.xlabel),
            ("ylabel", &self.ylabel),
        ];
        for (key, value) in settings {
            if let Some(v) = value {
                let _ = writeln!(out, "set {} \"{}\"", key, quote(v));
            }
        }
        if let Some(f) = &self.xformat {
            let _ = writeln!(out, "set format x \"{}\"", quote(f));
        }
        if let Some(f) = &self.yformat {
            let _ = writeln!(out, "set format y \"{}\"", quote(f));
        }
        if let Some(legend) = &self.legend {
            let _ = writeln!(out, "set key {}", legend);
        }
        out.push_str("set grid\n");

        let curves: Vec<String> = self
            .series
            .iter()
            .enumerate()
            .map(|(i, s)| {
                format!(
                    "\"{}\" using 1:{} with lines lw 2 title \"{}\"",
                    quote(data_file),
                    i + 2,
                    quote(&s.label)
                )
            })
            .collect();
        if !curves.is_empty() {
            let _ = writeln!(out, "plot {}", curves.join(", \\\n     "));
        }
        out
    }
}

fn quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(stem.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Stages plot data; writes files on finish when a stem is configured.
#[derive(Debug)]
pub struct PlotSink {
    data: PlotData,
    file: Option<PathBuf>,
}

impl PlotSink {
    pub fn data(&self) -> &PlotData {
        &self.data
    }

    pub fn into_data(self) -> PlotData {
        self.data
    }
}

impl PathSink for PlotSink {
    fn begin(&mut self, labels: &[String]) -> PathResult<()> {
        let Some((x_label, ys)) = labels.split_first() else {
            return Ok(());
        };
        self.data.x_label = x_label.clone();
        self.data.x.clear();
        self.data.series = ys
            .iter()
            .map(|label| PlotSeries {
                label: label.clone(),
                values: Vec::new(),
            })
            .collect();
        Ok(())
    }

    fn record(&mut self, row: &[f64]) -> PathResult<()> {
        if let Some((x, ys)) = row.split_first() {
            self.data.x.push(*x);
            for (series, y) in self.data.series.iter_mut().zip(ys) {
                series.values.push(*y);
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> PathResult<()> {
        let Some(stem) = &self.file else {
            return Ok(());
        };
        if let Some(parent) = stem.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let data_path = with_suffix(stem, ".dat");
        std::fs::write(&data_path, self.data.data_table())?;

        let data_name = data_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut script = std::fs::File::create(with_suffix(stem, ".plt"))?;
        script.write_all(self.data.gnuplot_script(&data_name).as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn co2_plot() -> PlotSpec {
        let mut spec = PlotSpec::default();
        spec.x("pH")
            .y("HCO@_3^-", "speciesMolality(HCO3-)")
            .y("CO_2(aq)", "speciesMolality(CO2(aq))")
            .xlabel("pH")
            .ylabel("Concentration [molal]")
            .yformat("%g")
            .legend("left center Left reverse");
        spec
    }

    fn staged(spec: &PlotSpec) -> PlotSink {
        let mut sink = spec.sink();
        let labels = vec!["pH".to_string(), "HCO@_3^-".to_string(), "CO_2(aq)".to_string()];
        sink.begin(&labels).unwrap();
        sink.record(&[1.0, 1e-6, 0.5]).unwrap();
        sink.record(&[2.0, 1e-5, 0.49]).unwrap();
        sink
    }

    #[test]
    fn stages_series() {
        let sink = staged(&co2_plot());
        let data = sink.data();
        assert_eq!(data.len(), 2);
        assert_eq!(data.x, [1.0, 2.0]);
        assert_eq!(data.series("CO_2(aq)").unwrap().values, [0.5, 0.49]);
    }

    #[test]
    fn gnuplot_script_contents() {
        let data = staged(&co2_plot()).into_data();
        let script = data.gnuplot_script("co2.dat");
        assert!(script.contains("set xlabel \"pH\""));
        assert!(script.contains("set format y \"%g\""));
        assert!(script.contains("set key left center Left reverse"));
        assert!(script.contains("\"co2.dat\" using 1:3 with lines lw 2 title \"CO_2(aq)\""));
        assert!(!script.contains("set title"));
    }

    #[test]
    fn writes_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut spec = co2_plot();
        spec.file(dir.path().join("plots/co2"));
        let mut sink = staged(&spec);
        sink.finish().unwrap();

        let table = std::fs::read_to_string(dir.path().join("plots/co2.dat")).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("# pH"));
        assert_eq!(lines[1].split_whitespace().count(), 3);
        assert!(dir.path().join("plots/co2.plt").exists());
    }

    #[test]
    fn relocate_keeps_file_name() {
        let mut spec = co2_plot();
        spec.file("figures/co2");
        let moved = spec.relocated(Path::new("/data"));
        assert_eq!(moved.file_stem(), Some(Path::new("/data/co2")));
    }
}
