use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};
use serde::Deserialize;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Opens `path` for appending, creating it if needed.
    ///
    /// Returns the output and whether the file was empty before opening.
    pub fn append(path: PathBuf) -> anyhow::Result<(Self, bool)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        let is_empty = file
            .metadata()
            .with_context(|| format!("Failed to inspect log file: {}", path.display()))?
            .len()
            == 0;
        let output = Output::File {
            writer: BufWriter::new(file),
            path,
        };
        Ok((output, is_empty))
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// Parses a comma-separated design vector such as `0.1,0.5,1`.
pub fn parse_vector(text: &str) -> anyhow::Result<Vec<f64>> {
    text.split(',')
        .map(str::trim)
        .enumerate()
        .map(|(i, s)| {
            s.parse::<f64>()
                .with_context(|| format!("Invalid component {i} of design vector: `{s}`"))
        })
        .collect()
}

/// Contents of a vectors file: one vector or a list of vectors.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VectorFile {
    Single(Vec<f64>),
    Many(Vec<Vec<f64>>),
}

/// Design vectors given on the command line.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct VectorArg {
    /// Design vector as comma-separated values in [0, 1] (repeatable)
    #[arg(long = "x", value_name = "X0,X1,...")]
    inline: Vec<String>,
    /// JSON file holding one vector or an array of vectors
    #[arg(long)]
    input: Option<PathBuf>,
}

impl VectorArg {
    pub(crate) fn vectors(&self) -> anyhow::Result<Vec<Vec<f64>>> {
        let mut vectors = self
            .inline
            .iter()
            .map(|text| parse_vector(text))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if let Some(path) = &self.input {
            match read_json_file("vectors", path)? {
                VectorFile::Single(x) => vectors.push(x),
                VectorFile::Many(xs) => vectors.extend(xs),
            }
        }
        if vectors.is_empty() {
            bail!("No design vector given; use --x or --input");
        }
        Ok(vectors)
    }
}

/// Formats values as `v0,v1,...` with full precision.
pub fn join_values(values: &[f64]) -> String {
    values
        .iter()
        .map(f64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
