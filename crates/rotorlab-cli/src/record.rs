use std::io::Write;

use anyhow::Context as _;
use rotorlab_eval::problem::{ConstraintMethod, Evaluation};
use serde::Serialize;

use crate::util;

/// Header of the `;`-delimited evaluation log.
pub(crate) const LOG_HEADER: &str = "timestamp;problem;method;feasible;f;margins;x";

/// One evaluated design vector, as printed and logged.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct EvaluationRecord {
    pub(crate) problem: String,
    pub(crate) method: ConstraintMethod,
    pub(crate) x: Vec<f64>,
    #[serde(flatten)]
    pub(crate) evaluation: Evaluation,
}

impl EvaluationRecord {
    /// Formats the record as one log line, without the trailing newline.
    ///
    /// `feasible` is empty and `margins` is empty when constraints were not checked.
    pub(crate) fn to_log_line(&self) -> String {
        let Evaluation {
            evaluated_at,
            objective,
            margins,
            feasible,
            ..
        } = &self.evaluation;
        let feasible = feasible.map(|f| f.to_string()).unwrap_or_default();
        let margins = margins
            .as_deref()
            .map(util::join_values)
            .unwrap_or_default();
        format!(
            "{};{};{};{feasible};{objective};{margins};{}",
            evaluated_at.to_rfc3339(),
            self.problem,
            self.method,
            util::join_values(&self.x),
        )
    }
}

/// Appends evaluation records to a log, writing the header first when the log is new.
#[derive(Debug)]
pub(crate) struct EvaluationLog<W> {
    writer: W,
    written: usize,
}

impl<W> EvaluationLog<W>
where
    W: Write,
{
    pub(crate) fn new(mut writer: W, write_header: bool) -> anyhow::Result<Self> {
        if write_header {
            writeln!(writer, "{LOG_HEADER}").context("Failed to write log header")?;
        }
        Ok(Self { writer, written: 0 })
    }

    pub(crate) fn append(&mut self, record: &EvaluationRecord) -> anyhow::Result<()> {
        writeln!(self.writer, "{}", record.to_log_line()).context("Failed to append log line")?;
        // records must survive an interrupted run
        self.writer.flush().context("Failed to flush log")?;
        self.written += 1;
        Ok(())
    }

    pub(crate) fn written(&self) -> usize {
        self.written
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }
}
