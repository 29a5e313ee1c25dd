// Copyright (C) 2023 Intel Corporation
// SPDX-License-Identifier: Apache-2.0

//! Trial records and the accumulated results of a sweep
//!
//! The sweep is the only writer of a [`SweepResults`]; once the sweep
//! completes the collection is read-only. Records keep the raw per-trial
//! data (no pre-aggregation) so success rates and other statistics can be
//! computed after the fact.

use serde::{Deserialize, Serialize};

use crate::{grid::ParameterValues, outcomes::TrialOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// One trial's record: the grid point it ran at, its label, and the raw
/// response it produced. Immutable once created.
pub struct TrialRecord {
    pub parameters: ParameterValues,
    pub outcome: TrialOutcome,
    pub response: String,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
/// The ordered sequence of records a sweep produced
pub struct SweepResults {
    records: Vec<TrialRecord>,
}

impl SweepResults {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<TrialRecord> {
        self.records.iter()
    }

    /// Number of records carrying the given label
    pub fn count(&self, outcome: TrialOutcome) -> usize {
        self.group(outcome).count()
    }

    /// The records carrying the given label, in sweep order
    pub fn group(&self, outcome: TrialOutcome) -> impl Iterator<Item = &TrialRecord> {
        self.records
            .iter()
            .filter(move |record| record.outcome == outcome)
    }

    /// Write the records as JSON lines, one record per line
    pub fn write_json_lines<W>(&self, writer: &mut W) -> serde_json::Result<()>
    where
        W: std::io::Write,
    {
        for record in &self.records {
            serde_json::to_writer(&mut *writer, record)?;
            writer.write_all(b"\n").map_err(serde_json::Error::from)?;
        }
        Ok(())
    }

    /// Aggregate adjacent records into one summary per grid point, in sweep
    /// order. Repeats at a point are always adjacent because the sweep
    /// finishes a point before moving to the next.
    pub fn point_summaries(&self) -> Vec<PointSummary> {
        let mut summaries: Vec<PointSummary> = Vec::new();

        for record in &self.records {
            match summaries.last_mut() {
                Some(summary) if summary.parameters == record.parameters => {
                    summary.count(record.outcome);
                }
                _ => {
                    let mut summary = PointSummary::new(record.parameters.clone());
                    summary.count(record.outcome);
                    summaries.push(summary);
                }
            }
        }

        summaries
    }
}

impl FromIterator<TrialRecord> for SweepResults {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TrialRecord>,
    {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for SweepResults {
    type Item = TrialRecord;
    type IntoIter = std::vec::IntoIter<TrialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a SweepResults {
    type Item = &'a TrialRecord;
    type IntoIter = std::slice::Iter<'a, TrialRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug, Clone, Serialize)]
/// Per-outcome trial counts for one grid point
pub struct PointSummary {
    pub parameters: ParameterValues,
    pub trials: usize,
    pub successes: usize,
    pub resets: usize,
    pub normals: usize,
    pub timeouts: usize,
}

impl PointSummary {
    fn new(parameters: ParameterValues) -> Self {
        Self {
            parameters,
            trials: 0,
            successes: 0,
            resets: 0,
            normals: 0,
            timeouts: 0,
        }
    }

    fn count(&mut self, outcome: TrialOutcome) {
        self.trials += 1;
        match outcome {
            TrialOutcome::Success => self.successes += 1,
            TrialOutcome::Reset => self.resets += 1,
            TrialOutcome::Normal => self.normals += 1,
            TrialOutcome::Timeout => self.timeouts += 1,
        }
    }

    /// Fraction of trials at this point that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.trials == 0 {
            0.0
        } else {
            self.successes as f64 / self.trials as f64
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::grid::ParameterValues;

    fn record(offset: i64, outcome: TrialOutcome) -> TrialRecord {
        TrialRecord {
            parameters: ParameterValues::new(vec![("offset".to_string(), offset)]),
            outcome,
            response: "hello\nA".to_string(),
        }
    }

    #[test]
    fn test_grouping_and_counts() {
        let results = vec![
            record(-2, TrialOutcome::Normal),
            record(-1, TrialOutcome::Success),
            record(-1, TrialOutcome::Success),
            record(0, TrialOutcome::Timeout),
        ]
        .into_iter()
        .collect::<SweepResults>();

        assert_eq!(results.count(TrialOutcome::Success), 2);
        assert_eq!(results.count(TrialOutcome::Reset), 0);
        assert!(results
            .group(TrialOutcome::Success)
            .all(|r| r.parameters.get("offset") == Some(-1)));
    }

    #[test]
    fn test_json_lines_round_trip() {
        let results = vec![
            record(-1, TrialOutcome::Success),
            record(0, TrialOutcome::Normal),
        ]
        .into_iter()
        .collect::<SweepResults>();

        let mut buffer = Vec::new();
        results
            .write_json_lines(&mut buffer)
            .expect("records serialize");

        let text = String::from_utf8(buffer).expect("valid utf8");
        let parsed = text
            .lines()
            .map(serde_json::from_str::<TrialRecord>)
            .collect::<Result<Vec<_>, _>>()
            .expect("records parse");

        assert_eq!(&parsed[..], results.records());
    }
}
