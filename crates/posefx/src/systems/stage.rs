//! Time-scripted stage tables.
//!
//! A table is an ordered, contiguous run of `[start_ms, end_ms)` windows
//! measured from the effect's first animated frame. A `StageCursor` walks
//! the table forward only, reporting each stage entry exactly once.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum StageError {
    #[error("stage table is empty")]
    Empty,
    #[error("stage {index} ends at {end_ms} before it starts at {start_ms}")]
    Inverted { index: usize, start_ms: f64, end_ms: f64 },
    #[error("stage {index} starts at {start_ms}, expected {expected_ms}")]
    Gap {
        index: usize,
        start_ms: f64,
        expected_ms: f64,
    },
    #[error("only the last stage may be open-ended (stage {0})")]
    OpenEnded(usize),
    #[error("stage index {index} out of range for a table of {len}")]
    OutOfRange { index: usize, len: usize },
}

/// One row of a stage table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub start_ms: f64,
    /// `None` means the stage never ends.
    #[serde(default)]
    pub end_ms: Option<f64>,
    #[serde(default)]
    pub scale_ceiling: Option<f32>,
    #[serde(default)]
    pub message: Option<String>,
    /// Entering a final stage triggers the effect's terminal behavior.
    #[serde(default, rename = "final")]
    pub is_final: bool,
}

impl Stage {
    pub fn new(start_ms: f64, end_ms: f64) -> Self {
        Self {
            start_ms,
            end_ms: Some(end_ms),
            scale_ceiling: None,
            message: None,
            is_final: false,
        }
    }

    pub fn open(start_ms: f64) -> Self {
        Self {
            end_ms: None,
            ..Self::new(start_ms, start_ms)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_ceiling(mut self, ceiling: f32) -> Self {
        self.scale_ceiling = Some(ceiling);
        self
    }

    pub fn finishing(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn contains(&self, elapsed_ms: f64) -> bool {
        elapsed_ms >= self.start_ms && self.end_ms.map_or(true, |end| elapsed_ms < end)
    }
}

/// Validated, contiguous stage table.
#[derive(Debug, Clone, PartialEq)]
pub struct StageTable {
    stages: Vec<Stage>,
}

impl StageTable {
    pub fn new(stages: Vec<Stage>) -> Result<Self, StageError> {
        if stages.is_empty() {
            return Err(StageError::Empty);
        }
        let last = stages.len() - 1;
        for (index, stage) in stages.iter().enumerate() {
            match stage.end_ms {
                Some(end_ms) if end_ms <= stage.start_ms => {
                    return Err(StageError::Inverted {
                        index,
                        start_ms: stage.start_ms,
                        end_ms,
                    })
                }
                None if index != last => return Err(StageError::OpenEnded(index)),
                _ => {}
            }
            if index > 0 {
                let expected_ms = stages[index - 1].end_ms.unwrap_or(f64::INFINITY);
                if stage.start_ms != expected_ms {
                    return Err(StageError::Gap {
                        index,
                        start_ms: stage.start_ms,
                        expected_ms,
                    });
                }
            }
        }
        Ok(Self { stages })
    }

    /// Index of the stage containing `elapsed_ms`, if any.
    pub fn stage_at(&self, elapsed_ms: f64) -> Option<usize> {
        self.stages.iter().position(|s| s.contains(elapsed_ms))
    }

    pub fn get(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    /// Fail unless `index` names a row of this table.
    pub fn check_index(&self, index: usize) -> Result<(), StageError> {
        if index < self.stages.len() {
            Ok(())
        } else {
            Err(StageError::OutOfRange {
                index,
                len: self.stages.len(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.stages.len() - 1
    }
}

/// Forward-only position in a `StageTable`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageCursor {
    entered: Option<usize>,
}

impl StageCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest stage entered so far.
    pub fn current(&self) -> Option<usize> {
        self.entered
    }

    pub fn reset(&mut self) {
        self.entered = None;
    }

    /// Move to the stage containing `elapsed_ms` and return every stage newly
    /// entered on the way, in order. Stages skipped by a long frame are still
    /// reported. Never moves backwards.
    pub fn advance(&mut self, table: &StageTable, elapsed_ms: f64) -> Range<usize> {
        match table.stage_at(elapsed_ms) {
            Some(target) => self.advance_to(target),
            None => self.pending_empty(),
        }
    }

    /// Jump forward to `target`, reporting newly entered stages.
    pub fn advance_to(&mut self, target: usize) -> Range<usize> {
        let from = self.entered.map_or(0, |i| i + 1);
        if target < from {
            return self.pending_empty();
        }
        self.entered = Some(target);
        from..target + 1
    }

    fn pending_empty(&self) -> Range<usize> {
        let at = self.entered.map_or(0, |i| i + 1);
        at..at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> StageTable {
        StageTable::new(vec![
            Stage::new(0.0, 1000.0).with_message("one"),
            Stage::new(1000.0, 2000.0).with_message("two"),
            Stage::new(2000.0, 3000.0),
            Stage::open(3000.0).finishing(),
        ])
        .unwrap()
    }

    #[test]
    fn stage_at_uses_half_open_windows() {
        let t = table();
        assert_eq!(t.stage_at(0.0), Some(0));
        assert_eq!(t.stage_at(999.9), Some(0));
        assert_eq!(t.stage_at(1000.0), Some(1));
        assert_eq!(t.stage_at(1e9), Some(3));
        assert_eq!(t.stage_at(-1.0), None);
    }

    #[test]
    fn cursor_reports_each_entry_once() {
        let t = table();
        let mut cursor = StageCursor::new();
        assert_eq!(cursor.advance(&t, 0.0), 0..1);
        assert!(cursor.advance(&t, 500.0).is_empty());
        assert_eq!(cursor.advance(&t, 1200.0), 1..2);
        assert!(cursor.advance(&t, 1300.0).is_empty());
        assert_eq!(cursor.current(), Some(1));
    }

    #[test]
    fn cursor_reports_skipped_stages() {
        let t = table();
        let mut cursor = StageCursor::new();
        cursor.advance(&t, 0.0);
        assert_eq!(cursor.advance(&t, 5000.0), 1..4);
        assert!(cursor.advance(&t, 6000.0).is_empty());
    }

    #[test]
    fn cursor_never_regresses() {
        let t = table();
        let mut cursor = StageCursor::new();
        cursor.advance(&t, 2500.0);
        assert!(cursor.advance(&t, 100.0).is_empty());
        assert!(cursor.advance_to(1).is_empty());
        assert_eq!(cursor.current(), Some(2));
        cursor.reset();
        assert_eq!(cursor.advance(&t, 100.0), 0..1);
    }

    #[test]
    fn rejects_gaps_and_inversions() {
        assert_eq!(StageTable::new(vec![]), Err(StageError::Empty));
        assert!(matches!(
            StageTable::new(vec![Stage::new(0.0, 1000.0), Stage::new(1500.0, 2000.0)]),
            Err(StageError::Gap { index: 1, .. })
        ));
        assert!(matches!(
            StageTable::new(vec![Stage::new(1000.0, 500.0)]),
            Err(StageError::Inverted { index: 0, .. })
        ));
        assert_eq!(
            StageTable::new(vec![Stage::open(0.0), Stage::open(1000.0)]),
            Err(StageError::OpenEnded(0))
        );
    }

    #[test]
    fn deserializes_final_flag() {
        let json = r#"[
            { "start_ms": 0, "end_ms": 1000, "message": "go" },
            { "start_ms": 1000, "final": true }
        ]"#;
        let stages: Vec<Stage> = serde_json::from_str(json).unwrap();
        let t = StageTable::new(stages).unwrap();
        assert!(t.get(1).unwrap().is_final);
        assert_eq!(t.get(0).unwrap().message.as_deref(), Some("go"));
        assert!(t.check_index(2).is_err());
    }
}
