use std::fmt;

use crate::genesys::models::{ObservationResponse, METRIC_ACTIVE, METRIC_WAITING};

use super::StatusColor;

const DANGER_ABOVE: u64 = 10;
const WARNING_ABOVE: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Danger,
}

impl Severity {
    /// 0..=3 success, 4..=10 warning, 11+ danger.
    pub fn classify(waiting: u64) -> Self {
        if waiting > DANGER_ABOVE {
            Self::Danger
        } else if waiting > WARNING_ABOVE {
            Self::Warning
        } else {
            Self::Success
        }
    }

    pub fn color(self) -> StatusColor {
        match self {
            Self::Success => StatusColor::Green,
            Self::Warning => StatusColor::Orange,
            Self::Danger => StatusColor::Red,
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueRow {
    pub name: String,
    pub waiting: u64,
    pub active: u64,
    pub severity: Severity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueView {
    /// No queue data (absent or empty result list).
    Empty,
    Queues(Vec<QueueRow>),
}

impl QueueView {
    pub fn rows(&self) -> &[QueueRow] {
        match self {
            Self::Empty => &[],
            Self::Queues(rows) => rows,
        }
    }

    pub fn total_waiting(&self) -> u64 {
        self.rows().iter().map(|r| r.waiting).sum()
    }
}

impl fmt::Display for QueueView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => writeln!(f, "  No queue data available"),
            Self::Queues(rows) => {
                for row in rows {
                    writeln!(
                        f,
                        "  {:<32} {:>4} waiting {:>4} active  [{}]",
                        row.name,
                        row.waiting,
                        row.active,
                        row.severity.class_name()
                    )?;
                }
                Ok(())
            }
        }
    }
}

pub fn present_queues(payload: &ObservationResponse) -> QueueView {
    let results = match payload.results.as_deref() {
        Some(r) if !r.is_empty() => r,
        _ => return QueueView::Empty,
    };

    let mut rows: Vec<QueueRow> = results
        .iter()
        .map(|q| {
            let waiting = q.metric_count(METRIC_WAITING);
            QueueRow {
                name: q.display_name().to_string(),
                waiting,
                active: q.metric_count(METRIC_ACTIVE),
                severity: Severity::classify(waiting),
            }
        })
        .collect();
    rows.sort_by(|a, b| b.waiting.cmp(&a.waiting));

    QueueView::Queues(rows)
}
