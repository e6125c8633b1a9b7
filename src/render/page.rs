use std::collections::BTreeMap;

use serde::Serialize;

use super::{Label, RemarkTone, ReportSink, Status, SubjectTable, PLACEHOLDER};
use crate::normalize::GRADE_SLOTS;
use crate::sanitize::Markup;

/// In-memory report surface. Starts hidden with every slot showing `-`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportPage {
    pub visible: bool,
    pub status: Option<Status>,
    pub labels: BTreeMap<Label, String>,
    pub remark_tone: RemarkTone,
    pub theory_rows: Vec<[Markup; 7]>,
    pub practical_rows: Vec<[Markup; 7]>,
    pub grade_points: [String; GRADE_SLOTS],
    pub cumulative_grade_point: String,
}

impl Default for ReportPage {
    fn default() -> Self {
        Self {
            visible: false,
            status: None,
            labels: Label::ALL
                .iter()
                .map(|label| (*label, PLACEHOLDER.to_string()))
                .collect(),
            remark_tone: RemarkTone::Neutral,
            theory_rows: Vec::new(),
            practical_rows: Vec::new(),
            grade_points: std::array::from_fn(|_| PLACEHOLDER.to_string()),
            cumulative_grade_point: PLACEHOLDER.to_string(),
        }
    }
}

impl ReportPage {
    pub fn label(&self, label: Label) -> &str {
        self.labels
            .get(&label)
            .map(|s| s.as_str())
            .unwrap_or(PLACEHOLDER)
    }

    pub fn rows(&self, table: SubjectTable) -> &[[Markup; 7]] {
        match table {
            SubjectTable::Theory => &self.theory_rows,
            SubjectTable::Practical => &self.practical_rows,
        }
    }
}

impl ReportSink for ReportPage {
    fn set_label(&mut self, label: Label, text: &str) {
        self.labels.insert(label, text.to_string());
    }

    fn set_remark_tone(&mut self, tone: RemarkTone) {
        self.remark_tone = tone;
    }

    fn clear_tables(&mut self) {
        self.theory_rows.clear();
        self.practical_rows.clear();
    }

    fn append_row(&mut self, table: SubjectTable, cells: [Markup; 7]) {
        match table {
            SubjectTable::Theory => self.theory_rows.push(cells),
            SubjectTable::Practical => self.practical_rows.push(cells),
        }
    }

    fn set_grade_point(&mut self, slot: usize, text: &str) {
        if let Some(cell) = self.grade_points.get_mut(slot) {
            *cell = text.to_string();
        }
    }

    fn set_cumulative_grade_point(&mut self, text: &str) {
        self.cumulative_grade_point = text.to_string();
    }

    fn set_status(&mut self, status: Status) {
        self.status = Some(status);
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }
}
