pub mod page;

use serde::Serialize;

use crate::normalize::{CanonicalResult, Field, SubjectRow};
use crate::sanitize::Markup;

pub use page::ReportPage;

pub const PLACEHOLDER: &str = "-";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Semester,
    ExamHeld,
    Registration,
    Name,
    FatherName,
    MotherName,
    CollegeCode,
    CollegeName,
    CourseCode,
    CourseName,
    ExamTitle,
    PublishDate,
    CurrentGradePoint,
    Remarks,
}

impl Label {
    pub const ALL: [Label; 14] = [
        Label::Semester,
        Label::ExamHeld,
        Label::Registration,
        Label::Name,
        Label::FatherName,
        Label::MotherName,
        Label::CollegeCode,
        Label::CollegeName,
        Label::CourseCode,
        Label::CourseName,
        Label::ExamTitle,
        Label::PublishDate,
        Label::CurrentGradePoint,
        Label::Remarks,
    ];

    pub fn caption(self) -> &'static str {
        match self {
            Label::Semester => "Semester",
            Label::ExamHeld => "Exam Held",
            Label::Registration => "Registration No",
            Label::Name => "Student Name",
            Label::FatherName => "Father's Name",
            Label::MotherName => "Mother's Name",
            Label::CollegeCode => "College Code",
            Label::CollegeName => "College Name",
            Label::CourseCode => "Course Code",
            Label::CourseName => "Course Name",
            Label::ExamTitle => "Examination",
            Label::PublishDate => "Publish Date",
            Label::CurrentGradePoint => "SGPA",
            Label::Remarks => "Remarks",
        }
    }
}

// labels copied straight from a canonical field
const LABEL_FIELDS: [(Label, Field); 12] = [
    (Label::Semester, Field::Semester),
    (Label::ExamHeld, Field::ExamHeld),
    (Label::Registration, Field::Registration),
    (Label::Name, Field::Name),
    (Label::FatherName, Field::FatherName),
    (Label::MotherName, Field::MotherName),
    (Label::CollegeCode, Field::CollegeCode),
    (Label::CollegeName, Field::CollegeName),
    (Label::CourseCode, Field::CourseCode),
    (Label::CourseName, Field::CourseName),
    (Label::PublishDate, Field::PublishDate),
    (Label::Remarks, Field::Remarks),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemarkTone {
    Success,
    Failure,
    #[default]
    Neutral,
}

impl RemarkTone {
    /// "pass" wins over "fail"/"ab"; matching ignores case.
    pub fn classify(remark: &str) -> Self {
        let lower = remark.to_lowercase();
        if lower.contains("pass") {
            RemarkTone::Success
        } else if lower.contains("fail") || lower.contains("ab") {
            RemarkTone::Failure
        } else {
            RemarkTone::Neutral
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RemarkTone::Success => "#198754",
            RemarkTone::Failure => "#b00020",
            RemarkTone::Neutral => "#333",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectTable {
    Theory,
    Practical,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Status {
    pub message: String,
    pub is_error: bool,
}

impl Status {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }

    pub fn color(&self) -> &'static str {
        if self.is_error {
            "red"
        } else {
            "#444"
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Status: {}", self.message)
    }
}

/// The named insertion points of a report. Implementors own layout; the
/// pipeline only ever writes whole slots.
pub trait ReportSink {
    fn set_label(&mut self, label: Label, text: &str);
    fn set_remark_tone(&mut self, tone: RemarkTone);
    fn clear_tables(&mut self);
    fn append_row(&mut self, table: SubjectTable, cells: [Markup; 7]);
    fn set_grade_point(&mut self, slot: usize, text: &str);
    fn set_cumulative_grade_point(&mut self, text: &str);
    fn set_status(&mut self, status: Status);
    fn set_visible(&mut self, visible: bool);

    // diagnostics only; surfaces are free to drop them
    fn trace(&mut self, _line: &str) {}
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|s| !s.is_empty()).unwrap_or(PLACEHOLDER)
}

pub fn exam_title(result: &CanonicalResult) -> String {
    let period = result.exam_held.as_deref().unwrap_or("Result");
    match result.source_page.as_deref() {
        Some(page) => format!("{page} | {period}"),
        None => period.to_string(),
    }
}

pub fn escape_row(row: &SubjectRow) -> [Markup; 7] {
    row.cells().map(Markup::escape)
}

/// Paints a canonical result onto `sink`. Both subject tables are cleared
/// before any row is appended, so repeated renders never accumulate rows.
pub fn render<S: ReportSink + ?Sized>(result: &CanonicalResult, sink: &mut S) {
    for (label, field) in LABEL_FIELDS {
        sink.set_label(label, or_dash(result.get(field)));
    }
    sink.set_label(Label::ExamTitle, &exam_title(result));
    sink.set_label(
        Label::CurrentGradePoint,
        or_dash(result.current_grade_point.as_deref()),
    );
    sink.set_remark_tone(RemarkTone::classify(or_dash(result.remarks.as_deref())));

    sink.clear_tables();
    for row in result.theory_subjects.iter() {
        sink.append_row(SubjectTable::Theory, escape_row(row));
    }
    for row in result.practical_subjects.iter() {
        sink.append_row(SubjectTable::Practical, escape_row(row));
    }

    for (slot, value) in result.grade_points.iter().enumerate() {
        sink.set_grade_point(slot, or_dash(value.as_deref()));
    }
    sink.set_cumulative_grade_point(or_dash(result.cumulative_grade_point.as_deref()));
}
