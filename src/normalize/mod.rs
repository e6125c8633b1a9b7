use serde::Serialize;
use serde_json::Value;

use crate::controller::FetchError;

pub const GRADE_SLOTS: usize = 8;

pub const SEMESTER_NUMERALS: [&str; GRADE_SLOTS] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII"];

// the envelope returned by the result service
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawResultPayload {
    pub success: bool,
    pub data: Option<Value>,
    pub from: Option<String>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl RawResultPayload {
    /// Parses a response body. Bodies that are not JSON, or whose JSON is a
    /// falsy value (`null`, `false`, `0`, `""`), are rejected.
    pub fn from_body(body: &str) -> Result<Self, FetchError> {
        let value: Value = serde_json::from_str(body).map_err(|_| FetchError::Parse)?;
        if !is_truthy(&value) {
            return Err(FetchError::Parse);
        }
        Ok(Self::from_value(value))
    }

    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut map) = value else {
            return Self::default();
        };
        let data = map.remove("data").filter(is_truthy);
        Self {
            success: map.get("success").is_some_and(is_truthy),
            data,
            from: map.get("from").and_then(value_text),
            message: map.get("message").and_then(value_text),
            error: map.get("error").and_then(value_text),
        }
    }

    pub fn rejection_reason(&self) -> String {
        self.message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| "No Result".to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
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
    SourcePage,
    PublishDate,
    Remarks,
    CumulativeGradePoint,
}

/// Source keys per logical field, most preferred first.
pub const FIELD_SOURCES: &[(Field, &[&str])] = &[
    (Field::Semester, &["semester"]),
    (Field::ExamHeld, &["exam_held", "examHeld"]),
    (Field::Registration, &["redg_no"]),
    (Field::Name, &["name"]),
    (Field::FatherName, &["father_name"]),
    (Field::MotherName, &["mother_name"]),
    (Field::CollegeCode, &["college_code"]),
    (Field::CollegeName, &["college_name"]),
    (Field::CourseCode, &["course_code"]),
    (Field::CourseName, &["course"]),
    (Field::SourcePage, &["sourcePage"]),
    (Field::PublishDate, &["publish_date", "publishDate"]),
    (Field::Remarks, &["fail_any", "remarks"]),
    (Field::CumulativeGradePoint, &["cgpa"]),
];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubjectRow {
    pub code: String,
    pub name: String,
    pub ese: String,
    pub ia: String,
    pub total: String,
    pub grade: String,
    pub credit: String,
}

impl SubjectRow {
    fn from_value(entry: &Value) -> Self {
        let text = |key: &str| entry.get(key).and_then(value_text).unwrap_or_default();
        Self {
            code: text("code"),
            name: text("name"),
            ese: text("ese"),
            ia: text("ia"),
            total: text("total"),
            grade: text("grade"),
            credit: text("credit"),
        }
    }

    pub fn cells(&self) -> [&str; 7] {
        [
            &self.code,
            &self.name,
            &self.ese,
            &self.ia,
            &self.total,
            &self.grade,
            &self.credit,
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CanonicalResult {
    pub semester: Option<String>,
    pub exam_held: Option<String>,
    pub registration: Option<String>,
    pub name: Option<String>,
    pub father_name: Option<String>,
    pub mother_name: Option<String>,
    pub college_code: Option<String>,
    pub college_name: Option<String>,
    pub course_code: Option<String>,
    pub course_name: Option<String>,
    pub source_page: Option<String>,
    pub publish_date: Option<String>,
    pub remarks: Option<String>,
    pub cumulative_grade_point: Option<String>,
    pub grade_points: [Option<String>; GRADE_SLOTS],
    pub current_grade_point: Option<String>,
    pub theory_subjects: Vec<SubjectRow>,
    pub practical_subjects: Vec<SubjectRow>,
}

impl CanonicalResult {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.field_ref(field).as_deref()
    }

    fn field_ref(&self, field: Field) -> &Option<String> {
        match field {
            Field::Semester => &self.semester,
            Field::ExamHeld => &self.exam_held,
            Field::Registration => &self.registration,
            Field::Name => &self.name,
            Field::FatherName => &self.father_name,
            Field::MotherName => &self.mother_name,
            Field::CollegeCode => &self.college_code,
            Field::CollegeName => &self.college_name,
            Field::CourseCode => &self.course_code,
            Field::CourseName => &self.course_name,
            Field::SourcePage => &self.source_page,
            Field::PublishDate => &self.publish_date,
            Field::Remarks => &self.remarks,
            Field::CumulativeGradePoint => &self.cumulative_grade_point,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Semester => &mut self.semester,
            Field::ExamHeld => &mut self.exam_held,
            Field::Registration => &mut self.registration,
            Field::Name => &mut self.name,
            Field::FatherName => &mut self.father_name,
            Field::MotherName => &mut self.mother_name,
            Field::CollegeCode => &mut self.college_code,
            Field::CollegeName => &mut self.college_name,
            Field::CourseCode => &mut self.course_code,
            Field::CourseName => &mut self.course_name,
            Field::SourcePage => &mut self.source_page,
            Field::PublishDate => &mut self.publish_date,
            Field::Remarks => &mut self.remarks,
            Field::CumulativeGradePoint => &mut self.cumulative_grade_point,
        }
    }
}

/// Maps the `data` object of a successful response onto the canonical record.
///
/// `registration` is the number the query was made with; it stands in when
/// the record carries no `redg_no` of its own. This function cannot fail:
/// missing or oddly shaped fields fall back to absent values and empty rows.
pub fn normalize(data: &Value, registration: &str) -> CanonicalResult {
    let mut out = CanonicalResult::default();
    for (field, keys) in FIELD_SOURCES {
        *out.field_mut(*field) = resolve(data, keys);
    }
    if out.registration.is_none() && !registration.is_empty() {
        out.registration = Some(registration.to_string());
    }

    let sgpa = data.get("sgpa");
    let points = grade_point_source(sgpa);
    for (slot, raw) in out.grade_points.iter_mut().zip(points.iter()) {
        *slot = raw
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
    }
    out.current_grade_point = current_grade_point(sgpa, data.get("semIndex"));

    out.theory_subjects = subject_rows(data.get("theorySubjects"));
    out.practical_subjects = subject_rows(data.get("practicalSubjects"));
    out
}

fn resolve(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| data.get(*key).and_then(value_text))
}

fn grade_point_source(sgpa: Option<&Value>) -> Vec<Option<String>> {
    match sgpa {
        Some(Value::Array(items)) => items.iter().map(value_text).collect(),
        Some(other) => match value_text(other) {
            Some(joined) => joined.split(',').map(|s| Some(s.to_string())).collect(),
            None => Vec::new(),
        },
        None => Vec::new(),
    }
}

// An absent semIndex selects the first semester whatever was queried.
fn current_grade_point(sgpa: Option<&Value>, sem_index: Option<&Value>) -> Option<String> {
    match sgpa? {
        Value::Array(items) => {
            let idx = semester_index(sem_index)?;
            items.get(idx).and_then(value_text)
        }
        other => value_text(other),
    }
}

fn semester_index(value: Option<&Value>) -> Option<usize> {
    match value {
        None => Some(0),
        Some(v) if !is_truthy(v) => Some(0),
        Some(Value::Number(n)) => n.as_u64().and_then(|n| usize::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse::<usize>().ok(),
        Some(_) => None,
    }
}

fn subject_rows(value: Option<&Value>) -> Vec<SubjectRow> {
    match value {
        Some(Value::Array(entries)) => entries.iter().map(SubjectRow::from_value).collect(),
        _ => Vec::new(),
    }
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Printable text of a loosely typed value; `None` when there is nothing to show.
pub fn value_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null | Value::Bool(false) => return None,
        Value::Bool(true) => "true".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| value_text(item).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => value.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
