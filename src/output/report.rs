use crate::normalize::SEMESTER_NUMERALS;
use crate::render::{Label, ReportPage, SubjectTable};
use crate::sanitize::{escape, escape_opt, Markup};

fn meta_row(page: &ReportPage, left: Label, right: Label) -> String {
    format!(
        r#"        <tr>
          <th>{left_caption}</th><td id="{left_id}">{left_value}</td>
          <th>{right_caption}</th><td id="{right_id}">{right_value}</td>
        </tr>
"#,
        left_caption = left.caption(),
        left_id = label_id(left),
        left_value = escape(page.label(left)),
        right_caption = right.caption(),
        right_id = label_id(right),
        right_value = escape(page.label(right)),
    )
}

fn label_id(label: Label) -> &'static str {
    match label {
        Label::Semester => "semesterLabel",
        Label::ExamHeld => "examHeldLabel",
        Label::Registration => "regLabel",
        Label::Name => "nameLabel",
        Label::FatherName => "fatherLabel",
        Label::MotherName => "motherLabel",
        Label::CollegeCode => "collegeCode",
        Label::CollegeName => "collegeName",
        Label::CourseCode => "courseCode",
        Label::CourseName => "courseName",
        Label::ExamTitle => "examTitle",
        Label::PublishDate => "publish_date",
        Label::CurrentGradePoint => "sgpa_display",
        Label::Remarks => "remarksValue",
    }
}

fn subject_rows(rows: &[[Markup; 7]]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&format!(
            r#"        <tr><td align="center">{}</td><td align="left">{}</td><td align="center">{}</td><td align="center">{}</td><td align="center">{}</td><td align="center">{}</td><td align="center">{}</td></tr>
"#,
            row[0], row[1], row[2], row[3], row[4], row[5], row[6]
        ));
    }
    out
}

fn grade_grid(page: &ReportPage) -> (String, String) {
    let mut head = String::new();
    let mut cells = String::new();
    for (numeral, value) in SEMESTER_NUMERALS.iter().zip(page.grade_points.iter()) {
        head.push_str(&format!("<th>{numeral}</th>"));
        cells.push_str(&format!(
            r#"<td id="sgpa_{numeral}">{}</td>"#,
            escape(value)
        ));
    }
    head.push_str("<th>CGPA</th>");
    cells.push_str(&format!(
        r#"<td id="cur_cgpa">{}</td>"#,
        escape(&page.cumulative_grade_point)
    ));
    (head, cells)
}

fn subject_table(title: &str, body_id: &str, rows: &[[Markup; 7]]) -> String {
    format!(
        r#"    <h3>{title}</h3>
    <table class="grid">
      <thead>
        <tr><th>Subject Code</th><th>Subject Name</th><th>ESE</th><th>IA</th><th>Total</th><th>Grade</th><th>Credit</th></tr>
      </thead>
      <tbody id="{body_id}">
{rows}      </tbody>
    </table>
"#,
        rows = subject_rows(rows),
    )
}

pub fn render_html(page: &ReportPage) -> Vec<u8> {
    let status_line = page.status.as_ref().map(|status| status.to_string());
    let status_text = escape_opt(status_line.as_deref());
    let status_color = page.status.as_ref().map_or("#444", |status| status.color());
    let section_class = if page.visible { "result" } else { "result hidden" };

    let meta = [
        meta_row(page, Label::Registration, Label::Semester),
        meta_row(page, Label::Name, Label::ExamHeld),
        meta_row(page, Label::FatherName, Label::MotherName),
        meta_row(page, Label::CollegeCode, Label::CollegeName),
        meta_row(page, Label::CourseCode, Label::CourseName),
    ]
    .concat();
    let (grade_head, grade_cells) = grade_grid(page);

    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Semester Result</title>
  <style>
    body {{ font-family: Arial, Helvetica, sans-serif; color: #222; margin: 24px; }}
    .hidden {{ display: none; }}
    .result {{ max-width: 960px; margin: 0 auto; border: 1px solid #999; padding: 16px; }}
    h2, h3 {{ text-align: center; margin: 8px 0; }}
    table {{ width: 100%; border-collapse: collapse; margin-bottom: 16px; }}
    th, td {{ border: 1px solid #999; padding: 4px 8px; font-size: 14px; }}
    th {{ background: #f1f1f1; text-align: left; }}
    table.grid th {{ text-align: center; }}
    #status {{ font-weight: bold; }}
    @media print {{ #status {{ display: none; }} }}
  </style>
</head>
<body>
  <p id="status" style="color: {status_color}">{status_text}</p>
  <section id="resultSection" class="{section_class}">
    <h2 id="examTitle">{exam_title}</h2>
    <table class="meta">
{meta}    </table>
{theory}{practical}    <h3>Semester Grade Points</h3>
    <table class="grid">
      <tr>{grade_head}</tr>
      <tr>{grade_cells}</tr>
    </table>
    <table class="meta">
      <tr><th>{sgpa_caption}</th><td id="sgpa_display">{sgpa}</td></tr>
      <tr><th>{remarks_caption}</th><td id="remarksValue" style="color: {remark_color}">{remarks}</td></tr>
      <tr><th>{publish_caption}</th><td id="publish_date">{publish}</td></tr>
    </table>
  </section>
</body>
</html>
"####,
        exam_title = escape(page.label(Label::ExamTitle)),
        theory = subject_table("Theory", "theoryBody", page.rows(SubjectTable::Theory)),
        practical = subject_table(
            "Practical",
            "practicalBody",
            page.rows(SubjectTable::Practical)
        ),
        sgpa_caption = Label::CurrentGradePoint.caption(),
        sgpa = escape(page.label(Label::CurrentGradePoint)),
        remarks_caption = Label::Remarks.caption(),
        remark_color = page.remark_tone.color(),
        remarks = escape(page.label(Label::Remarks)),
        publish_caption = Label::PublishDate.caption(),
        publish = escape(page.label(Label::PublishDate)),
    );

    html.into_bytes()
}
