pub mod report;

use colored::Colorize;

use crate::normalize::SEMESTER_NUMERALS;
use crate::render::{Label, RemarkTone, ReportPage, SubjectTable};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn render(page: &ReportPage, format: OutputFormat) -> Result<Vec<u8>, String> {
    match format {
        OutputFormat::Text => Ok(render_text(page)),
        OutputFormat::Json => render_json(page),
        OutputFormat::Html => Ok(render_html(page)),
    }
}

const TABLE_HEADER: [&str; 7] = ["Code", "Subject", "ESE", "IA", "Total", "Grade", "Credit"];

fn grade_grid_lines(page: &ReportPage) -> (String, String) {
    let mut head = String::new();
    let mut values = String::new();
    for (numeral, value) in SEMESTER_NUMERALS.iter().zip(page.grade_points.iter()) {
        head.push_str(&format!("{:>6}", numeral));
        values.push_str(&format!("{:>6}", value));
    }
    head.push_str(&format!("{:>8}", "CGPA"));
    values.push_str(&format!("{:>8}", page.cumulative_grade_point));
    (head, values)
}

pub fn render_text(page: &ReportPage) -> Vec<u8> {
    let mut out = String::new();
    if let Some(status) = page.status.as_ref() {
        out.push_str(&status.to_string());
        out.push('\n');
    }
    if !page.visible {
        return out.into_bytes();
    }

    out.push('\n');
    for label in Label::ALL {
        out.push_str(&format!("{:<16}: {}\n", label.caption(), page.label(label)));
    }
    for (title, table) in [
        ("Theory", SubjectTable::Theory),
        ("Practical", SubjectTable::Practical),
    ] {
        out.push('\n');
        out.push_str(title);
        out.push('\n');
        out.push_str(&TABLE_HEADER.join("\t"));
        out.push('\n');
        for row in page.rows(table) {
            let cells = row.iter().map(|c| c.text()).collect::<Vec<_>>();
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
    }
    let (head, values) = grade_grid_lines(page);
    out.push('\n');
    out.push_str(&head);
    out.push('\n');
    out.push_str(&values);
    out.push('\n');
    out.into_bytes()
}

pub fn render_json(page: &ReportPage) -> Result<Vec<u8>, String> {
    let mut out =
        serde_json::to_vec_pretty(page).map_err(|e| format!("failed to encode report: {e}"))?;
    out.push(b'\n');
    Ok(out)
}

pub fn render_html(page: &ReportPage) -> Vec<u8> {
    report::render_html(page)
}

fn format_kv_line(label: &str, value: &str) -> String {
    format!(":: {:<16}: {}", label, value.bold().white())
}

/// Colored summary of a visible report for the terminal.
pub fn render_terminal(page: &ReportPage) -> String {
    let mut lines: Vec<String> = Vec::new();
    for label in Label::ALL {
        if label == Label::Remarks {
            continue;
        }
        lines.push(format_kv_line(label.caption(), page.label(label)));
    }
    let remark = page.label(Label::Remarks);
    let remark = match page.remark_tone {
        RemarkTone::Success => remark.bold().green(),
        RemarkTone::Failure => remark.bold().red(),
        RemarkTone::Neutral => remark.bold().white(),
    };
    lines.push(format!(":: {:<16}: {}", Label::Remarks.caption(), remark));

    for (title, table) in [
        ("Theory", SubjectTable::Theory),
        ("Practical", SubjectTable::Practical),
    ] {
        lines.push(String::new());
        lines.push(format!("{}", title.bold().cyan()));
        lines.push(format!(
            "  {:<10} {:<36} {:>5} {:>5} {:>6} {:>6} {:>6}",
            TABLE_HEADER[0],
            TABLE_HEADER[1],
            TABLE_HEADER[2],
            TABLE_HEADER[3],
            TABLE_HEADER[4],
            TABLE_HEADER[5],
            TABLE_HEADER[6]
        ));
        for row in page.rows(table) {
            lines.push(format!(
                "  {:<10} {:<36} {:>5} {:>5} {:>6} {:>6} {:>6}",
                row[0].text(),
                row[1].text(),
                row[2].text(),
                row[3].text(),
                row[4].text(),
                row[5].text(),
                row[6].text()
            ));
        }
    }

    let (head, values) = grade_grid_lines(page);
    lines.push(String::new());
    lines.push(format!("{}", head.bold().cyan()));
    lines.push(values);
    lines.join("\n")
}
