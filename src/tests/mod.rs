use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use serde_json::json;

use crate::controller::{
    Controller, Endpoint, FetchError, FormInput, HttpReply, Outcome, PipelineState,
    SupersedePolicy, Transport,
};
use crate::normalize::{normalize, RawResultPayload};
use crate::render::{Label, RemarkTone, ReportPage, ReportSink, Status, SubjectTable};
use crate::sanitize::Markup;

#[derive(Clone)]
struct Canned {
    delay_ms: u64,
    reply: Result<HttpReply, String>,
}

#[derive(Default)]
struct FakeTransport {
    replies: HashMap<String, Canned>,
    requests: Arc<StdMutex<Vec<String>>>,
}

impl FakeTransport {
    fn reply(mut self, reg: &str, delay_ms: u64, status: u16, body: &str) -> Self {
        self.replies.insert(
            reg.to_string(),
            Canned {
                delay_ms,
                reply: Ok(HttpReply {
                    status,
                    body: Some(body.to_string()),
                }),
            },
        );
        self
    }

    fn fail(mut self, reg: &str, message: &str) -> Self {
        self.replies.insert(
            reg.to_string(),
            Canned {
                delay_ms: 0,
                reply: Err(message.to_string()),
            },
        );
        self
    }

    fn request_log(&self) -> Arc<StdMutex<Vec<String>>> {
        Arc::clone(&self.requests)
    }
}

impl Transport for FakeTransport {
    async fn get(&self, url: &reqwest::Url) -> Result<HttpReply, String> {
        self.requests.lock().unwrap().push(url.to_string());
        let reg = url
            .query_pairs()
            .find(|(k, _)| k == "reg")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        let canned = self
            .replies
            .get(&reg)
            .cloned()
            .unwrap_or_else(|| panic!("no canned reply for {reg}"));
        if canned.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(canned.delay_ms)).await;
        }
        canned.reply
    }
}

fn controller(transport: FakeTransport) -> Controller<FakeTransport, ReportPage> {
    let endpoint = Endpoint::new("http://localhost:3000").unwrap();
    Controller::new(endpoint, transport, ReportPage::default())
}

fn form(reg: &str) -> FormInput {
    FormInput {
        registration: reg.to_string(),
        semester: Some("I".to_string()),
        ..FormInput::default()
    }
}

fn success_body(name: &str) -> String {
    json!({
        "success": true,
        "from": "cache",
        "data": {
            "name": name,
            "sgpa": ["8.2", "7.9"],
            "theorySubjects": [
                {"code": "CS101", "name": "Algorithms", "ese": "60", "ia": "18", "total": "78", "grade": "A", "credit": "4"}
            ]
        }
    })
    .to_string()
}

// normalizer

#[test]
fn grade_points_same_from_array_and_joined_string() {
    let from_array = normalize(&json!({"sgpa": ["8.1", "7.5", "", "9"]}), "1");
    let from_string = normalize(&json!({"sgpa": "8.1,7.5,,9"}), "1");
    assert_eq!(from_array.grade_points, from_string.grade_points);
    assert_eq!(from_array.grade_points[0].as_deref(), Some("8.1"));
    assert_eq!(from_array.grade_points[2], None);
    assert_eq!(from_array.grade_points[3].as_deref(), Some("9"));
    assert_eq!(from_array.grade_points[7], None);
}

#[test]
fn grade_point_slots_are_trimmed_and_capped() {
    let result = normalize(&json!({"sgpa": " 8.0 , 7.0,1,2,3,4,5,6,7,8"}), "1");
    assert_eq!(result.grade_points[0].as_deref(), Some("8.0"));
    assert_eq!(result.grade_points[1].as_deref(), Some("7.0"));
    assert_eq!(result.grade_points[7].as_deref(), Some("6"));
}

#[test]
fn alternate_keys_resolve_in_preference_order() {
    let result = normalize(
        &json!({
            "examHeld": "Dec/2024",
            "publishDate": "2025-01-02",
            "remarks": "PASS",
            "fail_any": "FAIL: CS101"
        }),
        "1",
    );
    assert_eq!(result.exam_held.as_deref(), Some("Dec/2024"));
    assert_eq!(result.publish_date.as_deref(), Some("2025-01-02"));
    assert_eq!(result.remarks.as_deref(), Some("FAIL: CS101"));

    let result = normalize(&json!({"exam_held": "July/2025", "examHeld": "Dec/2024"}), "1");
    assert_eq!(result.exam_held.as_deref(), Some("July/2025"));
}

#[test]
fn registration_falls_back_to_queried_number() {
    assert_eq!(
        normalize(&json!({}), "12345").registration.as_deref(),
        Some("12345")
    );
    assert_eq!(
        normalize(&json!({"redg_no": 99}), "12345").registration.as_deref(),
        Some("99")
    );
}

#[test]
fn current_grade_point_follows_sem_index() {
    let data = json!({"sgpa": ["8.2", "7.9", "9.1"], "semIndex": 2});
    assert_eq!(
        normalize(&data, "1").current_grade_point.as_deref(),
        Some("9.1")
    );

    let data = json!({"sgpa": ["8.2", "7.9"]});
    assert_eq!(
        normalize(&data, "1").current_grade_point.as_deref(),
        Some("8.2")
    );

    let data = json!({"sgpa": ["8.2", "7.9"], "semIndex": 5});
    assert_eq!(normalize(&data, "1").current_grade_point, None);

    let data = json!({"sgpa": "8.2,7.9", "semIndex": 1});
    assert_eq!(
        normalize(&data, "1").current_grade_point.as_deref(),
        Some("8.2,7.9")
    );
}

#[test]
fn subject_rows_tolerate_missing_fields_and_numbers() {
    let result = normalize(
        &json!({
            "practicalSubjects": [{"code": "CS191", "total": 45, "credit": 2}],
            "theorySubjects": "not a list"
        }),
        "1",
    );
    assert!(result.theory_subjects.is_empty());
    assert_eq!(result.practical_subjects.len(), 1);
    let row = &result.practical_subjects[0];
    assert_eq!(row.cells(), ["CS191", "", "", "", "45", "", "2"]);
}

#[test]
fn payload_truthiness() {
    assert!(matches!(
        RawResultPayload::from_body("not json"),
        Err(FetchError::Parse)
    ));
    assert!(matches!(
        RawResultPayload::from_body("null"),
        Err(FetchError::Parse)
    ));
    let payload = RawResultPayload::from_body("[1,2]").unwrap();
    assert!(!payload.success);
    assert_eq!(payload.rejection_reason(), "No Result");

    let payload =
        RawResultPayload::from_body(r#"{"success":true,"data":{},"error":"stale"}"#).unwrap();
    assert!(payload.success);
    assert!(payload.data.is_some());
    assert_eq!(payload.rejection_reason(), "stale");
}

#[test]
fn falsy_bodies_are_parse_errors() {
    for body in ["0", "false", "\"\""] {
        assert!(
            matches!(RawResultPayload::from_body(body), Err(FetchError::Parse)),
            "{body} should not parse"
        );
    }
}

#[test]
fn truthy_scalar_bodies_carry_no_result() {
    for body in ["1", "true", "\"ok\""] {
        let payload = RawResultPayload::from_body(body).unwrap();
        assert!(!payload.success);
        assert!(payload.data.is_none());
        assert_eq!(payload.rejection_reason(), "No Result");
    }
}

#[test]
fn non_object_subject_entries_become_empty_rows() {
    let result = normalize(
        &json!({"theorySubjects": ["x", 5, null, {"code": true, "name": ["a", "b"]}]}),
        "1",
    );
    assert_eq!(result.theory_subjects.len(), 4);
    for row in &result.theory_subjects[..3] {
        assert_eq!(row.cells(), [""; 7]);
    }
    assert_eq!(
        result.theory_subjects[3].cells(),
        ["true", "a,b", "", "", "", "", ""]
    );
}

#[test]
fn numeric_string_sem_index_selects_slot() {
    let data = json!({"sgpa": ["8.2", "9", "7.1"], "semIndex": "1"});
    assert_eq!(normalize(&data, "1").current_grade_point.as_deref(), Some("9"));

    let data = json!({"sgpa": ["8.2", "9"], "semIndex": "first"});
    assert_eq!(normalize(&data, "1").current_grade_point, None);
}

#[test]
fn value_text_prints_booleans_and_lists() {
    use crate::normalize::value_text;
    assert_eq!(value_text(&json!(true)).as_deref(), Some("true"));
    assert_eq!(value_text(&json!(false)), None);
    assert_eq!(value_text(&json!(0)).as_deref(), Some("0"));
    assert_eq!(value_text(&json!(["a", 2, null])).as_deref(), Some("a,2,"));
    assert_eq!(value_text(&json!([])), None);
    assert_eq!(value_text(&json!("")), None);
}

// renderer

#[test]
fn absent_fields_render_as_dashes() {
    let mut page = ReportPage::default();
    crate::render::render(&normalize(&json!({}), ""), &mut page);
    assert_eq!(page.label(Label::Name), "-");
    assert_eq!(page.label(Label::Registration), "-");
    assert_eq!(page.label(Label::ExamTitle), "Result");
    assert_eq!(page.label(Label::CurrentGradePoint), "-");
    assert!(page.grade_points.iter().all(|g| g == "-"));
    assert_eq!(page.cumulative_grade_point, "-");
    assert_eq!(page.remark_tone, RemarkTone::Neutral);
}

#[test]
fn exam_title_prefixes_source_page() {
    let mut page = ReportPage::default();
    let result = normalize(
        &json!({"sourcePage": "B.Tech 1st Sem", "exam_held": "July/2025"}),
        "1",
    );
    crate::render::render(&result, &mut page);
    assert_eq!(page.label(Label::ExamTitle), "B.Tech 1st Sem | July/2025");
}

#[test]
fn remark_tone_prefers_pass() {
    assert_eq!(RemarkTone::classify("PASS"), RemarkTone::Success);
    assert_eq!(RemarkTone::classify("Passed with fail history"), RemarkTone::Success);
    assert_eq!(RemarkTone::classify("FAIL: CS101"), RemarkTone::Failure);
    assert_eq!(RemarkTone::classify("Absent"), RemarkTone::Failure);
    assert_eq!(RemarkTone::classify("-"), RemarkTone::Neutral);
}

#[test]
fn rendering_twice_does_not_accumulate_rows() {
    let data = json!({
        "theorySubjects": [{"code": "A"}, {"code": "B"}],
        "practicalSubjects": [{"code": "C"}]
    });
    let result = normalize(&data, "1");
    let mut page = ReportPage::default();
    crate::render::render(&result, &mut page);
    crate::render::render(&result, &mut page);
    assert_eq!(page.rows(SubjectTable::Theory).len(), 2);
    assert_eq!(page.rows(SubjectTable::Practical).len(), 1);
}

#[test]
fn hostile_cells_are_escaped() {
    let data = json!({"theorySubjects": [{"name": "<img src=x onerror=\"a()\"> & co"}]});
    let mut page = ReportPage::default();
    crate::render::render(&normalize(&data, "1"), &mut page);
    assert_eq!(
        page.rows(SubjectTable::Theory)[0][1].as_str(),
        "&lt;img src=x onerror=&quot;a()&quot;&gt; &amp; co"
    );
}

#[derive(Default)]
struct CountingSink {
    labels: usize,
    clears: usize,
    rows: usize,
    grade_slots: Vec<usize>,
    cgpa: usize,
}

impl ReportSink for CountingSink {
    fn set_label(&mut self, _label: Label, _text: &str) {
        self.labels += 1;
    }
    fn set_remark_tone(&mut self, _tone: RemarkTone) {}
    fn clear_tables(&mut self) {
        self.clears += 1;
    }
    fn append_row(&mut self, _table: SubjectTable, _cells: [Markup; 7]) {
        assert!(self.clears > 0, "row appended before tables were cleared");
        self.rows += 1;
    }
    fn set_grade_point(&mut self, slot: usize, _text: &str) {
        self.grade_slots.push(slot);
    }
    fn set_cumulative_grade_point(&mut self, _text: &str) {
        self.cgpa += 1;
    }
    fn set_status(&mut self, _status: Status) {}
    fn set_visible(&mut self, _visible: bool) {}
}

#[test]
fn render_writes_every_slot_once() {
    let data = json!({"theorySubjects": [{"code": "A"}], "practicalSubjects": [{"code": "B"}]});
    let mut sink = CountingSink::default();
    crate::render::render(&normalize(&data, "1"), &mut sink);
    assert_eq!(sink.labels, Label::ALL.len());
    assert_eq!(sink.clears, 1);
    assert_eq!(sink.rows, 2);
    assert_eq!(sink.grade_slots, (0..8).collect::<Vec<_>>());
    assert_eq!(sink.cgpa, 1);
}

// controller

#[tokio::test]
async fn success_shows_report() {
    let app = controller(FakeTransport::default().reply("12345", 0, 200, &success_body("Asha Rao")));
    let outcome = app.submit(&form("12345")).await;
    assert_eq!(
        outcome,
        Outcome::Shown {
            from: "cache".to_string()
        }
    );
    assert_eq!(app.state().await, PipelineState::Shown);

    let page = app.into_sink();
    assert!(page.visible);
    assert_eq!(page.label(Label::Name), "Asha Rao");
    assert_eq!(page.label(Label::Registration), "12345");
    let theory = page.rows(SubjectTable::Theory);
    assert_eq!(theory.len(), 1);
    let cells: Vec<&str> = theory[0].iter().map(|c| c.as_str()).collect();
    assert_eq!(cells, ["CS101", "Algorithms", "60", "18", "78", "A", "4"]);
    assert_eq!(page.grade_points[0], "8.2");
    assert_eq!(page.grade_points[1], "7.9");
    assert!(page.grade_points[2..].iter().all(|g| g == "-"));
    assert_eq!(page.status, Some(Status::info("Result loaded (cache)")));
}

#[tokio::test]
async fn missing_source_reads_unknown() {
    let body = json!({"success": true, "data": {"name": "X"}}).to_string();
    let app = controller(FakeTransport::default().reply("1", 0, 200, &body));
    assert_eq!(
        app.submit(&form("1")).await,
        Outcome::Shown {
            from: "unknown".to_string()
        }
    );
}

#[tokio::test]
async fn empty_registration_sends_nothing() {
    let transport = FakeTransport::default();
    let requests = transport.request_log();
    let app = controller(transport);
    let outcome = app.submit(&form("   ")).await;
    assert_eq!(outcome, Outcome::Rejected(FetchError::Validation));
    assert_eq!(app.state().await, PipelineState::Idle);

    let status = app.inspect(|page| page.status.clone()).await;
    assert_eq!(status, Some(Status::error("Please enter Registration No")));
    let visible = app.inspect(|page| page.visible).await;
    assert!(!visible);

    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn validation_does_not_hide_a_shown_report() {
    let app = controller(FakeTransport::default().reply("1", 0, 200, &success_body("Asha Rao")));
    app.submit(&form("1")).await;
    app.submit(&form("")).await;
    let (visible, name) = app
        .inspect(|page| (page.visible, page.label(Label::Name).to_string()))
        .await;
    assert!(visible);
    assert_eq!(name, "Asha Rao");
    assert_eq!(app.state().await, PipelineState::Shown);
}

#[tokio::test]
async fn server_error_hides_report() {
    let app = controller(FakeTransport::default().reply("1", 0, 500, "Internal Error"));
    let outcome = app.submit(&form("1")).await;
    assert_eq!(
        outcome,
        Outcome::Hidden(FetchError::Transport {
            status: 500,
            excerpt: "Internal Error".to_string()
        })
    );
    let page = app.into_sink();
    assert!(!page.visible);
    assert_eq!(
        page.status,
        Some(Status::error("Server returned 500. Internal Error"))
    );
}

#[tokio::test]
async fn server_error_excerpt_is_capped() {
    let long = "x".repeat(500);
    let app = controller(FakeTransport::default().reply("1", 0, 502, &long));
    match app.submit(&form("1")).await {
        Outcome::Hidden(FetchError::Transport { status, excerpt }) => {
            assert_eq!(status, 502);
            assert_eq!(excerpt.chars().count(), 200);
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn service_rejection_uses_message() {
    let body = json!({"success": false, "message": "No such candidate"}).to_string();
    let app = controller(FakeTransport::default().reply("1", 0, 200, &body));
    app.submit(&form("1")).await;
    let page = app.into_sink();
    assert!(!page.visible);
    assert_eq!(
        page.status,
        Some(Status::error("No Result Found. No such candidate"))
    );
}

#[tokio::test]
async fn success_without_data_is_a_rejection() {
    let body = json!({"success": true, "data": null}).to_string();
    let app = controller(FakeTransport::default().reply("1", 0, 200, &body));
    assert_eq!(
        app.submit(&form("1")).await,
        Outcome::Hidden(FetchError::ServiceRejection {
            reason: "No Result".to_string()
        })
    );
}

#[tokio::test]
async fn invalid_json_hides_report() {
    let app = controller(FakeTransport::default().reply("1", 0, 200, "<html>oops</html>"));
    assert_eq!(app.submit(&form("1")).await, Outcome::Hidden(FetchError::Parse));
    let page = app.into_sink();
    assert_eq!(page.status, Some(Status::error("Invalid JSON from server")));
}

#[tokio::test]
async fn network_failure_hides_report() {
    let app = controller(FakeTransport::default().fail("1", "connection refused"));
    app.submit(&form("1")).await;
    assert_eq!(app.state().await, PipelineState::Hidden);
    let page = app.into_sink();
    assert!(!page.visible);
    assert_eq!(
        page.status,
        Some(Status::error("Network / Proxy error: connection refused"))
    );
}

#[tokio::test]
async fn failure_after_success_hides_previous_report() {
    let transport = FakeTransport::default()
        .reply("1", 0, 200, &success_body("Asha Rao"))
        .reply("2", 0, 404, "missing");
    let app = controller(transport);
    app.submit(&form("1")).await;
    app.submit(&form("2")).await;
    let page = app.into_sink();
    assert!(!page.visible);
    assert!(page.rows(SubjectTable::Theory).is_empty());
}

#[tokio::test]
async fn resubmitting_is_idempotent() {
    let app = controller(FakeTransport::default().reply("1", 0, 200, &success_body("Asha Rao")));
    app.submit(&form("1")).await;
    let first = app.inspect(|page| page.clone()).await;
    app.submit(&form("1")).await;
    let second = app.inspect(|page| page.clone()).await;
    assert_eq!(first, second);
    assert_eq!(second.rows(SubjectTable::Theory).len(), 1);
}

#[tokio::test]
async fn request_carries_every_parameter() {
    let transport = FakeTransport::default().reply("12 345", 0, 200, &success_body("A"));
    let requests = transport.request_log();
    let app = controller(transport);
    app.submit(&FormInput {
        registration: " 12 345 ".to_string(),
        semester: Some("III".to_string()),
        year: Some("2023".to_string()),
        exam_held: Some("Dec/2023".to_string()),
    })
    .await;
    assert_eq!(
        requests.lock().unwrap().as_slice(),
        ["http://localhost:3000/result?reg=12+345&sem=III&year=2023&examHeld=Dec%2F2023"]
    );
}

#[tokio::test]
async fn last_response_wins_by_default() {
    let transport = FakeTransport::default()
        .reply("slow", 80, 200, &success_body("Slow Candidate"))
        .reply("fast", 10, 200, &success_body("Fast Candidate"));
    let app = controller(transport);
    let (slow_form, fast_form) = (form("slow"), form("fast"));
    let (slow, fast) = futures::join!(app.submit(&slow_form), app.submit(&fast_form));
    assert!(slow.is_shown());
    assert!(fast.is_shown());
    let name = app.inspect(|page| page.label(Label::Name).to_string()).await;
    assert_eq!(name, "Slow Candidate");
}

#[tokio::test]
async fn latest_request_wins_drops_stale_responses() {
    let transport = FakeTransport::default()
        .reply("slow", 80, 200, &success_body("Slow Candidate"))
        .reply("fast", 10, 200, &success_body("Fast Candidate"));
    let app = controller(transport).with_policy(SupersedePolicy::LatestRequestWins);
    let (slow_form, fast_form) = (form("slow"), form("fast"));
    let (slow, fast) = futures::join!(app.submit(&slow_form), app.submit(&fast_form));
    assert_eq!(slow, Outcome::Superseded);
    assert!(fast.is_shown());
    let name = app.inspect(|page| page.label(Label::Name).to_string()).await;
    assert_eq!(name, "Fast Candidate");
}

#[tokio::test]
async fn one_request_per_submission() {
    let transport = FakeTransport::default().reply("7", 0, 200, &success_body("A"));
    let requests = transport.request_log();
    let endpoint = Endpoint::new("http://localhost:3000/").unwrap();
    let app = Controller::new(endpoint, transport, ReportPage::default());
    app.submit(&form("7")).await;
    app.submit(&form("7")).await;
    app.submit(&form("")).await;
    assert_eq!(requests.lock().unwrap().len(), 2);
    assert_eq!(app.endpoint().url().as_str(), "http://localhost:3000/result");
}
