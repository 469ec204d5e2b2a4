//! A whole dashboard session against the stub service: load, filter, select,
//! run, poll to completion and export.

use std::collections::HashMap;
use std::sync::mpsc::{Receiver, Sender};
use std::time::Duration;

use test_board::dashboard::{Dashboard, RunDecision, STATUS_READY};
use test_board::engine::{Engine, EngineHandle, Event, Request, RunnerEngine, StubService};
use test_board::render;
use test_board::types::{
    ActionResponse, ActionState, PollStatus, RowState, TestDescriptor, TestStatusUpdate, TestType,
};

const LOGIN: &str = "java://org.auraframework.LoginTest$testLogin()";
const LOGOUT: &str = "java://org.auraframework.LoginTest$TestLogout()";

fn fixture_tests() -> Vec<TestDescriptor> {
    serde_json::from_str(include_str!("fixtures/tests.json")).expect("valid tests.json fixture")
}

fn load(handle: &EngineHandle, rx: &Receiver<Event>, tx: &Sender<Event>) -> Dashboard {
    handle.send(Request::FetchTests {
        reply_tx: tx.clone(),
    });
    match rx.recv_timeout(Duration::from_secs(2)).unwrap() {
        Event::TestsFetched { tests } => Dashboard::new(tests),
        other => panic!("expected TestsFetched, got {other:?}"),
    }
}

/// Feed engine events into the dashboard until the batch is no longer running.
fn drive(dash: &mut Dashboard, rx: &Receiver<Event>) -> Vec<Event> {
    let mut seen = Vec::new();
    while dash.is_running() {
        let event = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("engine should keep reporting");
        match &event {
            Event::BatchRejected { batch, state, .. } => {
                dash.batch_rejected(*batch, *state);
            }
            Event::StatusUpdated { batch, status } => {
                dash.apply_status(*batch, status);
            }
            Event::BatchFinished { batch, status } => {
                assert!(dash.finish_batch(*batch, status));
                assert!(!dash.finish_batch(*batch, status), "finishes once");
            }
            Event::PollFailed { batch, state, .. } => {
                dash.poll_failed(*batch, *state);
            }
            _ => {}
        }
        seen.push(event);
    }
    seen
}

fn submit(dash: &mut Dashboard, handle: &EngineHandle, tx: &Sender<Event>) {
    match dash.run(false).unwrap() {
        RunDecision::Submit { batch, tests } => handle.send(Request::SubmitBatch {
            batch,
            tests,
            reply_tx: tx.clone(),
        }),
        RunDecision::NeedsConfirmation => panic!("no batch should be outstanding"),
    }
}

#[test]
fn filter_select_run_and_export() {
    let stub = StubService::new(fixture_tests());
    let mut running = HashMap::new();
    running.insert(LOGIN.to_owned(), TestStatusUpdate::new("RUNNING"));
    running.insert(LOGOUT.to_owned(), TestStatusUpdate::new("ENQUEUED"));
    let mut done = HashMap::new();
    done.insert(LOGIN.to_owned(), TestStatusUpdate::new("PASSED"));
    done.insert(
        LOGOUT.to_owned(),
        TestStatusUpdate::failed("AssertionError: <expected>\n\tat LoginTest"),
    );
    stub.push_poll(ActionResponse::success(PollStatus {
        tests_with_props_map: running,
        tests_running: true,
    }))
    .push_poll(ActionResponse::success(PollStatus {
        tests_with_props_map: done,
        tests_running: false,
    }));

    let handle = RunnerEngine::new(stub.clone(), Duration::from_millis(20)).start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();
    let mut dash = load(&handle, &rx, &tx);
    assert_eq!(dash.stat_line(), "unit: 2  jstest: 1  webdriver: 1  Total: 4");

    // Only unit tests matching "login" or "logout".
    dash.set_query("login, logout");
    for t in [TestType::Integration, TestType::JsTest, TestType::WebDriver] {
        dash.toggle_category(t);
    }
    assert_eq!(dash.apply_filter().unwrap(), 2);
    assert_eq!(dash.select_all_visible(true), 2);

    submit(&mut dash, &handle, &tx);
    let events = drive(&mut dash, &rx);
    assert!(matches!(events[0], Event::BatchAccepted { .. }));
    assert!(dash.is_finished());
    assert_eq!(dash.status(), STATUS_READY);

    let submitted = stub.submissions();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].1, vec![LOGIN.to_owned(), LOGOUT.to_owned()]);

    let states: Vec<&RowState> = dash.rows().iter().map(|r| &r.state).collect();
    assert_eq!(states[0], &RowState::Passed);
    assert_eq!(states[1], &RowState::Failed);
    // The catalogue reported the webdriver test as failed; that is not a run state.
    assert_eq!(states[3], &RowState::Idle);
    assert_eq!(dash.rows()[3].descriptor.status, "FAILED");

    // Failed-only narrows to failures from this run.
    assert_eq!(dash.toggle_failed_only(), Ok(true));
    assert_eq!(dash.visible_rows(), vec![1]);

    let html = render::page_document(&dash, 2).into_string();
    assert!(html.contains(
        "AssertionError: &lt;expected&gt;<br>&nbsp;&nbsp;&nbsp;&nbsp;at LoginTest"
    ));
    assert!(html.contains("2 Tests Selected"));
}

#[test]
fn rejected_submission_leaves_rows_idle() {
    let stub = StubService::new(fixture_tests());
    stub.push_submit(ActionResponse::failed(ActionState::Error, "runner busy"));
    let handle = RunnerEngine::new(stub.clone(), Duration::from_millis(20)).start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();
    let mut dash = load(&handle, &rx, &tx);

    dash.toggle_checked(0);
    submit(&mut dash, &handle, &tx);
    assert_eq!(dash.rows()[0].state, RowState::Enqueued);

    drive(&mut dash, &rx);
    assert!(!dash.is_running());
    assert_eq!(dash.rows()[0].state, RowState::Idle);
    assert_eq!(
        dash.notice(),
        Some("testRunner Action un-successful (return state = ERROR), please check the server")
    );
    std::thread::sleep(Duration::from_millis(100));
    assert_eq!(stub.poll_count(), 0);
}

#[test]
fn empty_selection_never_reaches_the_server() {
    let stub = StubService::new(fixture_tests());
    let handle = RunnerEngine::new(stub.clone(), Duration::from_millis(20)).start();
    let (tx, rx) = std::sync::mpsc::channel::<Event>();
    let mut dash = load(&handle, &rx, &tx);

    assert!(dash.run(false).is_err());
    assert!(!dash.is_running());
    assert_eq!(dash.notice(), Some("You must select at least one test"));
    assert!(stub.submissions().is_empty());
}
