//! End-to-end session scenarios through the wire codec, coordinator, and controller.

use relay::coordinator::ExecutionCoordinator;
use relay::core::error::{Operation, RelayError};
use relay::core::planner::{self, PlannerDecision};
use relay::core::session::Session;
use relay::core::signal::HumanSignal;
use relay::core::types::{ExitStatus, Mode, TurnKind, TurnPayload};
use relay::core::wire::{BatchMessage, BatchResponse};
use relay::io::executor::RunOutput;
use relay::io::message::parse_batch_message;
use relay::io::session_store::{load_session, session_path, write_session};
use relay::test_support::{ScriptedExecutor, ScriptedPlanner, ScriptedRun};

/// Scenario A: a sequence message runs fully and the session returns to planning.
#[test]
fn sequence_message_runs_and_resolves() {
    let batch = parse_batch_message(r#"{"data": ["pwd", "ls"]}"#).expect("parse");
    let mut session = Session::new("show me where I am");
    let planner = ScriptedPlanner::new(vec![PlannerDecision::IssueBatch(batch)]);

    let batch = match planner::next(&session, &planner).expect("decide") {
        PlannerDecision::IssueBatch(batch) => batch,
        other => panic!("expected a batch, got {other:?}"),
    };
    let batch_index = session.begin_batch(batch.clone()).expect("begin");

    let mut executor = ScriptedExecutor::new(vec![
        ScriptedRun::Output(RunOutput::exited(0, "/home/u\n")),
        ScriptedRun::Output(RunOutput::exited(0, "notes.txt\n")),
    ]);
    let result = ExecutionCoordinator::default()
        .execute(&mut executor, &batch)
        .expect("execute");
    let response = BatchResponse::from(&result);
    let result_index = session.resolve_with_result(result).expect("resolve");

    assert_eq!((batch_index, result_index), (0, 1));
    assert!(response.success);
    assert_eq!(response.data.len(), 2);
    assert_eq!(response.data[1].output, "notes.txt\n");
    assert_eq!(session.mode(), Mode::Planning);
    assert!(!session.last_batch_failed());
}

/// Scenario B: a failing `cd` halts the batch; the advisory is set.
#[test]
fn failing_command_halts_and_sets_advisory() {
    let batch =
        parse_batch_message(r#"{"data": ["pwd", "cd /nonexistent", "ls"]}"#).expect("parse");
    let mut session = Session::new("explore");
    session.begin_batch(batch.clone()).expect("begin");

    let mut executor = ScriptedExecutor::new(vec![
        ScriptedRun::Output(RunOutput::exited(0, "/home/u\n")),
        ScriptedRun::Output(RunOutput::exited(
            1,
            "cd: no such file or directory: /nonexistent\n",
        )),
    ]);
    let result = ExecutionCoordinator::default()
        .execute(&mut executor, &batch)
        .expect("execute");
    assert_eq!(executor.calls(), ["pwd", "cd /nonexistent"]);
    session.resolve_with_result(result).expect("resolve");

    assert_eq!(session.mode(), Mode::Planning);
    assert!(session.last_batch_failed());
    let last = session.record().last_result().cloned().expect("result");
    assert_eq!(last.outcomes.len(), 2);
    assert_eq!(last.not_attempted(), 1);
    assert_eq!(last.outcomes[1].status, ExitStatus::Failure { code: 1 });
}

/// Scenario C: a chat reply interrupts; the continue token resumes; no result is synthesized.
#[test]
fn chat_interrupt_then_continue_resumes_without_result() {
    let batch = parse_batch_message(r#"{"data": "ls -l"}"#).expect("parse");
    let mut session = Session::new("list files");
    let batch_index = session.begin_batch(batch).expect("begin");

    let signal = session
        .apply_human_reply("what does -l mean?", "continue")
        .expect("interrupt");
    assert_eq!(signal, HumanSignal::Chat("what does -l mean?".to_string()));
    assert_eq!(session.mode(), Mode::Interrupted);

    session
        .apply_human_reply("continue", "continue")
        .expect("resume");
    assert_eq!(session.mode(), Mode::Planning);
    assert_eq!(session.count_kind(TurnKind::ExecutionResult), 0);
    match &session.turns()[1].payload {
        TurnPayload::ChatInterrupt(interrupt) => {
            assert_eq!(interrupt.interrupted_batch, Some(batch_index));
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

/// Scenario D: completing with a batch in flight is rejected and changes nothing.
#[test]
fn complete_while_batch_in_flight_is_rejected() {
    let mut session = Session::new("goal");
    session
        .begin_batch(parse_batch_message(r#"{"data": "pwd"}"#).expect("parse"))
        .expect("begin");
    let before = session.clone();

    let err = session.complete("done").unwrap_err();
    assert_eq!(
        err,
        RelayError::WrongMode {
            operation: Operation::Complete,
            mode: Mode::AwaitingExecution
        }
    );
    assert_eq!(session, before);
}

/// A session persisted mid-batch resumes on reload exactly where it stopped.
#[test]
fn persisted_session_resumes_after_reload() {
    let temp = tempfile::tempdir().expect("tempdir");
    let batch = parse_batch_message(r#"{"data": ["pwd", "ls"]}"#).expect("parse");
    let mut session = Session::new("goal");
    session.begin_batch(batch.clone()).expect("begin");

    let path = session_path(temp.path(), session.id()).expect("path");
    write_session(&path, &session).expect("write");
    let mut restored = load_session(&path).expect("load");
    assert_eq!(restored.in_flight_batch(), Some(&batch));

    let result = ExecutionCoordinator::default()
        .execute(&mut ScriptedExecutor::all_ok(), &batch)
        .expect("execute");
    restored.resolve_with_result(result).expect("resolve");
    restored.complete("all good").expect("complete");
    assert_eq!(restored.mode(), Mode::Completed);
    assert_eq!(
        restored.turns().iter().map(|t| t.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test]
fn wire_round_trip_preserves_commands() {
    let batch = parse_batch_message(r#"{"data": ["pwd", "cd ..", "pwd"]}"#).expect("parse");
    let encoded = serde_json::to_string(&BatchMessage::from_batch(&batch)).expect("encode");
    assert_eq!(parse_batch_message(&encoded).expect("reparse"), batch);
}
