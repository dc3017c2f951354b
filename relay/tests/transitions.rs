//! Every (mode, operation) pair of the session state machine.
//!
//! Illegal pairs must fail with `WrongMode` (or `SessionClosed` once completed)
//! and leave the session equal to its clone; legal pairs must succeed.

use relay::core::error::{Operation, RelayError};
use relay::core::planner;
use relay::core::session::Session;
use relay::core::types::{CommandBatch, CommandOutcome, ExecutionResult, ExitStatus, Mode};
use relay::test_support::ScriptedPlanner;

const OPERATIONS: [Operation; 6] = [
    Operation::BeginBatch,
    Operation::ResolveWithResult,
    Operation::Interrupt,
    Operation::Resume,
    Operation::Complete,
    Operation::Plan,
];

fn pwd() -> CommandBatch {
    CommandBatch::from_commands(["pwd"]).expect("batch")
}

fn pwd_ok() -> ExecutionResult {
    ExecutionResult {
        outcomes: vec![CommandOutcome::attempted(
            "pwd",
            ExitStatus::Success { code: 0 },
            "/\n",
        )],
        batch_len: 1,
    }
}

fn session_in(mode: Mode) -> Session {
    let mut session = Session::with_id("s-1", "goal");
    match mode {
        Mode::Planning => {
            session.begin_batch(pwd()).expect("begin");
            session.resolve_with_result(pwd_ok()).expect("resolve");
        }
        Mode::AwaitingExecution => {
            session.begin_batch(pwd()).expect("begin");
        }
        Mode::Interrupted => {
            session.begin_batch(pwd()).expect("begin");
            session.interrupt("why?").expect("interrupt");
        }
        Mode::Completed => {
            session.complete("done").expect("complete");
        }
    }
    assert_eq!(session.mode(), mode);
    session
}

fn apply(session: &mut Session, operation: Operation) -> Result<(), RelayError> {
    match operation {
        Operation::BeginBatch => session.begin_batch(pwd()).map(drop),
        Operation::ResolveWithResult => session.resolve_with_result(pwd_ok()).map(drop),
        Operation::Interrupt => session.interrupt("question").map(drop),
        Operation::Resume => session.resume(),
        Operation::Complete => session.complete("report").map(drop),
        Operation::Plan => planner::next(session, &ScriptedPlanner::default()).map(drop),
    }
}

fn is_legal(mode: Mode, operation: Operation) -> bool {
    matches!(
        (mode, operation),
        (
            Mode::Planning,
            Operation::BeginBatch | Operation::Complete | Operation::Plan
        ) | (
            Mode::AwaitingExecution,
            Operation::ResolveWithResult | Operation::Interrupt
        ) | (Mode::Interrupted, Operation::Resume)
    )
}

#[test]
fn every_illegal_transition_is_rejected_without_change() {
    let modes = [
        Mode::Planning,
        Mode::AwaitingExecution,
        Mode::Interrupted,
        Mode::Completed,
    ];
    for mode in modes {
        for operation in OPERATIONS {
            let mut session = session_in(mode);
            let before = session.clone();
            let result = apply(&mut session, operation);

            if is_legal(mode, operation) {
                assert!(result.is_ok(), "{operation} from {mode:?}: {result:?}");
                continue;
            }
            let expected = if mode == Mode::Completed {
                RelayError::SessionClosed { operation }
            } else {
                RelayError::WrongMode { operation, mode }
            };
            assert_eq!(result, Err(expected), "{operation} from {mode:?}");
            assert_eq!(session, before, "{operation} from {mode:?} mutated the session");
        }
    }
}

#[test]
fn rejected_transitions_do_not_consume_turn_indices() {
    let mut session = session_in(Mode::Interrupted);
    let succeeded: Vec<Operation> = OPERATIONS
        .into_iter()
        .filter(|operation| apply(&mut session, *operation).is_ok())
        .collect();
    // the report takes the next free index
    assert_eq!(succeeded, [Operation::Resume, Operation::Complete]);
    assert_eq!(session.mode(), Mode::Completed);
    let indices: Vec<u64> = session.turns().iter().map(|turn| turn.index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}
