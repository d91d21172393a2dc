mod common;

use common::{ScriptedTransport, day, flat, grouped, task, view};
use tarefando_core::aggregate::GroupSummary;
use tarefando_core::controller::{DraftField, ViewActions};
use tarefando_core::error::{DraftError, TransportError};
use tarefando_core::fetcher::LoadState;
use tarefando_core::task::{DayGroup, Payload, TaskId, TaskType};
use tarefando_core::transport::StatusChange;

fn answering() -> std::sync::Arc<ScriptedTransport> {
    ScriptedTransport::answering(flat(&["1", "2"]), grouped(&[(1, &["1"]), (2, &["2"])]))
}

#[tokio::test]
async fn completing_refetches_once_in_the_current_mode() {
    let transport = answering();
    let (ctl, _, alerts) = view(transport.clone());
    ctl.set_group_by(true).await;
    let before = transport.issued();

    ctl.complete(&TaskId::new("2"))
        .await
        .expect("complete succeeds");

    assert_eq!(transport.issued(), before + 1);
    assert_eq!(transport.issued_modes().last(), Some(&true));
    assert_eq!(
        transport.status_calls(),
        vec![(TaskId::new("2"), StatusChange::Complete)]
    );
    assert!(alerts.all().is_empty());
    assert!(matches!(ctl.snapshot().load, LoadState::Loaded(Payload::Grouped(_))));
}

#[tokio::test]
async fn failed_cancel_notifies_and_still_refetches_once() {
    let transport = answering();
    transport.fail_status_changes(TransportError::Http { status: 404 });
    let (ctl, _, alerts) = view(transport.clone());
    ctl.mount().await;
    let before = transport.issued();

    let err = ctl
        .cancel(&TaskId::new("9"))
        .await
        .expect_err("cancel fails");

    assert_eq!(err, TransportError::Http { status: 404 });
    assert_eq!(transport.issued(), before + 1);
    assert_eq!(transport.issued_modes().last(), Some(&false));
    assert_eq!(alerts.all(), vec![(StatusChange::Cancel, TaskId::new("9"))]);
    assert_eq!(ctl.snapshot().load, LoadState::Loaded(flat(&["1", "2"])));
}

#[tokio::test]
async fn concurrent_mutations_keep_the_last_issued_refetch() {
    let transport = ScriptedTransport::new();
    let (ctl, _, _) = view(transport.clone());

    let first = TaskId::new("1");
    let second = TaskId::new("2");
    let (done, canceled, ()) = tokio::join!(
        ctl.complete(&first),
        ctl.cancel(&second),
        async {
            transport.wait_for_loads(2).await;
            transport.resolve(1, Ok(flat(&["after-both"])));
            tokio::task::yield_now().await;
            transport.resolve(0, Ok(flat(&["after-first"])));
        }
    );

    assert!(done.is_ok());
    assert!(canceled.is_ok());
    assert_eq!(transport.status_calls().len(), 2);
    assert_eq!(transport.issued(), 2);
    assert_eq!(ctl.snapshot().load, LoadState::Loaded(flat(&["after-both"])));
}

#[tokio::test]
async fn grouped_snapshot_carries_per_day_summaries() {
    let payload = Payload::Grouped(vec![
        DayGroup {
            day: day(1),
            tasks: vec![
                task("1", false, false),
                task("2", true, false),
                task("3", true, true),
            ],
        },
        DayGroup {
            day: day(2),
            tasks: vec![task("4", false, false), task("5", true, false)],
        },
    ]);
    let transport = ScriptedTransport::answering(flat(&[]), payload);
    let (ctl, _, _) = view(transport);
    ctl.set_group_by(true).await;

    let snapshot = ctl.snapshot();
    assert_eq!(
        snapshot.overall,
        Some(GroupSummary {
            total: 5,
            completed: 2,
            pending: 2,
            canceled: 1,
        })
    );
    assert_eq!(
        snapshot.group_summaries,
        vec![
            GroupSummary {
                total: 3,
                completed: 1,
                pending: 1,
                canceled: 1,
            },
            GroupSummary {
                total: 2,
                completed: 1,
                pending: 1,
                canceled: 0,
            },
        ]
    );
}

#[tokio::test]
async fn collapsing_one_group_leaves_the_others_alone() {
    let transport = answering();
    let (ctl, _, _) = view(transport.clone());
    ctl.set_group_by(true).await;
    let loads = transport.issued();

    assert!(ctl.toggle_collapse(day(1)));
    let snapshot = ctl.snapshot();
    assert!(snapshot.is_collapsed(day(1)));
    assert!(!snapshot.is_collapsed(day(2)));

    ctl.toggle_collapse(day(1));
    assert!(ctl.snapshot().view.collapsed_group_ids.is_empty());
    assert_eq!(transport.issued(), loads);
}

#[tokio::test]
async fn draft_edits_flow_through_view_actions() {
    let (ctl, _, _) = view(answering());

    ctl.on_open_modal();
    ctl.on_edit_draft(DraftField::Title, "Quarterly review".into())
        .expect("title");
    ctl.on_edit_draft(DraftField::TaskType, "teamalignment".into())
        .expect("type");
    assert_eq!(
        ctl.on_edit_draft(DraftField::TaskType, "meeting".into()),
        Err(DraftError::InvalidTaskType("meeting".into()))
    );

    let draft = ctl.snapshot().view.draft;
    assert_eq!(draft.title, "Quarterly review");
    assert_eq!(draft.task_type, Some(TaskType::TeamAlignment));

    let accepted = ctl.on_submit_draft(None).expect("accepted");
    assert_eq!(accepted.task_type, TaskType::TeamAlignment);
    assert!(!ctl.snapshot().view.modal_open);

    ctl.on_open_modal();
    assert!(ctl.snapshot().view.draft.is_empty());
}
