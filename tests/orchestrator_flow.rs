// tests/orchestrator_flow.rs

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use wipeguard::errors::JobError;
use wipeguard::job::{Certificate, CertificateStatus, Credential, JobRequest};
use wipeguard::journal::{JournalRecord, StatusJournal};
use wipeguard::orchestrator::{Frame, Orchestrator, SlotView};
use wipeguard::types::{JobKind, WipeMethod};

fn done(frames: &[Frame]) -> &Certificate {
    match frames.last() {
        Some(Frame::Done(cert)) => cert,
        other => panic!("expected a terminal done frame, got {other:?}"),
    }
}

fn progress_values(frames: &[Frame]) -> Vec<i64> {
    frames
        .iter()
        .filter_map(|f| match f {
            Frame::Progress(p) => Some(*p),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn wipe_streams_progress_then_certificate() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::chunk("PROGRESS:10\n"),
        Step::chunk("PROGRESS:50\n"),
        Step::Exit(Some(0)),
    ]));
    let (orch, journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner.clone());

    let ack = orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    assert_eq!(ack, "Wipe queued");
    assert_eq!(orch.slot_state(JobKind::Wipe), SlotView::Queued);
    assert_eq!(runner.launch_count(), 0, "submission alone must not launch");

    let frames = with_timeout(collect_frames(orch.attach(JobKind::Wipe).unwrap())).await;

    assert_eq!(progress_values(&frames), vec![10, 50, 100]);
    let cert = done(&frames);
    assert_eq!(cert.mode, "Disk Wipe");
    assert_eq!(cert.device.as_deref(), Some("sdb"));
    assert_eq!(cert.method, Some(WipeMethod::ZeroFill));
    assert_eq!(cert.status, CertificateStatus::Success);

    assert_eq!(
        journal.read(JobKind::Wipe).unwrap(),
        Some(JournalRecord::Finished(cert.clone()))
    );
    assert_eq!(orch.slot_state(JobKind::Wipe), SlotView::Empty);

    let launches = runner.launches();
    assert_eq!(launches.len(), 1);
    assert_eq!(launches[0].spec.program, "wiper");
    assert_eq!(launches[0].spec.args, vec!["/dev/sdb".to_string(), "1".to_string()]);
    assert!(launches[0].credential_matched);
}

#[tokio::test]
async fn factory_reset_sends_confirmation_and_omits_wipe_fields() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![Step::chunk("PROGRESS:70\n")]));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner.clone());

    assert_eq!(orch.submit(factory_request()).unwrap(), "Factory reset queued");
    let frames = with_timeout(collect_frames(orch.attach(JobKind::FactoryReset).unwrap())).await;

    assert_eq!(progress_values(&frames), vec![70, 100]);
    let cert = done(&frames);
    assert_eq!(cert.mode, "Factory Reset");
    assert_eq!(cert.device, None);
    assert_eq!(cert.method, None);

    let spec = &runner.launches()[0].spec;
    assert_eq!(spec.program, "factoryreset");
    assert!(spec.args.is_empty());
    assert_eq!(spec.extra_input, vec!["y".to_string()]);
}

#[tokio::test]
async fn launch_failure_yields_only_a_failed_certificate() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::failing("executable not found: ./wiper"));
    let (orch, journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner);

    orch.submit(wipe_request("sdb", WipeMethod::Random)).unwrap();
    let frames = with_timeout(collect_frames(orch.attach(JobKind::Wipe).unwrap())).await;

    assert_eq!(frames.len(), 1);
    let cert = done(&frames);
    assert_eq!(cert.status, CertificateStatus::Failed);
    assert_eq!(cert.method, Some(WipeMethod::Random));

    match journal.read(JobKind::Wipe).unwrap() {
        Some(JournalRecord::Finished(c)) => assert_eq!(c.status, CertificateStatus::Failed),
        other => panic!("expected FAILED certificate in journal, got {other:?}"),
    }
    assert_eq!(orch.slot_state(JobKind::Wipe), SlotView::Empty);
}

#[tokio::test]
async fn finalization_failure_still_ends_with_one_done_frame() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![Step::chunk("PROGRESS:10\n")]));
    let journal = Arc::new(FailingJournal::new(FailOn::Finished));
    let orch = Orchestrator::new(
        JobsSectionBuilder::new().build(),
        journal.clone() as Arc<dyn StatusJournal>,
        runner,
    );

    orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    let frames = with_timeout(collect_frames(orch.attach(JobKind::Wipe).unwrap())).await;

    assert_eq!(progress_values(&frames), vec![10]);
    assert_eq!(frames.iter().filter(|f| f.is_terminal()).count(), 1);
    assert_eq!(done(&frames).status, CertificateStatus::Failed);
    assert!(journal.rejected() >= 1);
    assert_eq!(orch.slot_state(JobKind::Wipe), SlotView::Empty);
}

#[tokio::test]
async fn progress_journal_failures_do_not_stop_the_stream() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::chunk("PROGRESS:1\nPROGRESS:2\n"),
    ]));
    let journal = Arc::new(FailingJournal::new(FailOn::All));
    let orch = Orchestrator::new(
        JobsSectionBuilder::new().build(),
        journal as Arc<dyn StatusJournal>,
        runner,
    );

    orch.submit(factory_request()).unwrap();
    let frames = with_timeout(collect_frames(orch.attach(JobKind::FactoryReset).unwrap())).await;

    assert_eq!(progress_values(&frames), vec![1, 2]);
    assert_eq!(done(&frames).status, CertificateStatus::Failed);
}

#[tokio::test]
async fn second_submission_conflicts_while_the_job_is_active() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::chunk("PROGRESS:5\n"),
        Step::WaitRelease,
    ]));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner.clone());

    orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    assert_eq!(
        orch.submit(wipe_request("sdc", WipeMethod::ZeroFill)),
        Err(JobError::Conflict(JobKind::Wipe))
    );

    let mut rx = orch.attach(JobKind::Wipe).unwrap();
    assert_eq!(with_timeout(rx.recv()).await, Some(Frame::Progress(5)));
    assert_eq!(orch.slot_state(JobKind::Wipe), SlotView::Running);
    assert_eq!(
        orch.submit(wipe_request("sdc", WipeMethod::ZeroFill)),
        Err(JobError::Conflict(JobKind::Wipe))
    );

    runner.release();
    let rest = with_timeout(collect_frames(rx)).await;
    assert!(matches!(rest.last(), Some(Frame::Done(_))));

    assert!(orch.submit(wipe_request("sdc", WipeMethod::ZeroFill)).is_ok());
}

#[tokio::test]
async fn job_kinds_do_not_block_each_other() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![Step::WaitRelease]));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner.clone());

    orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    let _wipe = orch.attach(JobKind::Wipe).unwrap();

    assert!(orch.submit(factory_request()).is_ok());
    assert_eq!(orch.slot_state(JobKind::FactoryReset), SlotView::Queued);
}

#[tokio::test]
async fn second_subscriber_is_rejected_and_job_is_unaffected() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::chunk("PROGRESS:20\n"),
        Step::WaitRelease,
        Step::chunk("PROGRESS:80\n"),
    ]));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner.clone());

    orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    let mut first = orch.attach(JobKind::Wipe).unwrap();
    assert_eq!(with_timeout(first.recv()).await, Some(Frame::Progress(20)));

    assert_eq!(
        orch.attach(JobKind::Wipe).unwrap_err(),
        JobError::AlreadyAttached(JobKind::Wipe)
    );
    assert_eq!(orch.slot_state(JobKind::Wipe), SlotView::Running);

    runner.release();
    let rest = with_timeout(collect_frames(first)).await;
    assert_eq!(progress_values(&rest), vec![80, 100]);
    assert_eq!(runner.launch_count(), 1);
}

#[tokio::test]
async fn attach_without_submission_is_no_active_job() {
    let runner = Arc::new(ScriptedRunner::new(Vec::new()));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner.clone());

    assert_eq!(
        orch.attach(JobKind::FactoryReset).unwrap_err(),
        JobError::NoActiveJob(JobKind::FactoryReset)
    );
    assert_eq!(runner.launch_count(), 0);
}

#[tokio::test]
async fn invalid_request_leaves_slot_empty() {
    let runner = Arc::new(ScriptedRunner::new(Vec::new()));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner);

    let request = JobRequest {
        kind: JobKind::Wipe,
        target: Some("sdb".to_string()),
        method: None,
        credential: Some(Credential::new(TEST_PASSWORD)),
    };
    assert_eq!(
        orch.submit(request),
        Err(JobError::InvalidRequest("Missing fields".to_string()))
    );
    assert_eq!(orch.slot_state(JobKind::Wipe), SlotView::Empty);
}

#[tokio::test]
async fn job_completes_after_subscriber_disconnects() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::WaitRelease,
        Step::chunk("PROGRESS:30\n"),
        Step::Delay(Duration::from_millis(10)),
        Step::chunk("PROGRESS:60\n"),
    ]));
    let (orch, journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner.clone());

    orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    drop(orch.attach(JobKind::Wipe).unwrap());
    runner.release();

    wait_for_empty_slot(&orch, JobKind::Wipe).await;
    match journal.read(JobKind::Wipe).unwrap() {
        Some(JournalRecord::Finished(cert)) => {
            assert_eq!(cert.status, CertificateStatus::Success)
        }
        other => panic!("expected certificate in journal, got {other:?}"),
    }
}

#[tokio::test]
async fn journal_tracks_in_progress_ticks() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::chunk("PROGRESS:30\n"),
        Step::WaitRelease,
    ]));
    let (orch, journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner.clone());

    orch.submit(factory_request()).unwrap();
    let mut rx = orch.attach(JobKind::FactoryReset).unwrap();
    assert_eq!(with_timeout(rx.recv()).await, Some(Frame::Progress(30)));
    assert_eq!(
        journal.read(JobKind::FactoryReset).unwrap(),
        Some(JournalRecord::in_progress(30))
    );

    runner.release();
    with_timeout(collect_frames(rx)).await;
    assert!(journal.read(JobKind::FactoryReset).unwrap().unwrap().is_terminal());
}

#[tokio::test]
async fn nonzero_exit_is_success_by_default() {
    let runner = Arc::new(ScriptedRunner::new(vec![Step::Exit(Some(3))]));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner);

    orch.submit(factory_request()).unwrap();
    let frames = with_timeout(collect_frames(orch.attach(JobKind::FactoryReset).unwrap())).await;

    assert_eq!(progress_values(&frames), vec![100]);
    assert_eq!(done(&frames).status, CertificateStatus::Success);
}

#[tokio::test]
async fn nonzero_exit_fails_when_configured() {
    let runner = Arc::new(ScriptedRunner::new(vec![
        Step::chunk("PROGRESS:40\n"),
        Step::Exit(Some(3)),
    ]));
    let jobs = JobsSectionBuilder::new().with_fail_on_nonzero_exit(true).build();
    let (orch, _journal) = orchestrator_with(jobs, runner);

    orch.submit(factory_request()).unwrap();
    let frames = with_timeout(collect_frames(orch.attach(JobKind::FactoryReset).unwrap())).await;

    assert_eq!(progress_values(&frames), vec![40]);
    assert_eq!(done(&frames).status, CertificateStatus::Failed);
}

#[tokio::test]
async fn split_progress_tag_is_reassembled() {
    let script = vec![Step::chunk("PROGRESS:4"), Step::chunk("2\nPROGRESS:9")];
    let runner = Arc::new(ScriptedRunner::new(script.clone()));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner);

    orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    let frames = with_timeout(collect_frames(orch.attach(JobKind::Wipe).unwrap())).await;
    assert_eq!(progress_values(&frames), vec![42, 9, 100]);

    // Per-chunk parsing sees two separate numbers.
    let runner = Arc::new(ScriptedRunner::new(script));
    let jobs = JobsSectionBuilder::new().with_reassembly(false).build();
    let (orch, _journal) = orchestrator_with(jobs, runner);

    orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    let frames = with_timeout(collect_frames(orch.attach(JobKind::Wipe).unwrap())).await;
    assert_eq!(progress_values(&frames), vec![4, 9, 100]);
}

#[tokio::test]
async fn progress_values_are_forwarded_unclamped() {
    let runner = Arc::new(ScriptedRunner::new(vec![Step::chunk(
        "PROGRESS:150\nPROGRESS:3\n",
    )]));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner);

    orch.submit(wipe_request("sdb", WipeMethod::Dod522022M)).unwrap();
    let frames = with_timeout(collect_frames(orch.attach(JobKind::Wipe).unwrap())).await;
    assert_eq!(progress_values(&frames), vec![150, 3, 100]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn resubmit_right_after_done_frame_is_accepted() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![Step::chunk("PROGRESS:50\n")]));
    let (orch, _journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner);

    orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    for round in 0..200 {
        let mut rx = orch.attach(JobKind::Wipe).unwrap();
        with_timeout(async {
            while let Some(frame) = rx.recv().await {
                if matches!(frame, Frame::Done(_)) {
                    break;
                }
            }
        })
        .await;

        // The channel may still be open here; only `done` has been seen.
        if let Err(err) = orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)) {
            panic!("round {round}: resubmission after done was rejected: {err}");
        }
    }
}

#[tokio::test]
async fn stalled_subscriber_does_not_stall_the_job() {
    init_tracing();
    let script = (0..500)
        .map(|i| Step::Chunk(format!("PROGRESS:{}\n", i % 100)))
        .collect();
    let runner = Arc::new(ScriptedRunner::new(script));
    let (orch, journal) = orchestrator_with(JobsSectionBuilder::new().build(), runner);

    orch.submit(wipe_request("sdb", WipeMethod::ZeroFill)).unwrap();
    // Connected but never read until the job is over.
    let rx = orch.attach(JobKind::Wipe).unwrap();

    wait_for_empty_slot(&orch, JobKind::Wipe).await;
    match journal.read(JobKind::Wipe).unwrap() {
        Some(JournalRecord::Finished(cert)) => assert!(cert.is_success()),
        other => panic!("expected certificate in journal, got {other:?}"),
    }

    let frames = with_timeout(collect_frames(rx)).await;
    assert!(frames.len() < 500, "progress frames should have been shed");
    assert_eq!(frames.iter().filter(|f| f.is_terminal()).count(), 1);
    assert!(matches!(frames.last(), Some(Frame::Done(_))));
}

#[tokio::test]
async fn journal_io_does_not_block_the_runtime() {
    init_tracing();
    let runner = Arc::new(ScriptedRunner::new(vec![Step::chunk("PROGRESS:10\n")]));
    let journal = Arc::new(GatedJournal::new());
    let orch = Orchestrator::new(
        JobsSectionBuilder::new().build(),
        journal.clone() as Arc<dyn StatusJournal>,
        runner,
    );

    orch.submit(factory_request()).unwrap();
    let rx = orch.attach(JobKind::FactoryReset).unwrap();

    // The progress write parks on the gate. On this single-threaded runtime
    // the test only gets to open it if that write is off the worker thread.
    tokio::time::sleep(Duration::from_millis(50)).await;
    journal.open();

    let frames = with_timeout(collect_frames(rx)).await;
    assert!(!journal.timed_out(), "journal write blocked the runtime thread");
    assert_eq!(progress_values(&frames), vec![10, 100]);
}
