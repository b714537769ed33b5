//! In-memory integration tests for internship cancellation.

use super::helpers::{Engine, date, engine, student};
use placement_engine::placement::{
    domain::{
        AttendanceStatus, EntityRef, EvaluationStatus, EvaluationType, InternshipStatus,
        LogbookStatus, NotificationKind, Status,
    },
    services::{AttendanceRecord, EvaluationDraft, SideEffect},
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelling_closes_open_records_and_keeps_settled_ones(
    engine: Engine,
) -> eyre::Result<()> {
    let intern = student();
    let internship = engine.place(intern, &engine.offer(1).await).await;
    let draft_entry = engine
        .service
        .record_logbook_entry(intern, internship.id(), date(2026, 2, 3), "Theatre list")
        .await?;
    let approved_entry = engine
        .service
        .record_logbook_entry(intern, internship.id(), date(2026, 2, 4), "Clinic")
        .await?;
    for to in [LogbookStatus::Pending, LogbookStatus::Approved] {
        let actor = if to == LogbookStatus::Pending {
            intern
        } else {
            engine.doctor
        };
        engine
            .request(
                EntityRef::LogbookEntry(approved_entry.id()),
                Status::LogbookEntry(to),
                actor,
            )
            .await?;
    }
    let attendance = engine
        .service
        .record_attendance(
            intern,
            internship.id(),
            AttendanceRecord {
                date: date(2026, 2, 3),
                hours: 7,
                status: AttendanceStatus::Late,
            },
        )
        .await?;
    let evaluation = engine
        .service
        .create_evaluation(
            engine.tutor,
            internship.id(),
            EvaluationDraft::new(EvaluationType::MidTerm),
        )
        .await?;

    let cancelled = engine
        .request(
            EntityRef::Internship(internship.id()),
            Status::Internship(InternshipStatus::Cancelled),
            engine.admin,
        )
        .await?;

    let closed: Vec<EntityRef> = cancelled
        .side_effects
        .iter()
        .filter_map(|effect| match effect {
            SideEffect::DependentClosed { entity, .. } => Some(*entity),
            _ => None,
        })
        .collect();
    eyre::ensure!(closed.len() == 3, "three open records close: {closed:?}");
    let expectations = [
        (
            EntityRef::LogbookEntry(draft_entry.id()),
            Status::LogbookEntry(LogbookStatus::Cancelled),
        ),
        (
            EntityRef::LogbookEntry(approved_entry.id()),
            Status::LogbookEntry(LogbookStatus::Approved),
        ),
        (
            EntityRef::Attendance(attendance.id()),
            Status::Attendance(AttendanceStatus::Rejected),
        ),
        (
            EntityRef::Evaluation(evaluation.id()),
            Status::Evaluation(EvaluationStatus::Cancelled),
        ),
    ];
    for (entity, expected) in expectations {
        let actual = engine.status_of(entity).await;
        eyre::ensure!(actual == expected, "{entity}: expected {expected}, found {actual}");
    }
    eyre::ensure!(
        engine
            .received(intern.id)
            .contains(&NotificationKind::InternshipCancelled),
        "the student hears about the cancellation"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_internships_are_skipped_by_the_sweep(engine: Engine) -> eyre::Result<()> {
    let internship = engine.place(student(), &engine.offer(1).await).await;
    engine
        .request(
            EntityRef::Internship(internship.id()),
            Status::Internship(InternshipStatus::Cancelled),
            engine.admin,
        )
        .await?;
    engine.clock.advance_days(30);

    let report = engine.sweep.run_once().await?;

    eyre::ensure!(report.transitions() == 0, "{report:?}");
    eyre::ensure!(report.failed.is_empty(), "{report:?}");
    eyre::ensure!(
        engine.internship(internship.id()).await.status() == InternshipStatus::Cancelled,
        "cancellation is final"
    );
    Ok(())
}
