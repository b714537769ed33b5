//! In-memory integration tests for a placement from application to
//! completion.

use super::helpers::{Engine, date, engine, student};
use placement_engine::placement::{
    domain::{
        ApplicationStatus, AttendanceStatus, EntityKind, EntityRef, EvaluationStatus,
        EvaluationType, InternshipStatus, LogbookStatus, NotificationKind, Status,
    },
    services::{AttendanceRecord, EvaluationDraft, SideEffect, TransitionResponse},
    validation::RejectionReason,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_placement_runs_from_application_to_completion(engine: Engine) -> eyre::Result<()> {
    let intern = student();
    let offer = engine.offer(2).await;
    let internship = engine.place(intern, &offer).await;
    eyre::ensure!(
        internship.status() == InternshipStatus::Upcoming,
        "new internships start upcoming"
    );

    engine.clock.set(
        date(2026, 2, 1)
            .and_hms_opt(2, 0, 0)
            .ok_or_else(|| eyre::eyre!("invalid time"))?
            .and_utc(),
    );
    let started = engine.sweep.run_once().await?;
    eyre::ensure!(started.activated == vec![internship.id()], "{started:?}");

    let entry = engine
        .service
        .record_logbook_entry(intern, internship.id(), date(2026, 2, 2), "Ward rounds")
        .await?;
    engine
        .request(
            EntityRef::LogbookEntry(entry.id()),
            Status::LogbookEntry(LogbookStatus::Pending),
            intern,
        )
        .await?;
    engine
        .request(
            EntityRef::LogbookEntry(entry.id()),
            Status::LogbookEntry(LogbookStatus::Approved),
            engine.doctor,
        )
        .await?;

    let attendance = engine
        .service
        .record_attendance(
            intern,
            internship.id(),
            AttendanceRecord {
                date: date(2026, 2, 2),
                hours: 9,
                status: AttendanceStatus::Present,
            },
        )
        .await?;
    let credited = engine
        .request(
            EntityRef::Attendance(attendance.id()),
            Status::Attendance(AttendanceStatus::Approved),
            engine.doctor,
        )
        .await?;
    eyre::ensure!(
        credited.side_effects.contains(&SideEffect::HoursCredited {
            internship_id: internship.id(),
            hours: 9,
            total: 9,
        }),
        "{:?}",
        credited.side_effects
    );

    let evaluation = engine
        .service
        .create_evaluation(
            engine.tutor,
            internship.id(),
            EvaluationDraft::new(EvaluationType::Final).with_score(88),
        )
        .await?;

    engine.clock.advance_days(100);
    let finished = engine.sweep.run_once().await?;
    eyre::ensure!(finished.completed == vec![internship.id()], "{finished:?}");
    eyre::ensure!(
        engine.internship(internship.id()).await.credited_hours() == 9,
        "credited hours survive completion"
    );
    eyre::ensure!(
        engine
            .received(engine.tutor.id)
            .contains(&NotificationKind::FinalEvaluationDue),
        "tutor should be prompted for the outstanding final evaluation"
    );

    engine
        .request(
            EntityRef::Evaluation(evaluation.id()),
            Status::Evaluation(EvaluationStatus::Submitted),
            engine.tutor,
        )
        .await?;
    engine
        .request(
            EntityRef::Evaluation(evaluation.id()),
            Status::Evaluation(EvaluationStatus::Acknowledged),
            intern,
        )
        .await?;

    let received = engine.received(intern.id);
    eyre::ensure!(
        received
            == vec![
                NotificationKind::ApplicationUnderReview,
                NotificationKind::ApplicationAccepted,
                NotificationKind::InternshipStarted,
                NotificationKind::LogbookApproved,
                NotificationKind::AttendanceApproved,
                NotificationKind::FinalEvaluationDue,
                NotificationKind::EvaluationSubmitted,
            ],
        "unexpected student notifications: {received:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_waits_for_the_day_after_the_end_date(engine: Engine) -> eyre::Result<()> {
    let internship = engine.place(student(), &engine.offer(1).await).await;
    engine.clock.set(
        date(2026, 4, 30)
            .and_hms_opt(23, 0, 0)
            .ok_or_else(|| eyre::eyre!("invalid time"))?
            .and_utc(),
    );

    let on_end_date = engine.sweep.run_once().await?;
    let premature = engine
        .service
        .transition(
            EntityKind::Internship,
            internship.id().into_inner(),
            "completed",
            engine.admin,
            None,
        )
        .await?;
    engine.clock.advance_days(1);
    let next_day = engine.sweep.run_once().await?;

    eyre::ensure!(on_end_date.activated == vec![internship.id()], "{on_end_date:?}");
    eyre::ensure!(on_end_date.completed.is_empty(), "{on_end_date:?}");
    eyre::ensure!(
        matches!(premature, TransitionResponse::Rejected { http_status: 403, .. }),
        "administrators cannot complete internships: {premature:?}"
    );
    eyre::ensure!(next_day.completed == vec![internship.id()], "{next_day:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_withdrawn_application_cannot_be_reviewed(engine: Engine) -> eyre::Result<()> {
    let applicant = student();
    let offer = engine.offer(1).await;
    let application = engine.apply(applicant, &offer).await;

    engine
        .request(
            EntityRef::Application(application.id()),
            Status::Application(ApplicationStatus::Withdrawn),
            applicant,
        )
        .await?;
    let response = engine
        .service
        .transition(
            EntityKind::Application,
            application.id().into_inner(),
            "reviewing",
            engine.hospital,
            None,
        )
        .await?;

    let TransitionResponse::Rejected {
        http_status,
        reason,
    } = &response
    else {
        eyre::bail!("expected a rejection, got {response:?}");
    };
    eyre::ensure!(*http_status == 400, "withdrawn applications have no way out");
    eyre::ensure!(
        matches!(reason, RejectionReason::InvalidTransition { .. }),
        "{reason}"
    );
    eyre::ensure!(
        engine.received(applicant.id).is_empty(),
        "withdrawal notifies nobody"
    );
    Ok(())
}
