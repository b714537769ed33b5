//! In-memory integration tests for offer capacity.

use super::helpers::{Engine, engine, student};
use placement_engine::placement::{
    domain::{ApplicationStatus, EntityRef, NotificationKind, Status},
    services::{CAPACITY_EXHAUSTED, SideEffect, WorkflowError},
    validation::{RejectionReason, TransitionRequest},
};
use rstest::rstest;
use tokio::task::JoinSet;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn filling_the_last_position_rejects_every_open_competitor(
    engine: Engine,
) -> eyre::Result<()> {
    let offer = engine.offer(1).await;
    let chosen = student();
    let waiting = student();
    let reviewed = student();
    let leaving = student();
    let accepted = engine.apply(chosen, &offer).await;
    let pending = engine.apply(waiting, &offer).await;
    let under_review = engine.apply(reviewed, &offer).await;
    let withdrawn = engine.apply(leaving, &offer).await;
    engine
        .decide(&under_review, ApplicationStatus::Reviewing)
        .await?;
    engine
        .request(
            EntityRef::Application(withdrawn.id()),
            Status::Application(ApplicationStatus::Withdrawn),
            leaving,
        )
        .await?;
    engine.decide(&accepted, ApplicationStatus::Reviewing).await?;

    let result = engine.decide(&accepted, ApplicationStatus::Accepted).await?;

    eyre::ensure!(
        result.side_effects.contains(&SideEffect::PositionFilled {
            offer_id: offer.id(),
            remaining: 0,
        }),
        "{:?}",
        result.side_effects
    );
    for competitor in [&pending, &under_review] {
        let entity = EntityRef::Application(competitor.id());
        eyre::ensure!(
            engine.status_of(entity).await == Status::Application(ApplicationStatus::Rejected),
            "{entity} should be rejected"
        );
        let stored = engine
            .service
            .find(entity)
            .await?
            .and_then(|found| found.as_application().cloned())
            .ok_or_else(|| eyre::eyre!("{entity} missing"))?;
        eyre::ensure!(
            stored.rejection_reason() == Some(CAPACITY_EXHAUSTED),
            "cascade rejections carry the capacity reason"
        );
    }
    eyre::ensure!(
        engine.status_of(EntityRef::Application(withdrawn.id())).await
            == Status::Application(ApplicationStatus::Withdrawn),
        "withdrawn applications are left alone"
    );
    for competitor in [waiting, reviewed] {
        eyre::ensure!(
            engine
                .received(competitor.id)
                .last()
                .is_some_and(|kind| *kind == NotificationKind::ApplicationRejected),
            "competitors are told they were rejected"
        );
    }
    eyre::ensure!(engine.received(leaving.id).is_empty(), "withdrawn student is not notified");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_acceptances_never_overfill_an_offer(engine: Engine) -> eyre::Result<()> {
    let offer = engine.offer(1).await;
    let mut applications = Vec::new();
    for _ in 0..4 {
        let application = engine.apply(student(), &offer).await;
        engine
            .decide(&application, ApplicationStatus::Reviewing)
            .await?;
        applications.push(application);
    }

    let mut racers = JoinSet::new();
    for application in &applications {
        let service = engine.service.clone();
        let request = TransitionRequest::new(
            EntityRef::Application(application.id()),
            Status::Application(ApplicationStatus::Accepted),
            engine.hospital,
        );
        racers.spawn(async move { service.request_transition(request).await });
    }
    let mut outcomes = Vec::with_capacity(applications.len());
    while let Some(joined) = racers.join_next().await {
        outcomes.push(joined?);
    }

    let committed = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    eyre::ensure!(committed == 1, "exactly one acceptance commits: {outcomes:?}");
    for outcome in &outcomes {
        if let Err(err) = outcome {
            eyre::ensure!(
                matches!(
                    err,
                    WorkflowError::Rejected(
                        RejectionReason::Conflict { .. }
                            | RejectionReason::InvalidTransition { .. }
                            | RejectionReason::NoCapacity { .. }
                            | RejectionReason::Contention { .. }
                    )
                ),
                "losers see a conflict-class rejection: {err}"
            );
        }
    }
    let stored_offer = engine
        .service
        .find_offer(offer.id())
        .await?
        .ok_or_else(|| eyre::eyre!("offer missing"))?;
    eyre::ensure!(stored_offer.filled_positions() == 1, "{stored_offer:?}");
    eyre::ensure!(engine.store.internships()?.len() == 1, "one internship exists");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_acceptance_of_one_application_places_once(engine: Engine) -> eyre::Result<()> {
    let offer = engine.offer(2).await;
    let application = engine.apply(student(), &offer).await;
    engine
        .decide(&application, ApplicationStatus::Reviewing)
        .await?;

    let mut racers = JoinSet::new();
    for _ in 0..2 {
        let service = engine.service.clone();
        let request = TransitionRequest::new(
            EntityRef::Application(application.id()),
            Status::Application(ApplicationStatus::Accepted),
            engine.hospital,
        );
        racers.spawn(async move { service.request_transition(request).await });
    }
    let mut outcomes = Vec::with_capacity(2);
    while let Some(joined) = racers.join_next().await {
        outcomes.push(joined?);
    }

    let committed = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    eyre::ensure!(committed == 1, "exactly one acceptance commits: {outcomes:?}");
    for outcome in &outcomes {
        if let Err(err) = outcome {
            eyre::ensure!(
                err.rejection().is_some_and(RejectionReason::is_benign),
                "the repeat is a no-op success: {err}"
            );
        }
    }
    let stored_offer = engine
        .service
        .find_offer(offer.id())
        .await?
        .ok_or_else(|| eyre::eyre!("offer missing"))?;
    eyre::ensure!(stored_offer.filled_positions() == 1, "{stored_offer:?}");
    eyre::ensure!(engine.store.internships()?.len() == 1, "one internship exists");
    Ok(())
}
