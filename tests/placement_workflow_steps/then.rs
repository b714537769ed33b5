//! Then steps for placement workflow BDD scenarios.

use super::world::{PlacementWorld, run_async};
use placement_engine::placement::domain::{
    EntityKind, EntityRef, InternshipStatus, NotificationKind, Status,
};
use rstest_bdd_macros::then;

#[then(r#"the application of "{name}" is "{status}""#)]
fn application_status_is(
    world: &PlacementWorld,
    name: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = Status::parse(EntityKind::Application, &status)
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let application_id = world.application_of(&name)?.id();
    let stored = run_async(world.service.find(EntityRef::Application(application_id)))?
        .ok_or_else(|| eyre::eyre!("application of {name} missing"))?;
    eyre::ensure!(
        stored.status() == expected,
        "expected {expected}, found {}",
        stored.status()
    );
    Ok(())
}

#[then(r#""{name}" has an internship that is "{status}""#)]
fn internship_status_is(
    world: &PlacementWorld,
    name: String,
    status: String,
) -> Result<(), eyre::Report> {
    let expected = InternshipStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let internship_id = world
        .participant(&name)?
        .internship_id
        .ok_or_else(|| eyre::eyre!("{name} has no internship"))?;
    let internship = run_async(world.service.find(EntityRef::Internship(internship_id)))?
        .and_then(|entity| entity.as_internship().cloned())
        .ok_or_else(|| eyre::eyre!("internship of {name} missing"))?;
    eyre::ensure!(
        internship.status() == expected,
        "expected {expected}, found {}",
        internship.status()
    );
    Ok(())
}

#[then(r#"the internship of "{name}" has {hours:u32} credited hours"#)]
fn internship_has_credited_hours(
    world: &PlacementWorld,
    name: String,
    hours: u32,
) -> Result<(), eyre::Report> {
    let internship_id = world
        .participant(&name)?
        .internship_id
        .ok_or_else(|| eyre::eyre!("{name} has no internship"))?;
    let internship = run_async(world.service.find(EntityRef::Internship(internship_id)))?
        .and_then(|entity| entity.as_internship().cloned())
        .ok_or_else(|| eyre::eyre!("internship of {name} missing"))?;
    eyre::ensure!(
        internship.credited_hours() == hours,
        "expected {hours} hours, found {}",
        internship.credited_hours()
    );
    Ok(())
}

#[then(r#""{name}" received an "{kind}" notification"#)]
fn student_received(world: &PlacementWorld, name: String, kind: String) -> Result<(), eyre::Report> {
    let expected = NotificationKind::try_from(kind.as_str())
        .map_err(|err| eyre::eyre!("invalid notification kind in scenario: {err}"))?;
    let student_id = world.participant(&name)?.actor.id;
    eyre::ensure!(
        world
            .queue
            .accepted_for(student_id)
            .iter()
            .any(|queued| queued.kind == expected),
        "{name} never received {expected}"
    );
    Ok(())
}

#[then("the request is rejected with status {code:u16}")]
fn request_rejected_with(world: &PlacementWorld, code: u16) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))?;
    match result {
        Ok(committed) => Err(eyre::eyre!(
            "expected a rejection, transition committed: {committed:?}"
        )),
        Err(err) if err.http_status() == code => Ok(()),
        Err(err) => Err(eyre::eyre!(
            "expected status {code}, got {} ({err})",
            err.http_status()
        )),
    }
}
