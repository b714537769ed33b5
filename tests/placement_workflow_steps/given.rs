//! Given steps for placement workflow BDD scenarios.

use super::world::{Participant, PlacementWorld, date, run_async};
use eyre::WrapErr;
use placement_engine::placement::{
    domain::{
        Actor, ApplicationStatus, AttendanceStatus, EntityRef, NewOffer, Role, Status, UserId,
    },
    services::{AttendanceRecord, SideEffect},
    validation::TransitionRequest,
};
use rstest_bdd_macros::given;

#[given("an offer with {positions:u32} open positions")]
fn offer_with_positions(world: &mut PlacementWorld, positions: u32) -> Result<(), eyre::Report> {
    let offer = run_async(world.service.open_offer(
        world.hospital,
        NewOffer {
            hospital_id: world.hospital.id,
            supervisor_id: world.doctor.id,
            title: "Cardiology rotation".to_owned(),
            start_date: date(2026, 6, 1),
            end_date: date(2026, 8, 31),
            positions,
        },
    ))
    .wrap_err("publish offer for scenario")?;
    world.offer = Some(offer);
    Ok(())
}

#[given(r#""{name}" has applied"#)]
fn student_has_applied(world: &mut PlacementWorld, name: String) -> Result<(), eyre::Report> {
    let offer_id = world
        .offer
        .as_ref()
        .map(|offer| offer.id())
        .ok_or_else(|| eyre::eyre!("missing offer in scenario world"))?;
    let actor = Actor::new(UserId::new(), Role::Student);
    let application = run_async(world.service.submit_application(actor, offer_id))
        .wrap_err("submit application for scenario")?;
    world.students.insert(
        name,
        Participant {
            actor,
            application: Some(application),
            internship_id: None,
        },
    );
    Ok(())
}

#[given(r#"the application of "{name}" is under review"#)]
fn application_under_review(world: &mut PlacementWorld, name: String) -> Result<(), eyre::Report> {
    let application_id = world.application_of(&name)?.id();
    run_async(world.service.request_transition(TransitionRequest::new(
        EntityRef::Application(application_id),
        Status::Application(ApplicationStatus::Reviewing),
        world.hospital,
    )))
    .wrap_err("start review for scenario")?;
    Ok(())
}

#[given(r#""{name}" has been placed"#)]
fn student_has_been_placed(world: &mut PlacementWorld, name: String) -> Result<(), eyre::Report> {
    student_has_applied(world, name.clone())?;
    application_under_review(world, name.clone())?;
    let application_id = world.application_of(&name)?.id();
    let accepted = run_async(world.service.request_transition(TransitionRequest::new(
        EntityRef::Application(application_id),
        Status::Application(ApplicationStatus::Accepted),
        world.hospital,
    )))
    .wrap_err("accept application for scenario")?;
    let internship_id = accepted
        .side_effects
        .iter()
        .find_map(|effect| match effect {
            SideEffect::InternshipCreated { internship_id } => Some(*internship_id),
            _ => None,
        })
        .ok_or_else(|| eyre::eyre!("acceptance created no internship"))?;
    let participant = world
        .students
        .get_mut(&name)
        .ok_or_else(|| eyre::eyre!("unknown student {name}"))?;
    participant.internship_id = Some(internship_id);
    Ok(())
}

#[given(r#""{name}" recorded {hours:u32} hours of attendance"#)]
fn student_recorded_attendance(
    world: &mut PlacementWorld,
    name: String,
    hours: u32,
) -> Result<(), eyre::Report> {
    let participant = world.participant(&name)?;
    let actor = participant.actor;
    let internship_id = participant
        .internship_id
        .ok_or_else(|| eyre::eyre!("{name} has no internship"))?;
    let attendance = run_async(world.service.record_attendance(
        actor,
        internship_id,
        AttendanceRecord {
            date: date(2026, 6, 2),
            hours,
            status: AttendanceStatus::Present,
        },
    ))
    .wrap_err("record attendance for scenario")?;
    world.attendance = Some(attendance);
    Ok(())
}
