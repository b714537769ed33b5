//! When steps for placement workflow BDD scenarios.

use super::world::{PlacementWorld, date, run_async};
use placement_engine::placement::{
    domain::{ApplicationStatus, AttendanceStatus, EntityRef, Status},
    services::SideEffect,
    validation::TransitionRequest,
};
use rstest_bdd_macros::when;

#[when(r#"the hospital accepts the application of "{name}""#)]
fn hospital_accepts(world: &mut PlacementWorld, name: String) -> Result<(), eyre::Report> {
    let application_id = world.application_of(&name)?.id();
    let result = run_async(world.service.request_transition(TransitionRequest::new(
        EntityRef::Application(application_id),
        Status::Application(ApplicationStatus::Accepted),
        world.hospital,
    )));
    if let Ok(accepted) = &result {
        let internship_id = accepted.side_effects.iter().find_map(|effect| match effect {
            SideEffect::InternshipCreated { internship_id } => Some(*internship_id),
            _ => None,
        });
        if let Some(participant) = world.students.get_mut(&name) {
            participant.internship_id = internship_id;
        }
    }
    world.last_result = Some(result);
    Ok(())
}

#[when(r#""{name}" accepts their own application"#)]
fn student_accepts_own_application(
    world: &mut PlacementWorld,
    name: String,
) -> Result<(), eyre::Report> {
    let actor = world.participant(&name)?.actor;
    let application_id = world.application_of(&name)?.id();
    let result = run_async(world.service.request_transition(TransitionRequest::new(
        EntityRef::Application(application_id),
        Status::Application(ApplicationStatus::Accepted),
        actor,
    )));
    world.last_result = Some(result);
    Ok(())
}

#[when("the calendar reaches the internship start date")]
fn calendar_reaches_start(world: &mut PlacementWorld) -> Result<(), eyre::Report> {
    let start = date(2026, 6, 1)
        .and_hms_opt(0, 5, 0)
        .ok_or_else(|| eyre::eyre!("invalid sweep time"))?;
    world.clock.set(start.and_utc());
    let report = run_async(world.sweep.run_once())?;
    eyre::ensure!(report.failed.is_empty(), "sweep failures: {report:?}");
    Ok(())
}

#[when("the supervisor approves the attendance")]
fn supervisor_approves_attendance(world: &mut PlacementWorld) -> Result<(), eyre::Report> {
    let attendance_id = world
        .attendance
        .as_ref()
        .map(|attendance| attendance.id())
        .ok_or_else(|| eyre::eyre!("missing attendance in scenario world"))?;
    let result = run_async(world.service.request_transition(TransitionRequest::new(
        EntityRef::Attendance(attendance_id),
        Status::Attendance(AttendanceStatus::Approved),
        world.doctor,
    )));
    world.last_result = Some(result);
    Ok(())
}
