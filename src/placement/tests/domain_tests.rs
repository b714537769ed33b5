//! Unit tests for placement domain constructors and parsing.

use super::support::{date, offer_end, offer_start, student, today};
use crate::placement::{
    adapters::clock::ManualClock,
    domain::{
        Application, ApplicationStatus, Attendance, AttendanceStatus, Entity, EntityKind,
        EntityRef, Evaluation, EvaluationType, Internship, InternshipStatus, LogbookEntry,
        NewOffer, NotificationKind, Offer, OfferId, PlacementDomainError, Role, Status, UserId,
    },
};
use rstest::{fixture, rstest};
use uuid::Uuid;

#[fixture]
fn clock() -> ManualClock {
    ManualClock::on(today())
}

fn new_offer(positions: u32) -> NewOffer {
    NewOffer {
        hospital_id: UserId::new(),
        supervisor_id: UserId::new(),
        title: "  Emergency medicine  ".to_owned(),
        start_date: offer_start(),
        end_date: offer_end(),
        positions,
    }
}

#[fixture]
fn internship(clock: ManualClock) -> Internship {
    let offer = Offer::publish(new_offer(1), &clock).expect("valid offer");
    let application = Application::submit(student().id, offer.id(), &clock);
    Internship::from_acceptance(&application, &offer, &clock).expect("valid internship")
}

#[rstest]
fn publishing_trims_the_title_and_starts_empty(clock: ManualClock) {
    let offer = Offer::publish(new_offer(2), &clock).expect("valid offer");

    assert_eq!(offer.title(), "Emergency medicine");
    assert_eq!(offer.filled_positions(), 0);
    assert_eq!(offer.remaining_positions(), 2);
    assert_eq!(offer.revision().version, 1);
    assert_eq!(offer.revision().created_at, clock.now());
}

#[rstest]
fn publishing_rejects_invalid_offers(clock: ManualClock) {
    let blank = NewOffer {
        title: "   ".to_owned(),
        ..new_offer(1)
    };
    let reversed = NewOffer {
        start_date: offer_end(),
        end_date: offer_start(),
        ..new_offer(1)
    };

    assert_eq!(
        Offer::publish(blank, &clock),
        Err(PlacementDomainError::EmptyTitle)
    );
    assert!(matches!(
        Offer::publish(reversed, &clock),
        Err(PlacementDomainError::InvalidDateRange { .. })
    ));
    assert_eq!(
        Offer::publish(new_offer(0), &clock),
        Err(PlacementDomainError::InvalidPositions(0))
    );
}

#[rstest]
fn filling_positions_stops_at_capacity(clock: ManualClock) {
    let mut offer = Offer::publish(new_offer(1), &clock).expect("valid offer");

    offer.fill_position(&clock).expect("one position is free");
    let second = offer.fill_position(&clock);

    assert_eq!(second, Err(PlacementDomainError::OfferFull(offer.id())));
    assert_eq!(offer.filled_positions(), 1);
    assert_eq!(offer.revision().version, 2);
}

#[rstest]
fn acceptance_copies_the_offer_into_an_upcoming_internship(clock: ManualClock) {
    let offer = Offer::publish(new_offer(1), &clock).expect("valid offer");
    let application = Application::submit(student().id, offer.id(), &clock);

    let internship =
        Internship::from_acceptance(&application, &offer, &clock).expect("valid internship");

    assert_eq!(internship.status(), InternshipStatus::Upcoming);
    assert_eq!(internship.student_id(), application.student_id());
    assert_eq!(internship.application_id(), application.id());
    assert_eq!(internship.supervisor_id(), offer.supervisor_id());
    assert_eq!(internship.start_date(), offer.start_date());
    assert_eq!(internship.end_date(), offer.end_date());
    assert_eq!(internship.credited_hours(), 0);
}

#[rstest]
#[case(0)]
#[case(25)]
fn attendance_hours_must_fit_in_a_day(
    internship: Internship,
    clock: ManualClock,
    #[case] hours: u32,
) {
    let result = Attendance::record(
        &internship,
        offer_start(),
        hours,
        AttendanceStatus::Present,
        &clock,
    );
    assert_eq!(result, Err(PlacementDomainError::InvalidHours(hours)));
}

#[rstest]
#[case(AttendanceStatus::Approved)]
#[case(AttendanceStatus::Rejected)]
fn attendance_cannot_start_validated(
    internship: Internship,
    clock: ManualClock,
    #[case] status: AttendanceStatus,
) {
    let result = Attendance::record(&internship, offer_start(), 6, status, &clock);
    assert_eq!(
        result,
        Err(PlacementDomainError::InvalidInitialAttendance(status))
    );
}

#[rstest]
#[case(date(2026, 3, 31))]
#[case(date(2026, 7, 1))]
fn dated_records_must_fall_inside_the_internship(
    internship: Internship,
    clock: ManualClock,
    #[case] day: chrono::NaiveDate,
) {
    let entry = LogbookEntry::draft(&internship, day, "Clinic", &clock);
    let attendance = Attendance::record(&internship, day, 4, AttendanceStatus::Late, &clock);

    assert!(matches!(
        entry,
        Err(PlacementDomainError::OutsideInternship { .. })
    ));
    assert!(matches!(
        attendance,
        Err(PlacementDomainError::OutsideInternship { .. })
    ));
}

#[rstest]
fn closed_internships_accept_no_records(internship: Internship, clock: ManualClock) {
    let mut entity = Entity::Internship(internship);
    entity
        .apply_status(Status::Internship(InternshipStatus::Cancelled), None, &clock)
        .expect("status matches kind");
    let closed = entity.as_internship().expect("still an internship");

    let entry = LogbookEntry::draft(closed, offer_start(), "Clinic", &clock);
    let evaluation = Evaluation::draft(
        closed,
        UserId::new(),
        EvaluationType::Final,
        None,
        None,
        &clock,
    );

    assert!(matches!(
        entry,
        Err(PlacementDomainError::InternshipClosed { .. })
    ));
    assert!(matches!(
        evaluation,
        Err(PlacementDomainError::InternshipClosed { .. })
    ));
}

#[rstest]
fn evaluation_scores_are_percentages(internship: Internship, clock: ManualClock) {
    let result = Evaluation::draft(
        &internship,
        UserId::new(),
        EvaluationType::MidTerm,
        Some(101),
        None,
        &clock,
    );
    assert_eq!(result, Err(PlacementDomainError::InvalidScore(101)));
}

#[rstest]
fn applying_a_status_bumps_the_version_and_keeps_notes(clock: ManualClock) {
    let application = Application::submit(student().id, OfferId::new(), &clock);
    let mut entity = Entity::Application(application);
    clock.advance_days(1);

    entity
        .apply_status(
            Status::Application(ApplicationStatus::Rejected),
            Some("Incomplete paperwork".to_owned()),
            &clock,
        )
        .expect("status matches kind");

    let rejected = entity.as_application().expect("still an application");
    assert_eq!(rejected.revision().version, 2);
    assert_eq!(rejected.revision().updated_at, clock.now());
    assert_eq!(rejected.rejection_reason(), Some("Incomplete paperwork"));
}

#[rstest]
fn applying_a_status_of_another_kind_fails(internship: Internship, clock: ManualClock) {
    let mut entity = Entity::Internship(internship);

    let result = entity.apply_status(
        Status::Attendance(AttendanceStatus::Approved),
        None,
        &clock,
    );

    assert_eq!(
        result,
        Err(PlacementDomainError::StatusKindMismatch {
            expected: EntityKind::Internship,
            found: EntityKind::Attendance,
        })
    );
}

#[rstest]
#[case(EntityKind::Application, "Reviewing", "application:reviewing")]
#[case(EntityKind::LogbookEntry, "revision_requested", "logbook_entry:revision_requested")]
#[case(EntityKind::Attendance, " excused ", "attendance:excused")]
fn statuses_parse_per_kind(#[case] kind: EntityKind, #[case] raw: &str, #[case] rendered: &str) {
    let status = Status::parse(kind, raw).expect("known status");
    assert_eq!(status.kind(), kind);
    assert_eq!(status.to_string(), rendered);
}

#[rstest]
fn statuses_of_other_kinds_do_not_parse() {
    let err =
        Status::parse(EntityKind::Internship, "approved").expect_err("not an internship status");
    assert_eq!(err.kind, EntityKind::Internship);
    assert_eq!(err.value, "approved");
}

#[rstest]
fn entity_refs_rebuild_from_kind_and_uuid() {
    let id = Uuid::new_v4();
    let entity = EntityRef::from_parts(EntityKind::Evaluation, id);
    assert_eq!(entity.kind(), EntityKind::Evaluation);
    assert_eq!(entity.uuid(), id);
}

#[rstest]
fn names_round_trip_through_their_storage_form() {
    assert_eq!(
        NotificationKind::try_from("final_evaluation_due"),
        Ok(NotificationKind::FinalEvaluationDue)
    );
    assert!(NotificationKind::try_from("carrier_pigeon").is_err());
    assert_eq!(Role::try_from(" Tutor "), Ok(Role::Tutor));
    assert!(Role::try_from("janitor").is_err());
}
