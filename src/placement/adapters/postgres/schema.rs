//! Diesel schema for placement workflow persistence.

diesel::table! {
    /// Internship offers published by hospitals.
    offers (id) {
        /// Offer identifier.
        id -> Uuid,
        /// Publishing hospital.
        hospital_id -> Uuid,
        /// Doctor who will supervise placed students.
        supervisor_id -> Uuid,
        /// Offer title.
        #[max_length = 255]
        title -> Varchar,
        /// First day of the placement.
        start_date -> Date,
        /// Last day of the placement.
        end_date -> Date,
        /// Total positions.
        positions -> Int4,
        /// Positions consumed by accepted applications.
        filled_positions -> Int4,
        /// Optimistic-lock version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Student applications to offers.
    applications (id) {
        /// Application identifier.
        id -> Uuid,
        /// Applying student.
        student_id -> Uuid,
        /// Target offer.
        offer_id -> Uuid,
        /// Review status.
        #[max_length = 50]
        status -> Varchar,
        /// Reason recorded on rejection.
        rejection_reason -> Nullable<Text>,
        /// Optimistic-lock version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Placements created from accepted applications.
    internships (id) {
        /// Internship identifier.
        id -> Uuid,
        /// Accepted application.
        application_id -> Uuid,
        /// Placed student.
        student_id -> Uuid,
        /// Host hospital.
        hospital_id -> Uuid,
        /// Supervising doctor.
        supervisor_id -> Uuid,
        /// First day of the placement.
        start_date -> Date,
        /// Last day of the placement.
        end_date -> Date,
        /// Lifecycle status.
        #[max_length = 50]
        status -> Varchar,
        /// Hours credited from approved attendance.
        credited_hours -> Int4,
        /// Optimistic-lock version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Daily logbook entries.
    logbook_entries (id) {
        /// Entry identifier.
        id -> Uuid,
        /// Owning internship.
        internship_id -> Uuid,
        /// Authoring student.
        student_id -> Uuid,
        /// Day the entry covers.
        entry_date -> Date,
        /// Activities performed.
        activities -> Text,
        /// Review status.
        #[max_length = 50]
        status -> Varchar,
        /// Supervisor feedback.
        supervisor_comments -> Nullable<Text>,
        /// Optimistic-lock version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Daily attendance records.
    attendance_records (id) {
        /// Record identifier.
        id -> Uuid,
        /// Owning internship.
        internship_id -> Uuid,
        /// Attending student.
        student_id -> Uuid,
        /// Day attended.
        attendance_date -> Date,
        /// Hours attended.
        hours -> Int4,
        /// Attendance status.
        #[max_length = 50]
        status -> Varchar,
        /// Optimistic-lock version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Supervisor and tutor evaluations.
    evaluations (id) {
        /// Evaluation identifier.
        id -> Uuid,
        /// Owning internship.
        internship_id -> Uuid,
        /// Evaluated student.
        student_id -> Uuid,
        /// Authoring doctor or tutor.
        evaluator_id -> Uuid,
        /// Evaluation type.
        #[max_length = 50]
        evaluation_type -> Varchar,
        /// Evaluation status.
        #[max_length = 50]
        status -> Varchar,
        /// Percentage score.
        score -> Nullable<Int2>,
        /// Free-text comments.
        comments -> Nullable<Text>,
        /// Optimistic-lock version.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Notifications committed with the transitions that caused them.
    notification_outbox (id) {
        /// Notification identifier.
        id -> Uuid,
        /// Recipient.
        recipient_id -> Uuid,
        /// Notification kind.
        #[max_length = 100]
        kind -> Varchar,
        /// Subject entity and kind as JSON.
        subject -> Jsonb,
        /// Notification payload.
        payload -> Jsonb,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Hand-off timestamp, unset until the notification service accepts it.
        dispatched_at -> Nullable<Timestamptz>,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    offers,
    applications,
    internships,
    logbook_entries,
    attendance_records,
    evaluations,
    notification_outbox,
);
