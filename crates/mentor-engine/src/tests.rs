//! End-to-end engine tests over an in-memory SQLite store.

use std::sync::{
  Arc,
  atomic::{AtomicBool, AtomicUsize, Ordering},
};

use chrono::{DateTime, Duration, TimeZone, Utc};
use mentor_core::{
  analytics::{CourseAnalytics, OrganizationAnalytics, UserAnalytics},
  assignment::{Assignment, AssignmentStatus, AssignmentTarget, RoleAssignment},
  catalog::{
    Course, CourseMaterial, CourseQuery, DeliveryType, Material, MaterialQuery,
    MaterialType,
  },
  certificate::Certificate,
  lifecycle::AssignmentPatch,
  notification::{Notification, NotificationKind},
  progress::Progress,
  quiz::{Answers, AttemptQuery, QuestionType, QuizAttempt, QuizQuestion},
  store::{AssignmentQuery, TrainingStore},
};
use mentor_store_sqlite::SqliteStore;
use serde_json::json;
use uuid::Uuid;

use crate::{
  AssignRequest, CourseMaterialRequest, ErrorKind, NewCourse, NewMaterial,
  NewNotification, NewQuestion, ProgressReport, QuestionPatch, QuizSubmission,
  RoleAssignRequest, TrainingEngine,
};

fn now() -> DateTime<Utc> { Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap() }

async fn engine() -> TrainingEngine<SqliteStore> {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  TrainingEngine::new(Arc::new(store)).with_clock(now)
}

fn new_material(passing_score: u8) -> NewMaterial {
  NewMaterial {
    title: "Phishing awareness".into(),
    description: None,
    uri: "https://training.example.com/phishing".into(),
    delivery: DeliveryType::Link,
    material_type: MaterialType::Quiz,
    duration_minutes: Some(15),
    tags: vec![],
    is_required: true,
    passing_score,
    attempts_limit: None,
    metadata: Default::default(),
  }
}

fn request(target_id: Uuid, user_id: Uuid, due_at: Option<DateTime<Utc>>) -> AssignRequest {
  AssignRequest {
    target_id,
    user_ids: vec![user_id],
    due_at,
    priority: String::new(),
    metadata: Default::default(),
  }
}

async fn material<S: TrainingStore>(engine: &TrainingEngine<S>, tenant: Uuid) -> Material {
  engine
    .create_material(tenant, new_material(50), None)
    .await
    .unwrap()
}

fn new_question(order_index: i32, correct_index: i64) -> NewQuestion {
  NewQuestion {
    text: format!("Question {order_index}"),
    options: json!(["a", "b", "c"]),
    correct_index,
    question_type: QuestionType::SingleChoice,
    points: None,
    explanation: None,
    order_index,
  }
}

fn submission(assignment_id: Option<Uuid>, answers: &[(Uuid, i64)]) -> QuizSubmission {
  QuizSubmission {
    assignment_id,
    answers: answers
      .iter()
      .map(|(id, choice)| (id.to_string(), json!(choice)))
      .collect(),
    time_spent_minutes: None,
  }
}

#[tokio::test]
async fn past_due_assignment_starts_overdue() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;

  let created = engine
    .assign_material(
      tenant,
      request(m.material_id, Uuid::new_v4(), Some(now() - Duration::days(1))),
      None,
    )
    .await
    .unwrap();
  assert_eq!(created.len(), 1);
  assert_eq!(created[0].status, AssignmentStatus::Overdue);
  assert_eq!(created[0].priority, "normal");

  let overdue = engine.overdue_assignments(tenant).await.unwrap();
  assert_eq!(overdue.len(), 1);
}

#[tokio::test]
async fn moving_the_due_date_out_clears_overdue() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let a = engine
    .assign_material(
      tenant,
      request(m.material_id, Uuid::new_v4(), Some(now() - Duration::days(1))),
      None,
    )
    .await
    .unwrap()
    .remove(0);

  let patch = AssignmentPatch {
    due_at: Some(now() + Duration::days(7)),
    ..Default::default()
  };
  let a = engine
    .update_assignment(tenant, a.assignment_id, patch)
    .await
    .unwrap();
  assert_eq!(a.status, AssignmentStatus::Assigned);
}

#[tokio::test]
async fn assigning_requires_users_and_an_existing_target() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;

  let mut empty = request(m.material_id, Uuid::new_v4(), None);
  empty.user_ids.clear();
  let err = engine.assign_material(tenant, empty, None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let err = engine
    .assign_course(tenant, request(Uuid::new_v4(), Uuid::new_v4(), None), None)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  // Materials from another tenant are invisible.
  let err = engine
    .assign_material(Uuid::new_v4(), request(m.material_id, Uuid::new_v4(), None), None)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn course_assignment_fans_out_per_user() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let course = engine
    .create_course(
      tenant,
      NewCourse {
        title: "Onboarding".into(),
        description: None,
        is_active: true,
      },
      None,
    )
    .await
    .unwrap();

  let mut req = request(course.course_id, Uuid::new_v4(), None);
  req.user_ids.push(Uuid::new_v4());
  req.priority = "HIGH".into();
  let count = engine.bulk_assign_course(tenant, req, None).await.unwrap();
  assert_eq!(count, 2);

  let user = Uuid::new_v4();
  let a = engine
    .assign_course(tenant, request(course.course_id, user, None), None)
    .await
    .unwrap()
    .remove(0);
  assert_eq!(a.target, AssignmentTarget::Course(course.course_id));
  let listed = engine
    .list_user_assignments(tenant, user, Default::default())
    .await
    .unwrap();
  assert_eq!(listed, vec![a]);
}

#[tokio::test]
async fn role_assignment_needs_exactly_one_target() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let role_id = Uuid::new_v4();

  let both = RoleAssignRequest {
    role_id,
    material_id: Some(Uuid::new_v4()),
    course_id: Some(Uuid::new_v4()),
    is_required: true,
    due_days: Some(14),
  };
  let err = engine.assign_to_role(tenant, both, None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let neither = RoleAssignRequest {
    role_id,
    material_id: None,
    course_id: None,
    is_required: true,
    due_days: None,
  };
  let err = engine.assign_to_role(tenant, neither, None).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let material_id = Uuid::new_v4();
  let ok = RoleAssignRequest {
    role_id,
    material_id: Some(material_id),
    course_id: None,
    is_required: false,
    due_days: Some(30),
  };
  let template = engine.assign_to_role(tenant, ok, None).await.unwrap();
  assert_eq!(template.target, AssignmentTarget::Material(material_id));
  assert_eq!(
    engine.list_role_assignments(tenant, role_id).await.unwrap(),
    vec![template]
  );
}

#[tokio::test]
async fn progress_reaching_100_completes_the_assignment() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let a = engine
    .assign_material(tenant, request(m.material_id, Uuid::new_v4(), None), None)
    .await
    .unwrap()
    .remove(0);

  let partial = ProgressReport {
    progress_percentage: 40,
    time_spent_minutes: 10,
    last_position: Some(120),
    completed_at: None,
  };
  let a = engine
    .update_progress(tenant, a.assignment_id, m.material_id, partial)
    .await
    .unwrap();
  assert_eq!(a.status, AssignmentStatus::InProgress);
  assert_eq!(a.progress_percentage, 40);

  let done = ProgressReport {
    progress_percentage: 150,
    time_spent_minutes: 25,
    ..Default::default()
  };
  let a = engine
    .update_progress(tenant, a.assignment_id, m.material_id, done)
    .await
    .unwrap();
  assert_eq!(a.status, AssignmentStatus::Completed);
  assert_eq!(a.progress_percentage, 100);
  assert_eq!(a.completed_at, Some(now()));
  assert_eq!(a.time_spent_minutes, 25);

  let rows = engine.list_progress(tenant, a.assignment_id).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].progress_percentage, 100);
  assert_eq!(rows[0].time_spent_minutes, 25);
  assert_eq!(rows[0].last_position, None);
}

#[tokio::test]
async fn negative_progress_is_clamped() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let a = engine
    .assign_material(tenant, request(m.material_id, Uuid::new_v4(), None), None)
    .await
    .unwrap()
    .remove(0);

  let report = ProgressReport {
    progress_percentage: -20,
    time_spent_minutes: -5,
    ..Default::default()
  };
  let a = engine
    .update_progress(tenant, a.assignment_id, m.material_id, report)
    .await
    .unwrap();
  assert_eq!(a.status, AssignmentStatus::Assigned);
  assert_eq!(a.progress_percentage, 0);
  assert_eq!(a.time_spent_minutes, 0);
}

#[tokio::test]
async fn mark_as_completed_keeps_time_spent() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let a = engine
    .assign_material(tenant, request(m.material_id, Uuid::new_v4(), None), None)
    .await
    .unwrap()
    .remove(0);
  let report = ProgressReport {
    progress_percentage: 10,
    time_spent_minutes: 7,
    ..Default::default()
  };
  engine
    .update_progress(tenant, a.assignment_id, m.material_id, report)
    .await
    .unwrap();

  let a = engine
    .mark_as_completed(tenant, a.assignment_id, m.material_id)
    .await
    .unwrap();
  assert_eq!(a.status, AssignmentStatus::Completed);
  assert_eq!(a.time_spent_minutes, 7);

  let rows = engine.list_progress(tenant, a.assignment_id).await.unwrap();
  assert_eq!(rows[0].progress_percentage, 100);
  assert_eq!(rows[0].completed_at, Some(now()));
}

#[tokio::test]
async fn passing_quiz_completes_the_linked_assignment() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let user = Uuid::new_v4();
  let m = material(&engine, tenant).await;

  let mut ids = Vec::new();
  for (order, correct) in [(0, 0), (1, 1)] {
    let q = engine
      .create_question(
        tenant,
        m.material_id,
        NewQuestion {
          text: format!("Question {order}"),
          options: json!(["a", "b", "c"]),
          correct_index: correct,
          question_type: QuestionType::SingleChoice,
          points: Some(1),
          explanation: None,
          order_index: order,
        },
      )
      .await
      .unwrap();
    ids.push(q.question_id);
  }

  let a = engine
    .assign_material(tenant, request(m.material_id, user, None), None)
    .await
    .unwrap()
    .remove(0);

  let mut answers = Answers::new();
  answers.insert(ids[0].to_string(), json!(0));
  answers.insert(ids[1].to_string(), json!("1"));
  let attempt = engine
    .submit_quiz_attempt(
      tenant,
      m.material_id,
      QuizSubmission {
        assignment_id: Some(a.assignment_id),
        answers,
        time_spent_minutes: Some(6),
      },
      user,
    )
    .await
    .unwrap();
  assert_eq!(attempt.score, 2);
  assert_eq!(attempt.max_score, Some(2));
  assert!(attempt.passed);

  let a = engine.get_assignment(tenant, a.assignment_id).await.unwrap();
  assert_eq!(a.status, AssignmentStatus::Completed);
  assert_eq!(a.progress_percentage, 100);
  assert_eq!(a.time_spent_minutes, 6);
  assert_eq!(engine.get_attempt(tenant, attempt.attempt_id).await.unwrap(), attempt);
}

#[tokio::test]
async fn failing_quiz_only_records_progress() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let user = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let mut ids = Vec::new();
  for order in 0..4 {
    let q = engine
      .create_question(
        tenant,
        m.material_id,
        NewQuestion {
          text: format!("Question {order}"),
          options: json!(["yes", "no"]),
          correct_index: 0,
          question_type: QuestionType::TrueFalse,
          points: None,
          explanation: None,
          order_index: order,
        },
      )
      .await
      .unwrap();
    ids.push(q.question_id);
  }
  let a = engine
    .assign_material(tenant, request(m.material_id, user, None), None)
    .await
    .unwrap()
    .remove(0);

  let mut answers = Answers::new();
  answers.insert(ids[0].to_string(), json!(0));
  answers.insert(ids[1].to_string(), json!(1));
  answers.insert(ids[2].to_string(), json!(null));
  let attempt = engine
    .submit_quiz_attempt(
      tenant,
      m.material_id,
      QuizSubmission {
        assignment_id: Some(a.assignment_id),
        answers,
        time_spent_minutes: None,
      },
      user,
    )
    .await
    .unwrap();
  assert_eq!(attempt.score, 1);
  assert_eq!(attempt.max_score, Some(4));
  assert!(!attempt.passed);

  let a = engine.get_assignment(tenant, a.assignment_id).await.unwrap();
  assert_eq!(a.status, AssignmentStatus::InProgress);
  assert_eq!(a.progress_percentage, 25);
}

#[tokio::test]
async fn empty_question_bank_never_passes() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;

  let attempt = engine
    .submit_quiz_attempt(
      tenant,
      m.material_id,
      QuizSubmission {
        assignment_id: None,
        answers: Answers::new(),
        time_spent_minutes: None,
      },
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  assert_eq!(attempt.score, 0);
  assert_eq!(attempt.max_score, None);
  assert!(!attempt.passed);
}

#[tokio::test]
async fn certificates_require_completion_and_can_be_revoked() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let issuer = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let a = engine
    .assign_material(tenant, request(m.material_id, Uuid::new_v4(), None), None)
    .await
    .unwrap()
    .remove(0);

  let err = engine
    .issue_certificate(tenant, a.assignment_id, Some(issuer))
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Precondition);

  engine
    .mark_as_completed(tenant, a.assignment_id, m.material_id)
    .await
    .unwrap();

  let first = engine
    .issue_certificate(tenant, a.assignment_id, Some(issuer))
    .await
    .unwrap();
  let second = engine
    .issue_certificate(tenant, a.assignment_id, None)
    .await
    .unwrap();
  assert_ne!(first.certificate_number, second.certificate_number);
  assert_eq!(first.user_id, a.user_id);
  assert_eq!(first.metadata["generated_by"], json!(issuer.to_string()));

  let valid = engine
    .validate_certificate(&first.certificate_number)
    .await
    .unwrap();
  assert_eq!(valid.certificate_id, first.certificate_id);

  let revoked = engine
    .revoke_certificate(tenant, first.certificate_id)
    .await
    .unwrap();
  assert!(!revoked.is_valid);
  let err = engine
    .validate_certificate(&first.certificate_number)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Precondition);

  let err = engine.validate_certificate("not-a-number").await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let err = engine
    .get_certificate(Uuid::new_v4(), second.certificate_id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  assert_eq!(
    engine.list_certificates(tenant, a.user_id).await.unwrap().len(),
    2
  );
}

#[tokio::test]
async fn notifications_stay_inside_their_tenant() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let a = engine
    .assign_material(tenant, request(m.material_id, Uuid::new_v4(), None), None)
    .await
    .unwrap()
    .remove(0);

  let new = || NewNotification {
    assignment_id: a.assignment_id,
    user_id: None,
    kind: NotificationKind::Assignment,
    title: "New training".into(),
    message: "You have been assigned new training.".into(),
  };
  let err = engine
    .create_notification(Uuid::new_v4(), new())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let n = engine.create_notification(tenant, new()).await.unwrap();
  assert_eq!(n.user_id, a.user_id);

  let err = engine
    .mark_notification_read(Uuid::new_v4(), n.notification_id)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  engine
    .mark_notification_read(a.user_id, n.notification_id)
    .await
    .unwrap();
  assert!(engine.list_notifications(a.user_id, true).await.unwrap().is_empty());
  let all = engine.list_notifications(a.user_id, false).await.unwrap();
  assert_eq!(all.len(), 1);
  assert!(all[0].is_read);
}

#[tokio::test]
async fn reminder_sweep_respects_the_cooldown() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let soon = engine
    .assign_material(
      tenant,
      request(m.material_id, Uuid::new_v4(), Some(now() + Duration::days(1))),
      None,
    )
    .await
    .unwrap()
    .remove(0);
  let late = engine
    .assign_material(
      tenant,
      request(m.material_id, Uuid::new_v4(), Some(now() - Duration::days(2))),
      None,
    )
    .await
    .unwrap()
    .remove(0);
  // Outside the window: not reminded.
  engine
    .assign_material(
      tenant,
      request(m.material_id, Uuid::new_v4(), Some(now() + Duration::days(10))),
      None,
    )
    .await
    .unwrap();

  let report = engine.send_reminders(tenant).await.unwrap();
  assert_eq!(report.sent, 2);
  assert_eq!(report.skipped, 0);

  let soon_notes = engine.list_notifications(soon.user_id, false).await.unwrap();
  assert_eq!(soon_notes.len(), 1);
  assert_eq!(soon_notes[0].kind, NotificationKind::Reminder);
  let late_notes = engine.list_notifications(late.user_id, false).await.unwrap();
  assert_eq!(late_notes[0].kind, NotificationKind::Deadline);

  let soon = engine.get_assignment(tenant, soon.assignment_id).await.unwrap();
  assert_eq!(soon.reminder_sent_at, Some(now()));

  let again = engine.send_reminders(tenant).await.unwrap();
  assert_eq!(again.sent, 0);
  assert_eq!(again.skipped, 2);
}

#[tokio::test]
async fn analytics_reflect_completions() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let user = Uuid::new_v4();
  let m = material(&engine, tenant).await;

  let mut req = request(m.material_id, user, None);
  req.user_ids.push(user);
  let created = engine.assign_material(tenant, req, None).await.unwrap();
  engine
    .mark_as_completed(tenant, created[0].assignment_id, m.material_id)
    .await
    .unwrap();

  let ua = engine.user_analytics(tenant, user).await.unwrap();
  assert_eq!(ua.total_assignments, 2);
  assert_eq!(ua.completed_assignments, 1);
  assert!((ua.completion_rate - 50.0).abs() < f64::EPSILON);

  let org = engine.organization_analytics(tenant).await.unwrap();
  assert_eq!(org.total_materials, 1);
  assert_eq!(org.total_assignments, 2);

  let err = engine
    .course_analytics(tenant, Uuid::new_v4())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn upcoming_window_rejects_out_of_range_days() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();

  assert!(engine.upcoming_deadlines(tenant, 7).await.unwrap().is_empty());
  let err = engine
    .upcoming_deadlines(tenant, u32::MAX)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
}

#[tokio::test]
async fn oversized_question_points_are_rejected() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;

  let mut request = new_question(0, 0);
  request.points = Some(i32::MAX);
  let err = engine
    .create_question(tenant, m.material_id, request)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);

  let q = engine
    .create_question(tenant, m.material_id, new_question(0, 0))
    .await
    .unwrap();
  let patch = QuestionPatch {
    points: Some(i32::MAX),
    ..Default::default()
  };
  let err = engine
    .update_question(tenant, q.question_id, patch)
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Validation);
  assert_eq!(engine.get_question(tenant, q.question_id).await.unwrap(), q);
}

#[tokio::test]
async fn questions_and_attempts_stay_within_their_tenant() {
  let engine = engine().await;
  let owner = Uuid::new_v4();
  let other = Uuid::new_v4();
  let m = material(&engine, owner).await;
  let q = engine
    .create_question(owner, m.material_id, new_question(0, 1))
    .await
    .unwrap();
  let attempt = engine
    .submit_quiz_attempt(
      owner,
      m.material_id,
      submission(None, &[(q.question_id, 1)]),
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  assert_eq!(attempt.tenant_id, owner);

  let err = engine.get_question(other, q.question_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let err = engine
    .update_question(other, q.question_id, QuestionPatch::default())
    .await
    .unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let err = engine.delete_question(other, q.question_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);

  let err = engine.get_attempt(other, attempt.attempt_id).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::NotFound);
  let foreign = engine
    .list_attempts(other, &AttemptQuery::default())
    .await
    .unwrap();
  assert!(foreign.is_empty());

  let own = engine
    .list_attempts(owner, &AttemptQuery::default())
    .await
    .unwrap();
  assert_eq!(own, vec![attempt]);
  engine.delete_question(owner, q.question_id).await.unwrap();
}

#[tokio::test]
async fn quiz_attempt_is_kept_when_the_assignment_is_unknown() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let neighbour = Uuid::new_v4();
  let user = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let q = engine
    .create_question(tenant, m.material_id, new_question(0, 0))
    .await
    .unwrap();

  let missing = Uuid::new_v4();
  let attempt = engine
    .submit_quiz_attempt(
      tenant,
      m.material_id,
      submission(Some(missing), &[(q.question_id, 0)]),
      user,
    )
    .await
    .unwrap();
  assert!(attempt.passed);
  assert_eq!(attempt.assignment_id, Some(missing));
  assert_eq!(engine.get_attempt(tenant, attempt.attempt_id).await.unwrap(), attempt);

  // An assignment in another tenant is not touched.
  let theirs = material(&engine, neighbour).await;
  let foreign = engine
    .assign_material(neighbour, request(theirs.material_id, user, None), None)
    .await
    .unwrap()
    .remove(0);
  let attempt = engine
    .submit_quiz_attempt(
      tenant,
      m.material_id,
      submission(Some(foreign.assignment_id), &[(q.question_id, 0)]),
      user,
    )
    .await
    .unwrap();
  assert!(attempt.passed);
  let foreign = engine
    .get_assignment(neighbour, foreign.assignment_id)
    .await
    .unwrap();
  assert_eq!(foreign.status, AssignmentStatus::Assigned);
}

#[tokio::test]
async fn quiz_attempt_only_drives_a_matching_assignment() {
  let engine = engine().await;
  let tenant = Uuid::new_v4();
  let learner = Uuid::new_v4();
  let quiz = material(&engine, tenant).await;
  let other = material(&engine, tenant).await;
  let q = engine
    .create_question(tenant, quiz.material_id, new_question(0, 2))
    .await
    .unwrap();

  let wrong_material = engine
    .assign_material(tenant, request(other.material_id, learner, None), None)
    .await
    .unwrap()
    .remove(0);
  let wrong_user = engine
    .assign_material(tenant, request(quiz.material_id, Uuid::new_v4(), None), None)
    .await
    .unwrap()
    .remove(0);

  for assignment in [&wrong_material, &wrong_user] {
    let attempt = engine
      .submit_quiz_attempt(
        tenant,
        quiz.material_id,
        submission(Some(assignment.assignment_id), &[(q.question_id, 2)]),
        learner,
      )
      .await
      .unwrap();
    assert!(attempt.passed);

    let after = engine
      .get_assignment(tenant, assignment.assignment_id)
      .await
      .unwrap();
    assert_eq!(after.status, AssignmentStatus::Assigned);
    assert_eq!(after.progress_percentage, 0);
  }

  // A course assignment covers the quizzes of its materials.
  let course = engine
    .create_course(
      tenant,
      NewCourse {
        title: "Security onboarding".into(),
        description: None,
        is_active: true,
      },
      None,
    )
    .await
    .unwrap();
  engine
    .add_course_material(
      tenant,
      course.course_id,
      quiz.material_id,
      CourseMaterialRequest {
        order_index: 0,
        is_required: true,
      },
    )
    .await
    .unwrap();
  let enrolled = engine
    .assign_course(tenant, request(course.course_id, learner, None), None)
    .await
    .unwrap()
    .remove(0);
  engine
    .submit_quiz_attempt(
      tenant,
      quiz.material_id,
      submission(Some(enrolled.assignment_id), &[(q.question_id, 2)]),
      learner,
    )
    .await
    .unwrap();
  let enrolled = engine
    .get_assignment(tenant, enrolled.assignment_id)
    .await
    .unwrap();
  assert_eq!(enrolled.status, AssignmentStatus::Completed);
}

#[tokio::test]
async fn quiz_without_its_material_needs_a_perfect_score() {
  let store = Arc::new(FaultyStore::new().await);
  let engine = TrainingEngine::new(Arc::clone(&store)).with_clock(now);
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;
  let mut ids = Vec::new();
  for order in 0..2 {
    let q = engine
      .create_question(tenant, m.material_id, new_question(order, 0))
      .await
      .unwrap();
    ids.push(q.question_id);
  }

  store.hide_materials.store(true, Ordering::SeqCst);

  // Half marks meet the material's threshold of 50, which is unavailable.
  let half = engine
    .submit_quiz_attempt(
      tenant,
      m.material_id,
      submission(None, &[(ids[0], 0), (ids[1], 1)]),
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  assert_eq!(half.score, 1);
  assert_eq!(half.max_score, Some(2));
  assert!(!half.passed);

  let perfect = engine
    .submit_quiz_attempt(
      tenant,
      m.material_id,
      submission(None, &[(ids[0], 0), (ids[1], 0)]),
      Uuid::new_v4(),
    )
    .await
    .unwrap();
  assert!(perfect.passed);
}

#[tokio::test]
async fn reminder_sweep_stops_at_the_first_failure() {
  let store = Arc::new(FaultyStore::new().await);
  let engine = TrainingEngine::new(Arc::clone(&store)).with_clock(now);
  let tenant = Uuid::new_v4();
  let m = material(&engine, tenant).await;

  let mut assignments = Vec::new();
  for hours in [24, 48, 60] {
    let due = Some(now() + Duration::hours(hours));
    let a = engine
      .assign_material(tenant, request(m.material_id, Uuid::new_v4(), due), None)
      .await
      .unwrap()
      .remove(0);
    assignments.push(a);
  }

  store.notification_budget.store(1, Ordering::SeqCst);
  let err = engine.send_reminders(tenant).await.unwrap_err();
  assert_eq!(err.kind(), ErrorKind::Store);

  let first = engine
    .get_assignment(tenant, assignments[0].assignment_id)
    .await
    .unwrap();
  assert_eq!(first.reminder_sent_at, Some(now()));
  assert_eq!(
    engine.list_notifications(first.user_id, false).await.unwrap().len(),
    1
  );

  for later in &assignments[1..] {
    let later = engine
      .get_assignment(tenant, later.assignment_id)
      .await
      .unwrap();
    assert_eq!(later.reminder_sent_at, None);
    assert!(
      engine
        .list_notifications(later.user_id, false)
        .await
        .unwrap()
        .is_empty()
    );
  }
}

// ─── Faulty store ────────────────────────────────────────────────────────────

/// SQLite store that can hide materials and reject notifications once its
/// budget is spent.
struct FaultyStore {
  inner:               SqliteStore,
  hide_materials:      AtomicBool,
  notification_budget: AtomicUsize,
}

impl FaultyStore {
  async fn new() -> Self {
    Self {
      inner:               SqliteStore::open_in_memory()
        .await
        .expect("in-memory store"),
      hide_materials:      AtomicBool::new(false),
      notification_budget: AtomicUsize::new(usize::MAX),
    }
  }
}

macro_rules! delegate {
  ($($name:ident($($arg:ident: $ty:ty),*) -> $ret:ty;)*) => {
    $(
      async fn $name(&self, $($arg: $ty),*) -> Result<$ret, Self::Error> {
        self.inner.$name($($arg),*).await
      }
    )*
  };
}

impl TrainingStore for FaultyStore {
  type Error = mentor_store_sqlite::Error;

  async fn get_material(
    &self,
    tenant_id: Uuid,
    material_id: Uuid,
  ) -> Result<Option<Material>, Self::Error> {
    if self.hide_materials.load(Ordering::SeqCst) {
      return Ok(None);
    }
    self.inner.get_material(tenant_id, material_id).await
  }

  async fn create_notification(
    &self,
    notification: Notification,
  ) -> Result<Notification, Self::Error> {
    let spent = self
      .notification_budget
      .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
      .is_err();
    if spent {
      return Err(mentor_store_sqlite::Error::Decode {
        table:  "notifications",
        reason: "injected failure".into(),
      });
    }
    self.inner.create_notification(notification).await
  }

  delegate! {
    create_material(material: Material) -> Material;
    list_materials(tenant_id: Uuid, query: &MaterialQuery) -> Vec<Material>;
    update_material(material: Material) -> bool;
    delete_material(tenant_id: Uuid, material_id: Uuid) -> bool;
    create_course(course: Course) -> Course;
    get_course(tenant_id: Uuid, course_id: Uuid) -> Option<Course>;
    list_courses(tenant_id: Uuid, query: &CourseQuery) -> Vec<Course>;
    update_course(course: Course) -> bool;
    delete_course(tenant_id: Uuid, course_id: Uuid) -> bool;
    add_course_material(membership: CourseMaterial) -> CourseMaterial;
    remove_course_material(course_id: Uuid, material_id: Uuid) -> bool;
    list_course_materials(course_id: Uuid) -> Vec<CourseMaterial>;
    create_assignment(assignment: Assignment) -> Assignment;
    get_assignment(tenant_id: Uuid, assignment_id: Uuid) -> Option<Assignment>;
    update_assignment(assignment: Assignment) -> bool;
    delete_assignment(tenant_id: Uuid, assignment_id: Uuid) -> bool;
    list_assignments(query: &AssignmentQuery) -> Vec<Assignment>;
    list_active_tenants() -> Vec<Uuid>;
    create_role_assignment(template: RoleAssignment) -> RoleAssignment;
    list_role_assignments(tenant_id: Uuid, role_id: Uuid) -> Vec<RoleAssignment>;
    create_progress(progress: Progress) -> Progress;
    update_progress(progress: Progress) -> bool;
    get_progress(assignment_id: Uuid, material_id: Uuid) -> Option<Progress>;
    list_progress(assignment_id: Uuid) -> Vec<Progress>;
    create_question(question: QuizQuestion) -> QuizQuestion;
    get_question(tenant_id: Uuid, question_id: Uuid) -> Option<QuizQuestion>;
    list_questions(material_id: Uuid) -> Vec<QuizQuestion>;
    update_question(tenant_id: Uuid, question: QuizQuestion) -> bool;
    delete_question(tenant_id: Uuid, question_id: Uuid) -> bool;
    create_attempt(attempt: QuizAttempt) -> QuizAttempt;
    get_attempt(tenant_id: Uuid, attempt_id: Uuid) -> Option<QuizAttempt>;
    list_attempts(tenant_id: Uuid, query: &AttemptQuery) -> Vec<QuizAttempt>;
    create_certificate(certificate: Certificate) -> Certificate;
    get_certificate(certificate_id: Uuid) -> Option<Certificate>;
    get_certificate_by_number(number: &str) -> Option<Certificate>;
    list_certificates(tenant_id: Uuid, user_id: Uuid) -> Vec<Certificate>;
    set_certificate_validity(certificate_id: Uuid, is_valid: bool) -> bool;
    list_notifications(user_id: Uuid, unread_only: bool) -> Vec<Notification>;
    mark_notification_read(notification_id: Uuid, user_id: Uuid, read_at: DateTime<Utc>) -> bool;
    user_analytics(tenant_id: Uuid, user_id: Uuid) -> UserAnalytics;
    course_analytics(tenant_id: Uuid, course_id: Uuid) -> CourseAnalytics;
    organization_analytics(tenant_id: Uuid) -> OrganizationAnalytics;
  }
}
