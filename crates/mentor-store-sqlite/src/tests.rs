//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, Duration, TimeZone, Utc};
use mentor_core::{
  Metadata,
  assignment::{Assignment, AssignmentStatus, AssignmentTarget, RoleAssignment},
  catalog::{
    Course, CourseMaterial, CourseQuery, DeliveryType, Material, MaterialQuery,
    MaterialType,
  },
  certificate::{Certificate, generate_certificate_number},
  notification::{Notification, NotificationKind},
  progress::Progress,
  quiz::{AttemptQuery, QuestionType, QuizAttempt, QuizQuestion},
  store::{AssignmentQuery, TrainingStore},
};
use serde_json::json;
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn t0() -> DateTime<Utc> { Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap() }

fn material(tenant_id: Uuid, title: &str) -> Material {
  Material {
    material_id:      Uuid::new_v4(),
    tenant_id,
    title:            title.into(),
    description:      Some("Annual refresher".into()),
    uri:              "https://training.example.com/m".into(),
    delivery:         DeliveryType::Link,
    material_type:    MaterialType::Quiz,
    duration_minutes: Some(20),
    tags:             vec!["security".into()],
    is_required:      true,
    passing_score:    70,
    attempts_limit:   None,
    metadata:         Metadata::new(),
    created_by:       None,
    created_at:       t0(),
    updated_at:       t0(),
  }
}

fn course(tenant_id: Uuid, title: &str) -> Course {
  Course {
    course_id: Uuid::new_v4(),
    tenant_id,
    title: title.into(),
    description: None,
    is_active: true,
    created_by: None,
    created_at: t0(),
    updated_at: t0(),
  }
}

fn assignment(tenant_id: Uuid, user_id: Uuid, target: AssignmentTarget) -> Assignment {
  Assignment {
    assignment_id: Uuid::new_v4(),
    tenant_id,
    user_id,
    target,
    status: AssignmentStatus::Assigned,
    due_at: None,
    completed_at: None,
    assigned_by: None,
    priority: "normal".into(),
    progress_percentage: 0,
    time_spent_minutes: 0,
    last_accessed_at: None,
    reminder_sent_at: None,
    metadata: Metadata::new(),
    created_at: t0(),
  }
}

fn question(material_id: Uuid, order_index: i32) -> QuizQuestion {
  QuizQuestion {
    question_id: Uuid::new_v4(),
    material_id,
    text: format!("Question {order_index}"),
    options: json!(["yes", "no"]),
    correct_index: 0,
    question_type: QuestionType::TrueFalse,
    points: 1,
    explanation: None,
    order_index,
    created_at: t0(),
  }
}

// ─── Catalog ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_and_get_material() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let m = s.create_material(material(tenant, "Phishing")).await.unwrap();

  let fetched = s.get_material(tenant, m.material_id).await.unwrap();
  assert_eq!(fetched, Some(m.clone()));

  // Scoped to the owning tenant.
  let other = s.get_material(Uuid::new_v4(), m.material_id).await.unwrap();
  assert!(other.is_none());
}

#[tokio::test]
async fn list_materials_filters() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  s.create_material(material(tenant, "Phishing basics")).await.unwrap();
  let mut optional = material(tenant, "Password hygiene");
  optional.is_required = false;
  optional.material_type = MaterialType::Document;
  s.create_material(optional).await.unwrap();

  let all = s
    .list_materials(tenant, &MaterialQuery::default())
    .await
    .unwrap();
  assert_eq!(all.len(), 2);

  let required = s
    .list_materials(tenant, &MaterialQuery {
      is_required: Some(true),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(required.len(), 1);
  assert_eq!(required[0].title, "Phishing basics");

  let docs = s
    .list_materials(tenant, &MaterialQuery {
      material_type: Some(MaterialType::Document),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(docs.len(), 1);

  let searched = s
    .list_materials(tenant, &MaterialQuery {
      search: Some("PASSWORD".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(searched.len(), 1);
  assert_eq!(searched[0].title, "Password hygiene");
}

#[tokio::test]
async fn update_and_delete_material() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let mut m = s.create_material(material(tenant, "Draft")).await.unwrap();

  m.title = "Final".into();
  m.passing_score = 90;
  assert!(s.update_material(m.clone()).await.unwrap());
  let fetched = s.get_material(tenant, m.material_id).await.unwrap().unwrap();
  assert_eq!(fetched.title, "Final");
  assert_eq!(fetched.passing_score, 90);

  assert!(s.delete_material(tenant, m.material_id).await.unwrap());
  assert!(!s.delete_material(tenant, m.material_id).await.unwrap());
  assert!(!s.update_material(m).await.unwrap());
}

#[tokio::test]
async fn course_membership_upserts_and_orders() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let c = s.create_course(course(tenant, "Onboarding")).await.unwrap();
  let m1 = s.create_material(material(tenant, "One")).await.unwrap();
  let m2 = s.create_material(material(tenant, "Two")).await.unwrap();

  let member = |material_id, order_index| CourseMaterial {
    course_id: c.course_id,
    material_id,
    order_index,
    is_required: true,
    created_at: t0(),
  };

  s.add_course_material(member(m1.material_id, 2)).await.unwrap();
  s.add_course_material(member(m2.material_id, 1)).await.unwrap();

  let listed = s.list_course_materials(c.course_id).await.unwrap();
  let order: Vec<Uuid> = listed.iter().map(|cm| cm.material_id).collect();
  assert_eq!(order, vec![m2.material_id, m1.material_id]);

  // Re-adding the same pair rewrites its order instead of duplicating it.
  let mut moved = member(m1.material_id, 0);
  moved.is_required = false;
  let updated = s.add_course_material(moved).await.unwrap();
  assert_eq!(updated.order_index, 0);
  assert!(!updated.is_required);

  let listed = s.list_course_materials(c.course_id).await.unwrap();
  assert_eq!(listed.len(), 2);
  assert_eq!(listed[0].material_id, m1.material_id);

  assert!(s.remove_course_material(c.course_id, m2.material_id).await.unwrap());
  assert_eq!(s.list_course_materials(c.course_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn list_courses_by_active_flag() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  s.create_course(course(tenant, "Active")).await.unwrap();
  let mut retired = course(tenant, "Retired");
  retired.is_active = false;
  s.create_course(retired).await.unwrap();

  let active = s
    .list_courses(tenant, &CourseQuery {
      is_active: Some(true),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(active.len(), 1);
  assert_eq!(active[0].title, "Active");
}

// ─── Assignments ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn assignment_round_trips_with_course_target() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let mut a = assignment(tenant, Uuid::new_v4(), AssignmentTarget::Course(Uuid::new_v4()));
  a.due_at = Some(t0() + Duration::days(7));
  a.metadata.insert("source".into(), json!("hr-sync"));

  s.create_assignment(a.clone()).await.unwrap();
  let fetched = s.get_assignment(tenant, a.assignment_id).await.unwrap();
  assert_eq!(fetched, Some(a));
}

#[tokio::test]
async fn update_assignment_rewrites_mutable_columns() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let mut a = assignment(tenant, Uuid::new_v4(), AssignmentTarget::Material(Uuid::new_v4()));
  s.create_assignment(a.clone()).await.unwrap();

  a.status = AssignmentStatus::Completed;
  a.completed_at = Some(t0());
  a.progress_percentage = 100;
  a.time_spent_minutes = 42;
  a.reminder_sent_at = Some(t0());
  assert!(s.update_assignment(a.clone()).await.unwrap());

  let fetched = s.get_assignment(tenant, a.assignment_id).await.unwrap().unwrap();
  assert_eq!(fetched, a);
}

#[tokio::test]
async fn list_assignments_filters_by_due_window_and_overdue() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let user = Uuid::new_v4();
  let target = AssignmentTarget::Material(Uuid::new_v4());

  let mut soon = assignment(tenant, user, target);
  soon.due_at = Some(t0() + Duration::days(2));
  let mut late = assignment(tenant, user, target);
  late.due_at = Some(t0() - Duration::days(1));
  let mut late_done = assignment(tenant, user, target);
  late_done.due_at = Some(t0() - Duration::days(1));
  late_done.status = AssignmentStatus::Completed;
  late_done.completed_at = Some(t0());
  let undated = assignment(tenant, Uuid::new_v4(), target);

  for a in [&soon, &late, &late_done, &undated] {
    s.create_assignment(a.clone()).await.unwrap();
  }

  let window = s
    .list_assignments(&AssignmentQuery {
      due_after: Some(t0()),
      due_before: Some(t0() + Duration::days(3)),
      exclude_completed: true,
      ..AssignmentQuery::tenant(tenant)
    })
    .await
    .unwrap();
  assert_eq!(window.len(), 1);
  assert_eq!(window[0].assignment_id, soon.assignment_id);

  let overdue = s
    .list_assignments(&AssignmentQuery {
      overdue_as_of: Some(t0()),
      ..AssignmentQuery::tenant(tenant)
    })
    .await
    .unwrap();
  assert_eq!(overdue.len(), 1);
  assert_eq!(overdue[0].assignment_id, late.assignment_id);

  let for_user = s
    .list_assignments(&AssignmentQuery {
      user_id: Some(user),
      ..AssignmentQuery::tenant(tenant)
    })
    .await
    .unwrap();
  assert_eq!(for_user.len(), 3);
  // Earliest due date first.
  assert_eq!(for_user[2].assignment_id, soon.assignment_id);

  let paged = s
    .list_assignments(&AssignmentQuery {
      limit: Some(2),
      offset: Some(3),
      ..AssignmentQuery::tenant(tenant)
    })
    .await
    .unwrap();
  assert_eq!(paged.len(), 1);
  assert_eq!(paged[0].assignment_id, undated.assignment_id);
}

#[tokio::test]
async fn active_tenants_skip_fully_completed_ones() {
  let s = store().await;
  let busy = Uuid::new_v4();
  let done = Uuid::new_v4();
  let target = AssignmentTarget::Material(Uuid::new_v4());

  s.create_assignment(assignment(busy, Uuid::new_v4(), target)).await.unwrap();
  let mut finished = assignment(done, Uuid::new_v4(), target);
  finished.status = AssignmentStatus::Completed;
  finished.completed_at = Some(t0());
  s.create_assignment(finished).await.unwrap();

  assert_eq!(s.list_active_tenants().await.unwrap(), vec![busy]);
}

#[tokio::test]
async fn role_templates_list_by_role() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let role = Uuid::new_v4();
  let template = RoleAssignment {
    role_assignment_id: Uuid::new_v4(),
    tenant_id: tenant,
    role_id: role,
    target: AssignmentTarget::Course(Uuid::new_v4()),
    is_required: true,
    due_days: Some(30),
    assigned_by: None,
    created_at: t0(),
  };
  s.create_role_assignment(template.clone()).await.unwrap();

  assert_eq!(s.list_role_assignments(tenant, role).await.unwrap(), vec![template]);
  assert!(s.list_role_assignments(tenant, Uuid::new_v4()).await.unwrap().is_empty());
}

// ─── Progress ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn progress_is_unique_per_assignment_and_material() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let material_id = Uuid::new_v4();
  let a = s
    .create_assignment(assignment(tenant, Uuid::new_v4(), AssignmentTarget::Material(material_id)))
    .await
    .unwrap();

  let row = Progress {
    progress_id: Uuid::new_v4(),
    assignment_id: a.assignment_id,
    material_id,
    progress_percentage: 40,
    time_spent_minutes: 10,
    last_position: Some(120),
    completed_at: None,
    created_at: t0(),
    updated_at: t0(),
  };
  s.create_progress(row.clone()).await.unwrap();

  let duplicate = Progress { progress_id: Uuid::new_v4(), ..row.clone() };
  assert!(s.create_progress(duplicate).await.is_err());

  let mut next = row.clone();
  next.progress_percentage = 100;
  next.completed_at = Some(t0());
  assert!(s.update_progress(next.clone()).await.unwrap());

  let fetched = s.get_progress(a.assignment_id, material_id).await.unwrap();
  assert_eq!(fetched, Some(next));
  assert_eq!(s.list_progress(a.assignment_id).await.unwrap().len(), 1);
}

// ─── Quiz ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn questions_list_in_display_order() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let m = s.create_material(material(tenant, "Quiz")).await.unwrap();

  let q2 = s.create_question(question(m.material_id, 2)).await.unwrap();
  let q1 = s.create_question(question(m.material_id, 1)).await.unwrap();

  let bank = s.list_questions(m.material_id).await.unwrap();
  let ids: Vec<Uuid> = bank.iter().map(|q| q.question_id).collect();
  assert_eq!(ids, vec![q1.question_id, q2.question_id]);

  let mut edited = q1.clone();
  edited.correct_index = 1;
  edited.points = 3;
  assert!(s.update_question(tenant, edited.clone()).await.unwrap());
  assert_eq!(s.get_question(tenant, q1.question_id).await.unwrap(), Some(edited));

  assert!(s.delete_question(tenant, q2.question_id).await.unwrap());
  assert_eq!(s.list_questions(m.material_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn questions_are_invisible_to_other_tenants() {
  let s = store().await;
  let owner = Uuid::new_v4();
  let other = Uuid::new_v4();
  let m = s.create_material(material(owner, "Quiz")).await.unwrap();
  let q = s.create_question(question(m.material_id, 1)).await.unwrap();

  assert_eq!(s.get_question(other, q.question_id).await.unwrap(), None);

  let mut edited = q.clone();
  edited.correct_index = 2;
  assert!(!s.update_question(other, edited).await.unwrap());
  assert!(!s.delete_question(other, q.question_id).await.unwrap());

  assert_eq!(s.get_question(owner, q.question_id).await.unwrap(), Some(q));
}

#[tokio::test]
async fn attempts_keep_answers_and_filter() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let material_id = Uuid::new_v4();
  let mut answers = mentor_core::quiz::Answers::new();
  answers.insert(Uuid::new_v4().to_string(), json!("1"));

  let attempt = QuizAttempt {
    attempt_id: Uuid::new_v4(),
    tenant_id: tenant,
    user_id: Uuid::new_v4(),
    material_id,
    assignment_id: Some(Uuid::new_v4()),
    score: 1,
    max_score: Some(2),
    passed: false,
    answers,
    time_spent_minutes: Some(5),
    attempted_at: t0(),
  };
  s.create_attempt(attempt.clone()).await.unwrap();

  assert_eq!(
    s.get_attempt(tenant, attempt.attempt_id).await.unwrap(),
    Some(attempt.clone())
  );

  let by_material = s
    .list_attempts(tenant, &AttemptQuery {
      material_id: Some(material_id),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(by_material, vec![attempt.clone()]);

  let by_other = s
    .list_attempts(tenant, &AttemptQuery {
      material_id: Some(Uuid::new_v4()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(by_other.is_empty());

  let foreign = Uuid::new_v4();
  assert_eq!(s.get_attempt(foreign, attempt.attempt_id).await.unwrap(), None);
  assert!(
    s.list_attempts(foreign, &AttemptQuery::default())
      .await
      .unwrap()
      .is_empty()
  );
}

// ─── Certificates ────────────────────────────────────────────────────────────

fn certificate(tenant_id: Uuid, user_id: Uuid, number: String) -> Certificate {
  Certificate {
    certificate_id: Uuid::new_v4(),
    tenant_id,
    assignment_id: Uuid::new_v4(),
    user_id,
    target: Some(AssignmentTarget::Material(Uuid::new_v4())),
    certificate_number: number,
    issued_at: t0(),
    expires_at: None,
    is_valid: true,
    metadata: Metadata::new(),
  }
}

#[tokio::test]
async fn certificate_numbers_are_unique() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let user = Uuid::new_v4();
  let number = generate_certificate_number();

  let c = s
    .create_certificate(certificate(tenant, user, number.clone()))
    .await
    .unwrap();
  assert!(
    s.create_certificate(certificate(tenant, user, number.clone()))
      .await
      .is_err()
  );

  assert_eq!(s.get_certificate_by_number(&number).await.unwrap(), Some(c.clone()));
  assert_eq!(s.list_certificates(tenant, user).await.unwrap().len(), 1);

  assert!(s.set_certificate_validity(c.certificate_id, false).await.unwrap());
  let revoked = s.get_certificate(c.certificate_id).await.unwrap().unwrap();
  assert!(!revoked.is_valid);
}

// ─── Notifications ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notifications_are_marked_read_by_recipient_only() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let user = Uuid::new_v4();
  let a = s
    .create_assignment(assignment(tenant, user, AssignmentTarget::Material(Uuid::new_v4())))
    .await
    .unwrap();

  let n = s
    .create_notification(Notification {
      notification_id: Uuid::new_v4(),
      tenant_id: tenant,
      assignment_id: a.assignment_id,
      user_id: user,
      kind: NotificationKind::Reminder,
      title: "Training deadline reminder".into(),
      message: "soon".into(),
      sent_at: t0(),
      is_read: false,
      read_at: None,
    })
    .await
    .unwrap();

  assert_eq!(s.list_notifications(user, true).await.unwrap().len(), 1);
  assert!(!s.mark_notification_read(n.notification_id, Uuid::new_v4(), t0()).await.unwrap());
  assert!(s.mark_notification_read(n.notification_id, user, t0()).await.unwrap());

  assert!(s.list_notifications(user, true).await.unwrap().is_empty());
  let all = s.list_notifications(user, false).await.unwrap();
  assert_eq!(all.len(), 1);
  assert!(all[0].is_read);
  assert_eq!(all[0].read_at, Some(t0()));
}

// ─── Analytics ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn user_and_organization_analytics() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let user = Uuid::new_v4();
  let m = s.create_material(material(tenant, "Quiz")).await.unwrap();
  let target = AssignmentTarget::Material(m.material_id);

  let mut done = assignment(tenant, user, target);
  done.status = AssignmentStatus::Completed;
  done.completed_at = Some(t0());
  done.time_spent_minutes = 30;
  let mut late = assignment(tenant, user, target);
  late.status = AssignmentStatus::Overdue;
  late.time_spent_minutes = 10;
  s.create_assignment(done).await.unwrap();
  s.create_assignment(late).await.unwrap();

  for (score, max_score) in [(1, Some(2)), (2, Some(2)), (0, None)] {
    s.create_attempt(QuizAttempt {
      attempt_id: Uuid::new_v4(),
      tenant_id: tenant,
      user_id: user,
      material_id: m.material_id,
      assignment_id: None,
      score,
      max_score,
      passed: false,
      answers: Default::default(),
      time_spent_minutes: None,
      attempted_at: t0(),
    })
    .await
    .unwrap();
  }

  let ua = s.user_analytics(tenant, user).await.unwrap();
  assert_eq!(ua.total_assignments, 2);
  assert_eq!(ua.completed_assignments, 1);
  assert_eq!(ua.overdue_assignments, 1);
  assert_eq!(ua.completion_rate, 50.0);
  assert_eq!(ua.average_time_spent, 20.0);
  assert_eq!(ua.average_score, 75.0);

  let org = s.organization_analytics(tenant).await.unwrap();
  assert_eq!(org.total_materials, 1);
  assert_eq!(org.total_courses, 0);
  assert_eq!(org.total_assignments, 2);
  assert_eq!(org.completion_rate, 50.0);

  let empty = s.user_analytics(tenant, Uuid::new_v4()).await.unwrap();
  assert_eq!(empty.total_assignments, 0);
  assert_eq!(empty.completion_rate, 0.0);
}

#[tokio::test]
async fn course_analytics_scope_to_course_assignments() {
  let s = store().await;
  let tenant = Uuid::new_v4();
  let c = s.create_course(course(tenant, "Onboarding")).await.unwrap();
  let target = AssignmentTarget::Course(c.course_id);

  let mut done = assignment(tenant, Uuid::new_v4(), target);
  done.status = AssignmentStatus::Completed;
  done.completed_at = Some(t0());
  s.create_assignment(done).await.unwrap();
  s.create_assignment(assignment(tenant, Uuid::new_v4(), target)).await.unwrap();
  s.create_assignment(assignment(
    tenant,
    Uuid::new_v4(),
    AssignmentTarget::Material(Uuid::new_v4()),
  ))
  .await
  .unwrap();

  let ca = s.course_analytics(tenant, c.course_id).await.unwrap();
  assert_eq!(ca.total_assignments, 2);
  assert_eq!(ca.completed_assignments, 1);
  assert_eq!(ca.completion_rate, 50.0);
  assert_eq!(ca.average_score, 0.0);
}
