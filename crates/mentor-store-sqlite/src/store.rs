//! [`SqliteStore`]: the SQLite implementation of [`TrainingStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension as _, Row};
use uuid::Uuid;

use mentor_core::{
  analytics::{CourseAnalytics, OrganizationAnalytics, UserAnalytics},
  assignment::{Assignment, RoleAssignment},
  catalog::{Course, CourseMaterial, CourseQuery, Material, MaterialQuery},
  certificate::Certificate,
  notification::Notification,
  progress::Progress,
  quiz::{AttemptQuery, QuizAttempt, QuizQuestion},
  store::{AssignmentQuery, TrainingStore},
};

use crate::{
  Result,
  encode::{
    RawAssignment, RawAttempt, RawCertificate, RawCourse, RawCourseMaterial,
    RawMaterial, RawNotification, RawProgress, RawQuestion, RawRoleAssignment,
    encode_dt, encode_json, encode_opt_dt, encode_opt_uuid, encode_uuid,
    decode_uuid,
  },
  schema::SCHEMA,
};

const COMPLETED: &str = "completed";

/// Restricts a `quiz_questions` row to materials owned by tenant `?2`.
const TENANT_MATERIAL: &str =
  "material_id IN (SELECT material_id FROM materials WHERE tenant_id = ?2)";

/// Run `sql` and collect every row through `map`.
fn query_rows<T>(
  conn: &rusqlite::Connection,
  sql: &str,
  params: impl rusqlite::Params,
  map: impl FnMut(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(params, map)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

/// `LIKE` pattern for a free-text filter.
fn like_pattern(text: Option<&str>) -> Option<String> {
  text
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .map(|t| format!("%{t}%"))
}

/// Completed / total as a percentage; zero for an empty set.
fn completion_rate(completed: u64, total: u64) -> f64 {
  if total == 0 {
    0.0
  } else {
    completed as f64 * 100.0 / total as f64
  }
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A training store backed by a single SQLite file.
///
/// Cloning is cheap: the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, e.g. for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn assignments_by(
    &self,
    sql: String,
    params: Vec<Option<String>>,
  ) -> Result<Vec<Assignment>> {
    let raws: Vec<RawAssignment> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params_from_iter(params),
          RawAssignment::from_row,
        )?)
      })
      .await?;
    raws.into_iter().map(RawAssignment::into_assignment).collect()
  }
}

// ─── TrainingStore impl ──────────────────────────────────────────────────────

impl TrainingStore for SqliteStore {
  type Error = crate::Error;

  // ── Materials ─────────────────────────────────────────────────────────────

  async fn create_material(&self, material: Material) -> Result<Material> {
    let id_str         = encode_uuid(material.material_id);
    let tenant_str     = encode_uuid(material.tenant_id);
    let title          = material.title.clone();
    let description    = material.description.clone();
    let uri            = material.uri.clone();
    let delivery       = material.delivery.to_string();
    let material_type  = material.material_type.to_string();
    let duration       = material.duration_minutes;
    let tags_str       = encode_json(&material.tags)?;
    let is_required    = material.is_required;
    let passing_score  = material.passing_score;
    let attempts_limit = material.attempts_limit;
    let metadata_str   = encode_json(&material.metadata)?;
    let created_by     = encode_opt_uuid(material.created_by);
    let created_str    = encode_dt(material.created_at);
    let updated_str    = encode_dt(material.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO materials (
             material_id, tenant_id, title, description, uri, delivery,
             material_type, duration_minutes, tags, is_required,
             passing_score, attempts_limit, metadata, created_by,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
          rusqlite::params![
            id_str,
            tenant_str,
            title,
            description,
            uri,
            delivery,
            material_type,
            duration,
            tags_str,
            is_required,
            passing_score,
            attempts_limit,
            metadata_str,
            created_by,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(material)
  }

  async fn get_material(
    &self,
    tenant_id: Uuid,
    material_id: Uuid,
  ) -> Result<Option<Material>> {
    let sql = format!(
      "SELECT {} FROM materials WHERE material_id = ?1 AND tenant_id = ?2",
      RawMaterial::COLUMNS
    );
    let id_str     = encode_uuid(material_id);
    let tenant_str = encode_uuid(tenant_id);

    let raw: Option<RawMaterial> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![id_str, tenant_str],
              RawMaterial::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMaterial::into_material).transpose()
  }

  async fn list_materials(
    &self,
    tenant_id: Uuid,
    query: &MaterialQuery,
  ) -> Result<Vec<Material>> {
    let sql = format!(
      "SELECT {} FROM materials
       WHERE tenant_id = ?1
         AND (?2 IS NULL OR material_type = ?2)
         AND (?3 IS NULL OR is_required = ?3)
         AND (?4 IS NULL OR title LIKE ?4 OR description LIKE ?4)
       ORDER BY created_at DESC",
      RawMaterial::COLUMNS
    );
    let tenant_str    = encode_uuid(tenant_id);
    let material_type = query.material_type.map(|t| t.to_string());
    let is_required   = query.is_required;
    let pattern       = like_pattern(query.search.as_deref());

    let raws: Vec<RawMaterial> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params![tenant_str, material_type, is_required, pattern],
          RawMaterial::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawMaterial::into_material).collect()
  }

  async fn update_material(&self, material: Material) -> Result<bool> {
    let id_str         = encode_uuid(material.material_id);
    let tenant_str     = encode_uuid(material.tenant_id);
    let delivery       = material.delivery.to_string();
    let material_type  = material.material_type.to_string();
    let tags_str       = encode_json(&material.tags)?;
    let metadata_str   = encode_json(&material.metadata)?;
    let updated_str    = encode_dt(material.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE materials SET
             title = ?3, description = ?4, uri = ?5, delivery = ?6,
             material_type = ?7, duration_minutes = ?8, tags = ?9,
             is_required = ?10, passing_score = ?11, attempts_limit = ?12,
             metadata = ?13, updated_at = ?14
           WHERE material_id = ?1 AND tenant_id = ?2",
          rusqlite::params![
            id_str,
            tenant_str,
            material.title,
            material.description,
            material.uri,
            delivery,
            material_type,
            material.duration_minutes,
            tags_str,
            material.is_required,
            material.passing_score,
            material.attempts_limit,
            metadata_str,
            updated_str,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_material(&self, tenant_id: Uuid, material_id: Uuid) -> Result<bool> {
    let id_str     = encode_uuid(material_id);
    let tenant_str = encode_uuid(tenant_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM materials WHERE material_id = ?1 AND tenant_id = ?2",
          rusqlite::params![id_str, tenant_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Courses ───────────────────────────────────────────────────────────────

  async fn create_course(&self, course: Course) -> Result<Course> {
    let id_str      = encode_uuid(course.course_id);
    let tenant_str  = encode_uuid(course.tenant_id);
    let title       = course.title.clone();
    let description = course.description.clone();
    let is_active   = course.is_active;
    let created_by  = encode_opt_uuid(course.created_by);
    let created_str = encode_dt(course.created_at);
    let updated_str = encode_dt(course.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO courses (
             course_id, tenant_id, title, description, is_active,
             created_by, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            tenant_str,
            title,
            description,
            is_active,
            created_by,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(course)
  }

  async fn get_course(&self, tenant_id: Uuid, course_id: Uuid) -> Result<Option<Course>> {
    let sql = format!(
      "SELECT {} FROM courses WHERE course_id = ?1 AND tenant_id = ?2",
      RawCourse::COLUMNS
    );
    let id_str     = encode_uuid(course_id);
    let tenant_str = encode_uuid(tenant_id);

    let raw: Option<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str, tenant_str], RawCourse::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCourse::into_course).transpose()
  }

  async fn list_courses(&self, tenant_id: Uuid, query: &CourseQuery) -> Result<Vec<Course>> {
    let sql = format!(
      "SELECT {} FROM courses
       WHERE tenant_id = ?1
         AND (?2 IS NULL OR is_active = ?2)
         AND (?3 IS NULL OR title LIKE ?3 OR description LIKE ?3)
       ORDER BY created_at DESC",
      RawCourse::COLUMNS
    );
    let tenant_str = encode_uuid(tenant_id);
    let is_active  = query.is_active;
    let pattern    = like_pattern(query.search.as_deref());

    let raws: Vec<RawCourse> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params![tenant_str, is_active, pattern],
          RawCourse::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawCourse::into_course).collect()
  }

  async fn update_course(&self, course: Course) -> Result<bool> {
    let id_str      = encode_uuid(course.course_id);
    let tenant_str  = encode_uuid(course.tenant_id);
    let updated_str = encode_dt(course.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE courses SET
             title = ?3, description = ?4, is_active = ?5, updated_at = ?6
           WHERE course_id = ?1 AND tenant_id = ?2",
          rusqlite::params![
            id_str,
            tenant_str,
            course.title,
            course.description,
            course.is_active,
            updated_str,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_course(&self, tenant_id: Uuid, course_id: Uuid) -> Result<bool> {
    let id_str     = encode_uuid(course_id);
    let tenant_str = encode_uuid(tenant_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM courses WHERE course_id = ?1 AND tenant_id = ?2",
          rusqlite::params![id_str, tenant_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn add_course_material(&self, membership: CourseMaterial) -> Result<CourseMaterial> {
    let course_str   = encode_uuid(membership.course_id);
    let material_str = encode_uuid(membership.material_id);
    let order_index  = membership.order_index;
    let is_required  = membership.is_required;
    let created_str  = encode_dt(membership.created_at);
    let select_sql   = format!(
      "SELECT {} FROM course_materials WHERE course_id = ?1 AND material_id = ?2",
      RawCourseMaterial::COLUMNS
    );

    let raw: RawCourseMaterial = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO course_materials (
             course_id, material_id, order_index, is_required, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)
           ON CONFLICT (course_id, material_id) DO UPDATE SET
             order_index = excluded.order_index,
             is_required = excluded.is_required",
          rusqlite::params![course_str, material_str, order_index, is_required, created_str],
        )?;
        let raw = tx.query_row(
          &select_sql,
          rusqlite::params![course_str, material_str],
          RawCourseMaterial::from_row,
        )?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_course_material()
  }

  async fn remove_course_material(&self, course_id: Uuid, material_id: Uuid) -> Result<bool> {
    let course_str   = encode_uuid(course_id);
    let material_str = encode_uuid(material_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM course_materials WHERE course_id = ?1 AND material_id = ?2",
          rusqlite::params![course_str, material_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_course_materials(&self, course_id: Uuid) -> Result<Vec<CourseMaterial>> {
    let sql = format!(
      "SELECT {} FROM course_materials WHERE course_id = ?1
       ORDER BY order_index, created_at",
      RawCourseMaterial::COLUMNS
    );
    let course_str = encode_uuid(course_id);

    let raws: Vec<RawCourseMaterial> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params![course_str],
          RawCourseMaterial::from_row,
        )?)
      })
      .await?;

    raws
      .into_iter()
      .map(RawCourseMaterial::into_course_material)
      .collect()
  }

  // ── Assignments ───────────────────────────────────────────────────────────

  async fn create_assignment(&self, assignment: Assignment) -> Result<Assignment> {
    let id_str        = encode_uuid(assignment.assignment_id);
    let tenant_str    = encode_uuid(assignment.tenant_id);
    let user_str      = encode_uuid(assignment.user_id);
    let material_str  = encode_opt_uuid(assignment.target.material_id());
    let course_str    = encode_opt_uuid(assignment.target.course_id());
    let status        = assignment.status.to_string();
    let due_str       = encode_opt_dt(assignment.due_at);
    let completed_str = encode_opt_dt(assignment.completed_at);
    let assigned_by   = encode_opt_uuid(assignment.assigned_by);
    let priority      = assignment.priority.clone();
    let progress      = assignment.progress_percentage;
    let time_spent    = assignment.time_spent_minutes;
    let accessed_str  = encode_opt_dt(assignment.last_accessed_at);
    let reminded_str  = encode_opt_dt(assignment.reminder_sent_at);
    let metadata_str  = encode_json(&assignment.metadata)?;
    let created_str   = encode_dt(assignment.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO assignments (
             assignment_id, tenant_id, user_id, material_id, course_id,
             status, due_at, completed_at, assigned_by, priority,
             progress_percentage, time_spent_minutes, last_accessed_at,
             reminder_sent_at, metadata, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
          rusqlite::params![
            id_str,
            tenant_str,
            user_str,
            material_str,
            course_str,
            status,
            due_str,
            completed_str,
            assigned_by,
            priority,
            progress,
            time_spent,
            accessed_str,
            reminded_str,
            metadata_str,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(assignment)
  }

  async fn get_assignment(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
  ) -> Result<Option<Assignment>> {
    let sql = format!(
      "SELECT {} FROM assignments WHERE assignment_id = ?1 AND tenant_id = ?2",
      RawAssignment::COLUMNS
    );
    let id_str     = encode_uuid(assignment_id);
    let tenant_str = encode_uuid(tenant_id);

    let raw: Option<RawAssignment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![id_str, tenant_str],
              RawAssignment::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAssignment::into_assignment).transpose()
  }

  async fn update_assignment(&self, assignment: Assignment) -> Result<bool> {
    let id_str        = encode_uuid(assignment.assignment_id);
    let tenant_str    = encode_uuid(assignment.tenant_id);
    let status        = assignment.status.to_string();
    let due_str       = encode_opt_dt(assignment.due_at);
    let completed_str = encode_opt_dt(assignment.completed_at);
    let accessed_str  = encode_opt_dt(assignment.last_accessed_at);
    let reminded_str  = encode_opt_dt(assignment.reminder_sent_at);
    let metadata_str  = encode_json(&assignment.metadata)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE assignments SET
             status = ?3, due_at = ?4, completed_at = ?5, priority = ?6,
             progress_percentage = ?7, time_spent_minutes = ?8,
             last_accessed_at = ?9, reminder_sent_at = ?10, metadata = ?11
           WHERE assignment_id = ?1 AND tenant_id = ?2",
          rusqlite::params![
            id_str,
            tenant_str,
            status,
            due_str,
            completed_str,
            assignment.priority,
            assignment.progress_percentage,
            assignment.time_spent_minutes,
            accessed_str,
            reminded_str,
            metadata_str,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_assignment(&self, tenant_id: Uuid, assignment_id: Uuid) -> Result<bool> {
    let id_str     = encode_uuid(assignment_id);
    let tenant_str = encode_uuid(tenant_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM assignments WHERE assignment_id = ?1 AND tenant_id = ?2",
          rusqlite::params![id_str, tenant_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_assignments(&self, query: &AssignmentQuery) -> Result<Vec<Assignment>> {
    let sql = format!(
      "SELECT {} FROM assignments
       WHERE tenant_id = ?1
         AND (?2 IS NULL OR user_id = ?2)
         AND (?3 IS NULL OR status = ?3)
         AND (?4 IS NULL OR course_id = ?4)
         AND (?5 IS NULL OR material_id = ?5)
         AND (?6 IS NULL OR (due_at IS NOT NULL AND due_at <= ?6))
         AND (?7 IS NULL OR (due_at IS NOT NULL AND due_at >= ?7))
         AND (?8 IS NULL OR (status != '{COMPLETED}' AND due_at IS NOT NULL AND due_at < ?8))
         AND (?9 IS NULL OR status != '{COMPLETED}')
       ORDER BY due_at IS NULL, due_at, created_at
       LIMIT {} OFFSET {}",
      RawAssignment::COLUMNS,
      query.limit.map_or(-1, |l| l as i64),
      query.offset.unwrap_or(0) as i64,
    );

    let params = vec![
      Some(encode_uuid(query.tenant_id)),
      encode_opt_uuid(query.user_id),
      query.status.map(|s| s.to_string()),
      encode_opt_uuid(query.course_id),
      encode_opt_uuid(query.material_id),
      encode_opt_dt(query.due_before),
      encode_opt_dt(query.due_after),
      encode_opt_dt(query.overdue_as_of),
      query.exclude_completed.then(|| "1".to_owned()),
    ];

    self.assignments_by(sql, params).await
  }

  async fn list_active_tenants(&self) -> Result<Vec<Uuid>> {
    let raws: Vec<String> = self
      .conn
      .call(|conn| {
        Ok(query_rows(
          conn,
          "SELECT DISTINCT tenant_id FROM assignments
           WHERE status != ?1 ORDER BY tenant_id",
          rusqlite::params![COMPLETED],
          |row| row.get(0),
        )?)
      })
      .await?;

    raws.iter().map(String::as_str).map(decode_uuid).collect()
  }

  // ── Role templates ────────────────────────────────────────────────────────

  async fn create_role_assignment(&self, template: RoleAssignment) -> Result<RoleAssignment> {
    let id_str       = encode_uuid(template.role_assignment_id);
    let tenant_str   = encode_uuid(template.tenant_id);
    let role_str     = encode_uuid(template.role_id);
    let material_str = encode_opt_uuid(template.target.material_id());
    let course_str   = encode_opt_uuid(template.target.course_id());
    let is_required  = template.is_required;
    let due_days     = template.due_days;
    let assigned_by  = encode_opt_uuid(template.assigned_by);
    let created_str  = encode_dt(template.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO role_assignments (
             role_assignment_id, tenant_id, role_id, material_id, course_id,
             is_required, due_days, assigned_by, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            tenant_str,
            role_str,
            material_str,
            course_str,
            is_required,
            due_days,
            assigned_by,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(template)
  }

  async fn list_role_assignments(
    &self,
    tenant_id: Uuid,
    role_id: Uuid,
  ) -> Result<Vec<RoleAssignment>> {
    let sql = format!(
      "SELECT {} FROM role_assignments WHERE tenant_id = ?1 AND role_id = ?2
       ORDER BY created_at",
      RawRoleAssignment::COLUMNS
    );
    let tenant_str = encode_uuid(tenant_id);
    let role_str   = encode_uuid(role_id);

    let raws: Vec<RawRoleAssignment> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params![tenant_str, role_str],
          RawRoleAssignment::from_row,
        )?)
      })
      .await?;

    raws
      .into_iter()
      .map(RawRoleAssignment::into_role_assignment)
      .collect()
  }

  // ── Progress ──────────────────────────────────────────────────────────────

  async fn create_progress(&self, progress: Progress) -> Result<Progress> {
    let id_str        = encode_uuid(progress.progress_id);
    let assignment    = encode_uuid(progress.assignment_id);
    let material      = encode_uuid(progress.material_id);
    let percentage    = progress.progress_percentage;
    let time_spent    = progress.time_spent_minutes;
    let last_position = progress.last_position;
    let completed_str = encode_opt_dt(progress.completed_at);
    let created_str   = encode_dt(progress.created_at);
    let updated_str   = encode_dt(progress.updated_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO progress (
             progress_id, assignment_id, material_id, progress_percentage,
             time_spent_minutes, last_position, completed_at, created_at,
             updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            id_str,
            assignment,
            material,
            percentage,
            time_spent,
            last_position,
            completed_str,
            created_str,
            updated_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(progress)
  }

  async fn update_progress(&self, progress: Progress) -> Result<bool> {
    let id_str        = encode_uuid(progress.progress_id);
    let completed_str = encode_opt_dt(progress.completed_at);
    let updated_str   = encode_dt(progress.updated_at);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE progress SET
             progress_percentage = ?2, time_spent_minutes = ?3,
             last_position = ?4, completed_at = ?5, updated_at = ?6
           WHERE progress_id = ?1",
          rusqlite::params![
            id_str,
            progress.progress_percentage,
            progress.time_spent_minutes,
            progress.last_position,
            completed_str,
            updated_str,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn get_progress(
    &self,
    assignment_id: Uuid,
    material_id: Uuid,
  ) -> Result<Option<Progress>> {
    let sql = format!(
      "SELECT {} FROM progress WHERE assignment_id = ?1 AND material_id = ?2",
      RawProgress::COLUMNS
    );
    let assignment = encode_uuid(assignment_id);
    let material   = encode_uuid(material_id);

    let raw: Option<RawProgress> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![assignment, material],
              RawProgress::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawProgress::into_progress).transpose()
  }

  async fn list_progress(&self, assignment_id: Uuid) -> Result<Vec<Progress>> {
    let sql = format!(
      "SELECT {} FROM progress WHERE assignment_id = ?1 ORDER BY created_at",
      RawProgress::COLUMNS
    );
    let assignment = encode_uuid(assignment_id);

    let raws: Vec<RawProgress> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params![assignment],
          RawProgress::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawProgress::into_progress).collect()
  }

  // ── Quiz ──────────────────────────────────────────────────────────────────

  async fn create_question(&self, question: QuizQuestion) -> Result<QuizQuestion> {
    let id_str        = encode_uuid(question.question_id);
    let material_str  = encode_uuid(question.material_id);
    let text          = question.text.clone();
    let options_str   = encode_json(&question.options)?;
    let correct_index = question.correct_index;
    let question_type = question.question_type.to_string();
    let points        = question.points;
    let explanation   = question.explanation.clone();
    let order_index   = question.order_index;
    let created_str   = encode_dt(question.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO quiz_questions (
             question_id, material_id, text, options, correct_index,
             question_type, points, explanation, order_index, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            material_str,
            text,
            options_str,
            correct_index,
            question_type,
            points,
            explanation,
            order_index,
            created_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(question)
  }

  async fn get_question(
    &self,
    tenant_id: Uuid,
    question_id: Uuid,
  ) -> Result<Option<QuizQuestion>> {
    let sql = format!(
      "SELECT {} FROM quiz_questions WHERE question_id = ?1 AND {TENANT_MATERIAL}",
      RawQuestion::COLUMNS
    );
    let id_str     = encode_uuid(question_id);
    let tenant_str = encode_uuid(tenant_id);

    let raw: Option<RawQuestion> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &sql,
              rusqlite::params![id_str, tenant_str],
              RawQuestion::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawQuestion::into_question).transpose()
  }

  async fn list_questions(&self, material_id: Uuid) -> Result<Vec<QuizQuestion>> {
    let sql = format!(
      "SELECT {} FROM quiz_questions WHERE material_id = ?1
       ORDER BY order_index, created_at",
      RawQuestion::COLUMNS
    );
    let material_str = encode_uuid(material_id);

    let raws: Vec<RawQuestion> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params![material_str],
          RawQuestion::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawQuestion::into_question).collect()
  }

  async fn update_question(&self, tenant_id: Uuid, question: QuizQuestion) -> Result<bool> {
    let sql = format!(
      "UPDATE quiz_questions SET
         text = ?3, options = ?4, correct_index = ?5, question_type = ?6,
         points = ?7, explanation = ?8, order_index = ?9
       WHERE question_id = ?1 AND {TENANT_MATERIAL}"
    );
    let id_str        = encode_uuid(question.question_id);
    let tenant_str    = encode_uuid(tenant_id);
    let options_str   = encode_json(&question.options)?;
    let question_type = question.question_type.to_string();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &sql,
          rusqlite::params![
            id_str,
            tenant_str,
            question.text,
            options_str,
            question.correct_index,
            question_type,
            question.points,
            question.explanation,
            question.order_index,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn delete_question(&self, tenant_id: Uuid, question_id: Uuid) -> Result<bool> {
    let sql =
      format!("DELETE FROM quiz_questions WHERE question_id = ?1 AND {TENANT_MATERIAL}");
    let id_str     = encode_uuid(question_id);
    let tenant_str = encode_uuid(tenant_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(&sql, rusqlite::params![id_str, tenant_str])?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn create_attempt(&self, attempt: QuizAttempt) -> Result<QuizAttempt> {
    let id_str         = encode_uuid(attempt.attempt_id);
    let tenant_str     = encode_uuid(attempt.tenant_id);
    let user_str       = encode_uuid(attempt.user_id);
    let material_str   = encode_uuid(attempt.material_id);
    let assignment_str = encode_opt_uuid(attempt.assignment_id);
    let score          = attempt.score;
    let max_score      = attempt.max_score;
    let passed         = attempt.passed;
    let answers_str    = encode_json(&attempt.answers)?;
    let time_spent     = attempt.time_spent_minutes;
    let attempted_str  = encode_dt(attempt.attempted_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO quiz_attempts (
             attempt_id, tenant_id, user_id, material_id, assignment_id,
             score, max_score, passed, answers, time_spent_minutes, attempted_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            id_str,
            tenant_str,
            user_str,
            material_str,
            assignment_str,
            score,
            max_score,
            passed,
            answers_str,
            time_spent,
            attempted_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(attempt)
  }

  async fn get_attempt(
    &self,
    tenant_id: Uuid,
    attempt_id: Uuid,
  ) -> Result<Option<QuizAttempt>> {
    let sql = format!(
      "SELECT {} FROM quiz_attempts WHERE attempt_id = ?1 AND tenant_id = ?2",
      RawAttempt::COLUMNS
    );
    let id_str     = encode_uuid(attempt_id);
    let tenant_str = encode_uuid(tenant_id);

    let raw: Option<RawAttempt> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str, tenant_str], RawAttempt::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawAttempt::into_attempt).transpose()
  }

  async fn list_attempts(
    &self,
    tenant_id: Uuid,
    query: &AttemptQuery,
  ) -> Result<Vec<QuizAttempt>> {
    let sql = format!(
      "SELECT {} FROM quiz_attempts
       WHERE tenant_id = ?1
         AND (?2 IS NULL OR assignment_id = ?2)
         AND (?3 IS NULL OR material_id = ?3)
       ORDER BY attempted_at DESC",
      RawAttempt::COLUMNS
    );
    let tenant_str     = encode_uuid(tenant_id);
    let assignment_str = encode_opt_uuid(query.assignment_id);
    let material_str   = encode_opt_uuid(query.material_id);

    let raws: Vec<RawAttempt> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params![tenant_str, assignment_str, material_str],
          RawAttempt::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawAttempt::into_attempt).collect()
  }

  // ── Certificates ──────────────────────────────────────────────────────────

  async fn create_certificate(&self, certificate: Certificate) -> Result<Certificate> {
    let id_str         = encode_uuid(certificate.certificate_id);
    let tenant_str     = encode_uuid(certificate.tenant_id);
    let assignment_str = encode_uuid(certificate.assignment_id);
    let user_str       = encode_uuid(certificate.user_id);
    let material_str   = encode_opt_uuid(certificate.target.and_then(|t| t.material_id()));
    let course_str     = encode_opt_uuid(certificate.target.and_then(|t| t.course_id()));
    let number         = certificate.certificate_number.clone();
    let issued_str     = encode_dt(certificate.issued_at);
    let expires_str    = encode_opt_dt(certificate.expires_at);
    let is_valid       = certificate.is_valid;
    let metadata_str   = encode_json(&certificate.metadata)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO certificates (
             certificate_id, tenant_id, assignment_id, user_id, material_id,
             course_id, certificate_number, issued_at, expires_at, is_valid,
             metadata
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
          rusqlite::params![
            id_str,
            tenant_str,
            assignment_str,
            user_str,
            material_str,
            course_str,
            number,
            issued_str,
            expires_str,
            is_valid,
            metadata_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(certificate)
  }

  async fn get_certificate(&self, certificate_id: Uuid) -> Result<Option<Certificate>> {
    let sql = format!(
      "SELECT {} FROM certificates WHERE certificate_id = ?1",
      RawCertificate::COLUMNS
    );
    let id_str = encode_uuid(certificate_id);

    let raw: Option<RawCertificate> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawCertificate::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCertificate::into_certificate).transpose()
  }

  async fn get_certificate_by_number(&self, number: &str) -> Result<Option<Certificate>> {
    let sql = format!(
      "SELECT {} FROM certificates WHERE certificate_number = ?1",
      RawCertificate::COLUMNS
    );
    let number = number.to_owned();

    let raw: Option<RawCertificate> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![number], RawCertificate::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCertificate::into_certificate).transpose()
  }

  async fn list_certificates(&self, tenant_id: Uuid, user_id: Uuid) -> Result<Vec<Certificate>> {
    let sql = format!(
      "SELECT {} FROM certificates WHERE tenant_id = ?1 AND user_id = ?2
       ORDER BY issued_at DESC",
      RawCertificate::COLUMNS
    );
    let tenant_str = encode_uuid(tenant_id);
    let user_str   = encode_uuid(user_id);

    let raws: Vec<RawCertificate> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params![tenant_str, user_str],
          RawCertificate::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawCertificate::into_certificate).collect()
  }

  async fn set_certificate_validity(&self, certificate_id: Uuid, is_valid: bool) -> Result<bool> {
    let id_str = encode_uuid(certificate_id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE certificates SET is_valid = ?2 WHERE certificate_id = ?1",
          rusqlite::params![id_str, is_valid],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Notifications ─────────────────────────────────────────────────────────

  async fn create_notification(&self, notification: Notification) -> Result<Notification> {
    let id_str         = encode_uuid(notification.notification_id);
    let tenant_str     = encode_uuid(notification.tenant_id);
    let assignment_str = encode_uuid(notification.assignment_id);
    let user_str       = encode_uuid(notification.user_id);
    let kind           = notification.kind.to_string();
    let title          = notification.title.clone();
    let message        = notification.message.clone();
    let sent_str       = encode_dt(notification.sent_at);
    let is_read        = notification.is_read;
    let read_str       = encode_opt_dt(notification.read_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO notifications (
             notification_id, tenant_id, assignment_id, user_id, kind,
             title, message, sent_at, is_read, read_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            tenant_str,
            assignment_str,
            user_str,
            kind,
            title,
            message,
            sent_str,
            is_read,
            read_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(notification)
  }

  async fn list_notifications(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
    let sql = format!(
      "SELECT {} FROM notifications
       WHERE user_id = ?1 AND (?2 = 0 OR is_read = 0)
       ORDER BY sent_at DESC",
      RawNotification::COLUMNS
    );
    let user_str = encode_uuid(user_id);

    let raws: Vec<RawNotification> = self
      .conn
      .call(move |conn| {
        Ok(query_rows(
          conn,
          &sql,
          rusqlite::params![user_str, unread_only],
          RawNotification::from_row,
        )?)
      })
      .await?;

    raws.into_iter().map(RawNotification::into_notification).collect()
  }

  async fn mark_notification_read(
    &self,
    notification_id: Uuid,
    user_id: Uuid,
    read_at: DateTime<Utc>,
  ) -> Result<bool> {
    let id_str   = encode_uuid(notification_id);
    let user_str = encode_uuid(user_id);
    let read_str = encode_dt(read_at);

    // A second read keeps the first timestamp.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE notifications SET is_read = 1, read_at = COALESCE(read_at, ?3)
           WHERE notification_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, user_str, read_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  // ── Analytics ─────────────────────────────────────────────────────────────

  async fn user_analytics(&self, tenant_id: Uuid, user_id: Uuid) -> Result<UserAnalytics> {
    let tenant_str = encode_uuid(tenant_id);
    let user_str   = encode_uuid(user_id);

    let (total, completed, overdue, avg_time, avg_score): (i64, i64, i64, f64, f64) = self
      .conn
      .call(move |conn| {
        let (total, completed, overdue, avg_time) = conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(status = 'completed'), 0),
                  COALESCE(SUM(status = 'overdue'), 0),
                  COALESCE(AVG(time_spent_minutes), 0.0)
           FROM assignments WHERE tenant_id = ?1 AND user_id = ?2",
          rusqlite::params![tenant_str, user_str],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;
        let avg_score: f64 = conn.query_row(
          "SELECT COALESCE(AVG(score * 100.0 / max_score), 0.0)
           FROM quiz_attempts
           WHERE tenant_id = ?1 AND user_id = ?2 AND max_score > 0",
          rusqlite::params![tenant_str, user_str],
          |row| row.get(0),
        )?;
        Ok((total, completed, overdue, avg_time, avg_score))
      })
      .await?;

    let total_assignments     = total.unsigned_abs();
    let completed_assignments = completed.unsigned_abs();

    Ok(UserAnalytics {
      user_id,
      total_assignments,
      completed_assignments,
      overdue_assignments: overdue.unsigned_abs(),
      completion_rate: completion_rate(completed_assignments, total_assignments),
      average_time_spent: avg_time,
      average_score: avg_score,
    })
  }

  async fn course_analytics(&self, tenant_id: Uuid, course_id: Uuid) -> Result<CourseAnalytics> {
    let tenant_str = encode_uuid(tenant_id);
    let course_str = encode_uuid(course_id);

    let (total, completed, avg_time, avg_score): (i64, i64, f64, f64) = self
      .conn
      .call(move |conn| {
        let (total, completed, avg_time) = conn.query_row(
          "SELECT COUNT(*),
                  COALESCE(SUM(status = 'completed'), 0),
                  COALESCE(AVG(time_spent_minutes), 0.0)
           FROM assignments WHERE tenant_id = ?1 AND course_id = ?2",
          rusqlite::params![tenant_str, course_str],
          |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )?;
        let avg_score: f64 = conn.query_row(
          "SELECT COALESCE(AVG(score * 100.0 / max_score), 0.0)
           FROM quiz_attempts
           WHERE max_score > 0
             AND material_id IN (
               SELECT material_id FROM course_materials WHERE course_id = ?1
             )",
          rusqlite::params![course_str],
          |row| row.get(0),
        )?;
        Ok((total, completed, avg_time, avg_score))
      })
      .await?;

    let total_assignments     = total.unsigned_abs();
    let completed_assignments = completed.unsigned_abs();

    Ok(CourseAnalytics {
      course_id,
      total_assignments,
      completed_assignments,
      completion_rate: completion_rate(completed_assignments, total_assignments),
      average_time_spent: avg_time,
      average_score: avg_score,
    })
  }

  async fn organization_analytics(&self, tenant_id: Uuid) -> Result<OrganizationAnalytics> {
    let tenant_str = encode_uuid(tenant_id);

    let (materials, courses, total, completed, overdue, avg_time): (i64, i64, i64, i64, i64, f64) =
      self
        .conn
        .call(move |conn| {
          Ok(conn.query_row(
            "SELECT
               (SELECT COUNT(*) FROM materials WHERE tenant_id = ?1),
               (SELECT COUNT(*) FROM courses   WHERE tenant_id = ?1),
               COUNT(*),
               COALESCE(SUM(status = 'completed'), 0),
               COALESCE(SUM(status = 'overdue'), 0),
               COALESCE(AVG(time_spent_minutes), 0.0)
             FROM assignments WHERE tenant_id = ?1",
            rusqlite::params![tenant_str],
            |row| {
              Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
              ))
            },
          )?)
        })
        .await?;

    let total_assignments     = total.unsigned_abs();
    let completed_assignments = completed.unsigned_abs();

    Ok(OrganizationAnalytics {
      tenant_id,
      total_materials: materials.unsigned_abs(),
      total_courses: courses.unsigned_abs(),
      total_assignments,
      completed_assignments,
      overdue_assignments: overdue.unsigned_abs(),
      completion_rate: completion_rate(completed_assignments, total_assignments),
      average_time_spent: avg_time,
    })
  }
}
