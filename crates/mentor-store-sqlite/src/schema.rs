//! SQL schema for the Mentor SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Timestamps are fixed-width RFC 3339 strings (microseconds, `Z` suffix), so
/// plain string comparison orders them chronologically.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS materials (
    material_id      TEXT PRIMARY KEY,
    tenant_id        TEXT NOT NULL,
    title            TEXT NOT NULL,
    description      TEXT,
    uri              TEXT NOT NULL,
    delivery         TEXT NOT NULL,   -- 'file' | 'link' | 'video'
    material_type    TEXT NOT NULL,
    duration_minutes INTEGER,
    tags             TEXT NOT NULL DEFAULT '[]',
    is_required      INTEGER NOT NULL DEFAULT 0,
    passing_score    INTEGER NOT NULL DEFAULT 0,
    attempts_limit   INTEGER,
    metadata         TEXT NOT NULL DEFAULT '{}',
    created_by       TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS courses (
    course_id   TEXT PRIMARY KEY,
    tenant_id   TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT,
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_by  TEXT,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS course_materials (
    course_id   TEXT NOT NULL REFERENCES courses(course_id) ON DELETE CASCADE,
    material_id TEXT NOT NULL REFERENCES materials(material_id) ON DELETE CASCADE,
    order_index INTEGER NOT NULL DEFAULT 0,
    is_required INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL,
    PRIMARY KEY (course_id, material_id)
);

-- Targets are soft references: deleting a material or course leaves its
-- assignments in place.
CREATE TABLE IF NOT EXISTS assignments (
    assignment_id       TEXT PRIMARY KEY,
    tenant_id           TEXT NOT NULL,
    user_id             TEXT NOT NULL,
    material_id         TEXT,
    course_id           TEXT,
    status              TEXT NOT NULL,   -- 'assigned' | 'in_progress' | 'completed' | 'overdue'
    due_at              TEXT,
    completed_at        TEXT,
    assigned_by         TEXT,
    priority            TEXT NOT NULL DEFAULT 'normal',
    progress_percentage INTEGER NOT NULL DEFAULT 0,
    time_spent_minutes  INTEGER NOT NULL DEFAULT 0,
    last_accessed_at    TEXT,
    reminder_sent_at    TEXT,
    metadata            TEXT NOT NULL DEFAULT '{}',
    created_at          TEXT NOT NULL,
    CHECK ((material_id IS NULL) != (course_id IS NULL)),
    CHECK (progress_percentage BETWEEN 0 AND 100)
);

CREATE TABLE IF NOT EXISTS role_assignments (
    role_assignment_id TEXT PRIMARY KEY,
    tenant_id          TEXT NOT NULL,
    role_id            TEXT NOT NULL,
    material_id        TEXT,
    course_id          TEXT,
    is_required        INTEGER NOT NULL DEFAULT 1,
    due_days           INTEGER,
    assigned_by        TEXT,
    created_at         TEXT NOT NULL,
    CHECK ((material_id IS NULL) != (course_id IS NULL))
);

CREATE TABLE IF NOT EXISTS progress (
    progress_id         TEXT PRIMARY KEY,
    assignment_id       TEXT NOT NULL REFERENCES assignments(assignment_id) ON DELETE CASCADE,
    material_id         TEXT NOT NULL,
    progress_percentage INTEGER NOT NULL DEFAULT 0,
    time_spent_minutes  INTEGER NOT NULL DEFAULT 0,
    last_position       INTEGER,
    completed_at        TEXT,
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL,
    UNIQUE (assignment_id, material_id)
);

CREATE TABLE IF NOT EXISTS quiz_questions (
    question_id   TEXT PRIMARY KEY,
    material_id   TEXT NOT NULL REFERENCES materials(material_id) ON DELETE CASCADE,
    text          TEXT NOT NULL,
    options       TEXT NOT NULL DEFAULT 'null',   -- opaque JSON
    correct_index INTEGER NOT NULL,
    question_type TEXT NOT NULL,
    points        INTEGER NOT NULL DEFAULT 1,
    explanation   TEXT,
    order_index   INTEGER NOT NULL DEFAULT 0,
    created_at    TEXT NOT NULL
);

-- Attempts are append-only and may name an assignment that does not exist.
CREATE TABLE IF NOT EXISTS quiz_attempts (
    attempt_id         TEXT PRIMARY KEY,
    tenant_id          TEXT NOT NULL,
    user_id            TEXT NOT NULL,
    material_id        TEXT NOT NULL,
    assignment_id      TEXT,
    score              INTEGER NOT NULL,
    max_score          INTEGER,
    passed             INTEGER NOT NULL,
    answers            TEXT NOT NULL DEFAULT '{}',
    time_spent_minutes INTEGER,
    attempted_at       TEXT NOT NULL
);

-- Certificates outlive their assignment; no foreign key.
CREATE TABLE IF NOT EXISTS certificates (
    certificate_id     TEXT PRIMARY KEY,
    tenant_id          TEXT NOT NULL,
    assignment_id      TEXT NOT NULL,
    user_id            TEXT NOT NULL,
    material_id        TEXT,
    course_id          TEXT,
    certificate_number TEXT NOT NULL UNIQUE,
    issued_at          TEXT NOT NULL,
    expires_at         TEXT,
    is_valid           INTEGER NOT NULL DEFAULT 1,
    metadata           TEXT NOT NULL DEFAULT '{}'
);

CREATE TABLE IF NOT EXISTS notifications (
    notification_id TEXT PRIMARY KEY,
    tenant_id       TEXT NOT NULL,
    assignment_id   TEXT NOT NULL REFERENCES assignments(assignment_id) ON DELETE CASCADE,
    user_id         TEXT NOT NULL,
    kind            TEXT NOT NULL,   -- 'assignment' | 'reminder' | 'deadline' | 'completion'
    title           TEXT NOT NULL,
    message         TEXT NOT NULL,
    sent_at         TEXT NOT NULL,
    is_read         INTEGER NOT NULL DEFAULT 0,
    read_at         TEXT
);

CREATE INDEX IF NOT EXISTS materials_tenant_idx       ON materials(tenant_id);
CREATE INDEX IF NOT EXISTS courses_tenant_idx         ON courses(tenant_id);
CREATE INDEX IF NOT EXISTS assignments_tenant_idx     ON assignments(tenant_id, status);
CREATE INDEX IF NOT EXISTS assignments_user_idx       ON assignments(user_id);
CREATE INDEX IF NOT EXISTS assignments_due_idx        ON assignments(due_at);
CREATE INDEX IF NOT EXISTS role_assignments_role_idx  ON role_assignments(tenant_id, role_id);
CREATE INDEX IF NOT EXISTS quiz_questions_material_idx ON quiz_questions(material_id);
CREATE INDEX IF NOT EXISTS quiz_attempts_material_idx ON quiz_attempts(tenant_id, material_id);
CREATE INDEX IF NOT EXISTS certificates_user_idx      ON certificates(tenant_id, user_id);
CREATE INDEX IF NOT EXISTS notifications_user_idx     ON notifications(user_id, is_read);

PRAGMA user_version = 1;
";
