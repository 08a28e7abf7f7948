//! HTTP server and background reminder sweep for Mentor.
//!
//! Wires a [`TrainingEngine`] into the JSON API under `/api` and runs the
//! reminder sweep over every active tenant on a fixed interval.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use mentor_core::store::TrainingStore;
use mentor_engine::{ReminderReport, TrainingEngine};
use serde::Deserialize;
use tokio::{task::JoinSet, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `mentor.toml` and
/// `MENTOR_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                   String,
  #[serde(default = "default_port")]
  pub port:                   u16,
  #[serde(default = "default_store_path")]
  pub store_path:             PathBuf,
  /// Seconds between reminder sweeps; `0` disables the background sweep.
  #[serde(default = "default_reminder_interval")]
  pub reminder_interval_secs: u64,
}

fn default_host() -> String { "127.0.0.1".into() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/mentor/mentor.db") }

fn default_reminder_interval() -> u64 { 3600 }

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router: the API under `/api`, a `/health`
/// probe, and request tracing.
pub fn router<S>(engine: Arc<TrainingEngine<S>>) -> Router
where
  S: TrainingStore + 'static,
{
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", mentor_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}

// ─── Reminder sweep ───────────────────────────────────────────────────────────

/// Run one reminder sweep per active tenant, concurrently. A failing tenant
/// is logged and does not stop the others.
pub async fn sweep_all_tenants<S>(
  engine: &Arc<TrainingEngine<S>>,
) -> mentor_engine::Result<ReminderReport>
where
  S: TrainingStore + 'static,
{
  let tenants = engine.active_tenants().await?;

  let mut set = JoinSet::new();
  for tenant_id in tenants {
    let engine = Arc::clone(engine);
    set.spawn(async move { (tenant_id, engine.send_reminders(tenant_id).await) });
  }

  let mut total = ReminderReport::default();
  while let Some(joined) = set.join_next().await {
    match joined {
      Ok((_, Ok(report))) => {
        total.sent += report.sent;
        total.skipped += report.skipped;
      }
      Ok((tenant_id, Err(e))) => error!(%tenant_id, error = %e, "reminder sweep failed"),
      Err(e) => error!(error = %e, "reminder task panicked"),
    }
  }
  Ok(total)
}

/// Sweep every `interval` forever. The first sweep runs immediately.
pub async fn run_reminder_loop<S>(engine: Arc<TrainingEngine<S>>, interval: Duration)
where
  S: TrainingStore + 'static,
{
  let mut ticker = tokio::time::interval(interval);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
  loop {
    ticker.tick().await;
    match sweep_all_tenants(&engine).await {
      Ok(report) => info!(sent = report.sent, skipped = report.skipped, "reminder sweep complete"),
      Err(e) => error!(error = %e, "reminder sweep failed"),
    }
  }
}

#[cfg(test)]
mod tests {
  use axum::{body::Body, http::Request};
  use chrono::{Duration as ChronoDuration, TimeZone, Utc};
  use mentor_engine::AssignRequest;
  use mentor_store_sqlite::SqliteStore;
  use serde_json::json;
  use tower::ServiceExt;
  use uuid::Uuid;

  use super::*;

  async fn engine() -> Arc<TrainingEngine<SqliteStore>> {
    let store = SqliteStore::open_in_memory()
      .await
      .expect("in-memory store");
    Arc::new(
      TrainingEngine::new(Arc::new(store))
        .with_clock(|| Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()),
    )
  }

  #[test]
  fn config_defaults_fill_missing_keys() {
    let cfg: ServerConfig = serde_json::from_value(json!({ "port": 9000 })).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.reminder_interval_secs, 3600);
  }

  #[tokio::test]
  async fn health_and_api_are_mounted() {
    let app = router(engine().await);

    let resp = app
      .clone()
      .oneshot(Request::get("/health").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let resp = app
      .oneshot(
        Request::get("/api/materials")
          .header("x-tenant-id", Uuid::new_v4().to_string())
          .body(Body::empty())
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(resp.status().as_u16(), 200);
  }

  #[tokio::test]
  async fn sweep_visits_every_active_tenant() {
    let engine = engine().await;
    let due = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap() + ChronoDuration::days(1);

    for _ in 0..2 {
      let tenant = Uuid::new_v4();
      let course = engine
        .create_course(
          tenant,
          mentor_engine::NewCourse {
            title:       "Ethics".into(),
            description: None,
            is_active:   true,
          },
          None,
        )
        .await
        .unwrap();
      engine
        .assign_course(
          tenant,
          AssignRequest {
            target_id: course.course_id,
            user_ids:  vec![Uuid::new_v4()],
            due_at:    Some(due),
            priority:  String::new(),
            metadata:  Default::default(),
          },
          None,
        )
        .await
        .unwrap();
    }

    let report = sweep_all_tenants(&engine).await.unwrap();
    assert_eq!(report.sent, 2);

    let again = sweep_all_tenants(&engine).await.unwrap();
    assert_eq!(again.sent, 0);
    assert_eq!(again.skipped, 2);
  }
}
