//! Certificate issue, lookup and revocation.

use mentor_core::{
  Metadata,
  certificate::{Certificate, generate_certificate_number, is_certificate_number},
  store::TrainingStore,
};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::{Error, Result, TrainingEngine};

impl<S: TrainingStore> TrainingEngine<S> {
  /// Issue a certificate for a completed assignment.
  ///
  /// Repeated calls issue additional certificates, each with its own number.
  pub async fn issue_certificate(
    &self,
    tenant_id: Uuid,
    assignment_id: Uuid,
    issued_by: Option<Uuid>,
  ) -> Result<Certificate> {
    let assignment = self.require_assignment(tenant_id, assignment_id).await?;
    if !assignment.status.is_completed() {
      return Err(Error::Precondition("assignment is not completed".into()));
    }

    let mut metadata = Metadata::new();
    metadata.insert(
      "generated_by".into(),
      issued_by.map_or(Value::Null, |id| Value::String(id.to_string())),
    );

    let certificate = Certificate {
      certificate_id: Uuid::new_v4(),
      tenant_id,
      assignment_id,
      user_id: assignment.user_id,
      target: Some(assignment.target),
      certificate_number: generate_certificate_number(),
      issued_at: self.now(),
      expires_at: None,
      is_valid: true,
      metadata,
    };
    let certificate = self
      .store
      .create_certificate(certificate)
      .await
      .map_err(Error::store("failed to create certificate"))?;

    info!(
      %assignment_id,
      user_id = %certificate.user_id,
      number = %certificate.certificate_number,
      "certificate issued"
    );
    Ok(certificate)
  }

  /// Look up a certificate by its public number and check it is still
  /// valid. Not tenant-scoped: numbers are globally unique.
  pub async fn validate_certificate(&self, number: &str) -> Result<Certificate> {
    if !is_certificate_number(number) {
      return Err(Error::not_found("certificate", number));
    }
    let certificate = self
      .store
      .get_certificate_by_number(number)
      .await
      .map_err(Error::store("failed to get certificate"))?
      .ok_or_else(|| Error::not_found("certificate", number))?;

    if !certificate.is_valid {
      return Err(Error::Precondition("certificate is invalid".into()));
    }
    Ok(certificate)
  }

  pub async fn get_certificate(
    &self,
    tenant_id: Uuid,
    certificate_id: Uuid,
  ) -> Result<Certificate> {
    self
      .store
      .get_certificate(certificate_id)
      .await
      .map_err(Error::store("failed to get certificate"))?
      .filter(|c| c.tenant_id == tenant_id)
      .ok_or_else(|| Error::not_found("certificate", certificate_id))
  }

  pub async fn list_certificates(
    &self,
    tenant_id: Uuid,
    user_id: Uuid,
  ) -> Result<Vec<Certificate>> {
    self
      .store
      .list_certificates(tenant_id, user_id)
      .await
      .map_err(Error::store("failed to list certificates"))
  }

  /// Mark a certificate invalid. The record is kept.
  pub async fn revoke_certificate(
    &self,
    tenant_id: Uuid,
    certificate_id: Uuid,
  ) -> Result<Certificate> {
    let mut certificate = self.get_certificate(tenant_id, certificate_id).await?;
    let updated = self
      .store
      .set_certificate_validity(certificate_id, false)
      .await
      .map_err(Error::store("failed to revoke certificate"))?;
    if !updated {
      return Err(Error::not_found("certificate", certificate_id));
    }

    certificate.is_valid = false;
    info!(%certificate_id, number = %certificate.certificate_number, "certificate revoked");
    Ok(certificate)
  }
}
