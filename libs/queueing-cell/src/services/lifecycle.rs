use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::{info, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::error::QueueError;
use crate::models::{AcceptAction, AcceptRequest, QueueEntry, QueueStatus};
use crate::services::broadcast::QueueBroadcast;
use crate::services::identity::IdentityService;
use crate::services::snapshot::SnapshotService;

/// Status transitions after registration: staff acceptance into one of the
/// three workflow lanes, hand-off to treatment, and completion. Every
/// transition ends by pushing a fresh snapshot to the display channel.
pub struct LifecycleService {
    supabase: SupabaseClient,
    identity: IdentityService,
    snapshot: SnapshotService,
    events: QueueBroadcast,
}

impl LifecycleService {
    pub fn new(config: &AppConfig, events: QueueBroadcast) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
            identity: IdentityService::new(config),
            snapshot: SnapshotService::new(config),
            events,
        }
    }

    /// Accept a waiting visitor into the lane the action names. The action
    /// is validated before anything is read or written, so a bad action has
    /// no effect at all. For a first-time visitor the permanent identity,
    /// the link to it and the new status land in one row update; if that
    /// update fails the created identity is removed again.
    pub async fn advance(
        &self,
        req: &AcceptRequest,
        auth_token: Option<&str>,
    ) -> Result<QueueEntry, QueueError> {
        let action = AcceptAction::parse(
            req.action
                .as_deref()
                .ok_or_else(|| QueueError::InvalidInput("Missing action in request".to_string()))?,
        )?;
        let entry_id = req.entry_id()?;

        let entry = self.fetch_entry(entry_id, auth_token).await?;

        let mut patch = json!({ "status": action.target_status().as_str() });
        let resolved = if entry.is_new_patient {
            let identity = self.identity.resolve_identity(&entry).await?;
            patch["patient_id"] = json!(identity.patient_id);
            patch["is_new_patient"] = json!(false);
            Some(identity)
        } else {
            None
        };

        let updated = match self.patch_entry(entry_id, patch, auth_token).await {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(identity) = &resolved {
                    self.identity.rollback(identity).await;
                }
                return Err(e);
            }
        };

        info!(
            "Queue entry {} accepted: {} -> {}",
            entry_id,
            entry.status,
            updated.status
        );
        self.publish_refresh(auth_token).await;
        Ok(updated)
    }

    /// Doctor finished assessing: the patient's latest visit moves to
    /// Ongoing for Treatment regardless of which lane it was in.
    pub async fn mark_ongoing_treatment(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<QueueEntry, QueueError> {
        let entry = self.latest_entry_for(patient_id, auth_token).await?;
        let updated = self
            .patch_entry(
                entry.id,
                json!({ "status": QueueStatus::OngoingForTreatment.as_str() }),
                auth_token,
            )
            .await?;

        info!("Queue entry {} moved to treatment", entry.id);
        self.publish_refresh(auth_token).await;
        Ok(updated)
    }

    pub async fn complete(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<QueueEntry, QueueError> {
        let entry = self.latest_entry_for(patient_id, auth_token).await?;
        let updated = self
            .patch_entry(
                entry.id,
                json!({ "status": QueueStatus::Completed.as_str() }),
                auth_token,
            )
            .await?;

        info!("Queue entry {} completed", entry.id);
        self.publish_refresh(auth_token).await;
        Ok(updated)
    }

    /// Complaint recorded on the patient's most recent visit, for the
    /// assessment view.
    pub async fn latest_complaint(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<Option<String>, QueueError> {
        let entry = self.latest_entry_for(patient_id, auth_token).await?;
        Ok(entry.complaint)
    }

    async fn fetch_entry(
        &self,
        entry_id: i64,
        auth_token: Option<&str>,
    ) -> Result<QueueEntry, QueueError> {
        let path = format!("/rest/v1/queue_entries?select=*&id=eq.{}", entry_id);
        let rows: Vec<QueueEntry> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| QueueError::EntryNotFound(entry_id.to_string()))
    }

    async fn latest_entry_for(
        &self,
        patient_id: &str,
        auth_token: Option<&str>,
    ) -> Result<QueueEntry, QueueError> {
        let path = format!(
            "/rest/v1/queue_entries?select=*&patient_id=eq.{}&order=created_at.desc&limit=1",
            urlencoding::encode(patient_id)
        );
        let rows: Vec<QueueEntry> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| QueueError::EntryNotFound(format!("patient {}", patient_id)))
    }

    async fn patch_entry(
        &self,
        entry_id: i64,
        patch: Value,
        auth_token: Option<&str>,
    ) -> Result<QueueEntry, QueueError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let path = format!("/rest/v1/queue_entries?id=eq.{}", entry_id);
        let rows: Vec<QueueEntry> = self
            .supabase
            .request_with_headers(Method::PATCH, &path, auth_token, Some(patch), Some(headers))
            .await
            .map_err(|e| QueueError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| QueueError::EntryNotFound(entry_id.to_string()))
    }

    /// Recompute and broadcast the display snapshot. Failures are logged
    /// and swallowed; the state change already committed.
    async fn publish_refresh(&self, auth_token: Option<&str>) {
        match self.snapshot.compute_snapshot(auth_token).await {
            Ok(snapshot) => self.events.publish(&snapshot),
            Err(e) => warn!("Snapshot refresh after transition failed: {}", e),
        }
    }
}
