use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Status, StatusInput};
use crate::repository::StatusRepository;

/// Maintains the catalogue of task statuses.
pub struct StatusService {
    statuses: Arc<dyn StatusRepository>,
}

impl StatusService {
    pub fn new(statuses: Arc<dyn StatusRepository>) -> Self {
        Self { statuses }
    }

    pub async fn get_status(&self, id: Uuid) -> AppResult<Status> {
        self.statuses
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Status", id))
    }

    pub async fn get_statuses(&self) -> AppResult<Vec<Status>> {
        self.statuses.find_all().await
    }

    /// Fails with `Conflict` when the name is already taken.
    pub async fn create_status(&self, input: StatusInput) -> AppResult<Status> {
        let status = self.statuses.save(Status::new(input)).await?;
        log::info!("status {} ({}) created", status.id, status.name);
        Ok(status)
    }

    pub async fn update_status(&self, id: Uuid, input: StatusInput) -> AppResult<Status> {
        let mut status = self.get_status(id).await?;
        status.name = input.name;
        let status = self.statuses.save(status).await?;
        log::info!("status {} renamed to {}", status.id, status.name);
        Ok(status)
    }

    /// Fails with `Conflict` while any task is in this status.
    pub async fn delete_status(&self, id: Uuid) -> AppResult<()> {
        self.get_status(id).await?;
        self.statuses.delete(id).await?;
        log::info!("status {} deleted", id);
        Ok(())
    }
}
