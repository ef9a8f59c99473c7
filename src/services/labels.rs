use std::sync::Arc;

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Label, LabelInput};
use crate::repository::LabelRepository;

/// Maintains the set of labels tasks can be tagged with.
pub struct LabelService {
    labels: Arc<dyn LabelRepository>,
}

impl LabelService {
    pub fn new(labels: Arc<dyn LabelRepository>) -> Self {
        Self { labels }
    }

    pub async fn get_label(&self, id: Uuid) -> AppResult<Label> {
        self.labels
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Label", id))
    }

    pub async fn get_labels(&self) -> AppResult<Vec<Label>> {
        self.labels.find_all().await
    }

    pub async fn create_label(&self, input: LabelInput) -> AppResult<Label> {
        let label = self.labels.save(Label::new(input)).await?;
        log::info!("label {} ({}) created", label.id, label.name);
        Ok(label)
    }

    pub async fn update_label(&self, id: Uuid, input: LabelInput) -> AppResult<Label> {
        let mut label = self.get_label(id).await?;
        label.name = input.name;
        self.labels.save(label).await
    }

    /// Labels still attached to a task cannot be removed.
    pub async fn delete_label(&self, id: Uuid) -> AppResult<()> {
        let label = self.get_label(id).await?;
        self.labels.delete(label.id).await?;
        log::info!("label {} deleted", label.id);
        Ok(())
    }
}
