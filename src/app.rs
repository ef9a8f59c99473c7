//! Application wiring shared by the binary and the integration tests.

use std::sync::Arc;

use actix_web::web;

use crate::auth::{PasswordEncoder, PatternError};
use crate::config::Config;
use crate::repository::{LabelRepository, StatusRepository, TaskRepository, UserRepository};
use crate::routes;
use crate::security::SecurityPolicy;
use crate::services::{LabelService, StatusService, TaskService, UserService};

/// Everything a worker needs to build its `App`. Cheap to clone into the server factory.
#[derive(Clone)]
pub struct AppState {
    api_path: String,
    policy: Arc<SecurityPolicy>,
    tasks: web::Data<TaskService>,
    statuses: web::Data<StatusService>,
    labels: web::Data<LabelService>,
    users: web::Data<UserService>,
}

impl AppState {
    /// Builds the services and the security policy on top of one store.
    pub fn new<S>(config: &Config, store: Arc<S>) -> Result<Self, PatternError>
    where
        S: UserRepository + StatusRepository + LabelRepository + TaskRepository + 'static,
    {
        let encoder = PasswordEncoder::new(config.bcrypt_cost);
        let policy = SecurityPolicy::new(config, store.clone(), encoder)?;

        Ok(Self {
            api_path: config.api_path.clone(),
            policy: Arc::new(policy),
            tasks: web::Data::new(TaskService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            )),
            statuses: web::Data::new(StatusService::new(store.clone())),
            labels: web::Data::new(LabelService::new(store.clone())),
            users: web::Data::new(UserService::new(store, encoder)),
        })
    }

    pub fn policy(&self) -> &SecurityPolicy {
        &self.policy
    }

    /// Registers shared state and every route. The caller wraps the `App` with
    /// `policy().filter()` and `policy().headers()`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.tasks.clone())
            .app_data(self.statuses.clone())
            .app_data(self.labels.clone())
            .app_data(self.users.clone())
            .app_data(self.policy.authentication_manager());
        routes::config(cfg, &self.api_path);
    }
}
