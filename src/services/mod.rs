//! Application services. Handlers call these; they talk to the repositories only
//! through the traits in [`crate::repository`].

pub mod labels;
pub mod statuses;
pub mod tasks;
pub mod users;

pub use labels::LabelService;
pub use statuses::StatusService;
pub use tasks::TaskService;
pub use users::UserService;
