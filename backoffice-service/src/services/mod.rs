pub mod database;
pub mod mailer;
pub mod metrics;

pub use database::Database;
pub use mailer::Mailer;
pub use metrics::{get_metrics, init_metrics};
