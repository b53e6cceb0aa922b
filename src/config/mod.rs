pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError, RulesOrigin};
pub use schema::{Options, Rule, RulesConfig, ValidationError, ValidationIssue};
