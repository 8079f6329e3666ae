pub mod path_processing;
pub mod settings;
pub mod text_processing;

pub use path_processing::expand_tilde;
pub use settings::{Settings, SettingsError, SettingsStore};
pub use text_processing::{best_match, fuzzy_score};
