pub mod get_preferences;
pub mod update_preference;
