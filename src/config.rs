use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Casebook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default log filter when RUST_LOG is not set
pub fn default_log_filter() -> String {
    "casebook=info".into()
}

/// Get the application data directory
/// ~/Casebook/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Casebook")
}

/// Get the database file path
pub fn database_path() -> PathBuf {
    app_data_dir().join("database").join("casebook.db")
}

/// Get the directory generated reports are written to
pub fn exports_dir() -> PathBuf {
    app_data_dir().join("exports")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Casebook"));
    }

    #[test]
    fn exports_dir_under_app_data() {
        let exports = exports_dir();
        assert!(exports.starts_with(app_data_dir()));
        assert!(exports.ends_with("exports"));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
