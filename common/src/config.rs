//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.

use std::env;
use std::sync::{OnceLock, RwLock};

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub endpoint: String,
    pub project_id: String,
    pub api_key: String,
    pub database_id: String,
    pub students_collection: String,
    pub courses_collection: String,
    pub attendance_collection: String,
    pub location_collection: String,
    pub create_user_function: String,
    pub delete_user_function: String,
    pub user_id_function: String,
    pub qr_validity_seconds: u64,
    pub qr_refresh_seconds: u64,
    pub qr_signing_secret: String,
    pub geofence_radius_meters: f64,
    pub mark_utc_offset_minutes: i32,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    ///
    /// Every value has a workable default so the library can be exercised
    /// against an in-memory backend without an environment file.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "rollcall".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "attendance=info,store=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "rollcall.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            endpoint: env::var("ROLLCALL_ENDPOINT")
                .unwrap_or_else(|_| "https://cloud.appwrite.io/v1".into()),
            project_id: env::var("ROLLCALL_PROJECT_ID").unwrap_or_default(),
            api_key: env::var("ROLLCALL_API_KEY").unwrap_or_default(),
            database_id: env::var("ROLLCALL_DATABASE_ID").unwrap_or_else(|_| "attendance".into()),
            students_collection: env::var("STUDENTS_COLLECTION_ID")
                .unwrap_or_else(|_| "students".into()),
            courses_collection: env::var("COURSES_COLLECTION_ID")
                .unwrap_or_else(|_| "courses".into()),
            attendance_collection: env::var("ATTENDANCE_COLLECTION_ID")
                .unwrap_or_else(|_| "attendance_records".into()),
            location_collection: env::var("LOCATION_COLLECTION_ID")
                .unwrap_or_else(|_| "session_location".into()),
            create_user_function: env::var("CREATE_USER_FUNCTION_ID")
                .unwrap_or_else(|_| "create-user".into()),
            delete_user_function: env::var("DELETE_USER_FUNCTION_ID")
                .unwrap_or_else(|_| "delete-user".into()),
            user_id_function: env::var("GET_USER_ID_FUNCTION_ID")
                .unwrap_or_else(|_| "get-user-id".into()),
            qr_validity_seconds: env::var("QR_VALIDITY_SECONDS")
                .unwrap_or_else(|_| "600".into())
                .parse()
                .unwrap_or(600),
            qr_refresh_seconds: env::var("QR_REFRESH_SECONDS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
            qr_signing_secret: env::var("QR_SIGNING_SECRET").unwrap_or_default(),
            geofence_radius_meters: env::var("GEOFENCE_RADIUS_METERS")
                .unwrap_or_else(|_| "100".into())
                .parse()
                .unwrap_or(100.0),
            mark_utc_offset_minutes: env::var("MARK_UTC_OFFSET_MINUTES")
                .unwrap_or_else(|_| "330".into())
                .parse()
                .unwrap_or(330),
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    ///
    /// Used by public per-field setter methods.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_env(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.env = value.into());
    }

    pub fn set_project_name(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.project_name = value.into());
    }

    pub fn set_log_level(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_level = value.into());
    }

    pub fn set_log_file(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.log_file = value.into());
    }

    pub fn set_log_to_stdout(value: bool) {
        AppConfig::set_field(|cfg| cfg.log_to_stdout = value);
    }

    pub fn set_endpoint(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.endpoint = value.into());
    }

    pub fn set_project_id(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.project_id = value.into());
    }

    pub fn set_api_key(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.api_key = value.into());
    }

    pub fn set_database_id(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.database_id = value.into());
    }

    pub fn set_students_collection(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.students_collection = value.into());
    }

    pub fn set_courses_collection(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.courses_collection = value.into());
    }

    pub fn set_attendance_collection(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.attendance_collection = value.into());
    }

    pub fn set_location_collection(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.location_collection = value.into());
    }

    pub fn set_create_user_function(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.create_user_function = value.into());
    }

    pub fn set_delete_user_function(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.delete_user_function = value.into());
    }

    pub fn set_user_id_function(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.user_id_function = value.into());
    }

    pub fn set_qr_validity_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.qr_validity_seconds = value);
    }

    pub fn set_qr_refresh_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.qr_refresh_seconds = value);
    }

    pub fn set_qr_signing_secret(value: impl Into<String>) {
        AppConfig::set_field(|cfg| cfg.qr_signing_secret = value.into());
    }

    pub fn set_geofence_radius_meters(value: f64) {
        AppConfig::set_field(|cfg| cfg.geofence_radius_meters = value);
    }

    pub fn set_mark_utc_offset_minutes(value: i32) {
        AppConfig::set_field(|cfg| cfg.mark_utc_offset_minutes = value);
    }
}

// --- Free accessors, one per field ---

pub fn env() -> String {
    AppConfig::global().env.clone()
}

pub fn project_name() -> String {
    AppConfig::global().project_name.clone()
}

pub fn log_level() -> String {
    AppConfig::global().log_level.clone()
}

pub fn log_file() -> String {
    AppConfig::global().log_file.clone()
}

pub fn log_to_stdout() -> bool {
    AppConfig::global().log_to_stdout
}

pub fn endpoint() -> String {
    AppConfig::global().endpoint.clone()
}

pub fn project_id() -> String {
    AppConfig::global().project_id.clone()
}

pub fn api_key() -> String {
    AppConfig::global().api_key.clone()
}

pub fn database_id() -> String {
    AppConfig::global().database_id.clone()
}

pub fn students_collection() -> String {
    AppConfig::global().students_collection.clone()
}

pub fn courses_collection() -> String {
    AppConfig::global().courses_collection.clone()
}

pub fn attendance_collection() -> String {
    AppConfig::global().attendance_collection.clone()
}

pub fn location_collection() -> String {
    AppConfig::global().location_collection.clone()
}

pub fn create_user_function() -> String {
    AppConfig::global().create_user_function.clone()
}

pub fn delete_user_function() -> String {
    AppConfig::global().delete_user_function.clone()
}

pub fn user_id_function() -> String {
    AppConfig::global().user_id_function.clone()
}

pub fn qr_validity_seconds() -> u64 {
    AppConfig::global().qr_validity_seconds
}

pub fn qr_refresh_seconds() -> u64 {
    AppConfig::global().qr_refresh_seconds
}

/// The payload signing secret, or `None` when signing is disabled.
pub fn qr_signing_secret() -> Option<String> {
    let secret = AppConfig::global().qr_signing_secret.clone();
    if secret.is_empty() { None } else { Some(secret) }
}

pub fn geofence_radius_meters() -> f64 {
    AppConfig::global().geofence_radius_meters
}

pub fn mark_utc_offset_minutes() -> i32 {
    AppConfig::global().mark_utc_offset_minutes
}
