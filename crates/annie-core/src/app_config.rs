use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub skip_apps: Vec<String>,
    pub run_report: bool,
    pub add_delay: bool,
    pub corrections_path: PathBuf,
    pub output_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub log_level: String,
}

impl AppConfig {
    /// Whether `product_id` is listed in `ANNIE_SKIP_APPS`.
    #[must_use]
    pub fn is_skipped(&self, product_id: &str) -> bool {
        self.skip_apps.iter().any(|id| id == product_id)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("skip_apps", &self.skip_apps)
            .field("run_report", &self.run_report)
            .field("add_delay", &self.add_delay)
            .field("corrections_path", &self.corrections_path)
            .field("output_dir", &self.output_dir)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}
