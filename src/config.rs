use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub audio: AudioConfig,
    pub classifier: ClassifierConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Fixed output rate the classifier expects all submitted audio at.
    pub target_sample_rate: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryConfig {
    pub path: String,
}

impl Config {
    /// Load configuration from `path` (any format the config crate
    /// understands), layered over built-in defaults. The file is optional.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "genrecast")?
            .set_default("service.http.bind", "127.0.0.1")?
            .set_default("service.http.port", 8080)?
            .set_default("audio.target_sample_rate", 22050)?
            .set_default("classifier.base_url", "http://127.0.0.1:5000")?
            .set_default("classifier.timeout_secs", 60)?
            .set_default("history.path", "data/history.json")?
            .add_source(config::File::with_name(path).required(false))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_file() {
        let cfg = Config::load("/nonexistent/genrecast").unwrap();
        assert_eq!(cfg.service.name, "genrecast");
        assert_eq!(cfg.audio.target_sample_rate, 22050);
        assert_eq!(cfg.classifier.base_url, "http://127.0.0.1:5000");
        assert_eq!(cfg.history.path, "data/history.json");
    }
}
