use std::path::Path;

use crate::{Config, FeedMode, StorageConfig};

/// Routes the relay always serves, which the health check cannot take over
const RESERVED_PATHS: &[&str] = &["/api/generate", "/api/feed", "/api/test"];

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml(&raw)
    }

    /// Parse and validate configuration text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing, or validation fails
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the health path cannot be routed, a provider
    /// timeout is invalid, link-mode feed has no public base URL, or the
    /// filesystem store has an empty path
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_health()?;
        self.validate_providers()?;
        self.validate_feed()?;
        self.validate_storage()?;
        Ok(())
    }

    fn validate_health(&self) -> anyhow::Result<()> {
        let health = &self.server.health;
        if !health.enabled {
            return Ok(());
        }

        let path = health.path.as_str();
        if !path.starts_with('/') {
            anyhow::bail!("server.health.path must start with '/': {path:?}");
        }
        if path.contains(['{', '}', '*']) {
            anyhow::bail!("server.health.path must be a literal path: {path:?}");
        }
        if RESERVED_PATHS.contains(&path) {
            anyhow::bail!("server.health.path {path:?} is already served by the relay");
        }

        Ok(())
    }

    fn validate_providers(&self) -> anyhow::Result<()> {
        for (name, provider) in [("openai", &self.providers.openai), ("google", &self.providers.google)] {
            provider
                .timeout_duration()
                .map_err(|e| anyhow::anyhow!("providers.{name}.timeout: {e}"))?;
        }

        Ok(())
    }

    fn validate_feed(&self) -> anyhow::Result<()> {
        if self.feed.mode == FeedMode::Link && self.feed.public_base_url.is_none() {
            anyhow::bail!("feed.public_base_url is required when feed.mode is \"link\"");
        }

        Ok(())
    }

    fn validate_storage(&self) -> anyhow::Result<()> {
        if let Some(StorageConfig::Filesystem(fs)) = &self.storage
            && fs.path.as_os_str().is_empty()
        {
            anyhow::bail!("storage.path must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crate::{AnyOrArray, Config, FeedMode, LogFormat, StorageConfig};

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();

        assert!(config.server.listen_address.is_none());
        assert!(config.server.health.enabled);
        assert_eq!(config.server.health.path, "/health");
        assert_eq!(config.server.cors.origins, AnyOrArray::Any);
        assert!(config.storage.is_none());
        assert_eq!(config.feed.mode, FeedMode::Inline);
        assert_eq!(config.logging.filter, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(
            config.providers.openai.timeout_duration().unwrap(),
            Duration::from_secs(180)
        );
    }

    #[test]
    fn full_config() {
        let raw = r#"
            [server]
            listen_address = "127.0.0.1:8788"

            [server.health]
            path = "/healthz"

            [providers.openai]
            base_url = "http://localhost:9000/v1"
            timeout = "30s"

            [providers.google]
            timeout = "2m"

            [storage]
            type = "filesystem"
            path = "/var/lib/duckgen"

            [feed]
            mode = "link"
            public_base_url = "https://images.duckgenerator.com"

            [logging]
            filter = "duckgen_imagegen=debug,info"
            format = "json"
        "#;

        let config = Config::from_toml(raw).unwrap();

        assert_eq!(config.server.listen_address.unwrap().port(), 8788);
        assert_eq!(config.server.health.path, "/healthz");
        assert_eq!(
            config.providers.openai.base_url.as_ref().unwrap().as_str(),
            "http://localhost:9000/v1"
        );
        assert_eq!(
            config.providers.google.timeout_duration().unwrap(),
            Duration::from_secs(120)
        );
        match config.storage {
            Some(StorageConfig::Filesystem(fs)) => assert_eq!(fs.path.to_str(), Some("/var/lib/duckgen")),
            other => panic!("unexpected storage config: {other:?}"),
        }
        assert_eq!(config.feed.mode, FeedMode::Link);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn memory_storage() {
        let config = Config::from_toml("[storage]\ntype = \"memory\"").unwrap();
        assert!(matches!(config.storage, Some(StorageConfig::Memory)));
    }

    #[test]
    fn link_mode_requires_public_base_url() {
        let err = Config::from_toml("[feed]\nmode = \"link\"").unwrap_err();
        assert!(err.to_string().contains("public_base_url"));
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = Config::from_toml("[providers.google]\ntimeout = \"whenever\"").unwrap_err();
        assert!(err.to_string().contains("providers.google.timeout"));
    }

    #[test]
    fn unroutable_health_paths_are_rejected() {
        for path in ["health", "", "/api/generate", "/api/feed", "/api/test", "/{key}", "/*rest"] {
            let raw = format!("[server.health]\npath = {path:?}\n");
            assert!(Config::from_toml(&raw).is_err(), "path {path:?} should be rejected");
        }

        let disabled = "[server.health]\nenabled = false\npath = \"/api/feed\"\n";
        assert!(Config::from_toml(disabled).is_ok());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::from_toml("[server]\nport = 80").is_err());
    }

    #[test]
    fn expands_environment_before_parsing() {
        temp_env::with_var("DUCKGEN_TEST_STORE", Some("/tmp/ducks"), || {
            let config =
                Config::from_toml("[storage]\ntype = \"filesystem\"\npath = \"{{ env.DUCKGEN_TEST_STORE }}\"").unwrap();
            match config.storage {
                Some(StorageConfig::Filesystem(fs)) => assert_eq!(fs.path.to_str(), Some("/tmp/ducks")),
                other => panic!("unexpected storage config: {other:?}"),
            }
        });
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duckgen.toml");
        std::fs::write(&path, "[feed]\nmode = \"inline\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.feed.mode, FeedMode::Inline);

        let missing = Config::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(missing.to_string().contains("failed to read config file"));
    }

    #[test]
    fn bundled_config_parses() {
        temp_env::with_vars_unset(["DUCKGEN_ADDRESS", "DUCKGEN_IMAGE_DIR"], || {
            let config = Config::from_toml(include_str!("../../../duckgen.toml")).unwrap();

            assert_eq!(config.server.listen_address, Some("0.0.0.0:8788".parse().unwrap()));
            assert!(matches!(
                config.storage,
                Some(StorageConfig::Filesystem(ref fs)) if fs.path.as_os_str() == "./images"
            ));
        });
    }
}
