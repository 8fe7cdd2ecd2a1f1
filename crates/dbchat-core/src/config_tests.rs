//! Unit tests for configuration.

#[cfg(test)]
mod path_expansion_tests {
    use super::super::Config;
    use std::path::PathBuf;

    #[test]
    fn expand_path_handles_tilde() {
        let result = Config::expand_path("~/test");
        // Should not start with ~ after expansion
        assert!(!result.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn expand_path_handles_absolute_path() {
        let result = Config::expand_path("/absolute/path");
        assert_eq!(result, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn expand_path_handles_env_vars() {
        temp_env::with_var("DBCHAT_TEST_VAR", Some("/test/path"), || {
            let result = Config::expand_path("$DBCHAT_TEST_VAR/subdir");
            assert!(result.to_string_lossy().contains("/test/path"));
        });
    }
}

#[cfg(test)]
mod default_config_tests {
    use super::super::Config;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.display_cap, 10);
        assert_eq!(config.max_tool_rounds, 10);
        assert!(config.system_prompt.is_none());
        assert!(
            config
                .database
                .to_string_lossy()
                .ends_with("customer_sales.db")
        );
    }

    #[test]
    fn model_defaults_target_gpt_4o() {
        let config = Config::default();
        assert_eq!(config.model.deployment, "gpt-4o");
        assert_eq!(config.model.max_tokens, 10240);
        assert!(config.model.api_key.is_empty());
    }
}

#[cfg(test)]
mod env_override_tests {
    use super::super::ModelConfig;

    #[test]
    fn apply_env_overlays_credentials() {
        temp_env::with_vars(
            [
                ("DBCHAT_ENDPOINT", Some("https://example.openai.azure.com")),
                ("DBCHAT_API_KEY", Some("secret")),
                ("DBCHAT_MODEL", Some("gpt-4o-mini")),
            ],
            || {
                let mut model = ModelConfig::default();
                model.apply_env();
                assert_eq!(model.endpoint, "https://example.openai.azure.com");
                assert_eq!(model.api_key, "secret");
                assert_eq!(model.deployment, "gpt-4o-mini");
            },
        );
    }

    #[test]
    fn apply_env_keeps_defaults_when_unset() {
        temp_env::with_vars(
            [
                ("DBCHAT_ENDPOINT", None::<&str>),
                ("DBCHAT_API_KEY", None),
                ("DBCHAT_MODEL", None),
                ("DBCHAT_API_VERSION", None),
            ],
            || {
                let mut model = ModelConfig::default();
                model.apply_env();
                assert_eq!(model.deployment, "gpt-4o");
                assert!(model.endpoint.is_empty());
            },
        );
    }
}

#[cfg(test)]
mod round_trip_tests {
    use super::super::Config;

    #[test]
    fn save_and_reload_preserves_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.display_cap = 25;
        config.max_tool_rounds = 4;
        config.save_to_path(&path).expect("save");

        temp_env::with_vars(
            [
                ("DBCHAT_ENDPOINT", None::<&str>),
                ("DBCHAT_API_KEY", None),
            ],
            || {
                let reloaded = Config::load_from_path(&path).expect("load");
                assert_eq!(reloaded.display_cap, 25);
                assert_eq!(reloaded.max_tool_rounds, 4);
            },
        );
    }

    #[test]
    fn api_key_is_never_persisted() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.model.api_key = "do-not-write".to_string();
        config.save_to_path(&path).expect("save");

        let written = std::fs::read_to_string(&path).expect("read");
        assert!(!written.contains("do-not-write"));
    }
}
