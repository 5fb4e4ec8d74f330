#[cfg(test)]
pub mod test {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    use crate::Walk;

    #[derive(Walk, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestConfig {
        /// The application host.
        pub host: String,

        /// The port number.
        #[tagfig(short = "p")]
        pub port: u16,

        /// Enable debug mode.
        pub debug: bool,

        /// Request timeout.
        pub timeout: Duration,

        /// Labels attached to every request.
        #[tagfig(sep = ";")]
        pub tags: Vec<String>,

        /// Database settings.
        pub database: TestDbConfig,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            Self {
                host: "localhost".into(),
                port: 8080,
                debug: false,
                timeout: Duration::from_secs(30),
                tags: Vec::new(),
                database: TestDbConfig::default(),
            }
        }
    }

    #[derive(Walk, Serialize, Deserialize, Debug, PartialEq)]
    pub struct TestDbConfig {
        /// Connection string URL.
        pub url: Option<String>,

        /// Connection pool size.
        pub pool_size: usize,
    }

    impl Default for TestDbConfig {
        fn default() -> Self {
            Self {
                url: None,
                pool_size: 5,
            }
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = TestConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 8080);
        assert!(!config.debug);
        assert_eq!(config.database.url, None);
        assert_eq!(config.database.pool_size, 5);
    }
}
