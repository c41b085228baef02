//! Loader for tweetmill configuration with YAML + environment overlays.
//!
//! Every key has a default, so running without a `tweetmill.yaml` is valid.
//! Precedence, lowest first: built-in defaults, the YAML file,
//! `TWEETMILL__<SECTION>__<KEY>` environment variables. String values may
//! reference other variables as `${VAR}`; unresolved references are left as is.
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tweetmill_common::observability::LogFormat;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;
const ENV_PREFIX: &str = "TWEETMILL";

/// Keys that deserialize into strings. Environment overrides for these are
/// taken verbatim, since type inference would turn `0123` into the integer 123.
const STRING_KEYS: &[(&str, &str)] = &[
    ("fetcher", "input"),
    ("fetcher", "output"),
    ("fetcher", "base_url"),
    ("fetcher", "path"),
    ("fetcher", "api_host"),
    ("fetcher", "api_key"),
    ("cleaner", "input"),
    ("cleaner", "output"),
    ("ollama", "host"),
    ("ollama", "model"),
    ("ollama", "system"),
    ("logging", "dir"),
    ("logging", "filter"),
];

/// Environment variable consulted when `fetcher.api_key` is unset.
pub const API_KEY_ENV: &str = "RAPIDAPI_KEY";
/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "tweetmill.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TweetmillConfig {
    pub fetcher: FetcherConfig,
    pub cleaner: CleanerConfig,
    pub ollama: OllamaConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub base_url: String,
    pub path: String,
    pub api_host: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub rate: RateConfig,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("batch1.txt"),
            output: PathBuf::from("tweets.json"),
            base_url: "https://twitter241.p.rapidapi.com".into(),
            path: "tweet".into(),
            api_host: "twitter241.p.rapidapi.com".into(),
            api_key: None,
            timeout_secs: 30,
            rate: RateConfig::default(),
        }
    }
}

impl FetcherConfig {
    /// Resolve the RapidAPI key, failing when none is configured.
    ///
    /// A value that still contains an unexpanded `${...}` placeholder counts
    /// as missing, and so does a blank one.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        let usable = |k: &String| !k.trim().is_empty() && !k.contains("${");
        self.api_key
            .clone()
            .filter(usable)
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(usable))
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "RapidAPI key missing: set fetcher.api_key or {API_KEY_ENV}"
                ))
            })
    }
}

/// Pacing between consecutive tweet lookups.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateConfig {
    /// Sleep a fixed interval after every request.
    Fixed {
        #[serde(default = "default_interval_ms")]
        interval_ms: u64,
    },
    /// Token bucket refilled at `qps`, holding at most `burst` tokens.
    TokenBucket {
        qps: f64,
        #[serde(default = "default_burst")]
        burst: u32,
    },
    Off,
}

impl Default for RateConfig {
    fn default() -> Self {
        Self::Fixed {
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    2000
}
fn default_burst() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CleanerConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Report bad records and keep going instead of aborting the run.
    pub skip_invalid: bool,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("tweets.json"),
            output: PathBuf::from("tweets_clean.json"),
            skip_invalid: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    pub host: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system: Option<String>,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:11434".into(),
            model: "llama2".into(),
            temperature: 0.7,
            max_tokens: 500,
            system: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub stderr: bool,
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: false,
            filter: "info".into(),
        }
    }
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Re-apply string-typed environment overrides without type inference.
fn restore_env_strings(root: &mut Value) {
    let Value::Object(sections) = root else {
        return;
    };
    for (section, key) in STRING_KEYS {
        let var = format!(
            "{ENV_PREFIX}__{}__{}",
            section.to_ascii_uppercase(),
            key.to_ascii_uppercase()
        );
        let Ok(raw) = std::env::var(&var) else {
            continue;
        };
        let entry = sections
            .entry(section.to_string())
            .or_insert_with(|| Value::Object(Default::default()));
        if let Value::Object(fields) = entry {
            fields.insert(key.to_string(), Value::String(raw));
        }
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct TweetmillConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    files: Vec<(PathBuf, bool)>,
    inline: Vec<String>,
}

impl Default for TweetmillConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl TweetmillConfigLoader {
    /// Start from defaults; environment overrides are layered last in [`load`](Self::load).
    ///
    /// ```
    /// use tweetmill_config::TweetmillConfigLoader;
    ///
    /// let config = TweetmillConfigLoader::new()
    ///     .with_yaml_str("ollama:\n  model: mistral")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.ollama.model, "mistral");
    /// assert_eq!(config.ollama.host, "http://localhost:11434");
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            files: Vec::new(),
            inline: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.files.push((path.as_ref().to_path_buf(), false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.inline.push(yaml.to_string());
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// ```
    /// use tweetmill_config::{RateConfig, TweetmillConfigLoader};
    ///
    /// let config = TweetmillConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// fetcher:
    ///   rate:
    ///     kind: token_bucket
    ///     qps: 0.5
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.fetcher.rate, RateConfig::TokenBucket { qps: 0.5, burst: 1 });
    /// assert_eq!(config.fetcher.output.to_str(), Some("tweets.json"));
    /// ```
    pub fn load(self) -> Result<TweetmillConfig, ConfigError> {
        let mut builder = self.builder;
        for (path, required) in &self.files {
            builder = builder.add_source(File::from(path.as_path()).required(*required));
        }
        for yaml in &self.inline {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        restore_env_strings(&mut v);
        expand_env_in_value(&mut v);

        serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))
    }
}
