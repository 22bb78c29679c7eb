//! Connection configuration: driver options, identifier-case policy, credentials.

use std::collections::BTreeMap;

/// Option key holding the identifier-case flag.
pub const DB_IDCAP: &str = "DB_IDCap";

/// Option key bounding the size of text columns fetched by the native driver.
pub const MAX_TEXT_LEN: &str = "max_text_len";

/// Whether the server case-folds unquoted identifiers (`DB_IDCap`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdCap {
    /// Identifiers are kept as written (`DB_IDCap=0`).
    Off = 0,
    /// Unquoted identifiers are stored upper-cased (`DB_IDCap=1`).
    #[default]
    On = 1,
}

impl IdCap {
    /// Parse the raw option text; anything other than `0` or `1` is rejected.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "0" => Some(IdCap::Off),
            "1" => Some(IdCap::On),
            _ => None,
        }
    }

    pub fn folds_case(self) -> bool {
        self == IdCap::On
    }
}

/// Driver configuration, stored verbatim as key/value text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverOptions {
    entries: BTreeMap<String, String>,
}

impl DriverOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option (builder style).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Return a copy with `other`'s entries taking precedence.
    pub fn overlay(&self, other: &DriverOptions) -> DriverOptions {
        let mut merged = self.clone();
        for (k, v) in &other.entries {
            merged.entries.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Resolve the identifier-case policy; absent or unparsable means [`IdCap::On`].
    pub fn id_cap(&self) -> IdCap {
        match self.get(DB_IDCAP) {
            None => IdCap::default(),
            Some(raw) => IdCap::parse(raw).unwrap_or_else(|| {
                #[cfg(feature = "tracing")]
                tracing::warn!(
                    target: "dbmorm",
                    value = raw,
                    "unrecognized {} option, using case folding",
                    DB_IDCAP
                );
                IdCap::default()
            }),
        }
    }

    /// Maximum fetched text length, if configured.
    pub fn max_text_len(&self) -> Option<usize> {
        self.get(MAX_TEXT_LEN).and_then(|v| v.trim().parse().ok())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DriverOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Everything needed to open a connection.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub dsn: String,
    pub username: String,
    pub password: String,
    pub options: DriverOptions,
}

impl ConnectOptions {
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            ..Self::default()
        }
    }

    /// Read `DBMORM_DSN`, `DBMORM_USER`, `DBMORM_PASSWORD` and `DBMORM_IDCAP`.
    ///
    /// Returns `None` when `DBMORM_DSN` is not set.
    pub fn from_env() -> Option<Self> {
        let dsn = std::env::var("DBMORM_DSN").ok()?;
        let mut opts = Self::new(dsn)
            .username(std::env::var("DBMORM_USER").unwrap_or_default())
            .password(std::env::var("DBMORM_PASSWORD").unwrap_or_default());
        if let Ok(cap) = std::env::var("DBMORM_IDCAP") {
            opts.options.insert(DB_IDCAP, cap);
        }
        Some(opts)
    }

    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key, value);
        self
    }

    pub fn options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    /// Set `DB_IDCap`.
    pub fn id_cap(self, cap: IdCap) -> Self {
        self.option(DB_IDCAP, (cap as u8).to_string())
    }
}
