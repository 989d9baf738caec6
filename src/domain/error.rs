//! Domain error types.

/// Top-level error type for dipscan.
#[derive(Debug, thiserror::Error)]
pub enum DipscanError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("csv error in {path}: {reason}")]
    Csv { path: String, reason: String },

    #[error("no data for {ticker}")]
    NoData { ticker: String },

    #[error("position {id} not found")]
    PositionNotFound { id: i64 },

    #[error("price lookup failed for {ticker}: {reason}")]
    PriceLookup { ticker: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&DipscanError> for std::process::ExitCode {
    fn from(err: &DipscanError) -> Self {
        let code: u8 = match err {
            DipscanError::Io(_) => 1,
            DipscanError::ConfigParse { .. }
            | DipscanError::ConfigMissing { .. }
            | DipscanError::ConfigInvalid { .. } => 2,
            DipscanError::Database { .. } | DipscanError::DatabaseQuery { .. } => 3,
            DipscanError::Csv { .. } => 4,
            DipscanError::NoData { .. }
            | DipscanError::PositionNotFound { .. }
            | DipscanError::PriceLookup { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = DipscanError::NoData {
            ticker: "RELIANCE".into(),
        };
        assert_eq!(err.to_string(), "no data for RELIANCE");

        let err = DipscanError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        };
        assert_eq!(err.to_string(), "missing config key [sqlite] path");
    }

    #[test]
    fn exit_codes() {
        let err = DipscanError::ConfigMissing {
            section: "s".into(),
            key: "k".into(),
        };
        let code: std::process::ExitCode = (&err).into();
        // ExitCode has no accessor; this at least exercises the conversion.
        let _ = code;
    }
}
