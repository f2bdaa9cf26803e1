use dyno::GaugeKind;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Dyno(#[from] dyno::Error),
    #[error(transparent)]
    Math(#[from] math::Error),
    #[error(transparent)]
    Persist(#[from] tempfile::PersistError),
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error("config: {0}")]
    Config(String),
    #[error("{path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not configured")]
    MissingGauge(GaugeKind),
    #[error("column {0} not found")]
    MissingColumn(String),
    #[error("no execute samples in run")]
    NoRunData,
    #[error("run {run}: {source}")]
    Run {
        run: String,
        #[source]
        source: Box<Error>,
    },
    #[error("sample {index}: {got} of {expected} channels")]
    Sample {
        index: usize,
        expected: usize,
        got: usize,
    },
    #[error("line {line}: {reason}")]
    StdFormat { line: usize, reason: String },
    #[error("unsupported configs")]
    UnsupportedConfigs,
}

impl Error {
    pub(crate) fn io<P: Into<std::path::PathBuf>>(path: P, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// attach the run identifier
    pub fn in_run<S: Into<String>>(self, run: S) -> Self {
        match self {
            Self::Run { .. } => self,
            e => Self::Run {
                run: run.into(),
                source: Box::new(e),
            },
        }
    }

    /// missing or malformed configuration input
    pub fn is_config(&self) -> bool {
        match self {
            Self::Config(_) | Self::TomlDe(_) | Self::UnsupportedConfigs | Self::Dyno(_) => true,
            Self::Run { source, .. } => source.is_config(),
            _ => false,
        }
    }
}
