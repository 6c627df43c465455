#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    Export(#[from] history_api::ExportError),

    #[error("{0}")]
    Config(#[from] history_config_zbx::ConfigError),

    #[error("cannot read {what} '{path}': {source}")]
    Read {
        what: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("input line {line}: {detail}")]
    Input { line: usize, detail: String },

    #[error("{failed} of {total} batches failed")]
    Replay { failed: usize, total: usize },
}
