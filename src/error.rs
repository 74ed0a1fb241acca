use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // --------------------------------- generic errors --------------------------------------------
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("config file {}: {}", .0.display(), .1)]
    Config(PathBuf, toml::de::Error),

    // --------------------------------- metadata errors -------------------------------------------
    #[error("launch info missing or unreadable at {}", .0.display())]
    MissingLaunchInfo(PathBuf),
    #[error("build info unavailable: {0}")]
    MissingBuildInfo(String),
    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    // --------------------------------- engine errors ---------------------------------------------
    #[error("`{command}` failed: {message}")]
    EngineCommand { command: String, message: String },

    // --------------------------------- teardown errors -------------------------------------------
    #[error("terminate process {0}: {1}")]
    Termination(u32, String),
}

impl Error {
    /// Return true if an error means "nothing to do" rather than a failure.
    ///
    /// Missing launch info is reported by the pre-launch step that failed to write it, callers
    /// should exit cleanly without issuing any engine command.
    pub fn is_silent(&self) -> bool {
        match self {
            Error::MissingLaunchInfo(_) => true,

            Error::IO(_) => false,
            Error::Json(_) => false,
            Error::Config(_, _) => false,
            Error::MissingBuildInfo(_) => false,
            Error::MalformedMetadata(_) => false,
            Error::EngineCommand { .. } => false,
            Error::Termination(_, _) => false,
        }
    }
}

#[macro_export]
macro_rules! _error {
    ($log_fn: path, $res: expr) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "bridge", "{:#}", e);
                None
            }
        }
    };
    ($log_fn: path, $res: expr, $msg: tt) => {
        match $res {
            Ok(value) => Some(value),
            Err(e) => {
                $log_fn!(target: "bridge", concat!($msg, " {:#}"), e);
                None
            }
        }
    };
}

/// Transforms `Result` into `Option` and logs an error if it occurs.
#[macro_export]
macro_rules! weak_error {
    ($res: expr) => {
        $crate::_error!(log::warn, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::warn, $res, $msg)
    };
}

/// Transforms `Result` into `Option` and put error into debug logs if it occurs.
#[macro_export]
macro_rules! muted_error {
    ($res: expr) => {
        $crate::_error!(log::debug, $res)
    };
    ($res: expr, $msg: tt) => {
        $crate::_error!(log::debug, $res, $msg)
    };
}
