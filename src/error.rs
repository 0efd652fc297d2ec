use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("Terminal error: {0}")]
    Terminal(String),

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Collector error: {0}")]
    Collector(String),

    #[error("Panic during update or render: {0}")]
    Panic(String),

    #[error("Session ended: {0}")]
    Fatal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGUMENTS: i32 = 2;
    pub const TERMINAL_ERROR: i32 = 3;
    pub const RUNTIME_FAULT: i32 = 4;
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => exit_code::INVALID_ARGUMENTS,
            Error::Terminal(_) => exit_code::TERMINAL_ERROR,
            Error::Layout(_)
            | Error::Collector(_)
            | Error::Parse { .. }
            | Error::Panic(_)
            | Error::Fatal(_) => {
                exit_code::RUNTIME_FAULT
            }
            Error::Io(_) => exit_code::GENERAL_ERROR,
        }
    }

    pub(crate) fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
