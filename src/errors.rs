use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenerError {
    InvalidInput(String),
    MalformedRequest(String),
    EmptyRequest(String),
    BatchWriteFailed(String),
    StoreFailure(String),
    NotFound(String),
    CodeSpaceExhausted(String),
    PoolClosed(String),
    Config(String),
    FileOperation(String),
    Serialization(String),
}

impl ShortenerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::InvalidInput(_) => "E001",
            ShortenerError::MalformedRequest(_) => "E002",
            ShortenerError::EmptyRequest(_) => "E003",
            ShortenerError::BatchWriteFailed(_) => "E004",
            ShortenerError::StoreFailure(_) => "E005",
            ShortenerError::NotFound(_) => "E006",
            ShortenerError::CodeSpaceExhausted(_) => "E007",
            ShortenerError::PoolClosed(_) => "E008",
            ShortenerError::Config(_) => "E009",
            ShortenerError::FileOperation(_) => "E010",
            ShortenerError::Serialization(_) => "E011",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::InvalidInput(_) => "Invalid Input",
            ShortenerError::MalformedRequest(_) => "Malformed Request",
            ShortenerError::EmptyRequest(_) => "Empty Request",
            ShortenerError::BatchWriteFailed(_) => "Batch Write Failed",
            ShortenerError::StoreFailure(_) => "Store Failure",
            ShortenerError::NotFound(_) => "Resource Not Found",
            ShortenerError::CodeSpaceExhausted(_) => "Code Space Exhausted",
            ShortenerError::PoolClosed(_) => "Worker Pool Closed",
            ShortenerError::Config(_) => "Configuration Error",
            ShortenerError::FileOperation(_) => "File Operation Error",
            ShortenerError::Serialization(_) => "Serialization Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortenerError::InvalidInput(msg)
            | ShortenerError::MalformedRequest(msg)
            | ShortenerError::EmptyRequest(msg)
            | ShortenerError::BatchWriteFailed(msg)
            | ShortenerError::StoreFailure(msg)
            | ShortenerError::NotFound(msg)
            | ShortenerError::CodeSpaceExhausted(msg)
            | ShortenerError::PoolClosed(msg)
            | ShortenerError::Config(msg)
            | ShortenerError::FileOperation(msg)
            | ShortenerError::Serialization(msg) => msg,
        }
    }

    /// Whether the error was caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ShortenerError::InvalidInput(_)
                | ShortenerError::MalformedRequest(_)
                | ShortenerError::EmptyRequest(_)
                | ShortenerError::BatchWriteFailed(_)
        )
    }

    /// 格式化为彩色输出（用于 Server 启动失败）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

// 便捷的构造函数
impl ShortenerError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        ShortenerError::InvalidInput(msg.into())
    }

    pub fn malformed_request<T: Into<String>>(msg: T) -> Self {
        ShortenerError::MalformedRequest(msg.into())
    }

    pub fn empty_request<T: Into<String>>(msg: T) -> Self {
        ShortenerError::EmptyRequest(msg.into())
    }

    pub fn batch_write_failed<T: Into<String>>(msg: T) -> Self {
        ShortenerError::BatchWriteFailed(msg.into())
    }

    pub fn store_failure<T: Into<String>>(msg: T) -> Self {
        ShortenerError::StoreFailure(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortenerError::NotFound(msg.into())
    }

    pub fn code_space_exhausted<T: Into<String>>(msg: T) -> Self {
        ShortenerError::CodeSpaceExhausted(msg.into())
    }

    pub fn pool_closed<T: Into<String>>(msg: T) -> Self {
        ShortenerError::PoolClosed(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Config(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ShortenerError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Serialization(msg.into())
    }
}

impl From<std::io::Error> for ShortenerError {
    fn from(err: std::io::Error) -> Self {
        ShortenerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ShortenerError {
    fn from(err: config::ConfigError) -> Self {
        ShortenerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;
