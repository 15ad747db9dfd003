use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::errors::{Result, ShortenerError};
use crate::utils::ip::TrustedSubnet;
use crate::utils::url_validator::validate_url;

use super::CliArgs;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 单条创建时使用的短码分配策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CodePolicyKind {
    /// 按位加权的 62 进制和，冲突时按探测次数加盐
    #[default]
    Deterministic,
    /// 随机字母数字短码，忽略 URL
    Random,
}

impl std::fmt::Display for CodePolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl std::str::FromStr for CodePolicyKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deterministic" => Ok(Self::Deterministic),
            "random" => Ok(Self::Random),
            _ => Err(format!(
                "Invalid code policy: '{}'. Valid: deterministic, random",
                s
            )),
        }
    }
}

/// 静态配置（启动时加载）
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub shortener: ShortenerConfig,
    #[serde(default)]
    pub codes: CodesConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub grpc: GrpcConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// ENV 前缀：SHORTENER，分隔符：__
    /// 示例：SHORTENER__POOL__WORKERS=8
    pub fn load(path: Option<&str>) -> Result<Self> {
        use config::{Config, Environment, File};

        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);
        let settings = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("SHORTENER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        if std::path::Path::new(path).exists() {
            eprintln!("[INFO] Configuration loaded from: {}", path);
        }
        Ok(config)
    }

    /// Full startup resolution: file and environment, then flags, then checks.
    pub fn from_args(args: &CliArgs) -> Result<Self> {
        let mut config = Self::load(args.config.as_deref())?;
        config.apply_args(args)?;
        config.validate()?;
        Ok(config)
    }

    /// 命令行参数覆盖
    pub fn apply_args(&mut self, args: &CliArgs) -> Result<()> {
        if let Some(address) = args.server_address.as_deref().filter(|a| !a.is_empty()) {
            let (host, port) = parse_server_address(address)?;
            self.server.host = host;
            self.server.port = port;
        }
        if let Some(base_url) = args.base_url.as_deref().filter(|b| !b.is_empty()) {
            self.shortener.base_url = base_url.to_string();
        }
        if let Some(path) = args.file_storage_path.as_deref().filter(|p| !p.is_empty()) {
            self.storage.file_path = Some(path.to_string());
        }
        if let Some(subnet) = args.trusted_subnet.as_deref().filter(|s| !s.is_empty()) {
            self.shortener.trusted_subnet = Some(subnet.to_string());
        }
        if args.enable_grpc {
            self.grpc.enabled = true;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_url(&self.shortener.base_url).map_err(|e| {
            ShortenerError::config(format!("shortener.base_url is invalid: {}", e))
        })?;
        self.shortener.trusted_subnet()?;

        if self.pool.workers == 0 {
            return Err(ShortenerError::config("pool.workers must be at least 1"));
        }
        if self.pool.queue_capacity == 0 {
            return Err(ShortenerError::config("pool.queue_capacity must be at least 1"));
        }
        if self.codes.max_attempts == 0 {
            return Err(ShortenerError::config("codes.max_attempts must be at least 1"));
        }
        if self.codes.batch_code_length == 0 || self.codes.random_length == 0 {
            return Err(ShortenerError::config("code lengths must be at least 1"));
        }
        if self.grpc.enabled
            && self.grpc.host == self.server.host
            && self.grpc.port == self.server.port
        {
            return Err(ShortenerError::config(
                "grpc.port must differ from server.port on the same host",
            ));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// Split `host:port`. IPv6 hosts must be bracketed (`[::1]:8080`).
pub fn parse_server_address(address: &str) -> Result<(String, u16)> {
    let (host, port) = address.rsplit_once(':').ok_or_else(|| {
        ShortenerError::config(format!("Server address '{}' must be host:port", address))
    })?;
    let port = port.parse::<u16>().map_err(|e| {
        ShortenerError::config(format!("Invalid port in '{}': {}", address, e))
    })?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let host = if host.is_empty() { "0.0.0.0" } else { host };
    Ok((host.to_string(), port))
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 短链接生成与访问控制
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenerConfig {
    /// 短链接前缀，返回给用户的地址为 `{base_url}/{code}`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// 允许访问内部统计接口的 CIDR 网段，未配置时统计接口始终拒绝
    #[serde(default)]
    pub trusted_subnet: Option<String>,
}

impl ShortenerConfig {
    pub fn trusted_subnet(&self) -> Result<Option<TrustedSubnet>> {
        self.trusted_subnet
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<TrustedSubnet>()
                    .map_err(|e| ShortenerError::config(format!("shortener.trusted_subnet: {}", e)))
            })
            .transpose()
    }
}

/// 短码分配配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodesConfig {
    #[serde(default)]
    pub policy: CodePolicyKind,
    /// 单条创建时的最大探测次数
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 批量创建时随机短码的长度
    #[serde(default = "default_batch_code_length")]
    pub batch_code_length: usize,
    /// random 策略下单条创建的短码长度
    #[serde(default = "default_random_length")]
    pub random_length: usize,
}

/// 删除任务工作池配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_pool_workers")]
    pub workers: usize,
    #[serde(default = "default_pool_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_pool_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// JSON 快照文件路径；为空时使用纯内存存储
    #[serde(default)]
    pub file_path: Option<String>,
}

/// 用户身份 Cookie 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// HS256 签名密钥；为空时启动时随机生成（重启后旧 Cookie 失效）
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_token_ttl_days")]
    pub token_ttl_days: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// gRPC 传输配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrpcConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_grpc_port")]
    pub port: u16,
}

// ============================================================
// Default value functions
// ============================================================

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_grpc_port() -> u16 {
    3200
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_max_attempts() -> u32 {
    8
}

fn default_batch_code_length() -> usize {
    10
}

fn default_random_length() -> usize {
    8
}

fn default_pool_workers() -> usize {
    5
}

fn default_pool_queue_capacity() -> usize {
    5
}

fn default_pool_shutdown_timeout() -> u64 {
    10
}

fn default_cookie_name() -> String {
    "user_id".to_string()
}

fn default_token_ttl_days() -> u64 {
    365
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            trusted_subnet: None,
        }
    }
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            policy: CodePolicyKind::default(),
            max_attempts: default_max_attempts(),
            batch_code_length: default_batch_code_length(),
            random_length: default_random_length(),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_pool_workers(),
            queue_capacity: default_pool_queue_capacity(),
            shutdown_timeout_secs: default_pool_shutdown_timeout(),
        }
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secret: String::new(),
            token_ttl_days: default_token_ttl_days(),
        }
    }
}

impl Default for GrpcConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_server_host(),
            port: default_grpc_port(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = StaticConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pool.workers, 5);
        assert_eq!(config.pool.queue_capacity, 5);
        assert_eq!(config.codes.policy, CodePolicyKind::Deterministic);
    }

    #[test]
    fn test_code_policy_from_str() {
        assert_eq!("Random".parse::<CodePolicyKind>(), Ok(CodePolicyKind::Random));
        assert_eq!(
            "deterministic".parse::<CodePolicyKind>(),
            Ok(CodePolicyKind::Deterministic)
        );
        assert!("sequential".parse::<CodePolicyKind>().is_err());
        assert_eq!(CodePolicyKind::Random.to_string(), "random");
    }

    #[test]
    fn test_parse_server_address() {
        assert_eq!(
            parse_server_address("localhost:9000").unwrap(),
            ("localhost".to_string(), 9000)
        );
        assert_eq!(
            parse_server_address(":8081").unwrap(),
            ("0.0.0.0".to_string(), 8081)
        );
        assert_eq!(
            parse_server_address("[::1]:8080").unwrap(),
            ("::1".to_string(), 8080)
        );
        assert!(parse_server_address("localhost").is_err());
        assert!(parse_server_address("localhost:http").is_err());
    }

    #[test]
    fn test_apply_args_overrides() {
        let mut config = StaticConfig::default();
        let args = CliArgs {
            server_address: Some("0.0.0.0:9999".to_string()),
            base_url: Some("https://sho.rt".to_string()),
            file_storage_path: Some("/tmp/links.json".to_string()),
            trusted_subnet: Some("10.0.0.0/8".to_string()),
            ..CliArgs::default()
        };
        config.apply_args(&args).unwrap();

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.shortener.base_url, "https://sho.rt");
        assert_eq!(config.storage.file_path.as_deref(), Some("/tmp/links.json"));
        assert!(config.shortener.trusted_subnet().unwrap().is_some());
        assert!(!config.grpc.enabled);

        let args = CliArgs {
            enable_grpc: true,
            ..CliArgs::default()
        };
        config.apply_args(&args).unwrap();
        assert!(config.grpc.enabled);
        assert_eq!(config.grpc.port, 3200);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StaticConfig::default();
        config.pool.workers = 0;
        assert!(matches!(config.validate(), Err(ShortenerError::Config(_))));

        let mut config = StaticConfig::default();
        config.shortener.trusted_subnet = Some("10.0.0.0".to_string());
        assert!(config.validate().is_err());

        let mut config = StaticConfig::default();
        config.shortener.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = StaticConfig::default();
        config.grpc.enabled = true;
        config.grpc.port = config.server.port;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_config_roundtrips() {
        let sample = StaticConfig::generate_sample_config();
        let parsed: StaticConfig = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.identity.cookie_name, "user_id");
        assert_eq!(parsed.codes.batch_code_length, 10);
    }
}
