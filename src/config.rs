use crate::models::Reduction;
use crate::service::DEFAULT_SEARCH_LIMIT;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub report: ReportConfig,
    pub invoice: InvoiceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// 交易记录 JSON 文件
    pub records_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 商品/客户/类型三个页面统一使用的归约策略
    pub reduction: Reduction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceConfig {
    pub search_limit: usize,
    /// 同时打开的开票会话上限; 会话需由客户端 DELETE 释放
    pub max_sessions: usize,
    pub company: CompanyProfile,
}

/// 开票方信息, 随导出快照一起交给展示层
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: String,
    pub contact: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub notes: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            data: DataConfig {
                records_path: "data/products.json".to_string(),
            },
            report: ReportConfig {
                reduction: Reduction::LastValue,
            },
            invoice: InvoiceConfig {
                search_limit: DEFAULT_SEARCH_LIMIT,
                max_sessions: 1000,
                company: CompanyProfile {
                    notes: "Thank you for your business! Payment due upon delivery.".to_string(),
                    ..Default::default()
                },
            },
        }
    }
}

impl AppConfig {
    /// 加载顺序: 内置默认值 -> config.toml (可选) -> 环境变量 `SALES__*`
    ///
    /// 例: `SALES__SERVER__PORT=9000`, `SALES__REPORT__REDUCTION=weighted_average`
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder(Some("config"))?.build()?.try_deserialize()
    }

    fn builder(
        file: Option<&str>,
    ) -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);
        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }
        Ok(builder.add_source(
            Environment::with_prefix("SALES")
                .separator("__")
                .try_parsing(true),
        ))
    }
}
