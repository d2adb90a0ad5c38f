//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON 格式。

use contracts::{ContractError, DispatchRequest, RequestBatch};
use serde::de::DeserializeOwned;

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式文档
pub fn parse_toml<T: DeserializeOwned>(content: &str) -> Result<T, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式文档
pub fn parse_json<T: DeserializeOwned>(content: &str) -> Result<T, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析
pub fn parse<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> Result<T, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

/// 解析请求批次
///
/// JSON 接受单个请求、请求数组或 `{"requests": [...]}`；
/// TOML 使用 `[[requests]]` 表数组。
pub fn parse_requests(
    content: &str,
    format: ConfigFormat,
) -> Result<Vec<DispatchRequest>, ContractError> {
    match format {
        ConfigFormat::Toml => {
            let mut document = toml::Value::Table(parse_toml::<toml::Table>(content)?);
            datetimes_to_text(&mut document);
            document
                .try_into::<RequestBatch>()
                .map(|batch| batch.requests)
                .map_err(|e| ContractError::ConfigParse {
                    message: format!("invalid request batch: {e}"),
                    source: Some(Box::new(e)),
                })
        }
        ConfigFormat::Json => {
            let value: serde_json::Value = parse_json(content)?;
            let requests = if value.is_array() {
                serde_json::from_value(value)
            } else if value.get("requests").is_some() {
                serde_json::from_value::<RequestBatch>(value).map(|b| b.requests)
            } else {
                serde_json::from_value::<DispatchRequest>(value).map(|r| vec![r])
            };
            requests.map_err(|e| ContractError::ConfigParse {
                message: format!("invalid request batch: {e}"),
                source: Some(Box::new(e)),
            })
        }
    }
}

/// TOML 日期时间转为 RFC 3339 字符串，payload 中不会出现 toml 内部表示
fn datetimes_to_text(value: &mut toml::Value) {
    match value {
        toml::Value::Datetime(dt) => *value = toml::Value::String(dt.to_string()),
        toml::Value::Array(items) => items.iter_mut().for_each(datetimes_to_text),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| datetimes_to_text(v)),
        _ => {}
    }
}
