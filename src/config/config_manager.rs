// ==========================================
// CO2 计费工具 - 配置管理器
// ==========================================
// 职责: 配置文件定位、加载、校验、保存
// 存储: {config_dir}/co2-billing/config.json
// ==========================================

use crate::config::app_config::AppConfig;
use crate::config::error::{ConfigError, ConfigResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 配置目录名
pub const CONFIG_DIR_NAME: &str = "co2-billing";
/// 配置文件名
pub const CONFIG_FILE_NAME: &str = "config.json";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    /// 使用指定路径
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 使用系统默认路径
    pub fn with_default_path() -> ConfigResult<Self> {
        Ok(Self::new(default_config_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// 加载配置
    ///
    /// # 返回
    /// - 文件不存在: 默认配置
    /// - 文件存在: 解析并校验后的配置
    pub fn load(&self) -> ConfigResult<AppConfig> {
        if !self.exists() {
            debug!(path = %self.path.display(), "配置文件不存在，使用默认配置");
            return Ok(AppConfig::default());
        }

        let raw = fs::read_to_string(&self.path).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        let config: AppConfig =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: self.path.clone(),
                source,
            })?;
        config.validate()?;

        info!(path = %self.path.display(), "配置加载完成");
        Ok(config)
    }

    /// 保存配置（校验后写入，自动创建父目录）
    pub fn save(&self, config: &AppConfig) -> ConfigResult<()> {
        config.validate()?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let json = serde_json::to_string_pretty(config).map_err(|source| ConfigError::Parse {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;

        info!(path = %self.path.display(), "配置已保存");
        Ok(())
    }

    /// 写入默认配置
    ///
    /// # 参数
    /// - overwrite: 文件已存在时是否覆盖
    ///
    /// # 返回
    /// - true: 已写入
    /// - false: 文件已存在且未覆盖
    pub fn init_default(&self, overwrite: bool) -> ConfigResult<bool> {
        if self.exists() && !overwrite {
            return Ok(false);
        }
        self.save(&AppConfig::default())?;
        Ok(true)
    }
}

/// 系统默认配置路径
pub fn default_config_path() -> ConfigResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoConfigDir)
}
