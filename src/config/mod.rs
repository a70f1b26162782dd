/// 统一配置系统
///
/// 提供TOML/JSON配置文件、环境变量和运行时动态调整
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 粒子系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleConfig {
    /// 每个池的粒子槽位数
    pub pool_capacity: u32,

    /// 粒子四边形半边长（世界单位）
    pub particle_half_size: f32,

    /// 发射位置抖动幅度（世界单位）
    pub spawn_jitter: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            pool_capacity: 1024,
            particle_half_size: 0.25,
            spawn_jitter: 0.05,
        }
    }
}

impl ParticleConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    ///
    /// 无法解析的值记录警告并保留原值
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("PARTICLE_POOL_CAPACITY") {
            match val.parse() {
                Ok(capacity) => self.pool_capacity = capacity,
                Err(_) => log::warn!("Ignoring unparsable PARTICLE_POOL_CAPACITY: {val}"),
            }
        }
        if let Ok(val) = env::var("PARTICLE_HALF_SIZE") {
            match val.parse() {
                Ok(size) => self.particle_half_size = size,
                Err(_) => log::warn!("Ignoring unparsable PARTICLE_HALF_SIZE: {val}"),
            }
        }
        if let Ok(val) = env::var("PARTICLE_SPAWN_JITTER") {
            match val.parse() {
                Ok(jitter) => self.spawn_jitter = jitter,
                Err(_) => log::warn!("Ignoring unparsable PARTICLE_SPAWN_JITTER: {val}"),
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.pool_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "Pool capacity must be at least 1".to_string(),
            ));
        }
        if self.particle_half_size <= 0.0 {
            return Err(ConfigError::ValidationError(
                "Particle half size must be positive".to_string(),
            ));
        }
        if self.spawn_jitter < 0.0 {
            return Err(ConfigError::ValidationError(
                "Spawn jitter must not be negative".to_string(),
            ));
        }
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./particles.toml
    /// 2. ./particles.json
    /// 3. ~/.config/particle_engine/particles.toml
    /// 4. 使用默认配置
    pub fn load_or_default() -> Self {
        if let Ok(config) = Self::from_toml_file("particles.toml") {
            println!("Loaded config from particles.toml");
            return config;
        }

        if let Ok(config) = Self::from_json_file("particles.json") {
            println!("Loaded config from particles.json");
            return config;
        }

        if let Some(home) = env::var_os("HOME") {
            let config_path = PathBuf::from(home)
                .join(".config")
                .join("particle_engine")
                .join("particles.toml");

            if let Ok(config) = Self::from_toml_file(&config_path) {
                println!("Loaded config from {:?}", config_path);
                return config;
            }
        }

        println!("Using default particle configuration");
        Self::default()
    }
}
