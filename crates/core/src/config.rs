//! 설정 관리 — logtrack.toml 파싱 및 런타임 설정
//!
//! [`LogtrackConfig`]는 모든 섹션의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGTRACK_STORE_DSN=postgresql://...` 형식)
//! 3. 설정 파일 (`logtrack.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logtrack_core::error::LogtrackError> {
//! use logtrack_core::config::LogtrackConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogtrackConfig::load("logtrack.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogtrackConfig::parse("[store]\nbatch_size = 500")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogtrackError};

/// 배치 크기 상한
const MAX_BATCH_SIZE: usize = 100_000;

/// logtrack 통합 설정
///
/// `logtrack.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogtrackConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스토어 연결 및 배치 설정
    #[serde(default)]
    pub store: StoreConfig,
    /// 로그 처리기 설정
    #[serde(default)]
    pub processor: ProcessorConfig,
    /// 핸들러 정책 설정
    #[serde(default)]
    pub handlers: HandlersConfig,
}

impl LogtrackConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogtrackError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에 환경변수만 적용합니다.
    ///
    /// 사용자가 설정 파일을 명시하지 않은 경우에 사용합니다. 검증은 하지 않으므로
    /// 호출자가 CLI 오버라이드를 적용한 뒤 [`validate`](Self::validate)를 호출해야 합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, LogtrackError> {
        let path = path.as_ref();
        let mut config = match Self::from_file(path).await {
            Ok(config) => config,
            Err(LogtrackError::Config(ConfigError::FileNotFound { .. })) => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogtrackError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogtrackError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogtrackError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogtrackError> {
        toml::from_str(toml_str).map_err(|e| {
            LogtrackError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGTRACK_{SECTION}_{FIELD}`
    /// 예: `LOGTRACK_STORE_BATCH_SIZE=500`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGTRACK_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGTRACK_GENERAL_LOG_FORMAT");

        // Store
        override_string(&mut self.store.dsn, "LOGTRACK_STORE_DSN");
        override_string(&mut self.store.setup_script, "LOGTRACK_STORE_SETUP_SCRIPT");
        override_usize(&mut self.store.batch_size, "LOGTRACK_STORE_BATCH_SIZE");

        // Processor
        override_string(&mut self.processor.log_path, "LOGTRACK_PROCESSOR_LOG_PATH");
        override_string(&mut self.processor.rules_path, "LOGTRACK_PROCESSOR_RULES_PATH");
        override_bool(&mut self.processor.dry_run, "LOGTRACK_PROCESSOR_DRY_RUN");

        // Handlers
        override_u64(
            &mut self.handlers.download_threshold_secs,
            "LOGTRACK_HANDLERS_DOWNLOAD_THRESHOLD_SECS",
        );
        override_bool(
            &mut self.handlers.truncate_history_on_start,
            "LOGTRACK_HANDLERS_TRUNCATE_HISTORY_ON_START",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogtrackError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.store.batch_size == 0 || self.store.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "store.batch_size".to_owned(),
                reason: format!("must be 1-{MAX_BATCH_SIZE}"),
            }
            .into());
        }

        // dry-run 에서는 스토어에 연결하지 않음
        if !self.processor.dry_run && self.store.dsn.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "store.dsn".to_owned(),
                reason: "dsn must not be empty unless dry_run is enabled".to_owned(),
            }
            .into());
        }

        if self.processor.log_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "processor.log_path".to_owned(),
                reason: "log path must not be empty".to_owned(),
            }
            .into());
        }

        if self.handlers.download_threshold_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "handlers.download_threshold_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 스토어 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// PostgreSQL 연결 문자열
    pub dsn: String,
    /// 시작 시 한 번 실행할 SQL 스크립트 경로 (빈 문자열이면 없음)
    pub setup_script: String,
    /// 배치 크기 (이 개수만큼 쌓이면 하나의 트랜잭션으로 플러시)
    pub batch_size: usize,
}

impl StoreConfig {
    /// 설정된 셋업 스크립트 경로를 반환합니다.
    pub fn setup_script_path(&self) -> Option<&Path> {
        non_empty_path(&self.setup_script)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dsn: "postgresql://localhost:5432/asvo".to_owned(),
            setup_script: String::new(),
            batch_size: 1000,
        }
    }
}

/// 로그 처리기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// 처리할 로그 디렉토리 (재귀 탐색)
    pub log_path: String,
    /// YAML 규칙 파일 경로 (빈 문자열이면 내장 규칙 사용)
    pub rules_path: String,
    /// dry-run 모드: 라인 처리 의도만 로깅하고 스토어를 변경하지 않음
    pub dry_run: bool,
}

impl ProcessorConfig {
    /// 설정된 규칙 파일 경로를 반환합니다.
    pub fn rules_file(&self) -> Option<&Path> {
        non_empty_path(&self.rules_path)
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            log_path: "../logs".to_owned(),
            rules_path: String::new(),
            dry_run: false,
        }
    }
}

/// 핸들러 정책 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HandlersConfig {
    /// 다운로드 세션 병합 임계값 (초)
    pub download_threshold_secs: u64,
    /// 시작 시 작업 이력 테이블을 비울지 여부 (파괴적, 기본 비활성)
    pub truncate_history_on_start: bool,
}

impl Default for HandlersConfig {
    fn default() -> Self {
        Self {
            download_threshold_secs: 60 * 60 * 24,
            truncate_history_on_start: false,
        }
    }
}

fn non_empty_path(value: &str) -> Option<&Path> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(Path::new(trimmed))
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}
