//! 규칙 파일 로더 -- YAML 규칙 파일을 디스크에서 로드합니다.
//!
//! 규칙 파일은 규칙 세트의 시퀀스이며, 파일 내 선언 순서가 곧 매칭 우선순위입니다.
//! 내장 규칙은 빌드 시 `rules/asvo.yml`에서 임베드됩니다.

use std::path::Path;

use crate::error::LogPipelineError;

use super::types::RuleSetSpec;

/// 규칙 파일 로더 설정
const MAX_RULE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const MAX_RULES_COUNT: usize = 10_000;

/// 내장 규칙 원문
const BUILTIN_RULES: &str = include_str!("../../rules/asvo.yml");

/// 규칙 파일 로더
pub struct RuleLoader;

impl RuleLoader {
    /// 단일 YAML 파일에서 규칙 세트 목록을 로드합니다.
    ///
    /// # Errors
    /// - 파일을 읽을 수 없거나 크기가 `MAX_RULE_FILE_SIZE`를 초과하는 경우
    /// - YAML 형식이 잘못되었거나 라인 규칙 수가 `MAX_RULES_COUNT`를 초과하는 경우
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Vec<RuleSetSpec>, LogPipelineError> {
        let path = path.as_ref();

        // 파일 크기 검증
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| LogPipelineError::RuleLoad {
                path: path.display().to_string(),
                reason: format!("failed to read file metadata: {e}"),
            })?;

        if metadata.len() > MAX_RULE_FILE_SIZE {
            return Err(LogPipelineError::RuleLoad {
                path: path.display().to_string(),
                reason: format!(
                    "file too large: {} bytes (max: {MAX_RULE_FILE_SIZE})",
                    metadata.len()
                ),
            });
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| LogPipelineError::RuleLoad {
                    path: path.display().to_string(),
                    reason: format!("failed to read file: {e}"),
                })?;

        let specs = Self::parse_yaml(&content, &path.display().to_string())?;

        tracing::info!(
            path = %path.display(),
            rulesets = specs.len(),
            "loaded rule file"
        );

        Ok(specs)
    }

    /// YAML 문자열을 파싱하여 규칙 세트 목록을 생성합니다.
    pub fn parse_yaml(yaml_str: &str, source: &str) -> Result<Vec<RuleSetSpec>, LogPipelineError> {
        let specs: Vec<RuleSetSpec> =
            serde_yaml::from_str(yaml_str).map_err(|e| LogPipelineError::RuleLoad {
                path: source.to_owned(),
                reason: format!("YAML parse error: {e}"),
            })?;

        let total: usize = specs.iter().map(|spec| spec.rules.len()).sum();
        if total > MAX_RULES_COUNT {
            return Err(LogPipelineError::RuleLoad {
                path: source.to_owned(),
                reason: format!("too many rules: {total} (max {MAX_RULES_COUNT})"),
            });
        }

        Ok(specs)
    }

    /// 내장 규칙 세트를 반환합니다.
    pub fn builtin() -> Result<Vec<RuleSetSpec>, LogPipelineError> {
        Self::parse_yaml(BUILTIN_RULES, "<builtin>")
    }
}
