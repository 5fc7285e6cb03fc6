//! 규칙 데이터 타입
//!
//! YAML 규칙 파일에서 역직렬화되는 구조체와 핸들러 식별자를 정의합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LogPipelineError;

/// 라인 핸들러 식별자
///
/// 규칙 설정은 핸들러를 snake_case 이름으로 지정하며,
/// 규칙 테이블 생성 시 이 열거형으로 한 번만 해석됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// 아무 것도 하지 않음 (catch-all 용)
    Skip,
    /// 작업 생성
    ConsumedMessage,
    /// 작업 취소
    Cancel,
    /// 작업 완료
    Complete,
    /// 관측 데이터 다운로드 요청
    Query,
    /// NGAS 파일 조회
    NgasRetrieve,
}

impl HandlerKind {
    /// 모든 핸들러 식별자
    pub const ALL: [HandlerKind; 6] = [
        HandlerKind::Skip,
        HandlerKind::ConsumedMessage,
        HandlerKind::Cancel,
        HandlerKind::Complete,
        HandlerKind::Query,
        HandlerKind::NgasRetrieve,
    ];

    /// 설정에서 사용하는 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::ConsumedMessage => "consumed_message",
            Self::Cancel => "cancel",
            Self::Complete => "complete",
            Self::Query => "query",
            Self::NgasRetrieve => "ngas_retrieve",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlerKind {
    type Err = LogPipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| LogPipelineError::UnknownHandler(s.to_owned()))
    }
}

/// 규칙 세트 정의 -- 파일 패턴 하나와 순서 있는 라인 규칙 목록
///
/// # YAML 스키마
/// ```yaml
/// - files: 'proxy\.log.*'
///   rules:
///     - pattern: '(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}),.*RETRIEVE\?file_id=(\d+_\d+.*)'
///       handler: ngas_retrieve
///     - pattern: '.*'
///       handler: skip
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetSpec {
    /// 파일 경로에 대해 부분 검색되는 정규식
    pub files: String,
    /// 선언 순서대로 시도되는 라인 규칙
    #[serde(default)]
    pub rules: Vec<LineRuleSpec>,
}

/// 라인 규칙 정의
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineRuleSpec {
    /// 줄 시작에 고정되어 매칭되는 정규식
    pub pattern: String,
    /// 매칭 시 호출할 핸들러 이름
    pub handler: String,
}

impl LineRuleSpec {
    /// 테스트와 내장 규칙 구성을 위한 생성자
    pub fn new(pattern: impl Into<String>, handler: HandlerKind) -> Self {
        Self {
            pattern: pattern.into(),
            handler: handler.as_str().to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handler_kind_parses_every_name() {
        for kind in HandlerKind::ALL {
            assert_eq!(kind.as_str().parse::<HandlerKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_handler_name_is_rejected() {
        let err = "job_queued".parse::<HandlerKind>().unwrap_err();
        assert!(matches!(err, LogPipelineError::UnknownHandler(name) if name == "job_queued"));
    }

    #[test]
    fn handler_kind_serde_uses_snake_case() {
        let yaml = serde_yaml::to_string(&HandlerKind::NgasRetrieve).unwrap();
        assert_eq!(yaml.trim(), "ngas_retrieve");
    }

    #[test]
    fn ruleset_spec_defaults_to_empty_rules() {
        let spec: RuleSetSpec = serde_yaml::from_str("files: 'x.log'").unwrap();
        assert!(spec.rules.is_empty());
    }
}
