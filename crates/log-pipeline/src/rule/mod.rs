//! 규칙 테이블 -- 파일별 규칙 세트 선택과 순서 있는 라인 매칭
//!
//! 규칙 테이블은 (파일 패턴 -> 순서 있는 라인 패턴 -> 핸들러) 매핑입니다.
//!
//! - 파일 패턴은 전체 경로에 대한 부분 검색이며, 먼저 선언된 규칙 세트가 우선합니다.
//! - 라인 패턴은 줄 시작에 고정되어 매칭되며(`^(?:pattern)`), 선언 순서대로 시도합니다.
//! - 핸들러 이름은 테이블 생성 시 [`HandlerKind`]로 해석되며, 알 수 없는 이름은 거부됩니다.
//!
//! # 아키텍처
//! - [`RuleTable`]: 컴파일된 규칙 세트 목록
//! - [`loader`]: YAML 파일 로딩 및 내장 규칙
//! - [`types`]: 규칙 데이터 구조와 핸들러 식별자

pub mod loader;
pub mod types;

pub use loader::RuleLoader;
pub use types::{HandlerKind, LineRuleSpec, RuleSetSpec};

use std::path::Path;

use regex::{Captures, Regex};

use crate::error::LogPipelineError;

/// 컴파일된 라인 규칙
#[derive(Debug, Clone)]
pub struct LineRule {
    /// 설정에 적힌 패턴 원문
    source: String,
    /// 줄 시작에 고정된 정규식
    regex: Regex,
    /// 매칭 시 호출할 핸들러
    handler: HandlerKind,
}

impl LineRule {
    /// 라인 규칙을 컴파일합니다.
    pub fn compile(pattern: &str, handler: HandlerKind) -> Result<Self, LogPipelineError> {
        let regex = Regex::new(&format!("^(?:{pattern})")).map_err(|e| {
            LogPipelineError::InvalidPattern {
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            source: pattern.to_owned(),
            regex,
            handler,
        })
    }

    /// 설정에 적힌 패턴 원문을 반환합니다.
    pub fn pattern(&self) -> &str {
        &self.source
    }

    /// 이 규칙의 핸들러를 반환합니다.
    pub fn handler(&self) -> HandlerKind {
        self.handler
    }
}

/// 하나의 파일 패턴에 속한 규칙 세트
#[derive(Debug, Clone)]
pub struct RuleSet {
    files: Regex,
    rules: Vec<LineRule>,
}

impl RuleSet {
    /// 파일 패턴 원문을 반환합니다.
    pub fn file_pattern(&self) -> &str {
        self.files.as_str()
    }

    /// 선언 순서대로 정렬된 라인 규칙을 반환합니다.
    pub fn rules(&self) -> &[LineRule] {
        &self.rules
    }

    /// 라인에 처음으로 매칭되는 규칙의 핸들러와 캡처를 반환합니다.
    ///
    /// 어떤 규칙도 매칭되지 않으면 `None`을 반환합니다.
    pub fn match_line<'l>(&self, line: &'l str) -> Option<(HandlerKind, Captures<'l>)> {
        self.rules
            .iter()
            .find_map(|rule| rule.regex.captures(line).map(|caps| (rule.handler, caps)))
    }

    fn matches_path(&self, path: &str) -> bool {
        self.files.is_match(path)
    }
}

/// 규칙 테이블
///
/// # 사용 예시
/// ```ignore
/// let table = RuleTable::builtin()?;
///
/// if let Some(ruleset) = table.ruleset_for(Path::new("/logs/proxy.log.1")) {
///     if let Some((handler, captures)) = ruleset.match_line(line) {
///         // 핸들러 호출
///     }
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RuleTable {
    rulesets: Vec<RuleSet>,
}

impl RuleTable {
    /// 규칙 세트 정의에서 테이블을 생성합니다.
    ///
    /// # Errors
    /// - 파일 패턴 또는 라인 패턴이 유효한 정규식이 아닌 경우
    /// - 알 수 없는 핸들러 이름이 포함된 경우
    pub fn from_specs(specs: Vec<RuleSetSpec>) -> Result<Self, LogPipelineError> {
        let mut rulesets = Vec::with_capacity(specs.len());

        for spec in specs {
            let files = Regex::new(&spec.files).map_err(|e| LogPipelineError::InvalidPattern {
                pattern: spec.files.clone(),
                reason: e.to_string(),
            })?;

            let rules = spec
                .rules
                .iter()
                .map(|rule| {
                    let handler = rule.handler.parse::<HandlerKind>()?;
                    LineRule::compile(&rule.pattern, handler)
                })
                .collect::<Result<Vec<_>, _>>()?;

            if rules.is_empty() {
                tracing::warn!(
                    files = %spec.files,
                    "ruleset has no line rules, every line of a matching file will be rejected"
                );
            }

            rulesets.push(RuleSet { files, rules });
        }

        Ok(Self { rulesets })
    }

    /// 내장 규칙으로 테이블을 생성합니다.
    pub fn builtin() -> Result<Self, LogPipelineError> {
        Self::from_specs(RuleLoader::builtin()?)
    }

    /// YAML 규칙 파일에서 테이블을 생성합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogPipelineError> {
        Self::from_specs(RuleLoader::load_file(path).await?)
    }

    /// 경로에 적용할 규칙 세트를 반환합니다.
    ///
    /// 파일 패턴이 경로의 어느 부분과든 매칭되는 첫 번째 규칙 세트가 선택됩니다.
    pub fn ruleset_for(&self, path: &Path) -> Option<&RuleSet> {
        let path = path.to_string_lossy();
        self.rulesets.iter().find(|set| set.matches_path(&path))
    }

    /// 모든 규칙 세트를 선언 순서대로 반환합니다.
    pub fn rulesets(&self) -> &[RuleSet] {
        &self.rulesets
    }

    /// 전체 라인 규칙 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.rulesets.iter().map(|set| set.rules.len()).sum()
    }
}
