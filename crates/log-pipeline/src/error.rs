//! 로그 파이프라인 에러 타입
//!
//! [`LogPipelineError`]는 규칙 테이블 구성부터 라인 처리, 배치 실행까지
//! 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<LogPipelineError> for LogtrackError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logtrack_core::error::{LogtrackError, PipelineError, StorageError};

/// 로그 파이프라인 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogPipelineError {
    /// 정규식 컴파일 실패
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// 문제가 된 패턴 원문
        pattern: String,
        /// 컴파일 실패 사유
        reason: String,
    },

    /// 알 수 없는 핸들러 이름
    #[error("unknown handler: {0}")]
    UnknownHandler(String),

    /// 규칙 파일 로딩 실패
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 규칙 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 선택된 규칙 세트의 어떤 라인 패턴에도 매칭되지 않음
    #[error("no matching rule in {path} for line: {line}")]
    NoMatchingRule {
        /// 로그 파일 경로
        path: String,
        /// 원본 라인
        line: String,
    },

    /// 핸들러가 요구하는 캡처 그룹이 없음
    #[error("handler '{handler}' requires capture group {group}")]
    MissingCapture {
        /// 핸들러 이름
        handler: &'static str,
        /// 1부터 시작하는 그룹 번호
        group: usize,
    },

    /// 라인 페이로드(타임스탬프, ID, JSON 등) 해석 실패
    #[error("malformed payload for '{handler}': {reason}")]
    Payload {
        /// 핸들러 이름
        handler: &'static str,
        /// 실패 사유
        reason: String,
    },

    /// 로그 루트 디렉토리 탐색 실패
    #[error("walk error: {path}: {reason}")]
    Walk {
        /// 디렉토리 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 스토어 배치 실행 실패
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<LogPipelineError> for LogtrackError {
    fn from(err: LogPipelineError) -> Self {
        match err {
            LogPipelineError::Storage(e) => LogtrackError::Storage(e),
            LogPipelineError::Io(e) => LogtrackError::Io(e),
            e @ (LogPipelineError::InvalidPattern { .. }
            | LogPipelineError::UnknownHandler(_)
            | LogPipelineError::RuleLoad { .. }) => {
                LogtrackError::Pipeline(PipelineError::InitFailed(e.to_string()))
            }
            e => LogtrackError::Pipeline(PipelineError::Aborted(e.to_string())),
        }
    }
}
