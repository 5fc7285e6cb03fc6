//! 에러 타입 — 도메인별 에러 정의

/// logtrack 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogtrackError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스토리지 에러
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// 파이프라인 처리 에러
    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스토리지 에러
///
/// 배치 실행 중 발생한 에러는 해당 트랜잭션이 롤백된 뒤에 반환됩니다.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// 연결 실패
    #[error("connection failed: {0}")]
    Connection(String),

    /// 배치 내 개별 구문 실행 실패
    #[error("statement {index} failed: {reason}")]
    Statement { index: usize, reason: String },

    /// 트랜잭션 시작/커밋 실패
    #[error("transaction failed: {0}")]
    Transaction(String),
}

/// 파이프라인 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 파이프라인 초기화 실패 (규칙 테이블, 핸들러 구성 등)
    #[error("pipeline init failed: {0}")]
    InitFailed(String),

    /// 실행 중 치명적 에러로 중단됨
    #[error("run aborted: {0}")]
    Aborted(String),
}
