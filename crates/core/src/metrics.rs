//! 메트릭 상수 및 설명 등록
//!
//! 파이프라인이 기록하는 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`
//! 매크로를 호출합니다. 레코더가 설치되지 않은 경우 호출은 아무 효과가 없습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logtrack_`
//! - 접미어: `_total` (counter), 없음 (gauge)
//!
//! # 사용 예시
//!
//! ```ignore
//! use logtrack_core::metrics;
//!
//! metrics::counter!(metrics::LINES_PROCESSED_TOTAL).increment(1);
//! ```

/// 핸들러 레이블 키 (skip, consumed_message, cancel, ...)
pub const LABEL_HANDLER: &str = "handler";

/// 처리된 로그 라인 수 (counter, label: handler)
pub const LINES_PROCESSED_TOTAL: &str = "logtrack_lines_processed_total";

/// 어떤 규칙에도 매칭되지 않은 라인 수 (counter)
pub const LINES_UNMATCHED_TOTAL: &str = "logtrack_lines_unmatched_total";

/// 처리된 파일 수 (counter)
pub const FILES_PROCESSED_TOTAL: &str = "logtrack_files_processed_total";

/// 규칙 없음/읽기 실패로 건너뛴 파일 수 (counter)
pub const FILES_SKIPPED_TOTAL: &str = "logtrack_files_skipped_total";

/// 커밋된 배치 수 (counter)
pub const BATCHES_FLUSHED_TOTAL: &str = "logtrack_batches_flushed_total";

/// 실행된 스토어 연산 수 (counter)
pub const OPERATIONS_EXECUTED_TOTAL: &str = "logtrack_operations_executed_total";

/// 롤백된 배치 수 (counter)
pub const BATCHES_FAILED_TOTAL: &str = "logtrack_batches_failed_total";

/// 종료 시 스토어로 내보낸 다운로드 세션 수 (counter)
pub const DOWNLOAD_SESSIONS_TOTAL: &str = "logtrack_download_sessions_total";

/// 현재 버퍼에 대기 중인 연산 수 (gauge)
pub const BUFFER_PENDING_OPERATIONS: &str = "logtrack_buffer_pending_operations";

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 시작 시 한 번 호출합니다. 전역 레코더가 없으면 아무 일도 하지 않습니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge};

    describe_counter!(
        LINES_PROCESSED_TOTAL,
        "Log lines dispatched to a handler, by handler"
    );
    describe_counter!(
        LINES_UNMATCHED_TOTAL,
        "Log lines that matched no rule in their ruleset"
    );
    describe_counter!(FILES_PROCESSED_TOTAL, "Log files processed to completion");
    describe_counter!(
        FILES_SKIPPED_TOTAL,
        "Files skipped because no ruleset applied or they could not be read"
    );
    describe_counter!(BATCHES_FLUSHED_TOTAL, "Operation batches committed");
    describe_counter!(
        OPERATIONS_EXECUTED_TOTAL,
        "Store operations executed inside committed batches"
    );
    describe_counter!(BATCHES_FAILED_TOTAL, "Operation batches rolled back");
    describe_counter!(
        DOWNLOAD_SESSIONS_TOTAL,
        "Download sessions written to the store at shutdown"
    );
    describe_gauge!(
        BUFFER_PENDING_OPERATIONS,
        "Operations queued and not yet flushed"
    );
}
