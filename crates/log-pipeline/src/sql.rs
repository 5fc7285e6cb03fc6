//! 작업 이력 테이블에 대한 SQL 구문
//!
//! 파라미터는 PostgreSQL 위치 기반 자리표시자(`$1`, `$2`, ...)를 사용합니다.
//! 테이블 정의는 저장소 루트의 `sql/schema.sql`을 참고하세요.

/// 작업 상태 코드 (`jobs_history.job_state`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum JobState {
    /// 대기 중
    Queued = 0,
    /// 처리 중
    Processing = 1,
    /// 완료
    Complete = 2,
    /// 실패
    Error = 3,
    /// 만료
    Expired = 4,
    /// 취소
    Cancelled = 5,
}

impl JobState {
    /// 저장되는 정수 코드를 반환합니다.
    pub fn code(self) -> i64 {
        self as i64
    }
}

/// 새 작업 삽입. 같은 ID가 이미 있으면 무시합니다.
///
/// `$1` id, `$2` job_type, `$3` user_id, `$4` job_params, `$5` job_state, `$6` created, `$7` started
pub const INSERT_JOB: &str = "\
INSERT INTO jobs_history (id, job_type, user_id, job_params, job_state, created, started)
VALUES ($1, $2, $3, $4, $5, $6, $7)
ON CONFLICT DO NOTHING";

/// 처리 중인 작업만 취소 상태로 변경합니다.
///
/// `$1` job_state(취소), `$2` completed, `$3` id, `$4` job_state(처리 중)
pub const CANCEL_JOB: &str = "\
UPDATE jobs_history
SET job_state = $1, completed = $2
WHERE id = $3 AND job_state = $4";

/// 작업을 완료 상태로 변경합니다. 현재 상태와 무관하게 덮어씁니다.
///
/// `$1` job_state(완료), `$2` product, `$3` completed, `$4` id
pub const COMPLETE_JOB: &str = "\
UPDATE jobs_history
SET job_state = $1, product = $2, completed = $3
WHERE id = $4";

/// 종료 시점까지 처리 중으로 남은 작업을 실패로 표시합니다.
///
/// `$1` job_state(실패)
pub const FAIL_PROCESSING_JOBS: &str = "\
UPDATE jobs_history
SET error_code = 1, error_text = 'Job Failed', completed = started, job_state = $1
WHERE job_state = 1";

/// 관측 데이터 다운로드 요청 삽입
///
/// `$1` created, `$2` ip_address, `$3` obs_id
pub const INSERT_OBS_REQUEST: &str = "\
INSERT INTO obsdownload_history (created, ip_address, obs_id)
VALUES ($1, $2, $3)
ON CONFLICT DO NOTHING";

/// 집계된 NGAS 다운로드 세션 삽입
///
/// `$1` completed, `$2` obs_id, `$3` num_files
pub const INSERT_DOWNLOAD: &str = "\
INSERT INTO ngas_history (completed, obs_id, num_files)
VALUES ($1, $2, $3)
ON CONFLICT DO NOTHING";

/// 작업 이력 전체 삭제 (시작 시 선택적으로 실행)
pub const TRUNCATE_JOBS: &str = "TRUNCATE TABLE jobs_history";
