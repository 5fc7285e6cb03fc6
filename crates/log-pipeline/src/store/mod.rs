//! 스토어 커넥터 -- 관계형 스토어와의 경계
//!
//! [`Store`] trait은 "순서 있는 연산 목록을 하나의 트랜잭션에서 실행"하는
//! 단일 계약만 노출합니다. 배치 중 하나라도 실패하면 전체가 롤백되어야 합니다.
//!
//! - [`PgStore`]: PostgreSQL 구현 (sqlx, 전용 커넥션 하나)
//! - [`DryRunStore`]: 배치를 받아서 버리는 구현 (dry-run 모드)

mod postgres;

pub use postgres::PgStore;

use std::future::Future;

use chrono::NaiveDateTime;
use logtrack_core::error::StorageError;

/// 위치 기반 SQL 파라미터
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    /// 정수 (BIGINT)
    Int(i64),
    /// 문자열 (TEXT)
    Text(String),
    /// 시간대 없는 타임스탬프 (TIMESTAMP)
    Timestamp(NaiveDateTime),
    /// JSON 문서 (JSONB)
    Json(serde_json::Value),
}

impl SqlParam {
    /// 정수 값을 반환합니다.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// 문자열 값을 반환합니다.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// 타임스탬프 값을 반환합니다.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// JSON 값을 반환합니다.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(v) => Some(v),
            _ => None,
        }
    }
}

/// 스토어에 실행할 연산 하나
///
/// `params`가 `None`이면 구문을 원문 그대로 실행합니다.
/// 이 경우 여러 구문이 포함될 수 있습니다 (셋업 스크립트).
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    /// SQL 구문
    pub statement: String,
    /// 위치 기반 파라미터
    pub params: Option<Vec<SqlParam>>,
}

impl Operation {
    /// 파라미터가 있는 연산을 생성합니다.
    pub fn new(statement: impl Into<String>, params: Vec<SqlParam>) -> Self {
        Self {
            statement: statement.into(),
            params: Some(params),
        }
    }

    /// 파라미터 없이 원문 그대로 실행할 연산을 생성합니다.
    pub fn raw(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            params: None,
        }
    }
}

/// 관계형 스토어 추상화
///
/// 구현체는 `execute_batch` 한 번을 하나의 트랜잭션으로 취급해야 합니다.
/// 모든 연산이 순서대로 성공하면 커밋하고, 하나라도 실패하면 롤백한 뒤
/// 에러를 반환합니다.
///
/// # Errors
///
/// - `StorageError::Transaction`: 트랜잭션 시작 또는 커밋 실패
/// - `StorageError::Statement`: 배치 내 `index`번째 연산 실패 (이미 롤백됨)
pub trait Store: Send + 'static {
    /// 연산 목록을 하나의 트랜잭션에서 순서대로 실행합니다.
    fn execute_batch(
        &mut self,
        ops: &[Operation],
    ) -> impl Future<Output = Result<(), StorageError>> + Send;
}

/// dry-run 스토어
///
/// 배치를 받아서 개수만 기록하고 아무 것도 실행하지 않습니다.
#[derive(Debug, Default)]
pub struct DryRunStore {
    discarded: usize,
}

impl DryRunStore {
    /// 새 dry-run 스토어를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 지금까지 버려진 연산 수를 반환합니다.
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl Store for DryRunStore {
    async fn execute_batch(&mut self, ops: &[Operation]) -> Result<(), StorageError> {
        tracing::debug!(count = ops.len(), "dry run, discarding batch");
        self.discarded += ops.len();
        Ok(())
    }
}

/// 테스트용 Mock 스토어
///
/// 커밋된 배치를 순서대로 기록하며, 지정한 호출에서 실패를 시뮬레이션할 수 있습니다.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MockStore {
    /// 커밋된 배치 목록
    pub batches: Vec<Vec<Operation>>,
    /// 이 번호(0부터)의 `execute_batch` 호출을 실패시킴
    pub fail_on_call: Option<usize>,
    calls: usize,
}

#[cfg(test)]
impl MockStore {
    /// 빈 mock 스토어를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// `call`번째 배치 실행이 실패하도록 설정합니다.
    pub fn failing_on(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    /// 커밋된 모든 연산을 순서대로 반환합니다.
    pub fn committed(&self) -> Vec<&Operation> {
        self.batches.iter().flatten().collect()
    }
}

#[cfg(test)]
impl Store for MockStore {
    async fn execute_batch(&mut self, ops: &[Operation]) -> Result<(), StorageError> {
        let call = self.calls;
        self.calls += 1;
        if self.fail_on_call == Some(call) {
            return Err(StorageError::Statement {
                index: 0,
                reason: "mock failure".to_owned(),
            });
        }
        self.batches.push(ops.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dry_run_store_discards_everything() {
        let mut store = DryRunStore::new();
        store
            .execute_batch(&[Operation::raw("SELECT 1"), Operation::raw("SELECT 2")])
            .await
            .unwrap();
        assert_eq!(store.discarded(), 2);
    }

    #[tokio::test]
    async fn mock_store_records_and_fails_on_demand() {
        let mut store = MockStore::new().failing_on(1);
        store
            .execute_batch(&[Operation::raw("SELECT 1")])
            .await
            .unwrap();
        let err = store
            .execute_batch(&[Operation::raw("SELECT 2")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Statement { .. }));
        assert_eq!(store.batches.len(), 1);
    }

    #[test]
    fn sql_param_accessors() {
        assert_eq!(SqlParam::Int(7).as_int(), Some(7));
        assert_eq!(SqlParam::Text("a".to_owned()).as_text(), Some("a"));
        assert!(SqlParam::Int(7).as_text().is_none());
        assert!(SqlParam::Json(serde_json::json!({})).as_json().is_some());
    }
}
