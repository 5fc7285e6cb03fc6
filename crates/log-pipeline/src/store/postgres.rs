//! PostgreSQL 스토어 구현 (sqlx)

use std::str::FromStr;

use logtrack_core::error::StorageError;
use sqlx::postgres::{PgArguments, PgConnectOptions};
use sqlx::query::Query;
use sqlx::{Connection, Executor, PgConnection, Postgres};

use super::{Operation, SqlParam, Store};

/// PostgreSQL 스토어
///
/// 실행 전체에서 전용 커넥션 하나를 사용하며, 배치마다
/// `BEGIN ... COMMIT` 트랜잭션을 엽니다. 실패한 배치의 트랜잭션은
/// 드롭되면서 롤백됩니다.
///
/// # Examples
///
/// ```ignore
/// let store = PgStore::connect("postgresql://localhost:5432/asvo").await?;
/// let mut buffer = OperationBuffer::new(store, 1000);
/// ```
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    /// DSN으로 새 커넥션을 엽니다.
    ///
    /// # Errors
    ///
    /// DSN 형식이 잘못되었거나 연결에 실패하면 `StorageError::Connection`을 반환합니다.
    pub async fn connect(dsn: &str) -> Result<Self, StorageError> {
        let options = PgConnectOptions::from_str(dsn)
            .map_err(|e| StorageError::Connection(format!("invalid dsn: {e}")))?;

        tracing::info!(
            host = options.get_host(),
            port = options.get_port(),
            "connecting to database"
        );

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| StorageError::Connection(format!("failed to connect: {e}")))?;

        Ok(Self { conn })
    }

    /// 이미 열린 커넥션을 사용합니다.
    pub fn from_connection(conn: PgConnection) -> Self {
        Self { conn }
    }

    /// 커넥션을 정상 종료합니다.
    pub async fn close(self) -> Result<(), StorageError> {
        self.conn
            .close()
            .await
            .map_err(|e| StorageError::Connection(format!("failed to close connection: {e}")))
    }
}

impl Store for PgStore {
    async fn execute_batch(&mut self, ops: &[Operation]) -> Result<(), StorageError> {
        let mut tx = self
            .conn
            .begin()
            .await
            .map_err(|e| StorageError::Transaction(format!("begin failed: {e}")))?;

        for (index, op) in ops.iter().enumerate() {
            let result = match &op.params {
                None => tx.execute(sqlx::raw_sql(&op.statement)).await,
                Some(params) => {
                    let query = params.iter().fold(sqlx::query(&op.statement), bind_param);
                    tx.execute(query).await
                }
            };

            // 에러 반환 시 tx가 드롭되며 롤백됨
            if let Err(e) = result {
                tracing::error!(index, error = %e, "statement failed, rolling back batch");
                return Err(StorageError::Statement {
                    index,
                    reason: e.to_string(),
                });
            }
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Transaction(format!("commit failed: {e}")))
    }
}

fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &'q SqlParam,
) -> Query<'q, Postgres, PgArguments> {
    match param {
        SqlParam::Int(v) => query.bind(*v),
        SqlParam::Text(v) => query.bind(v.as_str()),
        SqlParam::Timestamp(v) => query.bind(*v),
        SqlParam::Json(v) => query.bind(sqlx::types::Json(v)),
    }
}
