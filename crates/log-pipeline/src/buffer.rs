//! 연산 버퍼 -- 배치 단위 트랜잭션 플러시
//!
//! [`OperationBuffer`]는 스토어 연산을 큐에 쌓아 두었다가
//! 배치 크기에 도달하거나 강제 플러시가 요청되면 하나의 트랜잭션으로 실행합니다.
//!
//! # 보장
//! - 연산은 큐에 들어온 순서 그대로 실행됩니다.
//! - 배치는 전부 커밋되거나 전부 롤백됩니다.
//! - 플러시가 실패하면 큐는 비워지지 않으며, 에러가 호출자에게 전파됩니다.

use std::path::Path;

use logtrack_core::metrics as m;

use crate::error::LogPipelineError;
use crate::store::{Operation, Store};

/// 기본 배치 크기
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// 배치 트랜잭션 연산 버퍼
pub struct OperationBuffer<S> {
    /// 배치 실행 대상 스토어
    store: S,
    /// 대기 중인 연산
    ops: Vec<Operation>,
    /// 자동 플러시 임계값
    batch_size: usize,
    /// 커밋된 배치 수 (통계용)
    batches_flushed: u64,
    /// 커밋된 연산 수 (통계용)
    ops_executed: u64,
}

impl<S: Store> OperationBuffer<S> {
    /// 새 버퍼를 생성합니다.
    ///
    /// `batch_size`가 0이면 1로 취급합니다.
    pub fn new(store: S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            store,
            ops: Vec::with_capacity(batch_size.min(10_000)),
            batch_size,
            batches_flushed: 0,
            ops_executed: 0,
        }
    }

    /// 연산을 큐에 추가합니다.
    ///
    /// 큐 길이가 배치 크기에 도달하거나 `force_flush`가 참이면
    /// 큐 전체를 즉시 플러시합니다.
    pub async fn queue(
        &mut self,
        op: Operation,
        force_flush: bool,
    ) -> Result<(), LogPipelineError> {
        self.ops.push(op);
        metrics::gauge!(m::BUFFER_PENDING_OPERATIONS).set(self.ops.len() as f64);

        if force_flush || self.ops.len() >= self.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    /// 대기 중인 모든 연산을 하나의 트랜잭션으로 실행합니다.
    ///
    /// 큐가 비어 있으면 스토어를 호출하지 않습니다.
    pub async fn flush(&mut self) -> Result<(), LogPipelineError> {
        if self.ops.is_empty() {
            return Ok(());
        }

        let count = self.ops.len();
        tracing::info!(count, "running batch");

        match self.store.execute_batch(&self.ops).await {
            Ok(()) => {
                self.ops.clear();
                self.batches_flushed += 1;
                self.ops_executed += count as u64;
                metrics::counter!(m::BATCHES_FLUSHED_TOTAL).increment(1);
                metrics::counter!(m::OPERATIONS_EXECUTED_TOTAL).increment(count as u64);
                metrics::gauge!(m::BUFFER_PENDING_OPERATIONS).set(0.0);
                Ok(())
            }
            Err(e) => {
                metrics::counter!(m::BATCHES_FAILED_TOTAL).increment(1);
                tracing::error!(count, error = %e, "could not execute batch");
                Err(e.into())
            }
        }
    }

    /// 셋업 스크립트를 읽어 강제 플러시 연산으로 실행합니다.
    ///
    /// 파일을 읽을 수 없으면 에러 로그를 남기고 계속 진행합니다.
    pub async fn run_script(&mut self, path: impl AsRef<Path>) -> Result<(), LogPipelineError> {
        let path = path.as_ref();
        let script = match tokio::fs::read_to_string(path).await {
            Ok(script) => script,
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "could not open the database setup script"
                );
                return Ok(());
            }
        };

        tracing::info!(path = %path.display(), "running db setup script");
        self.queue(Operation::raw(script), true).await
    }

    /// 대기 중인 연산 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// 대기 중인 연산이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// 대기 중인 연산을 순서대로 반환합니다.
    pub fn pending(&self) -> &[Operation] {
        &self.ops
    }

    /// 배치 크기를 반환합니다.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// 커밋된 배치 수를 반환합니다.
    pub fn batches_flushed(&self) -> u64 {
        self.batches_flushed
    }

    /// 커밋된 연산 수를 반환합니다.
    pub fn ops_executed(&self) -> u64 {
        self.ops_executed
    }

    /// 스토어에 대한 불변 참조를 반환합니다.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 버퍼를 해체하여 스토어를 돌려받습니다.
    ///
    /// 대기 중인 연산은 버려집니다.
    pub fn into_store(self) -> S {
        self.store
    }
}
