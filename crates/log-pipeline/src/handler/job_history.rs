//! 작업 이력 핸들러 세트
//!
//! 다운로드/변환 프로세서 로그와 NGAS 프록시 로그를 `jobs_history`,
//! `obsdownload_history`, `ngas_history` 테이블 연산으로 변환합니다.
//!
//! | 핸들러 | 캡처 그룹 | 연산 |
//! |---|---|---|
//! | `consumed_message` | 1 시각, 2 작업 ID, 3 유형, 4 사용자 ID, 5 파라미터 | [`sql::INSERT_JOB`] |
//! | `cancel` | 1 시각, 2 작업 ID | [`sql::CANCEL_JOB`] |
//! | `complete` | 1 시각, 2 작업 ID, 3 결과물 | [`sql::COMPLETE_JOB`] |
//! | `query` | 1 시각, 2 클라이언트 주소, 3 관측 ID 목록 | [`sql::INSERT_OBS_REQUEST`] |
//! | `ngas_retrieve` | 1 시각, 3 파일명 | 집계기에 기록, 종료 시 [`sql::INSERT_DOWNLOAD`] |

use chrono::NaiveDateTime;
use logtrack_core::metrics as m;

use super::{LineContext, LineHandler};
use crate::aggregator::{DEFAULT_THRESHOLD_SECS, DownloadAggregator};
use crate::buffer::OperationBuffer;
use crate::error::LogPipelineError;
use crate::rule::HandlerKind;
use crate::sql::{self, JobState};
use crate::store::{Operation, SqlParam, Store};

/// 로그 타임스탬프 형식
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 관측 ID 자릿수
const OBS_ID_LEN: usize = 10;

/// 핸들러 정책
#[derive(Debug, Clone)]
pub struct HandlerOptions {
    /// 다운로드 세션 병합 임계값 (초)
    pub download_threshold_secs: u64,
    /// 시작 시 작업 이력 테이블을 비울지 여부
    pub truncate_on_start: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            download_threshold_secs: DEFAULT_THRESHOLD_SECS,
            truncate_on_start: false,
        }
    }
}

/// 작업 이력 핸들러 세트
///
/// 연산 버퍼와 다운로드 집계기를 소유하며, 실행이 끝나면
/// 집계된 세션을 스토어로 내보내고 최종 플러시를 수행합니다.
pub struct JobHistoryHandler<S> {
    buffer: OperationBuffer<S>,
    downloads: DownloadAggregator,
    options: HandlerOptions,
}

impl<S: Store> JobHistoryHandler<S> {
    /// 새 핸들러 세트를 생성합니다.
    pub fn new(buffer: OperationBuffer<S>, options: HandlerOptions) -> Self {
        let downloads = DownloadAggregator::with_threshold_secs(options.download_threshold_secs);
        Self {
            buffer,
            downloads,
            options,
        }
    }

    /// 연산 버퍼에 대한 불변 참조를 반환합니다.
    pub fn buffer(&self) -> &OperationBuffer<S> {
        &self.buffer
    }

    /// 다운로드 집계기에 대한 불변 참조를 반환합니다.
    pub fn downloads(&self) -> &DownloadAggregator {
        &self.downloads
    }

    /// 핸들러를 해체하여 연산 버퍼를 돌려받습니다.
    pub fn into_buffer(self) -> OperationBuffer<S> {
        self.buffer
    }

    async fn consumed_message(&mut self, ctx: &LineContext<'_>) -> Result<(), LogPipelineError> {
        const KIND: HandlerKind = HandlerKind::ConsumedMessage;

        let timestamp = parse_timestamp(KIND, ctx.group(KIND, 1)?)?;
        let job_id = parse_id(KIND, "job_id", ctx.group(KIND, 2)?)?;
        let job_type = ctx.group(KIND, 3)?.trim();
        let user_id = parse_id(KIND, "user_id", ctx.group(KIND, 4)?)?;
        let job_params = parse_payload(KIND, &ctx.group(KIND, 5)?.replace('\'', "\""))?;

        tracing::info!(job_id, "job created");

        let op = Operation::new(
            sql::INSERT_JOB,
            vec![
                SqlParam::Int(job_id),
                SqlParam::Text(job_type.to_owned()),
                SqlParam::Int(user_id),
                SqlParam::Json(job_params),
                SqlParam::Int(JobState::Processing.code()),
                SqlParam::Timestamp(timestamp),
                SqlParam::Timestamp(timestamp),
            ],
        );
        self.buffer.queue(op, false).await
    }

    async fn cancel(&mut self, ctx: &LineContext<'_>) -> Result<(), LogPipelineError> {
        const KIND: HandlerKind = HandlerKind::Cancel;

        let timestamp = parse_timestamp(KIND, ctx.group(KIND, 1)?)?;
        let job_id = parse_id(KIND, "job_id", ctx.group(KIND, 2)?)?;

        tracing::info!(job_id, "job cancelled");

        let op = Operation::new(
            sql::CANCEL_JOB,
            vec![
                SqlParam::Int(JobState::Cancelled.code()),
                SqlParam::Timestamp(timestamp),
                SqlParam::Int(job_id),
                SqlParam::Int(JobState::Processing.code()),
            ],
        );
        self.buffer.queue(op, false).await
    }

    async fn complete(&mut self, ctx: &LineContext<'_>) -> Result<(), LogPipelineError> {
        const KIND: HandlerKind = HandlerKind::Complete;

        let timestamp = parse_timestamp(KIND, ctx.group(KIND, 1)?)?;
        let job_id = parse_id(KIND, "job_id", ctx.group(KIND, 2)?)?;
        let normalised = ctx
            .group(KIND, 3)?
            .replace('\'', "\"")
            .replace("None", "null");
        let product = parse_payload(KIND, &normalised)?;

        tracing::info!(job_id, "job completed");

        let op = Operation::new(
            sql::COMPLETE_JOB,
            vec![
                SqlParam::Int(JobState::Complete.code()),
                SqlParam::Json(product),
                SqlParam::Timestamp(timestamp),
                SqlParam::Int(job_id),
            ],
        );
        self.buffer.queue(op, false).await
    }

    async fn query(&mut self, ctx: &LineContext<'_>) -> Result<(), LogPipelineError> {
        const KIND: HandlerKind = HandlerKind::Query;

        let created = parse_timestamp(KIND, ctx.group(KIND, 1)?)?;
        let ip_address = ctx.group(KIND, 2)?;
        let obs_ids = ctx.group(KIND, 3)?;

        for obs_id in obs_ids.split(',') {
            // 첫 번째 잘못된 ID에서 라인의 나머지 ID는 버림
            let Some(obs_id) = parse_obs_id(obs_id) else {
                tracing::error!(
                    obs_id,
                    path = %ctx.file_path.display(),
                    "invalid obs_id"
                );
                return Ok(());
            };

            tracing::info!(obs_id, ip_address, "observation download requested");

            let op = Operation::new(
                sql::INSERT_OBS_REQUEST,
                vec![
                    SqlParam::Timestamp(created),
                    SqlParam::Text(ip_address.to_owned()),
                    SqlParam::Int(obs_id),
                ],
            );
            self.buffer.queue(op, false).await?;
        }
        Ok(())
    }

    fn ngas_retrieve(&mut self, ctx: &LineContext<'_>) -> Result<(), LogPipelineError> {
        const KIND: HandlerKind = HandlerKind::NgasRetrieve;

        let timestamp = parse_timestamp(KIND, ctx.group(KIND, 1)?)?;
        let filename = ctx.group(KIND, 3)?;
        let prefix = filename.split('_').next().unwrap_or(filename);
        let obs_id = parse_id(KIND, "obs_id", prefix)?;

        tracing::info!(filename, obs_id, "processing file");
        self.downloads.record(obs_id, filename, timestamp);
        Ok(())
    }
}

impl<S: Store> LineHandler for JobHistoryHandler<S> {
    async fn startup(&mut self) -> Result<(), LogPipelineError> {
        tracing::info!("starting processing");

        if self.options.truncate_on_start {
            tracing::warn!("truncating job history before processing");
            self.buffer
                .queue(Operation::raw(sql::TRUNCATE_JOBS), true)
                .await?;
        }
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), LogPipelineError> {
        // 완료/취소되지 않은 작업은 실패로 간주
        self.buffer
            .queue(
                Operation::new(
                    sql::FAIL_PROCESSING_JOBS,
                    vec![SqlParam::Int(JobState::Error.code())],
                ),
                true,
            )
            .await?;

        let records = self.downloads.drain();
        tracing::info!(sessions = records.len(), "writing download sessions");
        metrics::counter!(m::DOWNLOAD_SESSIONS_TOTAL).increment(records.len() as u64);

        for record in records {
            let num_files = i64::try_from(record.num_files).unwrap_or(i64::MAX);
            let op = Operation::new(
                sql::INSERT_DOWNLOAD,
                vec![
                    SqlParam::Timestamp(record.completed),
                    SqlParam::Int(record.obs_id),
                    SqlParam::Int(num_files),
                ],
            );
            self.buffer.queue(op, false).await?;
        }

        self.buffer.flush().await?;
        tracing::info!(
            batches = self.buffer.batches_flushed(),
            operations = self.buffer.ops_executed(),
            "finishing"
        );
        Ok(())
    }

    async fn handle(
        &mut self,
        kind: HandlerKind,
        ctx: &LineContext<'_>,
    ) -> Result<(), LogPipelineError> {
        match kind {
            HandlerKind::Skip => {
                self.skip(ctx);
                Ok(())
            }
            HandlerKind::ConsumedMessage => self.consumed_message(ctx).await,
            HandlerKind::Cancel => self.cancel(ctx).await,
            HandlerKind::Complete => self.complete(ctx).await,
            HandlerKind::Query => self.query(ctx).await,
            HandlerKind::NgasRetrieve => self.ngas_retrieve(ctx),
        }
    }
}

fn parse_timestamp(kind: HandlerKind, raw: &str) -> Result<NaiveDateTime, LogPipelineError> {
    NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT).map_err(|e| {
        LogPipelineError::Payload {
            handler: kind.as_str(),
            reason: format!("invalid timestamp '{raw}': {e}"),
        }
    })
}

fn parse_id(kind: HandlerKind, field: &str, raw: &str) -> Result<i64, LogPipelineError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| LogPipelineError::Payload {
            handler: kind.as_str(),
            reason: format!("invalid {field} '{raw}': {e}"),
        })
}

fn parse_payload(kind: HandlerKind, raw: &str) -> Result<serde_json::Value, LogPipelineError> {
    serde_json::from_str(raw).map_err(|e| LogPipelineError::Payload {
        handler: kind.as_str(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// 정확히 10자리 숫자인 관측 ID만 허용합니다.
fn parse_obs_id(raw: &str) -> Option<i64> {
    if raw.len() != OBS_ID_LEN || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}
