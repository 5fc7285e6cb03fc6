//! 통합 테스트 헬퍼 -- 작업 이력 테이블을 흉내 내는 인메모리 스토어와 로그 라인 생성기
//!
//! [`JobTableStore`]는 `sql` 모듈의 구문을 해석하여 PostgreSQL 없이
//! 테이블 상태 변화를 검증할 수 있게 합니다. 배치는 작업 복사본에 적용된 뒤
//! 모두 성공해야만 커밋됩니다.

#![allow(dead_code)]

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use logtrack_core::error::StorageError;
use logtrack_pipeline::sql;
use logtrack_pipeline::{Operation, SqlParam, Store};

/// `jobs_history` 행
#[derive(Debug, Clone, PartialEq)]
pub struct JobRow {
    pub id: i64,
    pub job_type: String,
    pub user_id: i64,
    pub job_params: serde_json::Value,
    pub job_state: i64,
    pub created: NaiveDateTime,
    pub started: NaiveDateTime,
    pub completed: Option<NaiveDateTime>,
    pub product: Option<serde_json::Value>,
    pub error_code: Option<i64>,
    pub error_text: Option<String>,
}

/// `obsdownload_history` 행
#[derive(Debug, Clone, PartialEq)]
pub struct ObsRequestRow {
    pub created: NaiveDateTime,
    pub ip_address: String,
    pub obs_id: i64,
}

/// `ngas_history` 행
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRow {
    pub completed: NaiveDateTime,
    pub obs_id: i64,
    pub num_files: i64,
}

/// 커밋된 테이블 상태
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub jobs: BTreeMap<i64, JobRow>,
    pub obs_requests: Vec<ObsRequestRow>,
    pub downloads: Vec<DownloadRow>,
    pub scripts: Vec<String>,
}

/// 인메모리 작업 이력 스토어
#[derive(Debug, Default)]
pub struct JobTableStore {
    pub tables: Tables,
    pub batches_committed: usize,
    /// 이 구문을 포함한 배치는 실패함
    pub fail_on_statement: Option<&'static str>,
}

impl JobTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(statement: &'static str) -> Self {
        Self {
            fail_on_statement: Some(statement),
            ..Self::default()
        }
    }

    pub fn job(&self, id: i64) -> Option<&JobRow> {
        self.tables.jobs.get(&id)
    }
}

impl Store for JobTableStore {
    async fn execute_batch(&mut self, ops: &[Operation]) -> Result<(), StorageError> {
        let mut working = self.tables.clone();
        for (index, op) in ops.iter().enumerate() {
            if self.fail_on_statement == Some(op.statement.as_str()) {
                return Err(StorageError::Statement {
                    index,
                    reason: "injected failure".to_owned(),
                });
            }
            apply(&mut working, op).map_err(|reason| StorageError::Statement { index, reason })?;
        }
        self.tables = working;
        self.batches_committed += 1;
        Ok(())
    }
}

fn apply(tables: &mut Tables, op: &Operation) -> Result<(), String> {
    let Some(params) = op.params.as_deref() else {
        if op.statement == sql::TRUNCATE_JOBS {
            tables.jobs.clear();
        } else {
            tables.scripts.push(op.statement.clone());
        }
        return Ok(());
    };

    match op.statement.as_str() {
        s if s == sql::INSERT_JOB => {
            let id = int(params, 0)?;
            tables.jobs.entry(id).or_insert(JobRow {
                id,
                job_type: text(params, 1)?,
                user_id: int(params, 2)?,
                job_params: json(params, 3)?,
                job_state: int(params, 4)?,
                created: timestamp(params, 5)?,
                started: timestamp(params, 6)?,
                completed: None,
                product: None,
                error_code: None,
                error_text: None,
            });
        }
        s if s == sql::CANCEL_JOB => {
            let guard = int(params, 3)?;
            if let Some(row) = tables.jobs.get_mut(&int(params, 2)?) {
                if row.job_state == guard {
                    row.job_state = int(params, 0)?;
                    row.completed = Some(timestamp(params, 1)?);
                }
            }
        }
        s if s == sql::COMPLETE_JOB => {
            if let Some(row) = tables.jobs.get_mut(&int(params, 3)?) {
                row.job_state = int(params, 0)?;
                row.product = Some(json(params, 1)?);
                row.completed = Some(timestamp(params, 2)?);
            }
        }
        s if s == sql::FAIL_PROCESSING_JOBS => {
            let state = int(params, 0)?;
            for row in tables.jobs.values_mut().filter(|row| row.job_state == 1) {
                row.error_code = Some(1);
                row.error_text = Some("Job Failed".to_owned());
                row.completed = Some(row.started);
                row.job_state = state;
            }
        }
        s if s == sql::INSERT_OBS_REQUEST => tables.obs_requests.push(ObsRequestRow {
            created: timestamp(params, 0)?,
            ip_address: text(params, 1)?,
            obs_id: int(params, 2)?,
        }),
        s if s == sql::INSERT_DOWNLOAD => tables.downloads.push(DownloadRow {
            completed: timestamp(params, 0)?,
            obs_id: int(params, 1)?,
            num_files: int(params, 2)?,
        }),
        other => return Err(format!("unsupported statement: {other}")),
    }
    Ok(())
}

fn int(params: &[SqlParam], idx: usize) -> Result<i64, String> {
    params
        .get(idx)
        .and_then(SqlParam::as_int)
        .ok_or_else(|| format!("param ${} is not an integer", idx + 1))
}

fn text(params: &[SqlParam], idx: usize) -> Result<String, String> {
    params
        .get(idx)
        .and_then(SqlParam::as_text)
        .map(str::to_owned)
        .ok_or_else(|| format!("param ${} is not text", idx + 1))
}

fn timestamp(params: &[SqlParam], idx: usize) -> Result<NaiveDateTime, String> {
    params
        .get(idx)
        .and_then(SqlParam::as_timestamp)
        .ok_or_else(|| format!("param ${} is not a timestamp", idx + 1))
}

fn json(params: &[SqlParam], idx: usize) -> Result<serde_json::Value, String> {
    params
        .get(idx)
        .and_then(SqlParam::as_json)
        .cloned()
        .ok_or_else(|| format!("param ${} is not json", idx + 1))
}

/// 타임스탬프 문자열을 파싱합니다.
pub fn at(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").expect("valid timestamp")
}

// --- 로그 라인 생성기 (다운로드 프로세서 / 프록시 로그 형식) ---

pub fn consumed_line(time: &str, job_id: i64) -> String {
    format!(
        "{time},000 INFO Consumed message: job_id: {job_id} job_type: 0 user_id: 7 job_params: {{'obs_id': '1234567890', 'delivery': 'acacia'}}"
    )
}

pub fn cancel_line(time: &str, job_id: i64) -> String {
    format!("{time},000 INFO Cancel message received: job_id: {job_id} by user")
}

pub fn complete_line(time: &str, job_id: i64) -> String {
    format!(
        "{time},000 INFO Visibility download complete: job_id: {job_id} size: 42 product: {{'files': ['{job_id}.zip'], 'error': None}}"
    )
}

pub fn query_line(time: &str, ip: &str, obs_ids: &str) -> String {
    format!(
        "{time},000 INFO Client: {ip} Request Complete. Path: /QUERY?mime=text&like={obs_ids}%&limit=100"
    )
}

pub fn retrieve_line(time: &str, ip: &str, file_id: &str) -> String {
    format!("{time},000 INFO Client: {ip} Request Complete. Path: /RETRIEVE?file_id={file_id}")
}

/// 라인 목록을 줄바꿈으로 이어 붙입니다.
pub fn log_file(lines: &[String]) -> String {
    let mut content = lines.join("\n");
    content.push('\n');
    content
}
