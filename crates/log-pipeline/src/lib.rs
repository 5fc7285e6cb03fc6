#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`rule`]: 파일 패턴별 규칙 세트, 순서 있는 라인 매칭, YAML 규칙 로더
//! - [`store`]: 관계형 스토어 경계 (`Store` trait, PostgreSQL/dry-run 구현)
//! - [`buffer`]: 배치 트랜잭션 연산 버퍼
//! - [`aggregator`]: NGAS 파일 조회를 다운로드 세션으로 묶는 집계기
//! - [`handler`]: 매칭된 라인을 스토어 연산으로 변환하는 핸들러 세트
//! - [`processor`]: 디렉토리 탐색과 라인 디스패치, 실행 생명주기
//! - [`sql`]: 작업 이력 테이블 SQL 구문
//! - [`error`]: 도메인 에러 타입

pub mod aggregator;
pub mod buffer;
pub mod error;
pub mod handler;
pub mod processor;
pub mod rule;
pub mod sql;
pub mod store;

// --- 주요 타입 re-export ---

// 처리기
pub use processor::{LogProcessor, RunState, RunSummary};

// 규칙
pub use rule::{HandlerKind, RuleLoader, RuleSet, RuleTable};

// 핸들러
pub use handler::{HandlerOptions, JobHistoryHandler, LineContext, LineHandler};

// 버퍼 / 스토어
pub use buffer::OperationBuffer;
pub use store::{DryRunStore, Operation, PgStore, SqlParam, Store};

// 집계기
pub use aggregator::{DownloadAggregator, DownloadRecord, DownloadSession};

// 에러
pub use error::LogPipelineError;
