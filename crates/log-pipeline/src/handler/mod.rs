//! 라인 핸들러 -- 매칭된 로그 라인을 스토어 연산으로 변환합니다.
//!
//! [`LineHandler`]는 실행 생명주기(startup, shutdown)와 라인 처리를 정의하는
//! trait입니다. 규칙 테이블이 [`HandlerKind`]를 결정하면 로그 처리기가
//! 해당 핸들러를 호출합니다.
//!
//! - [`JobHistoryHandler`]: 작업 이력/다운로드 집계 핸들러 세트

mod job_history;

pub use job_history::{HandlerOptions, JobHistoryHandler};

use std::future::Future;
use std::path::Path;

use regex::Captures;

use crate::error::LogPipelineError;
use crate::rule::HandlerKind;

/// 핸들러에 전달되는 매칭된 라인 정보
#[derive(Debug)]
pub struct LineContext<'a> {
    /// 라인이 속한 파일 경로
    pub file_path: &'a Path,
    /// 원본 라인 (줄바꿈 제외)
    pub line: &'a str,
    /// 매칭된 라인 패턴의 캡처
    pub captures: &'a Captures<'a>,
}

impl<'a> LineContext<'a> {
    /// 새 컨텍스트를 생성합니다.
    pub fn new(file_path: &'a Path, line: &'a str, captures: &'a Captures<'a>) -> Self {
        Self {
            file_path,
            line,
            captures,
        }
    }

    /// 1부터 시작하는 캡처 그룹을 반환합니다.
    ///
    /// # Errors
    /// 그룹이 없거나 매칭에 참여하지 않았으면 `MissingCapture`를 반환합니다.
    pub fn group(&self, handler: HandlerKind, index: usize) -> Result<&'a str, LogPipelineError> {
        self.captures
            .get(index)
            .map(|m| m.as_str())
            .ok_or(LogPipelineError::MissingCapture {
                handler: handler.as_str(),
                group: index,
            })
    }
}

/// 라인 핸들러 세트
///
/// 실행 순서: `startup` -> (라인마다 `handle` 또는 `skip`) -> `shutdown`.
/// `handle`에서 반환된 에러는 실행 전체를 중단시킵니다.
pub trait LineHandler: Send {
    /// 디렉토리 탐색 전에 한 번 호출됩니다.
    fn startup(&mut self) -> impl Future<Output = Result<(), LogPipelineError>> + Send;

    /// 디렉토리 탐색이 끝난 뒤 한 번 호출됩니다.
    ///
    /// 남은 연산의 최종 플러시도 여기서 수행해야 합니다.
    fn shutdown(&mut self) -> impl Future<Output = Result<(), LogPipelineError>> + Send;

    /// `skip`이 아닌 핸들러로 매칭된 라인을 처리합니다.
    fn handle(
        &mut self,
        kind: HandlerKind,
        ctx: &LineContext<'_>,
    ) -> impl Future<Output = Result<(), LogPipelineError>> + Send;

    /// `skip`으로 매칭된 라인. 기본 구현은 아무 것도 하지 않습니다.
    fn skip(&mut self, _ctx: &LineContext<'_>) {}
}
