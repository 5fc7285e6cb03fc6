//! 로그 처리기 -- 디렉토리 탐색, 규칙 세트 선택, 라인 디스패치
//!
//! [`LogProcessor`]는 한 번의 실행을 다음 순서로 진행합니다.
//!
//! ```text
//! Init -> Startup -> Walking -> Shutdown -> Done
//!            \          \          \
//!             +----------+----------+--> Failed
//! ```
//!
//! - 디렉토리는 깊이 우선으로 탐색하며, 한 디렉토리의 항목은 이름 순으로 방문합니다.
//! - 규칙 세트가 없는 파일은 건너뜁니다.
//! - 라인은 `\n` 기준으로 나누고, 유효하지 않은 UTF-8 바이트는 버립니다.
//! - 선택된 규칙 세트의 어떤 패턴에도 매칭되지 않는 라인은 실행을 중단시킵니다.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use logtrack_core::metrics as m;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::error::LogPipelineError;
use crate::handler::{LineContext, LineHandler};
use crate::rule::{HandlerKind, RuleSet, RuleTable};

/// 실행 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// 생성됨, 아직 실행하지 않음
    Init,
    /// startup 훅 실행 중
    Startup,
    /// 디렉토리 탐색 및 라인 처리 중
    Walking,
    /// shutdown 훅 실행 중
    Shutdown,
    /// 정상 완료
    Done,
    /// 치명적 에러로 중단됨
    Failed,
}

impl RunState {
    /// 상태 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Startup => "startup",
            Self::Walking => "walking",
            Self::Shutdown => "shutdown",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

/// 실행 통계
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// 규칙 세트가 적용되어 끝까지 처리된 파일 수
    pub files_processed: usize,
    /// 규칙 세트가 없거나 읽을 수 없어 건너뛴 파일 수
    pub files_skipped: usize,
    /// 규칙에 매칭된 라인 수
    pub lines_processed: usize,
    /// 어떤 규칙에도 매칭되지 않은 라인 수
    pub lines_unmatched: usize,
}

/// 로그 처리기
///
/// # 사용 예시
/// ```ignore
/// let table = RuleTable::builtin()?;
/// let handler = JobHistoryHandler::new(OperationBuffer::new(store, 1000), HandlerOptions::default());
/// let mut processor = LogProcessor::new(table, handler, false);
///
/// let summary = processor.run("../logs").await?;
/// ```
pub struct LogProcessor<H> {
    rules: RuleTable,
    handler: H,
    dry_run: bool,
    state: RunState,
    summary: RunSummary,
}

impl<H: LineHandler> LogProcessor<H> {
    /// 새 처리기를 생성합니다.
    pub fn new(rules: RuleTable, handler: H, dry_run: bool) -> Self {
        Self {
            rules,
            handler,
            dry_run,
            state: RunState::Init,
            summary: RunSummary::default(),
        }
    }

    /// 현재 실행 상태를 반환합니다.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// 지금까지의 실행 통계를 반환합니다.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    /// dry-run 여부를 반환합니다.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// 핸들러에 대한 불변 참조를 반환합니다.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// 처리기를 해체하여 핸들러를 돌려받습니다.
    pub fn into_handler(self) -> H {
        self.handler
    }

    /// `log_path` 아래의 모든 로그를 처리합니다.
    ///
    /// dry-run 모드에서는 startup/shutdown 훅과 핸들러를 호출하지 않고,
    /// 매칭 결과만 로그로 남깁니다.
    ///
    /// # Errors
    /// - 루트 디렉토리를 읽을 수 없는 경우
    /// - 매칭되지 않는 라인이 있는 경우 (dry-run 제외)
    /// - 핸들러 또는 스토어 에러
    pub async fn run(&mut self, log_path: impl AsRef<Path>) -> Result<RunSummary, LogPipelineError> {
        let root = log_path.as_ref();
        self.summary = RunSummary::default();

        if self.dry_run {
            tracing::info!("dry run enabled");
        }

        self.state = RunState::Startup;
        if !self.dry_run {
            if let Err(e) = self.handler.startup().await {
                return Err(self.fail(e));
            }
        }

        self.state = RunState::Walking;
        if let Err(e) = self.walk(root).await {
            return Err(self.fail(e));
        }

        self.state = RunState::Shutdown;
        if !self.dry_run {
            if let Err(e) = self.handler.shutdown().await {
                return Err(self.fail(e));
            }
        }

        self.state = RunState::Done;
        tracing::info!(
            files_processed = self.summary.files_processed,
            files_skipped = self.summary.files_skipped,
            lines_processed = self.summary.lines_processed,
            lines_unmatched = self.summary.lines_unmatched,
            "processing finished"
        );
        Ok(self.summary)
    }

    fn fail(&mut self, err: LogPipelineError) -> LogPipelineError {
        tracing::error!(stage = self.state.as_str(), error = %err, "run failed");
        self.state = RunState::Failed;
        err
    }

    async fn walk(&mut self, root: &Path) -> Result<(), LogPipelineError> {
        let entries = read_sorted(root)
            .await
            .map_err(|e| LogPipelineError::Walk {
                path: root.display().to_string(),
                reason: format!("could not open the provided directory: {e}"),
            })?;

        let mut stack = vec![entries.into_iter()];

        while let Some(dir) = stack.last_mut() {
            let Some(path) = dir.next() else {
                stack.pop();
                continue;
            };

            let metadata = match entry_metadata(&path).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not stat path, skipping");
                    record_skipped(&mut self.summary);
                    continue;
                }
            };

            // 디렉토리 심볼릭 링크는 따라가지 않음 (순환 방지)
            let Some(metadata) = metadata else {
                tracing::warn!(path = %path.display(), "symlinked directory, skipping");
                continue;
            };

            if metadata.is_dir() {
                match read_sorted(&path).await {
                    Ok(children) => stack.push(children.into_iter()),
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "could not open directory, skipping"
                        );
                    }
                }
            } else if metadata.is_file() {
                self.process_file(&path).await?;
            }
        }

        Ok(())
    }

    async fn process_file(&mut self, path: &Path) -> Result<(), LogPipelineError> {
        let Some(ruleset) = self.rules.ruleset_for(path) else {
            tracing::debug!(path = %path.display(), "no ruleset for file, skipping");
            record_skipped(&mut self.summary);
            return Ok(());
        };

        let file = match tokio::fs::File::open(path).await {
            Ok(file) => file,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "could not open file, skipping");
                record_skipped(&mut self.summary);
                return Ok(());
            }
        };

        tracing::info!(
            path = %path.display(),
            ruleset = ruleset.file_pattern(),
            "processing file"
        );

        let mut reader = BufReader::new(file);
        let mut buf = Vec::new();
        let mut line_no = 0usize;

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        line_no,
                        error = %e,
                        "read failed, skipping rest of file"
                    );
                    break;
                }
            }
            line_no += 1;

            let line = decode_line(&buf);
            Self::process_line(
                ruleset,
                &mut self.handler,
                &mut self.summary,
                self.dry_run,
                path,
                line_no,
                &line,
            )
            .await?;
        }

        self.summary.files_processed += 1;
        metrics::counter!(m::FILES_PROCESSED_TOTAL).increment(1);
        Ok(())
    }

    async fn process_line(
        ruleset: &RuleSet,
        handler: &mut H,
        summary: &mut RunSummary,
        dry_run: bool,
        path: &Path,
        line_no: usize,
        line: &str,
    ) -> Result<(), LogPipelineError> {
        let Some((kind, captures)) = ruleset.match_line(line) else {
            summary.lines_unmatched += 1;
            metrics::counter!(m::LINES_UNMATCHED_TOTAL).increment(1);

            if dry_run {
                tracing::warn!(path = %path.display(), line_no, line, "no matching rule for line");
                return Ok(());
            }

            tracing::error!(
                path = %path.display(),
                line_no,
                line,
                "no matching rule was found for the line, please create one"
            );
            return Err(LogPipelineError::NoMatchingRule {
                path: path.display().to_string(),
                line: line.to_owned(),
            });
        };

        summary.lines_processed += 1;
        metrics::counter!(m::LINES_PROCESSED_TOTAL, m::LABEL_HANDLER => kind.as_str()).increment(1);

        if dry_run {
            tracing::info!(path = %path.display(), line_no, handler = %kind, line, "processing line");
            return Ok(());
        }

        let ctx = LineContext::new(path, line, &captures);
        if kind == HandlerKind::Skip {
            handler.skip(&ctx);
            return Ok(());
        }

        handler.handle(kind, &ctx).await.inspect_err(|e| {
            tracing::error!(
                path = %path.display(),
                line_no,
                line,
                handler = %kind,
                error = %e,
                "there was an error with the line"
            );
        })
    }
}

fn record_skipped(summary: &mut RunSummary) {
    summary.files_skipped += 1;
    metrics::counter!(m::FILES_SKIPPED_TOTAL).increment(1);
}

/// 링크를 따라간 메타데이터. 디렉토리를 가리키는 심볼릭 링크면 `None`.
async fn entry_metadata(path: &Path) -> std::io::Result<Option<std::fs::Metadata>> {
    let metadata = tokio::fs::symlink_metadata(path).await?;
    if !metadata.file_type().is_symlink() {
        return Ok(Some(metadata));
    }

    let target = tokio::fs::metadata(path).await?;
    Ok((!target.is_dir()).then_some(target))
}

/// 디렉토리 항목을 이름 순으로 정렬하여 반환합니다.
async fn read_sorted(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

/// 줄바꿈(`\n`, `\r\n`)을 제거하고 유효하지 않은 UTF-8 바이트를 버립니다.
fn decode_line(raw: &[u8]) -> Cow<'_, str> {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

    match std::str::from_utf8(raw) {
        Ok(line) => Cow::Borrowed(line),
        Err(_) => Cow::Owned(raw.utf8_chunks().map(|chunk| chunk.valid()).collect()),
    }
}
