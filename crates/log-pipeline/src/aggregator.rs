//! 다운로드 집계기 -- 개별 파일 조회를 관측 단위 다운로드 세션으로 묶습니다.
//!
//! 같은 관측 ID에 대한 파일 조회가 기존 세션의 시간 창
//! `(earliest - threshold, latest + threshold)` 안에 들어오고, 해당 세션에
//! 아직 없는 파일이면 세션에 합류합니다. 그렇지 않으면 다음 세션을 확인하고,
//! 합류할 세션이 없으면 새 세션을 만듭니다.
//!
//! 세션은 실행 중에 제거되지 않으며, 종료 시 [`DownloadAggregator::drain`]으로
//! 한 번만 내보냅니다.

use chrono::{NaiveDateTime, TimeDelta};
use indexmap::IndexMap;

/// 기본 세션 병합 임계값 (24시간, 초)
pub const DEFAULT_THRESHOLD_SECS: u64 = 60 * 60 * 24;

/// 하나의 다운로드 세션
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSession {
    /// 세션 내 가장 이른 조회 시각
    pub earliest: NaiveDateTime,
    /// 세션 내 가장 늦은 조회 시각
    pub latest: NaiveDateTime,
    /// 조회된 파일 (중복 없음, 최초 조회 순서)
    pub files: Vec<String>,
}

impl DownloadSession {
    fn new(filename: &str, timestamp: NaiveDateTime) -> Self {
        Self {
            earliest: timestamp,
            latest: timestamp,
            files: vec![filename.to_owned()],
        }
    }

    /// 세션에 포함된 파일 수
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    fn contains(&self, filename: &str) -> bool {
        self.files.iter().any(|f| f == filename)
    }

    /// 경계값은 창 밖으로 취급합니다.
    fn within_window(&self, timestamp: NaiveDateTime, threshold: TimeDelta) -> bool {
        let after_start = self
            .earliest
            .checked_sub_signed(threshold)
            .is_none_or(|start| start < timestamp);
        let before_end = self
            .latest
            .checked_add_signed(threshold)
            .is_none_or(|end| timestamp < end);
        after_start && before_end
    }

    fn join(&mut self, filename: &str, timestamp: NaiveDateTime) {
        self.files.push(filename.to_owned());
        self.earliest = self.earliest.min(timestamp);
        self.latest = self.latest.max(timestamp);
    }
}

/// 종료 시 내보내는 세션 요약
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRecord {
    /// 관측 ID
    pub obs_id: i64,
    /// 세션 내 마지막 조회 시각
    pub completed: NaiveDateTime,
    /// 파일 수
    pub num_files: usize,
}

/// 레코드 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// 기존 세션에 합류함 (세션 인덱스)
    Joined(usize),
    /// 새 세션을 시작함 (세션 인덱스)
    Started(usize),
}

/// 다운로드 집계기
///
/// 관측 ID는 처음 관측된 순서를, 세션은 생성 순서를 유지합니다.
#[derive(Debug, Clone)]
pub struct DownloadAggregator {
    sessions: IndexMap<i64, Vec<DownloadSession>>,
    threshold: TimeDelta,
}

impl DownloadAggregator {
    /// 주어진 임계값으로 집계기를 생성합니다.
    pub fn new(threshold: TimeDelta) -> Self {
        Self {
            sessions: IndexMap::new(),
            threshold,
        }
    }

    /// 초 단위 임계값으로 집계기를 생성합니다.
    pub fn with_threshold_secs(secs: u64) -> Self {
        let secs = i64::try_from(secs).unwrap_or(i64::MAX);
        let threshold = TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX);
        Self::new(threshold)
    }

    /// 파일 조회 이벤트를 기록합니다.
    ///
    /// 생성 순서대로 세션을 확인하여, 시간 창 안에 있고 아직 이 파일이 없는
    /// 첫 번째 세션에 합류합니다. 이미 이 파일이 있는 세션은 건너뜁니다.
    pub fn record(
        &mut self,
        obs_id: i64,
        filename: &str,
        timestamp: NaiveDateTime,
    ) -> RecordOutcome {
        let threshold = self.threshold;
        let sessions = self.sessions.entry(obs_id).or_default();

        let joinable = sessions.iter().position(|session| {
            session.within_window(timestamp, threshold) && !session.contains(filename)
        });

        match joinable {
            Some(index) => {
                sessions[index].join(filename, timestamp);
                RecordOutcome::Joined(index)
            }
            None => {
                sessions.push(DownloadSession::new(filename, timestamp));
                RecordOutcome::Started(sessions.len() - 1)
            }
        }
    }

    /// 관측 ID의 세션 목록을 반환합니다.
    pub fn sessions(&self, obs_id: i64) -> &[DownloadSession] {
        self.sessions.get(&obs_id).map_or(&[], Vec::as_slice)
    }

    /// 전체 세션 수를 반환합니다.
    pub fn session_count(&self) -> usize {
        self.sessions.values().map(Vec::len).sum()
    }

    /// 기록된 관측 ID 수를 반환합니다.
    pub fn observation_count(&self) -> usize {
        self.sessions.len()
    }

    /// 병합 임계값을 반환합니다.
    pub fn threshold(&self) -> TimeDelta {
        self.threshold
    }

    /// 모든 세션을 요약 레코드로 내보내고 집계기를 비웁니다.
    ///
    /// 관측 ID는 처음 관측된 순서, 세션은 생성 순서로 반환됩니다.
    pub fn drain(&mut self) -> Vec<DownloadRecord> {
        self.sessions
            .drain(..)
            .flat_map(|(obs_id, sessions)| {
                sessions.into_iter().map(move |session| DownloadRecord {
                    obs_id,
                    completed: session.latest,
                    num_files: session.file_count(),
                })
            })
            .collect()
    }
}

impl Default for DownloadAggregator {
    fn default() -> Self {
        Self::with_threshold_secs(DEFAULT_THRESHOLD_SECS)
    }
}
