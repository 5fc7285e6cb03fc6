//! Ctrl-C handling for whole commands.
//!
//! The interrupt races the entire command, including store shutdown and
//! report output, so a signal at any point ends the process.

use std::future::Future;

/// Drive `work` to completion unless `interrupt` fires first.
///
/// Returns `None` when interrupted. If the interrupt source itself fails
/// (no signal handler could be installed), `work` runs to completion.
pub async fn run_until_interrupted<W, I>(work: W, interrupt: I) -> Option<W::Output>
where
    W: Future,
    I: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(work);

    tokio::select! {
        output = &mut work => Some(output),
        signal = interrupt => match signal {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "could not listen for Ctrl-C");
                Some(work.await)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::oneshot;

    use super::*;

    #[tokio::test]
    async fn test_work_finishes_before_interrupt() {
        let result = run_until_interrupted(async { 7 }, std::future::pending()).await;
        assert_eq!(result, Some(7));
    }

    #[tokio::test]
    async fn test_interrupt_during_final_stage() {
        // 첫 단계가 끝난 뒤 (스토어 종료 단계에서) 신호가 들어옴
        let (tx, rx) = oneshot::channel::<()>();
        let work = async move {
            let _ = tx.send(());
            std::future::pending::<()>().await;
            "closed"
        };
        let interrupt = async move {
            rx.await.map_err(std::io::Error::other)?;
            Ok(())
        };

        assert_eq!(run_until_interrupted(work, interrupt).await, None);
    }

    #[tokio::test]
    async fn test_failed_interrupt_source_keeps_working() {
        let interrupt = async { Err(std::io::Error::other("no signal handler")) };
        let result = run_until_interrupted(async { "done" }, interrupt).await;
        assert_eq!(result, Some("done"));
    }
}
