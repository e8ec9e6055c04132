//! End-to-end run: annotate pages, plan chunks, drive the extractor over
//! sub-batches, merge everything into one result set.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{info, warn};

use crate::chunk::{plan_chunks, sub_batch_text, sub_batches};
use crate::extract::Extractor;
use crate::model::ResultSet;
use crate::segment::{annotate_pages, SegmenterConfig};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("an extraction run is already in progress")]
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Segmenting,
    Extracting,
}

/// Progress tick for the caller's UI. Percent is monotone across one run:
/// segmentation owns 0..=20, extraction owns 20..=100.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub stage: Stage,
    pub percent: u8,
}

/// What one run produced. Sub-batch failures are skipped, not fatal; the
/// caller decides how to present them.
#[derive(Debug)]
pub struct RunReport {
    pub records: ResultSet,
    pub failed_sub_batches: usize,
    /// At least one failure was the model's fault (malformed reply or API
    /// error), for which smaller sub-batches are the suggested remedy.
    pub model_side_failure: bool,
}

pub struct Pipeline<E: Extractor> {
    extractor: E,
    segmenter: SegmenterConfig,
    sub_batch_size: usize,
    busy: AtomicBool,
}

impl<E: Extractor> Pipeline<E> {
    pub fn new(extractor: E, sub_batch_size: usize) -> Self {
        Self {
            extractor,
            segmenter: SegmenterConfig::default(),
            sub_batch_size: sub_batch_size.max(1),
            busy: AtomicBool::new(false),
        }
    }

    /// Run over decoded page texts. Only one run at a time per pipeline.
    pub async fn run(
        &self,
        page_texts: Vec<String>,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<RunReport, PipelineError> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return Err(PipelineError::Busy);
        }
        let _guard = BusyGuard(&self.busy);

        let total_pages = page_texts.len().max(1);
        let mut pages = Vec::with_capacity(page_texts.len());
        for (i, page) in annotate_pages(&self.segmenter, page_texts).into_iter().enumerate() {
            on_progress(Progress {
                stage: Stage::Segmenting,
                percent: ((i + 1) * 20 / total_pages) as u8,
            });
            pages.push(page);
        }

        let chunks = plan_chunks(pages);
        let total_steps: usize = chunks
            .iter()
            .map(|c| sub_batches(c, self.sub_batch_size).len())
            .sum();
        info!(chunks = chunks.len(), sub_batches = total_steps, "extraction plan ready");

        let mut report = RunReport {
            records: ResultSet::new(),
            failed_sub_batches: 0,
            model_side_failure: false,
        };
        let mut step = 0usize;

        for chunk in &chunks {
            for batch in sub_batches(chunk, self.sub_batch_size) {
                step += 1;
                let text = sub_batch_text(batch);
                match self.extractor.extract(&text).await {
                    Ok(records) => {
                        if !records.is_empty() {
                            info!(step, records = records.len(), "sub-batch extracted");
                        }
                        report.records.merge(records);
                    }
                    Err(e) => {
                        warn!(step, error = %e, "sub-batch failed, skipping");
                        report.failed_sub_batches += 1;
                        report.model_side_failure |= e.is_model_side();
                    }
                }
                on_progress(Progress {
                    stage: Stage::Extracting,
                    percent: (20 + step * 80 / total_steps.max(1)) as u8,
                });
            }
        }

        if total_steps == 0 {
            on_progress(Progress {
                stage: Stage::Extracting,
                percent: 100,
            });
        }

        info!(
            records = report.records.len(),
            failed = report.failed_sub_batches,
            "run finished"
        );
        Ok(report)
    }

    /// Pasted-text path: the whole input is treated as a single page.
    pub async fn run_manual(
        &self,
        text: &str,
        on_progress: impl FnMut(Progress),
    ) -> Result<RunReport, PipelineError> {
        self.run(vec![text.to_string()], on_progress).await
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractError;
    use crate::model::{occurrence, PoliceOccurrence};
    use std::sync::Mutex;

    /// Canned extractor: one scripted response per call, in order.
    struct ScriptedExtractor {
        responses: Mutex<Vec<Result<Vec<PoliceOccurrence>, ExtractError>>>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedExtractor {
        fn new(responses: Vec<Result<Vec<PoliceOccurrence>, ExtractError>>) -> Self {
            let mut responses = responses;
            responses.reverse();
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl Extractor for ScriptedExtractor {
        async fn extract(&self, text: &str) -> Result<Vec<PoliceOccurrence>, ExtractError> {
            self.calls.lock().unwrap().push(text.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn start_page(n: usize) -> String {
        format!("{} - 01/01/2026 resto da pagina", 10000 + n)
    }

    #[tokio::test]
    async fn merges_all_sub_batches() {
        let extractor = ScriptedExtractor::new(vec![
            Ok(vec![occurrence("1 - 01/01/2026 - A", "ROUBO")]),
            Ok(vec![occurrence("2 - 02/01/2026 - B", "FURTO")]),
        ]);
        let pipeline = Pipeline::new(extractor, 1);

        let report = pipeline
            .run(vec![start_page(1), "continuação".to_string()], |_| {})
            .await
            .unwrap();
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.failed_sub_batches, 0);
        assert!(!report.model_side_failure);
    }

    #[tokio::test]
    async fn failed_sub_batch_is_skipped_not_fatal() {
        let extractor = ScriptedExtractor::new(vec![
            Err(ExtractError::MalformedResponse),
            Ok(vec![occurrence("2 - 02/01/2026 - B", "FURTO")]),
        ]);
        let pipeline = Pipeline::new(extractor, 1);

        let report = pipeline
            .run(vec![start_page(1), "continuação".to_string()], |_| {})
            .await
            .unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.failed_sub_batches, 1);
        assert!(report.model_side_failure);
    }

    #[tokio::test]
    async fn transport_failure_is_not_model_side() {
        let extractor = ScriptedExtractor::new(vec![Err(ExtractError::NotConfigured(
            "no key".to_string(),
        ))]);
        let pipeline = Pipeline::new(extractor, 5);

        let report = pipeline.run(vec![start_page(1)], |_| {}).await.unwrap();
        assert_eq!(report.failed_sub_batches, 1);
        assert!(!report.model_side_failure);
    }

    #[tokio::test]
    async fn duplicate_ids_across_batches_collapse() {
        let extractor = ScriptedExtractor::new(vec![
            Ok(vec![occurrence("1 - 01/01/2026 - A", "ROUBO")]),
            Ok(vec![occurrence("1 - 01/01/2026 - A", "ROUBO")]),
        ]);
        let pipeline = Pipeline::new(extractor, 1);

        let report = pipeline
            .run(vec![start_page(1), "continuação".to_string()], |_| {})
            .await
            .unwrap();
        assert_eq!(report.records.len(), 1);
    }

    #[tokio::test]
    async fn progress_is_monotone_and_reaches_100() {
        let extractor = ScriptedExtractor::new(vec![Ok(Vec::new()), Ok(Vec::new())]);
        let pipeline = Pipeline::new(extractor, 1);

        let mut percents = Vec::new();
        pipeline
            .run(vec![start_page(1), "continuação".to_string()], |p| {
                percents.push(p.percent)
            })
            .await
            .unwrap();

        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*percents.last().unwrap(), 100);
        // segmentation ticks stay in the first fifth
        assert!(percents.iter().take(2).all(|&p| p <= 20));
    }

    #[tokio::test]
    async fn busy_pipeline_rejects_second_run() {
        let extractor = ScriptedExtractor::new(vec![]);
        let pipeline = Pipeline::new(extractor, 5);

        pipeline.busy.store(true, Ordering::SeqCst);
        let err = pipeline.run(vec![start_page(1)], |_| {}).await.unwrap_err();
        assert!(matches!(err, PipelineError::Busy));

        pipeline.busy.store(false, Ordering::SeqCst);
        assert!(pipeline.run(vec![start_page(1)], |_| {}).await.is_ok());
    }

    #[tokio::test]
    async fn manual_text_goes_through_as_one_page() {
        let extractor = ScriptedExtractor::new(vec![Ok(vec![occurrence(
            "1 - 01/01/2026 - A",
            "ROUBO",
        )])]);
        let pipeline = Pipeline::new(extractor, 5);

        let report = pipeline
            .run_manual("49294 - 20/12/2025 texto colado", |_| {})
            .await
            .unwrap();
        assert_eq!(report.records.len(), 1);
        assert_eq!(
            pipeline.extractor.calls.lock().unwrap()[0],
            "49294 - 20/12/2025 texto colado"
        );
    }

    #[tokio::test]
    async fn empty_input_yields_empty_report() {
        let extractor = ScriptedExtractor::new(vec![]);
        let pipeline = Pipeline::new(extractor, 5);

        let mut percents = Vec::new();
        let report = pipeline
            .run(Vec::new(), |p| percents.push(p.percent))
            .await
            .unwrap();
        assert!(report.records.is_empty());
        assert_eq!(*percents.last().unwrap(), 100);
    }
}
