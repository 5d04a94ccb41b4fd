use tracing::{debug, error};

use crate::config::SettleConfig;
use crate::detector::Settlement;
use crate::ingest::NetworkMonitor;
use crate::{PageLayout, PdfPrinter, RenderError, RenderOutput, ResponseSummary};

/// Prints once detection has stopped, whatever the reason it stopped.
pub struct PrintTrigger;

impl PrintTrigger {
    /// No retries here: a failed print fails the whole render.
    pub async fn fire<P>(
        printer: &P,
        layout: &PageLayout,
        settlement: &Settlement,
    ) -> Result<RenderOutput, RenderError>
    where
        P: PdfPrinter + ?Sized,
    {
        debug!(state = ?settlement.state, landscape = layout.landscape, "printing page");
        let pdf = printer.print_pdf(layout).await.map_err(|e| {
            error!(error = %e, "print failed");
            e
        })?;
        let summaries_json = encode_summaries(&settlement.summaries)?;
        Ok(RenderOutput { summaries_json, pdf })
    }
}

/// Always a JSON array, `[]` when nothing was received.
pub fn encode_summaries(summaries: &[ResponseSummary]) -> Result<Vec<u8>, RenderError> {
    serde_json::to_vec(summaries)
        .map_err(|e| RenderError::serialization_error(format!("Failed to encode response summaries: {}", e)))
}

/// Waits for the monitored page to settle (or time out) and prints it.
pub async fn settle_and_print<P>(
    monitor: NetworkMonitor,
    config: &SettleConfig,
    printer: &P,
    layout: &PageLayout,
) -> Result<RenderOutput, RenderError>
where
    P: PdfPrinter + ?Sized,
{
    let settlement = monitor.settle(config).await;
    PrintTrigger::fire(printer, layout, &settlement).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::DetectorState;
    use crate::{NetworkEvent, RenderRequest};
    use async_trait::async_trait;
    use futures::{StreamExt, stream};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct MockPrinter {
        calls: AtomicUsize,
        layouts: Mutex<Vec<PageLayout>>,
    }

    #[async_trait]
    impl PdfPrinter for MockPrinter {
        async fn print_pdf(&self, layout: &PageLayout) -> Result<Vec<u8>, RenderError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            self.layouts.lock().unwrap().push(*layout);
            Ok(b"%PDF-1.4 mock".to_vec())
        }
    }

    struct FailingPrinter;

    #[async_trait]
    impl PdfPrinter for FailingPrinter {
        async fn print_pdf(&self, _layout: &PageLayout) -> Result<Vec<u8>, RenderError> {
            Err(RenderError::print_error("Printing failed"))
        }
    }

    fn settlement(summaries: Vec<ResponseSummary>) -> Settlement {
        Settlement {
            state: DetectorState::SettledConfirmed,
            ticks: 10,
            elapsed: Duration::from_secs(10),
            pending: 0,
            summaries,
        }
    }

    #[tokio::test]
    async fn fire_returns_pdf_and_summaries() {
        let printer = MockPrinter::default();
        let summaries = vec![
            ResponseSummary {
                url: "https://example.com/app.css".to_string(),
                status: 200,
                status_text: "OK".to_string(),
            },
            ResponseSummary {
                url: "https://example.com/missing.png".to_string(),
                status: 404,
                status_text: "Not Found".to_string(),
            },
        ];

        let output = PrintTrigger::fire(&printer, &PageLayout::default(), &settlement(summaries.clone()))
            .await
            .unwrap();

        assert_eq!(output.pdf, b"%PDF-1.4 mock");
        let decoded: Vec<ResponseSummary> = serde_json::from_slice(&output.summaries_json).unwrap();
        assert_eq!(decoded, summaries);
        assert_eq!(printer.calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn no_responses_encode_as_empty_array() {
        let printer = MockPrinter::default();
        let output = PrintTrigger::fire(&printer, &PageLayout::default(), &settlement(Vec::new()))
            .await
            .unwrap();
        assert_eq!(output.summaries_json, b"[]");
    }

    #[tokio::test]
    async fn print_failure_is_surfaced() {
        let err = PrintTrigger::fire(&FailingPrinter, &PageLayout::default(), &settlement(Vec::new()))
            .await
            .unwrap_err();
        assert_eq!(err.category, crate::ErrorCategory::Print);
        assert_eq!(err.message, "Printing failed");
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_still_prints_exactly_once() {
        let stuck = stream::iter(vec![NetworkEvent::RequestStarted {
            url: "https://example.com/long-poll".to_string(),
            resource_type: "XHR".to_string(),
        }])
        .chain(stream::pending());
        let monitor = NetworkMonitor::start(stuck, stream::pending(), 64);
        let config = SettleConfig::default().with_print_deadline(Duration::from_secs(4));

        let mut request = RenderRequest::new("https://example.com");
        request.orientation = "Landscape".to_string();
        request.margin_top = 1.0;

        let printer = MockPrinter::default();
        let output = settle_and_print(monitor, &config, &printer, &request.layout())
            .await
            .unwrap();

        assert_eq!(printer.calls.load(Ordering::Relaxed), 1);
        let layouts = printer.layouts.lock().unwrap();
        assert!(layouts[0].landscape);
        assert_eq!(layouts[0].margin_top, 1.0);
        assert_eq!(output.summaries_json, b"[]");
    }
}
