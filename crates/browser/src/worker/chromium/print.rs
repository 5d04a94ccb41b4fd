use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::page::Page;
use pdfrender_core::{ErrorCategory, PageLayout, PdfPrinter, RenderError};

use crate::shared::to_render_error;

/// `Page.printToPDF` on one target.
pub struct PagePrinter {
    page: Page,
}

impl PagePrinter {
    pub fn new(page: Page) -> Self {
        Self { page }
    }
}

pub fn print_params(layout: &PageLayout) -> PrintToPdfParams {
    PrintToPdfParams::builder()
        .landscape(layout.landscape)
        .print_background(layout.print_background)
        .margin_top(layout.margin_top)
        .margin_right(layout.margin_right)
        .margin_bottom(layout.margin_bottom)
        .margin_left(layout.margin_left)
        .build()
}

#[async_trait]
impl PdfPrinter for PagePrinter {
    async fn print_pdf(&self, layout: &PageLayout) -> Result<Vec<u8>, RenderError> {
        self.page
            .pdf(print_params(layout))
            .await
            .map_err(|e| to_render_error(e, "Page.printToPDF", ErrorCategory::Print))
    }
}
