use chromiumoxide::cdp::browser_protocol::network::{
    EventRequestWillBeSent, EventResponseReceived, ResourceType,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use pdfrender_core::{ErrorCategory, NetworkEvent, NetworkMonitor, RenderError};
use tracing::debug;

use crate::shared::to_render_error;

/// Subscribes to request/response events and starts both ingestors.
///
/// Must run before navigation or the first requests are missed. Dropping
/// the monitor's streams unsubscribes from the page.
pub async fn monitor_network(page: &Page, capacity: usize) -> Result<NetworkMonitor, RenderError> {
    let requests = page
        .event_listener::<EventRequestWillBeSent>()
        .await
        .map_err(|e| to_render_error(e, "Network.requestWillBeSent", ErrorCategory::Protocol))?;
    let responses = page
        .event_listener::<EventResponseReceived>()
        .await
        .map_err(|e| to_render_error(e, "Network.responseReceived", ErrorCategory::Protocol))?;

    debug!(capacity, "listening for network events");
    Ok(NetworkMonitor::start(
        requests.map(|event| request_event(&event)),
        responses.map(|event| response_event(&event)),
        capacity,
    ))
}

pub fn request_event(event: &EventRequestWillBeSent) -> NetworkEvent {
    NetworkEvent::RequestStarted {
        url: event.request.url.clone(),
        resource_type: resource_label(event.r#type.as_ref()),
    }
}

pub fn response_event(event: &EventResponseReceived) -> NetworkEvent {
    NetworkEvent::ResponseReceived {
        url: event.response.url.clone(),
        status: event.response.status,
        status_text: event.response.status_text.clone(),
        resource_type: resource_label(Some(&event.r#type)),
    }
}

/// Protocol name of the resource type; empty when the browser omits it.
fn resource_label(resource_type: Option<&ResourceType>) -> String {
    resource_type
        .map(|t| t.as_ref().to_string())
        .unwrap_or_default()
}
