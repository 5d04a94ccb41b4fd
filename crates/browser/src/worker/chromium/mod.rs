mod print;
mod wait;
mod worker;

pub use print::{PagePrinter, print_params};
pub use wait::{monitor_network, request_event, response_event};
pub use worker::ChromiumRenderer;
