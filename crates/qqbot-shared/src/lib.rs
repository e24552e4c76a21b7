//! # qqbot Shared
//!
//! Types shared between the gateway and the plugin processes that call it,
//! plus the reply-formatting and response-parsing helpers every plugin
//! handler uses.

pub mod completion;
pub mod dto;
pub mod reply;
pub mod response;

pub use completion::{ExtractError, extract_completion_text, extract_image_url};
pub use reply::{ForwardNode, Reply, split_into_chunks};
pub use response::{ApiResponse, ErrorResponse};
