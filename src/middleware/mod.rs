pub mod request_id;

pub use request_id::{propagate_request_id, span_for_request, RequestId};
