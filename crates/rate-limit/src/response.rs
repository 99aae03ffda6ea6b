//! Translation of denials into HTTP 429 responses.

use http::header::{CONTENT_TYPE, RETRY_AFTER};
use http::{HeaderValue, Response, StatusCode};

use crate::decision::Decision;

/// Build the rejection response for a denial.
///
/// Returns `None` for [`Decision::Admitted`]; the caller forwards those
/// requests unchanged.
pub fn rejection_response(decision: &Decision) -> Option<Response<String>> {
    let Decision::Denied {
        retry_after_secs, ..
    } = *decision
    else {
        return None;
    };
    let message = decision.rejection_message()?;

    let mut response = Response::new(format!("{message}\n"));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    headers.insert(RETRY_AFTER, retry_after_secs.into());
    Some(response)
}
