//! Request and response types shared by the classifier, strategies and storage.

mod request;
mod response;

pub use request::{Destination, Request, RequestKey, RequestMode};
pub use response::{FetchOutcome, Response, ResponseSource};
