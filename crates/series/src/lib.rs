//! Time-series access for dataview and stream fields.
//!
//! - [`link`] parses `Link` pagination headers.
//! - [`request`] turns an accessor kind and its arguments into an upstream URL.
//! - [`http_util`] performs the authenticated GET and normalises failures.
//! - [`dispatcher`] ties them together behind one method per field.

pub mod dispatcher;
pub mod http_util;
pub mod link;
pub mod request;

pub use dispatcher::TimeSeriesProxy;
pub use http_util::{SeriesHttp, build_client};
pub use link::PageLinks;
pub use request::{InterpolatedArgs, RequestBuilder, SeriesRequest, StoredArgs, StreamListArgs};
