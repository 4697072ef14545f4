pub mod query;
pub mod session;

pub use query::{
    DocsQuery, DocsSort, Query, QueryError, QueryResult, SignalSetQuery, SortOrder,
    TimeSeriesSpec,
};
pub use session::{DataBackend, DataFetchSession, QueryTicket};
