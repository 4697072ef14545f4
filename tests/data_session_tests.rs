use indexmap::IndexMap;
use signal_charts::data::{DataBackend, DataFetchSession, Query, QueryError, QueryResult};

struct CountingBackend {
    calls: usize,
}

impl DataBackend for CountingBackend {
    fn run_queries(&mut self, queries: &[Query]) -> Result<Vec<QueryResult>, QueryError> {
        self.calls += 1;
        Ok(queries
            .iter()
            .map(|_| QueryResult::TimeSeries(IndexMap::new()))
            .collect())
    }
}

#[test]
fn settling_a_stale_ticket_is_a_silent_no_op() {
    let mut session = DataFetchSession::new();

    let ticket_a = session.begin();
    let ticket_b = session.begin();

    // A resolves after B was issued: its payload must be dropped.
    assert_eq!(session.settle(ticket_a, "a"), None);
    assert_eq!(session.settle(ticket_b, "b"), Some("b"));
}

#[test]
fn interleaved_resolution_order_keeps_only_the_latest() {
    let mut session = DataFetchSession::new();

    let ticket_a = session.begin();
    let ticket_b = session.begin();
    let ticket_c = session.begin();

    assert_eq!(session.settle(ticket_b, 2), None);
    assert_eq!(session.settle(ticket_a, 1), None);
    assert_eq!(session.settle(ticket_c, 3), Some(3));
}

#[test]
fn is_latest_tracks_the_newest_ticket() {
    let mut session = DataFetchSession::new();

    let ticket_a = session.begin();
    assert!(session.is_latest(ticket_a));

    let ticket_b = session.begin();
    assert!(!session.is_latest(ticket_a));
    assert!(session.is_latest(ticket_b));
}

#[test]
fn fetch_latest_returns_results_positionally() {
    let mut session = DataFetchSession::new();
    let mut backend = CountingBackend { calls: 0 };

    let queries = vec![
        Query::Summary("set1".to_owned(), serde_json::Value::Null),
        Query::Summary("set2".to_owned(), serde_json::Value::Null),
    ];
    let results = session
        .fetch_latest(&mut backend, &queries)
        .expect("backend ok")
        .expect("latest");

    assert_eq!(results.len(), 2);
    assert_eq!(backend.calls, 1);
}

#[test]
fn backend_errors_map_to_the_chart_error_taxonomy() {
    use signal_charts::ChartError;

    let too_many: ChartError = QueryError::TooManyPoints.into();
    assert!(matches!(too_many, ChartError::TooManyPoints));

    let generic: ChartError = QueryError::Backend("boom".to_owned()).into();
    assert!(matches!(generic, ChartError::DataLoad(_)));
}
