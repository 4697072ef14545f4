use std::cell::RefCell;
use std::rc::Rc;

use signal_charts::ChartError;
use signal_charts::context::{CursorHub, RangeHub};

#[test]
fn hub_requires_at_least_one_unique_cursor_name() {
    assert!(matches!(
        CursorHub::new(&[]),
        Err(ChartError::Config(_))
    ));
    assert!(matches!(
        CursorHub::new(&["time", "time"]),
        Err(ChartError::Config(_))
    ));
}

#[test]
fn publishing_an_unregistered_cursor_is_a_config_error() {
    let hub = CursorHub::new(&["time"]).expect("hub");
    let err = hub.publish("frequency", Some(1.0)).expect_err("unknown name");
    assert!(matches!(err, ChartError::Config(_)));
}

#[test]
fn publish_updates_value_and_version_only_on_change() {
    let hub = CursorHub::new(&["time"]).expect("hub");
    assert_eq!(hub.get("time"), None);

    hub.publish("time", Some(42.0)).expect("publish");
    assert_eq!(hub.get("time"), Some(42.0));
    let version = hub.version();

    hub.publish("time", Some(42.0)).expect("no-op publish");
    assert_eq!(hub.version(), version);

    hub.publish("time", None).expect("clear");
    assert_eq!(hub.get("time"), None);
    assert_eq!(hub.version(), version + 1);
}

#[test]
fn subscriptions_poll_changes_once() {
    let hub = CursorHub::new(&["time"]).expect("hub");
    let mut subscription = hub.subscribe();

    assert!(subscription.poll().is_none());

    hub.publish("time", Some(7.0)).expect("publish");
    let snapshot = subscription.poll().expect("changed");
    assert_eq!(snapshot["time"], Some(7.0));

    // Already seen; nothing new until the next publish.
    assert!(subscription.poll().is_none());

    hub.publish("time", Some(8.0)).expect("publish");
    assert_eq!(subscription.poll_cursor("time"), Some(Some(8.0)));
}

#[test]
fn dropping_a_subscription_releases_the_hub_registration() {
    let hub = CursorHub::new(&["time"]).expect("hub");

    let first = hub.subscribe();
    let second = hub.subscribe();
    assert_eq!(hub.subscriber_count(), 2);

    drop(first);
    assert_eq!(hub.subscriber_count(), 1);
    drop(second);
    assert_eq!(hub.subscriber_count(), 0);
}

#[test]
fn export_sink_receives_each_accepted_publish() {
    let hub = CursorHub::new(&["time", "freq"]).expect("hub");
    let exported: Rc<RefCell<Vec<Option<f64>>>> = Rc::new(RefCell::new(Vec::new()));

    let sink_log = Rc::clone(&exported);
    hub.set_export_sink(move |values| {
        sink_log.borrow_mut().push(values["time"]);
    });

    hub.publish("time", Some(1.0)).expect("publish");
    hub.publish("time", Some(1.0)).expect("no-op");
    hub.publish("freq", Some(2.0)).expect("publish");

    assert_eq!(exported.borrow().as_slice(), &[Some(1.0), Some(1.0)]);
}

#[test]
fn range_hub_validates_and_versions_updates() {
    let range = RangeHub::new((0.0, 1.0)).expect("range hub");
    assert_eq!(range.get(), (0.0, 1.0));

    range.set_range((2.0, 5.0)).expect("set range");
    assert_eq!(range.get(), (2.0, 5.0));
    assert_eq!(range.version(), 1);

    assert!(matches!(
        range.set_range((5.0, 2.0)),
        Err(ChartError::InvalidParameter(_))
    ));
    assert!(matches!(
        RangeHub::new((f64::NAN, 1.0)),
        Err(ChartError::InvalidParameter(_))
    ));
}
