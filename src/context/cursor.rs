use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::error::{ChartError, ChartResult};

/// Snapshot of every named cursor value.
pub type CursorValues = IndexMap<String, Option<f64>>;

type ExportSink = Box<dyn FnMut(&CursorValues)>;

struct CursorHubInner {
    values: CursorValues,
    version: u64,
    subscribers: Vec<u64>,
    next_subscriber_id: u64,
    export_sink: Option<ExportSink>,
}

/// Shared cursor store broadcast across the charts of one dashboard.
///
/// A writer calls [`CursorHub::publish`]; readers hold a
/// [`CursorSubscription`] and poll it on their next tick. Every accepted
/// publish bumps an internal version and re-exports the full snapshot to the
/// optional owning-store sink.
#[derive(Clone)]
pub struct CursorHub {
    inner: Rc<RefCell<CursorHubInner>>,
}

impl fmt::Debug for CursorHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("CursorHub")
            .field("values", &inner.values)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl CursorHub {
    /// Creates a hub with the given cursor names.
    ///
    /// Names must be non-empty and unique; publishing to a name outside this
    /// list is a configuration error.
    pub fn new(cursor_names: &[&str]) -> ChartResult<Self> {
        if cursor_names.is_empty() {
            return Err(ChartError::Config(
                "cursor hub requires at least one cursor name".to_owned(),
            ));
        }

        let mut values = CursorValues::new();
        for name in cursor_names {
            if values.insert((*name).to_owned(), None).is_some() {
                return Err(ChartError::Config(format!(
                    "duplicate cursor name `{name}`"
                )));
            }
        }

        Ok(Self {
            inner: Rc::new(RefCell::new(CursorHubInner {
                values,
                version: 0,
                subscribers: Vec::new(),
                next_subscriber_id: 0,
                export_sink: None,
            })),
        })
    }

    /// Current value of one cursor; unknown names read as `None`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.inner.borrow().values.get(name).copied().flatten()
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Publishes a cursor value.
    ///
    /// Equal values are a no-op; an unknown cursor name is a configuration
    /// error raised to the caller.
    pub fn publish(&self, name: &str, value: Option<f64>) -> ChartResult<()> {
        let snapshot = {
            let mut inner = self.inner.borrow_mut();
            let Some(current) = inner.values.get_mut(name) else {
                return Err(ChartError::Config(format!(
                    "cursor `{name}` is not registered with the hub"
                )));
            };
            if *current == value {
                return Ok(());
            }
            *current = value;
            inner.version += 1;
            inner.values.clone()
        };

        // The sink is taken out for the call so a sink that reads the hub
        // does not re-enter the borrow.
        let sink = self.inner.borrow_mut().export_sink.take();
        if let Some(mut sink) = sink {
            sink(&snapshot);
            self.inner.borrow_mut().export_sink = Some(sink);
        }
        Ok(())
    }

    /// Registers the sink re-exporting the cursor state to an owning store.
    pub fn set_export_sink(&self, sink: impl FnMut(&CursorValues) + 'static) {
        self.inner.borrow_mut().export_sink = Some(Box::new(sink));
    }

    /// Subscribes to cursor changes; the returned handle unsubscribes on drop.
    pub fn subscribe(&self) -> CursorSubscription {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_subscriber_id;
        inner.next_subscriber_id += 1;
        inner.subscribers.push(id);
        let last_seen_version = inner.version;
        CursorSubscription {
            inner: Rc::downgrade(&self.inner),
            id,
            last_seen_version,
        }
    }
}

/// Disposal handle for one cursor-hub reader.
///
/// Dropping the subscription releases it from the hub, so a dropped chart
/// cannot leak hub registrations.
pub struct CursorSubscription {
    inner: Weak<RefCell<CursorHubInner>>,
    id: u64,
    last_seen_version: u64,
}

impl fmt::Debug for CursorSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CursorSubscription")
            .field("id", &self.id)
            .field("last_seen_version", &self.last_seen_version)
            .finish()
    }
}

impl CursorSubscription {
    /// Returns the current snapshot when the hub advanced past the version
    /// this subscription last observed.
    pub fn poll(&mut self) -> Option<CursorValues> {
        let inner = self.inner.upgrade()?;
        let inner = inner.borrow();
        if inner.version == self.last_seen_version {
            return None;
        }
        self.last_seen_version = inner.version;
        Some(inner.values.clone())
    }

    /// Convenience accessor polling a single named cursor.
    pub fn poll_cursor(&mut self, name: &str) -> Option<Option<f64>> {
        self.poll()
            .map(|values| values.get(name).copied().flatten())
    }
}

impl Drop for CursorSubscription {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut inner = inner.borrow_mut();
            inner.subscribers.retain(|id| *id != self.id);
        }
    }
}

struct RangeHubInner {
    range: (f64, f64),
    version: u64,
}

/// Shared numeric X range for charts whose X axis is not time-based.
#[derive(Clone)]
pub struct RangeHub {
    inner: Rc<RefCell<RangeHubInner>>,
}

impl fmt::Debug for RangeHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("RangeHub")
            .field("range", &inner.range)
            .field("version", &inner.version)
            .finish()
    }
}

impl RangeHub {
    pub fn new(initial_range: (f64, f64)) -> ChartResult<Self> {
        validate_range(initial_range)?;
        Ok(Self {
            inner: Rc::new(RefCell::new(RangeHubInner {
                range: initial_range,
                version: 0,
            })),
        })
    }

    #[must_use]
    pub fn get(&self) -> (f64, f64) {
        self.inner.borrow().range
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    pub fn set_range(&self, range: (f64, f64)) -> ChartResult<()> {
        validate_range(range)?;
        let mut inner = self.inner.borrow_mut();
        if inner.range != range {
            inner.range = range;
            inner.version += 1;
        }
        Ok(())
    }
}

fn validate_range(range: (f64, f64)) -> ChartResult<()> {
    if !range.0.is_finite() || !range.1.is_finite() {
        return Err(ChartError::InvalidParameter(
            "range bounds must be finite numbers".to_owned(),
        ));
    }
    if range.0 >= range.1 {
        return Err(ChartError::InvalidParameter(format!(
            "range start {} must precede range end {}",
            range.0, range.1
        )));
    }
    Ok(())
}
