pub mod cursor;

pub use cursor::{CursorHub, CursorSubscription, CursorValues, RangeHub};
