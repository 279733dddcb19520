//! Update plans and atomic conditions.
//!
//! [`get_update`] derives the `SET`/`REMOVE` plan of the next save from the
//! pending changes, and [`atomic_condition`] returns the guard that makes that
//! save conditional on the remote item still matching the last synced state.
//! Together they are the authoritative strategy.
//!
//! [`diff_loaded`] derives the same plan shape by comparing the object's
//! current dump against the attributes recorded at load time. It agrees with
//! [`get_update`] on skipping key columns and on removing empty values, but
//! the two can differ for collections edited in place without a mark.

use std::sync::Arc;

use tracing::debug;

use crate::codec::EncodingError;
use crate::expression::Condition;
use crate::item::{Tracked, dump};
use crate::schema::Column;
use crate::tracking;
use crate::value::{Value, present};

/// `SET` and `REMOVE` instructions for a partial update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePlan {
    /// Columns to write, with their raw (unencoded) values.
    pub set: Vec<(Arc<Column>, Value)>,
    /// Columns to remove.
    pub remove: Vec<Arc<Column>>,
}

impl UpdatePlan {
    /// `true` when there is nothing to write or remove.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.remove.is_empty()
    }
}

/// Plan for the pending changes.
///
/// Key columns are skipped even when marked. A non-empty live value is set,
/// an empty or missing one removed. Entries follow mark order.
#[must_use]
pub fn get_update<T: Tracked + ?Sized>(obj: &T) -> UpdatePlan {
    let meta = obj.meta();
    let mut plan = UpdatePlan::default();
    for (column, _mode) in tracking::changes(obj) {
        if meta.is_key(&column) {
            continue;
        }
        match present(obj.value(&column)) {
            Some(value) => plan.set.push((column, value.clone())),
            None => plan.remove.push(column),
        }
    }
    debug!(
        model = meta.name(),
        set = plan.set.len(),
        remove = plan.remove.len(),
        "built update plan"
    );
    plan
}

/// Guard expecting the last synced state: the object's snapshot.
#[must_use]
pub fn atomic_condition<T: Tracked + ?Sized>(obj: &T) -> Condition {
    tracking::get_snapshot(obj)
}

/// Plan from comparing the current dump with the recorded load.
///
/// Per non-key column, in model order: unchanged (after set normalization)
/// or missing on both sides is skipped, missing now is removed, anything else
/// is set to the live value.
pub fn diff_loaded<T: Tracked + ?Sized>(obj: &T) -> Result<UpdatePlan, EncodingError> {
    let meta = obj.meta();
    let current = dump(obj)?;
    let loaded = tracking::loaded(obj);

    let mut plan = UpdatePlan::default();
    for column in meta.columns() {
        if meta.is_key(column) {
            continue;
        }
        let name = column.dynamo_name();
        let now = current.get(name).map(|av| av.normalized());
        let before = loaded.get(name).map(|av| av.normalized());
        if now == before {
            continue;
        }
        match obj.value(column).filter(|_| now.is_some()) {
            Some(value) => plan.set.push((Arc::clone(column), value.clone())),
            None => plan.remove.push(Arc::clone(column)),
        }
    }
    Ok(plan)
}
