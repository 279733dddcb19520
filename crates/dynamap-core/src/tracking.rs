//! Per-object change tracking.
//!
//! Every tracked object embeds a [`Tracking`] handle. The handle stores:
//!
//! - the pending changes: columns marked since the caller last cleared them,
//!   each with a [`ModifyMode`], in mark order;
//! - the snapshot: a [`Condition`] describing the last state known to be
//!   stored remotely, used as the atomic (compare-and-swap) guard;
//! - the synced flag;
//! - the attributes recorded at the last load, used by
//!   [`diff_loaded`](crate::update::diff_loaded).
//!
//! The entry lives inside the object, so it is dropped with the object and
//! never keeps it alive. It is created on first use.
//!
//! `Tracking` uses a `RefCell`, which makes every tracked object `!Sync`:
//! sharing one object between threads without a lock does not compile.
//! Nothing here locks, blocks, or performs I/O.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use dynamap_model::{AttributeMap, AttributeValue};
use tracing::{debug, trace};

use crate::codec::EncodingError;
use crate::expression::{ColumnRef, CompareOp, Condition, ConditionValue};
use crate::item::{Tracked, dump};
use crate::schema::{Column, ModelMeta};
use crate::value::present;

/// How a pending change is applied on the next save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModifyMode {
    /// Write the value unconditionally. The only mode [`mark`] installs.
    #[default]
    Overwrite,
    /// Write only if the remote attribute is missing.
    InsertOnMissing,
}

#[derive(Debug, Default)]
struct TrackingEntry {
    changes: Vec<(Arc<Column>, ModifyMode)>,
    snapshot: Option<Condition>,
    synced: bool,
    /// wire name -> wire value, as of the last load
    loaded: HashMap<String, AttributeValue>,
}

/// Tracking handle embedded in a tracked object.
#[derive(Debug, Default)]
pub struct Tracking {
    entry: RefCell<Option<TrackingEntry>>,
}

impl Tracking {
    /// A handle with no entry yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` once any tracking operation has touched the object.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.entry.borrow().is_some()
    }

    fn with_entry<R>(&self, f: impl FnOnce(&mut TrackingEntry) -> R) -> R {
        let mut slot = self.entry.borrow_mut();
        f(slot.get_or_insert_with(TrackingEntry::default))
    }

    fn read<R>(&self, f: impl FnOnce(Option<&TrackingEntry>) -> R) -> R {
        f(self.entry.borrow().as_ref())
    }
}

// ---------------------------------------------------------------------------
// Pending changes
// ---------------------------------------------------------------------------

/// Record that `column` must be pushed on the next save, in overwrite mode.
///
/// Marking an already marked column keeps its position and resets its mode.
pub fn mark<T: Tracked + ?Sized>(obj: &T, column: &Arc<Column>) {
    mark_with_mode(obj, column, ModifyMode::Overwrite);
}

/// Record a pending change with an explicit mode.
pub fn mark_with_mode<T: Tracked + ?Sized>(obj: &T, column: &Arc<Column>, mode: ModifyMode) {
    obj.tracking().with_entry(|entry| {
        match entry.changes.iter_mut().find(|(marked, _)| marked == column) {
            Some(slot) => slot.1 = mode,
            None => entry.changes.push((Arc::clone(column), mode)),
        }
    });
    trace!(column = %column, ?mode, "marked column");
}

/// Pending changes in mark order.
#[must_use]
pub fn changes<T: Tracked + ?Sized>(obj: &T) -> Vec<(Arc<Column>, ModifyMode)> {
    obj.tracking()
        .read(|entry| entry.map(|e| e.changes.clone()).unwrap_or_default())
}

/// Forget every pending change. Neither [`sync`] nor [`clear`] does this.
pub fn clear_changes<T: Tracked + ?Sized>(obj: &T) {
    obj.tracking().with_entry(|entry| entry.changes.clear());
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Reset the snapshot to "every column absent" and mark the object synced.
///
/// Used for objects never seen remotely and after a delete. Pending changes
/// are kept.
pub fn clear<T: Tracked + ?Sized>(obj: &T) {
    let meta = obj.meta();
    let snapshot = absent_snapshot(meta);
    obj.tracking().with_entry(|entry| {
        entry.snapshot = Some(snapshot);
        entry.synced = true;
    });
    debug!(model = meta.name(), "cleared tracking snapshot");
}

/// Commit point after a successful write.
///
/// Rebuilds the snapshot over the marked columns (sorted by wire name): each
/// leaf is `column = <encoded value>` for a non-empty value, else
/// `column IS None`. Values are encoded now so later renders never re-encode a
/// value mutated in memory since. Pending changes are kept.
///
/// # Errors
///
/// Returns the first `EncodingError`; tracking state is then left untouched.
pub fn sync<T: Tracked + ?Sized>(obj: &T) -> Result<(), EncodingError> {
    let mut marked: Vec<Arc<Column>> = changes(obj).into_iter().map(|(c, _)| c).collect();
    marked.sort_by(|a, b| a.dynamo_name().cmp(b.dynamo_name()));

    let mut snapshot = Condition::Empty;
    for column in &marked {
        let target = ColumnRef::new(column);
        snapshot &= match present(obj.value(column)) {
            Some(value) => {
                let encoded = column.codec().encode(value)?;
                target.compare(CompareOp::Eq, ConditionValue::Dumped(encoded))
            }
            None => target.is_none(),
        };
    }

    let leaves = snapshot.len();
    obj.tracking().with_entry(|entry| {
        entry.snapshot = Some(snapshot);
        entry.synced = true;
    });
    debug!(model = obj.meta().name(), leaves, "synced tracking snapshot");
    Ok(())
}

/// The cached snapshot, creating the "every column absent" snapshot (as
/// [`clear`] does) for an object that has none yet.
#[must_use]
pub fn get_snapshot<T: Tracked + ?Sized>(obj: &T) -> Condition {
    if let Some(snapshot) = obj
        .tracking()
        .read(|entry| entry.and_then(|e| e.snapshot.clone()))
    {
        return snapshot;
    }
    clear(obj);
    obj.tracking()
        .read(|entry| entry.and_then(|e| e.snapshot.clone()))
        .unwrap_or_default()
}

/// `true` after [`sync`] or [`clear`] (including the implicit clear of
/// [`get_snapshot`]).
#[must_use]
pub fn is_synced<T: Tracked + ?Sized>(obj: &T) -> bool {
    obj.tracking().read(|entry| entry.is_some_and(|e| e.synced))
}

fn absent_snapshot(meta: &ModelMeta) -> Condition {
    meta.columns_by_dynamo_name()
        .into_iter()
        .fold(Condition::Empty, |acc, column| {
            acc.and_with(ColumnRef::new(column).is_none())
        })
}

// ---------------------------------------------------------------------------
// Loaded attributes
// ---------------------------------------------------------------------------

/// Record wire attributes returned by a read.
///
/// Only `expected` columns are touched: present ones are stored, missing ones
/// forgotten. Columns that were not expected (e.g. not projected by an index)
/// keep whatever was recorded before.
pub fn record_loaded<T: Tracked + ?Sized>(obj: &T, attrs: &AttributeMap, expected: &[Arc<Column>]) {
    obj.tracking().with_entry(|entry| {
        for column in expected {
            let name = column.dynamo_name();
            match attrs.get(name) {
                Some(value) => {
                    entry.loaded.insert(name.to_owned(), value.clone());
                }
                None => {
                    entry.loaded.remove(name);
                }
            }
        }
    });
}

/// Record the object's current state as if it had just been loaded.
pub fn record_current<T: Tracked + ?Sized>(obj: &T) -> Result<(), EncodingError> {
    let current = dump(obj)?;
    record_loaded(obj, &current, obj.meta().columns());
    Ok(())
}

/// Forget every recorded attribute, e.g. after a delete.
pub fn forget_loaded<T: Tracked + ?Sized>(obj: &T) {
    obj.tracking().with_entry(|entry| entry.loaded.clear());
}

/// Attributes recorded by the last load, keyed by wire name.
#[must_use]
pub fn loaded<T: Tracked + ?Sized>(obj: &T) -> HashMap<String, AttributeValue> {
    obj.tracking()
        .read(|entry| entry.map(|e| e.loaded.clone()).unwrap_or_default())
}
