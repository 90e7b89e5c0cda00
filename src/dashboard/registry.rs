//! Per-view chart state: current kind, latest request ticket and the chart
//! currently drawn in each slot.
//!
//! A registry lives exactly as long as the dashboard view. Responses are
//! committed last-write-wins: each update takes a [`Ticket`] from
//! [`ChartRegistry::begin`], and a commit whose ticket is no longer the
//! newest for its slot is dropped.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::chart::{Chart, ChartKind, ChartSlot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub slot: ChartSlot,
    seq: u64,
}

#[derive(Debug)]
struct SlotState {
    kind: ChartKind,
    issued: u64,
    chart: Option<Chart>,
}

impl SlotState {
    fn new(slot: ChartSlot) -> Self {
        Self {
            kind: slot.default_kind(),
            issued: 0,
            chart: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ChartRegistry {
    slots: Mutex<HashMap<ChartSlot, SlotState>>,
    // Registry-wide so tickets stay unique across a teardown.
    next_seq: AtomicU64,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> MutexGuard<'_, HashMap<ChartSlot, SlotState>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn kind(&self, slot: ChartSlot) -> ChartKind {
        self.slots()
            .get(&slot)
            .map(|s| s.kind)
            .unwrap_or_else(|| slot.default_kind())
    }

    pub fn set_kind(&self, slot: ChartSlot, kind: ChartKind) {
        self.slots()
            .entry(slot)
            .or_insert_with(|| SlotState::new(slot))
            .kind = kind;
    }

    /// Issue the next ticket for `slot`, superseding every earlier one.
    pub fn begin(&self, slot: ChartSlot) -> Ticket {
        let mut slots = self.slots();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed) + 1;
        slots.entry(slot).or_insert_with(|| SlotState::new(slot)).issued = seq;
        Ticket { slot, seq }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.slots()
            .get(&ticket.slot)
            .map(|s| s.issued == ticket.seq)
            .unwrap_or(false)
    }

    /// Store `chart` in its slot unless a newer ticket has been issued.
    /// The previous instance, if any, is disposed.
    pub fn commit(&self, ticket: Ticket, chart: Chart) -> bool {
        let mut slots = self.slots();
        let Some(state) = slots.get_mut(&ticket.slot) else {
            return false;
        };
        if state.issued != ticket.seq {
            tracing::debug!(
                slot = ?ticket.slot,
                seq = ticket.seq,
                latest = state.issued,
                "dropping superseded chart update"
            );
            return false;
        }
        if let Some(old) = state.chart.replace(chart) {
            tracing::debug!(slot = ?old.slot, "disposing previous chart");
        }
        true
    }

    pub fn chart(&self, slot: ChartSlot) -> Option<Chart> {
        self.slots().get(&slot).and_then(|s| s.chart.clone())
    }

    /// Dispose every chart and forget all slot state. Outstanding tickets
    /// can no longer commit. Returns the number of charts disposed.
    pub fn teardown(&self) -> usize {
        let mut slots = self.slots();
        let disposed = slots.values().filter(|s| s.chart.is_some()).count();
        slots.clear();
        tracing::debug!(disposed, "chart registry torn down");
        disposed
    }
}
