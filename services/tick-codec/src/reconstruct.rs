//! Differential reconstruction
//!
//! The first record of a file holds absolute values. Every later record
//! stores `day`, `time_s`, `price_tick` and both book price ladders as the
//! difference from the previous record's reconstructed value. All other
//! fields are absolute.
//!
//! Addition wraps at each field's native width, so offsets that cross the
//! type range reconstruct exactly what the writer subtracted.

use lob_types::tick::{TickRecord, BOOK_DEPTH};

/// Turn stored offsets into absolute values, in place.
///
/// Must run over the records of exactly one file, in file order.
pub fn reconstruct(records: &mut [TickRecord]) {
    for i in 1..records.len() {
        let prev = records[i - 1];
        apply_delta(&prev, &mut records[i]);
    }
}

/// Inverse of [`reconstruct`]: replace absolute values with offsets.
///
/// Walks back to front so every offset is taken against an absolute value.
pub fn delta_encode(records: &mut [TickRecord]) {
    for i in (1..records.len()).rev() {
        let prev = records[i - 1];
        take_delta(&prev, &mut records[i]);
    }
}

#[inline]
fn apply_delta(prev: &TickRecord, cur: &mut TickRecord) {
    cur.day = cur.day.wrapping_add(prev.day);
    cur.time_s = cur.time_s.wrapping_add(prev.time_s);
    cur.price_tick = cur.price_tick.wrapping_add(prev.price_tick);
    for level in 0..BOOK_DEPTH {
        cur.bid_price_ticks[level] =
            cur.bid_price_ticks[level].wrapping_add(prev.bid_price_ticks[level]);
        cur.ask_price_ticks[level] =
            cur.ask_price_ticks[level].wrapping_add(prev.ask_price_ticks[level]);
    }
}

#[inline]
fn take_delta(prev: &TickRecord, cur: &mut TickRecord) {
    cur.day = cur.day.wrapping_sub(prev.day);
    cur.time_s = cur.time_s.wrapping_sub(prev.time_s);
    cur.price_tick = cur.price_tick.wrapping_sub(prev.price_tick);
    for level in 0..BOOK_DEPTH {
        cur.bid_price_ticks[level] =
            cur.bid_price_ticks[level].wrapping_sub(prev.bid_price_ticks[level]);
        cur.ask_price_ticks[level] =
            cur.ask_price_ticks[level].wrapping_sub(prev.ask_price_ticks[level]);
    }
}
