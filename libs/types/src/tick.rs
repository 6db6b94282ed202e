//! Raw tick record and its on-disk layout
//!
//! One record is one exchange update event: trade statistics for the event
//! plus a 5-level book. Records are stored packed, little-endian, 54 bytes
//! each. The layout is decoded through explicit byte offsets, never through
//! the compiler's struct layout, so files stay readable bit-for-bit on any
//! target.
//!
//! # Binary Format (per record)
//! ```text
//! off  width  field
//!   0  1      sync               (bool)
//!   1  1      day                (u8,  delta)
//!   2  2      time_s             (u16, delta)  seconds in day
//!   4  2      price_tick         (i16, delta)  price = tick * 0.01
//!   6  1      trade_count        (u8)
//!   7  4      turnover           (u32)         currency units
//!  11  2      volume             (u16)         lots
//!  13  10     bid_price_ticks[5] (i16, delta)
//!  23  10     bid_volumes[5]     (u16)
//!  33  10     ask_price_ticks[5] (i16, delta)
//!  43  10     ask_volumes[5]     (u16)
//!  53  1      direction          (u8)
//! ```

use serde::{Deserialize, Serialize};

use crate::numeric::{tick_to_price, ClockTime};

/// Number of book levels per side.
pub const BOOK_DEPTH: usize = 5;

/// Width of one packed record in bytes.
pub const RECORD_WIDTH: usize = 54;

pub const DIRECTION_BUY: u8 = 0;
pub const DIRECTION_SELL: u8 = 1;

// ── Field offsets ───────────────────────────────────────────────────

const OFF_SYNC: usize = 0;
const OFF_DAY: usize = 1;
const OFF_TIME: usize = 2;
const OFF_PRICE: usize = 4;
const OFF_TRADE_COUNT: usize = 6;
const OFF_TURNOVER: usize = 7;
const OFF_VOLUME: usize = 11;
const OFF_BID_PRICES: usize = 13;
const OFF_BID_VOLUMES: usize = 23;
const OFF_ASK_PRICES: usize = 33;
const OFF_ASK_VOLUMES: usize = 43;
const OFF_DIRECTION: usize = 53;

/// How a field is stored relative to the previous record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEncoding {
    /// Stored as-is.
    Absolute,
    /// Stored as an offset from the previous record's reconstructed value.
    Delta,
}

/// Description of one field of the packed layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub offset: usize,
    /// Width of one element in bytes.
    pub width: usize,
    /// Number of elements (5 for book arrays).
    pub count: usize,
    pub encoding: FieldEncoding,
}

impl FieldSpec {
    const fn new(
        name: &'static str,
        offset: usize,
        width: usize,
        count: usize,
        encoding: FieldEncoding,
    ) -> Self {
        Self {
            name,
            offset,
            width,
            count,
            encoding,
        }
    }

    /// Total bytes occupied by this field.
    pub const fn size(&self) -> usize {
        self.width * self.count
    }
}

/// The packed layout, in storage order.
pub const FIELD_LAYOUT: [FieldSpec; 12] = [
    FieldSpec::new("sync", OFF_SYNC, 1, 1, FieldEncoding::Absolute),
    FieldSpec::new("day", OFF_DAY, 1, 1, FieldEncoding::Delta),
    FieldSpec::new("time_s", OFF_TIME, 2, 1, FieldEncoding::Delta),
    FieldSpec::new("price_tick", OFF_PRICE, 2, 1, FieldEncoding::Delta),
    FieldSpec::new("trade_count", OFF_TRADE_COUNT, 1, 1, FieldEncoding::Absolute),
    FieldSpec::new("turnover", OFF_TURNOVER, 4, 1, FieldEncoding::Absolute),
    FieldSpec::new("volume", OFF_VOLUME, 2, 1, FieldEncoding::Absolute),
    FieldSpec::new("bid_price_ticks", OFF_BID_PRICES, 2, BOOK_DEPTH, FieldEncoding::Delta),
    FieldSpec::new("bid_volumes", OFF_BID_VOLUMES, 2, BOOK_DEPTH, FieldEncoding::Absolute),
    FieldSpec::new("ask_price_ticks", OFF_ASK_PRICES, 2, BOOK_DEPTH, FieldEncoding::Delta),
    FieldSpec::new("ask_volumes", OFF_ASK_VOLUMES, 2, BOOK_DEPTH, FieldEncoding::Absolute),
    FieldSpec::new("direction", OFF_DIRECTION, 1, 1, FieldEncoding::Absolute),
];

/// One exchange update event.
///
/// Straight out of a file, the delta-flagged fields of every record but the
/// first hold offsets; after reconstruction they hold absolute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TickRecord {
    pub sync: bool,
    /// Day of month.
    pub day: u8,
    /// Seconds since midnight.
    pub time_s: u16,
    /// Latest trade price in ticks.
    pub price_tick: i16,
    pub trade_count: u8,
    /// Turnover of this event in currency units.
    pub turnover: u32,
    /// Traded volume of this event in lots.
    pub volume: u16,
    pub bid_price_ticks: [i16; BOOK_DEPTH],
    pub bid_volumes: [u16; BOOK_DEPTH],
    pub ask_price_ticks: [i16; BOOK_DEPTH],
    pub ask_volumes: [u16; BOOK_DEPTH],
    /// 0 = buy, 1 = sell, anything else unknown.
    pub direction: u8,
}

impl TickRecord {
    /// Decode one packed record.
    pub fn from_bytes(buf: &[u8; RECORD_WIDTH]) -> Self {
        Self {
            sync: buf[OFF_SYNC] != 0,
            day: buf[OFF_DAY],
            time_s: read_u16(buf, OFF_TIME),
            price_tick: read_i16(buf, OFF_PRICE),
            trade_count: buf[OFF_TRADE_COUNT],
            turnover: read_u32(buf, OFF_TURNOVER),
            volume: read_u16(buf, OFF_VOLUME),
            bid_price_ticks: std::array::from_fn(|i| read_i16(buf, OFF_BID_PRICES + 2 * i)),
            bid_volumes: std::array::from_fn(|i| read_u16(buf, OFF_BID_VOLUMES + 2 * i)),
            ask_price_ticks: std::array::from_fn(|i| read_i16(buf, OFF_ASK_PRICES + 2 * i)),
            ask_volumes: std::array::from_fn(|i| read_u16(buf, OFF_ASK_VOLUMES + 2 * i)),
            direction: buf[OFF_DIRECTION],
        }
    }

    /// Encode into the packed layout.
    pub fn to_bytes(&self) -> [u8; RECORD_WIDTH] {
        let mut buf = [0u8; RECORD_WIDTH];
        buf[OFF_SYNC] = u8::from(self.sync);
        buf[OFF_DAY] = self.day;
        buf[OFF_TIME..OFF_TIME + 2].copy_from_slice(&self.time_s.to_le_bytes());
        buf[OFF_PRICE..OFF_PRICE + 2].copy_from_slice(&self.price_tick.to_le_bytes());
        buf[OFF_TRADE_COUNT] = self.trade_count;
        buf[OFF_TURNOVER..OFF_TURNOVER + 4].copy_from_slice(&self.turnover.to_le_bytes());
        buf[OFF_VOLUME..OFF_VOLUME + 2].copy_from_slice(&self.volume.to_le_bytes());
        for i in 0..BOOK_DEPTH {
            let o = 2 * i;
            buf[OFF_BID_PRICES + o..OFF_BID_PRICES + o + 2]
                .copy_from_slice(&self.bid_price_ticks[i].to_le_bytes());
            buf[OFF_BID_VOLUMES + o..OFF_BID_VOLUMES + o + 2]
                .copy_from_slice(&self.bid_volumes[i].to_le_bytes());
            buf[OFF_ASK_PRICES + o..OFF_ASK_PRICES + o + 2]
                .copy_from_slice(&self.ask_price_ticks[i].to_le_bytes());
            buf[OFF_ASK_VOLUMES + o..OFF_ASK_VOLUMES + o + 2]
                .copy_from_slice(&self.ask_volumes[i].to_le_bytes());
        }
        buf[OFF_DIRECTION] = self.direction;
        buf
    }

    /// Latest trade price in currency units.
    pub fn price(&self) -> f64 {
        tick_to_price(self.price_tick)
    }

    pub fn clock(&self) -> ClockTime {
        ClockTime::from_seconds(self.time_s)
    }
}

#[inline]
fn read_u16(buf: &[u8; RECORD_WIDTH], off: usize) -> u16 {
    u16::from_le_bytes([buf[off], buf[off + 1]])
}

#[inline]
fn read_i16(buf: &[u8; RECORD_WIDTH], off: usize) -> i16 {
    i16::from_le_bytes([buf[off], buf[off + 1]])
}

#[inline]
fn read_u32(buf: &[u8; RECORD_WIDTH], off: usize) -> u32 {
    u32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}
