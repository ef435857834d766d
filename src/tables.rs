//! Built-in feed and thread tables.
//!
//! Four tables exist: imperial feeds, imperial threads, metric feeds and
//! metric threads. The row values (TPI, thou/rev, hundredth-mm) are fixed;
//! the exact gear ratio for each row is computed at startup from the
//! machine's configured gearing, so the same tables drive any
//! encoder/stepper/leadscrew combination. Each entry carries the ratio, the
//! category flags and a display label owned by the UI layer. Table contents
//! are immutable after construction; only the selection cursor moves, and it
//! clamps at the ends rather than wrapping.

use serde::Deserialize;

use crate::config::MachineConfig;
use crate::ratio::RationalRatio;

/// Measurement system of a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Units {
    /// Imperial (TPI / thousandths per revolution).
    Imperial,
    /// Metric (millimeter pitch / millimeters per revolution).
    Metric,
}

/// Operating mode of a table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Continuous feed rate (distance per spindle revolution).
    Feed,
    /// Thread pitch.
    Thread,
}

/// One selectable feed or thread definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedTableEntry {
    /// Human-readable value for the UI layer ("8" TPI, ".001", "1.25", ...).
    /// Opaque to the motion core.
    pub label: &'static str,
    /// Measurement system indicator.
    pub units: Units,
    /// Feed or thread indicator.
    pub mode: Mode,
    /// Exact gear ratio: stepper steps per encoder count.
    pub ratio: RationalRatio,
}

/// The physical gear train between the spindle encoder and the carriage:
/// everything the ratio constructors need to turn a table row into steps
/// per encoder count.
#[derive(Debug, Clone, Copy)]
pub struct Gearing {
    /// Encoder counts per spindle revolution.
    pub encoder_resolution: u64,
    /// Stepper steps per leadscrew revolution, including microstepping.
    pub stepper_resolution: u64,
    /// Leadscrew pitch in threads per inch.
    pub leadscrew_tpi: u64,
}

impl Gearing {
    /// Imperial thread: `tpi` threads per inch of carriage travel.
    fn tpi(&self, tpi: u64) -> RationalRatio {
        RationalRatio::new(
            self.leadscrew_tpi * self.stepper_resolution,
            tpi * self.encoder_resolution,
        )
    }

    /// Imperial feed: thousandths of an inch per spindle revolution.
    fn thou(&self, thou: u64) -> RationalRatio {
        RationalRatio::new(
            thou * self.leadscrew_tpi * self.stepper_resolution,
            self.encoder_resolution * 1000,
        )
    }

    /// Metric pitch or feed: hundredths of a millimeter per revolution;
    /// 254/10 converts the inch-based leadscrew gearing.
    fn hmm(&self, hmm: u64) -> RationalRatio {
        RationalRatio::new(
            hmm * 10 * self.leadscrew_tpi * self.stepper_resolution,
            self.encoder_resolution * 254 * 100,
        )
    }
}

impl From<&MachineConfig> for Gearing {
    fn from(config: &MachineConfig) -> Self {
        Self {
            encoder_resolution: config.encoder.resolution as u64,
            stepper_resolution: config.stepper.resolution as u64,
            leadscrew_tpi: config.stepper.leadscrew_tpi as u64,
        }
    }
}

impl Default for Gearing {
    /// Reference hardware: 4096-count encoder, 200-step motor at 8
    /// microsteps, 12 TPI leadscrew.
    fn default() -> Self {
        Self {
            encoder_resolution: 4096,
            stepper_resolution: 1600,
            leadscrew_tpi: 12,
        }
    }
}

/// Capacity of the largest built-in table (metric threads).
const MAX_TABLE_ROWS: usize = 24;

const INCH_THREAD_ROWS: &[(&str, u64)] = &[
    ("8", 8),
    ("9", 9),
    ("10", 10),
    ("11", 11),
    ("12", 12),
    ("13", 13),
    ("14", 14),
    ("16", 16),
    ("18", 18),
    ("20", 20),
    ("24", 24),
    ("28", 28),
    ("32", 32),
    ("36", 36),
    ("40", 40),
    ("44", 44),
    ("48", 48),
    ("56", 56),
    ("64", 64),
    ("72", 72),
    ("80", 80),
];

const INCH_FEED_ROWS: &[(&str, u64)] = &[
    (".001", 1),
    (".002", 2),
    (".003", 3),
    (".004", 4),
    (".005", 5),
    (".006", 6),
    (".007", 7),
    (".008", 8),
    (".009", 9),
    (".010", 10),
    (".011", 11),
    (".012", 12),
    (".013", 13),
    (".015", 15),
    (".017", 17),
    (".020", 20),
    (".023", 23),
    (".026", 26),
    (".030", 30),
    (".035", 35),
    (".040", 40),
];

const METRIC_THREAD_ROWS: &[(&str, u64)] = &[
    (".20", 20),
    (".25", 25),
    (".30", 30),
    (".35", 35),
    (".40", 40),
    (".45", 45),
    (".50", 50),
    (".60", 60),
    (".70", 70),
    (".75", 75),
    (".80", 80),
    ("1.00", 100),
    ("1.25", 125),
    ("1.50", 150),
    ("1.75", 175),
    ("2.00", 200),
    ("2.50", 250),
    ("3.00", 300),
    ("3.50", 350),
    ("4.00", 400),
    ("4.50", 450),
    ("5.00", 500),
    ("5.50", 550),
    ("6.00", 600),
];

const METRIC_FEED_ROWS: &[(&str, u64)] = &[
    (".02", 2),
    (".05", 5),
    (".07", 7),
    (".10", 10),
    (".12", 12),
    (".15", 15),
    (".17", 17),
    (".20", 20),
    (".22", 22),
    (".25", 25),
    (".27", 27),
    (".30", 30),
    (".35", 35),
    (".40", 40),
    (".45", 45),
    (".50", 50),
    (".55", 55),
    (".60", 60),
    (".70", 70),
    (".85", 85),
    ("1.00", 100),
];

/// An ordered, cursor-navigable table of feed or thread entries.
///
/// Contents are fixed at construction; only the cursor is mutable.
#[derive(Debug, Clone)]
pub struct FeedTable {
    entries: heapless::Vec<FeedTableEntry, MAX_TABLE_ROWS>,
    selected: usize,
}

impl FeedTable {
    fn new<F>(rows: &[(&'static str, u64)], units: Units, mode: Mode, ratio: F) -> Self
    where
        F: Fn(u64) -> RationalRatio,
    {
        let mut entries = heapless::Vec::new();
        for &(label, value) in rows {
            // Row lists never exceed MAX_TABLE_ROWS.
            let _ = entries.push(FeedTableEntry {
                label,
                units,
                mode,
                ratio: ratio(value),
            });
        }
        debug_assert_eq!(entries.len(), rows.len());
        Self {
            entries,
            selected: 0,
        }
    }

    /// Number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; the built-in tables are non-empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of the selected entry.
    #[inline]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// The currently selected entry.
    #[inline]
    pub fn current(&self) -> &FeedTableEntry {
        &self.entries[self.selected]
    }

    /// Move the cursor to the next entry, clamping at the last row.
    pub fn next(&mut self) -> &FeedTableEntry {
        if self.selected + 1 < self.entries.len() {
            self.selected += 1;
        }
        self.current()
    }

    /// Move the cursor to the previous entry, clamping at the first row.
    pub fn previous(&mut self) -> &FeedTableEntry {
        if self.selected > 0 {
            self.selected -= 1;
        }
        self.current()
    }
}

/// Owner of the four built-in tables, each with its own persistent cursor.
///
/// Switching between metric/imperial and feed/thread is a lookup here, never
/// a mutation of table contents.
#[derive(Debug, Clone)]
pub struct FeedTableFactory {
    inch_feeds: FeedTable,
    inch_threads: FeedTable,
    metric_feeds: FeedTable,
    metric_threads: FeedTable,
}

impl FeedTableFactory {
    /// Build the four tables for the given gearing, all cursors at their
    /// first rows.
    pub fn new(gearing: Gearing) -> Self {
        Self {
            inch_feeds: FeedTable::new(INCH_FEED_ROWS, Units::Imperial, Mode::Feed, |v| {
                gearing.thou(v)
            }),
            inch_threads: FeedTable::new(INCH_THREAD_ROWS, Units::Imperial, Mode::Thread, |v| {
                gearing.tpi(v)
            }),
            metric_feeds: FeedTable::new(METRIC_FEED_ROWS, Units::Metric, Mode::Feed, |v| {
                gearing.hmm(v)
            }),
            metric_threads: FeedTable::new(METRIC_THREAD_ROWS, Units::Metric, Mode::Thread, |v| {
                gearing.hmm(v)
            }),
        }
    }

    /// Look up the table for a units/mode combination.
    pub fn table(&mut self, units: Units, mode: Mode) -> &mut FeedTable {
        match (units, mode) {
            (Units::Imperial, Mode::Feed) => &mut self.inch_feeds,
            (Units::Imperial, Mode::Thread) => &mut self.inch_threads,
            (Units::Metric, Mode::Feed) => &mut self.metric_feeds,
            (Units::Metric, Mode::Thread) => &mut self.metric_threads,
        }
    }
}

impl Default for FeedTableFactory {
    fn default() -> Self {
        Self::new(Gearing::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_clamps_at_last_row() {
        let mut factory = FeedTableFactory::default();
        let table = factory.table(Units::Imperial, Mode::Thread);
        for _ in 0..table.len() * 2 {
            table.next();
        }
        assert_eq!(table.selected_index(), table.len() - 1);
        assert_eq!(table.current().label, "80");
        // One more next returns the same entry.
        assert_eq!(table.next().label, "80");
    }

    #[test]
    fn test_previous_clamps_at_first_row() {
        let mut factory = FeedTableFactory::default();
        let table = factory.table(Units::Imperial, Mode::Feed);
        assert_eq!(table.previous().label, ".001");
        assert_eq!(table.selected_index(), 0);
    }

    #[test]
    fn test_factory_tables_are_disjoint_and_categorized() {
        let mut factory = FeedTableFactory::default();
        let entry = factory.table(Units::Metric, Mode::Thread).current();
        assert_eq!(entry.units, Units::Metric);
        assert_eq!(entry.mode, Mode::Thread);
        assert_eq!(entry.label, ".20");

        // Cursors are independent: move one table, others stay put.
        factory.table(Units::Metric, Mode::Thread).next();
        assert_eq!(factory.table(Units::Imperial, Mode::Feed).selected_index(), 0);
        assert_eq!(factory.table(Units::Metric, Mode::Thread).selected_index(), 1);
    }

    #[test]
    fn test_eight_tpi_ratio_on_reference_gearing() {
        // 8 TPI on a 12 TPI leadscrew: 12*1600 / (8*4096) = 19200/32768.
        let mut factory = FeedTableFactory::default();
        let entry = *factory.table(Units::Imperial, Mode::Thread).current();
        assert_eq!(entry.ratio.numerator(), 19_200);
        assert_eq!(entry.ratio.denominator(), 32_768);
        assert_eq!(entry.ratio.multiply(32_768), 19_200);
    }

    #[test]
    fn test_ratios_follow_configured_gearing() {
        // An 8192-count encoder must command the same physical travel: the
        // 8 TPI entry is 1.5 leadscrew revolutions per spindle revolution,
        // i.e. 2400 steps per rev regardless of encoder resolution.
        let gearing = Gearing {
            encoder_resolution: 8192,
            ..Gearing::default()
        };
        let mut factory = FeedTableFactory::new(gearing);
        let entry = *factory.table(Units::Imperial, Mode::Thread).current();
        assert_eq!(entry.label, "8");
        assert_eq!(entry.ratio.multiply(8192), 2400);

        // Denser microstepping scales the commanded steps proportionally.
        let fine = Gearing {
            stepper_resolution: 3200,
            ..Gearing::default()
        };
        let mut factory = FeedTableFactory::new(fine);
        let entry = *factory.table(Units::Imperial, Mode::Thread).current();
        assert_eq!(entry.ratio.multiply(4096), 4800);
    }

    #[test]
    fn test_gearing_from_config() {
        let mut config = MachineConfig::default();
        config.encoder.resolution = 8192;
        config.stepper.resolution = 3200;
        config.stepper.leadscrew_tpi = 8;
        let gearing = Gearing::from(&config);
        assert_eq!(gearing.encoder_resolution, 8192);
        assert_eq!(gearing.stepper_resolution, 3200);
        assert_eq!(gearing.leadscrew_tpi, 8);
    }

    #[test]
    fn test_table_sizes() {
        let mut factory = FeedTableFactory::default();
        assert_eq!(factory.table(Units::Imperial, Mode::Thread).len(), 21);
        assert_eq!(factory.table(Units::Imperial, Mode::Feed).len(), 21);
        assert_eq!(factory.table(Units::Metric, Mode::Thread).len(), 24);
        assert_eq!(factory.table(Units::Metric, Mode::Feed).len(), 21);
    }
}
