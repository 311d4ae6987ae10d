//! Weekday × period projection of class slots.
//!
//! Cells hold indices into the borrowed slot slice, so a double period is
//! the same slot seen from two cells rather than two copies of it.

use tracing::{debug, trace};

use crate::model::{ClassSlot, DayOfWeek};
use crate::period::{PERIODS_PER_DAY, Period, PeriodCount};

const GRID_DAYS: usize = DayOfWeek::WEEKDAYS.len();

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    /// Index into the slots the grid was projected from.
    pub slot: usize,
    /// `false` for the second half of a double period.
    pub span_start: bool,
}

#[derive(Debug, Clone)]
pub struct TimetableGrid<'a> {
    slots: &'a [ClassSlot],
    cells: [[Option<GridCell>; PERIODS_PER_DAY]; GRID_DAYS],
}

impl<'a> TimetableGrid<'a> {
    fn empty(slots: &'a [ClassSlot]) -> Self {
        Self {
            slots,
            cells: [[None; PERIODS_PER_DAY]; GRID_DAYS],
        }
    }

    fn place(&mut self, column: usize, period: Period, cell: GridCell) {
        trace!(column, period = period.number(), slot = cell.slot, span_start = cell.span_start, "placing slot");
        self.cells[column][period.index()] = Some(cell);
    }

    /// Weekend days have no column and always read as empty.
    pub fn cell(&self, day: DayOfWeek, period: Period) -> Option<GridCell> {
        let column = day.weekday_index()?;
        self.cells[column][period.index()]
    }

    pub fn slot_at(&self, day: DayOfWeek, period: Period) -> Option<&'a ClassSlot> {
        let slots = self.slots;
        self.cell(day, period).map(|cell| &slots[cell.slot])
    }

    /// True when this cell continues the double period that starts in the
    /// cell above it. Renderers merge such cells into one block.
    pub fn is_continuation(&self, day: DayOfWeek, period: Period) -> bool {
        let Some(cell) = self.cell(day, period) else {
            return false;
        };
        if cell.span_start || period == Period::FIRST {
            return false;
        }
        let Some(above) = Period::new(period.number() - 1).and_then(|p| self.cell(day, p)) else {
            return false;
        };
        above.slot == cell.slot && self.slots[above.slot].period_count == PeriodCount::Double
    }

    /// Rows a cell occupies when rendered: 2 for an intact double period,
    /// 0 for its continuation, 1 otherwise.
    pub fn row_span(&self, day: DayOfWeek, period: Period) -> usize {
        if self.is_continuation(day, period) {
            return 0;
        }
        match period.next() {
            Some(next) if self.is_continuation(day, next) => 2,
            _ => 1,
        }
    }

    /// Rows in period order, each with one optional slot per weekday.
    pub fn rows(&self) -> impl Iterator<Item = (Period, [Option<&'a ClassSlot>; GRID_DAYS])> + '_ {
        Period::all().map(move |period| {
            let row = DayOfWeek::WEEKDAYS.map(|day| self.slot_at(day, period));
            (period, row)
        })
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    /// Slots that did not land in any cell: no day or period, a weekend
    /// day, or fully overwritten by a later slot.
    pub fn unplaced(&self) -> Vec<&'a ClassSlot> {
        let placed: Vec<usize> = self.cells.iter().flatten().flatten().map(|cell| cell.slot).collect();
        let slots = self.slots;
        slots
            .iter()
            .enumerate()
            .filter(|(idx, _)| !placed.contains(idx))
            .map(|(_, slot)| slot)
            .collect()
    }
}

pub fn project_timetable(slots: &[ClassSlot]) -> TimetableGrid<'_> {
    let mut grid = TimetableGrid::empty(slots);

    for (idx, slot) in slots.iter().enumerate() {
        let (Some(day), Some(period)) = (slot.day_of_week, slot.period) else {
            trace!(slot = slot.id, "unscheduled slot skipped");
            continue;
        };
        let Some(column) = day.weekday_index() else {
            trace!(slot = slot.id, ?day, "weekend slot outside timetable grid");
            continue;
        };

        grid.place(column, period, GridCell { slot: idx, span_start: true });

        if slot.period_count == PeriodCount::Double {
            match period.next() {
                Some(next) => grid.place(column, next, GridCell { slot: idx, span_start: false }),
                None => debug!(slot = slot.id, "double period starts at last period; continuation dropped"),
            }
        }
    }

    debug!(slots = slots.len(), occupied = grid.occupied_cells(), "projected timetable");
    grid
}
