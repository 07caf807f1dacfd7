//! Pattern editing entry points
//!
//! Modules are immutable once loaded. The edit calls check their
//! coordinates like a real editor would and then refuse, so callers get
//! [`Error::InvalidIndex`] for bad coordinates and
//! [`Error::UnsupportedOperation`] for everything else.

use crate::Module;
use crate::error::{Error, Result};
use crate::module::Cell;

const READ_ONLY: &str = "modules are read-only; pattern editing is not supported";

impl Module {
    /// Always false: no operation mutates a loaded module
    pub fn is_pattern_editing_supported(&self) -> bool {
        false
    }

    fn check_pattern(&self, pattern: i32) -> Result<()> {
        match self.pattern(pattern) {
            Some(_) => Ok(()),
            None => Err(Error::invalid_index("pattern", pattern)),
        }
    }

    fn check_row(&self, pattern: i32, row: i32) -> Result<()> {
        self.check_pattern(pattern)?;
        if row < 0 || row >= self.pattern_num_rows(pattern) {
            return Err(Error::invalid_index("row", row));
        }
        Ok(())
    }

    fn check_cell(&self, pattern: i32, row: i32, channel: i32) -> Result<()> {
        self.check_row(pattern, row)?;
        if channel < 0 || channel >= self.num_channels() {
            return Err(Error::invalid_index("channel", channel));
        }
        Ok(())
    }

    pub fn set_pattern_cell(&self, pattern: i32, row: i32, channel: i32, _cell: Cell) -> Result<()> {
        self.check_cell(pattern, row, channel)?;
        Err(Error::UnsupportedOperation(READ_ONLY))
    }

    pub fn set_pattern_note(&self, pattern: i32, row: i32, channel: i32, _note: u8) -> Result<()> {
        self.check_cell(pattern, row, channel)?;
        Err(Error::UnsupportedOperation(READ_ONLY))
    }

    pub fn set_pattern_instrument(
        &self,
        pattern: i32,
        row: i32,
        channel: i32,
        _instrument: u8,
    ) -> Result<()> {
        self.check_cell(pattern, row, channel)?;
        Err(Error::UnsupportedOperation(READ_ONLY))
    }

    pub fn clear_pattern_cell(&self, pattern: i32, row: i32, channel: i32) -> Result<()> {
        self.check_cell(pattern, row, channel)?;
        Err(Error::UnsupportedOperation(READ_ONLY))
    }

    pub fn clear_pattern_row(&self, pattern: i32, row: i32) -> Result<()> {
        self.check_row(pattern, row)?;
        Err(Error::UnsupportedOperation(READ_ONLY))
    }

    /// Insert before `row`; `row` may equal the row count to append
    pub fn insert_pattern_row(&self, pattern: i32, row: i32) -> Result<()> {
        self.check_pattern(pattern)?;
        if row < 0 || row > self.pattern_num_rows(pattern) {
            return Err(Error::invalid_index("row", row));
        }
        Err(Error::UnsupportedOperation(READ_ONLY))
    }

    pub fn delete_pattern_row(&self, pattern: i32, row: i32) -> Result<()> {
        self.check_row(pattern, row)?;
        Err(Error::UnsupportedOperation(READ_ONLY))
    }
}
