//! Write-once, read-once cell backing every scope's outcome.

use twain_diag::Category;

#[derive(Debug)]
enum SlotState<T> {
    Empty,
    Written(T),
    Consumed,
}

/// A cell that must be written exactly once and then read exactly once.
///
/// Violations come back as the diagnostic category describing them; the
/// owning scope turns that into a fatal report.
#[derive(Debug)]
pub(crate) struct Slot<T> {
    state: SlotState<T>,
}

impl<T> Slot<T> {
    pub(crate) fn new() -> Self {
        Self {
            state: SlotState::Empty,
        }
    }

    /// Whether an outcome was ever written, consumed or not.
    pub(crate) fn is_written(&self) -> bool {
        !matches!(self.state, SlotState::Empty)
    }

    pub(crate) fn write(&mut self, value: T) -> Result<(), Category> {
        match self.state {
            SlotState::Empty => {
                self.state = SlotState::Written(value);
                Ok(())
            }
            SlotState::Written(_) | SlotState::Consumed => Err(Category::DoubleOutcome),
        }
    }

    pub(crate) fn take(&mut self) -> Result<T, Category> {
        match std::mem::replace(&mut self.state, SlotState::Consumed) {
            SlotState::Written(value) => Ok(value),
            SlotState::Empty => {
                self.state = SlotState::Empty;
                Err(Category::MissingOutcome)
            }
            SlotState::Consumed => Err(Category::ConsumedSlot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_take() {
        let mut slot = Slot::new();
        assert!(!slot.is_written());
        assert_eq!(slot.write(3), Ok(()));
        assert!(slot.is_written());
        assert_eq!(slot.take(), Ok(3));
        assert!(slot.is_written());
    }

    #[test]
    fn second_write_is_rejected_and_keeps_first_value() {
        let mut slot = Slot::new();
        slot.write("first").unwrap();
        assert_eq!(slot.write("second"), Err(Category::DoubleOutcome));
        assert_eq!(slot.take(), Ok("first"));
    }

    #[test]
    fn reading_unwritten_slot_is_reported() {
        let mut slot: Slot<u8> = Slot::new();
        assert_eq!(slot.take(), Err(Category::MissingOutcome));
        assert!(!slot.is_written());
    }

    #[test]
    fn reading_twice_is_reported() {
        let mut slot = Slot::new();
        slot.write(1).unwrap();
        slot.take().unwrap();
        assert_eq!(slot.take(), Err(Category::ConsumedSlot));
        assert_eq!(slot.write(2), Err(Category::DoubleOutcome));
    }
}
