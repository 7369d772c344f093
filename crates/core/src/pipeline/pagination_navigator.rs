use thiserror::Error;

use crate::shared::constants::{NAVIGATOR_MAX, NAVIGATOR_MIN};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("navigator bounds out of order: min {min} > max {max}")]
pub struct NavigatorBoundsError {
    pub min: i64,
    pub max: i64,
}

/// Bounded integer cursor that wraps at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorCursor {
    value: i64,
    min: i64,
    max: i64,
}

impl NavigatorCursor {
    /// Starts at `min`.
    pub fn new(min: i64, max: i64) -> Result<Self, NavigatorBoundsError> {
        if min > max {
            return Err(NavigatorBoundsError { min, max });
        }
        Ok(Self {
            value: min,
            min,
            max,
        })
    }

    pub fn current(&self) -> i64 {
        self.value
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn increment(&mut self) -> i64 {
        self.value = if self.value >= self.max {
            self.min
        } else {
            self.value + 1
        };
        self.value
    }

    pub fn decrement(&mut self) -> i64 {
        self.value = if self.value <= self.min {
            self.max
        } else {
            self.value - 1
        };
        self.value
    }

    /// Moves to `value`, clamped into `[min, max]`.
    pub fn set(&mut self, value: i64) -> i64 {
        self.value = value.clamp(self.min, self.max);
        self.value
    }
}

impl Default for NavigatorCursor {
    fn default() -> Self {
        Self {
            value: NAVIGATOR_MIN,
            min: NAVIGATOR_MIN,
            max: NAVIGATOR_MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_increment_wraps_past_max() {
        let mut cursor = NavigatorCursor::default();
        cursor.set(9_999_999);
        assert_eq!(cursor.increment(), 0);
    }

    #[test]
    fn test_decrement_wraps_past_min() {
        let mut cursor = NavigatorCursor::default();
        assert_eq!(cursor.current(), 0);
        assert_eq!(cursor.decrement(), 9_999_999);
    }

    #[test]
    fn test_steps_inside_range() {
        let mut cursor = NavigatorCursor::new(0, 10).unwrap();
        assert_eq!(cursor.increment(), 1);
        assert_eq!(cursor.increment(), 2);
        assert_eq!(cursor.decrement(), 1);
    }

    #[rstest]
    #[case(-5, 0)]
    #[case(4, 4)]
    #[case(99, 10)]
    fn test_set_clamps(#[case] input: i64, #[case] expected: i64) {
        let mut cursor = NavigatorCursor::new(0, 10).unwrap();
        assert_eq!(cursor.set(input), expected);
    }

    #[test]
    fn test_single_value_range_is_fixed_point() {
        let mut cursor = NavigatorCursor::new(7, 7).unwrap();
        assert_eq!(cursor.increment(), 7);
        assert_eq!(cursor.decrement(), 7);
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert_eq!(
            NavigatorCursor::new(5, 1).unwrap_err(),
            NavigatorBoundsError { min: 5, max: 1 }
        );
    }

    #[test]
    fn test_full_cycle_returns_to_start() {
        let mut cursor = NavigatorCursor::new(-2, 2).unwrap();
        let start = cursor.current();
        for _ in 0..5 {
            cursor.increment();
        }
        assert_eq!(cursor.current(), start);
    }
}
