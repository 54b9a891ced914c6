// Session-scoped buffer for multi-point performance entry
use super::error::EvaluationError;
use super::stress::{Reading, TimeSeriesPoint};

/// Minutes between consecutive entries.
pub const ENTRY_INTERVAL_MINUTES: u32 = 5;

/// Readings entered one at a time before evaluation. Owned by the caller; the
/// evaluator only drains it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceInputBuffer {
    points: Vec<TimeSeriesPoint>,
    next_time: u32,
}

impl PerformanceInputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reading at the next 5-minute offset and return its point.
    pub fn push(&mut self, reading: Reading) -> TimeSeriesPoint {
        let point = TimeSeriesPoint::new(self.next_time, reading.current, reading.temperature);
        self.points.push(point);
        self.next_time += ENTRY_INTERVAL_MINUTES;
        point
    }

    pub fn remove(&mut self, index: usize) -> Result<TimeSeriesPoint, EvaluationError> {
        if index >= self.points.len() {
            return Err(EvaluationError::invalid(format!("no buffered entry at index {index}")));
        }
        let removed = self.points.remove(index);
        if self.points.is_empty() {
            self.next_time = 0;
        }
        Ok(removed)
    }

    pub fn reset(&mut self) {
        self.points.clear();
        self.next_time = 0;
    }

    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Offset the next entry will be stamped with.
    pub fn next_time(&self) -> u32 {
        self.next_time
    }

    /// Latest entry, which stands in for I_max / T_max.
    pub fn last(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }

    /// Take every entry, leaving the buffer empty. At least two entries are required.
    pub fn drain(&mut self) -> Result<Vec<TimeSeriesPoint>, EvaluationError> {
        if self.points.len() < 2 {
            return Err(EvaluationError::invalid("enter at least two readings before evaluating"));
        }
        self.next_time = 0;
        Ok(std::mem::take(&mut self.points))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(current: f64, temperature: f64) -> Reading {
        Reading::new(Some(current), Some(temperature)).unwrap()
    }

    #[test]
    fn test_entries_are_stamped_five_minutes_apart() {
        let mut buffer = PerformanceInputBuffer::new();
        buffer.push(reading(10.0, 30.0));
        buffer.push(reading(12.0, 31.0));
        let last = buffer.push(reading(15.0, 33.0));

        let times: Vec<u32> = buffer.points().iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0, 5, 10]);
        assert_eq!(buffer.last(), Some(&last));
        assert_eq!(buffer.next_time(), 15);
    }

    #[test]
    fn test_removing_last_entry_resets_clock() {
        let mut buffer = PerformanceInputBuffer::new();
        buffer.push(reading(10.0, 30.0));
        buffer.push(reading(12.0, 31.0));

        buffer.remove(0).unwrap();
        assert_eq!(buffer.next_time(), 10);
        buffer.remove(0).unwrap();
        assert_eq!(buffer.next_time(), 0);
        assert!(buffer.remove(0).is_err());
    }

    #[test]
    fn test_drain_requires_two_entries() {
        let mut buffer = PerformanceInputBuffer::new();
        buffer.push(reading(10.0, 30.0));
        assert!(buffer.drain().is_err());
        assert_eq!(buffer.len(), 1);

        buffer.push(reading(11.0, 30.5));
        let drained = buffer.drain().unwrap();
        assert_eq!(drained.len(), 2);
        assert!(buffer.is_empty());
        assert_eq!(buffer.next_time(), 0);
    }

    #[test]
    fn test_reset() {
        let mut buffer = PerformanceInputBuffer::new();
        buffer.push(reading(10.0, 30.0));
        buffer.reset();
        assert!(buffer.is_empty());
        assert_eq!(buffer.next_time(), 0);
    }
}
