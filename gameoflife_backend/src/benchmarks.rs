//! Instruction-count profiling per API operation.

use candid::{CandidType, Deserialize};
use serde::Serialize;
use std::cell::RefCell;

/// Maximum number of samples to keep per operation
const MAX_SAMPLES: usize = 100;

#[derive(Clone, Debug, CandidType, Deserialize, Serialize)]
pub struct OperationStats {
    pub call_count: u64,
    pub total_instructions: u64,
    pub min_instructions: u64,
    pub max_instructions: u64,
    /// Circular buffer of the most recent samples
    pub recent_samples: Vec<u64>,
    sample_index: usize,
}

impl Default for OperationStats {
    fn default() -> Self {
        Self {
            call_count: 0,
            total_instructions: 0,
            min_instructions: u64::MAX,
            max_instructions: 0,
            recent_samples: Vec::with_capacity(MAX_SAMPLES),
            sample_index: 0,
        }
    }
}

impl OperationStats {
    pub fn record(&mut self, instructions: u64) {
        self.call_count += 1;
        self.total_instructions = self.total_instructions.saturating_add(instructions);
        self.min_instructions = self.min_instructions.min(instructions);
        self.max_instructions = self.max_instructions.max(instructions);

        if self.recent_samples.len() < MAX_SAMPLES {
            self.recent_samples.push(instructions);
        } else {
            self.recent_samples[self.sample_index] = instructions;
            self.sample_index = (self.sample_index + 1) % MAX_SAMPLES;
        }
    }

    pub fn average(&self) -> u64 {
        if self.call_count == 0 {
            0
        } else {
            self.total_instructions / self.call_count
        }
    }

    pub fn recent_average(&self) -> u64 {
        if self.recent_samples.is_empty() {
            0
        } else {
            self.recent_samples.iter().sum::<u64>() / self.recent_samples.len() as u64
        }
    }

    fn summary(&self, operation: &str) -> OperationSummary {
        OperationSummary {
            operation: operation.to_string(),
            call_count: self.call_count,
            average_instructions: self.average(),
            recent_average_instructions: self.recent_average(),
            min_instructions: if self.call_count == 0 { 0 } else { self.min_instructions },
            max_instructions: self.max_instructions,
        }
    }
}

#[derive(Clone, Debug, Default, CandidType, Deserialize, Serialize)]
pub struct BenchmarkData {
    pub upload_board: OperationStats,
    pub next_state: OperationStats,
    pub final_state: OperationStats,
    pub last_reset_ns: u64,
}

impl BenchmarkData {
    pub fn reset(&mut self, now_ns: u64) {
        *self = Self::default();
        self.last_reset_ns = now_ns;
    }

    fn stats_mut(&mut self, operation: BenchmarkOperation) -> &mut OperationStats {
        match operation {
            BenchmarkOperation::UploadBoard => &mut self.upload_board,
            BenchmarkOperation::NextState => &mut self.next_state,
            BenchmarkOperation::FinalState => &mut self.final_state,
        }
    }

    pub fn report(&self, now_ns: u64) -> BenchmarkReport {
        BenchmarkReport {
            tracking_duration_ns: now_ns.saturating_sub(self.last_reset_ns),
            operations: vec![
                self.upload_board.summary("upload_board"),
                self.next_state.summary("get_next_state"),
                self.final_state.summary("get_final_state"),
            ],
        }
    }
}

#[derive(Clone, Debug, CandidType, Deserialize, Serialize, PartialEq, Eq)]
pub struct OperationSummary {
    pub operation: String,
    pub call_count: u64,
    pub average_instructions: u64,
    pub recent_average_instructions: u64,
    pub min_instructions: u64,
    pub max_instructions: u64,
}

#[derive(Clone, Debug, CandidType, Deserialize, Serialize)]
pub struct BenchmarkReport {
    pub tracking_duration_ns: u64,
    pub operations: Vec<OperationSummary>,
}

thread_local! {
    static BENCHMARKS: RefCell<BenchmarkData> = RefCell::new(BenchmarkData::default());
}

pub fn report(now_ns: u64) -> BenchmarkReport {
    BENCHMARKS.with(|b| b.borrow().report(now_ns))
}

pub fn reset(now_ns: u64) {
    BENCHMARKS.with(|b| b.borrow_mut().reset(now_ns));
}

/// Instructions executed so far in this message (0 outside a canister).
#[inline]
pub fn get_instructions() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        ic_cdk::api::performance_counter(0)
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BenchmarkOperation {
    UploadBoard,
    NextState,
    FinalState,
}

/// Records the instructions spent between construction and drop.
pub struct BenchmarkGuard {
    start: u64,
    operation: BenchmarkOperation,
}

impl BenchmarkGuard {
    pub fn new(operation: BenchmarkOperation) -> Self {
        Self {
            start: get_instructions(),
            operation,
        }
    }
}

impl Drop for BenchmarkGuard {
    fn drop(&mut self) {
        let elapsed = get_instructions().saturating_sub(self.start);
        BENCHMARKS.with(|b| b.borrow_mut().stats_mut(self.operation).record(elapsed));
    }
}

#[macro_export]
macro_rules! benchmark {
    ($op:ident) => {
        let _guard = $crate::benchmarks::BenchmarkGuard::new($crate::benchmarks::BenchmarkOperation::$op);
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_min_max_average() {
        let mut stats = OperationStats::default();
        for sample in [30, 10, 20] {
            stats.record(sample);
        }
        assert_eq!(stats.call_count, 3);
        assert_eq!((stats.min_instructions, stats.max_instructions), (10, 30));
        assert_eq!(stats.average(), 20);
        assert_eq!(stats.recent_average(), 20);
    }

    #[test]
    fn test_recent_samples_wrap_around() {
        let mut stats = OperationStats::default();
        for i in 0..(MAX_SAMPLES as u64 + 10) {
            stats.record(i);
        }
        assert_eq!(stats.recent_samples.len(), MAX_SAMPLES);
        // Oldest ten were overwritten by the newest ten
        assert_eq!(stats.recent_samples[0], MAX_SAMPLES as u64);
        assert_eq!(stats.recent_samples[9], MAX_SAMPLES as u64 + 9);
    }

    #[test]
    fn test_empty_stats_report_zero_min() {
        let report = BenchmarkData::default().report(0);
        assert_eq!(report.operations.len(), 3);
        assert!(report.operations.iter().all(|op| op.min_instructions == 0 && op.call_count == 0));
    }

    #[test]
    fn test_guard_records_on_drop() {
        reset(100);
        {
            benchmark!(NextState);
        }
        let report = report(250);
        assert_eq!(report.tracking_duration_ns, 150);
        let next = report.operations.iter().find(|op| op.operation == "get_next_state").unwrap();
        assert_eq!(next.call_count, 1);
    }
}
