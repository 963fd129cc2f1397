//! Aggregate counts produced by the analyzer, consumed by the CLI's
//! phase-by-phase progress summary.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnalysisStats {
    pub total_instructions: usize,
    pub reachable_instructions: usize,
    pub unreachable_instructions: usize,
    pub block_count: usize,
    pub function_count: usize,
    pub computed_jump_count: usize,
}
