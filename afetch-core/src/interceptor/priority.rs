use std::ops::Range;

/// Reserved priority ranges keep stages in a predictable order
pub struct PriorityRanges;

impl PriorityRanges {
    /// Built-in stages, always outermost (deadline)
    pub const BUILTIN: Range<i32> = 9000..10000;

    /// Request policy that must see the final request (auth, signing)
    pub const HIGH: Range<i32> = 7000..9000;

    /// General request shaping
    pub const NORMAL: Range<i32> = 3000..7000;

    /// Support stages (tracing headers, debug logging)
    pub const SUPPORT: Range<i32> = 500..3000;

    /// Monitoring, always innermost
    pub const MONITORING: Range<i32> = 0..500;

    /// Ranges open to host interceptors.
    pub const HOST: [Range<i32>; 4] = [Self::HIGH, Self::NORMAL, Self::SUPPORT, Self::MONITORING];

    pub fn is_host_priority(priority: i32) -> bool {
        Self::HOST.iter().any(|range| range.contains(&priority))
    }
}
