// Structural pattern predicates
// The scoring engine asks each registered detector a yes/no question and
// adds its boost; detection logic lives entirely in the implementations.

use common::Bar;

/// Conventional boost for an order-block retest
pub const ORDER_BLOCK_BOOST: i32 = 10;
/// Conventional boost for a gap (fair value gap) fill
pub const GAP_FILL_BOOST: i32 = 8;

/// Everything a detector may look at for one scoring pass
#[derive(Debug, Clone, Copy)]
pub struct PatternContext<'a> {
    pub instrument: &'a str,
    pub base: &'a [Bar],
    pub fast: &'a [Bar],
    pub slow: &'a [Bar],
}

/// Pluggable structural-pattern detector
pub trait PatternDetector: Send + Sync {
    fn name(&self) -> &str;

    /// Score adjustment applied when `detect` holds
    fn boost(&self) -> i32;

    fn detect(&self, ctx: &PatternContext<'_>) -> bool;
}

/// Detector backed by a closure
pub struct FnDetector<F> {
    name: String,
    boost: i32,
    predicate: F,
}

impl<F> FnDetector<F>
where
    F: Fn(&PatternContext<'_>) -> bool + Send + Sync,
{
    pub fn new(name: impl Into<String>, boost: i32, predicate: F) -> Self {
        Self {
            name: name.into(),
            boost,
            predicate,
        }
    }
}

impl<F> PatternDetector for FnDetector<F>
where
    F: Fn(&PatternContext<'_>) -> bool + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn boost(&self) -> i32 {
        self.boost
    }

    fn detect(&self, ctx: &PatternContext<'_>) -> bool {
        (self.predicate)(ctx)
    }
}

/// Order-block detector slot with the conventional boost
pub fn order_block<F>(predicate: F) -> FnDetector<F>
where
    F: Fn(&PatternContext<'_>) -> bool + Send + Sync,
{
    FnDetector::new("order_block", ORDER_BLOCK_BOOST, predicate)
}

/// Gap-fill detector slot with the conventional boost
pub fn gap_fill<F>(predicate: F) -> FnDetector<F>
where
    F: Fn(&PatternContext<'_>) -> bool + Send + Sync,
{
    FnDetector::new("gap_fill", GAP_FILL_BOOST, predicate)
}
