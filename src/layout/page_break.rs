//! # Page Break Decisions
//!
//! Decides whether a block fits the space left on a page, and where to cut
//! it when it does not. Paragraphs split between lines with orphan and
//! widow control; image rows never split.

/// What to do with a block that may not fit on the current page.
#[derive(Debug, Clone, PartialEq)]
pub enum BreakDecision {
    /// Place the whole block on the current page.
    Place,
    /// Move the whole block to the next page.
    MoveToNextPage,
    /// Place the first lines here and continue on the next page.
    Split {
        /// How many lines fit on the current page.
        items_on_current_page: usize,
    },
}

/// Orphan/widow limits for breakable blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakRules {
    /// Fewest lines allowed at the bottom of a page.
    pub min_orphan_lines: usize,
    /// Fewest lines allowed at the top of the next page.
    pub min_widow_lines: usize,
}

impl Default for BreakRules {
    fn default() -> Self {
        Self {
            min_orphan_lines: 2,
            min_widow_lines: 2,
        }
    }
}

/// Decide how a block made of `item_heights` fits into `remaining_height`.
///
/// `at_page_top` means nothing has been placed on the page yet. Moving the
/// block would not give it more room, so the decision always makes
/// progress: an unbreakable block is placed (overflowing the page), and a
/// breakable one places at least one line.
pub fn decide_break(
    remaining_height: f64,
    item_heights: &[f64],
    is_breakable: bool,
    rules: BreakRules,
    at_page_top: bool,
) -> BreakDecision {
    let total: f64 = item_heights.iter().sum();
    if total <= remaining_height {
        return BreakDecision::Place;
    }

    if !is_breakable {
        return if at_page_top {
            BreakDecision::Place
        } else {
            BreakDecision::MoveToNextPage
        };
    }

    let mut running = 0.0;
    let mut fit_count = 0;
    for &h in item_heights {
        if running + h > remaining_height {
            break;
        }
        running += h;
        fit_count += 1;
    }

    let decision = apply_orphan_widow(fit_count, item_heights.len(), rules);
    match decision {
        BreakDecision::MoveToNextPage if at_page_top => BreakDecision::Split {
            items_on_current_page: fit_count.max(1).min(item_heights.len()),
        },
        other => other,
    }
}

fn apply_orphan_widow(fit_count: usize, total_items: usize, rules: BreakRules) -> BreakDecision {
    if fit_count == 0 {
        return BreakDecision::MoveToNextPage;
    }

    // Too few lines left behind at the bottom.
    if fit_count < rules.min_orphan_lines && fit_count < total_items {
        return BreakDecision::MoveToNextPage;
    }

    // Too few lines carried to the next page: pull some back.
    let carried = total_items - fit_count;
    if carried > 0 && carried < rules.min_widow_lines {
        let adjusted = fit_count.saturating_sub(rules.min_widow_lines - carried);
        if adjusted == 0 || adjusted < rules.min_orphan_lines {
            return BreakDecision::MoveToNextPage;
        }
        return BreakDecision::Split {
            items_on_current_page: adjusted,
        };
    }

    BreakDecision::Split {
        items_on_current_page: fit_count,
    }
}
