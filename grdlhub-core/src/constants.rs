/// Largest schedule window (in days) that will be expanded in one call.
pub const MAX_RANGE_DAYS: i64 = 1100;

/// Designation cap for appointments whose title is not in the event type catalog.
pub const DEFAULT_MAX_DESIGNATIONS: usize = 3;

/// Upper bound for any event type's designation cap.
pub const MAX_DESIGNATIONS_LIMIT: usize = 3;

/// How far ahead `next_occurrence` searches. Covers a yearly Feb 29 anchor.
pub const NEXT_OCCURRENCE_SEARCH_DAYS: i64 = 366 * 8;
