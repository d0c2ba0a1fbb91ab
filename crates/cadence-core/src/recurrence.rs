use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::HashMap;

use crate::error::CoreError;
use crate::models::{Frequency, OccurrenceOverride, OccurrenceStatus, RecurrenceRule};

/// Upper bound on monthly candidate steps. The anchor's own month (which
/// always has the anchor day) recurs within at most twelve interval steps.
const MONTHLY_SCAN_LIMIT: i64 = 48;

/// Upper bound on yearly candidate steps. The Gregorian leap pattern repeats
/// every 400 years, so a Feb 29 anchor finds its next hit within 400 steps.
const YEARLY_SCAN_LIMIT: i64 = 401;

/// One concrete occurrence of a recurring task on a specific calendar day,
/// with any per-date override already applied.
///
/// Derived, never persisted. Absence of an occurrence is expressed as `None`
/// from [`OccurrenceResolver::resolve`], not as a field on this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveOccurrence {
    pub date: NaiveDate,
    pub status: OccurrenceStatus,
    /// Effective time-of-day: the override's if rescheduled, else the rule's
    pub at_time: Option<NaiveTime>,
    /// Whether an override contributed to this occurrence
    pub overridden: bool,
}

/// OccurrenceResolver: evaluates a recurrence rule against calendar days.
///
/// Responsibilities:
/// 1. Validate the rule at construction; evaluation itself never fails
/// 2. Decide whether an occurrence exists on a given date
/// 3. Overlay per-date overrides onto the rule's template defaults
/// 4. Step forward through template dates for previews and "next" queries
///
/// The resolver is a pure value: no I/O, no interior mutability, safe to
/// share across threads. All dates are calendar days in the owning user's
/// timezone; callers normalize before constructing queries (see
/// [`crate::timezone::local_date_in`]).
#[derive(Debug, Clone)]
pub struct OccurrenceResolver {
    rule: RecurrenceRule,
    /// Overrides mapped by occurrence date for O(1) lookup
    overrides: HashMap<NaiveDate, OccurrenceOverride>,
}

impl OccurrenceResolver {
    /// Creates a resolver from a rule and its overrides.
    ///
    /// # Behavior
    /// - Rejects invalid rule configurations (`CoreError::InvalidRule`);
    ///   a constructed resolver therefore always evaluates cleanly
    /// - Builds the per-date override map for O(1) access during resolution
    pub fn new(
        rule: RecurrenceRule,
        overrides: Vec<OccurrenceOverride>,
    ) -> Result<Self, CoreError> {
        rule.validate()?;

        let mut map = HashMap::with_capacity(overrides.len());
        for ov in overrides {
            map.insert(ov.occurrence_date, ov);
        }

        Ok(Self {
            rule,
            overrides: map,
        })
    }

    /// Gets the rule this resolver evaluates.
    pub fn rule(&self) -> &RecurrenceRule {
        &self.rule
    }

    /// Whether the template produces an occurrence on `date`, ignoring
    /// overrides. Overrides change an occurrence's status or time, never
    /// whether it exists.
    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        if let Some(end) = self.rule.anchor_end {
            if date > end {
                return false;
            }
        }
        self.template_hit(date)
    }

    /// Resolves the effective occurrence for a single calendar day.
    ///
    /// # Returns
    /// * `None` - no occurrence exists on that date (before the anchor,
    ///   past the end, or off the pattern)
    /// * `Some(occurrence)` - the occurrence with override status/time
    ///   applied, or the template defaults when no override exists
    pub fn resolve(&self, target_date: NaiveDate) -> Option<EffectiveOccurrence> {
        if !self.occurs_on(target_date) {
            return None;
        }

        Some(match self.overrides.get(&target_date) {
            Some(ov) => EffectiveOccurrence {
                date: target_date,
                status: ov.status.unwrap_or(OccurrenceStatus::Scheduled),
                at_time: ov.at_time.or(self.rule.at_time),
                overridden: true,
            },
            None => EffectiveOccurrence {
                date: target_date,
                status: OccurrenceStatus::Scheduled,
                at_time: self.rule.at_time,
                overridden: false,
            },
        })
    }

    /// Resolves every occurrence in `[start, end]`, in date order.
    pub fn occurrences_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<EffectiveOccurrence> {
        let mut out = Vec::new();
        if end < start {
            return out;
        }

        let mut cursor = if self.occurs_on(start) {
            Some(start)
        } else {
            self.next_template_date_after(start)
        };
        while let Some(date) = cursor {
            if date > end {
                break;
            }
            if let Some(occ) = self.resolve(date) {
                out.push(occ);
            }
            cursor = self.next_template_date_after(date);
        }
        out
    }

    /// Finds the next actionable occurrence strictly after the given date.
    ///
    /// Occurrences whose effective status is cancelled are stepped over, so
    /// the result is the next date a user would actually see work scheduled.
    /// Returns `None` when the rule has ended.
    pub fn next_occurrence_after(&self, after: NaiveDate) -> Option<NaiveDate> {
        let mut cursor = after;
        loop {
            let date = self.next_template_date_after(cursor)?;
            match self.overrides.get(&date) {
                Some(ov) if ov.status == Some(OccurrenceStatus::Cancelled) => cursor = date,
                _ => return Some(date),
            }
        }
    }

    /// Resolves the next `count` occurrences on or after `from`, cancelled
    /// ones included (they are part of the schedule, just struck through).
    pub fn preview(&self, from: NaiveDate, count: usize) -> Vec<EffectiveOccurrence> {
        let mut out = Vec::with_capacity(count);
        let mut cursor = if self.occurs_on(from) {
            Some(from)
        } else {
            self.next_template_date_after(from)
        };
        while let Some(date) = cursor {
            if out.len() >= count {
                break;
            }
            if let Some(occ) = self.resolve(date) {
                out.push(occ);
            }
            cursor = self.next_template_date_after(date);
        }
        out
    }

    /// Template pattern test without the end bound.
    fn template_hit(&self, date: NaiveDate) -> bool {
        let anchor = self.rule.anchor_start;
        if date < anchor {
            return false;
        }
        let interval = self.rule.interval as i64;
        let elapsed_days = (date - anchor).num_days();

        match self.rule.frequency {
            Frequency::Daily => elapsed_days % interval == 0,
            Frequency::Weekly => {
                // An empty mask means the anchor's weekday only. Weeks are
                // numbered from anchor_start, not from any fixed week start.
                let on_day = if self.rule.days_of_week.is_empty() {
                    date.weekday() == anchor.weekday()
                } else {
                    self.rule.days_of_week.contains(date.weekday())
                };
                on_day && (elapsed_days / 7) % interval == 0
            }
            Frequency::Monthly => {
                // Months with fewer days than the anchor's day-of-month are
                // skipped outright; nothing clamps or rolls forward.
                date.day() == anchor.day()
                    && months_between(anchor, date) % interval == 0
            }
            Frequency::Yearly => {
                // A Feb 29 anchor only ever matches leap years.
                date.month() == anchor.month()
                    && date.day() == anchor.day()
                    && (date.year() - anchor.year()) as i64 % interval == 0
            }
        }
    }

    /// First template date strictly after `after`, honoring `anchor_end`.
    ///
    /// Daily steps are computed directly; weekly uses a short scan bounded
    /// by one extra interval; monthly and yearly step through candidate
    /// months/years, skipping those where the anchor's day does not exist.
    fn next_template_date_after(&self, after: NaiveDate) -> Option<NaiveDate> {
        let anchor = self.rule.anchor_start;
        let interval = self.rule.interval as i64;

        let candidate = match self.rule.frequency {
            Frequency::Daily => {
                let elapsed = (after - anchor).num_days();
                let steps = if elapsed < 0 {
                    0
                } else {
                    elapsed.div_euclid(interval) + 1
                };
                anchor.checked_add_signed(chrono::Duration::days(steps * interval))?
            }
            Frequency::Weekly => {
                let mut date = if after < anchor {
                    anchor
                } else {
                    after.succ_opt()?
                };
                let limit = 7 * (interval + 1);
                let mut found = None;
                for _ in 0..=limit {
                    if self.template_hit(date) {
                        found = Some(date);
                        break;
                    }
                    date = date.succ_opt()?;
                }
                found?
            }
            Frequency::Monthly => {
                let anchor_index = anchor.year() as i64 * 12 + (anchor.month() as i64 - 1);
                let elapsed = months_between(anchor, after);
                let mut step = if elapsed < 0 {
                    0
                } else {
                    elapsed.div_euclid(interval)
                };
                let mut found = None;
                for _ in 0..=MONTHLY_SCAN_LIMIT {
                    let index = anchor_index + step * interval;
                    let year = index.div_euclid(12);
                    let month = index.rem_euclid(12) as u32 + 1;
                    if year > i32::MAX as i64 {
                        break;
                    }
                    if let Some(date) =
                        NaiveDate::from_ymd_opt(year as i32, month, anchor.day())
                    {
                        if date > after {
                            found = Some(date);
                            break;
                        }
                    }
                    step += 1;
                }
                found?
            }
            Frequency::Yearly => {
                let elapsed = (after.year() - anchor.year()) as i64;
                let mut step = if elapsed < 0 {
                    0
                } else {
                    elapsed.div_euclid(interval)
                };
                let mut found = None;
                for _ in 0..=YEARLY_SCAN_LIMIT {
                    let year = anchor.year() as i64 + step * interval;
                    if year > i32::MAX as i64 {
                        break;
                    }
                    if let Some(date) =
                        NaiveDate::from_ymd_opt(year as i32, anchor.month(), anchor.day())
                    {
                        if date > after {
                            found = Some(date);
                            break;
                        }
                    }
                    step += 1;
                }
                found?
            }
        };

        if let Some(end) = self.rule.anchor_end {
            if candidate > end {
                return None;
            }
        }
        Some(candidate)
    }
}

/// Whole months elapsed between two dates' calendar months, ignoring days.
fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end.year() as i64 - start.year() as i64) * 12 + (end.month() as i64 - start.month() as i64)
}
