//! Rule functions of the HR policy engine.
//!
//! This module contains the calendar utilities, the sandwich-day calculator,
//! and the attendance classification rules: worked minutes, late check-in
//! detection, duration classification and the combined classifier.

mod calendar;
mod classification;
mod duration_status;
mod lateness;
mod sandwich;
mod worked_minutes;

pub use calendar::{
    DayType, at_time, days_inclusive, get_day_type, is_non_working_day, is_quarter_end, is_weekend,
    month_end, month_start, next_quarter_end_after, quarter_end, quarter_of, quarter_start,
    year_end, year_start,
};
pub use classification::{
    AttendanceEvaluator, AttendanceSummary, ClassificationResult, classify, evaluate_attendance,
    summarize_attendance,
};
pub use duration_status::{DurationClassification, FULL_DAY_TOLERANCE_MINUTES, classify_duration};
pub use lateness::{LatenessDetection, detect_late_check_in};
pub use sandwich::{
    AMBIGUOUS_SANDWICH_BOUNDARY, SandwichEstimate, count_sandwich_days, estimate_effective_days,
};
pub use worked_minutes::{WorkedMinutesResult, calculate_worked_minutes, detect_worked_minutes};
