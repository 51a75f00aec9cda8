/// Short "time ago" label for a pending deposit.
pub fn elapsed_label(started: time::OffsetDateTime, now: time::OffsetDateTime) -> String {
    let waited = now - started;
    match waited {
        d if d < time::Duration::minutes(1) => "just now".to_string(),
        d if d < time::Duration::hours(1) => format!("{} min ago", d.whole_minutes()),
        d if d < time::Duration::days(1) => format!("{} h ago", d.whole_hours()),
        d => format!("{} d ago", d.whole_days()),
    }
}
