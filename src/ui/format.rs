use chrono::NaiveDate;

/// Round to whole units and group thousands: `1234567.8` → `"1,234,568"`.
pub fn prettify(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// `$1,234.57`
pub fn dollars_cents(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${}.{:02}", prettify((cents / 100) as f64), cents % 100)
}

/// Signed delta against the dataset average: `"+12,000 vs. average"`.
pub fn delta(value: f64) -> String {
    let sign = if value.round() > 0.0 { "+" } else { "" };
    format!("{sign}{} vs. average", prettify(value))
}

/// `"15 Jun 2020"`
pub fn sale_date(date: NaiveDate) -> String {
    date.format("%-d %b %Y").to_string()
}
