use std::fmt;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// The expiry representation a renderer should show for one cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryView<'a> {
    At(OffsetDateTime),
    MaxAge(i64),
    Text(&'a str),
    Session,
}

impl fmt::Display for ExpiryView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpiryView::At(at) => {
                let s = at.format(&Rfc3339).map_err(|_| fmt::Error)?;
                f.write_str(&s)
            }
            ExpiryView::MaxAge(secs) => f.write_str(&format_max_age(*secs)),
            ExpiryView::Text(text) => f.write_str(text),
            ExpiryView::Session => f.write_str("session"),
        }
    }
}

pub fn format_max_age(secs: i64) -> String {
    if secs < 0 {
        return "expired".to_string();
    }

    const UNITS: [(i64, &str); 4] = [(86_400, "day"), (3_600, "hour"), (60, "minute"), (1, "second")];
    for (size, unit) in UNITS {
        if secs >= size {
            let n = secs / size;
            let plural = if n == 1 { "" } else { "s" };
            return format!("{n} {unit}{plural}");
        }
    }
    "0 seconds".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn max_age_uses_largest_whole_unit() {
        assert_eq!(format_max_age(7_776_000), "90 days");
        assert_eq!(format_max_age(86_400), "1 day");
        assert_eq!(format_max_age(7_200), "2 hours");
        assert_eq!(format_max_age(90), "1 minute");
        assert_eq!(format_max_age(1), "1 second");
        assert_eq!(format_max_age(-1), "expired");
    }

    #[test]
    fn display_renders_each_representation() {
        assert_eq!(
            ExpiryView::At(datetime!(2030-01-02 03:04:05 UTC)).to_string(),
            "2030-01-02T03:04:05Z"
        );
        assert_eq!(ExpiryView::MaxAge(3_600).to_string(), "1 hour");
        assert_eq!(ExpiryView::Text("1 year").to_string(), "1 year");
        assert_eq!(ExpiryView::Session.to_string(), "session");
    }
}
