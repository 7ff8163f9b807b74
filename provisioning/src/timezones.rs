// Time zones as displayed in Viedoc Admin, and the identifiers the import API expects.

const TZ_CONVERSION: &[(&str, &str)] = &[
    ("(UTC-10:00) Hawaii", "Hawaiian Standard Time"),
    ("(UTC-09:00) Alaska", "Alaskan Standard Time"),
    (
        "(UTC-08:00) Pacific Time (US & Canada)",
        "Pacific Standard Time",
    ),
    ("(UTC-07:00) Arizona", "US Mountain Standard Time"),
    (
        "(UTC-07:00) Mountain Time (US & Canada)",
        "Mountain Standard Time",
    ),
    (
        "(UTC-06:00) Central Time (US & Canada)",
        "Central Standard Time",
    ),
    (
        "(UTC-06:00) Guadalajara, Mexico City, Monterrey",
        "Central Standard Time (Mexico)",
    ),
    (
        "(UTC-05:00) Eastern Time (US & Canada)",
        "Eastern Standard Time",
    ),
    (
        "(UTC-05:00) Bogota, Lima, Quito, Rio Branco",
        "SA Pacific Standard Time",
    ),
    ("(UTC-04:00) Atlantic Time (Canada)", "Atlantic Standard Time"),
    ("(UTC-04:00) Santiago", "Pacific SA Standard Time"),
    ("(UTC-03:30) Newfoundland", "Newfoundland Standard Time"),
    ("(UTC-03:00) Brasilia", "E. South America Standard Time"),
    (
        "(UTC-03:00) City of Buenos Aires",
        "Argentina Standard Time",
    ),
    (
        "(UTC) Coordinated Universal Time",
        "UTC",
    ),
    (
        "(UTC+00:00) Dublin, Edinburgh, Lisbon, London",
        "GMT Standard Time",
    ),
    (
        "(UTC+00:00) Monrovia, Reykjavik",
        "Greenwich Standard Time",
    ),
    (
        "(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna",
        "W. Europe Standard Time",
    ),
    (
        "(UTC+01:00) Belgrade, Bratislava, Budapest, Ljubljana, Prague",
        "Central Europe Standard Time",
    ),
    (
        "(UTC+01:00) Brussels, Copenhagen, Madrid, Paris",
        "Romance Standard Time",
    ),
    (
        "(UTC+01:00) Sarajevo, Skopje, Warsaw, Zagreb",
        "Central European Standard Time",
    ),
    (
        "(UTC+01:00) West Central Africa",
        "W. Central Africa Standard Time",
    ),
    ("(UTC+02:00) Athens, Bucharest", "GTB Standard Time"),
    ("(UTC+02:00) Cairo", "Egypt Standard Time"),
    (
        "(UTC+02:00) Harare, Pretoria",
        "South Africa Standard Time",
    ),
    (
        "(UTC+02:00) Helsinki, Kyiv, Riga, Sofia, Tallinn, Vilnius",
        "FLE Standard Time",
    ),
    ("(UTC+02:00) Jerusalem", "Israel Standard Time"),
    ("(UTC+03:00) Istanbul", "Turkey Standard Time"),
    (
        "(UTC+03:00) Moscow, St. Petersburg",
        "Russian Standard Time",
    ),
    ("(UTC+03:00) Kuwait, Riyadh", "Arab Standard Time"),
    ("(UTC+03:00) Nairobi", "E. Africa Standard Time"),
    ("(UTC+04:00) Abu Dhabi, Muscat", "Arabian Standard Time"),
    (
        "(UTC+05:00) Islamabad, Karachi",
        "Pakistan Standard Time",
    ),
    (
        "(UTC+05:30) Chennai, Kolkata, Mumbai, New Delhi",
        "India Standard Time",
    ),
    ("(UTC+06:00) Dhaka", "Bangladesh Standard Time"),
    (
        "(UTC+07:00) Bangkok, Hanoi, Jakarta",
        "SE Asia Standard Time",
    ),
    (
        "(UTC+08:00) Beijing, Chongqing, Hong Kong, Urumqi",
        "China Standard Time",
    ),
    (
        "(UTC+08:00) Kuala Lumpur, Singapore",
        "Singapore Standard Time",
    ),
    ("(UTC+08:00) Perth", "W. Australia Standard Time"),
    ("(UTC+08:00) Taipei", "Taipei Standard Time"),
    ("(UTC+09:00) Osaka, Sapporo, Tokyo", "Tokyo Standard Time"),
    ("(UTC+09:00) Seoul", "Korea Standard Time"),
    ("(UTC+09:30) Adelaide", "Cen. Australia Standard Time"),
    ("(UTC+10:00) Brisbane", "E. Australia Standard Time"),
    (
        "(UTC+10:00) Canberra, Melbourne, Sydney",
        "AUS Eastern Standard Time",
    ),
    (
        "(UTC+12:00) Auckland, Wellington",
        "New Zealand Standard Time",
    ),
];

/// The import identifier for a time zone written the way Viedoc Admin displays it.
///
/// Returns `None` when the value is not a known display name, in which case it is
/// expected to be an import identifier already.
pub fn convert_time_zone(tz: &str) -> Option<&'static str> {
    TZ_CONVERSION
        .iter()
        .find(|(display, _)| *display == tz)
        .map(|(_, id)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_are_converted() {
        assert_eq!(
            convert_time_zone("(UTC+01:00) Amsterdam, Berlin, Bern, Rome, Stockholm, Vienna"),
            Some("W. Europe Standard Time")
        );
    }

    #[test]
    fn identifiers_are_left_alone() {
        assert_eq!(convert_time_zone("UTC"), None);
        assert_eq!(convert_time_zone("W. Europe Standard Time"), None);
    }

    #[test]
    fn table_has_no_duplicate_keys() {
        for (idx, (k, _)) in TZ_CONVERSION.iter().enumerate() {
            assert!(
                TZ_CONVERSION[idx + 1..].iter().all(|(k2, _)| k2 != k),
                "duplicate entry {}",
                k
            );
        }
    }
}
