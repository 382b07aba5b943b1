pub fn humanize_number(value: u64) -> String {
    const UNITS: [&str; 5] = ["", "K", "M", "G", "T"];

    let mut scaled = value as f64;
    let mut unit = 0usize;
    while scaled >= 1000.0 && unit < UNITS.len() - 1 {
        scaled /= 1000.0;
        unit += 1;
    }

    if unit == 0 {
        return value.to_string();
    }

    let mut rounded = (scaled * 10.0).round() / 10.0;
    if rounded >= 1000.0 && unit < UNITS.len() - 1 {
        rounded = 1.0;
        unit += 1;
    }
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}{}", UNITS[unit])
    } else {
        format!("{rounded:.1}{}", UNITS[unit])
    }
}

/// Bare charm name from a charm URL: `cs:~user/precise/mysql-26` -> `mysql`.
pub fn charm_name(url: &str) -> &str {
    let path = url.split_once(':').map(|(_, rest)| rest).unwrap_or(url);
    let last = path.rsplit('/').next().unwrap_or(path);

    match last.rsplit_once('-') {
        Some((name, revision))
            if !revision.is_empty() && revision.bytes().all(|b| b.is_ascii_digit()) =>
        {
            name
        }
        _ => last,
    }
}

pub fn service_url(service_id: &str) -> String {
    format!("/service/{service_id}/")
}

pub fn service_id_from_url(url: &str) -> Option<&str> {
    url.strip_prefix("/service/")?
        .strip_suffix('/')
        .filter(|id| !id.is_empty() && !id.contains('/'))
}
