//! Gregorian calendar rules needed to validate dates before they reach the
//! chip.

/// Returns `true` if `year` is a Gregorian leap year.
pub const fn is_leap_year(year: u16) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Number of days in `month` (1-12) of `year`, or `None` for an invalid month.
pub const fn days_in_month(year: u16, month: u8) -> Option<u8> {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if is_leap_year(year) => Some(29),
        2 => Some(28),
        _ => None,
    }
}

/// Longest a month can be in any year. Used where no year is known, so
/// February allows the 29th.
pub(crate) const fn max_days_in_month(month: u8) -> Option<u8> {
    match month {
        2 => Some(29),
        _ => days_in_month(2001, month),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // https://kalender-365.de/leap-years.php
    const KNOWN_LEAP_YEARS: [u16; 146] = [
        1804, 1808, 1812, 1816, 1820, 1824, 1828, 1832, 1836, 1840, 1844, 1848, 1852, 1856, 1860,
        1864, 1868, 1872, 1876, 1880, 1884, 1888, 1892, 1896, 1904, 1908, 1912, 1916, 1920, 1924,
        1928, 1932, 1936, 1940, 1944, 1948, 1952, 1956, 1960, 1964, 1968, 1972, 1976, 1980, 1984,
        1988, 1992, 1996, 2000, 2004, 2008, 2012, 2016, 2020, 2024, 2028, 2032, 2036, 2040, 2044,
        2048, 2052, 2056, 2060, 2064, 2068, 2072, 2076, 2080, 2084, 2088, 2092, 2096, 2104, 2108,
        2112, 2116, 2120, 2124, 2128, 2132, 2136, 2140, 2144, 2148, 2152, 2156, 2160, 2164, 2168,
        2172, 2176, 2180, 2184, 2188, 2192, 2196, 2204, 2208, 2212, 2216, 2220, 2224, 2228, 2232,
        2236, 2240, 2244, 2248, 2252, 2256, 2260, 2264, 2268, 2272, 2276, 2280, 2284, 2288, 2292,
        2296, 2304, 2308, 2312, 2316, 2320, 2324, 2328, 2332, 2336, 2340, 2344, 2348, 2352, 2356,
        2360, 2364, 2368, 2372, 2376, 2380, 2384, 2388, 2392, 2396, 2400,
    ];

    #[test]
    fn test_leap_years_match_gregorian_list() {
        let mut known = KNOWN_LEAP_YEARS.iter().copied().peekable();
        for year in 1800..=2400 {
            let expected = known.next_if_eq(&year).is_some();
            assert_eq!(is_leap_year(year), expected, "year {}", year);
        }
        assert!(known.next().is_none());
    }

    #[test]
    fn test_century_years() {
        assert!(!is_leap_year(1800));
        assert!(is_leap_year(1804));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(2100));
        assert!(is_leap_year(2400));
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2019, 1), Some(31));
        assert_eq!(days_in_month(2019, 2), Some(28));
        assert_eq!(days_in_month(2020, 2), Some(29));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(2100, 2), Some(28));
        assert_eq!(days_in_month(2019, 4), Some(30));
        assert_eq!(days_in_month(2019, 12), Some(31));
        assert_eq!(days_in_month(2019, 0), None);
        assert_eq!(days_in_month(2019, 13), None);
    }

    #[test]
    fn test_max_days_in_month() {
        assert_eq!(max_days_in_month(2), Some(29));
        assert_eq!(max_days_in_month(9), Some(30));
        assert_eq!(max_days_in_month(13), None);
    }
}
