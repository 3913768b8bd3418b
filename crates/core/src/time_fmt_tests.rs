// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    zero             = { 0,      "0s" },
    under_a_minute   = { 59,     "59s" },
    one_minute       = { 60,     "1m" },
    minute_and_secs  = { 90,     "1m30s" },
    under_an_hour    = { 3599,   "59m59s" },
    one_hour         = { 3600,   "1h" },
    hour_and_minutes = { 3660,   "1h1m" },
    almost_a_day     = { 86399,  "23h59m" },
    one_day          = { 86400,  "1d" },
    day_and_hours    = { 90000,  "1d1h" },
)]
fn elapsed(secs: u64, expected: &str) {
    assert_eq!(format_elapsed(secs), expected);
}
