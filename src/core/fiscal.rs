//! E3SM fiscal calendar. Fiscal years run July through June and are named
//! after the calendar year in which they end.

use crate::utils::error::{PlotterError, Result};

const FIRST_FISCAL_MONTH: u32 = 7;

fn check_month(month: u32) -> Result<()> {
    if (1..=12).contains(&month) {
        Ok(())
    } else {
        Err(PlotterError::ProcessingError {
            message: format!("invalid calendar month {}", month),
        })
    }
}

pub fn fiscal_month(calendar_month: u32) -> Result<u32> {
    check_month(calendar_month)?;
    Ok((calendar_month + 12 - FIRST_FISCAL_MONTH) % 12 + 1)
}

pub fn fiscal_quarter(calendar_month: u32) -> Result<u32> {
    Ok((fiscal_month(calendar_month)? - 1) / 3 + 1)
}

pub fn fiscal_year(calendar_year: i32, calendar_month: u32) -> Result<i32> {
    check_month(calendar_month)?;
    if calendar_month >= FIRST_FISCAL_MONTH {
        Ok(calendar_year + 1)
    } else {
        Ok(calendar_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fiscal_month_covers_every_month() {
        let expected = [
            (7, 1),
            (8, 2),
            (9, 3),
            (10, 4),
            (11, 5),
            (12, 6),
            (1, 7),
            (2, 8),
            (3, 9),
            (4, 10),
            (5, 11),
            (6, 12),
        ];
        for (calendar, fiscal) in expected {
            assert_eq!(fiscal_month(calendar).unwrap(), fiscal, "month {}", calendar);
        }
    }

    #[test]
    fn test_fiscal_quarter() {
        assert_eq!(fiscal_quarter(7).unwrap(), 1);
        assert_eq!(fiscal_quarter(9).unwrap(), 1);
        assert_eq!(fiscal_quarter(10).unwrap(), 2);
        assert_eq!(fiscal_quarter(12).unwrap(), 2);
        assert_eq!(fiscal_quarter(1).unwrap(), 3);
        assert_eq!(fiscal_quarter(3).unwrap(), 3);
        assert_eq!(fiscal_quarter(4).unwrap(), 4);
        assert_eq!(fiscal_quarter(6).unwrap(), 4);
    }

    #[test]
    fn test_fiscal_year_ends_in_june() {
        assert_eq!(fiscal_year(2019, 6).unwrap(), 2019);
        assert_eq!(fiscal_year(2019, 7).unwrap(), 2020);
        assert_eq!(fiscal_year(2020, 1).unwrap(), 2020);
        assert_eq!(fiscal_year(2020, 12).unwrap(), 2021);
    }

    #[test]
    fn test_invalid_month() {
        assert!(fiscal_month(0).is_err());
        assert!(fiscal_quarter(13).is_err());
        assert!(fiscal_year(2020, 13).is_err());
    }
}
