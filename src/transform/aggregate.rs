//! Summing amounts by calendar year.

use std::collections::BTreeMap;

use super::filter::CategoryFilter;
use crate::core::{RevenueRecord, RevenueTable, YearlySeries};
use crate::error::{ForecastError, Result};

/// Sum the amounts of matching records by calendar year, ascending.
///
/// Blank amounts add nothing, but a year whose matching rows are all blank
/// still appears with a total of zero. An empty result is not an error here.
///
/// # Errors
/// `InvalidParameter` naming the year if a matching amount, or a yearly
/// total, is not finite.
pub fn aggregate_yearly<'a, I>(records: I, filter: &CategoryFilter) -> Result<YearlySeries>
where
    I: IntoIterator<Item = &'a RevenueRecord>,
{
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for record in records.into_iter().filter(|r| filter.matches(r)) {
        let amount = record.amount.unwrap_or(0.0);
        if !amount.is_finite() {
            return Err(ForecastError::InvalidParameter(format!(
                "amount {} in year {} is not finite",
                amount, record.calendar_year
            )));
        }
        *totals.entry(record.calendar_year).or_insert(0.0) += amount;
    }
    YearlySeries::from_pairs(totals)
}

/// Validate the filter against `table`, then aggregate every sheet.
pub fn aggregate_table(table: &RevenueTable, filter: &CategoryFilter) -> Result<YearlySeries> {
    filter.validate(table)?;
    aggregate_yearly(table.concatenated(), filter)
}

/// Add several yearly series year by year.
///
/// # Errors
/// `InvalidParameter` if a summed year overflows to infinity.
pub fn merge_yearly<'a, I>(parts: I) -> Result<YearlySeries>
where
    I: IntoIterator<Item = &'a YearlySeries>,
{
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for part in parts {
        for (year, amount) in part.iter() {
            *totals.entry(year).or_insert(0.0) += amount;
        }
    }
    YearlySeries::from_pairs(totals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LabelColumn, Sheet, STANDARD_COLUMNS};

    fn sales_filter() -> CategoryFilter {
        CategoryFilter::new(LabelColumn::Level2Category, ["SALES TAX", "Sales Tax"])
    }

    fn sheet(name: &str, records: Vec<RevenueRecord>) -> Sheet {
        Sheet::new(
            name,
            STANDARD_COLUMNS.iter().map(|c| c.to_string()).collect(),
            records,
        )
    }

    #[test]
    fn both_casings_across_sheets_are_summed() {
        let table = RevenueTable::new(vec![
            sheet(
                "2019",
                vec![
                    RevenueRecord::new(2019, 100.0).with_level_2_category("SALES TAX"),
                    RevenueRecord::new(2019, 999.0).with_level_2_category("PROPERTY TAX"),
                ],
            ),
            sheet(
                "2020",
                vec![
                    RevenueRecord::new(2020, 40.0).with_level_2_category("Sales Tax"),
                    RevenueRecord::new(2020, 2.0).with_level_2_category("SALES TAX"),
                ],
            ),
        ]);

        let series = aggregate_table(&table, &sales_filter()).unwrap();
        assert_eq!(series.years(), &[2019, 2020]);
        assert_eq!(series.values(), &[100.0, 42.0]);
    }

    #[test]
    fn blank_amounts_contribute_nothing() {
        let mut blank = RevenueRecord::new(2021, 0.0).with_level_2_category("SALES TAX");
        blank.amount = None;
        let records = vec![
            RevenueRecord::new(2020, 5.0).with_level_2_category("SALES TAX"),
            blank,
        ];
        let series = aggregate_yearly(&records, &sales_filter()).unwrap();
        assert_eq!(series.years(), &[2020, 2021]);
        assert_eq!(series.values(), &[5.0, 0.0]);
    }

    #[test]
    fn unmatched_filter_gives_empty_series() {
        let records = vec![RevenueRecord::new(2020, 5.0).with_level_2_category("OTHER")];
        assert!(aggregate_yearly(&records, &sales_filter()).unwrap().is_empty());
    }

    #[test]
    fn out_of_order_years_are_sorted() {
        let records = vec![
            RevenueRecord::new(2022, 3.0).with_level_2_category("SALES TAX"),
            RevenueRecord::new(2018, 1.0).with_level_2_category("SALES TAX"),
            RevenueRecord::new(2020, 2.0).with_level_2_category("SALES TAX"),
        ];
        let series = aggregate_yearly(&records, &sales_filter()).unwrap();
        assert_eq!(series.years(), &[2018, 2020, 2022]);
        assert_eq!(series.gaps(), vec![2019, 2021]);
    }

    #[test]
    fn concatenated_equals_merged_per_sheet() {
        let a = sheet(
            "a",
            vec![
                RevenueRecord::new(2019, 1.5).with_level_2_category("SALES TAX"),
                RevenueRecord::new(2020, 2.5).with_level_2_category("SALES TAX"),
            ],
        );
        let b = sheet(
            "b",
            vec![
                RevenueRecord::new(2020, 4.0).with_level_2_category("Sales Tax"),
                RevenueRecord::new(2021, 8.0).with_level_2_category("SALES TAX"),
            ],
        );
        let filter = sales_filter();
        let whole = aggregate_table(&RevenueTable::new(vec![a.clone(), b.clone()]), &filter).unwrap();
        let parts = [
            aggregate_yearly(&a.records, &filter).unwrap(),
            aggregate_yearly(&b.records, &filter).unwrap(),
        ];
        assert_eq!(whole, merge_yearly(&parts).unwrap());
    }

    #[test]
    fn non_finite_amount_is_reported_with_its_year() {
        let records = vec![
            RevenueRecord::new(2014, 5.0).with_level_2_category("SALES TAX"),
            RevenueRecord::new(2015, f64::NAN).with_level_2_category("SALES TAX"),
        ];
        let err = aggregate_yearly(&records, &sales_filter()).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidParameter(ref m) if m.contains("2015")));
    }

    #[test]
    fn non_finite_amount_outside_the_filter_is_ignored() {
        let records = vec![
            RevenueRecord::new(2014, 5.0).with_level_2_category("SALES TAX"),
            RevenueRecord::new(2015, f64::INFINITY).with_level_2_category("PARKING"),
        ];
        let series = aggregate_yearly(&records, &sales_filter()).unwrap();
        assert_eq!(series.values(), &[5.0]);
    }

    #[test]
    fn overflowing_total_is_an_error() {
        let records = vec![
            RevenueRecord::new(2020, f64::MAX).with_level_2_category("SALES TAX"),
            RevenueRecord::new(2020, f64::MAX).with_level_2_category("Sales Tax"),
        ];
        assert!(aggregate_yearly(&records, &sales_filter()).is_err());

        let big = YearlySeries::new(vec![2020], vec![f64::MAX]).unwrap();
        assert!(merge_yearly([&big, &big]).is_err());
    }
}
