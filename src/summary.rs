//! Human-readable overview of a finished report. Everything here is
//! presentation; nothing flows back into the written records.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::warn;
use rust_decimal::Decimal;

use crate::report::{self, GainStatus, NormalizedReportRecord};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportSummary {
    pub rows: usize,
    pub gain_status: BTreeMap<GainStatus, usize>,
    pub merchants: usize,
    pub transaction_amount: Decimal,
    pub charge: Decimal,
    pub partner_cost: Decimal,
    pub profit: Decimal,
}

impl ReportSummary {
    pub fn from_records(records: &[NormalizedReportRecord]) -> Self {
        let mut summary = ReportSummary {
            rows: records.len(),
            ..ReportSummary::default()
        };
        let mut merchants = BTreeSet::new();
        for record in records {
            *summary.gain_status.entry(record.gain_status).or_default() += 1;
            if let Some(id) = record.merchant_id {
                merchants.insert(id);
            }
            accumulate(
                &mut summary.transaction_amount,
                record.transaction_amount.unwrap_or_default(),
                "transaction_amount",
            );
            accumulate(&mut summary.charge, record.charge, "charge");
            accumulate(&mut summary.partner_cost, record.partner_cost, "partner_cost");
            accumulate(&mut summary.profit, record.profit, "profit");
        }
        summary.merchants = merchants.len();
        summary
    }

    pub fn count(&self, status: GainStatus) -> usize {
        self.gain_status.get(&status).copied().unwrap_or(0)
    }
}

/// Adds `value` to `total`, saturating at `Decimal`'s bounds.
fn accumulate(total: &mut Decimal, value: Decimal, column: &str) {
    *total = total.checked_add(value).unwrap_or_else(|| {
        warn!("{column} total overflows, saturating");
        total.saturating_add(value)
    });
}

/// Two decimals with thousands separators, e.g. `1,234,567.89`.
pub fn format_amount(value: Decimal) -> String {
    let fixed = format!("{:.2}", report::round(value, 2).abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value.is_sign_negative() && !report::round(value, 2).is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

impl fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rows:               {}", self.rows)?;
        writeln!(f, "merchants:          {}", self.merchants)?;
        for status in [GainStatus::Profit, GainStatus::Nlnp, GainStatus::Loss] {
            writeln!(f, "{:<20}{}", format!("{}:", status.as_str()), self.count(status))?;
        }
        writeln!(f, "transaction_amount: {}", format_amount(self.transaction_amount))?;
        writeln!(f, "charge:             {}", format_amount(self.charge))?;
        writeln!(f, "partner_cost:       {}", format_amount(self.partner_cost))?;
        write!(f, "profit:             {}", format_amount(self.profit))
    }
}
