//! The normalized report schema shared by every pipeline, together with the
//! arithmetic every pipeline applies to it.

use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};
use log::warn;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

use crate::error::Result;

/// Currency the reports are produced for; other currencies are dropped.
pub const LOCAL_CURRENCY: &str = "NGN";

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Output header, in output order.
pub const COLUMNS: [&str; 16] = [
    "transaction_reference",
    "merchantId",
    "type",
    "currency",
    "channel",
    "account_type",
    "payment_rail",
    "transaction_amount",
    "settled_amount",
    "charge",
    "partner_cost",
    "profit",
    "pct_charged",
    "gain_status",
    "transaction_date",
    "created_at",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GainStatus {
    Profit,
    Loss,
    /// No loss, no profit.
    #[serde(rename = "NLNP")]
    Nlnp,
}

impl GainStatus {
    pub fn from_profit(profit: Decimal) -> Self {
        if profit.is_zero() {
            GainStatus::Nlnp
        } else if profit.is_sign_negative() {
            GainStatus::Loss
        } else {
            GainStatus::Profit
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GainStatus::Profit => "Profit",
            GainStatus::Loss => "Loss",
            GainStatus::Nlnp => "NLNP",
        }
    }
}

/// One output row. Field order is the column order of the written file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedReportRecord {
    pub transaction_reference: String,
    #[serde(rename = "merchantId")]
    pub merchant_id: Option<i64>,
    #[serde(rename = "type")]
    pub tx_type: String,
    pub currency: String,
    pub channel: &'static str,
    pub account_type: &'static str,
    pub payment_rail: &'static str,
    #[serde(serialize_with = "opt_plain_decimal")]
    pub transaction_amount: Option<Decimal>,
    #[serde(serialize_with = "plain_decimal")]
    pub settled_amount: Decimal,
    #[serde(serialize_with = "plain_decimal")]
    pub charge: Decimal,
    #[serde(serialize_with = "plain_decimal")]
    pub partner_cost: Decimal,
    #[serde(serialize_with = "plain_decimal")]
    pub profit: Decimal,
    #[serde(serialize_with = "opt_plain_decimal")]
    pub pct_charged: Option<Decimal>,
    pub gain_status: GainStatus,
    #[serde(serialize_with = "opt_date")]
    pub transaction_date: Option<NaiveDate>,
    #[serde(serialize_with = "opt_timestamp")]
    pub created_at: Option<NaiveDateTime>,
}

pub fn round(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointNearestEven)
}

/// `charge - partner_cost`, rounded to `dp` places.
pub fn profit(charge: Decimal, partner_cost: Decimal, dp: u32) -> Decimal {
    round(charge - partner_cost, dp)
}

/// `charge` as a percentage of `amount`, rounded to `dp` places.
/// Undefined (`None`) when `amount` is zero.
pub fn pct_charged(charge: Decimal, amount: Decimal, dp: u32) -> Option<Decimal> {
    let Some(scaled) = charge.checked_mul(HUNDRED) else {
        warn!("pct_charged overflows for charge {charge}");
        return None;
    };
    scaled.checked_div(amount).map(|pct| round(pct, dp))
}

/// Writes the header followed by one line per record. The header is
/// written even when there are no records.
pub fn write_report<W: Write>(writer: W, records: &[NormalizedReportRecord]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(COLUMNS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn plain_decimal<S: Serializer>(
    value: &Decimal,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(&value.normalize())
}

#[allow(clippy::ref_option)]
fn opt_plain_decimal<S: Serializer>(
    value: &Option<Decimal>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(value) => plain_decimal(value, serializer),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::ref_option)]
fn opt_date<S: Serializer>(
    value: &Option<NaiveDate>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(date) => serializer.collect_str(&date.format("%Y-%m-%d")),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::ref_option)]
fn opt_timestamp<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(ts) => serializer.collect_str(&ts.format("%Y-%m-%d %H:%M:%S%.f")),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn gain_status_follows_sign() {
        assert_eq!(GainStatus::from_profit(dec("-0.01")), GainStatus::Loss);
        assert_eq!(GainStatus::from_profit(dec("0")), GainStatus::Nlnp);
        assert_eq!(GainStatus::from_profit(dec("0.00")), GainStatus::Nlnp);
        assert_eq!(GainStatus::from_profit(dec("0.01")), GainStatus::Profit);
    }

    #[test]
    fn negative_zero_is_nlnp() {
        let rounded = profit(dec("13"), dec("13.004"), 2);
        assert!(rounded.is_zero());
        assert_eq!(GainStatus::from_profit(rounded), GainStatus::Nlnp);
    }

    #[test]
    fn rounding_is_half_to_even() {
        assert_eq!(round(dec("0.125"), 2), dec("0.12"));
        assert_eq!(round(dec("0.135"), 2), dec("0.14"));
        assert_eq!(round(dec("4.45"), 1), dec("4.4"));
    }

    #[test]
    fn profit_rounds_after_subtracting() {
        assert_eq!(profit(dec("15"), dec("13.0065"), 2), dec("1.99"));
        assert_eq!(profit(dec("15"), dec("10.00"), 1), dec("5.0"));
    }

    #[test]
    fn pct_charged_handles_zero_amount() {
        assert_eq!(pct_charged(dec("13"), dec("1000"), 3), Some(dec("1.3")));
        assert_eq!(pct_charged(dec("1"), dec("3"), 3), Some(dec("33.333")));
        assert_eq!(pct_charged(dec("1"), dec("3"), 1), Some(dec("33.3")));
        assert_eq!(pct_charged(dec("13"), Decimal::ZERO, 3), None);
    }

    #[test]
    fn pct_charged_overflow_is_none() {
        assert_eq!(pct_charged(Decimal::MAX, dec("1000"), 3), None);
        assert_eq!(pct_charged(Decimal::MIN, dec("1000"), 1), None);
    }

    fn sample() -> NormalizedReportRecord {
        NormalizedReportRecord {
            transaction_reference: "R1".to_string(),
            merchant_id: Some(5),
            tx_type: "pay".to_string(),
            currency: "NGN".to_string(),
            channel: "Collection",
            account_type: "Dynamic",
            payment_rail: "Checkout_Collection",
            transaction_amount: Some(dec("1000")),
            settled_amount: dec("987.000"),
            charge: dec("13"),
            partner_cost: dec("13.000"),
            profit: dec("0.00"),
            pct_charged: None,
            gain_status: GainStatus::Nlnp,
            transaction_date: NaiveDate::from_ymd_opt(2023, 11, 14),
            created_at: NaiveDate::from_ymd_opt(2023, 11, 14)
                .and_then(|d| d.and_hms_opt(23, 13, 20)),
        }
    }

    #[test]
    fn writes_header_and_plain_values() {
        let mut out = Vec::new();
        write_report(&mut out, &[sample()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(COLUMNS.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some(concat!(
                "R1,5,pay,NGN,Collection,Dynamic,Checkout_Collection,",
                "1000,987,13,13,0,,NLNP,2023-11-14,2023-11-14 23:13:20"
            ))
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_report_still_has_header() {
        let mut out = Vec::new();
        write_report(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{}\n", COLUMNS.join(",")));
    }

    #[test]
    fn large_values_are_never_exponential() {
        let mut record = sample();
        record.transaction_amount = Some(dec("123456789012.5"));
        let mut out = Vec::new();
        write_report(&mut out, &[record]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains(",123456789012.5,"));
    }
}
