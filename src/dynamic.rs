//! Checkout collections received on dynamic (per-transaction) accounts.
//!
//! Charges arrive precomputed upstream. Only settled (`"Done"`) rows in the
//! local currency are reported.

use chrono::NaiveDateTime;
use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::coerce;
use crate::cost::collection_cost;
use crate::report::{self, GainStatus, LOCAL_CURRENCY, NormalizedReportRecord};
use crate::timestamp;

pub const REQUIRED_COLUMNS: [&str; 9] = [
    "user_id",
    "internal_ref",
    "type",
    "transaction_amount",
    "settled_amount",
    "charge",
    "status",
    "currency",
    "time",
];

pub const SUCCESS_STATUS: &str = "Done";
const ACCOUNT_TYPE: &str = "Dynamic";
const CHANNEL: &str = "Collection";
const PAYMENT_RAIL: &str = "Checkout_Collection";
const PROFIT_DP: u32 = 2;
const PCT_DP: u32 = 3;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDynamicRecord {
    pub user_id: Option<String>,
    pub internal_ref: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub transaction_amount: Option<String>,
    pub settled_amount: Option<String>,
    pub charge: Option<String>,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub time: Option<String>,
}

/// A raw row with its timestamp localized.
#[derive(Debug, Clone)]
struct TimedRecord {
    raw: RawDynamicRecord,
    created_at: Option<NaiveDateTime>,
}

/// The working subset of columns, every missing number filled with zero.
#[derive(Debug, Clone, PartialEq)]
struct CollectionRow {
    merchant_id: i64,
    reference: String,
    tx_type: String,
    transaction_amount: Decimal,
    settled_amount: Decimal,
    charge: Decimal,
    status: String,
    currency: String,
    created_at: Option<NaiveDateTime>,
}

fn localize(raw: Vec<RawDynamicRecord>) -> Vec<TimedRecord> {
    raw.into_iter()
        .map(|raw| {
            let created_at = timestamp::parse_epoch(raw.time.as_deref());
            TimedRecord { raw, created_at }
        })
        .collect()
}

fn is_local_currency(record: &TimedRecord) -> bool {
    record.raw.currency.as_deref() == Some(LOCAL_CURRENCY)
}

fn to_collection_row(record: TimedRecord) -> CollectionRow {
    let TimedRecord { raw, created_at } = record;
    CollectionRow {
        merchant_id: coerce::merchant_id(raw.user_id.as_deref(), "user_id").unwrap_or(0),
        reference: raw.internal_ref.unwrap_or_default(),
        tx_type: raw.tx_type.unwrap_or_default(),
        transaction_amount: coerce::decimal_or_zero(
            raw.transaction_amount.as_deref(),
            "transaction_amount",
        ),
        settled_amount: coerce::decimal_or_zero(raw.settled_amount.as_deref(), "settled_amount"),
        charge: coerce::decimal_or_zero(raw.charge.as_deref(), "charge"),
        status: raw.status.unwrap_or_default(),
        currency: raw.currency.unwrap_or_default(),
        created_at,
    }
}

fn to_report_record(row: CollectionRow) -> NormalizedReportRecord {
    let partner_cost = collection_cost(row.transaction_amount, &row.reference);
    let profit = report::profit(row.charge, partner_cost, PROFIT_DP);
    NormalizedReportRecord {
        transaction_reference: row.reference,
        merchant_id: Some(row.merchant_id),
        tx_type: row.tx_type,
        currency: row.currency,
        channel: CHANNEL,
        account_type: ACCOUNT_TYPE,
        payment_rail: PAYMENT_RAIL,
        transaction_amount: Some(row.transaction_amount),
        settled_amount: row.settled_amount,
        charge: row.charge,
        partner_cost,
        profit,
        pct_charged: report::pct_charged(row.charge, row.transaction_amount, PCT_DP),
        gain_status: GainStatus::from_profit(profit),
        transaction_date: row.created_at.map(|ts| ts.date()),
        created_at: row.created_at,
    }
}

pub fn build(raw: Vec<RawDynamicRecord>) -> Vec<NormalizedReportRecord> {
    let mut timed = localize(raw);
    timestamp::sort_chronologically(&mut timed, |r| r.created_at);

    let local: Vec<CollectionRow> = timed
        .into_iter()
        .filter(is_local_currency)
        .map(to_collection_row)
        .collect();
    debug!("dynamic: {} rows in {LOCAL_CURRENCY}", local.len());

    let done: Vec<CollectionRow> = local
        .into_iter()
        .filter(|row| row.status == SUCCESS_STATUS)
        .collect();
    debug!("dynamic: {} rows with status {SUCCESS_STATUS}", done.len());

    done.into_iter().map(to_report_record).collect()
}
