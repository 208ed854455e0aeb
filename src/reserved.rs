//! Collections received on reserved (per-merchant) accounts, including the
//! internal settlement movements that share the same export.

use chrono::NaiveDateTime;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::coerce;
use crate::cost::collection_cost;
use crate::report::{self, GainStatus, LOCAL_CURRENCY, NormalizedReportRecord};
use crate::timestamp;

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "time",
    "userId",
    "reference",
    "amount",
    "amount_settled",
    "transaction_reference",
    "currency",
];

const TX_TYPE: &str = "TRANSFER";
const ACCOUNT_TYPE: &str = "Reserved";
const CHANNEL: &str = "Collection";
const RAIL_SETTLEMENT: &str = "Settlement";
const RAIL_RESERVED: &str = "Reserved_Account";
const CHARGE_DP: u32 = 2;
const PROFIT_DP: u32 = 2;
/// Coarser than the dynamic report's 3 places; downstream history relies on it.
const PCT_DP: u32 = 1;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReservedRecord {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub reference: Option<String>,
    pub transaction_reference: Option<String>,
    pub amount: Option<String>,
    pub amount_settled: Option<String>,
    pub currency: Option<String>,
    pub time: Option<String>,
}

/// A row that carries both a user id and a fallback reference.
#[derive(Debug, Clone)]
struct IdentifiedRecord {
    user_id: String,
    reference: String,
    raw: RawReservedRecord,
    created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq)]
struct ReservedRow {
    merchant_id: Option<i64>,
    /// Primary reference, absent for internal settlements.
    transaction_reference: Option<String>,
    reference: String,
    amount: Decimal,
    amount_settled: Decimal,
    currency: String,
    created_at: Option<NaiveDateTime>,
}

fn identify(raw: RawReservedRecord) -> Option<IdentifiedRecord> {
    let user_id = coerce::present(raw.user_id.as_deref())?.to_string();
    let reference = coerce::present(raw.reference.as_deref())?.to_string();
    let created_at = timestamp::parse_epoch(raw.time.as_deref());
    Some(IdentifiedRecord {
        user_id,
        reference,
        raw,
        created_at,
    })
}

fn to_reserved_row(record: IdentifiedRecord) -> ReservedRow {
    let IdentifiedRecord {
        user_id,
        reference,
        raw,
        created_at,
    } = record;
    ReservedRow {
        merchant_id: coerce::merchant_id(Some(&user_id), "userId"),
        transaction_reference: coerce::present(raw.transaction_reference.as_deref())
            .map(str::to_string),
        reference,
        amount: coerce::decimal_or_zero(raw.amount.as_deref(), "amount"),
        amount_settled: coerce::decimal_or_zero(raw.amount_settled.as_deref(), "amount_settled"),
        currency: raw.currency.unwrap_or_default(),
        created_at,
    }
}

fn payment_rail(row: &ReservedRow) -> &'static str {
    if row.transaction_reference.is_none() && row.merchant_id.is_some() {
        RAIL_SETTLEMENT
    } else {
        RAIL_RESERVED
    }
}

/// `amount - amount_settled`; zero when the difference cannot be represented.
fn derived_charge(row: &ReservedRow) -> Decimal {
    match row.amount.checked_sub(row.amount_settled) {
        Some(charge) => report::round(charge, CHARGE_DP),
        None => {
            warn!("charge overflows for {:?}", row.reference);
            Decimal::ZERO
        }
    }
}

fn to_report_record(row: ReservedRow) -> NormalizedReportRecord {
    let charge = derived_charge(&row);
    let partner_cost = collection_cost(row.amount, &row.reference);
    let profit = report::profit(charge, partner_cost, PROFIT_DP);
    let payment_rail = payment_rail(&row);
    NormalizedReportRecord {
        transaction_reference: row.transaction_reference.unwrap_or(row.reference),
        merchant_id: row.merchant_id,
        tx_type: TX_TYPE.to_string(),
        currency: row.currency,
        channel: CHANNEL,
        account_type: ACCOUNT_TYPE,
        payment_rail,
        transaction_amount: Some(row.amount),
        settled_amount: row.amount_settled,
        charge,
        partner_cost,
        profit,
        pct_charged: report::pct_charged(charge, row.amount, PCT_DP),
        gain_status: GainStatus::from_profit(profit),
        transaction_date: row.created_at.map(|ts| ts.date()),
        created_at: row.created_at,
    }
}

pub fn build(raw: Vec<RawReservedRecord>) -> Vec<NormalizedReportRecord> {
    let loaded = raw.len();
    let mut identified: Vec<IdentifiedRecord> = raw.into_iter().filter_map(identify).collect();
    debug!(
        "reserved: dropped {} rows without user id or reference",
        loaded - identified.len()
    );
    timestamp::sort_chronologically(&mut identified, |r| r.created_at);

    let local: Vec<ReservedRow> = identified
        .into_iter()
        .filter(|r| r.raw.currency.as_deref() == Some(LOCAL_CURRENCY))
        .map(to_reserved_row)
        .collect();
    debug!("reserved: {} rows in {LOCAL_CURRENCY}", local.len());

    local.into_iter().map(to_report_record).collect()
}
