//! Outbound transfers. The partner charges a flat fee per successful payout,
//! so no collection cost rule applies here.

use chrono::NaiveDateTime;
use log::debug;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::coerce;
use crate::cost::PAYOUT_FLAT_COST;
use crate::report::{self, GainStatus, LOCAL_CURRENCY, NormalizedReportRecord};
use crate::timestamp;

pub const REQUIRED_COLUMNS: [&str; 7] = [
    "time",
    "userId",
    "transaction_reference",
    "amount",
    "charge",
    "status",
    "currency",
];

/// Payout exports use a lower-case marker, unlike collections' `"Done"`.
pub const SUCCESS_STATUS: &str = "success";
const TX_TYPE: &str = "TRANSFER";
const ACCOUNT_TYPE: &str = "Payout";
const CHANNEL: &str = "Payout";
const PAYMENT_RAIL: &str = "Payout";
const PROFIT_DP: u32 = 1;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPayoutRecord {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub transaction_reference: Option<String>,
    pub amount: Option<String>,
    pub charge: Option<String>,
    pub status: Option<String>,
    pub currency: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct PayoutRow {
    merchant_id: Option<i64>,
    transaction_reference: String,
    /// `None` when the export carried something unparsable.
    amount: Option<Decimal>,
    charge: Decimal,
    status: String,
    currency: String,
    created_at: Option<NaiveDateTime>,
}

impl PayoutRow {
    fn succeeded(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Flat fee for successful payouts; nothing is owed otherwise.
    fn partner_cost(&self) -> Option<Decimal> {
        self.succeeded().then_some(PAYOUT_FLAT_COST)
    }
}

fn to_payout_row(raw: RawPayoutRecord) -> PayoutRow {
    PayoutRow {
        merchant_id: coerce::merchant_id(raw.user_id.as_deref(), "userId"),
        transaction_reference: raw.transaction_reference.unwrap_or_default(),
        amount: coerce::decimal(raw.amount.as_deref(), "amount"),
        charge: coerce::decimal_or_zero(raw.charge.as_deref(), "charge"),
        status: raw.status.unwrap_or_default(),
        currency: raw.currency.unwrap_or_default(),
        created_at: timestamp::parse_epoch(raw.time.as_deref()),
    }
}

fn to_report_record(row: PayoutRow, partner_cost: Decimal) -> NormalizedReportRecord {
    let profit = report::profit(row.charge, partner_cost, PROFIT_DP);
    NormalizedReportRecord {
        transaction_reference: row.transaction_reference,
        merchant_id: row.merchant_id,
        tx_type: TX_TYPE.to_string(),
        currency: row.currency,
        channel: CHANNEL,
        account_type: ACCOUNT_TYPE,
        payment_rail: PAYMENT_RAIL,
        transaction_amount: row.amount,
        settled_amount: Decimal::ZERO,
        charge: row.charge,
        partner_cost,
        profit,
        // Reported as the charge itself; consumers read it that way.
        pct_charged: Some(row.charge),
        gain_status: GainStatus::from_profit(profit),
        transaction_date: row.created_at.map(|ts| ts.date()),
        created_at: row.created_at,
    }
}

pub fn build(raw: Vec<RawPayoutRecord>) -> Vec<NormalizedReportRecord> {
    let local: Vec<PayoutRow> = raw
        .into_iter()
        .filter(|r| r.currency.as_deref() == Some(LOCAL_CURRENCY))
        .map(to_payout_row)
        .collect();
    debug!("payout: {} rows in {LOCAL_CURRENCY}", local.len());

    let records: Vec<NormalizedReportRecord> = local
        .into_iter()
        .filter_map(|row| {
            let partner_cost = row.partner_cost()?;
            Some(to_report_record(row, partner_cost))
        })
        .collect();
    debug!("payout: {} rows with status {SUCCESS_STATUS}", records.len());
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn raw(reference: &str, charge: &str, status: &str) -> RawPayoutRecord {
        RawPayoutRecord {
            user_id: Some("7".to_string()),
            transaction_reference: Some(reference.to_string()),
            amount: Some("500".to_string()),
            charge: Some(charge.to_string()),
            status: Some(status.to_string()),
            currency: Some("NGN".to_string()),
            time: Some("1700000000".to_string()),
        }
    }

    #[test]
    fn worked_example_is_profitable() {
        let out = build(vec![raw("T9", "15", "success")]);
        let record = &out[0];
        assert_eq!(record.transaction_reference, "T9");
        assert_eq!(record.merchant_id, Some(7));
        assert_eq!(record.transaction_amount, Some(dec("500")));
        assert_eq!(record.partner_cost, dec("10"));
        assert_eq!(record.profit, dec("5"));
        assert_eq!(record.gain_status, GainStatus::Profit);
        assert_eq!(record.pct_charged, Some(dec("15")));
        assert_eq!(record.settled_amount, Decimal::ZERO);
        assert_eq!(record.tx_type, "TRANSFER");
        assert_eq!(record.account_type, "Payout");
        assert_eq!(record.channel, "Payout");
        assert_eq!(record.payment_rail, "Payout");
    }

    #[test]
    fn status_match_is_case_sensitive() {
        let out = build(vec![
            raw("A", "15", "Success"),
            raw("B", "15", "SUCCESS"),
            raw("C", "15", "failed"),
            raw("D", "15", "success"),
        ]);
        let refs: Vec<_> = out.iter().map(|r| r.transaction_reference.as_str()).collect();
        assert_eq!(refs, ["D"]);
    }

    #[test]
    fn pct_charged_is_the_charge() {
        let out = build(vec![raw("A", "26.875", "success")]);
        assert_eq!(out[0].pct_charged, Some(dec("26.875")));
        assert_eq!(out[0].profit, dec("16.9"));
    }

    #[test]
    fn missing_charge_is_a_loss() {
        let mut row = raw("A", "", "success");
        row.charge = None;
        let record = &build(vec![row])[0];
        assert_eq!(record.charge, Decimal::ZERO);
        assert_eq!(record.profit, dec("-10"));
        assert_eq!(record.gain_status, GainStatus::Loss);
    }

    #[test]
    fn charge_equal_to_cost_is_nlnp() {
        let record = &build(vec![raw("A", "10", "success")])[0];
        assert_eq!(record.gain_status, GainStatus::Nlnp);
    }

    #[test]
    fn unparsable_id_and_amount_become_null() {
        let mut row = raw("A", "15", "success");
        row.user_id = Some("abc".to_string());
        row.amount = Some("five hundred".to_string());
        let record = &build(vec![row])[0];
        assert_eq!(record.merchant_id, None);
        assert_eq!(record.transaction_amount, None);
        assert_eq!(record.gain_status, GainStatus::Profit);
    }

    #[test]
    fn keeps_input_order() {
        let mut later = raw("later", "15", "success");
        later.time = Some("1700000100".to_string());
        let earlier = raw("earlier", "15", "success");
        let out = build(vec![later, earlier]);
        let refs: Vec<_> = out.iter().map(|r| r.transaction_reference.as_str()).collect();
        assert_eq!(refs, ["later", "earlier"]);
    }

    #[test]
    fn foreign_currency_is_dropped() {
        let mut row = raw("A", "15", "success");
        row.currency = Some("USD".to_string());
        assert!(build(vec![row]).is_empty());
    }
}
