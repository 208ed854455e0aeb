use log::warn;
use rust_decimal::Decimal;

/// Partner's collection fee: 1.3% of the amount...
const COLLECTION_RATE: Decimal = Decimal::from_parts(13, 0, 0, false, 3);
/// ...capped at 2000.
const COLLECTION_CAP: Decimal = Decimal::from_parts(2000, 0, 0, false, 0);
/// Partner's fee for a successful payout, independent of amount.
pub const PAYOUT_FLAT_COST: Decimal = Decimal::from_parts(1000, 0, 0, false, 2);

/// Cost charged by the banking partner for a collection of `amount`.
///
/// The result is not rounded; callers round the profit derived from it.
/// Negative amounts yield a negative cost, the cap never applies to them.
pub fn partner_cost(amount: Decimal) -> Decimal {
    (amount * COLLECTION_RATE).min(COLLECTION_CAP)
}

/// [`partner_cost`] for a report row, flagging negative amounts (refunds or
/// reversals) that reach the rule. The value is still returned uncapped.
pub fn collection_cost(amount: Decimal, reference: &str) -> Decimal {
    if amount.is_sign_negative() && !amount.is_zero() {
        warn!("negative amount {amount} reaches partner cost rule: {reference:?}");
    }
    partner_cost(amount)
}
