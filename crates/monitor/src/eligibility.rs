use rust_decimal::Decimal;

/// Lamports in one SOL
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Default eligibility threshold, 0.00001 SOL
pub const MIN_ELIGIBLE_BALANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 5);

pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from(lamports) / Decimal::from(LAMPORTS_PER_SOL)
}

/// The threshold itself counts as eligible
pub fn is_eligible(balance: Decimal, threshold: Decimal) -> bool {
    balance >= threshold
}
