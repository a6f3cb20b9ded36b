//! Campaign cost model
//!
//! Total cost of a campaign is the sum of all ad spends, plus an agency fee over that sum,
//! plus a third-party tool fee over a fixed subset of ad positions, plus a fixed cost for agency hours.
//!
//! The third-party tool is only used on ads X1, X2 and X4, so the fee base is positional and
//! ad X3 never contributes to it. Positions missing from a short spend vector contribute 0.

/// Ad positions (0-based) whose spend is charged the third-party tool fee
pub const THIRD_PARTY_FEE_POSITIONS: [usize; 3] = [0, 1, 3];

/// Fee parameters of a campaign
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeeParameters {
    /// Fraction of total ad spend charged by the agency, in [0, 1]
    pub agency_fee_rate: f64,
    /// Fraction of the third-party fee base charged by the tool vendor, in [0, 1]
    pub third_party_fee_rate: f64,
    /// Fixed cost of agency hours
    pub fixed_cost: f64,
}

impl FeeParameters {
    pub fn new(agency_fee_rate: f64, third_party_fee_rate: f64, fixed_cost: f64) -> Self {
        Self {
            agency_fee_rate,
            third_party_fee_rate,
            fixed_cost,
        }
    }
}

/// Components of a campaign cost evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetBreakdown {
    pub total_ad_spend: f64,
    pub agency_fee: f64,
    pub third_party_fee: f64,
    pub fixed_cost: f64,
    pub total: f64,
}

/// Sum of the spends that the third-party fee applies to
pub fn third_party_fee_base(spends: &[f64]) -> f64 {
    THIRD_PARTY_FEE_POSITIONS
        .iter()
        .map(|&position| spends.get(position).copied().unwrap_or(0.0))
        .sum()
}

/// Evaluate the campaign cost component by component
pub fn breakdown(spends: &[f64], fees: FeeParameters) -> BudgetBreakdown {
    let total_ad_spend: f64 = spends.iter().sum();
    let third_party_fee = fees.third_party_fee_rate * third_party_fee_base(spends);
    let agency_fee = fees.agency_fee_rate * total_ad_spend;

    BudgetBreakdown {
        total_ad_spend,
        agency_fee,
        third_party_fee,
        fixed_cost: fees.fixed_cost,
        total: total_ad_spend + agency_fee + third_party_fee + fees.fixed_cost,
    }
}

/// Total campaign cost for the given ad spends
pub fn evaluate(spends: &[f64], fees: FeeParameters) -> f64 {
    breakdown(spends, fees).total
}

/// Increase of the total cost per unit of spend added at `position`
pub fn marginal_rate(position: usize, fees: FeeParameters) -> f64 {
    let third_party = if THIRD_PARTY_FEE_POSITIONS.contains(&position) {
        fees.third_party_fee_rate
    } else {
        0.0
    };
    1.0 + fees.agency_fee_rate + third_party
}
