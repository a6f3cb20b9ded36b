// Listed targets are printed for reference only; the first case gives 4325 + 1.1 * x <= 5000,
// so x is about 613.64 rather than the listed 1340.34.

use crate::scenarios::CampaignCase;

inventory::submit!(CampaignCase {
    ordinal: 1,
    short_name: "four_ads_third",
    spends: &[500.0, 1000.0, 1500.0, 2000.0],
    agency_fee_rate: 0.10,
    third_party_fee_rate: 0.05,
    fixed_cost: 300.0,
    approved_budget: 5000.0,
    ad_index: 2,
    listed_target: 1340.34,
});

inventory::submit!(CampaignCase {
    ordinal: 2,
    short_name: "three_ads_second",
    spends: &[800.0, 1200.0, 1800.0],
    agency_fee_rate: 0.12,
    third_party_fee_rate: 0.06,
    fixed_cost: 400.0,
    approved_budget: 6000.0,
    ad_index: 1,
    listed_target: 1751.46,
});

// Ads X2..X4 already cost more than the approved budget, X1 converges to 0
inventory::submit!(CampaignCase {
    ordinal: 3,
    short_name: "four_ads_first",
    spends: &[1000.0, 2000.0, 3000.0, 4000.0],
    agency_fee_rate: 0.08,
    third_party_fee_rate: 0.07,
    fixed_cost: 250.0,
    approved_budget: 8000.0,
    ad_index: 0,
    listed_target: 640.23,
});

inventory::submit!(CampaignCase {
    ordinal: 4,
    short_name: "three_ads_third",
    spends: &[600.0, 900.0, 1200.0],
    agency_fee_rate: 0.15,
    third_party_fee_rate: 0.05,
    fixed_cost: 500.0,
    approved_budget: 5000.0,
    ad_index: 2,
    listed_target: 1704.28,
});

inventory::submit!(CampaignCase {
    ordinal: 5,
    short_name: "four_ads_fourth",
    spends: &[400.0, 800.0, 1200.0, 1600.0],
    agency_fee_rate: 0.10,
    third_party_fee_rate: 0.04,
    fixed_cost: 350.0,
    approved_budget: 5500.0,
    ad_index: 3,
    listed_target: 1314.78,
});
