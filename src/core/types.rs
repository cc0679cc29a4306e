use serde::Serialize;

/// Assumptions shared by every scenario. Rates are decimal fractions per
/// year.
#[derive(Debug, Clone)]
pub struct GeneralParams {
    pub analysis_years: u32,
    pub inflation_rate: f64,
    pub savings_interest_rate: f64,
    pub house_appreciation_rate: f64,
    pub rent_increase_rate: f64,
}

#[derive(Debug, Clone)]
pub struct RentParams {
    pub current_monthly_rent: f64,
    pub annual_renters_insurance: f64,
}

#[derive(Debug, Clone)]
pub struct BuyParams {
    pub cash_price: f64,
    pub downpayment: f64,
    /// One-time upfront cost; enters the rent+invest starting balance, not
    /// the yearly outflow.
    pub closing_costs: f64,
    pub mortgage_rate: f64,
    pub mortgage_term_years: u32,
    pub interest_deduction_rate: f64,
    pub monthly_car_lease: f64,
    pub base_insurance: f64,
    pub base_maintenance: f64,
    pub base_renovations: f64,
    /// Monthly fee; annualized before inflation escalation.
    pub community_ownership_cost: f64,
    pub property_value_tax_rate_below_threshold: f64,
    pub property_value_tax_rate_above_threshold: f64,
    /// Marginal bracket boundary on the haircut assessed value.
    pub property_tax_threshold: f64,
    /// Statutory discount applied to both tax-authority valuations before
    /// any tax rate.
    pub taxable_value_haircut: f64,
    pub land_tax_rate: f64,
    pub tax_authority_property_value: f64,
    pub tax_authority_land_value: f64,
    /// Yearly growth of the tax-authority valuations, independent of market
    /// appreciation.
    pub annual_revaluation_rate: f64,
}

#[derive(Debug, Clone)]
pub struct SellingParams {
    pub agent_commission_rate: f64,
    pub capital_gains_tax_rate: f64,
}

/// Immutable configuration for one comparison run. Built once, passed by
/// reference into the engine; a changed input means a fresh bundle and a
/// full recomputation.
#[derive(Debug, Clone)]
pub struct InputBundle {
    pub general: GeneralParams,
    pub rent: RentParams,
    pub buy: BuyParams,
    pub selling: SellingParams,
}

/// One month of the amortization schedule. The balance is clamped at zero;
/// the principal figure keeps the nominal payment split even in the final
/// month.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyAmortizationRecord {
    pub month: u32,
    pub interest_paid: f64,
    pub principal_paid: f64,
    pub mortgage_balance: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyRentRecord {
    pub year: u32,
    pub monthly_rent: f64,
    pub annual_rent: f64,
    pub renters_insurance: f64,
    pub total_rent_cost: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyBuyRecord {
    pub year: u32,
    /// Net of the interest deduction.
    pub interest_paid: f64,
    pub principal_paid: f64,
    pub property_value_tax: f64,
    pub land_tax: f64,
    pub insurance: f64,
    pub maintenance: f64,
    pub renovations: f64,
    pub community_ownership_cost: f64,
    pub car_lease: f64,
    pub total_outflow: f64,
    pub mortgage_balance_end: f64,
    pub house_value_start: f64,
    pub house_value_end: f64,
    pub net_equity_end: f64,
}

/// One year of the rent-and-invest-the-difference path. Every record carries
/// the terminal balance as `final_rent_net_worth` so the comparator can read
/// it off any row.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyInvestmentRecord {
    pub year: u32,
    pub rent_outflow: f64,
    pub buy_outflow: f64,
    pub difference: f64,
    pub investment_start: f64,
    pub investment_end: f64,
    pub final_rent_net_worth: f64,
}

/// Terminal totals. `difference_in_net_worth` is buying minus renting:
/// positive favors buying, negative favors renting, zero is a tie.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub total_rent_outflow: f64,
    pub total_buy_outflow: f64,
    pub final_rent_net_worth: f64,
    pub final_net_equity_buying: f64,
    pub difference_in_net_worth: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub rent_years: Vec<YearlyRentRecord>,
    pub buy_years: Vec<YearlyBuyRecord>,
    pub investment_years: Vec<YearlyInvestmentRecord>,
    pub summary: ComparisonSummary,
}
