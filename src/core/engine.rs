use super::error::InvalidInputError;
use super::types::{
    BuyParams, ComparisonReport, ComparisonSummary, InputBundle, MonthlyAmortizationRecord,
    YearlyBuyRecord, YearlyInvestmentRecord, YearlyRentRecord,
};

/// Runs the full comparison: validates the bundle, produces the three yearly
/// series, and reduces them to the terminal summary. Validation failures
/// abort before any series is produced.
pub fn run_comparison(inputs: &InputBundle) -> Result<ComparisonReport, InvalidInputError> {
    validate_bundle(inputs)?;

    let rent_years = project_rent(inputs);
    let buy_years = project_buy(inputs)?;
    let investment_years = simulate_rent_invest(inputs, &rent_years, &buy_years);
    let summary = compare_scenarios(inputs, &rent_years, &buy_years, &investment_years);

    Ok(ComparisonReport {
        rent_years,
        buy_years,
        investment_years,
        summary,
    })
}

fn validate_bundle(inputs: &InputBundle) -> Result<(), InvalidInputError> {
    if inputs.general.analysis_years == 0 {
        return Err(InvalidInputError::NonPositiveAnalysisTerm);
    }
    if inputs.buy.mortgage_term_years == 0 {
        return Err(InvalidInputError::NonPositiveMortgageTerm);
    }

    for (name, value) in [
        ("inflation rate", inputs.general.inflation_rate),
        ("savings interest rate", inputs.general.savings_interest_rate),
        (
            "house appreciation rate",
            inputs.general.house_appreciation_rate,
        ),
        ("rent increase rate", inputs.general.rent_increase_rate),
        ("mortgage rate", inputs.buy.mortgage_rate),
        ("interest deduction rate", inputs.buy.interest_deduction_rate),
        (
            "property value tax rate below threshold",
            inputs.buy.property_value_tax_rate_below_threshold,
        ),
        (
            "property value tax rate above threshold",
            inputs.buy.property_value_tax_rate_above_threshold,
        ),
        ("land tax rate", inputs.buy.land_tax_rate),
        ("taxable value haircut", inputs.buy.taxable_value_haircut),
        ("annual revaluation rate", inputs.buy.annual_revaluation_rate),
        (
            "agent commission rate",
            inputs.selling.agent_commission_rate,
        ),
        (
            "capital gains tax rate",
            inputs.selling.capital_gains_tax_rate,
        ),
    ] {
        if value < 0.0 {
            return Err(InvalidInputError::NegativeRate { name, value });
        }
    }

    let upfront = inputs.buy.downpayment + inputs.buy.closing_costs;
    if upfront < 0.0 {
        return Err(InvalidInputError::NegativeAmount {
            name: "downpayment plus closing costs",
            value: upfront,
        });
    }

    Ok(())
}

/// Fixed monthly payment for a standard annuity loan. A zero rate falls back
/// to straight-line repayment.
pub fn monthly_mortgage_payment(
    principal: f64,
    annual_rate: f64,
    years: u32,
) -> Result<f64, InvalidInputError> {
    if years == 0 {
        return Err(InvalidInputError::NonPositiveMortgageTerm);
    }
    if principal < 0.0 {
        return Err(InvalidInputError::NegativePrincipal(principal));
    }
    if annual_rate < 0.0 {
        return Err(InvalidInputError::NegativeRate {
            name: "mortgage rate",
            value: annual_rate,
        });
    }

    let monthly_rate = annual_rate / 12.0;
    let num_payments = years * 12;
    if monthly_rate == 0.0 {
        return Ok(principal / f64::from(num_payments));
    }

    Ok(principal * monthly_rate / (1.0 - (1.0 + monthly_rate).powi(-(num_payments as i32))))
}

/// Month-by-month principal/interest split over the whole mortgage term.
/// The balance clamps at zero; the recorded principal keeps the nominal
/// payment split even when the final payment overshoots.
pub fn amortization_schedule(
    principal: f64,
    annual_rate: f64,
    years: u32,
) -> Result<Vec<MonthlyAmortizationRecord>, InvalidInputError> {
    let payment = monthly_mortgage_payment(principal, annual_rate, years)?;
    let monthly_rate = annual_rate / 12.0;
    let total_months = years * 12;

    let mut balance = principal;
    let mut schedule = Vec::with_capacity(total_months as usize);
    for month in 1..=total_months {
        let interest_paid = balance * monthly_rate;
        let principal_paid = payment - interest_paid;
        balance = (balance - principal_paid).max(0.0);

        schedule.push(MonthlyAmortizationRecord {
            month,
            interest_paid,
            principal_paid,
            mortgage_balance: balance,
        });
    }

    Ok(schedule)
}

fn escalated(base: f64, annual_rate: f64, year: u32) -> f64 {
    base * (1.0 + annual_rate).powi(year as i32 - 1)
}

/// Yearly cost series for the renting scenario. Year 1 carries the base rent
/// unchanged; renters insurance stays flat while rent compounds.
pub fn project_rent(inputs: &InputBundle) -> Vec<YearlyRentRecord> {
    let general = &inputs.general;
    let rent = &inputs.rent;

    let mut rent_years = Vec::with_capacity(general.analysis_years as usize);
    for year in 1..=general.analysis_years {
        let monthly_rent = escalated(rent.current_monthly_rent, general.rent_increase_rate, year);
        let annual_rent = monthly_rent * 12.0;
        let total_rent_cost = annual_rent + rent.annual_renters_insurance;

        rent_years.push(YearlyRentRecord {
            year,
            monthly_rent,
            annual_rent,
            renters_insurance: rent.annual_renters_insurance,
            total_rent_cost,
        });
    }

    rent_years
}

/// Market value and tax-authority valuations carried from one year into the
/// next. The two valuation tracks move independently.
struct OwnershipState {
    house_value: f64,
    assessed_property_value: f64,
    assessed_land_value: f64,
}

struct YearlyMortgageFlow {
    interest: f64,
    principal: f64,
    balance_end: f64,
}

fn yearly_mortgage_flow(schedule: &[MonthlyAmortizationRecord], year: u32) -> YearlyMortgageFlow {
    let start = ((year - 1) * 12) as usize;
    if start >= schedule.len() {
        // Loan fully retired before this year.
        return YearlyMortgageFlow {
            interest: 0.0,
            principal: 0.0,
            balance_end: 0.0,
        };
    }

    let months = &schedule[start..(start + 12).min(schedule.len())];
    YearlyMortgageFlow {
        interest: months.iter().map(|m| m.interest_paid).sum(),
        principal: months.iter().map(|m| m.principal_paid).sum(),
        balance_end: months.last().map_or(0.0, |m| m.mortgage_balance),
    }
}

fn property_value_tax(assessed_value: f64, buy: &BuyParams) -> f64 {
    let taxable = assessed_value * (1.0 - buy.taxable_value_haircut);
    if taxable <= buy.property_tax_threshold {
        taxable * buy.property_value_tax_rate_below_threshold
    } else {
        buy.property_tax_threshold * buy.property_value_tax_rate_below_threshold
            + (taxable - buy.property_tax_threshold) * buy.property_value_tax_rate_above_threshold
    }
}

fn land_tax(assessed_value: f64, buy: &BuyParams) -> f64 {
    assessed_value * (1.0 - buy.taxable_value_haircut) * buy.land_tax_rate
}

/// Yearly cost, tax, and equity series for the owning scenario. Each year
/// depends on the previous year's ending house value and on the running
/// tax-authority valuations.
pub fn project_buy(inputs: &InputBundle) -> Result<Vec<YearlyBuyRecord>, InvalidInputError> {
    let general = &inputs.general;
    let buy = &inputs.buy;

    let loan_amount = buy.cash_price - buy.downpayment;
    let schedule = amortization_schedule(loan_amount, buy.mortgage_rate, buy.mortgage_term_years)?;

    let mut state = OwnershipState {
        house_value: buy.cash_price,
        assessed_property_value: buy.tax_authority_property_value,
        assessed_land_value: buy.tax_authority_land_value,
    };

    let mut buy_years = Vec::with_capacity(general.analysis_years as usize);
    for year in 1..=general.analysis_years {
        let flow = yearly_mortgage_flow(&schedule, year);

        let house_value_start = state.house_value;
        let house_value_end = house_value_start * (1.0 + general.house_appreciation_rate);

        let property_value_tax = property_value_tax(state.assessed_property_value, buy);
        let land_tax = land_tax(state.assessed_land_value, buy);

        let insurance = escalated(buy.base_insurance, general.inflation_rate, year);
        let maintenance = escalated(buy.base_maintenance, general.inflation_rate, year);
        let renovations = escalated(buy.base_renovations, general.inflation_rate, year);
        let community_ownership_cost = escalated(
            buy.community_ownership_cost * 12.0,
            general.inflation_rate,
            year,
        );
        let car_lease = escalated(buy.monthly_car_lease * 12.0, general.inflation_rate, year);

        let interest_paid = flow.interest * (1.0 - buy.interest_deduction_rate);
        let total_outflow = interest_paid
            + flow.principal
            + property_value_tax
            + land_tax
            + insurance
            + maintenance
            + renovations
            + community_ownership_cost
            + car_lease;

        buy_years.push(YearlyBuyRecord {
            year,
            interest_paid,
            principal_paid: flow.principal,
            property_value_tax,
            land_tax,
            insurance,
            maintenance,
            renovations,
            community_ownership_cost,
            car_lease,
            total_outflow,
            mortgage_balance_end: flow.balance_end,
            house_value_start,
            house_value_end,
            net_equity_end: house_value_end - flow.balance_end,
        });

        state.house_value = house_value_end;
        state.assessed_property_value *= 1.0 + buy.annual_revaluation_rate;
        state.assessed_land_value *= 1.0 + buy.annual_revaluation_rate;
    }

    Ok(buy_years)
}

/// What a renter accumulates by investing the buyer's upfront capital plus
/// each year's cost difference. The contribution lands before interest, so
/// the whole adjusted base compounds.
pub fn simulate_rent_invest(
    inputs: &InputBundle,
    rent_years: &[YearlyRentRecord],
    buy_years: &[YearlyBuyRecord],
) -> Vec<YearlyInvestmentRecord> {
    let mut balance = inputs.buy.downpayment + inputs.buy.closing_costs;
    let mut investment_years = Vec::with_capacity(rent_years.len());

    for (rent, buy) in rent_years.iter().zip(buy_years) {
        let difference = buy.total_outflow - rent.total_rent_cost;
        let investment_start = balance;
        let investment_end =
            (investment_start + difference) * (1.0 + inputs.general.savings_interest_rate);
        balance = investment_end;

        investment_years.push(YearlyInvestmentRecord {
            year: rent.year,
            rent_outflow: rent.total_rent_cost,
            buy_outflow: buy.total_outflow,
            difference,
            investment_start,
            investment_end,
            final_rent_net_worth: 0.0,
        });
    }

    let terminal = investment_years.last().map_or(balance, |r| r.investment_end);
    for record in &mut investment_years {
        record.final_rent_net_worth = terminal;
    }

    investment_years
}

/// Reduces the three completed series to terminal totals. Selling costs and
/// capital gains tax apply only here, against the last year's house value.
pub fn compare_scenarios(
    inputs: &InputBundle,
    rent_years: &[YearlyRentRecord],
    buy_years: &[YearlyBuyRecord],
    investment_years: &[YearlyInvestmentRecord],
) -> ComparisonSummary {
    let total_rent_outflow = rent_years.iter().map(|r| r.total_rent_cost).sum();
    let total_buy_outflow = buy_years.iter().map(|r| r.total_outflow).sum();
    let final_rent_net_worth = investment_years
        .last()
        .map_or(0.0, |r| r.final_rent_net_worth);

    let final_home_value = buy_years.last().map_or(0.0, |r| r.house_value_end);
    let final_mortgage_balance = buy_years.last().map_or(0.0, |r| r.mortgage_balance_end);
    let raw_equity = final_home_value - final_mortgage_balance;

    let agent_commission = final_home_value * inputs.selling.agent_commission_rate;
    let capital_gains = (final_home_value - inputs.buy.cash_price).max(0.0);
    let capital_gains_tax = capital_gains * inputs.selling.capital_gains_tax_rate;
    let final_net_equity_buying = raw_equity - agent_commission - capital_gains_tax;

    ComparisonSummary {
        total_rent_outflow,
        total_buy_outflow,
        final_rent_net_worth,
        final_net_equity_buying,
        difference_in_net_worth: final_net_equity_buying - final_rent_net_worth,
    }
}
