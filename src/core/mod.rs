mod engine;
mod error;
mod types;

pub use engine::{
    amortization_schedule, compare_scenarios, monthly_mortgage_payment, project_buy, project_rent,
    run_comparison, simulate_rent_invest,
};
pub use error::InvalidInputError;
pub use types::{
    BuyParams, ComparisonReport, ComparisonSummary, GeneralParams, InputBundle,
    MonthlyAmortizationRecord, RentParams, SellingParams, YearlyBuyRecord, YearlyInvestmentRecord,
    YearlyRentRecord,
};
