pub mod amortization;
pub mod card;
