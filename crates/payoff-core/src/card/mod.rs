pub mod balance_transfer;
pub mod late_fee;
pub mod minimum_payment;
