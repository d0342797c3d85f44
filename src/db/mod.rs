pub mod users;
pub mod students;
pub mod teachers;
pub mod companies;
pub mod institutions;
pub mod advantages;
pub mod transactions;
pub mod coupons;
