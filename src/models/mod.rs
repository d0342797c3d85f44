pub mod user;
pub mod institution;
pub mod advantage;
pub mod transaction;
pub mod coupon;

pub use user::{
    BalanceResponse, Company, NewCompanyRequest, NewStudentRequest, Role, Student, Teacher,
    UpdateCompanyRequest, UpdateStudentRequest, UpdateTeacherRequest,
};
pub use institution::Institution;
pub use advantage::{Advantage, NewAdvantageRequest, UpdateAdvantageRequest};
pub use transaction::{CoinTransaction, TransactionType, TransferRequest};
pub use coupon::{Coupon, PurchaseRequest, PurchaseResponse};
