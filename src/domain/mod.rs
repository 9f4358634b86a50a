mod audit;
mod declaration;
mod role;
mod signature;

pub use audit::{AuditAction, AuditEntry};
pub use declaration::{
    CarrierData, Declaration, Equipment, RecipientData, SenderData, DEFAULT_CITY, FIRST_NUMBER_BASE,
};
pub use role::{SignerRole, UnknownRole};
pub use signature::{SignatureError, SignatureImage};
