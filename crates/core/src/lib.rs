pub mod invoice;
pub mod money;

pub use invoice::Invoice;
pub use money::Money;
