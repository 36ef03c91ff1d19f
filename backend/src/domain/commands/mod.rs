pub mod baby;
pub mod measurement;
pub mod who_reference;
