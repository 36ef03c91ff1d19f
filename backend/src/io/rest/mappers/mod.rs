pub mod baby_mapper;
pub mod measurement_mapper;
pub mod who_reference_mapper;

pub use baby_mapper::BabyMapper;
pub use measurement_mapper::MeasurementMapper;
pub use who_reference_mapper::WhoReferenceMapper;
