pub mod baby_repository;
pub mod import_repository;
pub mod measurement_repository;
pub mod user_repository;
pub mod who_reference_repository;

pub use baby_repository::BabyRepository;
pub use import_repository::ImportRepository;
pub use measurement_repository::MeasurementRepository;
pub use user_repository::UserRepository;
pub use who_reference_repository::WhoReferenceRepository;
