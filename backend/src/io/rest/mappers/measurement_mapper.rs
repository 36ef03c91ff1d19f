//! backend/src/io/rest/mappers/measurement_mapper.rs

use chrono::SecondsFormat;
use shared::{CreateMeasurementRequest, Measurement as SharedMeasurement, UpdateMeasurementRequest};

use crate::domain::commands::measurement::{CreateMeasurementCommand, UpdateMeasurementCommand};
use crate::domain::models::measurement::Measurement as DomainMeasurement;

/// Mapper between shared measurement DTOs and domain models.
pub struct MeasurementMapper;

impl MeasurementMapper {
    pub fn to_dto(domain: DomainMeasurement) -> SharedMeasurement {
        SharedMeasurement {
            id: domain.id,
            baby_id: domain.baby_id,
            month_age: domain.month_age,
            height_cm: domain.height_cm,
            weight_kg: domain.weight_kg,
            created_at: domain.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: domain.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_create_command(request: CreateMeasurementRequest) -> CreateMeasurementCommand {
        CreateMeasurementCommand {
            baby_id: request.baby_id,
            month_age: request.month_age,
            height_cm: request.height_cm,
            weight_kg: request.weight_kg,
        }
    }

    pub fn to_update_command(request: UpdateMeasurementRequest) -> UpdateMeasurementCommand {
        UpdateMeasurementCommand {
            baby_id: request.baby_id,
            month_age: request.month_age,
            height_cm: request.height_cm,
            weight_kg: request.weight_kg,
        }
    }
}
