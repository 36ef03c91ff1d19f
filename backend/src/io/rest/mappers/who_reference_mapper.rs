//! backend/src/io/rest/mappers/who_reference_mapper.rs

use chrono::SecondsFormat;
use shared::{CreateWhoReferenceRequest, UpdateWhoReferenceRequest, WhoReference as SharedWhoReference};

use super::BabyMapper;
use crate::domain::commands::who_reference::{CreateWhoReferenceCommand, UpdateWhoReferenceCommand};
use crate::domain::models::baby::Gender as DomainGender;
use crate::domain::models::who_reference::WhoReference as DomainWhoReference;

/// Mapper between shared WHO reference DTOs and domain models.
pub struct WhoReferenceMapper;

impl WhoReferenceMapper {
    pub fn to_dto(domain: DomainWhoReference) -> SharedWhoReference {
        SharedWhoReference {
            id: domain.id,
            gender: BabyMapper::gender_to_dto(domain.gender),
            month_age: domain.month_age,
            height_median_cm: domain.height_median_cm,
            weight_median_kg: domain.weight_median_kg,
            created_at: domain.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: domain.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// Read the `gender` query filter. Unrecognized values mean no filter.
    pub fn to_gender_filter(value: Option<&str>) -> Option<DomainGender> {
        let value = value?.trim();
        if value.eq_ignore_ascii_case("male") {
            Some(DomainGender::Male)
        } else if value.eq_ignore_ascii_case("female") {
            Some(DomainGender::Female)
        } else {
            None
        }
    }

    pub fn to_create_command(request: CreateWhoReferenceRequest) -> CreateWhoReferenceCommand {
        CreateWhoReferenceCommand {
            gender: BabyMapper::gender_to_domain(request.gender),
            month_age: request.month_age,
            height_median_cm: request.height_median_cm,
            weight_median_kg: request.weight_median_kg,
        }
    }

    pub fn to_update_command(request: UpdateWhoReferenceRequest) -> UpdateWhoReferenceCommand {
        UpdateWhoReferenceCommand {
            gender: request.gender.map(BabyMapper::gender_to_domain),
            month_age: request.month_age,
            height_median_cm: request.height_median_cm,
            weight_median_kg: request.weight_median_kg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_filter_is_case_insensitive() {
        assert_eq!(WhoReferenceMapper::to_gender_filter(Some("male")), Some(DomainGender::Male));
        assert_eq!(WhoReferenceMapper::to_gender_filter(Some("FEMALE")), Some(DomainGender::Female));
        assert_eq!(WhoReferenceMapper::to_gender_filter(Some("other")), None);
        assert_eq!(WhoReferenceMapper::to_gender_filter(Some("")), None);
        assert_eq!(WhoReferenceMapper::to_gender_filter(None), None);
    }
}
