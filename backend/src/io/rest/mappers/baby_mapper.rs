//! backend/src/io/rest/mappers/baby_mapper.rs

use chrono::SecondsFormat;
use shared::{Baby as SharedBaby, CreateBabyRequest, Gender as SharedGender, UpdateBabyRequest};

use crate::domain::commands::baby::{CreateBabyCommand, UpdateBabyCommand};
use crate::domain::models::baby::{Baby as DomainBaby, Gender as DomainGender};

/// Mapper between shared baby DTOs and domain models.
pub struct BabyMapper;

impl BabyMapper {
    pub fn gender_to_domain(gender: SharedGender) -> DomainGender {
        match gender {
            SharedGender::Male => DomainGender::Male,
            SharedGender::Female => DomainGender::Female,
        }
    }

    pub fn gender_to_dto(gender: DomainGender) -> SharedGender {
        match gender {
            DomainGender::Male => SharedGender::Male,
            DomainGender::Female => SharedGender::Female,
        }
    }

    /// Converts a domain Baby to its wire form. The owning user id is not exposed.
    pub fn to_dto(domain: DomainBaby) -> SharedBaby {
        SharedBaby {
            id: domain.id,
            name: domain.name,
            gender: Self::gender_to_dto(domain.gender),
            birth_date: domain.birth_date.format("%Y-%m-%d").to_string(),
            created_at: domain.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            updated_at: domain.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    pub fn to_create_command(request: CreateBabyRequest) -> CreateBabyCommand {
        CreateBabyCommand {
            name: request.name,
            gender: Self::gender_to_domain(request.gender),
            birth_date: request.birth_date,
        }
    }

    pub fn to_update_command(request: UpdateBabyRequest) -> UpdateBabyCommand {
        UpdateBabyCommand {
            name: request.name,
            gender: request.gender.map(Self::gender_to_domain),
            birth_date: request.birth_date,
        }
    }
}
